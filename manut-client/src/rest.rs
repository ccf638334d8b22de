//! REST client for the managed backend (PostgREST tables + auth endpoints)

use async_trait::async_trait;
use parking_lot::RwLock;
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use shared::models::{
    AuthSession, AuthUser, DispatchRecord, NewDispatch, Site, SiteNameRef, UserSettings, UserUpdate,
};

use crate::store::{AuthApi, DispatchQuery, DispatchStore, SettingsStore, SiteDirectory};
use crate::{ClientConfig, ClientError, ClientResult};

const SITES_PATH: &str = "rest/v1/client_sites";
const DISPATCHES_PATH: &str = "rest/v1/dispatches";
const SETTINGS_PATH: &str = "rest/v1/user_settings";
const TOKEN_PATH: &str = "auth/v1/token";
const LOGOUT_PATH: &str = "auth/v1/logout";
const USER_PATH: &str = "auth/v1/user";

/// Columns selected for dispatch rows, with the site name embedded
pub const DISPATCH_SELECT: &str = "id,site_id,quantity,comment,created_at,username,user_id,client_sites(name)";

/// HTTP client for the managed backend
#[derive(Debug)]
pub struct RestClient {
    client: Client,
    base_url: String,
    api_key: String,
    token: RwLock<Option<String>>,
}

impl RestClient {
    /// Create a new REST client from configuration
    pub fn new(config: &ClientConfig) -> ClientResult<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            token: RwLock::new(config.token.clone()),
        })
    }

    /// Get the current token
    pub fn token(&self) -> Option<String> {
        self.token.read().clone()
    }

    /// Build a request carrying the api key and bearer token
    ///
    /// Without a user token the api key doubles as the bearer, which is
    /// what anonymous PostgREST calls expect.
    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}/{}", self.base_url, path);
        let bearer = self.token().unwrap_or_else(|| self.api_key.clone());

        self.client
            .request(method, url)
            .header("apikey", &self.api_key)
            .header(reqwest::header::AUTHORIZATION, format!("Bearer {}", bearer))
    }

    /// Map a non-success status onto a client error
    async fn check_status(response: reqwest::Response) -> ClientResult<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await?;
        tracing::debug!(status = %status, body = %text, "Backend returned an error");
        Err(match status {
            StatusCode::UNAUTHORIZED => ClientError::Unauthorized,
            StatusCode::FORBIDDEN => ClientError::Forbidden(text),
            StatusCode::NOT_FOUND => ClientError::NotFound(text),
            StatusCode::CONFLICT => ClientError::Conflict(text),
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => ClientError::Validation(text),
            _ => ClientError::Api {
                status: status.as_u16(),
                message: text,
            },
        })
    }

    /// Handle the HTTP response
    async fn handle_response<T: DeserializeOwned>(response: reqwest::Response) -> ClientResult<T> {
        let response = Self::check_status(response).await?;
        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(Into::into)
    }

    /// Handle a response whose body is ignored
    async fn handle_empty(response: reqwest::Response) -> ClientResult<()> {
        Self::check_status(response).await.map(|_| ())
    }
}

/// Dispatch row as returned by PostgREST with the embedded site
#[derive(Debug, Deserialize)]
struct DispatchRow {
    id: String,
    site_id: String,
    #[serde(default)]
    quantity: Option<i64>,
    #[serde(default)]
    comment: Option<String>,
    created_at: chrono::DateTime<chrono::Utc>,
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    user_id: Option<String>,
    #[serde(default)]
    client_sites: Option<SiteNameRef>,
}

impl From<DispatchRow> for DispatchRecord {
    fn from(row: DispatchRow) -> Self {
        DispatchRecord {
            id: row.id,
            site_id: row.site_id,
            site_name: row.client_sites.map(|s| s.name),
            quantity: row.quantity,
            comment: row.comment,
            created_at: row.created_at,
            username: row.username,
            user_id: row.user_id,
        }
    }
}

/// Password grant response
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    expires_at: Option<i64>,
    user: AuthUser,
}

impl TokenResponse {
    fn into_session(self, now: i64) -> AuthSession {
        let expires_at = self
            .expires_at
            .or_else(|| self.expires_in.map(|secs| now + secs));
        AuthSession {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            expires_at,
            user: self.user,
        }
    }
}

#[async_trait]
impl SiteDirectory for RestClient {
    async fn fetch_sites(&self) -> ClientResult<Vec<Site>> {
        let response = self
            .request(Method::GET, SITES_PATH)
            .query(&[("select", "id,name,address"), ("order", "name.asc")])
            .send()
            .await?;
        let sites: Vec<Site> = Self::handle_response(response).await?;
        tracing::debug!(count = sites.len(), "Fetched client sites");
        Ok(sites)
    }
}

#[async_trait]
impl DispatchStore for RestClient {
    async fn fetch_dispatches(&self, query: Option<&DispatchQuery>) -> ClientResult<Vec<DispatchRecord>> {
        let mut request = self
            .request(Method::GET, DISPATCHES_PATH)
            .query(&[("select", DISPATCH_SELECT), ("order", "created_at.desc")]);
        if let Some(query) = query {
            request = request.query(&query.to_params());
        }

        let rows: Vec<DispatchRow> = Self::handle_response(request.send().await?).await?;
        tracing::debug!(count = rows.len(), "Fetched dispatches");
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn create_dispatch(&self, dispatch: &NewDispatch) -> ClientResult<DispatchRecord> {
        let response = self
            .request(Method::POST, DISPATCHES_PATH)
            .query(&[("select", DISPATCH_SELECT)])
            .header("Prefer", "return=representation")
            .json(&[dispatch])
            .send()
            .await?;

        let rows: Vec<DispatchRow> = Self::handle_response(response).await?;
        rows.into_iter()
            .next()
            .map(Into::into)
            .ok_or_else(|| ClientError::InvalidResponse("Missing created dispatch".to_string()))
    }
}

#[async_trait]
impl SettingsStore for RestClient {
    async fn load_settings(&self, user_id: &str) -> ClientResult<Option<UserSettings>> {
        let response = self
            .request(Method::GET, SETTINGS_PATH)
            .query(&[("select", "*".to_string()), ("user_id", format!("eq.{}", user_id))])
            .send()
            .await?;

        let rows: Vec<serde_json::Value> = Self::handle_response(response).await?;
        rows.first()
            .map(UserSettings::from_row)
            .transpose()
            .map_err(Into::into)
    }

    async fn upsert_settings(&self, user_id: &str, settings: &UserSettings) -> ClientResult<UserSettings> {
        #[derive(Serialize)]
        struct SettingsRow<'a> {
            user_id: &'a str,
            #[serde(flatten)]
            settings: &'a UserSettings,
            updated_at: String,
        }

        let row = SettingsRow {
            user_id,
            settings,
            updated_at: chrono::Utc::now().to_rfc3339(),
        };
        let response = self
            .request(Method::POST, SETTINGS_PATH)
            .query(&[("on_conflict", "user_id")])
            .header("Prefer", "resolution=merge-duplicates,return=representation")
            .json(&[row])
            .send()
            .await?;

        let rows: Vec<serde_json::Value> = Self::handle_response(response).await?;
        match rows.first() {
            Some(row) => Ok(UserSettings::from_row(row)?),
            None => Ok(settings.clone()),
        }
    }
}

#[async_trait]
impl AuthApi for RestClient {
    async fn sign_in(&self, email: &str, password: &str) -> ClientResult<AuthSession> {
        #[derive(Serialize)]
        struct PasswordGrant<'a> {
            email: &'a str,
            password: &'a str,
        }

        let response = self
            .request(Method::POST, TOKEN_PATH)
            .query(&[("grant_type", "password")])
            .json(&PasswordGrant { email, password })
            .send()
            .await?;

        let token: TokenResponse = match Self::handle_response(response).await {
            // the auth endpoint answers bad credentials with 400
            Err(ClientError::Validation(_)) => return Err(ClientError::Unauthorized),
            other => other?,
        };
        let session = token.into_session(shared::util::now_secs());
        self.set_access_token(Some(session.access_token.clone()));
        tracing::info!(user_id = %session.user.id, "Signed in");
        Ok(session)
    }

    async fn sign_out(&self) -> ClientResult<()> {
        if self.token().is_none() {
            return Ok(());
        }
        let result = match self.request(Method::POST, LOGOUT_PATH).send().await {
            Ok(response) => Self::handle_empty(response).await,
            Err(e) => Err(e.into()),
        };
        // the local token is dropped even when revocation fails
        self.set_access_token(None);
        result
    }

    async fn current_user(&self) -> ClientResult<AuthUser> {
        if self.token().is_none() {
            return Err(ClientError::Unauthorized);
        }
        let response = self.request(Method::GET, USER_PATH).send().await?;
        Self::handle_response(response).await
    }

    async fn update_user(&self, update: &UserUpdate) -> ClientResult<AuthUser> {
        if self.token().is_none() {
            return Err(ClientError::Unauthorized);
        }
        let response = self.request(Method::PUT, USER_PATH).json(update).send().await?;
        Self::handle_response(response).await
    }

    fn set_access_token(&self, token: Option<String>) {
        *self.token.write() = token;
    }
}
