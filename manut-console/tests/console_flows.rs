// manut-console/tests/console_flows.rs
// 控制器集成测试（内存后端）

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use manut_client::{
    AuthApi, ClientResult, DispatchQuery, DispatchStore, MemoryBackend, SettingsStore, SharedBackend,
    SiteDirectory,
};
use manut_console::SessionContext;
use manut_console::controllers::{
    DashboardController, HistoryController, ReportsController, SettingsController, SitesController,
};
use shared::ErrorCode;
use shared::models::{
    AuthSession, AuthUser, DispatchRecord, NewDispatch, Site, UserSettings, UserUpdate,
};
use shared::stats::{BucketZone, FilterCriteria};
use tempfile::TempDir;
use tokio::sync::Notify;

const EMAIL: &str = "claire@ops.fr";
const PASSWORD: &str = "secret";

fn at(month: u32, day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, month, day, hour, 0, 0).unwrap()
}

fn dispatch(id: &str, site_id: &str, quantity: i64, created_at: DateTime<Utc>, username: &str) -> DispatchRecord {
    DispatchRecord {
        id: id.into(),
        site_id: site_id.into(),
        site_name: None,
        quantity: Some(quantity),
        comment: None,
        created_at,
        username: Some(username.into()),
        user_id: None,
    }
}

fn memory_backend() -> MemoryBackend {
    MemoryBackend::new()
        .with_sites(vec![
            Site::new("s-nord", "Entrepôt Nord", "Lille"),
            Site::new("s-quai", "Quai 7", "Marseille"),
        ])
        .with_dispatches(vec![
            dispatch("d-1", "s-nord", 3, at(3, 14, 8), "claire"),
            dispatch("d-2", "s-quai", 2, at(3, 14, 10), "karim"),
            dispatch("d-3", "s-quai", 5, at(3, 2, 9), "claire"),
            dispatch("d-4", "s-nord", 7, at(2, 28, 9), "karim"),
        ])
        .with_account(EMAIL, PASSWORD, Some("Claire"))
}

fn new_dispatch(site_id: &str, quantity: i64) -> NewDispatch {
    NewDispatch {
        site_id: site_id.into(),
        quantity,
        comment: None,
        user_id: "u-claire".into(),
        username: "claire".into(),
    }
}

async fn signed_in(backend: SharedBackend, dir: &TempDir) -> Arc<SessionContext> {
    let session = Arc::new(SessionContext::new(backend, dir.path()));
    session.login(EMAIL, PASSWORD).await.unwrap();
    session
}

#[tokio::test]
async fn test_dashboard_keeps_previous_view_on_failure() {
    let dir = TempDir::new().unwrap();
    let memory = Arc::new(memory_backend());
    let backend: SharedBackend = memory.clone();
    let session = signed_in(backend.clone(), &dir).await;
    let controller = DashboardController::new(backend, session, BucketZone::utc());

    let loaded = controller.load(at(3, 14, 12)).await.unwrap();
    assert!(loaded.notices.is_empty());
    assert_eq!(loaded.view.greeting_name, "claire");
    assert_eq!(loaded.view.today_total, 5);
    assert_eq!(loaded.view.month_total, 10);
    assert_eq!(loaded.view.month_dispatch_count, 3);
    assert_eq!(loaded.view.site_count, 2);
    assert_eq!(loaded.view.top_sites[0].site_name, "Quai 7");
    assert_eq!(loaded.view.recent[0].site_name.as_deref(), Some("Quai 7"));

    memory.set_unavailable(true);
    let failed = controller.load(at(3, 14, 12)).await.unwrap();
    assert_eq!(failed.notices.len(), 2);
    assert!(failed.has_errors());
    assert_eq!(failed.view.month_total, 10);
    assert_eq!(failed.view.site_count, 2);
}

#[tokio::test]
async fn test_history_filters_and_export() {
    let memory = Arc::new(memory_backend());
    let backend: SharedBackend = memory.clone();
    let controller = HistoryController::new(backend, BucketZone::utc()).with_page_size(2);

    let loaded = controller.load().await.unwrap();
    assert!(loaded.notices.is_empty());
    assert_eq!(loaded.view.total_records, 4);
    assert_eq!(loaded.view.total_pages, 2);
    assert_eq!(controller.sites().len(), 2);

    assert_eq!(controller.go_to_page(2).page, 2);
    let page = controller.apply_filters(FilterCriteria::default().username("CLAI"));
    assert_eq!(page.page, 1);
    assert_eq!(page.total_records, 2);
    assert!(page.rows.iter().all(|r| r.username.as_deref() == Some("claire")));

    let csv = String::from_utf8(controller.export_csv()).unwrap();
    assert_eq!(csv.lines().count(), 3);
    assert!(csv.lines().nth(1).unwrap().starts_with("d-1,Entrepôt Nord,3,"));

    // filters survive a failed reload
    memory.set_unavailable(true);
    let reloaded = controller.load().await.unwrap();
    assert_eq!(reloaded.notices.len(), 2);
    assert_eq!(reloaded.view.total_records, 2);
}

#[tokio::test]
async fn test_history_page_clamping_and_filter_reset() {
    let backend: SharedBackend = Arc::new(memory_backend());
    let controller = HistoryController::new(backend, BucketZone::utc()).with_page_size(3);
    controller.load().await.unwrap();

    let page = controller.go_to_page(9);
    assert_eq!(page.page, 2);
    assert_eq!(page.rows.len(), 1);
    assert_eq!(page.rows[0].id, "d-4");
    assert_eq!(controller.go_to_page(0).page, 1);

    controller.go_to_page(2);
    let filtered = controller.apply_filters(FilterCriteria::default().site("s-quai"));
    assert_eq!(filtered.total_records, 2);
    assert_eq!(filtered.total_pages, 1);

    let reset = controller.reset_filters();
    assert_eq!(reset.page, 1);
    assert_eq!(reset.total_records, 4);
    assert_eq!(reset.total_pages, 2);
    assert!(controller.criteria().is_empty());
}

#[tokio::test]
async fn test_dashboard_survives_extreme_quantities() {
    let dir = TempDir::new().unwrap();
    let backend: SharedBackend = Arc::new(
        memory_backend().with_dispatches(vec![
            dispatch("d-1", "s-nord", i64::MAX, at(3, 14, 8), "claire"),
            dispatch("d-2", "s-nord", i64::MAX, at(3, 14, 9), "karim"),
            dispatch("d-3", "s-quai", 1, at(3, 14, 10), "karim"),
        ]),
    );
    let session = signed_in(backend.clone(), &dir).await;
    let controller = DashboardController::new(backend, session, BucketZone::utc());

    let loaded = controller.load(at(3, 14, 12)).await.unwrap();
    assert_eq!(loaded.view.today_total, i64::MAX);
    assert_eq!(loaded.view.month_total, i64::MAX);
    assert_eq!(loaded.view.top_sites[0].site_name, "Entrepôt Nord");
    assert_eq!(loaded.view.top_sites[0].total_quantity, i64::MAX);
}

#[tokio::test]
async fn test_send_workers_validation() {
    let dir = TempDir::new().unwrap();
    let memory = Arc::new(memory_backend());
    let backend: SharedBackend = memory.clone();
    let session = Arc::new(SessionContext::new(backend.clone(), dir.path()));
    let controller = SitesController::new(backend, session.clone());

    let err = controller.send_workers("s-quai", 3, None).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::NotAuthenticated);

    session.login(EMAIL, PASSWORD).await.unwrap();
    let err = controller.send_workers("s-quai", 0, None).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidQuantity);
    let err = controller.send_workers("s-nowhere", 2, None).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::SiteNotFound);
    assert_eq!(memory.dispatch_count(), 4);

    let receipt = controller.send_workers("s-quai", 3, Some("   ")).await.unwrap();
    assert_eq!(receipt.record.comment, None);
    assert_eq!(receipt.record.username.as_deref(), Some("claire"));
    assert_eq!(receipt.notice.description, "3 manutentionnaire(s) envoyé(s) à Quai 7.");
    assert_eq!(memory.dispatch_count(), 5);
}

#[tokio::test]
async fn test_settings_defaults_created_once() {
    let dir = TempDir::new().unwrap();
    let memory = Arc::new(memory_backend());
    let backend: SharedBackend = memory.clone();
    let session = signed_in(backend.clone(), &dir).await;
    let user = session.require_user().unwrap();
    let controller = SettingsController::new(backend, session);

    assert_eq!(memory.load_settings(&user.id).await.unwrap(), None);
    let loaded = controller.load().await.unwrap();
    assert_eq!(loaded.view, UserSettings::default());
    assert_eq!(
        memory.load_settings(&user.id).await.unwrap(),
        Some(UserSettings::default())
    );

    let mut changed = loaded.view.clone();
    changed.items_per_page = 0;
    assert!(controller.update(changed.clone()).await.is_err());

    changed.items_per_page = 25;
    controller.update(changed).await.unwrap();
    let reloaded = controller.load().await.unwrap();
    assert_eq!(reloaded.view.items_per_page, 25);
    assert_eq!(controller.page_size().await.unwrap(), 25);
}

#[tokio::test]
async fn test_settings_save_failure_reports_settings_code() {
    let dir = TempDir::new().unwrap();
    let memory = Arc::new(memory_backend());
    let backend: SharedBackend = memory.clone();
    let session = signed_in(backend.clone(), &dir).await;
    let controller = SettingsController::new(backend, session);

    memory.set_unavailable(true);
    let err = controller.update(UserSettings::default()).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::SettingsSaveFailed);
    assert!(err.is_persistence());

    // a failed read falls back to defaults with a notice
    let loaded = controller.load().await.unwrap();
    assert!(loaded.has_errors());
    assert_eq!(controller.page_size().await.unwrap(), 10);
}

#[tokio::test]
async fn test_session_restore_and_logout_notifies() {
    let dir = TempDir::new().unwrap();
    let backend: SharedBackend = Arc::new(memory_backend());
    signed_in(backend.clone(), &dir).await;

    let restored = SessionContext::new(backend, dir.path());
    let user = restored.init().await.expect("cached session restored");
    assert_eq!(user.email.as_deref(), Some(EMAIL));
    assert_eq!(restored.username(), "claire");

    let mut rx = restored.subscribe();
    assert!(rx.borrow().is_some());
    restored.logout().await.unwrap();
    rx.changed().await.unwrap();
    assert!(rx.borrow().is_none());
    assert!(!dir.path().join("auth/session.json").exists());
}

/// Backend whose first dispatch read answers only once released
///
/// The held response is the data as it was when the read started.
struct GatedBackend {
    inner: MemoryBackend,
    reads: AtomicUsize,
    release: Notify,
}

fn gated(inner: MemoryBackend) -> Arc<GatedBackend> {
    Arc::new(GatedBackend {
        inner,
        reads: AtomicUsize::new(0),
        release: Notify::new(),
    })
}

#[async_trait]
impl SiteDirectory for GatedBackend {
    async fn fetch_sites(&self) -> ClientResult<Vec<Site>> {
        self.inner.fetch_sites().await
    }
}

#[async_trait]
impl DispatchStore for GatedBackend {
    async fn fetch_dispatches(&self, query: Option<&DispatchQuery>) -> ClientResult<Vec<DispatchRecord>> {
        let result = self.inner.fetch_dispatches(query).await;
        if self.reads.fetch_add(1, Ordering::SeqCst) == 0 {
            self.release.notified().await;
        }
        result
    }

    async fn create_dispatch(&self, dispatch: &NewDispatch) -> ClientResult<DispatchRecord> {
        self.inner.create_dispatch(dispatch).await
    }
}

#[async_trait]
impl SettingsStore for GatedBackend {
    async fn load_settings(&self, user_id: &str) -> ClientResult<Option<UserSettings>> {
        self.inner.load_settings(user_id).await
    }

    async fn upsert_settings(&self, user_id: &str, settings: &UserSettings) -> ClientResult<UserSettings> {
        self.inner.upsert_settings(user_id, settings).await
    }
}

#[async_trait]
impl AuthApi for GatedBackend {
    async fn sign_in(&self, email: &str, password: &str) -> ClientResult<AuthSession> {
        self.inner.sign_in(email, password).await
    }

    async fn sign_out(&self) -> ClientResult<()> {
        self.inner.sign_out().await
    }

    async fn current_user(&self) -> ClientResult<AuthUser> {
        self.inner.current_user().await
    }

    async fn update_user(&self, update: &UserUpdate) -> ClientResult<AuthUser> {
        self.inner.update_user(update).await
    }

    fn set_access_token(&self, token: Option<String>) {
        self.inner.set_access_token(token)
    }
}

#[tokio::test]
async fn test_superseded_report_load_is_discarded() {
    let backend = gated(memory_backend());
    let controller = ReportsController::new(backend.clone(), BucketZone::utc());
    let now = at(3, 14, 12);

    let (february, march) = tokio::join!(
        controller.load_month("2024-02".parse().unwrap(), now),
        async {
            let march = controller.load_month("2024-03".parse().unwrap(), now).await;
            backend.release.notify_one();
            march
        }
    );

    assert!(february.is_none());
    let march = march.expect("latest load publishes");
    assert_eq!(march.view.total, 10);
    assert_eq!(march.view.monthly_trend[10], 7);
    assert_eq!(controller.view().map(|v| v.month.to_string()), Some("2024-03".to_string()));
}

#[tokio::test]
async fn test_superseded_history_load_is_discarded() {
    let backend = gated(memory_backend());
    backend.inner.sign_in(EMAIL, PASSWORD).await.unwrap();
    let controller = HistoryController::new(backend.clone(), BucketZone::utc());

    let (stale, fresh) = tokio::join!(controller.load(), async {
        backend.inner.create_dispatch(&new_dispatch("s-quai", 4)).await.unwrap();
        let fresh = controller.load().await;
        backend.release.notify_one();
        fresh
    });

    assert!(stale.is_none());
    assert_eq!(fresh.expect("latest load publishes").view.total_records, 5);
    assert_eq!(controller.page().total_records, 5);
}

#[tokio::test]
async fn test_superseded_dashboard_load_is_discarded() {
    let dir = TempDir::new().unwrap();
    let backend = gated(memory_backend());
    let session = signed_in(backend.clone(), &dir).await;
    let controller = DashboardController::new(backend.clone(), session, BucketZone::utc());
    let now = at(3, 14, 12);

    let (stale, fresh) = tokio::join!(controller.load(now), async {
        backend.inner.create_dispatch(&new_dispatch("s-nord", 4)).await.unwrap();
        let fresh = controller.load(now).await;
        backend.release.notify_one();
        fresh
    });

    assert!(stale.is_none());
    let fresh = fresh.expect("latest load publishes");
    assert_eq!(fresh.view.recent.len(), 5);
    let kept = controller.view().unwrap();
    assert_eq!(kept.recent.len(), 5);
    assert_eq!(kept.recent[0].quantity, Some(4));
}
