//! User Settings Model

use serde::{Deserialize, Serialize};

/// Color theme preference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemePreference {
    #[default]
    Light,
    Dark,
    /// Follow the system preference
    Auto,
}

impl ThemePreference {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
            Self::Auto => "auto",
        }
    }

    /// Resolve to a concrete dark/light decision
    pub fn is_dark(&self, system_prefers_dark: bool) -> bool {
        match self {
            Self::Light => false,
            Self::Dark => true,
            Self::Auto => system_prefers_dark,
        }
    }
}

impl std::str::FromStr for ThemePreference {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "light" => Ok(Self::Light),
            "dark" => Ok(Self::Dark),
            "auto" => Ok(Self::Auto),
            other => Err(format!("unknown theme: {}", other)),
        }
    }
}

/// Per-user preferences stored in the `user_settings` table
///
/// Every field falls back to its default when the stored row omits it
/// or holds a null.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserSettings {
    pub full_name: String,
    pub company: String,
    pub phone: String,
    pub theme: ThemePreference,
    pub notifications_email: bool,
    pub notifications_push: bool,
    pub auto_refresh: bool,
    /// Auto refresh interval (seconds)
    pub refresh_interval: u32,
    pub default_view: String,
    /// History page size
    pub items_per_page: u32,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            full_name: String::new(),
            company: String::new(),
            phone: String::new(),
            theme: ThemePreference::Light,
            notifications_email: true,
            notifications_push: true,
            auto_refresh: true,
            refresh_interval: 30,
            default_view: "dashboard".to_string(),
            items_per_page: 10,
        }
    }
}

impl UserSettings {
    /// Build settings from a raw row, treating JSON nulls as missing
    pub fn from_row(row: &serde_json::Value) -> Result<Self, serde_json::Error> {
        let cleaned = match row {
            serde_json::Value::Object(map) => serde_json::Value::Object(
                map.iter()
                    .filter(|(_, v)| !v.is_null())
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect(),
            ),
            other => other.clone(),
        };
        serde_json::from_value(cleaned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let s = UserSettings::default();
        assert_eq!(s.theme, ThemePreference::Light);
        assert_eq!(s.refresh_interval, 30);
        assert_eq!(s.default_view, "dashboard");
        assert_eq!(s.items_per_page, 10);
        assert!(s.notifications_email && s.notifications_push && s.auto_refresh);
    }

    #[test]
    fn test_from_row_fills_nulls_and_missing() {
        let row = serde_json::json!({
            "user_id": "u1",
            "full_name": "Anna Martin",
            "company": null,
            "theme": "dark",
            "items_per_page": 25,
            "updated_at": "2024-01-01T00:00:00Z"
        });
        let s = UserSettings::from_row(&row).unwrap();
        assert_eq!(s.full_name, "Anna Martin");
        assert_eq!(s.company, "");
        assert_eq!(s.theme, ThemePreference::Dark);
        assert_eq!(s.items_per_page, 25);
        assert_eq!(s.refresh_interval, 30);
    }

    #[test]
    fn test_theme_parse() {
        assert_eq!("Dark".parse::<ThemePreference>(), Ok(ThemePreference::Dark));
        assert_eq!(" auto ".parse::<ThemePreference>(), Ok(ThemePreference::Auto));
        assert!("sepia".parse::<ThemePreference>().is_err());
    }

    #[test]
    fn test_theme_auto_follows_system() {
        assert!(ThemePreference::Auto.is_dark(true));
        assert!(!ThemePreference::Auto.is_dark(false));
        assert!(ThemePreference::Dark.is_dark(false));
    }
}
