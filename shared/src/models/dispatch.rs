//! Dispatch Model (envoi de manutentionnaires)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Label used when a dispatch has no resolvable site name
pub const UNKNOWN_SITE: &str = "Unknown site";

/// A single recorded dispatch of workers to a client site
///
/// Append-only: created by a dispatch action, never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchRecord {
    pub id: String,
    pub site_id: String,
    /// Site name joined from the directory (None when the join is missing)
    #[serde(default)]
    pub site_name: Option<String>,
    /// Number of workers sent. Missing or non-positive values count as 0.
    #[serde(default)]
    pub quantity: Option<i64>,
    #[serde(default)]
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Display label of the actor, captured at creation time
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
}

impl DispatchRecord {
    /// Quantity this record adds to an aggregate
    #[inline]
    pub fn contribution(&self) -> i64 {
        self.quantity.filter(|q| *q > 0).unwrap_or(0)
    }

    /// Site label used for display and leaderboards
    pub fn site_label(&self) -> &str {
        self.site_name
            .as_deref()
            .filter(|name| !name.is_empty())
            .unwrap_or(UNKNOWN_SITE)
    }
}

/// Create dispatch payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewDispatch {
    pub site_id: String,
    pub quantity: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    pub user_id: String,
    pub username: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record(quantity: Option<i64>, site_name: Option<&str>) -> DispatchRecord {
        DispatchRecord {
            id: "d1".into(),
            site_id: "s1".into(),
            site_name: site_name.map(str::to_string),
            quantity,
            comment: None,
            created_at: Utc.with_ymd_and_hms(2024, 1, 10, 9, 0, 0).unwrap(),
            username: None,
            user_id: None,
        }
    }

    #[test]
    fn test_contribution_clamps_non_positive() {
        assert_eq!(record(Some(4), None).contribution(), 4);
        assert_eq!(record(Some(0), None).contribution(), 0);
        assert_eq!(record(Some(-3), None).contribution(), 0);
        assert_eq!(record(None, None).contribution(), 0);
    }

    #[test]
    fn test_site_label_sentinel() {
        assert_eq!(record(None, Some("Entrepôt Nord")).site_label(), "Entrepôt Nord");
        assert_eq!(record(None, None).site_label(), UNKNOWN_SITE);
        assert_eq!(record(None, Some("")).site_label(), UNKNOWN_SITE);
    }

    #[test]
    fn test_deserialize_missing_optionals() {
        let json = r#"{
            "id": "d9",
            "site_id": "s2",
            "created_at": "2024-03-01T07:30:00Z"
        }"#;
        let record: DispatchRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.quantity, None);
        assert_eq!(record.contribution(), 0);
        assert_eq!(record.site_label(), UNKNOWN_SITE);
    }
}
