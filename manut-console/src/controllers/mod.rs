//! Screen controllers
//!
//! Each controller owns the last good snapshot for its screen. Loads are
//! explicit calls; nothing reloads implicitly.

pub mod dashboard;
pub mod history;
pub mod reports;
pub mod settings;
pub mod sites;

pub use dashboard::{DashboardController, DashboardView, RECENT_LIMIT};
pub use history::{HistoryController, HistoryPage};
pub use reports::{ReportView, ReportsController};
pub use settings::SettingsController;
pub use sites::{DispatchReceipt, SitesController};

use manut_client::{ClientResult, DispatchQuery, DispatchStore, SharedBackend, SiteDirectory};
use shared::models::{DispatchRecord, Site};

/// Toast title shared by every failed load
pub(crate) const ERROR_TITLE: &str = "Erreur";

/// Fetch the site directory and dispatches concurrently
pub(crate) async fn fetch_snapshot(
    backend: &SharedBackend,
    query: Option<&DispatchQuery>,
) -> (ClientResult<Vec<Site>>, ClientResult<Vec<DispatchRecord>>) {
    tokio::join!(backend.fetch_sites(), backend.fetch_dispatches(query))
}
