//! Offline demo data
//!
//! Seeds a [`MemoryBackend`] with a small directory and a few months of
//! dispatches so every screen has something to show without a backend.

use chrono::{DateTime, Duration, Utc};
use manut_client::MemoryBackend;
use shared::models::{DispatchRecord, Site};

pub const DEMO_EMAIL: &str = "demo@manut.local";
pub const DEMO_PASSWORD: &str = "demo";

const USERS: [&str; 3] = ["demo", "claire", "karim"];
const COMMENTS: [Option<&str>; 4] = [None, Some("Renfort quai"), None, Some("Inventaire")];

fn demo_sites() -> Vec<Site> {
    vec![
        Site::new("site-lille", "Entrepôt Nord", "12 rue des Docks, Lille"),
        Site::new("site-lyon", "Plateforme Rhône", "ZI Saint-Fons, Lyon"),
        Site::new("site-marseille", "Quai 7", "Port de Marseille"),
        Site::new("site-nantes", "Hub Atlantique", "Boulevard de l'Estuaire, Nantes"),
    ]
}

/// Deterministic dispatch history ending at `now`
///
/// One to three dispatches per day over the last 120 days. Empty when
/// `sites` is empty.
pub fn demo_dispatches(now: DateTime<Utc>, sites: &[Site]) -> Vec<DispatchRecord> {
    let mut records = Vec::new();
    if sites.is_empty() {
        return records;
    }
    for day in 0..120i64 {
        let per_day = (day % 3 + 1) as usize;
        for slot in 0..per_day {
            let n = records.len();
            let site = &sites[(day as usize * 7 + slot * 3) % sites.len()];
            records.push(DispatchRecord {
                id: format!("demo-{:04}", n),
                site_id: site.id.clone(),
                site_name: Some(site.name.clone()),
                quantity: Some((day * 5 + slot as i64 * 3) % 9 + 1),
                comment: COMMENTS[n % COMMENTS.len()].map(str::to_string),
                created_at: now - Duration::days(day) - Duration::hours(2 + slot as i64 * 3),
                username: Some(USERS[n % USERS.len()].to_string()),
                user_id: None,
            });
        }
    }
    records
}

pub fn demo_backend(now: DateTime<Utc>) -> MemoryBackend {
    let sites = demo_sites();
    let dispatches = demo_dispatches(now, &sites);
    MemoryBackend::new()
        .with_sites(sites)
        .with_dispatches(dispatches)
        .with_account(DEMO_EMAIL, DEMO_PASSWORD, Some("demo"))
}
