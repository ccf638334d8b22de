//! CSV export
//!
//! Exports only format what the engine already computed; nothing here
//! re-aggregates.

use shared::models::DispatchRecord;
use shared::stats::{BucketZone, monthly_window, weekly_window};

use crate::controllers::ReportView;

pub const HISTORY_HEADER: &str = "ID,Site,Quantité,Commentaire,Date et Heure,Utilisateur";
pub const HISTORY_FILE_NAME: &str = "historique_envois.csv";

const DATE_TIME_FORMAT: &str = "%d/%m/%Y %H:%M:%S";

/// Quote a field when it holds a separator, a quote or a line break
fn field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        quoted(value)
    } else {
        value.to_string()
    }
}

fn quoted(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

/// History rows as CSV, in the order given
///
/// The comment column is always quoted. Dates are rendered in `zone`.
pub fn history_csv(records: &[DispatchRecord], zone: BucketZone) -> Vec<u8> {
    let mut lines = Vec::with_capacity(records.len() + 1);
    lines.push(HISTORY_HEADER.to_string());

    for r in records {
        let at = r.created_at.with_timezone(&zone.tz()).format(DATE_TIME_FORMAT);
        lines.push(format!(
            "{},{},{},{},{},{}",
            field(&r.id),
            field(r.site_label()),
            r.quantity.map(|q| q.to_string()).unwrap_or_default(),
            quoted(r.comment.as_deref().unwrap_or("")),
            at,
            field(r.username.as_deref().unwrap_or("N/A")),
        ));
    }
    lines.join("\n").into_bytes()
}

/// Monthly report as CSV: summary, leaderboard, then both trends
pub fn report_csv(view: &ReportView) -> Vec<u8> {
    let mut lines = vec![
        format!("Mois,{}", view.month),
        format!("Total manutentionnaires,{}", view.total),
        format!("Total envois,{}", view.dispatch_count),
        String::new(),
        "Site,Quantité".to_string(),
    ];
    lines.extend(
        view.top_sites
            .iter()
            .map(|s| format!("{},{}", field(&s.site_name), s.total_quantity)),
    );

    lines.push(String::new());
    lines.push("Jour,Quantité".to_string());
    lines.extend(
        weekly_window(view.reference)
            .iter()
            .zip(view.weekly_trend)
            .map(|(day, total)| format!("{},{}", day, total)),
    );

    lines.push(String::new());
    lines.push("Mois,Quantité".to_string());
    lines.extend(
        monthly_window(view.reference)
            .iter()
            .zip(view.monthly_trend)
            .map(|(month, total)| format!("{},{}", month, total)),
    );
    lines.join("\n").into_bytes()
}
