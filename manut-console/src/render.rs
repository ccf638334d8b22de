//! Plain-text rendering for the terminal

use std::fmt::Write;

use shared::models::{Site, UserSettings};
use shared::stats::{BucketZone, PageLink, monthly_window, weekly_window};

use crate::controllers::{DashboardView, HistoryPage, ReportView};
use crate::core::{Notice, NoticeLevel};

const DATE_TIME_FORMAT: &str = "%d/%m/%Y %H:%M";

pub fn notice(n: &Notice) -> String {
    let tag = match n.level {
        NoticeLevel::Info => "i",
        NoticeLevel::Success => "✓",
        NoticeLevel::Error => "✗",
    };
    format!("[{}] {}: {}", tag, n.title, n.description)
}

pub fn dashboard(view: &DashboardView, zone: BucketZone) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Bonjour, {}", view.greeting_name);
    let _ = writeln!(out, "Envoyés aujourd'hui ({}): {}", view.today, view.today_total);
    let _ = writeln!(out, "Envoyés ce mois ({}): {}", view.month, view.month_total);
    let _ = writeln!(out, "Total envois (ce mois): {}", view.month_dispatch_count);
    let _ = writeln!(out, "Sites clients: {}", view.site_count);

    let _ = writeln!(out, "\nTop sites du mois");
    if view.top_sites.is_empty() {
        let _ = writeln!(out, "  (aucun envoi)");
    }
    for (rank, site) in view.top_sites.iter().enumerate() {
        let _ = writeln!(out, "  {}. {:<30} {}", rank + 1, site.site_name, site.total_quantity);
    }

    let _ = writeln!(out, "\nActivité récente");
    for r in &view.recent {
        let _ = writeln!(
            out,
            "  {}  {:<30} {:>4}  {}",
            r.created_at.with_timezone(&zone.tz()).format(DATE_TIME_FORMAT),
            r.site_label(),
            r.contribution(),
            r.username.as_deref().unwrap_or("N/A"),
        );
    }
    out
}

pub fn history(page: &HistoryPage, zone: BucketZone) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<17} {:<30} {:>5}  {:<16} Commentaire",
        "Date", "Site", "Qté", "Utilisateur"
    );
    for r in &page.rows {
        let _ = writeln!(
            out,
            "{:<17} {:<30} {:>5}  {:<16} {}",
            r.created_at.with_timezone(&zone.tz()).format(DATE_TIME_FORMAT),
            r.site_label(),
            r.quantity.map(|q| q.to_string()).unwrap_or_default(),
            r.username.as_deref().unwrap_or("N/A"),
            r.comment.as_deref().unwrap_or(""),
        );
    }
    if page.rows.is_empty() {
        let _ = writeln!(out, "(aucun envoi trouvé)");
    }

    let _ = write!(out, "\n{} envoi(s)", page.total_records);
    if !page.links.is_empty() {
        let links: Vec<String> = page
            .links
            .iter()
            .map(|link| match link {
                PageLink::Page(n) if *n == page.page => format!("[{}]", n),
                PageLink::Page(n) => n.to_string(),
                PageLink::Ellipsis => "…".to_string(),
            })
            .collect();
        let _ = write!(out, "  |  pages: {}", links.join(" "));
    }
    out.push('\n');
    out
}

pub fn report(view: &ReportView) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Rapport {}", view.month);
    let _ = writeln!(out, "Manutentionnaires envoyés: {}", view.total);
    let _ = writeln!(out, "Nombre d'envois: {}", view.dispatch_count);

    let _ = writeln!(out, "\nTop sites");
    for (rank, site) in view.top_sites.iter().enumerate() {
        let _ = writeln!(out, "  {}. {:<30} {}", rank + 1, site.site_name, site.total_quantity);
    }

    let _ = writeln!(out, "\n7 derniers jours");
    for (day, total) in weekly_window(view.reference).iter().zip(view.weekly_trend) {
        let _ = writeln!(out, "  {}  {:>5}", day, total);
    }
    let _ = writeln!(out, "\n12 derniers mois");
    for (month, total) in monthly_window(view.reference).iter().zip(view.monthly_trend) {
        let _ = writeln!(out, "  {}  {:>6}", month, total);
    }
    out
}

pub fn sites(sites: &[Site]) -> String {
    let mut out = String::new();
    for s in sites {
        let _ = writeln!(out, "{:<38} {:<30} {}", s.id, s.name, s.address);
    }
    if sites.is_empty() {
        let _ = writeln!(out, "(aucun site)");
    }
    out
}

pub fn settings(s: &UserSettings) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "full_name           = {}", s.full_name);
    let _ = writeln!(out, "company             = {}", s.company);
    let _ = writeln!(out, "phone               = {}", s.phone);
    let _ = writeln!(out, "theme               = {}", s.theme.as_str());
    let _ = writeln!(out, "notifications_email = {}", s.notifications_email);
    let _ = writeln!(out, "notifications_push  = {}", s.notifications_push);
    let _ = writeln!(out, "auto_refresh        = {}", s.auto_refresh);
    let _ = writeln!(out, "refresh_interval    = {}", s.refresh_interval);
    let _ = writeln!(out, "default_view        = {}", s.default_view);
    let _ = writeln!(out, "items_per_page      = {}", s.items_per_page);
    out
}
