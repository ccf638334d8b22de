//! Client site directory search

use crate::models::Site;

/// Sites whose name or address contains `term` (case-insensitive)
///
/// A blank term returns the whole directory in its original order.
pub fn search_sites<'a>(sites: &'a [Site], term: &str) -> Vec<&'a Site> {
    let needle = term.trim().to_lowercase();
    if needle.is_empty() {
        return sites.iter().collect();
    }
    sites
        .iter()
        .filter(|s| {
            s.name.to_lowercase().contains(&needle) || s.address.to_lowercase().contains(&needle)
        })
        .collect()
}
