//! Client Site Model

use serde::{Deserialize, Serialize};

/// Client site entity (a location that receives dispatches)
///
/// Read-only snapshot of a row owned by the remote site directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Site {
    pub id: String,
    /// Display name, unique across the directory
    pub name: String,
    #[serde(default)]
    pub address: String,
}

impl Site {
    pub fn new(id: impl Into<String>, name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            address: address.into(),
        }
    }
}

/// Minimal site projection returned by joined selects (`client_sites(name)`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteNameRef {
    pub name: String,
}
