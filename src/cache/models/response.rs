use serde::{Deserialize, Serialize};

/// A cached GET response, stored as JSON under its request identity.
/// Written only for 2xx responses; expires via the entry TTL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedResponse {
    pub status: u16,
    pub content_type: String,
    /// The `Cache-Control` value computed for the tier at store time,
    /// replayed verbatim on hits.
    pub cache_control: String,
    /// Cache tier name ("static" or "dynamic"); private responses are
    /// never stored.
    pub tier: String,
    pub body: String,
}
