pub mod auth;
pub mod characters;
pub mod compendium;
pub mod encounters;
pub mod error;
pub mod middleware;

use tracing::warn;
use uuid::Uuid;

/// Row ids are written by this crate as UUIDs; a parse failure means the
/// database was edited out-of-band. Log and degrade instead of failing the
/// whole response.
pub(crate) fn uuid_or_nil(raw: &str, what: &str) -> Uuid {
    raw.parse().unwrap_or_else(|e| {
        warn!("Corrupt {} '{}': {}", what, raw, e);
        Uuid::default()
    })
}
