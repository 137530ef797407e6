//! Detection of installable packages in free-form feed text.
//!
//! The [`Extractor`] scans each [`FeedUpdate`] with per-manager patterns,
//! classifies every hit, and appends a catalog of well-known MCP servers so
//! callers always see a baseline set of items.
//!
//! ```ignore
//! let extractor = Extractor::new(true);
//! let items = extractor.extract(&updates);
//! ```

pub mod catalog;
pub mod extractor;
pub mod patterns;

use serde::{Deserialize, Serialize};

pub use extractor::Extractor;

/// One free-text record from the content feed.
///
/// `title` is optional on the wire; a record without one is skipped.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeedUpdate {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub url: Option<String>,
}

impl FeedUpdate {
    pub fn new(title: &str, content: &str, url: Option<&str>) -> Self {
        Self {
            title: Some(title.to_string()),
            content: content.to_string(),
            url: url.map(str::to_string),
        }
    }
}

/// Parse a JSON array of feed updates, dropping records that do not match
/// the [`FeedUpdate`] shape instead of rejecting the whole feed.
pub fn parse_updates(json: &str) -> serde_json::Result<Vec<FeedUpdate>> {
    let records: Vec<serde_json::Value> = serde_json::from_str(json)?;
    let total = records.len();
    let updates: Vec<FeedUpdate> = records
        .into_iter()
        .enumerate()
        .filter_map(|(index, record)| match serde_json::from_value(record) {
            Ok(update) => Some(update),
            Err(e) => {
                tracing::debug!(index, error = %e, "skipping malformed feed record");
                None
            }
        })
        .collect();
    if updates.len() < total {
        tracing::warn!(
            skipped = total - updates.len(),
            total,
            "some feed records could not be parsed"
        );
    }
    Ok(updates)
}
