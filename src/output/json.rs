//! JSON output formatting
//!
//! Every JSON document printed by the CLI has the shape
//! `{"data": ..., "meta": {...}}` so scripts can rely on one envelope.

use chrono::Utc;
use serde::Serialize;

/// Envelope around a command result
#[derive(Debug, Serialize)]
pub struct JsonOutput<T> {
    pub data: T,
    pub meta: Metadata,
}

#[derive(Debug, Serialize)]
pub struct Metadata {
    /// RFC 3339 time the document was produced
    pub generated_at: String,

    /// kbsync version that produced it
    pub version: String,

    /// Row count, for list results
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
}

impl<T> JsonOutput<T> {
    pub fn new(data: T) -> Self {
        Self {
            data,
            meta: Metadata {
                generated_at: Utc::now().to_rfc3339(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                count: None,
            },
        }
    }

    fn with_count(mut self, count: usize) -> Self {
        self.meta.count = Some(count);
        self
    }
}

/// Pretty-printed envelope around a single result
pub fn format_json<T: Serialize + ?Sized>(data: &T) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&JsonOutput::new(data))
}

/// Pretty-printed envelope around a list, with its length in `meta.count`
pub fn format_json_list<T: Serialize>(items: &[T]) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&JsonOutput::new(items).with_count(items.len()))
}
