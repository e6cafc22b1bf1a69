//! Sync report and tag display models

use serde::Serialize;
use tabled::Tabled;

use kbsync::sync::FetchFailure;

/// Per-article failure row
#[derive(Debug, Clone, Tabled, Serialize)]
pub struct FailureDisplay {
    #[tabled(rename = "ID")]
    pub id: i64,

    #[tabled(rename = "REASON")]
    pub reason: String,
}

impl From<&FetchFailure> for FailureDisplay {
    fn from(failure: &FetchFailure) -> Self {
        Self {
            id: failure.id,
            reason: failure.reason.clone(),
        }
    }
}

/// Tag row for `tag list`
#[derive(Debug, Clone, Tabled, Serialize)]
pub struct TagDisplay {
    #[tabled(rename = "TAG")]
    pub tag: String,

    #[tabled(rename = "ON ALL")]
    #[serde(skip)]
    pub marker: String,

    /// Present on every selected article
    #[tabled(skip)]
    pub on_all: bool,
}

impl TagDisplay {
    pub fn new(tag: String, on_all: bool) -> Self {
        Self {
            tag,
            marker: if on_all { "\u{2713}".to_string() } else { String::new() },
            on_all,
        }
    }
}
