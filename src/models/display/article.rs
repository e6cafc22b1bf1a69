//! Article display models

use serde::Serialize;
use tabled::Tabled;

use crate::output::formatters::{format_modified, truncate};
use kbsync::cache::CachedSummary;
use kbsync::client::ArticleSummary;

const TITLE_WIDTH: usize = 60;

/// Cached article row
#[derive(Debug, Clone, Tabled, Serialize)]
pub struct ArticleDisplay {
    #[tabled(rename = "ID")]
    pub id: i64,

    #[tabled(rename = "TITLE")]
    pub title: String,

    /// Local time for tables, raw stored value for JSON
    #[tabled(rename = "MODIFIED")]
    #[serde(skip)]
    pub modified_local: String,

    #[tabled(skip)]
    pub last_modified: String,
}

impl From<CachedSummary> for ArticleDisplay {
    fn from(summary: CachedSummary) -> Self {
        Self {
            id: summary.id,
            title: truncate(&summary.title, TITLE_WIDTH),
            modified_local: format_modified(&summary.last_modified),
            last_modified: summary.last_modified,
        }
    }
}

/// Search result row shown after a sync
#[derive(Debug, Clone, Tabled, Serialize)]
pub struct SummaryDisplay {
    #[tabled(rename = "ID")]
    pub id: i64,

    #[tabled(rename = "TITLE")]
    pub title: String,

    #[tabled(rename = "CACHED")]
    pub cached: String,
}

impl SummaryDisplay {
    pub fn new(summary: &ArticleSummary, cached: bool) -> Self {
        let title = summary.subject.as_deref().unwrap_or("--");
        Self {
            id: summary.id,
            title: truncate(title, TITLE_WIDTH),
            cached: if cached { "\u{2713}".to_string() } else { "\u{2717}".to_string() },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_article_display_from_summary() {
        let display = ArticleDisplay::from(CachedSummary {
            id: 4,
            title: "Printing from a laptop".to_string(),
            last_modified: "2024-03-01T12:00:00Z".to_string(),
        });

        assert_eq!(display.id, 4);
        assert_eq!(display.title, "Printing from a laptop");
        assert_eq!(display.last_modified, "2024-03-01T12:00:00Z");
        assert!(display.modified_local.contains("2024"));
    }

    #[test]
    fn test_summary_display_marks_uncached() {
        let summary = ArticleSummary {
            id: 2,
            subject: None,
            modified_date: None,
            extra: Default::default(),
        };

        let display = SummaryDisplay::new(&summary, false);
        assert_eq!(display.title, "--");
        assert_eq!(display.cached, "\u{2717}");
    }
}
