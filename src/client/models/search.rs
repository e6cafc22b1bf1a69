//! Search request schema

use serde::{Deserialize, Serialize};

/// Filter body for the knowledge-base search endpoint.
///
/// Unset fields are omitted from the request so the server applies its own
/// defaults.
///
/// # Example
/// ```
/// use kbsync::client::SearchFilter;
///
/// let filter = SearchFilter::new().search_text("vpn").published(true);
/// assert_eq!(filter.search_text.as_deref(), Some("vpn"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SearchFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_text: Option<String>,

    #[serde(rename = "CategoryID", skip_serializing_if = "Option::is_none")]
    pub category_id: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_published: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_public: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_count: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub include_article_bodies: Option<bool>,
}

impl SearchFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn search_text(mut self, text: impl Into<String>) -> Self {
        self.search_text = Some(text.into());
        self
    }

    pub fn category(mut self, category_id: i64) -> Self {
        self.category_id = Some(category_id);
        self
    }

    pub fn published(mut self, published: bool) -> Self {
        self.is_published = Some(published);
        self
    }

    pub fn public(mut self, public: bool) -> Self {
        self.is_public = Some(public);
        self
    }

    pub fn return_count(mut self, count: u32) -> Self {
        self.return_count = Some(count);
        self
    }

    pub fn include_bodies(mut self, include: bool) -> Self {
        self.include_article_bodies = Some(include);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_filter_serializes_to_empty_object() {
        assert_eq!(serde_json::to_value(SearchFilter::new()).unwrap(), json!({}));
    }

    #[test]
    fn test_filter_uses_remote_field_names() {
        let filter = SearchFilter::new()
            .search_text("printer")
            .category(12)
            .published(true)
            .return_count(50);

        assert_eq!(
            serde_json::to_value(filter).unwrap(),
            json!({
                "SearchText": "printer",
                "CategoryID": 12,
                "IsPublished": true,
                "ReturnCount": 50
            })
        );
    }
}
