//! Knowledge-base article models

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Full article record as returned by the detail endpoint.
///
/// Only the fields the sync core depends on are typed; every other remote
/// field is kept verbatim in `extra` and written back unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    /// Stable primary key
    #[serde(rename = "ID")]
    pub id: i64,

    /// Display title
    #[serde(rename = "Subject")]
    pub subject: String,

    /// ISO-8601 modification timestamp
    #[serde(rename = "ModifiedDate")]
    pub modified_date: String,

    /// All other remote fields, passed through untouched
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Article {
    pub fn new(id: i64, subject: impl Into<String>, modified_date: impl Into<String>) -> Self {
        Self {
            id,
            subject: subject.into(),
            modified_date: modified_date.into(),
            extra: Map::new(),
        }
    }

    /// Set a pass-through field (builder style).
    pub fn with_field(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    /// String value of a pass-through field, if present and a string.
    pub fn text_field(&self, key: &str) -> Option<&str> {
        self.extra.get(key).and_then(Value::as_str)
    }

    /// Article tags; a missing or null `Tags` field reads as empty.
    pub fn tags(&self) -> Vec<String> {
        match self.extra.get("Tags") {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect(),
            _ => Vec::new(),
        }
    }

    pub fn set_tags(&mut self, tags: Vec<String>) {
        self.extra.insert(
            "Tags".to_string(),
            Value::Array(tags.into_iter().map(Value::String).collect()),
        );
    }
}

/// Article entry returned by the search endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleSummary {
    #[serde(rename = "ID")]
    pub id: i64,

    #[serde(rename = "Subject", default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,

    #[serde(
        rename = "ModifiedDate",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub modified_date: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
