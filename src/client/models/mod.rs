//! Knowledge-base API data models

mod article;
mod auth;
mod search;

pub use article::{Article, ArticleSummary};
pub use auth::CredentialStatus;
pub use search::SearchFilter;
