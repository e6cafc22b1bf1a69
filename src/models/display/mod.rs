//! Display model implementations for table and JSON output
//!
//! Display models transform library types into CLI-friendly formats
//! with appropriate column names and serialization.

mod article;
mod report;

pub use article::{ArticleDisplay, SummaryDisplay};
pub use report::{FailureDisplay, TagDisplay};
