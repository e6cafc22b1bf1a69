//! Display models for CLI output
//!
//! Converts library types into CLI-friendly display formats.

pub mod display;

pub use display::{ArticleDisplay, FailureDisplay, SummaryDisplay, TagDisplay};
