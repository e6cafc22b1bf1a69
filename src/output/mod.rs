//! Output formatting for CLI results

use serde::Serialize;
use tabled::Tabled;

use crate::cli::OutputFormat;
use kbsync::error::Result;

pub mod formatters;
pub mod json;
pub mod pretty;
pub mod table;

/// Types that can be rendered in every output format
pub trait Formattable {
    /// Format the data according to the specified format
    fn format(&self, format: OutputFormat) -> Result<String>;

    /// Format and print to stdout
    fn print(&self, format: OutputFormat) -> Result<()> {
        println!("{}", self.format(format)?);
        Ok(())
    }
}

impl<T: Tabled + Serialize> Formattable for Vec<T> {
    fn format(&self, format: OutputFormat) -> Result<String> {
        match format {
            OutputFormat::Json => Ok(json::format_json_list(self)?),
            OutputFormat::Table => Ok(table::format_table(self)),
            OutputFormat::Pretty => Ok(pretty::format_pretty(self)),
        }
    }
}
