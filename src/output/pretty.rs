//! Pretty output formatting
//!
//! Lists render as one block per row: the first column as a bold heading,
//! the remaining non-empty columns as dimmed `label: value` lines.

use colored::Colorize;
use tabled::Tabled;

/// Format rows as colored blocks separated by blank lines
pub fn format_pretty<T: Tabled>(data: &[T]) -> String {
    if data.is_empty() {
        return "No results found.".to_string();
    }

    let headers = T::headers();
    let width = headers.iter().skip(1).map(|h| h.len()).max().unwrap_or(0);

    let blocks: Vec<String> = data
        .iter()
        .map(|row| {
            let fields = row.fields();
            let mut lines = Vec::with_capacity(fields.len());

            if let Some(first) = fields.first() {
                lines.push(format!(
                    "{} {}",
                    headers[0].to_string().dimmed(),
                    first.to_string().bold()
                ));
            }
            for (label, value) in headers.iter().zip(fields.iter()).skip(1) {
                if value.trim().is_empty() {
                    continue;
                }
                let label = format!("{:>width$}:", label.to_lowercase(), width = width);
                lines.push(format!("  {} {}", label.dimmed(), value));
            }
            lines.join("\n")
        })
        .collect();

    blocks.join("\n\n")
}
