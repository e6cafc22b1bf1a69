//! Cached article commands

use colored::Colorize;
use serde_json::Value;

use crate::cli::args::GlobalOptions;
use crate::cli::{CommandContext, OutputFormat};
use crate::models::ArticleDisplay;
use crate::output::Formattable;
use crate::output::formatters::{format_modified, truncate};
use crate::output::json::format_json;
use crate::output::table::format_fields;
use kbsync::client::Article;
use kbsync::error::{Error, Result};

/// Longest scalar value shown inline in the field table
const VALUE_WIDTH: usize = 80;

/// List cached articles, most recently modified first.
pub fn list(opts: &GlobalOptions, limit: Option<usize>) -> Result<()> {
    let ctx = CommandContext::new(opts)?;
    let mut summaries = ctx.app.list_cached()?;
    if let Some(limit) = limit {
        summaries.truncate(limit);
    }

    let rows: Vec<ArticleDisplay> = summaries.into_iter().map(ArticleDisplay::from).collect();
    rows.print(ctx.format)
}

/// Show one cached article.
pub fn show(opts: &GlobalOptions, id: i64) -> Result<()> {
    let ctx = CommandContext::new(opts)?;
    let article = ctx.app.get_cached(id)?.ok_or(Error::NotCached(id))?;

    match ctx.format {
        OutputFormat::Json => println!("{}", format_json(&article)?),
        OutputFormat::Table => println!("{}", format_fields(&field_rows(&article))),
        OutputFormat::Pretty => print_pretty(&article),
    }
    Ok(())
}

/// Label/value rows: core fields first, then scalar pass-through fields by name.
fn field_rows(article: &Article) -> Vec<(&str, String)> {
    let mut rows = vec![
        ("ID", article.id.to_string()),
        ("Subject", article.subject.clone()),
        ("Modified", format_modified(&article.modified_date)),
    ];

    let tags = article.tags();
    if !tags.is_empty() {
        rows.push(("Tags", tags.join(", ")));
    }

    let mut extra: Vec<(&str, String)> = article
        .extra
        .iter()
        .filter(|(key, _)| key.as_str() != "Tags")
        .filter_map(|(key, value)| scalar(value).map(|v| (key.as_str(), truncate(&v, VALUE_WIDTH))))
        .collect();
    extra.sort_by(|a, b| a.0.cmp(b.0));
    rows.extend(extra);
    rows
}

fn scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn print_pretty(article: &Article) {
    println!("{} {}", format!("#{}", article.id).dimmed(), article.subject.bold());
    println!(
        "{} {}",
        "Modified:".dimmed(),
        format_modified(&article.modified_date)
    );

    let tags = article.tags();
    if !tags.is_empty() {
        let tags: Vec<String> = tags.iter().map(|t| t.cyan().to_string()).collect();
        println!("{} {}", "Tags:".dimmed(), tags.join(" "));
    }

    if let Some(summary) = article.text_field("Summary").filter(|s| !s.trim().is_empty()) {
        println!("\n{}", summary.italic());
    }
    if let Some(body) = article.text_field("Body").filter(|s| !s.trim().is_empty()) {
        println!("\n{}", body);
    }
}
