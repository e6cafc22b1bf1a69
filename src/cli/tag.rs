//! Tag editing commands
//!
//! Edits are made on the cached copies, pushed to the API one article at a
//! time, and the server's versions are written back to the cache.

use colored::Colorize;

use crate::cli::args::GlobalOptions;
use crate::cli::{CommandContext, OutputFormat};
use crate::models::{FailureDisplay, TagDisplay};
use crate::output::Formattable;
use crate::output::json::format_json;
use kbsync::client::Article;
use kbsync::edit;
use kbsync::error::{Error, Result};

/// Which edit to apply
#[derive(Debug, Clone, Copy)]
pub enum TagEdit {
    Add,
    Remove,
}

/// Load the cached copies of `ids`, failing on the first one not cached.
fn load_cached(ctx: &CommandContext, ids: &[i64]) -> Result<Vec<Article>> {
    ids.iter()
        .map(|&id| ctx.app.get_cached(id)?.ok_or(Error::NotCached(id)))
        .collect()
}

/// Apply a tag edit to the articles and push those that changed.
pub async fn apply(opts: &GlobalOptions, op: TagEdit, tag: &str, ids: &[i64]) -> Result<()> {
    let ctx = CommandContext::new(opts)?;
    let mut articles = load_cached(&ctx, ids)?;
    let before = articles.clone();

    match op {
        TagEdit::Add => edit::add_tag(&mut articles, tag),
        TagEdit::Remove => edit::remove_tag(&mut articles, tag),
    };

    let changed: Vec<Article> = articles
        .into_iter()
        .zip(before.iter())
        .filter(|(after, before)| after != *before)
        .map(|(after, _)| after)
        .collect();

    if changed.is_empty() {
        match ctx.format {
            OutputFormat::Json => println!("{}", format_json(&serde_json::json!({ "pushed": [] }))?),
            _ => println!("Nothing to change"),
        }
        return Ok(());
    }

    let report = ctx.app.push_edits(&changed).await?;

    match ctx.format {
        OutputFormat::Json => println!("{}", format_json(&report)?),
        _ => {
            println!(
                "{} Updated {} of {} articles",
                if report.failures.is_empty() { "✓".green() } else { "⚠".yellow() },
                report.pushed.len(),
                changed.len()
            );
            if !report.failures.is_empty() {
                let failures: Vec<FailureDisplay> = report.failures.iter().map(Into::into).collect();
                failures.print(ctx.format)?;
            }
        }
    }
    Ok(())
}

/// Show every tag on the articles, marking the ones all of them share.
pub fn list(opts: &GlobalOptions, ids: &[i64]) -> Result<()> {
    let ctx = CommandContext::new(opts)?;
    let articles = load_cached(&ctx, ids)?;

    let common = edit::tag_intersection(&articles);
    let rows: Vec<TagDisplay> = edit::tag_union(&articles)
        .into_iter()
        .map(|tag| {
            let on_all = common.contains(&tag);
            TagDisplay::new(tag, on_all)
        })
        .collect();

    rows.print(ctx.format)
}
