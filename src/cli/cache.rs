//! Cache management commands

use serde_json::json;

use crate::cli::args::GlobalOptions;
use crate::cli::{CommandContext, OutputFormat};
use crate::output::json::format_json;
use kbsync::error::Result;

/// Delete every cached article
pub fn clear(opts: &GlobalOptions) -> Result<()> {
    let ctx = CommandContext::new(opts)?;
    let removed = ctx.app.cache().clear()?;

    match ctx.format {
        OutputFormat::Json => {
            println!(
                "{}",
                format_json(&json!({ "articles_removed": removed, "success": true }))?
            );
        }
        _ => {
            if removed > 0 {
                println!("Cleared {} cached articles", removed);
            } else {
                println!("Cache was already empty");
            }
        }
    }

    Ok(())
}

/// Show the cache database path
pub fn path(opts: &GlobalOptions) -> Result<()> {
    let ctx = CommandContext::new(opts)?;
    println!("{}", ctx.app.cache().path().display());
    Ok(())
}
