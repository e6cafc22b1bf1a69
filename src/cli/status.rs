//! Status command implementation

use colored::Colorize;

use crate::cli::args::GlobalOptions;
use crate::cli::{CommandContext, OutputFormat};
use crate::output::json::format_json;
use crate::output::table::format_fields;
use kbsync::config::Config;
use kbsync::error::Result;

/// Show configuration, key and cache status
pub fn run(opts: &GlobalOptions) -> Result<()> {
    let config_path = Config::resolve_path(opts.config_ref())?;
    let ctx = CommandContext::new(opts)?;
    let status = ctx.app.status()?;

    match ctx.format {
        OutputFormat::Json => println!("{}", format_json(&status)?),
        OutputFormat::Table => {
            let key = if status.has_credential { "saved" } else { "not saved" };
            println!(
                "{}",
                format_fields(&[
                    ("Config file", config_path.display().to_string()),
                    ("Data dir", status.data_dir.display().to_string()),
                    ("API", status.api_base.clone()),
                    ("API key", key.to_string()),
                    ("Key storage", status.vault_backend.clone()),
                    ("Throttle", status.throttle.clone()),
                    ("Cached articles", status.cached_articles.to_string()),
                ])
            );
        }
        OutputFormat::Pretty => {
            println!("{}\n", "kbsync Status".bold());
            println!("Config file: {}", config_path.display().to_string().cyan());
            println!("Data dir:    {}", status.data_dir.display().to_string().cyan());
            println!("API:         {}", status.api_base.cyan());
            println!();

            if status.has_credential {
                println!("{} API key saved ({})", "✓".green(), status.vault_backend);
            } else {
                println!("{} API key not saved", "✗".red());
                println!("  → Run 'kbsync auth set' to store one");
            }

            if status.cached_articles > 0 {
                println!("{} {} articles cached", "✓".green(), status.cached_articles);
            } else {
                println!("{} Cache is empty", "○".dimmed());
                println!("  → Run 'kbsync sync' to fetch articles");
            }

            println!("{} Throttle: {}", "○".dimmed(), status.throttle);
            println!();
        }
    }

    Ok(())
}
