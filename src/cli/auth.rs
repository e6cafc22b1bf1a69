//! API key commands

use colored::Colorize;
use dialoguer::{Password, theme::ColorfulTheme};
use serde_json::json;

use crate::cli::args::GlobalOptions;
use crate::cli::{CommandContext, OutputFormat};
use crate::output::json::format_json;
use kbsync::client::CredentialStatus;
use kbsync::error::{ApiError, Result};

/// Save an API key, prompting for it when not given.
pub fn set(opts: &GlobalOptions, key: Option<String>) -> Result<()> {
    let ctx = CommandContext::new(opts)?;

    let key = match key {
        Some(key) => key,
        None => Password::with_theme(&ColorfulTheme::default())
            .with_prompt("Enter your knowledge-base API key")
            .interact()?,
    };

    let backend = ctx.app.save_credential(&key)?;

    match ctx.format {
        OutputFormat::Json => {
            println!(
                "{}",
                format_json(&json!({ "saved": true, "backend": backend.to_string() }))?
            );
        }
        _ => println!("{} API key saved ({})", "✓".green(), backend),
    }
    Ok(())
}

/// Check the saved key against the API.
///
/// Anything other than an accepted key ends in an error so the exit code
/// reflects the result.
pub async fn check(opts: &GlobalOptions) -> Result<()> {
    let ctx = CommandContext::new(opts)?;
    let status = ctx.app.validate_credential().await?;

    match ctx.format {
        OutputFormat::Json => println!("{}", format_json(&status)?),
        _ if status.is_valid() => println!("{} API key accepted", "✓".green()),
        _ => {}
    }

    match status {
        CredentialStatus::Valid => Ok(()),
        CredentialStatus::Rejected => Err(ApiError::Unauthorized.into()),
        CredentialStatus::Missing => Err(ApiError::MissingCredential.into()),
        CredentialStatus::Unreachable(reason) => Err(ApiError::Network(reason).into()),
    }
}

/// Delete the saved key.
pub fn clear(opts: &GlobalOptions) -> Result<()> {
    let ctx = CommandContext::new(opts)?;
    let had_key = ctx.app.has_credential();
    ctx.app.clear_credential()?;

    match ctx.format {
        OutputFormat::Json => println!("{}", format_json(&json!({ "removed": had_key }))?),
        _ if had_key => println!("API key removed"),
        _ => println!("No API key was saved"),
    }
    Ok(())
}
