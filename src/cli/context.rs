//! Command execution context

use crate::cli::OutputFormat;
use crate::cli::args::GlobalOptions;
use kbsync::AppContext;
use kbsync::error::Result;

/// Loaded configuration and wired-up core, plus the output format.
pub struct CommandContext {
    pub app: AppContext,
    pub format: OutputFormat,
}

impl CommandContext {
    /// Load config, apply CLI/env overrides and build the core.
    ///
    /// # Errors
    /// Returns error if the config cannot be loaded or is invalid, or if the
    /// data directory cannot be opened.
    pub fn new(opts: &GlobalOptions) -> Result<Self> {
        let config = opts.load_config()?;
        let app = AppContext::new(config)?;
        Ok(Self {
            app,
            format: opts.format,
        })
    }
}
