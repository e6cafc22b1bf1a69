//! Global CLI options shared across all commands

use std::path::PathBuf;

use crate::cli::{Cli, OutputFormat};
use kbsync::config::Config;
use kbsync::error::Result;

/// Global CLI options passed to all command handlers.
///
/// # Precedence
///
/// CLI flag > environment variable > config file > default. This struct
/// captures the CLI/env layer and applies it over the loaded config.
#[derive(Debug, Clone, Default)]
pub struct GlobalOptions {
    /// Output format (pretty, table, json)
    pub format: OutputFormat,

    /// Custom config file path
    pub config: Option<String>,

    /// Data directory override
    pub data_dir: Option<String>,

    /// API root override
    pub api_base: Option<String>,

    /// Skip the OS keyring
    pub no_keyring: bool,
}

impl GlobalOptions {
    /// Create GlobalOptions from a parsed CLI struct.
    pub fn from_cli(cli: &Cli) -> Self {
        Self {
            format: cli.format,
            config: cli.config.clone(),
            data_dir: cli.data_dir.clone(),
            api_base: cli.api_base.clone(),
            no_keyring: cli.no_keyring,
        }
    }

    /// Get config path as `Option<&str>`.
    pub fn config_ref(&self) -> Option<&str> {
        self.config.as_deref()
    }

    /// Load the config file (or defaults) and apply overrides.
    pub fn load_config(&self) -> Result<Config> {
        let mut config = Config::load_or_default(self.config_ref())?;
        self.apply(&mut config);
        config.validate()?;
        Ok(config)
    }

    fn apply(&self, config: &mut Config) {
        if let Some(dir) = &self.data_dir {
            config.data_dir = Some(PathBuf::from(dir));
        }
        if let Some(base) = &self.api_base {
            config.api.base_url = base.clone();
        }
        if self.no_keyring {
            config.vault.native = false;
        }
    }
}
