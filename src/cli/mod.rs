//! CLI command definitions and handlers

use clap::{Args, Parser, Subcommand};
pub use clap_complete::Shell;

pub mod args;
pub mod articles;
pub mod auth;
pub mod cache;
pub mod context;
pub mod status;
pub mod sync;
pub mod tag;

pub use args::{GlobalOptions, OutputFormat};
pub use context::CommandContext;

/// kbsync - keep a local, searchable copy of the support knowledge base
#[derive(Parser, Debug)]
#[command(name = "kbsync")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Output format (pretty, table, json)
    #[arg(
        long,
        global = true,
        env = "KBSYNC_FORMAT",
        default_value = "table",
        hide_env = true,
        hide_possible_values = true
    )]
    pub format: OutputFormat,

    /// Override config file location
    #[arg(long, global = true, env = "KBSYNC_CONFIG", hide_env = true)]
    pub config: Option<String>,

    /// Override the data directory holding the key and article cache
    #[arg(long, global = true, env = "KBSYNC_DATA_DIR", hide_env = true)]
    pub data_dir: Option<String>,

    /// Override the API root URL
    #[arg(long, global = true, env = "KBSYNC_API_BASE", hide_env = true)]
    pub api_base: Option<String>,

    /// Never use the OS keyring; keep the key in the locally encrypted file
    #[arg(long, global = true, env = "KBSYNC_NO_KEYRING", hide_env = true)]
    pub no_keyring: bool,

    /// Enable debug logging
    #[arg(long, global = true, env = "KBSYNC_DEBUG", hide_env = true)]
    pub debug: bool,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage the API key
    #[command(subcommand)]
    Auth(AuthCommands),

    /// Show configuration, key and cache status
    Status,

    /// Fetch articles from the API into the local cache
    Sync(SyncArgs),

    /// List cached articles, most recently modified first
    List {
        /// Maximum rows to show
        #[arg(long, short = 'n')]
        limit: Option<usize>,
    },

    /// Show one cached article
    Show {
        /// Article ID
        id: i64,
    },

    /// Edit tags on cached articles and push the changes
    #[command(subcommand)]
    Tag(TagCommands),

    /// Manage the local article cache
    #[command(subcommand)]
    Cache(CacheCommands),

    /// Generate shell completions
    #[command(after_help = "\
Examples:
  bash:   kbsync completion bash > /etc/bash_completion.d/kbsync
  zsh:    kbsync completion zsh > \"${fpath[1]}/_kbsync\"
  fish:   kbsync completion fish > ~/.config/fish/completions/kbsync.fish")]
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// API key subcommands
#[derive(Subcommand, Debug)]
pub enum AuthCommands {
    /// Save an API key (prompts when --key is omitted)
    Set {
        /// API key value
        #[arg(long, env = "KBSYNC_API_KEY", hide_env = true)]
        key: Option<String>,
    },

    /// Check the saved API key against the API
    Check,

    /// Delete the saved API key
    Clear,
}

/// Search filter for a sync cycle
#[derive(Args, Debug, Clone, Default)]
pub struct SyncArgs {
    /// Only articles matching this text
    #[arg(long, short = 's')]
    pub search: Option<String>,

    /// Only articles in this category
    #[arg(long, short = 'c')]
    pub category: Option<i64>,

    /// Only published articles
    #[arg(long)]
    pub published: bool,

    /// Maximum number of articles the search returns
    #[arg(long, short = 'n')]
    pub limit: Option<u32>,
}

/// Tag editing subcommands
#[derive(Subcommand, Debug)]
pub enum TagCommands {
    /// Add a tag to articles
    Add {
        /// Tag to add
        tag: String,

        /// Article IDs (comma-separated or repeated)
        #[arg(long, required = true, value_delimiter = ',')]
        ids: Vec<i64>,
    },

    /// Remove a tag from articles
    Remove {
        /// Tag to remove
        tag: String,

        /// Article IDs (comma-separated or repeated)
        #[arg(long, required = true, value_delimiter = ',')]
        ids: Vec<i64>,
    },

    /// Show the tags on articles, marking those shared by all
    List {
        /// Article IDs (comma-separated or repeated)
        #[arg(long, required = true, value_delimiter = ',')]
        ids: Vec<i64>,
    },
}

/// Cache management subcommands
#[derive(Subcommand, Debug)]
pub enum CacheCommands {
    /// Delete every cached article
    Clear,

    /// Print the cache database path
    Path,
}
