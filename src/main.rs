//! kbsync CLI - keep a local copy of the support knowledge base

use clap::{CommandFactory, Parser};

mod cli;
mod models;
mod output;

use cli::args::GlobalOptions;
use cli::{AuthCommands, CacheCommands, Cli, Commands, TagCommands};
use kbsync::error::Result;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.debug);

    if let Err(err) = run(cli).await {
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }
}

/// `warn` by default, `debug` under `--debug`; `RUST_LOG` overrides both.
fn init_logging(debug: bool) {
    let default = if debug { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default))
        .format_timestamp(None)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let opts = GlobalOptions::from_cli(&cli);

    match cli.command {
        Commands::Auth(cmd) => match cmd {
            AuthCommands::Set { key } => cli::auth::set(&opts, key),
            AuthCommands::Check => cli::auth::check(&opts).await,
            AuthCommands::Clear => cli::auth::clear(&opts),
        },
        Commands::Status => cli::status::run(&opts),
        Commands::Sync(args) => cli::sync::run(&opts, &args).await,
        Commands::List { limit } => cli::articles::list(&opts, limit),
        Commands::Show { id } => cli::articles::show(&opts, id),
        Commands::Tag(cmd) => match cmd {
            TagCommands::Add { tag, ids } => {
                cli::tag::apply(&opts, cli::tag::TagEdit::Add, &tag, &ids).await
            }
            TagCommands::Remove { tag, ids } => {
                cli::tag::apply(&opts, cli::tag::TagEdit::Remove, &tag, &ids).await
            }
            TagCommands::List { ids } => cli::tag::list(&opts, &ids),
        },
        Commands::Cache(cmd) => match cmd {
            CacheCommands::Clear => cli::cache::clear(&opts),
            CacheCommands::Path => cli::cache::path(&opts),
        },
        Commands::Completion { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "kbsync", &mut std::io::stdout());
            Ok(())
        }
    }
}
