//! Sync command implementation

use std::collections::HashSet;
use std::time::{Duration, Instant};

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use log::debug;
use tokio_util::sync::CancellationToken;

use crate::cli::args::GlobalOptions;
use crate::cli::{CommandContext, OutputFormat, SyncArgs};
use crate::models::{FailureDisplay, SummaryDisplay};
use crate::output::Formattable;
use crate::output::formatters::format_elapsed;
use crate::output::json::format_json;
use kbsync::client::SearchFilter;
use kbsync::error::Result;
use kbsync::sync::{SyncPhase, SyncReport};

/// Build the search filter from command-line arguments
pub fn build_filter(args: &SyncArgs) -> SearchFilter {
    let mut filter = SearchFilter::new();
    if let Some(text) = &args.search {
        filter = filter.search_text(text.clone());
    }
    if let Some(category) = args.category {
        filter = filter.category(category);
    }
    if args.published {
        filter = filter.published(true);
    }
    if let Some(limit) = args.limit {
        filter = filter.return_count(limit);
    }
    filter
}

/// Run one sync cycle; Ctrl-C cancels it without touching the cache.
pub async fn run(opts: &GlobalOptions, args: &SyncArgs) -> Result<()> {
    let ctx = CommandContext::new(opts)?;
    let filter = build_filter(args);
    debug!("Sync filter: {:?}", filter);

    let spinner = (ctx.format != OutputFormat::Json).then(new_spinner);
    let mut phases = ctx.app.engine().subscribe();
    let cancel = CancellationToken::new();
    let started = Instant::now();

    let cycle = ctx.app.sync_with_cancel(&filter, &cancel);
    tokio::pin!(cycle);

    let result = loop {
        tokio::select! {
            result = &mut cycle => break result,
            Ok(()) = phases.changed() => {
                let phase = *phases.borrow_and_update();
                if let Some(pb) = &spinner {
                    pb.set_message(describe(phase));
                }
            }
            _ = tokio::signal::ctrl_c(), if !cancel.is_cancelled() => {
                if let Some(pb) = &spinner {
                    pb.set_message("Cancelling...");
                }
                cancel.cancel();
            }
        }
    };

    if let Some(pb) = &spinner {
        pb.finish_and_clear();
    }
    let report = result?;

    print_report(&report, ctx.format, started.elapsed())
}

fn new_spinner() -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message("Starting sync...");
    pb
}

fn describe(phase: SyncPhase) -> String {
    match phase {
        SyncPhase::Idle => "Finishing...".to_string(),
        SyncPhase::FetchingSummaries => "Searching articles...".to_string(),
        SyncPhase::FetchingDetails { index, total } => {
            format!("Fetching article {}/{}...", index, total)
        }
        SyncPhase::Pushing { index, total } => format!("Pushing article {}/{}...", index, total),
        SyncPhase::Failed => "Sync failed".to_string(),
    }
}

fn print_report(report: &SyncReport, format: OutputFormat, elapsed: Duration) -> Result<()> {
    if format == OutputFormat::Json {
        println!("{}", format_json(report)?);
        return Ok(());
    }

    let cached: HashSet<i64> = report.cached.iter().copied().collect();
    let rows: Vec<SummaryDisplay> = report
        .summaries
        .iter()
        .map(|s| SummaryDisplay::new(s, cached.contains(&s.id)))
        .collect();
    rows.print(format)?;

    let line = format!(
        "Cached {} of {} articles in {}",
        report.cached.len(),
        report.summaries.len(),
        format_elapsed(elapsed)
    );
    if report.is_complete() {
        println!("{} {}", "✓".green(), line);
    } else {
        println!("{} {}", "⚠".yellow(), line);
        let failures: Vec<FailureDisplay> = report.failures.iter().map(Into::into).collect();
        failures.print(format)?;
    }
    Ok(())
}
