//! CLI tool to preview and apply a script diff to a schedule document.
//!
//! Usage:
//!   schedule-reconcile --schedule project.automerge --diff diff.json [--apply] [--stats]
//!   schedule-reconcile --import scenes.json --output project.automerge [--recalculate-pages]

mod input;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use heyoschedule::{
    format_eighths, EstimatorConfig, ImpactSummarizer, PageLengthEstimator, ScheduleImport,
    ScheduleManager, ScheduleReconciler,
};
use input::InputDiff;

#[derive(Parser, Debug)]
#[command(
    name = "schedule-reconcile",
    about = "Preview and apply script changes to a shooting schedule",
    version
)]
struct Args {
    /// Schedule document (Automerge binary)
    #[arg(short, long, conflicts_with = "import")]
    schedule: Option<PathBuf>,

    /// Build the schedule from a scene-list export (JSON) instead
    #[arg(long)]
    import: Option<PathBuf>,

    /// Differ output (JSON)
    #[arg(short, long)]
    diff: Option<PathBuf>,

    /// Apply the diff; without this only the impact summary is printed
    #[arg(long, default_value = "false")]
    apply: bool,

    /// Re-estimate page lengths of all scenes from their paragraphs
    #[arg(long, default_value = "false")]
    recalculate_pages: bool,

    /// Output file path (defaults to the schedule path, or the import path with .automerge)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Characters per printed line for page estimates
    #[arg(long, env = "HEYO_CHARS_PER_LINE", default_value_t = 60)]
    chars_per_line: u32,

    /// Lines per page for page estimates
    #[arg(long, env = "HEYO_LINES_PER_PAGE", default_value_t = 55)]
    lines_per_page: u32,

    /// Print per-day totals after the run
    #[arg(long, default_value = "false")]
    stats: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let estimator = PageLengthEstimator::with_config(EstimatorConfig {
        chars_per_line: args.chars_per_line,
        lines_per_page: args.lines_per_page,
    });

    // 1. Load or build the schedule
    let (manager, default_output) = match (&args.schedule, &args.import) {
        (Some(path), _) => {
            let bytes = std::fs::read(path)
                .with_context(|| format!("Failed to read schedule {}", path.display()))?;
            let manager =
                ScheduleManager::from_bytes(&bytes).context("Failed to load schedule document")?;
            (manager, path.clone())
        }
        (None, Some(path)) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read import {}", path.display()))?;
            let root = ScheduleImport::from_json(&json)
                .and_then(|import| import.into_root(&estimator))
                .context("Failed to resolve scene-list export")?;
            let manager =
                ScheduleManager::from_root(root).context("Failed to create schedule document")?;
            (manager, path.with_extension("automerge"))
        }
        (None, None) => anyhow::bail!("Either --schedule or --import is required"),
    };
    let mut manager = manager.with_estimator(estimator);
    let mut changed = args.import.is_some();

    // 2. Preview and optionally apply the diff
    if let Some(diff_path) = &args.diff {
        let json = std::fs::read_to_string(diff_path).context("Failed to read diff file")?;
        let input: InputDiff = serde_json::from_str(&json).context("Failed to parse diff JSON")?;
        let state = manager.get_state().context("Failed to hydrate schedule")?;
        let diff = input.resolve(&state)?;

        let impact = ImpactSummarizer::summarize(&diff);
        println!("Impact: {}", impact.summary);

        if args.apply {
            let reconciler = ScheduleReconciler::new().with_estimator(estimator);
            let report = manager
                .reconcile(&diff, &reconciler)
                .context("Reconciliation failed; schedule left unchanged")?;
            println!(
                "Applied {} change(s): {} added, {} unscheduled",
                diff.len(),
                report.scenes_added.len(),
                report.scenes_unscheduled.len()
            );
            for warning in report.warnings() {
                println!("  warning: {:?}", warning);
            }
            changed = true;
        }
    }

    // 3. Optional bulk page recalculation
    if args.recalculate_pages {
        let updates = manager
            .recalculate_page_lengths()
            .context("Failed to recalculate page lengths")?;
        for update in &updates {
            println!(
                "  {}: {} -> {}",
                update.scene_id,
                format_eighths(update.old_eighths),
                format_eighths(update.new_eighths)
            );
        }
        println!("Recalculated {} scene length(s)", updates.len());
        changed |= !updates.is_empty();
    }

    // 4. Write output
    if changed {
        let output_path = args.output.clone().unwrap_or(default_output);
        std::fs::write(&output_path, manager.save()).context("Failed to write output file")?;
        println!("Wrote {}", output_path.display());
    }

    // 5. Optional stats
    if args.stats {
        println!();
        println!("Shoot days:");
        for day in manager.days_in_order()? {
            println!(
                "  {:<12} {:<10} {:>3} scene(s) {:>8} pages",
                day.date,
                day.label.as_deref().unwrap_or(""),
                day.scene_count,
                format_eighths(day.total_page_eighths)
            );
        }
        println!("  Unscheduled: {}", manager.unscheduled_scenes()?.len());
    }

    Ok(())
}
