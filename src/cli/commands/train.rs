//! Train command - run the controller headless and report what it learned

use std::{
    fs::File,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use serde::Serialize;
use serde_json::to_writer_pretty;

use crate::{
    cli::output::{format_number, print_kv, print_section},
    config::ControllerConfig,
    pipeline::{
        MetricsObserver, MetricsSummary, ProgressObserver, RunConfig, TrainingPipeline,
        TrainingResult,
    },
    q_learning::TableLayout,
    training::TrainingLoop,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LayoutArg {
    Dense,
    Sparse,
}

impl From<LayoutArg> for TableLayout {
    fn from(arg: LayoutArg) -> Self {
        match arg {
            LayoutArg::Dense => TableLayout::Dense,
            LayoutArg::Sparse => TableLayout::Sparse,
        }
    }
}

#[derive(Parser, Debug)]
#[command(about = "Train the navigation controller", allow_negative_numbers = true)]
pub struct TrainArgs {
    /// JSON configuration file; missing fields use the defaults
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,

    /// Number of ticks to run
    #[arg(long, short = 't', default_value_t = 10_000)]
    pub ticks: u64,

    /// Random seed for reproducibility
    #[arg(long)]
    pub seed: Option<u64>,

    /// Override the initial exploration rate
    #[arg(long)]
    pub exploration_rate: Option<f64>,

    /// Override the per-episode exploration decay
    #[arg(long)]
    pub exploration_decay: Option<f64>,

    /// Override the exploration floor
    #[arg(long)]
    pub min_exploration_rate: Option<f64>,

    /// Value table storage
    #[arg(long, value_enum)]
    pub table_layout: Option<LayoutArg>,

    /// Optional path for writing a summary JSON file
    #[arg(long)]
    pub summary: Option<PathBuf>,

    /// Hide the progress bar
    #[arg(long, default_value_t = false)]
    pub no_progress: bool,
}

#[derive(Debug, Serialize)]
struct TrainingSummaryFile<'a> {
    training: &'a TrainingResult,
    metrics: MetricsSummary,
    config: &'a ControllerConfig,
}

/// Load the configuration file (if any) and apply command-line overrides
pub(crate) fn resolve_config(path: Option<&Path>) -> Result<ControllerConfig> {
    match path {
        Some(path) => ControllerConfig::load(path)
            .with_context(|| format!("failed to load configuration from {}", path.display())),
        None => Ok(ControllerConfig::default()),
    }
}

fn apply_overrides(mut config: ControllerConfig, args: &TrainArgs) -> ControllerConfig {
    if let Some(seed) = args.seed {
        config.seed = Some(seed);
    }
    if let Some(rate) = args.exploration_rate {
        config.exploration_rate = rate;
        if args.min_exploration_rate.is_none() {
            config.min_exploration_rate = config.min_exploration_rate.min(rate);
        }
    }
    if let Some(decay) = args.exploration_decay {
        config.exploration_decay = decay;
    }
    if let Some(min_rate) = args.min_exploration_rate {
        config.min_exploration_rate = min_rate;
    }
    if let Some(layout) = args.table_layout {
        config.table_layout = layout.into();
    }
    config
}

fn sanitize_summary_path(raw: &Path) -> PathBuf {
    let mut normalized = raw.to_path_buf();
    let raw_str = raw.as_os_str().to_string_lossy();

    // Treat trailing separators or missing filename as a directory target.
    if raw_str.ends_with(std::path::MAIN_SEPARATOR) || normalized.file_name().is_none() {
        normalized.push("training_summary.json");
        return normalized;
    }

    match normalized.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("json") => normalized,
        _ => {
            normalized.set_extension("json");
            normalized
        }
    }
}

fn write_summary(
    raw_path: &Path,
    result: &TrainingResult,
    metrics: MetricsSummary,
    config: &ControllerConfig,
) -> Result<PathBuf> {
    let path = sanitize_summary_path(raw_path);
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let file =
        File::create(&path).with_context(|| format!("failed to create {}", path.display()))?;
    let summary = TrainingSummaryFile {
        training: result,
        metrics,
        config,
    };
    to_writer_pretty(file, &summary)
        .with_context(|| format!("failed to write summary to {}", path.display()))?;
    Ok(path)
}

pub fn execute(args: TrainArgs) -> Result<()> {
    let config = apply_overrides(resolve_config(args.config.as_deref())?, &args);
    let mut controller =
        TrainingLoop::new(config.clone()).context("refusing to start training")?;

    let metrics = MetricsObserver::new();
    let metrics_handle = metrics.handle();
    let mut pipeline =
        TrainingPipeline::new(RunConfig { ticks: args.ticks }).with_observer(Box::new(metrics));
    if !args.no_progress {
        pipeline = pipeline.with_observer(Box::new(ProgressObserver::new()));
    }

    tracing::info!(
        ticks = args.ticks,
        seed = ?config.seed,
        epsilon = config.exploration_rate,
        "starting training"
    );
    let result = pipeline.run(&mut controller).context("training failed")?;
    let metrics_summary = metrics_handle
        .lock()
        .map_err(|_| anyhow::anyhow!("metrics observer lock poisoned"))?
        .summary();

    print_section("Training Summary");
    print_kv("Ticks", &format_number(result.total_ticks as usize));
    print_kv("Episodes", &format_number(result.episodes));
    print_kv(
        "Goals reached",
        &format!("{} ({:.1}%)", result.goals_reached, result.goal_rate * 100.0),
    );
    print_kv("Timeouts", &format_number(result.timeouts));
    print_kv("Falls", &format_number(result.falls));
    print_kv("Mean return", &format!("{:.3}", result.mean_episode_reward));
    if let Some(best) = result.best_episode_reward {
        print_kv("Best return", &format!("{best:.3}"));
    }
    print_kv(
        "Avg episode ticks",
        &format!("{:.1}", metrics_summary.avg_episode_length),
    );
    print_kv("Final epsilon", &format!("{:.4}", result.final_epsilon));
    print_kv("Visited states", &format_number(result.visited_states));

    if let Some(raw) = &args.summary {
        let path = write_summary(raw, &result, metrics_summary, &config)?;
        println!("\nSummary written to {}", path.display());
    }

    Ok(())
}
