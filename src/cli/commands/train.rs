//! Train command - Train the catcher on the built-in simulator

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use tracing::info;

use crate::{
    cli::{
        commands::{
            TableArgs, load_config, load_starting_table, sanitize_summary_path, write_summary,
        },
        output::{format_number, format_percent, print_section, print_stats_table},
    },
    config::CatcherConfig,
    pipeline::{
        JsonlObserver, MetricsObserver, MetricsSummary, ProgressObserver, SharedObserver,
        TrainingConfig, TrainingLoop, TrainingResult,
    },
    q_learning::PolicyAgent,
    simulation::Orchard,
};

#[derive(Debug, Serialize)]
struct TrainingSummaryFile {
    training: TrainingResult,
    metrics: MetricsSummary,
    config: CatcherConfig,
    metadata: SummaryMetadata,
}

#[derive(Debug, Serialize)]
struct SummaryMetadata {
    table: String,
    format: String,
    initial_table_size: usize,
    fresh: bool,
    seed: Option<u64>,
}

#[derive(Parser, Debug)]
#[command(about = "Train the catcher", allow_negative_numbers = true)]
pub struct TrainArgs {
    #[command(flatten)]
    pub table: TableArgs,

    /// Number of episodes (resolved objects) to train for
    #[arg(long, short = 'e', default_value_t = 500)]
    pub episodes: usize,

    /// JSON configuration file (hyperparameters, reward, world, schedule)
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,

    /// Random seed for reproducibility (the simulator uses seed+1)
    #[arg(long)]
    pub seed: Option<u64>,

    /// Learning rate α (0.0-1.0)
    #[arg(long)]
    pub learning_rate: Option<f64>,

    /// Discount factor γ (0.0-1.0)
    #[arg(long)]
    pub discount_factor: Option<f64>,

    /// Initial exploration rate ε (0.0-1.0)
    #[arg(long)]
    pub exploration_rate: Option<f64>,

    /// Multiplicative ε decay per episode
    #[arg(long)]
    pub exploration_decay: Option<f64>,

    /// Floor for ε
    #[arg(long)]
    pub exploration_min: Option<f64>,

    /// Ignore any existing table and start from empty
    #[arg(long, default_value_t = false)]
    pub fresh: bool,

    /// Start from an empty table if the existing one is corrupt
    #[arg(long, default_value_t = false)]
    pub recover_corrupt: bool,

    /// Optional file for JSONL episode observations
    #[arg(long)]
    pub observations: Option<PathBuf>,

    /// Optional path for writing a summary JSON file
    #[arg(long)]
    pub summary: Option<PathBuf>,

    /// Hide the progress bar
    #[arg(long, default_value_t = false)]
    pub no_progress: bool,

    /// Abort if the episodes are not done after this many ticks
    #[arg(long)]
    pub max_ticks: Option<u64>,

    /// Log a progress report every N ticks (0 disables)
    #[arg(long)]
    pub report_every: Option<u64>,
}

impl TrainArgs {
    /// Config file (or defaults) with command-line overrides applied
    pub fn resolve_config(&self) -> Result<CatcherConfig> {
        let mut config = load_config(self.config.as_deref())?;

        let mut hyperparameters = config.hyperparameters;
        if let Some(value) = self.learning_rate {
            hyperparameters = hyperparameters.with_learning_rate(value);
        }
        if let Some(value) = self.discount_factor {
            hyperparameters = hyperparameters.with_discount_factor(value);
        }
        if let Some(value) = self.exploration_rate {
            hyperparameters = hyperparameters.with_exploration_rate(value);
        }
        if let Some(value) = self.exploration_decay {
            hyperparameters = hyperparameters.with_exploration_decay(value);
        }
        if let Some(value) = self.exploration_min {
            hyperparameters = hyperparameters.with_exploration_min(value);
        }
        config.hyperparameters = hyperparameters;

        if let Some(every) = self.report_every {
            config.schedule.report_every_ticks = every;
        }

        config.validate().context("Invalid training configuration")?;
        Ok(config)
    }
}

pub fn execute(args: TrainArgs) -> Result<()> {
    let config = args.resolve_config()?;
    let format = args.table.format();
    let repository = args.table.repository();

    let table = load_starting_table(repository.as_ref(), args.fresh, args.recover_corrupt)?;
    let initial_table_size = table.len();
    info!(
        table = %repository.location(),
        %format,
        states = initial_table_size,
        "loaded Q-table"
    );

    let mut agent = PolicyAgent::new(&config)?.with_q_table(table);
    let mut orchard = Orchard::new(config.world);
    if let Some(seed) = args.seed {
        agent = agent.with_seed(seed);
        orchard = orchard.with_seed(seed.wrapping_add(1));
    }

    let summary_spec = args.summary.as_ref().map(|raw| {
        let sanitized = sanitize_summary_path(raw, "training_summary.json");
        let normalized = sanitized != *raw;
        (sanitized, normalized)
    });

    let metrics = SharedObserver::new(MetricsObserver::new());
    let mut training = TrainingLoop::new(TrainingConfig {
        episodes: args.episodes,
        schedule: config.schedule,
        max_ticks: args.max_ticks,
    })
    .with_repository(repository)
    .with_observer(Box::new(metrics.clone()));

    if !args.no_progress {
        training = training.with_observer(Box::new(ProgressObserver::new()));
    }
    if let Some(observations_path) = &args.observations {
        let jsonl_observer = JsonlObserver::new(observations_path).with_context(|| {
            format!(
                "Failed to create observations file {}",
                observations_path.display()
            )
        })?;
        training = training.with_observer(Box::new(jsonl_observer));
    }

    println!(
        "Training for {} episodes ({} states loaded from {})",
        format_number(args.episodes),
        format_number(initial_table_size),
        args.table.table.display()
    );

    let result = training.run(&mut agent, &mut orchard)?;
    let metrics_summary = metrics.lock().summary();

    print_section("Training Results");
    print_stats_table(&[
        ("Episodes", format_number(result.episodes)),
        ("Caught", format_number(result.caught)),
        ("Missed", format_number(result.missed)),
        ("Success rate", format_percent(result.success_rate)),
        (
            "Recent success",
            format!(
                "{} (last {})",
                format_percent(metrics_summary.rolling_success_rate),
                metrics_summary.rolling_window
            ),
        ),
        ("Mean reward", format!("{:.2}", metrics_summary.mean_reward)),
        ("Exploration rate", format!("{:.4}", result.final_exploration_rate)),
        ("Table size", format_number(result.table_size)),
        ("Ticks", format_number(result.ticks as usize)),
    ]);
    if result.lost > 0 {
        println!("  ({} tracked objects vanished before resolving)", result.lost);
    }
    println!("\n✓ Q-table saved to: {}", args.table.table.display());

    if let Some((summary_path, normalized)) = summary_spec {
        if normalized {
            println!(
                "\n⚠️  Normalizing summary path to {}",
                summary_path.display()
            );
        }

        let summary = TrainingSummaryFile {
            training: result,
            metrics: metrics_summary,
            config,
            metadata: SummaryMetadata {
                table: args.table.table.display().to_string(),
                format: format.to_string(),
                initial_table_size,
                fresh: args.fresh,
                seed: args.seed,
            },
        };
        write_summary(&summary_path, &summary)?;
        println!("\nSummary written to {}", summary_path.display());
    }

    Ok(())
}
