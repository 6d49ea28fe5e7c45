//! Evaluate command - Greedy run of a trained table without learning

use std::path::PathBuf;

use anyhow::{Result, bail};
use clap::Parser;
use serde::Serialize;

use crate::{
    cli::{
        commands::{TableArgs, load_config, sanitize_summary_path, write_summary},
        output::{format_number, format_percent, print_section, print_stats_table},
    },
    pipeline::{
        MetricsObserver, MetricsSummary, ProgressObserver, SharedObserver, TrainingConfig,
        TrainingLoop, TrainingResult,
    },
    q_learning::PolicyAgent,
    simulation::Orchard,
};

#[derive(Parser, Debug)]
#[command(about = "Evaluate a trained Q-table greedily")]
pub struct EvaluateArgs {
    #[command(flatten)]
    pub table: TableArgs,

    /// Number of evaluation episodes
    #[arg(long, short = 'e', default_value_t = 100)]
    pub episodes: usize,

    /// JSON configuration file (world and schedule are used; exploration is forced to 0)
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,

    /// Random seed for the simulator
    #[arg(long)]
    pub seed: Option<u64>,

    /// Optional path for writing a summary JSON file
    #[arg(long)]
    pub summary: Option<PathBuf>,

    /// Hide the progress bar
    #[arg(long, default_value_t = false)]
    pub no_progress: bool,

    /// Abort if the episodes are not done after this many ticks
    #[arg(long)]
    pub max_ticks: Option<u64>,
}

#[derive(Debug, Serialize)]
struct EvaluationSummaryFile {
    evaluation: TrainingResult,
    metrics: MetricsSummary,
    table: String,
    table_size: usize,
    seed: Option<u64>,
}

pub fn execute(args: EvaluateArgs) -> Result<()> {
    if !args.table.table.exists() {
        bail!("No Q-table found at {}", args.table.table.display());
    }

    let mut config = load_config(args.config.as_deref())?;
    config.hyperparameters = config
        .hyperparameters
        .with_exploration_rate(0.0)
        .with_exploration_min(0.0);

    let table = args.table.load()?;
    let table_size = table.len();

    let mut agent = PolicyAgent::new(&config)?.with_q_table(table).frozen();
    let mut orchard = Orchard::new(config.world);
    if let Some(seed) = args.seed {
        agent = agent.with_seed(seed);
        orchard = orchard.with_seed(seed);
    }

    let metrics = SharedObserver::new(MetricsObserver::new());
    let mut evaluation = TrainingLoop::new(TrainingConfig {
        episodes: args.episodes,
        schedule: config.schedule,
        max_ticks: args.max_ticks,
    })
    .with_observer(Box::new(metrics.clone()));
    if !args.no_progress {
        evaluation = evaluation.with_observer(Box::new(ProgressObserver::new()));
    }

    println!(
        "Evaluating {} ({} states) over {} episodes",
        args.table.table.display(),
        format_number(table_size),
        format_number(args.episodes)
    );

    let result = evaluation.run(&mut agent, &mut orchard)?;
    let metrics_summary = metrics.lock().summary();

    print_section("Evaluation Results");
    print_stats_table(&[
        ("Episodes", format_number(result.episodes)),
        ("Caught", format_number(result.caught)),
        ("Missed", format_number(result.missed)),
        ("Success rate", format_percent(result.success_rate)),
        ("Mean reward", format!("{:.2}", metrics_summary.mean_reward)),
        (
            "Decisions/episode",
            format!("{:.1}", metrics_summary.avg_decisions_per_episode),
        ),
    ]);

    if let Some(raw) = &args.summary {
        let summary_path = sanitize_summary_path(raw, "evaluation_summary.json");
        let summary = EvaluationSummaryFile {
            evaluation: result,
            metrics: metrics_summary,
            table: args.table.table.display().to_string(),
            table_size,
            seed: args.seed,
        };
        write_summary(&summary_path, &summary)?;
        println!("\nSummary written to {}", summary_path.display());
    }

    Ok(())
}
