use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use contention_harness::law::timing::expected_elapsed;
use contention_harness::{
    CancellationFlag, ExecutionResult, GuardMode, HarnessConfig, HarnessError, SharedSink,
    Strategy, TicketPool, TracingSink, WorkloadExecutor, measure_responsiveness,
};

#[derive(Debug, Parser)]
#[command(name = "harness")]
#[command(about = "Compare scheduling strategies and reproduce a check-then-act race")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the workload under one strategy.
    Workload {
        /// Scheduling strategy.
        #[arg(long, value_enum)]
        strategy: StrategyArg,
        #[command(flatten)]
        shape: WorkloadArgs,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Run the same workload under every strategy.
    Compare {
        #[command(flatten)]
        shape: WorkloadArgs,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Let concurrent buyers race for a single ticket.
    Contention {
        /// Acquire path used by every buyer.
        #[arg(long, value_enum)]
        mode: ModeArg,
        /// Concurrent buyers per trial.
        #[arg(long)]
        buyers: Option<usize>,
        /// Trials to run. One trial prints the full attempt log.
        #[arg(long)]
        trials: Option<usize>,
        /// Delay between check and act, in milliseconds.
        #[arg(long)]
        race_window_ms: Option<u64>,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Count heartbeats a blocking and a suspending run leave room for.
    Responsiveness {
        /// Number of work items.
        #[arg(long)]
        items: Option<usize>,
        /// Cost of each item in milliseconds.
        #[arg(long)]
        cost_ms: Option<u64>,
        /// Heartbeat interval in milliseconds.
        #[arg(long, default_value_t = 50)]
        tick_ms: u64,
    },
}

#[derive(Debug, Args)]
struct WorkloadArgs {
    /// Number of work items.
    #[arg(long)]
    items: Option<usize>,
    /// Cost of each item in milliseconds.
    #[arg(long)]
    cost_ms: Option<u64>,
    /// Worker bound for the pool strategy.
    #[arg(long)]
    parallelism: Option<usize>,
}

#[derive(Debug, Args)]
struct OutputArgs {
    /// Print JSON instead of progress lines.
    #[arg(long)]
    json: bool,
    /// Also write the JSON result to this file.
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum StrategyArg {
    /// Blocking, one item at a time
    Sequential,
    /// Suspending, one item at a time
    Cooperative,
    /// Suspending, all items at once
    Fanout,
    /// Blocking, bounded worker threads
    Pool,
}

impl From<StrategyArg> for Strategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Sequential => Strategy::Sequential,
            StrategyArg::Cooperative => Strategy::Cooperative,
            StrategyArg::Fanout => Strategy::ConcurrentFanout,
            StrategyArg::Pool => Strategy::ParallelWorkerPool,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModeArg {
    /// No mutual exclusion
    Unguarded,
    /// Pool-wide lock around check and act
    Guarded,
}

impl From<ModeArg> for GuardMode {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::Unguarded => GuardMode::Unguarded,
            ModeArg::Guarded => GuardMode::Guarded,
        }
    }
}

fn make_config(shape: Option<&WorkloadArgs>) -> HarnessConfig {
    let mut config = HarnessConfig::default();
    if let Some(shape) = shape {
        if let Some(items) = shape.items {
            config = config.with_item_count(items);
        }
        if let Some(cost_ms) = shape.cost_ms {
            config = config.with_unit_cost(Duration::from_millis(cost_ms));
        }
        if let Some(parallelism) = shape.parallelism {
            config = config.with_parallelism(parallelism);
        }
    }
    config
}

fn progress_sink(output: &OutputArgs) -> SharedSink {
    if output.json {
        Arc::new(TracingSink)
    } else {
        Arc::new(|line: &str| println!("{line}"))
    }
}

fn emit<T: Serialize>(value: &T, output: &OutputArgs, human: impl FnOnce()) -> Result<()> {
    if let Some(path) = &output.output {
        let text = serde_json::to_string_pretty(value)?;
        fs::write(path, text).with_context(|| format!("writing {}", path.display()))?;
    }
    if output.json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        human();
    }
    Ok(())
}

fn print_result_line(result: &ExecutionResult, parallelism: usize) {
    let expected = expected_elapsed(result, parallelism);
    println!(
        "{:<12} elapsed={:>10.1?} expected={:>10.1?} workers={}",
        result.strategy.to_string(),
        result.elapsed,
        expected,
        result.worker_count()
    );
}

fn current_thread_runtime() -> Result<tokio::runtime::Runtime> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(HarnessError::from)?;
    Ok(runtime)
}

fn install_interrupt(flag: &CancellationFlag) -> Result<()> {
    let flag = flag.clone();
    ctrlc::set_handler(move || flag.cancel()).context("installing Ctrl-C handler")?;
    Ok(())
}

fn run(cli: Cli) -> Result<()> {
    let cancellation = CancellationFlag::new();
    install_interrupt(&cancellation)?;
    let executor = WorkloadExecutor::with_cancellation(cancellation);

    match cli.command {
        Command::Workload {
            strategy,
            shape,
            output,
        } => {
            let config = make_config(Some(&shape));
            let params = config.workload_params()?;
            let runtime = current_thread_runtime()?;
            let result = runtime.block_on(executor.run(
                strategy.into(),
                params,
                config.parallelism,
                progress_sink(&output),
            ))?;
            emit(&result, &output, || {
                print_result_line(&result, config.parallelism)
            })?;
        }
        Command::Compare { shape, output } => {
            let config = make_config(Some(&shape));
            let params = config.workload_params()?;
            let runtime = current_thread_runtime()?;
            let sink = progress_sink(&output);
            let mut results = Vec::with_capacity(Strategy::ALL.len());
            for strategy in Strategy::ALL {
                results.push(runtime.block_on(executor.run(
                    strategy,
                    params,
                    config.parallelism,
                    Arc::clone(&sink),
                ))?);
            }
            emit(&results, &output, || {
                println!();
                for result in &results {
                    print_result_line(result, config.parallelism);
                }
            })?;
        }
        Command::Contention {
            mode,
            buyers,
            trials,
            race_window_ms,
            output,
        } => {
            let mut config = make_config(None).with_trials(1);
            if let Some(buyers) = buyers {
                config = config.with_buyer_count(buyers);
            }
            if let Some(trials) = trials {
                config = config.with_trials(trials);
            }
            if let Some(race_window_ms) = race_window_ms {
                config = config.with_race_window(Duration::from_millis(race_window_ms));
            }

            let mode = GuardMode::from(mode);
            let mut pool = TicketPool::with_race_window(config.race_window);
            if config.trials == 1 {
                let outcome = pool.simulate_concurrent_purchases(config.buyer_count, mode)?;
                emit(&outcome, &output, || {
                    for attempt in &outcome.log {
                        println!("{attempt}");
                    }
                    println!(
                        "summary: mode={}, buyers={}, success={}, fail={}, final_available={}",
                        outcome.mode,
                        outcome.buyer_count,
                        outcome.success_count,
                        outcome.fail_count,
                        outcome.final_available
                    );
                })?;
            } else {
                let summary = pool.run_trials(config.buyer_count, mode, config.trials)?;
                emit(&summary, &output, || {
                    println!(
                        "summary: mode={}, buyers={}, trials={}, oversold_trials={}, \
                         worst_final_available={}",
                        summary.mode,
                        summary.buyer_count,
                        summary.trials,
                        summary.oversold_trials,
                        summary.worst_final_available
                    );
                })?;
            }
        }
        Command::Responsiveness {
            items,
            cost_ms,
            tick_ms,
        } => {
            let config = make_config(Some(&WorkloadArgs {
                items,
                cost_ms,
                parallelism: None,
            }));
            let params = config.workload_params()?;
            let tick = Duration::from_millis(tick_ms);
            for strategy in [Strategy::Sequential, Strategy::Cooperative] {
                let report = measure_responsiveness(strategy, params, tick, Arc::new(TracingSink))?;
                println!(
                    "{:<12} heartbeats={:>4} elapsed={:.1?}",
                    strategy.to_string(),
                    report.ticks,
                    report.result.elapsed
                );
            }
        }
    }

    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Err(err) => match err.downcast_ref::<HarnessError>() {
            Some(HarnessError::Cancelled { completed }) => {
                eprintln!("cancelled after {completed} completed item(s)");
                std::process::exit(130);
            }
            _ => Err(err),
        },
        Ok(()) => Ok(()),
    }
}
