//! Headless slot round runner
//!
//! Usage:
//!   slot-round --rounds 20               - Play 20 rounds in real time
//!   slot-round --auto --rounds 100       - One auto-spin session of 100 spins
//!   slot-round --simulate --seed 7       - Simulated clock, reproducible outcomes
//!   slot-round --trace out.json          - Write the event timeline as JSON

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Parser;
use rf_slot_lab::{
    ManualScheduler, RoundController, RoundHandle, RoundTiming, SlotConfig,
    SyntheticOutcomeEngine, drain_into, spawn_round_with,
};
use rf_stage::{GameStage, RoundEvent, RoundSnapshot, RoundTrace};
use tokio::sync::broadcast;
use tokio::time::Instant;

#[derive(Parser)]
#[command(name = "slot-round", about = "Play slot rounds without a display")]
struct Cli {
    /// Rounds to play (the auto-spin budget with --auto)
    #[arg(short, long, default_value_t = 10)]
    rounds: u32,

    /// Play one auto-spin session instead of single rounds
    #[arg(short, long)]
    auto: bool,

    /// Seed the outcome engine
    #[arg(short, long)]
    seed: Option<u64>,

    /// Config file (.json, .yaml, .yml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Use turbo timing
    #[arg(long)]
    turbo: bool,

    /// Run on a simulated clock instead of waiting
    #[arg(long)]
    simulate: bool,

    /// Write the recorded trace to this file
    #[arg(long)]
    trace: Option<PathBuf>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => SlotConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => SlotConfig::default(),
    };
    if cli.turbo {
        config.timing = RoundTiming::turbo();
    }
    if cli.auto {
        config.auto_spin_budget = cli.rounds;
    }
    config.validate()?;

    let mut trace = RoundTrace::new(format!("slot-round-{}", cli.seed.unwrap_or(0)), &config.game_id)
        .with_metadata("auto", serde_json::json!(cli.auto))
        .with_metadata("simulated", serde_json::json!(cli.simulate));
    if let Some(seed) = cli.seed {
        trace = trace.with_metadata("seed", serde_json::json!(seed));
    }

    log::info!(
        "Playing {} {} ({})",
        cli.rounds,
        if cli.auto { "auto-spins" } else { "rounds" },
        if cli.simulate { "simulated" } else { "real time" }
    );

    let snapshot = if cli.simulate {
        play_simulated(&cli, config, &mut trace)?
    } else {
        play_realtime(&cli, config, &mut trace).await?
    };

    println!("Rounds completed: {}", trace.rounds_completed());
    println!("Total won:        {}", trace.total_won());
    println!("Final balance:    {}", snapshot.balance);
    println!("Bet:              {}", snapshot.bet);
    println!("Elapsed:          {:.0} ms", trace.duration_ms());

    if let Some(path) = &cli.trace {
        let json = trace.to_json()?;
        std::fs::write(path, json).with_context(|| format!("writing trace {}", path.display()))?;
        println!("Trace written to {}", path.display());
    }

    Ok(())
}

fn outcome_engine(cli: &Cli, config: &SlotConfig) -> SyntheticOutcomeEngine {
    match cli.seed {
        Some(seed) => SyntheticOutcomeEngine::with_seed(config, seed),
        None => SyntheticOutcomeEngine::new(config),
    }
}

fn millis(duration: std::time::Duration) -> f64 {
    duration.as_secs_f64() * 1000.0
}

// ═══════════════════════════════════════════════════════════════════════════════
// SIMULATED
// ═══════════════════════════════════════════════════════════════════════════════

fn play_simulated(cli: &Cli, config: SlotConfig, trace: &mut RoundTrace) -> Result<RoundSnapshot> {
    let engine = outcome_engine(cli, &config);
    let clock = ManualScheduler::new();
    let mut controller =
        RoundController::new(config, Box::new(clock.clone()))?.with_outcomes(engine);
    let mut rx = controller.subscribe();

    let rounds = if cli.auto { 1 } else { cli.rounds };
    for _ in 0..rounds {
        if !controller.request_spin(cli.auto) {
            log::warn!("Spin rejected, stopping early");
            break;
        }
        drain_into(&mut rx, trace, millis(clock.now()));

        while let Some(command) = clock.next() {
            controller.handle(command);
            drain_into(&mut rx, trace, millis(clock.now()));
        }
    }

    Ok(controller.snapshot())
}

// ═══════════════════════════════════════════════════════════════════════════════
// REAL TIME
// ═══════════════════════════════════════════════════════════════════════════════

async fn play_realtime(cli: &Cli, config: SlotConfig, trace: &mut RoundTrace) -> Result<RoundSnapshot> {
    let engine = outcome_engine(cli, &config);
    let mut handle = spawn_round_with(config, |controller| controller.with_outcomes(engine))?;
    let mut rx = handle.subscribe();
    let start = Instant::now();

    if cli.auto {
        if can_afford(&handle) {
            handle.request_spin(true)?;
            wait_for(&mut rx, trace, start, |event| {
                matches!(event, RoundEvent::AutoSpinStop { .. })
            })
            .await?;
        }
    } else {
        for _ in 0..cli.rounds {
            if !can_afford(&handle) {
                log::warn!("Balance below bet, stopping early");
                break;
            }
            handle.request_spin(false)?;
            wait_for(&mut rx, trace, start, |event| {
                matches!(event, RoundEvent::StageChange { stage: GameStage::Idle })
            })
            .await?;
        }
    }

    let snapshot = handle.snapshot();
    handle.shutdown().await?;
    Ok(snapshot)
}

fn can_afford(handle: &RoundHandle) -> bool {
    let snapshot = handle.snapshot();
    snapshot.balance >= snapshot.bet
}

/// Record events until one matches `done`
async fn wait_for<F>(
    rx: &mut broadcast::Receiver<RoundEvent>,
    trace: &mut RoundTrace,
    start: Instant,
    done: F,
) -> Result<()>
where
    F: Fn(&RoundEvent) -> bool,
{
    loop {
        match rx.recv().await {
            Ok(event) => {
                let finished = done(&event);
                trace.record(event, millis(start.elapsed()));
                if finished {
                    return Ok(());
                }
            }
            Err(broadcast::error::RecvError::Lagged(missed)) => {
                log::warn!("Trace lagged, {missed} events dropped");
            }
            Err(broadcast::error::RecvError::Closed) => bail!("round controller closed"),
        }
    }
}
