//! mood-detect: EEG board → mood classification → serial actuator

mod actuator;
mod brainflow;
mod cli;

use actuator::{EchoActuator, SerialActuator, StdoutActuator};
use anyhow::{bail, Context, Result};
use brainflow::BrainFlowBoard;
use clap::Parser;
use cli::{ActuatorArgs, Cli, SourceCommand};
use mood_core::{AcquisitionSource, ActuatorSink};
use mood_processing::{LoopCommand, LoopEvent, LoopOutcome, MoodConfig, ShutdownReason, StreamingLoop};
use mood_simulation::{presets, ReplayBoard, SimulatedBoard, SimulationConfig};
use std::future::Future;
use std::process::ExitCode;
use std::time::Duration;
use tokio::sync::{broadcast, watch};
use tracing::{info, Level};

const INTERRUPTED: &str = "interrupted";

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    match run(cli).await {
        Ok(outcome) => {
            if let ShutdownReason::Requested(_) = outcome.reason {
                println!("\nStopping mood detection...");
            }
            info!(
                ticks = outcome.ticks,
                labels = outcome.labels_emitted,
                failed = outcome.failed_ticks,
                "Session finished"
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: u8, quiet: bool) {
    let level = if quiet {
        Level::ERROR
    } else {
        match verbose {
            0 => Level::INFO,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };

    // Logs go to stderr, stdout carries the labels
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<LoopOutcome> {
    let config = cli.pipeline.resolve().context("invalid configuration")?;

    let (interrupt_sender, mut interrupted) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = interrupt_sender.send(true);
        }
    });
    // Let the listener register before board setup blocks the runtime
    tokio::task::yield_now().await;

    let setup = async {
        let (source, source_ticks) = open_source(&cli.source, &config)?;
        let sink = open_actuator(&cli.actuator).await?;
        Ok::<_, anyhow::Error>((source, source_ticks, sink))
    };
    let Some((source, source_ticks, sink)) = until_interrupted(setup, &mut interrupted).await? else {
        info!("Interrupted during setup");
        return Ok(LoopOutcome {
            ticks: 0,
            labels_emitted: 0,
            failed_ticks: 0,
            baseline: None,
            reason: ShutdownReason::Requested(INTERRUPTED.to_string()),
        });
    };

    let mut stream = StreamingLoop::new(config, source, sink)?;
    if let Some(ticks) = cli.max_ticks.or(source_ticks) {
        stream = stream.with_tick_limit(ticks);
    }

    let control = stream.control_handle();
    tokio::spawn(async move {
        if interrupted.changed().await.is_ok() {
            let _ = control
                .send(LoopCommand::Shutdown {
                    reason: INTERRUPTED.to_string(),
                })
                .await;
        }
    });

    let printer = tokio::spawn(print_progress(stream.subscribe()));
    let result = stream.run().await;

    // Closing the event channel lets the printer drain and finish
    drop(stream);
    let _ = printer.await;

    result.context("mood detection stopped")
}

/// Output of `setup`, or `None` when an interrupt arrives first. Anything
/// `setup` opened so far is dropped, and so released, on interrupt.
async fn until_interrupted<T>(
    setup: impl Future<Output = Result<T>>,
    interrupted: &mut watch::Receiver<bool>,
) -> Result<Option<T>> {
    tokio::select! {
        opened = setup => opened.map(Some),
        Ok(()) = interrupted.changed() => Ok(None),
    }
}

/// Acquisition source for the selected command, with a natural tick limit
/// for finite sources
fn open_source(command: &SourceCommand, config: &MoodConfig) -> Result<(Box<dyn AcquisitionSource>, Option<u64>)> {
    match command {
        SourceCommand::Simulated(args) => {
            let Some((name, phases)) = presets()
                .into_iter()
                .find(|(name, _)| name.to_lowercase().starts_with(&args.scenario.to_lowercase()))
            else {
                bail!("unknown scenario '{}'", args.scenario);
            };
            info!(scenario = name, "Simulated session");

            let board = SimulatedBoard::new(SimulationConfig {
                sampling_rate: config.sampling_rate,
                channel_count: config.channel_count,
                phases,
                powerline_freq: args.powerline,
                seed: args.seed,
                ..SimulationConfig::default()
            })?;
            Ok((Box::new(board), None))
        }
        SourceCommand::Replay(args) => {
            let board = ReplayBoard::from_csv(&args.path, config.sampling_rate, args.eeg_rows.clone())
                .with_context(|| format!("cannot replay {}", args.path.display()))?
                .looping(args.looping);
            let ticks = (!args.looping).then(|| board.window_count(config.window_size()));
            Ok((Box::new(board), ticks))
        }
        SourceCommand::Brainflow(args) => {
            let board = BrainFlowBoard::new(&args.port, args.board_id).context("BrainFlow board unavailable")?;
            Ok((Box::new(board), None))
        }
    }
}

async fn open_actuator(args: &ActuatorArgs) -> Result<Box<dyn ActuatorSink>> {
    let Some(port) = &args.serial_port else {
        return Ok(Box::new(StdoutActuator::default()));
    };

    let serial = SerialActuator::open(port, args.baud).with_context(|| {
        format!(
            "cannot open actuator port (available: {})",
            SerialActuator::list_ports().join(", ")
        )
    })?;

    // Opening the port resets most microcontroller boards
    tokio::time::sleep(Duration::from_millis(args.settle_ms)).await;
    Ok(Box::new(EchoActuator::new(serial)))
}

async fn print_progress(mut events: broadcast::Receiver<LoopEvent>) {
    loop {
        match events.recv().await {
            Ok(LoopEvent::CalibrationStarted { seconds }) => {
                println!("Building baseline for {} seconds...", seconds);
            }
            Ok(LoopEvent::Calibrated { baseline }) => {
                println!("Baseline set: {}", baseline);
                println!("\nMood Detection Per Second:\n");
            }
            Ok(_) => {}
            Err(broadcast::error::RecvError::Lagged(_)) => continue,
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_interrupt_cancels_setup() {
        let (sender, mut interrupted) = watch::channel(false);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(500)).await;
            let _ = sender.send(true);
        });

        // Stands in for the actuator settle delay
        let setup = async {
            tokio::time::sleep(Duration::from_secs(2)).await;
            Ok(42)
        };

        assert_eq!(until_interrupted(setup, &mut interrupted).await.unwrap(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_setup_completes_without_interrupt() {
        let (_sender, mut interrupted) = watch::channel(false);
        let setup = async {
            tokio::time::sleep(Duration::from_secs(2)).await;
            Ok(42)
        };

        assert_eq!(until_interrupted(setup, &mut interrupted).await.unwrap(), Some(42));
    }

    #[tokio::test]
    async fn test_setup_error_propagates() {
        let (_sender, mut interrupted) = watch::channel(false);
        let setup = async { Err::<u32, _>(anyhow::anyhow!("no board")) };

        assert!(until_interrupted(setup, &mut interrupted).await.is_err());
    }
}
