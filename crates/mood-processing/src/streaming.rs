//! Tick-driven acquisition → classification → actuator loop

use crate::config::MoodConfig;
use crate::pipeline::{MoodPipeline, TickOutcome, WindowVerdict};
use crate::processor::ProcessingMetrics;
use mood_core::{
    AcquisitionSource, ActuatorSink, Baseline, MoodError, MoodResult, SampleWindow, WindowMetadata,
};
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, mpsc};
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

/// Commands accepted between ticks
#[derive(Debug, Clone)]
pub enum LoopCommand {
    Shutdown { reason: String },
}

/// Why the loop stopped without a fatal error
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ShutdownReason {
    /// A `LoopCommand::Shutdown` was received
    Requested(String),
    /// The configured tick limit was reached
    TickLimit(u64),
}

/// Summary of a completed session
#[derive(Debug, Clone, PartialEq)]
pub struct LoopOutcome {
    pub ticks: u64,
    pub labels_emitted: u64,
    pub failed_ticks: u64,
    pub baseline: Option<Baseline>,
    pub reason: ShutdownReason,
}

/// Progress notifications for observers of a running loop
#[derive(Debug, Clone, PartialEq)]
pub enum LoopEvent {
    CalibrationStarted { seconds: f64 },
    Calibrated { baseline: Baseline },
    Label { tick: u64, verdict: WindowVerdict },
    TickFailed { tick: u64, error: MoodError },
}

/// Owns both collaborators and releases them exactly once, on every exit path
pub struct StreamingLoop<A: AcquisitionSource, S: ActuatorSink> {
    config: MoodConfig,
    source: A,
    sink: S,
    pipeline: MoodPipeline,
    control_receiver: mpsc::Receiver<LoopCommand>,
    control_sender: mpsc::Sender<LoopCommand>,
    event_sender: broadcast::Sender<LoopEvent>,
    max_ticks: Option<u64>,
    labels_emitted: u64,
    failed_ticks: u64,
    released: bool,
}

impl<A: AcquisitionSource, S: ActuatorSink> StreamingLoop<A, S> {
    pub fn new(config: MoodConfig, source: A, sink: S) -> MoodResult<Self> {
        let pipeline = MoodPipeline::new(&config)?;
        let (control_sender, control_receiver) = mpsc::channel(8);
        let (event_sender, _) = broadcast::channel(64);

        Ok(StreamingLoop {
            config,
            source,
            sink,
            pipeline,
            control_receiver,
            control_sender,
            event_sender,
            max_ticks: None,
            labels_emitted: 0,
            failed_ticks: 0,
            released: false,
        })
    }

    /// Stop on its own after `ticks` ticks
    pub fn with_tick_limit(mut self, ticks: u64) -> Self {
        self.max_ticks = Some(ticks);
        self
    }

    /// Get control sender for sending commands
    pub fn control_handle(&self) -> mpsc::Sender<LoopCommand> {
        self.control_sender.clone()
    }

    /// Get a receiver for loop events
    pub fn subscribe(&self) -> broadcast::Receiver<LoopEvent> {
        self.event_sender.subscribe()
    }

    pub fn source(&self) -> &A {
        &self.source
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn pipeline(&self) -> &MoodPipeline {
        &self.pipeline
    }

    /// Run until shutdown or a fatal error, then release both collaborators
    pub async fn run(&mut self) -> MoodResult<LoopOutcome> {
        let result = self.run_session().await;

        if let Err(e) = &result {
            error!(error = %e, kind = e.kind(), "Streaming loop failed");
        }

        self.release();
        result
    }

    async fn run_session(&mut self) -> MoodResult<LoopOutcome> {
        self.source.start()?;

        let channel_rows = self.resolve_channels()?;
        let sampling_rate = self.source.sampling_rate();
        if (sampling_rate - self.config.sampling_rate).abs() > f64::EPSILON {
            warn!(
                board = sampling_rate,
                configured = self.config.sampling_rate,
                "Board sampling rate differs from configuration, using board rate"
            );
        }
        let window_size = (sampling_rate * self.config.window_duration).round() as usize;

        info!(
            source = self.source.name(),
            sink = self.sink.name(),
            channels = ?channel_rows,
            window_size,
            "Streaming started"
        );
        info!(seconds = self.config.baseline_window, "Calibrating baseline");
        let _ = self.event_sender.send(LoopEvent::CalibrationStarted {
            seconds: self.config.baseline_window,
        });

        let tick_interval = self.config.tick_interval();
        // The first window is read one full window after the stream starts
        let mut interval_timer = interval_at(Instant::now() + tick_interval, tick_interval);
        interval_timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut tick: u64 = 0;

        let reason = loop {
            if let Some(limit) = self.max_ticks {
                if tick >= limit {
                    break ShutdownReason::TickLimit(limit);
                }
            }

            tokio::select! {
                biased;

                command = self.control_receiver.recv() => {
                    // The loop holds a sender itself, so the channel never closes
                    if let Some(LoopCommand::Shutdown { reason }) = command {
                        info!(%reason, "Shutdown requested");
                        break ShutdownReason::Requested(reason);
                    }
                }

                _ = interval_timer.tick() => {
                    let mut timer = ProcessingMetrics::start_timing(tick);
                    timer.set_channels_processed(channel_rows.len());
                    let result = self.process_tick(tick, &channel_rows, sampling_rate, window_size);

                    let metrics = match &result {
                        Ok(()) => timer.finish(),
                        Err(e) => timer.finish_with_error(&e.to_string()),
                    };
                    debug!(
                        tick,
                        elapsed_us = metrics.processing_time_us,
                        channels = metrics.channels_processed,
                        success = metrics.success,
                        error = metrics.error_message.as_deref().unwrap_or(""),
                        "Tick processed"
                    );
                    if !metrics.within_budget(tick_interval) {
                        warn!(
                            tick,
                            elapsed_ms = metrics.processing_time().as_millis() as u64,
                            budget_ms = tick_interval.as_millis() as u64,
                            success = metrics.success,
                            "Tick processing exceeded window duration"
                        );
                    }

                    if let Err(e) = result {
                        self.handle_tick_error(tick, e)?;
                    }
                    tick += 1;
                }
            }
        };

        Ok(LoopOutcome {
            ticks: tick,
            labels_emitted: self.labels_emitted,
            failed_ticks: self.failed_ticks,
            baseline: self.pipeline.state().baseline(),
            reason,
        })
    }

    /// First `channel_count` EEG rows reported by the board
    fn resolve_channels(&self) -> MoodResult<Vec<usize>> {
        let rows = self.source.eeg_channels()?;
        if rows.len() < self.config.channel_count {
            return Err(MoodError::AcquisitionFailure {
                reason: format!(
                    "board exposes {} EEG channels, {} configured",
                    rows.len(),
                    self.config.channel_count
                ),
            });
        }
        Ok(rows.into_iter().take(self.config.channel_count).collect())
    }

    fn process_tick(
        &mut self,
        tick: u64,
        channel_rows: &[usize],
        sampling_rate: f64,
        window_size: usize,
    ) -> MoodResult<()> {
        let board = self.source.latest(window_size)?;
        let metadata = WindowMetadata::new(
            sampling_rate,
            channel_rows.len(),
            self.config.window_duration,
            tick,
        )?;
        let window = SampleWindow::from_board(&board, channel_rows, metadata)?;

        if !window.is_complete() {
            debug!(
                tick,
                samples = window.samples_per_channel(),
                expected = window_size,
                "Partial window while board buffer fills"
            );
        }

        let outcome = self.pipeline.process_window(&window)?;
        self.emit(tick, outcome)
    }

    fn emit(&mut self, tick: u64, outcome: TickOutcome) -> MoodResult<()> {
        match outcome {
            TickOutcome::Calibrating { progress } => {
                debug!(tick, progress, "Calibrating");
            }
            TickOutcome::Calibrated { baseline } => {
                info!(tick, %baseline, "Baseline set");
                let _ = self.event_sender.send(LoopEvent::Calibrated { baseline });
            }
            TickOutcome::Classified(verdict) => {
                self.sink.write_label(verdict.label)?;
                self.labels_emitted += 1;
                info!(tick, label = %verdict.label, "Mood");
                let _ = self.event_sender.send(LoopEvent::Label { tick, verdict });
            }
        }
        Ok(())
    }

    /// Decide whether a failed tick ends the session.
    ///
    /// Acquisition failures during calibration and an empty baseline are
    /// fatal; everything else is reported and the loop continues.
    fn handle_tick_error(&mut self, tick: u64, error: MoodError) -> MoodResult<()> {
        let calibrating = self.pipeline.state().is_calibrating();

        if matches!(error, MoodError::EmptyBaseline) || (calibrating && error.is_acquisition()) {
            return Err(error);
        }

        self.failed_ticks += 1;
        warn!(tick, error = %error, kind = error.kind(), "Tick failed");
        let _ = self.event_sender.send(LoopEvent::TickFailed {
            tick,
            error: error.clone(),
        });

        if calibrating {
            if let Some(outcome) = self.pipeline.skip_window()? {
                self.emit(tick, outcome)?;
            }
        }
        Ok(())
    }

    /// Stop acquisition and close the actuator, once; failures are only logged
    fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;

        if let Err(e) = self.source.stop() {
            warn!(source = self.source.name(), error = %e, "Failed to stop acquisition");
        }
        if let Err(e) = self.sink.close() {
            warn!(sink = self.sink.name(), error = %e, "Failed to close actuator");
        }
        debug!("Resources released");
    }
}

impl<A: AcquisitionSource, S: ActuatorSink> Drop for StreamingLoop<A, S> {
    fn drop(&mut self) {
        self.release();
    }
}
