//! Window processing chain and the calibration/steady-state machine

use crate::aggregator::WindowAggregator;
use crate::calibration::BaselineCalibrator;
use crate::classifier::{ChannelVerdict, MoodClassifier};
use crate::config::MoodConfig;
use crate::filters::BandpassFilter;
use crate::spectrum::BandPowerEstimator;
use mood_core::{BandPowers, Baseline, FrequencyBand, MoodLabel, MoodResult, SampleWindow};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, Level};

/// Phase of a session. Calibration happens once; steady state is final.
#[derive(Debug, Clone)]
pub enum PipelineState {
    Calibrating(BaselineCalibrator),
    Steady { baseline: Baseline },
}

impl PipelineState {
    pub fn is_calibrating(&self) -> bool {
        matches!(self, PipelineState::Calibrating(_))
    }

    pub fn baseline(&self) -> Option<Baseline> {
        match self {
            PipelineState::Calibrating(_) => None,
            PipelineState::Steady { baseline } => Some(*baseline),
        }
    }
}

/// Aggregated label for one window with its per-channel breakdown
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowVerdict {
    pub label: MoodLabel,
    pub channels: Vec<ChannelVerdict>,
}

/// What a tick produced
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// Still accumulating; nothing to emit
    Calibrating { progress: f64 },
    /// This tick completed calibration
    Calibrated { baseline: Baseline },
    /// Steady-state verdict to emit
    Classified(WindowVerdict),
}

/// Filter, band power, calibration and classification for each window
pub struct MoodPipeline {
    filter: BandpassFilter,
    estimator: BandPowerEstimator,
    classifier: MoodClassifier,
    aggregator: WindowAggregator,
    alpha_band: FrequencyBand,
    beta_band: FrequencyBand,
    state: PipelineState,
}

impl MoodPipeline {
    pub fn new(config: &MoodConfig) -> MoodResult<Self> {
        config.validate()?;

        Ok(MoodPipeline {
            filter: BandpassFilter::new(config.filter),
            estimator: BandPowerEstimator::new(config.segment_length),
            classifier: MoodClassifier::new(config.thresholds),
            aggregator: WindowAggregator::new(config.tie_break),
            alpha_band: config.alpha_band,
            beta_band: config.beta_band,
            state: PipelineState::Calibrating(BaselineCalibrator::new(
                config.window_duration,
                config.calibration_ticks(),
            )),
        })
    }

    /// Start in steady state with a known baseline
    pub fn with_baseline(config: &MoodConfig, baseline: Baseline) -> MoodResult<Self> {
        let mut pipeline = Self::new(config)?;
        pipeline.state = PipelineState::Steady { baseline };
        Ok(pipeline)
    }

    pub fn state(&self) -> &PipelineState {
        &self.state
    }

    /// Alpha and beta power of every channel in the window
    pub fn band_powers(&mut self, window: &SampleWindow) -> MoodResult<Vec<BandPowers>> {
        let sampling_rate = window.sampling_rate();

        window
            .channels
            .iter()
            .enumerate()
            .map(|(channel, samples)| {
                let filtered = self.filter.filter(samples, sampling_rate)?;
                let spectrum = self.estimator.spectrum(&filtered, sampling_rate)?;
                let powers = BandPowers::new(
                    spectrum.band_power(self.alpha_band),
                    spectrum.band_power(self.beta_band),
                );

                if tracing::enabled!(Level::DEBUG) {
                    let stats = window.channel_stats(channel)?;
                    debug!(
                        window = %window.id,
                        channel,
                        alpha = powers.alpha,
                        beta = powers.beta,
                        peak_hz = spectrum.peak_frequency(),
                        resolution_hz = spectrum.resolution(),
                        rms = stats.rms,
                        peak_to_peak = stats.peak_to_peak,
                        "Channel band powers"
                    );
                }
                Ok(powers)
            })
            .collect()
    }

    /// Run one window through the current phase
    pub fn process_window(&mut self, window: &SampleWindow) -> MoodResult<TickOutcome> {
        let powers = self.band_powers(window)?;

        match &mut self.state {
            PipelineState::Calibrating(calibrator) => {
                calibrator.record(&powers)?;
                self.advance_calibration()
            }
            PipelineState::Steady { baseline } => {
                let baseline = *baseline;
                let channels: Vec<ChannelVerdict> = powers
                    .iter()
                    .map(|p| self.classifier.classify_detailed(*p, &baseline))
                    .collect();
                let labels: Vec<MoodLabel> = channels.iter().map(|c| c.label).collect();
                let label = self.aggregator.aggregate(&labels)?;

                Ok(TickOutcome::Classified(WindowVerdict { label, channels }))
            }
        }
    }

    /// Account for a tick whose window could not be processed.
    ///
    /// Calibration time still elapses; steady state has nothing to do.
    pub fn skip_window(&mut self) -> MoodResult<Option<TickOutcome>> {
        match &mut self.state {
            PipelineState::Calibrating(calibrator) => {
                calibrator.skip()?;
                self.advance_calibration().map(Some)
            }
            PipelineState::Steady { .. } => Ok(None),
        }
    }

    /// Finalize and switch to steady state once the baseline window is covered
    fn advance_calibration(&mut self) -> MoodResult<TickOutcome> {
        let PipelineState::Calibrating(calibrator) = &mut self.state else {
            return Ok(TickOutcome::Calibrating { progress: 1.0 });
        };

        if !calibrator.is_complete() {
            return Ok(TickOutcome::Calibrating {
                progress: calibrator.progress(),
            });
        }

        let pooled = calibrator.sample_count();
        let baseline = calibrator.finalize()?;
        info!(
            alpha = baseline.alpha,
            beta = baseline.beta,
            samples = pooled,
            "Calibration complete"
        );

        self.state = PipelineState::Steady { baseline };
        Ok(TickOutcome::Calibrated { baseline })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mood_core::{MoodError, WindowMetadata};
    use std::f64::consts::PI;

    fn config() -> MoodConfig {
        MoodConfig {
            baseline_window: 2.0,
            ..MoodConfig::default()
        }
    }

    fn window(tick: u64, channels: Vec<Vec<f64>>) -> SampleWindow {
        let metadata = WindowMetadata::new(250.0, channels.len(), 1.0, tick).unwrap();
        SampleWindow::new(channels, metadata).unwrap()
    }

    fn tone(amplitude: f64, freq: f64, tick: u64) -> Vec<f64> {
        (0..250)
            .map(|i| {
                let t = (tick as f64 * 250.0 + i as f64) / 250.0;
                amplitude * (2.0 * PI * freq * t).sin()
            })
            .collect()
    }

    fn mixed(alpha: f64, beta: f64, tick: u64) -> Vec<f64> {
        tone(alpha, 10.0, tick)
            .into_iter()
            .zip(tone(beta, 20.0, tick))
            .map(|(a, b)| a + b)
            .collect()
    }

    #[test]
    fn test_band_powers_follow_rhythm() {
        let mut pipeline = MoodPipeline::new(&config()).unwrap();
        let powers = pipeline
            .band_powers(&window(0, vec![tone(1.0, 10.0, 0), tone(1.0, 20.0, 0)]))
            .unwrap();

        assert_eq!(powers.len(), 2);
        assert!(powers[0].alpha > 10.0 * powers[0].beta);
        assert!(powers[1].beta > 10.0 * powers[1].alpha);
    }

    #[test]
    fn test_calibration_then_steady() {
        let mut pipeline = MoodPipeline::new(&config()).unwrap();
        assert!(pipeline.state().is_calibrating());

        let outcome = pipeline
            .process_window(&window(0, vec![mixed(1.0, 1.0, 0), mixed(1.0, 1.0, 0)]))
            .unwrap();
        assert_eq!(outcome, TickOutcome::Calibrating { progress: 0.5 });

        let outcome = pipeline
            .process_window(&window(1, vec![mixed(1.0, 1.0, 1), mixed(1.0, 1.0, 1)]))
            .unwrap();
        assert!(matches!(outcome, TickOutcome::Calibrated { .. }));
        assert!(pipeline.state().baseline().is_some());

        // Alpha tripled in amplitude against the calibration level
        let outcome = pipeline
            .process_window(&window(2, vec![mixed(3.0, 1.0, 2), mixed(3.0, 1.0, 2)]))
            .unwrap();
        match outcome {
            TickOutcome::Classified(verdict) => {
                assert_eq!(verdict.label, MoodLabel::Calm);
                assert_eq!(verdict.channels.len(), 2);
                assert!(verdict.channels[0].alpha_ratio > 1.5);
            }
            other => panic!("expected a verdict, got {:?}", other),
        }

        // Beta burst
        let outcome = pipeline
            .process_window(&window(3, vec![mixed(1.0, 3.0, 3), mixed(1.0, 3.0, 3)]))
            .unwrap();
        assert!(matches!(
            outcome,
            TickOutcome::Classified(WindowVerdict { label: MoodLabel::Focused, .. })
        ));
    }

    #[test]
    fn test_short_window_fails_tick() {
        let mut pipeline = MoodPipeline::new(&config()).unwrap();
        let short = window(0, vec![vec![0.0; 20], vec![0.0; 20]]);

        assert!(matches!(
            pipeline.process_window(&short),
            Err(MoodError::InsufficientSamples { required: 28, actual: 20 })
        ));
        assert!(pipeline.state().is_calibrating());
    }

    #[test]
    fn test_skipped_calibration_without_samples_is_empty() {
        let mut pipeline = MoodPipeline::new(&config()).unwrap();

        assert_eq!(
            pipeline.skip_window().unwrap(),
            Some(TickOutcome::Calibrating { progress: 0.5 })
        );
        assert_eq!(pipeline.skip_window(), Err(MoodError::EmptyBaseline));
    }

    #[test]
    fn test_steady_state_skip_is_noop() {
        let mut pipeline = MoodPipeline::with_baseline(&config(), Baseline::new(1.0, 1.0)).unwrap();
        assert_eq!(pipeline.skip_window().unwrap(), None);
        assert!(!pipeline.state().is_calibrating());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = MoodConfig {
            channel_count: 0,
            ..MoodConfig::default()
        };
        assert!(MoodPipeline::new(&config).is_err());
    }
}
