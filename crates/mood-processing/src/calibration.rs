//! Baseline calibration: pools per-channel band powers over the opening
//! seconds of a session and reduces them to a personal reference

use mood_core::{BandPowers, Baseline, MoodError, MoodResult};
use tracing::debug;

/// Calibration lifecycle, `Finalized` is terminal
#[derive(Debug, Clone, PartialEq)]
pub enum CalibrationState {
    Accumulating,
    Finalized(Baseline),
}

/// Accumulates alpha and beta powers until the baseline ticks have elapsed
#[derive(Debug, Clone)]
pub struct BaselineCalibrator {
    alpha_samples: Vec<f64>,
    beta_samples: Vec<f64>,
    window_duration: f64,
    required_ticks: u64,
    elapsed_ticks: u64,
    state: CalibrationState,
}

impl BaselineCalibrator {
    /// `window_duration` in seconds; calibration ends after `required_ticks`
    /// windows, see `MoodConfig::calibration_ticks`
    pub fn new(window_duration: f64, required_ticks: u64) -> Self {
        Self {
            alpha_samples: Vec::new(),
            beta_samples: Vec::new(),
            window_duration,
            required_ticks,
            elapsed_ticks: 0,
            state: CalibrationState::Accumulating,
        }
    }

    /// Add one window's per-channel powers and advance by one tick
    pub fn record(&mut self, powers: &[BandPowers]) -> MoodResult<()> {
        self.ensure_accumulating()?;

        for channel in powers {
            self.alpha_samples.push(channel.alpha);
            self.beta_samples.push(channel.beta);
        }
        self.elapsed_ticks += 1;

        debug!(
            tick = self.elapsed_ticks,
            elapsed_s = self.elapsed_seconds(),
            channels = powers.len(),
            pooled = self.alpha_samples.len(),
            "Calibration window recorded"
        );
        Ok(())
    }

    /// Advance by one tick that produced no usable powers
    pub fn skip(&mut self) -> MoodResult<()> {
        self.ensure_accumulating()?;
        self.elapsed_ticks += 1;
        Ok(())
    }

    /// Whether the baseline window has been covered
    pub fn is_complete(&self) -> bool {
        self.elapsed_ticks >= self.required_ticks
    }

    pub fn required_ticks(&self) -> u64 {
        self.required_ticks
    }

    pub fn elapsed_seconds(&self) -> f64 {
        self.elapsed_ticks as f64 * self.window_duration
    }

    /// Fraction of the baseline window covered, 0.0-1.0
    pub fn progress(&self) -> f64 {
        if self.required_ticks == 0 {
            return 1.0;
        }
        (self.elapsed_ticks as f64 / self.required_ticks as f64).clamp(0.0, 1.0)
    }

    /// Number of pooled samples per band
    pub fn sample_count(&self) -> usize {
        self.alpha_samples.len()
    }

    pub fn state(&self) -> &CalibrationState {
        &self.state
    }

    /// Reduce the pooled samples to their means.
    ///
    /// The accumulators are released once the baseline is fixed; calling
    /// again returns the same baseline.
    pub fn finalize(&mut self) -> MoodResult<Baseline> {
        if let CalibrationState::Finalized(baseline) = &self.state {
            return Ok(*baseline);
        }

        if self.alpha_samples.is_empty() {
            return Err(MoodError::EmptyBaseline);
        }

        let baseline = Baseline::new(mean(&self.alpha_samples), mean(&self.beta_samples));

        self.alpha_samples = Vec::new();
        self.beta_samples = Vec::new();
        self.state = CalibrationState::Finalized(baseline);

        Ok(baseline)
    }

    fn ensure_accumulating(&self) -> MoodResult<()> {
        match self.state {
            CalibrationState::Accumulating => Ok(()),
            CalibrationState::Finalized(_) => Err(MoodError::CalibrationFinalized),
        }
    }
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MoodConfig;

    #[test]
    fn test_finalize_without_samples() {
        let mut calibrator = BaselineCalibrator::new(1.0, 10);
        assert_eq!(calibrator.finalize(), Err(MoodError::EmptyBaseline));

        // Ticks without powers still leave nothing to average
        for _ in 0..10 {
            calibrator.skip().unwrap();
        }
        assert!(calibrator.is_complete());
        assert_eq!(calibrator.finalize(), Err(MoodError::EmptyBaseline));
    }

    #[test]
    fn test_pooled_mean_across_channels() {
        let mut calibrator = BaselineCalibrator::new(1.0, 2);

        calibrator
            .record(&[BandPowers::new(1.0, 2.0), BandPowers::new(3.0, 4.0)])
            .unwrap();
        assert!(!calibrator.is_complete());
        assert_eq!(calibrator.progress(), 0.5);

        calibrator
            .record(&[BandPowers::new(5.0, 6.0), BandPowers::new(7.0, 8.0)])
            .unwrap();
        assert!(calibrator.is_complete());
        assert_eq!(calibrator.sample_count(), 4);

        let baseline = calibrator.finalize().unwrap();
        assert_eq!(baseline, Baseline::new(4.0, 5.0));
    }

    #[test]
    fn test_ten_ticks_for_default_window() {
        let config = MoodConfig::default();
        let mut calibrator = BaselineCalibrator::new(config.window_duration, config.calibration_ticks());
        for tick in 1..=10 {
            assert!(!calibrator.is_complete());
            calibrator
                .record(&[BandPowers::new(1.0, 1.0), BandPowers::new(1.0, 1.0)])
                .unwrap();
            assert_eq!(calibrator.elapsed_seconds(), tick as f64);
        }
        assert!(calibrator.is_complete());
        assert_eq!(calibrator.sample_count(), 20);
    }

    #[test]
    fn test_fractional_windows_complete() {
        // 0.1s windows sum to 0.999... after ten ticks
        let config = MoodConfig {
            window_duration: 0.1,
            baseline_window: 1.0,
            ..MoodConfig::default()
        };
        let mut calibrator = BaselineCalibrator::new(config.window_duration, config.calibration_ticks());
        assert_eq!(calibrator.required_ticks(), 10);
        for _ in 0..9 {
            calibrator.record(&[BandPowers::new(1.0, 1.0)]).unwrap();
        }
        assert!(!calibrator.is_complete());
        calibrator.record(&[BandPowers::new(1.0, 1.0)]).unwrap();
        assert!(calibrator.is_complete());
    }

    #[test]
    fn test_finalized_is_terminal() {
        let mut calibrator = BaselineCalibrator::new(1.0, 1);
        calibrator.record(&[BandPowers::new(2.0, 3.0)]).unwrap();

        let baseline = calibrator.finalize().unwrap();
        assert_eq!(calibrator.state(), &CalibrationState::Finalized(baseline));

        assert_eq!(
            calibrator.record(&[BandPowers::new(9.0, 9.0)]),
            Err(MoodError::CalibrationFinalized)
        );
        assert_eq!(calibrator.skip(), Err(MoodError::CalibrationFinalized));
        assert_eq!(calibrator.finalize(), Ok(baseline));
    }
}
