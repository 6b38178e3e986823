//! Configuration for the mood detection pipeline

use crate::aggregator::TieBreak;
use crate::classifier::ClassifierThresholds;
use crate::filters::FilterConfig;
use crate::spectrum::DEFAULT_SEGMENT_LENGTH;
use mood_core::{config_error, FrequencyBand, MoodResult, WindowMetadata};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Every tunable of the pipeline; nothing downstream hard-codes these
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MoodConfig {
    /// Board sampling rate (Hz)
    pub sampling_rate: f64,
    /// Number of EEG channels taken from the board, in board order
    pub channel_count: usize,
    /// Length of one analysis window and one loop tick (s)
    pub window_duration: f64,
    /// Calibration period at session start (s)
    pub baseline_window: f64,
    /// Band-pass applied to every channel window
    pub filter: FilterConfig,
    pub alpha_band: FrequencyBand,
    pub beta_band: FrequencyBand,
    pub thresholds: ClassifierThresholds,
    /// Welch segment length (samples)
    pub segment_length: usize,
    pub tie_break: TieBreak,
}

impl Default for MoodConfig {
    fn default() -> Self {
        Self {
            sampling_rate: 250.0,
            channel_count: 2,
            window_duration: 1.0,
            baseline_window: 10.0,
            filter: FilterConfig::default(),
            alpha_band: FrequencyBand::ALPHA,
            beta_band: FrequencyBand::BETA,
            thresholds: ClassifierThresholds::default(),
            segment_length: DEFAULT_SEGMENT_LENGTH,
            tie_break: TieBreak::default(),
        }
    }
}

impl MoodConfig {
    /// Samples per channel in one window
    pub fn window_size(&self) -> usize {
        (self.sampling_rate * self.window_duration).round() as usize
    }

    /// Ticks needed to cover the baseline window
    pub fn calibration_ticks(&self) -> u64 {
        (self.baseline_window / self.window_duration - 1e-9).ceil().max(0.0) as u64
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs_f64(self.window_duration)
    }

    pub fn validate(&self) -> MoodResult<()> {
        WindowMetadata::validate_sampling_rate(self.sampling_rate)?;
        WindowMetadata::validate_channel_count(self.channel_count)?;

        if !self.window_duration.is_finite() || self.window_duration <= 0.0 {
            return Err(config_error!("window duration must be positive, got {}s", self.window_duration));
        }

        if !self.baseline_window.is_finite() || self.baseline_window <= 0.0 {
            return Err(config_error!("baseline window must be positive, got {}s", self.baseline_window));
        }

        self.filter.validate(self.sampling_rate)?;
        self.alpha_band.validate()?;
        self.beta_band.validate()?;

        let nyquist = self.sampling_rate / 2.0;
        for (name, band) in [("alpha", self.alpha_band), ("beta", self.beta_band)] {
            if band.high_hz > nyquist {
                return Err(config_error!("{} band {} exceeds Nyquist frequency {}Hz", name, band, nyquist));
            }
        }

        if !(self.thresholds.ratio_threshold > 0.0) {
            return Err(config_error!("Ratio threshold must be positive"));
        }

        if !(self.thresholds.epsilon >= 0.0) {
            return Err(config_error!("Epsilon must be non-negative"));
        }

        if self.segment_length < 2 {
            return Err(config_error!("Welch segment length must be at least 2, got {}", self.segment_length));
        }

        Ok(())
    }

    /// Export configuration to JSON
    pub fn to_json(&self) -> MoodResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| config_error!("Failed to serialize config: {}", e))
    }

    /// Import configuration from JSON, missing fields take their defaults
    pub fn from_json(json: &str) -> MoodResult<Self> {
        let config: Self = serde_json::from_str(json).map_err(|e| config_error!("Failed to deserialize config: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> MoodResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| config_error!("Failed to read config {}: {}", path.display(), e))?;
        Self::from_json(&json)
    }
}
