//! EEG mood types: labels, frequency bands, band powers and window metadata

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use crate::error::{MoodError, MoodResult};

/// Affective state assigned to a channel or a whole window.
///
/// Variant order is the label ordinal (`Focused` = 0, `Calm` = 1,
/// `Stressed` = 2), used by the lowest-ordinal tie-break policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MoodLabel {
    Focused,
    Calm,
    Stressed,
}

impl MoodLabel {
    /// Every label in ordinal order
    pub const ALL: [MoodLabel; 3] = [MoodLabel::Focused, MoodLabel::Calm, MoodLabel::Stressed];

    /// Position of the label in the fixed total order
    pub fn ordinal(self) -> usize {
        match self {
            MoodLabel::Focused => 0,
            MoodLabel::Calm => 1,
            MoodLabel::Stressed => 2,
        }
    }

    /// Wire representation written to the actuator
    pub fn as_str(self) -> &'static str {
        match self {
            MoodLabel::Focused => "FOCUSED",
            MoodLabel::Calm => "CALM",
            MoodLabel::Stressed => "STRESSED",
        }
    }
}

impl std::fmt::Display for MoodLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MoodLabel {
    type Err = MoodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "FOCUSED" => Ok(MoodLabel::Focused),
            "CALM" => Ok(MoodLabel::Calm),
            "STRESSED" => Ok(MoodLabel::Stressed),
            other => Err(MoodError::InvalidSignalData {
                reason: format!("unknown mood label '{}'", other),
            }),
        }
    }
}

/// Frequency band in Hz, both bounds inclusive
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrequencyBand {
    pub low_hz: f64,
    pub high_hz: f64,
}

impl FrequencyBand {
    /// Alpha rhythm, relaxed wakefulness
    pub const ALPHA: FrequencyBand = FrequencyBand { low_hz: 8.0, high_hz: 13.0 };

    /// Beta rhythm, active concentration
    pub const BETA: FrequencyBand = FrequencyBand { low_hz: 13.0, high_hz: 30.0 };

    /// Create a validated band
    pub fn new(low_hz: f64, high_hz: f64) -> MoodResult<Self> {
        let band = FrequencyBand { low_hz, high_hz };
        band.validate()?;
        Ok(band)
    }

    /// Check `0 <= low < high` with finite bounds
    pub fn validate(&self) -> MoodResult<()> {
        if !self.low_hz.is_finite() || !self.high_hz.is_finite() {
            return Err(MoodError::InvalidConfig {
                reason: format!("band bounds must be finite, got {}-{}Hz", self.low_hz, self.high_hz),
            });
        }
        if self.low_hz < 0.0 || self.low_hz >= self.high_hz {
            return Err(MoodError::InvalidConfig {
                reason: format!(
                    "band low bound must be non-negative and below high bound, got {}-{}Hz",
                    self.low_hz, self.high_hz
                ),
            });
        }
        Ok(())
    }

    /// Whether a frequency falls inside the band
    pub fn contains(&self, freq_hz: f64) -> bool {
        freq_hz >= self.low_hz && freq_hz <= self.high_hz
    }

    /// Band width in Hz
    pub fn width(&self) -> f64 {
        self.high_hz - self.low_hz
    }
}

impl std::fmt::Display for FrequencyBand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}Hz", self.low_hz, self.high_hz)
    }
}

/// Alpha and beta power of one channel in one window
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BandPowers {
    pub alpha: f64,
    pub beta: f64,
}

impl BandPowers {
    pub fn new(alpha: f64, beta: f64) -> Self {
        Self { alpha, beta }
    }
}

/// Personal reference band powers, fixed once calibration completes
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Baseline {
    pub alpha: f64,
    pub beta: f64,
}

impl Baseline {
    pub fn new(alpha: f64, beta: f64) -> Self {
        Self { alpha, beta }
    }
}

impl std::fmt::Display for Baseline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "alpha={:.3}, beta={:.3}", self.alpha, self.beta)
    }
}

/// Metadata attached to every acquired window
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowMetadata {
    /// Sampling rate in Hz
    pub sampling_rate: f64,
    /// Number of EEG channels in the window
    pub channel_count: usize,
    /// Nominal window duration in seconds
    pub duration: f64,
    /// Tick index of the streaming loop that produced the window
    pub tick: u64,
    /// Capture timestamp (ms since epoch)
    pub captured_at: u64,
}

impl WindowMetadata {
    /// Create new window metadata
    pub fn new(sampling_rate: f64, channel_count: usize, duration: f64, tick: u64) -> MoodResult<Self> {
        Self::validate_sampling_rate(sampling_rate)?;
        Self::validate_channel_count(channel_count)?;

        if !duration.is_finite() || duration <= 0.0 {
            return Err(MoodError::InvalidSignalData {
                reason: "Duration must be positive".to_string(),
            });
        }

        Ok(WindowMetadata {
            sampling_rate,
            channel_count,
            duration,
            tick,
            captured_at: std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.as_millis() as u64)
                .unwrap_or(0),
        })
    }

    /// Validate sampling rate for EEG acquisition
    pub fn validate_sampling_rate(rate: f64) -> MoodResult<()> {
        const MIN_RATE: f64 = 64.0;
        const MAX_RATE: f64 = 16_000.0;

        if !(MIN_RATE..=MAX_RATE).contains(&rate) {
            Err(MoodError::InvalidConfig {
                reason: format!("sampling rate {}Hz outside {}-{}Hz", rate, MIN_RATE, MAX_RATE),
            })
        } else {
            Ok(())
        }
    }

    /// Validate channel count for EEG acquisition
    pub fn validate_channel_count(count: usize) -> MoodResult<()> {
        const MAX_CHANNELS: usize = 32;

        if count == 0 || count > MAX_CHANNELS {
            Err(MoodError::InvalidConfig {
                reason: format!("channel count {} outside 1-{}", count, MAX_CHANNELS),
            })
        } else {
            Ok(())
        }
    }

    /// Number of samples per channel in a complete window
    pub fn expected_samples(&self) -> usize {
        (self.sampling_rate * self.duration).round() as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_order_and_wire_format() {
        assert!(MoodLabel::Focused < MoodLabel::Calm);
        assert!(MoodLabel::Calm < MoodLabel::Stressed);
        assert_eq!(MoodLabel::Stressed.ordinal(), 2);
        assert_eq!(MoodLabel::Calm.to_string(), "CALM");
        assert_eq!("focused".parse::<MoodLabel>().unwrap(), MoodLabel::Focused);
        assert!("sleepy".parse::<MoodLabel>().is_err());
    }

    #[test]
    fn test_band_validation() {
        assert!(FrequencyBand::new(8.0, 13.0).is_ok());
        assert!(FrequencyBand::new(13.0, 8.0).is_err());
        assert!(FrequencyBand::new(-1.0, 8.0).is_err());
        assert!(FrequencyBand::ALPHA.contains(13.0));
        assert!(FrequencyBand::BETA.contains(13.0));
        assert!(!FrequencyBand::ALPHA.contains(13.5));
    }

    #[test]
    fn test_window_metadata() {
        let metadata = WindowMetadata::new(250.0, 2, 1.0, 0).unwrap();
        assert_eq!(metadata.expected_samples(), 250);

        assert!(WindowMetadata::new(10.0, 2, 1.0, 0).is_err());
        assert!(WindowMetadata::new(250.0, 0, 1.0, 0).is_err());
        assert!(WindowMetadata::new(250.0, 2, 0.0, 0).is_err());
    }
}
