//! SampleWindow: container for the latest per-channel EEG readings

use crate::device::BoardData;
use crate::error::{MoodError, MoodResult};
use crate::mood_types::WindowMetadata;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Latest window of EEG samples, one sequence per channel
#[derive(Debug, Clone)]
pub struct SampleWindow {
    /// Unique identifier, used to correlate log lines of one tick
    pub id: Uuid,
    /// Channel-major sample data
    pub channels: Vec<Vec<f64>>,
    /// Window metadata
    pub metadata: WindowMetadata,
}

impl SampleWindow {
    /// Create new sample window from per-channel data
    pub fn new(channels: Vec<Vec<f64>>, metadata: WindowMetadata) -> MoodResult<Self> {
        if channels.len() != metadata.channel_count {
            return Err(MoodError::InvalidSignalData {
                reason: format!(
                    "Window has {} channels, metadata expects {}",
                    channels.len(),
                    metadata.channel_count
                ),
            });
        }

        if let Some(first) = channels.first() {
            if let Some((idx, ch)) = channels.iter().enumerate().find(|(_, ch)| ch.len() != first.len()) {
                return Err(MoodError::InvalidSignalData {
                    reason: format!(
                        "Channel {} has {} samples, channel 0 has {}",
                        idx,
                        ch.len(),
                        first.len()
                    ),
                });
            }
        }

        Ok(SampleWindow {
            id: Uuid::new_v4(),
            channels,
            metadata,
        })
    }

    /// Pick the given board rows out of a board matrix, in channel order
    pub fn from_board(board: &BoardData, rows: &[usize], metadata: WindowMetadata) -> MoodResult<Self> {
        let channels = rows
            .iter()
            .map(|&row| {
                board.row(row).map(<[f64]>::to_vec).ok_or_else(|| MoodError::AcquisitionFailure {
                    reason: format!(
                        "Board data has {} rows, EEG channel row {} missing",
                        board.row_count(),
                        row
                    ),
                })
            })
            .collect::<MoodResult<Vec<_>>>()?;

        Self::new(channels, metadata)
    }

    /// Get number of samples per channel
    pub fn samples_per_channel(&self) -> usize {
        self.channels.first().map_or(0, Vec::len)
    }

    /// Whether the window holds the full configured length
    pub fn is_complete(&self) -> bool {
        self.samples_per_channel() == self.metadata.expected_samples()
    }

    /// Get data for a specific channel
    pub fn channel(&self, channel_index: usize) -> MoodResult<&[f64]> {
        self.channels
            .get(channel_index)
            .map(Vec::as_slice)
            .ok_or_else(|| MoodError::InvalidSignalData {
                reason: format!(
                    "Channel index {} out of bounds (0-{})",
                    channel_index,
                    self.channels.len().saturating_sub(1)
                ),
            })
    }

    /// Get sampling rate
    pub fn sampling_rate(&self) -> f64 {
        self.metadata.sampling_rate
    }

    /// Get channel count
    pub fn channel_count(&self) -> usize {
        self.metadata.channel_count
    }

    /// Tick that produced this window
    pub fn tick(&self) -> u64 {
        self.metadata.tick
    }

    /// Calculate basic statistics for a channel
    pub fn channel_stats(&self, channel_index: usize) -> MoodResult<ChannelStats> {
        Ok(ChannelStats::calculate(self.channel(channel_index)?))
    }
}

/// Basic statistics for a signal channel
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelStats {
    pub mean: f64,
    pub rms: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
    pub peak_to_peak: f64,
}

impl ChannelStats {
    pub fn calculate(data: &[f64]) -> Self {
        if data.is_empty() {
            return Self {
                mean: 0.0,
                rms: 0.0,
                std_dev: 0.0,
                min: 0.0,
                max: 0.0,
                peak_to_peak: 0.0,
            };
        }

        let n = data.len() as f64;
        let mean = data.iter().sum::<f64>() / n;
        let rms = (data.iter().map(|x| x * x).sum::<f64>() / n).sqrt();

        let variance = data.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
        let std_dev = variance.sqrt();

        let min = data.iter().fold(f64::INFINITY, |a, &b| a.min(b));
        let max = data.iter().fold(f64::NEG_INFINITY, |a, &b| a.max(b));

        Self {
            mean,
            rms,
            std_dev,
            min,
            max,
            peak_to_peak: max - min,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata(channels: usize) -> WindowMetadata {
        WindowMetadata::new(250.0, channels, 1.0, 0).unwrap()
    }

    #[test]
    fn test_window_creation() {
        let window = SampleWindow::new(vec![vec![0.0; 250], vec![1.0; 250]], metadata(2)).unwrap();

        assert_eq!(window.samples_per_channel(), 250);
        assert_eq!(window.channel_count(), 2);
        assert!(window.is_complete());
        assert_eq!(window.channel(1).unwrap()[0], 1.0);
        assert!(window.channel(2).is_err());
    }

    #[test]
    fn test_ragged_channels_rejected() {
        let result = SampleWindow::new(vec![vec![0.0; 250], vec![0.0; 200]], metadata(2));
        assert!(matches!(result, Err(MoodError::InvalidSignalData { .. })));

        let result = SampleWindow::new(vec![vec![0.0; 250]], metadata(2));
        assert!(result.is_err());
    }

    #[test]
    fn test_partial_window_during_fill() {
        let window = SampleWindow::new(vec![vec![0.0; 100], vec![0.0; 100]], metadata(2)).unwrap();
        assert!(!window.is_complete());
    }

    #[test]
    fn test_from_board_rows() {
        // Row 0 is a packet counter on most boards, EEG starts at row 1
        let board = BoardData::new(vec![
            (0..250).map(|i| i as f64).collect(),
            vec![1.0; 250],
            vec![2.0; 250],
        ]);

        let window = SampleWindow::from_board(&board, &[1, 2], metadata(2)).unwrap();
        assert_eq!(window.channel(0).unwrap()[10], 1.0);
        assert_eq!(window.channel(1).unwrap()[10], 2.0);

        let missing = SampleWindow::from_board(&board, &[1, 5], metadata(2));
        assert!(matches!(missing, Err(MoodError::AcquisitionFailure { .. })));
    }

    #[test]
    fn test_channel_stats() {
        let stats = ChannelStats::calculate(&[1.0, -1.0, 1.0, -1.0]);
        assert_eq!(stats.mean, 0.0);
        assert_eq!(stats.rms, 1.0);
        assert_eq!(stats.peak_to_peak, 2.0);

        let window = SampleWindow::new(vec![vec![0.0; 250], vec![3.0; 250]], metadata(2)).unwrap();
        assert_eq!(window.channel_stats(1).unwrap().mean, 3.0);
        assert!(window.channel_stats(2).is_err());
    }
}
