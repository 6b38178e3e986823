//! Collaborator interfaces: acquisition board and actuator sink
//!
//! The pipeline only talks to hardware through these two traits, so every
//! stage can be driven by simulated boards and capturing sinks.

use crate::error::MoodResult;
use crate::mood_types::MoodLabel;

/// Raw board matrix, one row per board channel, oldest sample first
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoardData {
    rows: Vec<Vec<f64>>,
}

impl BoardData {
    pub fn new(rows: Vec<Vec<f64>>) -> Self {
        Self { rows }
    }

    /// Get a board row by index
    pub fn row(&self, index: usize) -> Option<&[f64]> {
        self.rows.get(index).map(Vec::as_slice)
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Samples held per row (shortest row)
    pub fn sample_count(&self) -> usize {
        self.rows.iter().map(Vec::len).min().unwrap_or(0)
    }

    pub fn into_rows(self) -> Vec<Vec<f64>> {
        self.rows
    }
}

/// Streaming EEG board
pub trait AcquisitionSource {
    /// Prepare the session and start streaming
    fn start(&mut self) -> MoodResult<()>;

    /// Stop streaming and release the session
    fn stop(&mut self) -> MoodResult<()>;

    /// Sampling rate reported by the board
    fn sampling_rate(&self) -> f64;

    /// Board rows carrying EEG channels, in channel order
    fn eeg_channels(&self) -> MoodResult<Vec<usize>>;

    /// Most recent `num_samples` samples of every row.
    ///
    /// Fewer samples are returned only while the board buffer is still
    /// filling after `start`.
    fn latest(&mut self, num_samples: usize) -> MoodResult<BoardData>;

    /// Human-readable source name for logs
    fn name(&self) -> &str {
        "board"
    }
}

/// Line-oriented label output
pub trait ActuatorSink {
    /// Write one newline-terminated label
    fn write_label(&mut self, label: MoodLabel) -> MoodResult<()>;

    /// Close the underlying channel
    fn close(&mut self) -> MoodResult<()>;

    /// Human-readable sink name for logs
    fn name(&self) -> &str {
        "actuator"
    }
}

impl<T: AcquisitionSource + ?Sized> AcquisitionSource for Box<T> {
    fn start(&mut self) -> MoodResult<()> {
        (**self).start()
    }

    fn stop(&mut self) -> MoodResult<()> {
        (**self).stop()
    }

    fn sampling_rate(&self) -> f64 {
        (**self).sampling_rate()
    }

    fn eeg_channels(&self) -> MoodResult<Vec<usize>> {
        (**self).eeg_channels()
    }

    fn latest(&mut self, num_samples: usize) -> MoodResult<BoardData> {
        (**self).latest(num_samples)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

impl<T: ActuatorSink + ?Sized> ActuatorSink for Box<T> {
    fn write_label(&mut self, label: MoodLabel) -> MoodResult<()> {
        (**self).write_label(label)
    }

    fn close(&mut self) -> MoodResult<()> {
        (**self).close()
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Encode a label as the line written to actuators
pub fn label_line(label: MoodLabel) -> String {
    format!("{}\n", label.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_board_data_shape() {
        let board = BoardData::new(vec![vec![0.0; 10], vec![0.0; 8]]);
        assert_eq!(board.row_count(), 2);
        assert_eq!(board.sample_count(), 8);
        assert!(board.row(2).is_none());
        assert_eq!(BoardData::default().sample_count(), 0);
    }

    #[test]
    fn test_label_line() {
        assert_eq!(label_line(MoodLabel::Focused), "FOCUSED\n");
    }
}
