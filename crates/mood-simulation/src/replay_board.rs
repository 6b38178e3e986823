//! Replay of recorded board data from CSV

use mood_core::{AcquisitionSource, BoardData, MoodError, MoodResult};
use std::path::Path;
use tracing::{info, warn};

/// Recorded session played back window by window.
///
/// The CSV holds one column per board row and one line per sample, without
/// a header, as written by board SDK file streamers.
pub struct ReplayBoard {
    rows: Vec<Vec<f64>>,
    sampling_rate: f64,
    eeg_rows: Vec<usize>,
    cursor: usize,
    streaming: bool,
    looping: bool,
}

impl ReplayBoard {
    pub fn new(rows: Vec<Vec<f64>>, sampling_rate: f64, eeg_rows: Vec<usize>) -> MoodResult<Self> {
        if let Some(&missing) = eeg_rows.iter().find(|&&row| row >= rows.len()) {
            return Err(MoodError::InvalidSignalData {
                reason: format!("recording has {} columns, EEG row {} missing", rows.len(), missing),
            });
        }

        Ok(ReplayBoard {
            rows,
            sampling_rate,
            eeg_rows,
            cursor: 0,
            streaming: false,
            looping: false,
        })
    }

    /// Load a recording; `eeg_rows` selects the EEG columns in channel order
    pub fn from_csv(path: impl AsRef<Path>, sampling_rate: f64, eeg_rows: Vec<usize>) -> MoodResult<Self> {
        let path = path.as_ref();
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .trim(csv::Trim::All)
            .flexible(false)
            .from_path(path)
            .map_err(|e| MoodError::InvalidSignalData {
                reason: format!("Failed to open recording {}: {}", path.display(), e),
            })?;

        let mut rows: Vec<Vec<f64>> = Vec::new();
        for (line, record) in reader.records().enumerate() {
            let record = record.map_err(|e| MoodError::InvalidSignalData {
                reason: format!("Malformed recording line {}: {}", line + 1, e),
            })?;

            if rows.is_empty() {
                rows = vec![Vec::new(); record.len()];
            }

            for (column, field) in record.iter().enumerate() {
                let value = field.parse::<f64>().map_err(|e| MoodError::InvalidSignalData {
                    reason: format!("Line {} column {}: {}", line + 1, column, e),
                })?;
                rows[column].push(value);
            }
        }

        info!(
            path = %path.display(),
            columns = rows.len(),
            samples = rows.first().map_or(0, Vec::len),
            "Recording loaded"
        );
        Self::new(rows, sampling_rate, eeg_rows)
    }

    /// Restart from the beginning once the recording is exhausted
    pub fn looping(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }

    /// Samples per row in the recording
    pub fn len(&self) -> usize {
        self.rows.first().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of whole windows of `window_size` samples in the recording
    pub fn window_count(&self, window_size: usize) -> u64 {
        if window_size == 0 {
            return 0;
        }
        (self.len() / window_size) as u64
    }

    pub fn is_streaming(&self) -> bool {
        self.streaming
    }
}

impl AcquisitionSource for ReplayBoard {
    fn start(&mut self) -> MoodResult<()> {
        if self.is_empty() {
            return Err(MoodError::AcquisitionFailure {
                reason: "recording holds no samples".to_string(),
            });
        }
        self.cursor = 0;
        self.streaming = true;
        Ok(())
    }

    fn stop(&mut self) -> MoodResult<()> {
        self.streaming = false;
        Ok(())
    }

    fn sampling_rate(&self) -> f64 {
        self.sampling_rate
    }

    fn eeg_channels(&self) -> MoodResult<Vec<usize>> {
        Ok(self.eeg_rows.clone())
    }

    fn latest(&mut self, num_samples: usize) -> MoodResult<BoardData> {
        if !self.streaming {
            return Err(MoodError::AcquisitionFailure {
                reason: "replay is not streaming".to_string(),
            });
        }

        if self.cursor >= self.len() {
            if !self.looping {
                return Err(MoodError::AcquisitionFailure {
                    reason: "recording exhausted".to_string(),
                });
            }
            warn!("Recording exhausted, restarting replay");
            self.cursor = 0;
        }

        let end = (self.cursor + num_samples).min(self.len());
        let start = end.saturating_sub(num_samples);
        let rows = self.rows.iter().map(|row| row[start..end].to_vec()).collect();
        self.cursor = end;

        Ok(BoardData::new(rows))
    }

    fn name(&self) -> &str {
        "replay"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn recording(samples: usize) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        for i in 0..samples {
            writeln!(file, "{}, {}, {}", i, i as f64 * 0.5, -(i as f64)).unwrap();
        }
        file
    }

    #[test]
    fn test_load_csv_columns_as_rows() {
        let file = recording(500);
        let board = ReplayBoard::from_csv(file.path(), 250.0, vec![1, 2]).unwrap();

        assert_eq!(board.len(), 500);
        assert_eq!(board.window_count(250), 2);
        assert_eq!(board.eeg_channels().unwrap(), vec![1, 2]);
    }

    #[test]
    fn test_replay_windows_in_order() {
        let file = recording(500);
        let mut board = ReplayBoard::from_csv(file.path(), 250.0, vec![1]).unwrap();
        board.start().unwrap();

        let first = board.latest(250).unwrap();
        assert_eq!(first.row(0).unwrap()[0], 0.0);
        assert_eq!(first.row(1).unwrap()[249], 124.5);

        let second = board.latest(250).unwrap();
        assert_eq!(second.row(0).unwrap()[0], 250.0);

        assert!(matches!(board.latest(250), Err(MoodError::AcquisitionFailure { .. })));
    }

    #[test]
    fn test_looping_replay() {
        let file = recording(300);
        let mut board = ReplayBoard::from_csv(file.path(), 250.0, vec![1]).unwrap().looping(true);
        board.start().unwrap();

        board.latest(250).unwrap();
        // Tail of the recording still yields a full window
        let tail = board.latest(250).unwrap();
        assert_eq!(tail.sample_count(), 250);
        assert_eq!(tail.row(0).unwrap()[249], 299.0);

        let wrapped = board.latest(250).unwrap();
        assert_eq!(wrapped.row(0).unwrap()[0], 0.0);
    }

    #[test]
    fn test_invalid_recordings() {
        let file = recording(10);
        assert!(ReplayBoard::from_csv(file.path(), 250.0, vec![5]).is_err());
        assert!(ReplayBoard::from_csv("/nonexistent/recording.csv", 250.0, vec![1]).is_err());

        let mut bad = tempfile::NamedTempFile::new().unwrap();
        writeln!(bad, "1.0, abc").unwrap();
        assert!(matches!(
            ReplayBoard::from_csv(bad.path(), 250.0, vec![0]),
            Err(MoodError::InvalidSignalData { .. })
        ));
    }
}
