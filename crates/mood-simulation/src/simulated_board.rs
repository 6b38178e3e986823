//! Simulated EEG board implementing the acquisition interface

use crate::eeg_simulator::{EegSimulator, SimulationConfig};
use mood_core::{AcquisitionSource, BoardData, MoodError, MoodResult};
use std::collections::VecDeque;
use tracing::{debug, info};

/// Samples retained per row, like a board SDK ring buffer
const BUFFER_CAPACITY: usize = 45_000;

/// Board layout: row 0 packet counter, EEG rows 1..=N, last row timestamp.
///
/// Every `latest(n)` poll advances the simulation by `n` samples, so each
/// tick sees a fresh window regardless of wall-clock time.
pub struct SimulatedBoard {
    simulator: EegSimulator,
    buffer: Vec<VecDeque<f64>>,
    streaming: bool,
    package_num: u64,
}

impl SimulatedBoard {
    pub fn new(config: SimulationConfig) -> MoodResult<Self> {
        let rows = config.channel_count + 2;
        Ok(SimulatedBoard {
            simulator: EegSimulator::new(config)?,
            buffer: vec![VecDeque::new(); rows],
            streaming: false,
            package_num: 0,
        })
    }

    pub fn is_streaming(&self) -> bool {
        self.streaming
    }

    /// Seconds of signal produced since creation
    pub fn elapsed(&self) -> f64 {
        self.simulator.elapsed()
    }

    fn timestamp_row(&self) -> usize {
        self.buffer.len() - 1
    }

    fn push_samples(&mut self, num_samples: usize) {
        let eeg = self.simulator.generate(num_samples);
        let sampling_rate = self.simulator.config().sampling_rate;
        let timestamp_row = self.timestamp_row();

        for i in 0..num_samples {
            // Cyton packet counters wrap at 256
            self.buffer[0].push_back((self.package_num % 256) as f64);
            for (channel, samples) in eeg.iter().enumerate() {
                self.buffer[channel + 1].push_back(samples[i]);
            }
            self.buffer[timestamp_row].push_back(self.package_num as f64 / sampling_rate);
            self.package_num += 1;
        }

        for row in &mut self.buffer {
            while row.len() > BUFFER_CAPACITY {
                row.pop_front();
            }
        }
    }
}

impl AcquisitionSource for SimulatedBoard {
    fn start(&mut self) -> MoodResult<()> {
        if self.streaming {
            return Err(MoodError::AcquisitionFailure {
                reason: "simulated board already streaming".to_string(),
            });
        }
        self.streaming = true;
        info!(
            channels = self.simulator.config().channel_count,
            sampling_rate = self.simulator.config().sampling_rate,
            "Simulated board streaming"
        );
        Ok(())
    }

    fn stop(&mut self) -> MoodResult<()> {
        self.streaming = false;
        for row in &mut self.buffer {
            row.clear();
        }
        debug!("Simulated board stopped");
        Ok(())
    }

    fn sampling_rate(&self) -> f64 {
        self.simulator.config().sampling_rate
    }

    fn eeg_channels(&self) -> MoodResult<Vec<usize>> {
        Ok((1..=self.simulator.config().channel_count).collect())
    }

    fn latest(&mut self, num_samples: usize) -> MoodResult<BoardData> {
        if !self.streaming {
            return Err(MoodError::AcquisitionFailure {
                reason: "simulated board is not streaming".to_string(),
            });
        }

        self.push_samples(num_samples);

        let rows = self
            .buffer
            .iter()
            .map(|row| {
                let skip = row.len().saturating_sub(num_samples);
                row.iter().skip(skip).copied().collect()
            })
            .collect();

        Ok(BoardData::new(rows))
    }

    fn name(&self) -> &str {
        "simulated"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board() -> SimulatedBoard {
        SimulatedBoard::new(SimulationConfig {
            seed: Some(3),
            ..SimulationConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn test_board_layout() {
        let mut board = board();
        board.start().unwrap();

        assert_eq!(board.eeg_channels().unwrap(), vec![1, 2]);
        let data = board.latest(250).unwrap();
        assert_eq!(data.row_count(), 4);
        assert_eq!(data.sample_count(), 250);
        assert_eq!(data.row(0).unwrap()[5], 5.0);
    }

    #[test]
    fn test_each_poll_is_fresh() {
        let mut board = board();
        board.start().unwrap();

        let first = board.latest(100).unwrap();
        let second = board.latest(100).unwrap();
        assert_ne!(first.row(1), second.row(1));
        assert_eq!(board.elapsed(), 0.8);
    }

    #[test]
    fn test_requires_streaming() {
        let mut board = board();
        assert!(matches!(board.latest(10), Err(MoodError::AcquisitionFailure { .. })));

        board.start().unwrap();
        assert!(board.start().is_err());
        board.stop().unwrap();
        assert!(!board.is_streaming());
        assert!(board.latest(10).is_err());
    }
}
