//! Per-tick processing metrics

use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Timing and outcome of one loop tick
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingMetrics {
    /// Tick index
    pub tick: u64,
    /// Actual processing time in microseconds
    pub processing_time_us: u64,
    /// Channels that produced band powers
    pub channels_processed: usize,
    /// Success/failure status
    pub success: bool,
    /// Error message if processing failed
    pub error_message: Option<String>,
}

impl ProcessingMetrics {
    /// Start timing a tick
    pub fn start_timing(tick: u64) -> ProcessingTimer {
        ProcessingTimer {
            start_time: Instant::now(),
            metrics: ProcessingMetrics {
                tick,
                processing_time_us: 0,
                channels_processed: 0,
                success: true,
                error_message: None,
            },
        }
    }

    pub fn processing_time(&self) -> Duration {
        Duration::from_micros(self.processing_time_us)
    }

    /// Whether the tick finished inside its time budget
    pub fn within_budget(&self, budget: Duration) -> bool {
        self.processing_time() <= budget
    }
}

/// Helper for timing processing operations
pub struct ProcessingTimer {
    start_time: Instant,
    metrics: ProcessingMetrics,
}

impl ProcessingTimer {
    pub fn set_channels_processed(&mut self, channels: usize) {
        self.metrics.channels_processed = channels;
    }

    /// Finish timing and return metrics
    pub fn finish(mut self) -> ProcessingMetrics {
        self.metrics.processing_time_us = self.start_time.elapsed().as_micros() as u64;
        self.metrics
    }

    /// Finish with error
    pub fn finish_with_error(mut self, error: &str) -> ProcessingMetrics {
        self.metrics.processing_time_us = self.start_time.elapsed().as_micros() as u64;
        self.metrics.success = false;
        self.metrics.error_message = Some(error.to_string());
        self.metrics
    }
}
