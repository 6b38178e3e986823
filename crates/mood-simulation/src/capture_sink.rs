//! In-memory actuator for tests and dry runs

use mood_core::{label_line, ActuatorSink, MoodError, MoodLabel, MoodResult};
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Default)]
struct SinkLog {
    lines: Vec<String>,
    close_count: usize,
    closed: bool,
    fail_writes: bool,
}

/// Records every line written to it.
///
/// Clones share one log, so a test can keep a handle while the loop owns
/// the sink.
#[derive(Debug, Clone, Default)]
pub struct CapturingSink {
    log: Arc<Mutex<SinkLog>>,
}

impl CapturingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sink whose every write fails, for exercising error paths
    pub fn failing_writes() -> Self {
        let sink = Self::default();
        sink.log().fail_writes = true;
        sink
    }

    fn log(&self) -> MutexGuard<'_, SinkLog> {
        self.log.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Raw lines written, newline included
    pub fn lines(&self) -> Vec<String> {
        self.log().lines.clone()
    }

    /// Written lines decoded back to labels
    pub fn labels(&self) -> Vec<MoodLabel> {
        self.log()
            .lines
            .iter()
            .filter_map(|line| line.parse().ok())
            .collect()
    }

    pub fn close_count(&self) -> usize {
        self.log().close_count
    }
}

impl ActuatorSink for CapturingSink {
    fn write_label(&mut self, label: MoodLabel) -> MoodResult<()> {
        let mut log = self.log();
        if log.closed {
            return Err(MoodError::ActuatorWriteFailure {
                reason: "sink closed".to_string(),
            });
        }
        if log.fail_writes {
            return Err(MoodError::ActuatorWriteFailure {
                reason: "simulated write failure".to_string(),
            });
        }
        log.lines.push(label_line(label));
        Ok(())
    }

    fn close(&mut self) -> MoodResult<()> {
        let mut log = self.log();
        log.closed = true;
        log.close_count += 1;
        Ok(())
    }

    fn name(&self) -> &str {
        "capture"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shared_log() {
        let handle = CapturingSink::new();
        let mut sink = handle.clone();

        sink.write_label(MoodLabel::Calm).unwrap();
        sink.write_label(MoodLabel::Focused).unwrap();

        assert_eq!(handle.lines(), vec!["CALM\n", "FOCUSED\n"]);
        assert_eq!(handle.labels(), vec![MoodLabel::Calm, MoodLabel::Focused]);
    }

    #[test]
    fn test_closed_sink_rejects_writes() {
        let mut sink = CapturingSink::new();
        sink.close().unwrap();

        assert!(matches!(
            sink.write_label(MoodLabel::Stressed),
            Err(MoodError::ActuatorWriteFailure { .. })
        ));
        assert_eq!(sink.close_count(), 1);
    }

    #[test]
    fn test_failing_writes() {
        let mut sink = CapturingSink::failing_writes();
        assert!(sink.write_label(MoodLabel::Calm).is_err());
        assert!(sink.lines().is_empty());
    }
}
