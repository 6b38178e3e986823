//! Actuator sinks: serial line protocol and stdout echo

use mood_core::{label_line, ActuatorSink, MoodError, MoodLabel, MoodResult};
use std::io::Write;
use std::time::Duration;
use tracing::{debug, info};

/// Newline-terminated labels over a serial port (microcontroller actuator)
pub struct SerialActuator {
    port: Option<Box<dyn serialport::SerialPort>>,
    port_name: String,
}

impl SerialActuator {
    /// Open the port. The caller should allow the board time to reset
    /// before the first write.
    pub fn open(port_name: &str, baud_rate: u32) -> MoodResult<Self> {
        let port = serialport::new(port_name, baud_rate)
            .timeout(Duration::from_millis(500))
            .open()
            .map_err(|e| MoodError::ActuatorWriteFailure {
                reason: format!("failed to open {}: {}", port_name, e),
            })?;

        info!(port = port_name, baud_rate, "Actuator port open");
        Ok(Self {
            port: Some(port),
            port_name: port_name.to_string(),
        })
    }

    /// Serial ports present on this machine
    pub fn list_ports() -> Vec<String> {
        serialport::available_ports()
            .map(|ports| ports.into_iter().map(|p| p.port_name).collect())
            .unwrap_or_default()
    }
}

impl ActuatorSink for SerialActuator {
    fn write_label(&mut self, label: MoodLabel) -> MoodResult<()> {
        let port = self.port.as_mut().ok_or_else(|| MoodError::ActuatorWriteFailure {
            reason: format!("{} is closed", self.port_name),
        })?;

        port.write_all(label_line(label).as_bytes())
            .and_then(|_| port.flush())
            .map_err(|e| MoodError::ActuatorWriteFailure {
                reason: format!("write to {} failed: {}", self.port_name, e),
            })
    }

    fn close(&mut self) -> MoodResult<()> {
        if self.port.take().is_some() {
            debug!(port = %self.port_name, "Actuator port closed");
        }
        Ok(())
    }

    fn name(&self) -> &str {
        &self.port_name
    }
}

/// Prints each label on its own stdout line
pub struct StdoutActuator<W: Write = std::io::Stdout> {
    out: W,
}

impl Default for StdoutActuator {
    fn default() -> Self {
        Self {
            out: std::io::stdout(),
        }
    }
}

impl<W: Write> StdoutActuator<W> {
    pub fn with_writer(out: W) -> Self {
        Self { out }
    }
}

impl<W: Write> ActuatorSink for StdoutActuator<W> {
    fn write_label(&mut self, label: MoodLabel) -> MoodResult<()> {
        self.out
            .write_all(label_line(label).as_bytes())
            .and_then(|_| self.out.flush())
            .map_err(|e| MoodError::ActuatorWriteFailure {
                reason: format!("stdout: {}", e),
            })
    }

    fn close(&mut self) -> MoodResult<()> {
        self.out.flush().map_err(|e| MoodError::ActuatorWriteFailure {
            reason: format!("stdout: {}", e),
        })
    }

    fn name(&self) -> &str {
        "stdout"
    }
}

/// Echoes every label to stdout before forwarding it
pub struct EchoActuator<S: ActuatorSink, W: Write = std::io::Stdout> {
    echo: StdoutActuator<W>,
    inner: S,
}

impl<S: ActuatorSink> EchoActuator<S> {
    pub fn new(inner: S) -> Self {
        Self {
            echo: StdoutActuator::default(),
            inner,
        }
    }
}

impl<S: ActuatorSink, W: Write> ActuatorSink for EchoActuator<S, W> {
    fn write_label(&mut self, label: MoodLabel) -> MoodResult<()> {
        self.echo.write_label(label)?;
        self.inner.write_label(label)
    }

    fn close(&mut self) -> MoodResult<()> {
        let echoed = self.echo.close();
        self.inner.close()?;
        echoed
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mood_simulation::CapturingSink;

    #[test]
    fn test_stdout_line_format() {
        let mut sink = StdoutActuator::with_writer(Vec::new());
        sink.write_label(MoodLabel::Calm).unwrap();
        sink.write_label(MoodLabel::Stressed).unwrap();
        assert_eq!(String::from_utf8(sink.out).unwrap(), "CALM\nSTRESSED\n");
    }

    #[test]
    fn test_echo_forwards() {
        let capture = CapturingSink::new();
        let mut sink = EchoActuator {
            echo: StdoutActuator::with_writer(Vec::new()),
            inner: capture.clone(),
        };

        sink.write_label(MoodLabel::Focused).unwrap();
        sink.close().unwrap();

        assert_eq!(String::from_utf8(sink.echo.out.clone()).unwrap(), "FOCUSED\n");
        assert_eq!(capture.labels(), vec![MoodLabel::Focused]);
        assert_eq!(capture.close_count(), 1);
        assert_eq!(sink.name(), "capture");
    }

    #[test]
    fn test_missing_serial_port() {
        let result = SerialActuator::open("/dev/mood-detect-missing-port", 115_200);
        assert!(matches!(result, Err(MoodError::ActuatorWriteFailure { .. })));
    }
}
