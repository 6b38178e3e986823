//! Mood-Core: foundation types for EEG mood detection
//!
//! Sample windows, mood labels, band definitions, the shared error type and
//! the collaborator traits for boards and actuators.

pub mod sample_window;
pub mod mood_types;
pub mod device;
pub mod error;

pub use sample_window::*;
pub use mood_types::*;
pub use device::{AcquisitionSource, ActuatorSink, BoardData, label_line};
pub use error::{MoodError, MoodResult};
