//! mood-simulation: synthetic EEG boards and test collaborators
//!
//! Seedable EEG generation following scripted mood phases, a simulated board
//! and a CSV replay board behind the acquisition interface, and a capturing
//! actuator sink.

pub mod capture_sink;
pub mod eeg_simulator;
pub mod replay_board;
pub mod signal_patterns;
pub mod simulated_board;

pub use capture_sink::CapturingSink;
pub use eeg_simulator::*;
pub use replay_board::ReplayBoard;
pub use signal_patterns::*;
pub use simulated_board::SimulatedBoard;
