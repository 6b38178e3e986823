//! mood-processing: EEG mood detection pipeline
//!
//! Zero-phase band-pass filtering, Welch band powers, baseline calibration,
//! rule-based classification and the tick-driven streaming loop.

pub mod aggregator;
pub mod calibration;
pub mod classifier;
pub mod config;
pub mod filters;
pub mod pipeline;
pub mod processor;
pub mod spectrum;
pub mod streaming;

pub use aggregator::{TieBreak, WindowAggregator};
pub use calibration::{BaselineCalibrator, CalibrationState};
pub use classifier::{classify, ChannelVerdict, ClassifierThresholds, MoodClassifier};
pub use config::MoodConfig;
pub use filters::{BandpassFilter, FilterConfig};
pub use pipeline::{MoodPipeline, PipelineState, TickOutcome, WindowVerdict};
pub use processor::{ProcessingMetrics, ProcessingTimer};
pub use spectrum::{BandPowerEstimator, PowerSpectrum};
pub use streaming::{LoopCommand, LoopEvent, LoopOutcome, ShutdownReason, StreamingLoop};
