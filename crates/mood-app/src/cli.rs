use clap::{Args, Parser, Subcommand};
use mood_core::MoodResult;
use mood_processing::MoodConfig;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "mood-detect",
    version,
    about = "Real-time EEG mood detection",
    long_about = "Classifies each second of EEG as FOCUSED, CALM or STRESSED against a \
                  personal baseline and writes the label to a serial actuator."
)]
pub struct Cli {
    #[command(subcommand)]
    pub source: SourceCommand,

    #[command(flatten)]
    pub pipeline: PipelineArgs,

    #[command(flatten)]
    pub actuator: ActuatorArgs,

    /// Stop after this many ticks
    #[arg(long, global = true)]
    pub max_ticks: Option<u64>,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum SourceCommand {
    /// Synthetic EEG following a scripted session
    Simulated(SimulatedArgs),
    /// Recorded board data from a CSV file
    Replay(ReplayArgs),
    /// OpenBCI board through the BrainFlow BoardController library
    Brainflow(BrainflowArgs),
}

#[derive(Args)]
pub struct SimulatedArgs {
    /// Session script: resting, relaxation, study, mixed
    #[arg(long, default_value = "mixed")]
    pub scenario: String,

    /// Random seed for reproducible sessions
    #[arg(long)]
    pub seed: Option<u64>,

    /// Add 50/60Hz powerline interference
    #[arg(long)]
    pub powerline: Option<f64>,
}

#[derive(Args)]
pub struct ReplayArgs {
    /// CSV recording, one column per board row
    pub path: PathBuf,

    /// Board rows holding EEG channels, in channel order
    #[arg(long, num_args = 1.., default_values_t = vec![1, 2])]
    pub eeg_rows: Vec<usize>,

    /// Restart the recording when it runs out
    #[arg(long = "loop")]
    pub looping: bool,
}

#[derive(Args)]
pub struct BrainflowArgs {
    /// Serial port of the board dongle
    #[arg(long, env = "MOOD_BOARD_PORT")]
    pub port: String,

    /// BrainFlow board id (0 = Cyton)
    #[arg(long, default_value_t = 0)]
    pub board_id: i32,
}

#[derive(Args)]
pub struct PipelineArgs {
    /// JSON configuration file
    #[arg(long, env = "MOOD_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Board sampling rate (Hz)
    #[arg(long, global = true)]
    pub sampling_rate: Option<f64>,

    /// Number of EEG channels to classify
    #[arg(long, global = true)]
    pub channels: Option<usize>,

    /// Window duration (s)
    #[arg(long, global = true)]
    pub window: Option<f64>,

    /// Baseline calibration duration (s)
    #[arg(long, global = true)]
    pub baseline: Option<f64>,
}

#[derive(Args)]
pub struct ActuatorArgs {
    /// Serial port of the actuator; labels go to stdout only when absent
    #[arg(long, env = "MOOD_SERIAL_PORT", global = true)]
    pub serial_port: Option<String>,

    #[arg(long, default_value_t = 115_200, global = true)]
    pub baud: u32,

    /// Wait after opening the port while the board resets (ms)
    #[arg(long, default_value_t = 2000, global = true)]
    pub settle_ms: u64,
}

impl PipelineArgs {
    /// Configuration file (or defaults) with command-line overrides applied
    pub fn resolve(&self) -> MoodResult<MoodConfig> {
        let mut config = match &self.config {
            Some(path) => MoodConfig::from_file(path)?,
            None => MoodConfig::default(),
        };

        if let Some(rate) = self.sampling_rate {
            config.sampling_rate = rate;
        }
        if let Some(channels) = self.channels {
            config.channel_count = channels;
        }
        if let Some(window) = self.window {
            config.window_duration = window;
        }
        if let Some(baseline) = self.baseline {
            config.baseline_window = baseline;
        }

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_defaults_and_overrides() {
        let cli = Cli::parse_from(["mood-detect", "simulated", "--channels", "4", "--baseline", "5"]);
        let config = cli.pipeline.resolve().unwrap();

        assert_eq!(config.channel_count, 4);
        assert_eq!(config.calibration_ticks(), 5);
        assert_eq!(config.sampling_rate, 250.0);
        assert_eq!(cli.actuator.baud, 115_200);
        assert_eq!(cli.actuator.settle_ms, 2000);
        assert!(cli.actuator.serial_port.is_none());
    }

    #[test]
    fn test_invalid_override_rejected() {
        let cli = Cli::parse_from(["mood-detect", "simulated", "--window", "0"]);
        assert!(cli.pipeline.resolve().is_err());
    }

    #[test]
    fn test_replay_arguments() {
        let cli = Cli::parse_from(["mood-detect", "replay", "session.csv", "--eeg-rows", "1", "2", "3", "--loop"]);
        match cli.source {
            SourceCommand::Replay(args) => {
                assert_eq!(args.eeg_rows, vec![1, 2, 3]);
                assert!(args.looping);
            }
            _ => panic!("expected replay source"),
        }
    }
}
