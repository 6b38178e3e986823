//! EEG signal simulator with scripted alpha/beta rhythm changes

use crate::signal_patterns::{pattern_at, MoodPhase};
use mood_core::{MoodError, MoodResult, WindowMetadata};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Configuration for EEG simulation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Sampling rate in Hz
    pub sampling_rate: f64,
    /// Number of EEG channels to simulate
    pub channel_count: usize,
    /// Alpha rhythm frequency (Hz)
    pub alpha_freq: f64,
    /// Beta rhythm frequency (Hz)
    pub beta_freq: f64,
    /// Mood script, the last phase holds indefinitely
    pub phases: Vec<MoodPhase>,
    /// Noise configuration
    pub noise: NoiseConfig,
    /// Power line interference (50/60Hz)
    pub powerline_freq: Option<f64>,
    /// Random seed for reproducibility
    pub seed: Option<u64>,
}

/// Noise configuration for realistic EEG simulation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoiseConfig {
    /// Gaussian noise standard deviation (0.0 = no noise)
    pub gaussian_std: f64,
    /// Slow electrode drift amplitude
    pub drift_amplitude: f64,
    /// Eye blink artifact probability per sample
    pub blink_prob: f64,
    /// Eye blink artifact amplitude
    pub blink_amplitude: f64,
}

impl Default for NoiseConfig {
    fn default() -> Self {
        Self {
            gaussian_std: 0.2,
            drift_amplitude: 1.0,
            blink_prob: 0.0,
            blink_amplitude: 5.0,
        }
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            sampling_rate: 250.0,
            channel_count: 2,
            alpha_freq: 10.0,
            beta_freq: 20.0,
            phases: vec![MoodPhase::neutral(60.0)],
            noise: NoiseConfig::default(),
            powerline_freq: None,
            seed: None,
        }
    }
}

impl SimulationConfig {
    pub fn validate(&self) -> MoodResult<()> {
        WindowMetadata::validate_sampling_rate(self.sampling_rate)?;
        WindowMetadata::validate_channel_count(self.channel_count)?;

        let nyquist = self.sampling_rate / 2.0;
        for freq in [self.alpha_freq, self.beta_freq] {
            if !(freq > 0.0 && freq < nyquist) {
                return Err(MoodError::InvalidConfig {
                    reason: format!("rhythm frequency {}Hz outside (0, {}Hz)", freq, nyquist),
                });
            }
        }

        if self.phases.iter().any(|phase| !(phase.duration > 0.0)) {
            return Err(MoodError::InvalidConfig {
                reason: "mood phases must have positive durations".to_string(),
            });
        }

        Ok(())
    }
}

/// EEG signal simulator
pub struct EegSimulator {
    config: SimulationConfig,
    rng: StdRng,
    normal_dist: Normal<f64>,
    samples_generated: u64,
}

impl EegSimulator {
    /// Create new EEG simulator with configuration
    pub fn new(config: SimulationConfig) -> MoodResult<Self> {
        config.validate()?;

        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let normal_dist = Normal::new(0.0, config.noise.gaussian_std).map_err(|e| MoodError::InvalidConfig {
            reason: format!("Failed to create normal distribution: {}", e),
        })?;

        Ok(EegSimulator {
            config,
            rng,
            normal_dist,
            samples_generated: 0,
        })
    }

    /// Generate the next `num_samples` samples of every channel, channel-major
    pub fn generate(&mut self, num_samples: usize) -> Vec<Vec<f64>> {
        let channel_count = self.config.channel_count;
        let mut channels = vec![Vec::with_capacity(num_samples); channel_count];

        for offset in 0..num_samples {
            let time = (self.samples_generated + offset as u64) as f64 / self.config.sampling_rate;
            let (alpha_amp, beta_amp) = pattern_at(&self.config.phases, time).amplitudes();
            let blink = self.blink_artifact();

            for (channel_idx, channel) in channels.iter_mut().enumerate() {
                let mut value = self.rhythms(time, channel_idx, alpha_amp, beta_amp);
                value += self.normal_dist.sample(&mut self.rng);
                value += self.config.noise.drift_amplitude * (2.0 * PI * 0.1 * time + channel_idx as f64).sin();
                value += blink;

                if let Some(powerline_freq) = self.config.powerline_freq {
                    value += 0.5 * (2.0 * PI * powerline_freq * time).sin();
                }

                channel.push(value);
            }
        }

        self.samples_generated += num_samples as u64;
        channels
    }

    fn rhythms(&self, time: f64, channel_idx: usize, alpha_amp: f64, beta_amp: f64) -> f64 {
        // Each electrode sees the rhythms with its own phase
        let phase = channel_idx as f64 * PI / 3.0;
        alpha_amp * (2.0 * PI * self.config.alpha_freq * time + phase).sin()
            + beta_amp * (2.0 * PI * self.config.beta_freq * time + phase).sin()
    }

    /// Blink artifacts hit every electrode at once
    fn blink_artifact(&mut self) -> f64 {
        if self.config.noise.blink_prob > 0.0 && self.rng.gen::<f64>() < self.config.noise.blink_prob {
            self.config.noise.blink_amplitude * self.rng.gen_range(0.5..1.0)
        } else {
            0.0
        }
    }

    /// Seconds of signal generated so far
    pub fn elapsed(&self) -> f64 {
        self.samples_generated as f64 / self.config.sampling_rate
    }

    /// Reset time offset (useful for restarting simulation)
    pub fn reset_time(&mut self) {
        self.samples_generated = 0;
    }

    /// Get current configuration
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }
}
