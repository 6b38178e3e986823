//! Band power estimation from Welch power spectral density

use mood_core::{FrequencyBand, MoodError, MoodResult};
use realfft::RealFftPlanner;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Welch segment length used when none is configured
pub const DEFAULT_SEGMENT_LENGTH: usize = 256;

/// One-sided power spectral density of a channel window
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PowerSpectrum {
    /// Bin frequencies (Hz)
    pub frequencies: Vec<f64>,
    /// Power density per bin (units²/Hz)
    pub density: Vec<f64>,
    /// Segment length actually used
    pub segment_length: usize,
    /// Number of averaged segments
    pub segments: usize,
}

impl PowerSpectrum {
    /// Trapezoidal integral of the density over the bins inside `band`
    pub fn band_power(&self, band: FrequencyBand) -> f64 {
        let bins: Vec<(f64, f64)> = self
            .frequencies
            .iter()
            .zip(&self.density)
            .filter(|(freq, _)| band.contains(**freq))
            .map(|(&freq, &power)| (freq, power))
            .collect();

        let power: f64 = bins
            .windows(2)
            .map(|pair| (pair[1].0 - pair[0].0) * (pair[0].1 + pair[1].1) / 2.0)
            .sum();

        power.max(0.0)
    }

    /// Frequency spacing between bins
    pub fn resolution(&self) -> f64 {
        self.frequencies.get(1).copied().unwrap_or(0.0)
    }

    /// Frequency of the strongest bin
    pub fn peak_frequency(&self) -> f64 {
        self.density
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.total_cmp(b))
            .map(|(i, _)| self.frequencies[i])
            .unwrap_or(0.0)
    }
}

/// Welch estimator: periodic Hann window, 50% overlap, constant detrend,
/// density scaling
pub struct BandPowerEstimator {
    segment_length: usize,
    fft_planner: RealFftPlanner<f64>,
}

impl BandPowerEstimator {
    pub fn new(segment_length: usize) -> Self {
        BandPowerEstimator {
            segment_length: segment_length.max(1),
            fft_planner: RealFftPlanner::new(),
        }
    }

    /// Power within one band for a filtered channel window
    pub fn band_power(&mut self, samples: &[f64], sampling_rate: f64, band: FrequencyBand) -> MoodResult<f64> {
        Ok(self.spectrum(samples, sampling_rate)?.band_power(band))
    }

    /// Welch PSD of a channel window.
    ///
    /// Inputs shorter than the segment length fall back to one segment
    /// spanning the whole input, at coarser resolution.
    pub fn spectrum(&mut self, samples: &[f64], sampling_rate: f64) -> MoodResult<PowerSpectrum> {
        if samples.is_empty() {
            return Err(MoodError::InsufficientSamples {
                required: 1,
                actual: 0,
            });
        }

        if !(sampling_rate > 0.0) {
            return Err(MoodError::InvalidConfig {
                reason: format!("Sampling rate must be positive, got {}", sampling_rate),
            });
        }

        let nperseg = self.segment_length.min(samples.len());
        let noverlap = nperseg / 2;
        let step = nperseg - noverlap;
        let segments = (samples.len() - noverlap) / step;

        let window = hann_window(nperseg);
        let window_power: f64 = window.iter().map(|w| w * w).sum();
        let scale = if window_power > 0.0 {
            1.0 / (sampling_rate * window_power)
        } else {
            0.0
        };

        let fft = self.fft_planner.plan_fft_forward(nperseg);
        let mut input = fft.make_input_vec();
        let mut output = fft.make_output_vec();
        let mut density = vec![0.0; output.len()];

        for segment_idx in 0..segments {
            let start = segment_idx * step;
            let segment = &samples[start..start + nperseg];
            let mean = segment.iter().sum::<f64>() / nperseg as f64;

            for ((slot, &sample), &w) in input.iter_mut().zip(segment).zip(&window) {
                *slot = (sample - mean) * w;
            }

            fft.process(&mut input, &mut output).map_err(|e| MoodError::Spectral {
                reason: e.to_string(),
            })?;

            for (acc, bin) in density.iter_mut().zip(&output) {
                *acc += bin.norm_sqr() * scale;
            }
        }

        let last_bin = density.len() - 1;
        for (k, value) in density.iter_mut().enumerate() {
            *value /= segments as f64;
            // One-sided spectrum: fold negative frequencies, DC and Nyquist are unique
            let unique = k == 0 || (nperseg % 2 == 0 && k == last_bin);
            if !unique {
                *value *= 2.0;
            }
        }

        let frequencies = (0..density.len())
            .map(|k| k as f64 * sampling_rate / nperseg as f64)
            .collect();

        Ok(PowerSpectrum {
            frequencies,
            density,
            segment_length: nperseg,
            segments,
        })
    }
}

impl Default for BandPowerEstimator {
    fn default() -> Self {
        Self::new(DEFAULT_SEGMENT_LENGTH)
    }
}

/// Periodic Hann window
fn hann_window(len: usize) -> Vec<f64> {
    if len <= 1 {
        return vec![1.0; len];
    }
    (0..len)
        .map(|i| 0.5 - 0.5 * (2.0 * PI * i as f64 / len as f64).cos())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(freq: f64, fs: f64, len: usize) -> Vec<f64> {
        (0..len)
            .map(|i| (2.0 * PI * freq * i as f64 / fs).sin())
            .collect()
    }

    #[test]
    fn test_tone_power_in_band() {
        let mut estimator = BandPowerEstimator::default();

        // 10 whole cycles per 256-sample segment, no leakage past +-1 bin
        let signal = sine(10.0, 256.0, 1024);
        let spectrum = estimator.spectrum(&signal, 256.0).unwrap();

        assert_eq!(spectrum.segment_length, 256);
        assert_eq!(spectrum.segments, 7);
        assert!((spectrum.resolution() - 1.0).abs() < 1e-12);
        assert!((spectrum.peak_frequency() - 10.0).abs() < 1e-9);

        // Unit sine carries power 0.5
        let alpha = spectrum.band_power(FrequencyBand::ALPHA);
        assert!((alpha - 0.5).abs() < 1e-3, "alpha power {}", alpha);
        assert!(spectrum.band_power(FrequencyBand::BETA) < 1e-9);
    }

    #[test]
    fn test_short_window_reduces_segment() {
        let mut estimator = BandPowerEstimator::default();

        let signal = sine(10.0, 250.0, 100);
        let spectrum = estimator.spectrum(&signal, 250.0).unwrap();

        assert_eq!(spectrum.segment_length, 100);
        assert_eq!(spectrum.segments, 1);
        assert!((spectrum.resolution() - 2.5).abs() < 1e-12);

        let alpha = spectrum.band_power(FrequencyBand::ALPHA);
        let beta = spectrum.band_power(FrequencyBand::BETA);
        assert!(alpha > 0.0);
        assert!(alpha > beta);
    }

    #[test]
    fn test_one_second_window_at_250hz() {
        let mut estimator = BandPowerEstimator::default();

        let signal = sine(20.0, 250.0, 250);
        let spectrum = estimator.spectrum(&signal, 250.0).unwrap();
        assert_eq!(spectrum.segment_length, 250);
        assert_eq!(spectrum.frequencies.len(), 126);

        let beta = spectrum.band_power(FrequencyBand::BETA);
        let alpha = spectrum.band_power(FrequencyBand::ALPHA);
        assert!(beta > alpha);
    }

    #[test]
    fn test_power_never_negative() {
        let mut estimator = BandPowerEstimator::default();

        let inputs: Vec<Vec<f64>> = vec![
            vec![0.0; 300],
            vec![-5.0; 64],
            (0..500).map(|i| ((i * 7919) % 113) as f64 - 56.0).collect(),
            (0..257).map(|i| if i % 2 == 0 { 1e6 } else { -1e6 }).collect(),
            vec![1.0, -1.0, 2.0],
        ];

        for input in inputs {
            for band in [FrequencyBand::ALPHA, FrequencyBand::BETA, FrequencyBand::new(0.0, 125.0).unwrap()] {
                let power = estimator.band_power(&input, 250.0, band).unwrap();
                assert!(power >= 0.0);
                assert!(power.is_finite());
            }
        }
    }

    #[test]
    fn test_empty_input_rejected() {
        let mut estimator = BandPowerEstimator::default();
        assert_eq!(
            estimator.spectrum(&[], 250.0).unwrap_err(),
            MoodError::InsufficientSamples { required: 1, actual: 0 }
        );
    }

    #[test]
    fn test_band_outside_spectrum_is_zero() {
        let mut estimator = BandPowerEstimator::default();
        let spectrum = estimator.spectrum(&sine(10.0, 250.0, 250), 250.0).unwrap();
        assert_eq!(spectrum.band_power(FrequencyBand::new(200.0, 300.0).unwrap()), 0.0);
    }
}
