//! Zero-phase band-pass filtering for EEG windows

use mood_core::{MoodError, MoodResult};
use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Band-pass filter configuration parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Low cutoff (Hz)
    pub low_cutoff: f64,
    /// High cutoff (Hz)
    pub high_cutoff: f64,
    /// Butterworth prototype order
    pub order: usize,
}

impl FilterConfig {
    /// Create band-pass filter configuration
    pub fn bandpass(low_cutoff: f64, high_cutoff: f64, order: usize) -> Self {
        Self {
            low_cutoff,
            high_cutoff,
            order,
        }
    }

    /// Check the design against a sampling rate
    pub fn validate(&self, sampling_rate: f64) -> MoodResult<()> {
        let nyquist = sampling_rate / 2.0;

        if self.order == 0 {
            return Err(MoodError::InvalidConfig {
                reason: "Filter order must be at least 1".to_string(),
            });
        }

        if !(self.low_cutoff > 0.0) {
            return Err(MoodError::InvalidConfig {
                reason: "Low cutoff must be positive".to_string(),
            });
        }

        if self.low_cutoff >= self.high_cutoff {
            return Err(MoodError::InvalidConfig {
                reason: "Low cutoff must be less than high cutoff".to_string(),
            });
        }

        if self.high_cutoff >= nyquist {
            return Err(MoodError::InvalidConfig {
                reason: format!(
                    "High cutoff {}Hz must be less than Nyquist frequency {}Hz",
                    self.high_cutoff, nyquist
                ),
            });
        }

        Ok(())
    }
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self::bandpass(1.0, 50.0, 4)
    }
}

/// Single biquad section (2nd order), transposed direct form II
#[derive(Debug, Clone, Copy)]
struct BiquadSection {
    // y[n] = b0*x[n] + z1; z1 = b1*x[n] - a1*y[n] + z2; z2 = b2*x[n] - a2*y[n]
    b0: f64,
    b1: f64,
    b2: f64,
    a1: f64,
    a2: f64,
}

impl BiquadSection {
    /// Section with zeros at z = 1 and z = -1 and the given pole pair
    fn bandpass(gain: f64, a1: f64, a2: f64) -> Self {
        Self {
            b0: gain,
            b1: 0.0,
            b2: -gain,
            a1,
            a2,
        }
    }

    fn dc_gain(&self) -> f64 {
        (self.b0 + self.b1 + self.b2) / (1.0 + self.a1 + self.a2)
    }

    /// Filter state after an infinitely long unit step
    fn step_state(&self) -> [f64; 2] {
        let dc = self.dc_gain();
        let z2 = self.b2 - self.a2 * dc;
        let z1 = self.b1 - self.a1 * dc + z2;
        [z1, z2]
    }

    fn run(&self, data: &mut [f64], state: [f64; 2]) {
        let [mut z1, mut z2] = state;
        for sample in data.iter_mut() {
            let input = *sample;
            let output = self.b0 * input + z1;
            z1 = self.b1 * input - self.a1 * output + z2;
            z2 = self.b2 * input - self.a2 * output;
            *sample = output;
        }
    }
}

/// Butterworth band-pass applied forward and backward (zero phase).
///
/// Stateless between calls: every window is filtered from steady-state
/// initial conditions scaled to its own edge samples.
#[derive(Debug, Clone)]
pub struct BandpassFilter {
    filter_config: FilterConfig,
}

impl BandpassFilter {
    pub fn new(filter_config: FilterConfig) -> Self {
        BandpassFilter { filter_config }
    }

    pub fn config(&self) -> &FilterConfig {
        &self.filter_config
    }

    /// Number of reflected samples added to each edge
    pub fn padding_len(&self) -> usize {
        3 * (2 * self.filter_config.order + 1)
    }

    /// Shortest input the filter accepts
    pub fn min_samples(&self) -> usize {
        self.padding_len() + 1
    }

    /// Filter one channel segment, output has the input's length
    pub fn filter(&self, samples: &[f64], sampling_rate: f64) -> MoodResult<Vec<f64>> {
        let sections = self.design(sampling_rate)?;
        let pad = self.padding_len();

        if samples.len() <= pad {
            return Err(MoodError::InsufficientSamples {
                required: self.min_samples(),
                actual: samples.len(),
            });
        }

        let mut data = odd_extension(samples, pad);
        let states = cascade_step_states(&sections);

        let first = data[0];
        run_cascade(&sections, &states, first, &mut data);

        data.reverse();
        let last = data[0];
        run_cascade(&sections, &states, last, &mut data);
        data.reverse();

        Ok(data[pad..pad + samples.len()].to_vec())
    }

    /// Digital Butterworth band-pass as cascaded biquads
    fn design(&self, sampling_rate: f64) -> MoodResult<Vec<BiquadSection>> {
        self.filter_config.validate(sampling_rate)?;

        let order = self.filter_config.order;
        let nyquist = sampling_rate / 2.0;

        // Pre-warp band edges for the bilinear transform (design rate of 2)
        let warp = |freq: f64| 4.0 * (PI * (freq / nyquist) / 2.0).tan();
        let w_low = warp(self.filter_config.low_cutoff);
        let w_high = warp(self.filter_config.high_cutoff);
        let bandwidth = w_high - w_low;
        let center_sq = w_low * w_high;

        // Analog low-pass prototype poles on the left half of the unit circle
        let prototype = (0..order).map(|k| {
            let m = 2.0 * k as f64 + 1.0 - order as f64;
            -Complex64::from_polar(1.0, PI * m / (2.0 * order as f64))
        });

        // Low-pass to band-pass: every prototype pole splits into two
        let mut analog_poles = Vec::with_capacity(2 * order);
        for pole in prototype {
            let scaled = pole * (bandwidth / 2.0);
            let root = (scaled * scaled - center_sq).sqrt();
            analog_poles.push(scaled + root);
            analog_poles.push(scaled - root);
        }

        // Bilinear transform: analog zeros at the origin land on z = 1,
        // zeros at infinity on z = -1
        let four = Complex64::new(4.0, 0.0);
        let mut denominator = Complex64::new(1.0, 0.0);
        let mut digital_poles: Vec<Complex64> = analog_poles
            .iter()
            .map(|&p| {
                denominator *= four - p;
                (four + p) / (four - p)
            })
            .collect();
        let gain = bandwidth.powi(order as i32) * (four.powi(order as i32) / denominator).re;

        // Poles nearest the unit circle go last
        digital_poles.sort_by(|a, b| a.norm().total_cmp(&b.norm()));

        let tolerance = 1e-10;
        let mut sections = Vec::with_capacity(order);
        let mut real_poles = Vec::new();
        for pole in &digital_poles {
            if pole.im > tolerance {
                sections.push((-2.0 * pole.re, pole.norm_sqr()));
            } else if pole.im.abs() <= tolerance {
                real_poles.push(pole.re);
            }
        }
        for pair in real_poles.chunks(2) {
            if let [r1, r2] = pair {
                sections.push((-(r1 + r2), r1 * r2));
            }
        }

        if sections.len() != order {
            return Err(MoodError::InvalidConfig {
                reason: format!(
                    "Band-pass design produced {} sections for order {}",
                    sections.len(),
                    order
                ),
            });
        }

        Ok(sections
            .into_iter()
            .enumerate()
            .map(|(idx, (a1, a2))| {
                let section_gain = if idx == 0 { gain } else { 1.0 };
                BiquadSection::bandpass(section_gain, a1, a2)
            })
            .collect())
    }
}

impl Default for BandpassFilter {
    fn default() -> Self {
        Self::new(FilterConfig::default())
    }
}

/// Point-symmetric reflection of `pad` samples about each edge
fn odd_extension(samples: &[f64], pad: usize) -> Vec<f64> {
    let n = samples.len();
    let first = samples[0];
    let last = samples[n - 1];

    let mut extended = Vec::with_capacity(n + 2 * pad);
    extended.extend((1..=pad).rev().map(|i| 2.0 * first - samples[i]));
    extended.extend_from_slice(samples);
    extended.extend((1..=pad).map(|i| 2.0 * last - samples[n - 1 - i]));
    extended
}

/// Per-section step states, each scaled by the DC gain of the sections before it
fn cascade_step_states(sections: &[BiquadSection]) -> Vec<[f64; 2]> {
    let mut scale = 1.0;
    sections
        .iter()
        .map(|section| {
            let [z1, z2] = section.step_state();
            let state = [z1 * scale, z2 * scale];
            scale *= section.dc_gain();
            state
        })
        .collect()
}

fn run_cascade(sections: &[BiquadSection], states: &[[f64; 2]], initial: f64, data: &mut [f64]) {
    for (section, state) in sections.iter().zip(states) {
        section.run(data, [state[0] * initial, state[1] * initial]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FS: f64 = 250.0;

    fn sine(freq: f64, len: usize) -> Vec<f64> {
        (0..len)
            .map(|i| (2.0 * PI * freq * i as f64 / FS).sin())
            .collect()
    }

    fn rms(data: &[f64]) -> f64 {
        (data.iter().map(|x| x * x).sum::<f64>() / data.len() as f64).sqrt()
    }

    #[test]
    fn test_output_length_matches_input() {
        let filter = BandpassFilter::default();
        for len in [28, 64, 250, 1000] {
            let output = filter.filter(&sine(10.0, len), FS).unwrap();
            assert_eq!(output.len(), len);
            assert!(output.iter().all(|x| x.is_finite()));
        }
    }

    #[test]
    fn test_short_input_rejected() {
        let filter = BandpassFilter::default();
        assert_eq!(filter.min_samples(), 28);

        let result = filter.filter(&sine(10.0, 27), FS);
        assert_eq!(
            result,
            Err(MoodError::InsufficientSamples { required: 28, actual: 27 })
        );
    }

    #[test]
    fn test_passband_has_no_phase_shift() {
        let filter = BandpassFilter::default();
        let input = sine(10.0, 2500);
        let output = filter.filter(&input, FS).unwrap();

        // Away from the edge transients the 10Hz tone passes unchanged and unshifted
        for i in 1000..1500 {
            assert!((output[i] - input[i]).abs() < 0.01, "sample {} differs", i);
        }
    }

    #[test]
    fn test_stopband_attenuated() {
        let filter = BandpassFilter::default();
        let input = sine(100.0, 2500);
        let output = filter.filter(&input, FS).unwrap();

        assert!(rms(&output[1000..1500]) < 0.05 * rms(&input[1000..1500]));
    }

    #[test]
    fn test_dc_removed() {
        let filter = BandpassFilter::default();
        let output = filter.filter(&vec![3.0; 250], FS).unwrap();
        assert!(output.iter().all(|x| x.abs() < 1e-6));
    }

    #[test]
    fn test_pure_per_call() {
        let filter = BandpassFilter::default();
        let input = sine(12.0, 250);
        let first = filter.filter(&input, FS).unwrap();
        let second = filter.filter(&input, FS).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_invalid_design() {
        let filter = BandpassFilter::new(FilterConfig::bandpass(1.0, 130.0, 4));
        assert!(matches!(
            filter.filter(&sine(10.0, 250), FS),
            Err(MoodError::InvalidConfig { .. })
        ));

        let filter = BandpassFilter::new(FilterConfig::bandpass(30.0, 10.0, 4));
        assert!(filter.filter(&sine(10.0, 250), FS).is_err());

        let filter = BandpassFilter::new(FilterConfig::bandpass(1.0, 50.0, 0));
        assert!(filter.filter(&sine(10.0, 250), FS).is_err());
    }

    #[test]
    fn test_odd_orders_design() {
        for order in 1..=6 {
            let filter = BandpassFilter::new(FilterConfig::bandpass(1.0, 50.0, order));
            let output = filter.filter(&sine(10.0, 250), FS).unwrap();
            assert_eq!(output.len(), 250);
        }
    }
}
