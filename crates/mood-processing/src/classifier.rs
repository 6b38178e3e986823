//! Rule-based mood classification of one channel against the baseline

use mood_core::{BandPowers, Baseline, MoodLabel};
use serde::{Deserialize, Serialize};

/// Decision thresholds for the ratio rules
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassifierThresholds {
    /// Ratio to baseline a band must exceed to count as elevated
    pub ratio_threshold: f64,
    /// Added to baseline powers before dividing
    pub epsilon: f64,
}

impl Default for ClassifierThresholds {
    fn default() -> Self {
        Self {
            ratio_threshold: 1.5,
            epsilon: 1e-6,
        }
    }
}

/// Label for one channel together with the ratios that produced it
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChannelVerdict {
    pub label: MoodLabel,
    pub alpha_ratio: f64,
    pub beta_ratio: f64,
}

/// Stateless classifier, no smoothing between windows
#[derive(Debug, Clone, Default)]
pub struct MoodClassifier {
    thresholds: ClassifierThresholds,
}

impl MoodClassifier {
    pub fn new(thresholds: ClassifierThresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &ClassifierThresholds {
        &self.thresholds
    }

    pub fn classify(&self, powers: BandPowers, baseline: &Baseline) -> MoodLabel {
        self.classify_detailed(powers, baseline).label
    }

    /// Rules are checked in order: elevated beta dominating alpha is
    /// FOCUSED, elevated alpha dominating beta is CALM, anything else is
    /// STRESSED.
    pub fn classify_detailed(&self, powers: BandPowers, baseline: &Baseline) -> ChannelVerdict {
        let ClassifierThresholds {
            ratio_threshold,
            epsilon,
        } = self.thresholds;

        let alpha_ratio = powers.alpha / (baseline.alpha + epsilon);
        let beta_ratio = powers.beta / (baseline.beta + epsilon);

        let label = if beta_ratio > ratio_threshold && powers.beta > powers.alpha {
            MoodLabel::Focused
        } else if alpha_ratio > ratio_threshold && powers.alpha > powers.beta {
            MoodLabel::Calm
        } else {
            MoodLabel::Stressed
        };

        ChannelVerdict {
            label,
            alpha_ratio,
            beta_ratio,
        }
    }
}

/// Classify with the default thresholds
pub fn classify(alpha: f64, beta: f64, baseline_alpha: f64, baseline_beta: f64) -> MoodLabel {
    MoodClassifier::default().classify(
        BandPowers::new(alpha, beta),
        &Baseline::new(baseline_alpha, baseline_beta),
    )
}
