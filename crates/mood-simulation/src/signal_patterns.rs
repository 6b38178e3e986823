//! Scripted mood phases for realistic EEG simulation

use serde::{Deserialize, Serialize};

/// Rhythm profile of a mental state, as alpha/beta amplitudes
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum MoodPattern {
    /// Resting reference level, both rhythms moderate
    Neutral,
    /// Strong alpha, weak beta
    Relaxed,
    /// Strong beta, weak alpha
    Focused,
    /// Both rhythms suppressed relative to rest, beta slightly ahead
    Stressed,
    /// Explicit amplitudes
    Custom { alpha: f64, beta: f64 },
}

impl MoodPattern {
    /// (alpha, beta) rhythm amplitudes
    pub fn amplitudes(&self) -> (f64, f64) {
        match self {
            MoodPattern::Neutral => (1.0, 1.0),
            MoodPattern::Relaxed => (3.0, 0.8),
            MoodPattern::Focused => (0.8, 3.0),
            MoodPattern::Stressed => (0.6, 1.1),
            MoodPattern::Custom { alpha, beta } => (*alpha, *beta),
        }
    }

    /// Get pattern description
    pub fn description(&self) -> &'static str {
        match self {
            MoodPattern::Neutral => "Resting baseline",
            MoodPattern::Relaxed => "Relaxed, eyes closed",
            MoodPattern::Focused => "Focused attention",
            MoodPattern::Stressed => "Stressed",
            MoodPattern::Custom { .. } => "Custom rhythm mix",
        }
    }
}

/// A pattern held for a fixed time
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MoodPhase {
    pub pattern: MoodPattern,
    /// Phase length in seconds
    pub duration: f64,
}

impl MoodPhase {
    pub fn new(pattern: MoodPattern, duration: f64) -> Self {
        Self { pattern, duration }
    }

    pub fn neutral(duration: f64) -> Self {
        Self::new(MoodPattern::Neutral, duration)
    }

    pub fn relaxed(duration: f64) -> Self {
        Self::new(MoodPattern::Relaxed, duration)
    }

    pub fn focused(duration: f64) -> Self {
        Self::new(MoodPattern::Focused, duration)
    }

    pub fn stressed(duration: f64) -> Self {
        Self::new(MoodPattern::Stressed, duration)
    }
}

/// Pattern active at `time` seconds; the last phase holds forever
pub fn pattern_at(phases: &[MoodPhase], time: f64) -> MoodPattern {
    let mut start = 0.0;
    for phase in phases {
        if time < start + phase.duration {
            return phase.pattern;
        }
        start += phase.duration;
    }
    phases.last().map_or(MoodPattern::Neutral, |phase| phase.pattern)
}

/// Common session scripts
pub fn presets() -> Vec<(&'static str, Vec<MoodPhase>)> {
    vec![
        ("Resting", vec![MoodPhase::neutral(60.0)]),
        (
            "Relaxation",
            vec![MoodPhase::neutral(10.0), MoodPhase::relaxed(50.0)],
        ),
        (
            "Study Session",
            vec![MoodPhase::neutral(10.0), MoodPhase::focused(50.0)],
        ),
        (
            "Mixed Day",
            vec![
                MoodPhase::neutral(10.0),
                MoodPhase::focused(20.0),
                MoodPhase::stressed(15.0),
                MoodPhase::relaxed(15.0),
            ],
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pattern_timeline() {
        let phases = vec![MoodPhase::neutral(10.0), MoodPhase::relaxed(5.0)];

        assert_eq!(pattern_at(&phases, 0.0), MoodPattern::Neutral);
        assert_eq!(pattern_at(&phases, 9.99), MoodPattern::Neutral);
        assert_eq!(pattern_at(&phases, 10.0), MoodPattern::Relaxed);
        assert_eq!(pattern_at(&phases, 100.0), MoodPattern::Relaxed);
        assert_eq!(pattern_at(&[], 3.0), MoodPattern::Neutral);
    }

    #[test]
    fn test_profiles_dominate_expected_band() {
        let (alpha, beta) = MoodPattern::Relaxed.amplitudes();
        assert!(alpha > beta);
        let (alpha, beta) = MoodPattern::Focused.amplitudes();
        assert!(beta > alpha);
        assert!(presets().iter().all(|(_, phases)| !phases.is_empty()));
    }
}
