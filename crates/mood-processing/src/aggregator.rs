//! Majority vote over per-channel labels

use mood_core::{MoodError, MoodLabel, MoodResult};
use serde::{Deserialize, Serialize};

/// Rule for picking among equally frequent labels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreak {
    /// The tied label that appears first in channel order
    #[default]
    FirstInChannelOrder,
    /// The tied label with the lowest ordinal (FOCUSED < CALM < STRESSED)
    LowestOrdinal,
}

/// Reduces one window's channel labels to a single label
#[derive(Debug, Clone, Copy, Default)]
pub struct WindowAggregator {
    tie_break: TieBreak,
}

impl WindowAggregator {
    pub fn new(tie_break: TieBreak) -> Self {
        Self { tie_break }
    }

    pub fn tie_break(&self) -> TieBreak {
        self.tie_break
    }

    /// Most frequent label, ties resolved by the configured rule
    pub fn aggregate(&self, labels: &[MoodLabel]) -> MoodResult<MoodLabel> {
        if labels.is_empty() {
            return Err(MoodError::EmptyWindow);
        }

        let mut counts = [0usize; MoodLabel::ALL.len()];
        for label in labels {
            counts[label.ordinal()] += 1;
        }
        let best = counts.iter().copied().max().unwrap_or(0);

        let winner = match self.tie_break {
            TieBreak::FirstInChannelOrder => labels
                .iter()
                .copied()
                .find(|label| counts[label.ordinal()] == best),
            TieBreak::LowestOrdinal => MoodLabel::ALL
                .iter()
                .copied()
                .find(|label| counts[label.ordinal()] == best),
        };

        winner.ok_or(MoodError::EmptyWindow)
    }
}
