//! Prompt scoring.
//!
//! A cheap relative quality proxy, not a semantic metric: word count for
//! length, long-word count for clarity, their sum as the ranking signal.
//! Total over any input; the empty string scores zero across the board.

use serde::{Deserialize, Serialize};

/// Words longer than this count toward the clarity score.
const CLARITY_WORD_LEN: usize = 3;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromptScores {
    pub length_score: usize,
    pub clarity_score: usize,
    pub final_score: usize,
}

/// Score one generated text. Pure; no failure modes.
pub fn score(text: &str) -> PromptScores {
    let length_score = text.split_whitespace().count();
    let clarity_score = text
        .split_whitespace()
        .filter(|word| word.chars().count() > CLARITY_WORD_LEN)
        .count();
    PromptScores {
        length_score,
        clarity_score,
        final_score: length_score + clarity_score,
    }
}

/// Commentary bucket for a final score. The thresholds are part of the
/// output contract: the shell renders the comment verbatim.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreBand {
    NeedsImprovement,
    FairlyDescriptive,
    WellStructured,
}

impl ScoreBand {
    pub fn from_final_score(final_score: usize) -> Self {
        if final_score < 150 {
            ScoreBand::NeedsImprovement
        } else if final_score < 200 {
            ScoreBand::FairlyDescriptive
        } else {
            ScoreBand::WellStructured
        }
    }

    pub fn comment(&self) -> &'static str {
        match self {
            ScoreBand::NeedsImprovement => {
                "The generated prompt could be improved by making it more specific and detailed."
            }
            ScoreBand::FairlyDescriptive => {
                "The prompt is fairly descriptive, but it could benefit from additional details."
            }
            ScoreBand::WellStructured => {
                "The prompt is well-structured and highly descriptive."
            }
        }
    }
}
