//! Lead score and tier.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::lead::IntentSignal;

/// Minimum score for tier A.
pub const TIER_A_THRESHOLD: f64 = 12.0;

/// Minimum score for tier B.
pub const TIER_B_THRESHOLD: f64 = 6.0;

/// Priority tier derived from a score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Tier {
    A,
    B,
    C,
}

impl Tier {
    /// Map a score to exactly one tier.
    ///
    /// Total over every `f64`: anything that is not `>=` a threshold
    /// (including NaN) falls through to C.
    pub fn from_score(score: f64) -> Self {
        if score >= TIER_A_THRESHOLD {
            Tier::A
        } else if score >= TIER_B_THRESHOLD {
            Tier::B
        } else {
            Tier::C
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Tier::A => "A",
            Tier::B => "B",
            Tier::C => "C",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Deterministic score for one lead. Immutable once computed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
    pub score: f64,
    pub tier: Tier,
}

impl ScoreResult {
    /// Human-readable account of how the score was reached.
    pub fn explanation(&self, employee_count: i64, intent: IntentSignal) -> String {
        format!(
            "Score {:.2} (Tier {}) based on {} employees and {} intent (weight {}).",
            self.score,
            self.tier,
            employee_count,
            intent,
            intent.weight()
        )
    }
}
