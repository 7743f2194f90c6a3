//! Risk tiers and weighted composite scoring.
//!
//! Every scoring domain maps its raw inputs to 0-100 "factors", combines them
//! with fixed weights into a composite score, and classifies the score with
//! the thresholds below. The thresholds are identical across domains.

use bitcode::{Decode, Encode};
use serde::{Deserialize, Serialize};

/// Composite score at or above this is Critical.
pub const CRITICAL_THRESHOLD: u8 = 75;
/// Composite score at or above this (and below critical) is High.
pub const HIGH_THRESHOLD: u8 = 50;
/// Composite score at or above this (and below high) is Moderate.
pub const MODERATE_THRESHOLD: u8 = 30;

// ---------------------------------------------------------------------------
// RiskTier
// ---------------------------------------------------------------------------

/// Discrete risk classification shared by all scoring domains, and reused as
/// alert / community-report severity.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Encode, Decode,
)]
pub enum RiskTier {
    Low,
    Moderate,
    High,
    Critical,
}

impl RiskTier {
    /// Classify a composite score. Pure function of the score alone.
    pub fn from_score(score: u8) -> Self {
        if score >= CRITICAL_THRESHOLD {
            RiskTier::Critical
        } else if score >= HIGH_THRESHOLD {
            RiskTier::High
        } else if score >= MODERATE_THRESHOLD {
            RiskTier::Moderate
        } else {
            RiskTier::Low
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            RiskTier::Low => "low",
            RiskTier::Moderate => "moderate",
            RiskTier::High => "high",
            RiskTier::Critical => "critical",
        }
    }
}

// ---------------------------------------------------------------------------
// Weighted composite
// ---------------------------------------------------------------------------

/// Combine `(factor, weight)` pairs into a composite score.
///
/// The weighted sum is clamped to [0, 100] and rounded to the nearest
/// integer. Factors themselves are not validated; out-of-range inputs
/// propagate into the sum and are bounded only here.
pub fn composite_score(factors: &[(f64, f64)]) -> u8 {
    let weighted: f64 = factors.iter().map(|(factor, weight)| factor * weight).sum();
    weighted.clamp(0.0, 100.0).round() as u8
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_thresholds() {
        assert_eq!(RiskTier::from_score(75), RiskTier::Critical);
        assert_eq!(RiskTier::from_score(74), RiskTier::High);
        assert_eq!(RiskTier::from_score(50), RiskTier::High);
        assert_eq!(RiskTier::from_score(49), RiskTier::Moderate);
        assert_eq!(RiskTier::from_score(30), RiskTier::Moderate);
        assert_eq!(RiskTier::from_score(29), RiskTier::Low);
        assert_eq!(RiskTier::from_score(0), RiskTier::Low);
        assert_eq!(RiskTier::from_score(100), RiskTier::Critical);
    }

    #[test]
    fn test_tier_names() {
        assert_eq!(RiskTier::Critical.name(), "critical");
        assert_eq!(RiskTier::High.name(), "high");
        assert_eq!(RiskTier::Moderate.name(), "moderate");
        assert_eq!(RiskTier::Low.name(), "low");
    }

    #[test]
    fn test_composite_score_weighted_sum() {
        // 0.40*80 + 0.35*50 + 0.25*70 = 32 + 17.5 + 17.5 = 67
        let score = composite_score(&[(80.0, 0.40), (50.0, 0.35), (70.0, 0.25)]);
        assert_eq!(score, 67);
    }

    #[test]
    fn test_composite_score_clamps_high() {
        let score = composite_score(&[(500.0, 1.0)]);
        assert_eq!(score, 100);
    }

    #[test]
    fn test_composite_score_clamps_negative() {
        let score = composite_score(&[(-40.0, 1.0)]);
        assert_eq!(score, 0);
    }

    #[test]
    fn test_composite_score_rounds() {
        // 72.25 rounds to 72, 72.5 rounds to 73
        assert_eq!(composite_score(&[(72.25, 1.0)]), 72);
        assert_eq!(composite_score(&[(72.5, 1.0)]), 73);
    }

    #[test]
    fn test_tier_serde_roundtrip() {
        let json = serde_json::to_string(&RiskTier::High).expect("serialize");
        let back: RiskTier = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, RiskTier::High);
    }
}
