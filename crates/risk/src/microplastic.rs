//! Microplastic pollution risk scoring.
//!
//! | Factor               | Weight | Mapping                                     |
//! |----------------------|--------|---------------------------------------------|
//! | Population density   | 0.35   | <500/1000/2000/5000 -> 20/35/50/70/90       |
//! | Industrial proximity | 0.40   | >50/20/10/5/2 km -> 10/25/40/60/80/95       |
//! | Waste infrastructure | 0.25   | 100 - score                                 |
//!
//! The predicted concentration is seeded by the composite score plus an
//! independent random draw, so it is not reproducible between calls. That
//! nondeterminism is documented behavior, not a defect.

use bevy::prelude::*;
use bitcode::{Decode, Encode};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::rng::RiskRng;
use crate::round1;
use crate::tier::{composite_score, RiskTier};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Factor weights (sum to 1.0).
const POPULATION_WEIGHT: f64 = 0.35;
const INDUSTRIAL_WEIGHT: f64 = 0.40;
const INFRASTRUCTURE_WEIGHT: f64 = 0.25;

/// Concentration at score 100 before jitter, in particles per liter.
const BASE_CONCENTRATION: f64 = 50.0;

/// Concentration jitter: up to +30%.
const CONCENTRATION_JITTER: f64 = 0.3;

/// Recommendation lists are truncated to this many entries (suffix drop).
const MAX_RECOMMENDATIONS: usize = 6;

/// Default assessment coordinate when the caller supplies none (New York).
const DEFAULT_LAT: f64 = 40.7128;
const DEFAULT_LON: f64 = -74.0060;

/// Universal best-practice tail, always appended after conditional rules.
const UNIVERSAL_RECOMMENDATIONS: [&str; 3] = [
    "Install storm water filtration systems to capture microplastics",
    "Participate in regular water body cleanup events",
    "Use natural fiber clothing to reduce microfiber pollution",
];

// ---------------------------------------------------------------------------
// Input / output types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollutionAssessmentInput {
    pub location_name: String,
    pub population_density: f64,
    pub industrial_proximity_km: f64,
    pub waste_infrastructure_score: f64,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Encode, Decode)]
pub struct PollutionFactors {
    pub population: f64,
    pub industrial: f64,
    pub infrastructure: f64,
}

/// Completed pollution risk assessment. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Encode, Decode)]
pub struct PollutionAssessment {
    pub location_name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub risk_score: u8,
    pub tier: RiskTier,
    pub predicted_concentration: f64,
    pub recommendations: Vec<String>,
    pub factors: PollutionFactors,
}

// ---------------------------------------------------------------------------
// Factor mapping
// ---------------------------------------------------------------------------

pub fn population_factor(density: f64) -> f64 {
    if density < 500.0 {
        20.0
    } else if density < 1000.0 {
        35.0
    } else if density < 2000.0 {
        50.0
    } else if density < 5000.0 {
        70.0
    } else {
        90.0
    }
}

/// Inverse distance: closer industry, higher factor. Strict `>` comparisons,
/// so a site exactly 50 km out falls into the 25 band.
pub fn industrial_factor(proximity_km: f64) -> f64 {
    if proximity_km > 50.0 {
        10.0
    } else if proximity_km > 20.0 {
        25.0
    } else if proximity_km > 10.0 {
        40.0
    } else if proximity_km > 5.0 {
        60.0
    } else if proximity_km > 2.0 {
        80.0
    } else {
        95.0
    }
}

/// Better waste infrastructure, lower risk.
pub fn infrastructure_factor(score: f64) -> f64 {
    100.0 - score
}

fn factors(input: &PollutionAssessmentInput) -> PollutionFactors {
    PollutionFactors {
        population: population_factor(input.population_density),
        industrial: industrial_factor(input.industrial_proximity_km),
        infrastructure: infrastructure_factor(input.waste_infrastructure_score),
    }
}

/// Weighted composite risk score in [0, 100].
pub fn risk_score(input: &PollutionAssessmentInput) -> u8 {
    let f = factors(input);
    composite_score(&[
        (f.population, POPULATION_WEIGHT),
        (f.industrial, INDUSTRIAL_WEIGHT),
        (f.infrastructure, INFRASTRUCTURE_WEIGHT),
    ])
}

/// Predicted microplastic concentration in particles per liter, one decimal
/// place. Scales with the risk score and carries up to +30% random jitter.
pub fn predict_concentration(score: u8, rng: &mut impl Rng) -> f64 {
    let risk_multiplier = f64::from(score) / 100.0;
    round1(BASE_CONCENTRATION * risk_multiplier * (1.0 + rng.gen::<f64>() * CONCENTRATION_JITTER))
}

// ---------------------------------------------------------------------------
// Recommendations
// ---------------------------------------------------------------------------

/// Build the recommendation list: conditional rules evaluated top to bottom,
/// then the universal tail, then truncation to six entries. Truncation drops
/// the suffix, never reorders by priority.
pub fn recommendations(tier: RiskTier, input: &PollutionAssessmentInput) -> Vec<String> {
    let mut recs: Vec<String> = Vec::new();

    if tier == RiskTier::Critical || tier == RiskTier::High {
        recs.push("Avoid using this water source for drinking without advanced filtration".into());
        recs.push("Install certified microplastic filters on water intake points".into());
        recs.push("Organize community water testing programs".into());
    }

    if input.waste_infrastructure_score < 50.0 {
        recs.push("Advocate for improved waste management infrastructure".into());
        recs.push("Support local recycling programs to reduce plastic waste".into());
    }

    if input.industrial_proximity_km < 10.0 {
        recs.push("Monitor industrial discharge compliance".into());
        recs.push("Request environmental impact assessments from nearby facilities".into());
    }

    if input.population_density > 2000.0 {
        recs.push("Promote plastic-free initiatives in the community".into());
        recs.push("Support legislation for single-use plastic bans".into());
    }

    for entry in UNIVERSAL_RECOMMENDATIONS {
        recs.push(entry.into());
    }

    recs.truncate(MAX_RECOMMENDATIONS);
    recs
}

// ---------------------------------------------------------------------------
// Assessment
// ---------------------------------------------------------------------------

/// Run a full pollution risk assessment. Persistence is the caller's concern.
pub fn assess(input: &PollutionAssessmentInput, rng: &mut impl Rng) -> PollutionAssessment {
    let score = risk_score(input);
    let tier = RiskTier::from_score(score);

    PollutionAssessment {
        location_name: input.location_name.clone(),
        latitude: input.latitude.unwrap_or(DEFAULT_LAT),
        longitude: input.longitude.unwrap_or(DEFAULT_LON),
        risk_score: score,
        tier,
        predicted_concentration: predict_concentration(score, rng),
        recommendations: recommendations(tier, input),
        factors: factors(input),
    }
}

// ---------------------------------------------------------------------------
// ECS wiring
// ---------------------------------------------------------------------------

#[derive(Event, Debug, Clone)]
pub struct AssessPollution(pub PollutionAssessmentInput);

#[derive(Event, Debug, Clone)]
pub struct PollutionAssessed(pub PollutionAssessment);

pub fn run_pollution_assessments(
    mut requests: EventReader<AssessPollution>,
    mut rng: ResMut<RiskRng>,
    mut completed: EventWriter<PollutionAssessed>,
) {
    for AssessPollution(input) in requests.read() {
        let assessment = assess(input, &mut rng.0);
        info!(
            "microplastic: '{}' scored {} ({}), predicted {} particles/L",
            assessment.location_name,
            assessment.risk_score,
            assessment.tier.name(),
            assessment.predicted_concentration
        );
        completed.send(PollutionAssessed(assessment));
    }
}

pub struct MicroplasticPlugin;

impl Plugin for MicroplasticPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<AssessPollution>()
            .add_event::<PollutionAssessed>()
            .add_systems(Update, run_pollution_assessments);
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
