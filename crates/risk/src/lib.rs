use bevy::prelude::*;

pub mod alerts;
pub mod analytics;
pub mod eco_route;
pub mod flood;
pub mod geo;
pub mod heat_island;
pub mod heatmap;
pub mod microplastic;
pub mod rng;
pub mod tier;
pub mod wildfire;

// ---------------------------------------------------------------------------
// Shared rounding helpers
// ---------------------------------------------------------------------------

/// Round to one decimal place (derived metrics are reported at 0.1 precision).
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Round to two decimal places (emissions and costs are reported in hundredths).
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

// ---------------------------------------------------------------------------
// Plugin
// ---------------------------------------------------------------------------

/// Aggregate plugin registering every risk engine.
///
/// Each engine is its own feature plugin (resources + events + systems); this
/// just wires them together so the app crate adds one plugin.
pub struct RiskPlugin;

impl Plugin for RiskPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins((
            rng::RiskRngPlugin,
            heatmap::HeatmapPlugin,
            heat_island::HeatIslandPlugin,
            microplastic::MicroplasticPlugin,
            wildfire::WildfirePlugin,
            eco_route::EcoRoutePlugin,
            flood::FloodForecastPlugin,
            alerts::AlertsPlugin,
            analytics::AnalyticsPlugin,
        ));
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round1() {
        assert_eq!(round1(2.449), 2.4);
        assert_eq!(round1(2.45), 2.5);
        assert_eq!(round1(0.0), 0.0);
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(1.234), 1.23);
        assert_eq!(round2(1.236), 1.24);
    }
}
