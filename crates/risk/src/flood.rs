//! Flood forecasting from gauge-height history.
//!
//! A forecast extrapolates the last day of hourly water-level readings:
//! the trend is the gap between the latest reading and the 24-hour mean,
//! projected twelve hours forward. The flood threshold is pinned at 150%
//! of the current level, and the time-to-peak estimate is derived from
//! how fast the trend closes that gap.

use bevy::prelude::*;
use bitcode::{Decode, Encode};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::rng::RiskRng;
use crate::round2;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Readings considered when computing the recent mean.
const TREND_WINDOW_HOURS: usize = 24;

/// Hours the hourly trend is projected forward.
const PROJECTION_HOURS: f64 = 12.0;

/// Flood threshold as a multiple of the current level.
const THRESHOLD_FACTOR: f64 = 1.5;

/// Trends flatter than this are treated as stable.
const FLAT_TREND_EPSILON: f64 = 0.01;

/// Time-to-peak reported for a flat trend, and its clamp bounds otherwise.
const DEFAULT_TIME_TO_PEAK_HOURS: u32 = 48;
const MIN_TIME_TO_PEAK_HOURS: i64 = 12;
const MAX_TIME_TO_PEAK_HOURS: i64 = 120;

/// Model confidence reported for trend-based forecasts.
const TREND_FORECAST_CONFIDENCE: f64 = 85.0;

// ---------------------------------------------------------------------------
// Forecast
// ---------------------------------------------------------------------------

/// How the projected peak compares to the flood threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
pub enum FloodOutlook {
    Low,
    Moderate,
    High,
}

impl FloodOutlook {
    /// High when the peak exceeds the threshold, Moderate within 85% of it.
    pub fn from_levels(predicted_m: f64, threshold_m: f64) -> Self {
        if predicted_m > threshold_m {
            FloodOutlook::High
        } else if predicted_m > threshold_m * 0.85 {
            FloodOutlook::Moderate
        } else {
            FloodOutlook::Low
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            FloodOutlook::Low => "Low Risk",
            FloodOutlook::Moderate => "Moderate Risk",
            FloodOutlook::High => "High Risk",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Encode, Decode)]
pub struct FloodForecast {
    pub location: String,
    pub current_level_m: f64,
    pub predicted_level_m: f64,
    pub threshold_m: f64,
    pub time_to_peak_hours: u32,
    pub confidence_pct: f64,
    pub outlook: FloodOutlook,
}

/// Forecast from hourly gauge readings, oldest first. The latest reading is
/// the current level. Returns `None` when there are no readings.
pub fn forecast_from_readings(location: &str, readings_m: &[f64]) -> Option<FloodForecast> {
    let current = *readings_m.last()?;

    let window_start = readings_m.len().saturating_sub(TREND_WINDOW_HOURS);
    let window = &readings_m[window_start..];
    let mean = window.iter().sum::<f64>() / window.len() as f64;
    let trend = current - mean;

    let predicted = current + trend * PROJECTION_HOURS;
    let threshold = current * THRESHOLD_FACTOR;

    let time_to_peak = if trend.abs() > FLAT_TREND_EPSILON {
        let hours = ((predicted - threshold) / trend * 2.0).floor().abs() as i64;
        hours.clamp(MIN_TIME_TO_PEAK_HOURS, MAX_TIME_TO_PEAK_HOURS) as u32
    } else {
        DEFAULT_TIME_TO_PEAK_HOURS
    };

    let predicted = round2(predicted);
    let threshold = round2(threshold);

    Some(FloodForecast {
        location: location.to_string(),
        current_level_m: round2(current),
        predicted_level_m: predicted,
        threshold_m: threshold,
        time_to_peak_hours: time_to_peak,
        confidence_pct: TREND_FORECAST_CONFIDENCE,
        outlook: FloodOutlook::from_levels(predicted, threshold),
    })
}

/// Synthetic forecast for a coordinate with no gauge history.
pub fn demo_forecast(lat: f64, lon: f64, rng: &mut impl Rng) -> FloodForecast {
    let current = rng.gen::<f64>() * 5.0 + 2.0;
    let predicted = rng.gen::<f64>() * 8.0 + 5.0;
    let threshold = 7.5;

    FloodForecast {
        location: format!("Location ({lat:.2}, {lon:.2})"),
        current_level_m: round2(current),
        predicted_level_m: round2(predicted),
        threshold_m: threshold,
        time_to_peak_hours: (rng.gen::<f64>() * 72.0).floor() as u32 + 12,
        confidence_pct: rng.gen::<f64>() * 20.0 + 75.0,
        outlook: FloodOutlook::from_levels(predicted, threshold),
    }
}

// ---------------------------------------------------------------------------
// ECS wiring
// ---------------------------------------------------------------------------

/// Request a forecast. With an empty reading history a synthetic forecast for
/// the coordinate is produced instead.
#[derive(Event, Debug, Clone)]
pub struct ForecastFlood {
    pub location: String,
    pub lat: f64,
    pub lon: f64,
    pub readings_m: Vec<f64>,
}

#[derive(Event, Debug, Clone)]
pub struct FloodForecasted(pub FloodForecast);

pub fn run_flood_forecasts(
    mut requests: EventReader<ForecastFlood>,
    mut rng: ResMut<RiskRng>,
    mut completed: EventWriter<FloodForecasted>,
) {
    for request in requests.read() {
        let forecast = match forecast_from_readings(&request.location, &request.readings_m) {
            Some(forecast) => forecast,
            None => demo_forecast(request.lat, request.lon, &mut rng.0),
        };
        info!(
            "flood forecast: '{}' peak {:.2}m in {}h ({})",
            forecast.location,
            forecast.predicted_level_m,
            forecast.time_to_peak_hours,
            forecast.outlook.name()
        );
        completed.send(FloodForecasted(forecast));
    }
}

pub struct FloodForecastPlugin;

impl Plugin for FloodForecastPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<ForecastFlood>()
            .add_event::<FloodForecasted>()
            .add_systems(Update, run_flood_forecasts);
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
