//! Wildfire weather index and hotspot monitoring.
//!
//! The fire weather index folds temperature, wind, and humidity into a single
//! 0-100 composite: `temp + wind*2 - humidity/2`, clamped. Classification
//! uses the shared risk tiers.
//!
//! Hotspot detections mirror satellite thermal-anomaly records. Without a
//! live feed the engine synthesizes a demo scan around four western-US seeds.

use bevy::prelude::*;
use bitcode::{Decode, Encode};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::rng::RiskRng;
use crate::tier::RiskTier;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Wind contributes double its speed to the index.
const WIND_INDEX_WEIGHT: f64 = 2.0;

/// Humidity subtracts half its percentage from the index.
const HUMIDITY_INDEX_DIVISOR: f64 = 2.0;

/// Detections above this confidence count as active fires.
pub const HIGH_CONFIDENCE: f64 = 70.0;

/// Demo scan seed locations.
const DEMO_SEEDS: &[(f64, f64, &str)] = &[
    (34.0522, -118.2437, "Los Angeles Area"),
    (37.7749, -122.4194, "San Francisco Bay"),
    (39.7392, -104.9903, "Denver Region"),
    (33.4484, -112.0740, "Phoenix Area"),
];

/// Demo detections scatter within +-0.05 degrees of their seed.
const DEMO_JITTER_DEG: f64 = 0.1;

// ---------------------------------------------------------------------------
// Fire weather index
// ---------------------------------------------------------------------------

/// Weather observation used for the index. Values are accepted as-is;
/// implausible inputs just saturate the clamp.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FireWeatherInput {
    pub temperature_celsius: f64,
    pub wind_speed_kmh: f64,
    pub humidity_percent: f64,
}

/// Composite fire weather index in [0, 100].
pub fn fire_weather_index(input: &FireWeatherInput) -> u8 {
    let raw = input.temperature_celsius + input.wind_speed_kmh * WIND_INDEX_WEIGHT
        - input.humidity_percent / HUMIDITY_INDEX_DIVISOR;
    raw.clamp(0.0, 100.0).round() as u8
}

/// Index plus tier, as delivered to consumers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Encode, Decode)]
pub struct FireWeatherReport {
    pub index: u8,
    pub tier: RiskTier,
}

pub fn fire_weather_report(input: &FireWeatherInput) -> FireWeatherReport {
    let index = fire_weather_index(input);
    FireWeatherReport {
        index,
        tier: RiskTier::from_score(index),
    }
}

// ---------------------------------------------------------------------------
// Hotspot detections
// ---------------------------------------------------------------------------

/// A satellite-style thermal anomaly detection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Encode, Decode)]
pub struct FireHotspot {
    pub latitude: f64,
    pub longitude: f64,
    /// Brightness temperature in Kelvin.
    pub brightness: f64,
    /// Detection confidence, 0-100.
    pub confidence: f64,
    pub region: String,
}

/// Synthesize one demo scan: one detection per seed, jittered position,
/// brightness 300-350 K, confidence 70-100.
pub fn demo_hotspots(rng: &mut impl Rng) -> Vec<FireHotspot> {
    DEMO_SEEDS
        .iter()
        .map(|&(lat, lon, region)| FireHotspot {
            latitude: lat + (rng.gen::<f64>() - 0.5) * DEMO_JITTER_DEG,
            longitude: lon + (rng.gen::<f64>() - 0.5) * DEMO_JITTER_DEG,
            brightness: rng.gen::<f64>() * 50.0 + 300.0,
            confidence: rng.gen::<f64>() * 30.0 + 70.0,
            region: region.to_string(),
        })
        .collect()
}

/// Aggregate view over a set of detections.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct HotspotSummary {
    /// Detections with confidence above [`HIGH_CONFIDENCE`].
    pub active_count: usize,
    pub mean_confidence: f64,
}

pub fn summarize_hotspots(hotspots: &[FireHotspot]) -> HotspotSummary {
    if hotspots.is_empty() {
        return HotspotSummary::default();
    }
    HotspotSummary {
        active_count: hotspots
            .iter()
            .filter(|h| h.confidence > HIGH_CONFIDENCE)
            .count(),
        mean_confidence: hotspots.iter().map(|h| h.confidence).sum::<f64>()
            / hotspots.len() as f64,
    }
}

// ---------------------------------------------------------------------------
// ECS wiring
// ---------------------------------------------------------------------------

/// Request a fire weather classification for an observation.
#[derive(Event, Debug, Clone)]
pub struct AssessFireWeather(pub FireWeatherInput);

#[derive(Event, Debug, Clone)]
pub struct FireWeatherAssessed(pub FireWeatherReport);

/// Request a fresh hotspot scan into the [`FireWatch`] resource.
#[derive(Event, Debug, Clone, Default)]
pub struct ScanHotspots;

/// Latest hotspot scan and its summary.
#[derive(Resource, Default)]
pub struct FireWatch {
    pub hotspots: Vec<FireHotspot>,
    pub summary: HotspotSummary,
}

pub fn run_fire_weather_assessments(
    mut requests: EventReader<AssessFireWeather>,
    mut completed: EventWriter<FireWeatherAssessed>,
) {
    for AssessFireWeather(input) in requests.read() {
        let report = fire_weather_report(input);
        info!(
            "wildfire: index {} ({}) for {:.1} C / {:.1} km/h wind / {:.0}% humidity",
            report.index,
            report.tier.name(),
            input.temperature_celsius,
            input.wind_speed_kmh,
            input.humidity_percent
        );
        completed.send(FireWeatherAssessed(report));
    }
}

pub fn run_hotspot_scans(
    mut requests: EventReader<ScanHotspots>,
    mut rng: ResMut<RiskRng>,
    mut watch: ResMut<FireWatch>,
) {
    // Coalesce multiple requests in one frame into a single scan.
    if requests.read().next().is_none() {
        return;
    }
    watch.hotspots = demo_hotspots(&mut rng.0);
    watch.summary = summarize_hotspots(&watch.hotspots);
    debug!(
        "wildfire: scan found {} detections, {} active",
        watch.hotspots.len(),
        watch.summary.active_count
    );
}

pub struct WildfirePlugin;

impl Plugin for WildfirePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<FireWatch>()
            .add_event::<AssessFireWeather>()
            .add_event::<FireWeatherAssessed>()
            .add_event::<ScanHotspots>()
            .add_systems(Update, (run_fire_weather_assessments, run_hotspot_scans));
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn obs(temp: f64, wind: f64, humidity: f64) -> FireWeatherInput {
        FireWeatherInput {
            temperature_celsius: temp,
            wind_speed_kmh: wind,
            humidity_percent: humidity,
        }
    }

    #[test]
    fn test_index_formula() {
        // 30 + 20*2 - 40/2 = 50
        assert_eq!(fire_weather_index(&obs(30.0, 20.0, 40.0)), 50);
        // 40 + 35*2 - 10/2 = 105 -> clamped
        assert_eq!(fire_weather_index(&obs(40.0, 35.0, 10.0)), 100);
        // 5 + 0 - 90/2 = -40 -> clamped
        assert_eq!(fire_weather_index(&obs(5.0, 0.0, 90.0)), 0);
    }

    #[test]
    fn test_index_is_integer_in_range_for_wild_inputs() {
        for input in [
            obs(1e9, 1e9, 0.0),
            obs(-1e9, 0.0, 1e9),
            obs(f64::MAX, 0.0, 0.0),
        ] {
            assert!(fire_weather_index(&input) <= 100);
        }
    }

    #[test]
    fn test_report_uses_shared_tiers() {
        assert_eq!(fire_weather_report(&obs(35.0, 25.0, 20.0)).tier, RiskTier::Critical); // 75
        assert_eq!(fire_weather_report(&obs(30.0, 20.0, 40.0)).tier, RiskTier::High); // 50
        assert_eq!(fire_weather_report(&obs(20.0, 10.0, 20.0)).tier, RiskTier::Moderate); // 30
        assert_eq!(fire_weather_report(&obs(10.0, 5.0, 60.0)).tier, RiskTier::Low); // 0
    }

    #[test]
    fn test_demo_hotspots_bounds() {
        let mut rng = RiskRng::from_seed_u64(31);
        let hotspots = demo_hotspots(&mut rng.0);
        assert_eq!(hotspots.len(), DEMO_SEEDS.len());
        for (h, &(lat, lon, _)) in hotspots.iter().zip(DEMO_SEEDS) {
            assert!((h.latitude - lat).abs() <= DEMO_JITTER_DEG / 2.0 + 1e-12);
            assert!((h.longitude - lon).abs() <= DEMO_JITTER_DEG / 2.0 + 1e-12);
            assert!((300.0..=350.0).contains(&h.brightness));
            assert!((70.0..=100.0).contains(&h.confidence));
        }
    }

    #[test]
    fn test_summary_counts_high_confidence() {
        let mk = |confidence| FireHotspot {
            latitude: 0.0,
            longitude: 0.0,
            brightness: 320.0,
            confidence,
            region: "x".into(),
        };
        let summary = summarize_hotspots(&[mk(60.0), mk(70.0), mk(71.0), mk(95.0)]);
        assert_eq!(summary.active_count, 2); // strictly above 70
        assert!((summary.mean_confidence - 74.0).abs() < 1e-9);
    }

    #[test]
    fn test_summary_empty() {
        let summary = summarize_hotspots(&[]);
        assert_eq!(summary.active_count, 0);
        assert_eq!(summary.mean_confidence, 0.0);
    }

    #[test]
    fn test_scan_system_fills_watch() {
        let mut app = App::new();
        app.insert_resource(RiskRng::from_seed_u64(32))
            .init_resource::<FireWatch>()
            .add_event::<ScanHotspots>()
            .add_systems(Update, run_hotspot_scans);

        app.world_mut().send_event(ScanHotspots);
        app.update();

        let watch = app.world().resource::<FireWatch>();
        assert_eq!(watch.hotspots.len(), DEMO_SEEDS.len());
        // Demo confidences are all >= 70, so actives are those drawn above it.
        assert!(watch.summary.mean_confidence >= 70.0);
    }
}
