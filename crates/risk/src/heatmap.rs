//! Heatmap synthesis engine.
//!
//! Each risk layer has a hand-curated table of hotspot centers (city, radius,
//! base intensity). `points_for_layer` scatters `floor(radius * 40)` weighted
//! points per center to approximate a spatial intensity field: brightest at
//! the core, fading linearly toward the radius edge, with +-30% jitter so
//! repeated calls are not visually identical.
//!
//! The polar offset is applied directly in degrees of lat/lon with no geodesic
//! correction. At city scale the distortion is negligible and downstream
//! density renderers don't care; this is a deliberate approximation.

use bevy::prelude::*;
use bitcode::{Decode, Encode};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::rng::RiskRng;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Points generated per unit of center radius.
const POINTS_PER_RADIUS: f64 = 40.0;

/// Point intensity bounds after jitter.
const INTENSITY_MIN: f64 = 0.1;
const INTENSITY_MAX: f64 = 1.0;

/// Jitter keeps between 70% and 100% of the distance-faded intensity.
const JITTER_BASE: f64 = 0.7;
const JITTER_SPAN: f64 = 0.3;

// ---------------------------------------------------------------------------
// Layers
// ---------------------------------------------------------------------------

/// The fixed set of renderable risk layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
pub enum HeatmapLayer {
    Flood,
    Wildfire,
    Pollution,
    Heat,
    Eco,
}

impl HeatmapLayer {
    /// Parse a layer key. Unknown keys yield `None`; callers treat that as an
    /// empty layer, never an error.
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "flood" => Some(HeatmapLayer::Flood),
            "wildfire" => Some(HeatmapLayer::Wildfire),
            "pollution" => Some(HeatmapLayer::Pollution),
            "heat" => Some(HeatmapLayer::Heat),
            "eco" => Some(HeatmapLayer::Eco),
            _ => None,
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            HeatmapLayer::Flood => "flood",
            HeatmapLayer::Wildfire => "wildfire",
            HeatmapLayer::Pollution => "pollution",
            HeatmapLayer::Heat => "heat",
            HeatmapLayer::Eco => "eco",
        }
    }

    pub const ALL: [HeatmapLayer; 5] = [
        HeatmapLayer::Flood,
        HeatmapLayer::Wildfire,
        HeatmapLayer::Pollution,
        HeatmapLayer::Heat,
        HeatmapLayer::Eco,
    ];
}

// ---------------------------------------------------------------------------
// Hotspot centers
// ---------------------------------------------------------------------------

/// A hand-authored hotspot seeding a cluster of synthetic points.
/// Immutable at runtime; radius is in degrees-as-km at city scale.
#[derive(Debug, Clone, Copy)]
pub struct HotspotCenter {
    pub lat: f64,
    pub lon: f64,
    pub radius: f64,
    pub intensity: f64,
    pub name: &'static str,
}

const fn center(lat: f64, lon: f64, radius: f64, intensity: f64, name: &'static str) -> HotspotCenter {
    HotspotCenter {
        lat,
        lon,
        radius,
        intensity,
        name,
    }
}

/// Flood-prone metro areas.
const FLOOD_CENTERS: &[HotspotCenter] = &[
    center(29.7604, -95.3698, 1.5, 0.9, "Houston"),
    center(30.0, -90.0, 2.0, 0.85, "New Orleans"),
    center(25.7617, -80.1918, 1.2, 0.8, "Miami"),
    center(38.9072, -77.0369, 0.8, 0.7, "DC"),
    center(41.8781, -87.6298, 1.0, 0.75, "Chicago"),
    center(33.7490, -84.3880, 0.9, 0.7, "Atlanta"),
    center(47.6062, -122.3321, 0.7, 0.65, "Seattle"),
    center(45.5152, -122.6784, 0.8, 0.7, "Portland"),
    center(30.2672, -97.7431, 0.9, 0.75, "Austin"),
    center(32.7767, -96.7970, 1.0, 0.8, "Dallas"),
];

/// Wildfire-prone regions (western US).
const WILDFIRE_CENTERS: &[HotspotCenter] = &[
    center(34.0522, -118.2437, 2.0, 0.95, "Los Angeles"),
    center(37.7749, -122.4194, 1.5, 0.85, "San Francisco"),
    center(32.7157, -117.1611, 1.2, 0.8, "San Diego"),
    center(45.5152, -122.6784, 1.8, 0.9, "Portland"),
    center(47.6062, -122.3321, 1.5, 0.85, "Seattle"),
    center(39.7392, -104.9903, 1.3, 0.75, "Denver"),
    center(33.4484, -112.0740, 1.5, 0.9, "Phoenix"),
    center(36.1699, -115.1398, 1.0, 0.8, "Las Vegas"),
    center(40.7608, -111.8910, 1.0, 0.75, "Salt Lake City"),
    center(35.6870, -105.9378, 1.2, 0.8, "Santa Fe"),
];

/// Urban air-pollution hotspots.
const POLLUTION_CENTERS: &[HotspotCenter] = &[
    center(40.7128, -74.0060, 1.5, 0.9, "New York"),
    center(34.0522, -118.2437, 2.0, 0.95, "Los Angeles"),
    center(41.8781, -87.6298, 1.3, 0.85, "Chicago"),
    center(29.7604, -95.3698, 1.4, 0.9, "Houston"),
    center(39.9526, -75.1652, 1.0, 0.8, "Philadelphia"),
    center(33.4484, -112.0740, 1.2, 0.8, "Phoenix"),
    center(32.7767, -96.7970, 1.1, 0.75, "Dallas"),
    center(42.3601, -71.0589, 0.9, 0.75, "Boston"),
    center(37.7749, -122.4194, 1.0, 0.7, "San Francisco"),
    center(38.9072, -77.0369, 0.8, 0.7, "DC"),
    center(30.2672, -97.7431, 0.9, 0.65, "Austin"),
];

/// Urban heat islands.
const HEAT_CENTERS: &[HotspotCenter] = &[
    center(33.4484, -112.0740, 2.0, 1.0, "Phoenix"),
    center(36.1699, -115.1398, 1.5, 0.95, "Las Vegas"),
    center(29.4241, -98.4936, 1.3, 0.9, "San Antonio"),
    center(29.7604, -95.3698, 1.5, 0.9, "Houston"),
    center(32.7767, -96.7970, 1.4, 0.85, "Dallas"),
    center(33.7490, -84.3880, 1.3, 0.85, "Atlanta"),
    center(34.0522, -118.2437, 1.8, 0.85, "Los Angeles"),
    center(25.7617, -80.1918, 1.2, 0.9, "Miami"),
    center(30.2672, -97.7431, 1.1, 0.8, "Austin"),
    center(40.7128, -74.0060, 1.2, 0.8, "New York"),
    center(38.9072, -77.0369, 1.0, 0.75, "DC"),
];

/// Traffic-congestion emission hotspots.
const ECO_CENTERS: &[HotspotCenter] = &[
    center(34.0522, -118.2437, 1.8, 0.95, "Los Angeles"),
    center(40.7128, -74.0060, 1.5, 0.9, "New York"),
    center(41.8781, -87.6298, 1.3, 0.85, "Chicago"),
    center(29.7604, -95.3698, 1.4, 0.8, "Houston"),
    center(37.7749, -122.4194, 1.2, 0.85, "San Francisco"),
    center(38.9072, -77.0369, 1.1, 0.8, "DC"),
    center(33.4484, -112.0740, 1.3, 0.75, "Phoenix"),
    center(42.3601, -71.0589, 1.0, 0.8, "Boston"),
    center(47.6062, -122.3321, 1.0, 0.75, "Seattle"),
    center(33.7490, -84.3880, 1.2, 0.8, "Atlanta"),
    center(32.7767, -96.7970, 1.1, 0.75, "Dallas"),
];

/// Hotspot table for a layer.
pub fn centers_for_layer(layer: HeatmapLayer) -> &'static [HotspotCenter] {
    match layer {
        HeatmapLayer::Flood => FLOOD_CENTERS,
        HeatmapLayer::Wildfire => WILDFIRE_CENTERS,
        HeatmapLayer::Pollution => POLLUTION_CENTERS,
        HeatmapLayer::Heat => HEAT_CENTERS,
        HeatmapLayer::Eco => ECO_CENTERS,
    }
}

// ---------------------------------------------------------------------------
// Point synthesis
// ---------------------------------------------------------------------------

/// A single synthetic heatmap sample. Ephemeral: regenerated on demand,
/// never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Encode, Decode)]
pub struct HeatmapPoint {
    pub lat: f64,
    pub lon: f64,
    pub intensity: f64,
}

/// Generate the synthetic point cloud for one layer.
///
/// Stochastic and non-restartable: every call draws a fresh field from `rng`.
/// There is no caching or persistence; tests must assert statistical
/// properties (counts, bounds, containment) rather than exact values.
pub fn points_for_layer(layer: HeatmapLayer, rng: &mut impl Rng) -> Vec<HeatmapPoint> {
    scatter_centers(centers_for_layer(layer), rng)
}

fn scatter_centers(centers: &[HotspotCenter], rng: &mut impl Rng) -> Vec<HeatmapPoint> {
    let mut points = Vec::new();

    for c in centers {
        let num_points = (c.radius * POINTS_PER_RADIUS).floor() as usize;

        for _ in 0..num_points {
            let angle = rng.gen::<f64>() * std::f64::consts::TAU;
            let distance = rng.gen::<f64>() * c.radius;

            let fade = 1.0 - distance / c.radius;
            let jitter = JITTER_BASE + rng.gen::<f64>() * JITTER_SPAN;
            let intensity = (c.intensity * fade * jitter).clamp(INTENSITY_MIN, INTENSITY_MAX);

            points.push(HeatmapPoint {
                lat: c.lat + distance * angle.cos(),
                lon: c.lon + distance * angle.sin(),
                intensity,
            });
        }
    }

    points
}

/// Total number of points a layer produces (fixed per layer).
pub fn expected_point_count(layer: HeatmapLayer) -> usize {
    centers_for_layer(layer)
        .iter()
        .map(|c| (c.radius * POINTS_PER_RADIUS).floor() as usize)
        .sum()
}

// ---------------------------------------------------------------------------
// Layer metadata
// ---------------------------------------------------------------------------

/// Display metadata consumed by map legends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayerInfo {
    pub name: &'static str,
    pub color: &'static str,
    pub description: &'static str,
}

pub fn layer_info(layer: HeatmapLayer) -> LayerInfo {
    match layer {
        HeatmapLayer::Flood => LayerInfo {
            name: "Flood Risk",
            color: "#3b82f6",
            description: "Areas with high flood vulnerability based on terrain, proximity to water bodies, and historical flood events",
        },
        HeatmapLayer::Wildfire => LayerInfo {
            name: "Wildfire Risk",
            color: "#f97316",
            description: "Regions with elevated wildfire danger due to vegetation, climate conditions, and recent fire activity",
        },
        HeatmapLayer::Pollution => LayerInfo {
            name: "Air Quality",
            color: "#8b5cf6",
            description: "Urban areas with poor air quality from industrial emissions, traffic, and population density",
        },
        HeatmapLayer::Heat => LayerInfo {
            name: "Heat Islands",
            color: "#ef4444",
            description: "Urban heat islands where temperatures are significantly higher due to concrete, lack of vegetation, and human activity",
        },
        HeatmapLayer::Eco => LayerInfo {
            name: "Traffic Emissions",
            color: "#10b981",
            description: "High-traffic areas with elevated carbon emissions from vehicle congestion",
        },
    }
}

// ---------------------------------------------------------------------------
// ECS wiring
// ---------------------------------------------------------------------------

/// Request to (re)generate the overlay for a layer key. Unknown keys clear
/// the overlay to an empty point set.
#[derive(Event, Debug, Clone)]
pub struct HeatmapRequest {
    pub layer_key: String,
}

/// The most recently generated point cloud, consumed by map renderers.
#[derive(Resource, Default)]
pub struct HeatmapOverlay {
    pub layer: Option<HeatmapLayer>,
    pub points: Vec<HeatmapPoint>,
}

/// Regenerates the overlay for each incoming request.
pub fn handle_heatmap_requests(
    mut requests: EventReader<HeatmapRequest>,
    mut rng: ResMut<RiskRng>,
    mut overlay: ResMut<HeatmapOverlay>,
) {
    for request in requests.read() {
        match HeatmapLayer::from_key(&request.layer_key) {
            Some(layer) => {
                overlay.layer = Some(layer);
                overlay.points = points_for_layer(layer, &mut rng.0);
                debug!(
                    "heatmap: generated {} points for layer '{}'",
                    overlay.points.len(),
                    layer.key()
                );
            }
            None => {
                warn!("heatmap: unknown layer key '{}'", request.layer_key);
                overlay.layer = None;
                overlay.points.clear();
            }
        }
    }
}

pub struct HeatmapPlugin;

impl Plugin for HeatmapPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<HeatmapOverlay>()
            .add_event::<HeatmapRequest>()
            .add_systems(Update, handle_heatmap_requests);
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::RiskRng;

    #[test]
    fn test_point_count_matches_center_radii() {
        let mut rng = RiskRng::from_seed_u64(1);
        for layer in HeatmapLayer::ALL {
            let points = points_for_layer(layer, &mut rng.0);
            assert_eq!(points.len(), expected_point_count(layer));
        }
    }

    #[test]
    fn test_intensity_bounds() {
        let mut rng = RiskRng::from_seed_u64(2);
        for layer in HeatmapLayer::ALL {
            for p in points_for_layer(layer, &mut rng.0) {
                assert!(
                    (INTENSITY_MIN..=INTENSITY_MAX).contains(&p.intensity),
                    "intensity {} out of bounds",
                    p.intensity
                );
            }
        }
    }

    #[test]
    fn test_points_contained_within_some_center_radius() {
        // The polar offset is applied in degree space, so containment is
        // checked in degree space too.
        let mut rng = RiskRng::from_seed_u64(3);
        for layer in HeatmapLayer::ALL {
            let centers = centers_for_layer(layer);
            for p in points_for_layer(layer, &mut rng.0) {
                let contained = centers.iter().any(|c| {
                    let d = ((p.lat - c.lat).powi(2) + (p.lon - c.lon).powi(2)).sqrt();
                    d <= c.radius + 1e-9
                });
                assert!(contained, "point ({}, {}) outside all centers", p.lat, p.lon);
            }
        }
    }

    #[test]
    fn test_repeated_calls_differ() {
        let mut rng = RiskRng::from_seed_u64(4);
        let first = points_for_layer(HeatmapLayer::Flood, &mut rng.0);
        let second = points_for_layer(HeatmapLayer::Flood, &mut rng.0);
        assert_eq!(first.len(), second.len());
        assert_ne!(first, second, "two runs should produce different fields");
    }

    #[test]
    fn test_unknown_layer_key_is_none() {
        assert_eq!(HeatmapLayer::from_key("volcano"), None);
        assert_eq!(HeatmapLayer::from_key(""), None);
        assert_eq!(HeatmapLayer::from_key("Flood"), None); // keys are lowercase
    }

    #[test]
    fn test_layer_key_roundtrip() {
        for layer in HeatmapLayer::ALL {
            assert_eq!(HeatmapLayer::from_key(layer.key()), Some(layer));
        }
    }

    #[test]
    fn test_every_layer_has_centers() {
        for layer in HeatmapLayer::ALL {
            assert!(!centers_for_layer(layer).is_empty());
        }
    }

    #[test]
    fn test_center_tables_are_sane() {
        for layer in HeatmapLayer::ALL {
            for c in centers_for_layer(layer) {
                assert!(c.radius > 0.0, "{}: radius must be positive", c.name);
                assert!(
                    (0.0..=1.0).contains(&c.intensity),
                    "{}: base intensity out of range",
                    c.name
                );
            }
        }
    }

    #[test]
    fn test_layer_info_names() {
        assert_eq!(layer_info(HeatmapLayer::Flood).name, "Flood Risk");
        assert_eq!(layer_info(HeatmapLayer::Eco).color, "#10b981");
    }

    #[test]
    fn test_request_system_fills_overlay() {
        let mut app = App::new();
        app.insert_resource(RiskRng::from_seed_u64(9))
            .init_resource::<HeatmapOverlay>()
            .add_event::<HeatmapRequest>()
            .add_systems(Update, handle_heatmap_requests);

        app.world_mut().send_event(HeatmapRequest {
            layer_key: "wildfire".into(),
        });
        app.update();

        let overlay = app.world().resource::<HeatmapOverlay>();
        assert_eq!(overlay.layer, Some(HeatmapLayer::Wildfire));
        assert_eq!(
            overlay.points.len(),
            expected_point_count(HeatmapLayer::Wildfire)
        );
    }

    #[test]
    fn test_request_system_clears_on_unknown_key() {
        let mut app = App::new();
        app.insert_resource(RiskRng::from_seed_u64(10))
            .init_resource::<HeatmapOverlay>()
            .add_event::<HeatmapRequest>()
            .add_systems(Update, handle_heatmap_requests);

        app.world_mut().send_event(HeatmapRequest {
            layer_key: "flood".into(),
        });
        app.update();
        app.world_mut().send_event(HeatmapRequest {
            layer_key: "nonsense".into(),
        });
        app.update();

        let overlay = app.world().resource::<HeatmapOverlay>();
        assert_eq!(overlay.layer, None);
        assert!(overlay.points.is_empty());
    }
}
