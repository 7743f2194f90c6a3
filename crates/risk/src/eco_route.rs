//! Eco-route emissions comparison.
//!
//! Compares a fastest route against a slightly longer, flatter "greenest"
//! route for the same trip and reports the CO2 and fuel-cost difference.
//! Route geometry is simulated: distance comes from the haversine between
//! geocoded endpoints, elevation gain is a random draw per route profile.
//!
//! | Vehicle      | kg CO2 / km | Fuel $ / km |
//! |--------------|-------------|-------------|
//! | car_gas      | 0.192       | 0.11        |
//! | car_diesel   | 0.171       | 0.10        |
//! | car_electric | 0.053       | 0.04        |
//! | car_hybrid   | 0.095       | 0.085       |
//! | motorcycle   | 0.103       | 0.09        |
//! | truck        | 0.282       | 0.13        |

use bevy::prelude::*;
use bitcode::{Decode, Encode};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::geo::{geocode, haversine_km};
use crate::rng::RiskRng;
use crate::round2;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// The greenest route trades 3% extra distance for less climbing and traffic.
const GREENEST_DISTANCE_FACTOR: f64 = 1.03;

/// Traffic multipliers attached to the route profiles (reported, not applied
/// to emissions).
const FASTEST_TRAFFIC_FACTOR: f64 = 1.1;
const GREENEST_TRAFFIC_FACTOR: f64 = 0.9;

/// Each 1000 m of elevation gain adds 15% to emissions.
const ELEVATION_EMISSION_RATE: f64 = 0.15;

/// Average speed proxy: minutes = distance / 0.8.
const DISTANCE_PER_MINUTE_KM: f64 = 0.8;

// ---------------------------------------------------------------------------
// Vehicles
// ---------------------------------------------------------------------------

/// Vehicle classes with fixed emission and fuel-price factors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
pub enum VehicleType {
    CarGas,
    CarDiesel,
    CarElectric,
    CarHybrid,
    Motorcycle,
    Truck,
}

impl VehicleType {
    /// Parse a vehicle key. Unknown keys fall back to the gas car profile
    /// rather than erroring.
    pub fn from_key(key: &str) -> Self {
        match key {
            "car_diesel" => VehicleType::CarDiesel,
            "car_electric" => VehicleType::CarElectric,
            "car_hybrid" => VehicleType::CarHybrid,
            "motorcycle" => VehicleType::Motorcycle,
            "truck" => VehicleType::Truck,
            _ => VehicleType::CarGas,
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            VehicleType::CarGas => "car_gas",
            VehicleType::CarDiesel => "car_diesel",
            VehicleType::CarElectric => "car_electric",
            VehicleType::CarHybrid => "car_hybrid",
            VehicleType::Motorcycle => "motorcycle",
            VehicleType::Truck => "truck",
        }
    }

    /// kg CO2 emitted per kilometer.
    pub fn emission_factor(self) -> f64 {
        match self {
            VehicleType::CarGas => 0.192,
            VehicleType::CarDiesel => 0.171,
            VehicleType::CarElectric => 0.053,
            VehicleType::CarHybrid => 0.095,
            VehicleType::Motorcycle => 0.103,
            VehicleType::Truck => 0.282,
        }
    }

    /// Fuel (or charge) cost per kilometer in dollars.
    pub fn fuel_price(self) -> f64 {
        match self {
            VehicleType::CarGas => 0.11,
            VehicleType::CarDiesel => 0.10,
            VehicleType::CarElectric => 0.04,
            VehicleType::CarHybrid => 0.085,
            VehicleType::Motorcycle => 0.09,
            VehicleType::Truck => 0.13,
        }
    }
}

// ---------------------------------------------------------------------------
// Route simulation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteQuery {
    pub start_name: String,
    pub end_name: String,
    pub vehicle: VehicleType,
}

/// One simulated route profile.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Encode, Decode)]
pub struct RouteLeg {
    pub distance_km: f64,
    pub elevation_gain_m: f64,
    pub traffic_factor: f64,
}

fn simulate_fastest(base_distance_km: f64, rng: &mut impl Rng) -> RouteLeg {
    RouteLeg {
        distance_km: base_distance_km,
        elevation_gain_m: rng.gen::<f64>() * 200.0 + 100.0,
        traffic_factor: FASTEST_TRAFFIC_FACTOR,
    }
}

fn simulate_greenest(base_distance_km: f64, rng: &mut impl Rng) -> RouteLeg {
    RouteLeg {
        distance_km: base_distance_km * GREENEST_DISTANCE_FACTOR,
        elevation_gain_m: rng.gen::<f64>() * 50.0 + 20.0,
        traffic_factor: GREENEST_TRAFFIC_FACTOR,
    }
}

/// Route emissions in kg CO2, two decimal places. Climbing inflates the
/// per-km factor by 15% per 1000 m gained.
pub fn emissions_kg(distance_km: f64, vehicle: VehicleType, elevation_gain_m: f64) -> f64 {
    let elevation_multiplier = 1.0 + (elevation_gain_m / 1000.0) * ELEVATION_EMISSION_RATE;
    round2(distance_km * vehicle.emission_factor() * elevation_multiplier)
}

/// Full comparison delivered to consumers and persisted by the store bridge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Encode, Decode)]
pub struct RouteComparison {
    pub start_name: String,
    pub end_name: String,
    pub vehicle: VehicleType,
    pub distance_km: f64,
    pub duration_minutes: u32,
    pub fastest: RouteLeg,
    pub greenest: RouteLeg,
    pub fastest_emissions_kg: f64,
    pub greenest_emissions_kg: f64,
    pub emission_savings_kg: f64,
    pub fuel_cost_saved: f64,
}

/// Compare the fastest and greenest simulated routes for a trip.
pub fn compare_routes(query: &RouteQuery, rng: &mut impl Rng) -> RouteComparison {
    let start = geocode(&query.start_name);
    let end = geocode(&query.end_name);
    let distance = haversine_km(start, end);

    let fastest = simulate_fastest(distance, rng);
    let greenest = simulate_greenest(distance, rng);

    let fastest_emissions = emissions_kg(fastest.distance_km, query.vehicle, fastest.elevation_gain_m);
    let greenest_emissions =
        emissions_kg(greenest.distance_km, query.vehicle, greenest.elevation_gain_m);
    let savings = fastest_emissions - greenest_emissions;

    RouteComparison {
        start_name: query.start_name.clone(),
        end_name: query.end_name.clone(),
        vehicle: query.vehicle,
        distance_km: distance,
        duration_minutes: (fastest.distance_km / DISTANCE_PER_MINUTE_KM).round() as u32,
        fastest,
        greenest,
        fastest_emissions_kg: fastest_emissions,
        greenest_emissions_kg: greenest_emissions,
        emission_savings_kg: savings,
        fuel_cost_saved: savings * query.vehicle.fuel_price(),
    }
}

// ---------------------------------------------------------------------------
// ECS wiring
// ---------------------------------------------------------------------------

#[derive(Event, Debug, Clone)]
pub struct RouteRequest(pub RouteQuery);

#[derive(Event, Debug, Clone)]
pub struct RouteComputed(pub RouteComparison);

pub fn run_route_comparisons(
    mut requests: EventReader<RouteRequest>,
    mut rng: ResMut<RiskRng>,
    mut completed: EventWriter<RouteComputed>,
) {
    for RouteRequest(query) in requests.read() {
        let comparison = compare_routes(query, &mut rng.0);
        info!(
            "eco route: '{}' -> '{}' ({:.1} km), saving {:.2} kg CO2",
            comparison.start_name,
            comparison.end_name,
            comparison.distance_km,
            comparison.emission_savings_kg
        );
        completed.send(RouteComputed(comparison));
    }
}

pub struct EcoRoutePlugin;

impl Plugin for EcoRoutePlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<RouteRequest>()
            .add_event::<RouteComputed>()
            .add_systems(Update, run_route_comparisons);
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
