use bevy::app::ScheduleRunnerPlugin;
use bevy::log::LogPlugin;
use bevy::prelude::*;

use risk::alerts::{AlertType, RaiseAlert, ReportType, SubmitReport};
use risk::analytics::{AnalyticsReady, GenerateAnalytics};
use risk::eco_route::{RouteQuery, RouteRequest, VehicleType};
use risk::flood::ForecastFlood;
use risk::geo::GeoPoint;
use risk::heat_island::{AssessHeatIsland, HeatAssessmentInput};
use risk::heatmap::HeatmapRequest;
use risk::microplastic::{AssessPollution, PollutionAssessmentInput};
use risk::tier::RiskTier;
use risk::wildfire::{AssessFireWeather, FireWeatherInput, ScanHotspots};
use store::SaveSnapshot;

mod settings;

fn main() {
    let mut app = App::new();

    app.add_plugins((
        MinimalPlugins.set(ScheduleRunnerPlugin::run_loop(std::time::Duration::from_millis(16))),
        LogPlugin::default(),
    ))
    .add_plugins((
        risk::RiskPlugin,
        store::StorePlugin,
        settings::SettingsPlugin,
    ));

    // Demo mode: drives one request through every engine, snapshots, exits.
    if std::env::var("TERRAWATCH_DEMO").is_ok() {
        app.insert_resource(DemoQueue::default());
        app.add_systems(Update, (drive_demo, report_analytics));
    }

    app.run();
}

#[derive(Resource, Default)]
struct DemoQueue {
    frame: u32,
    step: usize,
}

/// Frames between demo steps, giving each engine an update to respond in.
const DEMO_STEP_FRAMES: u32 = 4;

const DEMO_STEPS: usize = 9;

#[allow(clippy::too_many_arguments)]
fn drive_demo(
    mut queue: ResMut<DemoQueue>,
    mut heatmaps: EventWriter<HeatmapRequest>,
    mut heat: EventWriter<AssessHeatIsland>,
    mut pollution: EventWriter<AssessPollution>,
    mut routes: EventWriter<RouteRequest>,
    mut fire: EventWriter<AssessFireWeather>,
    mut scans: EventWriter<ScanHotspots>,
    mut floods: EventWriter<ForecastFlood>,
    mut reports: EventWriter<SubmitReport>,
    mut alerts: EventWriter<RaiseAlert>,
    mut analytics: EventWriter<GenerateAnalytics>,
    mut snapshots: EventWriter<SaveSnapshot>,
    mut exit: EventWriter<AppExit>,
) {
    queue.frame += 1;
    if queue.frame % DEMO_STEP_FRAMES != 0 {
        return;
    }

    match queue.step {
        0 => {
            heatmaps.send(HeatmapRequest {
                layer_key: "flood".to_string(),
            });
        }
        1 => {
            heat.send(AssessHeatIsland(HeatAssessmentInput {
                location_name: "Downtown Phoenix".into(),
                tree_cover_percent: 20.0,
                building_density: 500.0,
                surface_temp_celsius: 35.0,
                latitude: None,
                longitude: None,
            }));
        }
        2 => {
            pollution.send(AssessPollution(PollutionAssessmentInput {
                location_name: "Harbor District".into(),
                population_density: 2500.0,
                industrial_proximity_km: 5.0,
                waste_infrastructure_score: 40.0,
                latitude: None,
                longitude: None,
            }));
        }
        3 => {
            routes.send(RouteRequest(RouteQuery {
                start_name: "Mission District".into(),
                end_name: "Financial District".into(),
                vehicle: VehicleType::CarGas,
            }));
        }
        4 => {
            fire.send(AssessFireWeather(FireWeatherInput {
                temperature_celsius: 35.0,
                wind_speed_kmh: 50.0,
                humidity_percent: 10.0,
            }));
            scans.send(ScanHotspots);
        }
        5 => {
            floods.send(ForecastFlood {
                location: "Bay Gauge".into(),
                lat: 37.7749,
                lon: -122.4194,
                readings_m: Vec::new(),
            });
        }
        6 => {
            reports.send(SubmitReport {
                report_type: ReportType::Flooding,
                location: GeoPoint {
                    lat: 37.7749,
                    lon: -122.4194,
                },
                location_name: "Mission Creek".into(),
                title: "Standing water on 4th".into(),
                description: "Storm drain backed up overnight".into(),
                severity: RiskTier::Moderate,
            });
            alerts.send(RaiseAlert {
                alert_type: AlertType::Wildfire,
                severity: RiskTier::High,
                title: "Fire weather watch".into(),
                description: "Hot, dry, high winds through Friday".into(),
                location: GeoPoint {
                    lat: 34.0522,
                    lon: -118.2437,
                },
                location_name: "Los Angeles Area".into(),
                confidence_pct: Some(85.0),
            });
        }
        7 => {
            analytics.send(GenerateAnalytics);
        }
        8 => {
            snapshots.send(SaveSnapshot);
        }
        DEMO_STEPS.. => {
            exit.send(AppExit::Success);
        }
    }
    queue.step += 1;
}

fn report_analytics(mut ready: EventReader<AnalyticsReady>) {
    for AnalyticsReady(report) in ready.read() {
        info!(
            "demo analytics: health index {}, {} insights, {} trend days",
            report.health_index,
            report.insights.len(),
            report.trend.len()
        );
    }
}
