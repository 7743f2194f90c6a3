//! Fire-and-forget persistence bridge.
//!
//! Each engine publishes its results as events; these systems copy them into
//! the [`DataStore`] tables. Persistence failures are logged and never reach
//! the scoring pipeline.

use std::path::PathBuf;

use bevy::prelude::*;

use risk::alerts::{AlertRaised, ReportSubmitted};
use risk::eco_route::RouteComputed;
use risk::heat_island::HeatAssessed;
use risk::microplastic::PollutionAssessed;

use crate::data_store::{
    DataStore, TABLE_ALERTS, TABLE_COMMUNITY_REPORTS, TABLE_ECO_ROUTES, TABLE_HEAT_ASSESSMENTS,
    TABLE_POLLUTION_ASSESSMENTS, TABLE_TREE_RECOMMENDATIONS,
};

/// Environment variable overriding the snapshot location.
const SNAPSHOT_PATH_ENV: &str = "TERRAWATCH_DATA_PATH";

const DEFAULT_SNAPSHOT_FILE: &str = "terrawatch_data.ersk";

/// Where snapshots are written and loaded from.
#[derive(Resource, Debug, Clone)]
pub struct SnapshotPath(pub PathBuf);

impl Default for SnapshotPath {
    fn default() -> Self {
        let path = std::env::var(SNAPSHOT_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_SNAPSHOT_FILE));
        Self(path)
    }
}

/// Request a snapshot write at the end of the current update.
#[derive(Event, Debug, Clone, Default)]
pub struct SaveSnapshot;

pub fn persist_heat_assessments(
    mut events: EventReader<HeatAssessed>,
    mut store: ResMut<DataStore>,
) {
    for HeatAssessed(assessment) in events.read() {
        if let Err(e) = store.insert(TABLE_HEAT_ASSESSMENTS, assessment) {
            warn!("failed to persist heat assessment: {e}");
            continue;
        }
        for rec in &assessment.tree_recommendations {
            if let Err(e) = store.insert(TABLE_TREE_RECOMMENDATIONS, rec) {
                warn!("failed to persist tree recommendation: {e}");
            }
        }
    }
}

pub fn persist_pollution_assessments(
    mut events: EventReader<PollutionAssessed>,
    mut store: ResMut<DataStore>,
) {
    for PollutionAssessed(assessment) in events.read() {
        if let Err(e) = store.insert(TABLE_POLLUTION_ASSESSMENTS, assessment) {
            warn!("failed to persist pollution assessment: {e}");
        }
    }
}

pub fn persist_routes(mut events: EventReader<RouteComputed>, mut store: ResMut<DataStore>) {
    for RouteComputed(comparison) in events.read() {
        if let Err(e) = store.insert(TABLE_ECO_ROUTES, comparison) {
            warn!("failed to persist route comparison: {e}");
        }
    }
}

pub fn persist_reports(mut events: EventReader<ReportSubmitted>, mut store: ResMut<DataStore>) {
    for ReportSubmitted(report) in events.read() {
        if let Err(e) = store.insert(TABLE_COMMUNITY_REPORTS, report) {
            warn!("failed to persist community report: {e}");
        }
    }
}

pub fn persist_alerts(mut events: EventReader<AlertRaised>, mut store: ResMut<DataStore>) {
    for AlertRaised(alert) in events.read() {
        if let Err(e) = store.insert(TABLE_ALERTS, alert) {
            warn!("failed to persist alert: {e}");
        }
    }
}

/// Load an existing snapshot at startup, if one is present.
pub fn load_snapshot_on_startup(path: Res<SnapshotPath>, mut store: ResMut<DataStore>) {
    if !path.0.exists() {
        return;
    }
    match DataStore::load_from(&path.0) {
        Ok(loaded) => {
            info!(
                "loaded {} records from {}",
                loaded.total_records(),
                path.0.display()
            );
            *store = loaded;
        }
        Err(e) => warn!("failed to load snapshot {}: {e}", path.0.display()),
    }
}

pub fn write_snapshot_on_request(
    mut requests: EventReader<SaveSnapshot>,
    path: Res<SnapshotPath>,
    store: Res<DataStore>,
) {
    if requests.read().next().is_none() {
        return;
    }
    match store.save_to(&path.0) {
        Ok(()) => info!(
            "snapshot: {} records to {}",
            store.total_records(),
            path.0.display()
        ),
        Err(e) => warn!("failed to write snapshot {}: {e}", path.0.display()),
    }
}

pub struct StorePlugin;

impl Plugin for StorePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<DataStore>()
            .init_resource::<SnapshotPath>()
            .add_event::<SaveSnapshot>()
            .add_systems(Startup, load_snapshot_on_startup)
            .add_systems(
                Update,
                (
                    persist_heat_assessments,
                    persist_pollution_assessments,
                    persist_routes,
                    persist_reports,
                    persist_alerts,
                    write_snapshot_on_request,
                )
                    .chain(),
            );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use risk::alerts::CommunityReport;
    use risk::geo::GeoPoint;
    use risk::heat_island::{AssessHeatIsland, HeatAssessment, HeatAssessmentInput};
    use risk::rng::RiskRng;
    use risk::tier::RiskTier;

    fn bridge_app() -> App {
        let mut app = App::new();
        app.init_resource::<DataStore>()
            .insert_resource(RiskRng::from_seed_u64(5))
            .add_event::<HeatAssessed>()
            .add_event::<PollutionAssessed>()
            .add_event::<RouteComputed>()
            .add_event::<ReportSubmitted>()
            .add_event::<AlertRaised>()
            .add_systems(
                Update,
                (
                    persist_heat_assessments,
                    persist_pollution_assessments,
                    persist_routes,
                    persist_reports,
                    persist_alerts,
                ),
            );
        app
    }

    #[test]
    fn test_heat_results_land_in_both_tables() {
        let mut app = App::new();
        app.init_resource::<DataStore>()
            .insert_resource(RiskRng::from_seed_u64(5))
            .add_event::<AssessHeatIsland>()
            .add_event::<HeatAssessed>()
            .add_systems(
                Update,
                (
                    risk::heat_island::run_heat_assessments,
                    persist_heat_assessments,
                )
                    .chain(),
            );

        app.world_mut()
            .send_event(AssessHeatIsland(HeatAssessmentInput {
                location_name: "Industrial Flats".into(),
                tree_cover_percent: 10.0,
                building_density: 600.0,
                surface_temp_celsius: 38.0,
                latitude: None,
                longitude: None,
            }));
        app.update();

        let store = app.world().resource::<DataStore>();
        assert_eq!(store.count(TABLE_HEAT_ASSESSMENTS), 1);
        assert!(store.count(TABLE_TREE_RECOMMENDATIONS) > 0);

        let rows: Vec<HeatAssessment> = store.records(TABLE_HEAT_ASSESSMENTS).unwrap();
        assert_eq!(rows[0].location_name, "Industrial Flats");
    }

    #[test]
    fn test_report_event_is_persisted() {
        let mut app = bridge_app();

        app.world_mut().send_event(ReportSubmitted(CommunityReport {
            id: 0,
            report_type: risk::alerts::ReportType::Flooding,
            location: GeoPoint {
                lat: 37.7749,
                lon: -122.4194,
            },
            location_name: "Mission Creek".into(),
            title: "Street flooding".into(),
            description: "Water over the curb".into(),
            severity: RiskTier::Moderate,
            status: risk::alerts::ReportStatus::Pending,
            upvotes: 0,
        }));
        app.update();

        let store = app.world().resource::<DataStore>();
        assert_eq!(store.count(TABLE_COMMUNITY_REPORTS), 1);
        let rows: Vec<CommunityReport> = store.records(TABLE_COMMUNITY_REPORTS).unwrap();
        assert_eq!(rows[0].title, "Street flooding");
    }

    #[test]
    fn test_snapshot_request_writes_file() {
        let dir = std::env::temp_dir().join("terrawatch_bridge_snapshot");
        let _ = std::fs::remove_dir_all(&dir);
        let path = dir.join("data.ersk");

        let mut app = App::new();
        app.init_resource::<DataStore>()
            .insert_resource(SnapshotPath(path.clone()))
            .add_event::<SaveSnapshot>()
            .add_systems(Update, write_snapshot_on_request);

        app.world_mut().send_event(SaveSnapshot);
        app.update();

        assert!(path.exists());
        assert!(DataStore::load_from(&path).is_ok());
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_startup_load_restores_records() {
        let dir = std::env::temp_dir().join("terrawatch_bridge_load");
        let _ = std::fs::remove_dir_all(&dir);
        let path = dir.join("data.ersk");

        let mut seeded = DataStore::default();
        seeded
            .insert(
                TABLE_ALERTS,
                &risk::wildfire::FireWeatherReport {
                    index: 90,
                    tier: RiskTier::Critical,
                },
            )
            .unwrap();
        seeded.save_to(&path).unwrap();

        let mut app = App::new();
        app.init_resource::<DataStore>()
            .insert_resource(SnapshotPath(path))
            .add_systems(Startup, load_snapshot_on_startup);
        app.update();

        assert_eq!(
            app.world().resource::<DataStore>().count(TABLE_ALERTS),
            1
        );
        let _ = std::fs::remove_dir_all(&dir);
    }
}
