//! Hazard alerts and community reports.
//!
//! Alerts are raised by the assessment engines (or operators) and live in
//! the [`ActiveAlerts`] registry until resolved. Community reports are
//! resident observations that enter as pending and move through a
//! verification workflow. Both registries answer proximity queries with a
//! great-circle radius filter.

use std::collections::HashSet;

use bevy::prelude::*;
use bitcode::{Decode, Encode};
use serde::{Deserialize, Serialize};

use crate::geo::{haversine_km, GeoPoint};
use crate::tier::RiskTier;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Default radius for alert proximity queries.
pub const ALERT_NEARBY_RADIUS_KM: f64 = 100.0;

/// Default radius for community report proximity queries.
pub const REPORT_NEARBY_RADIUS_KM: f64 = 50.0;

// ---------------------------------------------------------------------------
// Alerts
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
pub enum AlertType {
    Flood,
    Wildfire,
    Pollution,
    HeatWave,
}

impl AlertType {
    pub fn key(self) -> &'static str {
        match self {
            AlertType::Flood => "flood",
            AlertType::Wildfire => "wildfire",
            AlertType::Pollution => "pollution",
            AlertType::HeatWave => "heat_wave",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
pub enum AlertStatus {
    Active,
    Resolved,
    Expired,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Encode, Decode)]
pub struct Alert {
    pub id: u64,
    pub alert_type: AlertType,
    pub severity: RiskTier,
    pub title: String,
    pub description: String,
    pub location: GeoPoint,
    pub location_name: String,
    pub confidence_pct: Option<f64>,
    pub status: AlertStatus,
}

/// Request to raise a new alert. The registry assigns the id and sets the
/// status to active.
#[derive(Event, Debug, Clone)]
pub struct RaiseAlert {
    pub alert_type: AlertType,
    pub severity: RiskTier,
    pub title: String,
    pub description: String,
    pub location: GeoPoint,
    pub location_name: String,
    pub confidence_pct: Option<f64>,
}

#[derive(Event, Debug, Clone)]
pub struct AlertRaised(pub Alert);

/// Registry of every alert raised this session, newest first.
#[derive(Resource, Debug, Default)]
pub struct ActiveAlerts {
    alerts: Vec<Alert>,
    next_id: u64,
}

impl ActiveAlerts {
    pub fn raise(&mut self, request: &RaiseAlert) -> Alert {
        let alert = Alert {
            id: self.next_id,
            alert_type: request.alert_type,
            severity: request.severity,
            title: request.title.clone(),
            description: request.description.clone(),
            location: request.location,
            location_name: request.location_name.clone(),
            confidence_pct: request.confidence_pct,
            status: AlertStatus::Active,
        };
        self.next_id += 1;
        self.alerts.insert(0, alert.clone());
        alert
    }

    /// Mark an alert resolved. Returns false for unknown ids.
    pub fn resolve(&mut self, id: u64) -> bool {
        match self.alerts.iter_mut().find(|a| a.id == id) {
            Some(alert) => {
                alert.status = AlertStatus::Resolved;
                true
            }
            None => false,
        }
    }

    pub fn active(&self) -> impl Iterator<Item = &Alert> {
        self.alerts
            .iter()
            .filter(|a| a.status == AlertStatus::Active)
    }

    pub fn active_of_type(&self, alert_type: AlertType) -> impl Iterator<Item = &Alert> {
        self.active().filter(move |a| a.alert_type == alert_type)
    }

    /// Active alerts within `radius_km` of a point.
    pub fn nearby(&self, center: GeoPoint, radius_km: f64) -> Vec<&Alert> {
        self.active()
            .filter(|a| haversine_km(center, a.location) <= radius_km)
            .collect()
    }

    pub fn get(&self, id: u64) -> Option<&Alert> {
        self.alerts.iter().find(|a| a.id == id)
    }

    /// All alerts regardless of status, newest first.
    pub fn iter(&self) -> impl Iterator<Item = &Alert> {
        self.alerts.iter()
    }

    pub fn len(&self) -> usize {
        self.alerts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alerts.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Community reports
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
pub enum ReportType {
    AirQuality,
    Flooding,
    Wildfire,
    Heat,
    Pollution,
    Wildlife,
    WaterQuality,
    Other,
}

impl ReportType {
    /// Parse a report-type key. Unknown keys map to `Other`.
    pub fn from_key(key: &str) -> Self {
        match key {
            "air_quality" => ReportType::AirQuality,
            "flooding" => ReportType::Flooding,
            "wildfire" => ReportType::Wildfire,
            "heat" => ReportType::Heat,
            "pollution" => ReportType::Pollution,
            "wildlife" => ReportType::Wildlife,
            "water_quality" => ReportType::WaterQuality,
            _ => ReportType::Other,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ReportType::AirQuality => "Air Quality",
            ReportType::Flooding => "Flooding",
            ReportType::Wildfire => "Wildfire/Smoke",
            ReportType::Heat => "Extreme Heat",
            ReportType::Pollution => "Pollution",
            ReportType::Wildlife => "Wildlife/Ecosystem",
            ReportType::WaterQuality => "Water Quality",
            ReportType::Other => "Other",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
pub enum ReportStatus {
    Pending,
    Verified,
    Flagged,
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Encode, Decode)]
pub struct CommunityReport {
    pub id: u64,
    pub report_type: ReportType,
    pub location: GeoPoint,
    pub location_name: String,
    pub title: String,
    pub description: String,
    pub severity: RiskTier,
    pub status: ReportStatus,
    pub upvotes: u32,
}

#[derive(Event, Debug, Clone)]
pub struct SubmitReport {
    pub report_type: ReportType,
    pub location: GeoPoint,
    pub location_name: String,
    pub title: String,
    pub description: String,
    pub severity: RiskTier,
}

#[derive(Event, Debug, Clone)]
pub struct ReportSubmitted(pub CommunityReport);

/// Registry of community reports, newest first. Upvotes are deduplicated by
/// user identifier for the session.
#[derive(Resource, Debug, Default)]
pub struct CommunityReports {
    reports: Vec<CommunityReport>,
    upvoters: HashSet<(u64, String)>,
    next_id: u64,
}

impl CommunityReports {
    pub fn submit(&mut self, request: &SubmitReport) -> CommunityReport {
        let report = CommunityReport {
            id: self.next_id,
            report_type: request.report_type,
            location: request.location,
            location_name: request.location_name.clone(),
            title: request.title.clone(),
            description: request.description.clone(),
            severity: request.severity,
            status: ReportStatus::Pending,
            upvotes: 0,
        };
        self.next_id += 1;
        self.reports.insert(0, report.clone());
        report
    }

    /// One upvote per user per report. Returns false on a repeat vote or an
    /// unknown id.
    pub fn upvote(&mut self, id: u64, user: &str) -> bool {
        let Some(report) = self.reports.iter_mut().find(|r| r.id == id) else {
            return false;
        };
        if !self.upvoters.insert((id, user.to_string())) {
            return false;
        }
        report.upvotes += 1;
        true
    }

    /// Move a pending report to verified or rejected. Other target statuses
    /// are not part of the review workflow.
    pub fn review(&mut self, id: u64, status: ReportStatus) -> bool {
        if !matches!(status, ReportStatus::Verified | ReportStatus::Rejected) {
            return false;
        }
        match self.reports.iter_mut().find(|r| r.id == id) {
            Some(report) => {
                report.status = status;
                true
            }
            None => false,
        }
    }

    pub fn get(&self, id: u64) -> Option<&CommunityReport> {
        self.reports.iter().find(|r| r.id == id)
    }

    pub fn of_type(&self, report_type: ReportType) -> impl Iterator<Item = &CommunityReport> {
        self.reports
            .iter()
            .filter(move |r| r.report_type == report_type)
    }

    pub fn with_status(&self, status: ReportStatus) -> impl Iterator<Item = &CommunityReport> {
        self.reports.iter().filter(move |r| r.status == status)
    }

    /// Reports within `radius_km` of a point, any status.
    pub fn nearby(&self, center: GeoPoint, radius_km: f64) -> Vec<&CommunityReport> {
        self.reports
            .iter()
            .filter(|r| haversine_km(center, r.location) <= radius_km)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.reports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Systems
// ---------------------------------------------------------------------------

pub fn register_alerts(
    mut requests: EventReader<RaiseAlert>,
    mut registry: ResMut<ActiveAlerts>,
    mut raised: EventWriter<AlertRaised>,
) {
    for request in requests.read() {
        let alert = registry.raise(request);
        warn!(
            "alert #{}: [{}] {} at '{}'",
            alert.id,
            alert.alert_type.key(),
            alert.title,
            alert.location_name
        );
        raised.send(AlertRaised(alert));
    }
}

pub fn register_reports(
    mut requests: EventReader<SubmitReport>,
    mut registry: ResMut<CommunityReports>,
    mut submitted: EventWriter<ReportSubmitted>,
) {
    for request in requests.read() {
        let report = registry.submit(request);
        info!(
            "community report #{}: {} at '{}'",
            report.id,
            report.report_type.label(),
            report.location_name
        );
        submitted.send(ReportSubmitted(report));
    }
}

pub struct AlertsPlugin;

impl Plugin for AlertsPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<ActiveAlerts>()
            .init_resource::<CommunityReports>()
            .add_event::<RaiseAlert>()
            .add_event::<AlertRaised>()
            .add_event::<SubmitReport>()
            .add_event::<ReportSubmitted>()
            .add_systems(Update, (register_alerts, register_reports));
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn raise_request(lat: f64, lon: f64) -> RaiseAlert {
        RaiseAlert {
            alert_type: AlertType::Flood,
            severity: RiskTier::High,
            title: "Rising water".into(),
            description: "Gauge trending above threshold".into(),
            location: GeoPoint { lat, lon },
            location_name: "Riverside".into(),
            confidence_pct: Some(85.0),
        }
    }

    fn report_request() -> SubmitReport {
        SubmitReport {
            report_type: ReportType::Flooding,
            location: GeoPoint {
                lat: 37.7749,
                lon: -122.4194,
            },
            location_name: "Mission Creek".into(),
            title: "Street flooding".into(),
            description: "Water over the curb at 4th".into(),
            severity: RiskTier::Moderate,
        }
    }

    #[test]
    fn test_raise_assigns_ids_and_active_status() {
        let mut registry = ActiveAlerts::default();
        let a = registry.raise(&raise_request(37.0, -122.0));
        let b = registry.raise(&raise_request(38.0, -121.0));
        assert_eq!(a.id, 0);
        assert_eq!(b.id, 1);
        assert_eq!(a.status, AlertStatus::Active);
        assert_eq!(registry.active().count(), 2);
        // Newest first.
        assert_eq!(registry.active().next().unwrap().id, 1);
    }

    #[test]
    fn test_resolve_removes_from_active() {
        let mut registry = ActiveAlerts::default();
        let a = registry.raise(&raise_request(37.0, -122.0));
        assert!(registry.resolve(a.id));
        assert!(!registry.resolve(99));
        assert_eq!(registry.active().count(), 0);
        assert_eq!(registry.get(a.id).unwrap().status, AlertStatus::Resolved);
    }

    #[test]
    fn test_nearby_filters_by_distance_and_status() {
        let mut registry = ActiveAlerts::default();
        let close = registry.raise(&raise_request(37.7749, -122.4194));
        registry.raise(&raise_request(34.0522, -118.2437));
        let resolved = registry.raise(&raise_request(37.7800, -122.4100));
        registry.resolve(resolved.id);

        let center = GeoPoint {
            lat: 37.7749,
            lon: -122.4194,
        };
        let hits = registry.nearby(center, ALERT_NEARBY_RADIUS_KM);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, close.id);
    }

    #[test]
    fn test_unknown_report_key_is_other() {
        assert_eq!(ReportType::from_key("ufo_sighting"), ReportType::Other);
        assert_eq!(ReportType::from_key("wildfire"), ReportType::Wildfire);
        assert_eq!(ReportType::Wildfire.label(), "Wildfire/Smoke");
        assert_eq!(ReportType::Heat.label(), "Extreme Heat");
    }

    #[test]
    fn test_submitted_reports_start_pending() {
        let mut registry = CommunityReports::default();
        let report = registry.submit(&report_request());
        assert_eq!(report.status, ReportStatus::Pending);
        assert_eq!(report.upvotes, 0);
        assert_eq!(registry.with_status(ReportStatus::Pending).count(), 1);
    }

    #[test]
    fn test_upvote_dedupes_per_user() {
        let mut registry = CommunityReports::default();
        let report = registry.submit(&report_request());
        assert!(registry.upvote(report.id, "anon-1"));
        assert!(!registry.upvote(report.id, "anon-1"));
        assert!(registry.upvote(report.id, "anon-2"));
        assert!(!registry.upvote(42, "anon-1"));
        assert_eq!(registry.get(report.id).unwrap().upvotes, 2);
    }

    #[test]
    fn test_review_only_accepts_terminal_statuses() {
        let mut registry = CommunityReports::default();
        let report = registry.submit(&report_request());
        assert!(!registry.review(report.id, ReportStatus::Pending));
        assert!(registry.review(report.id, ReportStatus::Verified));
        assert_eq!(registry.get(report.id).unwrap().status, ReportStatus::Verified);
    }

    #[test]
    fn test_report_event_flow() {
        let mut app = App::new();
        app.init_resource::<CommunityReports>()
            .add_event::<SubmitReport>()
            .add_event::<ReportSubmitted>()
            .add_systems(Update, register_reports);

        app.world_mut().send_event(report_request());
        app.update();

        assert_eq!(app.world().resource::<CommunityReports>().len(), 1);
        let events = app.world().resource::<Events<ReportSubmitted>>();
        let mut cursor = events.get_cursor();
        assert_eq!(cursor.read(events).count(), 1);
    }
}
