//! Domain types exchanged between the optimizer and its callers.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// Role a waypoint plays in a trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaypointRole {
    Start,
    End,
    Waypoint,
    Campsite,
}

/// A single stop of a trip.
///
/// Waypoints are treated as immutable values: the optimizer only reorders
/// and clones them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Waypoint {
    /// Opaque identifier, unique within a route.
    pub id: String,
    pub name: String,
    /// WGS84 latitude in decimal degrees.
    pub lat: f64,
    /// WGS84 longitude in decimal degrees.
    pub lng: f64,
    pub role: WaypointRole,
}

impl Waypoint {
    pub fn new(id: impl Into<String>, name: impl Into<String>, lat: f64, lng: f64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            lat,
            lng,
            role: WaypointRole::Waypoint,
        }
    }

    pub fn with_role(mut self, role: WaypointRole) -> Self {
        self.role = role;
        self
    }

    /// Location coordinates (lat, lng).
    pub fn coords(&self) -> (f64, f64) {
        (self.lat, self.lng)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VehicleCategory {
    Motorhome,
    Caravan,
    Campervan,
    Car,
}

impl VehicleCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            VehicleCategory::Motorhome => "motorhome",
            VehicleCategory::Caravan => "caravan",
            VehicleCategory::Campervan => "campervan",
            VehicleCategory::Car => "car",
        }
    }
}

/// Physical vehicle attributes used to bias routing and estimate fuel cost.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleProfile {
    pub category: VehicleCategory,
    /// Meters.
    pub height: f64,
    /// Meters.
    pub width: f64,
    /// Meters.
    pub length: f64,
    /// Tonnes.
    pub weight: f64,
}

impl VehicleProfile {
    /// Signature used in matrix cache keys: category, height and weight.
    pub fn signature(&self) -> String {
        format!("{}-{}-{}", self.category.as_str(), self.height, self.weight)
    }
}

/// What the solver minimizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Objective {
    Shortest,
    Fastest,
    #[default]
    Balanced,
}

impl Objective {
    /// Algorithm label reported in optimization metadata.
    pub fn algorithm_name(&self) -> &'static str {
        match self {
            Objective::Shortest => "Distance-TSP",
            Objective::Fastest => "Time-TSP",
            Objective::Balanced => "Balanced-TSP",
        }
    }

    /// Weights applied to (distance, time) when scoring an insertion.
    pub fn insertion_weights(&self) -> (f64, f64) {
        match self {
            Objective::Shortest => (0.8, 0.2),
            Objective::Fastest => (0.2, 0.8),
            Objective::Balanced => (0.5, 0.5),
        }
    }
}

/// Driving-time preferences. Informational only; the solver does not enforce them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeConstraints {
    pub max_driving_hours_per_day: Option<f64>,
    pub preferred_start_hour: Option<u8>,
    pub avoid_night_driving: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CampsitePreferences {
    /// Longest comfortable leg between overnight stops.
    pub max_distance_between_stops_km: Option<f64>,
    pub preferred_stop_duration_hours: Option<f64>,
    pub require_overnight_stops: bool,
    pub preferred_types: Vec<CampsiteType>,
    pub required_amenities: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CampsiteType {
    Campsite,
    Aire,
    Parking,
    Farm,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizationCriteria {
    pub objective: Objective,
    pub vehicle_profile: Option<VehicleProfile>,
    pub time_constraints: Option<TimeConstraints>,
    pub campsite_preferences: Option<CampsitePreferences>,
    /// Ids of waypoints that must keep their original index.
    pub locked_waypoints: HashSet<String>,
}

impl OptimizationCriteria {
    pub fn new(objective: Objective) -> Self {
        Self {
            objective,
            ..Self::default()
        }
    }

    pub fn with_vehicle(mut self, vehicle: VehicleProfile) -> Self {
        self.vehicle_profile = Some(vehicle);
        self
    }

    pub fn lock(mut self, waypoint_id: impl Into<String>) -> Self {
        self.locked_waypoints.insert(waypoint_id.into());
        self
    }
}

/// Aggregate cost of travelling a route in order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteMetrics {
    /// Kilometers.
    pub total_distance: f64,
    /// Minutes.
    pub total_time: f64,
    pub total_cost: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OriginalRoute {
    pub waypoints: Vec<Waypoint>,
    pub total_distance: f64,
    pub total_time: f64,
    pub total_cost: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizedRoute {
    pub waypoints: Vec<Waypoint>,
    pub total_distance: f64,
    pub total_time: f64,
    pub total_cost: Option<f64>,
    pub reordering_applied: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Improvements {
    pub distance_saved: f64,
    pub time_saved: f64,
    pub cost_saved: Option<f64>,
    pub percentage_improvement: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizationMetadata {
    pub algorithm: String,
    pub iterations: usize,
    pub execution_time_ms: f64,
    pub convergence_reached: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizationResult {
    pub original_route: OriginalRoute,
    pub optimized_route: OptimizedRoute,
    pub improvements: Improvements,
    pub optimization_metadata: OptimizationMetadata,
}

impl OptimizationResult {
    /// Below one percent the route is reported as already optimized.
    pub fn is_already_optimized(&self) -> bool {
        self.improvements.percentage_improvement < 1.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteImpact {
    pub distance_added: f64,
    pub time_added: f64,
    pub efficiency: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertionCandidate {
    pub position: usize,
    pub distance_added: f64,
    pub time_added: f64,
    pub efficiency: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertionResult {
    pub suggested_position: usize,
    pub route_impact: RouteImpact,
    pub alternatives: Vec<InsertionCandidate>,
}
