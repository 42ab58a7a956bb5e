//! Seams to the external collaborators of the optimizer.
//!
//! Concrete apps implement these against their routing backend and campsite
//! directory. The crate ships an OSRM implementation of [`RouteCalculator`].

use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::error::{CampsiteSearchError, RouteLookupError};
use crate::model::{CampsiteType, VehicleProfile, Waypoint, WaypointRole};

/// Summary of one route alternative returned by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RouteSummary {
    pub distance_meters: f64,
    pub duration_seconds: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RouteResponse {
    /// Alternatives, best first. Empty means no route.
    pub routes: Vec<RouteSummary>,
}

/// Computes a driving route between two waypoints.
pub trait RouteCalculator: Send + Sync {
    fn calculate_route(
        &self,
        from: &Waypoint,
        to: &Waypoint,
        vehicle: Option<&VehicleProfile>,
    ) -> impl Future<Output = Result<RouteResponse, RouteLookupError>> + Send;
}

/// Axis-aligned lat/lng box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundingBox {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl BoundingBox {
    /// Box enclosing both points, widened by `margin_deg` on every side.
    pub fn around_segment(a: (f64, f64), b: (f64, f64), margin_deg: f64) -> Self {
        Self {
            south: a.0.min(b.0) - margin_deg,
            west: a.1.min(b.1) - margin_deg,
            north: a.0.max(b.0) + margin_deg,
            east: a.1.max(b.1) + margin_deg,
        }
    }

    pub fn contains(&self, point: (f64, f64)) -> bool {
        (self.south..=self.north).contains(&point.0) && (self.west..=self.east).contains(&point.1)
    }
}

/// Vehicle limits and categories accepted by a campsite.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleAccess {
    pub max_height: Option<f64>,
    pub max_length: Option<f64>,
    pub max_weight: Option<f64>,
    pub motorhomes_allowed: bool,
    pub caravans_allowed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Campsite {
    pub id: String,
    pub name: String,
    pub lat: f64,
    pub lng: f64,
    pub campsite_type: CampsiteType,
    pub amenities: Vec<String>,
    pub access: VehicleAccess,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub opening_hours: Option<String>,
}

impl Campsite {
    pub fn coords(&self) -> (f64, f64) {
        (self.lat, self.lng)
    }

    /// Campsite as a route stop.
    pub fn to_waypoint(&self) -> Waypoint {
        Waypoint::new(self.id.clone(), self.name.clone(), self.lat, self.lng)
            .with_role(WaypointRole::Campsite)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CampsiteQuery {
    pub bounds: BoundingBox,
    pub types: Vec<CampsiteType>,
    pub amenities: Vec<String>,
    pub vehicle_filter: Option<VehicleProfile>,
}

/// Directory of campsites near a route.
pub trait CampsiteSearch: Send + Sync {
    fn search_campsites(
        &self,
        query: &CampsiteQuery,
    ) -> impl Future<Output = Result<Vec<Campsite>, CampsiteSearchError>> + Send;
}
