//! Mock collaborators for the optimizer.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use route_optimizer::error::{CampsiteSearchError, RouteLookupError};
use route_optimizer::haversine::haversine_km;
use route_optimizer::model::{VehicleProfile, Waypoint};
use route_optimizer::traits::{
    Campsite, CampsiteQuery, CampsiteSearch, RouteCalculator, RouteResponse, RouteSummary,
};

fn summary(km: f64, minutes: f64) -> RouteResponse {
    RouteResponse {
        routes: vec![RouteSummary {
            distance_meters: km * 1000.0,
            duration_seconds: minutes * 60.0,
        }],
    }
}

/// Routes as the crow flies at one minute per kilometer.
#[derive(Debug, Clone, Default)]
pub struct HaversineRouting;

impl RouteCalculator for HaversineRouting {
    async fn calculate_route(
        &self,
        from: &Waypoint,
        to: &Waypoint,
        _vehicle: Option<&VehicleProfile>,
    ) -> Result<RouteResponse, RouteLookupError> {
        let km = haversine_km(from.coords(), to.coords());
        Ok(summary(km, km))
    }
}

/// Backend that is always down.
#[derive(Debug, Clone, Default)]
pub struct FailingRouting;

impl RouteCalculator for FailingRouting {
    async fn calculate_route(
        &self,
        _from: &Waypoint,
        _to: &Waypoint,
        _vehicle: Option<&VehicleProfile>,
    ) -> Result<RouteResponse, RouteLookupError> {
        Err(RouteLookupError::Timeout)
    }
}

/// Backend that answers but never finds a route.
#[derive(Debug, Clone, Default)]
pub struct EmptyRouting;

impl RouteCalculator for EmptyRouting {
    async fn calculate_route(
        &self,
        _from: &Waypoint,
        _to: &Waypoint,
        _vehicle: Option<&VehicleProfile>,
    ) -> Result<RouteResponse, RouteLookupError> {
        Ok(RouteResponse::default())
    }
}

/// Northbound legs are 20% longer than southbound ones.
#[derive(Debug, Clone, Default)]
pub struct DirectionalRouting;

impl RouteCalculator for DirectionalRouting {
    async fn calculate_route(
        &self,
        from: &Waypoint,
        to: &Waypoint,
        _vehicle: Option<&VehicleProfile>,
    ) -> Result<RouteResponse, RouteLookupError> {
        let km = haversine_km(from.coords(), to.coords());
        let km = if to.lat > from.lat { km * 1.2 } else { km };
        Ok(summary(km, km))
    }
}

/// Haversine routing that counts calls and tracks peak concurrency.
#[derive(Debug, Clone, Default)]
pub struct CountingRouting {
    pub calls: Arc<AtomicUsize>,
    pub in_flight: Arc<AtomicUsize>,
    pub peak_in_flight: Arc<AtomicUsize>,
    pub delay: Option<Duration>,
}

impl CountingRouting {
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn peak(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }
}

impl RouteCalculator for CountingRouting {
    async fn calculate_route(
        &self,
        from: &Waypoint,
        to: &Waypoint,
        _vehicle: Option<&VehicleProfile>,
    ) -> Result<RouteResponse, RouteLookupError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        let km = haversine_km(from.coords(), to.coords());
        Ok(summary(km, km))
    }
}

/// Fails every other call, starting with the first.
#[derive(Debug, Clone, Default)]
pub struct FlakyRouting {
    pub calls: Arc<AtomicUsize>,
}

impl RouteCalculator for FlakyRouting {
    async fn calculate_route(
        &self,
        from: &Waypoint,
        to: &Waypoint,
        _vehicle: Option<&VehicleProfile>,
    ) -> Result<RouteResponse, RouteLookupError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call % 2 == 0 {
            return Err(RouteLookupError::NoRoute);
        }
        let km = haversine_km(from.coords(), to.coords());
        Ok(summary(km, km))
    }
}

/// Campsite directory over a fixed list.
#[derive(Debug, Clone, Default)]
pub struct StaticCampsites {
    pub campsites: Vec<Campsite>,
    pub queries: Arc<AtomicUsize>,
}

impl StaticCampsites {
    pub fn new(campsites: Vec<Campsite>) -> Self {
        Self {
            campsites,
            queries: Arc::default(),
        }
    }

    pub fn queries(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }
}

impl CampsiteSearch for StaticCampsites {
    async fn search_campsites(&self, _query: &CampsiteQuery) -> Result<Vec<Campsite>, CampsiteSearchError> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        Ok(self.campsites.clone())
    }
}

#[derive(Debug, Clone, Default)]
pub struct UnavailableCampsites;

impl CampsiteSearch for UnavailableCampsites {
    async fn search_campsites(&self, _query: &CampsiteQuery) -> Result<Vec<Campsite>, CampsiteSearchError> {
        Err(CampsiteSearchError::Unavailable("directory offline".into()))
    }
}
