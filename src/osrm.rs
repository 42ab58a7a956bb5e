//! OSRM HTTP adapter for pairwise routes.

use serde::Deserialize;

use crate::error::RouteLookupError;
use crate::model::{VehicleCategory, VehicleProfile, Waypoint};
use crate::traits::{RouteCalculator, RouteResponse, RouteSummary};

#[derive(Debug, Clone)]
pub struct OsrmConfig {
    pub base_url: String,
    pub profile: String,
    /// Profile used for motorhomes and caravans, when the backend has one.
    pub heavy_vehicle_profile: Option<String>,
    pub timeout_secs: u64,
}

impl Default for OsrmConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            profile: "car".to_string(),
            heavy_vehicle_profile: None,
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone)]
pub struct OsrmClient {
    config: OsrmConfig,
    client: reqwest::Client,
}

impl OsrmClient {
    pub fn new(config: OsrmConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { config, client })
    }

    fn profile_for(&self, vehicle: Option<&VehicleProfile>) -> &str {
        match (vehicle.map(|v| v.category), &self.config.heavy_vehicle_profile) {
            (Some(VehicleCategory::Motorhome | VehicleCategory::Caravan), Some(heavy)) => heavy,
            _ => &self.config.profile,
        }
    }
}

impl RouteCalculator for OsrmClient {
    async fn calculate_route(
        &self,
        from: &Waypoint,
        to: &Waypoint,
        vehicle: Option<&VehicleProfile>,
    ) -> Result<RouteResponse, RouteLookupError> {
        let url = format!(
            "{}/route/v1/{}/{:.6},{:.6};{:.6},{:.6}",
            self.config.base_url,
            self.profile_for(vehicle),
            from.lng,
            from.lat,
            to.lng,
            to.lat
        );

        let response = self
            .client
            .get(url)
            .query(&[("overview", "false"), ("alternatives", "false")])
            .send()
            .await
            .map_err(map_request_error)?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(RouteLookupError::Api { status, message });
        }

        let body: OsrmRouteResponse = response.json().await.map_err(map_request_error)?;
        if body.code != "Ok" {
            return Err(RouteLookupError::NoRoute);
        }

        Ok(RouteResponse {
            routes: body
                .routes
                .into_iter()
                .map(|route| RouteSummary {
                    distance_meters: route.distance,
                    duration_seconds: route.duration,
                })
                .collect(),
        })
    }
}

fn map_request_error(err: reqwest::Error) -> RouteLookupError {
    if err.is_timeout() {
        RouteLookupError::Timeout
    } else {
        RouteLookupError::Request(err)
    }
}

#[derive(Debug, Deserialize)]
struct OsrmRouteResponse {
    code: String,
    #[serde(default)]
    routes: Vec<OsrmRoute>,
}

#[derive(Debug, Deserialize)]
struct OsrmRoute {
    /// Meters.
    distance: f64,
    /// Seconds.
    duration: f64,
}
