//! Real German locations for realistic test fixtures.
//!
//! City centre coordinates rounded to what a geocoder typically returns.

use route_optimizer::model::{VehicleCategory, VehicleProfile, Waypoint};

/// A named location with coordinates.
#[derive(Debug, Clone, Copy)]
pub struct Location {
    pub id: &'static str,
    pub name: &'static str,
    pub lat: f64,
    pub lng: f64,
}

impl Location {
    pub const fn new(id: &'static str, name: &'static str, lat: f64, lng: f64) -> Self {
        Self { id, name, lat, lng }
    }

    pub fn coords(&self) -> (f64, f64) {
        (self.lat, self.lng)
    }

    pub fn waypoint(&self) -> Waypoint {
        Waypoint::new(self.id, self.name, self.lat, self.lng)
    }
}

pub fn route(locations: &[Location]) -> Vec<Waypoint> {
    locations.iter().map(Location::waypoint).collect()
}

pub fn ids(waypoints: &[Waypoint]) -> Vec<&str> {
    waypoints.iter().map(|w| w.id.as_str()).collect()
}

// ============================================================================
// Major cities
// ============================================================================

pub const BERLIN: Location = Location::new("berlin", "Berlin", 52.52, 13.405);
pub const HAMBURG: Location = Location::new("hamburg", "Hamburg", 53.55, 9.99);
pub const FRANKFURT: Location = Location::new("frankfurt", "Frankfurt am Main", 50.11, 8.68);
pub const MUNICH: Location = Location::new("munich", "München", 48.14, 11.58);
pub const COLOGNE: Location = Location::new("cologne", "Köln", 50.94, 6.96);
pub const STUTTGART: Location = Location::new("stuttgart", "Stuttgart", 48.78, 9.18);
pub const LEIPZIG: Location = Location::new("leipzig", "Leipzig", 51.34, 12.37);
pub const HANOVER: Location = Location::new("hanover", "Hannover", 52.37, 9.73);
pub const NUREMBERG: Location = Location::new("nuremberg", "Nürnberg", 49.45, 11.08);

pub const CITIES: &[Location] = &[
    BERLIN, MUNICH, HAMBURG, STUTTGART, LEIPZIG, COLOGNE, NUREMBERG, HANOVER, FRANKFURT,
];

// ============================================================================
// Brandenburg day trip (short legs)
// ============================================================================

pub const BERLIN_MITTE: Location = Location::new("mitte", "Berlin Mitte", 52.52, 13.405);
pub const POTSDAM: Location = Location::new("potsdam", "Potsdam", 52.39, 13.06);
pub const WERDER: Location = Location::new("werder", "Werder (Havel)", 52.38, 12.93);
pub const BRANDENBURG: Location = Location::new("brandenburg", "Brandenburg an der Havel", 52.41, 12.55);

pub fn motorhome() -> VehicleProfile {
    VehicleProfile {
        category: VehicleCategory::Motorhome,
        height: 3.1,
        width: 2.3,
        length: 7.4,
        weight: 3.5,
    }
}
