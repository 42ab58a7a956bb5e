//! Overnight stop planning on long trips.
//!
//! Legs longer than a comfortable day of driving get a campsite suggestion:
//! candidates near the leg are scored for the vehicle and the traveller's
//! preferences, and the best one is placed on its leg. The optimizer's
//! insertion search ranks the other positions as alternatives.

use tracing::{debug, warn};

use crate::error::OptimizeError;
use crate::haversine::haversine_km;
use crate::model::{
    CampsitePreferences, InsertionCandidate, InsertionResult, OptimizationCriteria, RouteImpact, VehicleCategory,
    VehicleProfile, Waypoint,
};
use crate::optimizer::RouteOptimizer;
use crate::traits::{BoundingBox, Campsite, CampsiteQuery, CampsiteSearch, RouteCalculator, VehicleAccess};

const BASE_SCORE: f64 = 50.0;
const COMPATIBLE_BONUS: f64 = 30.0;
const INCOMPATIBLE_PENALTY: f64 = 40.0;
const AMENITY_BONUS: f64 = 20.0;
const PREFERRED_TYPE_BONUS: f64 = 10.0;
const CONTACT_BONUS: f64 = 5.0;
const OPENING_HOURS_BONUS: f64 = 5.0;

#[derive(Debug, Clone)]
pub struct CampsitePlannerOptions {
    /// Straight-line leg length that calls for an overnight stop.
    pub daily_distance_km: f64,
    /// Degrees added around a leg when searching for campsites.
    pub search_margin_deg: f64,
}

impl Default for CampsitePlannerOptions {
    fn default() -> Self {
        Self {
            daily_distance_km: 400.0,
            search_margin_deg: 0.25,
        }
    }
}

/// A leg between consecutive waypoints.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LongSegment {
    pub from_index: usize,
    pub to_index: usize,
    pub distance_km: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OvernightSuggestion {
    pub segment: LongSegment,
    pub campsite: Campsite,
    pub score: f64,
    pub insertion: InsertionResult,
}

/// Consecutive legs whose endpoint-to-endpoint distance exceeds `threshold_km`.
pub fn find_long_segments(waypoints: &[Waypoint], threshold_km: f64) -> Vec<LongSegment> {
    waypoints
        .windows(2)
        .enumerate()
        .filter_map(|(i, leg)| {
            let distance_km = haversine_km(leg[0].coords(), leg[1].coords());
            (distance_km > threshold_km).then_some(LongSegment {
                from_index: i,
                to_index: i + 1,
                distance_km,
            })
        })
        .collect()
}

pub fn vehicle_compatible(access: &VehicleAccess, vehicle: &VehicleProfile) -> bool {
    let category_allowed = match vehicle.category {
        VehicleCategory::Motorhome | VehicleCategory::Campervan => access.motorhomes_allowed,
        VehicleCategory::Caravan => access.caravans_allowed,
        VehicleCategory::Car => true,
    };
    let within = |limit: Option<f64>, value: f64| limit.is_none_or(|max| value <= max);

    category_allowed
        && within(access.max_height, vehicle.height)
        && within(access.max_length, vehicle.length)
        && within(access.max_weight, vehicle.weight)
}

/// Suitability of a campsite; higher is better.
pub fn score_campsite(
    campsite: &Campsite,
    vehicle: Option<&VehicleProfile>,
    preferences: &CampsitePreferences,
) -> f64 {
    let mut score = BASE_SCORE;

    if let Some(vehicle) = vehicle {
        if vehicle_compatible(&campsite.access, vehicle) {
            score += COMPATIBLE_BONUS;
        } else {
            score -= INCOMPATIBLE_PENALTY;
        }
    }

    let required = &preferences.required_amenities;
    if !required.is_empty() {
        let matched = required
            .iter()
            .filter(|wanted| campsite.amenities.iter().any(|a| a.eq_ignore_ascii_case(wanted)))
            .count();
        score += AMENITY_BONUS * matched as f64 / required.len() as f64;
    }

    if preferences.preferred_types.contains(&campsite.campsite_type) {
        score += PREFERRED_TYPE_BONUS;
    }
    if campsite.phone.is_some() && campsite.website.is_some() {
        score += CONTACT_BONUS;
    }
    if campsite.opening_hours.is_some() {
        score += OPENING_HOURS_BONUS;
    }

    score
}

pub struct CampsitePlanner<'a, C, S> {
    optimizer: &'a RouteOptimizer<C>,
    search: S,
    options: CampsitePlannerOptions,
}

impl<'a, C: RouteCalculator, S: CampsiteSearch> CampsitePlanner<'a, C, S> {
    pub fn new(optimizer: &'a RouteOptimizer<C>, search: S) -> Self {
        Self::with_options(optimizer, search, CampsitePlannerOptions::default())
    }

    pub fn with_options(optimizer: &'a RouteOptimizer<C>, search: S, options: CampsitePlannerOptions) -> Self {
        Self {
            optimizer,
            search,
            options,
        }
    }

    /// One suggestion per long leg that has a campsite nearby.
    ///
    /// A failing campsite search skips that leg.
    pub async fn suggest_overnight_stops(
        &self,
        waypoints: &[Waypoint],
        criteria: &OptimizationCriteria,
    ) -> Result<Vec<OvernightSuggestion>, OptimizeError> {
        let preferences = criteria.campsite_preferences.clone().unwrap_or_default();
        let threshold = preferences
            .max_distance_between_stops_km
            .unwrap_or(self.options.daily_distance_km);
        let vehicle = criteria.vehicle_profile.as_ref();

        let mut suggestions = Vec::new();
        for segment in find_long_segments(waypoints, threshold) {
            let from = waypoints[segment.from_index].coords();
            let to = waypoints[segment.to_index].coords();
            let query = CampsiteQuery {
                bounds: BoundingBox::around_segment(from, to, self.options.search_margin_deg),
                types: preferences.preferred_types.clone(),
                amenities: preferences.required_amenities.clone(),
                vehicle_filter: criteria.vehicle_profile.clone(),
            };

            let campsites = match self.search.search_campsites(&query).await {
                Ok(campsites) => campsites,
                Err(err) => {
                    warn!(from = segment.from_index, to = segment.to_index, error = %err, "Campsite search failed, skipping leg");
                    continue;
                }
            };

            let best = campsites
                .into_iter()
                .filter(|campsite| query.bounds.contains(campsite.coords()))
                .map(|campsite| {
                    let score = score_campsite(&campsite, vehicle, &preferences);
                    (campsite, score)
                })
                .fold(None::<(Campsite, f64)>, |best, candidate| match best {
                    Some(current) if current.1 >= candidate.1 => Some(current),
                    _ => Some(candidate),
                });

            let Some((campsite, score)) = best else {
                debug!(from = segment.from_index, to = segment.to_index, "No campsite near long leg");
                continue;
            };

            let stop = campsite.to_waypoint();
            let ranked = self.optimizer.find_optimal_insertion(waypoints, &stop, criteria).await?;
            let insertion = if ranked.suggested_position == segment.to_index {
                ranked
            } else {
                let at_leg = self
                    .optimizer
                    .insertion_at(waypoints, &stop, criteria, segment.to_index)
                    .await?;
                pin_to_leg(ranked, at_leg)
            };

            suggestions.push(OvernightSuggestion {
                segment,
                campsite,
                score,
                insertion,
            });
        }

        Ok(suggestions)
    }
}

/// Make `at_leg` the suggestion and demote the search's pick to an
/// alternative, keeping the number of alternatives.
fn pin_to_leg(ranked: InsertionResult, at_leg: InsertionCandidate) -> InsertionResult {
    let limit = ranked.alternatives.len();
    let displaced = InsertionCandidate {
        position: ranked.suggested_position,
        distance_added: ranked.route_impact.distance_added,
        time_added: ranked.route_impact.time_added,
        efficiency: ranked.route_impact.efficiency,
    };
    let alternatives = std::iter::once(displaced)
        .chain(ranked.alternatives)
        .filter(|candidate| candidate.position != at_leg.position)
        .take(limit)
        .collect();

    InsertionResult {
        suggested_position: at_leg.position,
        route_impact: RouteImpact {
            distance_added: at_leg.distance_added,
            time_added: at_leg.time_added,
            efficiency: at_leg.efficiency,
        },
        alternatives,
    }
}

/// Insert each suggested campsite at its suggested position.
///
/// Positions refer to the route the suggestions were computed for, so later
/// positions are filled first. A campsite already on the route is skipped.
pub fn apply_overnight_stops(waypoints: &[Waypoint], suggestions: &[OvernightSuggestion]) -> Vec<Waypoint> {
    let mut ordered: Vec<&OvernightSuggestion> = suggestions.iter().collect();
    ordered.sort_by(|a, b| b.insertion.suggested_position.cmp(&a.insertion.suggested_position));

    let mut route = waypoints.to_vec();
    for suggestion in ordered {
        if route.iter().any(|waypoint| waypoint.id == suggestion.campsite.id) {
            continue;
        }
        let position = suggestion.insertion.suggested_position.min(waypoints.len());
        route.insert(position, suggestion.campsite.to_waypoint());
    }

    route
}
