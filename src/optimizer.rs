//! Route optimization entry point.
//!
//! Builds (or fetches) the matrix, runs the solver, merges the solver's order
//! with locked waypoints and reports the savings.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use rayon::prelude::*;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::cost_provider::{RetryPolicy, SegmentCostProvider};
use crate::error::OptimizeError;
use crate::matrix::{CostModel, DistanceMatrix, MatrixBuilder, MatrixOptions};
use crate::model::{
    Improvements, InsertionCandidate, InsertionResult, OptimizationCriteria, OptimizationMetadata,
    OptimizationResult, OptimizedRoute, OriginalRoute, RouteImpact, RouteMetrics, VehicleProfile, Waypoint,
};
use crate::solver::{SolveOptions, solve_cancellable};
use crate::traits::RouteCalculator;

pub const MIN_WAYPOINTS: usize = 3;

/// Distance at which an insertion scores zero on the distance term.
const INSERTION_DISTANCE_SCALE_KM: f64 = 50.0;
/// Time at which an insertion scores zero on the time term.
const INSERTION_TIME_SCALE_MIN: f64 = 60.0;
const INSERTION_ALTERNATIVES: usize = 3;

#[derive(Debug, Clone, Default)]
pub struct OptimizerConfig {
    pub matrix: MatrixOptions,
    pub solve: SolveOptions,
    pub retry: RetryPolicy,
    pub cost: CostModel,
}

/// Owns the matrix cache for its lifetime; drop it to end a planning session.
pub struct RouteOptimizer<C> {
    builder: MatrixBuilder<C>,
    solve: SolveOptions,
}

impl<C: RouteCalculator> RouteOptimizer<C> {
    pub fn new(calculator: C) -> Self {
        Self::with_config(calculator, OptimizerConfig::default())
    }

    pub fn with_config(calculator: C, config: OptimizerConfig) -> Self {
        let provider = SegmentCostProvider::with_retry(calculator, config.retry);
        Self {
            builder: MatrixBuilder::new(provider, config.cost, config.matrix),
            solve: config.solve,
        }
    }

    pub fn matrix_builder(&self) -> &MatrixBuilder<C> {
        &self.builder
    }

    pub async fn build_matrix(
        &self,
        waypoints: &[Waypoint],
        vehicle: Option<&VehicleProfile>,
    ) -> Result<Arc<DistanceMatrix>, OptimizeError> {
        self.builder.build(waypoints, vehicle).await
    }

    pub fn clear_cache(&self) {
        self.builder.cache().clear();
    }

    pub fn cache_len(&self) -> usize {
        self.builder.cache().len()
    }

    pub async fn optimize_route(
        &self,
        waypoints: &[Waypoint],
        criteria: &OptimizationCriteria,
    ) -> Result<OptimizationResult, OptimizeError> {
        self.optimize_route_cancellable(waypoints, criteria, &CancellationToken::new())
            .await
    }

    pub async fn optimize_route_cancellable(
        &self,
        waypoints: &[Waypoint],
        criteria: &OptimizationCriteria,
        cancel: &CancellationToken,
    ) -> Result<OptimizationResult, OptimizeError> {
        validate(waypoints)?;

        let started = Instant::now();
        let vehicle = criteria.vehicle_profile.as_ref();
        let n = waypoints.len();

        let matrix = self.builder.build_cancellable(waypoints, vehicle, cancel).await?;

        let identity: Vec<usize> = (0..n).collect();
        let original = matrix.route_metrics(&identity);

        let locked: HashSet<usize> = waypoints
            .iter()
            .enumerate()
            .filter(|(_, waypoint)| criteria.locked_waypoints.contains(&waypoint.id))
            .map(|(index, _)| index)
            .collect();

        let solution = solve_cancellable(&matrix, criteria.objective, &locked, &self.solve, cancel)?;

        let mut order = merge_locked(&solution.order, &locked);
        let mut optimized = matrix.route_metrics(&order);
        if optimized.total_distance > original.total_distance {
            debug!(
                original = original.total_distance,
                merged = optimized.total_distance,
                "Merged order is longer than the original, keeping the original"
            );
            order = identity.clone();
            optimized = original;
        }

        let original = with_cost_if(original, vehicle.is_some());
        let optimized = with_cost_if(optimized, vehicle.is_some());
        let improvements = improvements(&original, &optimized);

        let result = OptimizationResult {
            original_route: OriginalRoute {
                waypoints: waypoints.to_vec(),
                total_distance: original.total_distance,
                total_time: original.total_time,
                total_cost: original.total_cost,
            },
            optimized_route: OptimizedRoute {
                waypoints: order.iter().map(|&index| waypoints[index].clone()).collect(),
                total_distance: optimized.total_distance,
                total_time: optimized.total_time,
                total_cost: optimized.total_cost,
                reordering_applied: order != identity,
            },
            improvements,
            optimization_metadata: OptimizationMetadata {
                algorithm: criteria.objective.algorithm_name().to_string(),
                iterations: solution.iterations,
                execution_time_ms: started.elapsed().as_secs_f64() * 1000.0,
                convergence_reached: solution.converged,
            },
        };

        info!(
            objective = ?criteria.objective,
            waypoints = n,
            locked = locked.len(),
            iterations = solution.iterations,
            converged = solution.converged,
            distance_saved = improvements.distance_saved,
            "Route optimized"
        );

        Ok(result)
    }

    /// Try `new_waypoint` at every position of `existing` and rank the results.
    pub async fn find_optimal_insertion(
        &self,
        existing: &[Waypoint],
        new_waypoint: &Waypoint,
        criteria: &OptimizationCriteria,
    ) -> Result<InsertionResult, OptimizeError> {
        if existing.is_empty() {
            return Ok(empty_route_insertion());
        }

        let n = existing.len();
        let matrix = self.insertion_matrix(existing, new_waypoint, criteria).await?;
        let baseline = matrix.route_metrics(&(0..n).collect::<Vec<_>>());
        let weights = criteria.objective.insertion_weights();

        let mut candidates: Vec<InsertionCandidate> = (0..=n)
            .into_par_iter()
            .map(|position| insertion_candidate(&matrix, &baseline, position, weights))
            .collect();

        // Stable sort keeps earlier positions first on ties.
        candidates.sort_by(|a, b| b.efficiency.total_cmp(&a.efficiency));

        let mut ranked = candidates.into_iter();
        let Some(best) = ranked.next() else {
            return Ok(empty_route_insertion());
        };

        debug!(
            waypoint = %new_waypoint.id,
            position = best.position,
            efficiency = best.efficiency,
            "Insertion search finished"
        );

        Ok(InsertionResult {
            suggested_position: best.position,
            route_impact: RouteImpact {
                distance_added: best.distance_added,
                time_added: best.time_added,
                efficiency: best.efficiency,
            },
            alternatives: ranked.take(INSERTION_ALTERNATIVES).collect(),
        })
    }

    /// Score `new_waypoint` at one fixed `position` of `existing`.
    pub async fn insertion_at(
        &self,
        existing: &[Waypoint],
        new_waypoint: &Waypoint,
        criteria: &OptimizationCriteria,
        position: usize,
    ) -> Result<InsertionCandidate, OptimizeError> {
        let n = existing.len();
        if position > n {
            return Err(OptimizeError::InvalidInput(format!(
                "insertion position {} is past the end of a {}-stop route",
                position, n
            )));
        }
        if n == 0 {
            let impact = empty_route_insertion().route_impact;
            return Ok(InsertionCandidate {
                position,
                distance_added: impact.distance_added,
                time_added: impact.time_added,
                efficiency: impact.efficiency,
            });
        }

        let matrix = self.insertion_matrix(existing, new_waypoint, criteria).await?;
        let baseline = matrix.route_metrics(&(0..n).collect::<Vec<_>>());
        Ok(insertion_candidate(
            &matrix,
            &baseline,
            position,
            criteria.objective.insertion_weights(),
        ))
    }

    /// Matrix over `existing` followed by `new_waypoint` at index `existing.len()`.
    async fn insertion_matrix(
        &self,
        existing: &[Waypoint],
        new_waypoint: &Waypoint,
        criteria: &OptimizationCriteria,
    ) -> Result<Arc<DistanceMatrix>, OptimizeError> {
        let mut stops = existing.to_vec();
        stops.push(new_waypoint.clone());
        self.builder.build(&stops, criteria.vehicle_profile.as_ref()).await
    }
}

fn validate(waypoints: &[Waypoint]) -> Result<(), OptimizeError> {
    if waypoints.len() < MIN_WAYPOINTS {
        return Err(OptimizeError::InvalidInput(format!(
            "optimization requires at least {} waypoints, got {}",
            MIN_WAYPOINTS,
            waypoints.len()
        )));
    }

    let mut seen = HashSet::new();
    for waypoint in waypoints {
        if !seen.insert(waypoint.id.as_str()) {
            return Err(OptimizeError::InvalidInput(format!(
                "duplicate waypoint id '{}'",
                waypoint.id
            )));
        }
    }

    Ok(())
}

/// Locked waypoints keep their original slot. Every other slot takes the next
/// unlocked index from the solver's order.
fn merge_locked(solver_order: &[usize], locked: &HashSet<usize>) -> Vec<usize> {
    if locked.is_empty() {
        return solver_order.to_vec();
    }

    let mut free = solver_order.iter().copied().filter(|index| !locked.contains(index));
    (0..solver_order.len())
        .map(|slot| {
            if locked.contains(&slot) {
                slot
            } else {
                free.next().unwrap_or(slot)
            }
        })
        .collect()
}

fn with_cost_if(metrics: RouteMetrics, keep: bool) -> RouteMetrics {
    RouteMetrics {
        total_cost: metrics.total_cost.filter(|_| keep),
        ..metrics
    }
}

fn improvements(original: &RouteMetrics, optimized: &RouteMetrics) -> Improvements {
    let distance_saved = (original.total_distance - optimized.total_distance).max(0.0);
    let time_saved = (original.total_time - optimized.total_time).max(0.0);
    let cost_saved = original
        .total_cost
        .zip(optimized.total_cost)
        .map(|(before, after)| (before - after).max(0.0));
    let percentage_improvement = if original.total_distance > 0.0 {
        distance_saved / original.total_distance * 100.0
    } else {
        0.0
    };

    Improvements {
        distance_saved,
        time_saved,
        cost_saved,
        percentage_improvement,
    }
}

/// Route with the last matrix index inserted at `position`, scored against
/// `baseline`, the route without it.
fn insertion_candidate(
    matrix: &DistanceMatrix,
    baseline: &RouteMetrics,
    position: usize,
    weights: (f64, f64),
) -> InsertionCandidate {
    let new_index = matrix.size() - 1;
    let mut order: Vec<usize> = (0..new_index).collect();
    order.insert(position, new_index);
    let metrics = matrix.route_metrics(&order);

    let distance_added = metrics.total_distance - baseline.total_distance;
    let time_added = metrics.total_time - baseline.total_time;
    InsertionCandidate {
        position,
        distance_added,
        time_added,
        efficiency: insertion_efficiency(distance_added, time_added, weights),
    }
}

/// Weighted score in `0..=1`; each term falls linearly from 1 at no detour
/// to 0 at its scale. Shortcuts on asymmetric matrices score 1, not more.
fn insertion_efficiency(
    distance_added: f64,
    time_added: f64,
    (distance_weight, time_weight): (f64, f64),
) -> f64 {
    distance_weight * (1.0 - distance_added / INSERTION_DISTANCE_SCALE_KM).clamp(0.0, 1.0)
        + time_weight * (1.0 - time_added / INSERTION_TIME_SCALE_MIN).clamp(0.0, 1.0)
}

fn empty_route_insertion() -> InsertionResult {
    InsertionResult {
        suggested_position: 0,
        route_impact: RouteImpact {
            distance_added: 0.0,
            time_added: 0.0,
            efficiency: 1.0,
        },
        alternatives: Vec::new(),
    }
}
