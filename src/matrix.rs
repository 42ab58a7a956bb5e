//! Distance/duration/cost matrices built from pairwise route lookups.

use std::sync::Arc;

use futures::stream::{self, StreamExt};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::cache::{MatrixCache, cache_key};
use crate::cost_provider::{CostSource, SegmentCostProvider};
use crate::error::OptimizeError;
use crate::model::{RouteMetrics, VehicleCategory, VehicleProfile, Waypoint};
use crate::traits::RouteCalculator;

/// Three parallel N×N tables indexed by input waypoint order.
///
/// Not assumed symmetric. The diagonal is always zero.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistanceMatrix {
    size: usize,
    /// Kilometers.
    distances: Vec<Vec<f64>>,
    /// Minutes.
    durations: Vec<Vec<f64>>,
    /// Currency units.
    costs: Vec<Vec<f64>>,
}

impl DistanceMatrix {
    pub fn new(size: usize) -> Self {
        Self {
            size,
            distances: vec![vec![0.0; size]; size],
            durations: vec![vec![0.0; size]; size],
            costs: vec![vec![0.0; size]; size],
        }
    }

    /// Build from explicit tables. Returns `None` unless all three are square
    /// and the same size.
    pub fn from_tables(
        distances: Vec<Vec<f64>>,
        durations: Vec<Vec<f64>>,
        costs: Vec<Vec<f64>>,
    ) -> Option<Self> {
        let size = distances.len();
        let square = |table: &Vec<Vec<f64>>| table.len() == size && table.iter().all(|row| row.len() == size);
        if !(square(&distances) && square(&durations) && square(&costs)) {
            return None;
        }

        Some(Self {
            size,
            distances,
            durations,
            costs,
        })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn distance(&self, from: usize, to: usize) -> f64 {
        self.distances[from][to]
    }

    pub fn duration(&self, from: usize, to: usize) -> f64 {
        self.durations[from][to]
    }

    pub fn cost(&self, from: usize, to: usize) -> f64 {
        self.costs[from][to]
    }

    pub fn set(&mut self, from: usize, to: usize, distance: f64, duration: f64, cost: f64) {
        self.distances[from][to] = distance;
        self.durations[from][to] = duration;
        self.costs[from][to] = cost;
    }

    pub fn max_distance(&self) -> f64 {
        max_entry(&self.distances)
    }

    pub fn max_duration(&self) -> f64 {
        max_entry(&self.durations)
    }

    /// Totals for visiting `order` front to back (open path).
    pub fn route_metrics(&self, order: &[usize]) -> RouteMetrics {
        order
            .windows(2)
            .fold(RouteMetrics { total_cost: Some(0.0), ..RouteMetrics::default() }, |acc, leg| {
                let (from, to) = (leg[0], leg[1]);
                RouteMetrics {
                    total_distance: acc.total_distance + self.distance(from, to),
                    total_time: acc.total_time + self.duration(from, to),
                    total_cost: acc.total_cost.map(|cost| cost + self.cost(from, to)),
                }
            })
    }
}

fn max_entry(table: &[Vec<f64>]) -> f64 {
    table.iter().flatten().copied().fold(0.0, f64::max)
}

/// Fuel and toll estimate per segment.
#[derive(Debug, Clone)]
pub struct CostModel {
    pub fuel_price_per_litre: f64,
    pub toll_per_km: f64,
}

impl Default for CostModel {
    fn default() -> Self {
        Self {
            fuel_price_per_litre: 1.85,
            toll_per_km: 0.05,
        }
    }
}

impl CostModel {
    /// Fuel consumption in litres per 100 km.
    pub fn consumption_l_per_100km(&self, vehicle: Option<&VehicleProfile>) -> f64 {
        match vehicle {
            Some(v) => match v.category {
                VehicleCategory::Motorhome => 12.0 + 0.5 * v.weight,
                VehicleCategory::Caravan => 10.0 + 0.3 * v.weight,
                VehicleCategory::Campervan => 9.0,
                VehicleCategory::Car => 7.5,
            },
            None => 7.5,
        }
    }

    pub fn segment_cost(&self, distance_km: f64, vehicle: Option<&VehicleProfile>) -> f64 {
        let fuel = distance_km * self.consumption_l_per_100km(vehicle) / 100.0 * self.fuel_price_per_litre;
        fuel + distance_km * self.toll_per_km
    }
}

#[derive(Debug, Clone)]
pub struct MatrixOptions {
    /// In-flight route lookups per matrix build.
    pub max_concurrent_lookups: usize,
    /// Matrices kept before least recently used ones are evicted.
    pub cache_capacity: usize,
}

impl Default for MatrixOptions {
    fn default() -> Self {
        Self {
            max_concurrent_lookups: 8,
            cache_capacity: 32,
        }
    }
}

/// Builds and memoizes matrices for waypoint sequences.
pub struct MatrixBuilder<C> {
    provider: SegmentCostProvider<C>,
    cost_model: CostModel,
    cache: MatrixCache,
    options: MatrixOptions,
}

impl<C: RouteCalculator> MatrixBuilder<C> {
    pub fn new(provider: SegmentCostProvider<C>, cost_model: CostModel, options: MatrixOptions) -> Self {
        Self {
            provider,
            cost_model,
            cache: MatrixCache::new(options.cache_capacity),
            options,
        }
    }

    pub fn provider(&self) -> &SegmentCostProvider<C> {
        &self.provider
    }

    pub fn cache(&self) -> &MatrixCache {
        &self.cache
    }

    pub fn cost_model(&self) -> &CostModel {
        &self.cost_model
    }

    pub async fn build(
        &self,
        waypoints: &[Waypoint],
        vehicle: Option<&VehicleProfile>,
    ) -> Result<Arc<DistanceMatrix>, OptimizeError> {
        self.build_cancellable(waypoints, vehicle, &CancellationToken::new()).await
    }

    /// Looks up every ordered pair `i != j`, at most
    /// `max_concurrent_lookups` at a time. Cancelling `cancel` drops the
    /// lookups still in flight; nothing is cached.
    pub async fn build_cancellable(
        &self,
        waypoints: &[Waypoint],
        vehicle: Option<&VehicleProfile>,
        cancel: &CancellationToken,
    ) -> Result<Arc<DistanceMatrix>, OptimizeError> {
        if cancel.is_cancelled() {
            return Err(OptimizeError::Cancelled);
        }

        let key = cache_key(waypoints, vehicle);
        if let Some(matrix) = self.cache.get(&key) {
            debug!(size = waypoints.len(), "Distance matrix cache hit");
            return Ok(matrix);
        }

        let n = waypoints.len();
        debug!(size = n, "Distance matrix cache miss, building");

        let provider = &self.provider;
        let pairs = (0..n).flat_map(|i| (0..n).filter(move |&j| j != i).map(move |j| (i, j)));
        let mut lookups = stream::iter(pairs.map(move |(i, j)| {
            let (from, to) = (&waypoints[i], &waypoints[j]);
            async move { (i, j, provider.segment_cost(from, to, vehicle).await) }
        }))
        .buffer_unordered(self.options.max_concurrent_lookups.max(1));

        let mut matrix = DistanceMatrix::new(n);
        let mut estimated = 0usize;
        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(OptimizeError::Cancelled),
                next = lookups.next() => next,
            };
            let Some((i, j, segment)) = next else { break };
            if segment.source == CostSource::Estimated {
                estimated += 1;
            }
            let cost = self.cost_model.segment_cost(segment.distance_km, vehicle);
            matrix.set(i, j, segment.distance_km, segment.duration_min, cost);
        }

        debug!(size = n, estimated, "Distance matrix built");

        let matrix = Arc::new(matrix);
        self.cache.insert(key, Arc::clone(&matrix));
        Ok(matrix)
    }
}
