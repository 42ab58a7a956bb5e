//! Pairwise route cost provider.
//!
//! Wraps a [`RouteCalculator`] and never fails: any lookup error or empty
//! response is replaced by a haversine estimate. Nothing is cached here.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tracing::warn;

use crate::error::RouteLookupError;
use crate::haversine::HaversineEstimator;
use crate::model::{VehicleProfile, Waypoint};
use crate::traits::RouteCalculator;

/// Bounded retry applied before falling back to the estimate.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 0,
            backoff: Duration::from_millis(200),
        }
    }
}

/// Where a segment cost came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CostSource {
    Routed,
    Estimated,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentCost {
    pub distance_km: f64,
    pub duration_min: f64,
    pub source: CostSource,
}

pub struct SegmentCostProvider<C> {
    calculator: C,
    estimator: HaversineEstimator,
    retry: RetryPolicy,
    fallbacks: AtomicU64,
}

impl<C: RouteCalculator> SegmentCostProvider<C> {
    pub fn new(calculator: C) -> Self {
        Self::with_retry(calculator, RetryPolicy::default())
    }

    pub fn with_retry(calculator: C, retry: RetryPolicy) -> Self {
        Self {
            calculator,
            estimator: HaversineEstimator::default(),
            retry,
            fallbacks: AtomicU64::new(0),
        }
    }

    pub fn calculator(&self) -> &C {
        &self.calculator
    }

    /// Number of lookups answered with the haversine estimate so far.
    pub fn fallback_count(&self) -> u64 {
        self.fallbacks.load(Ordering::Relaxed)
    }

    pub async fn segment_cost(
        &self,
        from: &Waypoint,
        to: &Waypoint,
        vehicle: Option<&VehicleProfile>,
    ) -> SegmentCost {
        match self.lookup_with_retry(from, to, vehicle).await {
            Ok(cost) => cost,
            Err(err) => {
                warn!(from = %from.id, to = %to.id, error = %err, "Route lookup failed, using haversine estimate");
                self.fallbacks.fetch_add(1, Ordering::Relaxed);
                let (distance_km, duration_min) = self.estimator.estimate(from.coords(), to.coords());
                SegmentCost {
                    distance_km,
                    duration_min,
                    source: CostSource::Estimated,
                }
            }
        }
    }

    async fn lookup_with_retry(
        &self,
        from: &Waypoint,
        to: &Waypoint,
        vehicle: Option<&VehicleProfile>,
    ) -> Result<SegmentCost, RouteLookupError> {
        let mut attempt = 0;
        loop {
            match self.lookup(from, to, vehicle).await {
                Ok(cost) => return Ok(cost),
                Err(err) if attempt >= self.retry.max_retries => return Err(err),
                Err(_) => {
                    attempt += 1;
                    tokio::time::sleep(self.retry.backoff * attempt).await;
                }
            }
        }
    }

    async fn lookup(
        &self,
        from: &Waypoint,
        to: &Waypoint,
        vehicle: Option<&VehicleProfile>,
    ) -> Result<SegmentCost, RouteLookupError> {
        let response = self.calculator.calculate_route(from, to, vehicle).await?;
        let summary = response.routes.first().ok_or(RouteLookupError::NoRoute)?;

        Ok(SegmentCost {
            distance_km: summary.distance_meters / 1000.0,
            duration_min: summary.duration_seconds / 60.0,
            source: CostSource::Routed,
        })
    }
}
