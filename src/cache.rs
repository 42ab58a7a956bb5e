//! Bounded in-memory cache of distance matrices.
//!
//! Entries are keyed by content: coordinates rounded to 4 decimals (~11 m)
//! plus the vehicle signature, so equal inputs share one matrix.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::matrix::DistanceMatrix;
use crate::model::{VehicleProfile, Waypoint};

const DEFAULT_VEHICLE_SIGNATURE: &str = "default";

/// Cache key for a waypoint sequence and vehicle.
pub fn cache_key(waypoints: &[Waypoint], vehicle: Option<&VehicleProfile>) -> String {
    let coords = waypoints
        .iter()
        .map(|waypoint| format!("{:.4},{:.4}", waypoint.lat, waypoint.lng))
        .collect::<Vec<_>>()
        .join("|");

    let signature = vehicle
        .map(VehicleProfile::signature)
        .unwrap_or_else(|| DEFAULT_VEHICLE_SIGNATURE.to_string());

    format!("{}#{}", coords, signature)
}

#[derive(Debug, Default)]
struct CacheState {
    entries: HashMap<String, Arc<DistanceMatrix>>,
    /// Least recently used first.
    recency: VecDeque<String>,
}

impl CacheState {
    fn touch(&mut self, key: &str) {
        if let Some(pos) = self.recency.iter().position(|k| k == key) {
            if let Some(k) = self.recency.remove(pos) {
                self.recency.push_back(k);
            }
        }
    }
}

/// LRU cache of matrices shared as `Arc`s.
#[derive(Debug)]
pub struct MatrixCache {
    capacity: usize,
    state: Mutex<CacheState>,
}

impl MatrixCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            state: Mutex::new(CacheState::default()),
        }
    }

    pub fn get(&self, key: &str) -> Option<Arc<DistanceMatrix>> {
        let mut state = self.state.lock();
        let matrix = state.entries.get(key).cloned()?;
        state.touch(key);
        Some(matrix)
    }

    /// Last write wins when two builders race on the same key.
    pub fn insert(&self, key: String, matrix: Arc<DistanceMatrix>) {
        let mut state = self.state.lock();
        if state.entries.insert(key.clone(), matrix).is_some() {
            state.touch(&key);
            return;
        }

        state.recency.push_back(key);
        while state.entries.len() > self.capacity {
            match state.recency.pop_front() {
                Some(evicted) => {
                    state.entries.remove(&evicted);
                }
                None => break,
            }
        }
    }

    pub fn clear(&self) {
        let mut state = self.state.lock();
        state.entries.clear();
        state.recency.clear();
    }

    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
