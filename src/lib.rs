//! route-optimizer core
//!
//! Reorders multi-stop trip waypoints to minimize distance, time or a blend
//! of both, with locked waypoints, optimal insertion of new stops and a
//! memoized pairwise route matrix.

pub mod error;
pub mod model;
pub mod traits;
pub mod haversine;
pub mod osrm;
pub mod cost_provider;
pub mod cache;
pub mod matrix;
pub mod solver;
pub mod optimizer;
pub mod campsite;

pub use error::OptimizeError;
pub use model::{Objective, OptimizationCriteria, OptimizationResult, VehicleProfile, Waypoint};
pub use optimizer::{OptimizerConfig, RouteOptimizer};
