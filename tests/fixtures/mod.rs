//! Test fixtures for route-optimizer.
//!
//! Provides:
//! - Real German city and campsite coordinates
//! - Mock routing backends (haversine-backed, failing, counting, directional)
//! - A mock campsite directory

#![allow(dead_code)]

pub mod german_locations;
pub mod mocks;

pub use german_locations::*;
pub use mocks::*;
