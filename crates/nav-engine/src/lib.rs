//! Navigation engine boundary for Waymark
//!
//! This crate wraps the external turn-by-turn navigation engine behind a
//! narrow async trait and an adapter that enforces the delivery guarantees
//! the rest of the system relies on: snapshots arrive in non-decreasing
//! timestamp order, nothing is delivered after a terminal snapshot until a
//! new route is set, and fatal engine failures surface as data rather than
//! silently dropped updates.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapter;
pub mod engine;
pub mod error;
pub mod models;

pub use adapter::{AdapterHandle, EngineAdapter};
pub use engine::NavigationEngine;
pub use error::{EngineError, Result};
pub use models::{
    BoundingBox, EngineSnapshot, GeoPoint, ManeuverKind, NavigationStatus, RouteHandle,
    RouteProgress, UserLocation, VisualInstruction,
};
