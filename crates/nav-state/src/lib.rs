//! Reactive navigation core for Waymark
//!
//! This crate turns engine snapshots into render-ready UI state, drives the
//! automatic map camera, and publishes both to any number of presentation
//! shells from a single-writer reactive core.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod camera;
pub mod hub;
pub mod projector;
pub mod router;

pub use camera::{
    CameraConfig, CameraController, CameraMode, CameraPose, CameraState, OverviewResumePolicy,
};
pub use hub::{HubError, HubHandle, NavigationEvent, NavigationHub};
pub use projector::{
    project, DistanceDisplay, DistanceUnit, NavigationUiState, Projection, ProjectionMemory,
    ProgressSummary,
};
pub use router::{ControlVisibility, GestureEvent, GestureKind, InteractionRouter, SurfaceInput};
