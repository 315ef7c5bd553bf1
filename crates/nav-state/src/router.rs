//! Interaction routing
//!
//! Maps raw map-surface callbacks from each presentation shell into
//! [`GestureEvent`]s for the camera controller, and decides which control
//! affordances are visible for a given camera/navigation state. Pure
//! routing; no state is held here.

use crate::camera::CameraMode;
use nav_engine::NavigationStatus;
use serde::{Deserialize, Serialize};

/// Raw input from a map surface or control grid
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SurfaceInput {
    /// Pinch or scroll zoom; positive is zoom in
    ZoomDelta(f64),
    /// Drag pan in degrees
    Pan {
        /// Latitude delta
        delta_lat: f64,
        /// Longitude delta
        delta_lon: f64,
    },
    /// Double tap, conventionally recenter
    DoubleTapRecenter,
    /// Recenter button press
    RecenterButton,
    /// Overview toggle button press
    OverviewButton,
    /// Zoom-in button press
    ZoomInButton,
    /// Zoom-out button press
    ZoomOutButton,
}

/// Gesture categories understood by the camera controller
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GestureKind {
    /// Zoom in one step
    ZoomIn,
    /// Zoom out one step
    ZoomOut,
    /// Pan the camera center
    Pan {
        /// Latitude delta in degrees
        delta_lat: f64,
        /// Longitude delta in degrees
        delta_lon: f64,
    },
    /// Resume automatic tracking
    Recenter,
    /// Toggle route overview mode
    ToggleOverview,
}

/// A timestamped gesture event
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GestureEvent {
    /// Gesture category
    pub kind: GestureKind,
    /// When the gesture was made, milliseconds since the epoch
    pub timestamp_ms: u64,
}

impl GestureEvent {
    /// Create a new gesture event
    pub fn new(kind: GestureKind, timestamp_ms: u64) -> Self {
        Self { kind, timestamp_ms }
    }
}

/// Which control affordances a shell should show
///
/// Derived, never stored: every shell computes this from the same state
/// pair, so all device classes agree on what is visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlVisibility {
    /// Show the recenter button
    pub recenter: bool,
    /// Show the overview toggle
    pub overview_toggle: bool,
    /// Show the zoom in/out buttons
    pub zoom: bool,
}

/// Stateless router from raw surface input to gesture events
#[derive(Debug, Clone, Copy, Default)]
pub struct InteractionRouter;

impl InteractionRouter {
    /// Create a router
    pub fn new() -> Self {
        Self
    }

    /// Translate raw surface input into a gesture event
    ///
    /// Returns `None` for input that maps to no gesture (e.g. a zero zoom
    /// delta).
    pub fn route(&self, input: SurfaceInput, timestamp_ms: u64) -> Option<GestureEvent> {
        let kind = match input {
            SurfaceInput::ZoomDelta(delta) => {
                if delta > 0.0 {
                    GestureKind::ZoomIn
                } else if delta < 0.0 {
                    GestureKind::ZoomOut
                } else {
                    return None;
                }
            }
            SurfaceInput::Pan { delta_lat, delta_lon } => {
                GestureKind::Pan { delta_lat, delta_lon }
            }
            SurfaceInput::DoubleTapRecenter | SurfaceInput::RecenterButton => GestureKind::Recenter,
            SurfaceInput::OverviewButton => GestureKind::ToggleOverview,
            SurfaceInput::ZoomInButton => GestureKind::ZoomIn,
            SurfaceInput::ZoomOutButton => GestureKind::ZoomOut,
        };
        Some(GestureEvent::new(kind, timestamp_ms))
    }

    /// Decide control visibility for the current camera mode and status
    ///
    /// Recenter is hidden while the camera already tracks automatically;
    /// the overview toggle only makes sense with an active route.
    pub fn control_visibility(
        &self,
        mode: CameraMode,
        status: NavigationStatus,
    ) -> ControlVisibility {
        let routing = matches!(
            status,
            NavigationStatus::Navigating | NavigationStatus::Recalculating
        );
        ControlVisibility {
            recenter: mode != CameraMode::AutomaticTracking,
            overview_toggle: routing,
            zoom: true,
        }
    }
}
