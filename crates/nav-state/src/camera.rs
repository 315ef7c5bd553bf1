//! Camera automation
//!
//! A small state machine deciding the map camera pose from UI state plus
//! user gestures. Three modes: automatic tracking (pose follows the user),
//! automatic overview (pose fits the remaining route, per-tick recentering
//! suspended), and user-overridden (manual control until recenter).
//!
//! Automatic updates are advisory. Every gesture increments a generation
//! counter; an automatic pose computed before the latest gesture carries a
//! stale generation token and is discarded. This is the single tie-break
//! rule shared by all shells: when a gesture and an automatic update target
//! the same tick, the gesture wins.

use crate::projector::NavigationUiState;
use crate::router::{GestureEvent, GestureKind};
use nav_engine::{BoundingBox, GeoPoint, NavigationStatus};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Camera operating mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CameraMode {
    /// Pose follows the user's location and course automatically
    AutomaticTracking,
    /// Pose fits the remaining route; automatic recentering suspended
    AutomaticOverview,
    /// The user took manual control; automatic updates are ignored until
    /// recenter
    UserOverridden,
}

/// Map viewport parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraPose {
    /// Viewport center
    pub center: GeoPoint,
    /// Zoom level
    pub zoom: f64,
    /// Bearing in degrees, clockwise from north
    pub bearing: f64,
    /// Pitch in degrees from nadir
    pub pitch: f64,
}

/// Published camera state: mode, pose, and the markers readers use to
/// reason about update ordering
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraState {
    /// Current mode
    pub mode: CameraMode,
    /// Current pose
    pub pose: CameraPose,
    /// Manual-input generation; incremented by every gesture
    pub generation: u64,
    /// Monotonic count of applied automatic updates
    pub last_automatic_tick: u64,
}

/// Policy for leaving overview mode without an explicit toggle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverviewResumePolicy {
    /// Only `toggleOverview` or `recenter` leaves overview
    #[default]
    ManualOnly,
    /// Arrival snaps the camera back to tracking
    ResumeOnArrival,
}

/// Camera tuning
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraConfig {
    /// Map provider's minimum zoom
    pub min_zoom: f64,
    /// Map provider's maximum zoom
    pub max_zoom: f64,
    /// Zoom change per zoom gesture
    pub zoom_step: f64,
    /// Tracking zoom while navigating
    pub navigating_zoom: f64,
    /// Tracking pitch while navigating
    pub navigating_pitch: f64,
    /// Tracking zoom while idle
    pub idle_zoom: f64,
    /// Tracking pitch while idle
    pub idle_pitch: f64,
    /// Extra margin around the route in overview mode, as a fraction of
    /// the route's span
    pub overview_padding: f64,
    /// When to resume tracking from overview without a toggle
    pub resume_policy: OverviewResumePolicy,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            min_zoom: 0.0,
            max_zoom: 22.0,
            zoom_step: 1.0,
            navigating_zoom: 16.0,
            navigating_pitch: 45.0,
            idle_zoom: 14.0,
            idle_pitch: 0.0,
            overview_padding: 0.2,
            resume_policy: OverviewResumePolicy::ManualOnly,
        }
    }
}

/// The camera state machine
///
/// Single writer: only the reactive core mutates a controller. Shells read
/// the published [`CameraState`] values.
#[derive(Debug, Clone)]
pub struct CameraController {
    config: CameraConfig,
    state: CameraState,
}

impl CameraController {
    /// Create a controller in automatic tracking mode at an initial pose
    pub fn new(config: CameraConfig, initial_pose: CameraPose) -> Self {
        let initial_pose = CameraPose {
            zoom: initial_pose.zoom.clamp(config.min_zoom, config.max_zoom),
            ..initial_pose
        };
        Self {
            config,
            state: CameraState {
                mode: CameraMode::AutomaticTracking,
                pose: initial_pose,
                generation: 0,
                last_automatic_tick: 0,
            },
        }
    }

    /// The current camera state
    pub fn state(&self) -> &CameraState {
        &self.state
    }

    /// The tuning in effect
    pub fn config(&self) -> &CameraConfig {
        &self.config
    }

    /// Capture a generation token before computing an automatic update
    ///
    /// Pass the token to [`apply_automatic`](Self::apply_automatic); if a
    /// gesture arrives in between, the token goes stale and the update is
    /// discarded.
    pub fn begin_automatic_update(&self) -> u64 {
        self.state.generation
    }

    /// Apply a user gesture
    ///
    /// Gestures always win: each one advances the generation counter,
    /// invalidating any in-flight automatic update.
    pub fn apply_gesture(&mut self, gesture: &GestureEvent, ui: &NavigationUiState) {
        self.state.generation += 1;
        let previous_mode = self.state.mode;

        match gesture.kind {
            GestureKind::ZoomIn => {
                self.state.pose.zoom = self.clamp_zoom(self.state.pose.zoom + self.config.zoom_step);
                self.state.mode = CameraMode::UserOverridden;
            }
            GestureKind::ZoomOut => {
                self.state.pose.zoom = self.clamp_zoom(self.state.pose.zoom - self.config.zoom_step);
                self.state.mode = CameraMode::UserOverridden;
            }
            GestureKind::Pan { delta_lat, delta_lon } => {
                self.state.pose.center.latitude += delta_lat;
                self.state.pose.center.longitude += delta_lon;
                self.state.mode = CameraMode::UserOverridden;
            }
            GestureKind::Recenter => {
                self.state.mode = CameraMode::AutomaticTracking;
                if let Some(pose) = self.tracking_pose(ui) {
                    self.state.pose = pose;
                }
            }
            GestureKind::ToggleOverview => {
                if self.state.mode == CameraMode::AutomaticOverview {
                    self.state.mode = CameraMode::AutomaticTracking;
                    if let Some(pose) = self.tracking_pose(ui) {
                        self.state.pose = pose;
                    }
                } else {
                    self.state.mode = CameraMode::AutomaticOverview;
                    if let Some(pose) = self.overview_pose(ui) {
                        self.state.pose = pose;
                    }
                }
            }
        }

        if previous_mode != self.state.mode {
            debug!(from = ?previous_mode, to = ?self.state.mode, "camera mode changed by gesture");
        }
    }

    /// Apply an automatic per-tick update computed under `token`
    ///
    /// Returns true if the pose was updated. Stale tokens (a gesture
    /// arrived after [`begin_automatic_update`](Self::begin_automatic_update))
    /// are discarded silently apart from a log line.
    pub fn apply_automatic(&mut self, token: u64, ui: &NavigationUiState) -> bool {
        if token != self.state.generation {
            warn!(
                token,
                generation = self.state.generation,
                "discarding stale automatic camera update"
            );
            return false;
        }

        match self.state.mode {
            CameraMode::UserOverridden => false,
            CameraMode::AutomaticOverview => {
                if self.config.resume_policy == OverviewResumePolicy::ResumeOnArrival && ui.arrived
                {
                    debug!("arrival resumes tracking from overview");
                    self.state.mode = CameraMode::AutomaticTracking;
                    if let Some(pose) = self.tracking_pose(ui) {
                        self.state.pose = pose;
                    }
                    self.state.last_automatic_tick += 1;
                    return true;
                }
                // Per-tick recentering is suspended in overview.
                false
            }
            CameraMode::AutomaticTracking => {
                if ui.status == NavigationStatus::Error {
                    // Tracking is suspended on engine error; hold the last
                    // pose until a new route is supplied.
                    return false;
                }
                match self.tracking_pose(ui) {
                    Some(pose) => {
                        self.state.pose = pose;
                        self.state.last_automatic_tick += 1;
                        true
                    }
                    None => false,
                }
            }
        }
    }

    fn clamp_zoom(&self, zoom: f64) -> f64 {
        zoom.clamp(self.config.min_zoom, self.config.max_zoom)
    }

    /// Pose centered on the user, bearing along their course
    fn tracking_pose(&self, ui: &NavigationUiState) -> Option<CameraPose> {
        let location = ui.location?;
        let navigating = matches!(
            ui.status,
            NavigationStatus::Navigating | NavigationStatus::Recalculating
        );
        let (zoom, pitch) = if navigating {
            (self.config.navigating_zoom, self.config.navigating_pitch)
        } else {
            (self.config.idle_zoom, self.config.idle_pitch)
        };
        Some(CameraPose {
            center: location.coordinate,
            zoom: self.clamp_zoom(zoom),
            bearing: location.course_degrees.unwrap_or(self.state.pose.bearing),
            pitch,
        })
    }

    /// North-up pose fitting the remaining route geometry
    fn overview_pose(&self, ui: &NavigationUiState) -> Option<CameraPose> {
        let route = ui.route.as_ref()?;
        let fraction = ui.progress.map_or(0.0, |p| p.fraction_traveled);
        let bbox = BoundingBox::from_points(route.remaining_geometry(fraction))?;
        Some(CameraPose {
            center: bbox.center(),
            zoom: self.zoom_to_fit(&bbox),
            bearing: 0.0,
            pitch: 0.0,
        })
    }

    /// Zoom that fits a bounding box with the configured padding
    fn zoom_to_fit(&self, bbox: &BoundingBox) -> f64 {
        let lat = bbox.center().latitude.to_radians();
        // Longitude degrees shrink with latitude; compare like with like.
        let span = bbox
            .lat_span()
            .max(bbox.lon_span() * lat.cos())
            .max(1e-4);
        let padded = span * (1.0 + self.config.overview_padding);
        self.clamp_zoom((360.0 / padded).log2())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::projector::ProgressSummary;
    use nav_engine::{RouteHandle, RouteProgress, UserLocation};

    fn pose() -> CameraPose {
        CameraPose {
            center: GeoPoint::new(52.52, 13.405),
            zoom: 16.0,
            bearing: 0.0,
            pitch: 45.0,
        }
    }

    fn gesture(kind: GestureKind) -> GestureEvent {
        GestureEvent::new(kind, 1000)
    }

    fn navigating_ui() -> NavigationUiState {
        NavigationUiState {
            status: NavigationStatus::Navigating,
            location: Some(UserLocation {
                coordinate: GeoPoint::new(52.53, 13.41),
                course_degrees: Some(80.0),
                speed_mps: Some(11.0),
                horizontal_accuracy_m: 5.0,
                timestamp_ms: 1000,
            }),
            route: Some(RouteHandle::new(
                "r1",
                vec![
                    GeoPoint::new(52.52, 13.40),
                    GeoPoint::new(52.54, 13.43),
                    GeoPoint::new(52.56, 13.47),
                ],
            )),
            progress: Some(ProgressSummary::from(RouteProgress {
                distance_remaining_m: 4000.0,
                duration_remaining_s: 600.0,
                fraction_traveled: 0.0,
            })),
            ..NavigationUiState::default()
        }
    }

    #[test]
    fn test_automatic_tracking_follows_user() {
        let mut camera = CameraController::new(CameraConfig::default(), pose());
        let ui = navigating_ui();

        let token = camera.begin_automatic_update();
        assert!(camera.apply_automatic(token, &ui));

        let state = camera.state();
        assert_eq!(state.mode, CameraMode::AutomaticTracking);
        assert_eq!(state.pose.center, GeoPoint::new(52.53, 13.41));
        assert_eq!(state.pose.bearing, 80.0);
        assert_eq!(state.pose.zoom, 16.0);
        assert_eq!(state.pose.pitch, 45.0);
        assert_eq!(state.last_automatic_tick, 1);
    }

    #[test]
    fn test_idle_tracking_uses_idle_presets() {
        let mut camera = CameraController::new(CameraConfig::default(), pose());
        let ui = NavigationUiState {
            status: NavigationStatus::Idle,
            ..navigating_ui()
        };

        let token = camera.begin_automatic_update();
        assert!(camera.apply_automatic(token, &ui));
        assert_eq!(camera.state().pose.zoom, 14.0);
        assert_eq!(camera.state().pose.pitch, 0.0);
    }

    #[test]
    fn test_zoom_gesture_overrides_and_recenter_resumes() {
        let mut camera = CameraController::new(CameraConfig::default(), pose());
        let ui = navigating_ui();

        camera.apply_gesture(&gesture(GestureKind::ZoomIn), &ui);
        assert_eq!(camera.state().mode, CameraMode::UserOverridden);
        assert_eq!(camera.state().pose.zoom, 17.0);

        // Automatic updates are ignored while overridden.
        let token = camera.begin_automatic_update();
        assert!(!camera.apply_automatic(token, &ui));
        assert_eq!(camera.state().pose.zoom, 17.0);

        camera.apply_gesture(&gesture(GestureKind::Recenter), &ui);
        assert_eq!(camera.state().mode, CameraMode::AutomaticTracking);
        assert_eq!(camera.state().pose.center, GeoPoint::new(52.53, 13.41));
    }

    #[test]
    fn test_gesture_wins_over_same_tick_automatic_update() {
        let mut camera = CameraController::new(CameraConfig::default(), pose());
        let ui = navigating_ui();

        // Automatic update begins, then a gesture lands first.
        let token = camera.begin_automatic_update();
        camera.apply_gesture(&gesture(GestureKind::ZoomOut), &ui);
        let after_gesture = camera.state().pose;

        // The stale automatic pose must be discarded.
        assert!(!camera.apply_automatic(token, &ui));
        assert_eq!(camera.state().pose, after_gesture);
        assert_eq!(camera.state().mode, CameraMode::UserOverridden);
    }

    #[test]
    fn test_zoom_clamped_to_provider_bounds() {
        let config = CameraConfig { min_zoom: 3.0, max_zoom: 18.0, ..CameraConfig::default() };
        let mut camera = CameraController::new(
            config,
            CameraPose { zoom: 17.5, ..pose() },
        );
        let ui = navigating_ui();

        // Zooming past the max clamps silently, no error.
        camera.apply_gesture(&gesture(GestureKind::ZoomIn), &ui);
        assert_eq!(camera.state().pose.zoom, 18.0);
        camera.apply_gesture(&gesture(GestureKind::ZoomIn), &ui);
        assert_eq!(camera.state().pose.zoom, 18.0);

        for _ in 0..30 {
            camera.apply_gesture(&gesture(GestureKind::ZoomOut), &ui);
        }
        assert_eq!(camera.state().pose.zoom, 3.0);
    }

    #[test]
    fn test_overview_fits_route_and_suspends_recentering() {
        let mut camera = CameraController::new(CameraConfig::default(), pose());
        let ui = navigating_ui();

        camera.apply_gesture(&gesture(GestureKind::ToggleOverview), &ui);
        assert_eq!(camera.state().mode, CameraMode::AutomaticOverview);
        assert_eq!(camera.state().pose.pitch, 0.0);
        assert_eq!(camera.state().pose.bearing, 0.0);
        // Centered on the route bounds, not the user.
        let center = camera.state().pose.center;
        assert!((center.latitude - 52.54).abs() < 1e-9);
        assert!((center.longitude - 13.435).abs() < 1e-9);
        let overview_pose = camera.state().pose;

        // A snapshot tick must not silently resume tracking.
        let token = camera.begin_automatic_update();
        assert!(!camera.apply_automatic(token, &ui));
        assert_eq!(camera.state().mode, CameraMode::AutomaticOverview);
        assert_eq!(camera.state().pose, overview_pose);
    }

    #[test]
    fn test_overview_toggles_back_to_tracking() {
        let mut camera = CameraController::new(CameraConfig::default(), pose());
        let ui = navigating_ui();

        camera.apply_gesture(&gesture(GestureKind::ToggleOverview), &ui);
        camera.apply_gesture(&gesture(GestureKind::ToggleOverview), &ui);
        assert_eq!(camera.state().mode, CameraMode::AutomaticTracking);

        camera.apply_gesture(&gesture(GestureKind::ToggleOverview), &ui);
        camera.apply_gesture(&gesture(GestureKind::Recenter), &ui);
        assert_eq!(camera.state().mode, CameraMode::AutomaticTracking);
    }

    #[test]
    fn test_resume_on_arrival_policy() {
        let config = CameraConfig {
            resume_policy: OverviewResumePolicy::ResumeOnArrival,
            ..CameraConfig::default()
        };
        let mut camera = CameraController::new(config, pose());
        let ui = navigating_ui();

        camera.apply_gesture(&gesture(GestureKind::ToggleOverview), &ui);
        assert_eq!(camera.state().mode, CameraMode::AutomaticOverview);

        let arrived = NavigationUiState {
            status: NavigationStatus::Arrived,
            arrived: true,
            ..navigating_ui()
        };
        let token = camera.begin_automatic_update();
        assert!(camera.apply_automatic(token, &arrived));
        assert_eq!(camera.state().mode, CameraMode::AutomaticTracking);
    }

    #[test]
    fn test_manual_only_policy_stays_in_overview_on_arrival() {
        let mut camera = CameraController::new(CameraConfig::default(), pose());
        let ui = navigating_ui();

        camera.apply_gesture(&gesture(GestureKind::ToggleOverview), &ui);

        let arrived = NavigationUiState {
            status: NavigationStatus::Arrived,
            arrived: true,
            ..navigating_ui()
        };
        let token = camera.begin_automatic_update();
        assert!(!camera.apply_automatic(token, &arrived));
        assert_eq!(camera.state().mode, CameraMode::AutomaticOverview);
    }

    #[test]
    fn test_engine_error_suspends_tracking() {
        let mut camera = CameraController::new(CameraConfig::default(), pose());
        let ui = navigating_ui();

        let token = camera.begin_automatic_update();
        camera.apply_automatic(token, &ui);
        let last_pose = camera.state().pose;

        let error_ui = NavigationUiState {
            status: NavigationStatus::Error,
            ..navigating_ui()
        };
        let token = camera.begin_automatic_update();
        assert!(!camera.apply_automatic(token, &error_ui));
        // Falls back to the last known pose.
        assert_eq!(camera.state().pose, last_pose);
        assert_eq!(camera.state().mode, CameraMode::AutomaticTracking);
    }

    #[test]
    fn test_pan_overrides_tracking() {
        let mut camera = CameraController::new(CameraConfig::default(), pose());
        let ui = navigating_ui();

        camera.apply_gesture(
            &gesture(GestureKind::Pan { delta_lat: 0.01, delta_lon: -0.02 }),
            &ui,
        );
        assert_eq!(camera.state().mode, CameraMode::UserOverridden);
        let center = camera.state().pose.center;
        assert!((center.latitude - 52.53).abs() < 1e-9);
        assert!((center.longitude - 13.385).abs() < 1e-9);
    }

    #[test]
    fn test_overview_zoom_fits_padded_bounds() {
        let camera = CameraController::new(CameraConfig::default(), pose());
        let bbox = BoundingBox::from_points(&[
            GeoPoint::new(52.50, 13.40),
            GeoPoint::new(52.54, 13.44),
        ])
        .unwrap();
        let zoom = camera.zoom_to_fit(&bbox);
        // A ~4 km box lands in city-scale zoom, inside provider bounds.
        assert!(zoom > 10.0 && zoom < 14.5, "got {zoom}");
    }
}
