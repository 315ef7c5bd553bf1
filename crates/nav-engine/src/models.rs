//! Value model for engine snapshots
//!
//! Every type here is an immutable value: the engine replaces the whole
//! snapshot on each location tick, and downstream consumers hold clones that
//! are safe to keep across render frames. Nothing references engine-internal
//! mutable structures.

use serde::{Deserialize, Serialize};

/// A WGS84 coordinate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    /// Latitude in degrees
    pub latitude: f64,
    /// Longitude in degrees
    pub longitude: f64,
}

impl GeoPoint {
    /// Create a new point
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// Great-circle distance to another point in meters
    pub fn distance_meters(&self, other: &GeoPoint) -> f64 {
        const EARTH_RADIUS_M: f64 = 6_371_000.0;

        let lat1 = self.latitude.to_radians();
        let lat2 = other.latitude.to_radians();
        let dlat = (other.latitude - self.latitude).to_radians();
        let dlon = (other.longitude - self.longitude).to_radians();

        let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
        EARTH_RADIUS_M * c
    }

    /// Initial bearing toward another point, degrees in [0, 360)
    pub fn bearing_degrees(&self, other: &GeoPoint) -> f64 {
        let lat1 = self.latitude.to_radians();
        let lat2 = other.latitude.to_radians();
        let dlon = (other.longitude - self.longitude).to_radians();

        let y = dlon.sin() * lat2.cos();
        let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * dlon.cos();
        (y.atan2(x).to_degrees() + 360.0) % 360.0
    }
}

/// Axis-aligned geographic bounding box
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Southwest corner
    pub southwest: GeoPoint,
    /// Northeast corner
    pub northeast: GeoPoint,
}

impl BoundingBox {
    /// Compute the bounding box of a set of points
    ///
    /// Returns `None` for an empty slice. Longitude wrap across the
    /// antimeridian is not handled; routes are assumed local.
    pub fn from_points(points: &[GeoPoint]) -> Option<Self> {
        let first = points.first()?;
        let mut min_lat = first.latitude;
        let mut max_lat = first.latitude;
        let mut min_lon = first.longitude;
        let mut max_lon = first.longitude;

        for p in &points[1..] {
            min_lat = min_lat.min(p.latitude);
            max_lat = max_lat.max(p.latitude);
            min_lon = min_lon.min(p.longitude);
            max_lon = max_lon.max(p.longitude);
        }

        Some(Self {
            southwest: GeoPoint::new(min_lat, min_lon),
            northeast: GeoPoint::new(max_lat, max_lon),
        })
    }

    /// Center of the box
    pub fn center(&self) -> GeoPoint {
        GeoPoint::new(
            (self.southwest.latitude + self.northeast.latitude) / 2.0,
            (self.southwest.longitude + self.northeast.longitude) / 2.0,
        )
    }

    /// Latitude span in degrees
    pub fn lat_span(&self) -> f64 {
        self.northeast.latitude - self.southwest.latitude
    }

    /// Longitude span in degrees
    pub fn lon_span(&self) -> f64 {
        self.northeast.longitude - self.southwest.longitude
    }
}

/// A user location fix as reported by the engine
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UserLocation {
    /// Snapped or raw coordinate
    pub coordinate: GeoPoint,
    /// Course over ground in degrees, if known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub course_degrees: Option<f64>,
    /// Speed in meters per second, if known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speed_mps: Option<f64>,
    /// Horizontal accuracy radius in meters
    pub horizontal_accuracy_m: f64,
    /// Fix timestamp, milliseconds since the epoch
    pub timestamp_ms: u64,
}

/// Reference to an active route and its geometry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteHandle {
    /// Engine-assigned route identifier
    pub id: String,
    /// Full route polyline
    pub geometry: Vec<GeoPoint>,
}

impl RouteHandle {
    /// Create a new route handle
    pub fn new(id: impl Into<String>, geometry: Vec<GeoPoint>) -> Self {
        Self { id: id.into(), geometry }
    }

    /// The portion of the polyline not yet traveled
    ///
    /// `fraction_traveled` is clamped to [0, 1]; the slice always keeps at
    /// least the final point so overview fitting has something to frame.
    pub fn remaining_geometry(&self, fraction_traveled: f64) -> &[GeoPoint] {
        if self.geometry.is_empty() {
            return &self.geometry;
        }
        let fraction = fraction_traveled.clamp(0.0, 1.0);
        let skip = ((self.geometry.len() as f64) * fraction) as usize;
        let skip = skip.min(self.geometry.len() - 1);
        &self.geometry[skip..]
    }
}

/// Progress along the active route
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RouteProgress {
    /// Distance remaining to the destination in meters
    pub distance_remaining_m: f64,
    /// Estimated travel time remaining in seconds
    pub duration_remaining_s: f64,
    /// Fraction of the route already traveled, in [0, 1]
    pub fraction_traveled: f64,
}

/// Maneuver categories for visual instructions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ManeuverKind {
    /// Start of the route
    Depart,
    /// Continue straight
    Continue,
    /// Slight left turn
    SlightLeft,
    /// Left turn
    Left,
    /// Sharp left turn
    SharpLeft,
    /// Slight right turn
    SlightRight,
    /// Right turn
    Right,
    /// Sharp right turn
    SharpRight,
    /// U-turn
    UTurn,
    /// Arrival at the destination
    Arrive,
}

/// The maneuver description currently shown to the user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisualInstruction {
    /// Index of the route step this instruction belongs to
    ///
    /// Two instructions with the same step index are the same instruction
    /// for change-detection purposes, even if the text was re-rendered.
    pub step_index: usize,
    /// Primary instruction text (e.g. "Turn left onto Main St")
    pub primary_text: String,
    /// Maneuver category, for banner iconography
    pub maneuver: ManeuverKind,
    /// Distance from the current location to the maneuver point in meters
    pub distance_to_maneuver_m: f64,
}

impl VisualInstruction {
    /// Whether this is the same instruction as `other`, ignoring the
    /// per-tick distance countdown
    pub fn same_identity(&self, other: &VisualInstruction) -> bool {
        self.step_index == other.step_index
    }
}

/// High-level navigation status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NavigationStatus {
    /// No active route
    Idle,
    /// Actively navigating along a route
    Navigating,
    /// Off route; the engine is computing a new route
    Recalculating,
    /// The destination was reached
    Arrived,
    /// The engine failed fatally; no further updates until a new route
    Error,
}

impl NavigationStatus {
    /// Whether this status ends snapshot delivery until a new route is set
    pub fn is_terminal(&self) -> bool {
        matches!(self, NavigationStatus::Arrived | NavigationStatus::Error)
    }
}

/// One immutable update from the navigation engine
///
/// Replaced wholesale on every location tick; never mutated in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineSnapshot {
    /// Snapshot timestamp, milliseconds since the epoch
    ///
    /// The adapter guarantees non-decreasing timestamps downstream.
    pub timestamp_ms: u64,
    /// Latest user location fix
    ///
    /// Absent only on synthesized terminal error snapshots where no fix was
    /// ever received.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<UserLocation>,
    /// The active route, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route: Option<RouteHandle>,
    /// Progress along the active route
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<RouteProgress>,
    /// The visual instruction for the upcoming maneuver
    ///
    /// May be `None` between maneuvers even while navigating; the projector
    /// carries the previous instruction forward in that case.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instruction: Option<VisualInstruction>,
    /// Navigation status
    pub status: NavigationStatus,
}
