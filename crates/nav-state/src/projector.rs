//! UI state projection
//!
//! Maps each engine snapshot to a [`NavigationUiState`] value that shells
//! can hold across render frames. The mapping is pure except for one small
//! piece of carried-forward memory: the previous instruction identity (for
//! change detection and persistence between maneuvers) and the one-way
//! arrival latch. That memory lives in an explicit [`ProjectionMemory`]
//! passed into [`project`], never in globals.

use nav_engine::{EngineSnapshot, NavigationStatus, RouteHandle, RouteProgress, UserLocation, VisualInstruction};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Distance unit for display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceUnit {
    /// Meters
    Meters,
    /// Kilometers
    Kilometers,
}

/// A distance rounded for display: numeric value plus unit
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DistanceDisplay {
    /// Rounded numeric value
    pub value: f64,
    /// Display unit
    pub unit: DistanceUnit,
}

impl DistanceDisplay {
    /// Round a raw distance in meters for display
    ///
    /// Under 100 m: nearest 10 m. Under 1 km: nearest 50 m. At or above
    /// 1 km: tenths of a kilometer.
    pub fn from_meters(meters: f64) -> Self {
        let meters = meters.max(0.0);
        if meters < 100.0 {
            Self { value: (meters / 10.0).round() * 10.0, unit: DistanceUnit::Meters }
        } else if meters < 1000.0 {
            Self { value: (meters / 50.0).round() * 50.0, unit: DistanceUnit::Meters }
        } else {
            Self { value: (meters / 100.0).round() / 10.0, unit: DistanceUnit::Kilometers }
        }
    }
}

impl fmt::Display for DistanceDisplay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.unit {
            DistanceUnit::Meters => write!(f, "{} m", self.value),
            DistanceUnit::Kilometers => write!(f, "{} km", self.value),
        }
    }
}

/// Route progress summarized for display
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProgressSummary {
    /// Distance remaining to the destination
    pub distance_remaining: DistanceDisplay,
    /// Travel time remaining, whole minutes (rounded up)
    pub duration_remaining_min: u64,
    /// Fraction of the route already traveled, in [0, 1]
    pub fraction_traveled: f64,
}

impl From<RouteProgress> for ProgressSummary {
    fn from(progress: RouteProgress) -> Self {
        Self {
            distance_remaining: DistanceDisplay::from_meters(progress.distance_remaining_m),
            duration_remaining_min: (progress.duration_remaining_s.max(0.0) / 60.0).ceil() as u64,
            fraction_traveled: progress.fraction_traveled.clamp(0.0, 1.0),
        }
    }
}

/// Render-ready navigation state, derived from one engine snapshot
///
/// An immutable value snapshot: it never references engine-internal mutable
/// structures and is safe to hold across render frames. Every presentation
/// shell observing the same value must render identically modulo layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavigationUiState {
    /// Navigation status
    pub status: NavigationStatus,
    /// Instruction to display, if any
    ///
    /// Persists across snapshots that carry no instruction while still
    /// navigating, so the banner does not flash to empty between maneuvers.
    pub instruction: Option<VisualInstruction>,
    /// Distance to the next maneuver, formatted for display
    pub distance_to_maneuver: Option<DistanceDisplay>,
    /// Route progress summary
    pub progress: Option<ProgressSummary>,
    /// True while the displayed instruction is held over from before a
    /// recalculation; shells may dim the banner
    pub stale: bool,
    /// True once the destination is reached; one-way until a new route
    pub arrived: bool,
    /// Last known user location, for map placement
    pub location: Option<UserLocation>,
    /// The active route, for overlay drawing and overview fitting
    pub route: Option<RouteHandle>,
}

impl Default for NavigationUiState {
    fn default() -> Self {
        Self {
            status: NavigationStatus::Idle,
            instruction: None,
            distance_to_maneuver: None,
            progress: None,
            stale: false,
            arrived: false,
            location: None,
            route: None,
        }
    }
}

/// The projector's carried-forward memory
///
/// One scalar of state next to an otherwise pure mapping: the previous
/// instruction (identity for change detection, content for persistence
/// between maneuvers), the arrival latch, and the route the memory belongs
/// to. A new route id resets everything.
#[derive(Debug, Clone, Default)]
pub struct ProjectionMemory {
    last_instruction: Option<VisualInstruction>,
    arrived: bool,
    route_id: Option<String>,
}

impl ProjectionMemory {
    /// Create fresh memory
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget everything (new route, or explicit session reset)
    pub fn reset(&mut self) {
        self.last_instruction = None;
        self.arrived = false;
        self.route_id = None;
    }
}

/// The result of projecting one snapshot
#[derive(Debug, Clone)]
pub struct Projection {
    /// The derived UI state
    pub state: NavigationUiState,
    /// True exactly when the snapshot carried an instruction with a new
    /// identity; drives transition/haptic side effects
    ///
    /// Deliberately outside [`NavigationUiState`] so the state itself stays
    /// an idempotent function of the snapshot.
    pub instruction_changed: bool,
}

/// Project an engine snapshot into render-ready UI state
pub fn project(snapshot: &EngineSnapshot, memory: &mut ProjectionMemory) -> Projection {
    let route_id = snapshot.route.as_ref().map(|r| r.id.clone());
    if route_id != memory.route_id {
        debug!(route_id = ?route_id, "route changed; resetting projection memory");
        memory.reset();
        memory.route_id = route_id;
    }

    let base = NavigationUiState {
        status: snapshot.status,
        location: snapshot.location,
        route: snapshot.route.clone(),
        ..NavigationUiState::default()
    };

    match snapshot.status {
        NavigationStatus::Idle => {
            memory.last_instruction = None;
            Projection { state: base, instruction_changed: false }
        }
        NavigationStatus::Error => {
            // Engine failure is data, not an exception: an explicit error
            // state, never stale instructions dressed up as live guidance.
            memory.last_instruction = None;
            Projection { state: base, instruction_changed: false }
        }
        NavigationStatus::Arrived => {
            memory.arrived = true;
            memory.last_instruction = None;
            Projection {
                state: NavigationUiState {
                    arrived: true,
                    progress: snapshot.progress.map(ProgressSummary::from),
                    ..base
                },
                instruction_changed: false,
            }
        }
        NavigationStatus::Navigating | NavigationStatus::Recalculating => {
            if memory.arrived {
                // Arrival is one-way until a new route starts, even if the
                // engine keeps ticking on the finished route.
                return Projection {
                    state: NavigationUiState {
                        status: NavigationStatus::Arrived,
                        arrived: true,
                        ..base
                    },
                    instruction_changed: false,
                };
            }

            let instruction_changed = match (&snapshot.instruction, &memory.last_instruction) {
                (Some(new), Some(prev)) => !new.same_identity(prev),
                (Some(_), None) => true,
                _ => false,
            };
            if instruction_changed {
                debug!(
                    step_index = snapshot.instruction.as_ref().map(|i| i.step_index),
                    "instruction changed"
                );
            }
            if let Some(instruction) = &snapshot.instruction {
                memory.last_instruction = Some(instruction.clone());
            }

            // Between maneuvers the engine may emit no instruction; keep
            // showing the previous one instead of flashing to empty.
            let instruction = snapshot
                .instruction
                .clone()
                .or_else(|| memory.last_instruction.clone());
            let distance_to_maneuver = instruction
                .as_ref()
                .map(|i| DistanceDisplay::from_meters(i.distance_to_maneuver_m));

            Projection {
                state: NavigationUiState {
                    instruction,
                    distance_to_maneuver,
                    progress: snapshot.progress.map(ProgressSummary::from),
                    stale: snapshot.status == NavigationStatus::Recalculating,
                    ..base
                },
                instruction_changed,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nav_engine::{GeoPoint, ManeuverKind};

    fn location(timestamp_ms: u64) -> UserLocation {
        UserLocation {
            coordinate: GeoPoint::new(52.52, 13.405),
            course_degrees: Some(45.0),
            speed_mps: Some(12.0),
            horizontal_accuracy_m: 4.0,
            timestamp_ms,
        }
    }

    fn instruction(step_index: usize, text: &str) -> VisualInstruction {
        VisualInstruction {
            step_index,
            primary_text: text.to_string(),
            maneuver: ManeuverKind::Left,
            distance_to_maneuver_m: 200.0,
        }
    }

    fn snapshot(
        timestamp_ms: u64,
        status: NavigationStatus,
        instruction: Option<VisualInstruction>,
    ) -> EngineSnapshot {
        EngineSnapshot {
            timestamp_ms,
            location: Some(location(timestamp_ms)),
            route: Some(RouteHandle::new("r1", vec![GeoPoint::new(52.52, 13.405)])),
            progress: Some(RouteProgress {
                distance_remaining_m: 1500.0,
                duration_remaining_s: 300.0,
                fraction_traveled: 0.25,
            }),
            instruction,
            status,
        }
    }

    #[test]
    fn test_distance_display_rounding() {
        assert_eq!(
            DistanceDisplay::from_meters(8.0),
            DistanceDisplay { value: 10.0, unit: DistanceUnit::Meters }
        );
        assert_eq!(
            DistanceDisplay::from_meters(243.0),
            DistanceDisplay { value: 250.0, unit: DistanceUnit::Meters }
        );
        assert_eq!(
            DistanceDisplay::from_meters(1240.0),
            DistanceDisplay { value: 1.2, unit: DistanceUnit::Kilometers }
        );
        assert_eq!(DistanceDisplay::from_meters(243.0).to_string(), "250 m");
        assert_eq!(DistanceDisplay::from_meters(1240.0).to_string(), "1.2 km");
    }

    #[test]
    fn test_instruction_persists_between_maneuvers() {
        let mut memory = ProjectionMemory::new();

        let first = project(
            &snapshot(100, NavigationStatus::Navigating, Some(instruction(0, "Turn left"))),
            &mut memory,
        );
        assert!(first.instruction_changed);
        assert_eq!(first.state.instruction.as_ref().unwrap().step_index, 0);

        // No instruction between maneuvers: the previous one stays up.
        let second = project(&snapshot(200, NavigationStatus::Navigating, None), &mut memory);
        assert!(!second.instruction_changed);
        assert_eq!(second.state.instruction.as_ref().unwrap().step_index, 0);
        assert!(!second.state.stale);
    }

    #[test]
    fn test_projection_is_idempotent() {
        let snap = snapshot(100, NavigationStatus::Navigating, Some(instruction(2, "Turn left")));

        let mut memory = ProjectionMemory::new();
        let first = project(&snap, &mut memory);
        let second = project(&snap, &mut memory);

        assert_eq!(first.state, second.state);
        // The change flag fires once, outside the state value.
        assert!(first.instruction_changed);
        assert!(!second.instruction_changed);
    }

    #[test]
    fn test_recalculating_marks_instruction_stale() {
        // Scenario: navigating@A, navigating@A, recalculating@A, navigating@B
        let mut memory = ProjectionMemory::new();
        let a = instruction(1, "Turn left");
        let b = instruction(2, "Turn right");

        let s1 = project(&snapshot(100, NavigationStatus::Navigating, Some(a.clone())), &mut memory);
        let s2 = project(&snapshot(200, NavigationStatus::Navigating, Some(a.clone())), &mut memory);
        let s3 = project(&snapshot(300, NavigationStatus::Recalculating, Some(a)), &mut memory);
        let s4 = project(&snapshot(400, NavigationStatus::Navigating, Some(b)), &mut memory);

        assert_eq!(s1.state.instruction.as_ref().unwrap().step_index, 1);
        assert!(!s1.state.stale);
        assert!(s1.instruction_changed);

        assert_eq!(s2.state.instruction.as_ref().unwrap().step_index, 1);
        assert!(!s2.instruction_changed);

        assert_eq!(s3.state.instruction.as_ref().unwrap().step_index, 1);
        assert!(s3.state.stale);

        assert_eq!(s4.state.instruction.as_ref().unwrap().step_index, 2);
        assert!(!s4.state.stale);
        assert!(s4.instruction_changed);
    }

    #[test]
    fn test_arrival_clears_instruction_and_latches() {
        let mut memory = ProjectionMemory::new();
        project(
            &snapshot(100, NavigationStatus::Navigating, Some(instruction(0, "Go"))),
            &mut memory,
        );

        let arrived = project(&snapshot(200, NavigationStatus::Arrived, None), &mut memory);
        assert!(arrived.state.arrived);
        assert!(arrived.state.instruction.is_none());

        // A late navigating tick on the same route cannot un-arrive.
        let late = project(
            &snapshot(300, NavigationStatus::Navigating, Some(instruction(1, "Ghost"))),
            &mut memory,
        );
        assert!(late.state.arrived);
        assert_eq!(late.state.status, NavigationStatus::Arrived);
        assert!(late.state.instruction.is_none());
    }

    #[test]
    fn test_new_route_resets_arrival_latch() {
        let mut memory = ProjectionMemory::new();
        project(&snapshot(100, NavigationStatus::Arrived, None), &mut memory);

        let mut snap = snapshot(200, NavigationStatus::Navigating, Some(instruction(0, "Depart")));
        snap.route = Some(RouteHandle::new("r2", vec![GeoPoint::new(52.0, 13.0)]));

        let fresh = project(&snap, &mut memory);
        assert!(!fresh.state.arrived);
        assert_eq!(fresh.state.status, NavigationStatus::Navigating);
        assert!(fresh.instruction_changed);
    }

    #[test]
    fn test_error_renders_explicit_error_state() {
        let mut memory = ProjectionMemory::new();
        project(
            &snapshot(100, NavigationStatus::Navigating, Some(instruction(0, "Go"))),
            &mut memory,
        );

        let error = project(&snapshot(200, NavigationStatus::Error, None), &mut memory);
        assert_eq!(error.state.status, NavigationStatus::Error);
        assert!(error.state.instruction.is_none());
        // Location is carried for map placement.
        assert!(error.state.location.is_some());
    }

    #[test]
    fn test_idle_state_is_empty() {
        let mut memory = ProjectionMemory::new();
        let mut snap = snapshot(100, NavigationStatus::Idle, None);
        snap.route = None;
        snap.progress = None;

        let idle = project(&snap, &mut memory);
        assert_eq!(idle.state.status, NavigationStatus::Idle);
        assert!(idle.state.instruction.is_none());
        assert!(idle.state.progress.is_none());
        assert!(!idle.state.arrived);
    }

    #[test]
    fn test_progress_summary() {
        let summary = ProgressSummary::from(RouteProgress {
            distance_remaining_m: 1240.0,
            duration_remaining_s: 178.0,
            fraction_traveled: 0.4,
        });
        assert_eq!(summary.distance_remaining.to_string(), "1.2 km");
        assert_eq!(summary.duration_remaining_min, 3);
        assert!((summary.fraction_traveled - 0.4).abs() < f64::EPSILON);
    }
}
