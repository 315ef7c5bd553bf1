//! Instruction banner view model
//!
//! Derives what the banner should show from a [`NavigationUiState`] value.
//! Text here is neutral placeholder copy; localization happens outside this
//! layer.

use nav_engine::{ManeuverKind, NavigationStatus};
use nav_state::{DistanceDisplay, NavigationUiState};
use serde::{Deserialize, Serialize};

/// What kind of content the banner is showing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BannerKind {
    /// A maneuver instruction
    Instruction,
    /// Arrival confirmation
    Arrival,
    /// Engine failure notice
    Error,
}

/// Render-ready banner content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstructionBanner {
    /// Content kind
    pub kind: BannerKind,
    /// Primary text line
    pub primary_text: String,
    /// Maneuver icon to show, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maneuver: Option<ManeuverKind>,
    /// Distance to the maneuver, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance: Option<DistanceDisplay>,
    /// Dim the banner (instruction held over a recalculation)
    pub dimmed: bool,
}

impl InstructionBanner {
    /// Derive the banner for a UI state
    ///
    /// Returns `None` when nothing should be shown (idle, or navigating
    /// before the first instruction).
    pub fn from_state(ui: &NavigationUiState) -> Option<Self> {
        match ui.status {
            NavigationStatus::Error => Some(Self {
                kind: BannerKind::Error,
                primary_text: "Navigation unavailable".to_string(),
                maneuver: None,
                distance: None,
                dimmed: false,
            }),
            NavigationStatus::Arrived => Some(Self {
                kind: BannerKind::Arrival,
                primary_text: "You have arrived".to_string(),
                maneuver: Some(ManeuverKind::Arrive),
                distance: None,
                dimmed: false,
            }),
            NavigationStatus::Navigating | NavigationStatus::Recalculating => {
                ui.instruction.as_ref().map(|instruction| Self {
                    kind: BannerKind::Instruction,
                    primary_text: instruction.primary_text.clone(),
                    maneuver: Some(instruction.maneuver),
                    distance: ui.distance_to_maneuver,
                    dimmed: ui.stale,
                })
            }
            NavigationStatus::Idle => None,
        }
    }
}
