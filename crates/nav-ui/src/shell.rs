//! Shell composition
//!
//! Each shell (portrait, landscape, CarPlay/Auto) is a thin composition
//! over the same published state pair. [`ShellFrame::compose`] is a pure
//! function; shells call it with the latest values and hand the result to
//! the platform's map surface and view layer.

use crate::banner::InstructionBanner;
use nav_engine::GeoPoint;
use nav_state::{CameraPose, CameraState, InteractionRouter, NavigationUiState};
use serde::{Deserialize, Serialize};

// =============================================================================
// Configuration
// =============================================================================

/// Device class a shell renders for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceClass {
    /// Phone, portrait orientation
    Portrait,
    /// Phone/tablet, landscape orientation
    Landscape,
    /// CarPlay or Android Auto head unit
    CarPlay,
}

/// Shell configuration, passed through to the platform layer unchanged
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShellConfig {
    /// Map style URL
    pub style_url: String,
    /// Device class to lay out for
    pub device_class: DeviceClass,
    /// Camera pose before the first published state arrives
    pub initial_pose: CameraPose,
    /// Caller-supplied overlay content slot, opaque to this layer
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overlay_slot: Option<serde_json::Value>,
}

impl ShellConfig {
    /// Create a shell configuration
    pub fn new(
        style_url: impl Into<String>,
        device_class: DeviceClass,
        initial_pose: CameraPose,
    ) -> Self {
        Self {
            style_url: style_url.into(),
            device_class,
            initial_pose,
            overlay_slot: None,
        }
    }

    /// Attach caller-supplied overlay content
    pub fn with_overlay_slot(mut self, slot: serde_json::Value) -> Self {
        self.overlay_slot = Some(slot);
        self
    }
}

// =============================================================================
// Layout
// =============================================================================

/// Where the instruction banner sits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BannerPlacement {
    /// Full-width at the top (portrait)
    Top,
    /// Docked along the leading edge (landscape)
    Leading,
    /// Compact template area (CarPlay/Auto)
    Compact,
}

/// Per-device-class layout constants
///
/// Layout is the only thing allowed to differ between shells observing the
/// same state pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShellLayout {
    /// Banner placement
    pub banner_placement: BannerPlacement,
    /// Stack the control grid vertically along the trailing edge
    pub controls_trailing: bool,
}

impl ShellLayout {
    /// Layout constants for a device class
    pub fn for_device_class(device_class: DeviceClass) -> Self {
        match device_class {
            DeviceClass::Portrait => Self {
                banner_placement: BannerPlacement::Top,
                controls_trailing: true,
            },
            DeviceClass::Landscape => Self {
                banner_placement: BannerPlacement::Leading,
                controls_trailing: true,
            },
            DeviceClass::CarPlay => Self {
                banner_placement: BannerPlacement::Compact,
                controls_trailing: false,
            },
        }
    }
}

// =============================================================================
// Controls
// =============================================================================

/// Which controls the shell renders
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlGrid {
    /// Recenter button
    pub recenter: bool,
    /// Overview toggle
    pub overview_toggle: bool,
    /// Zoom-in button
    pub zoom_in: bool,
    /// Zoom-out button
    pub zoom_out: bool,
}

impl ControlGrid {
    /// Derive the control grid for one device class
    ///
    /// Visibility policy comes from the shared [`InteractionRouter`] rule so
    /// every shell agrees; the device class only masks affordances that have
    /// a physical equivalent (CarPlay's rotary knob replaces zoom buttons).
    pub fn derive(
        ui: &NavigationUiState,
        camera: &CameraState,
        device_class: DeviceClass,
    ) -> Self {
        let visibility = InteractionRouter::new().control_visibility(camera.mode, ui.status);
        let zoom = visibility.zoom && device_class != DeviceClass::CarPlay;
        Self {
            recenter: visibility.recenter,
            overview_toggle: visibility.overview_toggle,
            zoom_in: zoom,
            zoom_out: zoom,
        }
    }
}

// =============================================================================
// Frame
// =============================================================================

/// One render-ready frame for a shell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShellFrame {
    /// Map style URL, passed through from the configuration
    pub style_url: String,
    /// Camera pose to feed the map surface
    pub map_pose: CameraPose,
    /// Route polyline overlay, if a route is active
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route_overlay: Option<Vec<GeoPoint>>,
    /// Banner content, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub banner: Option<InstructionBanner>,
    /// Control grid
    pub controls: ControlGrid,
    /// Layout constants for this device class
    pub layout: ShellLayout,
    /// Caller-supplied overlay slot, passed through unchanged
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overlay_slot: Option<serde_json::Value>,
}

impl ShellFrame {
    /// Compose a frame from the published state pair
    ///
    /// Pure: the same (state pair, device class) always yields the same
    /// frame. Shells must not cache or adjust derived fields.
    pub fn compose(config: &ShellConfig, ui: &NavigationUiState, camera: &CameraState) -> Self {
        Self {
            style_url: config.style_url.clone(),
            map_pose: camera.pose,
            route_overlay: ui.route.as_ref().map(|route| route.geometry.clone()),
            banner: InstructionBanner::from_state(ui),
            controls: ControlGrid::derive(ui, camera, config.device_class),
            layout: ShellLayout::for_device_class(config.device_class),
            overlay_slot: config.overlay_slot.clone(),
        }
    }
}
