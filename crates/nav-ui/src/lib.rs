//! Presentation shell composition for Waymark
//!
//! Thin, pure composition of the published state pair into per-device-class
//! frames: map pose, instruction banner, and control grid. Shells hold no
//! copies of derived state; two shells fed the same
//! `NavigationUiState`/`CameraState` pair render identically modulo layout.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod banner;
pub mod shell;

pub use banner::{BannerKind, InstructionBanner};
pub use shell::{BannerPlacement, ControlGrid, DeviceClass, ShellConfig, ShellFrame, ShellLayout};
