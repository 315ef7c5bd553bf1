//! The navigation engine trait
//!
//! The engine itself (routing, map matching, progress tracking) is an
//! external collaborator. This trait is the seam Waymark talks to it
//! through; platform integrations implement it over their native SDK.

use crate::error::Result;
use crate::models::{EngineSnapshot, RouteHandle, UserLocation};
use async_trait::async_trait;
use tokio::sync::mpsc;

/// The external turn-by-turn navigation engine
///
/// Implementations push one snapshot per location update on the channel
/// returned by [`observe_state`](NavigationEngine::observe_state). A fatal
/// engine failure is delivered as an `Err` item on that same channel so the
/// adapter can translate it into a terminal error snapshot.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NavigationEngine: Send + Sync + 'static {
    /// Subscribe to engine state updates
    ///
    /// Snapshots are pushed by one producer; implementations should deliver
    /// them in non-decreasing timestamp order, though the adapter enforces
    /// this regardless.
    async fn observe_state(&self) -> Result<mpsc::Receiver<Result<EngineSnapshot>>>;

    /// Push a raw user location into the engine (fire-and-forget)
    async fn update_location(&self, location: UserLocation);

    /// Start navigating a new route
    async fn set_route(&self, route: RouteHandle) -> Result<()>;

    /// Stop navigation and release the location subscription
    async fn stop(&self) -> Result<()>;
}
