//! Engine boundary errors

use thiserror::Error;

/// Errors that can occur at the navigation engine boundary
#[derive(Debug, Error)]
pub enum EngineError {
    /// The engine rejected the supplied route
    #[error("Route rejected: {0}")]
    RouteRejected(String),

    /// The engine lost its location source
    #[error("Location unavailable: {0}")]
    LocationUnavailable(String),

    /// The engine failed in a way it cannot recover from
    ///
    /// The adapter translates this into a terminal `Error` snapshot; it is
    /// never propagated past the projection boundary as an `Err`.
    #[error("Fatal engine failure: {0}")]
    Fatal(String),

    /// The engine's update stream closed unexpectedly
    #[error("Engine update stream closed")]
    StreamClosed,

    /// No route is active for the requested operation
    #[error("No active route")]
    NoActiveRoute,
}

/// Result type for engine boundary operations
pub type Result<T> = std::result::Result<T, EngineError>;
