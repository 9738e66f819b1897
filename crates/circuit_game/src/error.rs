//! Game error types

use circuit_physics::PhysicsError;
use thiserror::Error;

/// Errors raised while building or running a session
#[derive(Debug, Error)]
pub enum GameError {
    /// Physics engine failure
    #[error("Physics error: {0}")]
    Physics(#[from] PhysicsError),

    /// A physics factory returned nothing because the world is not initialized
    #[error("Physics world not ready while creating {0}")]
    PhysicsNotReady(&'static str),

    /// Configuration rejected before construction
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for game operations
pub type Result<T> = std::result::Result<T, GameError>;
