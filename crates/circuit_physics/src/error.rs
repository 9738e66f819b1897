//! Error types for the physics system

use thiserror::Error;

/// Physics system errors
#[derive(Debug, Error)]
pub enum PhysicsError {
    /// The simulation could not be brought up
    #[error("Physics initialization failed: {0}")]
    InitializationFailed(String),

    /// Operation requires an initialized world
    #[error("Physics world is not initialized")]
    NotInitialized,

    /// Rigid body not found
    #[error("Rigid body not found: {0:?}")]
    BodyNotFound(crate::body::RigidBodyHandle),

    /// Collider not found
    #[error("Collider not found: {0:?}")]
    ColliderNotFound(crate::collider::ColliderHandle),
}

/// Result type for physics operations
pub type Result<T> = std::result::Result<T, PhysicsError>;
