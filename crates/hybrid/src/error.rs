//! Error types for hybrid integration
//!
//! Every fallible operation returns `HybridResult<T>`. A step that fails
//! is never partially applied: the orchestrator restores the entry state
//! before handing the error back.

use thiserror::Error;

use crate::state::Frame;

/// Result type alias for hybrid integration operations
pub type HybridResult<T> = Result<T, HybridError>;

/// Errors raised while stepping a system
#[derive(Debug, Clone, PartialEq, Error)]
pub enum HybridError {
    /// The two-body propagator did not converge for a body
    #[error("Kepler drift diverged for body {body} over dt = {dt:.6e}")]
    DriftDivergence {
        /// Index of the body in the system
        body: usize,
        /// Drift interval in years
        dt: f64,
    },

    /// The encounter sub-integrator needed a step below its floor
    #[error("encounter integration diverged: step {step:.6e} below minimum {min_step:.6e}")]
    EncounterDivergence {
        /// Step size that failed, in years
        step: f64,
        /// Configured minimum step, in years
        min_step: f64,
    },

    /// A NaN or infinity was produced
    #[error("non-finite value detected in {location}")]
    NonFinite {
        /// Where the value was detected
        location: String,
    },

    /// Coordinates were not in the frame an operation expects
    #[error("expected {expected:?} coordinates, found {found:?}")]
    WrongFrame {
        /// Frame required by the operation
        expected: Frame,
        /// Frame the state was in
        found: Frame,
    },

    /// Configuration rejected by validation
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Body layout or values unusable for stepping
    #[error("invalid system state: {0}")]
    InvalidState(String),
}

impl HybridError {
    pub(crate) fn non_finite(location: impl Into<String>) -> Self {
        HybridError::NonFinite {
            location: location.into(),
        }
    }
}
