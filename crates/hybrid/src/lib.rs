//! Hybrid symplectic N-body integration
//!
//! Bodies orbit a dominant central body. Away from close encounters each
//! step is a symplectic splitting of the democratic heliocentric
//! Hamiltonian; pairs that come within their critical radii are handed to
//! an adaptive Bulirsch–Stoer integrator for the same interval.
//!
//! Units: AU, years and solar masses.

pub mod body;
pub mod collisions;
pub mod config;
pub mod coordinates;
pub mod encounters;
pub mod error;
pub mod forces;
pub mod integrator;
pub mod kepler;
pub mod state;

#[cfg(test)]
mod body_test;
#[cfg(test)]
mod integrator_test;

pub use body::{Body, BodyId, NonGravParams, Status};
pub use config::HybridConfig;
pub use error::{HybridError, HybridResult};
pub use integrator::{HybridIntegrator, IntegrationReport, StepOutcome};
pub use state::{ConservationLedger, Continuity, Frame, StepState, SystemState};
