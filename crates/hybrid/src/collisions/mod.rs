//! Collision detection and resolution inside encounters
//!
//! This module provides impact checks on interpolated separations and
//! resolution through momentum-conserving mergers.

use serde::{Deserialize, Serialize};

use crate::body::BodyId;

pub mod detection;
pub mod resolution;


pub use detection::{central_impact, pair_impact};
pub use resolution::{absorb_into_central, merge_bodies, CollisionResolver, MergeResolver, Merger};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CollisionKind {
    /// Two orbiting bodies merged
    Pair,
    /// An orbiting body fell into the central body
    Central,
}

/// A collision resolved during a step
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CollisionEvent {
    /// Time of impact, measured from the start of the step (years)
    pub time: f64,
    /// Body that carries on with the combined mass
    pub survivor: BodyId,
    /// Body marked as removed
    pub absorbed: BodyId,
    pub kind: CollisionKind,
    /// Orbital energy dissipated by the merger (M☉ AU² year⁻²)
    pub energy_lost: f64,
    /// Orbital angular momentum moved into spin (M☉ AU²/year)
    pub angular_momentum_lost: f64,
}
