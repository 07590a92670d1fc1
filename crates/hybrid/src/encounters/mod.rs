//! Close-encounter handling
//!
//! This module provides the pieces the integrator uses when bodies come
//! within their critical radii of each other:
//! - detection of flagged pairs from the pre- and post-drift states
//! - the Bulirsch–Stoer sub-integrator
//! - the resolver that re-integrates the flagged subset

use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

use crate::body::BodyId;

pub mod bulirsch_stoer;
pub mod detection;
pub mod resolver;

#[cfg(test)]
mod resolver_test;

pub use bulirsch_stoer::{BulirschStoer, SubIntegrator, SubStep};
pub use detection::{
    assign_critical_radii, critical_radius, hill_radius, interpolate_state, minimum_separation,
    Approach, EncounterDetector, InterpolatingDetector,
};
pub use resolver::{EncounterResolver, ResolverReport};

/// Bodies that need the encounter integrator during one step
///
/// Pairs are stored once with the lower index first. Bodies listed in
/// `central` dip inside the central body's radius during the drift.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EncounterSet {
    pairs: Vec<(usize, usize)>,
    central: Vec<usize>,
}

impl EncounterSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.pairs.clear();
        self.central.clear();
    }

    /// Flags a pair; returns false if it was already present or degenerate
    pub fn insert_pair(&mut self, i: usize, j: usize) -> bool {
        if i == j {
            return false;
        }
        let pair = (i.min(j), i.max(j));
        if self.pairs.contains(&pair) {
            return false;
        }
        self.pairs.push(pair);
        true
    }

    /// Flags a body approaching the central body
    pub fn insert_central(&mut self, index: usize) -> bool {
        if index == 0 || self.central.contains(&index) {
            return false;
        }
        self.central.push(index);
        true
    }

    pub fn pairs(&self) -> &[(usize, usize)] {
        &self.pairs
    }

    pub fn central(&self) -> &[usize] {
        &self.central
    }

    pub fn contains_pair(&self, i: usize, j: usize) -> bool {
        self.pairs.contains(&(i.min(j), i.max(j)))
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty() && self.central.is_empty()
    }

    /// Number of flagged pairs
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Every body index taking part, sorted and without repeats
    pub fn involved(&self) -> Vec<usize> {
        let mut indices: Vec<usize> = self
            .pairs
            .iter()
            .flat_map(|&(i, j)| [i, j])
            .chain(self.central.iter().copied())
            .collect();
        indices.sort_unstable();
        indices.dedup();
        indices
    }
}

/// Closest approach of a flagged pair inside one encounter sub-step
///
/// `states` are the two bodies' positions and velocities at `time`,
/// interpolated within the sub-step that contained the minimum;
/// `distance` is their separation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FlybyRecord {
    /// Time of closest approach, measured from the start of the step
    pub time: f64,
    pub bodies: (BodyId, BodyId),
    /// Minimum separation (AU)
    pub distance: f64,
    pub states: [(Point3<f64>, Vector3<f64>); 2],
}
