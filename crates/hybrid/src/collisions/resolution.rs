//! Collision resolution through momentum-conserving mergers
//!
//! When bodies collide, they merge into a single body that conserves:
//! - Total mass
//! - Total momentum
//! - Total angular momentum (orbital plus spin)
//! - Volume (assuming constant density)

use crate::body::Body;
use crate::forces::G;

/// Outcome of a collision
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Merger {
    /// Combined body; keeps the survivor's identity
    pub merged: Body,
    pub energy_lost: f64,
    pub angular_momentum_lost: f64,
}

/// Turns two touching bodies into one
pub trait CollisionResolver: Send + Sync {
    /// Merges `b` into `a`
    ///
    /// # Arguments
    ///
    /// * `a` - Surviving body
    /// * `b` - Absorbed body
    /// * `impact_time` - Time of impact from the start of the step (years)
    fn resolve_collision(&self, a: &Body, b: &Body, impact_time: f64) -> Merger;

    /// Absorbs `body` into the central body
    fn absorb_into_central(&self, central: &Body, body: &Body, _impact_time: f64) -> Merger {
        absorb_into_central(central, body)
    }
}

/// Perfect inelastic merging at the current state
#[derive(Debug, Clone, Copy, Default)]
pub struct MergeResolver;

impl CollisionResolver for MergeResolver {
    fn resolve_collision(&self, a: &Body, b: &Body, _impact_time: f64) -> Merger {
        merge_bodies(a, b)
    }
}

/// Merge two bodies, conserving mass, momentum and angular momentum
///
/// The merged body sits at the centre of mass with the centre-of-mass
/// velocity. The orbital angular momentum of the relative motion,
/// `μ Δx × Δv` with reduced mass `μ`, is added to the spin. The radius
/// follows from constant density: r = (r_a³ + r_b³)^(1/3).
///
/// # Arguments
///
/// * `a` - Surviving body (its id and non-gravitational parameters are kept)
/// * `b` - Absorbed body
///
/// # Returns
///
/// The merged body with the energy and angular momentum removed from the
/// orbital motion
///
/// # Examples
///
/// ```
/// use hybrid::body::{Body, BodyId};
/// use hybrid::collisions::merge_bodies;
/// use nalgebra::{Point3, Vector3};
///
/// let a = Body::new(BodyId(1), 1e-6, 1e-4, Point3::new(1.0, 0.0, 0.0), Vector3::y() * 5.0);
/// let b = Body::new(BodyId(2), 2e-6, 1e-4, Point3::new(1.0001, 0.0, 0.0), Vector3::y() * 3.0);
///
/// let merger = merge_bodies(&a, &b);
///
/// assert_eq!(merger.merged.id, BodyId(1));
/// assert!((merger.merged.mass - 3e-6).abs() < 1e-20);
///
/// let p_initial = a.momentum() + b.momentum();
/// assert!((merger.merged.momentum() - p_initial).norm() < 1e-18);
/// ```
pub fn merge_bodies(a: &Body, b: &Body) -> Merger {
    let total_mass = a.mass + b.mass;
    let reduced = if total_mass > 0.0 {
        a.mass * b.mass / total_mass
    } else {
        0.0
    };

    let dx = b.position - a.position;
    let dv = b.velocity - a.velocity;
    let relative_l = dx.cross(&dv) * reduced;

    let (position, velocity) = if total_mass > 0.0 {
        (
            (a.position.coords * a.mass + b.position.coords * b.mass) / total_mass,
            (a.momentum() + b.momentum()) / total_mass,
        )
    } else {
        (a.position.coords, a.velocity)
    };

    let separation = dx.norm();
    let potential = if separation > 0.0 {
        G * a.mass * b.mass / separation
    } else {
        0.0
    };

    let merged = Body {
        mass: total_mass,
        position: position.into(),
        velocity,
        spin: a.spin + b.spin + relative_l,
        radius: (a.radius.powi(3) + b.radius.powi(3)).cbrt(),
        critical_radius: a.critical_radius.max(b.critical_radius),
        ..*a
    };

    Merger {
        merged,
        energy_lost: 0.5 * reduced * dv.norm_squared() - potential,
        angular_momentum_lost: relative_l.norm(),
    }
}

/// Absorb an orbiting body into the central body
///
/// The central body stays at the origin with no stored velocity. It gains
/// the body's mass, its spin and its full orbital angular momentum
/// `m x × v`, so the total angular momentum of the system is unchanged.
///
/// # Returns
///
/// The updated central body, with the body's kinetic and central
/// potential energy as the energy lost
pub fn absorb_into_central(central: &Body, body: &Body) -> Merger {
    let orbital_l = body.orbital_angular_momentum();
    let r = body.position.coords.norm();
    let potential = if r > 0.0 {
        G * central.mass * body.mass / r
    } else {
        0.0
    };

    let merged = Body {
        mass: central.mass + body.mass,
        spin: central.spin + body.spin + orbital_l,
        ..*central
    };

    Merger {
        merged,
        energy_lost: body.kinetic_energy() - potential,
        angular_momentum_lost: orbital_l.norm(),
    }
}
