//! Force laws for hybrid integration
//!
//! The interaction Hamiltonian is split between two strategies selected by
//! the integrator: `DirectForce` weights every pair by the changeover
//! function and drives the kicks, while `ComplementaryForce` supplies the
//! remainder of the flagged pairs plus the central attraction inside the
//! encounter sub-integrator. Together they add up to plain Newtonian
//! gravity.

use nalgebra::Vector3;

use crate::body::Body;

pub mod changeover;
pub mod complementary;
pub mod direct;
pub mod non_grav;
pub mod oblateness;

#[cfg(test)]
mod changeover_test;
#[cfg(test)]
mod oblateness_test;

pub use changeover::{changeover, complementary_weight, direct_weight};
pub use complementary::ComplementaryForce;
pub use direct::DirectForce;
pub use non_grav::non_grav_accelerations;
pub use oblateness::Oblateness;

/// Gravitational constant in AU³ M☉⁻¹ year⁻²
/// G = 4π² ≈ 39.478417
pub const G: f64 = 4.0 * std::f64::consts::PI * std::f64::consts::PI;

/// A gravitational force law over an ordered body slice
///
/// `bodies[0]` is the central body, `1..nbig` are big bodies and the rest
/// are small. Implementations overwrite `out` (same length as `bodies`)
/// and leave the central and removed entries at zero.
pub trait ForceLaw {
    fn accelerations(&self, bodies: &[Body], nbig: usize, out: &mut [Vector3<f64>]);
}

/// User-supplied accelerations added to every kick
///
/// Evaluated at the start of an integration and at the end of each step,
/// like the interaction term.
///
/// # Examples
///
/// ```
/// use hybrid::body::Body;
/// use hybrid::forces::ExternalForce;
/// use nalgebra::Vector3;
///
/// /// Constant push along +z on every orbiting body
/// struct Tilt(f64);
///
/// impl ExternalForce for Tilt {
///     fn accelerations(&self, _time: f64, bodies: &[Body], out: &mut [Vector3<f64>]) {
///         for (body, a) in bodies.iter().zip(out.iter_mut()).skip(1) {
///             *a = if body.is_alive() { Vector3::z() * self.0 } else { Vector3::zeros() };
///         }
///     }
/// }
/// ```
pub trait ExternalForce: Send + Sync {
    fn accelerations(&self, time: f64, bodies: &[Body], out: &mut [Vector3<f64>]);
}

/// Adds the Newtonian attraction between `bodies[i]` and `bodies[j]`
/// scaled by `weight`
#[inline]
pub(crate) fn add_pair(
    bodies: &[Body],
    i: usize,
    j: usize,
    s2: f64,
    dx: Vector3<f64>,
    weight: f64,
    out: &mut [Vector3<f64>],
) {
    debug_assert!(s2 > 0.0, "coincident bodies {} and {}", i, j);
    let factor = G * weight / (s2 * s2.sqrt());
    out[i] += dx * (factor * bodies[j].mass);
    out[j] -= dx * (factor * bodies[i].mass);
}
