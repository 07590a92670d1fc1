//! Two-body propagation about the central mass
//!
//! `UniversalKepler` advances a body along its unperturbed conic in
//! universal variables, so elliptic, parabolic and hyperbolic orbits go
//! through the same code path. Kepler's equation in the universal anomaly
//! `χ` is solved with the Laguerre–Conway iteration and the state is
//! mapped through Lagrange's f and g functions.

use nalgebra::{Point3, Vector3};
use tracing::warn;

/// A propagator for the Kepler part of the Hamiltonian
pub trait KeplerPropagator: Send + Sync {
    /// Advances one body by `dt` about a central `mu = G·m₀`
    ///
    /// # Returns
    ///
    /// The new position and velocity, or `None` when the solver failed
    fn drift(
        &self,
        mu: f64,
        position: &Point3<f64>,
        velocity: &Vector3<f64>,
        dt: f64,
    ) -> Option<(Point3<f64>, Vector3<f64>)>;
}

/// Universal-variable Kepler solver
///
/// # Examples
///
/// ```
/// use hybrid::forces::G;
/// use hybrid::kepler::{KeplerPropagator, UniversalKepler};
/// use nalgebra::{Point3, Vector3};
///
/// let mu = G;
/// let x = Point3::new(1.0, 0.0, 0.0);
/// let v = Vector3::new(0.0, mu.sqrt(), 0.0);
///
/// // A circular 1 AU orbit around one solar mass takes one year
/// let (x1, v1) = UniversalKepler::default().drift(mu, &x, &v, 1.0).unwrap();
/// assert!((x1 - x).norm() < 1e-9);
/// assert!((v1 - v).norm() < 1e-9);
/// ```
#[derive(Debug, Clone)]
pub struct UniversalKepler {
    /// Iteration cap of the Laguerre–Conway solver
    pub max_iterations: usize,
    /// Relative convergence threshold on the universal anomaly
    pub tolerance: f64,
    /// Number of pieces the interval is split into after a failure
    pub fallback_substeps: usize,
}

impl Default for UniversalKepler {
    fn default() -> Self {
        Self {
            max_iterations: 50,
            tolerance: 1e-14,
            fallback_substeps: 10,
        }
    }
}

/// Stumpff functions c2(z) and c3(z)
pub(crate) fn stumpff(z: f64) -> (f64, f64) {
    if z.abs() < 1e-2 {
        // Truncation error below 1e-14 for |z| < 0.01
        let c2 = 0.5 - z / 24.0 + z * z / 720.0 - z * z * z / 40320.0;
        let c3 = 1.0 / 6.0 - z / 120.0 + z * z / 5040.0 - z * z * z / 362880.0;
        (c2, c3)
    } else if z > 0.0 {
        let s = z.sqrt();
        ((1.0 - s.cos()) / z, (s - s.sin()) / (z * s))
    } else {
        let s = (-z).sqrt();
        ((1.0 - s.cosh()) / z, (s.sinh() - s) / (-z * s))
    }
}

/// The universal functions U0..U3 at anomaly `chi`
struct Universal {
    u0: f64,
    u1: f64,
    u2: f64,
    u3: f64,
}

impl Universal {
    fn at(chi: f64, alpha: f64) -> Self {
        let z = alpha * chi * chi;
        let (c2, c3) = stumpff(z);
        Self {
            u0: 1.0 - z * c2,
            u1: chi * (1.0 - z * c3),
            u2: chi * chi * c2,
            u3: chi * chi * chi * c3,
        }
    }
}

impl UniversalKepler {
    fn solve(
        &self,
        mu: f64,
        position: &Point3<f64>,
        velocity: &Vector3<f64>,
        dt: f64,
    ) -> Option<(Point3<f64>, Vector3<f64>)> {
        let x = position.coords;
        let r0 = x.norm();
        if r0 == 0.0 || mu <= 0.0 {
            return None;
        }
        if dt == 0.0 {
            return Some((*position, *velocity));
        }

        let sqrt_mu = mu.sqrt();
        let xv = x.dot(velocity);
        let alpha = 2.0 / r0 - velocity.norm_squared() / mu;
        let sigma0 = xv / sqrt_mu;

        // Whole periods change nothing on a bound orbit
        let mut dt = dt;
        if alpha > 0.0 {
            let period = std::f64::consts::TAU / (sqrt_mu * alpha.powf(1.5));
            if dt.abs() > period {
                dt %= period;
            }
        }

        let mut chi = sqrt_mu * dt / r0;
        if alpha < 0.0 {
            let a = 1.0 / alpha;
            let arg = -2.0 * mu * alpha * dt
                / (xv + dt.signum() * (-mu * a).sqrt() * (1.0 - r0 * alpha));
            if arg > 1.0 {
                chi = dt.signum() * (-a).sqrt() * arg.ln();
            }
        }

        const ORDER: f64 = 5.0;
        let mut converged = false;
        for _ in 0..self.max_iterations {
            let u = Universal::at(chi, alpha);
            let f = u.u3 + sigma0 * u.u2 + r0 * u.u1 - sqrt_mu * dt;
            let fp = u.u2 + sigma0 * u.u1 + r0 * u.u0;
            let fpp = sigma0 * u.u0 + (1.0 - alpha * r0) * u.u1;

            let disc = ((ORDER - 1.0) * (ORDER - 1.0) * fp * fp - ORDER * (ORDER - 1.0) * f * fpp)
                .abs()
                .sqrt();
            let denom = fp + fp.signum() * disc;
            if denom == 0.0 || !denom.is_finite() {
                return None;
            }
            let delta = ORDER * f / denom;
            chi -= delta;

            if !chi.is_finite() {
                return None;
            }
            if delta.abs() <= self.tolerance * chi.abs() {
                converged = true;
                break;
            }
        }
        if !converged {
            return None;
        }

        let u = Universal::at(chi, alpha);
        let r = u.u2 + sigma0 * u.u1 + r0 * u.u0;
        if !(r.is_finite() && r > 0.0) {
            return None;
        }

        let f = 1.0 - u.u2 / r0;
        let g = dt - u.u3 / sqrt_mu;
        let fdot = -sqrt_mu * u.u1 / (r * r0);
        let gdot = 1.0 - u.u2 / r;

        let x1 = x * f + velocity * g;
        let v1 = x * fdot + velocity * gdot;
        if x1.iter().chain(v1.iter()).all(|c| c.is_finite()) {
            Some((Point3::from(x1), v1))
        } else {
            None
        }
    }
}

impl KeplerPropagator for UniversalKepler {
    fn drift(
        &self,
        mu: f64,
        position: &Point3<f64>,
        velocity: &Vector3<f64>,
        dt: f64,
    ) -> Option<(Point3<f64>, Vector3<f64>)> {
        if let Some(result) = self.solve(mu, position, velocity, dt) {
            return Some(result);
        }

        warn!(dt, substeps = self.fallback_substeps, "Kepler solve failed, retrying in pieces");
        let pieces = self.fallback_substeps.max(1);
        let piece = dt / pieces as f64;
        let mut state = (*position, *velocity);
        for _ in 0..pieces {
            state = self.solve(mu, &state.0, &state.1, piece)?;
        }
        Some(state)
    }
}
