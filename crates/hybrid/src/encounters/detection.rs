//! Encounter detection by interpolating separations across a drift
//!
//! A drift can carry two bodies through each other and out again, so the
//! endpoint distances alone are not enough. The squared separation is
//! interpolated with a cubic Hermite polynomial built from its values and
//! time derivatives at both ends of the interval.

use nalgebra::{Point3, Vector3};

use crate::body::Body;
use crate::encounters::EncounterSet;
use crate::forces::changeover::pair_critical_radius;
use crate::forces::G;
use crate::state::SystemState;

/// Minimum of an interpolated squared separation over an interval
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Approach {
    /// Smallest squared separation found (AU²)
    pub distance_squared: f64,
    /// Offset of that minimum from the start of the interval (years)
    pub time: f64,
    /// The bodies were closing at the start and separating at the end
    pub passed_minimum: bool,
}

impl Approach {
    pub fn distance(&self) -> f64 {
        self.distance_squared.sqrt()
    }
}

/// Minimum of `d²(t)` over an interval of length `h`
///
/// # Arguments
///
/// * `d0`, `d1` - Squared separation at the start and end
/// * `d0t`, `d1t` - Time derivative of the squared separation at each end
/// * `h` - Interval length in years (may be negative)
///
/// # Examples
///
/// ```
/// use hybrid::encounters::minimum_separation;
///
/// // Straight-line pass: x(t) = -1 + 2t, y = 0.1, over t in [0, 1]
/// let approach = minimum_separation(1.01, 1.01, -4.0, 4.0, 1.0);
/// assert!(approach.passed_minimum);
/// assert!((approach.distance_squared - 0.01).abs() < 1e-12);
/// assert!((approach.time - 0.5).abs() < 1e-12);
/// ```
pub fn minimum_separation(d0: f64, d1: f64, d0t: f64, d1t: f64, h: f64) -> Approach {
    let closing = h * d0t < 0.0;
    let opening = h * d1t >= 0.0;

    if !(closing && h * d1t > 0.0) {
        let (distance_squared, time) = if d0 <= d1 { (d0, 0.0) } else { (d1, h) };
        return Approach {
            distance_squared,
            time,
            passed_minimum: closing && opening,
        };
    }

    // f'(s) = a s² + b s + c on s ∈ [0, 1], with f'(0) < 0 < f'(1)
    let a = 6.0 * (d0 - d1) + 3.0 * h * (d0t + d1t);
    let b = -6.0 * (d0 - d1) - 2.0 * h * (2.0 * d0t + d1t);
    let c = h * d0t;

    let s = if a == 0.0 {
        -c / b
    } else {
        let disc = (b * b - 4.0 * a * c).max(0.0).sqrt();
        let q = -0.5 * (b + b.signum() * disc);
        let first = q / a;
        let second = if q != 0.0 { c / q } else { first };
        [first, second]
            .into_iter()
            .filter(|s| (0.0..=1.0).contains(s))
            .fold(f64::NAN, f64::min)
    };
    let s = if s.is_finite() { s.clamp(0.0, 1.0) } else { 0.5 };

    let s2 = s * s;
    let s3 = s2 * s;
    let interpolated = (2.0 * s3 - 3.0 * s2 + 1.0) * d0
        + (s3 - 2.0 * s2 + s) * h * d0t
        + (-2.0 * s3 + 3.0 * s2) * d1
        + (s3 - s2) * h * d1t;

    Approach {
        distance_squared: interpolated.min(d0).min(d1).max(0.0),
        time: s * h,
        passed_minimum: true,
    }
}

fn approach_from(
    dx0: Vector3<f64>,
    dv0: Vector3<f64>,
    dx1: Vector3<f64>,
    dv1: Vector3<f64>,
    h: f64,
) -> Approach {
    minimum_separation(
        dx0.norm_squared(),
        dx1.norm_squared(),
        2.0 * dx0.dot(&dv0),
        2.0 * dx1.dot(&dv1),
        h,
    )
}

/// Position and velocity of a body at offset `tau` into an interval of
/// length `h`, from cubic Hermite interpolation between two snapshots
///
/// # Examples
///
/// ```
/// use hybrid::body::{Body, BodyId};
/// use hybrid::encounters::interpolate_state;
/// use nalgebra::{Point3, Vector3};
///
/// let v = Vector3::new(2.0, 0.0, 0.0);
/// let before = Body::new(BodyId(1), 0.0, 0.0, Point3::new(-1.0, 0.0, 0.0), v);
/// let after = Body::new(BodyId(1), 0.0, 0.0, Point3::new(1.0, 0.0, 0.0), v);
///
/// let (x, u) = interpolate_state(&before, &after, 1.0, 0.25);
/// assert!((x.x + 0.5).abs() < 1e-12);
/// assert!((u - v).norm() < 1e-12);
/// ```
pub fn interpolate_state(
    before: &Body,
    after: &Body,
    h: f64,
    tau: f64,
) -> (Point3<f64>, Vector3<f64>) {
    if h == 0.0 {
        return (after.position, after.velocity);
    }
    let s = tau / h;
    let s2 = s * s;
    let s3 = s2 * s;
    let (x0, x1) = (before.position.coords, after.position.coords);
    let (v0, v1) = (before.velocity * h, after.velocity * h);

    let x = x0 * (2.0 * s3 - 3.0 * s2 + 1.0)
        + v0 * (s3 - 2.0 * s2 + s)
        + x1 * (3.0 * s2 - 2.0 * s3)
        + v1 * (s3 - s2);
    let v = (x0 - x1) * (6.0 * (s2 - s))
        + v0 * (3.0 * s2 - 4.0 * s + 1.0)
        + v1 * (3.0 * s2 - 2.0 * s);

    (x.into(), v / h)
}

/// Closest approach of two bodies between two snapshots `h` apart
pub fn pair_approach(a0: &Body, b0: &Body, a1: &Body, b1: &Body, h: f64) -> Approach {
    approach_from(
        b0.position - a0.position,
        b0.velocity - a0.velocity,
        b1.position - a1.position,
        b1.velocity - a1.velocity,
        h,
    )
}

/// Closest approach of a body to the central body between two snapshots
pub fn central_approach(before: &Body, after: &Body, h: f64) -> Approach {
    approach_from(
        before.position.coords,
        before.velocity,
        after.position.coords,
        after.velocity,
        h,
    )
}

/// Finds the bodies that need the encounter integrator for one step
pub trait EncounterDetector: Send + Sync {
    /// # Arguments
    ///
    /// * `pre` - Bodies before the Kepler drift
    /// * `post` - The same bodies after the drift
    /// * `nbig` - One past the last big body
    /// * `h` - Drift interval in years
    /// * `central_radius` - Radius of the central body; zero disables
    ///   central approach checks
    /// * `out` - Cleared and filled with the flagged pairs and bodies
    fn detect(
        &self,
        pre: &[Body],
        post: &[Body],
        nbig: usize,
        h: f64,
        central_radius: f64,
        out: &mut EncounterSet,
    );
}

/// Detector based on Hermite interpolation of squared separations
///
/// Flags every pair with a big member whose interpolated minimum falls
/// inside the larger of the two critical radii.
#[derive(Debug, Clone, Copy, Default)]
pub struct InterpolatingDetector;

impl EncounterDetector for InterpolatingDetector {
    fn detect(
        &self,
        pre: &[Body],
        post: &[Body],
        nbig: usize,
        h: f64,
        central_radius: f64,
        out: &mut EncounterSet,
    ) {
        out.clear();
        let n = post.len();

        for i in 1..nbig.min(n) {
            if !post[i].is_alive() {
                continue;
            }
            for j in (i + 1)..n {
                if !post[j].is_alive() {
                    continue;
                }
                let rc = pair_critical_radius(&post[i], &post[j]);
                if rc <= 0.0 {
                    continue;
                }
                let approach = pair_approach(&pre[i], &pre[j], &post[i], &post[j], h);
                if approach.distance_squared <= rc * rc {
                    out.insert_pair(i, j);
                }
            }
        }

        if central_radius > 0.0 {
            let limit = central_radius * central_radius;
            for k in 1..n {
                if post[k].is_alive()
                    && central_approach(&pre[k], &post[k], h).distance_squared <= limit
                {
                    out.insert_central(k);
                }
            }
        }
    }
}

/// Compute Hill radius for a body orbiting the central body
///
/// # Arguments
///
/// * `mass` - Body mass in solar masses
/// * `orbital_radius` - Orbital radius (or semi-major axis) in AU
/// * `central_mass` - Central mass in solar masses
///
/// # Returns
///
/// Hill radius in AU
///
/// # Examples
///
/// ```
/// use hybrid::encounters::hill_radius;
///
/// // Earth's Hill radius at 1 AU
/// let r_hill = hill_radius(3.0e-6, 1.0, 1.0);
/// assert!((r_hill - 0.01).abs() < 0.001);
/// ```
pub fn hill_radius(mass: f64, orbital_radius: f64, central_mass: f64) -> f64 {
    orbital_radius * (mass / (3.0 * central_mass)).cbrt()
}

/// Changeover radius of a body: `factor` Hill radii
///
/// Uses the osculating semi-major axis for bound orbits and the current
/// distance otherwise.
pub fn critical_radius(body: &Body, central_mass: f64, factor: f64) -> f64 {
    let r = body.position.coords.norm();
    let mu = G * (central_mass + body.mass);
    let inverse_a = 2.0 / r - body.velocity.norm_squared() / mu;
    let scale = if inverse_a > 0.0 { 1.0 / inverse_a } else { r };
    factor * hill_radius(body.mass, scale, central_mass)
}

/// Sets `critical_radius` on every orbiting body of the system
pub fn assign_critical_radii(state: &mut SystemState, factor: f64) {
    let m0 = state.central_mass();
    state
        .bodies
        .iter_mut()
        .skip(1)
        .for_each(|b| b.critical_radius = critical_radius(b, m0, factor));
}
