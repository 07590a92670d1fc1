//! Cometary outgassing forces (Marsden, Sekanina & Yeomans 1973)
//!
//! `a = g(r) · (A1 r̂ + A2 t̂ + A3 n̂)` with radial `r̂`, orbit normal
//! `n̂ = (x × v)/|x × v|` and transverse `t̂ = n̂ × r̂`.

use nalgebra::Vector3;

use crate::body::{Body, NonGravParams};

/// Scale distance `r₀` of the water-ice sublimation law (AU)
pub const REFERENCE_DISTANCE: f64 = 2.808;

const NORMALIZATION: f64 = 0.1112620426;
const EXPONENT_M: f64 = 2.15;
const EXPONENT_N: f64 = 5.093;
const EXPONENT_K: f64 = 4.6142;

/// Sublimation scaling `g(r)`, equal to 1 at 1 AU
pub fn marsden_g(r: f64) -> f64 {
    let x = r / REFERENCE_DISTANCE;
    NORMALIZATION * x.powf(-EXPONENT_M) * (1.0 + x.powf(EXPONENT_N)).powf(-EXPONENT_K)
}

/// Non-gravitational acceleration of one body
pub fn acceleration(
    params: &NonGravParams,
    position: &Vector3<f64>,
    velocity: &Vector3<f64>,
) -> Vector3<f64> {
    let r = position.norm();
    let h = position.cross(velocity);
    let hn = h.norm();
    if r == 0.0 {
        return Vector3::zeros();
    }
    let radial = position / r;
    if hn == 0.0 {
        // Purely radial motion leaves the transverse axes undefined
        return radial * (params.a1 * marsden_g(r));
    }
    let normal = h / hn;
    let transverse = normal.cross(&radial);

    (radial * params.a1 + transverse * params.a2 + normal * params.a3) * marsden_g(r)
}

/// Writes the non-gravitational acceleration of each body into `out`
///
/// Bodies without parameters, removed bodies and the central body get zero.
pub fn non_grav_accelerations(bodies: &[Body], out: &mut [Vector3<f64>]) {
    for (i, (body, a)) in bodies.iter().zip(out.iter_mut()).enumerate() {
        *a = match (&body.non_grav, i > 0 && body.is_alive()) {
            (Some(params), true) => acceleration(params, &body.position.coords, &body.velocity),
            _ => Vector3::zeros(),
        };
    }
}
