//! Zonal harmonics of an oblate central body
//!
//! The central body is axisymmetric about the z axis with gravity
//! coefficients J2, J4 and J6 normalized to its radius `R`. Positions are
//! relative to the central body, which itself accelerates in response;
//! that reaction is removed from every orbiting body so the result stays
//! in the central-body frame.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::body::Body;
use crate::forces::G;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Oblateness {
    pub j2: f64,
    pub j4: f64,
    pub j6: f64,
}

impl Oblateness {
    pub fn new(j2: f64, j4: f64, j6: f64) -> Self {
        Self { j2, j4, j6 }
    }

    pub fn is_zero(&self) -> bool {
        self.j2 == 0.0 && self.j4 == 0.0 && self.j6 == 0.0
    }

    pub fn is_finite(&self) -> bool {
        self.j2.is_finite() && self.j4.is_finite() && self.j6.is_finite()
    }

    /// Acceleration of one body at `position` due to the harmonics
    ///
    /// # Arguments
    ///
    /// * `gm0` - G times the central mass
    /// * `radius` - Central body radius the coefficients refer to (AU)
    /// * `position` - Position relative to the central body (AU)
    pub fn acceleration(&self, gm0: f64, radius: f64, position: &Vector3<f64>) -> Vector3<f64> {
        let r2 = position.norm_squared();
        let r_2 = 1.0 / r2;
        let r_3 = r_2 / r2.sqrt();
        let rr2 = radius * radius * r_2;

        let u2 = position.z * position.z * r_2;
        let u4 = u2 * u2;
        let u6 = u4 * u2;

        let jr2 = self.j2 * rr2;
        let jr4 = self.j4 * rr2 * rr2;
        let jr6 = self.j6 * rr2 * rr2 * rr2;

        let tmp2 = jr2 * (7.5 * u2 - 1.5)
            + jr4 * (39.375 * u4 - 26.25 * u2 + 1.875)
            + jr6 * (187.6875 * u6 - 216.5625 * u4 + 59.0625 * u2 - 2.1875);
        let tmp3 = jr2 * 3.0
            + jr4 * (17.5 * u2 - 7.5)
            + jr6 * (86.625 * u4 - 78.75 * u2 + 13.125);

        let scale = gm0 * r_3;
        Vector3::new(
            position.x * tmp2 * scale,
            position.y * tmp2 * scale,
            position.z * (tmp2 - tmp3) * scale,
        )
    }

    /// Adds the harmonic accelerations, minus the central reaction, to
    /// every alive orbiting body
    ///
    /// The reaction is `−Σ mᵢ aᵢ / m₀`, shared by all bodies.
    pub fn add_accelerations(&self, bodies: &[Body], radius: f64, out: &mut [Vector3<f64>]) {
        if self.is_zero() || radius <= 0.0 {
            return;
        }
        let m0 = bodies[0].mass;
        let gm0 = G * m0;

        let mut reaction = Vector3::zeros();
        for (body, a) in bodies.iter().zip(out.iter_mut()).skip(1) {
            if !body.is_alive() {
                continue;
            }
            let accel = self.acceleration(gm0, radius, &body.position.coords);
            reaction -= accel * (body.mass / m0);
            *a += accel;
        }

        for (body, a) in bodies.iter().zip(out.iter_mut()).skip(1) {
            if body.is_alive() {
                *a -= reaction;
            }
        }
    }
}
