use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BodyId(pub u32);

/// Whether a body still takes part in the integration
///
/// Anything other than `Alive` is a removal code. Removed bodies keep their
/// slot until the caller compacts the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    Alive,
    /// Absorbed by another body in a collision
    Merged { into: BodyId },
    /// Fell into the central body
    HitCentral,
    Ejected,
}

impl Status {
    pub fn is_alive(&self) -> bool {
        matches!(self, Status::Alive)
    }
}

/// Coefficients of the cometary non-gravitational force
///
/// Radial, transverse and normal components in AU/year² at 1 AU from
/// the central body (Marsden model).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct NonGravParams {
    pub a1: f64,
    pub a2: f64,
    pub a3: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Body {
    pub id: BodyId,
    pub mass: f64,                 // Solar masses
    pub position: Point3<f64>,     // AU, relative to the central body
    pub velocity: Vector3<f64>,    // AU/year, frame set by SystemState::frame
    pub spin: Vector3<f64>,        // M☉ AU² / year
    pub radius: f64,               // AU (physical radius for collisions)
    pub critical_radius: f64,      // AU (changeover scale)
    pub status: Status,
    pub non_grav: Option<NonGravParams>,
}

impl Body {
    /// Creates an alive body with no spin, no critical radius and no
    /// non-gravitational parameters
    ///
    /// # Examples
    ///
    /// ```
    /// use hybrid::body::{Body, BodyId};
    /// use nalgebra::{Point3, Vector3};
    ///
    /// let earth = Body::new(
    ///     BodyId(1),
    ///     3.0e-6,
    ///     4.26e-5,
    ///     Point3::new(1.0, 0.0, 0.0),
    ///     Vector3::new(0.0, 6.28, 0.0),
    /// )
    /// .with_critical_radius(0.03);
    ///
    /// assert!(earth.is_alive());
    /// assert_eq!(earth.critical_radius, 0.03);
    /// ```
    pub fn new(
        id: BodyId,
        mass: f64,
        radius: f64,
        position: Point3<f64>,
        velocity: Vector3<f64>,
    ) -> Self {
        Body {
            id,
            mass,
            position,
            velocity,
            spin: Vector3::zeros(),
            radius,
            critical_radius: 0.0,
            status: Status::Alive,
            non_grav: None,
        }
    }

    pub fn with_critical_radius(mut self, critical_radius: f64) -> Self {
        self.critical_radius = critical_radius;
        self
    }

    pub fn with_spin(mut self, spin: Vector3<f64>) -> Self {
        self.spin = spin;
        self
    }

    pub fn with_non_grav(mut self, params: NonGravParams) -> Self {
        self.non_grav = Some(params);
        self
    }

    pub fn is_alive(&self) -> bool {
        self.status.is_alive()
    }

    /// Linear momentum (M☉ AU/year)
    pub fn momentum(&self) -> Vector3<f64> {
        self.velocity * self.mass
    }

    /// Orbital angular momentum about the central body (M☉ AU²/year)
    pub fn orbital_angular_momentum(&self) -> Vector3<f64> {
        self.position.coords.cross(&self.velocity) * self.mass
    }

    pub fn kinetic_energy(&self) -> f64 {
        0.5 * self.mass * self.velocity.norm_squared()
    }

    /// True when position, velocity, spin and mass are all finite
    pub fn is_finite(&self) -> bool {
        self.mass.is_finite()
            && self.position.iter().all(|c| c.is_finite())
            && self.velocity.iter().all(|c| c.is_finite())
            && self.spin.iter().all(|c| c.is_finite())
    }
}
