use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

use crate::body::{Body, BodyId};
use crate::collisions::CollisionEvent;
use crate::error::{HybridError, HybridResult};
use crate::forces::G;

/// Coordinate frame of the stored velocities
///
/// Positions are always relative to the central body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Frame {
    /// Velocities relative to the central body
    Heliocentric,
    /// Velocities relative to the system barycenter
    Democratic,
}

/// How a call to `advance` relates to the previous one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Continuity {
    /// Start of a new integration
    FirstEverCall,
    /// Bodies or masses changed since the last call
    BodySetChanged,
    /// Same bodies and masses as the previous call
    Normal,
}

impl Continuity {
    /// Whether cached accelerations must be recomputed before use
    pub fn requires_refresh(self) -> bool {
        !matches!(self, Continuity::Normal)
    }
}

/// Complete state of a hierarchical system at a given time
///
/// `bodies[0]` is the central body and stays at the origin. Indices
/// `1..nbig` hold big bodies that perturb everything; the rest are small
/// bodies that feel the big ones but not each other.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemState {
    /// Current simulation time in years
    pub time: f64,
    pub bodies: Vec<Body>,
    /// One past the last big body (the central body counts)
    pub nbig: usize,
    pub frame: Frame,
    next_id: u32,
}

impl SystemState {
    /// Creates a system holding only the central body
    ///
    /// # Arguments
    ///
    /// * `central_mass` - Mass of the central body in solar masses
    /// * `central_radius` - Physical radius of the central body in AU
    ///
    /// # Examples
    ///
    /// ```
    /// use hybrid::state::{Frame, SystemState};
    ///
    /// let system = SystemState::new(1.0, 0.005);
    ///
    /// assert_eq!(system.body_count(), 0);
    /// assert_eq!(system.nbig, 1);
    /// assert_eq!(system.frame, Frame::Heliocentric);
    /// ```
    pub fn new(central_mass: f64, central_radius: f64) -> Self {
        let central = Body::new(
            BodyId(0),
            central_mass,
            central_radius,
            Point3::origin(),
            Vector3::zeros(),
        );
        Self {
            time: 0.0,
            bodies: vec![central],
            nbig: 1,
            frame: Frame::Heliocentric,
            next_id: 1,
        }
    }

    fn allocate_id(&mut self) -> BodyId {
        let id = BodyId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Adds a perturbing body and returns its ID
    ///
    /// Big bodies are kept ahead of every small body, so adding one after
    /// small bodies shifts the small bodies up by one slot.
    ///
    /// # Arguments
    ///
    /// * `mass` - Body mass in solar masses
    /// * `radius` - Physical radius in AU
    /// * `position` - Position in AU relative to the central body
    /// * `velocity` - Velocity in AU/year, in the system's current frame
    pub fn add_big(
        &mut self,
        mass: f64,
        radius: f64,
        position: Point3<f64>,
        velocity: Vector3<f64>,
    ) -> BodyId {
        let id = self.allocate_id();
        self.bodies
            .insert(self.nbig, Body::new(id, mass, radius, position, velocity));
        self.nbig += 1;
        id
    }

    /// Adds a non-perturbing body and returns its ID
    pub fn add_small(
        &mut self,
        mass: f64,
        radius: f64,
        position: Point3<f64>,
        velocity: Vector3<f64>,
    ) -> BodyId {
        let id = self.allocate_id();
        self.bodies
            .push(Body::new(id, mass, radius, position, velocity));
        id
    }

    pub fn central(&self) -> &Body {
        &self.bodies[0]
    }

    pub fn central_mass(&self) -> f64 {
        self.bodies[0].mass
    }

    /// Number of orbiting bodies still alive
    pub fn body_count(&self) -> usize {
        self.bodies.iter().skip(1).filter(|b| b.is_alive()).count()
    }

    pub fn get_body(&self, id: BodyId) -> Option<&Body> {
        self.bodies.iter().find(|b| b.id == id)
    }

    pub fn get_body_mut(&mut self, id: BodyId) -> Option<&mut Body> {
        self.bodies.iter_mut().find(|b| b.id == id)
    }

    /// Index of a body in `bodies`
    pub fn index_of(&self, id: BodyId) -> Option<usize> {
        self.bodies.iter().position(|b| b.id == id)
    }

    /// Removes every body whose status is not alive
    ///
    /// Keeps the big/small ordering and adjusts `nbig`. Any `StepState`
    /// in use must be refreshed afterwards (`Continuity::BodySetChanged`).
    ///
    /// # Returns
    ///
    /// The removed bodies, in their former order
    pub fn compact(&mut self) -> Vec<Body> {
        let mut removed = Vec::new();
        let mut kept = Vec::with_capacity(self.bodies.len());
        let mut nbig = 1;

        for (i, body) in self.bodies.drain(..).enumerate() {
            if i > 0 && !body.is_alive() {
                removed.push(body);
                continue;
            }
            if i > 0 && i < self.nbig {
                nbig += 1;
            }
            kept.push(body);
        }

        self.bodies = kept;
        self.nbig = nbig;
        removed
    }

    /// Checks the layout the integrator relies on
    pub fn validate(&self) -> HybridResult<()> {
        if self.bodies.is_empty() {
            return Err(HybridError::InvalidState("no central body".into()));
        }
        if self.nbig == 0 || self.nbig > self.bodies.len() {
            return Err(HybridError::InvalidState(format!(
                "nbig = {} outside 1..={}",
                self.nbig,
                self.bodies.len()
            )));
        }
        let central = &self.bodies[0];
        if central.mass.is_nan() || central.mass <= 0.0 || !central.is_alive() {
            return Err(HybridError::InvalidState(
                "central body must be alive with positive mass".into(),
            ));
        }
        if central.position.coords.norm_squared() != 0.0 {
            return Err(HybridError::InvalidState(
                "central body must sit at the origin".into(),
            ));
        }
        for (i, body) in self.bodies.iter().enumerate() {
            if !body.is_finite() {
                return Err(HybridError::non_finite(format!("body {} state", i)));
            }
            if body.mass < 0.0 {
                return Err(HybridError::InvalidState(format!(
                    "body {} has negative mass",
                    i
                )));
            }
        }
        Ok(())
    }

    /// Sum of m·v over the orbiting bodies, in the stored frame
    pub fn total_momentum(&self) -> Vector3<f64> {
        self.bodies
            .iter()
            .skip(1)
            .filter(|b| b.is_alive())
            .map(|b| b.momentum())
            .fold(Vector3::zeros(), |acc, p| acc + p)
    }

    /// Total mass including the central body
    pub fn total_mass(&self) -> f64 {
        self.central_mass()
            + self
                .bodies
                .iter()
                .skip(1)
                .filter(|b| b.is_alive())
                .map(|b| b.mass)
                .sum::<f64>()
    }

    /// Offset that turns stored velocities into barycentric ones
    fn barycentric_offset(&self) -> Vector3<f64> {
        match self.frame {
            Frame::Democratic => Vector3::zeros(),
            Frame::Heliocentric => -self.total_momentum() / self.total_mass(),
        }
    }

    /// Total energy of the point-mass system (M☉ AU² year⁻²)
    ///
    /// Evaluates the democratic heliocentric Hamiltonian: kinetic energy
    /// of barycentric velocities, the central body's kinetic term, the
    /// central potential and the pairwise potential of every pair with a
    /// big member. Small–small pairs do not interact and are left out.
    /// Works in either frame.
    pub fn energy(&self) -> f64 {
        let offset = self.barycentric_offset();
        let m0 = self.central_mass();
        let alive = |b: &&Body| b.is_alive();

        let mut kinetic = 0.0;
        let mut momentum = Vector3::zeros();
        let mut potential = 0.0;
        for body in self.bodies.iter().skip(1).filter(alive) {
            let v = body.velocity + offset;
            kinetic += 0.5 * body.mass * v.norm_squared();
            momentum += v * body.mass;
            potential -= G * m0 * body.mass / body.position.coords.norm();
        }

        let n = self.bodies.len();
        for i in 1..self.nbig {
            let a = &self.bodies[i];
            if !a.is_alive() {
                continue;
            }
            for b in self.bodies[i + 1..n].iter().filter(alive) {
                potential -= G * a.mass * b.mass / (b.position - a.position).norm();
            }
        }

        kinetic + momentum.norm_squared() / (2.0 * m0) + potential
    }

    /// Total angular momentum including every spin (M☉ AU²/year)
    pub fn angular_momentum(&self) -> Vector3<f64> {
        let offset = self.barycentric_offset();
        self.bodies
            .iter()
            .enumerate()
            .filter(|(i, b)| *i == 0 || b.is_alive())
            .map(|(i, b)| {
                if i == 0 {
                    b.spin
                } else {
                    b.position.coords.cross(&(b.velocity + offset)) * b.mass + b.spin
                }
            })
            .fold(Vector3::zeros(), |acc, l| acc + l)
    }
}

/// State carried between successive calls to `HybridIntegrator::advance`
///
/// Holds the accelerations evaluated at the end of the previous step and
/// the recommended encounter sub-step. Only valid while the body set and
/// masses are unchanged; call `invalidate` or pass a non-`Normal`
/// continuity otherwise.
#[derive(Debug, Clone, Default)]
pub struct StepState {
    /// Direct interaction plus central-body shape accelerations
    pub interaction: Vec<Vector3<f64>>,
    /// User-supplied accelerations
    pub external: Vec<Vector3<f64>>,
    /// Cometary non-gravitational accelerations
    pub non_grav: Vec<Vector3<f64>>,
    /// Sub-step last recommended by the encounter integrator
    pub hrec: Option<f64>,
    valid: bool,
    pub(crate) entry: Vec<Body>,
    pub(crate) pre_drift: Vec<Body>,
}

impl StepState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Forces the next step to recompute every cached acceleration
    pub fn invalidate(&mut self) {
        self.valid = false;
    }

    pub(crate) fn mark_valid(&mut self) {
        self.valid = true;
    }

    pub(crate) fn resize(&mut self, n: usize) {
        self.interaction.resize(n, Vector3::zeros());
        self.external.resize(n, Vector3::zeros());
        self.non_grav.resize(n, Vector3::zeros());
    }

    /// Sum of all cached accelerations on body `i`
    pub fn total_acceleration(&self, i: usize) -> Vector3<f64> {
        self.interaction[i] + self.external[i] + self.non_grav[i]
    }
}

/// Running totals of what collisions removed from the orbital budget
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ConservationLedger {
    /// Orbital energy converted by mergers (M☉ AU² year⁻²)
    pub energy_lost: f64,
    /// Orbital angular momentum turned into spin (M☉ AU²/year)
    pub angular_momentum_lost: f64,
    pub collisions: usize,
}

impl ConservationLedger {
    pub fn record(&mut self, event: &CollisionEvent) {
        self.energy_lost += event.energy_lost;
        self.angular_momentum_lost += event.angular_momentum_lost;
        self.collisions += 1;
    }

    pub fn record_all<'a>(&mut self, events: impl IntoIterator<Item = &'a CollisionEvent>) {
        events.into_iter().for_each(|e| self.record(e));
    }
}
