//! Bulirsch–Stoer integration of second-order equations of motion
//!
//! Each attempt integrates the interval with Stoermer's rule using
//! 2, 4, 6, ... sub-intervals and extrapolates the results to zero step
//! size in powers of h². The attempt is accepted as soon as two
//! successive extrapolations agree to the requested relative accuracy;
//! otherwise the step is halved and retried.

use nalgebra::Vector3;
use tracing::{debug, trace, warn};

use crate::body::Body;
use crate::error::{HybridError, HybridResult};
use crate::forces::ForceLaw;

/// Result of one accepted sub-step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SubStep {
    /// Interval actually integrated (years)
    pub taken: f64,
    /// Recommended size of the next attempt (years)
    pub next: f64,
}

/// An adaptive integrator for the encounter subset
///
/// The force law is injected per call so the same integrator can run
/// any force split.
pub trait SubIntegrator: Send {
    /// Advances `bodies` by at most `h_try`
    ///
    /// Only alive bodies past index 0 move. On error the bodies are left
    /// untouched.
    fn substep(
        &mut self,
        bodies: &mut [Body],
        nbig: usize,
        h_try: f64,
        tolerance: f64,
        force: &dyn ForceLaw,
    ) -> HybridResult<SubStep>;
}

/// Counters accumulated over the integrator's lifetime
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BsStats {
    pub accepted: usize,
    pub rejected: usize,
    pub force_evaluations: usize,
}

/// Bulirsch–Stoer integrator with reusable workspace
///
/// # Examples
///
/// ```
/// use hybrid::body::{Body, BodyId};
/// use hybrid::encounters::{BulirschStoer, SubIntegrator};
/// use hybrid::forces::{ComplementaryForce, G};
/// use nalgebra::{Point3, Vector3};
///
/// let mut bodies = vec![
///     Body::new(BodyId(0), 1.0, 0.005, Point3::origin(), Vector3::zeros()),
///     Body::new(BodyId(1), 0.0, 0.0, Point3::new(1.0, 0.0, 0.0), Vector3::y() * G.sqrt()),
/// ];
///
/// let mut bs = BulirschStoer::new(1e-10);
/// let step = bs.substep(&mut bodies, 1, 0.01, 1e-12, &ComplementaryForce::new(&[])).unwrap();
///
/// assert!(step.taken > 0.0);
/// assert!((bodies[1].position.coords.norm() - 1.0).abs() < 1e-10);
/// ```
#[derive(Debug, Clone)]
pub struct BulirschStoer {
    /// Smallest step tried before reporting divergence (years)
    pub min_step: f64,
    /// Number of Stoermer sequences per attempt (2, 4, ..., 2·levels steps)
    pub levels: usize,
    stats: BsStats,
    start_accel: Vec<Vector3<f64>>,
    accel: Vec<Vector3<f64>>,
    delta: Vec<Vector3<f64>>,
    trial: Vec<Body>,
    x_scale: Vec<f64>,
    v_scale: Vec<f64>,
    prev_x: Vec<Vec<Vector3<f64>>>,
    prev_v: Vec<Vec<Vector3<f64>>>,
    cur_x: Vec<Vec<Vector3<f64>>>,
    cur_v: Vec<Vec<Vector3<f64>>>,
}

impl BulirschStoer {
    pub fn new(min_step: f64) -> Self {
        Self {
            min_step,
            levels: 8,
            stats: BsStats::default(),
            start_accel: Vec::new(),
            accel: Vec::new(),
            delta: Vec::new(),
            trial: Vec::new(),
            x_scale: Vec::new(),
            v_scale: Vec::new(),
            prev_x: Vec::new(),
            prev_v: Vec::new(),
            cur_x: Vec::new(),
            cur_v: Vec::new(),
        }
    }

    pub fn stats(&self) -> BsStats {
        self.stats
    }

    fn prepare(&mut self, n: usize) {
        let zero = Vector3::zeros();
        self.start_accel.resize(n, zero);
        self.accel.resize(n, zero);
        self.delta.resize(n, zero);
        self.x_scale.resize(n, 0.0);
        self.v_scale.resize(n, 0.0);
        for table in [
            &mut self.prev_x,
            &mut self.prev_v,
            &mut self.cur_x,
            &mut self.cur_v,
        ] {
            table.resize_with(self.levels, Vec::new);
            table.iter_mut().for_each(|row| row.resize(n, zero));
        }
    }

    /// Growth factor for the next step after converging at `level`
    fn growth(level: usize) -> f64 {
        match level {
            0..=3 => 1.3,
            4 | 5 => 1.0,
            6 => 0.77,
            _ => 0.55,
        }
    }
}

/// One Stoermer integration of `h` in `steps` pieces
///
/// Leaves the final positions and velocities in `trial`.
#[allow(clippy::too_many_arguments)]
fn stoermer(
    bodies: &[Body],
    nbig: usize,
    force: &dyn ForceLaw,
    start_accel: &[Vector3<f64>],
    h: f64,
    steps: usize,
    trial: &mut Vec<Body>,
    delta: &mut [Vector3<f64>],
    accel: &mut [Vector3<f64>],
) {
    let hs = h / steps as f64;
    trial.clear();
    trial.extend_from_slice(bodies);

    for (k, body) in trial.iter_mut().enumerate().skip(1) {
        if !body.is_alive() {
            continue;
        }
        delta[k] = (body.velocity + start_accel[k] * (0.5 * hs)) * hs;
        body.position += delta[k];
    }

    for _ in 1..steps {
        force.accelerations(trial, nbig, accel);
        for (k, body) in trial.iter_mut().enumerate().skip(1) {
            if !body.is_alive() {
                continue;
            }
            delta[k] += accel[k] * (hs * hs);
            body.position += delta[k];
        }
    }

    force.accelerations(trial, nbig, accel);
    for (k, body) in trial.iter_mut().enumerate().skip(1) {
        if body.is_alive() {
            body.velocity = delta[k] / hs + accel[k] * (0.5 * hs);
        }
    }
}

impl SubIntegrator for BulirschStoer {
    fn substep(
        &mut self,
        bodies: &mut [Body],
        nbig: usize,
        h_try: f64,
        tolerance: f64,
        force: &dyn ForceLaw,
    ) -> HybridResult<SubStep> {
        let n = bodies.len();
        self.prepare(n);

        force.accelerations(bodies, nbig, &mut self.start_accel);
        if self
            .start_accel
            .iter()
            .any(|a| a.iter().any(|c| !c.is_finite()))
        {
            return Err(HybridError::non_finite("encounter force evaluation"));
        }

        for (k, body) in bodies.iter().enumerate() {
            self.x_scale[k] = 1.0 / body.position.coords.norm_squared().max(f64::MIN_POSITIVE);
            self.v_scale[k] = 1.0 / body.velocity.norm_squared().max(f64::MIN_POSITIVE);
        }

        let tol2 = tolerance * tolerance;
        let mut h = h_try;

        loop {
            for level in 0..self.levels {
                let steps = 2 * (level + 1);
                stoermer(
                    bodies,
                    nbig,
                    force,
                    &self.start_accel,
                    h,
                    steps,
                    &mut self.trial,
                    &mut self.delta,
                    &mut self.accel,
                );
                self.stats.force_evaluations += steps;

                for (k, body) in self.trial.iter().enumerate() {
                    self.cur_x[0][k] = body.position.coords;
                    self.cur_v[0][k] = body.velocity;
                }

                // Neville extrapolation in h²
                for j in 1..=level {
                    let ratio = (steps as f64 / (2 * (level - j + 1)) as f64).powi(2);
                    let factor = 1.0 / (ratio - 1.0);
                    for k in 0..n {
                        let dx = self.cur_x[j - 1][k] - self.prev_x[j - 1][k];
                        let dv = self.cur_v[j - 1][k] - self.prev_v[j - 1][k];
                        self.cur_x[j][k] = self.cur_x[j - 1][k] + dx * factor;
                        self.cur_v[j][k] = self.cur_v[j - 1][k] + dv * factor;
                    }
                }

                if level > 0 {
                    let mut error: f64 = 0.0;
                    for k in 1..n {
                        if !bodies[k].is_alive() {
                            continue;
                        }
                        let ex = (self.cur_x[level][k] - self.cur_x[level - 1][k]).norm_squared()
                            * self.x_scale[k];
                        let ev = (self.cur_v[level][k] - self.cur_v[level - 1][k]).norm_squared()
                            * self.v_scale[k];
                        error = error.max(ex).max(ev);
                    }

                    if !error.is_finite() {
                        break;
                    }
                    if error <= tol2 {
                        for (k, body) in bodies.iter_mut().enumerate().skip(1) {
                            if body.is_alive() {
                                body.position = self.cur_x[level][k].into();
                                body.velocity = self.cur_v[level][k];
                            }
                        }
                        self.stats.accepted += 1;
                        trace!(h, level, "Bulirsch-Stoer step accepted");
                        return Ok(SubStep {
                            taken: h,
                            next: h * Self::growth(level),
                        });
                    }
                }

                std::mem::swap(&mut self.prev_x, &mut self.cur_x);
                std::mem::swap(&mut self.prev_v, &mut self.cur_v);
            }

            self.stats.rejected += 1;
            h *= 0.5;
            debug!(h, "Bulirsch-Stoer step rejected, halving");
            if h.abs() < self.min_step {
                warn!(h, min_step = self.min_step, "Bulirsch-Stoer step fell below minimum");
                return Err(HybridError::EncounterDivergence {
                    step: h,
                    min_step: self.min_step,
                });
            }
        }
    }
}
