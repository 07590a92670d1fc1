//! Hybrid symplectic time integration
//!
//! The step splits the democratic heliocentric Hamiltonian into Kepler,
//! interaction and linear-momentum parts and composes them as
//! kick–drift–drift–drift–kick. Pairs that come within their critical
//! radii during the Kepler drift are integrated again with the
//! Bulirsch–Stoer sub-integrator under the complementary force law,
//! which replaces the drift result for those bodies only.

use nalgebra::Vector3;
use tracing::{debug, warn};

use crate::body::Body;
use crate::collisions::{CollisionEvent, CollisionResolver, MergeResolver};
use crate::config::HybridConfig;
use crate::coordinates::solar_drift;
use crate::encounters::{
    self, BulirschStoer, EncounterDetector, EncounterResolver, EncounterSet, FlybyRecord,
    InterpolatingDetector, SubIntegrator,
};
use crate::error::{HybridError, HybridResult};
use crate::forces::{non_grav_accelerations, DirectForce, ExternalForce, ForceLaw, G};
use crate::kepler::{KeplerPropagator, UniversalKepler};
use crate::state::{ConservationLedger, Continuity, Frame, StepState, SystemState};

/// What a single call to `advance` did
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StepOutcome {
    /// Pairs and central approaches flagged during the drift
    pub encounters: EncounterSet,
    pub collisions: Vec<CollisionEvent>,
    pub flybys: Vec<FlybyRecord>,
    /// Accepted encounter sub-steps
    pub substeps: usize,
    /// Time integrated by the resolver, when it ran; always equal to `h`
    pub resolved_interval: Option<f64>,
    /// Central mass used by both linear-momentum drifts of the step
    pub central_mass_at_entry: f64,
}

/// Totals from `HybridIntegrator::integrate`
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct IntegrationReport {
    pub steps: usize,
    /// Steps in which the resolver ran
    pub encounter_steps: usize,
    pub collisions: usize,
    /// Bodies dropped by compaction after collisions
    pub removed: usize,
    pub final_time: f64,
}

/// Mixed-variable symplectic integrator with close-encounter switching
///
/// # Examples
///
/// ```
/// use hybrid::config::HybridConfig;
/// use hybrid::coordinates::to_democratic;
/// use hybrid::forces::G;
/// use hybrid::integrator::HybridIntegrator;
/// use hybrid::state::{Continuity, StepState, SystemState};
/// use nalgebra::{Point3, Vector3};
///
/// let mut integrator = HybridIntegrator::new(HybridConfig::default()).unwrap();
///
/// let mut system = SystemState::new(1.0, 0.005);
/// let v = (G / 5.2).sqrt();
/// system.add_big(1e-3, 5e-4, Point3::new(5.2, 0.0, 0.0), Vector3::new(0.0, v, 0.0));
/// integrator.assign_critical_radii(&mut system);
/// let mut system = to_democratic(&system).unwrap();
///
/// let mut step = StepState::new();
///
/// let outcome = integrator
///     .advance(&mut step, &mut system, 0.1, Continuity::FirstEverCall)
///     .unwrap();
///
/// assert!(outcome.encounters.is_empty());
/// assert!((system.time - 0.1).abs() < 1e-15);
/// ```
pub struct HybridIntegrator {
    config: HybridConfig,
    kepler: Box<dyn KeplerPropagator>,
    detector: Box<dyn EncounterDetector>,
    resolver: EncounterResolver,
    collider: Box<dyn CollisionResolver>,
    external: Option<Box<dyn ExternalForce>>,
    encounters: EncounterSet,
}

impl HybridIntegrator {
    /// Creates an integrator with the default collaborators
    ///
    /// Universal-variable Kepler drift, interpolating detector,
    /// Bulirsch–Stoer encounters and perfect merging.
    pub fn new(config: HybridConfig) -> HybridResult<Self> {
        config.validate()?;
        Ok(Self {
            kepler: Box::new(UniversalKepler::default()),
            detector: Box::new(InterpolatingDetector),
            resolver: EncounterResolver::new(Box::new(BulirschStoer::new(config.min_substep))),
            collider: Box::new(MergeResolver),
            external: None,
            encounters: EncounterSet::new(),
            config,
        })
    }

    pub fn with_kepler<K: KeplerPropagator + 'static>(mut self, kepler: K) -> Self {
        self.kepler = Box::new(kepler);
        self
    }

    pub fn with_detector<D: EncounterDetector + 'static>(mut self, detector: D) -> Self {
        self.detector = Box::new(detector);
        self
    }

    pub fn with_sub_integrator<S: SubIntegrator + 'static>(mut self, integrator: S) -> Self {
        self.resolver = EncounterResolver::new(Box::new(integrator));
        self
    }

    pub fn with_collision_resolver<C: CollisionResolver + 'static>(mut self, collider: C) -> Self {
        self.collider = Box::new(collider);
        self
    }

    pub fn with_external_force<F: ExternalForce + 'static>(mut self, force: F) -> Self {
        self.external = Some(Box::new(force));
        self
    }

    pub fn config(&self) -> &HybridConfig {
        &self.config
    }

    /// Sets every orbiting body's critical radius to `hill_factor` Hill
    /// radii
    ///
    /// Orbits are taken from heliocentric velocities, so call this before
    /// converting to democratic coordinates.
    pub fn assign_critical_radii(&self, state: &mut SystemState) {
        encounters::assign_critical_radii(state, self.config.hill_factor);
    }

    /// Advances the system by one step of size `h`
    ///
    /// # Arguments
    ///
    /// * `step` - Accelerations and sub-step hint from the previous call
    /// * `state` - System in democratic heliocentric coordinates
    /// * `h` - Step size in years (negative steps integrate backwards)
    /// * `continuity` - Anything other than `Normal` recomputes the
    ///   cached accelerations first
    ///
    /// # Returns
    ///
    /// The encounters, collisions and fly-bys of the step. Removed bodies
    /// keep their slots; compaction is left to the caller. On error the
    /// system is restored to its state on entry and `step` is invalidated.
    pub fn advance(
        &mut self,
        step: &mut StepState,
        state: &mut SystemState,
        h: f64,
        continuity: Continuity,
    ) -> HybridResult<StepOutcome> {
        if state.frame != Frame::Democratic {
            return Err(HybridError::WrongFrame {
                expected: Frame::Democratic,
                found: state.frame,
            });
        }
        if !h.is_finite() || h == 0.0 {
            return Err(HybridError::InvalidState(format!(
                "step size must be finite and non-zero, got {}",
                h
            )));
        }
        state.validate()?;

        step.entry.clone_from(&state.bodies);
        let entry_time = state.time;

        match self.take_step(step, state, h, continuity) {
            Ok(outcome) => Ok(outcome),
            Err(err) => {
                warn!(%err, time = entry_time, h, "step failed, restoring entry state");
                state.bodies.clone_from(&step.entry);
                state.time = entry_time;
                step.invalidate();
                Err(err)
            }
        }
    }

    fn take_step(
        &mut self,
        step: &mut StepState,
        state: &mut SystemState,
        h: f64,
        continuity: Continuity,
    ) -> HybridResult<StepOutcome> {
        let n = state.bodies.len();
        let nbig = state.nbig;

        if continuity.requires_refresh() || !step.is_valid() || step.interaction.len() != n {
            if continuity == Continuity::FirstEverCall {
                step.hrec = None;
            }
            self.refresh(step, state)?;
        }

        let m0 = state.central_mass();
        let half = 0.5 * h;

        kick(&mut state.bodies, step, half);
        solar_drift(&mut state.bodies, m0, half);
        step.pre_drift.clone_from(&state.bodies);

        let mu = G * m0;
        for (i, body) in state.bodies.iter_mut().enumerate().skip(1) {
            if !body.is_alive() {
                continue;
            }
            let (position, velocity) = self
                .kepler
                .drift(mu, &body.position, &body.velocity, h)
                .ok_or(HybridError::DriftDivergence { body: i, dt: h })?;
            body.position = position;
            body.velocity = velocity;
        }

        self.detector.detect(
            &step.pre_drift,
            &state.bodies,
            nbig,
            h,
            self.config.collision_radius(),
            &mut self.encounters,
        );

        let mut outcome = StepOutcome {
            central_mass_at_entry: m0,
            ..StepOutcome::default()
        };

        if !self.encounters.is_empty() {
            for g in self.encounters.involved() {
                state.bodies[g] = step.pre_drift[g];
            }
            let report = self.resolver.resolve(
                &mut state.bodies,
                nbig,
                &self.encounters,
                h,
                &mut step.hrec,
                &self.config,
                self.collider.as_ref(),
            )?;
            debug!(
                substeps = report.substeps,
                collisions = report.collisions.len(),
                flybys = report.flybys.len(),
                "encounter step resolved"
            );
            outcome.substeps = report.substeps;
            outcome.resolved_interval = Some(report.elapsed);
            outcome.collisions = report.collisions;
            outcome.flybys = report.flybys;
        }

        // Mass at entry, even if the central body absorbed something above
        solar_drift(&mut state.bodies, m0, half);

        state.time += h;
        self.refresh(step, state)?;
        kick(&mut state.bodies, step, half);

        if let Some(i) = state.bodies.iter().position(|b| !b.is_finite()) {
            return Err(HybridError::non_finite(format!("body {} after step", i)));
        }

        outcome.encounters = self.encounters.clone();
        Ok(outcome)
    }

    /// Recomputes every cached acceleration at the current positions
    fn refresh(&self, step: &mut StepState, state: &SystemState) -> HybridResult<()> {
        let bodies = &state.bodies;
        step.resize(bodies.len());

        DirectForce.accelerations(bodies, state.nbig, &mut step.interaction);
        self.config
            .oblateness
            .add_accelerations(bodies, self.config.central_radius, &mut step.interaction);

        match &self.external {
            Some(force) => force.accelerations(state.time, bodies, &mut step.external),
            None => step.external.iter_mut().for_each(|a| *a = Vector3::zeros()),
        }
        non_grav_accelerations(bodies, &mut step.non_grav);

        for (name, values) in [
            ("interaction accelerations", &step.interaction),
            ("external accelerations", &step.external),
            ("non-gravitational accelerations", &step.non_grav),
        ] {
            if values.iter().any(|a| a.iter().any(|c| !c.is_finite())) {
                return Err(HybridError::non_finite(name));
            }
        }

        step.mark_valid();
        Ok(())
    }

    /// Advances `n_steps` steps, compacting after collisions
    ///
    /// Collisions are added to `ledger`. After a step with collisions the
    /// removed bodies are dropped and the next step recomputes its cached
    /// accelerations.
    pub fn integrate(
        &mut self,
        step: &mut StepState,
        state: &mut SystemState,
        h: f64,
        n_steps: usize,
        ledger: &mut ConservationLedger,
    ) -> HybridResult<IntegrationReport> {
        let mut report = IntegrationReport::default();
        let mut continuity = if step.is_valid() {
            Continuity::Normal
        } else {
            Continuity::FirstEverCall
        };

        for _ in 0..n_steps {
            let outcome = self.advance(step, state, h, continuity)?;
            report.steps += 1;
            if outcome.resolved_interval.is_some() {
                report.encounter_steps += 1;
            }

            continuity = if outcome.collisions.is_empty() {
                Continuity::Normal
            } else {
                ledger.record_all(&outcome.collisions);
                report.collisions += outcome.collisions.len();
                report.removed += state.compact().len();
                step.invalidate();
                Continuity::BodySetChanged
            };
        }

        report.final_time = state.time;
        Ok(report)
    }
}

/// v += dt · (interaction + external + non-gravitational)
fn kick(bodies: &mut [Body], step: &StepState, dt: f64) {
    bodies
        .iter_mut()
        .enumerate()
        .skip(1)
        .filter(|(_, b)| b.is_alive())
        .for_each(|(i, b)| b.velocity += step.total_acceleration(i) * dt);
}
