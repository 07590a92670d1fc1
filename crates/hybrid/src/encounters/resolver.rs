//! Re-integration of the bodies caught in close encounters
//!
//! The resolver copies the flagged bodies (plus the central body) into a
//! private array, integrates that array over the full step with the
//! adaptive sub-integrator under the complementary force law, resolves any
//! collisions found along the way, and writes the result back to the
//! original slots.

use tracing::{debug, info, trace};

use crate::body::{Body, Status};
use crate::collisions::{
    central_impact, pair_impact, CollisionEvent, CollisionKind, CollisionResolver,
};
use crate::config::HybridConfig;
use crate::encounters::bulirsch_stoer::{SubIntegrator, SubStep};
use crate::encounters::detection::{interpolate_state, pair_approach};
use crate::encounters::{EncounterSet, FlybyRecord};
use crate::error::HybridResult;
use crate::forces::changeover::pair_critical_radius;
use crate::forces::ComplementaryForce;

/// What happened while resolving one step
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolverReport {
    /// Sum of accepted sub-steps; equals the step size exactly
    pub elapsed: f64,
    pub substeps: usize,
    pub collisions: Vec<CollisionEvent>,
    pub flybys: Vec<FlybyRecord>,
}

/// Integrates an encounter subset over one step
pub struct EncounterResolver {
    integrator: Box<dyn SubIntegrator>,
    /// Local index → index in the full body array
    index: Vec<usize>,
    local: Vec<Body>,
    before: Vec<Body>,
    pairs: Vec<(usize, usize)>,
}

impl EncounterResolver {
    pub fn new(integrator: Box<dyn SubIntegrator>) -> Self {
        Self {
            integrator,
            index: Vec::new(),
            local: Vec::new(),
            before: Vec::new(),
            pairs: Vec::new(),
        }
    }

    /// Global indices of the bodies in the last resolved subset, central
    /// body first
    pub fn subset(&self) -> &[usize] {
        &self.index
    }

    /// Builds the index table and the private copy of the subset
    ///
    /// # Returns
    ///
    /// One past the last big body in local numbering
    fn load(&mut self, bodies: &[Body], nbig: usize, encounters: &EncounterSet) -> usize {
        self.index.clear();
        self.index.push(0);
        self.index.extend(encounters.involved());

        self.local.clear();
        self.local.extend(self.index.iter().map(|&g| bodies[g]));

        let index = &self.index;
        let to_local = |g: usize| index.binary_search(&g).unwrap_or(0);
        self.pairs.clear();
        self.pairs.extend(
            encounters
                .pairs()
                .iter()
                .map(|&(i, j)| (to_local(i), to_local(j))),
        );

        1 + self.index[1..].iter().filter(|&&g| g < nbig).count()
    }

    /// Re-integrates the flagged bodies over `h`
    ///
    /// `bodies` must hold the flagged bodies at their pre-drift state.
    /// Only those bodies and the central body's mass and spin are written
    /// back; nothing is written on error.
    ///
    /// # Arguments
    ///
    /// * `bodies` - Full body array, central body first
    /// * `nbig` - One past the last big body
    /// * `encounters` - Pairs and central approaches flagged this step
    /// * `h` - Step size in years
    /// * `hrec` - Recommended sub-step, updated for the next call
    /// * `config` - Tolerance and collision settings
    /// * `collider` - Merges colliding bodies
    #[allow(clippy::too_many_arguments)]
    pub fn resolve(
        &mut self,
        bodies: &mut [Body],
        nbig: usize,
        encounters: &EncounterSet,
        h: f64,
        hrec: &mut Option<f64>,
        config: &HybridConfig,
        collider: &dyn CollisionResolver,
    ) -> HybridResult<ResolverReport> {
        let local_nbig = self.load(bodies, nbig, encounters);
        debug!(
            bodies = self.local.len() - 1,
            pairs = self.pairs.len(),
            central = encounters.central().len(),
            h,
            "resolving close encounters"
        );

        let mut report = ResolverReport::default();
        let central_radius = config.collision_radius();

        let mut t = 0.0;
        let mut h_sub = hrec.map_or(h, |r| h.signum() * r.abs().min(h.abs()));

        while t != h {
            let remaining = h - t;
            let clipped = h_sub.abs() >= remaining.abs();
            let h_try = if clipped { remaining } else { h_sub };

            self.before.clone_from(&self.local);
            let force = ComplementaryForce::new(&self.pairs);
            let SubStep { taken, next } = self.integrator.substep(
                &mut self.local,
                local_nbig,
                h_try,
                config.tolerance,
                &force,
            )?;

            let start = t;
            let completes = clipped && taken == h_try;
            t = if completes || (h - (t + taken)) * h <= 0.0 {
                h
            } else {
                t + taken
            };
            if !completes {
                *hrec = Some(next.abs());
            }
            h_sub = next;
            report.substeps += 1;
            trace!(t, taken, "encounter sub-step");

            self.inspect(
                start,
                taken,
                config.allow_collisions,
                central_radius,
                collider,
                &mut report,
            );
        }

        if hrec.is_none() {
            *hrec = Some(h_sub.abs());
        }
        report.elapsed = t;

        bodies[0].mass = self.local[0].mass;
        bodies[0].spin = self.local[0].spin;
        for (&g, body) in self.index.iter().zip(self.local.iter()).skip(1) {
            bodies[g] = *body;
        }

        Ok(report)
    }

    /// Looks for closest approaches and collisions in the last sub-step
    fn inspect(
        &mut self,
        start: f64,
        taken: f64,
        allow_collisions: bool,
        central_radius: f64,
        collider: &dyn CollisionResolver,
        report: &mut ResolverReport,
    ) {
        for &(i, j) in &self.pairs {
            if !self.local[i].is_alive() || !self.local[j].is_alive() {
                continue;
            }
            let (a0, b0) = (&self.before[i], &self.before[j]);
            let (a1, b1) = (&self.local[i], &self.local[j]);

            let approach = pair_approach(a0, b0, a1, b1, taken);
            let rc = pair_critical_radius(a1, b1);
            if approach.passed_minimum && approach.distance_squared <= rc * rc {
                let states = [
                    interpolate_state(a0, a1, taken, approach.time),
                    interpolate_state(b0, b1, taken, approach.time),
                ];
                report.flybys.push(FlybyRecord {
                    time: start + approach.time,
                    bodies: (a1.id, b1.id),
                    distance: (states[1].0 - states[0].0).norm(),
                    states,
                });
            }

            if !allow_collisions {
                continue;
            }
            if let Some(impact) = pair_impact(a0, b0, a1, b1, taken) {
                let time = start + impact.time;
                let merger = collider.resolve_collision(a1, b1, time);
                let survivor = merger.merged.id;
                let absorbed = b1.id;

                self.local[i] = merger.merged;
                self.local[j].status = Status::Merged { into: survivor };

                info!(
                    ?survivor,
                    ?absorbed,
                    time,
                    distance = impact.distance(),
                    "bodies merged"
                );
                report.collisions.push(CollisionEvent {
                    time,
                    survivor,
                    absorbed,
                    kind: CollisionKind::Pair,
                    energy_lost: merger.energy_lost,
                    angular_momentum_lost: merger.angular_momentum_lost,
                });
            }
        }

        if central_radius <= 0.0 {
            return;
        }
        for k in 1..self.local.len() {
            if !self.local[k].is_alive() {
                continue;
            }
            let impact = central_impact(&self.before[k], &self.local[k], taken, central_radius);
            if let Some(impact) = impact {
                let time = start + impact.time;
                let merger = collider.absorb_into_central(&self.local[0], &self.local[k], time);
                let absorbed = self.local[k].id;

                self.local[0] = merger.merged;
                self.local[k].status = Status::HitCentral;

                info!(?absorbed, time, "body hit the central body");
                report.collisions.push(CollisionEvent {
                    time,
                    survivor: self.local[0].id,
                    absorbed,
                    kind: CollisionKind::Central,
                    energy_lost: merger.energy_lost,
                    angular_momentum_lost: merger.angular_momentum_lost,
                });
            }
        }
    }
}
