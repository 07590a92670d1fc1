use approx::assert_relative_eq;
use nalgebra::{Point3, Vector3};

use crate::body::Body;
use crate::config::HybridConfig;
use crate::coordinates::to_democratic;
use crate::encounters::critical_radius;
use crate::error::HybridError;
use crate::forces::{DirectForce, ExternalForce, ForceLaw, G};
use crate::integrator::HybridIntegrator;
use crate::kepler::{KeplerPropagator, UniversalKepler};
use crate::state::{ConservationLedger, Continuity, Frame, StepState, SystemState};

/// Jupiter and Saturn on near-circular orbits, well separated
fn giants() -> SystemState {
    let mut system = SystemState::new(1.0, 0.005);
    system.add_big(
        9.5e-4,
        4.8e-4,
        Point3::new(5.2, 0.0, 0.0),
        Vector3::new(0.0, (G / 5.2).sqrt(), 0.0),
    );
    system.add_big(
        2.9e-4,
        4.0e-4,
        Point3::new(0.0, 9.5, 0.1),
        Vector3::new(-(G / 9.5).sqrt(), 0.0, 0.0),
    );
    integrator().assign_critical_radii(&mut system);
    to_democratic(&system).unwrap()
}

/// Kepler propagator that never converges
struct Stalled;

impl KeplerPropagator for Stalled {
    fn drift(
        &self,
        _mu: f64,
        _position: &Point3<f64>,
        _velocity: &Vector3<f64>,
        _dt: f64,
    ) -> Option<(Point3<f64>, Vector3<f64>)> {
        None
    }
}

/// Constant push along +z
struct Lift(f64);

impl ExternalForce for Lift {
    fn accelerations(&self, _time: f64, bodies: &[Body], out: &mut [Vector3<f64>]) {
        for (i, (body, a)) in bodies.iter().zip(out.iter_mut()).enumerate() {
            *a = if i > 0 && body.is_alive() {
                Vector3::z() * self.0
            } else {
                Vector3::zeros()
            };
        }
    }
}

fn integrator() -> HybridIntegrator {
    HybridIntegrator::new(HybridConfig::default()).unwrap()
}

#[test]
fn test_rejects_heliocentric_state() {
    let mut system = SystemState::new(1.0, 0.005);
    system.add_big(1e-3, 5e-4, Point3::new(5.2, 0.0, 0.0), Vector3::new(0.0, 2.7, 0.0));

    let result =
        integrator().advance(&mut StepState::new(), &mut system, 0.1, Continuity::FirstEverCall);

    assert_eq!(
        result,
        Err(HybridError::WrongFrame {
            expected: Frame::Democratic,
            found: Frame::Heliocentric,
        })
    );
}

#[test]
fn test_rejects_degenerate_step_size() {
    let mut system = giants();
    let mut step = StepState::new();
    let mut integrator = integrator();

    for h in [0.0, f64::NAN, f64::INFINITY] {
        let result = integrator.advance(&mut step, &mut system, h, Continuity::FirstEverCall);
        assert!(matches!(result, Err(HybridError::InvalidState(_))), "h = {}", h);
    }
    assert_eq!(system.time, 0.0);
}

#[test]
fn test_rejects_invalid_config() {
    let config = HybridConfig {
        tolerance: -1.0,
        ..HybridConfig::default()
    };

    assert!(matches!(
        HybridIntegrator::new(config),
        Err(HybridError::InvalidConfig(_))
    ));
}

#[test]
fn test_quiet_step_skips_resolver() {
    let mut system = giants();
    let mut step = StepState::new();

    let outcome = integrator()
        .advance(&mut step, &mut system, 0.05, Continuity::FirstEverCall)
        .unwrap();

    assert_eq!(system.time, 0.05);
    assert!(outcome.encounters.is_empty());
    assert!(outcome.collisions.is_empty());
    assert_eq!(outcome.resolved_interval, None);
    assert_eq!(outcome.substeps, 0);
    assert_eq!(outcome.central_mass_at_entry, 1.0);
    assert!(step.is_valid());
}

#[test]
fn test_cached_accelerations_match_final_positions() {
    let mut system = giants();
    let mut step = StepState::new();
    let mut integrator = integrator();

    for _ in 0..3 {
        integrator
            .advance(&mut step, &mut system, 0.05, Continuity::Normal)
            .unwrap();
    }

    let mut expected = vec![Vector3::zeros(); system.bodies.len()];
    DirectForce.accelerations(&system.bodies, system.nbig, &mut expected);
    for (cached, fresh) in step.interaction.iter().zip(&expected) {
        assert_relative_eq!(*cached, *fresh, epsilon = 1e-18);
    }
    assert!(step.external.iter().all(|a| *a == Vector3::zeros()));
}

#[test]
fn test_massless_body_follows_exact_kepler_orbit() {
    let mut system = SystemState::new(1.0, 0.005);
    let x0 = Point3::new(1.2, 0.1, 0.0);
    let v0 = Vector3::new(-0.8, 5.5, 0.4);
    system.add_small(0.0, 0.0, x0, v0);
    let mut system = to_democratic(&system).unwrap();
    let mut step = StepState::new();
    let mut integrator = integrator();

    for _ in 0..20 {
        integrator
            .advance(&mut step, &mut system, 0.05, Continuity::Normal)
            .unwrap();
    }

    let (x, v) = UniversalKepler::default().drift(G, &x0, &v0, 1.0).unwrap();
    assert_relative_eq!(system.bodies[1].position, x, epsilon = 1e-11);
    assert_relative_eq!(system.bodies[1].velocity, v, epsilon = 1e-10);
}

#[test]
fn test_failed_drift_restores_entry_state() {
    let mut system = giants();
    let before = system.clone();
    let mut step = StepState::new();
    let mut integrator = integrator().with_kepler(Stalled);

    let result = integrator.advance(&mut step, &mut system, 0.05, Continuity::FirstEverCall);

    assert!(matches!(result, Err(HybridError::DriftDivergence { body: 1, .. })));
    assert_eq!(system.bodies, before.bodies);
    assert_eq!(system.time, before.time);
    assert!(!step.is_valid());
}

#[test]
fn test_external_force_enters_kicks() {
    let mut plain = giants();
    let mut lifted = giants();
    let mut step_plain = StepState::new();
    let mut step_lifted = StepState::new();
    let mut integrator_plain = integrator();
    let mut integrator_lifted = integrator().with_external_force(Lift(0.1));

    for _ in 0..10 {
        integrator_plain
            .advance(&mut step_plain, &mut plain, 0.05, Continuity::Normal)
            .unwrap();
        integrator_lifted
            .advance(&mut step_lifted, &mut lifted, 0.05, Continuity::Normal)
            .unwrap();
    }

    let dz = lifted.bodies[1].position.z - plain.bodies[1].position.z;
    // Roughly a t² / 2 over half a year
    assert!(dz > 0.005 && dz < 0.02, "dz = {}", dz);
    assert!(step_lifted.external[1].z > 0.0);
}

#[test]
fn test_first_call_forgets_sub_step_hint() {
    let mut system = giants();
    let mut step = StepState::new();
    step.hrec = Some(5.0);

    integrator()
        .advance(&mut step, &mut system, 0.05, Continuity::FirstEverCall)
        .unwrap();

    assert_eq!(step.hrec, None);
}

#[test]
fn test_integrate_counts_steps() {
    let mut system = giants();
    let mut step = StepState::new();
    let mut ledger = ConservationLedger::default();

    let report = integrator()
        .integrate(&mut step, &mut system, 0.1, 25, &mut ledger)
        .unwrap();

    assert_eq!(report.steps, 25);
    assert_eq!(report.encounter_steps, 0);
    assert_eq!(report.collisions, 0);
    assert_relative_eq!(report.final_time, 2.5, epsilon = 1e-12);
    assert_eq!(ledger, ConservationLedger::default());
    assert_eq!(system.body_count(), 2);
}

#[test]
fn test_critical_radii_follow_configured_hill_factor() {
    let config = HybridConfig {
        hill_factor: 5.0,
        ..HybridConfig::default()
    };
    let integrator = HybridIntegrator::new(config).unwrap();
    let mut system = SystemState::new(1.0, 0.005);
    system.add_big(
        9.5e-4,
        4.8e-4,
        Point3::new(5.2, 0.0, 0.0),
        Vector3::new(0.0, (G / 5.2).sqrt(), 0.0),
    );

    integrator.assign_critical_radii(&mut system);

    let jupiter = system.bodies[1];
    assert_relative_eq!(
        jupiter.critical_radius,
        critical_radius(&jupiter, 1.0, 5.0),
        max_relative = 1e-12
    );
    assert_eq!(system.bodies[0].critical_radius, 0.0);
}
