use approx::assert_relative_eq;
use nalgebra::{Point3, Vector3};

use crate::body::{Body, BodyId, Status};
use crate::collisions::{CollisionKind, MergeResolver};
use crate::config::HybridConfig;
use crate::encounters::{BulirschStoer, EncounterResolver, EncounterSet};
use crate::forces::G;

fn resolver() -> EncounterResolver {
    EncounterResolver::new(Box::new(BulirschStoer::new(1e-10)))
}

/// Two bodies closing radially at 1 AU/year, plus a distant bystander
///
/// `offset` is the sideways miss distance and `radius` the physical radius
/// of each of the pair.
fn closing_pair(offset: f64, radius: f64) -> Vec<Body> {
    let v = G.sqrt();
    vec![
        Body::new(BodyId(0), 1.0, 0.005, Point3::origin(), Vector3::zeros()),
        Body::new(BodyId(1), 1e-5, radius, Point3::new(1.0, 0.0, 0.0), Vector3::new(0.0, v, 0.0))
            .with_critical_radius(0.05),
        Body::new(
            BodyId(2),
            1e-5,
            radius,
            Point3::new(1.01, offset, 0.0),
            Vector3::new(-1.0, v, 0.0),
        )
        .with_critical_radius(0.05),
        Body::new(
            BodyId(3),
            1e-6,
            1e-5,
            Point3::new(3.0, 0.0, 0.0),
            Vector3::new(0.0, (G / 3.0).sqrt(), 0.0),
        )
        .with_critical_radius(0.02),
    ]
}

fn flagged(i: usize, j: usize) -> EncounterSet {
    let mut set = EncounterSet::new();
    set.insert_pair(i, j);
    set
}

#[test]
fn test_elapsed_time_equals_step_exactly() {
    let mut bodies = closing_pair(0.005, 0.0);
    let mut hrec = Some(0.0013);
    let mut resolver = resolver();

    let report = resolver
        .resolve(
            &mut bodies,
            4,
            &flagged(1, 2),
            0.01,
            &mut hrec,
            &HybridConfig::default(),
            &MergeResolver,
        )
        .unwrap();

    assert_eq!(report.elapsed, 0.01);
    assert!(report.substeps >= 2);
    assert!(hrec.is_some_and(|h| h > 0.0));
    assert!(report.collisions.is_empty());
}

#[test]
fn test_backward_step_elapses_exactly() {
    let mut bodies = closing_pair(0.005, 0.0);
    let mut hrec = None;

    let report = resolver()
        .resolve(
            &mut bodies,
            4,
            &flagged(1, 2),
            -0.004,
            &mut hrec,
            &HybridConfig::default(),
            &MergeResolver,
        )
        .unwrap();

    assert_eq!(report.elapsed, -0.004);
    assert!(hrec.is_some_and(|h| h > 0.0));
}

#[test]
fn test_only_subset_is_written_back() {
    let mut bodies = closing_pair(0.005, 0.0);
    let bystander = bodies[3];
    let mut hrec = None;
    let mut resolver = resolver();

    resolver
        .resolve(
            &mut bodies,
            4,
            &flagged(1, 2),
            0.005,
            &mut hrec,
            &HybridConfig::default(),
            &MergeResolver,
        )
        .unwrap();

    assert_eq!(resolver.subset(), &[0, 1, 2]);
    assert_eq!(bodies[3], bystander);
    assert_eq!(bodies[0].position, Point3::origin());
    assert!(bodies[1].position.y > 0.03);
}

#[test]
fn test_flyby_is_recorded_once() {
    let mut bodies = closing_pair(0.005, 0.0);
    let mut hrec = None;

    let report = resolver()
        .resolve(
            &mut bodies,
            4,
            &flagged(1, 2),
            0.02,
            &mut hrec,
            &HybridConfig::default(),
            &MergeResolver,
        )
        .unwrap();

    assert_eq!(report.flybys.len(), 1);
    let flyby = report.flybys[0];
    assert_eq!(flyby.bodies, (BodyId(1), BodyId(2)));
    assert!(flyby.distance > 0.003 && flyby.distance < 0.006);
    assert!(flyby.time > 0.005 && flyby.time < 0.015);

    // The stored states sit at the minimum: separated by `distance` and
    // moving perpendicular to the line between them
    let [(xa, va), (xb, vb)] = flyby.states;
    let (dx, dv) = (xb - xa, vb - va);
    assert_relative_eq!(dx.norm(), flyby.distance, max_relative = 1e-12);
    assert!(dx.dot(&dv).abs() < 0.01 * dx.norm() * dv.norm());
    assert!(flyby.states[0].0 != bodies[1].position);
}

#[test]
fn test_colliding_pair_merges_into_lower_index() {
    let mut bodies = closing_pair(0.0005, 5e-4);
    let mut hrec = None;

    let report = resolver()
        .resolve(
            &mut bodies,
            4,
            &flagged(1, 2),
            0.02,
            &mut hrec,
            &HybridConfig::default(),
            &MergeResolver,
        )
        .unwrap();

    assert_eq!(report.collisions.len(), 1);
    let event = report.collisions[0];
    assert_eq!(event.kind, CollisionKind::Pair);
    assert_eq!(event.survivor, BodyId(1));
    assert_eq!(event.absorbed, BodyId(2));
    assert!(event.time > 0.0 && event.time < 0.02);

    assert!(bodies[1].is_alive());
    assert_eq!(bodies[2].status, Status::Merged { into: BodyId(1) });
    assert_relative_eq!(bodies[1].mass, 2e-5, max_relative = 1e-14);
    assert_relative_eq!(bodies[1].radius, 5e-4 * 2f64.cbrt(), max_relative = 1e-12);
    assert!(event.energy_lost.is_finite());
    assert!(hrec.is_some());
}

#[test]
fn test_collisions_can_be_disabled() {
    let mut bodies = closing_pair(0.0005, 5e-4);
    let mut hrec = None;
    let config = HybridConfig {
        allow_collisions: false,
        ..HybridConfig::default()
    };

    let report = resolver()
        .resolve(&mut bodies, 4, &flagged(1, 2), 0.02, &mut hrec, &config, &MergeResolver)
        .unwrap();

    assert!(report.collisions.is_empty());
    assert!(bodies.iter().all(|b| b.is_alive()));
}

#[test]
fn test_plunging_body_is_absorbed_by_central_body() {
    let mut bodies = vec![
        Body::new(BodyId(0), 1.0, 0.005, Point3::origin(), Vector3::zeros()),
        Body::new(
            BodyId(1),
            1e-8,
            1e-6,
            Point3::new(0.05, 0.001, 0.0),
            Vector3::new(-5.0, 0.0, 0.0),
        ),
    ];
    let angular_momentum = bodies[1].orbital_angular_momentum();
    let mut set = EncounterSet::new();
    set.insert_central(1);
    let mut hrec = None;

    let report = resolver()
        .resolve(&mut bodies, 2, &set, 0.02, &mut hrec, &HybridConfig::default(), &MergeResolver)
        .unwrap();

    assert_eq!(report.collisions.len(), 1);
    assert_eq!(report.collisions[0].kind, CollisionKind::Central);
    assert_eq!(bodies[1].status, Status::HitCentral);
    assert_relative_eq!(bodies[0].mass, 1.0 + 1e-8, max_relative = 1e-15);
    assert_eq!(bodies[0].position, Point3::origin());
    // Orbital angular momentum is conserved along the plunge
    assert_relative_eq!(bodies[0].spin, angular_momentum, epsilon = 1e-16);
}
