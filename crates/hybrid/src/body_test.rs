use nalgebra::{Point3, Vector3};

use crate::body::{Body, BodyId, NonGravParams, Status};

fn make_test_body() -> Body {
    Body::new(
        BodyId(7),
        2.0e-6,
        3.0e-5,
        Point3::new(1.0, 0.0, 0.0),
        Vector3::new(0.0, 6.0, 0.5),
    )
}

#[test]
fn test_new_body_defaults() {
    let body = make_test_body();

    assert!(body.is_alive());
    assert_eq!(body.spin, Vector3::zeros());
    assert_eq!(body.critical_radius, 0.0);
    assert!(body.non_grav.is_none());
}

#[test]
fn test_builders_set_fields() {
    let params = NonGravParams {
        a1: 1e-8,
        a2: 0.0,
        a3: 0.0,
    };
    let body = make_test_body()
        .with_critical_radius(0.02)
        .with_spin(Vector3::new(0.0, 0.0, 1e-9))
        .with_non_grav(params);

    assert_eq!(body.critical_radius, 0.02);
    assert_eq!(body.spin.z, 1e-9);
    assert_eq!(body.non_grav, Some(params));
}

#[test]
fn test_removal_codes_are_not_alive() {
    let mut body = make_test_body();

    for status in [
        Status::Merged { into: BodyId(1) },
        Status::HitCentral,
        Status::Ejected,
    ] {
        body.status = status;
        assert!(!body.is_alive(), "{:?} should count as removed", status);
    }
}

#[test]
fn test_momentum_and_angular_momentum() {
    let body = make_test_body();

    let p = body.momentum();
    assert!((p - Vector3::new(0.0, 12.0e-6, 1.0e-6)).norm() < 1e-18);

    // L = m x × v = m (0, -0.5, 6)
    let l = body.orbital_angular_momentum();
    assert!((l - Vector3::new(0.0, -1.0e-6, 12.0e-6)).norm() < 1e-18);
}

#[test]
fn test_kinetic_energy() {
    let body = make_test_body();
    let expected = 0.5 * 2.0e-6 * (36.0 + 0.25);
    assert!((body.kinetic_energy() - expected).abs() < 1e-18);
}

#[test]
fn test_is_finite_detects_nan() {
    let mut body = make_test_body();
    assert!(body.is_finite());

    body.velocity.y = f64::NAN;
    assert!(!body.is_finite());
}
