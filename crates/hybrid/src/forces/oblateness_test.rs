use approx::assert_relative_eq;
use nalgebra::{Point3, Vector3};

use crate::body::{Body, BodyId, Status};
use crate::forces::{Oblateness, G};

const J2: f64 = 1.0e-3;
const RADIUS: f64 = 0.01;

fn system(positions: &[Point3<f64>]) -> Vec<Body> {
    let mut bodies = vec![Body::new(BodyId(0), 1.0, RADIUS, Point3::origin(), Vector3::zeros())];
    for (i, p) in positions.iter().enumerate() {
        bodies.push(Body::new(BodyId(i as u32 + 1), 1e-3, 1e-5, *p, Vector3::zeros()));
    }
    bodies
}

#[test]
fn test_zero_harmonics_add_nothing() {
    let bodies = system(&[Point3::new(1.0, 0.2, 0.3)]);
    let mut out = vec![Vector3::new(1.0, 2.0, 3.0); 2];

    Oblateness::default().add_accelerations(&bodies, RADIUS, &mut out);

    assert_eq!(out[1], Vector3::new(1.0, 2.0, 3.0));
}

#[test]
fn test_equatorial_j2_pulls_inward() {
    let r = 0.5;
    let a = Oblateness::new(J2, 0.0, 0.0).acceleration(G, RADIUS, &Vector3::new(r, 0.0, 0.0));

    // a_r = -3/2 J2 μ R² / r⁴ in the equatorial plane
    let expected = -1.5 * J2 * G * RADIUS * RADIUS / r.powi(4);
    assert_relative_eq!(a.x, expected, max_relative = 1e-12);
    assert_eq!(a.y, 0.0);
    assert_eq!(a.z, 0.0);
}

#[test]
fn test_polar_j2_pushes_outward() {
    let r = 0.5;
    let a = Oblateness::new(J2, 0.0, 0.0).acceleration(G, RADIUS, &Vector3::new(0.0, 0.0, r));

    // a_r = +3 J2 μ R² / r⁴ on the axis
    let expected = 3.0 * J2 * G * RADIUS * RADIUS / r.powi(4);
    assert_relative_eq!(a.z, expected, max_relative = 1e-12);
}

#[test]
fn test_higher_harmonics_on_axis() {
    let r: f64 = 0.2;
    let gm0 = G;
    let ratio = RADIUS * RADIUS / (r * r);

    // On the axis the zonal field is radial: a_r = μ/r² (n+1) Jn (R/r)^n
    let axis = Vector3::new(0.0, 0.0, r);
    let j4 = Oblateness::new(0.0, 1.0e-4, 0.0).acceleration(gm0, RADIUS, &axis);
    assert_relative_eq!(j4.z, 5.0 * 1.0e-4 * gm0 * ratio * ratio / (r * r), max_relative = 1e-12);

    let j6 = Oblateness::new(0.0, 0.0, 1.0e-5).acceleration(gm0, RADIUS, &axis);
    assert_relative_eq!(
        j6.z,
        7.0 * 1.0e-5 * gm0 * ratio * ratio * ratio / (r * r),
        max_relative = 1e-12
    );
}

#[test]
fn test_central_reaction_balances_momentum() {
    let bodies = system(&[
        Point3::new(0.3, 0.1, 0.05),
        Point3::new(-0.2, 0.4, -0.1),
        Point3::new(0.0, -0.6, 0.2),
    ]);
    let harmonics = Oblateness::new(J2, -2.0e-4, 3.0e-5);
    let mut out = vec![Vector3::zeros(); bodies.len()];

    harmonics.add_accelerations(&bodies, RADIUS, &mut out);

    let raw: Vec<Vector3<f64>> = bodies
        .iter()
        .skip(1)
        .map(|b| harmonics.acceleration(G * bodies[0].mass, RADIUS, &b.position.coords))
        .collect();
    let reaction: Vector3<f64> = -bodies
        .iter()
        .skip(1)
        .zip(raw.iter())
        .map(|(b, a)| a * (b.mass / bodies[0].mass))
        .sum::<Vector3<f64>>();

    assert_eq!(out[0], Vector3::zeros());
    for (k, a) in raw.iter().enumerate() {
        assert!((out[k + 1] - (a - reaction)).norm() < 1e-15 * a.norm());
    }
}

#[test]
fn test_removed_bodies_get_nothing() {
    let mut bodies = system(&[Point3::new(0.3, 0.1, 0.05), Point3::new(0.5, 0.0, 0.0)]);
    bodies[2].status = Status::HitCentral;
    let mut out = vec![Vector3::zeros(); bodies.len()];

    Oblateness::new(J2, 0.0, 0.0).add_accelerations(&bodies, RADIUS, &mut out);

    assert_eq!(out[2], Vector3::zeros());
    assert!(out[1].norm() > 0.0);
}
