//! Conversions between heliocentric and democratic heliocentric velocities
//!
//! Positions are relative to the central body in both frames. Democratic
//! heliocentric velocities are relative to the system barycenter, which
//! lets the Hamiltonian split into a Kepler part, an interaction part and
//! a linear "solar" drift part. The central body's own velocity is never
//! stored in either frame.

use nalgebra::Vector3;

use crate::body::Body;
use crate::error::{HybridError, HybridResult};
use crate::state::{Frame, SystemState};

/// Σ m·v over the alive orbiting bodies
pub fn mass_weighted_velocity(bodies: &[Body]) -> Vector3<f64> {
    bodies
        .iter()
        .skip(1)
        .filter(|b| b.is_alive())
        .fold(Vector3::zeros(), |acc, b| acc + b.velocity * b.mass)
}

fn shift_velocities(bodies: &mut [Body], shift: Vector3<f64>) {
    bodies
        .iter_mut()
        .skip(1)
        .filter(|b| b.is_alive())
        .for_each(|b| b.velocity += shift);
}

fn expect_frame(state: &SystemState, expected: Frame) -> HybridResult<()> {
    if state.frame == expected {
        Ok(())
    } else {
        Err(HybridError::WrongFrame {
            expected,
            found: state.frame,
        })
    }
}

/// Converts heliocentric velocities to barycentric ones
///
/// `v' = v − Σ m·v / M`, where `M` includes the central body.
///
/// # Examples
///
/// ```
/// use hybrid::coordinates::{from_democratic, to_democratic};
/// use hybrid::state::{Frame, SystemState};
/// use nalgebra::{Point3, Vector3};
///
/// let mut system = SystemState::new(1.0, 0.005);
/// system.add_big(1e-3, 5e-4, Point3::new(5.2, 0.0, 0.0), Vector3::new(0.0, 2.76, 0.0));
///
/// let democratic = to_democratic(&system).unwrap();
/// assert_eq!(democratic.frame, Frame::Democratic);
///
/// let back = from_democratic(&democratic).unwrap();
/// assert!((back.bodies[1].velocity - system.bodies[1].velocity).norm() < 1e-14);
/// ```
pub fn to_democratic(state: &SystemState) -> HybridResult<SystemState> {
    expect_frame(state, Frame::Heliocentric)?;
    let mut out = state.clone();
    let shift = -mass_weighted_velocity(&state.bodies) / state.total_mass();
    shift_velocities(&mut out.bodies, shift);
    out.frame = Frame::Democratic;
    Ok(out)
}

/// Converts barycentric velocities back to heliocentric ones
///
/// `v = v' + Σ m·v' / m₀`.
pub fn from_democratic(state: &SystemState) -> HybridResult<SystemState> {
    expect_frame(state, Frame::Democratic)?;
    let mut out = state.clone();
    let shift = mass_weighted_velocity(&state.bodies) / state.central_mass();
    shift_velocities(&mut out.bodies, shift);
    out.frame = Frame::Heliocentric;
    Ok(out)
}

/// Drift under the linear momentum term of the Hamiltonian
///
/// Every orbiting body moves by `dt · Σ m·v / m₀`; this stands in for
/// the central body's recoil.
pub fn solar_drift(bodies: &mut [Body], central_mass: f64, dt: f64) {
    let shift = mass_weighted_velocity(bodies) * (dt / central_mass);
    bodies
        .iter_mut()
        .skip(1)
        .filter(|b| b.is_alive())
        .for_each(|b| b.position += shift);
}
