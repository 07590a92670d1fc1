use nalgebra::Vector3;

use crate::body::Body;
use crate::forces::changeover::{direct_weight, pair_critical_radius};
use crate::forces::{add_pair, ForceLaw};

/// Pairwise gravity between orbiting bodies, softened by the changeover
/// function
///
/// Loops over every pair with at least one big member. The attraction of
/// the central body is left to the Kepler drift.
///
/// # Examples
///
/// ```
/// use hybrid::forces::{DirectForce, ForceLaw};
/// use hybrid::state::SystemState;
/// use nalgebra::{Point3, Vector3};
///
/// let mut system = SystemState::new(1.0, 0.005);
/// system.add_big(1e-3, 5e-4, Point3::new(5.2, 0.0, 0.0), Vector3::zeros());
/// system.add_big(3e-4, 4e-4, Point3::new(9.5, 0.0, 0.0), Vector3::zeros());
///
/// let mut accel = vec![Vector3::zeros(); system.bodies.len()];
/// DirectForce.accelerations(&system.bodies, system.nbig, &mut accel);
///
/// assert!(accel[1].x > 0.0);
/// assert!(accel[2].x < 0.0);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectForce;

impl ForceLaw for DirectForce {
    fn accelerations(&self, bodies: &[Body], nbig: usize, out: &mut [Vector3<f64>]) {
        out.iter_mut().for_each(|a| *a = Vector3::zeros());

        let n = bodies.len();
        for i in 1..nbig.min(n) {
            if !bodies[i].is_alive() {
                continue;
            }
            for j in (i + 1)..n {
                if !bodies[j].is_alive() {
                    continue;
                }
                let dx = bodies[j].position - bodies[i].position;
                let s2 = dx.norm_squared();
                let weight = direct_weight(s2, pair_critical_radius(&bodies[i], &bodies[j]));
                if weight > 0.0 {
                    add_pair(bodies, i, j, s2, dx, weight, out);
                }
            }
        }
    }
}
