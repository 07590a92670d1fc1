use nalgebra::Vector3;

use crate::body::Body;
use crate::forces::changeover::{complementary_weight, pair_critical_radius};
use crate::forces::{add_pair, ForceLaw, G};

/// Force law used while integrating an encounter subset
///
/// Full Newtonian attraction toward the central body plus the `1 − K`
/// share of every flagged pair. Pairs that were not flagged are fully
/// accounted for by the direct law and contribute nothing here.
#[derive(Debug, Clone, Copy)]
pub struct ComplementaryForce<'a> {
    pairs: &'a [(usize, usize)],
}

impl<'a> ComplementaryForce<'a> {
    /// # Arguments
    ///
    /// * `pairs` - Flagged pairs as indices into the slice the law is
    ///   evaluated on
    pub fn new(pairs: &'a [(usize, usize)]) -> Self {
        Self { pairs }
    }
}

impl ForceLaw for ComplementaryForce<'_> {
    fn accelerations(&self, bodies: &[Body], _nbig: usize, out: &mut [Vector3<f64>]) {
        out.iter_mut().for_each(|a| *a = Vector3::zeros());

        let gm0 = G * bodies[0].mass;
        for (body, a) in bodies.iter().zip(out.iter_mut()).skip(1) {
            if !body.is_alive() {
                continue;
            }
            let r2 = body.position.coords.norm_squared();
            *a = -body.position.coords * (gm0 / (r2 * r2.sqrt()));
        }

        for &(i, j) in self.pairs {
            if !bodies[i].is_alive() || !bodies[j].is_alive() {
                continue;
            }
            let dx = bodies[j].position - bodies[i].position;
            let s2 = dx.norm_squared();
            let weight = complementary_weight(s2, pair_critical_radius(&bodies[i], &bodies[j]));
            if weight > 0.0 {
                add_pair(bodies, i, j, s2, dx, weight, out);
            }
        }
    }
}
