use crate::body::Body;
use crate::encounters::detection::{central_approach, pair_approach, Approach};

/// Checks whether two bodies touched between two snapshots `h` apart
///
/// # Returns
///
/// The interpolated closest approach if the separation dropped to the
/// sum of the physical radii, `None` otherwise
pub fn pair_impact(a0: &Body, b0: &Body, a1: &Body, b1: &Body, h: f64) -> Option<Approach> {
    let contact = a1.radius + b1.radius;
    if contact <= 0.0 {
        return None;
    }
    let approach = pair_approach(a0, b0, a1, b1, h);
    (approach.distance_squared <= contact * contact).then_some(approach)
}

/// Checks whether a body came within `radius` of the central body
pub fn central_impact(before: &Body, after: &Body, h: f64, radius: f64) -> Option<Approach> {
    if radius <= 0.0 {
        return None;
    }
    let approach = central_approach(before, after, h);
    (approach.distance_squared <= radius * radius).then_some(approach)
}
