//! Smooth switch between direct and encounter force evaluation
//!
//! For a pair at separation `s` with critical radius `rc`, the direct
//! law keeps a fraction `K(q)` of the Newtonian force with
//! `q = (s − 0.1 rc) / (0.9 rc)`; the encounter integrator keeps `1 − K`.

use crate::body::Body;

/// Fraction of `rc` inside which the direct law drops the pair entirely
pub const INNER_FRACTION: f64 = 0.1;

/// Quintic changeover polynomial `K(q) = 10q³ − 15q⁴ + 6q⁵`
///
/// `K(0) = 0`, `K(1) = 1`, and `K'` vanishes at both ends. Arguments are
/// clamped to `[0, 1]`.
///
/// # Examples
///
/// ```
/// use hybrid::forces::changeover;
///
/// assert_eq!(changeover(0.0), 0.0);
/// assert_eq!(changeover(1.0), 1.0);
/// assert!((changeover(0.5) - 0.5).abs() < 1e-15);
/// ```
pub fn changeover(q: f64) -> f64 {
    let q = q.clamp(0.0, 1.0);
    q * q * q * (10.0 + q * (-15.0 + 6.0 * q))
}

/// dK/dq = 30q²(1 − q)²
pub fn changeover_derivative(q: f64) -> f64 {
    let q = q.clamp(0.0, 1.0);
    30.0 * q * q * (1.0 - q) * (1.0 - q)
}

/// Weight of a pair in the direct law, from squared separation
pub fn direct_weight(s2: f64, rc: f64) -> f64 {
    let rc2 = rc * rc;
    if s2 >= rc2 {
        return 1.0;
    }
    let inner = INNER_FRACTION * rc;
    if s2 <= inner * inner {
        return 0.0;
    }
    changeover((s2.sqrt() - inner) / (rc - inner))
}

/// Weight of a pair in the encounter law: `1 − direct_weight`
pub fn complementary_weight(s2: f64, rc: f64) -> f64 {
    1.0 - direct_weight(s2, rc)
}

/// Changeover radius of a pair: the larger of the two critical radii
pub fn pair_critical_radius(a: &Body, b: &Body) -> f64 {
    a.critical_radius.max(b.critical_radius)
}
