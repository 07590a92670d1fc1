use approx::assert_relative_eq;
use proptest::prelude::*;

use crate::forces::changeover::{
    changeover, changeover_derivative, complementary_weight, direct_weight,
};

#[test]
fn test_end_values() {
    assert_eq!(changeover(0.0), 0.0);
    assert_eq!(changeover(1.0), 1.0);
    assert_relative_eq!(changeover(0.5), 0.5, epsilon = 1e-15);
}

#[test]
fn test_derivative_vanishes_at_both_ends() {
    assert_eq!(changeover_derivative(0.0), 0.0);
    assert_eq!(changeover_derivative(1.0), 0.0);

    // Flat just inside the ends
    assert!(changeover_derivative(1e-4) < 1e-6);
    assert!(changeover_derivative(1.0 - 1e-4) < 1e-6);

    // Finite differences agree with the closed form across the ramp
    let d = 1e-4;
    for q in [0.01, 0.25, 0.5, 0.75, 0.99] {
        let numeric = (changeover(q + 0.5 * d) - changeover(q - 0.5 * d)) / d;
        assert!((numeric - changeover_derivative(q)).abs() < 1e-6, "q = {}", q);
    }
}

#[test]
fn test_monotonic_on_unit_interval() {
    let samples: Vec<f64> = (0..=100).map(|i| changeover(i as f64 / 100.0)).collect();
    assert!(samples.windows(2).all(|w| w[1] >= w[0]));
}

#[test]
fn test_clamps_outside_unit_interval() {
    assert_eq!(changeover(-0.5), 0.0);
    assert_eq!(changeover(1.5), 1.0);
}

#[test]
fn test_direct_weight_regions() {
    let rc: f64 = 0.1;

    assert_eq!(direct_weight(0.2 * 0.2, rc), 1.0);
    assert_eq!(direct_weight(rc * rc, rc), 1.0);
    assert_eq!(direct_weight(0.005 * 0.005, rc), 0.0);
    assert_eq!(direct_weight(0.01 * 0.01, rc), 0.0);

    // Midway through the ramp q = 0.5
    let s = 0.1 * rc + 0.45 * rc;
    assert_relative_eq!(direct_weight(s * s, rc), 0.5, epsilon = 1e-12);
}

#[test]
fn test_continuous_at_region_boundaries() {
    let rc: f64 = 0.3;
    for s in [0.1 * rc, rc] {
        let below = direct_weight((s * (1.0 - 1e-9)).powi(2), rc);
        let above = direct_weight((s * (1.0 + 1e-9)).powi(2), rc);
        assert!((above - below).abs() < 1e-12, "jump at s = {}", s);
    }
}

#[test]
fn test_zero_critical_radius_means_full_force() {
    assert_eq!(direct_weight(1e-6, 0.0), 1.0);
    assert_eq!(complementary_weight(1e-6, 0.0), 0.0);
}

proptest! {
    #[test]
    fn prop_weights_partition_unity(s in 1e-6f64..2.0, rc in 1e-4f64..1.0) {
        let sum = direct_weight(s * s, rc) + complementary_weight(s * s, rc);
        prop_assert!((sum - 1.0).abs() < 1e-15);
    }

    #[test]
    fn prop_weight_in_unit_interval(s in 0.0f64..2.0, rc in 1e-4f64..1.0) {
        let w = direct_weight(s * s, rc);
        prop_assert!((0.0..=1.0).contains(&w));
    }
}
