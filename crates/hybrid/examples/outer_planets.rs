//! Outer solar system integration example
//!
//! Integrates the four giant planets for a thousand years with a 0.1 year
//! step and reports how well energy and angular momentum are kept.
//!
//! Run with: cargo run --package hybrid --example outer_planets

use nalgebra::{Point3, Vector3};
use hybrid::coordinates::to_democratic;
use hybrid::forces::G;
use hybrid::{
    ConservationLedger, HybridConfig, HybridIntegrator, HybridResult, StepState, SystemState,
};

/// (name, mass in M☉, radius in AU, semi-major axis in AU, phase in rad)
const GIANTS: [(&str, f64, f64, f64, f64); 4] = [
    ("Jupiter", 9.546e-4, 4.67e-4, 5.203, 0.6),
    ("Saturn", 2.858e-4, 3.89e-4, 9.537, 2.1),
    ("Uranus", 4.366e-5, 1.69e-4, 19.19, 4.0),
    ("Neptune", 5.151e-5, 1.65e-4, 30.07, 5.3),
];

fn main() -> HybridResult<()> {
    tracing_subscriber::fmt::init();

    println!("Hybrid Integrator: Outer Solar System\n");
    println!("{}", "=".repeat(60));

    let mut system = SystemState::new(1.0, 0.00465);
    for (name, mass, radius, a, phase) in GIANTS {
        let v = (G * (1.0 + mass) / a).sqrt();
        let (s, c) = f64::sin_cos(phase);
        system.add_big(
            mass,
            radius,
            Point3::new(a * c, a * s, 0.0),
            Vector3::new(-v * s, v * c, 0.0),
        );
        println!("  {:<8} a = {:6.3} AU, m = {:.3e} M☉", name, a, mass);
    }
    let mut integrator = HybridIntegrator::new(HybridConfig::default())?;
    integrator.assign_critical_radii(&mut system);
    let mut system = to_democratic(&system)?;

    let initial_energy = system.energy();
    let initial_l = system.angular_momentum();

    let mut step = StepState::new();
    let mut ledger = ConservationLedger::default();

    let dt = 0.1;
    let steps_per_report = 1000;

    println!("\nIntegrating 1000 years with dt = {} yr...\n", dt);

    for _ in 0..10 {
        let report =
            integrator.integrate(&mut step, &mut system, dt, steps_per_report, &mut ledger)?;

        let energy_error = ((system.energy() - initial_energy) / initial_energy).abs();
        let l_error = (system.angular_momentum() - initial_l).norm() / initial_l.norm();
        println!(
            "t = {:7.1} yr: ΔE = {:.2e}, ΔL = {:.2e}, encounter steps = {}",
            report.final_time, energy_error, l_error, report.encounter_steps
        );
    }

    println!("\n{}", "=".repeat(60));
    println!("Final semi-major axes:");
    for (body, (name, mass, ..)) in system.bodies.iter().skip(1).zip(GIANTS) {
        let r = body.position.coords.norm();
        let mu = G * (1.0 + mass);
        let a = 1.0 / (2.0 / r - body.velocity.norm_squared() / mu);
        println!("  {:<8} a ≈ {:.3} AU", name, a);
    }

    Ok(())
}
