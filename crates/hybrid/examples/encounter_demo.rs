//! Close encounter and merger example
//!
//! A ring of planetary embryos on crossing orbits. Close passes are handed
//! to the Bulirsch–Stoer integrator and touching embryos merge. Set
//! `RUST_LOG=hybrid=info` to see each merger as it happens.
//!
//! Run with: cargo run --package hybrid --example encounter_demo

use nalgebra::{Point3, Vector3};
use tracing_subscriber::EnvFilter;

use hybrid::coordinates::to_democratic;
use hybrid::forces::G;
use hybrid::{
    Continuity, HybridConfig, HybridIntegrator, HybridResult, StepState, SystemState,
};

fn main() -> HybridResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("Hybrid Integrator: Embryo Collisions\n");
    println!("{}", "=".repeat(60));

    let mut system = SystemState::new(1.0, 0.005);
    let embryo_mass = 1.5e-6; // M☉ (~ half an Earth mass)
    let embryo_radius = 0.002; // AU, inflated so mergers happen quickly

    for i in 0..8 {
        let a = 0.9 + (i as f64) * 0.025;
        let e = 0.02 + (i as f64) * 0.005;
        let angle = (i as f64) * std::f64::consts::PI / 4.0;
        let v = (G / a).sqrt() * (1.0 + e);
        let (s, c) = angle.sin_cos();

        system.add_big(
            embryo_mass,
            embryo_radius,
            Point3::new(a * c, a * s, 0.001 * (i as f64 - 3.5)),
            Vector3::new(-v * s, v * c, 0.0),
        );
    }
    let mut integrator = HybridIntegrator::new(HybridConfig::default())?;
    integrator.assign_critical_radii(&mut system);
    let mut system = to_democratic(&system)?;

    let initial_energy = system.energy();
    let initial_l = system.angular_momentum();
    println!("Initial embryo count: {}", system.body_count());

    let mut step = StepState::new();
    let mut continuity = Continuity::FirstEverCall;
    let mut energy_lost = 0.0;

    let dt = 0.002;
    let total_steps = 5000;

    for n in 0..total_steps {
        let outcome = integrator.advance(&mut step, &mut system, dt, continuity)?;
        continuity = Continuity::Normal;

        for event in &outcome.collisions {
            energy_lost += event.energy_lost;
            println!(
                "t={:6.3} yr: {:?} absorbed {:?} ({:?})",
                system.time, event.survivor, event.absorbed, event.kind
            );
        }
        if !outcome.collisions.is_empty() {
            system.compact();
            continuity = Continuity::BodySetChanged;
        }

        if n % 1000 == 0 {
            println!(
                "t={:6.3} yr: {} embryos, {} encounter pair(s) this step",
                system.time,
                system.body_count(),
                outcome.encounters.len()
            );
        }
    }

    let energy_error = (system.energy() - initial_energy + energy_lost) / initial_energy;
    let l_error = (system.angular_momentum() - initial_l).norm() / initial_l.norm();

    println!("\n{}", "=".repeat(60));
    println!("Final embryo count: {}", system.body_count());
    println!("Energy error (with merger losses): {:.2e}", energy_error.abs());
    println!("Angular momentum error: {:.2e}", l_error);

    Ok(())
}
