//! Integrator configuration
//!
//! `HybridConfig` deserializes with every field optional; missing fields
//! take the defaults below.
//!
//! ```
//! use hybrid::config::HybridConfig;
//!
//! let config: HybridConfig = serde_json::from_str(r#"{ "tolerance": 1e-10 }"#).unwrap();
//! assert_eq!(config.tolerance, 1e-10);
//! assert!(config.allow_collisions);
//! config.validate().unwrap();
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{HybridError, HybridResult};
use crate::forces::oblateness::Oblateness;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HybridConfig {
    /// Relative accuracy demanded from the encounter sub-integrator
    pub tolerance: f64,
    /// Smallest encounter sub-step (years) before giving up
    pub min_substep: f64,
    /// Merge bodies whose physical radii overlap during an encounter
    pub allow_collisions: bool,
    /// Radius of the central body (AU); also the scale of its harmonics
    pub central_radius: f64,
    /// Zonal gravity harmonics of the central body
    pub oblateness: Oblateness,
    /// Critical radius in units of the Hill radius
    pub hill_factor: f64,
}

impl Default for HybridConfig {
    fn default() -> Self {
        Self {
            tolerance: 1e-12,
            min_substep: 1e-10,
            allow_collisions: true,
            central_radius: 0.005,
            oblateness: Oblateness::default(),
            hill_factor: 3.0,
        }
    }
}

impl HybridConfig {
    pub fn validate(&self) -> HybridResult<()> {
        let positive = |name: &str, value: f64| {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(HybridError::InvalidConfig(format!(
                    "{} must be positive and finite, got {}",
                    name, value
                )))
            }
        };
        positive("tolerance", self.tolerance)?;
        positive("min_substep", self.min_substep)?;
        positive("hill_factor", self.hill_factor)?;

        if !self.central_radius.is_finite() || self.central_radius < 0.0 {
            return Err(HybridError::InvalidConfig(format!(
                "central_radius must be non-negative, got {}",
                self.central_radius
            )));
        }
        if !self.oblateness.is_finite() {
            return Err(HybridError::InvalidConfig(
                "oblateness harmonics must be finite".into(),
            ));
        }
        Ok(())
    }

    /// Central radius seen by the collision checks (zero when disabled)
    pub fn collision_radius(&self) -> f64 {
        if self.allow_collisions {
            self.central_radius
        } else {
            0.0
        }
    }
}
