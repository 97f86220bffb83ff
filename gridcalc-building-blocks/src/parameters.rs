use gridcalc_concepts::SetupError;
use serde::{Deserialize, Serialize};

use crate::lattice::LatticeDirections;

fn default_density_epsilon() -> f64 {
    1e-12
}

/// Immutable physical parameters of a lattice-Boltzmann run.
///
/// A single value is passed to every kernel operation.
/// ```
/// # use gridcalc_building_blocks::{D3Q19, LbParameters};
/// let parameters = LbParameters::for_lattice::<D3Q19, 3>(0.6, 1e-5)?;
/// assert_eq!(parameters.cs2, 1.0 / 3.0);
///
/// let parameters: LbParameters = ron::from_str("(tau: 0.8, cs2: 0.3333, body_force: 0.0)")?;
/// assert_eq!(parameters.density_epsilon, 1e-12);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct LbParameters {
    /// Relaxation time of the BGK collision
    pub tau: f64,
    /// Lattice speed of sound squared
    pub cs2: f64,
    /// Magnitude of the body force acting along axis `0`
    pub body_force: f64,
    /// Densities with an absolute value not above this threshold are degenerate
    #[serde(default = "default_density_epsilon")]
    pub density_epsilon: f64,
}

impl LbParameters {
    /// Validated parameters with the speed of sound of the given lattice.
    pub fn for_lattice<L, const D: usize>(tau: f64, body_force: f64) -> Result<Self, SetupError>
    where
        L: LatticeDirections<D>,
    {
        let parameters = Self {
            tau,
            cs2: L::CS2,
            body_force,
            density_epsilon: default_density_epsilon(),
        };
        parameters.validate()?;
        Ok(parameters)
    }

    /// Checks that `tau` and `cs2` are positive and every value is finite.
    pub fn validate(&self) -> Result<(), SetupError> {
        let values = [
            ("tau", self.tau),
            ("cs2", self.cs2),
            ("body_force", self.body_force),
            ("density_epsilon", self.density_epsilon),
        ];
        if let Some((name, value)) = values.iter().find(|(_, v)| !v.is_finite()) {
            return Err(SetupError(format!(
                "Parameter {} must be finite but is {}",
                name, value
            )));
        }
        if self.tau <= 0.0 {
            return Err(SetupError(format!(
                "Relaxation time tau must be positive but is {}",
                self.tau
            )));
        }
        if self.cs2 <= 0.0 {
            return Err(SetupError(format!(
                "Speed of sound cs2 must be positive but is {}",
                self.cs2
            )));
        }
        if self.density_epsilon < 0.0 {
            return Err(SetupError(format!(
                "Density threshold must not be negative but is {}",
                self.density_epsilon
            )));
        }
        Ok(())
    }

    /// Kinematic viscosity `cs2 * (tau - 1/2)` in lattice units
    pub fn viscosity(&self) -> f64 {
        self.cs2 * (self.tau - 0.5)
    }
}
