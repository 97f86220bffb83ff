#![deny(missing_docs)]
#![deny(clippy::missing_docs_in_private_items)]
//! [gridcalc](crate) advances populations of the lattice-Boltzmann method on a structured grid
//! which is split into rectangular partitions.
//!
//! Every step relaxes all cells towards equilibrium, fills the ghost cells of each partition
//! from its neighbours, streams the populations along the lattice directions and finally
//! recomputes density and velocity.
//! The state of the simulation can be written as structured-grid plot files.
//!
//! ```
//! use gridcalc::prelude::*;
//!
//! let domain = IndexBox::new([0, 0, 0], [3, 3, 3])?;
//! let layout = DisjointBoxLayout::decompose(domain, 2usize.try_into()?, 1, [true; 3])?;
//! let mut level = LbLevel::<D3Q19, 3>::new(layout)?;
//! let parameters = LbParameters::for_lattice::<D3Q19, 3>(0.6, 1e-5)?;
//! let pool = WorkerPool::new(1usize.try_into()?)?;
//!
//! level.advance(&parameters, &pool)?;
//! assert!((level.total_mass() - 64.0).abs() < 1e-10);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub use gridcalc_building_blocks as building_blocks;

pub use gridcalc_concepts as concepts;

pub use gridcalc_core as core;

/// Re-exports the default simulation types and traits.
pub mod prelude;
