#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]
//! # gridcalc - Building Blocks
//!
//! Building blocks turn the storage and loops of [gridcalc_core] into a lattice-Boltzmann
//! fluid solver.
//! A [LatticeBoltzmannKernel] advances the distribution functions of a single partition
//! with one of the [lattices](lattice) while an [LbLevel] drives all partitions of a
//! [DisjointBoxLayout](gridcalc_core::layout::DisjointBoxLayout) and writes their
//! macroscopic state into plot files.
//!
//! The easiest way to set up a complete run is by reading a [SimulationSetup] from a file
//! and handing the resulting level to [run_simulation].
//! ```
//! # use gridcalc_building_blocks::*;
//! # use gridcalc_concepts::IndexBox;
//! # use gridcalc_core::{storage::PlotSettings, time::StepSchedule};
//! let dir = tempfile::tempdir()?;
//! let setup = SimulationSetup::<2> {
//!     domain: IndexBox::new([0, 0], [15, 7])?,
//!     ghost: 1,
//!     n_partitions: 2usize.try_into()?,
//!     periodic: vec![true, true],
//!     origin: vec![],
//!     dx: 1.0,
//!     parameters: LbParameters::for_lattice::<D2Q9, 2>(0.8, 1e-5)?,
//!     settings: RunSettings {
//!         n_threads: 2usize.try_into()?,
//!         schedule: StepSchedule::new(20, 10)?,
//!         plot: PlotSettings {
//!             directory: dir.path().into(),
//!             ..Default::default()
//!         },
//!         show_progressbar: false,
//!     },
//! };
//! let mut level = setup.build_level::<D2Q9>()?;
//! let summary = run_simulation(&mut level, &setup.parameters, &setup.settings, || {
//!     setup.settings.plot.writer()
//! })?;
//! assert_eq!(summary.written_plot_files.len(), 3);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod kernel;
/// Discrete velocity sets
pub mod lattice;
mod level;
mod parameters;
pub mod physics;
mod run;
mod setup;

pub use kernel::*;
pub use lattice::{LatticeDirections, D2Q9, D3Q19};
pub use level::*;
pub use parameters::*;
pub use run::*;
pub use setup::*;
