#![deny(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]
//! This crate collects the numerical machinery needed to advance fields which live on a
//! structured grid as described by the [concepts](gridcalc_concepts).
//!
//! ## Storage of fields
//! A [FabArray](array::FabArray) stores a fixed number of components for every cell of an
//! [IndexBox](gridcalc_concepts::IndexBox) extended by a halo of ghost cells.
//! Cells can be visited sequentially with [IndexBox::cells](gridcalc_concepts::IndexBox::cells)
//! or in parallel with a [WorkerPool](stencil::WorkerPool) which hands out disjoint
//! [slabs](array::SlabMut) of the array to its workers.
//!
//! ## Decomposition
//! The global domain is split into partitions by a
//! [DisjointBoxLayout](layout::DisjointBoxLayout) which also fills the ghost cells of
//! every partition from its neighbours (see [HaloExchange](layout::HaloExchange)).
//!
//! ## Exporting
//! The macroscopic state of every partition can be written into structured-grid
//! [plot files](storage) in one of the supported [formats](storage::PlotFormat).

pub mod array;
pub mod direction;
mod errors;
pub mod layout;
pub mod stencil;
pub mod storage;
pub mod time;

pub use errors::*;

#[doc(hidden)]
pub use rayon;

#[cfg(feature = "tracing")]
#[doc(hidden)]
pub use tracing;
