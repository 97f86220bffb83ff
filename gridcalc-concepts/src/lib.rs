#![deny(missing_docs)]
#![deny(clippy::missing_docs_in_private_items)]
//! This crate encapsulates the concepts which govern a structured-grid solver built with
//! [gridcalc](https://docs.rs/gridcalc).
//!
//! It defines the rectangular [IndexBox] over which all data lives, the error types shared by
//! every crate of the workspace and the [ZoneWriter] interface which connects a running solver
//! to a structured-grid plot file.

mod errors;
mod index_box;
mod zone;

pub use errors::*;
pub use index_box::*;
pub use zone::*;
