pub use gridcalc_building_blocks::*;
pub use gridcalc_concepts::*;

pub use gridcalc_core::array::*;
pub use gridcalc_core::layout::*;
pub use gridcalc_core::stencil::*;
pub use gridcalc_core::storage::*;
pub use gridcalc_core::time::*;
pub use gridcalc_core::SimulationError;
