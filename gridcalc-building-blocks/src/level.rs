use gridcalc_concepts::{DegenerateDensity, FileIoError, SetupError, ZoneWriter};
use gridcalc_core::layout::{DisjointBoxLayout, HaloExchange};
use gridcalc_core::stencil::WorkerPool;
use gridcalc_core::SimulationError;

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::kernel::LatticeBoltzmannKernel;
use crate::lattice::LatticeDirections;
use crate::parameters::LbParameters;

/// All partitions of a domain together with their kernels.
///
/// Every step runs each phase for all partitions before the next phase starts.
/// In particular the ghost cells of every partition are exchanged after all partitions
/// finished their collision and before any of them starts streaming.
#[derive(Clone, Debug)]
pub struct LbLevel<L, const D: usize> {
    layout: DisjointBoxLayout<D>,
    kernels: Vec<LatticeBoltzmannKernel<L, D>>,
}

impl<L, const D: usize> LbLevel<L, D>
where
    L: LatticeDirections<D>,
{
    /// Creates one initialized kernel per partition of the layout.
    pub fn new(layout: DisjointBoxLayout<D>) -> Result<Self, SetupError> {
        let kernels = layout
            .partitions()
            .iter()
            .map(|partition| LatticeBoltzmannKernel::new(*partition, layout.ghost()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { layout, kernels })
    }

    /// Resets every partition to the rest state.
    pub fn initialize(&mut self) {
        self.kernels.iter_mut().for_each(|kernel| kernel.initialize());
    }

    /// Performs one step on all partitions.
    ///
    /// The macroscopic fields of all partitions are updated even if some of them contain
    /// degenerate cells. The returned [DegenerateDensity] then covers every partition.
    #[cfg_attr(feature = "tracing", instrument(skip_all))]
    pub fn advance(
        &mut self,
        parameters: &LbParameters,
        pool: &WorkerPool,
    ) -> Result<(), SimulationError> {
        for kernel in self.kernels.iter_mut() {
            kernel.collide(parameters, pool)?;
        }
        let mut fields: Vec<_> = self
            .kernels
            .iter_mut()
            .map(|kernel| kernel.distribution_mut())
            .collect();
        self.layout.exchange(&mut fields)?;
        for kernel in self.kernels.iter_mut() {
            kernel.stream(pool)?;
        }
        let mut errors: Vec<_> = self
            .kernels
            .iter_mut()
            .filter_map(|kernel| kernel.compute_macroscopic(parameters, pool).err())
            .collect();
        match errors.len() {
            0 => Ok(()),
            1 => Err(errors.remove(0)),
            _ if errors
                .iter()
                .all(|error| matches!(error, SimulationError::DegenerateDensity(_))) =>
            {
                let messages: Vec<_> = errors.iter().map(|error| error.to_string()).collect();
                Err(DegenerateDensity(messages.join("; ")).into())
            }
            _ => Err(errors.remove(0)),
        }
    }

    /// Sum of the density over the whole domain.
    pub fn total_mass(&self) -> f64 {
        self.kernels.iter().map(|kernel| kernel.total_mass()).sum()
    }

    /// See [DisjointBoxLayout]
    pub fn layout(&self) -> &DisjointBoxLayout<D> {
        &self.layout
    }

    /// Kernels ordered by the index of their partition
    pub fn kernels(&self) -> &[LatticeBoltzmannKernel<L, D>] {
        &self.kernels
    }

    /// Mutable access to the kernels, eg. to prescribe an initial state.
    pub fn kernels_mut(&mut self) -> &mut [LatticeBoltzmannKernel<L, D>] {
        &mut self.kernels
    }

    /// Writes geometry and macroscopic state of all partitions into the file at `path`.
    ///
    /// Partition `p` is written as zone `p + zone_offset`.
    /// The first stage which fails aborts the file and its error is returned.
    /// The state of the simulation is not modified.
    #[cfg_attr(feature = "tracing", instrument(skip(self, writer)))]
    pub fn write_plot_file<W>(&self, path: &std::path::Path, writer: &mut W) -> Result<(), FileIoError>
    where
        W: ZoneWriter<D>,
    {
        let zone_offset = self.layout.zone_offset();
        writer.open(path)?;
        for p in 0..self.kernels.len() {
            let geometry = self.layout.geometry(p).ok_or(FileIoError(format!(
                "Layout has no geometry for partition {}",
                p
            )))?;
            writer.write_zone_grid(p + zone_offset, &geometry)?;
        }
        for (p, kernel) in self.kernels.iter().enumerate() {
            writer.write_solution(p + zone_offset, &kernel.solution_fields())?;
        }
        writer.close()
    }
}
