use core::marker::PhantomData;

use gridcalc_concepts::{
    BoundaryError, DegenerateDensity, IndexBox, IndexOutOfRange, SetupError, SolutionField,
};
use gridcalc_core::array::FabArray;
use gridcalc_core::direction::offset_index;
use gridcalc_core::layout::HaloExchange;
use gridcalc_core::stencil::WorkerPool;
use gridcalc_core::SimulationError;

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::lattice::LatticeDirections;
use crate::parameters::LbParameters;
use crate::physics::{collide_cell, is_degenerate, moments};

const STATE_NAMES: [&str; 4] = ["Density", "VelocityX", "VelocityY", "VelocityZ"];

/// Degenerate cells listed in the message of a [DegenerateDensity] error
const MAX_REPORTED_CELLS: usize = 16;

/// Collision, streaming and moment computation for the cells of one partition.
///
/// The kernel owns two distribution fields with `Q` components and one macroscopic field
/// with `D + 1` components (density followed by the velocity components).
/// All fields cover the valid box of the partition extended by a ghost halo.
///
/// One [advance](LatticeBoltzmannKernel::advance) consists of the following phases.
///
/// | Phase | reads | writes |
/// | --- | --- | --- |
/// | [collide](LatticeBoltzmannKernel::collide) | macroscopic | latest distribution (in place) |
/// | [HaloExchange::exchange] | latest distribution | ghost cells of the latest distribution |
/// | [stream](LatticeBoltzmannKernel::stream) | latest distribution | other distribution, then swapped |
/// | [compute_macroscopic](LatticeBoltzmannKernel::compute_macroscopic) | latest distribution | macroscopic |
///
/// ```
/// # use gridcalc_building_blocks::*;
/// # use gridcalc_concepts::IndexBox;
/// # use gridcalc_core::{layout::DisjointBoxLayout, stencil::WorkerPool};
/// let domain = IndexBox::new([0, 0, 0], [3, 3, 3])?;
/// let layout = DisjointBoxLayout::decompose(domain, 1usize.try_into()?, 1, [true; 3])?;
/// let pool = WorkerPool::new(2usize.try_into()?)?;
/// let parameters = LbParameters::for_lattice::<D3Q19, 3>(0.6, 0.0)?;
///
/// let mut kernel = LatticeBoltzmannKernel::<D3Q19, 3>::new(domain, 1)?;
/// kernel.advance(&parameters, &pool, &layout)?;
/// approx::assert_relative_eq!(kernel.total_mass(), 64.0, epsilon = 1e-12);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Clone, Debug)]
pub struct LatticeBoltzmannKernel<L, const D: usize> {
    valid: IndexBox<D>,
    current: FabArray<f64, D>,
    previous: FabArray<f64, D>,
    macroscopic: FabArray<f64, D>,
    lattice: PhantomData<L>,
}

impl<L, const D: usize> LatticeBoltzmannKernel<L, D>
where
    L: LatticeDirections<D>,
{
    /// Allocates all fields over `valid` extended by `ghost` cells and
    /// [initializes](Self::initialize) them.
    pub fn new(valid: IndexBox<D>, ghost: usize) -> Result<Self, SetupError> {
        if ghost < L::max_offset() {
            return Err(SetupError(format!(
                "Streaming with {} needs at least {} ghost cells but only {} were given",
                L::NAME,
                L::max_offset(),
                ghost
            )));
        }
        if D > STATE_NAMES.len() - 1 {
            return Err(BoundaryError(format!(
                "Macroscopic fields are only available up to {} dimensions",
                STATE_NAMES.len() - 1
            ))
            .into());
        }
        let distribution = FabArray::new(valid, ghost, L::Q, 0.0)?;
        let mut kernel = Self {
            valid,
            current: distribution.clone(),
            previous: distribution,
            macroscopic: FabArray::new(valid, ghost, D + 1, 0.0)?,
            lattice: PhantomData,
        };
        kernel.initialize();
        Ok(kernel)
    }

    /// Sets both distribution fields to the lattice weights and the macroscopic field to
    /// density `1` and velocity `0`, including all ghost cells.
    #[cfg_attr(feature = "tracing", instrument(skip_all))]
    pub fn initialize(&mut self) {
        let weights = L::weights();
        for field in [&mut self.current, &mut self.previous] {
            field
                .as_mut_slice()
                .chunks_exact_mut(L::Q)
                .for_each(|cell| cell.copy_from_slice(weights));
        }
        self.macroscopic
            .as_mut_slice()
            .chunks_exact_mut(D + 1)
            .for_each(|cell| {
                cell[0] = 1.0;
                cell[1..].fill(0.0);
            });
    }

    /// BGK collision of every valid cell, performed in place on the latest distribution.
    #[cfg_attr(feature = "tracing", instrument(skip_all))]
    pub fn collide(
        &mut self,
        parameters: &LbParameters,
        pool: &WorkerPool,
    ) -> Result<(), IndexOutOfRange> {
        let macroscopic = &self.macroscopic;
        pool.map_slabs(&mut self.previous, &self.valid, |mut slab| {
            for index in slab.region().cells() {
                let rho = macroscopic.value(&index, 0);
                let u: [f64; D] = core::array::from_fn(|a| macroscopic.value(&index, a + 1));
                collide_cell::<L, D>(slab.cell_mut(&index), rho, &u, parameters);
            }
        })?;
        Ok(())
    }

    /// Pulls every direction of every valid cell from its upstream neighbour
    /// `x - e_i` and swaps the roles of both distribution fields.
    ///
    /// Ghost cells of the latest distribution must be filled before streaming.
    #[cfg_attr(feature = "tracing", instrument(skip_all))]
    pub fn stream(&mut self, pool: &WorkerPool) -> Result<(), IndexOutOfRange> {
        let source = &self.previous;
        let n_inner = self.valid.dimensions()[0];
        pool.map_slabs(&mut self.current, &self.valid, |mut slab| {
            for start in slab.region().pencils() {
                let target = slab.pencil_mut(&start, n_inner);
                for (i, e) in L::velocities().iter().enumerate() {
                    let upstream = source.pencil(&offset_index(&start, e, -1), n_inner);
                    for (to, from) in target
                        .chunks_exact_mut(L::Q)
                        .zip(upstream.chunks_exact(L::Q))
                    {
                        to[i] = from[i];
                    }
                }
            }
        })?;
        core::mem::swap(&mut self.current, &mut self.previous);
        Ok(())
    }

    /// Computes density and velocity of every valid cell from the latest distribution.
    ///
    /// Fails with [DegenerateDensity] if the density of any cell is not finite or not above
    /// [LbParameters::density_epsilon] in absolute value.
    /// The message lists the location and density of the degenerate cells.
    /// The velocity of such cells is left unchanged while all other cells are updated.
    #[cfg_attr(feature = "tracing", instrument(skip_all))]
    pub fn compute_macroscopic(
        &mut self,
        parameters: &LbParameters,
        pool: &WorkerPool,
    ) -> Result<(), SimulationError> {
        let distribution = &self.previous;
        let epsilon = parameters.density_epsilon;
        let degenerate_cells = pool.map_slabs(&mut self.macroscopic, &self.valid, |mut slab| {
            let mut degenerate_cells = Vec::new();
            for index in slab.region().cells() {
                let (rho, momentum) = moments::<L, D>(distribution.cell(&index));
                let cell = slab.cell_mut(&index);
                cell[0] = rho;
                if is_degenerate(rho, epsilon) {
                    degenerate_cells.push((index, rho));
                    continue;
                }
                for a in 0..D {
                    cell[a + 1] = momentum[a] / rho;
                }
            }
            degenerate_cells
        })?;
        let degenerate_cells: Vec<_> = degenerate_cells.into_iter().flatten().collect();
        match degenerate_cells.first() {
            None => Ok(()),
            Some((index, rho)) => {
                #[cfg(feature = "tracing")]
                for (index, rho) in degenerate_cells.iter() {
                    tracing::error!(cell = ?index, rho, "degenerate density");
                }
                let mut locations: Vec<_> = degenerate_cells
                    .iter()
                    .take(MAX_REPORTED_CELLS)
                    .map(|(index, rho)| format!("{:?} (rho = {})", index, rho))
                    .collect();
                if degenerate_cells.len() > MAX_REPORTED_CELLS {
                    locations.push(format!(
                        "and {} more",
                        degenerate_cells.len() - MAX_REPORTED_CELLS
                    ));
                }
                Err(DegenerateDensity(format!(
                    "Density {} at cell {:?} is degenerate ({} degenerate cells in {}: {})",
                    rho,
                    index,
                    degenerate_cells.len(),
                    self.valid,
                    locations.join(", ")
                ))
                .into())
            }
        }
    }

    /// Performs one full step of this partition.
    ///
    /// `halo` fills the ghost cells between collision and streaming. It receives exactly
    /// one field so it needs to describe a layout with a single partition.
    #[cfg_attr(feature = "tracing", instrument(skip_all))]
    pub fn advance<H>(
        &mut self,
        parameters: &LbParameters,
        pool: &WorkerPool,
        halo: &H,
    ) -> Result<(), SimulationError>
    where
        H: HaloExchange<D>,
    {
        self.collide(parameters, pool)?;
        halo.exchange(&mut [&mut self.previous])?;
        self.stream(pool)?;
        self.compute_macroscopic(parameters, pool)
    }

    /// Sum of the density over all valid cells.
    pub fn total_mass(&self) -> f64 {
        self.valid
            .cells()
            .map(|index| self.macroscopic.value(&index, 0))
            .sum()
    }

    /// The cells owned by this kernel
    pub fn valid_box(&self) -> IndexBox<D> {
        self.valid
    }

    /// Width of the ghost halo of all fields
    pub fn ghost(&self) -> usize {
        self.macroscopic.ghost()
    }

    /// Latest distribution, ie. the result of the last streaming step.
    pub fn distribution(&self) -> &FabArray<f64, D> {
        &self.previous
    }

    /// Mutable access to the latest distribution.
    ///
    /// This is the field which is read by the next [collide](Self::collide) and whose ghost
    /// cells need to be exchanged before the next [stream](Self::stream).
    pub fn distribution_mut(&mut self) -> &mut FabArray<f64, D> {
        &mut self.previous
    }

    /// Density followed by the velocity components of every cell
    pub fn macroscopic(&self) -> &FabArray<f64, D> {
        &self.macroscopic
    }

    /// Names of the components of the [macroscopic](Self::macroscopic) field.
    ///
    /// Empty if `D` exceeds the number of named velocity components.
    pub fn state_names() -> &'static [&'static str] {
        STATE_NAMES.get(..D + 1).unwrap_or_default()
    }

    /// Macroscopic fields of all valid cells as written into plot files.
    pub fn solution_fields(&self) -> Vec<SolutionField> {
        Self::state_names()
            .iter()
            .enumerate()
            .map(|(c, name)| SolutionField {
                name: name.to_string(),
                values: self
                    .valid
                    .cells()
                    .map(|index| self.macroscopic.value(&index, c))
                    .collect(),
            })
            .collect()
    }
}
