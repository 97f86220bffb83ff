//! Decomposition of a global domain into rectangular partitions and exchange of ghost data.
use gridcalc_concepts::{BoundaryError, DecomposeError, IndexBox, IndexOutOfRange, ZoneGeometry};

use crate::array::FabArray;
use crate::stencil::split_evenly;

/// Synchronizes the ghost halo of every partition with the interior of its neighbours.
///
/// After [exchange](HaloExchange::exchange) returns, every ghost cell which has a counterpart
/// in the domain holds the value of that counterpart. Callers must not start reading ghost
/// data before the exchange of the current step has completed.
pub trait HaloExchange<const D: usize> {
    /// Copies interior values into ghost cells.
    ///
    /// `fields[p]` is the array of partition `p`.
    fn exchange<T: Copy>(&self, fields: &mut [&mut FabArray<T, D>]) -> Result<(), IndexOutOfRange>;
}

/// A single ghost cell and the interior cell it is copied from.
#[derive(Clone, Debug, PartialEq)]
struct HaloCopy<const D: usize> {
    ghost: [i64; D],
    source_partition: usize,
    source: [i64; D],
}

/// Disjoint rectangular partitions of a global domain.
///
/// The domain is split along its outermost axis into contiguous partitions of near-equal size.
/// Axes can be periodic in which case ghost cells beyond the domain are filled from the
/// opposite side. Ghost cells beyond a non-periodic face are never written by the exchange.
///
/// Ghost cells beyond a non-periodic face keep whatever value they were initialized with.
/// A solver which streams from them sees a reservoir in that state rather than a closed
/// wall, so quantities like the total mass are only conserved if every axis is periodic.
///
/// ```
/// # use gridcalc_concepts::IndexBox;
/// # use gridcalc_core::layout::DisjointBoxLayout;
/// let domain = IndexBox::new([0, 0, 0], [7, 7, 9])?;
/// let layout = DisjointBoxLayout::decompose(domain, 3usize.try_into()?, 1, [true; 3])?;
/// assert_eq!(layout.n_partitions(), 3);
/// assert_eq!(layout.partitions()[0], IndexBox::new([0, 0, 0], [7, 7, 3])?);
/// assert_eq!(layout.partitions()[2], IndexBox::new([0, 0, 7], [7, 7, 9])?);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Clone, Debug)]
pub struct DisjointBoxLayout<const D: usize> {
    domain: IndexBox<D>,
    partitions: Vec<IndexBox<D>>,
    ghost: usize,
    periodic: [bool; D],
    origin: nalgebra::SVector<f64, D>,
    dx: f64,
    plan: Vec<Vec<HaloCopy<D>>>,
}

impl<const D: usize> DisjointBoxLayout<D> {
    /// Splits `domain` into `n_partitions` along its outermost axis and prepares the
    /// ghost exchange for a halo of width `ghost`.
    pub fn decompose(
        domain: IndexBox<D>,
        n_partitions: core::num::NonZeroUsize,
        ghost: usize,
        periodic: [bool; D],
    ) -> Result<Self, DecomposeError> {
        if domain.is_empty() {
            return Err(DecomposeError::Generic(
                "Cannot decompose an empty domain".to_owned(),
            ));
        }
        let outer = D - 1;
        let extent = domain.dimensions()[outer];
        if n_partitions.get() > extent {
            return Err(DecomposeError::Generic(format!(
                "Could not find a suiting decomposition of {} planes into {} partitions",
                extent, n_partitions
            )));
        }
        let mut partitions = Vec::with_capacity(n_partitions.get());
        let mut lo = domain.lo()[outer];
        for len in split_evenly(extent, n_partitions.get()) {
            partitions.push(domain.restrict_axis(outer, lo, lo + len as i64 - 1));
            lo += len as i64;
        }
        Self::from_partitions(domain, partitions, ghost, periodic)
    }

    /// Uses the given partitions which must be disjoint and cover the domain.
    pub fn from_partitions(
        domain: IndexBox<D>,
        partitions: Vec<IndexBox<D>>,
        ghost: usize,
        periodic: [bool; D],
    ) -> Result<Self, DecomposeError> {
        let n_covered: usize = partitions.iter().map(|p| p.n_cells()).sum();
        for (n, p) in partitions.iter().enumerate() {
            if p.is_empty() || !domain.contains_box(p) {
                return Err(BoundaryError(format!(
                    "Partition {} {} is empty or not contained in domain {}",
                    n, p, domain
                ))
                .into());
            }
            for q in partitions.iter().skip(n + 1) {
                if p.intersection(q).is_some() {
                    return Err(DecomposeError::Generic(format!(
                        "Partitions {} and {} overlap",
                        p, q
                    )));
                }
            }
        }
        if n_covered != domain.n_cells() {
            return Err(DecomposeError::Generic(format!(
                "Partitions cover {} of the {} cells of domain {}",
                n_covered,
                domain.n_cells(),
                domain
            )));
        }
        let mut layout = Self {
            domain,
            partitions,
            ghost,
            periodic,
            origin: nalgebra::SVector::<f64, D>::zeros(),
            dx: 1.0,
            plan: Vec::new(),
        };
        layout.plan = layout.build_plan();
        Ok(layout)
    }

    /// Sets the physical position of the lower corner of cell `[0; D]` and the cell spacing.
    pub fn with_geometry(
        self,
        origin: impl Into<nalgebra::SVector<f64, D>>,
        dx: f64,
    ) -> Result<Self, BoundaryError> {
        if !(dx > 0.0 && dx.is_finite()) {
            return Err(BoundaryError(format!(
                "Cell spacing must be positive and finite but is {}",
                dx
            )));
        }
        Ok(Self {
            origin: origin.into(),
            dx,
            ..self
        })
    }

    /// Maps an index outside of the domain onto its periodic image.
    fn periodic_image(&self, index: &[i64; D]) -> [i64; D] {
        let lo = self.domain.lo();
        let dims = self.domain.dimensions();
        core::array::from_fn(|a| match self.periodic[a] {
            true => lo[a] + (index[a] - lo[a]).rem_euclid(dims[a] as i64),
            false => index[a],
        })
    }

    fn build_plan(&self) -> Vec<Vec<HaloCopy<D>>> {
        self.partitions
            .iter()
            .map(|partition| {
                partition
                    .grow(self.ghost as i64)
                    .cells()
                    .filter(|ghost| !partition.contains(ghost))
                    .filter_map(|ghost| {
                        let source = self.periodic_image(&ghost);
                        self.owner_of(&source).map(|source_partition| HaloCopy {
                            ghost,
                            source_partition,
                            source,
                        })
                    })
                    .collect()
            })
            .collect()
    }

    /// Index of the partition containing the given cell.
    pub fn owner_of(&self, index: &[i64; D]) -> Option<usize> {
        self.partitions.iter().position(|p| p.contains(index))
    }

    /// The global domain
    pub fn domain(&self) -> IndexBox<D> {
        self.domain
    }

    /// All partitions ordered by their global index
    pub fn partitions(&self) -> &[IndexBox<D>] {
        &self.partitions
    }

    /// Number of partitions
    pub fn n_partitions(&self) -> usize {
        self.partitions.len()
    }

    /// Width of the ghost halo of every partition
    pub fn ghost(&self) -> usize {
        self.ghost
    }

    /// Periodicity of every axis
    pub fn periodic(&self) -> [bool; D] {
        self.periodic
    }

    /// Number of ghost cells of partition `p` which are filled by the exchange.
    pub fn n_halo_cells(&self, p: usize) -> usize {
        self.plan.get(p).map_or(0, |copies| copies.len())
    }

    /// Difference between the zone number in a plot file and the partition index.
    ///
    /// Zones are numbered starting from one.
    pub fn zone_offset(&self) -> usize {
        1
    }

    /// Geometry of partition `p` as written into plot files.
    pub fn geometry(&self, p: usize) -> Option<ZoneGeometry<D>> {
        self.partitions.get(p).map(|cells| ZoneGeometry {
            cells: *cells,
            origin: self.origin,
            dx: self.dx,
        })
    }
}

impl<const D: usize> HaloExchange<D> for DisjointBoxLayout<D> {
    fn exchange<T: Copy>(&self, fields: &mut [&mut FabArray<T, D>]) -> Result<(), IndexOutOfRange> {
        if fields.len() != self.partitions.len() {
            return Err(IndexOutOfRange(format!(
                "Received {} fields for {} partitions",
                fields.len(),
                self.partitions.len()
            )));
        }
        for (p, field) in fields.iter().enumerate() {
            if field.valid_box() != self.partitions[p] || field.ghost() < self.ghost {
                return Err(IndexOutOfRange(format!(
                    "Field over {} with {} ghost cells does not match partition {} {} with {} ghost cells",
                    field.valid_box(),
                    field.ghost(),
                    p,
                    self.partitions[p],
                    self.ghost
                )));
            }
        }
        let n_components = fields.first().map_or(0, |f| f.n_components());
        if fields.iter().any(|f| f.n_components() != n_components) {
            return Err(IndexOutOfRange(
                "All exchanged fields need the same number of components".to_owned(),
            ));
        }
        for (p, copies) in self.plan.iter().enumerate() {
            // Gather first since a partition can be its own neighbour in periodic directions
            let values: Vec<T> = copies
                .iter()
                .flat_map(|copy| fields[copy.source_partition].cell(&copy.source).iter().copied())
                .collect();
            for (copy, cell) in copies.iter().zip(values.chunks_exact(n_components)) {
                fields[p].cell_mut(&copy.ghost).copy_from_slice(cell);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn marked_fields(layout: &DisjointBoxLayout<2>) -> Vec<FabArray<i64, 2>> {
        layout
            .partitions()
            .iter()
            .map(|p| {
                let mut field = FabArray::new(*p, layout.ghost(), 2, -1).unwrap();
                for index in p.cells() {
                    field.cell_mut(&index).copy_from_slice(&[index[0], index[1]]);
                }
                field
            })
            .collect()
    }

    #[test]
    fn decomposition_covers_domain() {
        let domain = IndexBox::new([0, 0, 0], [3, 3, 12]).unwrap();
        for n in 1..=13 {
            let layout =
                DisjointBoxLayout::decompose(domain, n.try_into().unwrap(), 1, [false; 3]).unwrap();
            assert_eq!(layout.n_partitions(), n);
            for index in domain.cells() {
                assert!(layout.owner_of(&index).is_some());
            }
        }
        assert!(DisjointBoxLayout::decompose(domain, 14usize.try_into().unwrap(), 1, [false; 3]).is_err());
    }

    #[test]
    fn reject_overlapping_partitions() {
        let domain = IndexBox::new([0, 0], [3, 3]).unwrap();
        let partitions = vec![
            IndexBox::new([0, 0], [3, 2]).unwrap(),
            IndexBox::new([0, 2], [3, 3]).unwrap(),
        ];
        assert!(DisjointBoxLayout::from_partitions(domain, partitions, 1, [true; 2]).is_err());
        let partitions = vec![IndexBox::new([0, 0], [3, 2]).unwrap()];
        assert!(DisjointBoxLayout::from_partitions(domain, partitions, 1, [true; 2]).is_err());
    }

    #[test]
    fn periodic_single_partition_wraps_around() {
        let domain = IndexBox::new([0, 0], [3, 4]).unwrap();
        let layout = DisjointBoxLayout::decompose(domain, 1usize.try_into().unwrap(), 1, [true; 2]).unwrap();
        let mut fields = marked_fields(&layout);
        let mut refs: Vec<_> = fields.iter_mut().collect();
        layout.exchange(&mut refs).unwrap();
        let field = &fields[0];
        assert_eq!(field.cell(&[-1, 2]), &[3, 2]);
        assert_eq!(field.cell(&[4, 2]), &[0, 2]);
        assert_eq!(field.cell(&[1, -1]), &[1, 4]);
        assert_eq!(field.cell(&[1, 5]), &[1, 0]);
        assert_eq!(field.cell(&[-1, -1]), &[3, 4]);
        assert_eq!(field.cell(&[4, 5]), &[0, 0]);
    }

    #[test]
    fn exchange_between_partitions() {
        let domain = IndexBox::new([0, 0], [3, 7]).unwrap();
        let layout = DisjointBoxLayout::decompose(domain, 2usize.try_into().unwrap(), 1, [false, true]).unwrap();
        let mut fields = marked_fields(&layout);
        let mut refs: Vec<_> = fields.iter_mut().collect();
        layout.exchange(&mut refs).unwrap();
        // upper halo of the first partition comes from the second one
        assert_eq!(fields[0].cell(&[2, 4]), &[2, 4]);
        // lower halo of the first partition wraps to the top of the domain
        assert_eq!(fields[0].cell(&[2, -1]), &[2, 7]);
        assert_eq!(fields[1].cell(&[0, 3]), &[0, 3]);
        assert_eq!(fields[1].cell(&[0, 8]), &[0, 0]);
        // non-periodic axis is left untouched
        assert_eq!(fields[0].cell(&[-1, 2]), &[-1, -1]);
        assert_eq!(fields[1].cell(&[4, 6]), &[-1, -1]);
        assert_eq!(layout.n_halo_cells(0), 2 * 4);
    }

    #[test]
    fn exchange_rejects_mismatching_fields() {
        let domain = IndexBox::new([0, 0], [3, 7]).unwrap();
        let layout = DisjointBoxLayout::decompose(domain, 2usize.try_into().unwrap(), 1, [true; 2]).unwrap();
        let mut fields = marked_fields(&layout);
        fields.swap(0, 1);
        let mut refs: Vec<_> = fields.iter_mut().collect();
        assert!(layout.exchange(&mut refs).is_err());
        let mut refs: Vec<_> = fields.iter_mut().take(1).collect();
        assert!(layout.exchange(&mut refs).is_err());
    }

    #[test]
    fn zone_geometry_follows_partitions() {
        let domain = IndexBox::new([0, 0], [3, 7]).unwrap();
        let layout = DisjointBoxLayout::decompose(domain, 2usize.try_into().unwrap(), 1, [true; 2])
            .unwrap()
            .with_geometry([1.0, 2.0], 0.5)
            .unwrap();
        let geometry = layout.geometry(1).unwrap();
        assert_eq!(geometry.cells, layout.partitions()[1]);
        assert_eq!(geometry.dx, 0.5);
        assert_eq!(geometry.origin[1], 2.0);
        assert!(layout.geometry(2).is_none());
        assert_eq!(layout.zone_offset(), 1);
    }
}
