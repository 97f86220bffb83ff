//! Dense per-cell, per-component storage over a ghost-extended [IndexBox].
//!
//! Values are stored cell by cell with all components of a cell next to each other.
//! Cells are ordered lexicographically with axis `0` varying fastest.
//! For a storage box `S = valid.grow(ghost)` the offset of component `c` at index `idx` is
//!
//! ```text
//! offset = n_components * Σ_a (idx[a] - S.lo[a]) * stride[a] + c
//! stride[0] = 1,  stride[a] = stride[a-1] * S.dimensions[a-1]
//! ```
//!
//! Thus a pencil (a row of cells along axis `0`) is one contiguous slice and so is every
//! plane of the outermost axis, which allows to hand out disjoint [SlabMut]s to workers.
use gridcalc_concepts::{BoundaryError, IndexBox, IndexOutOfRange};

use crate::direction::dir_sum;

/// Addressing information shared by a [FabArray] and all views onto it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ArrayLayout<const D: usize> {
    valid: IndexBox<D>,
    ghost: usize,
    storage: IndexBox<D>,
    n_components: usize,
    strides: [usize; D],
}

impl<const D: usize> ArrayLayout<D> {
    /// Computes the layout of `n_components` values per cell over `valid` grown by `ghost`.
    pub fn new(valid: IndexBox<D>, ghost: usize, n_components: usize) -> Result<Self, BoundaryError> {
        if valid.is_empty() {
            return Err(BoundaryError(
                "Cannot lay out an array over an empty box".to_owned(),
            ));
        }
        if n_components == 0 {
            return Err(BoundaryError(
                "An array needs at least one component per cell".to_owned(),
            ));
        }
        let storage = valid.grow(ghost as i64);
        let dims = storage.dimensions();
        let mut strides = [1; D];
        for a in 1..D {
            strides[a] = strides[a - 1] * dims[a - 1];
        }
        Ok(Self {
            valid,
            ghost,
            storage,
            n_components,
            strides,
        })
    }

    /// Cells without the ghost halo
    pub fn valid_box(&self) -> IndexBox<D> {
        self.valid
    }

    /// Cells including the ghost halo
    pub fn storage_box(&self) -> IndexBox<D> {
        self.storage
    }

    /// Width of the ghost halo
    pub fn ghost(&self) -> usize {
        self.ghost
    }

    /// Number of values stored per cell
    pub fn n_components(&self) -> usize {
        self.n_components
    }

    /// Distance in cells between neighbours along every axis
    pub fn strides(&self) -> [usize; D] {
        self.strides
    }

    /// Total number of values
    pub fn len(&self) -> usize {
        self.storage.n_cells() * self.n_components
    }

    /// Number of values in one plane of the outermost axis
    pub fn plane_len(&self) -> usize {
        self.strides[D - 1] * self.n_components
    }

    /// Offset of the first component of the cell at `index`.
    ///
    /// The index is not validated in release builds.
    #[inline(always)]
    pub fn cell_offset(&self, index: &[i64; D]) -> usize {
        debug_assert!(
            self.storage.contains(index),
            "index {:?} outside of {}",
            index,
            self.storage
        );
        let lo = self.storage.lo();
        let cell = dir_sum::<D, i64, _>(|a, _| (index[a] - lo[a]) * self.strides[a] as i64);
        cell as usize * self.n_components
    }

    /// Offset of component `c` at `index` without validation in release builds.
    #[inline(always)]
    pub fn offset(&self, index: &[i64; D], c: usize) -> usize {
        debug_assert!(c < self.n_components);
        self.cell_offset(index) + c
    }

    /// Offset of component `c` at `index` which fails if the pair is out of range.
    pub fn checked_offset(&self, index: &[i64; D], c: usize) -> Result<usize, IndexOutOfRange> {
        if !self.storage.contains(index) {
            return Err(IndexOutOfRange(format!(
                "Index {:?} lies outside of {} (valid box {} with {} ghost cells)",
                index, self.storage, self.valid, self.ghost
            )));
        }
        if c >= self.n_components {
            return Err(IndexOutOfRange(format!(
                "Component {} at index {:?} exceeds the {} components of this array",
                c, index, self.n_components
            )));
        }
        Ok(self.offset(index, c))
    }
}

/// Owned dense array holding `n_components` values for every cell of a ghost-extended box.
///
/// ```
/// # use gridcalc_concepts::IndexBox;
/// # use gridcalc_core::array::FabArray;
/// let valid = IndexBox::new([0, 0, 0], [3, 3, 3])?;
/// let mut array = FabArray::new(valid, 1, 4, 0.0)?;
/// array.set(&[-1, 0, 4], 3, 2.5)?;
/// assert_eq!(*array.get(&[-1, 0, 4], 3)?, 2.5);
/// assert!(array.get(&[-2, 0, 0], 0).is_err());
/// assert!(array.get(&[0, 0, 0], 4).is_err());
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct FabArray<T, const D: usize> {
    layout: ArrayLayout<D>,
    data: Vec<T>,
}

impl<T, const D: usize> FabArray<T, D> {
    /// Allocates a new array and fills every value (including ghost cells) with `init`.
    pub fn new(
        valid: IndexBox<D>,
        ghost: usize,
        n_components: usize,
        init: T,
    ) -> Result<Self, BoundaryError>
    where
        T: Clone,
    {
        let layout = ArrayLayout::new(valid, ghost, n_components)?;
        Ok(Self {
            data: vec![init; layout.len()],
            layout,
        })
    }

    /// See [ArrayLayout]
    pub fn layout(&self) -> &ArrayLayout<D> {
        &self.layout
    }

    /// See [ArrayLayout::valid_box]
    pub fn valid_box(&self) -> IndexBox<D> {
        self.layout.valid
    }

    /// See [ArrayLayout::storage_box]
    pub fn storage_box(&self) -> IndexBox<D> {
        self.layout.storage
    }

    /// See [ArrayLayout::ghost]
    pub fn ghost(&self) -> usize {
        self.layout.ghost
    }

    /// See [ArrayLayout::n_components]
    pub fn n_components(&self) -> usize {
        self.layout.n_components
    }

    /// Checked read access
    pub fn get(&self, index: &[i64; D], c: usize) -> Result<&T, IndexOutOfRange> {
        let offset = self.layout.checked_offset(index, c)?;
        Ok(&self.data[offset])
    }

    /// Checked write access
    pub fn get_mut(&mut self, index: &[i64; D], c: usize) -> Result<&mut T, IndexOutOfRange> {
        let offset = self.layout.checked_offset(index, c)?;
        Ok(&mut self.data[offset])
    }

    /// Checked assignment of a single value
    pub fn set(&mut self, index: &[i64; D], c: usize, value: T) -> Result<(), IndexOutOfRange> {
        *self.get_mut(index, c)? = value;
        Ok(())
    }

    /// Trusted read access for loops which are bounded by the storage box.
    #[inline(always)]
    pub fn value(&self, index: &[i64; D], c: usize) -> T
    where
        T: Copy,
    {
        self.data[self.layout.offset(index, c)]
    }

    /// Trusted write access for loops which are bounded by the storage box.
    #[inline(always)]
    pub fn value_mut(&mut self, index: &[i64; D], c: usize) -> &mut T {
        let offset = self.layout.offset(index, c);
        &mut self.data[offset]
    }

    /// All components of one cell (trusted).
    #[inline(always)]
    pub fn cell(&self, index: &[i64; D]) -> &[T] {
        let start = self.layout.cell_offset(index);
        &self.data[start..start + self.layout.n_components]
    }

    /// All components of one cell (trusted).
    #[inline(always)]
    pub fn cell_mut(&mut self, index: &[i64; D]) -> &mut [T] {
        let start = self.layout.cell_offset(index);
        let n = self.layout.n_components;
        &mut self.data[start..start + n]
    }

    /// `len` consecutive cells along axis `0` starting at `start` (trusted).
    #[inline(always)]
    pub fn pencil(&self, start: &[i64; D], len: usize) -> &[T] {
        let first = self.layout.cell_offset(start);
        &self.data[first..first + len * self.layout.n_components]
    }

    /// `len` consecutive cells along axis `0` starting at `start` (trusted).
    #[inline(always)]
    pub fn pencil_mut(&mut self, start: &[i64; D], len: usize) -> &mut [T] {
        let first = self.layout.cell_offset(start);
        let n = self.layout.n_components;
        &mut self.data[first..first + len * n]
    }

    /// Flat view of the whole buffer including ghost cells.
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// Flat mutable view of the whole buffer including ghost cells.
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// Sets every value of the array (including ghost cells).
    pub fn fill(&mut self, value: T)
    where
        T: Clone,
    {
        self.data.fill(value);
    }

    /// Sets component `c` of every cell (including ghost cells).
    pub fn set_component(&mut self, c: usize, value: T) -> Result<(), IndexOutOfRange>
    where
        T: Clone,
    {
        let n = self.layout.n_components;
        if c >= n {
            return Err(IndexOutOfRange(format!(
                "Component {} exceeds the {} components of this array",
                c, n
            )));
        }
        self.data
            .chunks_exact_mut(n)
            .for_each(|cell| cell[c] = value.clone());
        Ok(())
    }

    /// Splits the outermost axis of `region` into `lengths.len()` consecutive slabs.
    ///
    /// Every slab borrows its own disjoint part of the buffer, namely all planes of the
    /// outermost axis which intersect with its sub-region.
    /// The slab lengths must add up to the extent of `region` in the outermost axis.
    pub fn slabs_mut(
        &mut self,
        region: &IndexBox<D>,
        lengths: &[usize],
    ) -> Result<Vec<SlabMut<'_, T, D>>, IndexOutOfRange> {
        if !self.layout.storage.contains_box(region) {
            return Err(IndexOutOfRange(format!(
                "Region {} is not contained in the storage box {}",
                region, self.layout.storage
            )));
        }
        if region.is_empty() {
            return Ok(Vec::new());
        }
        let outer = D - 1;
        let extent = region.dimensions()[outer];
        if lengths.iter().sum::<usize>() != extent {
            return Err(IndexOutOfRange(format!(
                "Slab lengths {:?} do not cover the {} planes of region {}",
                lengths, extent, region
            )));
        }
        let plane_len = self.layout.plane_len();
        let layout = self.layout;
        let first_plane = region.lo()[outer];
        let mut base =
            (first_plane - layout.storage.lo()[outer]) as usize * plane_len;
        let (_, mut rest) = self.data.split_at_mut(base);
        let mut plane = first_plane;
        let mut slabs = Vec::with_capacity(lengths.len());
        for &len in lengths.iter().filter(|&&len| len > 0) {
            let (head, tail) = core::mem::take(&mut rest).split_at_mut(len * plane_len);
            slabs.push(SlabMut {
                data: head,
                base,
                layout,
                region: region.restrict_axis(outer, plane, plane + len as i64 - 1),
            });
            rest = tail;
            base += len * plane_len;
            plane += len as i64;
        }
        Ok(slabs)
    }
}

/// Mutable window onto consecutive planes of the outermost axis of a [FabArray].
///
/// Slabs produced by [FabArray::slabs_mut] never overlap, so each of them can be handed
/// to a different worker. Indices passed to a slab are global indices.
#[derive(Debug)]
pub struct SlabMut<'a, T, const D: usize> {
    data: &'a mut [T],
    base: usize,
    layout: ArrayLayout<D>,
    region: IndexBox<D>,
}

impl<'a, T, const D: usize> SlabMut<'a, T, D> {
    /// The cells this slab is responsible for.
    pub fn region(&self) -> IndexBox<D> {
        self.region
    }

    /// Layout of the underlying array
    pub fn layout(&self) -> &ArrayLayout<D> {
        &self.layout
    }

    #[inline(always)]
    fn local(&self, offset: usize) -> usize {
        debug_assert!(offset >= self.base && offset - self.base < self.data.len());
        offset - self.base
    }

    /// Trusted read access to a cell inside the planes of this slab.
    #[inline(always)]
    pub fn value(&self, index: &[i64; D], c: usize) -> T
    where
        T: Copy,
    {
        self.data[self.local(self.layout.offset(index, c))]
    }

    /// Trusted write access to a cell inside the planes of this slab.
    #[inline(always)]
    pub fn value_mut(&mut self, index: &[i64; D], c: usize) -> &mut T {
        let offset = self.local(self.layout.offset(index, c));
        &mut self.data[offset]
    }

    /// All components of one cell (trusted).
    #[inline(always)]
    pub fn cell_mut(&mut self, index: &[i64; D]) -> &mut [T] {
        let start = self.local(self.layout.cell_offset(index));
        let n = self.layout.n_components;
        &mut self.data[start..start + n]
    }

    /// `len` consecutive cells along axis `0` starting at `start` (trusted).
    #[inline(always)]
    pub fn pencil_mut(&mut self, start: &[i64; D], len: usize) -> &mut [T] {
        let first = self.local(self.layout.cell_offset(start));
        let n = self.layout.n_components;
        &mut self.data[first..first + len * n]
    }
}
