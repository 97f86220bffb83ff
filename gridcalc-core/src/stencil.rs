//! Fork-join loops over the cells of a box.
//!
//! Sequential loops are provided by [IndexBox::cells] and [IndexBox::pencils].
//! The [WorkerPool] splits the outermost axis of a box into disjoint contiguous ranges
//! and runs one task per range.
use gridcalc_concepts::{IndexBox, IndexOutOfRange};
use rayon::prelude::*;

use crate::array::{FabArray, SlabMut};

/// Calculates the decomposition of `n_items` into `n_regions` as evenly-sized chunks as possible.
///
/// Returns `(n, m, average_len)` such that
/// `n_items = n * average_len + m * (average_len - 1)` and `n + m = n_regions`.
///
/// ```text
/// N   n   decomp
/// 10  3    1 *  4  +  2 *  3
/// 13  4    1 *  4  +  3 *  3
/// 100 13   9 *  8  +  4 *  7
/// ```
pub(crate) fn get_decomp_res(n_items: usize, n_regions: usize) -> Option<(usize, usize, usize)> {
    if n_regions == 0 {
        return None;
    }
    // Start with the largest possible average length and trade regions of the average length
    // for regions which are one item shorter until the residue vanishes.
    let mut average_len: i64 = (n_items as f64 / n_regions as f64).ceil() as i64;

    let residue = |n: i64, m: i64, avg: i64| n_items as i64 - avg * n - (avg - 1) * m;

    let mut n = n_regions as i64;
    let mut m = 0;

    for _ in 0..2 * n_regions + 1 {
        let r = residue(n, m, average_len);
        if r == 0 {
            return Some((n as usize, m as usize, average_len as usize));
        } else if r > 0 {
            if n == n_regions as i64 {
                average_len += 1;
                n = n_regions as i64;
                m = 0;
            } else {
                n += 1;
                m -= 1;
            }
        } else {
            n -= 1;
            m += 1;
        }
    }
    None
}

/// Splits `n_items` into at most `n_regions` contiguous, non-empty ranges of near-equal length.
///
/// Longer ranges come first.
/// ```
/// # use gridcalc_core::stencil::split_evenly;
/// assert_eq!(split_evenly(10, 3), vec![4, 3, 3]);
/// assert_eq!(split_evenly(2, 5), vec![1, 1]);
/// assert_eq!(split_evenly(0, 5), Vec::<usize>::new());
/// ```
pub fn split_evenly(n_items: usize, n_regions: usize) -> Vec<usize> {
    let n_regions = n_regions.min(n_items);
    match get_decomp_res(n_items, n_regions) {
        Some((n, m, average_len)) => std::iter::repeat(average_len)
            .take(n)
            .chain(std::iter::repeat(average_len.saturating_sub(1)).take(m))
            .filter(|&len| len > 0)
            .collect(),
        None => Vec::new(),
    }
}

/// Fixed-size pool of workers executing fork-join loops over the outermost axis of a box.
///
/// ```
/// # use gridcalc_concepts::IndexBox;
/// # use gridcalc_core::{array::FabArray, stencil::WorkerPool};
/// let pool = WorkerPool::new(3usize.try_into().unwrap())?;
/// let mut array = FabArray::new(IndexBox::new([0, 0], [7, 5])?, 1, 1, 0.0)?;
/// let region = array.valid_box();
/// let n_cells = pool.map_slabs(&mut array, &region, |mut slab| {
///     let cells: Vec<_> = slab.region().cells().collect();
///     for index in cells.iter() {
///         *slab.value_mut(index, 0) = 1.0;
///     }
///     cells.len()
/// })?;
/// assert_eq!(n_cells, vec![16, 16, 16]);
/// assert_eq!(array.as_slice().iter().sum::<f64>(), 48.0);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct WorkerPool {
    pool: rayon::ThreadPool,
    n_workers: core::num::NonZeroUsize,
}

impl WorkerPool {
    /// Builds a new pool with `n_workers` threads.
    pub fn new(n_workers: core::num::NonZeroUsize) -> Result<Self, rayon::ThreadPoolBuildError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(n_workers.get())
            .thread_name(|n| format!("gridcalc-worker-{}", n))
            .build()?;
        Ok(Self { pool, n_workers })
    }

    /// Number of threads of this pool
    pub fn n_workers(&self) -> usize {
        self.n_workers.get()
    }

    /// Splits `region` along its outermost axis into at most [n_workers](Self::n_workers)
    /// disjoint slabs of `array` and applies `op` to every slab in parallel.
    ///
    /// The results are returned in the order of the slabs.
    /// Workers write disjoint cells and thus do not need any synchronization.
    pub fn map_slabs<'a, T, R, const D: usize, Op>(
        &self,
        array: &'a mut FabArray<T, D>,
        region: &IndexBox<D>,
        op: Op,
    ) -> Result<Vec<R>, IndexOutOfRange>
    where
        T: Send,
        R: Send,
        Op: Fn(SlabMut<'a, T, D>) -> R + Sync + Send,
    {
        let lengths = match region.is_empty() {
            true => Vec::new(),
            false => split_evenly(region.dimensions()[D - 1], self.n_workers()),
        };
        let slabs = array.slabs_mut(region, &lengths)?;
        Ok(self
            .pool
            .install(|| slabs.into_par_iter().map(op).collect()))
    }

    /// Runs `op` on every cell of `region` in parallel, giving mutable access to all
    /// components of that cell.
    pub fn for_each_cell<T, const D: usize, Op>(
        &self,
        array: &mut FabArray<T, D>,
        region: &IndexBox<D>,
        op: Op,
    ) -> Result<(), IndexOutOfRange>
    where
        T: Send,
        Op: Fn(&[i64; D], &mut [T]) + Sync + Send,
    {
        self.map_slabs(array, region, |mut slab| {
            for index in slab.region().cells() {
                op(&index, slab.cell_mut(&index));
            }
        })?;
        Ok(())
    }
}

impl core::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("n_workers", &self.n_workers)
            .finish()
    }
}
