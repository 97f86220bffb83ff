//! Fixed-size accumulation over the `D` axes of the grid.
//!
//! `D` is a compile-time constant, so the loops below have a known trip count and are
//! fully unrolled by the compiler for every dimension in use.

/// Unit offset along axis `dir`, ie. `1` in that axis and `0` everywhere else.
///
/// ```
/// # use gridcalc_core::direction::unit_offset;
/// assert_eq!(unit_offset::<3>(1), [0, 1, 0]);
/// assert_eq!(unit_offset::<2>(0), [1, 0]);
/// ```
#[inline(always)]
pub fn unit_offset<const D: usize>(dir: usize) -> [i64; D] {
    core::array::from_fn(|a| (a == dir) as i64)
}

/// Sums `f(dir, unit_offset(dir))` over all axes.
///
/// The terms are combined as `f(D-1) + (f(D-2) + ( ... + f(0)))` regardless of `D`, which
/// fixes the floating point rounding of every reduction performed with this function.
///
/// ```
/// # use gridcalc_core::direction::dir_sum;
/// let u = [0.5, -1.0, 2.0];
/// let norm_sq = dir_sum::<3, f64, _>(|a, _| u[a] * u[a]);
/// assert_eq!(norm_sq, 5.25);
///
/// // Summing the unit offsets themselves yields the diagonal.
/// let diagonal = dir_sum::<3, [i64; 3], _>(|_, e| e);
/// assert_eq!(diagonal, [1, 1, 1]);
/// ```
#[inline(always)]
pub fn dir_sum<const D: usize, T, F>(mut f: F) -> T
where
    F: FnMut(usize, [i64; D]) -> T,
    T: DirSummand,
{
    debug_assert!(D > 0);
    let mut acc = f(0, unit_offset::<D>(0));
    for dir in 1..D {
        acc = f(dir, unit_offset::<D>(dir)).add_to(acc);
    }
    acc
}

/// Values which can be accumulated by [dir_sum].
pub trait DirSummand: Sized {
    /// Returns `self + other`.
    fn add_to(self, other: Self) -> Self;
}

macro_rules! impl_dir_summand {
    ($($t:ty),+) => {
        $(
            impl DirSummand for $t {
                #[inline(always)]
                fn add_to(self, other: Self) -> Self {
                    self + other
                }
            }
        )+
    }
}

impl_dir_summand!(f32, f64, i32, i64, isize, usize);

impl<const N: usize> DirSummand for [i64; N] {
    #[inline(always)]
    fn add_to(self, other: Self) -> Self {
        core::array::from_fn(|a| self[a] + other[a])
    }
}

/// Adds a multiple of an offset to an index: `index + factor * offset`.
#[inline(always)]
pub fn offset_index<const D: usize>(index: &[i64; D], offset: &[i64; D], factor: i64) -> [i64; D] {
    core::array::from_fn(|a| index[a] + factor * offset[a])
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn unit_offsets_are_orthonormal() {
        for i in 0..3 {
            for j in 0..3 {
                let ei = unit_offset::<3>(i);
                let ej = unit_offset::<3>(j);
                let dot = dir_sum::<3, i64, _>(|a, _| ei[a] * ej[a]);
                assert_eq!(dot, (i == j) as i64);
            }
        }
    }

    #[test]
    fn sum_visits_every_axis_once() {
        let mut visited = Vec::new();
        let n = dir_sum::<4, usize, _>(|dir, e| {
            visited.push(dir);
            assert_eq!(e[dir], 1);
            assert_eq!(e.iter().sum::<i64>(), 1);
            1
        });
        visited.sort();
        assert_eq!(n, 4);
        assert_eq!(visited, vec![0, 1, 2, 3]);
    }

    #[test]
    fn summation_order_is_from_last_axis() {
        // 1e16 + 1.0 + 1.0 depends on the grouping
        let values = [1.0, 1.0, 1e16];
        let res = dir_sum::<3, f64, _>(|a, _| values[a]);
        assert_eq!(res, 1e16 + (1.0 + 1.0));
    }

    #[test]
    fn offset_index_scales() {
        assert_eq!(offset_index(&[1, 2, 3], &[1, 0, -1], -1), [0, 2, 4]);
    }
}
