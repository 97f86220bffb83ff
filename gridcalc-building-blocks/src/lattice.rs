/// A discrete velocity set of a lattice-Boltzmann model.
///
/// Implementors provide `Q` integer offsets `e_i` together with their weights `w_i`.
/// Direction `0` is the rest direction.
/// The weights are normalized and the set is symmetric, ie. for every direction `e_i` the
/// direction `-e_i` is part of the set.
pub trait LatticeDirections<const D: usize>: Clone + Send + Sync + 'static {
    /// Name of the velocity set such as `"D3Q19"`
    const NAME: &'static str;
    /// Number of discrete directions
    const Q: usize;
    /// Lattice speed of sound squared
    const CS2: f64;

    /// All directions ordered by their index
    fn velocities() -> &'static [[i64; D]];

    /// Weights of all directions ordered by their index
    fn weights() -> &'static [f64];

    /// Index of the direction pointing opposite to direction `i`.
    fn opposite(i: usize) -> Option<usize> {
        let e = Self::velocities().get(i)?;
        Self::velocities()
            .iter()
            .position(|other| other.iter().zip(e.iter()).all(|(a, b)| *a == -*b))
    }

    /// Largest absolute component of any direction.
    ///
    /// Fields need a ghost halo of at least this width for streaming.
    fn max_offset() -> usize {
        Self::velocities()
            .iter()
            .flat_map(|e| e.iter())
            .map(|c| c.unsigned_abs() as usize)
            .max()
            .unwrap_or(0)
    }
}

/// Three-dimensional velocity set with one rest, six face and twelve edge directions.
///
/// | index | directions |
/// | --- | --- |
/// | `0` | rest |
/// | `1..=6` | `-x`, `+x`, `-y`, `+y`, `-z`, `+z` |
/// | `7..=10` | edges in the `xy` plane |
/// | `11..=14` | edges in the `xz` plane |
/// | `15..=18` | edges in the `yz` plane |
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct D3Q19;

static D3Q19_VELOCITIES: [[i64; 3]; 19] = [
    [0, 0, 0],
    [-1, 0, 0],
    [1, 0, 0],
    [0, -1, 0],
    [0, 1, 0],
    [0, 0, -1],
    [0, 0, 1],
    [-1, -1, 0],
    [1, -1, 0],
    [-1, 1, 0],
    [1, 1, 0],
    [-1, 0, -1],
    [1, 0, -1],
    [-1, 0, 1],
    [1, 0, 1],
    [0, -1, -1],
    [0, 1, -1],
    [0, -1, 1],
    [0, 1, 1],
];

const W0_3: f64 = 1.0 / 3.0;
const W1_3: f64 = 1.0 / 18.0;
const W2_3: f64 = 1.0 / 36.0;

static D3Q19_WEIGHTS: [f64; 19] = [
    W0_3, W1_3, W1_3, W1_3, W1_3, W1_3, W1_3, W2_3, W2_3, W2_3, W2_3, W2_3, W2_3, W2_3, W2_3,
    W2_3, W2_3, W2_3, W2_3,
];

impl LatticeDirections<3> for D3Q19 {
    const NAME: &'static str = "D3Q19";
    const Q: usize = 19;
    const CS2: f64 = 1.0 / 3.0;

    fn velocities() -> &'static [[i64; 3]] {
        &D3Q19_VELOCITIES
    }

    fn weights() -> &'static [f64] {
        &D3Q19_WEIGHTS
    }
}

/// Two-dimensional velocity set with one rest, four face and four diagonal directions.
///
/// Directions are ordered like the `xy` subset of [D3Q19].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct D2Q9;

static D2Q9_VELOCITIES: [[i64; 2]; 9] = [
    [0, 0],
    [-1, 0],
    [1, 0],
    [0, -1],
    [0, 1],
    [-1, -1],
    [1, -1],
    [-1, 1],
    [1, 1],
];

static D2Q9_WEIGHTS: [f64; 9] = [
    4.0 / 9.0,
    1.0 / 9.0,
    1.0 / 9.0,
    1.0 / 9.0,
    1.0 / 9.0,
    1.0 / 36.0,
    1.0 / 36.0,
    1.0 / 36.0,
    1.0 / 36.0,
];

impl LatticeDirections<2> for D2Q9 {
    const NAME: &'static str = "D2Q9";
    const Q: usize = 9;
    const CS2: f64 = 1.0 / 3.0;

    fn velocities() -> &'static [[i64; 2]] {
        &D2Q9_VELOCITIES
    }

    fn weights() -> &'static [f64] {
        &D2Q9_WEIGHTS
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn check_isotropy<L: LatticeDirections<D>, const D: usize>() {
        let e = L::velocities();
        let w = L::weights();
        assert_eq!(e.len(), L::Q);
        assert_eq!(w.len(), L::Q);
        assert_eq!(e[0], [0; D]);

        assert_abs_diff_eq!(w.iter().sum::<f64>(), 1.0, epsilon = 1e-12);
        for a in 0..D {
            let first: f64 = (0..L::Q).map(|i| w[i] * e[i][a] as f64).sum();
            assert_abs_diff_eq!(first, 0.0, epsilon = 1e-15);
            for b in 0..D {
                let second: f64 = (0..L::Q)
                    .map(|i| w[i] * (e[i][a] * e[i][b]) as f64)
                    .sum();
                let expected = if a == b { L::CS2 } else { 0.0 };
                assert_abs_diff_eq!(second, expected, epsilon = 1e-15);
            }
        }
    }

    fn check_opposites<L: LatticeDirections<D>, const D: usize>() {
        for i in 0..L::Q {
            let j = L::opposite(i).unwrap();
            assert_eq!(L::opposite(j), Some(i));
            assert_eq!(L::weights()[i], L::weights()[j]);
            for a in 0..D {
                assert_eq!(L::velocities()[i][a], -L::velocities()[j][a]);
            }
        }
        assert_eq!(L::opposite(L::Q), None);
        assert_eq!(L::max_offset(), 1);
    }

    #[test]
    fn d3q19_moments() {
        check_isotropy::<D3Q19, 3>();
        check_opposites::<D3Q19, 3>();
    }

    #[test]
    fn d2q9_moments() {
        check_isotropy::<D2Q9, 2>();
        check_opposites::<D2Q9, 2>();
    }

    #[test]
    fn d3q19_opposite_pairs() {
        for i in [1, 3, 5] {
            assert_eq!(D3Q19::opposite(i), Some(i + 1));
        }
        for (i, j) in [(7, 10), (8, 9), (11, 14), (12, 13), (15, 18), (16, 17)] {
            assert_eq!(D3Q19::opposite(i), Some(j));
        }
        assert_eq!(D3Q19::opposite(0), Some(0));
    }

    #[test]
    fn directions_are_unique() {
        let e = D3Q19::velocities();
        for i in 0..e.len() {
            for j in i + 1..e.len() {
                assert_ne!(e[i], e[j]);
            }
        }
    }
}
