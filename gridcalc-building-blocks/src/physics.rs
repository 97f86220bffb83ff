//! Cell-local operations of the BGK lattice-Boltzmann method.
use gridcalc_core::direction::dir_sum;

use crate::{lattice::LatticeDirections, parameters::LbParameters};

/// Equilibrium value of one direction.
///
/// `f_eq = w * rho * (1 + (e·u)/cs2 + (e·u)^2/(2 cs2^2) - |u|^2/(2 cs2))`
///
/// For `u = 0` the result is exactly `w * rho`.
/// ```
/// # use gridcalc_building_blocks::physics::equilibrium;
/// let f_eq = equilibrium(1.0 / 18.0, &[1, 0, 0], 1.3, &[0.0; 3], 1.0 / 3.0);
/// assert_eq!(f_eq, 1.0 / 18.0 * 1.3);
/// ```
#[inline(always)]
pub fn equilibrium<const D: usize>(
    weight: f64,
    e: &[i64; D],
    rho: f64,
    u: &[f64; D],
    cs2: f64,
) -> f64 {
    let e_dot_u = dir_sum::<D, f64, _>(|a, _| e[a] as f64 * u[a]);
    let u_sq = dir_sum::<D, f64, _>(|a, _| u[a] * u[a]);
    weight * rho * (1.0 + e_dot_u / cs2 + e_dot_u * e_dot_u / (2.0 * cs2 * cs2) - u_sq / (2.0 * cs2))
}

/// Relaxes all directions of one cell towards equilibrium and applies the body force.
///
/// The body force enters as `3 * w_i * e_i[0] * F`, ie. it only acts along axis `0`.
#[inline(always)]
pub fn collide_cell<L, const D: usize>(f: &mut [f64], rho: f64, u: &[f64; D], parameters: &LbParameters)
where
    L: LatticeDirections<D>,
{
    for ((f_i, e), w) in f
        .iter_mut()
        .zip(L::velocities().iter())
        .zip(L::weights().iter())
    {
        let f_eq = equilibrium(*w, e, rho, u, parameters.cs2);
        *f_i = *f_i + (f_eq - *f_i) / parameters.tau + 3.0 * w * e[0] as f64 * parameters.body_force;
    }
}

/// Density and momentum of one cell.
#[inline(always)]
pub fn moments<L, const D: usize>(f: &[f64]) -> (f64, [f64; D])
where
    L: LatticeDirections<D>,
{
    let mut rho = 0.0;
    let mut momentum = [0.0; D];
    for (f_i, e) in f.iter().zip(L::velocities().iter()) {
        rho += f_i;
        for a in 0..D {
            momentum[a] += f_i * e[a] as f64;
        }
    }
    (rho, momentum)
}

/// Whether the density is too small (or not finite) to divide the momentum by it.
#[inline(always)]
pub fn is_degenerate(rho: f64, density_epsilon: f64) -> bool {
    !(rho.abs() > density_epsilon) || !rho.is_finite()
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::lattice::{D2Q9, D3Q19};
    use approx::assert_relative_eq;
    use rand::{Rng, SeedableRng};

    #[test]
    fn equilibrium_at_rest_is_weight_times_density() {
        let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(3);
        for _ in 0..50 {
            let rho = rng.gen_range(0.1..10.0);
            for (e, w) in D3Q19::velocities().iter().zip(D3Q19::weights()) {
                assert_eq!(equilibrium(*w, e, rho, &[0.0; 3], 1.0 / 3.0), w * rho);
            }
        }
    }

    #[test]
    fn equilibrium_reproduces_moments() {
        let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(4);
        for _ in 0..20 {
            let rho = rng.gen_range(0.5..2.0);
            let u = [rng.gen_range(-0.1..0.1), rng.gen_range(-0.1..0.1), rng.gen_range(-0.1..0.1)];
            let f_eq: Vec<_> = D3Q19::velocities()
                .iter()
                .zip(D3Q19::weights())
                .map(|(e, w)| equilibrium(*w, e, rho, &u, D3Q19::CS2))
                .collect();
            let (rho_eq, momentum) = moments::<D3Q19, 3>(&f_eq);
            assert_relative_eq!(rho_eq, rho, epsilon = 1e-13);
            for a in 0..3 {
                assert_relative_eq!(momentum[a], rho * u[a], epsilon = 1e-13);
            }
        }
    }

    #[test]
    fn collision_conserves_density_and_momentum() {
        let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(5);
        let parameters = LbParameters::for_lattice::<D2Q9, 2>(0.7, 0.0).unwrap();
        let mut f: Vec<f64> = D2Q9::weights()
            .iter()
            .map(|w| w * rng.gen_range(0.8..1.2))
            .collect();
        let (rho, momentum) = moments::<D2Q9, 2>(&f);
        let u = [momentum[0] / rho, momentum[1] / rho];
        collide_cell::<D2Q9, 2>(&mut f, rho, &u, &parameters);
        let (rho_new, momentum_new) = moments::<D2Q9, 2>(&f);
        assert_relative_eq!(rho_new, rho, epsilon = 1e-14);
        assert_relative_eq!(momentum_new[0], momentum[0], epsilon = 1e-14);
        assert_relative_eq!(momentum_new[1], momentum[1], epsilon = 1e-14);
    }

    #[test]
    fn body_force_acts_along_first_axis() {
        let parameters = LbParameters::for_lattice::<D3Q19, 3>(0.6, 1e-3).unwrap();
        let mut f = D3Q19::weights().to_vec();
        collide_cell::<D3Q19, 3>(&mut f, 1.0, &[0.0; 3], &parameters);
        let (rho, momentum) = moments::<D3Q19, 3>(&f);
        assert_relative_eq!(rho, 1.0, epsilon = 1e-14);
        assert_relative_eq!(momentum[0], 1e-3, epsilon = 1e-15);
        assert!(momentum[1].abs() < 1e-16);
        assert!(momentum[2].abs() < 1e-16);
    }

    #[test]
    fn degenerate_densities() {
        assert!(is_degenerate(0.0, 1e-12));
        assert!(is_degenerate(-1e-13, 1e-12));
        assert!(is_degenerate(f64::NAN, 1e-12));
        assert!(is_degenerate(f64::INFINITY, 1e-12));
        assert!(!is_degenerate(1e-11, 1e-12));
        assert!(!is_degenerate(-0.5, 1e-12));
    }
}
