use gridcalc::prelude::*;

use approx::assert_relative_eq;
use rand::Rng;
use rand_chacha::rand_core::SeedableRng;

fn level(n_partitions: usize, force: f64) -> (LbLevel<D3Q19, 3>, LbParameters) {
    let domain = IndexBox::new([0, 0, 0], [3, 3, 3]).unwrap();
    let layout =
        DisjointBoxLayout::decompose(domain, n_partitions.try_into().unwrap(), 1, [true; 3])
            .unwrap();
    let parameters = LbParameters::for_lattice::<D3Q19, 3>(0.6, force).unwrap();
    (LbLevel::new(layout).unwrap(), parameters)
}

fn for_each_cell(level: &LbLevel<D3Q19, 3>, mut f: impl FnMut([i64; 3], &[f64])) {
    for kernel in level.kernels() {
        for index in kernel.valid_box().cells() {
            f(index, kernel.macroscopic().cell(&index));
        }
    }
}

/// Perturbs the populations of every cell with a value which only depends on its global index.
fn perturb(level: &mut LbLevel<D3Q19, 3>, parameters: &LbParameters, pool: &WorkerPool) {
    for kernel in level.kernels_mut() {
        let valid = kernel.valid_box();
        for index in valid.cells() {
            let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(
                (index[0] + 10 * index[1] + 100 * index[2]) as u64,
            );
            for (f, w) in kernel
                .distribution_mut()
                .cell_mut(&index)
                .iter_mut()
                .zip(D3Q19::weights())
            {
                *f = w * rng.gen_range(0.9..1.1);
            }
        }
        kernel.compute_macroscopic(parameters, pool).unwrap();
    }
}

#[test]
fn rest_state_stays_at_rest() {
    let (mut level, parameters) = level(1, 0.0);
    let pool = WorkerPool::new(1usize.try_into().unwrap()).unwrap();
    level.advance(&parameters, &pool).unwrap();
    let mut n_cells = 0;
    for_each_cell(&level, |_, state| {
        n_cells += 1;
        assert_relative_eq!(state[0], 1.0, epsilon = 1e-14);
        for u in &state[1..] {
            assert!(u.abs() < 1e-15);
        }
    });
    assert_eq!(n_cells, 64);
}

#[test]
fn body_force_only_drives_first_axis() {
    let force = 1e-5;
    let (mut level, parameters) = level(1, force);
    let pool = WorkerPool::new(2usize.try_into().unwrap()).unwrap();
    level.advance(&parameters, &pool).unwrap();
    for_each_cell(&level, |_, state| {
        assert_relative_eq!(state[0], 1.0, epsilon = 1e-14);
        assert_relative_eq!(state[1], force, max_relative = 1e-9);
        assert!(state[2].abs() < 1e-15);
        assert!(state[3].abs() < 1e-15);
    });
}

#[test]
fn mass_is_conserved_over_many_steps() {
    let (mut level, parameters) = level(2, 1e-5);
    let pool = WorkerPool::new(3usize.try_into().unwrap()).unwrap();
    perturb(&mut level, &parameters, &pool);
    let initial_mass = level.total_mass();
    for _ in 0..200 {
        level.advance(&parameters, &pool).unwrap();
    }
    assert_relative_eq!(level.total_mass(), initial_mass, max_relative = 1e-12);
}

#[test]
fn partitions_do_not_change_the_result() {
    let pool = WorkerPool::new(2usize.try_into().unwrap()).unwrap();
    let mut results = Vec::new();
    for n_partitions in [1, 2, 4] {
        let (mut level, parameters) = level(n_partitions, 1e-4);
        assert_eq!(level.kernels().len(), n_partitions);
        perturb(&mut level, &parameters, &pool);
        for _ in 0..10 {
            level.advance(&parameters, &pool).unwrap();
        }
        let mut state = std::collections::BTreeMap::new();
        for_each_cell(&level, |index, values| {
            state.insert(index, values.to_vec());
        });
        results.push(state);
    }
    assert_eq!(results[0].len(), 64);
    // Every cell sees the same operations in the same order
    assert_eq!(results[0], results[1]);
    assert_eq!(results[0], results[2]);
}

#[test]
fn two_dimensional_channel() {
    let domain = IndexBox::new([0, 0], [15, 7]).unwrap();
    let layout = DisjointBoxLayout::decompose(domain, 2usize.try_into().unwrap(), 1, [true; 2])
        .unwrap();
    let parameters = LbParameters::for_lattice::<D2Q9, 2>(0.8, 1e-6).unwrap();
    let pool = WorkerPool::new(2usize.try_into().unwrap()).unwrap();
    let mut level = LbLevel::<D2Q9, 2>::new(layout).unwrap();
    let mut previous_velocity = 0.0;
    for _ in 0..5 {
        level.advance(&parameters, &pool).unwrap();
        let velocity = level.kernels()[0].macroscopic().value(&[3, 2], 1);
        // The uniform force keeps accelerating the fluid
        assert!(velocity > previous_velocity);
        previous_velocity = velocity;
    }
    assert_relative_eq!(level.total_mass(), 128.0, max_relative = 1e-13);
}

#[test]
fn invalid_density_aborts_the_step() {
    let (mut level, parameters) = level(2, 0.0);
    let pool = WorkerPool::new(1usize.try_into().unwrap()).unwrap();
    level.kernels_mut()[1]
        .distribution_mut()
        .cell_mut(&[1, 1, 3])
        .fill(f64::NAN);
    let error = level.advance(&parameters, &pool).unwrap_err();
    assert!(matches!(error, SimulationError::DegenerateDensity(_)));
    assert!(error.is_fatal());
}
