use gridcalc_concepts::{IndexBox, SetupError};
use gridcalc_core::layout::DisjointBoxLayout;
use serde::{Deserialize, Serialize};

use crate::lattice::LatticeDirections;
use crate::level::LbLevel;
use crate::parameters::LbParameters;
use crate::run::RunSettings;

fn default_ghost() -> usize {
    1
}

fn default_dx() -> f64 {
    1.0
}

/// Complete description of a simulation which can be stored as `ron` or `json` file.
///
/// ```
/// # use gridcalc_building_blocks::*;
/// let setup: SimulationSetup<3> = ron::from_str(r#"(
///     domain: IndexBox(lo: [0, 0, 0], hi: [7, 7, 7]),
///     n_partitions: 2,
///     periodic: [true, true, true],
///     parameters: (tau: 0.6, cs2: 0.3333333333333333, body_force: 1e-5),
///     settings: (schedule: (n_steps: 10, plot_interval: 5)),
/// )"#)?;
/// let level = setup.build_level::<D3Q19>()?;
/// assert_eq!(level.kernels().len(), 2);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct SimulationSetup<const D: usize> {
    /// Cells of the whole domain
    pub domain: IndexBox<D>,
    /// Width of the ghost halo of every partition
    #[serde(default = "default_ghost")]
    pub ghost: usize,
    /// Number of partitions along the outermost axis
    pub n_partitions: core::num::NonZeroUsize,
    /// Periodicity of every axis
    ///
    /// Faces of non-periodic axes are in contact with ghost cells which stay at the rest
    /// state for the whole run. Mass is only conserved if all axes are periodic.
    pub periodic: Vec<bool>,
    /// Physical position of the lower corner of cell `[0; D]`
    #[serde(default)]
    pub origin: Vec<f64>,
    /// Uniform cell spacing
    #[serde(default = "default_dx")]
    pub dx: f64,
    /// See [LbParameters]
    pub parameters: LbParameters,
    /// See [RunSettings]
    pub settings: RunSettings,
}

impl<const D: usize> SimulationSetup<D> {
    /// Reads a setup from a [ron](https://github.com/ron-rs/ron) file.
    pub fn from_ron_file(path: &std::path::Path) -> Result<Self, SetupError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| SetupError(format!("Could not read {}: {}", path.display(), e)))?;
        ron::from_str(&content)
            .map_err(|e| SetupError(format!("Could not parse {}: {}", path.display(), e)))
    }

    /// Reads a setup from a [json](https://www.json.org/json-en.html) file.
    pub fn from_json_file(path: &std::path::Path) -> Result<Self, SetupError> {
        let file = std::fs::File::open(path)
            .map_err(|e| SetupError(format!("Could not read {}: {}", path.display(), e)))?;
        serde_json::from_reader(std::io::BufReader::new(file))
            .map_err(|e| SetupError(format!("Could not parse {}: {}", path.display(), e)))
    }

    /// Periodicity as one flag per axis.
    pub fn periodicity(&self) -> Result<[bool; D], SetupError> {
        self.periodic.clone().try_into().map_err(|v: Vec<bool>| {
            SetupError(format!(
                "Expected periodicity for {} axes but got {}",
                D,
                v.len()
            ))
        })
    }

    /// Origin of the domain, defaulting to zero if none is given.
    pub fn origin(&self) -> Result<[f64; D], SetupError> {
        if self.origin.is_empty() {
            return Ok([0.0; D]);
        }
        self.origin.clone().try_into().map_err(|v: Vec<f64>| {
            SetupError(format!(
                "Expected origin with {} coordinates but got {}",
                D,
                v.len()
            ))
        })
    }

    /// Decomposes the domain into the configured number of partitions.
    pub fn layout(&self) -> Result<DisjointBoxLayout<D>, SetupError> {
        Ok(DisjointBoxLayout::decompose(
            self.domain,
            self.n_partitions,
            self.ghost,
            self.periodicity()?,
        )?
        .with_geometry(self.origin()?, self.dx)?)
    }

    /// Creates all kernels in their rest state.
    pub fn build_level<L>(&self) -> Result<LbLevel<L, D>, SetupError>
    where
        L: LatticeDirections<D>,
    {
        self.parameters.validate()?;
        if (self.parameters.cs2 - L::CS2).abs() > 1e-6 * L::CS2 {
            return Err(SetupError(format!(
                "Speed of sound cs2={} does not match lattice {} with cs2={}",
                self.parameters.cs2,
                L::NAME,
                L::CS2
            )));
        }
        self.settings.schedule.validate().map_err(|e| SetupError(e.0))?;
        LbLevel::new(self.layout()?)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::lattice::D2Q9;
    use gridcalc_core::time::StepSchedule;

    fn setup() -> SimulationSetup<2> {
        SimulationSetup {
            domain: IndexBox::new([0, 0], [9, 9]).unwrap(),
            ghost: 1,
            n_partitions: 2usize.try_into().unwrap(),
            periodic: vec![true, false],
            origin: vec![],
            dx: 0.1,
            parameters: LbParameters::for_lattice::<D2Q9, 2>(0.6, 0.0).unwrap(),
            settings: RunSettings {
                n_threads: 2usize.try_into().unwrap(),
                schedule: StepSchedule::new(4, 2).unwrap(),
                plot: Default::default(),
                show_progressbar: false,
            },
        }
    }

    #[test]
    fn build_level_from_setup() {
        let level = setup().build_level::<D2Q9>().unwrap();
        assert_eq!(level.kernels().len(), 2);
        assert_eq!(level.layout().periodic(), [true, false]);
        assert_eq!(level.layout().geometry(1).unwrap().dx, 0.1);
    }

    #[test]
    fn reject_inconsistent_setup() {
        let mut wrong_axes = setup();
        wrong_axes.periodic = vec![true; 3];
        assert!(wrong_axes.build_level::<D2Q9>().is_err());

        let mut wrong_origin = setup();
        wrong_origin.origin = vec![0.0];
        assert!(wrong_origin.layout().is_err());

        let mut wrong_speed = setup();
        wrong_speed.parameters.cs2 = 0.5;
        assert!(wrong_speed.build_level::<D2Q9>().is_err());

        let mut too_many_partitions = setup();
        too_many_partitions.n_partitions = 11usize.try_into().unwrap();
        assert!(too_many_partitions.build_level::<D2Q9>().is_err());

        let mut no_halo = setup();
        no_halo.ghost = 0;
        assert!(no_halo.build_level::<D2Q9>().is_err());
    }

    #[test]
    fn json_and_ron_files() {
        let dir = tempfile::tempdir().unwrap();
        let setup = setup();

        let json_path = dir.path().join("setup.json");
        std::fs::write(&json_path, serde_json::to_string_pretty(&setup).unwrap()).unwrap();
        assert_eq!(SimulationSetup::<2>::from_json_file(&json_path).unwrap(), setup);

        let ron_path = dir.path().join("setup.ron");
        std::fs::write(&ron_path, ron::to_string(&setup).unwrap()).unwrap();
        assert_eq!(SimulationSetup::<2>::from_ron_file(&ron_path).unwrap(), setup);

        assert!(SimulationSetup::<2>::from_ron_file(&dir.path().join("missing.ron")).is_err());
        // A two-dimensional domain can not be read as three-dimensional one
        assert!(SimulationSetup::<3>::from_json_file(&json_path).is_err());
    }
}
