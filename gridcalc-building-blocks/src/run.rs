use gridcalc_concepts::{FileIoError, ZoneWriter};
use gridcalc_core::stencil::WorkerPool;
use gridcalc_core::storage::PlotSettings;
use gridcalc_core::time::{StepEvent, StepSchedule};
use gridcalc_core::SimulationError;
use serde::{Deserialize, Serialize};

use crate::lattice::LatticeDirections;
use crate::level::LbLevel;
use crate::parameters::LbParameters;

fn default_n_threads() -> core::num::NonZeroUsize {
    core::num::NonZeroUsize::MIN
}

/// Controls how a simulation is run and where its results are written.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct RunSettings {
    /// Number of threads of the [WorkerPool]
    #[serde(default = "default_n_threads")]
    pub n_threads: core::num::NonZeroUsize,
    /// Number of steps and output cadence
    pub schedule: StepSchedule,
    /// See [PlotSettings]
    #[serde(default)]
    pub plot: PlotSettings,
    /// Display a progress bar while stepping
    #[serde(default)]
    pub show_progressbar: bool,
}

/// Outcome of a completed [run_simulation].
#[derive(Clone, Debug)]
pub struct RunSummary {
    /// Number of steps which were performed
    pub n_steps: usize,
    /// Total mass before the first step
    pub initial_mass: f64,
    /// Total mass after the last step
    pub final_mass: f64,
    /// Plot files which were written completely
    pub written_plot_files: Vec<std::path::PathBuf>,
    /// Iterations whose plot file could not be completed together with the reason
    pub failed_plot_files: Vec<(usize, FileIoError)>,
}

impl RunSummary {
    fn plot(&mut self, path: std::path::PathBuf, iteration: usize, result: Result<(), FileIoError>) {
        match result {
            Ok(()) => self.written_plot_files.push(path),
            Err(error) => {
                #[cfg(feature = "tracing")]
                tracing::warn!(iteration, %error, "skipping plot file");
                self.failed_plot_files.push((iteration, error));
            }
        }
    }
}

/// Advances the level for the configured number of steps and writes plot files.
///
/// A plot file of the initial state is written before the first step and one after every
/// `plot_interval` steps. A new writer is obtained from `writer_factory` for every file.
/// Plot files which can not be written are recorded in the returned [RunSummary] and the
/// run continues. All other errors abort the run.
pub fn run_simulation<L, W, F, const D: usize>(
    level: &mut LbLevel<L, D>,
    parameters: &LbParameters,
    settings: &RunSettings,
    mut writer_factory: F,
) -> Result<RunSummary, SimulationError>
where
    L: LatticeDirections<D>,
    W: ZoneWriter<D>,
    F: FnMut() -> W,
{
    parameters.validate()?;
    settings.schedule.validate()?;
    let pool = WorkerPool::new(settings.n_threads)?;
    let mut schedule = StepSchedule::new(
        settings.schedule.n_steps(),
        settings.schedule.plot_interval(),
    )?;
    if let Err(_error) = settings.plot.create_directory() {
        #[cfg(feature = "tracing")]
        tracing::warn!(error = %_error, "plot directory is not available");
    }

    let mut summary = RunSummary {
        n_steps: 0,
        initial_mass: level.total_mass(),
        final_mass: level.total_mass(),
        written_plot_files: Vec::new(),
        failed_plot_files: Vec::new(),
    };
    #[cfg(feature = "tracing")]
    tracing::info!(
        n_partitions = level.kernels().len(),
        n_steps = schedule.n_steps(),
        viscosity = parameters.viscosity(),
        mass = summary.initial_mass,
        "starting simulation"
    );

    if schedule.plot_initial_state() {
        let path = settings.plot.file_path(0);
        let result = level.write_plot_file(&path, &mut writer_factory());
        summary.plot(path, 0, result);
    }

    let mut progress_bar = match settings.show_progressbar {
        true => Some(schedule.initialize_bar()?),
        false => None,
    };
    while let Some(next) = schedule.advance() {
        level.advance(parameters, &pool)?;
        summary.n_steps = next.iteration;
        if let Some(StepEvent::PlotFile) = next.event {
            let path = settings.plot.file_path(next.iteration);
            let result = level.write_plot_file(&path, &mut writer_factory());
            summary.plot(path, next.iteration, result);
        }
        if let Some(bar) = progress_bar.as_mut() {
            schedule.update_bar(bar)?;
        }
    }
    summary.final_mass = level.total_mass();
    #[cfg(feature = "tracing")]
    tracing::info!(
        mass = summary.final_mass,
        failed_plot_files = summary.failed_plot_files.len(),
        "finished simulation"
    );
    Ok(summary)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn settings_with_defaults() {
        let settings: RunSettings = ron::from_str(
            "(
                schedule: (n_steps: 10, plot_interval: 5),
            )",
        )
        .unwrap();
        assert_eq!(settings.n_threads.get(), 1);
        assert_eq!(settings.plot, PlotSettings::default());
        assert!(!settings.show_progressbar);
        assert_eq!(settings.schedule.n_plot_files(), 3);
    }
}
