//! Controls how the simulation steps are advanced

use kdam::BarExt;
use serde::{Deserialize, Serialize};

use gridcalc_concepts::TimeError;

/// A [StepEvent] describes that a certain action is to be executed after the current step.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq, Serialize)]
pub enum StepEvent {
    /// Writes the macroscopic state of every partition into a plot file.
    PlotFile,
}

/// Represents the next step which is returned by the [StepSchedule::advance] method.
#[derive(Clone, Debug, PartialEq)]
pub struct NextStep {
    /// Iteration which is reached after this step
    pub iteration: usize,
    /// Event at this iteration, or None
    pub event: Option<StepEvent>,
}

/// Fixed number of steps with plot files written at a regular interval.
///
/// The initial state (iteration 0) is always considered a plot point.
/// ```
/// # use gridcalc_core::time::{StepEvent, StepSchedule};
/// let mut schedule = StepSchedule::new(5, 2)?;
/// assert!(schedule.plot_initial_state());
/// let events: Vec<_> = std::iter::from_fn(|| schedule.advance()).map(|s| s.event).collect();
/// assert_eq!(
///     events,
///     vec![None, Some(StepEvent::PlotFile), None, Some(StepEvent::PlotFile), None]
/// );
/// # Ok::<(), gridcalc_concepts::TimeError>(())
/// ```
#[derive(Clone, Debug, Deserialize, PartialEq, Eq, Serialize)]
pub struct StepSchedule {
    n_steps: usize,
    plot_interval: usize,
    #[serde(skip)]
    current_iteration: usize,
}

impl StepSchedule {
    /// Construct the schedule from the total number of steps and the number of steps between
    /// two plot files.
    pub fn new(n_steps: usize, plot_interval: usize) -> Result<Self, TimeError> {
        let schedule = Self {
            n_steps,
            plot_interval,
            current_iteration: 0,
        };
        schedule.validate()?;
        Ok(schedule)
    }

    /// Checks that the plot interval is non-zero.
    ///
    /// Deserialized schedules should be validated before use.
    pub fn validate(&self) -> Result<(), TimeError> {
        if self.plot_interval == 0 {
            return Err(TimeError(format!(
                "Plot interval must be at least 1 but was {}",
                self.plot_interval
            )));
        }
        Ok(())
    }

    /// Total number of steps
    pub fn n_steps(&self) -> usize {
        self.n_steps
    }

    /// Number of steps between two plot files
    pub fn plot_interval(&self) -> usize {
        self.plot_interval
    }

    /// Iteration reached by the last call to [advance](Self::advance)
    pub fn current_iteration(&self) -> usize {
        self.current_iteration
    }

    /// Whether a plot file should be written before the first step
    pub fn plot_initial_state(&self) -> bool {
        true
    }

    /// Number of plot files which will be written including the one of the initial state
    pub fn n_plot_files(&self) -> usize {
        self.n_steps.checked_div(self.plot_interval).unwrap_or(0) + 1
    }

    /// Advances to the next step and returns its iteration number and event.
    ///
    /// Returns `None` once all steps have been taken.
    #[must_use]
    pub fn advance(&mut self) -> Option<NextStep> {
        if self.current_iteration >= self.n_steps {
            return None;
        }
        self.current_iteration += 1;
        let event = match self.plot_interval {
            0 => None,
            n if self.current_iteration % n == 0 => Some(StepEvent::PlotFile),
            _ => None,
        };
        Some(NextStep {
            iteration: self.current_iteration,
            event,
        })
    }

    /// Creates a bar that tracks the simulation progress
    pub fn initialize_bar(&self) -> Result<kdam::Bar, TimeError> {
        let bar_format = "\
        {desc}{percentage:3.0}%|{animation}| \
        {count}/{total} \
        [{elapsed}, \
        {rate:.2}{unit}/s{postfix}]";
        Ok(kdam::BarBuilder::default()
            .total(self.n_steps)
            .bar_format(bar_format)
            .dynamic_ncols(true)
            .build()?)
    }

    /// Update a given bar to show the current simulation state
    pub fn update_bar(&self, bar: &mut kdam::Bar) -> Result<(), std::io::Error> {
        let _ = bar.update(1)?;
        Ok(())
    }
}
