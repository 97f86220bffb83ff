use clap::Parser;
use gridcalc::prelude::*;
use tracing_subscriber::{filter, prelude::*};

#[derive(Parser, Debug)]
#[command(version, about = "Force driven flow in a fully periodic box", long_about = None)]
struct CLIArgs {
    /// Setup of the simulation as ron or json file
    #[arg(short, long)]
    setup: Option<std::path::PathBuf>,

    /// Overrides the number of steps of the setup
    #[arg(short, long)]
    n_steps: Option<usize>,

    /// Print the setup as ron and exit
    #[arg(long, default_value_t = false)]
    print_setup: bool,
}

fn default_setup() -> Result<SimulationSetup<3>, SimulationError> {
    Ok(SimulationSetup {
        domain: IndexBox::from_dimensions([16, 8, 32])?,
        ghost: 1,
        n_partitions: std::num::NonZeroUsize::new(4).unwrap_or(std::num::NonZeroUsize::MIN),
        periodic: vec![true; 3],
        origin: vec![0.0; 3],
        dx: 0.125,
        parameters: LbParameters::for_lattice::<D3Q19, 3>(0.6, 1e-6)?,
        settings: RunSettings {
            n_threads: std::thread::available_parallelism()
                .unwrap_or(std::num::NonZeroUsize::MIN),
            schedule: StepSchedule::new(200, 50)?,
            plot: PlotSettings {
                directory: "out/periodic_box".into(),
                ..Default::default()
            },
            show_progressbar: true,
        },
    })
}

fn load_setup(path: &std::path::Path) -> Result<SimulationSetup<3>, SetupError> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => SimulationSetup::from_json_file(path),
        _ => SimulationSetup::from_ron_file(path),
    }
}

fn main() -> Result<(), SimulationError> {
    let stdout_log = tracing_subscriber::fmt::layer()
        .with_line_number(true)
        .with_level(true);
    tracing_subscriber::registry()
        .with(stdout_log.with_filter(filter::LevelFilter::INFO))
        .init();

    let args = CLIArgs::parse();
    let mut setup = match &args.setup {
        Some(path) => load_setup(path)?,
        None => default_setup()?,
    };
    if let Some(n_steps) = args.n_steps {
        setup.settings.schedule =
            StepSchedule::new(n_steps, setup.settings.schedule.plot_interval())?;
    }
    if args.print_setup {
        let config = ron::ser::PrettyConfig::new().struct_names(true);
        let setup_string = ron::ser::to_string_pretty(&setup, config)
            .map_err(|e| SetupError(format!("Could not print setup: {}", e)))?;
        println!("{}", setup_string);
        return Ok(());
    }

    let mut level = setup.build_level::<D3Q19>()?;
    tracing::info!(
        partitions = %level
            .layout()
            .partitions()
            .iter()
            .map(|p| p.to_string())
            .collect::<Vec<_>>()
            .join(" "),
        "decomposed domain"
    );
    let summary = run_simulation(&mut level, &setup.parameters, &setup.settings, || {
        setup.settings.plot.writer()
    })?;

    for (iteration, error) in summary.failed_plot_files.iter() {
        tracing::warn!(iteration, %error, "plot file is missing");
    }
    let velocity_x = level.kernels()[0]
        .macroscopic()
        .value(&level.kernels()[0].valid_box().lo(), 1);
    println!(
        "Performed {} steps, wrote {} plot files",
        summary.n_steps,
        summary.written_plot_files.len()
    );
    println!(
        "Mass {:.12} -> {:.12}, velocity_x = {:e}",
        summary.initial_mass, summary.final_mass, velocity_x
    );
    // Without walls every step adds the body force to the momentum
    println!(
        "Viscosity {:.6}, expected velocity_x = {:e}",
        setup.parameters.viscosity(),
        setup.parameters.body_force * summary.n_steps as f64
    );
    Ok(())
}
