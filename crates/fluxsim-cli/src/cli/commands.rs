use super::CliError;
use super::dispatch::{parse_stage_name, stage_range};
use super::helpers::{exit_code_for_failures, select_requested_particles};
use fluxsim_core::common::constants::INTEGRATED_FLUX_UNITS;
use fluxsim_core::common::{DEFAULT_CONFIG_FILE, RunConfig};
use fluxsim_core::domain::{FluxError, SimStage};
use fluxsim_core::modules::flux_map::{AngularFluxTable, FluxMapSynthesizer};
use fluxsim_core::modules::pipeline::{
    FsArtifactLocator, PipelineOrchestrator, PipelineSettings, ProcessLauncher, WorkItem,
};
use fluxsim_core::modules::serialization::{
    write_json_artifact, write_sky_map_bundle, write_text_artifact,
};
use fluxsim_core::modules::weights::compute_weights;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(clap::Args)]
pub(super) struct MapsArgs {
    /// Particle keys to synthesize (default: every configured particle)
    #[arg(long, num_args = 1.., value_delimiter = ',')]
    particles: Vec<String>,

    /// Angular flux table override
    #[arg(long, value_name = "PATH")]
    flux_csv: Option<PathBuf>,
}

#[derive(clap::Args)]
pub(super) struct SimulateArgs {
    /// Particle keys to simulate (default: every configured particle)
    #[arg(long, num_args = 1.., value_delimiter = ',')]
    particles: Vec<String>,

    /// Events per particle
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    num_events: Option<u64>,

    /// Stage options file passed to every executable
    #[arg(long, value_name = "PATH")]
    options: Option<PathBuf>,

    /// First stage to run
    #[arg(long, value_parser = parse_stage_name, default_value = "gramssky")]
    start_from: SimStage,

    /// Last stage to run
    #[arg(long, value_parser = parse_stage_name, default_value = "opdetsim")]
    stop_after: SimStage,
}

#[derive(clap::Args)]
pub(super) struct WeightsArgs {
    /// Particle keys to weight (default: every configured particle)
    #[arg(long, num_args = 1.., value_delimiter = ',')]
    particles: Vec<String>,

    /// Simulated events per particle
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    num_events: Option<u64>,

    /// JSON report path (default: <mapsDir>/weights/weights.json)
    #[arg(long, value_name = "PATH")]
    output: Option<PathBuf>,
}

#[derive(clap::Args)]
pub(super) struct InitConfigArgs {
    /// Destination (default: the --config path or fluxsim.json)
    #[arg(long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Overwrite an existing file
    #[arg(long)]
    force: bool,
}

pub(super) fn run_maps_command(config: &RunConfig, args: MapsArgs) -> Result<i32, CliError> {
    let synthesizer = FluxMapSynthesizer::from_config(config)?;
    let particles = select_requested_particles(config, &args.particles)?;
    let flux_csv = args.flux_csv.unwrap_or_else(|| config.flux_csv_path());
    let table = AngularFluxTable::load_csv(&flux_csv)?;
    config.ensure_dirs()?;
    info!(
        flux_csv = %flux_csv.display(),
        rows = table.len(),
        nside = synthesizer.nside(),
        "loaded angular flux table"
    );

    let mut failures = 0;
    for particle in particles {
        let output = config.sky_map_path(particle);
        let written = synthesizer
            .synthesize_particle(&table, &particle.key)
            .and_then(|bundle| write_sky_map_bundle(&output, &bundle).map(|()| bundle));
        match written {
            Ok(bundle) => {
                let range = bundle
                    .integrated_map()
                    .ok()
                    .and_then(|integrated| integrated.min_max());
                if let Some((lo, hi)) = range {
                    info!(
                        particle = %particle.key,
                        "integrated flux range [{:.3e}, {:.3e}] {}",
                        lo,
                        hi,
                        INTEGRATED_FLUX_UNITS
                    );
                }
                println!(
                    "[OK]   {} -> {} ({} band(s), {} pixels)",
                    particle.key,
                    output.display(),
                    bundle.band_count(),
                    synthesizer.npix()
                );
            }
            Err(error) => {
                failures += 1;
                println!("[FAIL] {}: {}", particle.key, error.diagnostic_line());
            }
        }
    }

    Ok(exit_code_for_failures(failures))
}

pub(super) fn run_simulate_command(
    config: &RunConfig,
    args: SimulateArgs,
) -> Result<i32, CliError> {
    let range = stage_range(args.start_from, args.stop_after)?;
    let particles = select_requested_particles(config, &args.particles)?;
    config.ensure_dirs()?;

    let mut settings = PipelineSettings::from_config(config)
        .with_num_events(args.num_events.unwrap_or(config.num_events));
    if let Some(options) = args.options {
        settings = settings.with_options_file(options);
    }
    info!(
        start = %range.start(),
        stop = %range.stop(),
        stages = range.stages().count(),
        events = settings.num_events,
        particles = particles.len(),
        "starting simulation"
    );

    let items: Vec<WorkItem> = particles
        .into_iter()
        .map(|particle| WorkItem::from_config(config, particle))
        .collect();
    let locator = FsArtifactLocator;
    let launcher = ProcessLauncher;
    let orchestrator = PipelineOrchestrator::new(settings, &locator, &launcher);
    let report = orchestrator.run_all(&items, range)?;

    for outcome in &report.outcomes {
        println!("{}", outcome.status_line());
    }
    println!("{}", report.summary_line());

    Ok(exit_code_for_failures(report.failed()))
}

pub(super) fn run_weights_command(config: &RunConfig, args: WeightsArgs) -> Result<i32, CliError> {
    let particles = select_requested_particles(config, &args.particles)?;
    let num_events = args.num_events.unwrap_or(config.num_events);
    let report = compute_weights(config, &particles, num_events);

    for (key, factor) in &report.weights {
        println!(
            "[OK]   {}: S={:.3e} 1/cm2/s/sr, T={:.3e} cm2 s, w={:.3e} 1/s",
            key, factor.s, factor.t, factor.w
        );
    }
    for (key, error) in &report.skipped {
        println!("[SKIP] {}: {}", key, error.diagnostic_line());
    }
    if report.weights.is_empty() {
        return Err(CliError::Compute(FluxError::data_insufficient(
            "DATA.NO_WEIGHTS",
            "no integrated flux summary could be weighted",
        )));
    }

    let output = args
        .output
        .unwrap_or_else(|| config.weights_dir().join("weights.json"));
    write_json_artifact(&output, &report.weights)?;
    println!("weights written to {}", output.display());
    Ok(0)
}

pub(super) fn run_init_config_command(
    config_path: Option<&Path>,
    args: InitConfigArgs,
) -> Result<i32, CliError> {
    let output = args
        .output
        .or_else(|| config_path.map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
    let existed = output.exists();
    if existed && !args.force {
        return Err(CliError::Compute(FluxError::input_validation(
            "INPUT.CONFIG_EXISTS",
            format!(
                "'{}' already exists; pass --force to overwrite",
                output.display()
            ),
        )));
    }

    let content = RunConfig::default().to_json_pretty()?;
    write_text_artifact(&output, &content)?;
    if existed {
        warn!(config = %output.display(), "overwrote run configuration");
    }
    println!("wrote default configuration to {}", output.display());
    Ok(0)
}
