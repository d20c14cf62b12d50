use super::CliError;
use anyhow::Context;
use fluxsim_core::common::{DEFAULT_CONFIG_FILE, ParticleSpec, RunConfig, select_particles};
use fluxsim_core::domain::FluxError;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

/// Loads the run configuration. Without `--config`, a missing `fluxsim.json`
/// in the working directory falls back to the built-in defaults.
pub(super) fn load_run_config(explicit: Option<&Path>) -> Result<RunConfig, CliError> {
    let path = explicit.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILE));
    if explicit.is_none() && !path.exists() {
        warn!(
            config = %path.display(),
            "configuration file not found, using defaults"
        );
        return RunConfig::from_json_str("{}", Path::new(".")).map_err(CliError::Compute);
    }

    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read run configuration '{}'", path.display()))?;
    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
    let config = RunConfig::from_json_str(&content, base_dir).map_err(|error| {
        CliError::Compute(FluxError::new(
            error.category(),
            error.placeholder(),
            format!("{}: {}", path.display(), error.message()),
        ))
    })?;
    info!(config = %path.display(), location = %config.location, "loaded run configuration");
    Ok(config)
}

/// Resolves `--particles` against the configured catalog. Unknown keys are
/// warned about and skipped; selecting nothing at all is a usage error.
pub(super) fn select_requested_particles<'a>(
    config: &'a RunConfig,
    requested: &[String],
) -> Result<Vec<&'a ParticleSpec>, CliError> {
    let (selected, unknown) = select_particles(&config.particles, requested);
    for key in &unknown {
        warn!(particle = %key, "skipping unknown particle");
        eprintln!("[SKIP] unknown particle: {}", key);
    }
    if selected.is_empty() {
        return Err(CliError::Compute(FluxError::input_validation(
            "INPUT.PARTICLES",
            format!(
                "no known particles selected; configured particles: {}",
                config
                    .particles
                    .iter()
                    .map(|particle| particle.key.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
        )));
    }
    Ok(selected)
}

pub(super) fn exit_code_for_failures(failures: usize) -> i32 {
    if failures == 0 { 0 } else { 1 }
}

#[cfg(test)]
mod tests {
    use super::{exit_code_for_failures, load_run_config, select_requested_particles};
    use fluxsim_core::common::RunConfig;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn relative_paths_resolve_against_config_directory() {
        let temp = TempDir::new().expect("tempdir should be created");
        let path = temp.path().join("run.json");
        fs::write(&path, r#"{"mapsDir": "out", "nside": 4}"#).expect("config should be written");

        let config = load_run_config(Some(&path)).expect("config should load");
        assert_eq!(config.maps_dir, temp.path().join("out"));
        assert_eq!(config.nside, 4);
        assert_eq!(config.location, "tucson");
    }

    #[test]
    fn explicit_missing_config_is_an_error() {
        let temp = TempDir::new().expect("tempdir should be created");
        let error = load_run_config(Some(&temp.path().join("absent.json")))
            .expect_err("missing explicit config");
        assert!(error.to_string().contains("absent.json"));
    }

    #[test]
    fn invalid_config_names_the_file() {
        let temp = TempDir::new().expect("tempdir should be created");
        let path = temp.path().join("bad.json");
        fs::write(&path, r#"{"nside": 3}"#).expect("config should be written");
        let error = load_run_config(Some(&path)).expect_err("nside 3 is invalid");
        assert!(error.to_string().contains("bad.json"));
    }

    #[test]
    fn unknown_particles_are_dropped() {
        let config = RunConfig::default();
        let selected = select_requested_particles(
            &config,
            &["proton".to_string(), "tachyon".to_string()],
        )
        .expect("proton is known");
        assert_eq!(selected.len(), 1);
        assert!(select_requested_particles(&config, &["tachyon".to_string()]).is_err());
        assert_eq!(exit_code_for_failures(0), 0);
        assert_eq!(exit_code_for_failures(2), 1);
    }
}
