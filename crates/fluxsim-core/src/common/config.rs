//! Explicit run configuration shared by map synthesis, the simulation
//! pipeline, and rate weighting.
//!
//! Loaded from a camelCase JSON document. Relative paths are resolved against
//! the directory holding the configuration file, so a configuration can be
//! checked in next to its data.

use super::constants::{DEFAULT_NSIDE, DEFAULT_NUM_EVENTS, MAX_NSIDE};
use super::particles::{ParticleSpec, default_particle_catalog, find_particle};
use crate::domain::{ArtifactSet, ComputeResult, FluxError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = "fluxsim.json";

/// Site names the flux generator uses in its output file names.
const FLUX_SITE_NAMES: [(&str, &str); 2] = [
    ("tucson", "SpaceportTucson_Arizona"),
    ("esrange", "Esrange_Sweden"),
];

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RunConfig {
    pub location: String,
    pub date: String,
    pub altitude_m: u32,
    /// Directory searched for the generator's angular flux tables.
    pub flux_dir: PathBuf,
    /// Explicit angular flux table; overrides the name derived from
    /// location, date and altitude.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flux_csv: Option<PathBuf>,
    pub maps_dir: PathBuf,
    pub executables_dir: PathBuf,
    pub options_file: PathBuf,
    pub lightmap_dir: PathBuf,
    pub nside: u32,
    pub num_events: u64,
    pub particles: Vec<ParticleSpec>,
    pub tpc: TpcGeometry,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            location: "tucson".to_string(),
            date: "2025_8_31".to_string(),
            altitude_m: 30_000,
            flux_dir: PathBuf::from("flux"),
            flux_csv: None,
            maps_dir: PathBuf::from("maps"),
            executables_dir: PathBuf::from("bin"),
            options_file: PathBuf::from("options.xml"),
            lightmap_dir: PathBuf::from("lightmaps"),
            nside: DEFAULT_NSIDE,
            num_events: DEFAULT_NUM_EVENTS,
            particles: default_particle_catalog(),
            tpc: TpcGeometry::default(),
        }
    }
}

/// Box-shaped TPC dimensions in centimetres.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct TpcGeometry {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Default for TpcGeometry {
    fn default() -> Self {
        Self {
            x: 30.0,
            y: 30.0,
            z: 20.0,
        }
    }
}

impl TpcGeometry {
    pub fn surface_area(&self) -> f64 {
        2.0 * (self.x * self.y) + 4.0 * (self.x * self.z)
    }

    /// Mean projected area over the six faces, in cm².
    pub fn average_cross_section(&self) -> f64 {
        self.surface_area() / 6.0
    }
}

impl RunConfig {
    pub fn from_json_str(content: &str, base_dir: &Path) -> ComputeResult<Self> {
        let mut config: RunConfig = serde_json::from_str(content).map_err(|source| {
            FluxError::input_validation(
                "INPUT.CONFIG_PARSE",
                format!("failed to parse run configuration: {}", source),
            )
        })?;
        config.resolve_paths(base_dir);
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> ComputeResult<Self> {
        let content = fs::read_to_string(path).map_err(|source| {
            FluxError::io_system(
                "IO.CONFIG_READ",
                format!(
                    "failed to read run configuration '{}': {}",
                    path.display(),
                    source
                ),
            )
        })?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        Self::from_json_str(&content, base_dir)
    }

    pub fn to_json_pretty(&self) -> ComputeResult<String> {
        serde_json::to_string_pretty(self).map_err(|source| {
            FluxError::internal(
                "SYS.CONFIG_SERIALIZE",
                format!("failed to serialize run configuration: {}", source),
            )
        })
    }

    pub fn validate(&self) -> ComputeResult<()> {
        validate_nside(self.nside)?;
        if self.num_events == 0 {
            return Err(FluxError::input_validation(
                "INPUT.CONFIG_NUM_EVENTS",
                "numEvents must be a positive integer",
            ));
        }
        if self.location.trim().is_empty() || self.date.trim().is_empty() {
            return Err(FluxError::input_validation(
                "INPUT.CONFIG_LOCATION",
                "location and date must be non-empty",
            ));
        }
        Ok(())
    }

    fn resolve_paths(&mut self, base_dir: &Path) {
        for path in [
            &mut self.flux_dir,
            &mut self.maps_dir,
            &mut self.executables_dir,
            &mut self.options_file,
            &mut self.lightmap_dir,
        ] {
            if path.is_relative() {
                *path = base_dir.join(&*path);
            }
        }
        if let Some(path) = self.flux_csv.as_mut().filter(|path| path.is_relative()) {
            *path = base_dir.join(&*path);
        }
    }

    /// Angular flux table for this run: the explicit `fluxCsv`, or
    /// `<fluxDir>/<site>_<date>_alt<altitudeM>m.csv`.
    pub fn flux_csv_path(&self) -> PathBuf {
        self.flux_csv.clone().unwrap_or_else(|| {
            let site = FLUX_SITE_NAMES
                .iter()
                .find(|(location, _)| *location == self.location)
                .map_or(self.location.as_str(), |(_, site)| *site);
            self.flux_dir
                .join(format!("{}_{}_alt{}m.csv", site, self.date, self.altitude_m))
        })
    }

    pub fn particle(&self, key: &str) -> ComputeResult<&ParticleSpec> {
        find_particle(&self.particles, key).ok_or_else(|| {
            FluxError::not_found(
                "NOTFOUND.PARTICLE",
                format!("particle '{}' is not in the configured catalog", key),
            )
        })
    }

    pub fn fits_dir(&self) -> PathBuf {
        self.maps_dir.join("fits")
    }

    pub fn sim_dir(&self) -> PathBuf {
        self.maps_dir.join("sim")
    }

    pub fn txt_dir(&self) -> PathBuf {
        self.maps_dir.join("txt")
    }

    pub fn weights_dir(&self) -> PathBuf {
        self.maps_dir.join("weights")
    }

    pub fn sky_map_path(&self, particle: &ParticleSpec) -> PathBuf {
        self.fits_dir().join(format!(
            "{}_{}_{}.skymap.json",
            self.location, self.date, particle.key
        ))
    }

    pub fn simulation_prefix(&self, particle: &ParticleSpec) -> String {
        format!("{}_{}", self.location, particle.key)
    }

    /// Scratch directory the stage executables run in for one particle.
    pub fn work_dir(&self, particle: &ParticleSpec) -> PathBuf {
        self.sim_dir()
            .join("work")
            .join(self.simulation_prefix(particle))
    }

    pub fn integrated_flux_path(&self, particle: &ParticleSpec) -> PathBuf {
        self.txt_dir()
            .join(format!("int_flux_{}.txt", particle.flux_suffix))
    }

    pub fn artifact_set(&self, particle: &ParticleSpec) -> ArtifactSet {
        ArtifactSet::new(
            self.sky_map_path(particle),
            &self.sim_dir(),
            &self.simulation_prefix(particle),
        )
    }

    pub fn ensure_dirs(&self) -> ComputeResult<()> {
        for dir in [self.fits_dir(), self.sim_dir(), self.txt_dir()] {
            fs::create_dir_all(&dir).map_err(|source| {
                FluxError::io_system(
                    "IO.OUTPUT_DIRECTORY",
                    format!("failed to create directory '{}': {}", dir.display(), source),
                )
            })?;
        }
        Ok(())
    }
}

pub fn validate_nside(nside: u32) -> ComputeResult<()> {
    if nside == 0 || !nside.is_power_of_two() || nside > MAX_NSIDE {
        return Err(FluxError::input_validation(
            "INPUT.NSIDE",
            format!(
                "nside must be a power of two in 1..={}, got {}",
                MAX_NSIDE, nside
            ),
        ));
    }
    Ok(())
}
