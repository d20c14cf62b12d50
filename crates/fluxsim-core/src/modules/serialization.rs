use super::flux_map::{SkyMap, SkyMapBundle};
use crate::common::config::validate_nside;
use crate::common::constants::FLUX_UNITS;
use crate::domain::{ComputeResult, FluxError};
use crate::numerics::npix_for_nside;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const SKY_MAP_FORMAT: &str = "fluxsim-skymap";
pub const SKY_MAP_VERSION: u32 = 1;
pub const SKY_MAP_ORDERING: &str = "RING";

pub fn normalize_text_artifact(content: &str) -> String {
    let mut normalized = content.replace("\r\n", "\n").replace('\r', "\n");
    if !normalized.is_empty() && !normalized.ends_with('\n') {
        normalized.push('\n');
    }
    normalized
}

/// Writes a text artifact, creating parent directories as needed.
pub fn write_text_artifact(path: &Path, content: &str) -> ComputeResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| {
            FluxError::io_system(
                "IO.OUTPUT_DIRECTORY",
                format!(
                    "failed to create artifact directory '{}': {}",
                    parent.display(),
                    source
                ),
            )
        })?;
    }
    fs::write(path, normalize_text_artifact(content)).map_err(|source| {
        FluxError::io_system(
            "IO.ARTIFACT_WRITE",
            format!("failed to write artifact '{}': {}", path.display(), source),
        )
    })
}

pub fn write_json_artifact<T: Serialize>(path: &Path, value: &T) -> ComputeResult<()> {
    let content = serde_json::to_string_pretty(value).map_err(|source| {
        FluxError::internal(
            "SYS.JSON_SERIALIZE",
            format!(
                "failed to serialize artifact '{}': {}",
                path.display(),
                source
            ),
        )
    })?;
    write_text_artifact(path, &content)
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
struct SkyMapDocument {
    format: String,
    version: u32,
    particle: String,
    nside: u32,
    ordering: String,
    units: String,
    energies_mev: Vec<f64>,
    maps: Vec<Vec<f64>>,
}

pub fn write_sky_map_bundle(path: &Path, bundle: &SkyMapBundle) -> ComputeResult<()> {
    let document = SkyMapDocument {
        format: SKY_MAP_FORMAT.to_string(),
        version: SKY_MAP_VERSION,
        particle: bundle.particle.clone(),
        nside: bundle.nside,
        ordering: SKY_MAP_ORDERING.to_string(),
        units: FLUX_UNITS.to_string(),
        energies_mev: bundle.energies_mev.clone(),
        maps: bundle.maps.iter().map(|map| map.values().to_vec()).collect(),
    };
    write_json_artifact(path, &document)
}

pub fn read_sky_map_bundle(path: &Path) -> ComputeResult<SkyMapBundle> {
    let content = fs::read_to_string(path).map_err(|source| {
        FluxError::io_system(
            "IO.SKY_MAP_READ",
            format!("failed to read sky map '{}': {}", path.display(), source),
        )
    })?;
    let document: SkyMapDocument = serde_json::from_str(&content).map_err(|source| {
        FluxError::input_validation(
            "INPUT.SKY_MAP_PARSE",
            format!("failed to parse sky map '{}': {}", path.display(), source),
        )
    })?;

    if document.format != SKY_MAP_FORMAT || document.ordering != SKY_MAP_ORDERING {
        return Err(FluxError::input_validation(
            "INPUT.SKY_MAP_FORMAT",
            format!(
                "sky map '{}' has format '{}' ordering '{}', expected '{}' '{}'",
                path.display(),
                document.format,
                document.ordering,
                SKY_MAP_FORMAT,
                SKY_MAP_ORDERING
            ),
        ));
    }

    validate_nside(document.nside).map_err(|error| {
        FluxError::input_validation(
            error.placeholder(),
            format!("sky map '{}': {}", path.display(), error.message()),
        )
    })?;
    if !document
        .energies_mev
        .windows(2)
        .all(|pair| pair[0] < pair[1])
    {
        return Err(FluxError::input_validation(
            "INPUT.SKY_MAP_ENERGIES",
            format!(
                "sky map '{}' band energies must be strictly ascending",
                path.display()
            ),
        ));
    }

    let npix = npix_for_nside(document.nside) as usize;
    if document.maps.len() != document.energies_mev.len()
        || document.maps.iter().any(|map| map.len() != npix)
    {
        return Err(FluxError::input_validation(
            "INPUT.SKY_MAP_SHAPE",
            format!(
                "sky map '{}' must hold one {}-pixel map per energy band",
                path.display(),
                npix
            ),
        ));
    }

    Ok(SkyMapBundle {
        particle: document.particle,
        nside: document.nside,
        energies_mev: document.energies_mev,
        maps: document
            .maps
            .into_iter()
            .map(|values| SkyMap::from_values(document.nside, values))
            .collect(),
    })
}
