//! Angular flux table to HEALPix sky-map synthesis.
//!
//! Each `(particle, energy)` slice of the table is a zenith profile sampled on
//! a uniform `cos θ` grid. Every pixel of the requested resolution takes the
//! profile value at its colatitude; flux is azimuthally symmetric.

mod model;
mod parser;

use crate::common::config::RunConfig;
use crate::domain::{ComputeResult, FluxError};
use crate::numerics::RingGeometry;
use std::path::Path;
use tracing::debug;

pub use model::{SkyMap, SkyMapBundle, ZenithProfile};
pub use parser::AngularFluxRow;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AngularFluxTable {
    rows: Vec<AngularFluxRow>,
}

impl AngularFluxTable {
    pub fn from_rows(rows: Vec<AngularFluxRow>) -> Self {
        Self { rows }
    }

    pub fn parse_csv(content: &str, source_label: &str) -> ComputeResult<Self> {
        parser::parse_flux_csv(content, source_label).map(Self::from_rows)
    }

    pub fn load_csv(path: &Path) -> ComputeResult<Self> {
        parser::read_flux_csv(path).map(Self::from_rows)
    }

    pub fn rows(&self) -> &[AngularFluxRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Distinct particle keys in order of first appearance.
    pub fn particles(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for row in &self.rows {
            if !seen.contains(&row.particle.as_str()) {
                seen.push(&row.particle);
            }
        }
        seen
    }

    /// Distinct energy bands of a particle, ascending.
    pub fn energy_bands(&self, particle: &str) -> Vec<f64> {
        let mut energies: Vec<f64> = self
            .rows
            .iter()
            .filter(|row| row.particle == particle)
            .map(|row| row.energy_mev)
            .collect();
        energies.sort_by(f64::total_cmp);
        energies.dedup();
        energies
    }

    pub fn zenith_profile(&self, particle: &str, energy_mev: f64) -> ComputeResult<ZenithProfile> {
        let samples: Vec<(f64, f64)> = self
            .rows
            .iter()
            .filter(|row| row.particle == particle && row.energy_mev == energy_mev)
            .map(|row| (row.cos_zenith, row.flux))
            .collect();

        if samples.is_empty() {
            return Err(FluxError::not_found(
                "NOTFOUND.FLUX_SLICE",
                format!(
                    "no angular flux rows for particle '{}' at energy {} MeV",
                    particle, energy_mev
                ),
            ));
        }

        ZenithProfile::new(samples, &format!("{} @ {} MeV", particle, energy_mev))
    }
}

/// Map synthesis at a fixed resolution.
#[derive(Debug, Clone, Copy)]
pub struct FluxMapSynthesizer {
    nside: u32,
    geometry: RingGeometry,
}

impl FluxMapSynthesizer {
    pub fn new(nside: u32) -> ComputeResult<Self> {
        Ok(Self {
            nside,
            geometry: RingGeometry::new(nside)?,
        })
    }

    pub fn from_config(config: &RunConfig) -> ComputeResult<Self> {
        Self::new(config.nside)
    }

    pub fn nside(&self) -> u32 {
        self.nside
    }

    pub fn npix(&self) -> u64 {
        self.geometry.npix()
    }

    pub fn synthesize(
        &self,
        table: &AngularFluxTable,
        particle: &str,
        energy_mev: f64,
    ) -> ComputeResult<SkyMap> {
        let profile = table.zenith_profile(particle, energy_mev)?;
        Ok(self.synthesize_profile(&profile))
    }

    pub fn synthesize_profile(&self, profile: &ZenithProfile) -> SkyMap {
        let values = self
            .geometry
            .cos_colatitudes()
            .into_iter()
            .map(|cosine| profile.flux_at(cosine))
            .collect();
        SkyMap::from_values(self.nside, values)
    }

    /// One map per energy band of `particle`, ascending in energy.
    pub fn synthesize_particle(
        &self,
        table: &AngularFluxTable,
        particle: &str,
    ) -> ComputeResult<SkyMapBundle> {
        let energies = table.energy_bands(particle);
        if energies.is_empty() {
            return Err(FluxError::not_found(
                "NOTFOUND.FLUX_PARTICLE",
                format!("no angular flux rows for particle '{}'", particle),
            ));
        }

        let mut maps = Vec::with_capacity(energies.len());
        for &energy in &energies {
            maps.push(self.synthesize(table, particle, energy)?);
        }
        debug!(
            particle,
            bands = energies.len(),
            nside = self.nside,
            "synthesized sky maps"
        );

        Ok(SkyMapBundle {
            particle: particle.to_string(),
            nside: self.nside,
            energies_mev: energies,
            maps,
        })
    }
}

/// Single-request convenience over [`FluxMapSynthesizer`].
pub fn synthesize(
    table: &AngularFluxTable,
    particle: &str,
    energy_mev: f64,
    nside: u32,
) -> ComputeResult<SkyMap> {
    FluxMapSynthesizer::new(nside)?.synthesize(table, particle, energy_mev)
}
