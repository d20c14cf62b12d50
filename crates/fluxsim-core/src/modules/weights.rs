//! Event-count to rate conversion from the sky generator's integrated flux
//! summaries.
//!
//! A simulation of `n` events drawn from a map with total integrated flux `S`
//! (summed over pixels and bands) represents an exposure of
//! `T = n / (S · Ω_pix)`; dividing the detector cross-section by `T` gives the
//! per-event weight in Hz.

use crate::common::config::RunConfig;
use crate::common::constants::FOUR_PI;
use crate::common::particles::ParticleSpec;
use crate::domain::{ComputeResult, FluxError};
use crate::numerics::{npix_for_nside, stable_sum};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq)]
pub struct IntegratedFluxSummary {
    pub pixel_indices: Vec<u64>,
    /// One column per energy band, each holding a value per listed pixel.
    pub bands: Vec<Vec<f64>>,
    pub total: f64,
}

pub fn read_integrated_flux_summary(path: &Path) -> ComputeResult<IntegratedFluxSummary> {
    let content = fs::read_to_string(path).map_err(|source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            FluxError::not_found(
                "NOTFOUND.INTEGRATED_FLUX",
                format!("integrated flux file '{}' does not exist", path.display()),
            )
        } else {
            FluxError::io_system(
                "IO.INTEGRATED_FLUX_READ",
                format!(
                    "failed to read integrated flux file '{}': {}",
                    path.display(),
                    source
                ),
            )
        }
    })?;
    parse_integrated_flux_summary(&content, &path.display().to_string())
}

pub fn parse_integrated_flux_summary(
    content: &str,
    source_label: &str,
) -> ComputeResult<IntegratedFluxSummary> {
    let mut pixel_indices = Vec::new();
    let mut bands: Vec<Vec<f64>> = Vec::new();

    for (index, raw_line) in content.lines().enumerate() {
        let line_number = index + 1;
        let line = raw_line
            .split_once('#')
            .map_or(raw_line, |(data, _comment)| data)
            .trim();
        if line.is_empty() {
            continue;
        }

        let mut fields = line.split_whitespace();
        let pixel_field = fields.next().unwrap_or_default();
        let pixel = parse_pixel_index(pixel_field, source_label, line_number)?;
        let values = fields
            .map(|field| {
                field.parse::<f64>().map_err(|_| {
                    FluxError::input_validation(
                        "INPUT.INTEGRATED_FLUX_NUMBER",
                        format!(
                            "{}:{}: '{}' is not a number",
                            source_label, line_number, field
                        ),
                    )
                })
            })
            .collect::<ComputeResult<Vec<f64>>>()?;

        if bands.is_empty() {
            bands = vec![Vec::new(); values.len()];
        }
        if values.is_empty() || values.len() != bands.len() {
            return Err(FluxError::input_validation(
                "INPUT.INTEGRATED_FLUX_ROW",
                format!(
                    "{}:{}: expected a pixel index and {} band value(s), found {}",
                    source_label,
                    line_number,
                    bands.len().max(1),
                    values.len()
                ),
            ));
        }

        pixel_indices.push(pixel);
        for (column, value) in bands.iter_mut().zip(values) {
            column.push(value);
        }
    }

    if pixel_indices.is_empty() {
        return Err(FluxError::data_insufficient(
            "DATA.INTEGRATED_FLUX_EMPTY",
            format!("{}: no integrated flux rows", source_label),
        ));
    }

    let band_totals: Vec<f64> = bands.iter().map(|column| stable_sum(column)).collect();
    Ok(IntegratedFluxSummary {
        pixel_indices,
        total: stable_sum(&band_totals),
        bands,
    })
}

fn parse_pixel_index(field: &str, source_label: &str, line_number: usize) -> ComputeResult<u64> {
    // Summaries written with floating-point formatting carry "12.0" style indices.
    field
        .parse::<u64>()
        .ok()
        .or_else(|| {
            field
                .parse::<f64>()
                .ok()
                .filter(|value| value.fract() == 0.0 && *value >= 0.0)
                .map(|value| value as u64)
        })
        .ok_or_else(|| {
            FluxError::input_validation(
                "INPUT.INTEGRATED_FLUX_PIXEL",
                format!(
                    "{}:{}: '{}' is not a pixel index",
                    source_label, line_number, field
                ),
            )
        })
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeightFactor {
    /// Total integrated flux, 1/cm²/s/sr.
    pub s: f64,
    /// Effective exposure represented by the simulated events, cm²·s.
    pub t: f64,
    /// Per-event rate weight, 1/s.
    pub w: f64,
}

pub fn pixel_solid_angle(nside: u32) -> f64 {
    FOUR_PI / npix_for_nside(nside) as f64
}

pub fn weight_factor(
    total_flux: f64,
    nside: u32,
    num_events: u64,
    cross_section_cm2: f64,
) -> ComputeResult<WeightFactor> {
    if !total_flux.is_finite() || total_flux <= 0.0 {
        return Err(FluxError::data_insufficient(
            "DATA.INTEGRATED_FLUX_TOTAL",
            format!(
                "integrated flux total must be positive and finite, got {}",
                total_flux
            ),
        ));
    }
    let exposure = num_events as f64 / (total_flux * pixel_solid_angle(nside));
    Ok(WeightFactor {
        s: total_flux,
        t: exposure,
        w: cross_section_cm2 / exposure,
    })
}

/// Weights keyed by particle, plus the particles that could not be weighted.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WeightsReport {
    pub weights: BTreeMap<String, WeightFactor>,
    pub skipped: Vec<(String, FluxError)>,
}

impl WeightsReport {
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty()
    }
}

pub fn particle_weight(
    config: &RunConfig,
    particle: &ParticleSpec,
    num_events: u64,
) -> ComputeResult<WeightFactor> {
    let summary = read_integrated_flux_summary(&config.integrated_flux_path(particle))?;
    weight_factor(
        summary.total,
        config.nside,
        num_events,
        config.tpc.average_cross_section(),
    )
}

/// Computes weights for each particle; a particle whose summary is missing or
/// unusable is reported and skipped.
pub fn compute_weights(
    config: &RunConfig,
    particles: &[&ParticleSpec],
    num_events: u64,
) -> WeightsReport {
    let mut report = WeightsReport::default();
    for particle in particles {
        match particle_weight(config, particle, num_events) {
            Ok(factor) => {
                info!(
                    particle = %particle.key,
                    s = factor.s,
                    t = factor.t,
                    w = factor.w,
                    "computed rate weight"
                );
                report.weights.insert(particle.key.clone(), factor);
            }
            Err(error) => {
                warn!(particle = %particle.key, error = %error, "skipping rate weight");
                report.skipped.push((particle.key.clone(), error));
            }
        }
    }
    report
}

#[cfg(test)]
mod tests {
    use super::{parse_integrated_flux_summary, pixel_solid_angle, weight_factor};
    use crate::common::constants::FOUR_PI;
    use crate::domain::FluxErrorCategory;

    #[test]
    fn summary_sums_every_pixel_and_band() {
        let summary = parse_integrated_flux_summary(
            "# pixel band1 band2\n0 1.0 2.0\n1 0.5 0.25 # trailing\n\n2.0 0.25 0.0\n",
            "inline",
        )
        .expect("summary should parse");
        assert_eq!(summary.pixel_indices, vec![0, 1, 2]);
        assert_eq!(summary.bands.len(), 2);
        assert_eq!(summary.bands[0], vec![1.0, 0.5, 0.25]);
        assert_eq!(summary.total, 4.0);
    }

    #[test]
    fn ragged_or_empty_summaries_are_rejected() {
        let error = parse_integrated_flux_summary("0 1.0 2.0\n1 3.0\n", "inline")
            .expect_err("ragged rows");
        assert_eq!(error.placeholder(), "INPUT.INTEGRATED_FLUX_ROW");

        let error = parse_integrated_flux_summary("# only comments\n", "inline")
            .expect_err("no rows");
        assert_eq!(error.category(), FluxErrorCategory::DataInsufficient);

        let error =
            parse_integrated_flux_summary("x 1.0\n", "inline").expect_err("bad pixel");
        assert_eq!(error.placeholder(), "INPUT.INTEGRATED_FLUX_PIXEL");
    }

    #[test]
    fn weight_follows_exposure_formula() {
        let omega = pixel_solid_angle(1);
        assert!((omega - FOUR_PI / 12.0).abs() < 1.0e-15);

        let factor = weight_factor(2.0, 1, 100, 800.0).expect("positive flux");
        let expected_t = 100.0 / (2.0 * omega);
        assert!((factor.t - expected_t).abs() < 1.0e-9);
        assert!((factor.w - 800.0 / expected_t).abs() < 1.0e-12);
        assert_eq!(factor.s, 2.0);
    }

    #[test]
    fn non_positive_total_is_insufficient() {
        for total in [0.0, -1.0, f64::NAN] {
            let error = weight_factor(total, 32, 10, 1.0).expect_err("invalid total");
            assert_eq!(error.category(), FluxErrorCategory::DataInsufficient);
        }
    }
}
