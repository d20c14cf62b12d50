use crate::common::constants::COSINE_SPACING_TOLERANCE;
use crate::domain::{ComputeResult, FluxError};
use crate::numerics::{first_nonuniform_step, trapezoid_integrate};

/// Flux of one `(particle, energy)` slice sampled on a uniform `cos θ` grid
/// spanning `[-1, 1]`, ascending.
#[derive(Debug, Clone, PartialEq)]
pub struct ZenithProfile {
    cosines: Vec<f64>,
    fluxes: Vec<f64>,
    delta: f64,
}

impl ZenithProfile {
    /// `label` names the slice in error messages.
    pub fn new(mut samples: Vec<(f64, f64)>, label: &str) -> ComputeResult<Self> {
        if samples.len() < 2 {
            return Err(FluxError::data_insufficient(
                "DATA.TOO_FEW_SAMPLES",
                format!(
                    "{}: {} zenith sample(s), at least 2 are required",
                    label,
                    samples.len()
                ),
            ));
        }

        if let Some((cosine, flux)) = samples
            .iter()
            .find(|(cosine, flux)| !cosine.is_finite() || !flux.is_finite() || *flux < 0.0)
        {
            return Err(FluxError::data_insufficient(
                "DATA.FLUX_VALUE",
                format!(
                    "{}: sample (costheta={}, flux={}) must be finite with non-negative flux",
                    label, cosine, flux
                ),
            ));
        }

        samples.sort_by(|lhs, rhs| lhs.0.total_cmp(&rhs.0));
        let (cosines, fluxes): (Vec<f64>, Vec<f64>) = samples.into_iter().unzip();
        let delta = 2.0 / (cosines.len() - 1) as f64;

        let first = cosines[0];
        let last = cosines[cosines.len() - 1];
        if (first + 1.0).abs() > COSINE_SPACING_TOLERANCE
            || (last - 1.0).abs() > COSINE_SPACING_TOLERANCE
        {
            return Err(FluxError::data_insufficient(
                "DATA.SAMPLING_RANGE",
                format!(
                    "{}: zenith cosines span [{}, {}], expected [-1, 1]",
                    label, first, last
                ),
            ));
        }

        if let Some(index) = first_nonuniform_step(&cosines, delta, COSINE_SPACING_TOLERANCE) {
            return Err(FluxError::data_insufficient(
                "DATA.NONUNIFORM_SAMPLING",
                format!(
                    "{}: spacing {} between samples {} and {}, expected {}",
                    label,
                    cosines[index] - cosines[index - 1],
                    index - 1,
                    index,
                    delta
                ),
            ));
        }

        Ok(Self {
            cosines,
            fluxes,
            delta,
        })
    }

    pub fn len(&self) -> usize {
        self.fluxes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fluxes.is_empty()
    }

    pub fn delta(&self) -> f64 {
        self.delta
    }

    pub fn cosines(&self) -> &[f64] {
        &self.cosines
    }

    pub fn fluxes(&self) -> &[f64] {
        &self.fluxes
    }

    /// Lower edge of the topmost sampling cell. Directions at or above it take
    /// the penultimate sample instead of being interpolated.
    pub fn top_cell_threshold(&self) -> f64 {
        1.0 - self.delta
    }

    pub fn flux_at(&self, cos_zenith: f64) -> f64 {
        let count = self.fluxes.len();
        if cos_zenith >= self.top_cell_threshold() {
            return self.fluxes[count - 2];
        }

        let position = (cos_zenith + 1.0) / self.delta;
        let lower = (position.floor().max(0.0) as usize).min(count - 2);
        let fraction = (position - lower as f64).clamp(0.0, 1.0);
        (1.0 - fraction) * self.fluxes[lower] + fraction * self.fluxes[lower + 1]
    }
}

/// One full-sky map in canonical RING pixel order.
#[derive(Debug, Clone, PartialEq)]
pub struct SkyMap {
    nside: u32,
    values: Vec<f64>,
}

impl SkyMap {
    pub(crate) fn from_values(nside: u32, values: Vec<f64>) -> Self {
        Self { nside, values }
    }

    pub fn nside(&self) -> u32 {
        self.nside
    }

    pub fn npix(&self) -> usize {
        self.values.len()
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn into_values(self) -> Vec<f64> {
        self.values
    }

    pub fn min_max(&self) -> Option<(f64, f64)> {
        let mut iter = self.values.iter().copied();
        let first = iter.next()?;
        Some(iter.fold((first, first), |(lo, hi), value| {
            (lo.min(value), hi.max(value))
        }))
    }
}

/// All energy-band maps of one particle, ascending in energy.
#[derive(Debug, Clone, PartialEq)]
pub struct SkyMapBundle {
    pub particle: String,
    pub nside: u32,
    pub energies_mev: Vec<f64>,
    pub maps: Vec<SkyMap>,
}

impl SkyMapBundle {
    pub fn band_count(&self) -> usize {
        self.maps.len()
    }

    /// Collapses the bands into one map by trapezoidal integration over
    /// energy; the result is in 1/cm²/s/sr.
    pub fn integrated_map(&self) -> ComputeResult<SkyMap> {
        if self.maps.len() < 2 {
            return Err(FluxError::data_insufficient(
                "DATA.ENERGY_BANDS",
                format!(
                    "{}: {} energy band(s), at least 2 are required to integrate over energy",
                    self.particle,
                    self.maps.len()
                ),
            ));
        }

        let npix = self.maps[0].npix();
        if self.maps.iter().any(|map| map.npix() != npix)
            || self.energies_mev.len() != self.maps.len()
        {
            return Err(FluxError::data_insufficient(
                "DATA.ENERGY_BANDS",
                format!(
                    "{}: every band needs one energy and {} pixels",
                    self.particle, npix
                ),
            ));
        }
        let mut column = vec![0.0; self.maps.len()];
        let mut values = Vec::with_capacity(npix);
        for pixel in 0..npix {
            for (slot, map) in column.iter_mut().zip(&self.maps) {
                *slot = map.values()[pixel];
            }
            let integral = trapezoid_integrate(&self.energies_mev, &column).ok_or_else(|| {
                FluxError::data_insufficient(
                    "DATA.ENERGY_BANDS",
                    format!(
                        "{}: band energies must be strictly ascending",
                        self.particle
                    ),
                )
            })?;
            values.push(integral);
        }

        Ok(SkyMap::from_values(self.nside, values))
    }
}

#[cfg(test)]
mod tests {
    use super::{SkyMap, SkyMapBundle, ZenithProfile};
    use crate::domain::FluxErrorCategory;

    fn five_sample_profile() -> ZenithProfile {
        ZenithProfile::new(
            vec![(-1.0, 1.0), (-0.5, 0.8), (0.0, 0.5), (0.5, 0.3), (1.0, 0.1)],
            "proton @ 10 MeV",
        )
        .expect("uniform profile")
    }

    #[test]
    fn samples_are_sorted_by_cosine() {
        let profile = ZenithProfile::new(vec![(1.0, 2.0), (-1.0, 4.0), (0.0, 3.0)], "slice")
            .expect("uniform profile");
        assert_eq!(profile.cosines(), &[-1.0, 0.0, 1.0]);
        assert_eq!(profile.fluxes(), &[4.0, 3.0, 2.0]);
        assert_eq!(profile.delta(), 1.0);
    }

    #[test]
    fn top_cell_takes_penultimate_sample() {
        let profile = five_sample_profile();
        assert_eq!(profile.top_cell_threshold(), 0.5);
        for cosine in [0.5, 0.6, 2.0 / 3.0, 0.99, 1.0] {
            assert_eq!(profile.flux_at(cosine), 0.3, "cos={cosine}");
        }
    }

    #[test]
    fn grid_points_reproduce_tabulated_values() {
        let profile = five_sample_profile();
        assert_eq!(profile.flux_at(-1.0), 1.0);
        assert_eq!(profile.flux_at(-0.5), 0.8);
        assert_eq!(profile.flux_at(0.0), 0.5);
    }

    #[test]
    fn interior_points_interpolate_linearly() {
        let profile = five_sample_profile();
        let value = profile.flux_at(-2.0 / 3.0);
        let expected = 1.0 / 3.0 * 1.0 + 2.0 / 3.0 * 0.8;
        assert!((value - expected).abs() < 1.0e-12);
        assert!((profile.flux_at(0.25) - 0.4).abs() < 1.0e-12);
    }

    #[test]
    fn two_samples_always_return_first_value() {
        let profile = ZenithProfile::new(vec![(-1.0, 7.0), (1.0, 9.0)], "slice")
            .expect("two-sample profile");
        assert_eq!(profile.flux_at(-0.999), 7.0);
        assert_eq!(profile.flux_at(0.999), 7.0);
    }

    #[test]
    fn malformed_sampling_is_data_insufficient() {
        let cases = [
            (vec![(0.0, 1.0)], "DATA.TOO_FEW_SAMPLES"),
            (vec![(-1.0, 1.0), (-0.2, 1.0), (1.0, 1.0)], "DATA.NONUNIFORM_SAMPLING"),
            (vec![(-0.9, 1.0), (0.0, 1.0), (0.9, 1.0)], "DATA.SAMPLING_RANGE"),
            (vec![(-1.0, 1.0), (0.0, -0.1), (1.0, 1.0)], "DATA.FLUX_VALUE"),
            (vec![(-1.0, 1.0), (0.0, f64::NAN), (1.0, 1.0)], "DATA.FLUX_VALUE"),
            (vec![(-1.0, 1.0), (1.0, 1.0), (1.0, 1.0)], "DATA.NONUNIFORM_SAMPLING"),
        ];

        for (samples, placeholder) in cases {
            let error = ZenithProfile::new(samples, "slice").expect_err("should be rejected");
            assert_eq!(error.category(), FluxErrorCategory::DataInsufficient);
            assert_eq!(error.placeholder(), placeholder);
        }
    }

    #[test]
    fn integrated_map_uses_trapezoid_over_energy() {
        let bundle = SkyMapBundle {
            particle: "photon".to_string(),
            nside: 1,
            energies_mev: vec![1.0, 3.0],
            maps: vec![
                SkyMap::from_values(1, vec![1.0; 12]),
                SkyMap::from_values(1, vec![3.0; 12]),
            ],
        };
        let integrated = bundle.integrated_map().expect("two bands integrate");
        assert_eq!(integrated.npix(), 12);
        assert!(integrated.values().iter().all(|value| (value - 4.0).abs() < 1.0e-12));

        let single = SkyMapBundle {
            maps: vec![SkyMap::from_values(1, vec![1.0; 12])],
            energies_mev: vec![1.0],
            ..bundle
        };
        let error = single.integrated_map().expect_err("one band cannot integrate");
        assert_eq!(error.placeholder(), "DATA.ENERGY_BANDS");
    }

    #[test]
    fn ragged_bands_are_insufficient_instead_of_indexing_past_the_end() {
        let ragged = SkyMapBundle {
            particle: "photon".to_string(),
            nside: 1,
            energies_mev: vec![1.0, 3.0],
            maps: vec![
                SkyMap::from_values(1, vec![1.0; 12]),
                SkyMap::from_values(1, vec![3.0; 5]),
            ],
        };
        let error = ragged.integrated_map().expect_err("band pixel counts differ");
        assert_eq!(error.category(), FluxErrorCategory::DataInsufficient);
        assert_eq!(error.placeholder(), "DATA.ENERGY_BANDS");

        let missing_energy = SkyMapBundle {
            energies_mev: vec![1.0],
            maps: vec![
                SkyMap::from_values(1, vec![1.0; 12]),
                SkyMap::from_values(1, vec![3.0; 12]),
            ],
            ..ragged
        };
        let error = missing_energy
            .integrated_map()
            .expect_err("band without an energy");
        assert_eq!(error.category(), FluxErrorCategory::DataInsufficient);
    }
}
