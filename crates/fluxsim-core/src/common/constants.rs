//! Shared numeric defaults for map synthesis, simulation, and rate weighting.

pub const PI: f64 = std::f64::consts::PI;
pub const FOUR_PI: f64 = 4.0 * PI;

/// HEALPix resolution used when the configuration does not override it.
pub const DEFAULT_NSIDE: u32 = 32;
/// Largest `nside` accepted by the ring geometry helpers.
pub const MAX_NSIDE: u32 = 8192;

pub const DEFAULT_NUM_EVENTS: u64 = 10_000;

/// Absolute tolerance on zenith-cosine spacing before a table is rejected as
/// non-uniform.
pub const COSINE_SPACING_TOLERANCE: f64 = 1.0e-6;

/// Stage diagnostics are cut to this many characters.
pub const DIAGNOSTIC_CHAR_LIMIT: usize = 500;

pub const FLUX_UNITS: &str = "1/cm2/s/MeV/sr";
pub const INTEGRATED_FLUX_UNITS: &str = "1/cm2/s/sr";

#[cfg(test)]
mod tests {
    use super::{DEFAULT_NSIDE, FOUR_PI, MAX_NSIDE, PI};

    #[test]
    fn constants_match_expected_relationships() {
        assert!((FOUR_PI - 4.0 * PI).abs() <= 1.0e-15);
        assert!(DEFAULT_NSIDE.is_power_of_two());
        assert!(MAX_NSIDE.is_power_of_two());
        assert!(DEFAULT_NSIDE <= MAX_NSIDE);
    }
}
