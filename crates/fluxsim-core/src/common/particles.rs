//! Particle species catalog keyed by the six-character names used in the
//! angular flux tables.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticleSpec {
    /// Key as it appears in the `particle` column of the flux table.
    pub key: String,
    pub display_name: String,
    pub pdg_code: i32,
    pub mass_mev: f64,
    /// Particle label used by the sky generator for integrated flux files.
    pub flux_suffix: String,
}

impl ParticleSpec {
    pub fn new(
        key: impl Into<String>,
        display_name: impl Into<String>,
        pdg_code: i32,
        mass_mev: f64,
        flux_suffix: impl Into<String>,
    ) -> Self {
        Self {
            key: key.into(),
            display_name: display_name.into(),
            pdg_code,
            mass_mev,
            flux_suffix: flux_suffix.into(),
        }
    }
}

const DEFAULT_CATALOG: [(&str, &str, i32, f64, &str); 8] = [
    ("neutro", "Neutron", 2112, 939.565, "neutron"),
    ("proton", "Proton", 2212, 938.272, "proton"),
    // PDG ion codes are not recognised by the sky generator.
    ("he---4", "Helium-4", 1_000_020_040, 3727.38, "unknown"),
    ("muplus", "mu+", -13, 105.66, "mu+"),
    ("mumins", "mu-", 13, 105.66, "mu-"),
    ("electr", "Electron", 11, 0.511, "e-"),
    ("positr", "Positron", -11, 0.511, "e+"),
    ("photon", "Photon", 22, 0.0, "gamma"),
];

pub fn default_particle_catalog() -> Vec<ParticleSpec> {
    DEFAULT_CATALOG
        .iter()
        .map(|(key, name, pdg, mass, suffix)| ParticleSpec::new(*key, *name, *pdg, *mass, *suffix))
        .collect()
}

pub fn find_particle<'a>(catalog: &'a [ParticleSpec], key: &str) -> Option<&'a ParticleSpec> {
    let normalized = key.trim();
    catalog.iter().find(|particle| particle.key == normalized)
}

/// Splits requested keys into catalog entries and unknown names, preserving
/// request order. An empty request selects the whole catalog.
pub fn select_particles<'a>(
    catalog: &'a [ParticleSpec],
    requested: &[String],
) -> (Vec<&'a ParticleSpec>, Vec<String>) {
    if requested.is_empty() {
        return (catalog.iter().collect(), Vec::new());
    }

    let mut selected = Vec::new();
    let mut unknown = Vec::new();
    for key in requested {
        match find_particle(catalog, key) {
            Some(particle) => selected.push(particle),
            None => unknown.push(key.clone()),
        }
    }
    (selected, unknown)
}

#[cfg(test)]
mod tests {
    use super::{default_particle_catalog, find_particle, select_particles};

    #[test]
    fn default_catalog_covers_all_parma_species() {
        let catalog = default_particle_catalog();
        assert_eq!(catalog.len(), 8);

        let helium = find_particle(&catalog, "he---4").expect("helium should be present");
        assert_eq!(helium.pdg_code, 1_000_020_040);
        assert_eq!(helium.flux_suffix, "unknown");

        let photon = find_particle(&catalog, " photon ").expect("lookup trims keys");
        assert_eq!(photon.pdg_code, 22);
        assert_eq!(photon.mass_mev, 0.0);
    }

    #[test]
    fn selection_reports_unknown_keys_in_request_order() {
        let catalog = default_particle_catalog();
        let requested = vec![
            "photon".to_string(),
            "tachyon".to_string(),
            "proton".to_string(),
        ];
        let (selected, unknown) = select_particles(&catalog, &requested);

        let keys: Vec<&str> = selected.iter().map(|particle| particle.key.as_str()).collect();
        assert_eq!(keys, vec!["photon", "proton"]);
        assert_eq!(unknown, vec!["tachyon".to_string()]);
    }

    #[test]
    fn empty_selection_returns_full_catalog() {
        let catalog = default_particle_catalog();
        let (selected, unknown) = select_particles(&catalog, &[]);
        assert_eq!(selected.len(), catalog.len());
        assert!(unknown.is_empty());
    }
}
