pub mod errors;

pub use errors::{
    ComputeResult, FluxError, FluxErrorCategory, FluxResult, ParserResult,
};

use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ExecutionMode {
    #[default]
    Serial,
}

/// External simulation stages in their fixed execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SimStage {
    GramsSky,
    GramsG4,
    GramsDetSim,
    GramsReadoutSim,
    GramsElecSim,
    OpticalSim,
    OpDetSim,
}

impl SimStage {
    pub const ALL: [SimStage; 7] = [
        Self::GramsSky,
        Self::GramsG4,
        Self::GramsDetSim,
        Self::GramsReadoutSim,
        Self::GramsElecSim,
        Self::OpticalSim,
        Self::OpDetSim,
    ];

    pub const FIRST: SimStage = Self::GramsSky;
    pub const LAST: SimStage = Self::OpDetSim;

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::GramsSky => "gramssky",
            Self::GramsG4 => "gramsg4",
            Self::GramsDetSim => "gramsdetsim",
            Self::GramsReadoutSim => "gramsreadoutsim",
            Self::GramsElecSim => "gramselecsim",
            Self::OpticalSim => "opticalsim",
            Self::OpDetSim => "opdetsim",
        }
    }

    pub const fn ordinal(self) -> usize {
        self as usize
    }

    pub fn next(self) -> Option<Self> {
        Self::ALL.get(self.ordinal() + 1).copied()
    }

    pub fn from_name(name: &str) -> Option<Self> {
        let normalized = name.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|stage| stage.as_str().eq_ignore_ascii_case(normalized))
    }

    pub fn names() -> Vec<&'static str> {
        Self::ALL.iter().map(|stage| stage.as_str()).collect()
    }
}

impl Display for SimStage {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str((*self).as_str())
    }
}

impl FromStr for SimStage {
    type Err = FluxError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::from_name(value).ok_or_else(|| {
            FluxError::input_validation(
                "INPUT.STAGE_NAME",
                format!(
                    "unknown stage '{}'; expected one of: {}",
                    value,
                    Self::names().join(", ")
                ),
            )
        })
    }
}

/// Named file positions in a work item's artifact chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ArtifactSlot {
    SkyMap,
    Hepmc3,
    G4,
    DetSim,
    ReadoutSim,
    ElecSim,
    OpticalSim,
    OpDetSim,
}

impl ArtifactSlot {
    pub const ALL: [ArtifactSlot; 8] = [
        Self::SkyMap,
        Self::Hepmc3,
        Self::G4,
        Self::DetSim,
        Self::ReadoutSim,
        Self::ElecSim,
        Self::OpticalSim,
        Self::OpDetSim,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SkyMap => "sky_map",
            Self::Hepmc3 => "hepmc3",
            Self::G4 => "g4",
            Self::DetSim => "detsim",
            Self::ReadoutSim => "readoutsim",
            Self::ElecSim => "elecsim",
            Self::OpticalSim => "opticalsim",
            Self::OpDetSim => "opdetsim",
        }
    }

    /// File name suffix appended to the work item's simulation prefix. The sky
    /// map lives in its own directory and is not derived from the prefix.
    pub const fn simulation_suffix(self) -> Option<&'static str> {
        match self {
            Self::SkyMap => None,
            Self::Hepmc3 => Some(".hepmc3"),
            Self::G4 => Some("_g4.root"),
            Self::DetSim => Some("_detsim.root"),
            Self::ReadoutSim => Some("_readoutsim.root"),
            Self::ElecSim => Some("_elecsim.root"),
            Self::OpticalSim => Some("_opticalsim.root"),
            Self::OpDetSim => Some("_opdetsim.root"),
        }
    }

    const fn index(self) -> usize {
        self as usize
    }
}

impl Display for ArtifactSlot {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str((*self).as_str())
    }
}

/// Private artifact paths of one work item, one per slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactSet {
    paths: [PathBuf; 8],
}

impl ArtifactSet {
    pub fn new(sky_map: impl Into<PathBuf>, sim_dir: &Path, prefix: &str) -> Self {
        let sky_map = sky_map.into();
        let paths = ArtifactSlot::ALL.map(|slot| match slot.simulation_suffix() {
            Some(suffix) => sim_dir.join(format!("{prefix}{suffix}")),
            None => sky_map.clone(),
        });
        Self { paths }
    }

    pub fn path(&self, slot: ArtifactSlot) -> &Path {
        &self.paths[slot.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = (ArtifactSlot, &Path)> {
        ArtifactSlot::ALL
            .iter()
            .copied()
            .map(|slot| (slot, self.path(slot)))
    }
}

#[cfg(test)]
mod tests {
    use super::{ArtifactSet, ArtifactSlot, FluxErrorCategory, SimStage};
    use std::path::Path;

    #[test]
    fn stage_names_round_trip_in_execution_order() {
        let names = SimStage::names();
        assert_eq!(
            names,
            vec![
                "gramssky",
                "gramsg4",
                "gramsdetsim",
                "gramsreadoutsim",
                "gramselecsim",
                "opticalsim",
                "opdetsim"
            ]
        );
        for (ordinal, stage) in SimStage::ALL.iter().enumerate() {
            assert_eq!(stage.ordinal(), ordinal);
            assert_eq!(SimStage::from_name(stage.as_str()), Some(*stage));
        }
        assert_eq!(SimStage::GramsElecSim.next(), Some(SimStage::OpticalSim));
        assert_eq!(SimStage::LAST.next(), None);
    }

    #[test]
    fn unknown_stage_name_is_input_validation_error() {
        let error = "gramsfoo".parse::<SimStage>().expect_err("should reject");
        assert_eq!(error.category(), FluxErrorCategory::InputValidationError);
        assert!(error.message().contains("gramselecsim"));
        assert_eq!("GramsG4".parse::<SimStage>().ok(), Some(SimStage::GramsG4));
    }

    #[test]
    fn artifact_set_namespaces_paths_by_prefix() {
        let set = ArtifactSet::new(
            "/maps/fits/tucson_2025_8_31_proton.skymap.json",
            Path::new("/maps/sim"),
            "tucson_proton",
        );
        assert_eq!(
            set.path(ArtifactSlot::SkyMap),
            Path::new("/maps/fits/tucson_2025_8_31_proton.skymap.json")
        );
        assert_eq!(
            set.path(ArtifactSlot::Hepmc3),
            Path::new("/maps/sim/tucson_proton.hepmc3")
        );
        assert_eq!(
            set.path(ArtifactSlot::ElecSim),
            Path::new("/maps/sim/tucson_proton_elecsim.root")
        );
        assert_eq!(set.iter().count(), ArtifactSlot::ALL.len());
    }
}
