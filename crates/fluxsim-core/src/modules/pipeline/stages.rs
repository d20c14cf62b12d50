//! Declarative stage table. Each stage names the slots it reads, the slot it
//! writes, external resources it needs, and an argument template; the
//! orchestrator walks the table without per-stage branching.

use crate::domain::{ArtifactSlot, ComputeResult, FluxError, SimStage};
use std::ffi::OsString;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

/// Inputs that live outside a work item's artifact chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExternalResource {
    Lightmaps,
}

impl ExternalResource {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Lightmaps => "lightmaps",
        }
    }

    pub const fn file_pattern(self) -> &'static str {
        match self {
            Self::Lightmaps => "lightmap*.root",
        }
    }
}

impl Display for ExternalResource {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str((*self).as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgToken {
    Flag(&'static str),
    Slot(ArtifactSlot),
    PrimaryPdg,
    EventCount,
    ResourcePattern(ExternalResource),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageDescriptor {
    pub stage: SimStage,
    pub inputs: &'static [ArtifactSlot],
    pub output: ArtifactSlot,
    pub resources: &'static [ExternalResource],
    pub args: &'static [ArgToken],
}

pub const STAGE_TABLE: [StageDescriptor; 7] = [
    StageDescriptor {
        stage: SimStage::GramsSky,
        inputs: &[ArtifactSlot::SkyMap],
        output: ArtifactSlot::Hepmc3,
        resources: &[],
        args: &[
            ArgToken::Flag("--MapEnergyBandsFile"),
            ArgToken::Slot(ArtifactSlot::SkyMap),
            ArgToken::Flag("--PrimaryPDG"),
            ArgToken::PrimaryPdg,
            ArgToken::Flag("-n"),
            ArgToken::EventCount,
            ArgToken::Flag("-o"),
            ArgToken::Slot(ArtifactSlot::Hepmc3),
        ],
    },
    StageDescriptor {
        stage: SimStage::GramsG4,
        inputs: &[ArtifactSlot::Hepmc3],
        output: ArtifactSlot::G4,
        resources: &[],
        args: &[
            ArgToken::Flag("-i"),
            ArgToken::Slot(ArtifactSlot::Hepmc3),
            ArgToken::Flag("-o"),
            ArgToken::Slot(ArtifactSlot::G4),
        ],
    },
    StageDescriptor {
        stage: SimStage::GramsDetSim,
        inputs: &[ArtifactSlot::G4],
        output: ArtifactSlot::DetSim,
        resources: &[],
        args: &[
            ArgToken::Flag("-i"),
            ArgToken::Slot(ArtifactSlot::G4),
            ArgToken::Flag("-o"),
            ArgToken::Slot(ArtifactSlot::DetSim),
        ],
    },
    StageDescriptor {
        stage: SimStage::GramsReadoutSim,
        inputs: &[ArtifactSlot::DetSim],
        output: ArtifactSlot::ReadoutSim,
        resources: &[],
        args: &[
            ArgToken::Flag("-i"),
            ArgToken::Slot(ArtifactSlot::DetSim),
            ArgToken::Flag("-o"),
            ArgToken::Slot(ArtifactSlot::ReadoutSim),
        ],
    },
    StageDescriptor {
        stage: SimStage::GramsElecSim,
        inputs: &[ArtifactSlot::DetSim, ArtifactSlot::ReadoutSim],
        output: ArtifactSlot::ElecSim,
        resources: &[],
        args: &[
            ArgToken::Flag("-i"),
            ArgToken::Slot(ArtifactSlot::DetSim),
            ArgToken::Flag("-m"),
            ArgToken::Slot(ArtifactSlot::ReadoutSim),
            ArgToken::Flag("-o"),
            ArgToken::Slot(ArtifactSlot::ElecSim),
        ],
    },
    // Optical branch hangs off the G4 output, not the electronics chain.
    StageDescriptor {
        stage: SimStage::OpticalSim,
        inputs: &[ArtifactSlot::G4],
        output: ArtifactSlot::OpticalSim,
        resources: &[ExternalResource::Lightmaps],
        args: &[
            ArgToken::Flag("-i"),
            ArgToken::Slot(ArtifactSlot::G4),
            ArgToken::Flag("-m"),
            ArgToken::ResourcePattern(ExternalResource::Lightmaps),
            ArgToken::Flag("-o"),
            ArgToken::Slot(ArtifactSlot::OpticalSim),
        ],
    },
    StageDescriptor {
        stage: SimStage::OpDetSim,
        inputs: &[ArtifactSlot::OpticalSim],
        output: ArtifactSlot::OpDetSim,
        resources: &[],
        args: &[
            ArgToken::Flag("-i"),
            ArgToken::Slot(ArtifactSlot::OpticalSim),
            ArgToken::Flag("-o"),
            ArgToken::Slot(ArtifactSlot::OpDetSim),
        ],
    },
];

pub fn stage_descriptor(stage: SimStage) -> &'static StageDescriptor {
    &STAGE_TABLE[stage.ordinal()]
}

/// Values the argument templates draw from besides slot paths.
#[derive(Debug, Clone, Copy)]
pub struct ArgumentContext<'a> {
    pub pdg_code: i32,
    pub num_events: u64,
    pub lightmap_dir: &'a Path,
}

impl ArgumentContext<'_> {
    pub fn resource_dir(&self, resource: ExternalResource) -> &Path {
        match resource {
            ExternalResource::Lightmaps => self.lightmap_dir,
        }
    }
}

impl StageDescriptor {
    pub fn build_arguments(
        &self,
        slot_path: impl Fn(ArtifactSlot) -> PathBuf,
        context: &ArgumentContext<'_>,
    ) -> Vec<OsString> {
        self.args
            .iter()
            .map(|token| match *token {
                ArgToken::Flag(flag) => OsString::from(flag),
                ArgToken::Slot(slot) => slot_path(slot).into_os_string(),
                ArgToken::PrimaryPdg => OsString::from(context.pdg_code.to_string()),
                ArgToken::EventCount => OsString::from(context.num_events.to_string()),
                ArgToken::ResourcePattern(resource) => context
                    .resource_dir(resource)
                    .join(resource.file_pattern())
                    .into_os_string(),
            })
            .collect()
    }
}

/// Inclusive, contiguous slice of the fixed stage order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageRange {
    start: SimStage,
    stop: SimStage,
}

impl StageRange {
    pub fn new(start: SimStage, stop: SimStage) -> ComputeResult<Self> {
        if start.ordinal() > stop.ordinal() {
            return Err(FluxError::input_validation(
                "INPUT.STAGE_RANGE",
                format!(
                    "start stage '{}' comes after stop stage '{}'",
                    start, stop
                ),
            ));
        }
        Ok(Self { start, stop })
    }

    pub const fn full() -> Self {
        Self {
            start: SimStage::FIRST,
            stop: SimStage::LAST,
        }
    }

    pub const fn start(&self) -> SimStage {
        self.start
    }

    pub const fn stop(&self) -> SimStage {
        self.stop
    }

    pub fn stages(&self) -> impl Iterator<Item = SimStage> + '_ {
        SimStage::ALL[self.start.ordinal()..=self.stop.ordinal()]
            .iter()
            .copied()
    }
}

impl Default for StageRange {
    fn default() -> Self {
        Self::full()
    }
}
