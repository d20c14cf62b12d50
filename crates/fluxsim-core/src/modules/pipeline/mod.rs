//! Staged simulation pipeline: a fixed chain of external executables run per
//! particle, each stage gated on the artifacts of the stages before it.

mod launcher;
mod orchestrator;
mod stages;

pub use launcher::{
    FsArtifactLocator, ProcessLauncher, StageInvocation, StageStatus, truncate_diagnostic,
};
pub use orchestrator::{
    PipelineOrchestrator, PipelineSettings, RunReport, StageFailure, WorkItem, WorkItemOutcome,
    WorkItemState,
};
pub use stages::{
    ArgToken, ArgumentContext, ExternalResource, STAGE_TABLE, StageDescriptor, StageRange,
    stage_descriptor,
};
