use super::launcher::StageInvocation;
use super::stages::{ArgumentContext, StageRange, stage_descriptor};
use crate::common::config::RunConfig;
use crate::common::particles::ParticleSpec;
use crate::domain::{ArtifactSet, ComputeResult, ExecutionMode, FluxError, SimStage};
use crate::modules::traits::{ArtifactLocator, StageLauncher};
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, info, warn};

/// One particle's run through the stage chain.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkItem {
    pub particle: ParticleSpec,
    pub artifacts: ArtifactSet,
    pub working_dir: PathBuf,
}

impl WorkItem {
    pub fn from_config(config: &RunConfig, particle: &ParticleSpec) -> Self {
        Self {
            particle: particle.clone(),
            artifacts: config.artifact_set(particle),
            working_dir: config.work_dir(particle),
        }
    }

    pub fn key(&self) -> &str {
        &self.particle.key
    }
}

/// Run-wide inputs shared by every work item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineSettings {
    pub executables_dir: PathBuf,
    pub options_file: PathBuf,
    pub lightmap_dir: PathBuf,
    pub num_events: u64,
    pub execution_mode: ExecutionMode,
}

impl PipelineSettings {
    pub fn from_config(config: &RunConfig) -> Self {
        Self {
            executables_dir: config.executables_dir.clone(),
            options_file: config.options_file.clone(),
            lightmap_dir: config.lightmap_dir.clone(),
            num_events: config.num_events,
            execution_mode: ExecutionMode::Serial,
        }
    }

    pub fn with_num_events(mut self, num_events: u64) -> Self {
        self.num_events = num_events;
        self
    }

    pub fn with_options_file(mut self, options_file: impl Into<PathBuf>) -> Self {
        self.options_file = options_file.into();
        self
    }

    pub fn stage_executable(&self, stage: SimStage) -> PathBuf {
        self.executables_dir.join(stage.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StageFailure {
    #[error("missing input {artifact}: {path}")]
    MissingInput { artifact: String, path: PathBuf },
    #[error("{diagnostic}")]
    Execution {
        exit_code: Option<i32>,
        diagnostic: String,
    },
}

impl StageFailure {
    pub fn to_flux_error(&self, stage: SimStage, particle: &str) -> FluxError {
        match self {
            Self::MissingInput { artifact, path } => FluxError::missing_input(
                "RUN.MISSING_INPUT",
                format!(
                    "{} / {}: missing input {} at '{}'",
                    particle,
                    stage,
                    artifact,
                    path.display()
                ),
            ),
            Self::Execution {
                exit_code,
                diagnostic,
            } => FluxError::stage_execution(
                "RUN.STAGE_FAILED",
                format!(
                    "{} / {} failed ({}): {}",
                    particle,
                    stage,
                    exit_code.map_or_else(
                        || "terminated by signal".to_string(),
                        |code| format!("exit code {}", code)
                    ),
                    diagnostic
                ),
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkItemState {
    Pending(SimStage),
    Completed,
    Failed {
        stage: SimStage,
        failure: StageFailure,
    },
}

impl WorkItemState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItemOutcome {
    pub particle: String,
    pub executed: Vec<SimStage>,
    pub state: WorkItemState,
}

impl WorkItemOutcome {
    pub fn is_completed(&self) -> bool {
        self.state == WorkItemState::Completed
    }

    pub fn error(&self) -> Option<FluxError> {
        match &self.state {
            WorkItemState::Failed { stage, failure } => {
                Some(failure.to_flux_error(*stage, &self.particle))
            }
            _ => None,
        }
    }

    pub fn status_line(&self) -> String {
        match &self.state {
            WorkItemState::Completed => format!("[OK]   {}", self.particle),
            WorkItemState::Failed { stage, failure } => {
                format!("[FAIL] {} at {}: {}", self.particle, stage, failure)
            }
            WorkItemState::Pending(stage) => {
                format!("[PEND] {} at {}", self.particle, stage)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RunReport {
    pub outcomes: Vec<WorkItemOutcome>,
}

impl RunReport {
    pub fn succeeded(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|outcome| outcome.is_completed())
            .count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }

    pub fn all_succeeded(&self) -> bool {
        self.failed() == 0
    }

    pub fn summary_line(&self) -> String {
        format!(
            "{} of {} particle(s) succeeded, {} failed",
            self.succeeded(),
            self.outcomes.len(),
            self.failed()
        )
    }
}

/// Drives work items through a contiguous range of the stage table.
pub struct PipelineOrchestrator<'a> {
    settings: PipelineSettings,
    locator: &'a dyn ArtifactLocator,
    launcher: &'a dyn StageLauncher,
}

impl<'a> PipelineOrchestrator<'a> {
    pub fn new(
        settings: PipelineSettings,
        locator: &'a dyn ArtifactLocator,
        launcher: &'a dyn StageLauncher,
    ) -> Self {
        Self {
            settings,
            locator,
            launcher,
        }
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    fn argument_context(&self, item: &WorkItem) -> ArgumentContext<'_> {
        ArgumentContext {
            pdg_code: item.particle.pdg_code,
            num_events: self.settings.num_events,
            lightmap_dir: &self.settings.lightmap_dir,
        }
    }

    pub fn invocation(&self, item: &WorkItem, stage: SimStage) -> StageInvocation {
        let context = self.argument_context(item);
        let args = stage_descriptor(stage)
            .build_arguments(|slot| item.artifacts.path(slot).to_path_buf(), &context);
        StageInvocation {
            stage,
            executable: self.settings.stage_executable(stage),
            options_file: self.settings.options_file.clone(),
            args,
            working_dir: item.working_dir.clone(),
        }
    }

    fn check_preconditions(&self, item: &WorkItem, stage: SimStage) -> Result<(), StageFailure> {
        let descriptor = stage_descriptor(stage);
        let context = self.argument_context(item);
        for &slot in descriptor.inputs {
            let path = item.artifacts.path(slot);
            if !self.locator.exists(path) {
                return Err(StageFailure::MissingInput {
                    artifact: slot.to_string(),
                    path: path.to_path_buf(),
                });
            }
        }
        for &resource in descriptor.resources {
            let dir = context.resource_dir(resource);
            if !self.locator.has_matching_file(dir, resource.file_pattern()) {
                return Err(StageFailure::MissingInput {
                    artifact: resource.to_string(),
                    path: dir.join(resource.file_pattern()),
                });
            }
        }
        Ok(())
    }

    /// Run-wide inputs every stage reads. Checked once before any work item
    /// starts.
    pub fn check_run_inputs(&self) -> ComputeResult<()> {
        let options_file = &self.settings.options_file;
        if !self.locator.exists(options_file) {
            return Err(FluxError::missing_input(
                "RUN.OPTIONS_FILE",
                format!(
                    "stage options file '{}' does not exist",
                    options_file.display()
                ),
            ));
        }
        Ok(())
    }

    /// Advances a work item by one transition. Terminal states are returned
    /// unchanged.
    pub fn step(
        &self,
        item: &WorkItem,
        range: StageRange,
        state: WorkItemState,
    ) -> WorkItemState {
        let WorkItemState::Pending(stage) = state else {
            return state;
        };

        if let Err(failure) = self.check_preconditions(item, stage) {
            return WorkItemState::Failed { stage, failure };
        }

        let invocation = self.invocation(item, stage);
        info!(particle = item.key(), stage = %stage, "running stage");
        debug!(command = %invocation.command_line(), "stage invocation");

        let status = match self.launcher.launch(&invocation) {
            Ok(status) => status,
            Err(error) => {
                return WorkItemState::Failed {
                    stage,
                    failure: StageFailure::Execution {
                        exit_code: None,
                        diagnostic: error.message().to_string(),
                    },
                };
            }
        };
        if !status.is_success() {
            return WorkItemState::Failed {
                stage,
                failure: StageFailure::Execution {
                    exit_code: status.exit_code,
                    diagnostic: status.diagnostic,
                },
            };
        }

        let output = item.artifacts.path(stage_descriptor(stage).output);
        if !self.locator.exists(output) {
            warn!(
                particle = item.key(),
                stage = %stage,
                output = %output.display(),
                "stage succeeded but its output is missing"
            );
        }

        match stage.next() {
            Some(next) if stage != range.stop() => WorkItemState::Pending(next),
            _ => WorkItemState::Completed,
        }
    }

    pub fn run(&self, item: &WorkItem, range: StageRange) -> WorkItemOutcome {
        let mut executed = Vec::new();
        let mut state = WorkItemState::Pending(range.start());
        while let WorkItemState::Pending(stage) = state {
            state = self.step(item, range, state);
            if !matches!(state, WorkItemState::Failed { .. }) {
                executed.push(stage);
            }
        }

        match &state {
            WorkItemState::Completed => {
                info!(particle = item.key(), stages = executed.len(), "work item completed");
            }
            WorkItemState::Failed { stage, failure } => {
                warn!(particle = item.key(), stage = %stage, %failure, "work item failed");
            }
            WorkItemState::Pending(_) => {}
        }

        WorkItemOutcome {
            particle: item.key().to_string(),
            executed,
            state,
        }
    }

    /// Runs every work item in order; a failure only ends its own item.
    /// A missing run-wide input fails the whole run before any stage launches.
    pub fn run_all(&self, items: &[WorkItem], range: StageRange) -> ComputeResult<RunReport> {
        self.check_run_inputs()?;
        let outcomes = match self.settings.execution_mode {
            ExecutionMode::Serial => items.iter().map(|item| self.run(item, range)).collect(),
        };
        Ok(RunReport { outcomes })
    }
}
