use super::pipeline::{StageInvocation, StageStatus};
use crate::domain::ComputeResult;
use std::path::Path;

/// Storage queries the orchestrator makes before running a stage.
pub trait ArtifactLocator {
    fn exists(&self, path: &Path) -> bool;

    /// Whether `dir` exists and holds at least one file whose name matches the
    /// glob `pattern`.
    fn has_matching_file(&self, dir: &Path, pattern: &str) -> bool;
}

/// Runs one external stage executable to completion.
pub trait StageLauncher {
    fn launch(&self, invocation: &StageInvocation) -> ComputeResult<StageStatus>;
}

impl<T> ArtifactLocator for &T
where
    T: ArtifactLocator + ?Sized,
{
    fn exists(&self, path: &Path) -> bool {
        (**self).exists(path)
    }

    fn has_matching_file(&self, dir: &Path, pattern: &str) -> bool {
        (**self).has_matching_file(dir, pattern)
    }
}

impl<T> StageLauncher for &T
where
    T: StageLauncher + ?Sized,
{
    fn launch(&self, invocation: &StageInvocation) -> ComputeResult<StageStatus> {
        (**self).launch(invocation)
    }
}
