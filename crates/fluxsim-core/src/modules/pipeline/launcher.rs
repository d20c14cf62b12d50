use crate::common::constants::DIAGNOSTIC_CHAR_LIMIT;
use crate::domain::{ComputeResult, FluxError, SimStage};
use crate::modules::traits::{ArtifactLocator, StageLauncher};
use globset::Glob;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::warn;

/// Fully resolved command line for one stage of one work item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageInvocation {
    pub stage: SimStage,
    pub executable: PathBuf,
    pub options_file: PathBuf,
    pub args: Vec<OsString>,
    pub working_dir: PathBuf,
}

impl StageInvocation {
    pub fn command_line(&self) -> String {
        std::iter::once(self.executable.as_os_str())
            .chain(std::iter::once(self.options_file.as_os_str()))
            .chain(self.args.iter().map(OsString::as_os_str))
            .map(|part| part.to_string_lossy())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Value following `flag` in the argument list, if any.
    pub fn flag_value(&self, flag: &str) -> Option<&Path> {
        self.args
            .windows(2)
            .find(|pair| pair[0] == flag)
            .map(|pair| Path::new(pair[1].as_os_str()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageStatus {
    /// `None` when the process was terminated by a signal.
    pub exit_code: Option<i32>,
    pub diagnostic: String,
}

impl StageStatus {
    pub fn success() -> Self {
        Self {
            exit_code: Some(0),
            diagnostic: String::new(),
        }
    }

    pub fn failure(exit_code: Option<i32>, diagnostic: impl AsRef<str>) -> Self {
        Self {
            exit_code,
            diagnostic: truncate_diagnostic(diagnostic.as_ref()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.exit_code == Some(0)
    }

    pub fn describe_exit(&self) -> String {
        self.exit_code.map_or_else(
            || "terminated by signal".to_string(),
            |code| format!("exit code {}", code),
        )
    }
}

pub fn truncate_diagnostic(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return "(no output)".to_string();
    }
    if trimmed.chars().count() <= DIAGNOSTIC_CHAR_LIMIT {
        return trimmed.to_string();
    }
    let mut truncated: String = trimmed.chars().take(DIAGNOSTIC_CHAR_LIMIT).collect();
    truncated.push_str(" [truncated]");
    truncated
}

/// Launches stage executables as child processes and waits for them.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessLauncher;

impl StageLauncher for ProcessLauncher {
    fn launch(&self, invocation: &StageInvocation) -> ComputeResult<StageStatus> {
        fs::create_dir_all(&invocation.working_dir).map_err(|source| {
            FluxError::io_system(
                "IO.STAGE_WORKDIR",
                format!(
                    "failed to create working directory '{}' for {}: {}",
                    invocation.working_dir.display(),
                    invocation.stage,
                    source
                ),
            )
        })?;

        let output = Command::new(&invocation.executable)
            .arg(&invocation.options_file)
            .args(&invocation.args)
            .current_dir(&invocation.working_dir)
            .stdin(Stdio::null())
            .output()
            .map_err(|source| {
                FluxError::stage_execution(
                    "RUN.STAGE_SPAWN",
                    format!(
                        "failed to execute {} '{}': {}",
                        invocation.stage,
                        invocation.executable.display(),
                        source
                    ),
                )
            })?;

        if output.status.success() {
            return Ok(StageStatus::success());
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        let diagnostic = if stderr.trim().is_empty() {
            String::from_utf8_lossy(&output.stdout)
        } else {
            stderr
        };
        Ok(StageStatus::failure(output.status.code(), diagnostic))
    }
}

/// Answers existence queries from the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsArtifactLocator;

impl ArtifactLocator for FsArtifactLocator {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn has_matching_file(&self, dir: &Path, pattern: &str) -> bool {
        let matcher = match Glob::new(pattern) {
            Ok(glob) => glob.compile_matcher(),
            Err(error) => {
                warn!(pattern, %error, "invalid resource file pattern");
                return false;
            }
        };
        let Ok(entries) = fs::read_dir(dir) else {
            return false;
        };
        entries
            .filter_map(Result::ok)
            .filter(|entry| entry.path().is_file())
            .any(|entry| matcher.is_match(entry.file_name()))
    }
}

#[cfg(test)]
mod tests {
    use super::{FsArtifactLocator, StageInvocation, StageStatus, truncate_diagnostic};
    use crate::common::constants::DIAGNOSTIC_CHAR_LIMIT;
    use crate::domain::SimStage;
    use crate::modules::traits::ArtifactLocator;
    use std::ffi::OsString;
    use std::fs;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    #[test]
    fn diagnostics_are_trimmed_and_truncated() {
        assert_eq!(truncate_diagnostic("  \n"), "(no output)");
        assert_eq!(truncate_diagnostic(" boom \n"), "boom");

        let long = "é".repeat(DIAGNOSTIC_CHAR_LIMIT + 20);
        let truncated = truncate_diagnostic(&long);
        assert!(truncated.ends_with(" [truncated]"));
        assert_eq!(
            truncated.trim_end_matches(" [truncated]").chars().count(),
            DIAGNOSTIC_CHAR_LIMIT
        );
    }

    #[test]
    fn status_describes_exit() {
        assert!(StageStatus::success().is_success());
        let failed = StageStatus::failure(Some(3), "bad input");
        assert!(!failed.is_success());
        assert_eq!(failed.describe_exit(), "exit code 3");
        assert_eq!(
            StageStatus::failure(None, "").describe_exit(),
            "terminated by signal"
        );
    }

    #[test]
    fn invocation_renders_command_line_and_flags() {
        let invocation = StageInvocation {
            stage: SimStage::GramsG4,
            executable: PathBuf::from("/gs/gramsg4"),
            options_file: PathBuf::from("/gs/options.xml"),
            args: ["-i", "/s/a.hepmc3", "-o", "/s/a_g4.root"]
                .into_iter()
                .map(OsString::from)
                .collect(),
            working_dir: PathBuf::from("/s/work"),
        };
        assert_eq!(
            invocation.command_line(),
            "/gs/gramsg4 /gs/options.xml -i /s/a.hepmc3 -o /s/a_g4.root"
        );
        assert_eq!(
            invocation.flag_value("-o"),
            Some(Path::new("/s/a_g4.root"))
        );
        assert_eq!(invocation.flag_value("-m"), None);
    }

    #[test]
    fn filesystem_lookup_matches_resource_globs() {
        let temp = TempDir::new().expect("tempdir should be created");
        let locator = FsArtifactLocator;
        let lightmaps = temp.path().join("lightmaps");

        assert!(!locator.has_matching_file(&lightmaps, "lightmap*.root"));
        fs::create_dir_all(&lightmaps).expect("dir should be created");
        assert!(locator.exists(&lightmaps));
        assert!(!locator.has_matching_file(&lightmaps, "lightmap*.root"));

        fs::write(lightmaps.join("notes.txt"), "x").expect("write");
        assert!(!locator.has_matching_file(&lightmaps, "lightmap*.root"));
        fs::write(lightmaps.join("lightmap_0.root"), "x").expect("write");
        assert!(locator.has_matching_file(&lightmaps, "lightmap*.root"));
        assert!(!locator.has_matching_file(&lightmaps, "[unclosed"));
    }
}
