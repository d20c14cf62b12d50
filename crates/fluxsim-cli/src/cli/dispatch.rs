use super::CliError;
use fluxsim_core::domain::SimStage;
use fluxsim_core::modules::pipeline::StageRange;

/// clap value parser for `--start-from` / `--stop-after`.
pub(super) fn parse_stage_name(value: &str) -> Result<SimStage, String> {
    SimStage::from_name(value).ok_or_else(|| {
        format!(
            "unknown stage '{}'; expected one of: {}",
            value,
            SimStage::names().join(", ")
        )
    })
}

pub(super) fn stage_range(start: SimStage, stop: SimStage) -> Result<StageRange, CliError> {
    StageRange::new(start, stop).map_err(CliError::Compute)
}
