use std::error::Error;
use std::fmt::{Display, Formatter};

pub type FluxResult<T> = Result<T, FluxError>;
pub type ComputeResult<T> = FluxResult<T>;
pub type ParserResult<T> = FluxResult<T>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FluxErrorCategory {
    InputValidationError,
    IoSystemError,
    DataInsufficient,
    NotFound,
    MissingInput,
    StageExecutionError,
    InternalError,
}

impl FluxErrorCategory {
    pub const fn exit_code(self) -> i32 {
        match self {
            Self::InputValidationError => 2,
            Self::IoSystemError => 3,
            Self::DataInsufficient => 4,
            Self::NotFound => 5,
            Self::MissingInput => 6,
            Self::StageExecutionError => 7,
            Self::InternalError => 8,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InputValidationError => "InputValidationError",
            Self::IoSystemError => "IoSystemError",
            Self::DataInsufficient => "DataInsufficient",
            Self::NotFound => "NotFound",
            Self::MissingInput => "MissingInput",
            Self::StageExecutionError => "StageExecutionError",
            Self::InternalError => "InternalError",
        }
    }

    /// Failures that only abort the current work item; the orchestrator moves
    /// on to the next one.
    pub const fn is_work_item_scoped(self) -> bool {
        matches!(self, Self::MissingInput | Self::StageExecutionError)
    }
}

impl Display for FluxErrorCategory {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str((*self).as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FluxError {
    category: FluxErrorCategory,
    placeholder: &'static str,
    message: String,
}

impl FluxError {
    pub fn new(
        category: FluxErrorCategory,
        placeholder: &'static str,
        message: impl Into<String>,
    ) -> Self {
        Self {
            category,
            placeholder,
            message: message.into(),
        }
    }

    pub fn input_validation(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(
            FluxErrorCategory::InputValidationError,
            placeholder,
            message,
        )
    }

    pub fn io_system(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(FluxErrorCategory::IoSystemError, placeholder, message)
    }

    pub fn data_insufficient(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(FluxErrorCategory::DataInsufficient, placeholder, message)
    }

    pub fn not_found(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(FluxErrorCategory::NotFound, placeholder, message)
    }

    pub fn missing_input(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(FluxErrorCategory::MissingInput, placeholder, message)
    }

    pub fn stage_execution(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(FluxErrorCategory::StageExecutionError, placeholder, message)
    }

    pub fn internal(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(FluxErrorCategory::InternalError, placeholder, message)
    }

    pub const fn category(&self) -> FluxErrorCategory {
        self.category
    }

    pub const fn placeholder(&self) -> &'static str {
        self.placeholder
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn exit_code(&self) -> i32 {
        self.category.exit_code()
    }

    pub fn diagnostic_line(&self) -> String {
        format!("ERROR: [{}] {}", self.placeholder, self.message)
    }

    pub fn fatal_exit_line(&self) -> String {
        format!("FATAL EXIT CODE: {}", self.exit_code())
    }
}

impl Display for FluxError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} [{}] {}",
            self.category.as_str(),
            self.placeholder,
            self.message
        )
    }
}

impl Error for FluxError {}
