use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ExodiffResult<T> = Result<T, ExodiffError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExodiffErrorCategory {
    Success,
    Different,
    InputValidationError,
    IoSystemError,
    InternalError,
}

impl ExodiffErrorCategory {
    pub const fn exit_code(self) -> i32 {
        match self {
            Self::Success => 0,
            Self::Different => 1,
            Self::InputValidationError => 2,
            Self::IoSystemError => 3,
            Self::InternalError => 4,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "Success",
            Self::Different => "Different",
            Self::InputValidationError => "InputValidationError",
            Self::IoSystemError => "IoSystemError",
            Self::InternalError => "InternalError",
        }
    }

    /// A difference found in strict mode ends the run with a non-zero exit
    /// code but is a comparison outcome, not a fatal fault.
    pub const fn is_fatal(self) -> bool {
        !matches!(self, Self::Success | Self::Different)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExodiffError {
    category: ExodiffErrorCategory,
    placeholder: &'static str,
    message: String,
}

impl ExodiffError {
    pub fn new(
        category: ExodiffErrorCategory,
        placeholder: &'static str,
        message: impl Into<String>,
    ) -> Self {
        Self {
            category,
            placeholder,
            message: message.into(),
        }
    }

    pub fn different(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(ExodiffErrorCategory::Different, placeholder, message)
    }

    pub fn input_validation(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(
            ExodiffErrorCategory::InputValidationError,
            placeholder,
            message,
        )
    }

    pub fn io_system(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(ExodiffErrorCategory::IoSystemError, placeholder, message)
    }

    pub fn internal(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(ExodiffErrorCategory::InternalError, placeholder, message)
    }

    pub const fn category(&self) -> ExodiffErrorCategory {
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

    pub fn fatal_exit_line(&self) -> Option<String> {
        self.category
            .is_fatal()
            .then(|| format!("FATAL EXIT CODE: {}", self.exit_code()))
    }
}

impl Display for ExodiffError {
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

impl Error for ExodiffError {}
