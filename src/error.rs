use thiserror::Error;

/// Hullcheck's error types for failures that are not expressible as findings.
///
/// Almost every bad input becomes a [`crate::types::Finding`] inside the
/// responsible checker; these variants cover parser failures the caller may
/// choose to treat as fatal, and genuine contract violations.
#[derive(Debug, Error)]
pub enum HullcheckError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Dockerfile parse failed at line {line}: {message}")]
    InstructionParse { line: usize, message: String },

    #[error("Python source parse failed for {path}: {message}")]
    SyntaxParse { path: String, message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Invalid artifact: {message}")]
    InvalidArtifact { message: String },
}

pub type Result<T> = std::result::Result<T, HullcheckError>;

impl HullcheckError {
    pub fn instruction_parse<S: Into<String>>(line: usize, message: S) -> Self {
        Self::InstructionParse { line, message: message.into() }
    }

    pub fn syntax_parse<S1: Into<String>, S2: Into<String>>(path: S1, message: S2) -> Self {
        Self::SyntaxParse { path: path.into(), message: message.into() }
    }

    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration { message: message.into() }
    }

    pub fn invalid_artifact<S: Into<String>>(message: S) -> Self {
        Self::InvalidArtifact { message: message.into() }
    }

    /// Returns true if the error can be downgraded to a finding and the
    /// overall run continued.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::InstructionParse { .. } | Self::SyntaxParse { .. })
    }
}
