use std::fmt;

/// Result type for lanechase operations
pub type Result<T> = std::result::Result<T, LaneChaseError>;

/// Main error type for the lanechase crate
#[derive(Debug, Clone, PartialEq)]
pub enum LaneChaseError {
    /// Invalid dimensions for operations
    DimensionMismatch {
        expected: String,
        actual: String,
    },

    /// Invalid parameter value
    InvalidParameter {
        name: String,
        reason: String,
    },

    /// Action index outside the environment's action space (strict mode only)
    InvalidAction {
        action: usize,
        max_actions: usize,
    },

    /// Empty buffer or container
    EmptyBuffer(String),

    /// Numerical computation errors
    NumericalError(String),

    /// IO errors (checkpoint and config files)
    IoError(String),

    /// Serialization/deserialization errors
    SerializationError(String),

    /// Malformed configuration file
    ConfigError(String),
}

impl fmt::Display for LaneChaseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LaneChaseError::DimensionMismatch { expected, actual } => {
                write!(f, "Dimension mismatch: expected {}, got {}", expected, actual)
            }
            LaneChaseError::InvalidParameter { name, reason } => {
                write!(f, "Invalid parameter '{}': {}", name, reason)
            }
            LaneChaseError::InvalidAction { action, max_actions } => {
                write!(f, "Invalid action {}: must be less than {}", action, max_actions)
            }
            LaneChaseError::EmptyBuffer(msg) => write!(f, "Empty buffer: {}", msg),
            LaneChaseError::NumericalError(msg) => write!(f, "Numerical error: {}", msg),
            LaneChaseError::IoError(msg) => write!(f, "IO error: {}", msg),
            LaneChaseError::SerializationError(msg) => write!(f, "Serialization error: {}", msg),
            LaneChaseError::ConfigError(msg) => write!(f, "Config error: {}", msg),
        }
    }
}

impl std::error::Error for LaneChaseError {}

impl From<std::io::Error> for LaneChaseError {
    fn from(err: std::io::Error) -> Self {
        LaneChaseError::IoError(err.to_string())
    }
}

impl From<bincode::Error> for LaneChaseError {
    fn from(err: bincode::Error) -> Self {
        LaneChaseError::SerializationError(err.to_string())
    }
}

impl From<serde_json::Error> for LaneChaseError {
    fn from(err: serde_json::Error) -> Self {
        LaneChaseError::ConfigError(err.to_string())
    }
}

impl LaneChaseError {
    pub fn dimension_mismatch<S: Into<String>>(expected: S, actual: S) -> Self {
        LaneChaseError::DimensionMismatch {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    pub fn invalid_parameter<S: Into<String>>(name: S, reason: S) -> Self {
        LaneChaseError::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }
}
