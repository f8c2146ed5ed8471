//! Error taxonomy shared by the ZigZag crates

use thiserror::Error;

/// Result type alias for ZigZag operations
pub type Result<T> = std::result::Result<T, ZigZagError>;

/// Application-level failures
///
/// None of these are retried. Raised outside the upload queue they abort the
/// run; raised while planning a single case they only drop that case.
#[derive(Debug, Error)]
pub enum ZigZagError {
    /// Generic failure that fits no narrower kind
    #[error("{0}")]
    General(String),

    /// Missing or invalid configuration
    #[error("configuration error: {0}")]
    Config(String),

    /// A value mandatory for processing was absent or empty
    #[error("required property missing: {0}")]
    RequiredProperty(String),

    /// The input report could not be parsed or failed validation
    #[error(transparent)]
    Parsing(#[from] ParsingError),
}

/// Discriminator of [`ZigZagError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    General,
    Config,
    RequiredProperty,
    Parsing,
}

impl ZigZagError {
    pub fn general(message: impl Into<String>) -> Self {
        Self::General(message.into())
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    pub fn required_property(message: impl Into<String>) -> Self {
        Self::RequiredProperty(message.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::General(_) => ErrorKind::General,
            Self::Config(_) => ErrorKind::Config,
            Self::RequiredProperty(_) => ErrorKind::RequiredProperty,
            Self::Parsing(_) => ErrorKind::Parsing,
        }
    }
}

/// Malformed or schema-invalid report
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} (element <{element}>, line {line})")]
pub struct ParsingError {
    /// Offending element, or `document` for syntax errors
    pub element: String,
    /// 1-based line of the offending element
    pub line: usize,
    pub message: String,
}

impl ParsingError {
    pub fn new(element: impl Into<String>, line: usize, message: impl Into<String>) -> Self {
        Self {
            element: element.into(),
            line,
            message: message.into(),
        }
    }
}
