//! Structured error types shared across the TFIM toolkit crates.

use std::collections::BTreeMap;
use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structured payload attached to every [`TfimError`] variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Stable machine readable error code.
    pub code: String,
    /// Human readable diagnostic message.
    pub message: String,
    /// Contextual key value pairs (parameter names, limits, observed values).
    #[serde(default)]
    pub context: BTreeMap<String, String>,
    /// Optional hint that may help the caller resolve the issue.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl ErrorInfo {
    /// Creates a new error payload with the provided code and message.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            context: BTreeMap::new(),
            hint: None,
        }
    }

    /// Adds a context entry to the payload.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    /// Sets a human readable hint for remediation.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

/// Canonical error type for the toolkit.
///
/// Reaching no convergence is not an error: it is reported through the
/// `converged` flag of a trace. Only rejected input and failing engines end
/// up here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(tag = "family", content = "detail")]
pub enum TfimError {
    /// Input rejected before any solver call was issued.
    #[error("validation error: {0}")]
    Validation(ErrorInfo),
    /// The numerical engine failed to produce a usable result.
    #[error("solver error: {0}")]
    Solver(ErrorInfo),
    /// Configuration could not be loaded or is inconsistent.
    #[error("config error: {0}")]
    Config(ErrorInfo),
    /// Filesystem or process I/O failed.
    #[error("io error: {0}")]
    Io(ErrorInfo),
    /// Serialization and schema errors.
    #[error("serde error: {0}")]
    Serde(ErrorInfo),
}

impl Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code: {})", self.message, self.code)?;
        if !self.context.is_empty() {
            write!(f, " | context: [")?;
            for (idx, (key, value)) in self.context.iter().enumerate() {
                if idx > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{key}={value}")?;
            }
            write!(f, "]")?;
        }
        if let Some(hint) = &self.hint {
            write!(f, " | hint: {hint}")?;
        }
        Ok(())
    }
}

impl TfimError {
    /// Shorthand for a [`TfimError::Validation`] with the given code and message.
    pub fn validation(code: impl Into<String>, message: impl Into<String>) -> Self {
        TfimError::Validation(ErrorInfo::new(code, message))
    }

    /// Shorthand for a [`TfimError::Solver`] with the given code and message.
    pub fn solver(code: impl Into<String>, message: impl Into<String>) -> Self {
        TfimError::Solver(ErrorInfo::new(code, message))
    }

    /// Returns a reference to the payload describing the error.
    pub fn info(&self) -> &ErrorInfo {
        match self {
            TfimError::Validation(info)
            | TfimError::Solver(info)
            | TfimError::Config(info)
            | TfimError::Io(info)
            | TfimError::Serde(info) => info,
        }
    }

    /// Stable family label matching the serialized `family` tag.
    pub fn family(&self) -> &'static str {
        match self {
            TfimError::Validation(_) => "Validation",
            TfimError::Solver(_) => "Solver",
            TfimError::Config(_) => "Config",
            TfimError::Io(_) => "Io",
            TfimError::Serde(_) => "Serde",
        }
    }

    /// True when the error was raised before any solver call.
    pub fn is_validation(&self) -> bool {
        matches!(self, TfimError::Validation(_))
    }
}
