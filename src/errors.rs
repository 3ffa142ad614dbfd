//! Copyright © 2025-2026 Wenze Wei. All Rights Reserved.
//!
//! This file is part of Mnema.
//! The Mnema project belongs to the Dunimd Team.
//!
//! Licensed under the Apache License, Version 2.0 (the "License");
//! You may not use this file except in compliance with the License.
//! You may obtain a copy of the License at
//!
//!     http://www.apache.org/licenses/LICENSE-2.0
//!
//! Unless required by applicable law or agreed to in writing, software
//! distributed under the License is distributed on an "AS IS" BASIS,
//! WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
//! See the License for the specific language governing permissions and
//! limitations under the License.

//! # Mnema Error Module
//!
//! This module defines the error types used throughout Mnema.
//!
//! ## Error Taxonomy
//!
//! - A path that addresses nothing is **not** an error. Resolution returns
//!   `None` and filters and transforms degrade that to `false` / `null`.
//! - **InvalidExpression**: a filter or transform expression with an unknown
//!   tag, the wrong number of operands, or an operand of the wrong shape.
//!   This is a caller bug and is reported immediately.
//! - **Function**: failures raised by caller-supplied custom functions. The
//!   engines never wrap or recover these; they reach the caller unchanged.
//! - **Io** / **Serde**: failures of the reader and writer adapters. They
//!   travel through the record stream as `Err` items.
//!
//! ## Usage
//!
//! ```rust
//! use mnema::errors::{Result, MnError};
//!
//! fn arity(tag: &str, operands: usize) -> Result<()> {
//!     if operands != 2 {
//!         return Err(MnError::invalid_expression(format!(
//!             "'{tag}' expects 2 operands, got {operands}"
//!         )));
//!     }
//!     Ok(())
//! }
//! ```

use std::io;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Convenience result type used throughout Mnema.
pub type Result<T> = std::result::Result<T, MnError>;

/// Canonical error enumeration for Mnema.
#[derive(Debug, Error, Serialize, Deserialize)]
pub enum MnError {
    /// Errors originating from filesystem IO.
    #[error("io error: {0}")]
    Io(String),

    /// Wrapper for JSON / YAML / CSV (de)serialization issues.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Malformed filter or transform expression.
    #[error("invalid expression: {message}")]
    InvalidExpression { message: String },

    /// A path that cannot be parsed or cannot be written to.
    #[error("path error: {message}")]
    Path { message: String },

    /// Failure raised inside a caller-supplied custom function.
    #[error("function '{name}' failed: {message}")]
    Function { name: String, message: String },

    /// Validation errors triggered by invalid configuration or inputs.
    #[error("validation error: {message}")]
    Validation { message: String },

    /// Failures that occur while assembling or running a pipeline.
    #[error("pipeline error at stage '{stage}': {message}")]
    Pipeline { stage: String, message: String },

    /// Catch-all variant for unexpected situations.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<io::Error> for MnError {
    fn from(err: io::Error) -> Self {
        MnError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for MnError {
    fn from(err: serde_json::Error) -> Self {
        MnError::Serde(err.to_string())
    }
}

impl From<serde_yaml::Error> for MnError {
    fn from(err: serde_yaml::Error) -> Self {
        MnError::Serde(err.to_string())
    }
}

#[cfg(feature = "csv")]
impl From<csv::Error> for MnError {
    fn from(err: csv::Error) -> Self {
        MnError::Serde(format!("csv: {err}"))
    }
}

impl MnError {
    /// Helper to construct malformed-expression errors.
    pub fn invalid_expression<T: Into<String>>(message: T) -> Self {
        MnError::InvalidExpression {
            message: message.into(),
        }
    }

    /// Helper to construct path errors.
    pub fn path<T: Into<String>>(message: T) -> Self {
        MnError::Path {
            message: message.into(),
        }
    }

    /// Helper to construct custom-function errors.
    pub fn function(name: impl Into<String>, message: impl Into<String>) -> Self {
        MnError::Function {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Helper to construct simple validation errors.
    pub fn validation<T: Into<String>>(message: T) -> Self {
        MnError::Validation {
            message: message.into(),
        }
    }

    /// Helper to construct pipeline errors.
    pub fn pipeline(stage: impl Into<String>, message: impl Into<String>) -> Self {
        MnError::Pipeline {
            stage: stage.into(),
            message: message.into(),
        }
    }

    /// Helper to construct internal errors.
    pub fn internal<T: Into<String>>(message: T) -> Self {
        MnError::Internal(message.into())
    }

    /// Prefixes the message with the pipeline stage it came from.
    ///
    /// The variant is kept, so a malformed expression inside a pipeline step
    /// is still an [`MnError::InvalidExpression`]. Custom-function errors and
    /// errors that already name a stage are returned unchanged.
    pub fn at_stage(self, stage: &str) -> Self {
        let prefixed = |message: String| format!("{stage}: {message}");
        match self {
            MnError::Io(message) => MnError::Io(prefixed(message)),
            MnError::Serde(message) => MnError::Serde(prefixed(message)),
            MnError::InvalidExpression { message } => MnError::InvalidExpression {
                message: prefixed(message),
            },
            MnError::Path { message } => MnError::Path {
                message: prefixed(message),
            },
            MnError::Validation { message } => MnError::Validation {
                message: prefixed(message),
            },
            MnError::Internal(message) => MnError::Internal(prefixed(message)),
            unchanged @ (MnError::Function { .. } | MnError::Pipeline { .. }) => unchanged,
        }
    }
}
