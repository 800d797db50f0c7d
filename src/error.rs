// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Error types for the loader pipeline

use boa_engine::{JsError, JsNativeError};
use std::path::PathBuf;
use thiserror::Error;

/// Result type for loader operations
pub type Result<T> = std::result::Result<T, JitteError>;

/// Errors that can occur while resolving, transforming, or executing a module
#[derive(Debug, Error)]
pub enum JitteError {
    /// No candidate path exists for the requested identifier.
    ///
    /// Carries the identifier as the caller wrote it, never an internal path.
    #[error("Cannot find module '{0}'")]
    ModuleNotFound(String),

    /// The identifier resolved but cannot be loaded
    #[error("Error resolving module '{specifier}': {reason}")]
    Resolution {
        /// Module specifier as requested
        specifier: String,
        /// Reason for failure
        reason: String,
    },

    /// The selected transform strategy rejected the source
    #[error("Transform error in {path}: {message}")]
    Transform {
        /// Resolved path of the offending file
        path: PathBuf,
        /// The compiler's own diagnostic, unmodified
        message: String,
    },

    /// The compiled module body threw during execution
    #[error("Error executing {path}: {message}")]
    Evaluation {
        /// Resolved path of the module that threw
        path: PathBuf,
        /// The engine's error, unmodified
        message: String,
    },

    /// File system error
    #[error("File system error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON module parse error
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),
}

impl JitteError {
    /// Create a module not found error
    pub fn module_not_found(specifier: impl Into<String>) -> Self {
        Self::ModuleNotFound(specifier.into())
    }

    /// Create a transform error for a resolved path
    pub fn transform(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Transform {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create an evaluation error for a resolved path
    pub fn evaluation(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Evaluation {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Convert into a `JsError` so a nested `require()` call re-raises the
    /// failure inside the requiring module, content intact.
    pub fn into_js(self) -> JsError {
        JsNativeError::error().with_message(self.to_string()).into()
    }
}
