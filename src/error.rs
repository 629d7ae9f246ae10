//! Error types for schema loading and route derivation.

use std::path::PathBuf;
use thiserror::Error;

use crate::schema::Schema;
use crate::types::JsonType;

/// Errors while loading a schema document.
#[derive(Debug, Error)]
pub enum LoadError {
    // IO errors (exit code 3)
    #[error("file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("cannot read {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[cfg(feature = "remote")]
    #[error("failed to fetch {url}: {source}")]
    NetworkError {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    // Parse errors (exit code 2)
    #[error("invalid JSON: {source}")]
    InvalidJson {
        #[source]
        source: serde_json::Error,
    },
}

impl LoadError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            LoadError::FileNotFound { .. } | LoadError::ReadError { .. } => 3,
            #[cfg(feature = "remote")]
            LoadError::NetworkError { .. } => 3,
            LoadError::InvalidJson { .. } => 2,
        }
    }
}

/// Errors while deriving routes and types from a schema.
///
/// Any of these aborts the whole parse; no partial route list is produced.
#[derive(Debug, Error)]
pub enum ParseError {
    /// Structural problem in the document: wrong root type, array without
    /// `items`, unknown `type`, duplicate link `rel` on one resource.
    #[error("{message}")]
    InvalidSchema { schema: Box<Schema>, message: String },

    /// A `$ref` or path-variable pointer that cannot be located.
    #[error("invalid $ref {reference:?}: {message}")]
    InvalidRef { reference: String, message: String },

    /// One type name bound to structurally different definitions.
    #[error("type {name} defined multiple times")]
    TypeRedefinition {
        name: String,
        first: Box<JsonType>,
        redefinitions: Vec<JsonType>,
    },

    /// Unbalanced braces or a bad escape in a link `href`.
    #[error("malformed href {href:?}: {message}")]
    MalformedTemplate { href: String, message: String },

    /// A `$ref` that leads back to itself.
    #[error("cyclic $ref {reference:?}")]
    CyclicReference { reference: String },
}

impl ParseError {
    pub(crate) fn invalid_schema(schema: &Schema, message: impl Into<String>) -> Self {
        ParseError::InvalidSchema {
            schema: Box::new(schema.clone()),
            message: message.into(),
        }
    }

    pub(crate) fn invalid_ref(reference: &str, message: impl Into<String>) -> Self {
        ParseError::InvalidRef {
            reference: reference.to_string(),
            message: message.into(),
        }
    }

    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        2
    }
}
