//! Error types for YAML/JSON conversion and typed decoding.

use std::fmt::Display;

use thiserror::Error;
use yaml_rust2::ScanError;

/// Errors that can occur while converting, encoding or decoding.
#[derive(Error, Debug)]
pub enum Error {
    /// The input was not well-formed YAML. The message comes from the
    /// scanner and carries the line and column.
    #[error("YAML parse error: {0}")]
    Parse(String),

    /// A mapping contained the same key twice once keys were canonicalized
    /// to strings (`true` and `"true"` collide, as do `1` and `"1"`).
    #[error("key {key:?} already defined{}", location(.path))]
    DuplicateKey { key: String, path: String },

    /// Strict decoding met a key that the target type does not declare.
    #[error("unknown field {field:?} in {type_name}{}", location(.path))]
    UnknownField {
        field: String,
        type_name: String,
        path: String,
    },

    /// A node has no representation in the JSON data model
    /// (binary data, non-finite numbers, collections used as keys).
    #[error("conversion error{}: {message}", location(.path))]
    Conversion { message: String, path: String },

    /// The value tree did not fit the target type.
    #[error("{message}{}", location(.path))]
    Bind { message: String, path: String },

    /// Free-form message raised through `serde::de::Error::custom`.
    #[error("{0}")]
    Message(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// The path of the offending node, if the error carries one.
    ///
    /// Paths use dotted keys and bracketed indices (`items[2].name`); the
    /// document root is the empty string.
    pub fn path(&self) -> Option<&str> {
        match self {
            Error::DuplicateKey { path, .. }
            | Error::UnknownField { path, .. }
            | Error::Conversion { path, .. }
            | Error::Bind { path, .. } => Some(path),
            _ => None,
        }
    }
}

impl From<ScanError> for Error {
    fn from(err: ScanError) -> Self {
        Error::Parse(err.to_string())
    }
}

impl serde::de::Error for Error {
    fn custom<T: Display>(msg: T) -> Self {
        Error::Message(msg.to_string())
    }
}

fn location(path: &str) -> String {
    if path.is_empty() {
        String::new()
    } else {
        format!(" at {path}")
    }
}

/// Convenience alias used throughout yamlbridge-core.
pub type Result<T> = std::result::Result<T, Error>;
