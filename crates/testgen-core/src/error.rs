//! Error handling for the testgen library.
//!
//! This module defines the main error type `Error` used throughout the library,
//! along with a convenient `Result` type alias. It uses `thiserror` for easy
//! error handling and implements conversions from common error types.
//!
//! Two variants are raised by the descriptor engine itself:
//!
//! - [`Error::Config`]: the description uses a parameter location, security scheme
//!   kind or apiKey placement that the engine does not know, or the run
//!   configuration references something that cannot exist (a dependency on a later
//!   step, for example).
//! - [`Error::MissingResponse`]: a sequence step targets an operation without a
//!   `200` response.
//!
//! Both abort the path or sequence being built; nothing is retried.
//!
//! # Examples
//!
//! ```
//! use testgen_core::error::{Error, Result};
//!
//! fn check_location(tag: &str) -> Result<()> {
//!     if tag != "query" {
//!         return Err(Error::config(format!("unknown parameter location '{tag}'")));
//!     }
//!     Ok(())
//! }
//!
//! assert!(check_location("cookie").is_err());
//! ```

use thiserror::Error;

/// Result type for testgen operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for testgen operations
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON parsing error
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    /// The description is missing something generation needs
    #[error("OpenAPI error: {0}")]
    OpenApi(String),

    /// Unrecognized location, scheme kind or placement, or an invalid run configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// A sequence step targets an operation that declares no `200` response
    #[error("Missing response: {method} {path} declares no 200 response")]
    MissingResponse { path: String, method: String },

    /// Template error
    #[error("Template error: {0}")]
    Template(String),

    /// Template engine error
    #[error("Template engine error: {0}")]
    Tera(#[from] tera::Error),
}

impl Error {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new OpenAPI error
    pub fn openapi<S: Into<String>>(msg: S) -> Self {
        Self::OpenApi(msg.into())
    }

    /// Create a new template error
    pub fn template<S: Into<String>>(msg: S) -> Self {
        Self::Template(msg.into())
    }

    /// Create a missing `200` response error for a sequence step
    pub fn missing_response(path: impl Into<String>, method: impl Into<String>) -> Self {
        Self::MissingResponse {
            path: path.into(),
            method: method.into(),
        }
    }

    /// Whether this error is one of the fatal configuration errors
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}
