//! Error types for Stacksmith.
//!
//! This module defines the error types used throughout Stacksmith. Every
//! failure during stack construction aborts the whole stack, so errors carry
//! enough context to point at the offending resource or setting.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for Stacksmith operations.
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for Stacksmith.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Resource Graph Errors
    // ========================================================================
    /// A resource with the same logical id was already declared.
    #[error("Resource '{0}' is already declared in this stack")]
    DuplicateResource(String),

    /// A resource references a logical id that does not exist.
    #[error("Resource '{from}' references unknown resource '{to}'")]
    DanglingReference {
        /// Referencing resource
        from: String,
        /// Missing target
        to: String,
    },

    /// A resource references a resource of the wrong kind.
    #[error("Resource '{from}' expects '{to}' to be a {expected}, found {found}")]
    ReferenceKind {
        /// Referencing resource
        from: String,
        /// Referenced resource
        to: String,
        /// Expected kind
        expected: String,
        /// Actual kind
        found: String,
    },

    /// The reference graph contains a cycle.
    #[error("Dependency cycle detected: {0}")]
    DependencyCycle(String),

    /// A descriptor failed local validation.
    #[error("Invalid descriptor for '{resource}': {message}")]
    InvalidDescriptor {
        /// Logical id of the resource
        resource: String,
        /// Error message
        message: String,
    },

    /// Malformed CIDR block.
    #[error("Invalid CIDR block '{value}': {message}")]
    InvalidCidr {
        /// Input value
        value: String,
        /// Error message
        message: String,
    },

    // ========================================================================
    // App Errors
    // ========================================================================
    /// A stack with the same id is already registered.
    #[error("Stack '{0}' is already registered")]
    DuplicateStack(String),

    /// Stack not found.
    #[error("Stack '{0}' not found")]
    StackNotFound(String),

    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid configuration value.
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidConfig {
        /// Configuration key
        key: String,
        /// Error message
        message: String,
    },

    /// Config file could not be parsed.
    #[error("Failed to parse config file '{path}': {message}")]
    ConfigParse {
        /// Path to the config file
        path: PathBuf,
        /// Error message
        message: String,
    },

    // ========================================================================
    // Template Errors
    // ========================================================================
    /// Boot command template failed to render.
    #[error("Template rendering failed for '{template}': {message}")]
    TemplateRender {
        /// Template name
        template: String,
        /// Error message
        message: String,
    },

    // ========================================================================
    // Synthesis Errors
    // ========================================================================
    /// Synthesis failed.
    #[error("Synthesis failed for stack '{stack}': {message}")]
    Synthesis {
        /// Stack id
        stack: String,
        /// Error message
        message: String,
    },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML error.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    // ========================================================================
    // Other Errors
    // ========================================================================
    /// Generic error with source.
    #[error("{message}")]
    Other {
        /// Error message
        message: String,
        /// Source error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl Error {
    /// Creates a new invalid descriptor error.
    pub fn invalid_descriptor(resource: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidDescriptor {
            resource: resource.into(),
            message: message.into(),
        }
    }

    /// Creates a new invalid CIDR error.
    pub fn invalid_cidr(value: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidCidr {
            value: value.into(),
            message: message.into(),
        }
    }

    /// Creates a new invalid config error.
    pub fn invalid_config(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            key: key.into(),
            message: message.into(),
        }
    }

    /// Creates a new synthesis error.
    pub fn synthesis(stack: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Synthesis {
            stack: stack.into(),
            message: message.into(),
        }
    }

    /// Returns true if this error comes from resource graph validation.
    pub fn is_graph_error(&self) -> bool {
        matches!(
            self,
            Error::DuplicateResource(_)
                | Error::DanglingReference { .. }
                | Error::ReferenceKind { .. }
                | Error::DependencyCycle(_)
                | Error::InvalidDescriptor { .. }
        )
    }

    /// Returns the error code for CLI exit status.
    pub fn exit_code(&self) -> i32 {
        match self {
            e if e.is_graph_error() => 2,
            Error::Config(_)
            | Error::InvalidConfig { .. }
            | Error::ConfigParse { .. }
            | Error::InvalidCidr { .. } => 3,
            Error::Synthesis { .. } | Error::Io(_) | Error::Json(_) | Error::Yaml(_) => 4,
            Error::Other {
                source: Some(source),
                ..
            } if source.is::<std::io::Error>() => 4,
            _ => 1,
        }
    }
}

/// Extension trait for adding context to errors.
pub trait ErrorContext<T> {
    /// Adds context to an error.
    fn context(self, message: impl Into<String>) -> Result<T>;

    /// Adds context with a closure that is only evaluated on error.
    fn with_context<F, S>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> S,
        S: Into<String>;
}

impl<T, E> ErrorContext<T> for std::result::Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn context(self, message: impl Into<String>) -> Result<T> {
        self.map_err(|e| Error::Other {
            message: message.into(),
            source: Some(Box::new(e)),
        })
    }

    fn with_context<F, S>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> S,
        S: Into<String>,
    {
        self.map_err(|e| Error::Other {
            message: f().into(),
            source: Some(Box::new(e)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(Error::DuplicateResource("MyVpc".into()).exit_code(), 2);
        assert_eq!(Error::DependencyCycle("a -> b -> a".into()).exit_code(), 2);
        assert_eq!(Error::Config("bad".into()).exit_code(), 3);
        assert_eq!(Error::invalid_cidr("10.0.0.0/33", "prefix").exit_code(), 3);
        assert_eq!(Error::synthesis("IaCKafkaEC2", "boom").exit_code(), 4);
        assert_eq!(Error::StackNotFound("x".into()).exit_code(), 1);
    }

    #[test]
    fn test_error_display() {
        let err = Error::DanglingReference {
            from: "MyInstance".into(),
            to: "MyVpc".into(),
        };
        assert_eq!(
            err.to_string(),
            "Resource 'MyInstance' references unknown resource 'MyVpc'"
        );
    }

    #[test]
    fn test_context() {
        let res: std::result::Result<(), std::io::Error> =
            Err(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
        let err = res.context("reading template").unwrap_err();
        assert_eq!(err.to_string(), "reading template");
        assert!(std::error::Error::source(&err).is_some());
        assert_eq!(err.exit_code(), 4);
    }
}
