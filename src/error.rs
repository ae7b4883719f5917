//! Error types for groqchat.
//!
//! Every failure is attributed to the stage that produced it (storage,
//! inference, export, input or configuration) so that frontends can report
//! which part of a turn went wrong and carry on with the next prompt.

use std::error;
use std::fmt;
use std::io;
use std::sync::Arc;

/// The stage of a chat turn that produced an error.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Stage {
    /// The conversation log.
    Storage,
    /// The model endpoint or the stream coming back from it.
    Inference,
    /// Markdown or document export.
    Export,
    /// Invalid user input or command arguments.
    Input,
    /// Process configuration (environment, command line).
    Configuration,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Storage => write!(f, "storage"),
            Stage::Inference => write!(f, "inference"),
            Stage::Export => write!(f, "export"),
            Stage::Input => write!(f, "input"),
            Stage::Configuration => write!(f, "configuration"),
        }
    }
}

/// The main error type for groqchat.
#[derive(Clone, Debug)]
pub enum Error {
    /// The conversation log could not be read or written.
    Storage {
        /// Human-readable error message.
        message: String,
        /// True when the store was not ready yet (busy, locked, unreachable).
        transient: bool,
        /// Underlying cause.
        source: Option<Arc<dyn error::Error + Send + Sync>>,
    },

    /// The transport to the model failed, possibly after part of the reply arrived.
    InferenceTransport {
        /// Human-readable error message.
        message: String,
        /// Text delivered before the failure, if any.
        partial: Option<String>,
        /// Underlying cause.
        source: Option<Arc<dyn error::Error + Send + Sync>>,
    },

    /// The endpoint answered with an error status.
    Api {
        /// HTTP status code.
        status_code: u16,
        /// Error type string from the API.
        error_type: Option<String>,
        /// Human-readable error message.
        message: String,
    },

    /// The API key was missing or rejected.
    Authentication {
        /// Human-readable error message.
        message: String,
    },

    /// The endpoint is rate limiting this key.
    RateLimit {
        /// Human-readable error message.
        message: String,
        /// Time to wait before retrying, in seconds.
        retry_after: Option<u64>,
    },

    /// The request to the endpoint timed out.
    Timeout {
        /// Human-readable error message.
        message: String,
        /// Duration of the timeout in seconds.
        duration: Option<f64>,
    },

    /// A conversation could not be exported.
    Export {
        /// Human-readable error message.
        message: String,
        /// Underlying cause.
        source: Option<Arc<dyn error::Error + Send + Sync>>,
    },

    /// Error during JSON serialization or deserialization.
    Serialization {
        /// Human-readable error message.
        message: String,
        /// The underlying error.
        source: Option<Arc<dyn error::Error + Send + Sync>>,
    },

    /// I/O error outside the database and export paths.
    Io {
        /// Stage whose file or process access failed.
        stage: Stage,
        /// Human-readable error message.
        message: String,
        /// The underlying error.
        source: Arc<io::Error>,
    },

    /// Invalid input supplied by the caller.
    Validation {
        /// Human-readable error message.
        message: String,
        /// Parameter that failed validation.
        param: Option<String>,
    },

    /// The process configuration is unusable.
    Configuration {
        /// Human-readable error message.
        message: String,
    },
}

impl Error {
    /// Creates a new storage error from a database failure.
    pub fn storage(message: impl Into<String>, source: sqlx::Error) -> Self {
        let transient = is_transient_sqlx(&source);
        Error::Storage {
            message: message.into(),
            transient,
            source: Some(Arc::new(source)),
        }
    }

    /// Creates a new storage error that has no underlying database error.
    pub fn storage_message(message: impl Into<String>) -> Self {
        Error::Storage {
            message: message.into(),
            transient: false,
            source: None,
        }
    }

    /// Creates a new inference transport error.
    pub fn inference_transport(
        message: impl Into<String>,
        source: Option<Box<dyn error::Error + Send + Sync>>,
    ) -> Self {
        Error::InferenceTransport {
            message: message.into(),
            partial: None,
            source: source.map(Arc::from),
        }
    }

    /// Creates a new API error.
    pub fn api(status_code: u16, error_type: Option<String>, message: impl Into<String>) -> Self {
        Error::Api {
            status_code,
            error_type,
            message: message.into(),
        }
    }

    /// Creates a new authentication error.
    pub fn authentication(message: impl Into<String>) -> Self {
        Error::Authentication {
            message: message.into(),
        }
    }

    /// Creates a new rate limit error.
    pub fn rate_limit(message: impl Into<String>, retry_after: Option<u64>) -> Self {
        Error::RateLimit {
            message: message.into(),
            retry_after,
        }
    }

    /// Creates a new timeout error.
    pub fn timeout(message: impl Into<String>, duration: Option<f64>) -> Self {
        Error::Timeout {
            message: message.into(),
            duration,
        }
    }

    /// Creates a new export error.
    pub fn export(
        message: impl Into<String>,
        source: Option<Box<dyn error::Error + Send + Sync>>,
    ) -> Self {
        Error::Export {
            message: message.into(),
            source: source.map(Arc::from),
        }
    }

    /// Creates a new serialization error.
    pub fn serialization(
        message: impl Into<String>,
        source: Option<Box<dyn error::Error + Send + Sync>>,
    ) -> Self {
        Error::Serialization {
            message: message.into(),
            source: source.map(Arc::from),
        }
    }

    /// Creates a new I/O error attributed to `stage`.
    pub fn io(stage: Stage, message: impl Into<String>, source: io::Error) -> Self {
        Error::Io {
            stage,
            message: message.into(),
            source: Arc::new(source),
        }
    }

    /// Creates a new validation error.
    pub fn validation(message: impl Into<String>, param: Option<String>) -> Self {
        Error::Validation {
            message: message.into(),
            param,
        }
    }

    /// Creates a new configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Error::Configuration {
            message: message.into(),
        }
    }

    /// Returns the stage of the turn that produced this error.
    pub fn stage(&self) -> Stage {
        match self {
            Error::Storage { .. } => Stage::Storage,
            Error::InferenceTransport { .. }
            | Error::Api { .. }
            | Error::Authentication { .. }
            | Error::RateLimit { .. }
            | Error::Timeout { .. }
            | Error::Serialization { .. } => Stage::Inference,
            Error::Export { .. } => Stage::Export,
            Error::Io { stage, .. } => *stage,
            Error::Validation { .. } => Stage::Input,
            Error::Configuration { .. } => Stage::Configuration,
        }
    }

    /// Attaches text that was already delivered to the caller.
    ///
    /// Inference-stage errors become [`Error::InferenceTransport`] carrying the
    /// partial text; errors from other stages are returned unchanged.
    pub fn with_partial(self, partial: impl Into<String>) -> Self {
        let partial = partial.into();
        match self {
            Error::InferenceTransport {
                message, source, ..
            } => Error::InferenceTransport {
                message,
                partial: Some(partial),
                source,
            },
            err if err.stage() == Stage::Inference => Error::InferenceTransport {
                message: err.to_string(),
                partial: Some(partial),
                source: Some(Arc::new(err)),
            },
            err => err,
        }
    }

    /// Returns the text delivered before an inference failure, if any.
    pub fn partial_text(&self) -> Option<&str> {
        match self {
            Error::InferenceTransport { partial, .. } => partial.as_deref(),
            _ => None,
        }
    }

    /// Returns true if the store was not ready yet and the operation may succeed on retry.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Error::Storage {
                transient: true,
                ..
            }
        )
    }

    /// Returns true if this error is a storage error.
    pub fn is_storage(&self) -> bool {
        matches!(self, Error::Storage { .. })
    }

    /// Returns true if this error is an export error.
    pub fn is_export(&self) -> bool {
        matches!(self, Error::Export { .. })
    }

    /// Returns true if this error is a validation error.
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation { .. })
    }

    /// Returns true if this error is a timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Timeout { .. })
    }

    /// Returns true if this error is related to authentication.
    pub fn is_authentication(&self) -> bool {
        matches!(self, Error::Authentication { .. })
    }

    /// Returns the status code associated with this error, if any.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Error::Api { status_code, .. } => Some(*status_code),
            _ => None,
        }
    }
}

fn is_transient_sqlx(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::PoolTimedOut | sqlx::Error::Io(_) => true,
        // SQLITE_BUSY and SQLITE_LOCKED
        sqlx::Error::Database(db) => matches!(db.code().as_deref(), Some("5") | Some("6")),
        _ => false,
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Storage { message, .. } => {
                write!(f, "Storage error: {message}")
            }
            Error::InferenceTransport {
                message, partial, ..
            } => match partial {
                Some(partial) if !partial.is_empty() => write!(
                    f,
                    "Inference transport error: {message} ({} characters received before the failure)",
                    partial.chars().count()
                ),
                _ => write!(f, "Inference transport error: {message}"),
            },
            Error::Api {
                status_code,
                error_type,
                message,
            } => {
                if let Some(error_type) = error_type {
                    write!(f, "{error_type} ({status_code}): {message}")
                } else {
                    write!(f, "API error ({status_code}): {message}")
                }
            }
            Error::Authentication { message } => {
                write!(f, "Authentication error: {message}")
            }
            Error::RateLimit {
                message,
                retry_after,
            } => {
                if let Some(retry_after) = retry_after {
                    write!(
                        f,
                        "Rate limit exceeded: {message} (retry after {retry_after} seconds)"
                    )
                } else {
                    write!(f, "Rate limit exceeded: {message}")
                }
            }
            Error::Timeout { message, duration } => {
                if let Some(duration) = duration {
                    write!(f, "Timeout error: {message} ({duration} seconds)")
                } else {
                    write!(f, "Timeout error: {message}")
                }
            }
            Error::Export { message, .. } => {
                write!(f, "Export error: {message}")
            }
            Error::Serialization { message, .. } => {
                write!(f, "Serialization error: {message}")
            }
            Error::Io { message, .. } => {
                write!(f, "I/O error: {message}")
            }
            Error::Validation { message, param } => {
                if let Some(param) = param {
                    write!(f, "Validation error: {message} (parameter: {param})")
                } else {
                    write!(f, "Validation error: {message}")
                }
            }
            Error::Configuration { message } => {
                write!(f, "Configuration error: {message}")
            }
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Error::Storage { source, .. }
            | Error::InferenceTransport { source, .. }
            | Error::Export { source, .. }
            | Error::Serialization { source, .. } => source
                .as_ref()
                .map(|e| e.as_ref() as &(dyn error::Error + 'static)),
            Error::Io { source, .. } => Some(source.as_ref() as &(dyn error::Error + 'static)),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::serialization(format!("JSON error: {err}"), Some(Box::new(err)))
    }
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        Error::storage(format!("database error: {err}"), err)
    }
}

/// A specialized Result type for groqchat operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stages() {
        assert_eq!(Error::storage_message("x").stage(), Stage::Storage);
        assert_eq!(Error::timeout("x", None).stage(), Stage::Inference);
        assert_eq!(Error::api(500, None, "x").stage(), Stage::Inference);
        assert_eq!(Error::export("x", None).stage(), Stage::Export);
        assert_eq!(Error::validation("x", None).stage(), Stage::Input);
        assert_eq!(Error::configuration("x").stage(), Stage::Configuration);
        assert_eq!(Stage::Inference.to_string(), "inference");
    }

    #[test]
    fn io_errors_keep_the_stage_of_their_caller() {
        let missing = || io::Error::new(io::ErrorKind::NotFound, "gone");
        let err = Error::io(Stage::Storage, "cannot open log directory", missing());
        assert_eq!(err.stage(), Stage::Storage);
        assert!(error::Error::source(&err).is_some());
        assert_eq!(
            Error::io(Stage::Configuration, "cannot read prompt file", missing()).stage(),
            Stage::Configuration
        );
    }

    #[test]
    fn with_partial_keeps_transport_message() {
        let err = Error::inference_transport("connection reset", None).with_partial("Hello, wor");
        assert_eq!(err.partial_text(), Some("Hello, wor"));
        assert!(err.to_string().contains("connection reset"));
        assert!(err.to_string().contains("10 characters"));
    }

    #[test]
    fn with_partial_wraps_other_inference_errors() {
        let err = Error::timeout("read timed out", Some(60.0)).with_partial("abc");
        assert!(matches!(err, Error::InferenceTransport { .. }));
        assert_eq!(err.partial_text(), Some("abc"));
        assert!(error::Error::source(&err).is_some());
    }

    #[test]
    fn with_partial_ignores_other_stages() {
        let err = Error::storage_message("disk full").with_partial("abc");
        assert!(err.is_storage());
        assert_eq!(err.partial_text(), None);
    }

    #[test]
    fn pool_timeouts_are_transient() {
        assert!(Error::storage("not ready", sqlx::Error::PoolTimedOut).is_transient());
        assert!(!Error::storage("bad row", sqlx::Error::RowNotFound).is_transient());
        assert!(!Error::storage_message("x").is_transient());
    }
}
