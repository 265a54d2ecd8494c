//! Unified application error types for DocHub.
//!
//! Transport failures and backend error responses are mapped into
//! [`AppError`]. For those errors `message` is the verbatim string code
//! (see [`codes`]) so callers can surface it unchanged.

use std::fmt;
use thiserror::Error;

/// String codes emitted by the document backend in `{ "error": ... }`
/// bodies, plus the client-only network code.
pub mod codes {
    /// No response was received.
    pub const NETWORK_ERROR: &str = "network error";

    /// The bearer token is missing or no longer valid.
    pub const UNAUTHORIZED: &str = "unauthorized";
    /// The user lacks rights for the requested resource.
    pub const FORBIDDEN: &str = "forbidden";

    pub const REQUIRED_USER_ID: &str = "required user id";
    pub const REQUIRED_USERNAME: &str = "required username";
    pub const USER_ALREADY_EXISTS: &str = "user already exists";
    pub const REQUIRED_FIRST_NAME: &str = "required first name";
    pub const REQUIRED_LAST_NAME: &str = "required last name";
    pub const REQUIRED_PASSWORD: &str = "required password";
    pub const USER_NOT_FOUND: &str = "user not found";
    pub const INCORRECT_PASSWORD: &str = "incorrect password";

    pub const REQUIRED_FOLDER_ID: &str = "required folder id";
    pub const FOLDER_NOT_FOUND: &str = "folder not found";
    pub const FOLDER_ALREADY_EXISTS: &str = "folder already exists";
    pub const REQUIRED_FOLDER_NAME: &str = "required folder name";
    pub const REQUIRED_LAST_EDITOR_ID: &str = "required last editor id";
    pub const FOLDER_NOT_EMPTY: &str = "cannot delete non-empty folder";
    pub const REQUIRED_PARENT_FOLDER_ID: &str = "required parent folder id";
    pub const INVALID_PARENT_FOLDER_ID: &str = "invalid parent folder id";

    pub const REQUIRED_FILE_ID: &str = "required file id";
    pub const REQUIRED_FILE_NAME: &str = "required file name";
    pub const FILE_NOT_FOUND: &str = "file not found";
    pub const FILE_ALREADY_EXISTS: &str = "file already exists";

    pub const REQUIRED_USER_ROLE_NAME: &str = "required user role name";
    pub const REQUIRED_USER_ROLE_ID: &str = "required user role id";
    pub const USER_ROLE_NOT_FOUND: &str = "user role not found";
    pub const USER_ROLE_ALREADY_EXISTS: &str = "user role already exists";

    pub const INVALID_ACCESS_LEVEL: &str = "invalid access level";
    pub const REQUIRED_ACCESS_LEVEL: &str = "required access level";
    pub const REQUIRED_ACCESS_ROLE_ID: &str = "required access role id";
    pub const ACCESS_ROLE_NOT_FOUND: &str = "access role not found";
    pub const ACCESS_ROLE_ALREADY_EXISTS: &str = "access role already exists";

    /// Client-side: an edit that changes nothing.
    pub const NAME_UNCHANGED: &str = "name unchanged";
    /// Client-side: the baseline root access role cannot be removed.
    pub const ROOT_ACCESS_ROLE_PROTECTED: &str = "cannot remove root access role";
}

/// Top-level error kind categorization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ErrorKind {
    /// No response was received from the backend.
    Network,
    /// Input validation failed, client-side or server-side.
    Validation,
    /// The session is not (or no longer) authenticated.
    Authentication,
    /// The caller lacks rights for the requested resource.
    Authorization,
    /// The referenced entity does not exist.
    NotFound,
    /// A duplicate entity already exists.
    Conflict,
    /// Cached data is internally inconsistent (e.g. a parent cycle).
    Integrity,
    /// Any other error reported by the backend.
    Server,
    /// A serialization/deserialization error occurred.
    Serialization,
    /// A configuration error occurred.
    Configuration,
    /// Local persistence I/O failed.
    Storage,
    /// An internal error occurred.
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Network => write!(f, "NETWORK"),
            Self::Validation => write!(f, "VALIDATION"),
            Self::Authentication => write!(f, "AUTHENTICATION"),
            Self::Authorization => write!(f, "AUTHORIZATION"),
            Self::NotFound => write!(f, "NOT_FOUND"),
            Self::Conflict => write!(f, "CONFLICT"),
            Self::Integrity => write!(f, "INTEGRITY"),
            Self::Server => write!(f, "SERVER"),
            Self::Serialization => write!(f, "SERIALIZATION"),
            Self::Configuration => write!(f, "CONFIGURATION"),
            Self::Storage => write!(f, "STORAGE"),
            Self::Internal => write!(f, "INTERNAL"),
        }
    }
}

/// The unified application error used throughout DocHub.
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct AppError {
    /// The category of error.
    pub kind: ErrorKind,
    /// The backend error code, or a human-readable message for local errors.
    pub message: String,
    /// Optional underlying cause.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create a new application error.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// Create a new application error with an underlying cause.
    pub fn with_source(
        kind: ErrorKind,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a network error. The code is always [`codes::NETWORK_ERROR`].
    pub fn network() -> Self {
        Self::new(ErrorKind::Network, codes::NETWORK_ERROR)
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    /// Create an authentication error.
    pub fn unauthorized() -> Self {
        Self::new(ErrorKind::Authentication, codes::UNAUTHORIZED)
    }

    /// Create an authorization error.
    pub fn forbidden() -> Self {
        Self::new(ErrorKind::Authorization, codes::FORBIDDEN)
    }

    /// Create a not-found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    /// Create a conflict error.
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Conflict, message)
    }

    /// Create a data-integrity error.
    pub fn integrity(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Integrity, message)
    }

    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, message)
    }

    /// Create a storage error.
    pub fn storage(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Storage, message)
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    /// Classify a non-2xx backend response by status and error code.
    pub fn from_server(status: u16, code: impl Into<String>) -> Self {
        let code = code.into();
        let kind = match status {
            401 => ErrorKind::Authentication,
            403 => ErrorKind::Authorization,
            404 => ErrorKind::NotFound,
            _ => classify_code(&code),
        };
        Self::new(kind, code)
    }

    /// The string code surfaced to the UI layer.
    pub fn code(&self) -> &str {
        &self.message
    }

    /// Whether this error means the session itself is no longer valid.
    pub fn invalidates_session(&self) -> bool {
        self.kind == ErrorKind::Authentication
    }
}

fn classify_code(code: &str) -> ErrorKind {
    match code {
        codes::UNAUTHORIZED => ErrorKind::Authentication,
        codes::FORBIDDEN => ErrorKind::Authorization,
        codes::FOLDER_NOT_EMPTY | codes::NAME_UNCHANGED | codes::INCORRECT_PASSWORD => {
            ErrorKind::Validation
        }
        c if c.ends_with("not found") => ErrorKind::NotFound,
        c if c.ends_with("already exists") => ErrorKind::Conflict,
        c if c.starts_with("required ") || c.starts_with("invalid ") => ErrorKind::Validation,
        _ => ErrorKind::Server,
    }
}

impl Clone for AppError {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            message: self.message.clone(),
            source: None,
        }
    }
}

impl PartialEq for AppError {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.message == other.message
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::with_source(
            ErrorKind::Serialization,
            format!("JSON serialization error: {err}"),
            err,
        )
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::with_source(ErrorKind::Storage, format!("I/O error: {err}"), err)
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::with_source(
            ErrorKind::Configuration,
            format!("Configuration error: {err}"),
            err,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_error_is_distinct() {
        let err = AppError::network();
        assert_eq!(err.kind, ErrorKind::Network);
        assert_eq!(err.code(), "network error");
        assert!(!err.invalidates_session());
    }

    #[test]
    fn test_from_server_by_status() {
        assert_eq!(
            AppError::from_server(401, codes::UNAUTHORIZED).kind,
            ErrorKind::Authentication
        );
        assert_eq!(
            AppError::from_server(403, codes::FORBIDDEN).kind,
            ErrorKind::Authorization
        );
    }

    #[test]
    fn test_from_server_by_code() {
        assert_eq!(
            AppError::from_server(400, codes::FOLDER_NOT_FOUND).kind,
            ErrorKind::NotFound
        );
        assert_eq!(
            AppError::from_server(400, codes::FOLDER_ALREADY_EXISTS).kind,
            ErrorKind::Conflict
        );
        assert_eq!(
            AppError::from_server(422, codes::REQUIRED_FOLDER_NAME).kind,
            ErrorKind::Validation
        );
        assert_eq!(
            AppError::from_server(400, codes::FOLDER_NOT_EMPTY).kind,
            ErrorKind::Validation
        );
        assert_eq!(AppError::from_server(500, "boom").kind, ErrorKind::Server);
    }

    #[test]
    fn test_code_is_verbatim() {
        let err = AppError::from_server(400, "user role already exists");
        assert_eq!(err.code(), "user role already exists");
        assert_eq!(err.to_string(), "CONFLICT: user role already exists");
    }

    #[test]
    fn test_only_authentication_invalidates_session() {
        assert!(AppError::unauthorized().invalidates_session());
        assert!(!AppError::forbidden().invalidates_session());
    }
}
