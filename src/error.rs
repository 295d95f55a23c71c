//! Unified error type for tokn.
//!
//! All public APIs return `Result<T, ToknError>`. The error type provides
//! specific variants for each failure boundary (backend, provider, location)
//! while remaining easy to construct from string messages for
//! application-level validation errors.
//!
//! Provider and location errors carry a machine-readable subkind. The subkind
//! is for user messaging only; the rotation orchestrator treats every
//! provider failure identically (abort before mutation) and only inspects
//! location subkinds to decide whether a rollback is required.

use std::fmt;

/// Subkind of a provider failure, distinguished for user messaging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderErrorKind {
    /// The credential used to authenticate the rotation call was rejected.
    Auth,
    /// The credential lacks the permissions needed to rotate itself
    /// (e.g. no policies to replicate).
    Permission,
    /// The service rate-limited the request.
    RateLimited,
    /// Transient network failure reaching the service.
    Network,
    /// Any other API-level failure.
    Api,
}

impl fmt::Display for ProviderErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderErrorKind::Auth => write!(f, "authentication failed"),
            ProviderErrorKind::Permission => write!(f, "insufficient permissions"),
            ProviderErrorKind::RateLimited => write!(f, "rate limited"),
            ProviderErrorKind::Network => write!(f, "network error"),
            ProviderErrorKind::Api => write!(f, "API error"),
        }
    }
}

/// Subkind of a location failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocationErrorKind {
    /// The target (file, secret entry, variable) does not exist.
    NotFound,
    /// The target exists but could not be accessed.
    PermissionDenied,
    /// The write (or restore) itself failed.
    WriteFailed,
}

impl fmt::Display for LocationErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocationErrorKind::NotFound => write!(f, "not found"),
            LocationErrorKind::PermissionDenied => write!(f, "permission denied"),
            LocationErrorKind::WriteFailed => write!(f, "write failed"),
        }
    }
}

/// The unified error type for all tokn operations.
#[derive(Debug)]
pub enum ToknError {
    /// Filesystem or I/O operation failed.
    Io(std::io::Error),

    /// JSON serialization/deserialization error.
    Json(serde_json::Error),

    /// KDL config file parsing error.
    Config(String),

    /// User input validation failed (malformed descriptor, duplicate name, ...).
    Validation(String),

    /// Auto rotation was requested against a provider that only supports
    /// manual rotation.
    Capability { service: String, message: String },

    /// The metadata backend failed (unreachable store, corrupt payload).
    Backend { backend: String, message: String },

    /// The serialized registry exceeds the remote store's per-entry ceiling.
    BackendPayloadTooLarge { backend: String, size: usize, limit: usize },

    /// An error originating from a rotation provider (Cloudflare, Linode, ...).
    Provider {
        service: String,
        kind: ProviderErrorKind,
        message: String,
    },

    /// An error originating from a location handler.
    Location {
        location: String,
        kind: LocationErrorKind,
        message: String,
    },

    /// A requested token or resource was not found.
    NotFound(String),

    /// Any other error.
    Other(String),
}

impl fmt::Display for ToknError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToknError::Io(e) => write!(f, "{}", e),
            ToknError::Json(e) => write!(f, "JSON error: {}", e),
            ToknError::Config(msg) => write!(f, "config error: {}", msg),
            ToknError::Validation(msg) => write!(f, "{}", msg),
            ToknError::Capability { service, message } => {
                write!(f, "service '{}': {}", service, message)
            }
            ToknError::Backend { backend, message } => {
                write!(f, "backend '{}': {}", backend, message)
            }
            ToknError::BackendPayloadTooLarge {
                backend,
                size,
                limit,
            } => write!(
                f,
                "backend '{}': registry payload is {} bytes, exceeding the {} byte limit",
                backend, size, limit
            ),
            ToknError::Provider {
                service,
                kind,
                message,
            } => write!(f, "provider '{}': {}: {}", service, kind, message),
            ToknError::Location {
                location,
                kind,
                message,
            } => write!(f, "location '{}': {}: {}", location, kind, message),
            ToknError::NotFound(msg) => write!(f, "{}", msg),
            ToknError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for ToknError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ToknError::Io(e) => Some(e),
            ToknError::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ToknError {
    fn from(e: std::io::Error) -> Self {
        ToknError::Io(e)
    }
}

impl From<serde_json::Error> for ToknError {
    fn from(e: serde_json::Error) -> Self {
        ToknError::Json(e)
    }
}

impl From<String> for ToknError {
    fn from(s: String) -> Self {
        ToknError::Other(s)
    }
}

impl From<&str> for ToknError {
    fn from(s: &str) -> Self {
        ToknError::Other(s.to_string())
    }
}

impl ToknError {
    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        ToknError::Validation(message.into())
    }

    /// Create a config error.
    pub fn config(message: impl Into<String>) -> Self {
        ToknError::Config(message.into())
    }

    /// Create a not-found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        ToknError::NotFound(message.into())
    }

    /// Create a capability error for a service that cannot auto-rotate.
    pub fn capability(service: impl Into<String>, message: impl Into<String>) -> Self {
        ToknError::Capability {
            service: service.into(),
            message: message.into(),
        }
    }

    /// Create a backend error.
    pub fn backend(backend: impl Into<String>, message: impl Into<String>) -> Self {
        ToknError::Backend {
            backend: backend.into(),
            message: message.into(),
        }
    }

    /// Create a provider error with an explicit subkind.
    pub fn provider(
        service: impl Into<String>,
        kind: ProviderErrorKind,
        message: impl Into<String>,
    ) -> Self {
        ToknError::Provider {
            service: service.into(),
            kind,
            message: message.into(),
        }
    }

    /// Create a location error with an explicit subkind.
    pub fn location(
        location: impl Into<String>,
        kind: LocationErrorKind,
        message: impl Into<String>,
    ) -> Self {
        ToknError::Location {
            location: location.into(),
            kind,
            message: message.into(),
        }
    }

    /// Classify a reqwest failure into a provider error, translating HTTP
    /// status codes into machine-readable subkinds.
    pub fn from_http(service: impl Into<String>, e: reqwest::Error) -> Self {
        let kind = match e.status() {
            Some(status) if status.as_u16() == 401 => ProviderErrorKind::Auth,
            Some(status) if status.as_u16() == 403 => ProviderErrorKind::Permission,
            Some(status) if status.as_u16() == 429 => ProviderErrorKind::RateLimited,
            Some(_) => ProviderErrorKind::Api,
            None => ProviderErrorKind::Network,
        };
        // reqwest error strings may embed the full request URL but never a
        // response body, so no credential material can leak through here.
        ToknError::Provider {
            service: service.into(),
            kind,
            message: e.to_string(),
        }
    }

    /// Classify an HTTP status from a provider response body check.
    pub fn from_status(service: impl Into<String>, status: u16, message: impl Into<String>) -> Self {
        let kind = match status {
            401 => ProviderErrorKind::Auth,
            403 => ProviderErrorKind::Permission,
            429 => ProviderErrorKind::RateLimited,
            _ => ProviderErrorKind::Api,
        };
        ToknError::Provider {
            service: service.into(),
            kind,
            message: message.into(),
        }
    }
}

/// Convenience type alias for Results using ToknError.
pub type Result<T> = std::result::Result<T, ToknError>;
