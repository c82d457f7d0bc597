//! Error types for optimo.

use std::fmt;

/// Optimo error types.
///
/// User-facing rejections (busy coordinator, empty prompt, missing
/// entitlement) are not errors; they are returned as
/// [`Rejection`](crate::Rejection) values. This type covers configuration,
/// parsing and transport failures.
#[derive(Debug)]
pub enum OptimoError {
    /// HTTP request failed.
    Http(reqwest::Error),
    /// JSON serialization/deserialization error.
    Json(serde_json::Error),
    /// Missing required field in a provider response.
    MissingField(&'static str),
    /// Feature not configured.
    NotConfigured(&'static str),
    /// Configuration failed validation.
    InvalidConfig(String),
    /// HTML snapshot import failed.
    Html(String),
    /// The channel to the optimization service closed before a reply arrived.
    Disconnected,
    /// Timeout reported by the transport.
    Timeout,
}

impl OptimoError {
    /// Whether this error happened while delivering the request rather than
    /// being reported by the service itself.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Http(_) | Self::Disconnected | Self::Timeout)
    }
}

impl fmt::Display for OptimoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Http(e) => write!(f, "HTTP error: {}", e),
            Self::Json(e) => write!(f, "JSON error: {}", e),
            Self::MissingField(field) => write!(f, "Missing field: {}", field),
            Self::NotConfigured(what) => write!(f, "Not configured: {}", what),
            Self::InvalidConfig(msg) => write!(f, "Invalid configuration: {}", msg),
            Self::Html(msg) => write!(f, "HTML error: {}", msg),
            Self::Disconnected => write!(f, "Optimization service disconnected"),
            Self::Timeout => write!(f, "Request timed out"),
        }
    }
}

impl std::error::Error for OptimoError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Http(e) => Some(e),
            Self::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for OptimoError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else {
            Self::Http(e)
        }
    }
}

impl From<serde_json::Error> for OptimoError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e)
    }
}

/// Result type for optimo operations.
pub type OptimoResult<T> = Result<T, OptimoError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_variants() {
        let err = OptimoError::MissingField("choices[0].message.content");
        assert_eq!(
            format!("{}", err),
            "Missing field: choices[0].message.content"
        );

        let err = OptimoError::NotConfigured("api_key");
        assert_eq!(format!("{}", err), "Not configured: api_key");

        let err = OptimoError::InvalidConfig("model name is required".into());
        assert_eq!(
            format!("{}", err),
            "Invalid configuration: model name is required"
        );

        assert_eq!(
            format!("{}", OptimoError::Disconnected),
            "Optimization service disconnected"
        );
        assert_eq!(format!("{}", OptimoError::Timeout), "Request timed out");
    }

    #[test]
    fn test_transport_classification() {
        assert!(OptimoError::Disconnected.is_transport());
        assert!(OptimoError::Timeout.is_transport());
        assert!(!OptimoError::InvalidConfig("bad".into()).is_transport());
        assert!(!OptimoError::MissingField("x").is_transport());
    }

    #[test]
    fn test_from_serde_json_error() {
        use std::error::Error;

        let json_err = serde_json::from_str::<serde_json::Value>("invalid").unwrap_err();
        let err: OptimoError = json_err.into();
        assert!(format!("{}", err).starts_with("JSON error:"));
        assert!(err.source().is_some());
        assert!(!err.is_transport());
    }
}
