use thiserror::Error;

/// Why a page (or any backend call) could not be obtained.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// Network failure or a non-success HTTP status.
    #[error(
        "transport error{}: {message}",
        .status.map(|code| format!(" (HTTP {code})")).unwrap_or_default()
    )]
    Transport {
        status: Option<u16>,
        message: String,
    },
    /// The backend rejected the shape of the request.
    #[error("invalid request: {0}")]
    Validation(String),
}

impl FetchError {
    pub fn transport(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::Transport {
            status,
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Transport { status, .. } => *status,
            Self::Validation(_) => None,
        }
    }

    pub fn requires_reauth(&self) -> bool {
        matches!(self.status(), Some(401 | 403))
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(value: reqwest::Error) -> Self {
        let status = value.status().map(|status| status.as_u16());
        let message = if value.is_timeout() {
            "request timed out".to_string()
        } else if value.is_connect() {
            format!("failed to connect: {value}")
        } else if value.is_decode() {
            format!("malformed response body: {value}")
        } else {
            value.to_string()
        };
        Self::Transport { status, message }
    }
}

/// A filter or sort given at the boundary that the resource does not accept.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterError {
    #[error("unknown filter `{0}`")]
    UnknownKey(String),
    #[error("invalid value `{value}` for filter `{key}`: {reason}")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },
    #[error("unknown sort key `{key}` (expected one of: {})", .allowed.join(", "))]
    UnknownSortKey {
        key: String,
        allowed: Vec<&'static str>,
    },
    #[error("expected `key=value`, got `{0}`")]
    MalformedPair(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_display_includes_status_when_known() {
        let err = FetchError::transport(Some(503), "backend unavailable");
        assert_eq!(
            err.to_string(),
            "transport error (HTTP 503): backend unavailable"
        );
        let err = FetchError::transport(None, "connection refused");
        assert_eq!(err.to_string(), "transport error: connection refused");
    }

    #[test]
    fn auth_statuses_require_reauth() {
        assert!(FetchError::transport(Some(401), "expired").requires_reauth());
        assert!(FetchError::transport(Some(403), "forbidden").requires_reauth());
        assert!(!FetchError::transport(Some(500), "boom").requires_reauth());
        assert!(!FetchError::validation("bad limit").requires_reauth());
    }
}
