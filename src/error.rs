use std::fmt;

/// Failure reported by a language model or one of its sessions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    /// The model refused the input (language or content it cannot handle).
    UnsupportedInput(String),
    /// The session handle is no longer usable and must be rebuilt.
    InvalidSession(String),
    /// Transport-level failure (DNS, connection, timeout).
    Network(String),
    /// The backend answered with a non-success status.
    Api { status: u16, body: String },
    /// The backend answered but the payload could not be read.
    Parse(String),
}

impl ModelError {
    pub fn is_unsupported_input(&self) -> bool {
        matches!(self, ModelError::UnsupportedInput(_))
    }

    pub fn is_invalid_session(&self) -> bool {
        matches!(self, ModelError::InvalidSession(_))
    }
}

impl fmt::Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelError::UnsupportedInput(msg) => write!(f, "unsupported input: {msg}"),
            ModelError::InvalidSession(msg) => write!(f, "invalid session: {msg}"),
            ModelError::Network(msg) => write!(f, "network error: {msg}"),
            ModelError::Api { status, body } => write!(f, "api error {status}: {body}"),
            ModelError::Parse(msg) => write!(f, "parse error: {msg}"),
        }
    }
}

impl std::error::Error for ModelError {}

impl From<reqwest::Error> for ModelError {
    fn from(value: reqwest::Error) -> Self {
        if value.is_decode() {
            ModelError::Parse(value.to_string())
        } else {
            ModelError::Network(value.to_string())
        }
    }
}

/// Outcome of a lookup step that did not produce text.
///
/// Cancellation is carried here so it can short-circuit `?` chains, but
/// callers must treat it as a superseded request rather than a failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    Cancelled,
    Model(ModelError),
}

impl LookupError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, LookupError::Cancelled)
    }
}

impl fmt::Display for LookupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LookupError::Cancelled => write!(f, "request cancelled"),
            LookupError::Model(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for LookupError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LookupError::Cancelled => None,
            LookupError::Model(err) => Some(err),
        }
    }
}

impl From<ModelError> for LookupError {
    fn from(value: ModelError) -> Self {
        LookupError::Model(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_api() {
        let err = ModelError::Api {
            status: 429,
            body: "slow down".into(),
        };
        assert_eq!(err.to_string(), "api error 429: slow down");
    }

    #[test]
    fn classification_helpers() {
        assert!(ModelError::UnsupportedInput("fr".into()).is_unsupported_input());
        assert!(!ModelError::Network("reset".into()).is_unsupported_input());
        assert!(ModelError::InvalidSession("destroyed".into()).is_invalid_session());
    }

    #[test]
    fn lookup_error_wraps_model_error() {
        let err: LookupError = ModelError::Network("timeout".into()).into();
        assert!(!err.is_cancelled());
        assert_eq!(err.to_string(), "network error: timeout");
        assert_eq!(LookupError::Cancelled.to_string(), "request cancelled");
    }
}
