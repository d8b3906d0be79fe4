use thiserror::Error;

/// Failures reported by a [`crate::RemoteStore`].
#[derive(Debug, Error)]
pub enum StoreError {
    /// Connection refused, DNS failure, timeout, unreadable body.
    #[error("transport failure: {0}")]
    Transport(String),

    #[error("remote store returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The response arrived but does not have the expected shape
    /// (for example a list endpoint that did not return an array).
    #[error("malformed response: {0}")]
    Malformed(String),

    /// Right shape, but a record in it could not be decoded.
    #[error("undecodable response: {0}")]
    Decode(String),
}

impl StoreError {
    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::Malformed(_))
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Reasons a draft is rejected before any network call is made.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("name is required")]
    MissingName,

    #[error("field '{0}' is required")]
    MissingField(String),

    #[error("price is required")]
    MissingPrice,

    #[error("price '{0}' is not a number")]
    PriceNotNumeric(String),

    #[error("price must be greater than zero, got {0}")]
    PriceNotPositive(f64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("no element is open for editing")]
    NotOpen,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseRefError {
    #[error("element reference is empty")]
    Empty,

    #[error("invalid local id '{0}': expected '#' followed by a number")]
    InvalidLocalId(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_only_for_http_errors() {
        let err = StoreError::Status {
            status: 404,
            body: "missing".into(),
        };
        assert_eq!(err.status(), Some(404));
        assert_eq!(StoreError::Transport("reset".into()).status(), None);
    }

    #[test]
    fn malformed_is_distinguished() {
        assert!(StoreError::Malformed("not an array".into()).is_malformed());
        assert!(!StoreError::Transport("reset".into()).is_malformed());
        assert!(!StoreError::Decode("data: invalid type".into()).is_malformed());
    }

    #[test]
    fn messages_are_readable() {
        assert_eq!(
            ValidationError::MissingField("color".into()).to_string(),
            "field 'color' is required"
        );
        assert_eq!(
            SessionError::NotOpen.to_string(),
            "no element is open for editing"
        );
    }
}
