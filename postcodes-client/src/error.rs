//! Client error types.
//!
//! Failures fall into three groups that callers usually treat differently:
//! validation failures (rejected locally, nothing was sent), API failures
//! (the request went out and the API said no) and shape failures (the
//! request succeeded but the payload was not what the operation expects).
//! Transport errors are passed through unchanged.

use crate::postcode::InvalidPostcode;
use crate::response::ResponseError;
use crate::transport::TransportError;

/// Errors from [`crate::PostcodesClient`] and [`crate::RequestPipeline`].
#[derive(Debug, thiserror::Error)]
pub enum PostcodesError {
    /// An argument was rejected before any request was made
    #[error("validation error: {0}")]
    Validation(String),

    /// The payload did not have the expected shape
    #[error("unexpected response shape: {0}")]
    Response(#[from] ResponseError),

    /// The body was not a JSON envelope
    #[error("malformed response: {message}")]
    MalformedResponse {
        message: String,
        body: Option<String>,
    },

    /// The envelope carried a status other than 200
    #[error("API error {status}: {message}")]
    Api { status: i64, message: String },

    /// The transport failed
    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl PostcodesError {
    /// Rejected locally; no network activity happened.
    pub fn is_validation(&self) -> bool {
        matches!(self, PostcodesError::Validation(_))
    }

    /// The API answered with a failure status.
    pub fn is_api(&self) -> bool {
        matches!(self, PostcodesError::Api { .. })
    }

    /// The API answered, but not in the expected shape.
    pub fn is_shape(&self) -> bool {
        matches!(
            self,
            PostcodesError::Response(_) | PostcodesError::MalformedResponse { .. }
        )
    }
}

impl From<InvalidPostcode> for PostcodesError {
    fn from(err: InvalidPostcode) -> Self {
        PostcodesError::Validation(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::postcode::Postcode;
    use crate::response::Key;

    #[test]
    fn error_display() {
        let err = PostcodesError::Api {
            status: 404,
            message: "page not found".into(),
        };
        assert_eq!(err.to_string(), "API error 404: page not found");

        let err = PostcodesError::Validation("limit out of range".into());
        assert_eq!(err.to_string(), "validation error: limit out of range");

        let err = PostcodesError::MalformedResponse {
            message: "expected value at line 1 column 1".into(),
            body: Some("<html>".into()),
        };
        assert!(err.to_string().contains("malformed response"));

        let err: PostcodesError = TransportError::Closed.into();
        assert_eq!(err.to_string(), "transport is closed");
    }

    #[test]
    fn invalid_postcode_is_validation() {
        let err: PostcodesError = Postcode::parse("!5G %tg").unwrap_err().into();
        assert!(err.is_validation());
        assert_eq!(err.to_string(), "validation error: !5G %tg is not a valid postcode");
    }

    #[test]
    fn classification() {
        let shape: PostcodesError = ResponseError::KeyNotFound {
            key: Key::from("result"),
        }
        .into();
        assert!(shape.is_shape());
        assert!(!shape.is_api());

        let api = PostcodesError::Api {
            status: 500,
            message: String::new(),
        };
        assert!(api.is_api());
        assert!(!api.is_validation());
    }
}
