//! HTTP transport abstraction.
//!
//! The request pipeline never talks to the network directly. It configures
//! an [`HttpTransport`] through string options, sets the target URL and
//! awaits [`HttpTransport::execute`], which yields the raw response body.
//!
//! Options persist across requests until they are overridden, removed or
//! cleared. The well-known option names are:
//! - `method`: HTTP method, `GET` when unset
//! - `body`: request body, none when unset
//! - `header:<Name>`: a request header

mod http;
mod mock;

use std::collections::BTreeMap;
use std::future::Future;
use std::time::Duration;

pub use http::ReqwestTransport;
pub use mock::{MockTransport, RecordedRequest};

/// Transport configuration, keyed by option name.
pub type TransportOptions = BTreeMap<String, String>;

/// Option holding the HTTP method.
pub const OPTION_METHOD: &str = "method";

/// Option holding the request body.
pub const OPTION_BODY: &str = "body";

/// Prefix for header options.
pub const HEADER_PREFIX: &str = "header:";

/// Option name for the header `name`.
pub fn header_option(name: &str) -> String {
    format!("{HEADER_PREFIX}{name}")
}

/// Errors raised by a transport. The pipeline passes them through untouched.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// HTTP request failed (network error, timeout, etc.)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// `execute` was called before a target URL was set
    #[error("no target URL set")]
    MissingUrl,

    /// The transport was closed
    #[error("transport is closed")]
    Closed,

    /// Any other transport failure
    #[error("transport failed: {0}")]
    Failed(String),
}

/// Executes one HTTP request at a time against a configurable target.
pub trait HttpTransport {
    /// Set the URL for the next request.
    fn set_target_url(&mut self, url: &str);

    /// Current options.
    fn options(&self) -> &TransportOptions;

    /// Mutable access to the options, used by the default option methods.
    fn options_mut(&mut self) -> &mut TransportOptions;

    fn set_option(&mut self, name: &str, value: &str) {
        self.options_mut()
            .insert(name.to_string(), value.to_string());
    }

    fn remove_option(&mut self, name: &str) {
        self.options_mut().remove(name);
    }

    fn clear_options(&mut self) {
        self.options_mut().clear();
    }

    /// Perform the request and return the body, whatever the HTTP status.
    fn execute(&mut self) -> impl Future<Output = Result<String, TransportError>> + Send;

    /// HTTP status of the last completed request.
    fn status_code(&self) -> Option<u16>;

    /// Error message of the last failed request.
    fn error(&self) -> Option<&str>;

    /// Wall-clock time taken by the last request.
    fn elapsed(&self) -> Option<Duration>;

    /// Release resources. `execute` fails until a new target URL is set.
    fn close(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_option_name() {
        assert_eq!(header_option("Accept"), "header:Accept");
    }

    #[test]
    fn default_option_methods() {
        let mut transport = MockTransport::new();
        transport.set_option(OPTION_METHOD, "POST");
        transport.set_option(OPTION_BODY, "{}");
        assert_eq!(transport.options().len(), 2);

        transport.remove_option(OPTION_BODY);
        assert_eq!(
            transport.options().get(OPTION_METHOD).map(String::as_str),
            Some("POST")
        );
        assert!(!transport.options().contains_key(OPTION_BODY));

        transport.clear_options();
        assert!(transport.options().is_empty());
    }

    #[test]
    fn error_display() {
        assert_eq!(TransportError::MissingUrl.to_string(), "no target URL set");
        assert_eq!(
            TransportError::Failed("boom".into()).to_string(),
            "transport failed: boom"
        );
    }
}
