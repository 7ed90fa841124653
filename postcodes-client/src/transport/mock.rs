//! Scripted transport for testing without network access.
//!
//! Replays queued response bodies in order and records every request it
//! was asked to execute, so tests can assert on URLs and options.

use std::collections::VecDeque;
use std::time::Duration;

use super::{HttpTransport, TransportError, TransportOptions};

/// A request seen by [`MockTransport::execute`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    pub url: String,
    pub options: TransportOptions,
}

#[derive(Debug, Clone)]
enum Scripted {
    Body(String),
    Failure(String),
}

/// Transport that serves pre-loaded bodies instead of calling the network.
///
/// Every body is reported with HTTP status 200; the API status lives in the
/// envelope. Once the queue is empty, `execute` fails.
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    script: VecDeque<Scripted>,
    requests: Vec<RecordedRequest>,
    url: Option<String>,
    options: TransportOptions,
    status: Option<u16>,
    last_error: Option<String>,
    closed: bool,
}

impl MockTransport {
    /// Create a mock with nothing queued.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock that will answer once with `body`.
    pub fn with_body(body: impl Into<String>) -> Self {
        let mut mock = Self::new();
        mock.push_body(body);
        mock
    }

    /// Queue a response body.
    pub fn push_body(&mut self, body: impl Into<String>) {
        self.script.push_back(Scripted::Body(body.into()));
    }

    /// Queue a transport failure.
    pub fn push_failure(&mut self, message: impl Into<String>) {
        self.script.push_back(Scripted::Failure(message.into()));
    }

    /// Requests executed so far, oldest first.
    pub fn requests(&self) -> &[RecordedRequest] {
        &self.requests
    }

    pub fn last_request(&self) -> Option<&RecordedRequest> {
        self.requests.last()
    }

    /// Number of scripted responses not yet served.
    pub fn remaining(&self) -> usize {
        self.script.len()
    }
}

impl HttpTransport for MockTransport {
    fn set_target_url(&mut self, url: &str) {
        self.url = Some(url.to_string());
        self.closed = false;
    }

    fn options(&self) -> &TransportOptions {
        &self.options
    }

    fn options_mut(&mut self) -> &mut TransportOptions {
        &mut self.options
    }

    async fn execute(&mut self) -> Result<String, TransportError> {
        if self.closed {
            return Err(TransportError::Closed);
        }
        let url = self.url.clone().ok_or(TransportError::MissingUrl)?;

        self.requests.push(RecordedRequest {
            url,
            options: self.options.clone(),
        });
        self.status = None;
        self.last_error = None;

        match self.script.pop_front() {
            Some(Scripted::Body(body)) => {
                self.status = Some(200);
                Ok(body)
            }
            Some(Scripted::Failure(message)) => {
                self.last_error = Some(message.clone());
                Err(TransportError::Failed(message))
            }
            None => {
                let message = "no scripted response left".to_string();
                self.last_error = Some(message.clone());
                Err(TransportError::Failed(message))
            }
        }
    }

    fn status_code(&self) -> Option<u16> {
        self.status
    }

    fn error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    fn elapsed(&self) -> Option<Duration> {
        self.status.map(|_| Duration::ZERO)
    }

    fn close(&mut self) {
        self.url = None;
        self.closed = true;
    }
}
