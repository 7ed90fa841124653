//! reqwest-backed transport.

use std::time::{Duration, Instant};

use reqwest::Method;
use tracing::{debug, trace};

use super::{
    HEADER_PREFIX, HttpTransport, OPTION_BODY, OPTION_METHOD, TransportError, TransportOptions,
};
use crate::config::ClientConfig;

/// Transport that performs real HTTP requests with `reqwest`.
///
/// Non-2xx statuses are not errors here: postcodes.io reports failures in
/// the JSON envelope, which the pipeline inspects.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    http: reqwest::Client,
    url: Option<String>,
    options: TransportOptions,
    status: Option<u16>,
    last_error: Option<String>,
    elapsed: Option<Duration>,
    closed: bool,
}

impl ReqwestTransport {
    /// Create a transport with the timeout and user agent from `config`.
    pub fn new(config: &ClientConfig) -> Result<Self, TransportError> {
        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            url: None,
            options: TransportOptions::new(),
            status: None,
            last_error: None,
            elapsed: None,
            closed: false,
        })
    }

    fn method(&self) -> Result<Method, TransportError> {
        match self.options.get(OPTION_METHOD) {
            None => Ok(Method::GET),
            Some(name) => Method::from_bytes(name.to_ascii_uppercase().as_bytes())
                .map_err(|_| TransportError::Failed(format!("unsupported method {name}"))),
        }
    }

    fn build_request(&self, url: &str) -> Result<reqwest::RequestBuilder, TransportError> {
        let mut request = self.http.request(self.method()?, url);

        for (name, value) in &self.options {
            if let Some(header) = name.strip_prefix(HEADER_PREFIX) {
                request = request.header(header, value.as_str());
            }
        }

        if let Some(body) = self.options.get(OPTION_BODY) {
            request = request.body(body.clone());
        }

        Ok(request)
    }
}

impl HttpTransport for ReqwestTransport {
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
        let request = self.build_request(&url)?;

        self.status = None;
        self.last_error = None;

        let started = Instant::now();
        let result = async {
            let response = request.send().await?;
            let status = response.status().as_u16();
            let body = response.text().await?;
            Ok::<_, reqwest::Error>((status, body))
        }
        .await;
        let elapsed = started.elapsed();
        self.elapsed = Some(elapsed);

        match result {
            Ok((status, body)) => {
                debug!(%url, status, ?elapsed, "HTTP request completed");
                trace!(bytes = body.len(), "response body received");
                self.status = Some(status);
                Ok(body)
            }
            Err(e) => {
                debug!(%url, error = %e, ?elapsed, "HTTP request failed");
                self.last_error = Some(e.to_string());
                Err(e.into())
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
        self.elapsed
    }

    fn close(&mut self) {
        self.url = None;
        self.closed = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::header_option;

    fn transport() -> ReqwestTransport {
        ReqwestTransport::new(&ClientConfig::default()).unwrap()
    }

    #[test]
    fn transport_creation() {
        let transport = transport();
        assert!(transport.status_code().is_none());
        assert!(transport.error().is_none());
        assert!(transport.elapsed().is_none());
    }

    #[test]
    fn method_defaults_to_get() {
        let mut transport = transport();
        assert_eq!(transport.method().unwrap(), Method::GET);

        transport.set_option(OPTION_METHOD, "post");
        assert_eq!(transport.method().unwrap(), Method::POST);
    }

    #[test]
    fn build_request_applies_options() {
        let mut transport = transport();
        transport.set_option(&header_option("Accept"), "application/json");
        transport.set_option(OPTION_METHOD, "POST");
        transport.set_option(OPTION_BODY, r#"{"postcodes":[]}"#);

        let request = transport
            .build_request("http://localhost:8000/postcodes")
            .unwrap()
            .build()
            .unwrap();

        assert_eq!(request.method(), Method::POST);
        assert_eq!(request.url().as_str(), "http://localhost:8000/postcodes");
        assert_eq!(request.headers()["accept"], "application/json");
        let body = request.body().and_then(|b| b.as_bytes()).unwrap();
        assert_eq!(body, br#"{"postcodes":[]}"#);
    }

    #[tokio::test]
    async fn execute_without_url_fails() {
        let mut transport = transport();
        let err = transport.execute().await.unwrap_err();
        assert!(matches!(err, TransportError::MissingUrl));
    }

    #[tokio::test]
    async fn closed_transport_fails_until_retargeted() {
        let mut transport = transport();
        transport.set_target_url("http://localhost:1/");
        transport.close();
        assert!(matches!(
            transport.execute().await,
            Err(TransportError::Closed)
        ));

        transport.set_target_url("http://localhost:1/");
        assert!(!matches!(
            transport.execute().await,
            Err(TransportError::Closed)
        ));
    }
}
