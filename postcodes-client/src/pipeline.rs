//! Request pipeline: build, execute, decode, check.
//!
//! Every API call goes through [`RequestPipeline::request`], which
//! - encodes parameters as a query string (GET) or a JSON body (POST),
//! - executes exactly one request on the transport,
//! - decodes the `{status, result, error}` envelope,
//! - fails unless the envelope status is 200,
//! - wraps the `result` payload in a [`Response`].
//!
//! There is no retry and no caching.

use serde_json::{Map, Value};
use tracing::{debug, trace, warn};
use url::form_urlencoded;

use crate::error::PostcodesError;
use crate::response::Response;
use crate::transport::{HttpTransport, OPTION_BODY, OPTION_METHOD, header_option};

/// Request parameters, in insertion order.
pub type Params = Map<String, Value>;

/// Longest body excerpt kept in a `MalformedResponse` error.
const BODY_EXCERPT_CHARS: usize = 500;

/// HTTP method of a pipeline request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
        }
    }
}

/// The decoded top-level object of every API response.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    pub status: i64,
    pub result: Value,
    pub error: Option<String>,
}

impl Envelope {
    /// Decode a response body.
    ///
    /// `status` may be a JSON integer or a string holding one. A missing
    /// `result` decodes as `null`.
    pub fn decode(body: &str) -> Result<Self, PostcodesError> {
        let value: Value =
            serde_json::from_str(body).map_err(|e| malformed(e.to_string(), body))?;

        let Value::Object(mut members) = value else {
            return Err(malformed("envelope is not a JSON object", body));
        };

        let status = members
            .get("status")
            .and_then(status_code)
            .ok_or_else(|| malformed("envelope has no integer status", body))?;

        let error = match members.remove("error") {
            None | Some(Value::Null) => None,
            Some(Value::String(message)) => Some(message),
            Some(other) => Some(other.to_string()),
        };

        Ok(Self {
            status,
            result: members.remove("result").unwrap_or(Value::Null),
            error,
        })
    }

    /// Check the status and wrap the result.
    pub fn into_response(self) -> Result<Response, PostcodesError> {
        if self.status != 200 {
            return Err(PostcodesError::Api {
                status: self.status,
                message: self.error.unwrap_or_default(),
            });
        }
        Ok(Response::from_payload(self.result))
    }
}

fn status_code(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn malformed(message: impl Into<String>, body: &str) -> PostcodesError {
    PostcodesError::MalformedResponse {
        message: message.into(),
        body: Some(body.chars().take(BODY_EXCERPT_CHARS).collect()),
    }
}

/// Encode parameters as `application/x-www-form-urlencoded`.
///
/// Booleans become `1`/`0` and nulls are dropped. Nested values are
/// flattened as `key[index]` or `key[name]`.
pub fn encode_query(params: &Params) -> String {
    let mut query = form_urlencoded::Serializer::new(String::new());
    for (key, value) in params {
        append_value(&mut query, key, value);
    }
    query.finish()
}

fn append_value(query: &mut form_urlencoded::Serializer<'_, String>, key: &str, value: &Value) {
    match value {
        Value::Null => {}
        Value::Bool(b) => {
            query.append_pair(key, if *b { "1" } else { "0" });
        }
        Value::Number(n) => {
            query.append_pair(key, &n.to_string());
        }
        Value::String(s) => {
            query.append_pair(key, s);
        }
        Value::Array(items) => {
            for (i, item) in items.iter().enumerate() {
                append_value(query, &format!("{key}[{i}]"), item);
            }
        }
        Value::Object(members) => {
            for (name, item) in members {
                append_value(query, &format!("{key}[{name}]"), item);
            }
        }
    }
}

/// Builds requests against the API and enforces the envelope contract.
#[derive(Debug)]
pub struct RequestPipeline<T> {
    transport: T,
    base_url: String,
}

impl<T: HttpTransport> RequestPipeline<T> {
    /// Wrap `transport`, configuring it for JSON requests to `base_url`.
    pub fn new(mut transport: T, base_url: impl Into<String>) -> Self {
        transport.set_option(&header_option("Accept"), "application/json");
        transport.set_option(&header_option("Content-Type"), "application/json");

        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            transport,
            base_url,
        }
    }

    /// Execute one request and return the envelope's `result`.
    ///
    /// `endpoint` is appended to the base URL and must start with `/`.
    pub async fn request(
        &mut self,
        endpoint: &str,
        params: &Params,
        method: Method,
    ) -> Result<Response, PostcodesError> {
        let mut url = format!("{}{}", self.base_url, endpoint);

        match method {
            Method::Get => {
                // Options persist, so clear anything an earlier POST left.
                self.transport.remove_option(OPTION_METHOD);
                self.transport.remove_option(OPTION_BODY);

                let query = encode_query(params);
                if !query.is_empty() {
                    url.push('?');
                    url.push_str(&query);
                }
            }
            Method::Post => {
                let body = Value::Object(params.clone()).to_string();
                self.transport.set_option(OPTION_METHOD, method.as_str());
                self.transport.set_option(OPTION_BODY, &body);
            }
        }

        debug!(method = method.as_str(), %url, "sending request");
        self.transport.set_target_url(&url);
        let body = self.transport.execute().await?;
        trace!(bytes = body.len(), "decoding envelope");

        let envelope = Envelope::decode(&body)?;
        if envelope.status != 200 {
            warn!(
                status = envelope.status,
                error = envelope.error.as_deref().unwrap_or(""),
                %url,
                "API rejected request"
            );
        }
        envelope.into_response()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn into_transport(self) -> T {
        self.transport
    }
}
