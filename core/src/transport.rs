//! Collaborators that perform I/O on behalf of the executor.
//!
//! # Design
//! Device HTTP stacks expose `begin`/`GET`/`getString`/`end` plus a link
//! status query. Here the request primitives fold into a single
//! `Transport::execute`, whose scope is the connection lifetime, and the link
//! status becomes `Connectivity`. Both are traits so tests and firmware can
//! substitute their own.

use std::fmt;

use crate::http::{HttpRequest, HttpResponse};

/// Failure to obtain any HTTP response.
///
/// `code` follows the convention of embedded HTTP clients: zero or negative,
/// e.g. -1 for "connection refused".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportError {
    pub code: i32,
    pub message: String,
}

impl TransportError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "transport error {}: {}", self.code, self.message)
    }
}

impl std::error::Error for TransportError {}

/// Executes one HTTP exchange, blocking until it completes or fails.
pub trait Transport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        (**self).execute(request)
    }
}

/// Reports whether the network link is currently up.
pub trait Connectivity {
    fn is_connected(&self) -> bool;
}

impl<F: Fn() -> bool> Connectivity for F {
    fn is_connected(&self) -> bool {
        self()
    }
}

/// For hosts without a link-state query.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysConnected;

impl Connectivity for AlwaysConnected {
    fn is_connected(&self) -> bool {
        true
    }
}

#[cfg(feature = "ureq")]
pub use self::ureq_transport::UreqTransport;

#[cfg(feature = "ureq")]
mod ureq_transport {
    use super::{Transport, TransportError};
    use crate::http::{HttpMethod, HttpRequest, HttpResponse};

    /// Blocking transport over `ureq`.
    ///
    /// 4xx/5xx responses are returned as data so the collection parsers can
    /// interpret them.
    #[derive(Clone)]
    pub struct UreqTransport {
        agent: ureq::Agent,
    }

    impl Default for UreqTransport {
        fn default() -> Self {
            Self::new()
        }
    }

    impl UreqTransport {
        pub fn new() -> Self {
            let agent = ureq::Agent::config_builder()
                .http_status_as_error(false)
                .build()
                .new_agent();
            Self { agent }
        }

        /// Use a caller-configured agent. It should be built with
        /// `http_status_as_error(false)`.
        pub fn with_agent(agent: ureq::Agent) -> Self {
            Self { agent }
        }
    }

    impl Transport for UreqTransport {
        fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
            let result = match (request.method, request.body.as_deref()) {
                (HttpMethod::Get, _) => {
                    let mut builder = self.agent.get(&request.path);
                    for (key, value) in &request.headers {
                        builder = builder.header(key.as_str(), value.as_str());
                    }
                    builder.call()
                }
                (HttpMethod::Post, body) => {
                    let mut builder = self.agent.post(&request.path);
                    for (key, value) in &request.headers {
                        builder = builder.header(key.as_str(), value.as_str());
                    }
                    match body {
                        Some(body) => builder.send(body.as_bytes()),
                        None => builder.send_empty(),
                    }
                }
            };
            let mut response = result.map_err(|e| TransportError::new(-1, e.to_string()))?;

            let status = response.status().as_u16();
            let headers = response
                .headers()
                .iter()
                .filter_map(|(name, value)| {
                    value
                        .to_str()
                        .ok()
                        .map(|v| (name.as_str().to_string(), v.to_string()))
                })
                .collect();
            let body = response
                .body_mut()
                .read_to_string()
                .map_err(|e| TransportError::new(-11, e.to_string()))?;

            Ok(HttpResponse { status, headers, body })
        }
    }
}
