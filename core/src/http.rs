//! HTTP types and the transport seam.
//!
//! # Design
//! `HttpRequest` and `HttpResponse` describe HTTP traffic as plain data. The
//! core never opens a socket: every round-trip goes through a caller-supplied
//! [`Transport`]. This keeps the library deterministic and easy to test — unit
//! tests script responses, integration tests plug in a real HTTP agent.

use std::fmt;

/// HTTP method for a request. The ATOL web service only uses GET and POST.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

/// An HTTP request described as plain data.
///
/// Built by `AtolClient::build_*` methods and executed by a [`Transport`].
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

/// An HTTP response described as plain data.
///
/// Produced by a [`Transport`], then passed to `AtolClient::parse_*` methods
/// for status checking and deserialization.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

/// Failure while executing an [`HttpRequest`]: timeout, refused connection,
/// DNS failure. Distinct from a non-2xx response, which is still a response.
#[derive(Debug, Clone)]
pub struct TransportError(pub String);

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "transport error: {}", self.0)
    }
}

impl std::error::Error for TransportError {}

/// Synchronous HTTP executor supplied by the caller.
///
/// The fiscal register's web service is single-threaded, so a blocking
/// one-request-at-a-time model is all the protocol needs.
pub trait Transport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError>;
}
