//! Requests as seen by the router: a method, a path, and an optional body.

use bytes::Bytes;

use super::Method;

/// An incoming request, already decoded by the transport in front of the router.
///
/// The request target is split into the routed path and the raw query string; only the
/// path takes part in route matching.
///
/// # Examples
///
/// ```
/// use xrouter::http::{Method, Request};
///
/// let request = Request::new(Method::Get, "/search?q=radix&page=2");
///
/// assert_eq!(request.path(), "/search");
/// assert_eq!(request.query_string(), Some("q=radix&page=2"));
/// assert!(request.body().is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,
    path: String,
    query: Option<String>,
    body: Bytes,
}

impl Request {
    /// Builds a request from a method and a request target (`/path?query`).
    pub fn new(method: Method, target: &str) -> Self {
        let (path, query) = match target.split_once('?') {
            Some((path, query)) => (path.to_owned(), Some(query.to_owned())),
            None => (target.to_owned(), None),
        };
        Self {
            method,
            path,
            query,
            body: Bytes::new(),
        }
    }

    /// Sets the request body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Returns the HTTP method.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the request path (without the query string).
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the raw query string (without the leading `?`), if any.
    pub fn query_string(&self) -> Option<&str> {
        self.query.as_deref()
    }

    /// Returns the request body bytes.
    pub fn body(&self) -> &Bytes {
        &self.body
    }
}
