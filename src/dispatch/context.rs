//! Per-request context handed to matched handlers.

use crate::http::Request;
use crate::params::Params;

/// The request together with the parameters captured by the matched route.
///
/// # Examples
///
/// ```
/// use xrouter::dispatch::Context;
/// use xrouter::http::{Method, Request};
/// use xrouter::params::{Param, Params};
///
/// let params: Params = [Param::new("id", "42")].into_iter().collect();
/// let ctx = Context::new(Request::new(Method::Get, "/users/42"), params);
///
/// assert_eq!(ctx.param("id"), Some("42"));
/// assert_eq!(ctx.param("name"), None);
/// ```
#[derive(Debug, Clone)]
pub struct Context {
    request: Request,
    params: Params,
}

impl Context {
    pub fn new(request: Request, params: Params) -> Self {
        Self { request, params }
    }

    pub fn request(&self) -> &Request {
        &self.request
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Value of the first captured parameter called `name`.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.by_name(name)
    }

    /// Deserializes the request body as JSON.
    pub fn json<T>(&self) -> Result<T, serde_json::Error>
    where
        T: serde::de::DeserializeOwned,
    {
        serde_json::from_slice(self.request.body())
    }

    /// Splits the context back into its request and parameters.
    pub fn into_parts(self) -> (Request, Params) {
        (self.request, self.params)
    }
}
