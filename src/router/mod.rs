//! Request routing: map an HTTP method and a URL path to a registered handler.
//!
//! [`Router`] keeps one radix [`Node`] tree per HTTP method, created the first time a
//! route is registered for that method. Handlers are opaque to the router: any `H` can
//! be stored, from a boxed async closure to an index into a caller-owned table.
//!
//! | Pattern              | Example match              | Captured params                 |
//! |----------------------|----------------------------|---------------------------------|
//! | `/users`             | `/users`                   | *(none)*                        |
//! | `/users/:id`         | `/users/42`                | `id → "42"`                     |
//! | `/files/*filepath`   | `/files/docs/readme.txt`   | `filepath → "/docs/readme.txt"` |
//!
//! A request can match at most one route; overlapping registrations are rejected with
//! a [`RouteError`] instead of being resolved by registration order.
//!
//! Registration takes `&mut self` and lookups take `&self`: build the router during
//! startup, then share it (e.g. behind an `Arc`) across request tasks. Registering
//! routes after lookups have started requires external locking.

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::http::Method;
use crate::tree::{Lookup, Node, RouteError};

/// Per-method collection of routing trees.
///
/// # Examples
///
/// ```
/// use xrouter::Router;
/// use xrouter::http::Method;
///
/// let mut router = Router::new();
/// router.get("/", "index").unwrap();
/// router.get("/hello/:name", "hello").unwrap();
///
/// let found = router.lookup(&Method::Get, "/hello/gopher");
/// assert_eq!(found.handler, Some(&"hello"));
/// assert_eq!(found.params.by_name("name"), Some("gopher"));
///
/// assert!(router.lookup(&Method::Post, "/").handler.is_none());
/// ```
#[derive(Debug, Clone)]
pub struct Router<H> {
    trees: HashMap<Method, Node<H>>,
    routes: usize,
}

impl<H> Default for Router<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H> Router<H> {
    /// Create a new, empty `Router` with no registered routes.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use xrouter::Router;
    ///
    /// let router: Router<()> = Router::new();
    /// assert!(router.is_empty());
    /// ```
    pub fn new() -> Self {
        Self {
            trees: HashMap::new(),
            routes: 0,
        }
    }

    /// Register `handler` for requests with the given method whose path matches
    /// `pattern`.
    ///
    /// This is the general form behind the verb shortcuts; use it directly for less
    /// common or custom methods.
    ///
    /// # Errors
    ///
    /// - [`RouteError::InvalidPattern`] if `pattern` does not begin with `/` or contains
    ///   a malformed wildcard.
    /// - [`RouteError::DuplicateRoute`] if `pattern` already has a handler for `method`.
    /// - [`RouteError::WildcardConflict`] if a wildcard collides with a route that is
    ///   already registered for `method`.
    ///
    /// A failed registration leaves the router unchanged.
    pub fn handle(
        &mut self,
        method: impl Into<Method>,
        pattern: &str,
        handler: H,
    ) -> Result<(), RouteError> {
        let method = method.into();

        let result = match self.trees.get_mut(&method) {
            Some(root) => root.insert(pattern, handler),
            None => {
                let mut root = Node::new();
                let result = root.insert(pattern, handler);
                if result.is_ok() {
                    self.trees.insert(method.clone(), root);
                }
                result
            }
        };

        match &result {
            Ok(()) => {
                self.routes += 1;
                debug!(method = %method, pattern, "route registered");
            }
            Err(e) => warn!(method = %method, pattern, error = %e, "route rejected"),
        }
        result
    }

    /// Register a handler for `GET` requests matching `pattern`.
    ///
    /// # Errors
    ///
    /// See [`handle`](Self::handle).
    pub fn get(&mut self, pattern: &str, handler: H) -> Result<(), RouteError> {
        self.handle(Method::Get, pattern, handler)
    }

    /// Register a handler for `HEAD` requests matching `pattern`.
    ///
    /// # Errors
    ///
    /// See [`handle`](Self::handle).
    pub fn head(&mut self, pattern: &str, handler: H) -> Result<(), RouteError> {
        self.handle(Method::Head, pattern, handler)
    }

    /// Register a handler for `OPTIONS` requests matching `pattern`.
    ///
    /// # Errors
    ///
    /// See [`handle`](Self::handle).
    pub fn options(&mut self, pattern: &str, handler: H) -> Result<(), RouteError> {
        self.handle(Method::Options, pattern, handler)
    }

    /// Register a handler for `POST` requests matching `pattern`.
    ///
    /// # Errors
    ///
    /// See [`handle`](Self::handle).
    pub fn post(&mut self, pattern: &str, handler: H) -> Result<(), RouteError> {
        self.handle(Method::Post, pattern, handler)
    }

    /// Register a handler for `PUT` requests matching `pattern`.
    ///
    /// # Errors
    ///
    /// See [`handle`](Self::handle).
    pub fn put(&mut self, pattern: &str, handler: H) -> Result<(), RouteError> {
        self.handle(Method::Put, pattern, handler)
    }

    /// Register a handler for `PATCH` requests matching `pattern`.
    ///
    /// # Errors
    ///
    /// See [`handle`](Self::handle).
    pub fn patch(&mut self, pattern: &str, handler: H) -> Result<(), RouteError> {
        self.handle(Method::Patch, pattern, handler)
    }

    /// Register a handler for `DELETE` requests matching `pattern`.
    ///
    /// # Errors
    ///
    /// See [`handle`](Self::handle).
    pub fn delete(&mut self, pattern: &str, handler: H) -> Result<(), RouteError> {
        self.handle(Method::Delete, pattern, handler)
    }

    /// Look up the handler registered for `method` and `path`.
    ///
    /// Returns an empty miss without a trailing slash recommendation when nothing was
    /// ever registered for `method`.
    pub fn lookup(&self, method: &Method, path: &str) -> Lookup<'_, H> {
        match self.trees.get(method) {
            Some(root) => root.lookup(path),
            None => Lookup::miss(false),
        }
    }

    /// Methods other than `method` that have a handler for `path`, sorted by name.
    ///
    /// Used to build the `Allow` header of a `405 Method Not Allowed` response.
    pub fn allowed(&self, path: &str, method: &Method) -> Vec<Method> {
        let mut allowed: Vec<Method> = self
            .trees
            .iter()
            .filter(|(m, root)| *m != method && root.lookup(path).is_match())
            .map(|(m, _)| m.clone())
            .collect();
        allowed.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        allowed
    }

    /// Return the number of routes registered across all methods.
    pub fn len(&self) -> usize {
        self.routes
    }

    /// Return `true` if no routes have been registered.
    pub fn is_empty(&self) -> bool {
        self.routes == 0
    }
}
