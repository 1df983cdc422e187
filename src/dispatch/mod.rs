//! Request dispatch on top of the [`Router`]: async handlers, trailing slash redirects,
//! and the `404`/`405` fallbacks.
//!
//! [`decide`] holds the policy and works with any handler type; [`App`] wires it to
//! boxed async handlers and turns each [`Decision`] into a [`Response`].
//!
//! | Lookup result                               | Response                                  |
//! |---------------------------------------------|-------------------------------------------|
//! | handler found                               | whatever the handler returns              |
//! | miss, trailing slash variant is registered  | `301` (`GET`/`HEAD`) or `308` + `Location`|
//! | miss, path registered for other methods     | `405` + `Allow`                           |
//! | anything else                               | `404`                                     |

mod context;

pub use context::Context;

use std::fmt;
use std::pin::Pin;
use std::sync::Arc;

use tracing::debug;

use crate::config::RouterConfig;
use crate::http::{Method, Request, Response, StatusCode};
use crate::params::Params;
use crate::router::Router;
use crate::tree::RouteError;

/// Type-erased, heap-allocated async handler that processes a [`Context`] and returns a
/// [`Response`].
///
/// Handlers are stored behind `Arc<dyn Fn(…)>` so they can be cloned and shared across
/// threads without copying the underlying closure. In practice you never construct this
/// type directly; use [`App::get`], [`App::post`], and the other method-specific helpers
/// instead.
pub type Handler =
    Arc<dyn Fn(Context) -> Pin<Box<dyn Future<Output = Response> + Send>> + Send + Sync + 'static>;

/// Conversion trait for async handler functions.
///
/// Any `Fn(Context) -> impl Future<Output = Response> + Send` that is also
/// `Send + Sync + 'static` implements this trait automatically via the blanket impl
/// below.
pub trait IntoHandler: Send + Sync + 'static {
    /// Call the handler with the given context, boxing the returned future.
    fn call(&self, ctx: Context) -> Pin<Box<dyn Future<Output = Response> + Send>>;
}

impl<T, F> IntoHandler for T
where
    T: Fn(Context) -> F + Send + Sync + 'static,
    F: Future<Output = Response> + Send + 'static,
{
    fn call(&self, ctx: Context) -> Pin<Box<dyn Future<Output = Response> + Send>> {
        Box::pin((self)(ctx))
    }
}

/// What to do with a request, before any handler runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision<'a, H> {
    /// A route matched; call `handler` with the captured `params`.
    Matched { handler: &'a H, params: Params },

    /// Only the trailing slash variant of the path is registered.
    Redirect { status: StatusCode, location: String },

    /// The path is registered, but not for this method. `allow` is sorted by name.
    MethodNotAllowed { allow: Vec<Method> },

    NotFound,
}

/// Resolve `method` and `path` against `router` under the policy in `config`.
///
/// Redirects use `301 Moved Permanently` for `GET` and `HEAD` and
/// `308 Permanent Redirect` for every other method, so clients keep the method and body.
/// `CONNECT` requests are never redirected.
///
/// # Examples
///
/// ```
/// use xrouter::Router;
/// use xrouter::config::RouterConfig;
/// use xrouter::dispatch::{Decision, decide};
/// use xrouter::http::{Method, StatusCode};
///
/// let mut router = Router::new();
/// router.get("/users/", "users").unwrap();
///
/// let decision = decide(&router, &RouterConfig::default(), &Method::Get, "/users");
/// assert_eq!(
///     decision,
///     Decision::Redirect {
///         status: StatusCode::MovedPermanently,
///         location: "/users/".to_owned(),
///     }
/// );
/// ```
pub fn decide<'a, H>(
    router: &'a Router<H>,
    config: &RouterConfig,
    method: &Method,
    path: &str,
) -> Decision<'a, H> {
    let found = router.lookup(method, path);
    if let Some(handler) = found.handler {
        return Decision::Matched {
            handler,
            params: found.params,
        };
    }

    if found.tsr && config.redirect_trailing_slash && *method != Method::Connect {
        let status = if matches!(method, Method::Get | Method::Head) {
            StatusCode::MovedPermanently
        } else {
            StatusCode::PermanentRedirect
        };
        return Decision::Redirect {
            status,
            location: toggle_trailing_slash(path),
        };
    }

    if config.handle_method_not_allowed {
        let allow = router.allowed(path, method);
        if !allow.is_empty() {
            return Decision::MethodNotAllowed { allow };
        }
    }

    Decision::NotFound
}

fn toggle_trailing_slash(path: &str) -> String {
    match path.strip_suffix('/') {
        Some(trimmed) if !trimmed.is_empty() => trimmed.to_owned(),
        _ => format!("{path}/"),
    }
}

/// A [`Router`] of async handlers plus the dispatch policy.
///
/// # Examples
///
/// ```
/// use xrouter::dispatch::{App, Context};
/// use xrouter::http::{Method, Request, Response, StatusCode};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let mut app = App::new();
/// app.get("/hello/:name", |ctx: Context| async move {
///     let name = ctx.param("name").unwrap_or("world").to_owned();
///     Response::new(StatusCode::Ok).body(format!("hello, {name}!"))
/// })
/// .unwrap();
///
/// let response = app.call(Request::new(Method::Get, "/hello/gopher")).await;
/// assert_eq!(&response.body_bytes()[..], b"hello, gopher!");
/// # }
/// ```
#[derive(Default)]
pub struct App {
    router: Router<Handler>,
    config: RouterConfig,
}

impl fmt::Debug for App {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("App")
            .field("routes", &self.router.len())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl App {
    /// Create an `App` with no routes and the default [`RouterConfig`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an `App` with no routes and the given dispatch policy.
    pub fn with_config(config: RouterConfig) -> Self {
        Self {
            router: Router::new(),
            config,
        }
    }

    /// Return the dispatch policy in use.
    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    /// Return the underlying router, e.g. to inspect registered routes.
    pub fn router(&self) -> &Router<Handler> {
        &self.router
    }

    /// Register `handler` for `method` and `pattern`.
    ///
    /// # Errors
    ///
    /// See [`Router::handle`].
    pub fn handle(
        &mut self,
        method: impl Into<Method>,
        pattern: &str,
        handler: impl IntoHandler,
    ) -> Result<(), RouteError> {
        // Erase the concrete handler type and store it as a `Handler` trait object.
        let handler: Handler = Arc::new(move |ctx| handler.call(ctx));
        self.router.handle(method, pattern, handler)
    }

    /// Register an async handler for `GET` requests matching `pattern`.
    pub fn get(&mut self, pattern: &str, handler: impl IntoHandler) -> Result<(), RouteError> {
        self.handle(Method::Get, pattern, handler)
    }

    /// Register an async handler for `HEAD` requests matching `pattern`.
    pub fn head(&mut self, pattern: &str, handler: impl IntoHandler) -> Result<(), RouteError> {
        self.handle(Method::Head, pattern, handler)
    }

    /// Register an async handler for `OPTIONS` requests matching `pattern`.
    pub fn options(&mut self, pattern: &str, handler: impl IntoHandler) -> Result<(), RouteError> {
        self.handle(Method::Options, pattern, handler)
    }

    /// Register an async handler for `POST` requests matching `pattern`.
    pub fn post(&mut self, pattern: &str, handler: impl IntoHandler) -> Result<(), RouteError> {
        self.handle(Method::Post, pattern, handler)
    }

    /// Register an async handler for `PUT` requests matching `pattern`.
    pub fn put(&mut self, pattern: &str, handler: impl IntoHandler) -> Result<(), RouteError> {
        self.handle(Method::Put, pattern, handler)
    }

    /// Register an async handler for `PATCH` requests matching `pattern`.
    pub fn patch(&mut self, pattern: &str, handler: impl IntoHandler) -> Result<(), RouteError> {
        self.handle(Method::Patch, pattern, handler)
    }

    /// Register an async handler for `DELETE` requests matching `pattern`.
    pub fn delete(&mut self, pattern: &str, handler: impl IntoHandler) -> Result<(), RouteError> {
        self.handle(Method::Delete, pattern, handler)
    }

    /// Dispatch `request` and produce its response.
    ///
    /// Redirects keep the query string of the original request.
    pub async fn call(&self, request: Request) -> Response {
        let decision = decide(&self.router, &self.config, request.method(), request.path());

        match decision {
            Decision::Matched { handler, params } => {
                debug!(method = %request.method(), path = request.path(), "route matched");
                let handler = Arc::clone(handler);
                handler(Context::new(request, params)).await
            }
            Decision::Redirect { status, location } => {
                debug!(method = %request.method(), path = request.path(), %location, "trailing slash redirect");
                let location = match request.query_string() {
                    Some(query) => format!("{location}?{query}"),
                    None => location,
                };
                Response::redirect(status, location)
            }
            Decision::MethodNotAllowed { allow } => {
                debug!(method = %request.method(), path = request.path(), "method not allowed");
                let allow = allow
                    .iter()
                    .map(Method::as_str)
                    .collect::<Vec<_>>()
                    .join(", ");
                Response::new(StatusCode::MethodNotAllowed)
                    .header("Allow", allow)
                    .body(StatusCode::MethodNotAllowed.canonical_reason())
            }
            Decision::NotFound => {
                debug!(method = %request.method(), path = request.path(), "no route");
                Response::new(StatusCode::NotFound).body("404 page not found")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ok(body: &'static str) -> impl IntoHandler {
        move |_ctx: Context| async move { Response::new(StatusCode::Ok).body(body) }
    }

    fn sample_router() -> Router<&'static str> {
        let mut router = Router::new();
        router.get("/users/", "users").unwrap();
        router.get("/users/:id", "user").unwrap();
        router.post("/users/:id", "update").unwrap();
        router.get("/about", "about").unwrap();
        router
    }

    // ── decide ────────────────────────────────────────────────────────────────

    #[test]
    fn decide_matches_with_params() {
        let router = sample_router();
        match decide(&router, &RouterConfig::default(), &Method::Get, "/users/7") {
            Decision::Matched { handler, params } => {
                assert_eq!(*handler, "user");
                assert_eq!(params.by_name("id"), Some("7"));
            }
            other => panic!("expected a match, got {other:?}"),
        }
    }

    #[test]
    fn decide_redirect_status_depends_on_method() {
        let mut router = sample_router();
        router.put("/items/", "items").unwrap();
        let config = RouterConfig::default();

        assert_eq!(
            decide(&router, &config, &Method::Get, "/about/"),
            Decision::Redirect {
                status: StatusCode::MovedPermanently,
                location: "/about".to_owned()
            }
        );
        assert_eq!(
            decide(&router, &config, &Method::Put, "/items"),
            Decision::Redirect {
                status: StatusCode::PermanentRedirect,
                location: "/items/".to_owned()
            }
        );
    }

    #[test]
    fn decide_respects_disabled_redirects() {
        let router = sample_router();
        let config = RouterConfig {
            redirect_trailing_slash: false,
            ..RouterConfig::default()
        };
        assert_eq!(
            decide(&router, &config, &Method::Get, "/users"),
            Decision::NotFound
        );
    }

    #[test]
    fn decide_never_redirects_connect() {
        let mut router: Router<&str> = Router::new();
        router.handle(Method::Connect, "/tunnel/", "tunnel").unwrap();
        assert_eq!(
            decide(&router, &RouterConfig::default(), &Method::Connect, "/tunnel"),
            Decision::NotFound
        );
    }

    #[test]
    fn decide_method_not_allowed() {
        let router = sample_router();
        assert_eq!(
            decide(&router, &RouterConfig::default(), &Method::Delete, "/users/7"),
            Decision::MethodNotAllowed {
                allow: vec![Method::Get, Method::Post]
            }
        );

        let config = RouterConfig {
            handle_method_not_allowed: false,
            ..RouterConfig::default()
        };
        assert_eq!(
            decide(&router, &config, &Method::Delete, "/users/7"),
            Decision::NotFound
        );
    }

    #[test]
    fn redirect_takes_precedence_over_method_not_allowed() {
        let mut router = sample_router();
        router.post("/about/", "about-form").unwrap();
        // GET /about/ is a TSR hit for GET /about, even though POST owns /about/.
        assert!(matches!(
            decide(&router, &RouterConfig::default(), &Method::Get, "/about/"),
            Decision::Redirect { .. }
        ));
    }

    #[test]
    fn toggles_trailing_slash() {
        assert_eq!(toggle_trailing_slash("/users/"), "/users");
        assert_eq!(toggle_trailing_slash("/users"), "/users/");
    }

    // ── App ───────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn app_calls_matched_handler() {
        let mut app = App::new();
        app.get("/user/:name", |ctx: Context| async move {
            let name = ctx.param("name").unwrap_or_default().to_owned();
            Response::new(StatusCode::Ok).body(format!("hello {name}"))
        })
        .unwrap();

        let response = app.call(Request::new(Method::Get, "/user/gopher")).await;
        assert_eq!(response.status(), StatusCode::Ok);
        assert_eq!(&response.body_bytes()[..], b"hello gopher");
    }

    #[tokio::test]
    async fn app_handler_reads_json_body() {
        #[derive(serde::Deserialize)]
        struct Rename {
            to: String,
        }

        let mut app = App::new();
        app.post("/files/*filepath", |ctx: Context| async move {
            match ctx.json::<Rename>() {
                Ok(rename) => {
                    let from = ctx.param("filepath").unwrap_or_default();
                    Response::new(StatusCode::Ok).body(format!("{from} -> {}", rename.to))
                }
                Err(_) => Response::new(StatusCode::BadRequest),
            }
        })
        .unwrap();

        let request = Request::new(Method::Post, "/files/a/b.txt").with_body(r#"{"to":"/c.txt"}"#);
        let response = app.call(request).await;
        assert_eq!(&response.body_bytes()[..], b"/a/b.txt -> /c.txt");

        let request = Request::new(Method::Post, "/files/a/b.txt").with_body("{");
        assert_eq!(app.call(request).await.status(), StatusCode::BadRequest);
    }

    #[tokio::test]
    async fn app_redirect_keeps_query() {
        let mut app = App::new();
        app.get("/search/", ok("search")).unwrap();

        let response = app.call(Request::new(Method::Get, "/search?q=tree")).await;
        assert_eq!(response.status(), StatusCode::MovedPermanently);
        assert_eq!(response.header_value("Location"), Some("/search/?q=tree"));
    }

    #[tokio::test]
    async fn app_method_not_allowed_sets_allow_header() {
        let mut app = App::new();
        app.get("/thing", ok("get")).unwrap();
        app.put("/thing", ok("put")).unwrap();

        let response = app.call(Request::new(Method::Post, "/thing")).await;
        assert_eq!(response.status(), StatusCode::MethodNotAllowed);
        assert_eq!(response.header_value("allow"), Some("GET, PUT"));
    }

    #[tokio::test]
    async fn app_returns_handler_status_verbatim() {
        let mut app = App::new();
        app.get("/broken", |_ctx: Context| async {
            Response::new(StatusCode::InternalServerError)
        })
        .unwrap();
        app.get("/moved", |_ctx: Context| async {
            Response::redirect(StatusCode::TemporaryRedirect, "/elsewhere")
        })
        .unwrap();

        let response = app.call(Request::new(Method::Get, "/broken")).await;
        assert_eq!(response.status(), StatusCode::InternalServerError);

        let response = app.call(Request::new(Method::Get, "/moved")).await;
        assert_eq!(response.status(), StatusCode::TemporaryRedirect);
        assert_eq!(response.header_value("location"), Some("/elsewhere"));
    }

    #[tokio::test]
    async fn app_not_found() {
        let app = App::with_config(RouterConfig::default());
        let response = app.call(Request::new(Method::Get, "/missing")).await;
        assert_eq!(response.status(), StatusCode::NotFound);
        assert_eq!(&response.body_bytes()[..], b"404 page not found");
    }

    #[test]
    fn app_rejects_conflicting_routes() {
        let mut app = App::new();
        app.get("/user/:name", ok("user")).unwrap();
        assert!(matches!(
            app.get("/user/new", ok("new")),
            Err(RouteError::WildcardConflict { .. })
        ));
        assert_eq!(app.router().len(), 1);
    }
}
