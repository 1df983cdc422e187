//! # xrouter
//!
//! A radix-tree HTTP request router with named parameters, catch-all parameters, and
//! trailing slash redirects.
//!
//! ## Quick Start
//!
//! ```rust
//! use xrouter::Router;
//! use xrouter::http::Method;
//!
//! let mut router = Router::new();
//! router.get("/", "index").unwrap();
//! router.get("/user/:name", "user").unwrap();
//! router.get("/src/*filepath", "files").unwrap();
//!
//! let found = router.lookup(&Method::Get, "/src/lib/tree.rs");
//! assert_eq!(found.handler, Some(&"files"));
//! assert_eq!(found.params.by_name("filepath"), Some("/lib/tree.rs"));
//!
//! // Conflicting routes are rejected at registration time.
//! assert!(router.get("/user/new", "new").is_err());
//! ```
//!
//! [`Router`] is generic over the handler type. For async request handling with
//! redirects and `405` responses built in, see [`dispatch::App`].

// ── Routing core ──────────────────────────────────────────────────────────────
pub mod params;
pub mod router;
pub mod tree;

// ── Request handling ──────────────────────────────────────────────────────────
pub mod config;
pub mod dispatch;
pub mod http;

// ── Convenience re-exports ────────────────────────────────────────────────────
pub use config::{ConfigError, RouterConfig};
pub use dispatch::{App, Context};
pub use http::{Method, Request, Response, StatusCode};
pub use params::{Param, Params};
pub use router::Router;
pub use tree::{Lookup, Node, RouteError};
