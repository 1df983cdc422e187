//! Dispatch policy configuration.
//!
//! The routing tree itself has no knobs; these settings only decide what the
//! [`App`](crate::dispatch::App) does with a near miss.
//!
//! ```json
//! { "redirect_trailing_slash": true, "handle_method_not_allowed": false }
//! ```
//!
//! Missing fields fall back to their defaults, so `{}` is a valid configuration.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors produced while loading a [`RouterConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid router configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

/// How the dispatcher reacts when a request does not match a route exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RouterConfig {
    /// Redirect to the same path with a trailing slash added or removed when only that
    /// variant is registered. `301` for `GET`/`HEAD`, `308` for everything else.
    pub redirect_trailing_slash: bool,

    /// Answer `405 Method Not Allowed` (with an `Allow` header) instead of `404` when the
    /// path is registered under other methods.
    pub handle_method_not_allowed: bool,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            redirect_trailing_slash: true,
            handle_method_not_allowed: true,
        }
    }
}

impl RouterConfig {
    /// Parses a configuration from JSON.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed JSON, wrongly typed values, or
    /// unknown fields.
    ///
    /// # Examples
    ///
    /// ```
    /// use xrouter::config::RouterConfig;
    ///
    /// let config = RouterConfig::from_json(r#"{ "redirect_trailing_slash": false }"#).unwrap();
    /// assert!(!config.redirect_trailing_slash);
    /// assert!(config.handle_method_not_allowed);
    /// ```
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }
}
