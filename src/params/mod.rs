//! Path parameters captured by a successful route lookup.
//!
//! A [`Params`] list is ordered: the first parameter in the pattern is the first entry.
//! Entries can be read by index (which also exposes the key) or by name via
//! [`Params::by_name`].
//!
//! ```text
//! Pattern: /blog/:category/*rest
//! Path:    /blog/rust/2024/radix-trees
//!
//! [0] category → "rust"
//! [1] rest     → "/2024/radix-trees"
//! ```

use serde::Serialize;

/// A single URL parameter, consisting of a key and a value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Param {
    pub key: String,
    pub value: String,
}

impl Param {
    /// Create a new parameter from a key and a value.
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Ordered list of [`Param`]s, as returned by a route lookup.
///
/// Lists are created fresh for every lookup and owned by the caller; the router never
/// holds on to them.
///
/// # Examples
///
/// ```
/// use xrouter::params::{Param, Params};
///
/// let params: Params = vec![Param::new("user", "gopher"), Param::new("repo", "xrouter")]
///     .into_iter()
///     .collect();
///
/// assert_eq!(params.by_name("repo"), Some("xrouter"));
/// assert_eq!(params.get(0).map(|p| p.key.as_str()), Some("user"));
/// assert_eq!(params.by_name("missing"), None);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Params {
    inner: Vec<Param>,
}

impl Params {
    /// Create an empty parameter list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty list with room for `capacity` parameters.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: Vec::with_capacity(capacity),
        }
    }

    /// Append a parameter at the end of the list.
    pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.inner.push(Param::new(key, value));
    }

    /// Returns the value of the first parameter whose key equals `name`.
    ///
    /// Later entries with the same key are shadowed. A single pattern can never produce
    /// duplicate keys, but merged lists can.
    pub fn by_name(&self, name: &str) -> Option<&str> {
        self.inner
            .iter()
            .find(|param| param.key == name)
            .map(|param| param.value.as_str())
    }

    /// Returns the parameter at `index`, in pattern order.
    pub fn get(&self, index: usize) -> Option<&Param> {
        self.inner.get(index)
    }

    /// Number of captured parameters.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Returns `true` if nothing was captured.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Iterate over the parameters in pattern order.
    pub fn iter(&self) -> std::slice::Iter<'_, Param> {
        self.inner.iter()
    }
}

impl<'a> IntoIterator for &'a Params {
    type Item = &'a Param;
    type IntoIter = std::slice::Iter<'a, Param>;

    fn into_iter(self) -> Self::IntoIter {
        self.inner.iter()
    }
}

impl IntoIterator for Params {
    type Item = Param;
    type IntoIter = std::vec::IntoIter<Param>;

    fn into_iter(self) -> Self::IntoIter {
        self.inner.into_iter()
    }
}

impl FromIterator<Param> for Params {
    fn from_iter<I: IntoIterator<Item = Param>>(iter: I) -> Self {
        Self {
            inner: iter.into_iter().collect(),
        }
    }
}
