//! Route lookup and trailing-slash detection.

use super::{Lookup, Node, NodeKind};
use crate::params::Params;

impl<H> Node<H> {
    /// Finds the handler registered for `path` and captures its parameters.
    ///
    /// When nothing matches, [`Lookup::tsr`] reports whether the same path with one
    /// trailing slash added or removed would have matched. Lookups never mutate the
    /// tree.
    ///
    /// # Examples
    ///
    /// ```
    /// use xrouter::tree::Node;
    ///
    /// let mut tree = Node::new();
    /// tree.insert("/user/:name", "user").unwrap();
    ///
    /// let found = tree.lookup("/user/gopher");
    /// assert_eq!(found.handler, Some(&"user"));
    /// assert_eq!(found.params.by_name("name"), Some("gopher"));
    ///
    /// let near_miss = tree.lookup("/user/gopher/");
    /// assert!(near_miss.handler.is_none());
    /// assert!(near_miss.tsr);
    /// ```
    pub fn lookup(&self, path: &str) -> Lookup<'_, H> {
        let mut params = Params::with_capacity(self.max_params);
        match self.walk(path.as_bytes(), &mut params) {
            Some(handler) => Lookup {
                handler: Some(handler),
                params,
                tsr: false,
            },
            None => Lookup::miss(self.has_trailing_slash_match(path)),
        }
    }

    /// Walks the tree along `path`, pushing captured parameters.
    fn walk<'n>(&'n self, mut path: &[u8], params: &mut Params) -> Option<&'n H> {
        let mut node = self;

        loop {
            match node.kind {
                NodeKind::Root | NodeKind::Static => {
                    path = path.strip_prefix(node.prefix.as_slice())?;
                }
                NodeKind::Param => {
                    let end = path.iter().position(|&b| b == b'/').unwrap_or(path.len());
                    if end == 0 {
                        return None;
                    }
                    params.push(node.wildcard_name(), String::from_utf8_lossy(&path[..end]));
                    path = &path[end..];
                }
                NodeKind::CatchAll => {
                    params.push(node.wildcard_name(), String::from_utf8_lossy(path));
                    return node.handler.as_ref();
                }
            }

            let Some(&next) = path.first() else {
                return node.handler.as_ref();
            };

            node = if node.wild_child {
                &node.children[0]
            } else {
                &node.children[node.child_position(next)?]
            };
        }
    }

    /// Whether `path` with one trailing slash added or removed reaches a handler.
    fn has_trailing_slash_match(&self, path: &str) -> bool {
        let mut scratch = Params::new();
        let found = match path.strip_suffix('/') {
            Some("") => false,
            Some(trimmed) => self.walk(trimmed.as_bytes(), &mut scratch).is_some(),
            None => {
                let mut with_slash = String::with_capacity(path.len() + 1);
                with_slash.push_str(path);
                with_slash.push('/');
                self.walk(with_slash.as_bytes(), &mut scratch).is_some()
            }
        };
        if found {
            tracing::trace!(path, "trailing slash recommendation");
        }
        found
    }
}
