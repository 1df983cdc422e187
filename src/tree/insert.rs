//! Route insertion.
//!
//! Insertion runs in three passes so that a rejected route never leaves a trace in the
//! tree:
//!
//! 1. [`validate_pattern`] checks the pattern on its own (leading `/`, named wildcards,
//!    one wildcard per segment, catch-all placement).
//! 2. [`Node::check_conflicts`] walks the tree read-only along the exact path the
//!    insertion will take and reports duplicates and wildcard collisions.
//! 3. [`Node::add_route`] performs the mutation. It has no failure paths.

use super::{Node, NodeKind, RouteError, count_params, find_wildcard, longest_common_prefix};

impl<H> Node<H> {
    /// Registers `handler` for `pattern`.
    ///
    /// # Errors
    ///
    /// - [`RouteError::InvalidPattern`] if the pattern does not start with `/` or a
    ///   wildcard has an empty name.
    /// - [`RouteError::DuplicateRoute`] if the exact pattern already has a handler.
    /// - [`RouteError::WildcardConflict`] if a wildcard collides with an existing route,
    ///   a segment holds more than one wildcard marker, or a catch-all is not the final
    ///   path element.
    ///
    /// # Examples
    ///
    /// ```
    /// use xrouter::tree::{Node, RouteError};
    ///
    /// let mut tree = Node::new();
    /// tree.insert("/user/:id", 1).unwrap();
    ///
    /// let err = tree.insert("/user/:name", 2).unwrap_err();
    /// assert!(matches!(err, RouteError::WildcardConflict { .. }));
    /// assert_eq!(tree.lookup("/user/42").handler, Some(&1));
    /// ```
    pub fn insert(&mut self, pattern: &str, handler: H) -> Result<(), RouteError> {
        validate_pattern(pattern)?;
        self.check_conflicts(pattern)?;
        self.add_route(pattern.as_bytes(), handler);
        Ok(())
    }

    /// Read-only dry run of [`add_route`](Self::add_route).
    fn check_conflicts(&self, pattern: &str) -> Result<(), RouteError> {
        if self.is_empty() {
            return Ok(());
        }

        let full = pattern.as_bytes();
        let mut node = self;
        let mut consumed = 0;

        loop {
            let path = &full[consumed..];
            match node.kind {
                NodeKind::CatchAll => {
                    if path == node.prefix.as_slice() {
                        return Err(duplicate(pattern));
                    }
                    return Err(conflict(
                        pattern,
                        format!(
                            "catch-all '{}' already captures everything below",
                            existing_route(full, consumed, &node.prefix)
                        ),
                    ));
                }
                NodeKind::Param => {
                    let name = node.prefix.as_slice();
                    let same_param = path.starts_with(name)
                        && path.get(name.len()).is_none_or(|&b| b == b'/');
                    if !same_param {
                        return Err(conflict(
                            pattern,
                            format!(
                                "'{}' collides with existing wildcard '{}' in '{}'",
                                segment_at(path),
                                node.wildcard_name(),
                                existing_route(full, consumed, name)
                            ),
                        ));
                    }
                    consumed += name.len();
                }
                NodeKind::Root | NodeKind::Static => {
                    let common = longest_common_prefix(path, &node.prefix);
                    if common < node.prefix.len() {
                        // The node would be split into a fork whose only child is the
                        // static remainder of the existing prefix.
                        return match path.get(common) {
                            Some(b':' | b'*') => Err(conflict(
                                pattern,
                                format!(
                                    "'{}' collides with existing static route '{}'",
                                    segment_at(&path[common..]),
                                    existing_route(full, consumed, &node.prefix)
                                ),
                            )),
                            _ => Ok(()),
                        };
                    }
                    consumed += common;
                }
            }

            let rest = &full[consumed..];
            let Some(&next) = rest.first() else {
                return match node.handler {
                    Some(_) => Err(duplicate(pattern)),
                    None => Ok(()),
                };
            };

            if node.wild_child {
                node = &node.children[0];
                continue;
            }

            match node.child_position(next) {
                Some(pos) => node = &node.children[pos],
                None if next == b'*' => {
                    // The segment root (the node ending in '/') already exists, so it has
                    // a handler or children the catch-all would shadow.
                    return Err(conflict(
                        pattern,
                        format!(
                            "catch-all '{}' conflicts with existing route at '{}'",
                            segment_at(rest),
                            String::from_utf8_lossy(&full[..consumed])
                        ),
                    ));
                }
                None if next == b':' && !node.children.is_empty() => {
                    let sibling = &node.children[0];
                    return Err(conflict(
                        pattern,
                        format!(
                            "'{}' collides with existing static route '{}'",
                            segment_at(rest),
                            existing_route(full, consumed, &sibling.prefix)
                        ),
                    ));
                }
                None => return Ok(()),
            }
        }
    }

    /// Inserts a validated, conflict-free pattern, updating priorities along the way.
    fn add_route(&mut self, full: &[u8], handler: H) {
        let mut params = count_params(full);
        self.priority += 1;

        if self.is_empty() {
            self.kind = NodeKind::Root;
            self.max_params = params;
            self.insert_wildcards(full, handler);
            return;
        }

        let mut node = self;
        let mut path = full;

        loop {
            match node.kind {
                NodeKind::Param => {
                    node.max_params = node.max_params.max(params);
                    path = &path[node.prefix.len()..];
                    params -= 1;
                }
                NodeKind::Root | NodeKind::Static => {
                    let common = longest_common_prefix(path, &node.prefix);
                    if common < node.prefix.len() {
                        node.split_at(common);
                    }
                    node.max_params = node.max_params.max(params);
                    path = &path[common..];
                }
                NodeKind::CatchAll => unreachable!("conflict scan rejects routes below a catch-all"),
            }

            let Some(&next) = path.first() else {
                node.handler = Some(handler);
                return;
            };

            if node.wild_child {
                node = &mut node.children[0];
                node.priority += 1;
                continue;
            }

            match node.child_position(next) {
                Some(pos) => {
                    let pos = node.bump_child(pos);
                    node = &mut node.children[pos];
                }
                None => {
                    node.attach(path, handler);
                    return;
                }
            }
        }
    }

    /// Hangs the unmatched remainder `path` below this node.
    fn attach(&mut self, path: &[u8], handler: H) {
        if path[0] == b':' || path.starts_with(b"/*") {
            // Wildcards live directly on this node.
            self.insert_wildcards(path, handler);
            return;
        }

        let mut child = Self::with_kind(NodeKind::Static, Vec::new());
        child.max_params = count_params(path);
        self.indices.push(path[0]);
        self.children.push(child);
        let pos = self.bump_child(self.children.len() - 1);
        self.children[pos].insert_wildcards(path, handler);
    }

    /// Builds the chain of nodes for `path` below a node that has no matching children.
    ///
    /// The node is either brand new, or `path` starts right at a wildcard, in which case
    /// the node keeps its prefix.
    fn insert_wildcards(&mut self, mut path: &[u8], handler: H) {
        let mut node = self;

        loop {
            let Some((start, end)) = find_wildcard(path) else {
                node.prefix = path.to_vec();
                node.handler = Some(handler);
                return;
            };

            if path[start] == b'*' {
                let slash = start - 1;
                if slash > 0 {
                    node.prefix = path[..slash].to_vec();
                }
                let mut catch_all = Self::with_kind(NodeKind::CatchAll, path[slash..].to_vec());
                catch_all.priority = 1;
                catch_all.max_params = 1;
                catch_all.handler = Some(handler);
                node.max_params = node.max_params.max(1);
                node.indices.push(b'/');
                node.children.push(catch_all);
                return;
            }

            if start > 0 {
                node.prefix = path[..start].to_vec();
            }
            let remaining = count_params(&path[start..]);
            let mut param = Self::with_kind(NodeKind::Param, path[start..end].to_vec());
            param.priority = 1;
            param.max_params = remaining;
            node.max_params = node.max_params.max(remaining);
            node.wild_child = true;
            node.children.push(param);
            node = &mut node.children[0];

            path = &path[end..];
            if path.is_empty() {
                node.handler = Some(handler);
                return;
            }

            // A catch-all right after the parameter hangs off the parameter itself;
            // anything else continues in a static child starting with '/'.
            if !path.starts_with(b"/*") {
                let mut next = Self::with_kind(NodeKind::Static, Vec::new());
                next.priority = 1;
                next.max_params = remaining - 1;
                node.indices.push(b'/');
                node.children.push(next);
                node = &mut node.children[0];
            }
        }
    }
}

/// Checks a pattern in isolation, before the tree is consulted.
pub(crate) fn validate_pattern(pattern: &str) -> Result<(), RouteError> {
    let bytes = pattern.as_bytes();
    if bytes.first() != Some(&b'/') {
        return Err(invalid(pattern, "path must begin with '/'"));
    }

    let mut offset = 0;
    while let Some((start, end)) = find_wildcard(&bytes[offset..]) {
        let (start, end) = (offset + start, offset + end);
        let name = &bytes[start + 1..end];

        if let Some(&marker) = name.iter().find(|&&b| b == b':' || b == b'*') {
            return Err(conflict(
                pattern,
                format!(
                    "'{}' repeats wildcard marker '{}' inside one path segment",
                    String::from_utf8_lossy(&bytes[start..end]),
                    char::from(marker)
                ),
            ));
        }
        if name.is_empty() {
            return Err(invalid(pattern, "wildcards must be named with a non-empty name"));
        }
        if bytes[start] == b'*' {
            if end != bytes.len() {
                return Err(conflict(
                    pattern,
                    "catch-all parameters are only allowed at the end of the path".to_owned(),
                ));
            }
            if bytes[start - 1] != b'/' {
                return Err(invalid(pattern, "catch-all must be preceded by '/'"));
            }
        }
        offset = end;
    }
    Ok(())
}

fn invalid(pattern: &str, reason: &'static str) -> RouteError {
    RouteError::InvalidPattern {
        pattern: pattern.to_owned(),
        reason,
    }
}

fn duplicate(pattern: &str) -> RouteError {
    RouteError::DuplicateRoute {
        pattern: pattern.to_owned(),
    }
}

fn conflict(pattern: &str, detail: String) -> RouteError {
    RouteError::WildcardConflict {
        pattern: pattern.to_owned(),
        detail,
    }
}

/// The already registered route prefix that ends with `prefix`.
fn existing_route(full: &[u8], consumed: usize, prefix: &[u8]) -> String {
    let mut route = full[..consumed].to_vec();
    route.extend_from_slice(prefix);
    String::from_utf8_lossy(&route).into_owned()
}

/// The path segment at the start of `path`, up to the next '/'.
fn segment_at(path: &[u8]) -> std::borrow::Cow<'_, str> {
    let end = path.iter().position(|&b| b == b'/').unwrap_or(path.len());
    String::from_utf8_lossy(&path[..end])
}
