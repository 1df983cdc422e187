//! Radix tree (compressed trie) that stores the routes of one HTTP method.
//!
//! Every [`Node`] owns the part of the path it consumes relative to its parent, so chains
//! of single-child nodes collapse into one prefix:
//!
//! ```text
//! Priority   Path             Handler
//! 9          /                *<1>
//! 3          ├s               nil
//! 2          |├earch/         *<2>
//! 1          |└upport/        *<3>
//! 2          ├blog/           *<4>
//! 1          |    └:post      nil
//! 1          |         └/     *<5>
//! 2          ├about-us/       *<6>
//! 1          |        └team/  *<7>
//! 1          └contact/        *<8>
//! ```
//!
//! Patterns support two kinds of wildcards:
//!
//! | Syntax  | Kind       | Matches                                              |
//! |---------|------------|------------------------------------------------------|
//! | `:name` | named      | one path segment, up to the next `/` (never empty)   |
//! | `*name` | catch-all  | everything to the end of the path, including `/`     |
//!
//! Conflicting patterns (a static segment and a wildcard competing for the same position,
//! two differently named parameters, anything below a catch-all) are rejected when they
//! are inserted, so a lookup can only ever match one route.
//!
//! The tree is mutated only through [`Node::insert`]. [`Node::lookup`] takes `&self` and
//! never touches node state, so a fully built tree can be shared across threads without
//! synchronization.

use std::borrow::Cow;
use std::fmt;

use thiserror::Error;

use crate::params::Params;

mod insert;
mod lookup;

/// Errors produced while registering a route.
///
/// Registration errors are non-fatal: the tree is left exactly as it was before the
/// rejected insertion.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    #[error("invalid pattern '{pattern}': {reason}")]
    InvalidPattern {
        pattern: String,
        reason: &'static str,
    },

    #[error("a handler is already registered for path '{pattern}'")]
    DuplicateRoute { pattern: String },

    #[error("wildcard conflict in path '{pattern}': {detail}")]
    WildcardConflict { pattern: String, detail: String },
}

/// Role of a node inside the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) enum NodeKind {
    #[default]
    Static,
    Root,
    /// `:name`, consumes one segment.
    Param,
    /// `/*name`, consumes the rest of the path. Always a leaf.
    CatchAll,
}

/// One vertex of the routing tree. The root of a tree is also a `Node`.
///
/// Static children and the catch-all child (indexed by its leading `/`) are looked up by
/// their first byte through `indices`. A parameter child is never indexed: when
/// `wild_child` is set it is the only child, stored at `children[0]`.
#[derive(Clone, PartialEq, Eq)]
pub struct Node<H> {
    prefix: Vec<u8>,
    kind: NodeKind,
    wild_child: bool,
    indices: Vec<u8>,
    children: Vec<Node<H>>,
    handler: Option<H>,
    priority: u32,
    max_params: usize,
}

/// Result of [`Node::lookup`].
///
/// A miss is a normal result: `handler` is `None` and `tsr` tells whether the same path
/// with one trailing slash added or removed would have matched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lookup<'a, H> {
    pub handler: Option<&'a H>,
    pub params: Params,
    pub tsr: bool,
}

impl<'a, H> Lookup<'a, H> {
    pub(crate) fn miss(tsr: bool) -> Self {
        Self {
            handler: None,
            params: Params::new(),
            tsr,
        }
    }

    /// Returns `true` when a handler was found.
    pub fn is_match(&self) -> bool {
        self.handler.is_some()
    }

    /// Split into `(handler, params, trailing_slash_redirect)`.
    pub fn into_parts(self) -> (Option<&'a H>, Params, bool) {
        (self.handler, self.params, self.tsr)
    }
}

impl<H> Default for Node<H> {
    fn default() -> Self {
        Self::with_kind(NodeKind::Static, Vec::new())
    }
}

impl<H> Node<H> {
    /// Create an empty tree root.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_kind(kind: NodeKind, prefix: Vec<u8>) -> Self {
        Self {
            prefix,
            kind,
            wild_child: false,
            indices: Vec::new(),
            children: Vec::new(),
            handler: None,
            priority: 0,
            max_params: 0,
        }
    }

    /// Returns `true` if no route has been inserted yet.
    pub fn is_empty(&self) -> bool {
        self.prefix.is_empty() && self.children.is_empty() && self.handler.is_none()
    }

    /// Number of routes registered in the subtree rooted here.
    pub fn route_count(&self) -> usize {
        usize::from(self.handler.is_some())
            + self.children.iter().map(Node::route_count).sum::<usize>()
    }

    /// Upper bound on the number of parameters any route below this node captures.
    pub fn max_params(&self) -> usize {
        self.max_params
    }

    /// Name of the parameter captured by a `Param` or `CatchAll` node.
    fn wildcard_name(&self) -> Cow<'_, str> {
        let marker = match self.kind {
            NodeKind::Param => 1,
            NodeKind::CatchAll => 2,
            NodeKind::Static | NodeKind::Root => 0,
        };
        // Wildcards are delimited by ASCII bytes, so the name is whole UTF-8.
        String::from_utf8_lossy(&self.prefix[marker..])
    }

    /// Position of the indexed child whose prefix starts with `byte`.
    fn child_position(&self, byte: u8) -> Option<usize> {
        self.indices.iter().position(|&index| index == byte)
    }

    /// Increments the priority of the child at `pos` and moves it forward past every
    /// sibling with a lower priority. Returns the child's new position.
    fn bump_child(&mut self, pos: usize) -> usize {
        self.children[pos].priority += 1;
        let priority = self.children[pos].priority;

        let mut new_pos = pos;
        while new_pos > 0 && self.children[new_pos - 1].priority < priority {
            self.children.swap(new_pos - 1, new_pos);
            self.indices.swap(new_pos - 1, new_pos);
            new_pos -= 1;
        }
        new_pos
    }

    /// Splits this node after `at` bytes of its prefix.
    ///
    /// The node keeps the common prefix and becomes an empty fork; its previous state
    /// (remaining prefix, children, handler) moves into a freshly owned static child.
    fn split_at(&mut self, at: usize) {
        let suffix = self.prefix.split_off(at);
        let mut fork = Self::with_kind(self.kind, std::mem::take(&mut self.prefix));
        fork.priority = self.priority;
        fork.max_params = self.max_params;

        let mut demoted = std::mem::replace(self, fork);
        demoted.prefix = suffix;
        demoted.kind = NodeKind::Static;
        // The fork was already credited with the route being inserted.
        demoted.priority -= 1;

        self.indices.push(demoted.prefix[0]);
        self.children.push(demoted);
    }
}

/// Length of the longest common byte prefix of `a` and `b`.
fn longest_common_prefix(a: &[u8], b: &[u8]) -> usize {
    a.iter().zip(b).take_while(|(x, y)| x == y).count()
}

/// Number of wildcards in a pattern.
fn count_params(path: &[u8]) -> usize {
    path.iter().filter(|&&b| b == b':' || b == b'*').count()
}

/// Finds the first wildcard in `path`, returning the byte range `start..end` of the
/// marker and its name.
fn find_wildcard(path: &[u8]) -> Option<(usize, usize)> {
    let start = path.iter().position(|&b| b == b':' || b == b'*')?;
    let end = path[start + 1..]
        .iter()
        .position(|&b| b == b'/')
        .map_or(path.len(), |offset| start + 1 + offset);
    Some((start, end))
}

impl<H: fmt::Debug> fmt::Debug for Node<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("prefix", &String::from_utf8_lossy(&self.prefix))
            .field("kind", &self.kind)
            .field("wild_child", &self.wild_child)
            .field("indices", &String::from_utf8_lossy(&self.indices))
            .field("priority", &self.priority)
            .field("max_params", &self.max_params)
            .field("handler", &self.handler)
            .field("children", &self.children)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    pub(super) fn build(routes: &[&'static str]) -> Node<&'static str> {
        let mut tree = Node::new();
        for route in routes {
            tree.insert(route, *route)
                .unwrap_or_else(|e| panic!("inserting {route}: {e}"));
        }
        tree
    }

    // Returns the number of handlers below `node`, asserting that every priority
    // matches it and that siblings are sorted.
    fn assert_priorities<H>(node: &Node<H>) -> u32 {
        let mut handlers = u32::from(node.handler.is_some());
        for child in &node.children {
            handlers += assert_priorities(child);
        }
        assert_eq!(
            node.priority,
            handlers,
            "priority of '{}'",
            String::from_utf8_lossy(&node.prefix)
        );
        for pair in node.children.windows(2) {
            assert!(pair[0].priority >= pair[1].priority);
        }
        handlers
    }

    fn assert_indices<H>(node: &Node<H>) {
        if node.wild_child {
            assert_eq!(node.children.len(), 1);
            assert!(node.indices.is_empty());
            assert_eq!(node.children[0].kind, NodeKind::Param);
        } else {
            assert_eq!(node.indices.len(), node.children.len());
            for (index, child) in node.indices.iter().zip(&node.children) {
                assert_eq!(Some(index), child.prefix.first());
            }
        }
        if node.kind == NodeKind::CatchAll {
            assert!(node.children.is_empty());
        }
        node.children.iter().for_each(assert_indices);
    }

    fn reverse_children<H>(node: &mut Node<H>) {
        node.children.reverse();
        node.indices.reverse();
        node.children.iter_mut().for_each(reverse_children);
    }

    // ── Helpers ───────────────────────────────────────────────────────────────

    #[test]
    fn common_prefix_length() {
        assert_eq!(longest_common_prefix(b"/search", b"/support"), 2);
        assert_eq!(longest_common_prefix(b"/a", b"/a/b"), 2);
        assert_eq!(longest_common_prefix(b"", b"/"), 0);
    }

    #[test]
    fn wildcard_positions() {
        assert_eq!(find_wildcard(b"/user/:name/posts"), Some((6, 11)));
        assert_eq!(find_wildcard(b"/src/*filepath"), Some((5, 14)));
        assert_eq!(find_wildcard(b"/static/path"), None);
        assert_eq!(count_params(b"/:a/:b/*c"), 3);
    }

    // ── Node model ────────────────────────────────────────────────────────────

    #[test]
    fn new_tree_is_empty() {
        let tree: Node<()> = Node::new();
        assert!(tree.is_empty());
        assert_eq!(tree.route_count(), 0);
    }

    #[test]
    fn split_moves_state_into_child() {
        let tree = build(&["/search", "/support"]);
        assert_eq!(tree.prefix, b"/s");
        assert_eq!(tree.kind, NodeKind::Root);
        assert!(tree.handler.is_none());
        assert_eq!(tree.children.len(), 2);
        let search = &tree.children[0];
        assert_eq!(search.prefix, b"earch");
        assert_eq!(search.kind, NodeKind::Static);
        assert_eq!(search.handler, Some("/search"));
    }

    #[test]
    fn catch_all_is_indexed_by_slash() {
        let tree = build(&["/src/*filepath"]);
        assert_eq!(tree.prefix, b"/src");
        assert_eq!(tree.indices, b"/");
        let catch_all = &tree.children[0];
        assert_eq!(catch_all.kind, NodeKind::CatchAll);
        assert_eq!(catch_all.prefix, b"/*filepath");
        assert_eq!(catch_all.wildcard_name(), "filepath");
    }

    #[test]
    fn parameter_is_the_only_child() {
        let tree = build(&["/user/:name", "/user/:name/posts"]);
        assert!(tree.wild_child);
        let param = &tree.children[0];
        assert_eq!(param.kind, NodeKind::Param);
        assert_eq!(param.wildcard_name(), "name");
        assert_eq!(param.handler, Some("/user/:name"));
        assert_eq!(param.children[0].prefix, b"/posts");
    }

    #[test]
    fn max_params_bounds_every_route() {
        let tree = build(&["/", "/a/:b/:c", "/d/:e/*f", "/g"]);
        assert_eq!(tree.max_params(), 2);
    }

    // ── Priorities ────────────────────────────────────────────────────────────

    #[test]
    fn priorities_count_routes_in_subtree() {
        let tree = build(&[
            "/",
            "/search/",
            "/support/",
            "/blog/:post/",
            "/about-us/",
            "/about-us/team/",
            "/contact/",
            "/src/*filepath",
            "/user_:name",
            "/user_:name/about",
        ]);
        assert_eq!(assert_priorities(&tree), 10);
        assert_indices(&tree);
    }

    #[test]
    fn busier_branch_moves_to_front() {
        let tree = build(&["/a", "/b", "/b/1", "/b/2"]);
        // "/" fork: 'a' registered first but 'b' now carries more routes.
        assert_eq!(tree.prefix, b"/");
        assert_eq!(tree.indices, b"ba");
        assert_eq!(tree.children[0].priority, 3);
        assert_eq!(tree.children[1].priority, 1);
    }

    #[test]
    fn equal_priorities_keep_insertion_order() {
        let tree = build(&["/x", "/y", "/z"]);
        assert_eq!(tree.indices, b"xyz");
    }

    const ROUTES: &[&str] = &[
        "/",
        "/cmd/:tool/:sub",
        "/cmd/:tool/",
        "/src/*filepath",
        "/search/",
        "/search/:query",
        "/user_:name",
        "/user_:name/about",
        "/files/:dir/*filepath",
        "/doc/",
        "/doc/go_faq.html",
        "/doc/go1.html",
        "/info/:user/public",
        "/info/:user/project/:project",
    ];

    const PROBES: &[&str] = &[
        "/",
        "/cmd/test/",
        "/cmd/test",
        "/cmd/test/3",
        "/src/",
        "/src/some/file.png",
        "/src",
        "/search/",
        "/search/someth!ng+in+ünìcodé",
        "/search/someth!ng+in+ünìcodé/",
        "/user_gopher",
        "/user_gopher/about",
        "/user_gopher/",
        "/files/js/inc/framework.js",
        "/info/gordon/public",
        "/info/gordon/project/go",
        "/info/gordon/project/go/",
        "/doc",
        "/doc/go1.html",
        "/doc/go1.html/",
        "/nope",
        "/cmd//3",
    ];

    fn answers(tree: &Node<&'static str>) -> Vec<(Option<&'static str>, Params, bool)> {
        PROBES
            .iter()
            .map(|probe| {
                let (handler, params, tsr) = tree.lookup(probe).into_parts();
                (handler.copied(), params, tsr)
            })
            .collect()
    }

    #[test]
    fn child_order_does_not_change_answers() {
        let tree = build(ROUTES);
        let mut reversed = tree.clone();
        reverse_children(&mut reversed);
        assert_eq!(answers(&tree), answers(&reversed));
    }

    proptest! {
        #[test]
        fn insertion_order_does_not_change_answers(
            order in Just((0..ROUTES.len()).collect::<Vec<_>>()).prop_shuffle()
        ) {
            let shuffled: Vec<&'static str> = order.iter().map(|&i| ROUTES[i]).collect();
            let tree = build(&shuffled);
            prop_assert_eq!(answers(&tree), answers(&build(ROUTES)));
            prop_assert_eq!(assert_priorities(&tree), ROUTES.len() as u32);
            assert_indices(&tree);
        }

        #[test]
        fn lookups_are_idempotent(probe in "/[a-z_/:.]{0,16}") {
            let tree = build(ROUTES);
            let before = tree.clone();
            let first = tree.lookup(&probe);
            let second = tree.lookup(&probe);
            prop_assert_eq!(first, second);
            prop_assert_eq!(&tree, &before);
        }
    }
}
