//! Radix tree node implementation.
//!
//! Each node represents one path segment. Nodes at route boundaries hold the
//! endpoints registered for that path: one entry per route, each with the
//! method set the route accepts and the parameter names of its own pattern.
//!
//! Parameter nodes are shared between patterns with the same shape, so
//! `/users/{id}` and `/users/{userId}/posts` walk the same node. Values are
//! therefore captured by position and only named once an endpoint accepts.

use fratily_core::{Fault, FaultResult, Params};
use http::Method;

use crate::method::MethodSet;

/// Type of path segment in the radix tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SegmentKind {
    /// Static path segment (e.g., "users", "api")
    Static,
    /// Named parameter (e.g., "{id}", "{userId}")
    Param(String),
    /// Catch-all wildcard (e.g., "*path")
    Wildcard(String),
}

/// A route registered at a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    /// Methods the route accepts.
    pub methods: MethodSet,
    /// Index of the route in the router's route table.
    pub route: usize,
    /// Parameter and wildcard names in pattern order.
    pub params: Vec<String>,
}

/// Result of walking the tree for one path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathMatch {
    /// A route accepts the method.
    Found {
        /// Index of the matched route.
        route: usize,
        /// Extracted parameters.
        params: Params,
    },
    /// The path matched but no route accepts the method.
    MethodNotAllowed(MethodSet),
    /// No pattern matches the path.
    NotFound,
}

/// A node in the radix tree.
#[derive(Debug, Clone)]
pub struct Node {
    /// The path segment this node represents
    pub segment: String,

    /// The kind of segment (static, param, or wildcard)
    pub kind: SegmentKind,

    /// Routes ending at this node
    pub endpoints: Vec<Endpoint>,

    /// Static children, sorted by segment for binary search
    pub static_children: Vec<Node>,

    /// Parameter child (at most one per node)
    pub param_child: Option<Box<Node>>,

    /// Wildcard child (at most one per node, must be leaf)
    pub wildcard_child: Option<Box<Node>>,
}

impl Node {
    fn with_kind(segment: String, kind: SegmentKind) -> Self {
        Self {
            segment,
            kind,
            endpoints: Vec::new(),
            static_children: Vec::new(),
            param_child: None,
            wildcard_child: None,
        }
    }

    /// Creates a new static node.
    #[must_use]
    pub fn new_static(segment: impl Into<String>) -> Self {
        Self::with_kind(segment.into(), SegmentKind::Static)
    }

    /// Creates a new parameter node.
    #[must_use]
    pub fn new_param(name: impl Into<String>) -> Self {
        let name = name.into();
        Self::with_kind(format!("{{{name}}}"), SegmentKind::Param(name))
    }

    /// Creates a new wildcard node.
    #[must_use]
    pub fn new_wildcard(name: impl Into<String>) -> Self {
        let name = name.into();
        Self::with_kind(format!("*{name}"), SegmentKind::Wildcard(name))
    }

    /// Creates a root node for the tree.
    #[must_use]
    pub fn root() -> Self {
        Self::new_static("")
    }

    /// Inserts a route into the tree.
    ///
    /// # Errors
    ///
    /// Returns [`Fault::InvalidRoute`] when the pattern is malformed.
    pub fn insert(&mut self, pattern: &str, methods: MethodSet, route: usize) -> FaultResult<()> {
        let segments = parse_pattern(pattern)?;
        let params = segments
            .iter()
            .filter_map(|(_, kind)| match kind {
                SegmentKind::Static => None,
                SegmentKind::Param(name) | SegmentKind::Wildcard(name) => Some(name.clone()),
            })
            .collect();
        self.insert_segments(
            &segments,
            Endpoint {
                methods,
                route,
                params,
            },
        );
        Ok(())
    }

    fn insert_segments(&mut self, segments: &[(String, SegmentKind)], endpoint: Endpoint) {
        let Some(((segment, kind), remaining)) = segments.split_first() else {
            self.endpoints.push(endpoint);
            return;
        };

        let child: &mut Node = match kind {
            SegmentKind::Static => {
                match self
                    .static_children
                    .binary_search_by(|c| c.segment.as_str().cmp(segment))
                {
                    Ok(index) => &mut self.static_children[index],
                    Err(index) => {
                        self.static_children.insert(index, Node::new_static(segment));
                        &mut self.static_children[index]
                    }
                }
            }
            SegmentKind::Param(name) => self
                .param_child
                .get_or_insert_with(|| Box::new(Node::new_param(name))),
            SegmentKind::Wildcard(name) => self
                .wildcard_child
                .get_or_insert_with(|| Box::new(Node::new_wildcard(name))),
        };
        child.insert_segments(remaining, endpoint);
    }

    /// Matches a method and path against the tree.
    ///
    /// Static segments take priority over parameters, which take priority
    /// over wildcards. When a path matches but none of the routes found
    /// along the way accept the method, the union of their methods is
    /// returned.
    #[must_use]
    pub fn match_path(&self, method: &Method, path: &str) -> PathMatch {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let mut values = Vec::new();
        let mut allowed = MethodSet::EMPTY;

        match self.match_segments(method, &segments, &mut values, &mut allowed) {
            Some(endpoint) => {
                let mut params = Params::new();
                for (name, value) in endpoint.params.iter().zip(values) {
                    params.push(name.clone(), value);
                }
                PathMatch::Found {
                    route: endpoint.route,
                    params,
                }
            }
            None if allowed.is_empty() => PathMatch::NotFound,
            None => PathMatch::MethodNotAllowed(allowed),
        }
    }

    fn accept(&self, method: &Method, allowed: &mut MethodSet) -> Option<&Endpoint> {
        for endpoint in &self.endpoints {
            if endpoint.methods.contains(method) {
                return Some(endpoint);
            }
            *allowed |= endpoint.methods;
        }
        None
    }

    fn match_segments(
        &self,
        method: &Method,
        segments: &[&str],
        values: &mut Vec<String>,
        allowed: &mut MethodSet,
    ) -> Option<&Endpoint> {
        let Some((segment, remaining)) = segments.split_first() else {
            return self.accept(method, allowed);
        };

        if let Some(child) = self.find_static_child(segment) {
            if let Some(endpoint) = child.match_segments(method, remaining, values, allowed) {
                return Some(endpoint);
            }
        }

        if let Some(child) = &self.param_child {
            let mark = values.len();
            values.push((*segment).to_string());
            if let Some(endpoint) = child.match_segments(method, remaining, values, allowed) {
                return Some(endpoint);
            }
            values.truncate(mark);
        }

        if let Some(child) = &self.wildcard_child {
            let mark = values.len();
            values.push(segments.join("/"));
            if let Some(endpoint) = child.accept(method, allowed) {
                return Some(endpoint);
            }
            values.truncate(mark);
        }

        None
    }

    /// Finds a static child by segment using binary search.
    fn find_static_child(&self, segment: &str) -> Option<&Node> {
        self.static_children
            .binary_search_by(|c| c.segment.as_str().cmp(segment))
            .ok()
            .map(|i| &self.static_children[i])
    }
}

impl Default for Node {
    fn default() -> Self {
        Self::root()
    }
}

/// Parses a path pattern into segments.
///
/// # Errors
///
/// Returns [`Fault::InvalidRoute`] when a parameter or wildcard has no
/// name, a parameter name repeats, or a wildcard is not the last segment.
pub fn parse_pattern(pattern: &str) -> FaultResult<Vec<(String, SegmentKind)>> {
    let raw: Vec<&str> = pattern.split('/').filter(|s| !s.is_empty()).collect();
    let mut segments = Vec::with_capacity(raw.len());
    let mut names: Vec<&str> = Vec::new();

    for (index, s) in raw.iter().enumerate() {
        let kind = if let Some(name) = s.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
            if name.is_empty() {
                return Err(Fault::invalid_route(format!("empty parameter name in `{pattern}`")));
            }
            if names.contains(&name) {
                return Err(Fault::invalid_route(format!(
                    "parameter `{name}` appears twice in `{pattern}`"
                )));
            }
            names.push(name);
            SegmentKind::Param(name.to_string())
        } else if let Some(name) = s.strip_prefix('*') {
            if name.is_empty() {
                return Err(Fault::invalid_route(format!("empty wildcard name in `{pattern}`")));
            }
            if index + 1 != raw.len() {
                return Err(Fault::invalid_route(format!(
                    "wildcard must be the last segment in `{pattern}`"
                )));
            }
            SegmentKind::Wildcard(name.to_string())
        } else {
            SegmentKind::Static
        };
        segments.push(((*s).to_string(), kind));
    }

    Ok(segments)
}
