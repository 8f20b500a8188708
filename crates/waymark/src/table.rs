//! Route declarations and the ranked route table.

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::error::{Result, RouterError};
use crate::handler::{BoxHandler, Handler};
use crate::params::Params;
use crate::pattern::{rank_order, MatchOptions, Pattern};

/// A single route definition.
#[derive(Clone)]
pub struct Route {
    /// Path pattern.
    pub pattern: Pattern,
    /// Optional route name for reverse URL lookup.
    pub name: Option<String>,
    /// Handlers run, in order, when the route is dispatched.
    pub handlers: Vec<BoxHandler>,
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("pattern", &self.pattern.as_str())
            .field("name", &self.name)
            .field("handlers", &self.handlers.len())
            .finish()
    }
}

/// A route as declared by the caller, before its pattern is compiled.
#[derive(Clone, Default)]
pub struct RouteDecl {
    pattern: String,
    name: Option<String>,
    handlers: Vec<BoxHandler>,
}

impl RouteDecl {
    /// Declares a route for a pattern.
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            ..Self::default()
        }
    }

    /// Sets the route name.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Appends a handler.
    #[must_use]
    pub fn handler(mut self, handler: impl Handler + 'static) -> Self {
        self.handlers.push(Arc::new(handler));
        self
    }

    /// Compiles the declaration.
    pub fn compile(self) -> Result<Route> {
        Ok(Route {
            pattern: Pattern::parse(&self.pattern)?,
            name: self.name,
            handlers: self.handlers,
        })
    }
}

/// A node of a nested route declaration.
#[derive(Clone, Default)]
pub struct RouteNode {
    name: Option<String>,
    handlers: Vec<BoxHandler>,
    routes: RouteTree,
}

impl RouteNode {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the route name.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Appends a handler.
    #[must_use]
    pub fn handler(mut self, handler: impl Handler + 'static) -> Self {
        self.handlers.push(Arc::new(handler));
        self
    }

    /// Sets the child routes, keyed relative to this node.
    #[must_use]
    pub fn routes(mut self, routes: RouteTree) -> Self {
        self.routes = routes;
        self
    }

    fn declares_route(&self) -> bool {
        self.name.is_some() || !self.handlers.is_empty()
    }
}

/// Nested route declarations keyed by path segment.
///
/// Keys may hold several `/`-joined segments. Declaration order does not
/// imply priority: a flattened tree is ranked.
///
/// # Example
///
/// ```
/// use waymark::{RouteNode, RouteTable, RouteTree};
///
/// let tree = RouteTree::new().route(
///     "/users",
///     RouteNode::new().name("users").routes(
///         RouteTree::new()
///             .route("/:user_id", RouteNode::new().name("user"))
///             .route("/new", RouteNode::new().name("new_user")),
///     ),
/// );
/// let table = RouteTable::from_tree(tree).unwrap();
/// let patterns: Vec<_> = table.iter().map(|r| r.pattern.as_str()).collect();
/// assert_eq!(patterns, ["/users", "/users/new", "/users/:user_id"]);
/// ```
#[derive(Clone, Default)]
pub struct RouteTree {
    entries: Vec<(String, RouteNode)>,
}

impl RouteTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a child node under a key.
    #[must_use]
    pub fn route(mut self, key: impl Into<String>, node: RouteNode) -> Self {
        self.entries.push((key.into(), node));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Flattens the tree into declarations, parents before children.
    fn flatten(self, prefix: &[String], out: &mut Vec<RouteDecl>) -> Result<()> {
        for (key, node) in self.entries {
            let mut path = prefix.to_vec();
            path.extend(
                key.split('/')
                    .filter(|s| !s.is_empty())
                    .map(str::to_string),
            );
            let pattern = format!("/{}", path.join("/"));

            if !node.declares_route() && node.routes.is_empty() {
                return Err(RouterError::MisconfiguredRoute(format!(
                    "route `{pattern}` declares no name, handlers or child routes"
                )));
            }

            if node.declares_route() {
                out.push(RouteDecl {
                    pattern,
                    name: node.name,
                    handlers: node.handlers,
                });
            }
            node.routes.flatten(&path, out)?;
        }
        Ok(())
    }
}

/// A route matched against a URL.
#[derive(Debug, Clone)]
pub struct ResolvedRoute {
    /// The matched route.
    pub route: Arc<Route>,
    /// The URL that was matched.
    pub url: String,
    /// Path and query parameters.
    pub params: Params,
}

/// Routes in the order they are tried.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: Vec<Arc<Route>>,
    fallback: Option<Arc<Route>>,
}

impl RouteTable {
    /// Builds a table from a flat list, keeping the caller's order.
    pub fn from_list(decls: Vec<RouteDecl>) -> Result<Self> {
        let routes = decls
            .into_iter()
            .map(|d| d.compile().map(Arc::new))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            routes,
            fallback: None,
        })
    }

    /// Builds a table from a nested tree, ranked most specific first.
    ///
    /// Routes of equal rank and pattern length keep declaration order.
    pub fn from_tree(tree: RouteTree) -> Result<Self> {
        let mut decls = Vec::new();
        tree.flatten(&[], &mut decls)?;
        let mut table = Self::from_list(decls)?;
        table
            .routes
            .sort_by(|a, b| rank_order(&a.pattern, &b.pattern));
        Ok(table)
    }

    /// Sets a route that is matched leniently when nothing else matches.
    pub fn with_fallback(mut self, decl: RouteDecl) -> Result<Self> {
        self.fallback = Some(Arc::new(decl.compile()?));
        Ok(self)
    }

    /// Returns the first route whose pattern matches the URL.
    ///
    /// This is a linear scan in table order. Malformed percent-encoding in
    /// the URL is an error, not a miss.
    pub fn find_first_match(&self, url: &str) -> Result<Option<ResolvedRoute>> {
        for route in &self.routes {
            if let Some(params) = route.pattern.matches(url, MatchOptions::default())? {
                debug!(url, pattern = %route.pattern, "route matched");
                return Ok(Some(ResolvedRoute {
                    route: Arc::clone(route),
                    url: url.to_string(),
                    params,
                }));
            }
        }

        if let Some(fallback) = &self.fallback {
            let params = fallback
                .pattern
                .matches(url, MatchOptions::lenient())?
                .unwrap_or_default();
            debug!(url, pattern = %fallback.pattern, "fallback route matched");
            return Ok(Some(ResolvedRoute {
                route: Arc::clone(fallback),
                url: url.to_string(),
                params,
            }));
        }

        debug!(url, "no route matched");
        Ok(None)
    }

    /// Generates a URL for a named route.
    pub fn url_for(&self, name: &str, params: &Params) -> Option<String> {
        self.iter()
            .find(|r| r.name.as_deref() == Some(name))
            .and_then(|r| r.pattern.reverse(params))
    }

    /// Iterates routes in match order.
    pub fn iter(&self) -> impl Iterator<Item = &Route> {
        self.routes.iter().map(|r| &**r)
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::LoggingHandler;

    fn patterns(table: &RouteTable) -> Vec<&str> {
        table.iter().map(|r| r.pattern.as_str()).collect()
    }

    #[test]
    fn test_flat_list_keeps_order() {
        let table = RouteTable::from_list(vec![
            RouteDecl::new("/users/:id"),
            RouteDecl::new("/users/new"),
        ])
        .unwrap();
        assert_eq!(patterns(&table), ["/users/:id", "/users/new"]);

        let resolved = table.find_first_match("/users/new").unwrap().unwrap();
        assert_eq!(resolved.route.pattern.as_str(), "/users/:id");
        assert_eq!(resolved.params.get("id"), Some("new"));
    }

    #[test]
    fn test_tree_is_ranked() {
        let tree = RouteTree::new()
            .route("/a/:id", RouteNode::new().name("param"))
            .route("/a/bb", RouteNode::new().name("literal"))
            .route("/", RouteNode::new().name("home"))
            .route("/a/b/c", RouteNode::new().name("deep"));
        let table = RouteTable::from_tree(tree).unwrap();
        assert_eq!(patterns(&table), ["/", "/a/bb", "/a/:id", "/a/b/c"]);
    }

    #[test]
    fn test_tree_prefixes_children() {
        let tree = RouteTree::new().route(
            "/api/v1",
            RouteNode::new().routes(
                RouteTree::new()
                    .route("users", RouteNode::new().handler(LoggingHandler))
                    .route(
                        "/users/:id/",
                        RouteNode::new()
                            .name("user")
                            .routes(RouteTree::new().route("posts", RouteNode::new().name("posts"))),
                    ),
            ),
        );
        let table = RouteTable::from_tree(tree).unwrap();
        assert_eq!(
            patterns(&table),
            ["/api/v1/users", "/api/v1/users/:id", "/api/v1/users/:id/posts"]
        );
        assert_eq!(table.iter().next().unwrap().handlers.len(), 1);
    }

    #[test]
    fn test_tree_node_without_anything_is_misconfigured() {
        let tree = RouteTree::new().route("/empty", RouteNode::new());
        assert!(matches!(
            RouteTable::from_tree(tree),
            Err(RouterError::MisconfiguredRoute(_))
        ));
    }

    #[test]
    fn test_invalid_pattern_fails_construction() {
        let result = RouteTable::from_list(vec![RouteDecl::new("/a/:x*/:y*")]);
        assert!(matches!(result, Err(RouterError::InvalidPattern { .. })));
    }

    #[test]
    fn test_no_match() {
        let table = RouteTable::from_list(vec![RouteDecl::new("/users")]).unwrap();
        assert!(table.find_first_match("/posts").unwrap().is_none());
    }

    #[test]
    fn test_decode_error_is_not_a_miss() {
        let table = RouteTable::from_list(vec![RouteDecl::new("/users/:id")]).unwrap();
        assert!(matches!(
            table.find_first_match("/users/%zz"),
            Err(RouterError::Decode { .. })
        ));
    }

    #[test]
    fn test_fallback_is_lenient() {
        let table = RouteTable::from_list(vec![RouteDecl::new("/users/:id")])
            .unwrap()
            .with_fallback(RouteDecl::new("/:section/:page").name("not_found"))
            .unwrap();

        let resolved = table.find_first_match("/docs?lang=en").unwrap().unwrap();
        assert_eq!(resolved.route.name.as_deref(), Some("not_found"));
        assert_eq!(resolved.params.get("section"), Some("docs"));
        assert_eq!(resolved.params.get("lang"), Some("en"));
        assert_eq!(resolved.params.get("page"), None);
    }

    #[test]
    fn test_url_for() {
        let table = RouteTable::from_list(vec![RouteDecl::new("/users/:id").name("user_detail")])
            .unwrap();
        let params: Params = [("id", "42")].into_iter().collect();
        assert_eq!(table.url_for("user_detail", &params), Some("/users/42".to_string()));
        assert_eq!(table.url_for("missing", &params), None);
    }
}
