//! JSON route manifests.
//!
//! A manifest declares routes without handlers, for tools that inspect or
//! dry-run a route table:
//!
//! ```json
//! {
//!   "root": "/app",
//!   "routes": {
//!     "/users": {
//!       "name": "users",
//!       "routes": { "/:id": { "name": "user" } }
//!     }
//!   }
//! }
//! ```
//!
//! `routes` may also be a list of `{ "pattern": ..., "name": ... }`
//! objects, which keeps its order. Tree keys keep the order they are
//! written in, which breaks ties between equally ranked routes.

use std::path::Path;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{Result, RouterError};
use crate::router::RouterBuilder;
use crate::table::{RouteDecl, RouteNode, RouteTree};

/// A flat route entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ManifestRoute {
    pub pattern: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// A node of a nested route tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ManifestNode {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub routes: Option<IndexMap<String, ManifestNode>>,
}

/// Either declaration shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ManifestRoutes {
    List(Vec<ManifestRoute>),
    Tree(IndexMap<String, ManifestNode>),
}

/// A parsed route manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    /// Prefix stripped from URLs before matching.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub routes: Option<ManifestRoutes>,
    /// Route matched leniently when nothing else matches.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback: Option<ManifestRoute>,
}

impl Manifest {
    /// Reads and parses a manifest file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        std::fs::read_to_string(path)?.parse()
    }

    /// Turns the manifest into a router builder with no handlers attached.
    pub fn into_builder(self) -> Result<RouterBuilder> {
        let mut builder = match self.routes {
            Some(ManifestRoutes::List(list)) => {
                RouterBuilder::default().routes(list.into_iter().map(decl_from).collect())
            }
            Some(ManifestRoutes::Tree(tree)) => RouterBuilder::default().tree(tree_from(tree)),
            None => {
                return Err(RouterError::MisconfiguredRoute(
                    "manifest has no `routes` table".to_string(),
                ))
            }
        };
        if let Some(root) = self.root {
            builder = builder.root(root);
        }
        if let Some(fallback) = self.fallback {
            builder = builder.fallback(decl_from(fallback));
        }
        Ok(builder)
    }
}

impl FromStr for Manifest {
    type Err = RouterError;

    /// Parses a manifest. Route names must be unique.
    fn from_str(s: &str) -> Result<Self> {
        let manifest: Self = serde_json::from_str(s)?;

        let mut names = Vec::new();
        match &manifest.routes {
            Some(ManifestRoutes::List(list)) => {
                names.extend(list.iter().filter_map(|r| r.name.as_deref()));
            }
            Some(ManifestRoutes::Tree(tree)) => collect_names(tree, &mut names),
            None => {}
        }
        names.sort_unstable();
        if let Some(pair) = names.windows(2).find(|pair| pair[0] == pair[1]) {
            return Err(RouterError::Manifest(format!(
                "route name `{}` is declared more than once",
                pair[0]
            )));
        }

        Ok(manifest)
    }
}

fn collect_names<'a>(tree: &'a IndexMap<String, ManifestNode>, names: &mut Vec<&'a str>) {
    for node in tree.values() {
        names.extend(node.name.as_deref());
        if let Some(children) = &node.routes {
            collect_names(children, names);
        }
    }
}

fn decl_from(route: ManifestRoute) -> RouteDecl {
    let decl = RouteDecl::new(route.pattern);
    match route.name {
        Some(name) => decl.name(name),
        None => decl,
    }
}

fn tree_from(nodes: IndexMap<String, ManifestNode>) -> RouteTree {
    nodes.into_iter().fold(RouteTree::new(), |tree, (key, node)| {
        let mut route = RouteNode::new();
        if let Some(name) = node.name {
            route = route.name(name);
        }
        if let Some(children) = node.routes {
            route = route.routes(tree_from(children));
        }
        tree.route(key, route)
    })
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn patterns(manifest: &str) -> Result<Vec<String>> {
        let router = manifest.parse::<Manifest>()?.into_builder()?.build()?;
        Ok(router
            .table()
            .iter()
            .map(|r| r.pattern.as_str().to_string())
            .collect())
    }

    #[test]
    fn test_tree_manifest() {
        let patterns = patterns(
            r#"{
                "routes": {
                    "/users": {
                        "name": "users",
                        "routes": {
                            "/:user_id": { "name": "user" },
                            "/new": { "name": "new_user" }
                        }
                    },
                    "/": { "name": "home" }
                }
            }"#,
        )
        .unwrap();
        assert_eq!(patterns, ["/", "/users", "/users/new", "/users/:user_id"]);
    }

    #[test]
    fn test_tree_ties_keep_key_order() {
        let patterns = patterns(
            r#"{ "routes": {
                "/zz/:id": { "name": "z" },
                "/aa/:id": { "name": "a" },
                "/mm/:id": { "name": "m" }
            } }"#,
        )
        .unwrap();
        assert_eq!(patterns, ["/zz/:id", "/aa/:id", "/mm/:id"]);
    }

    #[test]
    fn test_list_manifest_keeps_order() {
        let patterns = patterns(
            r#"{ "routes": [
                { "pattern": "/users/:id", "name": "user" },
                { "pattern": "/users/new" }
            ] }"#,
        )
        .unwrap();
        assert_eq!(patterns, ["/users/:id", "/users/new"]);
    }

    #[test]
    fn test_missing_routes_is_misconfigured() {
        let err = patterns(r#"{ "root": "/app" }"#).unwrap_err();
        assert!(matches!(err, RouterError::MisconfiguredRoute(_)));
    }

    #[test]
    fn test_empty_tree_node_is_misconfigured() {
        let err = patterns(r#"{ "routes": { "/lonely": {} } }"#).unwrap_err();
        assert!(matches!(err, RouterError::MisconfiguredRoute(_)));
    }

    #[test]
    fn test_duplicate_names_are_rejected() {
        let err = patterns(
            r#"{ "routes": {
                "/a": { "name": "page" },
                "/b": { "routes": { "/c": { "name": "page" } } }
            } }"#,
        )
        .unwrap_err();
        assert!(matches!(err, RouterError::Manifest(_)));

        let err = patterns(
            r#"{ "routes": [ { "pattern": "/a", "name": "x" }, { "pattern": "/b", "name": "x" } ] }"#,
        )
        .unwrap_err();
        assert!(matches!(err, RouterError::Manifest(_)));
    }

    #[test]
    fn test_syntax_error() {
        let err = patterns(r#"{ "routes": "#).unwrap_err();
        assert!(matches!(err, RouterError::Json(_)));
        let err = patterns(r#"{ "routes": [], "extra": 1 }"#).unwrap_err();
        assert!(matches!(err, RouterError::Json(_)));
    }

    #[test]
    fn test_root_and_fallback() {
        let manifest: Manifest = r#"{
            "root": "/app",
            "routes": [ { "pattern": "/docs/:page", "name": "doc" } ],
            "fallback": { "pattern": "/:section", "name": "not_found" }
        }"#
        .parse()
        .unwrap();
        let router = manifest.into_builder().unwrap().build().unwrap();

        let doc = router.resolve("/app/docs/intro").unwrap().unwrap();
        assert_eq!(doc.route.name.as_deref(), Some("doc"));
        let lost = router.resolve("/app/elsewhere/deep").unwrap().unwrap();
        assert_eq!(lost.route.name.as_deref(), Some("not_found"));
        assert_eq!(lost.params.get("section"), Some("elsewhere"));
    }

    #[test]
    fn test_from_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "routes": [ {{ "pattern": "/" }} ] }}"#).unwrap();

        let manifest = Manifest::from_path(file.path()).unwrap();
        assert_eq!(
            manifest.routes,
            Some(ManifestRoutes::List(vec![ManifestRoute {
                pattern: "/".into(),
                name: None
            }]))
        );

        let missing = Manifest::from_path(file.path().with_extension("missing"));
        assert!(matches!(missing, Err(RouterError::Io(_))));
    }
}
