//! # waymark
//!
//! Client-side navigation routing: URL pattern matching with parameter
//! modifiers, ranked route tables, and sequential handler dispatch.
//!
//! This crate provides:
//! - Path pattern matching with required, optional and repeating parameters
//! - Query-string parsing merged into the matched parameters
//! - Route tables from flat lists (ordered) or nested trees (ranked)
//! - Dispatch chains that run handlers in order and stop at the first error
//! - A router with a listening gate, session history and link handling
//! - A registry that broadcasts one navigation to several routers
//!
//! ## Quick Start
//!
//! ```ignore
//! use waymark::{handler_fn, NavigateOptions, RouteDecl, Router};
//!
//! let router = Router::builder()
//!     .routes(vec![
//!         RouteDecl::new("/").name("home"),
//!         RouteDecl::new("/users/:id").handler(handler_fn(|ctx| {
//!             Box::pin(async move {
//!                 println!("user {}", ctx.params.get("id").unwrap_or_default());
//!                 Ok(())
//!             })
//!         })),
//!     ])
//!     .build()?;
//!
//! router.start();
//! router.navigate("/users/42", NavigateOptions::default()).await?;
//! ```
//!
//! ## Pattern Syntax
//!
//! | Pattern          | Matches                                  |
//! |------------------|------------------------------------------|
//! | `/users`         | exactly `/users`                         |
//! | `/users/:id`     | `/users/42`, not `/users`                |
//! | `/users/:id?`    | `/users/42` and `/users` (`id` is empty) |
//! | `/files/:path+`  | `/files/a/b`, not `/files`               |
//! | `/files/:path*`  | `/files/a/b` and `/files`                |
//!
//! Repeating parameters capture the rest of the path, joined by `/`, and
//! must be the last segment of a pattern. Query parameters are merged into
//! the result; a path parameter of the same name takes precedence.
//!
//! ```
//! use waymark::{match_url, MatchOptions};
//!
//! let params = match_url("/files/a/b/c?raw=1", "/files/:rest+", MatchOptions::default())
//!     .unwrap()
//!     .unwrap();
//! assert_eq!(params.get("rest"), Some("a/b/c"));
//! assert_eq!(params.get("raw"), Some("1"));
//! ```
//!
//! ## Route Trees
//!
//! Nested declarations are flattened and ranked: fewer segments first,
//! then shorter patterns.
//!
//! ```ignore
//! let tree = RouteTree::new().route(
//!     "/users",
//!     RouteNode::new().handler(list_users).routes(
//!         RouteTree::new()
//!             .route("/:id", RouteNode::new().handler(show_user))
//!             .route("/new", RouteNode::new().handler(new_user)),
//!     ),
//! );
//! let router = Router::builder().tree(tree).build()?;
//! ```

mod chain;
mod context;
mod error;
mod handler;
mod location;
mod manifest;
mod params;
mod pattern;
mod query;
mod registry;
mod router;
mod table;

pub use chain::{execute, Chain, ChainState};
pub use context::Context;
pub use error::{BoxError, Result, RouterError};
pub use handler::{
    boxed, handler_fn, BoxFuture, BoxHandler, FnHandler, Handler, HandlerResult, LoggingHandler,
    RecordParams,
};
pub use location::{CurrentLocation, HistoryEntry, LinkActivation, Location, MemoryHistory};
pub use manifest::{Manifest, ManifestNode, ManifestRoute, ManifestRoutes};
pub use params::Params;
pub use pattern::{match_url, rank_order, MatchOptions, Modifier, Pattern, Segment};
pub use query::{
    decode_component, encode_component, parse_query, stringify_query, with_query, QueryMap,
    QueryValue,
};
pub use registry::{BroadcastOutcome, RouterId, RouterRegistry};
pub use router::{HistoryMode, NavigateOptions, Navigation, RememberFn, Router, RouterBuilder};
pub use table::{ResolvedRoute, Route, RouteDecl, RouteNode, RouteTable, RouteTree};
