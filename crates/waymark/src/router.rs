//! Main router implementation.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use arc_swap::ArcSwapOption;
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::chain::Chain;
use crate::context::Context;
use crate::error::{Result, RouterError};
use crate::handler::{BoxHandler, Handler};
use crate::location::{CurrentLocation, LinkActivation, Location};
use crate::params::Params;
use crate::pattern::split_url;
use crate::query::{parse_query, with_query, QueryMap};
use crate::table::{ResolvedRoute, RouteDecl, RouteTable, RouteTree};

/// How a navigation is written to session history.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HistoryMode {
    /// Add a new history entry.
    #[default]
    Push,
    /// Overwrite the current entry.
    Replace,
    /// Leave history alone (e.g. the entry already changed).
    Skip,
}

/// Options for a single navigation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NavigateOptions {
    pub history: HistoryMode,
    /// Dispatch even if the URL equals the current route's URL.
    pub reload: bool,
    /// State attached to the new history entry.
    pub state: Option<Value>,
}

impl NavigateOptions {
    /// Options that replace the current history entry.
    pub fn replace() -> Self {
        Self {
            history: HistoryMode::Replace,
            ..Self::default()
        }
    }

    /// Sets the history mode.
    #[must_use]
    pub fn history(mut self, mode: HistoryMode) -> Self {
        self.history = mode;
        self
    }

    /// Forces dispatch for an unchanged URL.
    #[must_use]
    pub fn reload(mut self) -> Self {
        self.reload = true;
        self
    }

    /// Sets the history state.
    #[must_use]
    pub fn state(mut self, state: Value) -> Self {
        self.state = Some(state);
        self
    }
}

/// Outcome of a navigation attempt that did not fail.
#[derive(Debug, Clone, PartialEq)]
pub enum Navigation {
    /// The router is not listening; nothing happened.
    Stopped,
    /// The URL is already the current route; nothing happened.
    Unchanged,
    /// The chain resolved with this context.
    Completed(Box<Context>),
}

impl Navigation {
    /// Returns the resolved context of a completed navigation.
    pub fn context(&self) -> Option<&Context> {
        match self {
            Self::Completed(ctx) => Some(ctx),
            _ => None,
        }
    }

    /// Consumes the outcome, returning the resolved context if any.
    pub fn into_context(self) -> Option<Context> {
        match self {
            Self::Completed(ctx) => Some(*ctx),
            _ => None,
        }
    }
}

/// Callback returning data to keep on the current history entry before a
/// new entry is pushed, such as a scroll position.
pub type RememberFn = Arc<dyn Fn() -> Map<String, Value> + Send + Sync>;

/// Collects route declarations and router-wide handlers.
#[derive(Default)]
pub struct RouterBuilder {
    routes: Option<Vec<RouteDecl>>,
    tree: Option<RouteTree>,
    fallback: Option<RouteDecl>,
    root: Option<String>,
    before: Vec<BoxHandler>,
    after: Vec<BoxHandler>,
    history: Option<Arc<dyn Location>>,
    remember: Option<RememberFn>,
}

impl RouterBuilder {
    /// Declares routes as a flat list, tried in the given order.
    #[must_use]
    pub fn routes(mut self, routes: Vec<RouteDecl>) -> Self {
        self.routes = Some(routes);
        self
    }

    /// Declares routes as a nested tree, ranked most specific first.
    #[must_use]
    pub fn tree(mut self, tree: RouteTree) -> Self {
        self.tree = Some(tree);
        self
    }

    /// Sets a fallback route matched leniently when nothing else matches.
    #[must_use]
    pub fn fallback(mut self, route: RouteDecl) -> Self {
        self.fallback = Some(route);
        self
    }

    /// Sets a path prefix stripped from URLs before matching.
    #[must_use]
    pub fn root(mut self, root: impl Into<String>) -> Self {
        self.root = Some(root.into());
        self
    }

    /// Adds a handler run before every route's own handlers.
    #[must_use]
    pub fn before(mut self, handler: impl Handler + 'static) -> Self {
        self.before.push(Arc::new(handler));
        self
    }

    /// Adds a handler run after every route's own handlers.
    #[must_use]
    pub fn after(mut self, handler: impl Handler + 'static) -> Self {
        self.after.push(Arc::new(handler));
        self
    }

    /// Attaches the session history navigations are written to.
    #[must_use]
    pub fn history(mut self, history: Arc<dyn Location>) -> Self {
        self.history = Some(history);
        self
    }

    /// Sets a callback whose data is merged into the current entry's state
    /// before each push, so it is there again when the user goes back.
    #[must_use]
    pub fn remember<F>(mut self, remember: F) -> Self
    where
        F: Fn() -> Map<String, Value> + Send + Sync + 'static,
    {
        self.remember = Some(Arc::new(remember));
        self
    }

    /// Builds the router. Declaring no routes at all, or both a list and
    /// a tree, is a configuration error.
    pub fn build(self) -> Result<Router> {
        let table = match (self.routes, self.tree) {
            (Some(list), None) => RouteTable::from_list(list)?,
            (None, Some(tree)) => RouteTable::from_tree(tree)?,
            (None, None) => {
                return Err(RouterError::MisconfiguredRoute(
                    "no routes declared".to_string(),
                ))
            }
            (Some(_), Some(_)) => {
                return Err(RouterError::MisconfiguredRoute(
                    "routes declared both as a list and as a tree".to_string(),
                ))
            }
        };
        let table = match self.fallback {
            Some(fallback) => table.with_fallback(fallback)?,
            None => table,
        };

        debug!(routes = table.len(), "router built");
        Ok(Router {
            table,
            root: self
                .root
                .map(|r| r.trim_end_matches('/').to_string())
                .filter(|r| !r.is_empty()),
            before: self.before,
            after: self.after,
            history: self.history,
            remember: self.remember,
            listening: AtomicBool::new(false),
            current: ArcSwapOption::empty(),
        })
    }
}

/// Matches URLs against a route table and dispatches the matched route.
///
/// A router starts stopped; navigations are ignored until [`Router::start`].
///
/// # Example
///
/// ```
/// use waymark::{handler_fn, NavigateOptions, RouteDecl, Router};
///
/// # tokio_test::block_on(async {
/// let router = Router::builder()
///     .routes(vec![RouteDecl::new("/users/:id").handler(handler_fn(|ctx| {
///         Box::pin(async move {
///             let id = ctx.params.get("id").unwrap_or_default().to_string();
///             ctx.data.insert("user".into(), id.into());
///             Ok(())
///         })
///     }))])
///     .build()
///     .unwrap();
/// router.start();
///
/// let nav = router.navigate("/users/42", NavigateOptions::default()).await.unwrap();
/// assert_eq!(nav.context().unwrap().data["user"], "42");
/// # });
/// ```
pub struct Router {
    table: RouteTable,
    root: Option<String>,
    before: Vec<BoxHandler>,
    after: Vec<BoxHandler>,
    history: Option<Arc<dyn Location>>,
    remember: Option<RememberFn>,
    listening: AtomicBool,
    current: ArcSwapOption<ResolvedRoute>,
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("routes", &self.table.len())
            .field("root", &self.root)
            .field("before", &self.before.len())
            .field("after", &self.after.len())
            .field("history", &self.history.is_some())
            .field("listening", &self.is_listening())
            .finish_non_exhaustive()
    }
}

impl Router {
    pub fn builder() -> RouterBuilder {
        RouterBuilder::default()
    }

    /// Starts reacting to navigations.
    pub fn start(&self) {
        self.listening.store(true, Ordering::SeqCst);
        info!(routes = self.table.len(), "router started");
    }

    /// Stops reacting to navigations. Pending chains are not cancelled.
    pub fn stop(&self) {
        self.listening.store(false, Ordering::SeqCst);
        info!("router stopped");
    }

    pub fn is_listening(&self) -> bool {
        self.listening.load(Ordering::SeqCst)
    }

    /// Returns the route table in match order.
    pub fn table(&self) -> &RouteTable {
        &self.table
    }

    /// Returns the route of the last successful navigation.
    pub fn current_route(&self) -> Option<Arc<ResolvedRoute>> {
        self.current.load_full()
    }

    /// Finds the first route matching the URL, after stripping the root
    /// prefix. URLs outside the root resolve to `None`.
    pub fn resolve(&self, url: &str) -> Result<Option<ResolvedRoute>> {
        let Some(relative) = self.strip_root(url) else {
            debug!(url, root = ?self.root, "url outside router root");
            return Ok(None);
        };
        Ok(self.table.find_first_match(relative)?.map(|mut resolved| {
            resolved.url = url.to_string();
            resolved
        }))
    }

    /// Whether the router is listening and some route matches the URL.
    pub fn can_route(&self, url: &str) -> Result<bool> {
        Ok(self.is_listening() && self.resolve(url)?.is_some())
    }

    /// Generates a URL for a named route, including the root prefix.
    pub fn url_for(&self, name: &str, params: &Params) -> Option<String> {
        let path = self.table.url_for(name, params)?;
        Some(match &self.root {
            Some(root) => format!("{}{path}", root.trim_end_matches('/')),
            None => path,
        })
    }

    /// Navigates to a URL.
    ///
    /// The listening gate is checked first; a stopped router returns
    /// [`Navigation::Stopped`]. An unmatched URL is
    /// [`RouterError::NoMatch`]. Otherwise history is written once and the
    /// chain `before + route handlers + after` runs over a fresh context.
    pub async fn navigate(&self, url: &str, options: NavigateOptions) -> Result<Navigation> {
        if !self.is_listening() {
            debug!(url, "router stopped, navigation ignored");
            return Ok(Navigation::Stopped);
        }

        if !options.reload && self.current.load_full().is_some_and(|c| c.url == url) {
            debug!(url, "already at url");
            return Ok(Navigation::Unchanged);
        }

        let Some(resolved) = self.resolve(url)? else {
            warn!(url, "no matching route");
            return Err(RouterError::NoMatch {
                url: url.to_string(),
            });
        };

        let state = self.write_history(url, &options);
        let ctx = self.dispatch(resolved, state).await?;
        Ok(Navigation::Completed(Box::new(ctx)))
    }

    /// Navigates to a URL assembled from parts.
    ///
    /// A query without a path keeps the current path; a path without a
    /// query keeps the current search string. The current location comes
    /// from history, or from the current route when there is none.
    pub async fn navigate_to(
        &self,
        path: Option<&str>,
        query: Option<&QueryMap>,
        options: NavigateOptions,
    ) -> Result<Navigation> {
        let url = url_from_parts(&self.current_location(), path, query);
        self.navigate(&url, options).await
    }

    /// Re-dispatches the history's current location without writing
    /// history, as after the user moves through history.
    pub async fn navigate_current(&self) -> Result<Navigation> {
        let Some(history) = &self.history else {
            return Err(RouterError::MisconfiguredRoute(
                "no history attached to router".to_string(),
            ));
        };
        let url = history.current().url();
        self.navigate(&url, NavigateOptions::default().history(HistoryMode::Skip).reload())
            .await
    }

    /// Handles a link click.
    ///
    /// Returns `None` when the click is left to the browser: the link is
    /// filtered out or no route matches it.
    pub async fn activate_link(&self, link: &LinkActivation) -> Result<Option<Navigation>> {
        let Some(href) = link.routable_href() else {
            return Ok(None);
        };
        if !self.can_route(href)? {
            debug!(href, "link not routable, ceding to browser");
            return Ok(None);
        }
        self.navigate(href, NavigateOptions::default()).await.map(Some)
    }

    /// Runs the chain for an already resolved route and, on success,
    /// makes it the current route.
    pub async fn dispatch(&self, resolved: ResolvedRoute, state: Option<Value>) -> Result<Context> {
        let (_, query) = split_url(&resolved.url);
        let ctx = Context::new(resolved.url.clone())
            .with_params(resolved.params.clone())
            .with_query(parse_query(query.unwrap_or_default())?)
            .with_state(state);

        let mut chain = Chain::compose(&self.before, &resolved.route.handlers, &self.after);
        let ctx = chain.execute(ctx).await?;

        info!(url = %resolved.url, pattern = %resolved.route.pattern, "navigation complete");
        self.current.store(Some(Arc::new(resolved)));
        Ok(ctx)
    }

    /// Returns the part of `url` below the root, if it is under the root.
    fn strip_root<'a>(&self, url: &'a str) -> Option<&'a str> {
        let Some(root) = &self.root else {
            return Some(url);
        };
        let rest = url.strip_prefix(root.as_str())?;
        (rest.is_empty() || rest.starts_with(['/', '?', '#'])).then_some(rest)
    }

    fn current_location(&self) -> CurrentLocation {
        match (&self.history, self.current.load_full()) {
            (Some(history), _) => history.current(),
            (None, Some(current)) => CurrentLocation::from_url(&current.url),
            (None, None) => CurrentLocation::from_url("/"),
        }
    }

    /// Writes the navigation to history and returns the state the context
    /// should see.
    fn write_history(&self, url: &str, options: &NavigateOptions) -> Option<Value> {
        let Some(history) = &self.history else {
            return options.state.clone();
        };
        match options.history {
            HistoryMode::Push => {
                self.remember_current(history.as_ref());
                history.push_state(url, options.state.clone());
            }
            HistoryMode::Replace => history.replace_state(url, options.state.clone()),
            HistoryMode::Skip => {}
        }
        history.state()
    }

    /// Merges the remember callback's data into the current entry's state.
    fn remember_current(&self, history: &dyn Location) {
        let Some(remember) = &self.remember else {
            return;
        };
        let data = remember();
        if data.is_empty() {
            return;
        }
        let mut state = match history.state() {
            Some(Value::Object(state)) => state,
            _ => Map::new(),
        };
        state.extend(data);
        history.replace_state(&history.current().url(), Some(Value::Object(state)));
    }
}

/// Builds a URL from optional parts, filling the missing ones from the
/// current location.
fn url_from_parts(current: &CurrentLocation, path: Option<&str>, query: Option<&QueryMap>) -> String {
    let path = path.unwrap_or(&current.path);
    match query {
        Some(query) => with_query(path, query),
        None => format!("{path}{}", current.search),
    }
}
