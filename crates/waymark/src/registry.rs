//! Broadcasting one navigation to several routers.

use std::sync::Arc;

use futures::future::join_all;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::context::Context;
use crate::error::{Result, RouterError};
use crate::location::Location;
use crate::router::{HistoryMode, NavigateOptions, Router};

/// Handle returned by [`RouterRegistry::register`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RouterId(u64);

/// Per-router results of a broadcast navigation, in registration order.
#[derive(Debug)]
pub struct BroadcastOutcome {
    pub results: Vec<(RouterId, Result<Context>)>,
}

impl BroadcastOutcome {
    /// The result of the earliest registered router that took part.
    pub fn first(&self) -> Option<&Result<Context>> {
        self.results.first().map(|(_, result)| result)
    }

    /// The result for one router, if it took part.
    pub fn get(&self, id: RouterId) -> Option<&Result<Context>> {
        self.results
            .iter()
            .find(|(rid, _)| *rid == id)
            .map(|(_, result)| result)
    }

    /// Whether every participating chain resolved.
    pub fn all_ok(&self) -> bool {
        self.results.iter().all(|(_, result)| result.is_ok())
    }
}

/// An explicit set of routers that observe the same URL space.
///
/// Each router matches independently and runs its own chain; the chains
/// of one navigation run concurrently with each other. History is written
/// once per navigation, by the registry.
#[derive(Default)]
pub struct RouterRegistry {
    routers: Vec<(RouterId, Arc<Router>)>,
    next_id: u64,
    history: Option<Arc<dyn Location>>,
}

impl RouterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry that writes navigations to `history`.
    pub fn with_history(history: Arc<dyn Location>) -> Self {
        Self {
            history: Some(history),
            ..Self::default()
        }
    }

    /// Adds a router to the broadcast set.
    pub fn register(&mut self, router: Arc<Router>) -> RouterId {
        let id = RouterId(self.next_id);
        self.next_id += 1;
        self.routers.push((id, router));
        debug!(?id, "router registered");
        id
    }

    /// Removes a router from the broadcast set.
    pub fn deregister(&mut self, id: RouterId) -> Option<Arc<Router>> {
        let pos = self.routers.iter().position(|(rid, _)| *rid == id)?;
        debug!(?id, "router deregistered");
        Some(self.routers.remove(pos).1)
    }

    pub fn get(&self, id: RouterId) -> Option<&Arc<Router>> {
        self.routers
            .iter()
            .find(|(rid, _)| *rid == id)
            .map(|(_, router)| router)
    }

    pub fn len(&self) -> usize {
        self.routers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routers.is_empty()
    }

    /// Navigates every listening router that matches the URL.
    ///
    /// Routers that are stopped or do not match sit the navigation out. A
    /// router whose matcher fails reports the error in the outcome without
    /// stopping the others. If no router matches and none failed, the
    /// result is [`RouterError::NoMatch`] and history is untouched.
    pub async fn navigate(&self, url: &str, options: NavigateOptions) -> Result<BroadcastOutcome> {
        let mut results = Vec::new();
        let mut participants = Vec::new();

        for (id, router) in &self.routers {
            if !router.is_listening() {
                continue;
            }
            match router.resolve(url) {
                Ok(Some(resolved)) => participants.push((*id, router, resolved)),
                Ok(None) => debug!(?id, url, "router has no matching route"),
                Err(err) => {
                    warn!(?id, url, error = %err, "router failed to match");
                    results.push((*id, Err(err)));
                }
            }
        }

        if participants.is_empty() {
            if results.is_empty() {
                warn!(url, "no router can handle url");
                return Err(RouterError::NoMatch {
                    url: url.to_string(),
                });
            }
            return Ok(BroadcastOutcome { results });
        }

        let state = self.write_history(url, &options);
        info!(url, routers = participants.len(), "broadcasting navigation");

        let runs = participants.into_iter().map(|(id, router, resolved)| {
            let state = state.clone();
            async move { (id, router.dispatch(resolved, state).await) }
        });
        results.extend(join_all(runs).await);
        results.sort_by_key(|(id, _)| *id);

        Ok(BroadcastOutcome { results })
    }

    fn write_history(&self, url: &str, options: &NavigateOptions) -> Option<Value> {
        let Some(history) = &self.history else {
            return options.state.clone();
        };
        match options.history {
            HistoryMode::Push => history.push_state(url, options.state.clone()),
            HistoryMode::Replace => history.replace_state(url, options.state.clone()),
            HistoryMode::Skip => {}
        }
        history.state()
    }
}
