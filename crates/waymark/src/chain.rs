//! Sequential handler dispatch.
//!
//! A [`Chain`] drives an ordered list of handlers over one [`Context`].
//! Handler `i + 1` never starts before handler `i` has returned `Ok`, and
//! the first error aborts the chain: no later handler runs.

use tracing::{debug, warn};

use crate::context::Context;
use crate::error::{Result, RouterError};
use crate::handler::BoxHandler;
use crate::table::Route;

/// Lifecycle of a dispatch chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainState {
    /// Not yet executed.
    Pending,
    /// Waiting on the handler at this index.
    Running(usize),
    /// Every handler returned `Ok`.
    Resolved,
    /// A handler returned an error.
    Rejected,
}

impl ChainState {
    /// Whether the chain has settled.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Resolved | Self::Rejected)
    }
}

/// A single-use run of handlers for one navigation.
pub struct Chain {
    handlers: Vec<BoxHandler>,
    state: ChainState,
}

impl Chain {
    /// Creates a pending chain over the given handlers.
    pub fn new(handlers: Vec<BoxHandler>) -> Self {
        Self {
            handlers,
            state: ChainState::Pending,
        }
    }

    /// Concatenates router-level and route-level handlers, in that order:
    /// `before`, then the route's own, then `after`.
    pub fn compose(before: &[BoxHandler], route: &[BoxHandler], after: &[BoxHandler]) -> Self {
        Self::new(
            before
                .iter()
                .chain(route)
                .chain(after)
                .cloned()
                .collect(),
        )
    }

    /// Returns the current state.
    pub fn state(&self) -> ChainState {
        self.state
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Runs every handler in order and returns the final context.
    ///
    /// With no handlers the context comes back unchanged. A chain runs at
    /// most once; executing it again yields [`RouterError::ChainSpent`].
    pub async fn execute(&mut self, mut ctx: Context) -> Result<Context> {
        if self.state != ChainState::Pending {
            return Err(RouterError::ChainSpent);
        }

        let Self { handlers, state } = self;
        for (index, handler) in handlers.iter().enumerate() {
            *state = ChainState::Running(index);
            debug!(index, url = %ctx.url, "running handler");

            if let Err(source) = handler.call(&mut ctx).await {
                *state = ChainState::Rejected;
                warn!(index, url = %ctx.url, error = %source, "handler aborted chain");
                return Err(RouterError::Handler { index, source });
            }
        }

        *state = ChainState::Resolved;
        debug!(url = %ctx.url, handlers = handlers.len(), "chain resolved");
        Ok(ctx)
    }
}

/// Runs a route's own handlers over a context.
pub async fn execute(route: &Route, ctx: Context) -> Result<Context> {
    Chain::new(route.handlers.clone()).execute(ctx).await
}
