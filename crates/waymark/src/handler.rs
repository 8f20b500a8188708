//! Handlers run by a dispatch chain.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tracing::info;

use crate::context::Context;
use crate::error::BoxError;

/// A boxed future for async handler operations.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// What a handler reports back to the chain: `Ok(())` to run the next
/// handler, `Err` to abort the chain with that error.
pub type HandlerResult = std::result::Result<(), BoxError>;

/// A shared, type-erased handler.
pub type BoxHandler = Arc<dyn Handler>;

/// A step in a dispatch chain.
///
/// Handlers run strictly one after another. Each receives the navigation
/// [`Context`] and may read or modify it, suspend on async work, and then
/// resolve to a [`HandlerResult`]. A handler whose future never resolves
/// stalls its chain.
///
/// Closures become handlers through [`handler_fn`].
///
/// # Example
///
/// ```ignore
/// struct RequireUser;
///
/// impl Handler for RequireUser {
///     fn call<'a>(&'a self, ctx: &'a mut Context) -> BoxFuture<'a, HandlerResult> {
///         Box::pin(async move {
///             if ctx.data.contains_key("user") {
///                 Ok(())
///             } else {
///                 Err("login required".into())
///             }
///         })
///     }
/// }
/// ```
pub trait Handler: Send + Sync {
    /// Runs the handler against the navigation context.
    fn call<'a>(&'a self, ctx: &'a mut Context) -> BoxFuture<'a, HandlerResult>;
}

impl<H: Handler + ?Sized> Handler for Arc<H> {
    fn call<'a>(&'a self, ctx: &'a mut Context) -> BoxFuture<'a, HandlerResult> {
        (**self).call(ctx)
    }
}

/// Boxes a handler for storage in a route or router.
pub fn boxed(handler: impl Handler + 'static) -> BoxHandler {
    Arc::new(handler)
}

/// A handler backed by a closure. See [`handler_fn`].
pub struct FnHandler<F>(F);

impl<F> Handler for FnHandler<F>
where
    F: for<'a> Fn(&'a mut Context) -> BoxFuture<'a, HandlerResult> + Send + Sync,
{
    fn call<'a>(&'a self, ctx: &'a mut Context) -> BoxFuture<'a, HandlerResult> {
        (self.0)(ctx)
    }
}

/// Wraps a closure as a handler.
///
/// ```
/// use waymark::handler_fn;
///
/// let handler = handler_fn(|ctx| {
///     Box::pin(async move {
///         ctx.data.insert("visited".into(), true.into());
///         Ok(())
///     })
/// });
/// # let _ = handler;
/// ```
pub fn handler_fn<F>(f: F) -> FnHandler<F>
where
    F: for<'a> Fn(&'a mut Context) -> BoxFuture<'a, HandlerResult> + Send + Sync,
{
    FnHandler(f)
}

/// Handler that logs each navigation it sees.
pub struct LoggingHandler;

impl Handler for LoggingHandler {
    fn call<'a>(&'a self, ctx: &'a mut Context) -> BoxFuture<'a, HandlerResult> {
        Box::pin(async move {
            info!(url = %ctx.url, params = ?ctx.params, "navigating");
            Ok(())
        })
    }
}

/// Handler that copies every matched parameter into the context's data
/// object, under an optional key prefix.
pub struct RecordParams {
    prefix: String,
}

impl RecordParams {
    /// Records parameters under their own names.
    pub fn new() -> Self {
        Self {
            prefix: String::new(),
        }
    }

    /// Records parameters as `<prefix><name>`.
    #[must_use]
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }
}

impl Default for RecordParams {
    fn default() -> Self {
        Self::new()
    }
}

impl Handler for RecordParams {
    fn call<'a>(&'a self, ctx: &'a mut Context) -> BoxFuture<'a, HandlerResult> {
        Box::pin(async move {
            let entries: Vec<_> = ctx
                .params
                .iter()
                .map(|(k, v)| (format!("{}{k}", self.prefix), v.to_string()))
                .collect();
            for (key, value) in entries {
                ctx.data.insert(key, serde_json::Value::String(value));
            }
            Ok(())
        })
    }
}
