#![allow(dead_code)]

use std::sync::Arc;

use parking_lot::Mutex;
use waymark::{
    boxed, handler_fn, match_url, BoxHandler, MatchOptions, Params, Router, RouterBuilder,
};

pub fn matched(url: &str, pattern: &str) -> Params {
    match_url(url, pattern, MatchOptions::default())
        .unwrap_or_else(|e| panic!("Failed to match {url} against {pattern}: {e}"))
        .unwrap_or_else(|| panic!("Expected {url} to match {pattern}"))
}

pub fn no_match(url: &str, pattern: &str) {
    let result = match_url(url, pattern, MatchOptions::default())
        .unwrap_or_else(|e| panic!("Failed to match {url} against {pattern}: {e}"));
    assert!(result.is_none(), "Expected {url} not to match {pattern}, got {result:?}");
}

pub fn params(pairs: &[(&str, &str)]) -> Params {
    pairs.iter().copied().collect()
}

/// Shared log that handlers append to, to observe call order.
#[derive(Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<String>>>);

impl CallLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// A handler that records `name` and continues.
    pub fn tag(&self, name: &str) -> BoxHandler {
        let log = self.0.clone();
        let name = name.to_string();
        boxed(handler_fn(move |_ctx| {
            log.lock().push(name.clone());
            Box::pin(async { Ok(()) })
        }))
    }

    /// A handler that records `name` and fails.
    pub fn fail(&self, name: &str) -> BoxHandler {
        let log = self.0.clone();
        let name = name.to_string();
        boxed(handler_fn(move |_ctx| {
            log.lock().push(name.clone());
            let message = format!("{name} refused");
            Box::pin(async move { Err(message.into()) })
        }))
    }

    pub fn calls(&self) -> Vec<String> {
        self.0.lock().clone()
    }
}

pub fn started(builder: RouterBuilder) -> Router {
    let router = builder
        .build()
        .unwrap_or_else(|e| panic!("Failed to build router: {e}"));
    router.start();
    router
}
