//! Per-navigation dispatch context.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::params::Params;
use crate::query::QueryMap;

/// The mutable record threaded through one dispatch chain.
///
/// A context is created fresh for each navigation and handed by mutable
/// reference to one handler at a time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Context {
    /// The URL being navigated to.
    pub url: String,
    /// Path and query parameters from the match.
    pub params: Params,
    /// The query string parsed on its own (`+` as space, list values).
    pub query: QueryMap,
    /// History state attached to the entry, if any.
    pub state: Option<Value>,
    /// Free-form data handlers read and write.
    pub data: Map<String, Value>,
}

impl Context {
    /// Creates an empty context for a URL.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    /// Sets the matched parameters.
    #[must_use]
    pub fn with_params(mut self, params: Params) -> Self {
        self.params = params;
        self
    }

    /// Sets the parsed query.
    #[must_use]
    pub fn with_query(mut self, query: QueryMap) -> Self {
        self.query = query;
        self
    }

    /// Sets the history state.
    #[must_use]
    pub fn with_state(mut self, state: Option<Value>) -> Self {
        self.state = state;
        self
    }

    /// Gets a value handlers stored in `data`.
    pub fn get<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.data
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    /// Stores a serializable value in `data`.
    pub fn set<T: Serialize>(&mut self, key: impl Into<String>, value: T) -> serde_json::Result<()> {
        self.data.insert(key.into(), serde_json::to_value(value)?);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_set() {
        let mut ctx = Context::new("/users/1");
        ctx.set("visits", 3_u32).unwrap();
        assert_eq!(ctx.get::<u32>("visits"), Some(3));
        assert_eq!(ctx.get::<String>("visits"), None);
        assert_eq!(ctx.get::<u32>("missing"), None);
    }

    #[test]
    fn test_serializes_to_json() {
        let params: Params = [("id", "1")].into_iter().collect();
        let ctx = Context::new("/users/1").with_params(params);
        let json = serde_json::to_value(&ctx).unwrap();
        assert_eq!(json["url"], "/users/1");
        assert_eq!(json["params"]["id"], "1");
        assert_eq!(json["state"], Value::Null);
    }
}
