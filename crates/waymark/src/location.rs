//! Navigation collaborators: the current location, session history, and
//! link activation.
//!
//! The router reads and writes history only through the [`Location`]
//! trait, so a browser binding and the in-memory [`MemoryHistory`] are
//! interchangeable.

use parking_lot::Mutex;
use serde_json::Value;

/// The navigable part of the current location.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CurrentLocation {
    /// Path without query or fragment.
    pub path: String,
    /// Query string including its leading `?`, or empty.
    pub search: String,
}

impl CurrentLocation {
    /// Splits a URL into path and search, dropping any fragment.
    pub fn from_url(url: &str) -> Self {
        let (path, query) = crate::pattern::split_url(url);
        Self {
            path: path.to_string(),
            search: query.map(|q| format!("?{q}")).unwrap_or_default(),
        }
    }

    /// Returns `path` followed by `search`.
    pub fn url(&self) -> String {
        format!("{}{}", self.path, self.search)
    }
}

/// Session history the router persists navigations to.
pub trait Location: Send + Sync {
    /// Returns the current location.
    fn current(&self) -> CurrentLocation;

    /// Returns the state attached to the current entry.
    fn state(&self) -> Option<Value>;

    /// Adds a new entry and makes it current.
    fn push_state(&self, url: &str, state: Option<Value>);

    /// Overwrites the current entry.
    fn replace_state(&self, url: &str, state: Option<Value>);
}

/// One entry of a [`MemoryHistory`].
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub url: String,
    pub state: Option<Value>,
}

#[derive(Debug)]
struct HistoryStack {
    entries: Vec<HistoryEntry>,
    index: usize,
}

/// An in-process history stack.
#[derive(Debug)]
pub struct MemoryHistory {
    inner: Mutex<HistoryStack>,
}

impl MemoryHistory {
    /// Creates a history whose only entry is `url`.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            inner: Mutex::new(HistoryStack {
                entries: vec![HistoryEntry {
                    url: url.into(),
                    state: None,
                }],
                index: 0,
            }),
        }
    }

    /// Moves one entry back. Returns `false` at the start of history.
    pub fn back(&self) -> bool {
        let mut stack = self.inner.lock();
        if stack.index == 0 {
            return false;
        }
        stack.index -= 1;
        true
    }

    /// Moves one entry forward. Returns `false` at the end of history.
    pub fn forward(&self) -> bool {
        let mut stack = self.inner.lock();
        if stack.index + 1 >= stack.entries.len() {
            return false;
        }
        stack.index += 1;
        true
    }

    /// Returns a snapshot of every entry.
    pub fn entries(&self) -> Vec<HistoryEntry> {
        self.inner.lock().entries.clone()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().entries.is_empty()
    }
}

impl Default for MemoryHistory {
    fn default() -> Self {
        Self::new("/")
    }
}

impl Location for MemoryHistory {
    fn current(&self) -> CurrentLocation {
        let stack = self.inner.lock();
        CurrentLocation::from_url(&stack.entries[stack.index].url)
    }

    fn state(&self) -> Option<Value> {
        let stack = self.inner.lock();
        stack.entries[stack.index].state.clone()
    }

    fn push_state(&self, url: &str, state: Option<Value>) {
        let mut stack = self.inner.lock();
        let next = stack.index + 1;
        stack.entries.truncate(next);
        stack.entries.push(HistoryEntry {
            url: url.to_string(),
            state,
        });
        stack.index = next;
    }

    fn replace_state(&self, url: &str, state: Option<Value>) {
        let mut stack = self.inner.lock();
        let index = stack.index;
        stack.entries[index] = HistoryEntry {
            url: url.to_string(),
            state,
        };
    }
}

/// A click on a link, as reported by the host environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkActivation {
    /// The link's `href` attribute.
    pub href: String,
    /// The link's `target` attribute.
    pub target: Option<String>,
    /// Mouse button; 0 is the primary button.
    pub button: u16,
    pub ctrl: bool,
    pub meta: bool,
    pub alt: bool,
    pub shift: bool,
}

impl LinkActivation {
    /// A plain primary-button click on `href`.
    pub fn new(href: impl Into<String>) -> Self {
        Self {
            href: href.into(),
            ..Self::default()
        }
    }

    /// Sets the link target.
    #[must_use]
    pub fn target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    /// Returns the URL the router should try, or `None` if the click
    /// belongs to the browser.
    ///
    /// Modified clicks, non-primary buttons, non-path URLs and links that
    /// open in another browsing context are left alone.
    pub fn routable_href(&self) -> Option<&str> {
        if self.ctrl || self.meta || self.alt || self.shift || self.button != 0 {
            return None;
        }
        if !self.href.starts_with('/') {
            return None;
        }
        match self.target.as_deref() {
            None | Some("") => Some(&self.href),
            Some(t) if t.eq_ignore_ascii_case("_self") || t.eq_ignore_ascii_case("self") => {
                Some(&self.href)
            }
            Some(_) => None,
        }
    }
}
