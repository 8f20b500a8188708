//! Path pattern matching.

use std::cmp::Ordering;
use std::fmt;

use crate::error::{Result, RouterError};
use crate::params::Params;
use crate::query::{decode_component, encode_component};

/// Trailing marker on a parameter segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modifier {
    /// `:name` - exactly one segment.
    Required,
    /// `:name?` - one segment or nothing.
    Optional,
    /// `:name+` - the rest of the path, at least one segment.
    OneOrMore,
    /// `:name*` - the rest of the path, possibly empty.
    ZeroOrMore,
}

impl Modifier {
    /// Reads a run of modifier characters. `*` dominates `+`, which
    /// dominates `?`.
    fn from_flags(flags: &str) -> Self {
        if flags.contains('*') {
            Self::ZeroOrMore
        } else if flags.contains('+') {
            Self::OneOrMore
        } else if flags.contains('?') {
            Self::Optional
        } else {
            Self::Required
        }
    }

    /// Whether a missing or empty URL segment is tolerated.
    pub fn allows_empty(self) -> bool {
        matches!(self, Self::Optional | Self::ZeroOrMore)
    }

    /// Whether the parameter swallows the remainder of the path.
    pub fn is_repeating(self) -> bool {
        matches!(self, Self::OneOrMore | Self::ZeroOrMore)
    }
}

/// A segment in a path pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// A literal string segment.
    Literal(String),
    /// A named parameter segment (e.g., `:id`, `:rest*`).
    Param { name: String, modifier: Modifier },
}

/// Options for a single match attempt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MatchOptions {
    /// Return the partially-built parameters instead of failing. Used for
    /// default/fallback routes.
    pub lenient: bool,
}

impl MatchOptions {
    /// Options for a fallback route.
    pub fn lenient() -> Self {
        Self { lenient: true }
    }
}

/// A compiled path pattern for matching URLs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    /// The original pattern string.
    raw: String,
    /// Parsed segments.
    segments: Vec<Segment>,
}

impl Pattern {
    /// Parses a path pattern string.
    ///
    /// Pattern syntax:
    /// - `/users` - Literal path
    /// - `/users/:id` - Required parameter
    /// - `/users/:id?` - Optional parameter
    /// - `/files/:path+` - One or more trailing segments
    /// - `/files/:path*` - Zero or more trailing segments
    ///
    /// A repeating parameter must be the last segment.
    ///
    /// # Example
    ///
    /// ```
    /// use waymark::{MatchOptions, Pattern};
    ///
    /// let pattern = Pattern::parse("/posts/:id/comments/:comment_id").unwrap();
    /// let params = pattern
    ///     .matches("/posts/123/comments/456", MatchOptions::default())
    ///     .unwrap()
    ///     .unwrap();
    /// assert_eq!(params.get("id"), Some("123"));
    /// assert_eq!(params.get("comment_id"), Some("456"));
    /// ```
    pub fn parse(pattern: &str) -> Result<Self> {
        let parts = segmentize(pattern);
        let last = parts.len() - 1;
        let mut segments = Vec::with_capacity(parts.len());

        for (i, part) in parts.into_iter().enumerate() {
            let Some(param) = part.strip_prefix(':') else {
                segments.push(Segment::Literal(part.to_string()));
                continue;
            };

            let name = param.trim_end_matches(['+', '*', '?']);
            if name.is_empty() {
                return Err(RouterError::invalid_pattern(pattern, "empty parameter name"));
            }
            let modifier = Modifier::from_flags(&param[name.len()..]);
            if modifier.is_repeating() && i != last {
                return Err(RouterError::invalid_pattern(
                    pattern,
                    format!("repeating parameter `{name}` must be the last segment"),
                ));
            }

            segments.push(Segment::Param {
                name: name.to_string(),
                modifier,
            });
        }

        Ok(Self {
            raw: pattern.to_string(),
            segments,
        })
    }

    /// Returns the original pattern string.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Returns the parsed segments.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Returns the parameter names in order.
    pub fn param_names(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Param { name, .. } => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }

    /// Specificity rank: the number of segments once surrounding slashes
    /// are stripped. Lower ranks are tried first.
    pub fn rank(&self) -> usize {
        rank(&self.raw)
    }

    /// Attempts to match a URL against this pattern.
    ///
    /// Returns `Ok(None)` when the URL does not match, which is distinct
    /// from a match that extracted no parameters. Query parameters are
    /// merged into the result; a path parameter with the same name wins.
    pub fn matches(&self, url: &str, options: MatchOptions) -> Result<Option<Params>> {
        let (path, query) = split_url(url);
        let mut params = Params::new();

        if let Some(query) = query {
            for pair in query.split('&') {
                let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
                if key.is_empty() {
                    continue;
                }
                params.insert(decode_component(key)?, decode_component(value)?);
            }
        }

        let url_segments = segmentize(path);
        if self.bind(&url_segments, &mut params)? || options.lenient {
            Ok(Some(params))
        } else {
            Ok(None)
        }
    }

    /// Walks URL and pattern segments in lock-step, binding parameters.
    fn bind(&self, url: &[&str], params: &mut Params) -> Result<bool> {
        for i in 0..url.len().max(self.segments.len()) {
            match self.segments.get(i) {
                Some(Segment::Param { name, modifier }) => {
                    let value = url.get(i).copied().unwrap_or("");
                    if value.is_empty() && !modifier.allows_empty() {
                        return Ok(false);
                    }

                    if modifier.is_repeating() {
                        let rest = url
                            .get(i..)
                            .unwrap_or_default()
                            .iter()
                            .map(|s| decode_component(s))
                            .collect::<Result<Vec<_>>>()?;
                        params.insert(name.clone(), rest.join("/"));
                        return Ok(true);
                    }

                    params.insert(name.clone(), decode_component(value)?);
                }
                Some(Segment::Literal(literal)) => {
                    if url.get(i) != Some(&literal.as_str()) {
                        return Ok(false);
                    }
                }
                None => return Ok(false),
            }
        }

        Ok(true)
    }

    /// Generates a path from parameters.
    ///
    /// Optional and zero-or-more parameters may be absent. Returns `None`
    /// if a required parameter is missing.
    ///
    /// # Example
    ///
    /// ```
    /// use waymark::{Params, Pattern};
    ///
    /// let pattern = Pattern::parse("/posts/:id").unwrap();
    /// let params: Params = [("id", "123")].into_iter().collect();
    /// assert_eq!(pattern.reverse(&params).as_deref(), Some("/posts/123"));
    /// ```
    pub fn reverse(&self, params: &Params) -> Option<String> {
        let mut parts = Vec::new();

        for segment in &self.segments {
            match segment {
                Segment::Literal(s) if s.is_empty() => {}
                Segment::Literal(s) => parts.push(s.clone()),
                Segment::Param { name, modifier } => {
                    let value = params.get(name).unwrap_or("");
                    if value.is_empty() {
                        if modifier.allows_empty() {
                            continue;
                        }
                        return None;
                    }
                    if modifier.is_repeating() {
                        parts.extend(value.split('/').map(encode_component));
                    } else {
                        parts.push(encode_component(value));
                    }
                }
            }
        }

        Some(format!("/{}", parts.join("/")))
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Matches a URL against a pattern string.
///
/// `Ok(None)` means no match; errors are malformed percent-encoding or an
/// invalid pattern.
///
/// ```
/// use waymark::{match_url, MatchOptions};
///
/// let params = match_url("/users/42", "/users/:id", MatchOptions::default())
///     .unwrap()
///     .unwrap();
/// assert_eq!(params.get("id"), Some("42"));
/// assert!(match_url("/users", "/users/:id", MatchOptions::default())
///     .unwrap()
///     .is_none());
/// ```
pub fn match_url(url: &str, pattern: &str, options: MatchOptions) -> Result<Option<Params>> {
    Pattern::parse(pattern)?.matches(url, options)
}

/// Orders patterns by rank, then by raw pattern length.
pub fn rank_order(a: &Pattern, b: &Pattern) -> Ordering {
    a.rank()
        .cmp(&b.rank())
        .then_with(|| a.raw.len().cmp(&b.raw.len()))
}

/// Splits a URL into its path and query, dropping any fragment.
pub(crate) fn split_url(url: &str) -> (&str, Option<&str>) {
    let url = url.split_once('#').map_or(url, |(before, _)| before);
    match url.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (url, None),
    }
}

fn strip(path: &str) -> &str {
    path.trim_matches('/')
}

fn segmentize(path: &str) -> Vec<&str> {
    strip(path).split('/').collect()
}

fn rank(path: &str) -> usize {
    strip(path).split('/').count()
}
