//! Tests for pattern matching, ranking and query handling through the
//! public API.

mod common;

use common::{matched, no_match, params};
use proptest::prelude::*;
use waymark::{
    match_url, parse_query, rank_order, stringify_query, MatchOptions, Pattern, QueryMap,
    QueryValue, RouteDecl, RouteNode, RouteTable, RouteTree, RouterError,
};

// =============================================================================
// Literal and parameter segments
// =============================================================================

#[test]
fn test_literal_pattern_matches_with_no_params() {
    assert!(matched("/about/team", "/about/team").is_empty());
    assert!(matched("about/team/", "/about/team").is_empty());
}

#[test]
fn test_literal_pattern_keeps_query_params() {
    assert_eq!(
        matched("/about/team?tab=2", "/about/team"),
        params(&[("tab", "2")])
    );
}

#[test]
fn test_required_param() {
    assert_eq!(matched("/users/42", "/users/:id"), params(&[("id", "42")]));
    no_match("/users", "/users/:id");
    no_match("/users/42/posts", "/users/:id");
}

#[test]
fn test_optional_param() {
    assert_eq!(matched("/users", "/users/:id?"), params(&[("id", "")]));
    assert_eq!(matched("/users/7", "/users/:id?"), params(&[("id", "7")]));
}

#[test]
fn test_one_or_more_param() {
    assert_eq!(
        matched("/files/a/b/c", "/files/:rest+"),
        params(&[("rest", "a/b/c")])
    );
    no_match("/files", "/files/:rest+");
}

#[test]
fn test_zero_or_more_param() {
    assert_eq!(matched("/files", "/files/:rest*"), params(&[("rest", "")]));
    assert_eq!(
        matched("/files/x/y", "/files/:rest*"),
        params(&[("rest", "x/y")])
    );
}

#[test]
fn test_root_pattern() {
    assert!(matched("/", "").is_empty());
    assert!(matched("", "/").is_empty());
    no_match("/home", "");
}

#[test]
fn test_literal_compared_before_decoding() {
    no_match("/caf%C3%A9", "/café");
    assert_eq!(matched("/caf%C3%A9", "/:word"), params(&[("word", "café")]));
}

#[test]
fn test_fragment_is_discarded() {
    assert_eq!(
        matched("/docs/intro?lang=en#setup", "/docs/:page"),
        params(&[("lang", "en"), ("page", "intro")])
    );
}

// =============================================================================
// Query merge and decoding
// =============================================================================

#[test]
fn test_query_merge() {
    assert_eq!(matched("/search?q=cats", "/search"), params(&[("q", "cats")]));
}

#[test]
fn test_path_param_wins_over_query() {
    assert_eq!(matched("/users/42?id=7", "/users/:id"), params(&[("id", "42")]));
}

#[test]
fn test_percent_decoding_in_keys_and_values() {
    assert_eq!(
        matched("/tags/rust%20lang?sort%20by=new%26hot", "/tags/:tag"),
        params(&[("tag", "rust lang"), ("sort by", "new&hot")])
    );
}

#[test]
fn test_malformed_escape_is_an_error() {
    let err = match_url("/users/%E0%A4", "/users/:id", MatchOptions::default()).unwrap_err();
    assert!(matches!(err, RouterError::Decode { .. }));

    let err = match_url("/search?q=%zz", "/search", MatchOptions::default()).unwrap_err();
    assert!(matches!(err, RouterError::Decode { .. }));
}

#[test]
fn test_lenient_returns_partial_params() {
    let partial = match_url("/users/5/extra", "/users/:id", MatchOptions::lenient())
        .unwrap()
        .unwrap();
    assert_eq!(partial, params(&[("id", "5")]));

    let partial = match_url("/nothing?from=x", "/users/:id", MatchOptions::lenient())
        .unwrap()
        .unwrap();
    assert_eq!(partial, params(&[("from", "x")]));
}

#[test]
fn test_invalid_patterns() {
    for pattern in ["/files/:rest+/more", "/a/:x*/:y", "/users/:"] {
        let err = Pattern::parse(pattern).unwrap_err();
        assert!(
            matches!(err, RouterError::InvalidPattern { .. }),
            "{pattern} should be invalid, got {err:?}"
        );
    }
}

// =============================================================================
// Ranking and route tables
// =============================================================================

#[test]
fn test_rank_tie_break_by_length() {
    let param = Pattern::parse("/a/:id").unwrap();
    let literal = Pattern::parse("/a/bb").unwrap();
    assert_eq!(param.rank(), 2);
    assert_eq!(literal.rank(), 2);
    assert!(rank_order(&literal, &param).is_lt());
}

#[test]
fn test_tree_is_ranked() {
    let tree = RouteTree::new()
        .route("/a/:id", RouteNode::new().name("param"))
        .route("/a/bb", RouteNode::new().name("literal"))
        .route("/", RouteNode::new().name("home"));
    let table = RouteTable::from_tree(tree).unwrap();
    let order: Vec<_> = table.iter().map(|r| r.pattern.as_str()).collect();
    assert_eq!(order, ["/", "/a/bb", "/a/:id"]);

    let hit = table.find_first_match("/a/bb").unwrap().unwrap();
    assert_eq!(hit.route.name.as_deref(), Some("literal"));
}

#[test]
fn test_list_keeps_declared_order() {
    let table = RouteTable::from_list(vec![
        RouteDecl::new("/users/:id").name("param"),
        RouteDecl::new("/users/new").name("literal"),
    ])
    .unwrap();
    let hit = table.find_first_match("/users/new").unwrap().unwrap();
    assert_eq!(hit.route.name.as_deref(), Some("param"));
    assert_eq!(hit.params, params(&[("id", "new")]));
}

#[test]
fn test_nested_tree_prefixes() {
    let tree = RouteTree::new().route(
        "/shop",
        RouteNode::new().name("shop").routes(
            RouteTree::new().route(
                "/items/:sku",
                RouteNode::new()
                    .name("item")
                    .routes(RouteTree::new().route("/reviews", RouteNode::new().name("reviews"))),
            ),
        ),
    );
    let table = RouteTable::from_tree(tree).unwrap();

    let hit = table.find_first_match("/shop/items/X1/reviews").unwrap().unwrap();
    assert_eq!(hit.route.name.as_deref(), Some("reviews"));
    assert_eq!(hit.params, params(&[("sku", "X1")]));
    assert_eq!(
        table.url_for("item", &params(&[("sku", "X 2")])).as_deref(),
        Some("/shop/items/X%202")
    );
}

#[test]
fn test_no_route_matches() {
    let table = RouteTable::from_list(vec![RouteDecl::new("/a")]).unwrap();
    assert!(table.find_first_match("/b").unwrap().is_none());
}

// =============================================================================
// Properties
// =============================================================================

fn segment() -> impl Strategy<Value = String> {
    "[a-z0-9]{1,8}"
}

fn scalar_query() -> impl Strategy<Value = QueryMap> {
    prop::collection::btree_map("[a-zA-Z0-9 _.+&=%-]{0,6}[a-zA-Z0-9]", ".{0,12}", 0..6).prop_map(
        |map| {
            map.into_iter()
                .map(|(k, v)| (k, QueryValue::Single(v)))
                .collect()
        },
    )
}

proptest! {
    #[test]
    fn prop_literal_patterns_match_themselves(segments in prop::collection::vec(segment(), 0..6)) {
        let path = format!("/{}", segments.join("/"));
        let result = match_url(&path, &path, MatchOptions::default()).unwrap();
        prop_assert_eq!(result, Some(Default::default()));
    }

    #[test]
    fn prop_match_is_idempotent(
        segments in prop::collection::vec(segment(), 0..5),
        pattern in prop::sample::select(vec!["/:a", "/:a/:b?", "/:a+", "/:a*", "/x/:a", ""]),
        lenient in any::<bool>(),
    ) {
        let url = format!("/{}", segments.join("/"));
        let options = MatchOptions { lenient };
        let first = match_url(&url, pattern, options).unwrap();
        let second = match_url(&url, pattern, options).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn prop_repeating_param_captures_tail(segments in prop::collection::vec(segment(), 1..6)) {
        let url = format!("/files/{}", segments.join("/"));
        let params = match_url(&url, "/files/:rest+", MatchOptions::default()).unwrap().unwrap();
        let joined = segments.join("/");
        prop_assert_eq!(params.get("rest"), Some(joined.as_str()));
    }

    #[test]
    fn prop_query_round_trip(query in scalar_query()) {
        let parsed = parse_query(&stringify_query(&query)).unwrap();
        prop_assert_eq!(parsed, query);
    }
}
