use std::sync::Once;

use pagescribe_core::{extract_url, parse_url_list, remove_anchor, url_list_run_id};
use pretty_assertions::assert_eq;

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(engine_logging::initialize_for_tests);
}

fn identities(raw: &str) -> Vec<String> {
    parse_url_list(raw)
        .identities()
        .map(ToOwned::to_owned)
        .collect()
}

#[test]
fn anchor_is_removed() {
    init_logging();
    assert_eq!(remove_anchor("https://x.test/a#b"), "https://x.test/a");
    assert_eq!(remove_anchor("https://x.test/a?q=1#frag"), "https://x.test/a?q=1");
}

#[test]
fn unparseable_url_is_cut_at_hash() {
    assert_eq!(remove_anchor("not a url#section"), "not a url");
    assert_eq!(remove_anchor("plain"), "plain");
}

#[test]
fn bare_domain_gets_default_scheme() {
    assert_eq!(
        extract_url("example.com/x").as_deref(),
        Some("https://example.com/x")
    );
    assert_eq!(identities("example.com/x\n"), vec!["https://example.com/x"]);
}

#[test]
fn lines_without_url_or_dot_are_discarded() {
    init_logging();
    let raw = "just some words\nlocalhost\n\n   \nhttps://a.test/page\n";
    assert_eq!(identities(raw), vec!["https://a.test/page"]);
}

#[test]
fn dotted_text_with_spaces_is_not_a_domain() {
    assert_eq!(extract_url("see the docs. later"), None);
}

#[test]
fn first_url_in_a_line_wins() {
    let raw = "read https://a.test/one#top then https://a.test/two";
    assert_eq!(identities(raw), vec!["https://a.test/one"]);
}

#[test]
fn order_and_duplicates_are_preserved() {
    let raw = "https://b.test/\nhttps://a.test/\nhttps://b.test/#again\n";
    let list = parse_url_list(raw);
    assert_eq!(list.len(), 3);
    assert_eq!(
        list.identities().collect::<Vec<_>>(),
        vec!["https://b.test/", "https://a.test/", "https://b.test/"]
    );
    assert_eq!(list.get(0).map(|item| item.label()), Some("https://b.test/"));
}

#[test]
fn malformed_text_yields_empty_list() {
    assert!(parse_url_list("no urls here\nnone\n").is_empty());
    assert!(parse_url_list("").is_empty());
}

#[test]
fn run_id_is_stable_for_the_same_list() {
    let first = url_list_run_id(&parse_url_list("https://a.test/\nhttps://b.test/\n"));
    let second = url_list_run_id(&parse_url_list("  https://a.test/#x \nhttps://b.test/"));
    let other = url_list_run_id(&parse_url_list("https://b.test/\nhttps://a.test/\n"));

    assert!(first.starts_with("urls-"));
    assert_eq!(first, second);
    assert_ne!(first, other);
}
