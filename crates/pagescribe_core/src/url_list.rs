use std::sync::LazyLock;

use regex::Regex;
use url::Url;

use crate::item::{short_hash, WorkItem, WorkList};

static URL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"https?://\S+").expect("url pattern compiles"));

const DEFAULT_SCHEME: &str = "https://";

/// Turn pasted free-form text into a work list, one URL per usable line.
///
/// Never fails: lines that hold neither a URL nor a bare domain are dropped.
/// Duplicates are kept, order follows the input.
pub fn parse_url_list(raw: &str) -> WorkList {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(extract_url)
        .map(|url| remove_anchor(&url))
        .map(|url| WorkItem::new(url.clone(), url))
        .collect()
}

/// First URL found in `line`, or the line itself as a bare domain with the
/// default scheme prepended when it contains a `.` and no whitespace.
pub fn extract_url(line: &str) -> Option<String> {
    if let Some(found) = URL_PATTERN.find(line) {
        return Some(found.as_str().to_string());
    }
    if line.contains('.') && !line.chars().any(char::is_whitespace) {
        return Some(format!("{DEFAULT_SCHEME}{line}"));
    }
    None
}

/// Drop the fragment; it is never part of an item's identity.
pub fn remove_anchor(url: &str) -> String {
    match Url::parse(url) {
        Ok(mut parsed) => {
            parsed.set_fragment(None);
            parsed.into()
        }
        Err(_) => match url.find('#') {
            Some(idx) => url[..idx].to_string(),
            None => url.to_string(),
        },
    }
}

/// Stable identity for a pasted list, so the same list resumes the same checkpoint.
pub fn url_list_run_id(list: &WorkList) -> String {
    let joined = list.identities().collect::<Vec<_>>().join("\n");
    format!("urls-{}", short_hash(&joined))
}
