//! Scope classification: decide which raw scope entries become output lines
//! under a given [`ScopeMode`], and what shape each line takes.
//!
//! Both functions are pure so the same entry always classifies the same way.

use url::Url;

use crate::config::{AllMode, ScopeMode};

/// Scheme and non-empty host.
pub fn is_url(s: &str) -> bool {
    match Url::parse(s) {
        Ok(u) => !u.scheme().is_empty() && u.host_str().map_or(false, |h| !h.is_empty()),
        Err(_) => false,
    }
}

/// Bugcrowd names often carry a trailing description ("https://x.com (main app)").
fn first_token(s: &str) -> &str {
    s.split(' ').next().unwrap_or(s)
}

/// Classify a Bugcrowd target. Breadth is inferred from the name's shape;
/// at most one line comes out.
pub fn bugcrowd_targets(mode: ScopeMode, name: &str, uri: &str) -> Vec<String> {
    let name = first_token(name);
    let uri = first_token(uri);

    let narrow = || {
        if name.starts_with('*') {
            None
        } else if is_url(name) {
            Some(name)
        } else if is_url(uri) {
            Some(uri)
        } else {
            None
        }
    };
    let wide = || name.strip_prefix("*.").filter(|rest| !rest.is_empty() && !rest.contains('*'));

    let picked = match mode {
        ScopeMode::Narrow => narrow(),
        ScopeMode::Wide => wide(),
        ScopeMode::All => narrow().or_else(wide),
    };
    picked.map(|s| vec![s.to_string()]).unwrap_or_default()
}

/// Classify a HackerOne structured scope by its `asset_type`.
pub fn hackerone_targets(mode: ScopeMode, all_mode: AllMode, asset_type: &str, identifier: &str) -> Vec<String> {
    let kind = asset_type.to_ascii_lowercase();
    match (mode, kind.as_str()) {
        (ScopeMode::Wide | ScopeMode::All, "wildcard") => wildcard_host(identifier).into_iter().collect(),
        (ScopeMode::Narrow, "url") => url_entries(identifier),
        (ScopeMode::All, "url") if all_mode == AllMode::Union => url_entries(identifier),
        _ => Vec::new(),
    }
}

/// `*.example.com` -> `example.com`. With commas only the first segment counts.
/// A second `*` anywhere discards the identifier.
fn wildcard_host(identifier: &str) -> Option<String> {
    let (head, listed) = match identifier.split_once(',') {
        Some((head, _)) => (head, true),
        None => (identifier, false),
    };
    if !listed && !identifier.contains('*') {
        return None;
    }

    let head = head.trim();
    let host = head.strip_prefix("*.").unwrap_or(head);
    if host.is_empty() || host.contains('*') {
        return None;
    }
    Some(host.to_string())
}

/// Every comma-separated element without a `*`, in order.
fn url_entries(identifier: &str) -> Vec<String> {
    identifier
        .split(',')
        .map(str::trim)
        .filter(|e| !e.is_empty() && !e.contains('*'))
        .map(str::to_string)
        .collect()
}
