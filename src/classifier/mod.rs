//! Turns a (URL, title) pair into a short human-readable description.
//!
//! Rules are evaluated in order and the first match wins, so rules keyed on a
//! specific path of a shared domain must come before the rule for the bare
//! domain. Descriptions only keep a bounded prefix of any free-form text.

mod rules;

pub use rules::RULES;

use std::panic::{self, AssertUnwindSafe};

use log::warn;
use url::Url;

/// Longest run of title text carried into a description.
pub const TITLE_LIMIT: usize = 50;
/// Limit for subjects and video titles, which tend to run longer.
pub const SUBJECT_LIMIT: usize = 60;

#[derive(Clone, Copy)]
pub struct ClassificationRule {
    pub name: &'static str,
    pub matches: fn(&Url) -> bool,
    pub describe: fn(&Url, Option<&str>) -> String,
}

impl std::fmt::Debug for ClassificationRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClassificationRule")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Describes what the user was doing on `url`. Never empty.
pub fn classify(url: &Url, title: Option<&str>) -> String {
    classify_with(RULES, url, title)
}

/// Runs an explicit rule list. A rule that panics counts as a non-match and
/// evaluation moves on to the next one.
pub fn classify_with(rules: &[ClassificationRule], url: &Url, title: Option<&str>) -> String {
    let title = title.filter(|t| !t.is_empty());
    rules
        .iter()
        .find_map(|rule| apply(rule, url, title))
        .filter(|description| !description.is_empty())
        .unwrap_or_else(|| fallback(url, title))
}

fn apply(rule: &ClassificationRule, url: &Url, title: Option<&str>) -> Option<String> {
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        if (rule.matches)(url) {
            Some((rule.describe)(url, title))
        } else {
            None
        }
    }));

    match outcome {
        Ok(description) => description,
        Err(_) => {
            warn!("classification rule '{}' failed on {url}; skipping", rule.name);
            None
        }
    }
}

/// `Browsed example.com: Page Title`, title clipped and optional.
pub fn fallback(url: &Url, title: Option<&str>) -> String {
    let host = url.host_str().unwrap_or_default();
    let domain = host.strip_prefix("www.").unwrap_or(host);
    let domain = if domain.is_empty() { url.scheme() } else { domain };

    match title.map(|t| truncate(t, TITLE_LIMIT)).filter(|t| !t.is_empty()) {
        Some(title) => format!("Browsed {domain}: {title}"),
        None => format!("Browsed {domain}"),
    }
}

/// Char-boundary-safe prefix of at most `limit` characters.
pub fn truncate(text: &str, limit: usize) -> String {
    text.chars().take(limit).collect()
}
