use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use url::Url;

use crate::host::TabId;

/// Tab identity of a resolved context. Self-reporting surfaces the host
/// cannot enumerate have no id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TabRef {
    Known(TabId),
    Unknown,
}

impl From<Option<TabId>> for TabRef {
    fn from(id: Option<TabId>) -> Self {
        id.map(TabRef::Known).unwrap_or(TabRef::Unknown)
    }
}

// The collector stores tab ids as integers, so the sentinel goes out as null.
impl Serialize for TabRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            TabRef::Known(id) => serializer.serialize_i64(id.0),
            TabRef::Unknown => serializer.serialize_none(),
        }
    }
}

/// What the user is looking at, as resolved at `resolved_at`.
#[derive(Debug, Clone, PartialEq)]
pub struct Context {
    pub url: Url,
    pub title: Option<String>,
    pub tab: TabRef,
    pub resolved_at: DateTime<Utc>,
}

impl Context {
    /// Parses `raw` into an absolute URL; anything else is rejected.
    pub fn parse(
        raw: &str,
        title: Option<String>,
        tab: TabRef,
        resolved_at: DateTime<Utc>,
    ) -> Option<Self> {
        let url = Url::parse(raw.trim()).ok()?;

        Some(Self {
            url,
            title: title.filter(|t| !t.trim().is_empty()),
            tab,
            resolved_at,
        })
    }

    pub fn domain(&self) -> &str {
        self.url.host_str().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_relative_and_garbage_urls() {
        let now = Utc::now();
        assert!(Context::parse("/relative/path", None, TabRef::Unknown, now).is_none());
        assert!(Context::parse("not a url", None, TabRef::Unknown, now).is_none());
        assert!(Context::parse("", None, TabRef::Unknown, now).is_none());
    }

    #[test]
    fn blank_titles_become_absent() {
        let ctx = Context::parse(
            "https://example.com/",
            Some("   ".into()),
            TabRef::Known(TabId(3)),
            Utc::now(),
        )
        .unwrap();
        assert_eq!(ctx.title, None);
        assert_eq!(ctx.domain(), "example.com");
    }

    #[test]
    fn unknown_tab_serializes_as_null() {
        assert_eq!(serde_json::to_value(TabRef::Unknown).unwrap(), serde_json::Value::Null);
        assert_eq!(
            serde_json::to_value(TabRef::Known(TabId(42))).unwrap(),
            serde_json::json!(42)
        );
    }
}
