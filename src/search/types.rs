//! Request and response types for the Custom Search JSON API.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Line-break markup the provider embeds in HTML snippets.
pub const SNIPPET_LINE_BREAK: &str = "<br>\n";

/// One outbound search against the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    /// API key sent as `key`.
    pub api_key: String,
    /// Scope identifier sent as `cx`.
    pub search_engine_id: String,
    /// Query string sent as `q`.
    pub query: String,
    /// 1-based offset of the first result.
    pub start: Option<u32>,
    /// Maximum number of results to return.
    pub num: Option<u32>,
    /// Restrict results to this site.
    pub site_search: Option<String>,
    /// Use the site-restricted endpoint variant.
    pub site_restricted: bool,
}

impl SearchRequest {
    /// Create a request for `query` with no pagination or site restriction.
    pub fn new(
        api_key: impl Into<String>,
        search_engine_id: impl Into<String>,
        query: impl Into<String>,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            search_engine_id: search_engine_id.into(),
            query: query.into(),
            start: None,
            num: None,
            site_search: None,
            site_restricted: false,
        }
    }

    /// Query parameters as sent on the wire. Absent options are omitted.
    pub(crate) fn api_params(&self) -> ApiParams<'_> {
        ApiParams {
            key: &self.api_key,
            cx: &self.search_engine_id,
            q: &self.query,
            start: self.start,
            num: self.num,
            site_search: self.site_search.as_deref(),
        }
    }

    /// Key identifying equivalent requests. The API key is left out.
    pub fn cache_key(&self) -> CacheKey {
        CacheKey {
            search_engine_id: self.search_engine_id.clone(),
            site_restricted: self.site_restricted,
            query: self.query.clone(),
            start: self.start,
            num: self.num,
            site_search: self.site_search.clone(),
        }
    }
}

/// Every outbound parameter except the API key, compared field by field.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    search_engine_id: String,
    site_restricted: bool,
    query: String,
    start: Option<u32>,
    num: Option<u32>,
    site_search: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ApiParams<'a> {
    key: &'a str,
    cx: &'a str,
    q: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    start: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num: Option<u32>,
    #[serde(rename = "siteSearch", skip_serializing_if = "Option::is_none")]
    site_search: Option<&'a str>,
}

/// A provider response, reshaped for templates.
///
/// The provider's `items` list is exposed as `entries`. Every other
/// top-level field (`queries`, `searchInformation`, ...) is kept as-is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResults {
    #[serde(rename(deserialize = "items"), alias = "entries", default)]
    pub entries: Vec<Entry>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SearchResults {
    /// Remove the provider's line-break markup from every entry snippet.
    pub fn strip_snippet_line_breaks(&mut self) {
        for entry in &mut self.entries {
            entry.strip_line_breaks();
        }
    }

}

/// A single search hit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub link: String,

    #[serde(rename = "htmlSnippet", default, skip_serializing_if = "Option::is_none")]
    pub html_snippet: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Entry {
    fn strip_line_breaks(&mut self) {
        if let Some(snippet) = self.html_snippet.as_mut() {
            if snippet.contains(SNIPPET_LINE_BREAK) {
                *snippet = snippet.replace(SNIPPET_LINE_BREAK, "");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAYLOAD: &str = r#"{
        "kind": "customsearch#search",
        "searchInformation": { "totalResults": "1230" },
        "items": [
            {
                "title": "Snap documentation",
                "link": "https://docs.snapcraft.io/",
                "htmlTitle": "<b>Snap</b> documentation",
                "htmlSnippet": "Snaps are<br>\nuniversal"
            },
            {
                "title": "Snapshots",
                "link": "https://docs.snapcraft.io/snapshots"
            }
        ]
    }"#;

    #[test]
    fn test_items_become_entries() {
        let results: SearchResults = serde_json::from_str(PAYLOAD).unwrap();
        assert_eq!(results.entries.len(), 2);
        assert!(!results.extra.contains_key("items"));
        assert_eq!(results.entries[0].extra["htmlTitle"], "<b>Snap</b> documentation");

        let json = serde_json::to_value(&results).unwrap();
        assert!(json.get("items").is_none());
        assert_eq!(json["entries"].as_array().unwrap().len(), 2);
        assert_eq!(json["kind"], "customsearch#search");
    }

    #[test]
    fn test_strip_snippet_line_breaks() {
        let mut results: SearchResults = serde_json::from_str(PAYLOAD).unwrap();
        results.strip_snippet_line_breaks();

        assert_eq!(
            results.entries[0].html_snippet.as_deref(),
            Some("Snaps areuniversal")
        );
        // Entries without a snippet are left alone
        assert!(results.entries[1].html_snippet.is_none());
    }

    #[test]
    fn test_no_items_yields_empty_entries() {
        let results: SearchResults =
            serde_json::from_str(r#"{"searchInformation": {"totalResults": "0"}}"#).unwrap();
        assert!(results.entries.is_empty());
        assert_eq!(results.extra["searchInformation"]["totalResults"], "0");
    }

    #[test]
    fn test_api_params_omit_absent_options() {
        let request = SearchRequest::new("k", "cx-id", "snap");
        let json = serde_json::to_value(request.api_params()).unwrap();
        assert_eq!(json, serde_json::json!({ "key": "k", "cx": "cx-id", "q": "snap" }));

        let request = SearchRequest {
            start: Some(20),
            num: Some(3),
            site_search: Some("maas.io/docs".into()),
            ..request
        };
        let json = serde_json::to_value(request.api_params()).unwrap();
        assert_eq!(json["start"], 20);
        assert_eq!(json["num"], 3);
        assert_eq!(json["siteSearch"], "maas.io/docs");
    }

    #[test]
    fn test_cache_key_ignores_api_key() {
        let a = SearchRequest::new("key-a", "cx", "snap");
        let b = SearchRequest::new("key-b", "cx", "snap");
        assert_eq!(a.cache_key(), b.cache_key());

        let c = SearchRequest { start: Some(11), ..a.clone() };
        assert_ne!(a.cache_key(), c.cache_key());
    }

    #[test]
    fn test_cache_key_separates_fields() {
        // `|` is the provider's OR operator and may appear in queries
        let a = SearchRequest::new("k", "cx", "x|1");
        let b = SearchRequest {
            start: Some(1),
            site_search: Some("|".into()),
            ..SearchRequest::new("k", "cx", "x")
        };
        assert_ne!(a, b);
        assert_ne!(a.cache_key(), b.cache_key());

        let restricted = SearchRequest { site_restricted: true, ..a.clone() };
        assert_ne!(a.cache_key(), restricted.cache_key());
    }
}
