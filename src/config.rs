//! Configuration management for solrpage using the prefer crate.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TransportError};
use crate::query::{FilterSet, QueryBuilder, SearchQuery, SortSpec, DEFAULT_FIELDS, DEFAULT_ROWS};
use crate::transport::HttpTransport;

/// Default Solr request handler.
pub const DEFAULT_ENDPOINT: &str = "http://localhost:8983/solr/bianca/query";

/// Default snippet length in characters.
pub const DEFAULT_SNIPPET_CHARS: usize = 400;

/// Application settings.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Solr request handler URL.
    pub endpoint: String,
    /// Page size.
    pub rows: u32,
    /// Sort, e.g. "id asc". Must include the unique key for cursor paging.
    pub sort: String,
    /// Whether to request facet counts with each page.
    pub facet: bool,
    /// Fields to facet on.
    pub facet_fields: Vec<String>,
    /// Filter fields, in the order their `fq` clauses are sent.
    pub filter_fields: Vec<String>,
    /// Request timeout in seconds.
    pub request_timeout: u64,
    /// User agent for HTTP requests (None = crate default).
    pub user_agent: Option<String>,
    /// Prefix joined to each document's `url` field when displaying links.
    pub link_prefix: String,
    /// Characters of document text shown per result.
    pub snippet_chars: usize,
}

impl Default for Settings {
    fn default() -> Self {
        let fields: Vec<String> = DEFAULT_FIELDS.iter().map(|f| f.to_string()).collect();

        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            rows: DEFAULT_ROWS,
            sort: SortSpec::default().to_string(),
            facet: true,
            facet_fields: fields.clone(),
            filter_fields: fields,
            request_timeout: 30,
            user_agent: None,
            link_prefix: String::new(),
            snippet_chars: DEFAULT_SNIPPET_CHARS,
        }
    }
}

impl Settings {
    /// Query builder for the configured endpoint.
    pub fn query_builder(&self) -> Result<QueryBuilder> {
        QueryBuilder::new(&self.endpoint)
    }

    /// HTTP transport with the configured timeout and user agent.
    pub fn transport(&self) -> std::result::Result<HttpTransport, TransportError> {
        HttpTransport::with_user_agent(
            Duration::from_secs(self.request_timeout),
            self.user_agent.as_deref(),
        )
    }

    /// A query for `text` carrying the configured rows, sort, facets and filter fields.
    pub fn query(&self, text: &str) -> Result<SearchQuery> {
        Ok(SearchQuery::new(text)
            .with_rows(self.rows)
            .with_sort(self.sort.parse()?)
            .with_facet(self.facet)
            .with_facet_fields(self.facet_fields.clone())
            .with_filters(FilterSet::new(self.filter_fields.iter().cloned())))
    }
}

/// Configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Solr request handler URL.
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Page size.
    #[serde(default)]
    pub rows: Option<u32>,
    /// Sort, e.g. "id asc".
    #[serde(default)]
    pub sort: Option<String>,
    /// Whether to request facet counts.
    #[serde(default)]
    pub facet: Option<bool>,
    /// Fields to facet on.
    #[serde(default)]
    pub facet_fields: Option<Vec<String>>,
    /// Filter fields in `fq` order.
    #[serde(default)]
    pub filter_fields: Option<Vec<String>>,
    /// Request timeout in seconds.
    #[serde(default)]
    pub request_timeout: Option<u64>,
    /// User agent string.
    #[serde(default)]
    pub user_agent: Option<String>,
    /// Link prefix for document urls.
    #[serde(default)]
    pub link_prefix: Option<String>,
    /// Snippet length in characters.
    #[serde(default)]
    pub snippet_chars: Option<usize>,
}

impl Config {
    /// Load configuration using prefer crate.
    /// Automatically discovers solrpage config files in standard locations.
    pub async fn load() -> Self {
        match prefer::load("solrpage").await {
            Ok(pref_config) => {
                let endpoint: Option<String> = pref_config.get("endpoint").ok();
                let rows: Option<u32> = pref_config.get("rows").ok();
                let sort: Option<String> = pref_config.get("sort").ok();
                let facet: Option<bool> = pref_config.get("facet").ok();
                let facet_fields: Option<Vec<String>> =
                    pref_config.get("facet_fields").ok();
                let filter_fields: Option<Vec<String>> =
                    pref_config.get("filter_fields").ok();
                let request_timeout: Option<u64> = pref_config.get("request_timeout").ok();
                let user_agent: Option<String> = pref_config.get("user_agent").ok();
                let link_prefix: Option<String> = pref_config.get("link_prefix").ok();
                let snippet_chars: Option<usize> = pref_config.get("snippet_chars").ok();

                Config {
                    endpoint,
                    rows,
                    sort,
                    facet,
                    facet_fields,
                    filter_fields,
                    request_timeout,
                    user_agent,
                    link_prefix,
                    snippet_chars,
                }
            }
            Err(_) => {
                // No config file found, use defaults
                Self::default()
            }
        }
    }

    /// Apply configuration to settings.
    pub fn apply_to_settings(&self, settings: &mut Settings) {
        if let Some(ref endpoint) = self.endpoint {
            settings.endpoint = endpoint.clone();
        }
        if let Some(rows) = self.rows {
            settings.rows = rows;
        }
        if let Some(ref sort) = self.sort {
            settings.sort = sort.clone();
        }
        if let Some(facet) = self.facet {
            settings.facet = facet;
        }
        if let Some(ref fields) = self.facet_fields {
            settings.facet_fields = fields.clone();
        }
        if let Some(ref fields) = self.filter_fields {
            settings.filter_fields = fields.clone();
        }
        if let Some(timeout) = self.request_timeout {
            settings.request_timeout = timeout;
        }
        if let Some(ref user_agent) = self.user_agent {
            settings.user_agent = Some(user_agent.clone());
        }
        if let Some(ref prefix) = self.link_prefix {
            settings.link_prefix = prefix.clone();
        }
        if let Some(chars) = self.snippet_chars {
            settings.snippet_chars = chars;
        }
    }
}

/// Load settings from configuration (async version).
pub async fn load_settings() -> Settings {
    let config = Config::load().await;
    let mut settings = Settings::default();
    config.apply_to_settings(&mut settings);
    settings
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(settings.rows, 10);
        assert_eq!(settings.sort, "id asc");
        assert_eq!(settings.filter_fields, ["product", "release", "booktitle"]);
        assert_eq!(settings.snippet_chars, 400);
    }

    #[test]
    fn test_apply_overrides_only_set_values() {
        let config = Config {
            endpoint: Some("http://solr:8983/solr/docs/query".to_string()),
            rows: Some(25),
            filter_fields: Some(vec!["product".to_string(), "version".to_string()]),
            ..Default::default()
        };
        let mut settings = Settings::default();
        config.apply_to_settings(&mut settings);

        assert_eq!(settings.endpoint, "http://solr:8983/solr/docs/query");
        assert_eq!(settings.rows, 25);
        assert_eq!(settings.sort, "id asc");
        assert_eq!(settings.filter_fields, ["product", "version"]);
        assert!(settings.facet);
    }

    #[test]
    fn test_config_deserialize() {
        let config: Config = serde_json::from_str(
            r#"{"endpoint": "http://x/solr/c/query", "sort": "date desc", "facet": false}"#,
        )
        .unwrap();
        assert_eq!(config.sort.as_deref(), Some("date desc"));
        assert_eq!(config.facet, Some(false));
        assert!(config.rows.is_none());
    }

    #[test]
    fn test_query_from_settings() {
        let settings = Settings {
            rows: 5,
            sort: "date desc".to_string(),
            ..Default::default()
        };
        let query = settings.query("hdfs").unwrap();
        assert_eq!(query.rows, 5);
        assert_eq!(query.sort.to_string(), "date desc");
        assert_eq!(query.filters.slots().len(), 3);
        assert_eq!(query.filters.active().count(), 0);
    }

    #[test]
    fn test_bad_sort_rejected() {
        let settings = Settings {
            sort: "id sideways".to_string(),
            ..Default::default()
        };
        assert!(settings.query("x").is_err());
    }
}
