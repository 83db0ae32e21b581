//! Solr query description and URL construction.
//!
//! Parameters are always serialized in the same order:
//! `q`, `rows`, `sort`, `cursorMark`, `facet`, `facet.field`*, then one `fq`
//! per populated filter slot in slot order.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Result, SearchError};

/// Cursor mark requesting the first page of a new query.
pub const START_CURSOR: &str = "*";

/// Query text sent when the user leaves the search box empty.
pub const MATCH_ALL: &str = "*:*";

/// Default page size.
pub const DEFAULT_ROWS: u32 = 10;

/// Default facet and filter fields of the documentation index.
pub const DEFAULT_FIELDS: [&str; 3] = ["product", "release", "booktitle"];

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

/// Sort field plus direction, serialized as `<field>+<dir>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    pub field: String,
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn new(field: &str, direction: SortDirection) -> Self {
        Self {
            field: field.to_string(),
            direction,
        }
    }
}

impl Default for SortSpec {
    fn default() -> Self {
        Self::new("id", SortDirection::Asc)
    }
}

impl fmt::Display for SortSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.field, self.direction.as_str())
    }
}

impl FromStr for SortSpec {
    type Err = SearchError;

    /// Parses `"id asc"`, `"id+desc"` or a bare field name (ascending).
    fn from_str(s: &str) -> Result<Self> {
        let mut parts = s
            .split(|c: char| c == '+' || c.is_whitespace())
            .filter(|p| !p.is_empty());

        let field = parts
            .next()
            .ok_or_else(|| SearchError::InvalidQuery("empty sort".to_string()))?;

        let direction = match parts.next().map(|d| d.to_ascii_lowercase()) {
            None => SortDirection::Asc,
            Some(d) if d == "asc" => SortDirection::Asc,
            Some(d) if d == "desc" => SortDirection::Desc,
            Some(d) => {
                return Err(SearchError::InvalidQuery(format!(
                    "unknown sort direction: {}",
                    d
                )))
            }
        };

        if parts.next().is_some() {
            return Err(SearchError::InvalidQuery(format!("invalid sort: {}", s)));
        }

        Ok(Self::new(field, direction))
    }
}

/// One filter field and its optional value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSlot {
    pub field: String,
    pub value: Option<String>,
}

/// Filter fields in their fixed serialization order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSet {
    slots: Vec<FilterSlot>,
}

impl FilterSet {
    /// Create a filter set with the given field names, all unset.
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            slots: fields
                .into_iter()
                .map(|f| FilterSlot {
                    field: f.into(),
                    value: None,
                })
                .collect(),
        }
    }

    /// Set the value of the slot at `index`. Empty strings clear the slot.
    /// Returns false if there is no such slot.
    pub fn set(&mut self, index: usize, value: Option<String>) -> bool {
        match self.slots.get_mut(index) {
            Some(slot) => {
                slot.value = value.filter(|v| !v.is_empty());
                true
            }
            None => false,
        }
    }

    /// Set a value by field name. Returns false if the field is not a filter field.
    pub fn set_field(&mut self, field: &str, value: Option<String>) -> bool {
        match self.slots.iter().position(|s| s.field == field) {
            Some(index) => self.set(index, value),
            None => false,
        }
    }

    /// Value of the named field, if set.
    pub fn get(&self, field: &str) -> Option<&str> {
        self.slots
            .iter()
            .find(|s| s.field == field)
            .and_then(|s| s.value.as_deref())
    }

    /// Unset every slot, keeping the field names.
    pub fn clear(&mut self) {
        for slot in &mut self.slots {
            slot.value = None;
        }
    }

    pub fn slots(&self) -> &[FilterSlot] {
        &self.slots
    }

    /// Populated slots, in slot order.
    pub fn active(&self) -> impl Iterator<Item = (&str, &str)> {
        self.slots
            .iter()
            .filter_map(|s| s.value.as_deref().map(|v| (s.field.as_str(), v)))
    }
}

impl Default for FilterSet {
    fn default() -> Self {
        Self::new(DEFAULT_FIELDS)
    }
}

/// Everything needed to request one page of a search, minus the cursor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchQuery {
    pub text: String,
    pub rows: u32,
    pub sort: SortSpec,
    pub filters: FilterSet,
    pub facet: bool,
    pub facet_fields: Vec<String>,
}

impl Default for SearchQuery {
    fn default() -> Self {
        Self {
            text: String::new(),
            rows: DEFAULT_ROWS,
            sort: SortSpec::default(),
            filters: FilterSet::default(),
            facet: true,
            facet_fields: DEFAULT_FIELDS.iter().map(|f| f.to_string()).collect(),
        }
    }
}

impl SearchQuery {
    pub fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
            ..Default::default()
        }
    }

    pub fn with_rows(mut self, rows: u32) -> Self {
        self.rows = rows;
        self
    }

    pub fn with_sort(mut self, sort: SortSpec) -> Self {
        self.sort = sort;
        self
    }

    pub fn with_filters(mut self, filters: FilterSet) -> Self {
        self.filters = filters;
        self
    }

    pub fn with_facet_fields(mut self, fields: Vec<String>) -> Self {
        self.facet_fields = fields;
        self
    }

    pub fn with_facet(mut self, facet: bool) -> Self {
        self.facet = facet;
        self
    }

    /// Clear the user-entered parts: text and filter values.
    pub fn clear_input(&mut self) {
        self.text.clear();
        self.filters.clear();
    }
}

/// Percent-encode a parameter value. `*` stays literal so the start cursor
/// and match-all query read the way Solr documents them.
fn encode_param(value: &str) -> String {
    urlencoding::encode(value).replace("%2A", "*")
}

/// Builds request URLs against a Solr request handler.
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    /// Endpoint with a trailing `?` or `&`, ready for parameters.
    prefix: String,
}

impl QueryBuilder {
    /// Create a builder for an endpoint such as `http://localhost:8983/solr/core/query`.
    pub fn new(endpoint: &str) -> Result<Self> {
        let parsed = Url::parse(endpoint)
            .map_err(|e| SearchError::InvalidQuery(format!("invalid endpoint {}: {}", endpoint, e)))?;

        let prefix = if endpoint.ends_with('?') || endpoint.ends_with('&') {
            endpoint.to_string()
        } else if parsed.query().is_some() {
            format!("{}&", endpoint)
        } else {
            format!("{}?", endpoint)
        };

        Ok(Self { prefix })
    }

    pub fn endpoint(&self) -> &str {
        self.prefix.trim_end_matches(['?', '&'])
    }

    /// Build the URL for one page of `query` starting at `cursor_mark`.
    pub fn build_url(&self, query: &SearchQuery, cursor_mark: &str) -> Result<String> {
        if query.rows == 0 {
            return Err(SearchError::InvalidQuery("rows must be positive".to_string()));
        }
        if query.sort.field.is_empty() {
            return Err(SearchError::InvalidQuery("sort field is empty".to_string()));
        }

        // MATCH_ALL is Solr syntax, not user text; only the latter is encoded.
        let text = if query.text.trim().is_empty() {
            MATCH_ALL.to_string()
        } else {
            encode_param(&query.text)
        };

        let mut url = format!(
            "{}q={}&rows={}&sort={}+{}&cursorMark={}&facet={}",
            self.prefix,
            text,
            query.rows,
            encode_param(&query.sort.field),
            query.sort.direction.as_str(),
            encode_param(cursor_mark),
            query.facet,
        );

        if query.facet {
            for field in &query.facet_fields {
                url.push_str("&facet.field=");
                url.push_str(&encode_param(field));
            }
        }

        for (field, value) in query.filters.active() {
            url.push_str("&fq=");
            url.push_str(&encode_param(field));
            url.push(':');
            url.push_str(&encode_param(value));
        }

        Ok(url)
    }

    /// URL of the match-all, zero-row request whose facet counts seed
    /// suggestion lists before any search is submitted.
    pub fn seed_facets_url<S: AsRef<str>>(&self, fields: &[S]) -> String {
        let mut url = format!("{}q={}&rows=0&facet=true", self.prefix, MATCH_ALL);
        for field in fields {
            url.push_str("&facet.field=");
            url.push_str(&encode_param(field.as_ref()));
        }
        url
    }
}
