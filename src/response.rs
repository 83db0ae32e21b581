//! Solr JSON response parsing.
//!
//! Only the parts of the query response the client uses are read:
//! `response.docs`, `response.numFound`, `nextCursorMark`,
//! `facet_counts.facet_fields` and `responseHeader.QTime`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Result, SearchError};

/// Appended to truncated snippets.
const TRAILING_DOTS: &str = "....";

/// Solr query response format.
#[derive(Debug, Deserialize)]
struct SolrResponse {
    #[serde(rename = "responseHeader", default)]
    header: Option<SolrHeader>,
    response: Option<SolrResultSet>,
    #[serde(rename = "nextCursorMark")]
    next_cursor_mark: Option<String>,
    #[serde(default)]
    facet_counts: Option<SolrFacetCounts>,
}

#[derive(Debug, Deserialize)]
struct SolrHeader {
    #[serde(rename = "QTime", default)]
    q_time: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct SolrResultSet {
    #[serde(rename = "numFound", default)]
    num_found: u64,
    docs: Option<Vec<Map<String, Value>>>,
}

#[derive(Debug, Deserialize)]
struct SolrFacetCounts {
    #[serde(default)]
    facet_fields: BTreeMap<String, Vec<Value>>,
}

/// Solr error body format.
#[derive(Debug, Deserialize)]
struct SolrErrorResponse {
    error: SolrError,
}

#[derive(Debug, Deserialize)]
struct SolrError {
    msg: String,
}

/// A single matching document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchDocument {
    pub id: String,
    pub title: Option<String>,
    pub url: Option<String>,
    pub text: Option<String>,
    /// Every other stored field, e.g. `product`, `release`, `booktitle`.
    pub attributes: BTreeMap<String, Value>,
}

impl SearchDocument {
    fn from_fields(mut fields: Map<String, Value>) -> Self {
        let id = fields
            .remove("id")
            .as_ref()
            .and_then(field_text)
            .unwrap_or_default();
        let title = fields.remove("title").as_ref().and_then(field_text);
        let url = fields.remove("url").as_ref().and_then(field_text);
        let text = fields.remove("text").as_ref().and_then(field_text);

        Self {
            id,
            title,
            url,
            text,
            attributes: fields.into_iter().collect(),
        }
    }

    /// First `max_chars` characters of the text, with trailing dots.
    pub fn snippet(&self, max_chars: usize) -> Option<String> {
        let text = self.text.as_deref()?;
        let truncated: String = text.chars().take(max_chars).collect();
        Some(format!("{}{}", truncated, TRAILING_DOTS))
    }

    /// Absolute link built from a site prefix and the indexed path.
    pub fn link(&self, prefix: &str) -> Option<String> {
        self.url.as_deref().map(|u| format!("{}{}", prefix, u))
    }

    /// Attribute value as text, joining multivalued fields.
    pub fn attribute(&self, name: &str) -> Option<String> {
        self.attributes.get(name).and_then(field_text)
    }
}

/// Read a stored field as text. Multivalued fields are joined with spaces.
fn field_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Array(items) => {
            let parts: Vec<String> = items.iter().filter_map(field_text).collect();
            if parts.is_empty() {
                None
            } else {
                Some(parts.join(" "))
            }
        }
        other => Some(other.to_string()),
    }
}

/// One facet bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacetValue {
    pub value: String,
    pub count: u64,
}

/// Facet counts per field, each in server order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacetCounts {
    fields: BTreeMap<String, Vec<FacetValue>>,
}

impl FacetCounts {
    /// Pair Solr's flat `[value, count, value, count, ...]` lists.
    fn from_flat(raw: BTreeMap<String, Vec<Value>>) -> Result<Self> {
        let mut fields = BTreeMap::new();

        for (field, flat) in raw {
            if flat.len() % 2 != 0 {
                return Err(SearchError::MalformedResponse(format!(
                    "facet field {} has an unpaired value",
                    field
                )));
            }

            let values = flat
                .chunks(2)
                .map(|pair| -> Result<FacetValue> {
                    let value = field_text(&pair[0]).unwrap_or_default();
                    let count = pair[1].as_u64().ok_or_else(|| {
                        SearchError::MalformedResponse(format!(
                            "facet field {} has a non-integer count: {}",
                            field, pair[1]
                        ))
                    })?;
                    Ok(FacetValue { value, count })
                })
                .collect::<Result<Vec<_>>>()?;

            fields.insert(field, values);
        }

        Ok(Self { fields })
    }

    pub fn get(&self, field: &str) -> Option<&[FacetValue]> {
        self.fields.get(field).map(|v| v.as_slice())
    }

    /// Facet values of a field, for populating suggestion lists.
    pub fn suggestions(&self, field: &str) -> Vec<String> {
        self.get(field)
            .map(|values| values.iter().map(|v| v.value.clone()).collect())
            .unwrap_or_default()
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(|k| k.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// One parsed page of search results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchPage {
    pub documents: Vec<SearchDocument>,
    pub next_cursor_mark: String,
    pub facet_counts: FacetCounts,
    pub num_found: u64,
    pub q_time_ms: Option<u64>,
    /// 1-based page number within the current search.
    pub page_number: usize,
    pub has_next: bool,
    pub has_previous: bool,
}

fn parse_envelope(body: &str) -> Result<SolrResponse> {
    serde_json::from_str(body).map_err(|e| {
        SearchError::MalformedResponse(format!("JSON parse error: {}", e))
    })
}

/// Parse a cursor-paginated query response.
pub fn parse_response(body: &str) -> Result<SearchPage> {
    let raw = parse_envelope(body)?;

    let result_set = raw
        .response
        .ok_or_else(|| SearchError::MalformedResponse("missing response".to_string()))?;
    let docs = result_set
        .docs
        .ok_or_else(|| SearchError::MalformedResponse("missing response.docs".to_string()))?;
    let next_cursor_mark = raw
        .next_cursor_mark
        .ok_or_else(|| SearchError::MalformedResponse("missing nextCursorMark".to_string()))?;

    let facet_counts = match raw.facet_counts {
        Some(counts) => FacetCounts::from_flat(counts.facet_fields)?,
        None => FacetCounts::default(),
    };

    Ok(SearchPage {
        documents: docs.into_iter().map(SearchDocument::from_fields).collect(),
        next_cursor_mark,
        facet_counts,
        num_found: result_set.num_found,
        q_time_ms: raw.header.and_then(|h| h.q_time),
        page_number: 1,
        has_next: false,
        has_previous: false,
    })
}

/// Parse only the facet counts of a response, e.g. the suggestion seed request.
pub fn parse_facets(body: &str) -> Result<FacetCounts> {
    let raw = parse_envelope(body)?;
    let counts = raw
        .facet_counts
        .ok_or_else(|| SearchError::MalformedResponse("missing facet_counts".to_string()))?;
    FacetCounts::from_flat(counts.facet_fields)
}

/// Extract `error.msg` from a Solr error body.
pub fn error_message(body: &str) -> Option<String> {
    serde_json::from_str::<SolrErrorResponse>(body)
        .ok()
        .map(|e| e.error.msg)
}
