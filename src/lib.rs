//! solrpage: cursor-paginated Solr search client.
//!
//! Builds Solr query URLs, walks result pages forward with cursor marks,
//! replays remembered cursors to page backwards, and exposes facet counts
//! as suggestion lists.

pub mod config;
pub mod cursor;
pub mod error;
pub mod pagination;
pub mod query;
pub mod response;
pub mod session;
pub mod transport;

pub use config::{load_settings, Config, Settings};
pub use cursor::{CursorCache, TokenObservation};
pub use error::{SearchError, TransportError};
pub use pagination::{ControllerState, PageRequest, PaginationController};
pub use query::{FilterSet, QueryBuilder, SearchQuery, SortDirection, SortSpec, START_CURSOR};
pub use response::{FacetCounts, FacetValue, SearchDocument, SearchPage};
pub use session::Session;
pub use transport::{HttpTransport, Transport};
