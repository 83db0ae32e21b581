//! Pagination state machine.
//!
//! The controller owns the cursor trail and the current query. Each user
//! action produces a [`PageRequest`]; the caller performs the fetch and
//! reports back with [`PaginationController::on_response_received`] or
//! [`PaginationController::on_response_failed`]. Only one request may be
//! outstanding at a time.

use tracing::{debug, info, warn};

use crate::cursor::{CursorCache, TokenObservation};
use crate::error::{Result, SearchError};
use crate::query::{QueryBuilder, SearchQuery, START_CURSOR};
use crate::response::{parse_response, SearchPage};

/// Controller state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    Idle,
    RequestInFlight,
}

/// What the caller should fetch next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub url: String,
    pub cursor_mark: String,
    /// Trail position the response belongs to.
    pub position: usize,
}

/// Bookkeeping for the outstanding request.
#[derive(Debug, Clone, Copy)]
struct InFlight {
    /// Position to return to if the request does not succeed.
    restore_position: usize,
}

/// Drives submit / next / previous navigation over a Solr cursor trail.
#[derive(Debug)]
pub struct PaginationController {
    builder: QueryBuilder,
    cache: CursorCache,
    query: Option<SearchQuery>,
    in_flight: Option<InFlight>,
}

impl PaginationController {
    pub fn new(builder: QueryBuilder) -> Self {
        Self {
            builder,
            cache: CursorCache::new(),
            query: None,
            in_flight: None,
        }
    }

    pub fn state(&self) -> ControllerState {
        if self.in_flight.is_some() {
            ControllerState::RequestInFlight
        } else {
            ControllerState::Idle
        }
    }

    pub fn is_idle(&self) -> bool {
        self.in_flight.is_none()
    }

    /// Query of the active search, if one was submitted.
    pub fn query(&self) -> Option<&SearchQuery> {
        self.query.as_ref()
    }

    pub fn cursor_cache(&self) -> &CursorCache {
        &self.cache
    }

    pub fn builder(&self) -> &QueryBuilder {
        &self.builder
    }

    fn ensure_idle(&self) -> Result<()> {
        if self.in_flight.is_some() {
            warn!("Rejecting navigation while a request is in flight");
            return Err(SearchError::RequestAlreadyInFlight);
        }
        Ok(())
    }

    fn begin(&mut self, url: String, restore_position: usize) -> PageRequest {
        self.in_flight = Some(InFlight { restore_position });
        let request = PageRequest {
            url,
            cursor_mark: self.cache.current().to_string(),
            position: self.cache.position(),
        };
        debug!(
            position = request.position,
            cursor_mark = %request.cursor_mark,
            "Request started"
        );
        request
    }

    /// Start a new search from the first page.
    pub fn submit(&mut self, query: SearchQuery) -> Result<PageRequest> {
        self.ensure_idle()?;
        let url = self.builder.build_url(&query, START_CURSOR)?;

        info!(query = %query.text, rows = query.rows, "Submitting search");
        self.cache.reset();
        self.query = Some(query);
        Ok(self.begin(url, 0))
    }

    /// Move to the next page of the active search.
    pub fn go_next(&mut self) -> Result<PageRequest> {
        self.ensure_idle()?;
        let previous = self.cache.position();
        self.cache.next()?;
        self.request_current(previous)
    }

    /// Move to the previous page of the active search.
    pub fn go_prev(&mut self) -> Result<PageRequest> {
        self.ensure_idle()?;
        let previous = self.cache.position();
        self.cache.prev()?;
        self.request_current(previous)
    }

    /// Request the current page again, e.g. after a failed fetch.
    pub fn refresh(&mut self) -> Result<PageRequest> {
        self.ensure_idle()?;
        let position = self.cache.position();
        self.request_current(position)
    }

    fn request_current(&mut self, restore_position: usize) -> Result<PageRequest> {
        let built = match &self.query {
            Some(query) => self.builder.build_url(query, self.cache.current()),
            None => Err(SearchError::NoActiveSearch),
        };

        match built {
            Ok(url) => Ok(self.begin(url, restore_position)),
            Err(e) => {
                self.cache.rewind_to(restore_position);
                Err(e)
            }
        }
    }

    /// Complete the outstanding request with the raw response body.
    ///
    /// A body that cannot be parsed is handled like a failed request.
    pub fn on_response_received(&mut self, body: &str) -> Result<SearchPage> {
        if self.in_flight.is_none() {
            return Err(SearchError::NoRequestInFlight);
        }

        let mut page = match parse_response(body) {
            Ok(page) => page,
            Err(e) => return Err(self.on_response_failed(e)),
        };
        self.in_flight = None;

        match self.cache.record_token(&page.next_cursor_mark) {
            TokenObservation::EndOfResults => {
                info!(page = self.cache.position() + 1, "Reached end of results")
            }
            TokenObservation::Appended | TokenObservation::AlreadySeen => {}
        }

        page.page_number = self.cache.position() + 1;
        page.has_next = self.cache.has_next();
        page.has_previous = self.cache.has_previous();

        debug!(
            page = page.page_number,
            documents = page.documents.len(),
            num_found = page.num_found,
            "Request completed"
        );
        Ok(page)
    }

    /// Fail the outstanding request. The cursor position returns to where it
    /// was before the navigation, and the error is handed back.
    ///
    /// Returns [`SearchError::NoRequestInFlight`] instead if nothing was outstanding.
    pub fn on_response_failed(&mut self, error: SearchError) -> SearchError {
        match self.in_flight.take() {
            Some(in_flight) => {
                warn!(error = %error, "Request failed");
                self.cache.rewind_to(in_flight.restore_position);
                error
            }
            None => SearchError::NoRequestInFlight,
        }
    }

    /// Abandon the outstanding request, as if it had failed.
    /// Returns false if nothing was outstanding.
    pub fn cancel(&mut self) -> bool {
        match self.in_flight.take() {
            Some(in_flight) => {
                debug!("Request cancelled");
                self.cache.rewind_to(in_flight.restore_position);
                true
            }
            None => false,
        }
    }
}
