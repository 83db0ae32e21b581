//! Async search session: a pagination controller bound to a transport.

use tracing::{debug, instrument};

use crate::error::Result;
use crate::pagination::{PageRequest, PaginationController};
use crate::query::{QueryBuilder, SearchQuery};
use crate::response::{parse_facets, FacetCounts, SearchPage};
use crate::transport::Transport;

/// Runs each navigation to completion: build the request, await the fetch,
/// feed the outcome back to the controller.
pub struct Session<T: Transport> {
    controller: PaginationController,
    transport: T,
}

impl<T: Transport> Session<T> {
    pub fn new(builder: QueryBuilder, transport: T) -> Self {
        Self {
            controller: PaginationController::new(builder),
            transport,
        }
    }

    pub fn controller(&self) -> &PaginationController {
        &self.controller
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Submit a new search and fetch its first page.
    #[instrument(skip(self, query), fields(query = %query.text))]
    pub async fn submit(&mut self, query: SearchQuery) -> Result<SearchPage> {
        let request = self.controller.submit(query)?;
        self.fetch(request).await
    }

    /// Fetch the next page.
    pub async fn next(&mut self) -> Result<SearchPage> {
        let request = self.controller.go_next()?;
        self.fetch(request).await
    }

    /// Fetch the previous page.
    pub async fn prev(&mut self) -> Result<SearchPage> {
        let request = self.controller.go_prev()?;
        self.fetch(request).await
    }

    /// Fetch the current page again.
    pub async fn refresh(&mut self) -> Result<SearchPage> {
        let request = self.controller.refresh()?;
        self.fetch(request).await
    }

    /// Load facet counts for suggestion lists with a match-all, zero-row query.
    pub async fn load_suggestions<S: AsRef<str>>(&self, fields: &[S]) -> Result<FacetCounts> {
        let url = self.controller.builder().seed_facets_url(fields);
        debug!(url = %url, "Loading suggestion facets");
        let body = self.transport.get(&url).await?;
        parse_facets(&body)
    }

    async fn fetch(&mut self, request: PageRequest) -> Result<SearchPage> {
        let mut guard = InFlightGuard {
            controller: &mut self.controller,
            armed: true,
        };
        let outcome = self.transport.get(&request.url).await;
        guard.armed = false;
        match outcome {
            Ok(body) => guard.controller.on_response_received(&body),
            Err(e) => Err(guard.controller.on_response_failed(e.into())),
        }
    }
}

/// Cancels the outstanding request if the fetch future is dropped before the
/// transport answers, e.g. by a timeout or `select!`.
struct InFlightGuard<'a> {
    controller: &'a mut PaginationController,
    armed: bool,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            debug!("Fetch dropped before completion, cancelling request");
            self.controller.cancel();
        }
    }
}
