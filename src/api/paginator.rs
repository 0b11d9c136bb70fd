//! Transparent pagination over index windows
//!
//! The server caps every call at [`PAGE_MAX_SIZE`] records and never reports
//! a total. The paginator walks `[fromIndex, toIndex]` windows starting at
//! [`MIN_INDEX`] until a page comes back short. Pages are fetched strictly in
//! sequence since each window depends on the previous page's size.
//!
//! When the last real page is exactly full, one more page is requested and
//! must come back empty before the paginator reports [`PaginationState::Exhausted`].

use super::constants::{MIN_INDEX, PAGE_MAX_SIZE};
use super::error::{CrmError, Result};
use super::parser::ResponseParser;
use super::request::Request;
use super::response::{PageResult, Record, Response};
use super::transport::Transport;
use log::{debug, info, warn};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaginationState {
    /// No page in flight, more data may be available
    Ready,
    /// A page fetch is in progress
    Fetching,
    /// A short page was received
    Exhausted,
    /// A page fetch failed or was cancelled
    Failed,
}

pub struct Paginator {
    request: Request,
    transport: Arc<dyn Transport>,
    parser: Arc<dyn ResponseParser>,
    page_size: u32,
    next_index: u32,
    state: PaginationState,
    attempted: bool,
    pages_fetched: usize,
    records: Vec<Record>,
    raw_payloads: Vec<String>,
    last_error: Option<CrmError>,
}

impl Paginator {
    pub fn new(
        request: Request,
        transport: Arc<dyn Transport>,
        parser: Arc<dyn ResponseParser>,
    ) -> Self {
        Self {
            request,
            transport,
            parser,
            page_size: PAGE_MAX_SIZE,
            next_index: MIN_INDEX,
            state: PaginationState::Ready,
            attempted: false,
            pages_fetched: 0,
            records: Vec::new(),
            raw_payloads: Vec::new(),
            last_error: None,
        }
    }

    /// Use a smaller window, clamped to `1..=PAGE_MAX_SIZE`
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.clamp(1, PAGE_MAX_SIZE);
        self
    }

    pub fn request(&self) -> &Request {
        &self.request
    }

    pub fn state(&self) -> PaginationState {
        self.state
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn pages_fetched(&self) -> usize {
        self.pages_fetched
    }

    /// Records gathered so far, including after a failure
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn last_error(&self) -> Option<&CrmError> {
        self.last_error.as_ref()
    }

    pub fn is_exhausted(&self) -> bool {
        self.state == PaginationState::Exhausted
    }

    pub fn has_failed(&self) -> bool {
        self.state == PaginationState::Failed
    }

    /// Window `[from, to]` the next page will request
    pub fn next_window(&self) -> (u32, u32) {
        (self.next_index, self.next_index + self.page_size - 1)
    }

    /// Fetch a single page
    ///
    /// Returns the state after the page. An exhausted paginator returns
    /// `Exhausted` without another call; a failed one returns its error again.
    pub async fn fetch_next_page(&mut self) -> Result<PaginationState> {
        let never = std::future::pending::<()>();
        tokio::pin!(never);
        self.step(never.as_mut()).await
    }

    /// Like [`Paginator::fetch_next_page`], abandoning the page with
    /// [`CrmError::Cancelled`] if `cancel` completes first
    pub async fn fetch_next_page_until<C>(&mut self, cancel: C) -> Result<PaginationState>
    where
        C: Future<Output = ()>,
    {
        tokio::pin!(cancel);
        self.step(cancel.as_mut()).await
    }

    /// Fetch pages until a short page arrives
    pub async fn fetch_all(&mut self) -> Result<()> {
        self.fetch_all_until(std::future::pending::<()>()).await
    }

    /// Like [`Paginator::fetch_all`], abandoning the page in flight once `deadline` elapses
    pub async fn fetch_all_with_timeout(&mut self, deadline: Duration) -> Result<()> {
        self.fetch_all_until(tokio::time::sleep(deadline)).await
    }

    /// Like [`Paginator::fetch_all`], stopping with [`CrmError::Cancelled`]
    /// as soon as `cancel` completes
    pub async fn fetch_all_until<C>(&mut self, cancel: C) -> Result<()>
    where
        C: Future<Output = ()>,
    {
        tokio::pin!(cancel);
        loop {
            match self.step(cancel.as_mut()).await? {
                PaginationState::Exhausted => {
                    info!(
                        "{}: fetched {} record(s) in {} page(s)",
                        self.request,
                        self.records.len(),
                        self.pages_fetched
                    );
                    return Ok(());
                }
                _ => continue,
            }
        }
    }

    async fn step<C>(&mut self, cancel: Pin<&mut C>) -> Result<PaginationState>
    where
        C: Future<Output = ()>,
    {
        match self.state {
            PaginationState::Exhausted => return Ok(PaginationState::Exhausted),
            PaginationState::Failed => {
                return Err(self.last_error.clone().unwrap_or(CrmError::Cancelled));
            }
            PaginationState::Fetching => {
                // the previous step was dropped with its page in flight
                warn!(
                    "Pagination of {} was interrupted after {} page(s)",
                    self.request, self.pages_fetched
                );
                self.attempted = true;
                self.state = PaginationState::Failed;
                self.last_error = Some(CrmError::Cancelled);
                return Err(CrmError::Cancelled);
            }
            PaginationState::Ready => {}
        }

        let (from_index, to_index) = self.next_window();
        let page_request = self.request.with_window(from_index, to_index);
        debug!("Fetching page {}", page_request);

        self.state = PaginationState::Fetching;

        let mut started = false;
        let (transport, parser) = (self.transport.clone(), self.parser.clone());
        let fetch = async {
            started = true;
            fetch_page(transport.as_ref(), parser.as_ref(), &page_request).await
        };

        let outcome = tokio::select! {
            biased;
            _ = cancel => Err(CrmError::Cancelled),
            result = fetch => result,
        };
        self.attempted |= started;

        match outcome {
            Ok((raw, page)) => {
                let count = page.record_count();
                self.pages_fetched += 1;
                self.raw_payloads.push(raw);
                self.records.extend(page.records);
                self.next_index = to_index + 1;

                self.state = if count < self.page_size as usize {
                    PaginationState::Exhausted
                } else {
                    PaginationState::Ready
                };
                debug!("Page {} returned {} record(s)", self.pages_fetched, count);
                Ok(self.state)
            }
            Err(error) => {
                warn!(
                    "Pagination of {} stopped after {} page(s): {}",
                    self.request, self.pages_fetched, error
                );
                self.state = PaginationState::Failed;
                self.last_error = Some(error.clone());
                Err(error)
            }
        }
    }

    /// Envelope over everything fetched so far
    pub fn get_aggregated_response(&self) -> Result<Response> {
        if !self.attempted {
            return Err(CrmError::NotYetFetched);
        }
        Ok(Response::aggregated(
            self.request.clone(),
            self.raw_payloads.clone(),
            self.records.clone(),
        ))
    }

    pub fn into_aggregated_response(self) -> Result<Response> {
        if !self.attempted {
            return Err(CrmError::NotYetFetched);
        }
        Ok(Response::aggregated(self.request, self.raw_payloads, self.records))
    }
}

impl std::fmt::Debug for Paginator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Paginator")
            .field("request", &self.request)
            .field("page_size", &self.page_size)
            .field("next_index", &self.next_index)
            .field("state", &self.state)
            .field("pages_fetched", &self.pages_fetched)
            .field("records", &self.records.len())
            .finish()
    }
}

/// Fire one request and parse its payload
pub(crate) async fn fetch_page(
    transport: &dyn Transport,
    parser: &dyn ResponseParser,
    request: &Request,
) -> Result<(String, PageResult)> {
    let raw = transport.fire(request).await?;
    let records = parser.parse(request, &raw)?;
    Ok((raw, PageResult::new(records)))
}
