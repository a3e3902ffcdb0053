//! Scroll-based scans over large result sets.

use std::collections::VecDeque;
use std::sync::Arc;

use futures::stream::{self, BoxStream, StreamExt};
use serde_json::Value;
use tracing::{debug, warn};

use search_dsl_shared::{DocTypeRegistry, Hit};

use crate::client::SearchClient;
use crate::errors::SearchError;
use crate::interfaces::SearchTransport;
use crate::response;
use crate::search::Search;

/// Lazy stream of every hit matching a search.
pub type Scan = BoxStream<'static, Result<Hit, SearchError>>;

struct ScrollState {
    transport: Arc<dyn SearchTransport>,
    indices: Vec<String>,
    /// Initial request body; taken when the scroll is opened.
    body: Option<Value>,
    keep_alive: String,
    registry: DocTypeRegistry,
    doc_types: Vec<String>,
    scroll_id: Option<String>,
    buffer: VecDeque<Hit>,
    exhausted: bool,
}

pub(crate) fn scan(search: &Search, client: &SearchClient) -> Scan {
    let options = &client.config().scan;
    if options.page_size == 0 {
        let err = SearchError::invalid_query("Scan page size must be positive");
        return stream::once(async move { Err(err) }).boxed();
    }
    let state = ScrollState {
        transport: client.shared_transport(),
        indices: search.indices().to_vec(),
        body: Some(search.scan_body(options.page_size)),
        keep_alive: options.keep_alive.clone(),
        registry: search.registry().clone(),
        doc_types: search.doc_types().to_vec(),
        scroll_id: None,
        buffer: VecDeque::new(),
        exhausted: false,
    };

    stream::try_unfold(state, next_hit).boxed()
}

async fn next_hit(mut state: ScrollState) -> Result<Option<(Hit, ScrollState)>, SearchError> {
    loop {
        if let Some(hit) = state.buffer.pop_front() {
            return Ok(Some((hit, state)));
        }
        if state.exhausted {
            state.release().await;
            return Ok(None);
        }
        if let Err(e) = state.fetch_page().await {
            state.release().await;
            return Err(e);
        }
    }
}

/// Hits without a type tag are kept; the backend already applied the scope.
fn in_scope(doc_types: &[String], hit: &Hit) -> bool {
    match &hit.meta.doc_type {
        Some(doc_type) if !doc_types.is_empty() => doc_types.contains(doc_type),
        _ => true,
    }
}

impl ScrollState {
    async fn fetch_page(&mut self) -> Result<(), SearchError> {
        let raw = match (self.body.take(), &self.scroll_id) {
            (Some(body), _) => {
                debug!(indices = ?self.indices, keep_alive = %self.keep_alive, "Opening scroll");
                self.transport
                    .search(&self.indices, body, Some(&self.keep_alive))
                    .await?
            }
            (None, Some(scroll_id)) => self.transport.scroll(scroll_id, &self.keep_alive).await?,
            (None, None) => {
                self.exhausted = true;
                return Ok(());
            }
        };

        let (scroll_id, page) = response::map_scroll_page(&raw, &self.registry)?;
        if scroll_id.is_some() {
            self.scroll_id = scroll_id;
        }
        // No cursor to follow or nothing left on it.
        if page.is_empty() || self.scroll_id.is_none() {
            self.exhausted = true;
        }

        debug!(hits = page.len(), "Fetched scroll page");
        let doc_types = &self.doc_types;
        self.buffer
            .extend(page.hits.into_iter().filter(|hit| in_scope(doc_types, hit)));
        Ok(())
    }

    /// Clear the scroll context. Failures are logged, not returned.
    async fn release(&mut self) {
        if let Some(scroll_id) = self.scroll_id.take() {
            if let Err(e) = self.transport.clear_scroll(&scroll_id).await {
                warn!(error = %e, "Failed to clear scroll context");
            }
        }
    }
}
