// Listing session
// Owns the filter state and the result set for one activation of the tour listing and
// reconciles navigation events, user actions, reference-data arrivals and page responses.
//
// Everything runs on one logical thread. The event handlers are synchronous and return a
// `FetchTicket` when the listing has to be re-queried; the async drivers run that ticket (and,
// on activation, the reference loads) and feed the outcome back in arrival order.

use std::sync::Arc;

use futures::future::BoxFuture;
use futures::stream::FuturesUnordered;
use futures::{FutureExt, StreamExt};
use tracing::{debug, info, warn};

use crate::api::{ApiError, ListingApi};
use crate::filter::{Dimension, FilterPanel, FilterSection, FilterState};
use crate::payload::{ReferenceItem, Tour};
use crate::query::{PageFetch, QueryExecutor, RequestToken, ResultSet, TourQuery, ITEMS_PER_PAGE};
use crate::reference::{ReferenceCatalog, ReferenceKind};
use crate::refine::{filter_by_price, sort_tours, PriceCriteria, SortOrder};
use crate::seo::{SeoDefaults, SeoMetadata, SeoSink};
use crate::url_sync::{Navigator, QueryParams, UrlSynchronizer};

#[derive(Debug, Clone)]
pub struct ListingConfig {
    pub items_per_page: u32,
    pub seo: SeoDefaults,
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            items_per_page: ITEMS_PER_PAGE,
            seo: SeoDefaults::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingPhase {
    Idle,
    Loading,
    Ready,
    Failed,
}

// A page request that has been issued but not yet applied
#[derive(Debug, Clone, PartialEq)]
pub struct FetchTicket {
    pub token: RequestToken,
    pub query: TourQuery,
    pub page: u32,
}

enum Arrival {
    Reference(ReferenceKind, Result<Vec<ReferenceItem>, ApiError>),
    Page(PageFetch),
}

pub struct ListingSession<A: ListingApi + ?Sized, N: Navigator> {
    config: ListingConfig,
    api: Arc<A>,
    catalog: Arc<ReferenceCatalog>,
    executor: Arc<QueryExecutor<A>>,
    navigator: N,
    seo: Arc<dyn SeoSink>,
    sync: UrlSynchronizer,
    filter: FilterState,
    panel: FilterPanel,
    results: ResultSet,
    // Unrefined copy of the last fetched page, source for client-side price refinement
    page_items: Vec<Tour>,
    phase: ListingPhase,
    pending: Option<FetchTicket>,
}

impl<A: ListingApi + ?Sized, N: Navigator> ListingSession<A, N> {
    pub fn new(api: Arc<A>, navigator: N, seo: Arc<dyn SeoSink>, config: ListingConfig) -> Self {
        let executor = Arc::new(QueryExecutor::new(Arc::clone(&api), config.items_per_page));
        Self {
            config,
            api,
            catalog: Arc::new(ReferenceCatalog::new()),
            executor,
            navigator,
            seo,
            sync: UrlSynchronizer::new(),
            filter: FilterState::new(),
            panel: FilterPanel::default(),
            results: ResultSet::empty(1),
            page_items: Vec::new(),
            phase: ListingPhase::Idle,
            pending: None,
        }
    }

    pub fn phase(&self) -> ListingPhase {
        self.phase
    }

    pub fn filter(&self) -> &FilterState {
        &self.filter
    }

    pub fn results(&self) -> &ResultSet {
        &self.results
    }

    pub fn page_count(&self) -> u64 {
        self.results.page_count(self.executor.items_per_page())
    }

    pub fn current_page_items_count(&self) -> u64 {
        self.results
            .current_page_items_count(self.executor.items_per_page())
    }

    pub fn catalog(&self) -> &ReferenceCatalog {
        &self.catalog
    }

    pub fn navigator(&self) -> &N {
        &self.navigator
    }

    pub fn panel(&self) -> &FilterPanel {
        &self.panel
    }

    pub fn pending(&self) -> Option<&FetchTicket> {
        self.pending.as_ref()
    }

    pub fn reference_items(&self, kind: ReferenceKind) -> Vec<ReferenceItem> {
        self.catalog
            .list(kind)
            .map(|list| list.items().to_vec())
            .unwrap_or_default()
    }

    pub fn toggle_section(&mut self, section: FilterSection) {
        self.panel.toggle(section);
    }

    // Issues a new request token for `page`; any earlier in-flight page becomes stale
    pub fn begin_fetch(&mut self, page: u32) -> FetchTicket {
        let ticket = FetchTicket {
            token: self.executor.issue(),
            query: TourQuery::from_filter(&self.filter),
            page: page.max(1),
        };
        debug!(token = ticket.token.0, page = ticket.page, "listing fetch issued");
        self.phase = ListingPhase::Loading;
        self.pending = Some(ticket.clone());
        ticket
    }

    // Applies a page response. Returns false if a newer request superseded it.
    pub fn apply_fetch(&mut self, fetch: PageFetch) -> bool {
        if !self.executor.is_current(fetch.token) {
            warn!(
                token = fetch.token.0,
                latest = self.executor.latest().0,
                "discarding stale tours response"
            );
            return false;
        }

        self.phase = if fetch.is_failure() {
            ListingPhase::Failed
        } else {
            ListingPhase::Ready
        };
        self.page_items = fetch.result_set.items.clone();
        self.results = fetch.result_set;
        self.pending = None;
        true
    }

    // Back/forward or any other address change, including the echo of our own writes
    pub fn handle_navigation(&mut self, params: &QueryParams) -> Option<FetchTicket> {
        let changed = self
            .sync
            .read(&mut self.filter, params, self.catalog.as_ref());
        if !changed {
            debug!("address matches filter state, nothing to fetch");
            return None;
        }
        Some(self.begin_fetch(1))
    }

    // Reconciliation step, run whenever any reference list finishes loading
    pub fn apply_reference(
        &mut self,
        kind: ReferenceKind,
        loaded: Result<Vec<ReferenceItem>, ApiError>,
    ) -> Option<FetchTicket> {
        match loaded {
            Ok(items) => {
                let count = self.catalog.store(kind, items);
                info!(kind = %kind, count, "reference data loaded");
            }
            Err(e) => {
                warn!(kind = %kind, error = %e, "reference data failed to load");
                return None;
            }
        }

        if self.filter.reconcile(kind, self.catalog.as_ref()) {
            info!(kind = %kind, "pending selection resolved, re-querying");
            return Some(self.begin_fetch(1));
        }
        None
    }

    fn after_interactive_change(&mut self) -> FetchTicket {
        let ticket = self.begin_fetch(1);
        self.sync.write(&self.filter, &mut self.navigator);
        ticket
    }

    // Radio-style selection; reselecting the current id clears the dimension
    pub fn select(&mut self, dimension: Dimension, id: Option<i64>) -> FetchTicket {
        self.filter
            .set_by_selection(dimension, id, self.catalog.as_ref());
        self.after_interactive_change()
    }

    pub fn set_price_range(&mut self, min: f64, max: f64) -> Option<FetchTicket> {
        if !self.filter.set_price_range(min, max) {
            return None;
        }
        Some(self.after_interactive_change())
    }

    pub fn clear_all(&mut self) -> FetchTicket {
        self.filter.clear_all();
        self.after_interactive_change()
    }

    pub fn change_page(&mut self, page: u32) -> FetchTicket {
        self.begin_fetch(page)
    }

    // Reorders the displayed page; never re-fetches. A page still on screen while the next
    // one loads can be sorted too.
    pub fn sort(&mut self, order: SortOrder) -> bool {
        if self.results.is_empty() {
            debug!(phase = ?self.phase, "sort ignored, nothing displayed");
            return false;
        }
        sort_tours(&mut self.results.items, order);
        true
    }

    // Client-side price refinement over the last fetched page
    pub fn refine_by_price(&mut self) {
        let criteria = PriceCriteria::from_filter(&self.filter);
        self.results.items = filter_by_price(&self.page_items, &criteria);
    }

    pub fn publish_tour_seo(&self, tour: &Tour) {
        self.seo
            .publish(SeoMetadata::for_tour(tour, &self.config.seo));
    }

    fn page_future(&self, ticket: FetchTicket) -> BoxFuture<'static, Arrival> {
        let executor = Arc::clone(&self.executor);
        async move {
            let fetch = executor
                .execute(ticket.token, &ticket.query, ticket.page)
                .await;
            Arrival::Page(fetch)
        }
        .boxed()
    }

    fn reference_future(&self, kind: ReferenceKind) -> BoxFuture<'static, Arrival> {
        let api = Arc::clone(&self.api);
        async move { Arrival::Reference(kind, api.reference(kind).await) }.boxed()
    }

    // Runs one ticket to completion. Returns whether the response was applied.
    pub async fn run(&mut self, ticket: FetchTicket) -> bool {
        let fetch = self
            .executor
            .execute(ticket.token, &ticket.query, ticket.page)
            .await;
        self.apply_fetch(fetch)
    }

    pub async fn run_optional(&mut self, ticket: Option<FetchTicket>) -> bool {
        match ticket {
            Some(ticket) => self.run(ticket).await,
            None => false,
        }
    }

    // Entry point: publishes listing metadata, reads the address, then loads the three reference
    // lists and the first page concurrently, handling each as it arrives.
    pub async fn activate(&mut self) {
        self.seo
            .publish(SeoMetadata::for_listing(&self.config.seo));

        let params = self.navigator.current_params();
        self.sync
            .read(&mut self.filter, &params, self.catalog.as_ref());
        let first = self.begin_fetch(1);

        let mut in_flight: FuturesUnordered<BoxFuture<'static, Arrival>> = FuturesUnordered::new();
        for kind in ReferenceKind::ALL {
            in_flight.push(self.reference_future(kind));
        }
        in_flight.push(self.page_future(first));

        while let Some(arrival) = in_flight.next().await {
            match arrival {
                Arrival::Reference(kind, loaded) => {
                    if let Some(ticket) = self.apply_reference(kind, loaded) {
                        in_flight.push(self.page_future(ticket));
                    }
                }
                Arrival::Page(fetch) => {
                    self.apply_fetch(fetch);
                }
            }
        }

        info!(
            phase = ?self.phase,
            items = self.results.items.len(),
            total = self.results.total_items,
            "listing activated"
        );
    }

    pub async fn navigate(&mut self, params: QueryParams) -> bool {
        let ticket = self.handle_navigation(&params);
        self.run_optional(ticket).await
    }
}
