// Query executor
// Turns the filter state plus a page cursor into a tours query, runs it against the Listing API
// and maps the raw page into a result set. Failures collapse to an empty page.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::api::{ApiError, ListingApi};
use crate::filter::{Dimension, FilterState};
use crate::payload::{Tour, TourPage};

pub const ITEMS_PER_PAGE: u32 = 15;

// Backend query; unset fields are never sent
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TourQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_slug: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination_slug: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_slug: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_price: Option<f64>,
}

impl TourQuery {
    pub fn from_filter(filter: &FilterState) -> Self {
        let slug = |dimension| filter.query_slug(dimension).map(str::to_string);
        let defaults = FilterState::default();

        Self {
            category_slug: slug(Dimension::TripType),
            destination_slug: slug(Dimension::Destination),
            duration_slug: slug(Dimension::Duration),
            min_price: (filter.min_price() > defaults.min_price()).then(|| filter.min_price()),
            max_price: (filter.max_price() < defaults.max_price()).then(|| filter.max_price()),
        }
    }

    pub fn is_unfiltered(&self) -> bool {
        self.to_pairs().is_empty()
    }

    // Key/value pairs in a stable order
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(slug) = &self.category_slug {
            pairs.push(("category_slug", slug.clone()));
        }
        if let Some(slug) = &self.destination_slug {
            pairs.push(("destination_slug", slug.clone()));
        }
        if let Some(slug) = &self.duration_slug {
            pairs.push(("duration_slug", slug.clone()));
        }
        if let Some(min) = self.min_price {
            pairs.push(("min_price", min.to_string()));
        }
        if let Some(max) = self.max_price {
            pairs.push(("max_price", max.to_string()));
        }
        pairs
    }
}

// Total-item estimate: explicit total, else last_page * per_page, else a one-past-the-page
// guess when the page came back exactly full. An overflowing product counts as absent.
pub fn estimate_total(page: &TourPage, items_per_page: u32) -> u64 {
    if let Some(total) = page.total {
        return total;
    }
    if let (Some(last_page), Some(per_page)) = (page.last_page, page.per_page) {
        match last_page.checked_mul(per_page) {
            Some(total) => return total,
            None => warn!(last_page, per_page, "pagination metadata overflows, estimating from page"),
        }
    }

    let returned = page.data.len() as u64;
    if returned == items_per_page as u64 {
        returned + 1
    } else {
        returned
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSet {
    pub items: Vec<Tour>,
    pub total_items: u64,
    pub current_page: u32,
}

impl ResultSet {
    pub fn empty(current_page: u32) -> Self {
        Self {
            items: Vec::new(),
            total_items: 0,
            current_page,
        }
    }

    pub fn from_page(page: TourPage, current_page: u32, items_per_page: u32) -> Self {
        let total_items = estimate_total(&page, items_per_page);
        let mut items = page.data;
        items.iter_mut().for_each(Tour::enrich);

        Self {
            items,
            total_items,
            current_page,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn page_count(&self, items_per_page: u32) -> u64 {
        if items_per_page == 0 {
            return 0;
        }
        self.total_items.div_ceil(items_per_page as u64)
    }

    // Items shown on the current page according to the estimate
    pub fn current_page_items_count(&self, items_per_page: u32) -> u64 {
        if self.total_items == 0 {
            return 0;
        }
        let per_page = items_per_page as u64;
        let start = (self.current_page.max(1) as u64 - 1) * per_page;
        per_page.min(self.total_items.saturating_sub(start))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct RequestToken(pub u64);

// Result of one executed page request
#[derive(Debug, Clone)]
pub struct PageFetch {
    pub token: RequestToken,
    pub page: u32,
    pub result_set: ResultSet,
    pub error: Option<ApiError>,
}

impl PageFetch {
    pub fn is_failure(&self) -> bool {
        self.error.is_some()
    }
}

pub struct QueryExecutor<A: ?Sized> {
    api: Arc<A>,
    items_per_page: u32,
    latest: AtomicU64,
}

impl<A: ListingApi + ?Sized> QueryExecutor<A> {
    pub fn new(api: Arc<A>, items_per_page: u32) -> Self {
        Self {
            api,
            items_per_page,
            latest: AtomicU64::new(0),
        }
    }

    pub fn items_per_page(&self) -> u32 {
        self.items_per_page
    }

    // New request token; every earlier token becomes stale
    pub fn issue(&self) -> RequestToken {
        RequestToken(self.latest.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn latest(&self) -> RequestToken {
        RequestToken(self.latest.load(Ordering::SeqCst))
    }

    pub fn is_current(&self, token: RequestToken) -> bool {
        token == self.latest()
    }

    pub async fn fetch_page(&self, filter: &FilterState, page: u32) -> PageFetch {
        let token = self.issue();
        let query = TourQuery::from_filter(filter);
        self.execute(token, &query, page).await
    }

    pub async fn execute(&self, token: RequestToken, query: &TourQuery, page: u32) -> PageFetch {
        let page = page.max(1);
        info!(token = token.0, page, query = ?query, "fetching tours");

        match self.api.tours(query, page).await {
            Ok(raw) => {
                let result_set = ResultSet::from_page(raw, page, self.items_per_page);
                info!(
                    token = token.0,
                    page,
                    items = result_set.items.len(),
                    total = result_set.total_items,
                    "tours page loaded"
                );
                PageFetch {
                    token,
                    page,
                    result_set,
                    error: None,
                }
            }
            Err(e) => {
                warn!(token = token.0, page, error = %e, "tours fetch failed, showing empty page");
                PageFetch {
                    token,
                    page,
                    result_set: ResultSet::empty(page),
                    error: Some(e),
                }
            }
        }
    }
}
