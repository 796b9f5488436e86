// Filter state
// Canonical selection for the tour listing. Every dimension is tracked as an (id, slug) pair;
// the pair may be half-filled only while the matching reference list is still loading.

use tracing::{debug, warn};

use crate::reference::{IdentifierResolver, ReferenceKind, ResolveError};
use crate::url_sync::QueryParams;

// Price sentinels: values at the bounds mean "no price filter"
pub const MIN_PRICE: f64 = 0.0;
pub const MAX_PRICE: f64 = 5000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dimension {
    TripType,
    Destination,
    Duration,
}

impl Dimension {
    // Address write order
    pub const ALL: [Dimension; 3] = [
        Dimension::Destination,
        Dimension::TripType,
        Dimension::Duration,
    ];

    pub fn reference_kind(&self) -> ReferenceKind {
        match self {
            Dimension::TripType => ReferenceKind::Categories,
            Dimension::Destination => ReferenceKind::Destinations,
            Dimension::Duration => ReferenceKind::Durations,
        }
    }

    pub fn for_kind(kind: ReferenceKind) -> Self {
        match kind {
            ReferenceKind::Categories => Dimension::TripType,
            ReferenceKind::Destinations => Dimension::Destination,
            ReferenceKind::Durations => Dimension::Duration,
        }
    }

    // Key used in the page address
    pub fn url_key(&self) -> &'static str {
        match self {
            Dimension::TripType => "type",
            Dimension::Destination => "destination",
            Dimension::Duration => "duration",
        }
    }

    // Key understood by the tours endpoint
    pub fn query_key(&self) -> &'static str {
        match self {
            Dimension::TripType => "category_slug",
            Dimension::Destination => "destination_slug",
            Dimension::Duration => "duration_slug",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    pub id: Option<i64>,
    pub slug: Option<String>,
}

impl Selection {
    pub fn resolved(id: i64, slug: impl Into<String>) -> Self {
        Self {
            id: Some(id),
            slug: Some(slug.into()),
        }
    }

    pub fn is_set(&self) -> bool {
        self.id.is_some() || self.slug.is_some()
    }

    pub fn is_resolved(&self) -> bool {
        self.id.is_some() && self.slug.is_some()
    }

    pub fn clear(&mut self) {
        self.id = None;
        self.slug = None;
    }
}

// How a raw `duration` address value should be read
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DurationParam {
    LegacyId(i64),
    Slug(String),
}

impl DurationParam {
    pub fn parse(value: &str) -> Result<Self, ResolveError> {
        let trimmed = value.trim();
        if let Ok(id) = trimmed.parse::<i64>() {
            return Ok(DurationParam::LegacyId(id));
        }
        // Numeric but not an identifier, e.g. "2.5"
        if trimmed.parse::<f64>().map_or(false, |n| n.is_finite()) {
            return Err(ResolveError::MalformedInput {
                param: Dimension::Duration.url_key().to_string(),
                value: value.to_string(),
            });
        }
        Ok(DurationParam::Slug(value.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FilterState {
    trip_type: Selection,
    destination: Selection,
    duration: Selection,
    min_price: f64,
    max_price: f64,
}

impl Default for FilterState {
    fn default() -> Self {
        Self {
            trip_type: Selection::default(),
            destination: Selection::default(),
            duration: Selection::default(),
            min_price: MIN_PRICE,
            max_price: MAX_PRICE,
        }
    }
}

impl FilterState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selection(&self, dimension: Dimension) -> &Selection {
        match dimension {
            Dimension::TripType => &self.trip_type,
            Dimension::Destination => &self.destination,
            Dimension::Duration => &self.duration,
        }
    }

    fn selection_mut(&mut self, dimension: Dimension) -> &mut Selection {
        match dimension {
            Dimension::TripType => &mut self.trip_type,
            Dimension::Destination => &mut self.destination,
            Dimension::Duration => &mut self.duration,
        }
    }

    pub fn min_price(&self) -> f64 {
        self.min_price
    }

    pub fn max_price(&self) -> f64 {
        self.max_price
    }

    pub fn has_price_filter(&self) -> bool {
        self.min_price > MIN_PRICE || self.max_price < MAX_PRICE
    }

    pub fn is_selected(&self, dimension: Dimension, id: i64) -> bool {
        self.selection(dimension).id == Some(id)
    }

    pub fn is_empty(&self) -> bool {
        Dimension::ALL.iter().all(|d| !self.selection(*d).is_set()) && !self.has_price_filter()
    }

    // Re-derives the three reference dimensions from address parameters.
    // Price is not part of the address and is left as is. Returns true if anything changed.
    pub fn set_from_url<R>(&mut self, params: &QueryParams, resolver: &R) -> bool
    where
        R: IdentifierResolver + ?Sized,
    {
        let before = self.clone();

        for dimension in Dimension::ALL {
            let raw = params
                .get(dimension.url_key())
                .filter(|value| !value.trim().is_empty());

            let next = match raw {
                None => Selection::default(),
                Some(value) if dimension == Dimension::Duration => {
                    match DurationParam::parse(value) {
                        Ok(DurationParam::LegacyId(id)) => Selection {
                            id: Some(id),
                            slug: resolver.resolve_slug_from_id(dimension.reference_kind(), id),
                        },
                        Ok(DurationParam::Slug(slug)) => {
                            Self::selection_from_slug(dimension, slug, resolver)
                        }
                        Err(e) => {
                            warn!(error = %e, "ignoring duration parameter");
                            Selection::default()
                        }
                    }
                }
                Some(value) => Self::selection_from_slug(dimension, value.to_string(), resolver),
            };

            *self.selection_mut(dimension) = next;
        }

        let changed = *self != before;
        debug!(changed, state = ?self, "filter state read from address");
        changed
    }

    fn selection_from_slug<R>(dimension: Dimension, slug: String, resolver: &R) -> Selection
    where
        R: IdentifierResolver + ?Sized,
    {
        let id = resolver.resolve_id_from_slug(dimension.reference_kind(), &slug);
        if id.is_none() {
            debug!(
                dimension = dimension.url_key(),
                slug = %slug,
                "slug left pending until reference data resolves it"
            );
        }
        Selection {
            id,
            slug: Some(slug),
        }
    }

    // Interactive selection. Picking the already selected id clears the dimension.
    pub fn set_by_selection<R>(&mut self, dimension: Dimension, id: Option<i64>, resolver: &R)
    where
        R: IdentifierResolver + ?Sized,
    {
        let current = self.selection(dimension).id;
        let target = match id {
            Some(id) if current == Some(id) => None,
            other => other,
        };

        let Some(id) = target else {
            self.selection_mut(dimension).clear();
            return;
        };

        let slug = resolver.resolve_slug_from_id(dimension.reference_kind(), id);
        if slug.is_none() {
            warn!(
                dimension = dimension.url_key(),
                id, "selected id has no slug in loaded reference data"
            );
        }
        *self.selection_mut(dimension) = Selection { id: Some(id), slug };
    }

    // Clamps into the sentinel bounds. Returns true if the range changed.
    pub fn set_price_range(&mut self, min: f64, max: f64) -> bool {
        // A NaN bound falls back to its own sentinel
        let clamp = |v: f64, sentinel: f64| {
            if v.is_nan() {
                sentinel
            } else {
                v.clamp(MIN_PRICE, MAX_PRICE)
            }
        };
        let (mut min, mut max) = (clamp(min, MIN_PRICE), clamp(max, MAX_PRICE));
        if min > max {
            std::mem::swap(&mut min, &mut max);
        }

        let changed = min != self.min_price || max != self.max_price;
        self.min_price = min;
        self.max_price = max;
        changed
    }

    pub fn clear_all(&mut self) {
        *self = Self::default();
    }

    // Completes half-filled pairs for the dimension backed by `kind` once its list is loaded.
    // Returns true when a mapping was completed and the listing should be re-queried.
    pub fn reconcile<R>(&mut self, kind: ReferenceKind, resolver: &R) -> bool
    where
        R: IdentifierResolver + ?Sized,
    {
        let dimension = Dimension::for_kind(kind);
        let selection = self.selection_mut(dimension);

        match (selection.id, selection.slug.clone()) {
            (None, Some(slug)) => match resolver.resolve_id_from_slug(kind, &slug) {
                Some(id) => {
                    debug!(kind = %kind, slug = %slug, id, "pending slug resolved");
                    selection.id = Some(id);
                    true
                }
                None => {
                    if resolver.is_loaded(kind) {
                        warn!(kind = %kind, slug = %slug, "slug does not match any reference record");
                    }
                    false
                }
            },
            (Some(id), None) => match resolver.resolve_slug_from_id(kind, id) {
                Some(slug) => {
                    debug!(kind = %kind, id, slug = %slug, "legacy id resolved to slug");
                    selection.slug = Some(slug);
                    true
                }
                None => {
                    if resolver.is_loaded(kind) {
                        warn!(kind = %kind, id, "id does not match any reference record");
                    }
                    false
                }
            },
            _ => false,
        }
    }

    // Slug to send to the backend for a dimension. A retained slug is always sent, resolved
    // or not, so every page of the listing is filtered the same way.
    pub fn query_slug(&self, dimension: Dimension) -> Option<&str> {
        self.selection(dimension).slug.as_deref()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterSection {
    Category,
    Price,
    Duration,
    Destination,
}

// Accordion of filter sections: at most one section is expanded at a time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterPanel {
    expanded: Option<FilterSection>,
}

impl Default for FilterPanel {
    fn default() -> Self {
        Self {
            expanded: Some(FilterSection::Price),
        }
    }
}

impl FilterPanel {
    pub fn expanded(&self) -> Option<FilterSection> {
        self.expanded
    }

    pub fn is_expanded(&self, section: FilterSection) -> bool {
        self.expanded == Some(section)
    }

    pub fn toggle(&mut self, section: FilterSection) {
        self.expanded = if self.is_expanded(section) {
            None
        } else {
            Some(section)
        };
    }
}
