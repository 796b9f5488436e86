// Main library file for the tour catalog listing

// Modules, bottom-up: wire payloads, reference data, filter state, address sync, backend,
// queries, client-side refinement, page metadata and the session tying them together
pub mod api;
pub mod filter;
pub mod payload;
pub mod query;
pub mod reference;
pub mod refine;
pub mod seo;
pub mod session;
pub mod url_sync;

// Re-export key types for convenience
pub use api::{
    ApiError, ClientConfig, ClientError, ClientStats, HttpListingApi, ListingApi,
};
pub use filter::{Dimension, FilterPanel, FilterSection, FilterState, Selection};
pub use payload::{ReferenceItem, Tour, TourPage};
pub use query::{QueryExecutor, ResultSet, TourQuery, ITEMS_PER_PAGE};
pub use reference::{IdentifierResolver, ReferenceCatalog, ReferenceKind, ResolveError};
pub use refine::{PriceCriteria, SortOrder};
pub use seo::{SeoDefaults, SeoMetadata, SeoSink};
pub use session::{FetchTicket, ListingConfig, ListingPhase, ListingSession};
pub use url_sync::{Navigator, QueryParams, UrlSynchronizer};
