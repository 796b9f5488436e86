// SEO metadata handed to the page-head collaborator after data loads.
// Best effort only: every field has a fallback and publishing never fails.

use serde::Serialize;

use crate::payload::{Tour, TourSeo};

pub const DESCRIPTION_LIMIT: usize = 160;

#[derive(Debug, Clone, PartialEq)]
pub struct SeoDefaults {
    pub site_name: String,
    pub fallback_image: String,
    pub listing_title: String,
    pub listing_description: String,
}

impl Default for SeoDefaults {
    fn default() -> Self {
        Self {
            site_name: "MG Travel".to_string(),
            fallback_image: "/assets/image/logo-MG-Travel.webp".to_string(),
            listing_title: "Tour Search - MG Travel".to_string(),
            listing_description: "Find the perfect tour for your next adventure with MG Travel. \
                Browse our wide selection of tours and destinations."
                .to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SeoMetadata {
    pub title: String,
    pub description: String,
    pub image: String,
    // Explicit editor overrides, forwarded untouched
    pub overrides: TourSeo,
}

impl SeoMetadata {
    pub fn for_listing(defaults: &SeoDefaults) -> Self {
        Self {
            title: defaults.listing_title.clone(),
            description: truncate_chars(&defaults.listing_description, DESCRIPTION_LIMIT),
            image: defaults.fallback_image.clone(),
            overrides: TourSeo::default(),
        }
    }

    pub fn for_tour(tour: &Tour, defaults: &SeoDefaults) -> Self {
        let seo = tour.seo.clone().unwrap_or_default();

        let title = first_present(&[seo.meta_title.as_deref(), seo.og_title.as_deref()])
            .map(str::to_string)
            .unwrap_or_else(|| format!("{} - {}", tour.title, defaults.site_name));

        let description = first_present(&[
            seo.meta_description.as_deref(),
            seo.og_description.as_deref(),
            tour.short_description.as_deref(),
            tour.description.as_deref(),
        ])
        .map(str::to_string)
        .unwrap_or_else(|| {
            format!(
                "Book {} tour with {}. Experience amazing destinations and create unforgettable memories.",
                tour.title, defaults.site_name
            )
        });

        let gallery_image = tour.gallery.first().and_then(|g| g.image.as_deref());
        let image = first_present(&[seo.og_image.as_deref(), tour.image.as_deref(), gallery_image])
            .map(str::to_string)
            .unwrap_or_else(|| defaults.fallback_image.clone());

        Self {
            title,
            description: truncate_chars(&description, DESCRIPTION_LIMIT),
            image,
            overrides: seo,
        }
    }
}

fn first_present<'a>(candidates: &[Option<&'a str>]) -> Option<&'a str> {
    candidates
        .iter()
        .flatten()
        .copied()
        .find(|value| !value.trim().is_empty())
}

// Truncates on a char boundary
pub fn truncate_chars(value: &str, limit: usize) -> String {
    match value.char_indices().nth(limit) {
        Some((index, _)) => value[..index].to_string(),
        None => value.to_string(),
    }
}

// Page-head collaborator; fire and forget
pub trait SeoSink: Send + Sync {
    fn publish(&self, metadata: SeoMetadata);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSeo;

impl SeoSink for NoopSeo {
    fn publish(&self, _metadata: SeoMetadata) {}
}
