// Listing API payload records
// The backend returns loosely-shaped JSON; everything is narrowed here so the rest of the crate
// only ever sees typed, optional-field records.

use serde::{de, Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

// Lookup record shared by categories, destinations and durations
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ReferenceItem {
    #[serde(deserialize_with = "lenient_id")]
    pub id: i64,
    pub slug: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, deserialize_with = "lenient_count")]
    pub tours_count: u64,
}

impl ReferenceItem {
    pub fn new(id: i64, slug: &str, title: &str) -> Self {
        Self {
            id,
            slug: slug.to_string(),
            title: title.to_string(),
            tours_count: 0,
        }
    }
}

// `{ "data": ... }` wrapper used by every endpoint
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    pub data: T,
}

// Categories and destinations come back paginated, durations do not
#[derive(Debug, Default, Deserialize)]
pub struct ReferencePage {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub data: Vec<ReferenceItem>,
}

// One page of the tours endpoint
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TourPage {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub data: Vec<Tour>,
    #[serde(default, deserialize_with = "lenient_u64", skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
    #[serde(default, deserialize_with = "lenient_u64", skip_serializing_if = "Option::is_none")]
    pub last_page: Option<u64>,
    #[serde(default, deserialize_with = "lenient_u64", skip_serializing_if = "Option::is_none")]
    pub per_page: Option<u64>,
    #[serde(default, deserialize_with = "lenient_u64", skip_serializing_if = "Option::is_none")]
    pub current_page: Option<u64>,
}

impl TourPage {
    pub fn with_tours(tours: Vec<Tour>) -> Self {
        Self {
            data: tours,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct TourDestination {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub title: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct GalleryImage {
    #[serde(default)]
    pub image: Option<String>,
}

// Explicit SEO overrides an editor may attach to a tour
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct TourSeo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta_keywords: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub og_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub og_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub og_image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub og_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub twitter_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub twitter_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub twitter_card: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub twitter_image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub canonical: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub robots: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub structure_schema: Option<Value>,
}

// A tour as listed by the API. Fields the core does not interpret are kept in `extra`
// so the record can be handed back to the rendering layer untouched.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Tour {
    #[serde(deserialize_with = "lenient_id")]
    pub id: i64,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64", skip_serializing_if = "Option::is_none")]
    pub start_from: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64", skip_serializing_if = "Option::is_none")]
    pub adult_price: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64", skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64", skip_serializing_if = "Option::is_none")]
    pub display_order: Option<f64>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub destinations: Vec<TourDestination>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub gallery: Vec<GalleryImage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seo: Option<TourSeo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destinations_title: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Tour {
    pub fn new(id: i64, title: &str) -> Self {
        Self {
            id,
            title: title.to_string(),
            ..Default::default()
        }
    }

    // Recomputes `destinations_title` from the related destinations. Safe to call repeatedly.
    pub fn enrich(&mut self) {
        let joined = self
            .destinations
            .iter()
            .map(|d| d.title.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        self.destinations_title = Some(joined);
    }

    // Price used for ordering; a missing `start_from` sorts as 0
    pub fn sort_price(&self) -> f64 {
        self.start_from.unwrap_or(0.0)
    }

    // Price used for client-side range refinement: start_from, then adult_price, then price.
    // Zero values fall through to the next field.
    pub fn refine_price(&self) -> f64 {
        [self.start_from, self.adult_price, self.price]
            .into_iter()
            .flatten()
            .find(|p| *p != 0.0)
            .unwrap_or(0.0)
    }

    pub fn best_seller_rank(&self) -> f64 {
        self.display_order.unwrap_or(0.0)
    }

    pub fn has_destination(&self, slug: &str) -> bool {
        let wanted = slug.trim().to_lowercase();
        self.destinations.iter().any(|d| {
            d.slug
                .as_deref()
                .map_or(false, |s| s.trim().to_lowercase() == wanted)
        })
    }
}

fn number_from_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    }
}

// Accepts numbers, numeric strings and booleans; anything else becomes None
fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(number_from_value))
}

fn lenient_u64<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value
        .as_ref()
        .and_then(number_from_value)
        .filter(|n| *n >= 0.0)
        .map(|n| n as u64))
}

// Identifiers are required; integral numbers and numeric strings are both accepted
fn lenient_id<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let id = match &value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    id.ok_or_else(|| de::Error::custom(format!("invalid identifier: {}", value)))
}

fn lenient_count<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_u64(deserializer)?.unwrap_or(0))
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tour_page_with_string_numbers() {
        let json = r#"{
            "data": [
                {
                    "id": 4,
                    "title": "Nile Cruise",
                    "start_from": "450.50",
                    "display_order": true,
                    "destinations": [
                        {"id": 7, "slug": "cairo", "title": "Cairo"},
                        {"id": 9, "slug": "luxor", "title": "Luxor"}
                    ],
                    "rating": 4.8
                }
            ],
            "total": "31",
            "last_page": 3,
            "per_page": "15"
        }"#;

        let page: TourPage = serde_json::from_str(json).unwrap();
        assert_eq!(page.total, Some(31));
        assert_eq!(page.last_page, Some(3));
        assert_eq!(page.per_page, Some(15));

        let tour = &page.data[0];
        assert_eq!(tour.start_from, Some(450.5));
        assert_eq!(tour.display_order, Some(1.0));
        assert_eq!(tour.destinations.len(), 2);
        assert_eq!(tour.extra.get("rating"), Some(&serde_json::json!(4.8)));
    }

    #[test]
    fn test_nulls_and_missing_fields() {
        let json = r#"{"data": [{"id": 1, "destinations": null, "price": null, "gallery": null}]}"#;
        let page: TourPage = serde_json::from_str(json).unwrap();

        let tour = &page.data[0];
        assert!(tour.destinations.is_empty());
        assert!(tour.gallery.is_empty());
        assert_eq!(tour.price, None);
        assert_eq!(page.total, None);
        assert_eq!(page.last_page, None);
    }

    #[test]
    fn test_enrich_is_idempotent() {
        let mut tour = Tour::new(1, "Desert Safari");
        tour.destinations = vec![
            TourDestination {
                id: Some(7),
                slug: Some("cairo".to_string()),
                title: "Cairo".to_string(),
            },
            TourDestination {
                id: Some(8),
                slug: Some("giza".to_string()),
                title: "Giza".to_string(),
            },
        ];

        tour.enrich();
        tour.enrich();
        assert_eq!(tour.destinations_title.as_deref(), Some("Cairo, Giza"));
    }

    #[test]
    fn test_refine_price_priority() {
        let mut tour = Tour::new(1, "Tour");
        assert_eq!(tour.refine_price(), 0.0);

        tour.price = Some(90.0);
        assert_eq!(tour.refine_price(), 90.0);

        tour.adult_price = Some(120.0);
        assert_eq!(tour.refine_price(), 120.0);

        tour.start_from = Some(0.0);
        assert_eq!(tour.refine_price(), 120.0);

        tour.start_from = Some(80.0);
        assert_eq!(tour.refine_price(), 80.0);
    }

    #[test]
    fn test_has_destination_ignores_case_and_whitespace() {
        let mut tour = Tour::new(1, "Tour");
        tour.destinations = vec![TourDestination {
            id: Some(3),
            slug: Some(" Sharm-El-Sheikh ".to_string()),
            title: "Sharm".to_string(),
        }];

        assert!(tour.has_destination("sharm-el-sheikh"));
        assert!(!tour.has_destination("hurghada"));
    }

    #[test]
    fn test_reference_item_count_defaults_to_zero() {
        let item: ReferenceItem =
            serde_json::from_str(r#"{"id": 12, "slug": "one-week", "title": "One week"}"#).unwrap();
        assert_eq!(item.tours_count, 0);

        let item: ReferenceItem =
            serde_json::from_str(r#"{"id": 3, "slug": "day-trip", "tours_count": "14"}"#).unwrap();
        assert_eq!(item.tours_count, 14);
        assert_eq!(item.title, "");
    }

    #[test]
    fn test_string_ids_are_accepted() {
        let json = r#"{"data": {"data": [
            {"id": "7", "slug": "cairo", "title": "Cairo"},
            {"id": 9, "slug": "luxor", "title": "Luxor"}
        ]}}"#;
        let envelope: Envelope<ReferencePage> = serde_json::from_str(json).unwrap();
        let ids: Vec<i64> = envelope.data.data.iter().map(|item| item.id).collect();
        assert_eq!(ids, vec![7, 9]);

        let page: TourPage = serde_json::from_str(r#"{"data": [{"id": " 42 ", "title": "Abu Simbel"}]}"#).unwrap();
        assert_eq!(page.data[0].id, 42);
    }

    #[test]
    fn test_unusable_id_is_rejected() {
        let result: Result<ReferenceItem, _> =
            serde_json::from_str(r#"{"id": "seven", "slug": "cairo"}"#);
        assert!(result.is_err());

        let result: Result<ReferenceItem, _> = serde_json::from_str(r#"{"slug": "cairo"}"#);
        assert!(result.is_err());
    }
}
