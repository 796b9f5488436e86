// Client-side result refinement
// Sorting and price filtering applied to an already fetched page; nothing here hits the API.

use std::cmp::Ordering;

use crate::filter::FilterState;
use crate::payload::Tour;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortOrder {
    Recent,
    BestSeller,
    PriceLowToHigh,
    PriceHighToLow,
}

impl SortOrder {
    // Values coming from the sort picker; unknown values leave the order alone
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "recent" => Some(SortOrder::Recent),
            "bestseller" | "bestSeller" => Some(SortOrder::BestSeller),
            "priceLowToHigh" => Some(SortOrder::PriceLowToHigh),
            "priceHighToLow" => Some(SortOrder::PriceHighToLow),
            _ => None,
        }
    }
}

// Stable sort, so ties keep the order the backend returned
pub fn sort_tours(tours: &mut [Tour], order: SortOrder) {
    match order {
        SortOrder::Recent => tours.sort_by(|a, b| b.id.cmp(&a.id)),
        SortOrder::BestSeller => {
            tours.sort_by(|a, b| descending(a.best_seller_rank(), b.best_seller_rank()))
        }
        SortOrder::PriceLowToHigh => {
            tours.sort_by(|a, b| a.sort_price().total_cmp(&b.sort_price()))
        }
        SortOrder::PriceHighToLow => {
            tours.sort_by(|a, b| descending(a.sort_price(), b.sort_price()))
        }
    }
}

fn descending(a: f64, b: f64) -> Ordering {
    b.total_cmp(&a)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceCriteria {
    pub min_price: f64,
    pub max_price: f64,
}

impl PriceCriteria {
    pub fn from_filter(filter: &FilterState) -> Self {
        Self {
            min_price: filter.min_price(),
            max_price: filter.max_price(),
        }
    }

    pub fn matches(&self, tour: &Tour) -> bool {
        let price = tour.refine_price();
        price >= self.min_price && price <= self.max_price
    }
}

// Fallback for deployments whose backend ignores min_price/max_price
pub fn filter_by_price(tours: &[Tour], criteria: &PriceCriteria) -> Vec<Tour> {
    tours
        .iter()
        .filter(|tour| criteria.matches(tour))
        .cloned()
        .collect()
}

// Tours related to a destination slug (case and surrounding whitespace ignored)
pub fn tours_for_destination(tours: &[Tour], slug: &str) -> Vec<Tour> {
    tours
        .iter()
        .filter(|tour| tour.has_destination(slug))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::TourDestination;
    use test_case::test_case;

    fn priced(id: i64, start_from: Option<f64>) -> Tour {
        let mut tour = Tour::new(id, &format!("Tour {}", id));
        tour.start_from = start_from;
        tour
    }

    fn sample() -> Vec<Tour> {
        let mut a = priced(10, Some(300.0));
        a.display_order = Some(2.0);
        let mut b = priced(30, None);
        b.display_order = None;
        let mut c = priced(20, Some(150.0));
        c.display_order = Some(5.0);
        vec![a, b, c]
    }

    #[test_case(SortOrder::Recent, vec![30, 20, 10]; "recent is id descending")]
    #[test_case(SortOrder::BestSeller, vec![20, 10, 30]; "best seller treats missing as zero")]
    #[test_case(SortOrder::PriceLowToHigh, vec![30, 20, 10]; "low to high puts missing price first")]
    #[test_case(SortOrder::PriceHighToLow, vec![10, 20, 30]; "high to low puts missing price last")]
    fn test_sort_orders(order: SortOrder, expected_ids: Vec<i64>) {
        let mut tours = sample();
        sort_tours(&mut tours, order);
        assert_eq!(tours.iter().map(|t| t.id).collect::<Vec<_>>(), expected_ids);
    }

    #[test]
    fn test_price_low_to_high_with_missing_price() {
        let mut tours = vec![priced(1, Some(300.0)), priced(2, None), priced(3, Some(150.0))];

        sort_tours(&mut tours, SortOrder::PriceLowToHigh);

        let prices: Vec<f64> = tours.iter().map(Tour::sort_price).collect();
        assert_eq!(prices, vec![0.0, 150.0, 300.0]);
    }

    #[test]
    fn test_sort_is_stable_for_ties() {
        let mut tours = vec![priced(1, Some(100.0)), priced(2, Some(100.0)), priced(3, Some(50.0))];
        sort_tours(&mut tours, SortOrder::PriceHighToLow);
        assert_eq!(tours.iter().map(|t| t.id).collect::<Vec<_>>(), vec![1, 2, 3]);
    }

    #[test_case("recent", Some(SortOrder::Recent))]
    #[test_case("bestseller", Some(SortOrder::BestSeller))]
    #[test_case("bestSeller", Some(SortOrder::BestSeller))]
    #[test_case("priceLowToHigh", Some(SortOrder::PriceLowToHigh))]
    #[test_case("priceHighToLow", Some(SortOrder::PriceHighToLow))]
    #[test_case("popular", None)]
    fn test_parse_sort_order(value: &str, expected: Option<SortOrder>) {
        assert_eq!(SortOrder::parse(value), expected);
    }

    fn refine_sample() -> Vec<Tour> {
        let mut by_start = priced(1, Some(120.0));
        by_start.adult_price = Some(900.0);

        let mut by_adult = priced(2, None);
        by_adult.adult_price = Some(450.0);

        let mut by_price = priced(3, None);
        by_price.price = Some(60.0);

        let unpriced = priced(4, None);

        vec![by_start, by_adult, by_price, unpriced]
    }

    #[test_case(PriceCriteria { min_price: 0.0, max_price: 5000.0 }, vec![1, 2, 3, 4]; "full range keeps everything")]
    #[test_case(PriceCriteria { min_price: 100.0, max_price: 500.0 }, vec![1, 2]; "start_from beats adult_price")]
    #[test_case(PriceCriteria { min_price: 0.0, max_price: 100.0 }, vec![3, 4]; "unpriced counts as zero")]
    #[test_case(PriceCriteria { min_price: 450.0, max_price: 450.0 }, vec![2]; "bounds are inclusive")]
    fn test_filter_by_price(criteria: PriceCriteria, expected_ids: Vec<i64>) {
        let filtered = filter_by_price(&refine_sample(), &criteria);
        assert_eq!(filtered.iter().map(|t| t.id).collect::<Vec<_>>(), expected_ids);
    }

    #[test]
    fn test_criteria_from_filter_state() {
        let mut filter = FilterState::new();
        filter.set_price_range(100.0, 200.0);

        let criteria = PriceCriteria::from_filter(&filter);

        assert_eq!(criteria.min_price, 100.0);
        assert_eq!(criteria.max_price, 200.0);
    }

    #[test]
    fn test_tours_for_destination() {
        let mut cairo = Tour::new(1, "City tour");
        cairo.destinations = vec![TourDestination {
            id: Some(7),
            slug: Some("Cairo".to_string()),
            title: "Cairo".to_string(),
        }];
        let luxor = Tour::new(2, "Valley of the Kings");

        let matching = tours_for_destination(&[cairo, luxor], "cairo");

        assert_eq!(matching.len(), 1);
        assert_eq!(matching[0].id, 1);
    }
}
