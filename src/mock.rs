//! Canned listings served when scraping fails and the fallback is on.

use crate::models::ListingSummary;

/// Mock listings for a handful of well-known cities. Unknown cities get
/// an empty list, which the API layer reports as not found.
pub fn listings_for_city(city: &str) -> Vec<ListingSummary> {
    match city.to_lowercase().as_str() {
        "mumbai" => vec![
            listing(101, "Taj Mahal Palace", 250.0, 4.9),
            listing(102, "Trident Nariman Point", 180.0, 4.5),
        ],
        "delhi" => vec![
            listing(201, "The Leela Palace New Delhi", 300.0, 4.8),
            listing(202, "The Oberoi", 275.0, 4.7),
        ],
        "bangalore" => vec![
            listing(301, "ITC Gardenia", 200.0, 4.6),
            listing(302, "The Ritz-Carlton", 220.0, 4.7),
        ],
        _ => Vec::new(),
    }
}

fn listing(hotel_id: u32, name: &str, price: f64, rating: f64) -> ListingSummary {
    ListingSummary {
        hotel_id,
        name: name.to_string(),
        price,
        currency: "USD".to_string(),
        rating,
        url: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_cities_case_insensitive() {
        assert_eq!(listings_for_city("Mumbai").len(), 2);
        assert_eq!(listings_for_city("DELHI")[0].hotel_id, 201);
        assert_eq!(listings_for_city("bangalore")[1].name, "The Ritz-Carlton");
    }

    #[test]
    fn test_unknown_city_is_empty() {
        assert!(listings_for_city("Atlantis").is_empty());
    }
}
