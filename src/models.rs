//! Core data model for hotel listings and detail records.
//!
//! Everything here is created fresh per fetch, lives for the duration of
//! one HTTP response (or one cache entry), and is never persisted.

use fnv::FnvHasher;
use serde::{Deserialize, Serialize};
use std::hash::Hasher;

/// Derived identifiers are reduced into `[0, HOTEL_ID_MODULUS)`.
/// Collisions are tolerated; ids are recomputed on every fetch.
pub const HOTEL_ID_MODULUS: u64 = 100_000;

/// Placeholder reviewer name when no author could be resolved.
pub const ANONYMOUS_REVIEWER: &str = "Anonymous";

/// One row of a search-results page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingSummary {
    pub hotel_id: u32,
    pub name: String,
    pub price: f64,
    pub currency: String,
    /// Always on the 0-5 scale.
    pub rating: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Full detail record for a single hotel page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HotelDetail {
    pub hotel_id: u32,
    pub name: String,
    /// Always on the 0-5 scale.
    pub rating: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub amenities: Vec<AmenityEntry>,
    #[serde(default)]
    pub reviews: Vec<ReviewEntry>,
    #[serde(default)]
    pub photos: Vec<PhotoEntry>,
    #[serde(default)]
    pub room_types: Vec<RoomTypeEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub check_in_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub check_out_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub policies: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_email: Option<String>,
}

/// A single amenity under a category label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmenityEntry {
    pub category: String,
    pub name: String,
}

/// A guest review. The date string is passed through exactly as found.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewEntry {
    pub reviewer_name: String,
    /// Always on the 0-5 scale.
    pub rating: f64,
    pub comment: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

/// A gallery photo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhotoEntry {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
}

/// An offered room type. Price defaults to 0 when not resolvable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomTypeEntry {
    pub name: String,
    pub price: f64,
    pub currency: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_occupancy: Option<u32>,
}

/// Normalize a raw rating onto the 0-5 scale.
///
/// The source site mixes 5- and 10-point scales: any value above 5 is
/// halved, and the result is clamped to `[0, 5]` and rounded to one
/// decimal place.
pub fn normalize_rating(raw: f64) -> f64 {
    if !raw.is_finite() || raw <= 0.0 {
        return 0.0;
    }
    let scaled = if raw > 5.0 { raw / 2.0 } else { raw };
    (scaled.min(5.0) * 10.0).round() / 10.0
}

/// Derive a stable numeric identifier from a hotel name.
///
/// FNV-1a over the name bytes, reduced modulo [`HOTEL_ID_MODULUS`]. Pure
/// and total: the same name always yields the same id, and distinct names
/// may (rarely) collide.
pub fn hotel_id_for_name(name: &str) -> u32 {
    let mut hasher = FnvHasher::default();
    hasher.write(name.as_bytes());
    (hasher.finish() % HOTEL_ID_MODULUS) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_keeps_five_point_values() {
        assert_eq!(normalize_rating(4.5), 4.5);
        assert_eq!(normalize_rating(5.0), 5.0);
        assert_eq!(normalize_rating(0.0), 0.0);
    }

    #[test]
    fn test_normalize_halves_ten_point_values() {
        assert_eq!(normalize_rating(9.2), 4.6);
        assert_eq!(normalize_rating(10.0), 5.0);
        assert_eq!(normalize_rating(7.0), 3.5);
    }

    #[test]
    fn test_normalize_always_in_range() {
        for raw in [-3.0, 0.0, 0.1, 4.9, 5.1, 9.9, 11.0, 1000.0, f64::NAN] {
            let r = normalize_rating(raw);
            assert!((0.0..=5.0).contains(&r), "{raw} normalized to {r}");
        }
    }

    #[test]
    fn test_hotel_id_is_deterministic() {
        let a = hotel_id_for_name("Taj Mahal Palace");
        let b = hotel_id_for_name("Taj Mahal Palace");
        assert_eq!(a, b);
        assert!((a as u64) < HOTEL_ID_MODULUS);
    }

    #[test]
    fn test_hotel_id_handles_any_input() {
        // Never panics, regardless of content.
        hotel_id_for_name("");
        hotel_id_for_name("ホテル日航");
        hotel_id_for_name(&"x".repeat(10_000));
    }
}
