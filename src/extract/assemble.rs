//! Merge the structured and DOM passes into a final detail record.

use super::{DetailDraft, ExtractLimits, ReviewDraft};
use crate::models::{hotel_id_for_name, normalize_rating, HotelDetail, ReviewEntry};
use std::collections::HashSet;
use std::hash::Hash;

/// Merge the two extraction passes. DOM wins for scalars it resolved;
/// collections use the DOM result when non-empty, the structured result
/// otherwise. Reviews are strictly either/or since the two passes see the
/// same reviews in different shapes and interleaving would duplicate them.
///
/// Returns `None` when neither pass found a hotel name; everything else
/// is optional.
pub fn assemble_detail(
    structured: DetailDraft,
    dom: DetailDraft,
    limits: &ExtractLimits,
) -> Option<HotelDetail> {
    let name = dom
        .name
        .or(structured.name)
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())?;

    let raw_rating = dom.rating.or(structured.rating).unwrap_or(0.0);
    let rating = normalize_rating(raw_rating);

    let reviews = if !dom.reviews.is_empty() {
        dom.reviews
    } else {
        structured.reviews
    };
    let reviews = finalize_reviews(reviews, rating, limits.max_reviews);

    // Uniqueness holds per fetch whichever pass supplied the collection;
    // the DOM pass dedupes as it goes, JSON-LD arrives verbatim.
    let amenities = dedupe_by(pick(dom.amenities, structured.amenities), |a| {
        a.name.to_lowercase()
    });
    let photos = truncated(pick(dom.photos, structured.photos), limits.max_photos);
    let room_types = truncated(
        dedupe_by(pick(dom.room_types, structured.room_types), |r| {
            r.name.to_lowercase()
        }),
        limits.max_room_types,
    );

    Some(HotelDetail {
        hotel_id: hotel_id_for_name(&name),
        name,
        rating,
        address: dom.address.or(structured.address),
        description: dom.description.or(structured.description),
        amenities,
        reviews,
        photos,
        room_types,
        check_in_time: dom.check_in_time.or(structured.check_in_time),
        check_out_time: dom.check_out_time.or(structured.check_out_time),
        policies: dom.policies.or(structured.policies),
        contact_phone: dom.contact_phone.or(structured.contact_phone),
        contact_email: dom.contact_email.or(structured.contact_email),
    })
}

fn pick<T>(primary: Vec<T>, fallback: Vec<T>) -> Vec<T> {
    if primary.is_empty() {
        fallback
    } else {
        primary
    }
}

fn truncated<T>(mut items: Vec<T>, max: usize) -> Vec<T> {
    items.truncate(max);
    items
}

/// Keep the first item for each key, preserving order.
fn dedupe_by<T, K: Eq + Hash>(items: Vec<T>, key: impl Fn(&T) -> K) -> Vec<T> {
    let mut seen = HashSet::new();
    items.into_iter().filter(|item| seen.insert(key(item))).collect()
}

/// Normalize per-review scores; a review with no resolvable score takes
/// the hotel's overall rating instead of dropping out. Duplicate comments
/// collapse to the first occurrence.
fn finalize_reviews(drafts: Vec<ReviewDraft>, overall: f64, max: usize) -> Vec<ReviewEntry> {
    dedupe_by(drafts, |d| d.comment.clone())
        .into_iter()
        .take(max)
        .map(|d| ReviewEntry {
            reviewer_name: d.reviewer_name,
            rating: match d.rating {
                Some(raw) => normalize_rating(raw),
                None => overall,
            },
            comment: d.comment,
            date: d.date,
        })
        .collect()
}
