//! DOM-based extraction.
//!
//! The fallback pass for everything JSON-LD misses, and the primary
//! source for reviews, amenity grouping, photos, and room offers. Works
//! over ordered selector-candidate tables; tolerant of partial pages by
//! construction, since every field resolves independently.

use super::selectors::*;
use super::{element_text, first_number, first_text_in, DetailDraft, ExtractLimits, ReviewDraft};
use crate::models::{AmenityEntry, PhotoEntry, RoomTypeEntry, ANONYMOUS_REVIEWER};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;

/// Extract a detail draft from a rendered page snapshot.
pub fn extract_dom(html: &str, limits: &ExtractLimits) -> DetailDraft {
    let doc = Html::parse_document(html);
    let scores = ScorePatterns::new();

    let mut draft = DetailDraft {
        name: first_text(&doc, DETAIL_NAME).or_else(|| title_tag_name(&doc)),
        rating: extract_overall_rating(&doc, &scores),
        address: first_text(&doc, DETAIL_ADDRESS),
        description: first_text(&doc, DETAIL_DESCRIPTION),
        ..Default::default()
    };

    draft.amenities = extract_amenities(&doc);
    draft.reviews = extract_reviews(&doc, &scores, limits.max_reviews);
    draft.photos = extract_photos(&doc, limits.max_photos);
    draft.room_types = extract_rooms(&doc, &scores, limits);

    draft
}

/// Compiled once per pass; review pages can carry dozens of cards.
struct ScorePatterns {
    /// "8.5/10", "8,5 / 10"
    out_of_ten: Regex,
    /// Any decimal number.
    number: Regex,
}

impl ScorePatterns {
    fn new() -> Self {
        Self {
            out_of_ten: Regex::new(r"(\d+(?:[.,]\d+)?)\s*/\s*10").expect("valid pattern"),
            number: Regex::new(r"\d+(?:[.,]\d+)?").expect("valid pattern"),
        }
    }

    fn first_number(&self, text: &str) -> Option<f64> {
        first_number(text, &self.number)
    }

    fn score_out_of_ten(&self, text: &str) -> Option<f64> {
        self.out_of_ten
            .captures(text)
            .and_then(|c| c.get(1))
            .and_then(|m| m.as_str().replace(',', ".").parse().ok())
    }
}

// ── Shared walkers ──────────────────────────────────────────────────────────

/// Whole-document text of the first element matched by any candidate.
fn first_text(doc: &Html, candidates: &[&str]) -> Option<String> {
    for candidate in candidates {
        let Ok(selector) = Selector::parse(candidate) else {
            continue;
        };
        if let Some(el) = doc.select(&selector).next() {
            let text = element_text(el);
            if !text.is_empty() {
                return Some(text);
            }
        }
    }
    None
}

/// Element text as trimmed, non-empty lines, one per text node.
fn element_lines(el: ElementRef<'_>) -> Vec<String> {
    el.text()
        .flat_map(|chunk| chunk.split('\n'))
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Nearest `div` or `li` ancestor, for widening a leaf match to its card.
fn closest_container(el: ElementRef<'_>) -> ElementRef<'_> {
    let mut node = el;
    for ancestor in el.ancestors() {
        if let Some(parent) = ElementRef::wrap(ancestor) {
            let tag = parent.value().name();
            if tag == "div" || tag == "li" {
                return parent;
            }
            node = parent;
        }
    }
    node
}

/// First selector in the table matching at least one element; returns all
/// its matches.
fn first_group<'a>(doc: &'a Html, candidates: &[&str]) -> Vec<ElementRef<'a>> {
    for candidate in candidates {
        let Ok(selector) = Selector::parse(candidate) else {
            continue;
        };
        let matches: Vec<_> = doc.select(&selector).collect();
        if !matches.is_empty() {
            return matches;
        }
    }
    Vec::new()
}

// ── Scalars ─────────────────────────────────────────────────────────────────

/// `<title>` fallback for the hotel name, with the site suffix chopped.
fn title_tag_name(doc: &Html) -> Option<String> {
    let selector = Selector::parse("title").ok()?;
    let title = element_text(doc.select(&selector).next()?);
    let name = title
        .split(['-', '|', '–'])
        .next()
        .map(str::trim)
        .unwrap_or_default();
    (!name.is_empty()).then(|| name.to_string())
}

fn extract_overall_rating(doc: &Html, scores: &ScorePatterns) -> Option<f64> {
    for candidate in DETAIL_RATING {
        let Ok(selector) = Selector::parse(candidate) else {
            continue;
        };
        for el in doc.select(&selector) {
            if let Some(label) = el.value().attr("aria-label") {
                if let Some(v) = scores.first_number(label) {
                    return Some(v);
                }
            }
            if let Some(v) = scores.first_number(&element_text(el)) {
                return Some(v);
            }
        }
    }
    None
}

// ── Amenities ───────────────────────────────────────────────────────────────

fn extract_amenities(doc: &Html) -> Vec<AmenityEntry> {
    let mut out = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();

    for group in first_group(doc, FACILITY_GROUPS) {
        let category = first_text_in(group, FACILITY_GROUP_TITLE)
            .unwrap_or_else(|| GENERIC_AMENITY_CATEGORY.to_string());
        for candidate in FACILITY_ITEMS {
            let Ok(selector) = Selector::parse(candidate) else {
                continue;
            };
            let items: Vec<_> = group.select(&selector).collect();
            if items.is_empty() {
                continue;
            }
            for item in items {
                push_amenity(&mut out, &mut seen, &category, &element_text(item));
            }
            break;
        }
    }

    // Popular facilities are a separate block near the header.
    for el in first_group(doc, POPULAR_FACILITIES) {
        push_amenity(
            &mut out,
            &mut seen,
            POPULAR_AMENITY_CATEGORY,
            &element_text(el),
        );
    }

    out
}

fn push_amenity(
    out: &mut Vec<AmenityEntry>,
    seen: &mut HashSet<String>,
    category: &str,
    name: &str,
) {
    let name = name.trim();
    if name.is_empty() || name.len() > 100 {
        return;
    }
    if seen.insert(name.to_lowercase()) {
        out.push(AmenityEntry {
            category: category.to_string(),
            name: name.to_string(),
        });
    }
}

// ── Reviews ─────────────────────────────────────────────────────────────────

fn extract_reviews(doc: &Html, scores: &ScorePatterns, max: usize) -> Vec<ReviewDraft> {
    let cards = review_cards(doc);
    let mut out: Vec<ReviewDraft> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();

    for card in cards {
        if out.len() >= max {
            break;
        }
        let Some(review) = extract_review_card(card, scores) else {
            continue;
        };
        if seen.insert(review.comment.clone()) {
            out.push(review);
        }
    }
    out
}

/// Find review cards by the first matching group. The author-name leaf
/// selector needs each match widened to its enclosing container.
fn review_cards(doc: &Html) -> Vec<ElementRef<'_>> {
    for candidate in REVIEW_CARDS {
        let Ok(selector) = Selector::parse(candidate) else {
            continue;
        };
        let matches: Vec<_> = doc.select(&selector).collect();
        if matches.is_empty() {
            continue;
        }
        if *candidate == REVIEW_AUTHOR_LEAF {
            return matches.into_iter().map(closest_container).collect();
        }
        return matches;
    }
    Vec::new()
}

fn extract_review_card(card: ElementRef<'_>, scores: &ScorePatterns) -> Option<ReviewDraft> {
    let lines = element_lines(card);

    let reviewer_name = first_text_in(card, REVIEW_AUTHOR)
        .or_else(|| {
            // First short line of the card is usually the name.
            lines
                .first()
                .filter(|l| l.chars().count() < MAX_REVIEWER_NAME_LEN)
                .cloned()
        })
        .unwrap_or_else(|| ANONYMOUS_REVIEWER.to_string());

    let rating = extract_review_score(card, scores, &lines);

    let title = first_text_in(card, REVIEW_TITLE);
    let positive = first_text_in(card, REVIEW_POSITIVE);
    let negative = first_text_in(card, REVIEW_NEGATIVE);
    let parts: Vec<String> = [title, positive, negative].into_iter().flatten().collect();

    let comment = if parts.is_empty() {
        let full = element_text(card);
        full.chars().take(MAX_COMMENT_FALLBACK_CHARS).collect()
    } else {
        parts.join(". ")
    };
    let comment = comment.trim().to_string();
    if comment.is_empty() {
        return None;
    }

    let date = first_text_in(card, REVIEW_DATE)
        .map(|d| d.trim_start_matches("Reviewed:").trim().to_string());

    Some(ReviewDraft {
        reviewer_name,
        rating,
        comment,
        date,
    })
}

/// Per-review score resolution, in order: badge element, aria-label,
/// an "x/10" phrase anywhere in the card, a lone-number line.
fn extract_review_score(
    card: ElementRef<'_>,
    scores: &ScorePatterns,
    lines: &[String],
) -> Option<f64> {
    for candidate in REVIEW_SCORE {
        let Ok(selector) = Selector::parse(candidate) else {
            continue;
        };
        if let Some(el) = card.select(&selector).next() {
            if let Some(label) = el.value().attr("aria-label") {
                if let Some(v) = scores.first_number(label) {
                    return Some(v);
                }
            }
            if let Some(v) = scores.first_number(&element_text(el)) {
                return Some(v);
            }
        }
    }

    let full = element_text(card);
    if let Some(v) = scores.score_out_of_ten(&full) {
        return Some(v);
    }

    lines
        .iter()
        .find_map(|line| line.replace(',', ".").parse::<f64>().ok())
        .filter(|v| (0.0..=10.0).contains(v))
}

// ── Photos and rooms ────────────────────────────────────────────────────────

fn extract_photos(doc: &Html, max: usize) -> Vec<PhotoEntry> {
    let mut out = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();

    for img in first_group(doc, PHOTO_GROUPS) {
        if out.len() >= max {
            break;
        }
        let Some(url) = PHOTO_SRC_ATTRS
            .iter()
            .find_map(|attr| img.value().attr(attr))
        else {
            continue;
        };
        let url = url.trim();
        if url.is_empty() || url.starts_with("data:") || url.contains("placeholder") {
            continue;
        }
        if !seen.insert(url.to_string()) {
            continue;
        }
        let caption = img
            .value()
            .attr("alt")
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .map(str::to_string);
        out.push(PhotoEntry {
            url: url.to_string(),
            caption,
        });
    }
    out
}

fn extract_rooms(doc: &Html, scores: &ScorePatterns, limits: &ExtractLimits) -> Vec<RoomTypeEntry> {
    let mut out: Vec<RoomTypeEntry> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();

    for card in first_group(doc, ROOM_CARDS) {
        if out.len() >= limits.max_room_types {
            break;
        }
        let Some(name) = first_text_in(card, ROOM_NAME) else {
            continue;
        };
        if !seen.insert(name.to_lowercase()) {
            continue;
        }

        let price = first_text_in(card, ROOM_PRICE)
            .and_then(|text| parse_price(&text))
            .unwrap_or(0.0);

        let max_occupancy = first_text_in(card, ROOM_OCCUPANCY)
            .and_then(|text| scores.first_number(&text))
            .map(|v| v as u32)
            .filter(|&v| v > 0);

        out.push(RoomTypeEntry {
            name,
            price,
            currency: limits.default_currency.clone(),
            max_occupancy,
        });
    }
    out
}

/// Pull the digits out of a displayed price ("₹ 12,500" -> 12500.0).
pub(crate) fn parse_price(text: &str) -> Option<f64> {
    let cleaned: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    cleaned.parse().ok().filter(|v: &f64| *v > 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limits() -> ExtractLimits {
        ExtractLimits::default()
    }

    const NO_JSONLD_PAGE: &str = r#"<!DOCTYPE html>
<html><head><title>Hotel Sea Breeze - Mumbai - Booked Tonight</title></head>
<body>
  <h2 data-testid="property-name">Hotel Sea Breeze</h2>
  <div data-testid="review-score-component" aria-label="Scored 8.4">8.4 Very good</div>
  <div data-testid="address">12 Marine Drive, Mumbai 400002, India</div>
  <div data-testid="property-description">A quiet mid-range stay off Marine Drive.</div>

  <div data-testid="facility-group">
    <div data-testid="facility-group-title">Internet</div>
    <ul><li>Free WiFi</li><li>Wired internet</li></ul>
  </div>
  <div data-testid="facility-group">
    <div data-testid="facility-group-title">Food</div>
    <ul><li>Restaurant</li><li>Free WiFi</li></ul>
  </div>
  <div class="important_facility">Airport shuttle</div>

  <div data-testid="review-card">
    <div data-testid="review-author-name">Asha</div>
    <div data-testid="review-score-badge">9.0</div>
    <div data-testid="review-title">Lovely stay</div>
    <div data-testid="review-positive-text">Rooms were spotless</div>
    <div data-testid="review-negative-text">Lift is slow</div>
    <div data-testid="review-date">Reviewed: 3 March 2025</div>
  </div>
  <div data-testid="review-card">
    <div data-testid="review-author-name">Rahul</div>
    <div data-testid="review-positive-text">Great breakfast</div>
  </div>

  <img data-testid="gallery-image" src="ignored"/>
  <div data-testid="gallery-image"><img src="https://cf.example/a.jpg" alt="Lobby"/></div>
  <div data-testid="gallery-image"><img data-lazy="https://cf.example/b.jpg"/></div>
  <div data-testid="gallery-image"><img src="https://cf.example/a.jpg"/></div>
  <div data-testid="gallery-image"><img src="https://cf.example/placeholder.gif"/></div>

  <div data-testid="room-card">
    <span data-testid="room-name">Deluxe Double Room</span>
    <span data-testid="price-and-discounted-price">₹ 7,200</span>
    <span data-testid="occupancy-config">Max persons: 2</span>
  </div>
</body></html>"#;

    #[test]
    fn test_scalars_from_dom() {
        let draft = extract_dom(NO_JSONLD_PAGE, &limits());
        assert_eq!(draft.name.as_deref(), Some("Hotel Sea Breeze"));
        assert_eq!(draft.rating, Some(8.4));
        assert_eq!(
            draft.address.as_deref(),
            Some("12 Marine Drive, Mumbai 400002, India")
        );
        assert_eq!(
            draft.description.as_deref(),
            Some("A quiet mid-range stay off Marine Drive.")
        );
    }

    #[test]
    fn test_amenity_groups_and_dedupe() {
        let draft = extract_dom(NO_JSONLD_PAGE, &limits());
        let names: Vec<&str> = draft.amenities.iter().map(|a| a.name.as_str()).collect();
        // "Free WiFi" appears in two groups; only the first survives.
        assert_eq!(
            names,
            vec!["Free WiFi", "Wired internet", "Restaurant", "Airport shuttle"]
        );
        assert_eq!(draft.amenities[0].category, "Internet");
        assert_eq!(draft.amenities[2].category, "Food");
        assert_eq!(draft.amenities[3].category, "Popular");
    }

    #[test]
    fn test_duplicate_amenity_in_one_group_collapses() {
        let html = r#"
        <div data-testid="facility-group">
          <div data-testid="facility-group-title">Popular</div>
          <ul><li>Free WiFi</li><li>Pool</li><li>Free WiFi</li></ul>
        </div>"#;
        let draft = extract_dom(html, &limits());
        assert_eq!(draft.amenities.len(), 2);
        assert!(draft.amenities.iter().all(|a| a.category == "Popular"));
        assert_eq!(draft.amenities[0].name, "Free WiFi");
        assert_eq!(draft.amenities[1].name, "Pool");
    }

    #[test]
    fn test_review_cards() {
        let draft = extract_dom(NO_JSONLD_PAGE, &limits());
        assert_eq!(draft.reviews.len(), 2);

        let first = &draft.reviews[0];
        assert_eq!(first.reviewer_name, "Asha");
        assert_eq!(first.rating, Some(9.0));
        assert_eq!(
            first.comment,
            "Lovely stay. Rooms were spotless. Lift is slow"
        );
        assert_eq!(first.date.as_deref(), Some("3 March 2025"));

        // No badge on the second card and no x/10 phrase: score stays open.
        assert_eq!(draft.reviews[1].rating, None);
    }

    #[test]
    fn test_photos_skip_placeholders_and_duplicates() {
        let draft = extract_dom(NO_JSONLD_PAGE, &limits());
        let urls: Vec<&str> = draft.photos.iter().map(|p| p.url.as_str()).collect();
        assert_eq!(
            urls,
            vec!["https://cf.example/a.jpg", "https://cf.example/b.jpg"]
        );
        assert_eq!(draft.photos[0].caption.as_deref(), Some("Lobby"));
    }

    #[test]
    fn test_room_offer() {
        let draft = extract_dom(NO_JSONLD_PAGE, &limits());
        assert_eq!(draft.room_types.len(), 1);
        let room = &draft.room_types[0];
        assert_eq!(room.name, "Deluxe Double Room");
        assert_eq!(room.price, 7200.0);
        assert_eq!(room.currency, "INR");
        assert_eq!(room.max_occupancy, Some(2));
    }

    #[test]
    fn test_title_tag_name_fallback() {
        let html = "<html><head><title>Grand Plaza - Delhi deals</title></head><body></body></html>";
        let draft = extract_dom(html, &limits());
        assert_eq!(draft.name.as_deref(), Some("Grand Plaza"));
    }

    #[test]
    fn test_legacy_markup_still_extracts() {
        // Older markup generation: class-based selectors only.
        let html = r#"
        <h2 class="hp__hotel-name">Old Town Lodge</h2>
        <div class="review_item">
          <span class="review_item_reviewer_name">Meera</span>
          <p>Liked the courtyard. 8.5/10 would return.</p>
        </div>"#;
        let draft = extract_dom(html, &limits());
        assert_eq!(draft.name.as_deref(), Some("Old Town Lodge"));
        assert_eq!(draft.reviews.len(), 1);
        assert_eq!(draft.reviews[0].reviewer_name, "Meera");
        assert_eq!(draft.reviews[0].rating, Some(8.5));
    }

    #[test]
    fn test_short_first_line_is_the_reviewer_name() {
        let html = r#"
        <div data-testid="review-card">J. Smith
        Wonderful stay, will come back.</div>"#;
        let draft = extract_dom(html, &limits());
        assert_eq!(draft.reviews.len(), 1);
        assert_eq!(draft.reviews[0].reviewer_name, "J. Smith");
    }

    #[test]
    fn test_long_first_line_is_not_a_name() {
        let html = r#"
        <div data-testid="review-card">
          This opening sentence is clearly review prose and far longer than any name would be.
        </div>"#;
        let draft = extract_dom(html, &limits());
        assert_eq!(draft.reviews.len(), 1);
        assert_eq!(draft.reviews[0].reviewer_name, "Anonymous");
    }

    #[test]
    fn test_review_cap() {
        let mut html = String::new();
        for i in 0..25 {
            html.push_str(&format!(
                r#"<div data-testid="review-card"><div data-testid="review-positive-text">Comment number {i}</div></div>"#
            ));
        }
        let draft = extract_dom(&html, &limits());
        assert_eq!(draft.reviews.len(), 10);
    }

    #[test]
    fn test_duplicate_comments_collapse() {
        let html = r#"
        <div data-testid="review-card"><div data-testid="review-positive-text">Same words</div></div>
        <div data-testid="review-card"><div data-testid="review-positive-text">Same words</div></div>"#;
        let draft = extract_dom(html, &limits());
        assert_eq!(draft.reviews.len(), 1);
    }

    #[test]
    fn test_parse_price() {
        assert_eq!(parse_price("₹ 12,500"), Some(12500.0));
        assert_eq!(parse_price("US$89"), Some(89.0));
        assert_eq!(parse_price("Sold out"), None);
    }

    #[test]
    fn test_empty_page_yields_empty_draft() {
        let draft = extract_dom("<html><body></body></html>", &limits());
        assert!(draft.name.is_none());
        assert!(draft.rating.is_none());
        assert!(draft.reviews.is_empty());
        assert!(draft.amenities.is_empty());
    }
}
