//! Selector-candidate tables, one per target field.
//!
//! Each table is an ordered list of candidates tried in sequence; the
//! first candidate that yields a non-empty result wins. For collections
//! (reviews, amenities, photos, rooms) the first *group* that matches at
//! least one element is used in full.
//!
//! These strings track a third-party site's markup and are expected to
//! drift; treat them as data, not contract. The orderings here are the
//! canonical ones — do not reorder without re-verifying against live
//! pages.

// ── Detail page: scalar fields ──────────────────────────────────────────────

pub const DETAIL_NAME: &[&str] = &[
    r#"h2[data-testid="property-name"]"#,
    ".pp-header__title",
    "h1",
    "h2",
    ".hp__hotel-name",
    "#hp_hotel_name",
    r#"[data-testid="title"]"#,
];

pub const DETAIL_RATING: &[&str] = &[
    r#"[data-testid="review-score-component"]"#,
    ".b5cd09854e",
    r#"[aria-label*="Scored"]"#,
    ".review-score-badge",
    ".bui-review-score__badge",
    r#"[data-testid="review-score"]"#,
];

pub const DETAIL_ADDRESS: &[&str] = &[
    r#"[data-testid="address"]"#,
    ".hp_address_subtitle",
    r#"[data-node_tt_id="location_score_tooltip"]"#,
    ".pp-header__address",
    ".address",
];

pub const DETAIL_DESCRIPTION: &[&str] = &[
    r#"[data-testid="property-description"]"#,
    "#property_description_content",
    ".hp-description",
    ".property_description_content",
];

// ── Detail page: amenities ──────────────────────────────────────────────────

pub const FACILITY_GROUPS: &[&str] = &[
    r#"[data-testid="facility-group"]"#,
    r#"[data-testid="facility-group-container"]"#,
    ".hp-facility-block",
    ".facilitiesChecklistSection",
    ".b43e553776",
];

pub const FACILITY_GROUP_TITLE: &[&str] = &[
    r#"[data-testid="facility-group-title"]"#,
    ".bui-title__text",
    "h3",
    ".e7addce19e",
];

pub const FACILITY_ITEMS: &[&str] = &[
    "li",
    r#"[data-testid="facility-item"]"#,
    ".bui-list__item",
    r#"[data-testid="facility-group-item"]"#,
];

pub const POPULAR_FACILITIES: &[&str] = &[
    ".important_facility",
    ".hp_facility_list li",
    ".facility-item",
];

/// Category label for amenities with no resolvable group title.
pub const GENERIC_AMENITY_CATEGORY: &str = "General";

/// Category label for the separately-collected popular facility set.
pub const POPULAR_AMENITY_CATEGORY: &str = "Popular";

// ── Detail page: reviews ────────────────────────────────────────────────────

/// Review card groups, in priority order. The author-name selector is a
/// last resort: its matches are leaf nodes, so each is widened to the
/// nearest enclosing container.
pub const REVIEW_CARDS: &[&str] = &[
    r#"[data-testid="review-card"]"#,
    ".review_item",
    ".c-review-block",
    ".featured_review",
    ".review_list_new_item_block",
    r#"[data-testid="review-author-name"]"#,
];

/// The REVIEW_CARDS entry whose matches need widening to a container.
pub const REVIEW_AUTHOR_LEAF: &str = r#"[data-testid="review-author-name"]"#;

pub const REVIEW_AUTHOR: &[&str] = &[
    r#"[data-testid="review-author-name"]"#,
    ".bui-avatar-block__title",
    ".c-review-block__title",
    ".review_item_reviewer_name",
    ".bui-avatar-block__text",
    ".a3332d4613",
    r#".be659bb4c2 [class*="title"]"#,
    ".be659bb4c2 div:first-child",
    ".review-card__author",
    ".review-author-name",
];

pub const REVIEW_SCORE: &[&str] = &[
    r#"[data-testid="review-score-badge"]"#,
    ".bui-review-score__badge",
    ".review-score-badge",
    ".b5cd09854e",
    ".abf0933828",
    ".a7da303032",
    ".d22a77730d",
    ".be06d33c8b",
    r#"[aria-label*="Scored"]"#,
];

pub const REVIEW_TITLE: &[&str] = &[
    r#"[data-testid="review-title"]"#,
    ".review_item_header_content",
    ".c-review-block__title",
];

pub const REVIEW_POSITIVE: &[&str] = &[
    r#"[data-testid="review-positive-text"]"#,
    ".c-review__body--translated",
    ".c-review__body",
];

pub const REVIEW_NEGATIVE: &[&str] = &[r#"[data-testid="review-negative-text"]"#];

pub const REVIEW_DATE: &[&str] = &[
    r#"[data-testid="review-date"]"#,
    ".c-review-block__date",
    ".review_item_date",
];

/// Controls that force lazy-loaded reviews to render when clicked.
pub const REVIEW_TRIGGERS: &[&str] = &[
    r#"[data-testid="read-all-actionable"]"#,
    r#"[data-testid="review-score-read-all"]"#,
    ".hp_reviews_count",
    "#show_reviews_tab",
];

/// A reviewer-name first line longer than this is review prose, not a name.
pub const MAX_REVIEWER_NAME_LEN: usize = 40;

/// Comment fallback keeps at most this many characters of the card text.
pub const MAX_COMMENT_FALLBACK_CHARS: usize = 300;

// ── Detail page: photos and rooms ───────────────────────────────────────────

pub const PHOTO_GROUPS: &[&str] = &[
    r#"[data-testid="gallery-image"] img"#,
    ".hp-gallery-image img",
    ".hotel_main_gallery img",
    r#"[data-testid="hotel-gallery"] img"#,
    ".bh-photo-grid-item img",
    ".bh-photo-grid-thumb img",
    ".gallery-side-reviews-wrapper img",
];

pub const PHOTO_SRC_ATTRS: &[&str] = &["src", "data-lazy", "data-src"];

pub const ROOM_CARDS: &[&str] = &[
    r#"[data-testid="room-card"]"#,
    ".hprt-table tr",
    ".hp-room-details",
];

pub const ROOM_NAME: &[&str] = &[
    ".hprt-roomtype-icon-link",
    r#"[data-testid="room-name"]"#,
    ".room-name",
];

pub const ROOM_PRICE: &[&str] = &[
    ".bui-price-display__value",
    ".prco-valign-middle-helper",
    r#"[data-testid="price-and-discounted-price"]"#,
];

pub const ROOM_OCCUPANCY: &[&str] = &[
    r#"[data-testid="occupancy-config"]"#,
    ".hprt-occupancy-occupancy-info",
    ".c-occupancy-icons",
];

// ── Search results page ─────────────────────────────────────────────────────

pub const LISTING_CARDS: &[&str] = &[r#"[data-testid="property-card"]"#, ".sr_item"];

pub const LISTING_NAME: &[&str] = &[r#"[data-testid="title"]"#, ".sr-hotel__name"];

pub const LISTING_LINKS: &[&str] = &[
    r#"a[data-testid="title-link"]"#,
    r#"a[href*="/hotel/"]"#,
    "h3 a",
    "a[aria-label]",
];

pub const LISTING_PRICE: &[&str] = &[
    r#"[data-testid="price-and-discounted-price"]"#,
    ".prco-valign-middle-helper",
    ".bui-price-display__value",
    r#"[data-testid="price-for-x-nights"]"#,
];

pub const LISTING_RATING: &[&str] = &[
    r#"[data-testid="review-score"]"#,
    ".b5cd09854e",
    r#"[aria-label*="Scored"]"#,
    ".bui-review-score__badge",
];

// ── Page readiness and challenge markers ────────────────────────────────────

/// Core content that signals a detail page has rendered.
pub const DETAIL_READY: &str = r#"h1, h2, [data-testid="property-name"]"#;

/// Bot-challenge overlay markers. Presence delays extraction (bounded);
/// a marker that never clears does not fail the fetch.
pub const CHALLENGE_MARKERS: &[&str] = &[
    "#challenge-running",
    "#px-captcha",
    r#"[id^="cf-chl"]"#,
    r#"iframe[src*="challenge"]"#,
];

/// One comma-joined query matching any review card group, for in-page
/// element counting.
pub fn review_card_query() -> String {
    REVIEW_CARDS.join(", ")
}

/// One comma-joined query matching any challenge marker.
pub fn challenge_query() -> String {
    CHALLENGE_MARKERS.join(", ")
}

/// One comma-joined query matching any listing card group.
pub fn listing_card_query() -> String {
    LISTING_CARDS.join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Selector;

    #[test]
    fn test_every_candidate_parses_as_a_selector() {
        let tables: &[&[&str]] = &[
            DETAIL_NAME,
            DETAIL_RATING,
            DETAIL_ADDRESS,
            DETAIL_DESCRIPTION,
            FACILITY_GROUPS,
            FACILITY_GROUP_TITLE,
            FACILITY_ITEMS,
            POPULAR_FACILITIES,
            REVIEW_CARDS,
            REVIEW_AUTHOR,
            REVIEW_SCORE,
            REVIEW_TITLE,
            REVIEW_POSITIVE,
            REVIEW_NEGATIVE,
            REVIEW_DATE,
            REVIEW_TRIGGERS,
            PHOTO_GROUPS,
            ROOM_CARDS,
            ROOM_NAME,
            ROOM_PRICE,
            ROOM_OCCUPANCY,
            LISTING_CARDS,
            LISTING_NAME,
            LISTING_LINKS,
            LISTING_PRICE,
            LISTING_RATING,
            CHALLENGE_MARKERS,
        ];
        for table in tables {
            for candidate in *table {
                assert!(
                    Selector::parse(candidate).is_ok(),
                    "invalid selector: {candidate}"
                );
            }
        }
        assert!(Selector::parse(DETAIL_READY).is_ok());
        assert!(Selector::parse(&review_card_query()).is_ok());
        assert!(Selector::parse(&challenge_query()).is_ok());
    }
}
