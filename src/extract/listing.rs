//! Search-results page extraction.

use super::dom::parse_price;
use super::selectors::*;
use super::{element_text, first_number, first_text_in};
use crate::models::{hotel_id_for_name, normalize_rating, ListingSummary};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Extract listing summaries from a rendered search-results page.
///
/// Cards without a resolvable name are skipped; everything else degrades
/// to a default (price 0, rating 0, no URL).
pub fn extract_listings(
    html: &str,
    base_url: &str,
    max_results: usize,
    currency: &str,
) -> Vec<ListingSummary> {
    let doc = Html::parse_document(html);
    let base = Url::parse(base_url).ok();
    let number = Regex::new(r"\d+(?:[.,]\d+)?").expect("valid pattern");

    let mut out = Vec::new();
    for card in listing_cards(&doc) {
        if out.len() >= max_results {
            break;
        }
        let Some(name) = first_text_in(card, LISTING_NAME) else {
            continue;
        };

        let price = first_text_in(card, LISTING_PRICE)
            .and_then(|t| parse_price(&t))
            .unwrap_or(0.0);

        let rating = extract_card_rating(card, &number)
            .map(normalize_rating)
            .unwrap_or(0.0);

        let url = detail_link(card, base.as_ref());

        out.push(ListingSummary {
            hotel_id: hotel_id_for_name(&name),
            name,
            price,
            currency: currency.to_string(),
            rating,
            url,
        });
    }
    out
}

fn listing_cards(doc: &Html) -> Vec<ElementRef<'_>> {
    for candidate in LISTING_CARDS {
        let Ok(selector) = Selector::parse(candidate) else {
            continue;
        };
        let cards: Vec<_> = doc.select(&selector).collect();
        if !cards.is_empty() {
            return cards;
        }
    }
    Vec::new()
}

fn extract_card_rating(card: ElementRef<'_>, number: &Regex) -> Option<f64> {
    for candidate in LISTING_RATING {
        let Ok(selector) = Selector::parse(candidate) else {
            continue;
        };
        for el in card.select(&selector) {
            if let Some(label) = el.value().attr("aria-label") {
                if let Some(v) = first_number(label, number) {
                    return Some(v);
                }
            }
            if let Some(v) = first_number(&element_text(el), number) {
                return Some(v);
            }
        }
    }
    None
}

/// Resolve the card's detail-page link: must point at a hotel page, is
/// absolutized against the site base, and has tracking query/fragment
/// stripped.
fn detail_link(card: ElementRef<'_>, base: Option<&Url>) -> Option<String> {
    for candidate in LISTING_LINKS {
        let Ok(selector) = Selector::parse(candidate) else {
            continue;
        };
        for anchor in card.select(&selector) {
            let Some(href) = anchor.value().attr("href") else {
                continue;
            };
            if !href.contains("/hotel/") {
                continue;
            }
            let resolved = match base {
                Some(base) => base.join(href),
                None => Url::parse(href),
            };
            let Ok(mut url) = resolved else {
                continue;
            };
            url.set_query(None);
            url.set_fragment(None);
            return Some(url.to_string());
        }
    }
    None
}
