//! Page extraction: structured-data pass, DOM fallback pass, listing
//! parsing, and final assembly.
//!
//! All extraction functions are pure over an HTML snapshot string. The
//! engine takes snapshots through the renderer and hands them here, so
//! everything in this module is testable with inline fixtures.

pub mod assemble;
pub mod dom;
pub mod listing;
pub mod selectors;
pub mod structured;

pub use assemble::assemble_detail;
pub use dom::extract_dom;
pub use listing::extract_listings;
pub use structured::extract_structured;

use regex::Regex;
use scraper::{ElementRef, Selector};

/// Element text with all whitespace runs collapsed to single spaces.
pub(crate) fn element_text(el: ElementRef<'_>) -> String {
    let joined: String = el.text().collect::<Vec<_>>().join(" ");
    joined.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Text of the first element under `root` matched by any candidate, in
/// table order. Unparseable candidates are skipped.
pub(crate) fn first_text_in(root: ElementRef<'_>, candidates: &[&str]) -> Option<String> {
    for candidate in candidates {
        let Ok(selector) = Selector::parse(candidate) else {
            continue;
        };
        if let Some(el) = root.select(&selector).next() {
            let text = element_text(el);
            if !text.is_empty() {
                return Some(text);
            }
        }
    }
    None
}

/// First decimal number in `text`; a comma decimal mark is tolerated.
pub(crate) fn first_number(text: &str, number: &Regex) -> Option<f64> {
    number
        .find(text)
        .and_then(|m| m.as_str().replace(',', ".").parse().ok())
}

/// Caps and defaults applied during extraction.
#[derive(Debug, Clone)]
pub struct ExtractLimits {
    pub max_reviews: usize,
    pub max_room_types: usize,
    pub max_photos: usize,
    /// Currency code used when the page does not state one.
    pub default_currency: String,
}

impl Default for ExtractLimits {
    fn default() -> Self {
        Self {
            max_reviews: 10,
            max_room_types: 10,
            max_photos: 15,
            default_currency: "INR".to_string(),
        }
    }
}

impl ExtractLimits {
    pub fn from_config(cfg: &crate::config::Config) -> Self {
        Self {
            max_reviews: cfg.max_reviews,
            max_room_types: cfg.max_room_types,
            max_photos: cfg.max_photos,
            default_currency: cfg.default_currency.clone(),
        }
    }
}

/// A partially-filled detail record produced by one extraction pass.
///
/// Ratings are kept raw (source scale) here; normalization happens once,
/// during assembly.
#[derive(Debug, Clone, Default)]
pub struct DetailDraft {
    pub name: Option<String>,
    pub rating: Option<f64>,
    pub address: Option<String>,
    pub description: Option<String>,
    pub amenities: Vec<crate::models::AmenityEntry>,
    /// Reviews found by this pass. For the structured pass these are the
    /// held-aside fallback reviews, merged only when the DOM found none.
    pub reviews: Vec<ReviewDraft>,
    pub photos: Vec<crate::models::PhotoEntry>,
    pub room_types: Vec<crate::models::RoomTypeEntry>,
    pub check_in_time: Option<String>,
    pub check_out_time: Option<String>,
    pub policies: Option<String>,
    pub contact_phone: Option<String>,
    pub contact_email: Option<String>,
}

/// A review before score substitution and normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewDraft {
    pub reviewer_name: String,
    /// Raw score on whatever scale the page used; `None` when no score
    /// could be resolved (the hotel's overall rating is substituted later).
    pub rating: Option<f64>,
    pub comment: String,
    pub date: Option<String>,
}
