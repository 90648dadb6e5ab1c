//! Structured-data extraction from embedded JSON-LD.
//!
//! Detail pages usually carry a `<script type="application/ld+json">`
//! block describing the property. This pass is attempted first because it
//! is immune to class-name churn; the DOM pass fills whatever it misses.

use super::{DetailDraft, ReviewDraft};
use crate::models::{AmenityEntry, PhotoEntry, ANONYMOUS_REVIEWER};
use scraper::{Html, Selector};
use serde_json::Value;

const HOTEL_TYPES: &[&str] = &["Hotel", "Accommodation", "LodgingBusiness", "Resort", "Motel"];

/// Extract whatever the page's JSON-LD blocks describe about the property.
///
/// Returns an empty draft when no usable block exists; never fails on
/// malformed JSON (bad blocks are skipped).
pub fn extract_structured(html: &str) -> DetailDraft {
    let doc = Html::parse_document(html);
    let mut draft = DetailDraft::default();

    let selector = match Selector::parse(r#"script[type="application/ld+json"]"#) {
        Ok(s) => s,
        Err(_) => return draft,
    };

    for script in doc.select(&selector) {
        let raw: String = script.text().collect();
        let parsed: Value = match serde_json::from_str(raw.trim()) {
            Ok(v) => v,
            Err(_) => continue,
        };
        for node in flatten_graph(&parsed) {
            if is_hotel_node(node) {
                merge_hotel_node(&mut draft, node);
            }
        }
    }

    draft
}

/// Expand a JSON-LD document into its candidate nodes: the root itself,
/// each element of a root array, and each element of an `@graph`.
fn flatten_graph(value: &Value) -> Vec<&Value> {
    let mut nodes = Vec::new();
    match value {
        Value::Array(items) => {
            for item in items {
                nodes.extend(flatten_graph(item));
            }
        }
        Value::Object(map) => {
            if let Some(Value::Array(graph)) = map.get("@graph") {
                for item in graph {
                    nodes.extend(flatten_graph(item));
                }
            }
            nodes.push(value);
        }
        _ => {}
    }
    nodes
}

fn is_hotel_node(node: &Value) -> bool {
    match node.get("@type") {
        Some(Value::String(t)) => HOTEL_TYPES.contains(&t.as_str()),
        Some(Value::Array(types)) => types
            .iter()
            .filter_map(|t| t.as_str())
            .any(|t| HOTEL_TYPES.contains(&t)),
        _ => false,
    }
}

/// Fold one hotel node into the draft. Existing values win, so the first
/// block naming a field is authoritative when a page carries several.
fn merge_hotel_node(draft: &mut DetailDraft, node: &Value) {
    if draft.name.is_none() {
        draft.name = string_field(node, "name");
    }
    if draft.description.is_none() {
        draft.description = string_field(node, "description");
    }
    if draft.address.is_none() {
        draft.address = node.get("address").and_then(flatten_address);
    }
    if draft.rating.is_none() {
        draft.rating = node
            .get("aggregateRating")
            .and_then(|r| r.get("ratingValue"))
            .and_then(as_f64_lenient);
    }
    if draft.check_in_time.is_none() {
        draft.check_in_time = string_field(node, "checkinTime");
    }
    if draft.check_out_time.is_none() {
        draft.check_out_time = string_field(node, "checkoutTime");
    }
    if draft.contact_phone.is_none() {
        draft.contact_phone = string_field(node, "telephone");
    }
    if draft.contact_email.is_none() {
        draft.contact_email = string_field(node, "email");
    }

    if draft.amenities.is_empty() {
        if let Some(features) = node.get("amenityFeature") {
            draft.amenities = collect_amenities(features);
        }
    }
    if draft.photos.is_empty() {
        if let Some(image) = node.get("image") {
            draft.photos = collect_photos(image);
        }
    }
    if draft.reviews.is_empty() {
        if let Some(Value::Array(reviews)) = node.get("review") {
            draft.reviews = reviews.iter().filter_map(parse_review).collect();
        }
    }
}

fn string_field(node: &Value, key: &str) -> Option<String> {
    node.get(key)
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Numeric values in JSON-LD show up as both numbers and strings.
fn as_f64_lenient(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// A postal address is either a plain string or a PostalAddress object;
/// the object form is flattened to one comma-separated line.
fn flatten_address(address: &Value) -> Option<String> {
    if let Some(s) = address.as_str() {
        let s = s.trim();
        return (!s.is_empty()).then(|| s.to_string());
    }
    let parts: Vec<String> = [
        "streetAddress",
        "addressLocality",
        "addressRegion",
        "postalCode",
        "addressCountry",
    ]
    .iter()
    .filter_map(|key| string_field(address, key))
    .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join(", "))
    }
}

fn collect_amenities(features: &Value) -> Vec<AmenityEntry> {
    let items = match features {
        Value::Array(items) => items.as_slice(),
        other => std::slice::from_ref(other),
    };
    items
        .iter()
        .filter_map(|item| match item {
            Value::String(s) => Some(s.trim().to_string()),
            Value::Object(_) => string_field(item, "name"),
            _ => None,
        })
        .filter(|name| !name.is_empty())
        .map(|name| AmenityEntry {
            category: super::selectors::GENERIC_AMENITY_CATEGORY.to_string(),
            name,
        })
        .collect()
}

fn collect_photos(image: &Value) -> Vec<PhotoEntry> {
    let items = match image {
        Value::Array(items) => items.as_slice(),
        other => std::slice::from_ref(other),
    };
    items
        .iter()
        .filter_map(|item| match item {
            Value::String(s) => Some(s.trim().to_string()),
            Value::Object(_) => string_field(item, "url"),
            _ => None,
        })
        .filter(|url| !url.is_empty())
        .map(|url| PhotoEntry { url, caption: None })
        .collect()
}

fn parse_review(review: &Value) -> Option<ReviewDraft> {
    let comment = string_field(review, "reviewBody")
        .or_else(|| string_field(review, "description"))?;

    let reviewer_name = match review.get("author") {
        Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
        Some(author @ Value::Object(_)) => {
            string_field(author, "name").unwrap_or_else(|| ANONYMOUS_REVIEWER.to_string())
        }
        _ => ANONYMOUS_REVIEWER.to_string(),
    };

    let rating = review
        .get("reviewRating")
        .and_then(|r| r.get("ratingValue"))
        .and_then(as_f64_lenient);

    let date = string_field(review, "datePublished")
        .or_else(|| string_field(review, "dateCreated"));

    Some(ReviewDraft {
        reviewer_name,
        rating,
        comment,
        date,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL_JSONLD_PAGE: &str = r#"<!DOCTYPE html>
<html><head>
<script type="application/ld+json">
{
  "@context": "https://schema.org",
  "@type": "Hotel",
  "name": "The Taj Mahal Palace",
  "description": "Iconic seafront hotel overlooking the Gateway of India.",
  "address": {
    "@type": "PostalAddress",
    "streetAddress": "Apollo Bandar, Colaba",
    "addressLocality": "Mumbai",
    "addressRegion": "Maharashtra",
    "postalCode": "400001",
    "addressCountry": "IN"
  },
  "aggregateRating": { "@type": "AggregateRating", "ratingValue": "9.2", "reviewCount": 8123 },
  "amenityFeature": [
    { "@type": "LocationFeatureSpecification", "name": "Outdoor pool" },
    "Free WiFi"
  ],
  "image": ["https://cf.example/photo1.jpg", { "url": "https://cf.example/photo2.jpg" }],
  "checkinTime": "14:00",
  "checkoutTime": "12:00",
  "telephone": "+91 22 6665 3366",
  "review": [
    {
      "@type": "Review",
      "author": { "@type": "Person", "name": "Priya S" },
      "reviewRating": { "ratingValue": 10 },
      "reviewBody": "Stunning heritage wing, impeccable staff.",
      "datePublished": "2024-11-02"
    },
    {
      "@type": "Review",
      "author": "Marco",
      "reviewBody": "Great location."
    }
  ]
}
</script>
</head><body><h1>ignored</h1></body></html>"#;

    #[test]
    fn test_extracts_full_hotel_node() {
        let draft = extract_structured(FULL_JSONLD_PAGE);
        assert_eq!(draft.name.as_deref(), Some("The Taj Mahal Palace"));
        assert_eq!(draft.rating, Some(9.2));
        assert_eq!(
            draft.address.as_deref(),
            Some("Apollo Bandar, Colaba, Mumbai, Maharashtra, 400001, IN")
        );
        assert_eq!(draft.check_in_time.as_deref(), Some("14:00"));
        assert_eq!(draft.check_out_time.as_deref(), Some("12:00"));
        assert_eq!(draft.contact_phone.as_deref(), Some("+91 22 6665 3366"));

        assert_eq!(draft.amenities.len(), 2);
        assert_eq!(draft.amenities[0].name, "Outdoor pool");
        assert_eq!(draft.amenities[1].name, "Free WiFi");
        assert_eq!(draft.amenities[0].category, "General");

        assert_eq!(draft.photos.len(), 2);
        assert_eq!(draft.photos[1].url, "https://cf.example/photo2.jpg");

        assert_eq!(draft.reviews.len(), 2);
        assert_eq!(draft.reviews[0].reviewer_name, "Priya S");
        assert_eq!(draft.reviews[0].rating, Some(10.0));
        assert_eq!(draft.reviews[0].date.as_deref(), Some("2024-11-02"));
        assert_eq!(draft.reviews[1].reviewer_name, "Marco");
        assert_eq!(draft.reviews[1].rating, None);
    }

    #[test]
    fn test_hotel_node_inside_graph() {
        let html = r#"<script type="application/ld+json">
        {"@graph":[
          {"@type":"WebPage","name":"not a hotel"},
          {"@type":["Thing","LodgingBusiness"],"name":"Graph Inn","aggregateRating":{"ratingValue":8.0}}
        ]}</script>"#;
        let draft = extract_structured(html);
        assert_eq!(draft.name.as_deref(), Some("Graph Inn"));
        assert_eq!(draft.rating, Some(8.0));
    }

    #[test]
    fn test_malformed_block_is_skipped() {
        let html = r#"
        <script type="application/ld+json">{not json at all</script>
        <script type="application/ld+json">{"@type":"Hotel","name":"Second Block"}</script>"#;
        let draft = extract_structured(html);
        assert_eq!(draft.name.as_deref(), Some("Second Block"));
    }

    #[test]
    fn test_non_hotel_page_yields_empty_draft() {
        let html = r#"<script type="application/ld+json">{"@type":"Recipe","name":"Soup"}</script>"#;
        let draft = extract_structured(html);
        assert!(draft.name.is_none());
        assert!(draft.reviews.is_empty());
    }

    #[test]
    fn test_string_address_passes_through() {
        let html = r#"<script type="application/ld+json">
        {"@type":"Hotel","name":"Plain Inn","address":"1 Main St, Smallville"}</script>"#;
        let draft = extract_structured(html);
        assert_eq!(draft.address.as_deref(), Some("1 Main St, Smallville"));
    }
}
