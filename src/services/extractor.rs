// src/services/extractor.rs

//! Listing-item field extraction.
//!
//! Each listing item yields a candidate [`ProductRecord`] with four
//! independently optional fields; an item where all four come up empty is
//! discarded. The secondary identifier hides behind a nested, percent-encoded
//! JSON payload embedded in a data attribute ([`decode_secondary_id`]).

use scraper::{ElementRef, Html, Selector};

use crate::error::{AppError, Result};
use crate::models::{MarkupConfig, ProductRecord};
use crate::utils::resolve;

/// Query parameter marker isolating the JSON fragment inside the decoded
/// trigger URL.
const SECONDARY_PARAM_MARKER: &str = "pl=";

/// Everything extracted from one listing page.
#[derive(Debug, Default)]
pub struct ListingPage {
    /// Records kept (at least one recognized field each)
    pub records: Vec<ProductRecord>,
    /// Items discarded because no field was recognized
    pub skipped: usize,
    /// Absolute URL of the next listing page, if the page links one
    pub next_url: Option<String>,
}

/// Extracts product fields from listing markup using configured markers.
pub struct FieldExtractor {
    item_sel: Selector,
    title_sel: Selector,
    image_sel: Selector,
    external_id_sel: Selector,
    trigger_sel: Selector,
    next_page_sel: Selector,
    external_id_attr: String,
    trigger_attr: String,
}

impl FieldExtractor {
    /// Compile the configured selectors once up front.
    pub fn new(markup: &MarkupConfig) -> Result<Self> {
        Ok(Self {
            item_sel: parse_selector(&markup.item_selector)?,
            title_sel: parse_selector(&markup.title_selector)?,
            image_sel: parse_selector(&markup.image_selector)?,
            external_id_sel: parse_selector(&format!("[{}]", markup.external_id_attr))?,
            trigger_sel: parse_selector(&format!("[{}]", markup.trigger_attr))?,
            next_page_sel: parse_selector(&markup.next_page_selector)?,
            external_id_attr: markup.external_id_attr.clone(),
            trigger_attr: markup.trigger_attr.clone(),
        })
    }

    /// Parse one listing page body into records and the next-page link.
    ///
    /// Pure with respect to the store: extraction never performs I/O, so it
    /// is unit-testable on raw markup fragments.
    pub fn parse_listing_page(&self, body: &str, page_url: &str) -> ListingPage {
        let document = Html::parse_document(body);

        let mut page = ListingPage::default();
        for item in document.select(&self.item_sel) {
            match self.extract_item(&item) {
                Some(record) => page.records.push(record),
                None => page.skipped += 1,
            }
        }

        page.next_url = self.next_page_url(&document, page_url);
        page
    }

    /// Extract a candidate record from one listing item.
    ///
    /// Returns `None` when no field is recognized; a single present field is
    /// enough to keep the item.
    pub fn extract_item(&self, item: &ElementRef) -> Option<ProductRecord> {
        // Source sites sometimes nest a truncated title before the full one,
        // so the last matching element wins.
        let name = item
            .select(&self.title_sel)
            .last()
            .map(|el| el.text().collect::<String>().trim().to_string())
            .unwrap_or_default();

        let external_id = item
            .select(&self.external_id_sel)
            .next()
            .and_then(|el| el.value().attr(&self.external_id_attr))
            .unwrap_or_default()
            .to_string();

        let image_url = item
            .select(&self.image_sel)
            .next()
            .and_then(|el| el.value().attr("src"))
            .unwrap_or_default()
            .to_string();

        let secondary_id = match item
            .select(&self.trigger_sel)
            .next()
            .and_then(|el| el.value().attr(&self.trigger_attr))
        {
            Some(payload) => decode_secondary_id(payload).unwrap_or_else(|| {
                log::warn!("Failed to decode secondary id from trigger payload");
                String::new()
            }),
            None => String::new(),
        };

        let record = ProductRecord {
            name,
            external_id,
            secondary_id,
            image_url,
        };

        if record.is_empty() {
            log::info!("Skipping item with no recognized fields");
            return None;
        }
        Some(record)
    }

    /// Resolve the next-page link, if the page exposes one.
    fn next_page_url(&self, document: &Html, page_url: &str) -> Option<String> {
        let href = document
            .select(&self.next_page_sel)
            .next()
            .and_then(|el| el.value().attr("href"))?;
        resolve(page_url, href).or_else(|| Some(href.to_string()))
    }
}

/// Recover the secondary identifier from the trigger payload.
///
/// Decode layers, each of which may fail and short-circuit to `None`:
/// attribute JSON → `ajaxUrl` string → percent-decode → JSON fragment after
/// the `pl=` marker → `adCreativeMetaData.adCreativeDetails[0].adId`.
pub fn decode_secondary_id(payload: &str) -> Option<String> {
    let trigger: serde_json::Value = serde_json::from_str(payload).ok()?;
    let ajax_url = trigger.get("ajaxUrl")?.as_str()?;
    let decoded = urlencoding::decode(ajax_url).ok()?;
    let fragment = decoded.split_once(SECONDARY_PARAM_MARKER)?.1;
    let meta: serde_json::Value = serde_json::from_str(fragment).ok()?;
    meta.get("adCreativeMetaData")?
        .get("adCreativeDetails")?
        .get(0)?
        .get("adId")?
        .as_str()
        .map(String::from)
}

fn parse_selector(s: &str) -> Result<Selector> {
    Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MarkupConfig;

    fn extractor() -> FieldExtractor {
        FieldExtractor::new(&MarkupConfig::default()).unwrap()
    }

    /// Trigger payload whose decoded `ajaxUrl` yields `adId = "sku-42"`.
    fn trigger_payload() -> String {
        let inner = r#"{"adCreativeMetaData":{"adCreativeDetails":[{"adId":"sku-42"}]}}"#;
        let ajax_url = format!("/ajax/modal?x=1&pl={}", urlencoding::encode(inner));
        serde_json::json!({ "ajaxUrl": ajax_url }).to_string()
    }

    fn item_html(trigger: &str) -> String {
        format!(
            r#"<div class="sg-col-inner">
                 <span class="a-size-base-plus">Short…</span>
                 <span class="a-size-base-plus">Acme Widget Deluxe</span>
                 <div data-csa-c-asin="B000TEST01"></div>
                 <span data-s-safe-ajax-modal-trigger='{trigger}'></span>
                 <img class="s-image" src="https://img.example.com/w.jpg">
               </div>"#
        )
    }

    #[test]
    fn test_extract_all_fields() {
        let html = item_html(&trigger_payload());
        let page = extractor().parse_listing_page(&html, "https://shop.example.com/s");

        assert_eq!(page.records.len(), 1);
        assert_eq!(page.skipped, 0);

        let record = &page.records[0];
        // Last title match wins over the truncated one.
        assert_eq!(record.name, "Acme Widget Deluxe");
        assert_eq!(record.external_id, "B000TEST01");
        assert_eq!(record.secondary_id, "sku-42");
        assert_eq!(record.image_url, "https://img.example.com/w.jpg");
    }

    #[test]
    fn test_all_empty_item_discarded() {
        let html = r#"<div class="sg-col-inner"><p>sponsored filler</p></div>"#;
        let page = extractor().parse_listing_page(html, "https://shop.example.com/s");

        assert!(page.records.is_empty());
        assert_eq!(page.skipped, 1);
    }

    #[test]
    fn test_single_field_is_enough() {
        let html = r#"<div class="sg-col-inner">
                        <img class="s-image" src="https://img.example.com/only.jpg">
                      </div>"#;
        let page = extractor().parse_listing_page(html, "https://shop.example.com/s");

        assert_eq!(page.records.len(), 1);
        assert_eq!(page.records[0].image_url, "https://img.example.com/only.jpg");
        assert!(page.records[0].external_id.is_empty());
    }

    #[test]
    fn test_decode_happy_path() {
        assert_eq!(
            decode_secondary_id(&trigger_payload()).as_deref(),
            Some("sku-42")
        );
    }

    #[test]
    fn test_decode_invalid_outer_json() {
        assert_eq!(decode_secondary_id("not json"), None);
    }

    #[test]
    fn test_decode_missing_ajax_url() {
        assert_eq!(decode_secondary_id(r#"{"other":"x"}"#), None);
    }

    #[test]
    fn test_decode_missing_marker() {
        let payload = serde_json::json!({ "ajaxUrl": "/ajax/modal?x=1" }).to_string();
        assert_eq!(decode_secondary_id(&payload), None);
    }

    #[test]
    fn test_decode_invalid_inner_json() {
        let payload =
            serde_json::json!({ "ajaxUrl": "/ajax/modal?pl=%7Bbroken" }).to_string();
        assert_eq!(decode_secondary_id(&payload), None);
    }

    #[test]
    fn test_decode_empty_details_array() {
        let inner = r#"{"adCreativeMetaData":{"adCreativeDetails":[]}}"#;
        let payload = serde_json::json!({
            "ajaxUrl": format!("/ajax/modal?pl={}", urlencoding::encode(inner))
        })
        .to_string();
        assert_eq!(decode_secondary_id(&payload), None);
    }

    #[test]
    fn test_corrupt_payload_leaves_other_fields_intact() {
        let html = item_html("{broken json");
        let page = extractor().parse_listing_page(&html, "https://shop.example.com/s");

        assert_eq!(page.records.len(), 1);
        let record = &page.records[0];
        assert!(record.secondary_id.is_empty());
        assert_eq!(record.external_id, "B000TEST01");
        assert_eq!(record.name, "Acme Widget Deluxe");
    }

    #[test]
    fn test_next_page_relative_href_resolved() {
        let html = r#"<div class="sg-col-inner">
                        <div data-csa-c-asin="B1"></div>
                      </div>
                      <a class="s-pagination-next" href="/s?page=2">Next</a>"#;
        let page = extractor().parse_listing_page(html, "https://shop.example.com/s?page=1");

        assert_eq!(
            page.next_url.as_deref(),
            Some("https://shop.example.com/s?page=2")
        );
    }

    #[test]
    fn test_no_next_link_means_done() {
        let html = r#"<div class="sg-col-inner"><div data-csa-c-asin="B1"></div></div>"#;
        let page = extractor().parse_listing_page(html, "https://shop.example.com/s");
        assert!(page.next_url.is_none());
    }
}
