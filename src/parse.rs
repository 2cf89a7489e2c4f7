use std::sync::OnceLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde::Deserialize;
use serde_json::Value;
use tokio::task::spawn_blocking;

use crate::normalize::{extract_price, normalize_field, FieldValue};
use crate::record::{ListingRecord, Surface};
use crate::{Error, Result};

/// What the extractor needs to know beyond the page itself.
#[derive(Debug, Clone, Default)]
pub struct ExtractOptions {
    pub type_of_sale: String,
    pub missing_as_false: bool,
}

/// Parses a search results page off the runtime and returns its listing links.
pub async fn parse_links(html: String) -> Result<Vec<String>> {
    spawn_blocking(move || links_from_html(&html)).await?
}

/// Parses a listing page off the runtime and reduces it to a record.
pub async fn parse_listing(html: String, url: String, opts: ExtractOptions) -> Result<ListingRecord> {
    spawn_blocking(move || extract_record(&html, &url, &opts)).await?
}

/// The `href` of every listing card title, in document order.
pub fn links_from_html(html: &str) -> Result<Vec<String>> {
    let doc = Html::parse_document(html);
    let link_selector = create_selector("a.card__title-link")?;

    let links = doc
        .select(&link_selector)
        .filter_map(|a| a.value().attr("href"))
        .map(str::to_string)
        .collect();
    Ok(links)
}

/// Uses the embedded `window.classified` payload when the page has one,
/// the classified tables otherwise.
pub fn extract_record(html: &str, url: &str, opts: &ExtractOptions) -> Result<ListingRecord> {
    let doc = Html::parse_document(html);

    let mut record = match structured_payload(&doc)? {
        Some(classified) => {
            let record = classified.into_record();
            if opts.missing_as_false {
                record.absent_as_false()
            } else {
                record
            }
        }
        None => extract_table(&doc)?,
    };
    record.type_of_sale = FieldValue::Text(opts.type_of_sale.clone());
    record.url = FieldValue::Text(url.to_string());
    Ok(record)
}

fn classified_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"window\.classified\s*=\s*").expect("classified pattern is valid")
    })
}

/// The decoded `window.classified` object, or `None` if the page doesn't carry a usable one.
fn structured_payload(doc: &Html) -> Result<Option<Classified>> {
    let script_selector = create_selector("script")?;

    let payload = doc
        .select(&script_selector)
        .map(|script| script.text().collect::<String>())
        .find_map(|text| {
            let start = classified_re().find(&text)?.end();
            // Only the first JSON value after the assignment is read; whatever follows it is ignored.
            serde_json::Deserializer::from_str(&text[start..])
                .into_iter::<Classified>()
                .next()?
                .ok()
        });
    Ok(payload)
}

// Every leaf is a raw `Value` so that a missing key and an explicit `null` both end up `Null`.

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Classified {
    property: Option<Property>,
    transaction: Option<Transaction>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct Property {
    #[serde(rename = "type")]
    kind: Value,
    subtype: Value,
    location: Option<Location>,
    bedroom_count: Value,
    net_habitable_surface: Value,
    kitchen: Option<Kitchen>,
    fireplace_count: Value,
    has_terrace: Value,
    terrace_surface: Value,
    has_garden: Value,
    garden_surface: Value,
    land: Option<Land>,
    building: Option<Building>,
    has_swimming_pool: Value,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct Location {
    postal_code: Value,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Kitchen {
    #[serde(rename = "type")]
    kind: Value,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Land {
    surface: Value,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct Building {
    facade_count: Value,
    condition: Value,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Transaction {
    sale: Option<Sale>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct Sale {
    price: Value,
    is_furnished: Value,
}

impl Classified {
    fn into_record(self) -> ListingRecord {
        let property = self.property.unwrap_or_default();
        let sale = self
            .transaction
            .and_then(|t| t.sale)
            .unwrap_or_default();
        let location = property.location.unwrap_or_default();
        let kitchen = property.kitchen.unwrap_or_default();
        let land = property.land.unwrap_or_default();
        let building = property.building.unwrap_or_default();

        ListingRecord {
            locality: FieldValue::from_json(&location.postal_code),
            property_type: FieldValue::from_json(&property.kind),
            property_subtype: FieldValue::from_json(&property.subtype),
            price: FieldValue::from_json(&sale.price),
            bedrooms: FieldValue::from_json(&property.bedroom_count),
            living_area: FieldValue::from_json(&property.net_habitable_surface),
            kitchen_type: FieldValue::from_json(&kitchen.kind),
            furnished: FieldValue::from_json(&sale.is_furnished),
            fireplaces: FieldValue::from_json(&property.fireplace_count),
            terrace: json_surface(&property.has_terrace, &property.terrace_surface),
            garden: json_surface(&property.has_garden, &property.garden_surface),
            plot_surface: FieldValue::from_json(&land.surface),
            frontages: FieldValue::from_json(&building.facade_count),
            swimming_pool: FieldValue::from_json(&property.has_swimming_pool),
            building_condition: FieldValue::from_json(&building.condition),
            ..ListingRecord::default()
        }
    }
}

/// A reported area implies presence even when the `has*` flag is missing.
fn json_surface(has: &Value, area: &Value) -> Surface {
    let area = FieldValue::from_json(area);
    Surface {
        present: has.as_bool().unwrap_or(!area.is_absent()),
        area,
    }
}

/// First word of the listing title -> property type.
const PROPERTY_KINDS: [(&str, &[&str]); 2] = [
    (
        "HOUSE",
        &[
            "House", "Villa", "Bungalow", "Chalet", "Mansion", "Farmhouse", "Cottage",
            "Manor", "Castle", "Town", "Pavilion", "Country", "Exceptional", "Mixed-use",
        ],
    ),
    (
        "APARTMENT",
        &[
            "Apartment", "Flat", "Studio", "Penthouse", "Duplex", "Triplex", "Loft",
            "Ground", "Kot", "Service",
        ],
    ),
];

fn extract_table(doc: &Html) -> Result<ListingRecord> {
    let container_selectors = [
        create_selector("div.text-block")?,
        create_selector("div.accordion__content")?,
    ];
    let header_selector = create_selector("th.classified-table__header")?;
    let data_selector = create_selector("td.classified-table__data")?;

    let mut record = ListingRecord::table_defaults();

    for container_selector in &container_selectors {
        for container in doc.select(container_selector) {
            let headers = container.select(&header_selector);
            let data = container.select(&data_selector);
            for (th, td) in headers.zip(data) {
                let key = element_text(th);
                let value = element_text(td);
                record.set_from_table(&key, normalize_field(&key, &value));
            }
        }
    }

    record.price = first_text(doc, "span.sr-only")?
        .and_then(|text| extract_price(&text))
        .map_or(FieldValue::Absent, FieldValue::Int);

    if let Some(title) = first_text(doc, "h1.classified__title")? {
        let (kind, subtype) = classify_title(&title);
        record.property_type = kind;
        record.property_subtype = subtype;
    }

    Ok(record)
}

/// Matches the first word of a title such as `"Villa for sale"` against `PROPERTY_KINDS`.
fn classify_title(title: &str) -> (FieldValue, FieldValue) {
    let first_word = title.split_whitespace().next().unwrap_or_default();
    PROPERTY_KINDS
        .iter()
        .find(|(_, words)| words.contains(&first_word))
        .map_or((FieldValue::Absent, FieldValue::Absent), |(kind, _)| {
            (
                FieldValue::Text((*kind).to_string()),
                FieldValue::Text(first_word.to_string()),
            )
        })
}

fn first_text(doc: &Html, sel_str: &str) -> Result<Option<String>> {
    let selector = create_selector(sel_str)?;
    Ok(doc.select(&selector).next().map(element_text))
}

/// All text under an element, with runs of whitespace collapsed.
fn element_text(el: ElementRef<'_>) -> String {
    el.text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

#[inline]
fn create_selector(sel_str: &str) -> Result<Selector> {
    Selector::parse(sel_str).map_err(|_| Error::ParseMissingSelector(sel_str.into()))
}
