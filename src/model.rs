//! Records read from the upstream content API and their display-ready projections.
//!
//! The upstream schema is loose: the same field may arrive as a string, a number, or a
//! reference object carrying a `name`. The types here accept all of those without failing so a
//! single odd record never takes a whole collection down. Everything downstream of
//! [`ShapedProduct`] and [`ShapedOffice`] only sees plain strings.

use serde::Deserialize;
use serde_json::{Number, Value};

/// A loosely typed display field.
///
/// `Named` covers reference objects such as `{"_id": "...", "name": "Cotton"}`. Anything that is
/// neither text, a number nor an object lands in `Other` and displays as an empty string.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum FlexText {
    Text(String),
    Number(Number),
    Named { name: Option<Box<FlexText>> },
    Other(Value),
}

impl FlexText {
    /// Flattens the field into the string shown to readers.
    pub fn display(&self) -> String {
        match self {
            FlexText::Text(text) => text.clone(),
            FlexText::Number(number) => number.to_string(),
            FlexText::Named { name: Some(name) } => name.display(),
            FlexText::Named { name: None } | FlexText::Other(_) => String::new(),
        }
    }
}

/// Reference to another record: either the bare id or an embedded `{ "_id": ... }` object.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum RecordRef {
    Id(String),
    Embedded {
        #[serde(rename = "_id")]
        id: String,
    },
    Other(Value),
}

impl RecordRef {
    /// Canonical string form used for identifier comparison.
    pub fn canonical(&self) -> String {
        match self {
            RecordRef::Id(id) | RecordRef::Embedded { id } => id.trim().to_string(),
            RecordRef::Other(_) => String::new(),
        }
    }
}

/// The `color` field is usually a list of references but older records carry a single value.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ColorField {
    List(Vec<FlexText>),
    Single(FlexText),
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct ProductRecord {
    #[serde(rename = "_id")]
    pub id: Option<RecordRef>,
    pub name: Option<FlexText>,
    pub title: Option<FlexText>,
    pub slug: Option<FlexText>,
    pub seo_slug: Option<FlexText>,
    pub sku: Option<FlexText>,
    pub product_identifier: Option<FlexText>,
    #[serde(rename = "productdescription")]
    pub product_description: Option<FlexText>,
    pub description: Option<FlexText>,
    pub img: Option<FlexText>,
    pub image1: Option<FlexText>,
    pub image2: Option<FlexText>,
    pub gsm: Option<FlexText>,
    pub oz: Option<FlexText>,
    pub cm: Option<FlexText>,
    pub inch: Option<FlexText>,
    pub content: Option<FlexText>,
    pub design: Option<FlexText>,
    pub subfinish: Option<FlexText>,
    pub substructure: Option<FlexText>,
    pub color: Option<ColorField>,
    pub colors: Option<FlexText>,
    pub updated_at: Option<FlexText>,
}

impl ProductRecord {
    /// Canonical identifier of the record, empty when absent.
    pub fn canonical_id(&self) -> String {
        self.id.as_ref().map(RecordRef::canonical).unwrap_or_default()
    }

    /// The record's own slug, untouched.
    pub fn slug_text(&self) -> String {
        text_of(&self.slug)
    }
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct OfficeRecord {
    pub company_name: Option<FlexText>,
    pub company_address: Option<FlexText>,
    pub company_phone1: Option<FlexText>,
    pub company_phone2: Option<FlexText>,
    #[serde(rename = "companyWhatsApp")]
    pub company_whatsapp: Option<FlexText>,
    pub company_email: Option<FlexText>,
    pub company_website: Option<FlexText>,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct SeoRecord {
    pub slug: Option<FlexText>,
    pub product: Option<RecordRef>,
    pub updated_at: Option<FlexText>,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct CityRecord {
    pub slug: Option<FlexText>,
    pub code: Option<FlexText>,
    pub name: Option<FlexText>,
}

/// Pulls the record array out of any of the envelope shapes the upstream API uses.
///
/// Accepted shapes, in order: a bare array, `{ "data": [...] }` and
/// `{ "data": { "products": [...] } }`. Anything else yields an empty list.
pub fn extract_records(payload: &Value) -> Vec<Value> {
    if let Some(items) = payload.as_array() {
        return items.clone();
    }
    let data = payload.get("data");
    if let Some(items) = data.and_then(Value::as_array) {
        return items.clone();
    }
    if let Some(items) = data
        .and_then(|data| data.get("products"))
        .and_then(Value::as_array)
    {
        return items.clone();
    }
    Vec::new()
}

/// Extracts the records of an envelope and deserializes every element that is an object.
///
/// Elements that cannot be read as `T` are skipped rather than failing the whole collection.
pub fn parse_records<T>(payload: &Value) -> Vec<T>
where
    T: for<'de> Deserialize<'de>,
{
    extract_records(payload)
        .into_iter()
        .filter(Value::is_object)
        .filter_map(|item| serde_json::from_value(item).ok())
        .collect()
}

fn text_of(field: &Option<FlexText>) -> String {
    field.as_ref().map(FlexText::display).unwrap_or_default()
}

fn first_non_empty(fields: &[&Option<FlexText>]) -> String {
    fields
        .iter()
        .map(|field| text_of(field))
        .find(|text| !text.is_empty())
        .unwrap_or_default()
}

/// Flat projection of a product with every field resolved to a display string.
///
/// Fields are raw (not yet sanitized for the PDF font); missing values are empty.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ShapedProduct {
    pub name: String,
    pub slug: String,
    pub sku: String,
    pub description: String,
    pub images: Vec<String>,
    pub gsm: String,
    pub oz: String,
    pub cm: String,
    pub inch: String,
    pub content: String,
    pub design: String,
    pub finish: String,
    pub structure: String,
    pub colors: String,
}

pub const DEFAULT_PRODUCT_NAME: &str = "Product";

impl ShapedProduct {
    pub fn from_record(record: &ProductRecord) -> Self {
        let name = text_of(&record.name);
        let colors = match &record.color {
            Some(ColorField::List(items)) => items
                .iter()
                .map(FlexText::display)
                .filter(|color| !color.is_empty())
                .collect::<Vec<_>>()
                .join(", "),
            _ => text_of(&record.colors),
        };

        Self {
            name: if name.trim().is_empty() {
                DEFAULT_PRODUCT_NAME.to_string()
            } else {
                name
            },
            slug: text_of(&record.slug),
            sku: first_non_empty(&[&record.sku, &record.product_identifier]),
            description: first_non_empty(&[&record.product_description, &record.description]),
            images: [&record.img, &record.image1, &record.image2]
                .into_iter()
                .map(text_of)
                .map(|url| url.trim().to_string())
                .filter(|url| !url.is_empty())
                .collect(),
            gsm: text_of(&record.gsm),
            oz: text_of(&record.oz),
            cm: text_of(&record.cm),
            inch: text_of(&record.inch),
            content: text_of(&record.content),
            design: text_of(&record.design),
            finish: text_of(&record.subfinish),
            structure: text_of(&record.substructure),
            colors,
        }
    }
}

/// Office contact details with missing values replaced by empty strings.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ShapedOffice {
    pub company_name: String,
    pub address: String,
    pub phone: String,
    pub secondary_phone: String,
    pub whatsapp: String,
    pub email: String,
    pub website: String,
}

impl ShapedOffice {
    /// Shapes the office record, using `fallback_name` when the company name is missing.
    pub fn from_record(record: Option<&OfficeRecord>, fallback_name: &str) -> Self {
        let record = record.cloned().unwrap_or_default();
        let field = |value: &Option<FlexText>| text_of(value).trim().to_string();
        let company_name = field(&record.company_name);

        Self {
            company_name: if company_name.is_empty() {
                fallback_name.to_string()
            } else {
                company_name
            },
            address: field(&record.company_address),
            phone: field(&record.company_phone1),
            secondary_phone: field(&record.company_phone2),
            whatsapp: field(&record.company_whatsapp),
            email: field(&record.company_email),
            website: field(&record.company_website),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn extracts_all_envelope_shapes() {
        let item = json!({ "slug": "a" });
        assert_eq!(extract_records(&json!([item.clone()])).len(), 1);
        assert_eq!(extract_records(&json!({ "data": [item.clone()] })).len(), 1);
        assert_eq!(
            extract_records(&json!({ "data": { "products": [item.clone(), item] } })).len(),
            2
        );
        assert!(extract_records(&json!({ "data": { "other": 1 } })).is_empty());
        assert!(extract_records(&Value::Null).is_empty());
    }

    #[test]
    fn odd_field_types_never_fail_deserialization() {
        let records: Vec<ProductRecord> = parse_records(&json!({
            "data": [
                { "name": 42, "gsm": 150, "oz": "4.4", "content": true, "design": { "_id": "d1" } },
                "not-an-object",
                { "slug": ["weird"] }
            ]
        }));
        assert_eq!(records.len(), 2);
        let shaped = ShapedProduct::from_record(&records[0]);
        assert_eq!(shaped.name, "42");
        assert_eq!(shaped.gsm, "150");
        assert_eq!(shaped.oz, "4.4");
        assert_eq!(shaped.content, "");
        assert_eq!(shaped.design, "");
    }

    #[test]
    fn shaping_flattens_nested_references() {
        let record: ProductRecord = serde_json::from_value(json!({
            "_id": "p1",
            "slug": "majestic-linen",
            "productIdentifier": "ML-01",
            "description": "Soft linen",
            "img": " https://cdn.example.com/a.jpg ",
            "image2": "",
            "content": { "_id": "c1", "name": "Linen" },
            "subfinish": "Peached",
            "substructure": { "name": { "name": "Plain weave" } },
            "color": [{ "name": "Ivory" }, "Sand", { "_id": "x" }]
        }))
        .unwrap();

        let shaped = ShapedProduct::from_record(&record);
        assert_eq!(shaped.name, DEFAULT_PRODUCT_NAME);
        assert_eq!(shaped.sku, "ML-01");
        assert_eq!(shaped.description, "Soft linen");
        assert_eq!(shaped.images, vec!["https://cdn.example.com/a.jpg"]);
        assert_eq!(shaped.content, "Linen");
        assert_eq!(shaped.finish, "Peached");
        assert_eq!(shaped.structure, "Plain weave");
        assert_eq!(shaped.colors, "Ivory, Sand");
        assert_eq!(shaped.gsm, "");
    }

    #[test]
    fn colors_string_is_used_when_color_is_not_a_list() {
        let record: ProductRecord =
            serde_json::from_value(json!({ "colors": "Red, Blue", "color": "ignored" })).unwrap();
        assert_eq!(ShapedProduct::from_record(&record).colors, "Red, Blue");
    }

    #[test]
    fn record_refs_normalize_to_trimmed_ids() {
        let bare: RecordRef = serde_json::from_value(json!(" abc ")).unwrap();
        let embedded: RecordRef = serde_json::from_value(json!({ "_id": "abc" })).unwrap();
        let numeric: RecordRef = serde_json::from_value(json!(7)).unwrap();
        assert_eq!(bare.canonical(), "abc");
        assert_eq!(embedded.canonical(), "abc");
        assert_eq!(numeric.canonical(), "");
    }

    #[test]
    fn office_falls_back_to_configured_name() {
        let office = ShapedOffice::from_record(None, "Fallback Co");
        assert_eq!(office.company_name, "Fallback Co");
        assert!(office.phone.is_empty());

        let record: OfficeRecord = serde_json::from_value(json!({
            "companyName": "Weavers",
            "companyWhatsApp": "+91-2"
        }))
        .unwrap();
        let office = ShapedOffice::from_record(Some(&record), "Fallback Co");
        assert_eq!(office.company_name, "Weavers");
        assert_eq!(office.whatsapp, "+91-2");
    }
}
