//! Ordered product lookup for the "related products" strip.

use log::debug;
use serde::Serialize;
use serde_json::Value;

use crate::error::CatalogueError;
use crate::model::extract_records;
use crate::upstream::Upstream;

pub const DEFAULT_RELATED_LIMIT: usize = 3;

/// Identifiers to look up plus the requested window.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RelatedQuery {
    pub ids: Vec<String>,
    pub offset: usize,
    pub limit: usize,
}

impl RelatedQuery {
    /// Reads `{ids, offset, limit}` from a request body.
    ///
    /// A non-array `ids` counts as empty. `offset` defaults to 0 and negative values clamp to 0;
    /// a missing, non-numeric or non-positive `limit` becomes 3. Anything but a JSON object is a
    /// bad request.
    pub fn from_json(body: &Value) -> Result<Self, CatalogueError> {
        let object = body
            .as_object()
            .ok_or_else(|| CatalogueError::BadRequest("expected a JSON object".to_string()))?;

        let ids = object
            .get("ids")
            .and_then(Value::as_array)
            .map(|ids| ids.iter().map(id_string).collect())
            .unwrap_or_default();
        let offset = object
            .get("offset")
            .and_then(as_number)
            .filter(|offset| offset.is_finite() && *offset > 0.0)
            .map(|offset| offset as usize)
            .unwrap_or(0);
        let limit = object
            .get("limit")
            .and_then(as_number)
            .filter(|limit| limit.is_finite() && *limit >= 1.0)
            .map(|limit| limit as usize)
            .unwrap_or(DEFAULT_RELATED_LIMIT);

        Ok(Self { ids, offset, limit })
    }
}

/// One window of related products.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct RelatedPage {
    pub items: Vec<Value>,
    pub total: usize,
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

/// String form of an identifier: strings trimmed, numbers printed, `{_id}` unwrapped.
fn id_string(value: &Value) -> String {
    match value {
        Value::String(id) => id.trim().to_string(),
        Value::Number(number) => number.to_string(),
        Value::Object(object) => object.get("_id").map(id_string).unwrap_or_default(),
        _ => String::new(),
    }
}

/// Orders `products` by `query.ids` and slices the requested window.
///
/// Ids without a matching product are skipped. `total` counts every matched id.
pub fn select_related(products: &[Value], query: &RelatedQuery) -> RelatedPage {
    let ordered: Vec<&Value> = query
        .ids
        .iter()
        .filter(|id| !id.is_empty())
        .filter_map(|id| {
            products
                .iter()
                .find(|product| product.get("_id").map(id_string).as_deref() == Some(id.as_str()))
        })
        .collect();

    RelatedPage {
        items: ordered
            .iter()
            .skip(query.offset)
            .take(query.limit)
            .map(|product| (*product).clone())
            .collect(),
        total: ordered.len(),
    }
}

/// Fetches the product collection and selects the window for `query`.
///
/// Unlike the catalogue, a failed product fetch is reported to the caller.
pub async fn related_products(
    upstream: &dyn Upstream,
    query: &RelatedQuery,
) -> Result<RelatedPage, CatalogueError> {
    let payload = upstream.get_json("product").await?;
    let products = extract_records(&payload);
    let page = select_related(&products, query);
    debug!(
        "related products: {} of {} matched ids returned",
        page.items.len(),
        page.total
    );
    Ok(page)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn products() -> Vec<Value> {
        extract_records(&json!({ "data": [
            { "_id": "a", "name": "A" },
            { "_id": "b", "name": "B" },
            { "_id": 7, "name": "Seven" },
            { "_id": "c", "name": "C" },
            { "name": "no id" }
        ]}))
    }

    fn names(page: &RelatedPage) -> Vec<&str> {
        page.items
            .iter()
            .filter_map(|item| item.get("name").and_then(Value::as_str))
            .collect()
    }

    #[test]
    fn query_defaults_and_coercions() {
        let query = RelatedQuery::from_json(&json!({})).unwrap();
        assert_eq!(query, RelatedQuery { ids: vec![], offset: 0, limit: 3 });

        let query =
            RelatedQuery::from_json(&json!({ "ids": ["a", 7], "offset": "2", "limit": 0 })).unwrap();
        assert_eq!(query.ids, vec!["a", "7"]);
        assert_eq!(query.offset, 2);
        assert_eq!(query.limit, 3);

        let query = RelatedQuery::from_json(&json!({ "ids": "a", "offset": -4, "limit": "x" })).unwrap();
        assert!(query.ids.is_empty());
        assert_eq!((query.offset, query.limit), (0, 3));

        assert!(RelatedQuery::from_json(&json!([1, 2])).is_err());
        assert!(RelatedQuery::from_json(&Value::Null).is_err());
    }

    #[test]
    fn items_follow_the_requested_order() {
        let query = RelatedQuery {
            ids: vec!["c".into(), "missing".into(), "a".into(), "7".into(), "".into()],
            offset: 0,
            limit: 3,
        };
        let page = select_related(&products(), &query);
        assert_eq!(names(&page), vec!["C", "A", "Seven"]);
        assert_eq!(page.total, 3);
    }

    #[test]
    fn offset_and_limit_slice_the_ordered_list() {
        let query = RelatedQuery {
            ids: vec!["a".into(), "b".into(), "c".into(), "7".into()],
            offset: 1,
            limit: 2,
        };
        let page = select_related(&products(), &query);
        assert_eq!(names(&page), vec!["B", "C"]);
        assert_eq!(page.total, 4);

        let query = RelatedQuery { offset: 10, ..query };
        let page = select_related(&products(), &query);
        assert!(page.items.is_empty());
        assert_eq!(page.total, 4);
    }
}
