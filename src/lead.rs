//! Contact form proxy.
//!
//! The site's contact form posts loosely named fields, either as JSON or URL-encoded. They are
//! mapped onto the upstream contact schema and forwarded to `contacts`.

use log::{debug, warn};
use serde_json::{json, Map, Value};

use crate::error::CatalogueError;
use crate::upstream::{Upstream, WriteMethod};

pub const DEFAULT_LEAD_SOURCE: &str = "astro-landing-contact";
pub const EMPTY_LEAD_MESSAGE: &str =
    "Empty payload received. Ensure the form sends JSON with the Next-style field names.";
pub const LEAD_METHOD_NOT_ALLOWED_MESSAGE: &str = "POST JSON from the form.";

const CONTACTS_PATH: &str = "contacts";
const REPEATED_FIELD: &str = "fabricTypes";

/// Text fields of the upstream schema with the form alias accepted for each.
const TEXT_FIELDS: &[(&str, Option<&str>)] = &[
    ("companyName", None),
    ("contactPerson", None),
    ("email", None),
    ("phoneNumber", Some("phone")),
    ("businessType", None),
    ("annualFabricVolume", Some("annualVolume")),
    ("primaryMarkets", None),
    ("specificationsRequirements", Some("specifications")),
    ("timeline", None),
    ("additionalMessage", Some("message")),
];

/// Decodes a submitted form body into a field map.
///
/// JSON bodies must be objects. URL-encoded bodies (also accepted as `text/plain`, or without a
/// content type) keep the last value of each key, except `fabricTypes` whose values are collected
/// into a list.
pub fn parse_lead_body(
    content_type: Option<&str>,
    body: &[u8],
) -> Result<Map<String, Value>, CatalogueError> {
    let content_type = content_type.unwrap_or_default().to_ascii_lowercase();

    if content_type.contains("application/json") {
        let value: Value = serde_json::from_slice(body)
            .map_err(|err| CatalogueError::BadRequest(format!("invalid JSON body: {err}")))?;
        return match value {
            Value::Object(fields) => Ok(fields),
            _ => Err(CatalogueError::BadRequest(
                "expected a JSON object".to_string(),
            )),
        };
    }
    if content_type.contains("multipart/form-data") {
        return Err(CatalogueError::BadRequest(
            "multipart form bodies are not supported".to_string(),
        ));
    }

    let mut fields = Map::new();
    let mut repeated = Vec::new();
    for (key, value) in url::form_urlencoded::parse(body) {
        if key == REPEATED_FIELD {
            repeated.push(Value::String(value.to_string()));
        }
        fields.insert(key.into_owned(), Value::String(value.into_owned()));
    }
    if !repeated.is_empty() {
        fields.insert(REPEATED_FIELD.to_string(), Value::Array(repeated));
    }
    Ok(fields)
}

/// Field value as text: strings as-is, missing and `null` empty, everything else printed.
fn as_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(text)) => text.clone(),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| as_text(Some(item)))
            .collect::<Vec<_>>()
            .join(","),
        Some(other) => other.to_string(),
    }
}

fn as_list(value: Option<&Value>) -> Vec<Value> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| Value::String(as_text(Some(item))))
            .collect(),
        Some(Value::String(text)) => vec![Value::String(text.clone())],
        _ => Vec::new(),
    }
}

/// The field under `name`, or under `alias` when `name` is missing or `null`.
fn pick<'a>(received: &'a Map<String, Value>, name: &str, alias: Option<&str>) -> Option<&'a Value> {
    received
        .get(name)
        .filter(|value| !value.is_null())
        .or_else(|| alias.and_then(|alias| received.get(alias)))
}

/// Maps received form fields onto the upstream contact schema.
pub fn map_lead(received: &Map<String, Value>) -> Map<String, Value> {
    let mut mapped = Map::new();
    for (name, alias) in TEXT_FIELDS {
        mapped.insert(
            (*name).to_string(),
            Value::String(as_text(pick(received, name, *alias))),
        );
    }
    mapped.insert(
        "fabricTypesOfInterest".to_string(),
        Value::Array(as_list(pick(received, "fabricTypesOfInterest", Some(REPEATED_FIELD)))),
    );
    let source = pick(received, "source", None)
        .map(|value| as_text(Some(value)))
        .unwrap_or_else(|| DEFAULT_LEAD_SOURCE.to_string());
    mapped.insert("source".to_string(), Value::String(source));
    mapped
}

/// True when every mapped field other than `source` is blank.
pub fn is_blank_lead(mapped: &Map<String, Value>) -> bool {
    mapped
        .iter()
        .filter(|(key, _)| key.as_str() != "source")
        .all(|(_, value)| match value {
            Value::Array(items) => items.is_empty(),
            other => as_text(Some(other)).trim().is_empty(),
        })
}

/// Result of forwarding a lead upstream.
#[derive(Clone, Debug, PartialEq)]
pub enum LeadOutcome {
    /// Nothing worth forwarding was submitted.
    Empty { received: Map<String, Value> },
    /// The upstream API refused the contact.
    Refused { status: u16, message: String },
    Accepted {
        data: Value,
        received: Map<String, Value>,
        mapped: Map<String, Value>,
    },
}

impl LeadOutcome {
    /// HTTP status and JSON body answered to the form.
    pub fn response(&self) -> (u16, Value) {
        match self {
            LeadOutcome::Empty { received } => (
                422,
                json!({ "ok": false, "error": EMPTY_LEAD_MESSAGE, "echo": { "received": received } }),
            ),
            LeadOutcome::Refused { status, message } => {
                (*status, json!({ "ok": false, "error": message }))
            }
            LeadOutcome::Accepted {
                data,
                received,
                mapped,
            } => (
                200,
                json!({ "ok": true, "data": data, "echo": { "received": received, "mapped": mapped } }),
            ),
        }
    }
}

/// Maps and forwards a lead.
///
/// After a successful create, a submitted `draftId` (or `id`) triggers a best-effort update of
/// that contact; its failure is only logged.
pub async fn submit_lead(
    upstream: &dyn Upstream,
    received: Map<String, Value>,
) -> Result<LeadOutcome, CatalogueError> {
    let mapped = map_lead(&received);
    if is_blank_lead(&mapped) {
        debug!("rejecting blank lead submission");
        return Ok(LeadOutcome::Empty { received });
    }

    let payload = Value::Object(mapped.clone());
    let reply = upstream
        .send_json(WriteMethod::Post, CONTACTS_PATH, &payload)
        .await?;
    let data = if reply.body.is_null() {
        json!({})
    } else {
        reply.body
    };

    if !(200..300).contains(&reply.status) {
        let message = data
            .get("message")
            .map(|message| as_text(Some(message)))
            .filter(|message| !message.is_empty())
            .unwrap_or_else(|| "Upstream error".to_string());
        warn!("upstream refused lead with status {}: {message}", reply.status);
        return Ok(LeadOutcome::Refused {
            status: reply.status,
            message,
        });
    }

    let draft_id = as_text(pick(&received, "draftId", None));
    let draft_id = if draft_id.trim().is_empty() {
        as_text(received.get("id"))
    } else {
        draft_id
    };
    if !draft_id.trim().is_empty() {
        let path = format!("{CONTACTS_PATH}/{}", urlencoding::encode(draft_id.trim()));
        match upstream.send_json(WriteMethod::Put, &path, &payload).await {
            Ok(update) if update.is_success() => debug!("updated draft contact {draft_id}"),
            Ok(update) => warn!("draft update for {draft_id} answered {}", update.status),
            Err(err) => warn!("draft update for {draft_id} failed: {err}"),
        }
    }

    Ok(LeadOutcome::Accepted {
        data,
        received,
        mapped,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("not an object: {other}"),
        }
    }

    #[test]
    fn json_bodies_must_be_objects() {
        let fields = parse_lead_body(Some("application/json; charset=utf-8"), br#"{"email":"a@b.c"}"#)
            .unwrap();
        assert_eq!(fields.get("email"), Some(&json!("a@b.c")));
        assert!(parse_lead_body(Some("application/json"), b"[1]").is_err());
        assert!(parse_lead_body(Some("application/json"), b"{oops").is_err());
        assert!(parse_lead_body(Some("multipart/form-data; boundary=x"), b"").is_err());
    }

    #[test]
    fn url_encoded_bodies_collect_fabric_types() {
        let body = b"companyName=Acme+Mills&fabricTypes=linen&fabricTypes=twill&phone=%2B91-1";
        let fields = parse_lead_body(Some("application/x-www-form-urlencoded"), body).unwrap();
        assert_eq!(fields.get("companyName"), Some(&json!("Acme Mills")));
        assert_eq!(fields.get("phone"), Some(&json!("+91-1")));
        assert_eq!(fields.get("fabricTypes"), Some(&json!(["linen", "twill"])));

        let fields = parse_lead_body(Some("text/plain"), b"email=x%40y.z").unwrap();
        assert_eq!(fields.get("email"), Some(&json!("x@y.z")));
        assert!(parse_lead_body(None, b"").unwrap().is_empty());
    }

    #[test]
    fn aliases_map_onto_the_contact_schema() {
        let mapped = map_lead(&object(json!({
            "companyName": "Acme",
            "phone": "+91-1",
            "annualVolume": 5000,
            "fabricTypes": "linen",
            "specifications": "150 gsm",
            "message": "hello",
            "additionalMessage": null
        })));
        assert_eq!(mapped["phoneNumber"], json!("+91-1"));
        assert_eq!(mapped["annualFabricVolume"], json!("5000"));
        assert_eq!(mapped["fabricTypesOfInterest"], json!(["linen"]));
        assert_eq!(mapped["specificationsRequirements"], json!("150 gsm"));
        assert_eq!(mapped["additionalMessage"], json!("hello"));
        assert_eq!(mapped["email"], json!(""));
        assert_eq!(mapped["source"], json!(DEFAULT_LEAD_SOURCE));
        assert_eq!(mapped.len(), 12);
    }

    #[test]
    fn primary_names_win_over_aliases() {
        let mapped = map_lead(&object(json!({
            "phoneNumber": "1",
            "phone": "2",
            "fabricTypesOfInterest": ["a", 3],
            "fabricTypes": ["x"],
            "source": "brochure"
        })));
        assert_eq!(mapped["phoneNumber"], json!("1"));
        assert_eq!(mapped["fabricTypesOfInterest"], json!(["a", "3"]));
        assert_eq!(mapped["source"], json!("brochure"));
    }

    #[test]
    fn blank_detection_ignores_the_source() {
        assert!(is_blank_lead(&map_lead(&Map::new())));
        assert!(is_blank_lead(&map_lead(&object(json!({ "email": "   ", "source": "x" })))));
        assert!(!is_blank_lead(&map_lead(&object(json!({ "fabricTypes": ["linen"] })))));
    }

    #[test]
    fn outcomes_render_their_responses() {
        let (status, body) = LeadOutcome::Empty { received: Map::new() }.response();
        assert_eq!(status, 422);
        assert_eq!(body["ok"], json!(false));
        assert_eq!(body["echo"]["received"], json!({}));

        let (status, body) = LeadOutcome::Refused {
            status: 409,
            message: "duplicate".into(),
        }
        .response();
        assert_eq!((status, body), (409, json!({ "ok": false, "error": "duplicate" })));
    }

    #[tokio::test]
    async fn draft_ids_are_encoded_into_one_path_segment() {
        let upstream = crate::upstream::MemoryUpstream::new();
        let received = object(json!({ "email": "a@b.c", "draftId": " a b/c " }));
        let outcome = submit_lead(&upstream, received).await.expect("submit lead");
        assert!(matches!(outcome, LeadOutcome::Accepted { .. }));

        let writes = upstream.writes();
        assert_eq!(writes.len(), 2);
        assert_eq!(writes[0].1, "contacts");
        assert_eq!((writes[1].0, writes[1].1.as_str()), (WriteMethod::Put, "contacts/a%20b%2Fc"));
    }
}
