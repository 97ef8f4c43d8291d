//! Normalization of loosely-shaped backend content into render sections.
//!
//! Recommendation and explanation payloads arrive as structured JSON, as
//! arrays, or as strings that encode a JSON document with stray line breaks.
//! Processing happens in two stages:
//!
//! 1. [`parse_document`] turns the raw value into a typed [`ContentNode`] tree.
//!    This is the only stage that can fail.
//! 2. [`sections_from_document`] classifies each top-level entry into a
//!    [`RenderSection`] with a scalar, item-list or key/value body.
//!
//! [`normalize`] runs both stages and substitutes the sentinel section for
//! empty input; [`normalize_or_fallback`] additionally converts a parse
//! failure into a single error section so one malformed payload cannot take
//! down the whole view.

use serde::Serialize;
use serde_json::Value;

use crate::errors::AppError;
use crate::models::{coerce_text, json_kind};

/// Title of the section shown when no recommendation is available.
pub const NO_RECOMMENDATION_TITLE: &str = "No Credit Card Recommended";
/// Body of the section shown when no recommendation is available.
pub const NO_RECOMMENDATION_BODY: &str = "User credit product approval status is Rejected";
/// Title of the section substituted for an unparseable payload.
pub const CONTENT_ERROR_TITLE: &str = "Connection error";
pub const CONTENT_ERROR_BODY: &str = "Connection error, please refresh the page";

/// Typed intermediate representation of a content document.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentNode {
    Mapping(Vec<(String, ContentNode)>),
    List(Vec<ContentNode>),
    Scalar(String),
}

/// Top-level entries of a parsed document, in source order.
pub type ContentDocument = Vec<(String, ContentNode)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SectionKind {
    Scalar,
    ItemList,
    KeyValueList,
}

/// Illustration shown next to a section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SectionIcon {
    CreditCard,
    Rejected,
    Error,
}

impl SectionIcon {
    /// Picks the icon from the section title alone.
    pub fn for_title(title: &str) -> Self {
        match title {
            NO_RECOMMENDATION_TITLE => SectionIcon::Rejected,
            CONTENT_ERROR_TITLE => SectionIcon::Error,
            _ => SectionIcon::CreditCard,
        }
    }

    pub fn glyph(&self) -> &'static str {
        match self {
            SectionIcon::CreditCard => "[card]",
            SectionIcon::Rejected => "[x]",
            SectionIcon::Error => "[!]",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SectionItem {
    pub title: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum SectionBody {
    Scalar(String),
    ItemList(Vec<SectionItem>),
    KeyValueList(Vec<(String, String)>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderSection {
    pub title: String,
    pub body: SectionBody,
}

impl RenderSection {
    pub fn scalar(title: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: SectionBody::Scalar(text.into()),
        }
    }

    pub fn kind(&self) -> SectionKind {
        match self.body {
            SectionBody::Scalar(_) => SectionKind::Scalar,
            SectionBody::ItemList(_) => SectionKind::ItemList,
            SectionBody::KeyValueList(_) => SectionKind::KeyValueList,
        }
    }

    pub fn icon(&self) -> SectionIcon {
        SectionIcon::for_title(&self.title)
    }
}

/// The sentinel shown when there is nothing to recommend.
pub fn no_recommendation_section() -> RenderSection {
    RenderSection::scalar(NO_RECOMMENDATION_TITLE, NO_RECOMMENDATION_BODY)
}

pub fn content_error_section() -> RenderSection {
    RenderSection::scalar(CONTENT_ERROR_TITLE, CONTENT_ERROR_BODY)
}

/// Strips embedded newlines from a string-encoded document and parses it.
pub fn parse_encoded(encoded: &str) -> Result<Value, AppError> {
    let flattened: String = encoded.chars().filter(|c| *c != '\n').collect();
    serde_json::from_str(&flattened).map_err(|e| {
        AppError::ParseError(format!("malformed string-encoded content: {}", e))
    })
}

/// Breaks enumerated sub-points (`".-"`) onto their own lines.
pub fn break_enumerations(text: &str) -> String {
    text.replace(".-", ".\n-")
}

/// Parses a raw payload into its top-level entries.
///
/// Absent, null and empty inputs produce an empty document.
pub fn parse_document(raw: Option<&Value>) -> Result<ContentDocument, AppError> {
    match raw {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::String(encoded)) if encoded.trim().is_empty() => Ok(Vec::new()),
        Some(Value::String(encoded)) => match parse_encoded(encoded)? {
            Value::String(_) => Err(AppError::ParseError(
                "string-encoded content decodes to another string".to_string(),
            )),
            decoded => document_from_value(&decoded, true),
        },
        Some(value) => document_from_value(value, false),
    }
}

fn document_from_value(value: &Value, rewrite: bool) -> Result<ContentDocument, AppError> {
    match value {
        Value::Null => Ok(Vec::new()),
        Value::Object(map) => Ok(map
            .iter()
            .map(|(key, v)| (key.clone(), node_from_value(v, rewrite)))
            .collect()),
        Value::Array(items) => Ok(items
            .iter()
            .enumerate()
            .map(|(idx, item)| entry_from_list_item(idx, item, rewrite))
            .collect()),
        other => Err(AppError::ParseError(format!(
            "content document must be a mapping or list, got {}",
            json_kind(other)
        ))),
    }
}

/// A top-level array entry titled by its own `title` field, or by position.
fn entry_from_list_item(idx: usize, item: &Value, rewrite: bool) -> (String, ContentNode) {
    if let Value::Object(map) = item {
        if let Some(title) = map.get("title").and_then(coerce_text) {
            let body = map
                .get("description")
                .map(|d| node_from_value(d, rewrite))
                .unwrap_or_else(|| ContentNode::Scalar(String::new()));
            return (title, body);
        }
    }
    ((idx + 1).to_string(), node_from_value(item, rewrite))
}

fn node_from_value(value: &Value, rewrite: bool) -> ContentNode {
    match value {
        Value::Object(map) => ContentNode::Mapping(
            map.iter()
                .map(|(key, v)| (key.clone(), node_from_value(v, rewrite)))
                .collect(),
        ),
        Value::Array(items) => {
            ContentNode::List(items.iter().map(|v| node_from_value(v, rewrite)).collect())
        }
        Value::String(s) if rewrite => ContentNode::Scalar(break_enumerations(s)),
        other => ContentNode::Scalar(coerce_text(other).unwrap_or_default()),
    }
}

impl ContentNode {
    /// Flattens the node into one line of display text.
    pub fn to_text(&self) -> String {
        match self {
            ContentNode::Scalar(s) => s.clone(),
            ContentNode::List(items) => items
                .iter()
                .map(ContentNode::to_text)
                .collect::<Vec<_>>()
                .join(", "),
            ContentNode::Mapping(entries) => entries
                .iter()
                .map(|(k, v)| format!("{}: {}", k, v.to_text()))
                .collect::<Vec<_>>()
                .join("; "),
        }
    }

    fn field(&self, name: &str) -> Option<&ContentNode> {
        match self {
            ContentNode::Mapping(entries) => {
                entries.iter().find(|(k, _)| k == name).map(|(_, v)| v)
            }
            _ => None,
        }
    }
}

fn item_from_node(node: &ContentNode) -> SectionItem {
    match node {
        ContentNode::Mapping(_) => SectionItem {
            title: node.field("title").map(ContentNode::to_text).unwrap_or_default(),
            description: node
                .field("description")
                .map(ContentNode::to_text)
                .unwrap_or_default(),
        },
        other => SectionItem {
            title: String::new(),
            description: other.to_text(),
        },
    }
}

/// Classifies each document entry into a render section.
pub fn sections_from_document(document: &ContentDocument) -> Vec<RenderSection> {
    document
        .iter()
        .map(|(title, node)| {
            let body = match node {
                ContentNode::List(items) => {
                    SectionBody::ItemList(items.iter().map(item_from_node).collect())
                }
                ContentNode::Mapping(entries) => SectionBody::KeyValueList(
                    entries
                        .iter()
                        .map(|(k, v)| (k.clone(), v.to_text()))
                        .collect(),
                ),
                ContentNode::Scalar(text) => SectionBody::Scalar(text.clone()),
            };
            RenderSection {
                title: title.clone(),
                body,
            }
        })
        .collect()
}

/// Normalizes a raw payload into ordered render sections.
///
/// Empty input yields the single no-recommendation sentinel. A malformed
/// string payload is returned as an error for the caller to handle.
pub fn normalize(raw: Option<&Value>) -> Result<Vec<RenderSection>, AppError> {
    let document = parse_document(raw)?;
    if document.is_empty() {
        return Ok(vec![no_recommendation_section()]);
    }
    Ok(sections_from_document(&document))
}

/// Like [`normalize`], but a parse failure becomes one error section.
pub fn normalize_or_fallback(raw: Option<&Value>) -> Vec<RenderSection> {
    normalize(raw).unwrap_or_else(|e| {
        tracing::warn!("Content payload could not be normalized: {}", e);
        vec![content_error_section()]
    })
}

/// Sections for the explanation narrative.
///
/// Narratives are usually prose and render as one scalar section; a narrative
/// that is itself a string-encoded mapping is expanded like any other payload.
pub fn narrative_sections(title: &str, narrative: &str) -> Vec<RenderSection> {
    if narrative.trim_start().starts_with('{') {
        match parse_document(Some(&Value::String(narrative.to_string()))) {
            Ok(document) if !document.is_empty() => return sections_from_document(&document),
            Ok(_) => {}
            Err(e) => tracing::debug!("Narrative is not an encoded document: {}", e),
        }
    }
    vec![RenderSection::scalar(title, narrative)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_absent_payload_yields_sentinel() {
        let sections = normalize(None).unwrap();

        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].title, "No Credit Card Recommended");
        assert_eq!(
            sections[0].body,
            SectionBody::Scalar("User credit product approval status is Rejected".to_string())
        );
        assert_eq!(sections[0].icon(), SectionIcon::Rejected);
    }

    #[test]
    fn test_empty_inputs_yield_sentinel() {
        for raw in [json!(null), json!({}), json!([]), json!(""), json!("  ")] {
            let sections = normalize(Some(&raw)).unwrap();
            assert_eq!(sections, vec![no_recommendation_section()], "input {}", raw);
        }
    }

    #[test]
    fn test_mapping_classification() {
        let raw = json!({
            "Platinum Card": "Best for travel.-No annual fee",
            "Cards": [
                {"title": "Gold", "description": "Cashback"},
                {"title": "Silver", "description": "Low interest"}
            ],
            "Terms": {"APR": "18%", "Limit": 5000}
        });
        let sections = normalize(Some(&raw)).unwrap();

        assert_eq!(sections.len(), 3);
        assert_eq!(sections[0].title, "Platinum Card");
        assert_eq!(sections[0].kind(), SectionKind::Scalar);
        // Structured input is rendered verbatim.
        assert_eq!(
            sections[0].body,
            SectionBody::Scalar("Best for travel.-No annual fee".to_string())
        );
        assert_eq!(
            sections[1].body,
            SectionBody::ItemList(vec![
                SectionItem {
                    title: "Gold".to_string(),
                    description: "Cashback".to_string()
                },
                SectionItem {
                    title: "Silver".to_string(),
                    description: "Low interest".to_string()
                },
            ])
        );
        assert_eq!(
            sections[2].body,
            SectionBody::KeyValueList(vec![
                ("APR".to_string(), "18%".to_string()),
                ("Limit".to_string(), "5000".to_string()),
            ])
        );
        assert!(sections.iter().all(|s| s.icon() == SectionIcon::CreditCard));
    }

    #[test]
    fn test_string_payload_breaks_enumerations() {
        let raw = json!("{\"Card\":\n \"A.-B.-C\"}");
        let sections = normalize(Some(&raw)).unwrap();

        assert_eq!(sections, vec![RenderSection::scalar("Card", "A.\n-B.\n-C")]);
    }

    #[test]
    fn test_string_payload_rewrites_nested_strings() {
        let raw = json!(r#"{"Cards": [{"title": "Gold", "description": "One.-Two"}]}"#);
        let sections = normalize(Some(&raw)).unwrap();

        assert_eq!(
            sections[0].body,
            SectionBody::ItemList(vec![SectionItem {
                title: "Gold".to_string(),
                description: "One.\n-Two".to_string(),
            }])
        );
    }

    #[test]
    fn test_malformed_string_is_an_error() {
        let raw = json!("{\"Card\": ");
        assert!(matches!(normalize(Some(&raw)), Err(AppError::ParseError(_))));

        let fallback = normalize_or_fallback(Some(&raw));
        assert_eq!(fallback, vec![content_error_section()]);
        assert_eq!(fallback[0].icon(), SectionIcon::Error);
    }

    #[test]
    fn test_scalar_document_is_an_error() {
        assert!(normalize(Some(&json!(42))).is_err());
        assert!(normalize(Some(&json!("\"just text\""))).is_err());
    }

    #[test]
    fn test_top_level_array_uses_item_titles() {
        let raw = json!([
            {"title": "Gold", "description": "Cashback"},
            "plain entry"
        ]);
        let sections = normalize(Some(&raw)).unwrap();

        assert_eq!(sections[0], RenderSection::scalar("Gold", "Cashback"));
        assert_eq!(sections[1], RenderSection::scalar("2", "plain entry"));
    }

    #[test]
    fn test_mapping_normalization_is_idempotent() {
        let raw = json!({"B": "two", "A": {"x": 1}, "C": [{"title": "t", "description": "d"}]});
        let first = normalize(Some(&raw)).unwrap();
        let second = normalize(Some(&raw)).unwrap();

        assert_eq!(first, second);
        let titles: Vec<_> = first.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["B", "A", "C"]);
    }

    #[test]
    fn test_icon_depends_on_title_only() {
        let raw = json!({"Visa": "x", "No Credit Card Recommended": "y"});
        let sections = normalize(Some(&raw)).unwrap();

        assert_eq!(sections[0].icon(), SectionIcon::CreditCard);
        assert_eq!(sections[1].icon(), SectionIcon::Rejected);
    }

    #[test]
    fn test_narrative_sections() {
        let prose = narrative_sections("Status explanation", "You pay on time.");
        assert_eq!(
            prose,
            vec![RenderSection::scalar("Status explanation", "You pay on time.")]
        );

        let encoded = narrative_sections("Status explanation", "{\"Summary\": \"Good.-Keep it\"}");
        assert_eq!(encoded, vec![RenderSection::scalar("Summary", "Good.\n-Keep it")]);

        let broken = narrative_sections("Status explanation", "{not really json");
        assert_eq!(broken[0].title, "Status explanation");
    }
}
