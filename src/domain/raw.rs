//! Raw records as delivered by the remote store.
//!
//! These are read-only inputs. Property bags and block payloads are kept as
//! loosely-typed JSON so that unknown or malformed shapes never fail decoding.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A page (database row) from the remote store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawPage {
    /// Remote page identifier
    pub id: String,

    /// Last-modified timestamp, used as part of the memoization key
    #[serde(default)]
    pub last_edited_time: String,

    /// Named property bag
    #[serde(default)]
    pub properties: Map<String, Value>,
}

impl RawPage {
    /// Look up a property by name
    pub fn property(&self, name: &str) -> Option<&Value> {
        self.properties.get(name)
    }
}

/// A node of page content (paragraph, heading, image, ...)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawBlock {
    /// Block identifier (may be empty for synthesized blocks)
    #[serde(default)]
    pub id: String,

    /// Discriminator selecting which payload key is meaningful
    #[serde(rename = "type")]
    pub kind: String,

    /// Children exist remotely (they may not be loaded yet)
    #[serde(default)]
    pub has_children: bool,

    /// Loaded children, in document order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<RawBlock>,

    /// Everything else, including the payload keyed by `kind`
    #[serde(flatten)]
    pub rest: Map<String, Value>,
}

impl RawBlock {
    /// Create a block with a payload under its own type key
    pub fn new(kind: impl Into<String>, payload: Value) -> Self {
        let kind = kind.into();
        let mut rest = Map::new();
        rest.insert(kind.clone(), payload);
        Self {
            id: String::new(),
            kind,
            has_children: false,
            children: Vec::new(),
            rest,
        }
    }

    /// Set the block identifier
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Attach loaded children
    pub fn with_children(mut self, children: Vec<RawBlock>) -> Self {
        self.has_children = !children.is_empty();
        self.children = children;
        self
    }

    /// Payload object for this block's type
    pub fn payload(&self) -> Option<&Value> {
        self.rest.get(&self.kind)
    }

    /// Mutable payload for this block's type
    pub fn payload_mut(&mut self) -> Option<&mut Value> {
        self.rest.get_mut(&self.kind)
    }

    pub fn is_paragraph(&self) -> bool {
        self.kind == "paragraph"
    }

    /// Heading level (1-3) if this block is a heading
    pub fn heading_level(&self) -> Option<u8> {
        match self.kind.as_str() {
            "heading_1" => Some(1),
            "heading_2" => Some(2),
            "heading_3" => Some(3),
            _ => None,
        }
    }

    /// Concatenated plain text of the payload's `rich_text`
    pub fn plain_text(&self) -> String {
        self.payload()
            .and_then(|p| p.get("rich_text"))
            .map(rich_text_to_string)
            .unwrap_or_default()
    }

    /// Concatenated plain text of the payload's `caption`
    pub fn caption(&self) -> String {
        self.payload()
            .and_then(|p| p.get("caption"))
            .map(rich_text_to_string)
            .unwrap_or_default()
    }

    /// URL of a hosted file payload (internally or externally hosted)
    pub fn media_url(&self) -> Option<&str> {
        self.payload().and_then(file_object_url)
    }
}

/// One page of a cursor-paginated listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Batch<T> {
    pub results: Vec<T>,

    #[serde(default)]
    pub next_cursor: Option<String>,

    #[serde(default)]
    pub has_more: bool,
}

impl<T> Batch<T> {
    /// Final page with no continuation
    pub fn last(results: Vec<T>) -> Self {
        Self {
            results,
            next_cursor: None,
            has_more: false,
        }
    }

    /// Page followed by more results at `cursor`
    pub fn more(results: Vec<T>, cursor: impl Into<String>) -> Self {
        Self {
            results,
            next_cursor: Some(cursor.into()),
            has_more: true,
        }
    }

    /// Cursor for the next request, if the listing continues
    pub fn continuation(&self) -> Option<&str> {
        if self.has_more {
            self.next_cursor.as_deref()
        } else {
            None
        }
    }
}

/// Join the text fragments of a rich-text array in order.
///
/// Accepts both `plain_text` and `text.content` fragment shapes; anything
/// that is not an array yields an empty string.
pub fn rich_text_to_string(value: &Value) -> String {
    let Some(items) = value.as_array() else {
        return String::new();
    };

    items
        .iter()
        .filter_map(|item| {
            item.get("plain_text")
                .and_then(Value::as_str)
                .or_else(|| item.pointer("/text/content").and_then(Value::as_str))
        })
        .collect()
}

/// URL of a file object tagged `file` (internally hosted) or `external`
pub fn file_object_url(value: &Value) -> Option<&str> {
    value
        .pointer("/file/url")
        .or_else(|| value.pointer("/external/url"))
        .and_then(Value::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_block_decodes_payload_by_type() {
        let block: RawBlock = serde_json::from_value(json!({
            "object": "block",
            "id": "b1",
            "type": "paragraph",
            "has_children": false,
            "paragraph": {
                "rich_text": [
                    { "plain_text": "Hello, " },
                    { "text": { "content": "world" } }
                ]
            }
        }))
        .unwrap();

        assert_eq!(block.kind, "paragraph");
        assert_eq!(block.plain_text(), "Hello, world");
        assert!(block.children.is_empty());
        assert_eq!(block.rest.get("object"), Some(&json!("block")));
    }

    #[test]
    fn test_media_url_either_hosting() {
        let internal = RawBlock::new("image", json!({ "type": "file", "file": { "url": "https://s3/a.png" } }));
        let external = RawBlock::new("image", json!({ "type": "external", "external": { "url": "https://cdn/b.jpg" } }));
        let missing = RawBlock::new("image", json!({}));

        assert_eq!(internal.media_url(), Some("https://s3/a.png"));
        assert_eq!(external.media_url(), Some("https://cdn/b.jpg"));
        assert_eq!(missing.media_url(), None);
    }

    #[test]
    fn test_block_serialization_keeps_unknown_fields() {
        let raw = json!({
            "id": "b2",
            "type": "divider",
            "has_children": false,
            "divider": {},
            "created_time": "2024-01-01T00:00:00.000Z"
        });
        let block: RawBlock = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(serde_json::to_value(&block).unwrap(), raw);
    }

    #[test]
    fn test_batch_continuation() {
        assert_eq!(Batch::more(vec![1], "c2").continuation(), Some("c2"));
        assert_eq!(Batch::last(vec![1]).continuation(), None);

        let dangling: Batch<u8> = Batch {
            results: vec![],
            next_cursor: Some("stale".to_string()),
            has_more: false,
        };
        assert_eq!(dangling.continuation(), None);
    }
}
