//! Hand-maintained JSON schema for the content model.
//!
//! Served to external consumers. Field names match the serialized form of
//! [`Content`](super::content::Content); the tests below fail when a field is
//! added to the model without being described here.

use serde_json::{json, Value};

use super::content::{ContentType, SCHEMA_VERSION};

fn field(kind: &str, required: bool) -> Value {
    json!({ "type": kind, "required": required })
}

fn base_fields() -> Value {
    json!({
        "id": field("string", true),
        "contentType": {
            "type": "string",
            "required": true,
            "enum": ContentType::ALL.iter().map(|t| t.as_str()).collect::<Vec<_>>(),
        },
        "title": field("string", true),
        "slug": field("string", true),
        "date": { "type": "string", "format": "date", "required": true },
        "location": {
            "type": "object",
            "required": true,
            "fields": {
                "name": field("string", true),
                "coordinates": {
                    "type": "object",
                    "required": false,
                    "fields": { "lat": field("number", true), "lng": field("number", true) },
                },
            },
        },
        "webCategory": field("string", true),
        "project": field("string[]", true),
        "concepts": field("string[]", true),
        "intentVector": field("string", true),
        "sdIndex": { "type": "number", "required": true, "minimum": 0, "maximum": 10 },
        "heroImage": field("string", false),
        "blocks": field("block[]", true),
        "dialogue": field("object[]", false),
        "philosophicalInsight": field("string", false),
        "emotionTrajectory": field("string[]", false),
        "embedding": field("number[]", false),
        "schema_version": field("string", true),
        "last_updated": { "type": "string", "format": "date-time", "required": true },
        "language": field("string", true),
    })
}

fn article_fields() -> Value {
    json!({
        "excerpt": field("string", true),
        "readingTime": field("integer", true),
    })
}

fn comic_fields() -> Value {
    json!({
        "episodeNumber": field("integer", true),
        "panels": {
            "type": "object[]",
            "required": true,
            "fields": {
                "panelNumber": field("integer", true),
                "imageUrl": field("string", true),
                "width": field("integer", true),
                "height": field("integer", true),
                "caption": field("string", true),
                "narration": field("string", false),
            },
        },
        "sensoryMemory": {
            "type": "object",
            "required": false,
            "fields": {
                "visual": field("string[]", true),
                "auditory": field("string[]", true),
                "tactile": field("string[]", true),
                "olfactory": field("string[]", true),
                "gustatory": field("string[]", true),
            },
        },
    })
}

fn podcast_fields() -> Value {
    json!({
        "audioFile": {
            "type": "object",
            "required": true,
            "fields": { "url": field("string", false), "duration": field("string", true) },
        },
        "structure": {
            "type": "object",
            "required": true,
            "fields": {
                "intro": field("string", true),
                "main": field("string", true),
                "outro": field("string", true),
            },
        },
        "transcript": field("string", true),
    })
}

/// Variant-specific field map
pub fn variant_fields(content_type: ContentType) -> Value {
    match content_type {
        ContentType::Article => article_fields(),
        ContentType::Comic => comic_fields(),
        ContentType::Podcast => podcast_fields(),
    }
}

/// The complete schema document
pub fn content_schema() -> Value {
    let variants: serde_json::Map<String, Value> = ContentType::ALL
        .iter()
        .map(|t| (t.as_str().to_string(), json!({ "fields": variant_fields(*t) })))
        .collect();

    json!({
        "version": SCHEMA_VERSION,
        "discriminator": "contentType",
        "base": { "fields": base_fields() },
        "variants": variants,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::content::{
        Article, Comic, Content, ContentBase, ContentBody, Location, Podcast, DEFAULT_LANGUAGE,
    };
    use chrono::Utc;

    fn sample(body: ContentBody) -> Content {
        Content {
            base: ContentBase {
                id: "p".to_string(),
                title: String::new(),
                slug: String::new(),
                date: String::new(),
                location: Location::default(),
                web_category: String::new(),
                project: vec![],
                concepts: vec![],
                intent_vector: String::new(),
                sd_index: 0.0,
                hero_image: None,
                blocks: vec![],
                dialogue: vec![],
                philosophical_insight: None,
                emotion_trajectory: vec![],
                embedding: None,
                schema_version: SCHEMA_VERSION.to_string(),
                last_updated: Utc::now(),
                language: DEFAULT_LANGUAGE.to_string(),
            },
            body,
        }
    }

    #[test]
    fn test_schema_describes_every_serialized_field() {
        let schema = content_schema();
        let bodies = [
            ContentBody::Article(Article::default()),
            ContentBody::Comic(Comic::default()),
            ContentBody::Podcast(Podcast::default()),
        ];

        for body in bodies {
            let content = sample(body);
            let kind = content.content_type();
            let json = serde_json::to_value(&content).unwrap();

            for key in json.as_object().unwrap().keys() {
                let in_base = schema["base"]["fields"].get(key).is_some();
                let in_variant = schema["variants"][kind.as_str()]["fields"].get(key).is_some();
                assert!(in_base || in_variant, "{} field '{}' missing from schema", kind, key);
            }
        }
    }

    #[test]
    fn test_schema_enumerates_content_types() {
        let schema = content_schema();
        assert_eq!(schema["version"], SCHEMA_VERSION);
        assert_eq!(
            schema["base"]["fields"]["contentType"]["enum"],
            json!(["article", "comic", "podcast"])
        );
    }
}
