//! Typed content model.
//!
//! Every item is a shared [`ContentBase`] plus exactly one variant payload,
//! selected by the `contentType` discriminator. On the wire both halves are
//! flattened into a single JSON object.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::raw::RawBlock;

/// Version tag written into every transformed item
pub const SCHEMA_VERSION: &str = "1.0.0";

/// Language written into every transformed item
pub const DEFAULT_LANGUAGE: &str = "en";

/// Closed set of content variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Article,
    Comic,
    Podcast,
}

impl ContentType {
    pub const ALL: [ContentType; 3] = [ContentType::Article, ContentType::Comic, ContentType::Podcast];

    /// Map a raw discriminator to a variant. Unrecognized values fall back to
    /// `Article`.
    pub fn from_discriminator(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "comic" => ContentType::Comic,
            "podcast" => ContentType::Podcast,
            _ => ContentType::Article,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Article => "article",
            ContentType::Comic => "comic",
            ContentType::Podcast => "podcast",
        }
    }

    /// Directory name used for per-item backups
    pub fn plural(&self) -> &'static str {
        match self {
            ContentType::Article => "articles",
            ContentType::Comic => "comics",
            ContentType::Podcast => "podcasts",
        }
    }
}

impl std::fmt::Display for ContentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ContentType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.to_lowercase().as_str() {
            "article" | "articles" => Ok(ContentType::Article),
            "comic" | "comics" => Ok(ContentType::Comic),
            "podcast" | "podcasts" => Ok(ContentType::Podcast),
            _ => anyhow::bail!("Unknown content type: {}", s),
        }
    }
}

/// Named place with optional coordinates
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub name: String,

    #[serde(default)]
    pub coordinates: Option<Coordinates>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

/// Attributes shared by every content variant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentBase {
    /// Source page identifier
    pub id: String,

    pub title: String,

    /// Lookup key and backup file name
    pub slug: String,

    /// Calendar date (`YYYY-MM-DD`) or empty
    pub date: String,

    pub location: Location,

    pub web_category: String,

    pub project: Vec<String>,

    pub concepts: Vec<String>,

    pub intent_vector: String,

    pub sd_index: f64,

    /// Remote URL, or a local media path once assets are cached
    pub hero_image: Option<String>,

    pub blocks: Vec<RawBlock>,

    // Reserved AGI metadata; never populated by the transformer.
    #[serde(default)]
    pub dialogue: Vec<Value>,

    #[serde(default)]
    pub philosophical_insight: Option<String>,

    #[serde(default)]
    pub emotion_trajectory: Vec<String>,

    /// Reserved extension point, always null
    #[serde(default)]
    pub embedding: Option<Vec<f32>>,

    #[serde(rename = "schema_version")]
    pub schema_version: String,

    #[serde(rename = "last_updated")]
    pub last_updated: DateTime<Utc>,

    pub language: String,
}

/// Article payload
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub excerpt: String,
    /// Minutes, rounded up
    pub reading_time: u32,
}

/// One comic panel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Panel {
    /// 1-based position
    pub panel_number: u32,
    pub image_url: String,
    pub width: u32,
    /// Placeholder, not derived from the image
    pub height: u32,
    pub caption: String,
    #[serde(default)]
    pub narration: Option<String>,
}

/// Free-text sensory tags attached to a comic
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SensoryMemory {
    pub visual: Vec<String>,
    pub auditory: Vec<String>,
    pub tactile: Vec<String>,
    pub olfactory: Vec<String>,
    pub gustatory: Vec<String>,
}

/// Comic payload
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comic {
    pub episode_number: u32,
    pub panels: Vec<Panel>,
    #[serde(default)]
    pub sensory_memory: Option<SensoryMemory>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AudioFile {
    pub url: Option<String>,
    pub duration: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PodcastStructure {
    pub intro: String,
    pub main: String,
    pub outro: String,
}

impl Default for PodcastStructure {
    fn default() -> Self {
        Self {
            intro: "Introduction".to_string(),
            main: "Main discussion".to_string(),
            outro: "Closing thoughts".to_string(),
        }
    }
}

/// Podcast payload
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Podcast {
    pub audio_file: AudioFile,
    pub structure: PodcastStructure,
    pub transcript: String,
}

/// Variant-specific payload, tagged by `contentType`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "contentType", rename_all = "lowercase")]
pub enum ContentBody {
    Article(Article),
    Comic(Comic),
    Podcast(Podcast),
}

/// A fully transformed content item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Content {
    #[serde(flatten)]
    pub base: ContentBase,

    #[serde(flatten)]
    pub body: ContentBody,
}

impl Content {
    pub fn content_type(&self) -> ContentType {
        match self.body {
            ContentBody::Article(_) => ContentType::Article,
            ContentBody::Comic(_) => ContentType::Comic,
            ContentBody::Podcast(_) => ContentType::Podcast,
        }
    }

    pub fn slug(&self) -> &str {
        &self.base.slug
    }

    pub fn as_article(&self) -> Option<&Article> {
        match &self.body {
            ContentBody::Article(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_comic(&self) -> Option<&Comic> {
        match &self.body {
            ContentBody::Comic(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_podcast(&self) -> Option<&Podcast> {
        match &self.body {
            ContentBody::Podcast(p) => Some(p),
            _ => None,
        }
    }
}
