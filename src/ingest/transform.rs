//! Raw page + block sequence → typed content.
//!
//! Pure mapping, no I/O. Malformed or missing properties are absorbed by the
//! extractors, so every input produces a valid (possibly degenerate) value.

use chrono::{DateTime, Utc};

use super::extract;
use crate::domain::{
    Article, AudioFile, Comic, Content, ContentBase, ContentBody, ContentType, Coordinates,
    Location, Panel, Podcast, PodcastStructure, RawBlock, RawPage, DEFAULT_LANGUAGE,
    SCHEMA_VERSION,
};

/// Property names read from the remote page
pub mod props {
    /// Title candidates, most specific first
    pub const TITLE: [&str; 2] = ["Title", "Name"];
    pub const SLUG: &str = "Slug";
    pub const DATE: &str = "Date";
    pub const CONTENT_TYPE: &str = "Content Type";
    pub const LOCATION: &str = "Location";
    pub const LATITUDE: &str = "Latitude";
    pub const LONGITUDE: &str = "Longitude";
    pub const WEB_CATEGORY: &str = "Web Category";
    pub const PROJECT: &str = "Project";
    pub const CONCEPTS: &str = "Concepts";
    pub const INTENT_VECTOR: &str = "Intent Vector";
    /// Score candidates, most specific first
    pub const SD_INDEX: [&str; 2] = ["SD-Index™", "SD-Index"];
    pub const HERO_IMAGE: &str = "Hero Image";
}

/// Characters kept in an article excerpt
pub const EXCERPT_CHARS: usize = 200;

/// Reading speed used for `readingTime`
pub const WORDS_PER_MINUTE: usize = 200;

pub const PANEL_WIDTH: u32 = 800;
pub const PANEL_HEIGHT: u32 = 600;

/// Episode number until the source carries one
pub const DEFAULT_EPISODE: u32 = 1;

/// Podcast duration until audio metadata is read
pub const DEFAULT_DURATION: &str = "0:00";

/// Raw discriminator of a page (`Content Type` select)
pub fn page_discriminator(page: &RawPage) -> String {
    extract::select(page.property(props::CONTENT_TYPE))
}

/// Raw slug of a page
pub fn page_slug(page: &RawPage) -> String {
    extract::text(page.property(props::SLUG))
}

/// Transform a page stamped with the current time
pub fn transform(page: &RawPage, blocks: Vec<RawBlock>) -> Content {
    transform_at(page, blocks, Utc::now())
}

/// Transform a page with an explicit `last_updated` stamp
pub fn transform_at(page: &RawPage, blocks: Vec<RawBlock>, now: DateTime<Utc>) -> Content {
    let content_type = ContentType::from_discriminator(&page_discriminator(page));

    let body = match content_type {
        ContentType::Article => ContentBody::Article(derive_article(&blocks)),
        ContentType::Comic => ContentBody::Comic(derive_comic(&blocks)),
        ContentType::Podcast => ContentBody::Podcast(derive_podcast(&blocks)),
    };

    Content {
        base: build_base(page, blocks, now),
        body,
    }
}

fn build_base(page: &RawPage, blocks: Vec<RawBlock>, now: DateTime<Utc>) -> ContentBase {
    let title = props::TITLE
        .iter()
        .map(|name| extract::text(page.property(name)))
        .find(|t| !t.is_empty())
        .unwrap_or_default();

    let sd_index = props::SD_INDEX
        .iter()
        .find_map(|name| extract::number_opt(page.property(name)))
        .unwrap_or(0.0);

    let coordinates = match (
        extract::number_opt(page.property(props::LATITUDE)),
        extract::number_opt(page.property(props::LONGITUDE)),
    ) {
        (Some(lat), Some(lng)) => Some(Coordinates { lat, lng }),
        _ => None,
    };

    ContentBase {
        id: page.id.clone(),
        title,
        slug: page_slug(page),
        date: extract::date(page.property(props::DATE)),
        location: Location {
            name: extract::text(page.property(props::LOCATION)),
            coordinates,
        },
        web_category: extract::select(page.property(props::WEB_CATEGORY)),
        project: extract::multi_select(page.property(props::PROJECT)),
        concepts: extract::multi_select(page.property(props::CONCEPTS)),
        intent_vector: extract::text(page.property(props::INTENT_VECTOR)),
        sd_index,
        hero_image: extract::first_file_url(page.property(props::HERO_IMAGE)),
        blocks,
        dialogue: Vec::new(),
        philosophical_insight: None,
        emotion_trajectory: Vec::new(),
        embedding: None,
        schema_version: SCHEMA_VERSION.to_string(),
        last_updated: now,
        language: DEFAULT_LANGUAGE.to_string(),
    }
}

/// Whitespace-delimited words across all paragraph blocks
pub fn word_count(blocks: &[RawBlock]) -> usize {
    blocks
        .iter()
        .filter(|b| b.is_paragraph())
        .map(|b| b.plain_text().split_whitespace().count())
        .sum()
}

/// Minutes to read `words`, rounded up
pub fn reading_time(words: usize) -> u32 {
    words.div_ceil(WORDS_PER_MINUTE) as u32
}

fn derive_article(blocks: &[RawBlock]) -> Article {
    let excerpt = blocks
        .iter()
        .find(|b| b.is_paragraph())
        .map(|b| b.plain_text().chars().take(EXCERPT_CHARS).collect())
        .unwrap_or_default();

    Article {
        excerpt,
        reading_time: reading_time(word_count(blocks)),
    }
}

fn derive_comic(blocks: &[RawBlock]) -> Comic {
    let mut panels = Vec::new();

    for (idx, block) in blocks.iter().enumerate() {
        if block.kind != "image" {
            continue;
        }

        let narration = blocks
            .get(idx + 1)
            .filter(|next| next.is_paragraph())
            .map(RawBlock::plain_text);

        panels.push(Panel {
            panel_number: panels.len() as u32 + 1,
            image_url: block.media_url().unwrap_or_default().to_string(),
            width: PANEL_WIDTH,
            height: PANEL_HEIGHT,
            caption: block.caption(),
            narration,
        });
    }

    Comic {
        episode_number: DEFAULT_EPISODE,
        panels,
        sensory_memory: None,
    }
}

fn derive_podcast(blocks: &[RawBlock]) -> Podcast {
    let url = blocks
        .iter()
        .find(|b| b.kind == "file" || b.kind == "video")
        .and_then(RawBlock::media_url)
        .map(str::to_string);

    let transcript = blocks
        .iter()
        .filter_map(|b| {
            if b.is_paragraph() {
                Some(b.plain_text())
            } else {
                b.heading_level()
                    .map(|level| format!("{} {}", "#".repeat(level as usize), b.plain_text()))
            }
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    Podcast {
        audio_file: AudioFile {
            url,
            duration: DEFAULT_DURATION.to_string(),
        },
        structure: PodcastStructure::default(),
        transcript,
    }
}
