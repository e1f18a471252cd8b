//! Property extractors.
//!
//! Each extractor maps one raw property shape to a plain value. They are
//! total: an absent or malformed property yields the documented default and
//! never an error.

use chrono::NaiveDate;
use serde_json::Value;

use crate::domain::raw::{file_object_url, rich_text_to_string};

/// Concatenated text of a `title` or `rich_text` property; empty if absent
pub fn text(property: Option<&Value>) -> String {
    let Some(property) = property else {
        return String::new();
    };

    ["title", "rich_text"]
        .iter()
        .find_map(|key| property.get(*key))
        .map(rich_text_to_string)
        .unwrap_or_default()
}

/// Option names of a `multi_select` property, in order; empty if absent
pub fn multi_select(property: Option<&Value>) -> Vec<String> {
    property
        .and_then(|p| p.get("multi_select"))
        .and_then(Value::as_array)
        .map(|options| {
            options
                .iter()
                .filter_map(|o| o.get("name").and_then(Value::as_str))
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Name of the chosen `select` (or `status`) option; empty if absent
pub fn select(property: Option<&Value>) -> String {
    let Some(property) = property else {
        return String::new();
    };

    ["select", "status"]
        .iter()
        .find_map(|key| property.pointer(&format!("/{}/name", key)))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

/// Start of a `date` property as `YYYY-MM-DD`; empty if absent or malformed
pub fn date(property: Option<&Value>) -> String {
    let Some(start) = property
        .and_then(|p| p.pointer("/date/start"))
        .and_then(Value::as_str)
    else {
        return String::new();
    };

    start
        .get(..10)
        .and_then(|day| NaiveDate::parse_from_str(day, "%Y-%m-%d").ok())
        .map(|day| day.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

/// Value of a `number` property; 0 if absent or null
pub fn number(property: Option<&Value>) -> f64 {
    property
        .and_then(|p| p.get("number"))
        .and_then(Value::as_f64)
        .unwrap_or(0.0)
}

/// Value of a `number` property, distinguishing absent from zero
pub fn number_opt(property: Option<&Value>) -> Option<f64> {
    property
        .and_then(|p| p.get("number"))
        .and_then(Value::as_f64)
}

/// URL of the first entry of a `files` property
pub fn first_file_url(property: Option<&Value>) -> Option<String> {
    property
        .and_then(|p| p.get("files"))
        .and_then(Value::as_array)
        .and_then(|files| files.first())
        .and_then(file_object_url)
        .map(str::to_string)
}

/// Lower-cased tag with internal whitespace collapsed to `-`
pub fn normalize_tag(tag: &str) -> String {
    tag.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("-")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_absent_properties_yield_defaults() {
        assert_eq!(text(None), "");
        assert!(multi_select(None).is_empty());
        assert_eq!(select(None), "");
        assert_eq!(date(None), "");
        assert_eq!(number(None), 0.0);
        assert_eq!(first_file_url(None), None);
    }

    #[test]
    fn test_malformed_properties_yield_defaults() {
        let junk = json!({ "rich_text": 42, "multi_select": "x", "select": null, "date": { "start": "soon" }, "number": null, "files": {} });
        assert_eq!(text(Some(&junk)), "");
        assert!(multi_select(Some(&junk)).is_empty());
        assert_eq!(select(Some(&junk)), "");
        assert_eq!(date(Some(&junk)), "");
        assert_eq!(number(Some(&junk)), 0.0);
        assert_eq!(first_file_url(Some(&junk)), None);
    }

    #[test]
    fn test_text_concatenates_fragments() {
        let title = json!({ "title": [{ "plain_text": "Night " }, { "plain_text": "Walk" }] });
        let rich = json!({ "rich_text": [{ "plain_text": "night-walk" }] });
        assert_eq!(text(Some(&title)), "Night Walk");
        assert_eq!(text(Some(&rich)), "night-walk");
    }

    #[test]
    fn test_select_and_multi_select() {
        let sel = json!({ "select": { "name": "Essays" } });
        let status = json!({ "status": { "name": "Published" } });
        let multi = json!({ "multi_select": [{ "name": "Alpha" }, { "name": "Beta" }] });
        assert_eq!(select(Some(&sel)), "Essays");
        assert_eq!(select(Some(&status)), "Published");
        assert_eq!(multi_select(Some(&multi)), vec!["Alpha", "Beta"]);
    }

    #[test]
    fn test_date_truncates_time_and_zone() {
        let dt = json!({ "date": { "start": "2024-05-17T09:30:00.000+02:00" } });
        let day = json!({ "date": { "start": "2024-05-17" } });
        assert_eq!(date(Some(&dt)), "2024-05-17");
        assert_eq!(date(Some(&day)), "2024-05-17");
    }

    #[test]
    fn test_number_passthrough() {
        let n = json!({ "number": 7.5 });
        assert_eq!(number(Some(&n)), 7.5);
        assert_eq!(number_opt(Some(&json!({ "number": null }))), None);
    }

    #[test]
    fn test_first_file_url_either_hosting() {
        let internal = json!({ "files": [{ "type": "file", "file": { "url": "https://s3/x.png" } }, { "external": { "url": "https://other" } }] });
        let external = json!({ "files": [{ "type": "external", "external": { "url": "https://cdn/y.jpg" } }] });
        let empty = json!({ "files": [] });
        assert_eq!(first_file_url(Some(&internal)).as_deref(), Some("https://s3/x.png"));
        assert_eq!(first_file_url(Some(&external)).as_deref(), Some("https://cdn/y.jpg"));
        assert_eq!(first_file_url(Some(&empty)), None);
    }

    #[test]
    fn test_normalize_tag() {
        assert_eq!(normalize_tag("  Deep   Sea Project "), "deep-sea-project");
        assert_eq!(normalize_tag("solo"), "solo");
    }
}
