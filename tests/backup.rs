//! Backup Layout Integration Tests
//!
//! Aggregate and metadata documents, per-type item files and slug collisions.

mod common;

use common::{para, typed_page};
use content_mirror::domain::{Content, ContentType};
use content_mirror::ingest::transform;
use content_mirror::library::backup::{AGGREGATE_FILE, METADATA_FILE};
use content_mirror::library::BackupWriter;
use serde_json::{json, Value};
use tempfile::TempDir;
use uuid::Uuid;

fn read_json(path: &std::path::Path) -> Value {
    serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
}

fn dated(id: &str, kind: &str, slug: &str, date: &str, category: &str) -> Content {
    let mut page = typed_page(id, kind, slug);
    page.properties.insert("Date".to_string(), json!({ "date": { "start": date } }));
    page.properties.insert(
        "Web Category".to_string(),
        json!({ "select": { "name": category } }),
    );
    transform(&page, vec![para("Some words here.")])
}

#[tokio::test]
async fn test_duplicate_slugs_are_suffixed_within_type() {
    let temp = TempDir::new().unwrap();
    let writer = BackupWriter::new(temp.path());
    let items = vec![
        transform(&typed_page("c1", "comic", "ep1"), vec![]),
        transform(&typed_page("c2", "comic", "ep1"), vec![]),
        transform(&typed_page("a1", "article", "ep1"), vec![]),
    ];

    let report = writer.write(&items, Uuid::new_v4()).await.unwrap();

    let comics = temp.path().join("comics");
    assert_eq!(read_json(&comics.join("ep1.json"))["id"], "c1");
    assert_eq!(read_json(&comics.join("ep1-2.json"))["id"], "c2");
    assert_eq!(read_json(&temp.path().join("articles").join("ep1.json"))["id"], "a1");

    assert_eq!(report.items.len(), 3);
    assert_eq!(report.collisions.len(), 1);
    assert_eq!(report.collisions[0].content_type, ContentType::Comic);
    assert_eq!(report.collisions[0].written_as, "ep1-2");
}

#[tokio::test]
async fn test_empty_slug_falls_back_to_id() {
    let temp = TempDir::new().unwrap();
    let items = vec![transform(&typed_page("page-42", "podcast", ""), vec![])];

    BackupWriter::new(temp.path())
        .write(&items, Uuid::new_v4())
        .await
        .unwrap();

    assert!(temp.path().join("podcasts").join("page-42.json").exists());
}

#[tokio::test]
async fn test_aggregate_document() {
    let temp = TempDir::new().unwrap();
    let run_id = Uuid::new_v4();
    let items = vec![
        dated("a1", "article", "first", "2024-03-01", "Essays"),
        dated("c1", "comic", "second", "2024-01-15", "Stories"),
    ];

    BackupWriter::new(temp.path()).write(&items, run_id).await.unwrap();

    let aggregate = read_json(&temp.path().join(AGGREGATE_FILE));
    assert_eq!(aggregate["version"], "1.0.0");
    assert_eq!(aggregate["runId"], run_id.to_string());
    assert_eq!(aggregate["count"], 2);
    assert!(aggregate["generatedAt"].is_string());

    let stored = aggregate["items"].as_array().unwrap();
    assert_eq!(stored[0]["slug"], "first");
    assert_eq!(stored[0]["contentType"], "article");
    assert_eq!(stored[1]["contentType"], "comic");

    // Items read back into the typed model
    let back: Vec<Content> = serde_json::from_value(aggregate["items"].clone()).unwrap();
    assert_eq!(back, items);
}

#[tokio::test]
async fn test_metadata_document() {
    let temp = TempDir::new().unwrap();
    let items = vec![
        dated("a1", "article", "first", "2024-03-01", "Essays"),
        dated("a2", "article", "second", "2023-11-20", "Essays"),
        dated("c1", "comic", "third", "2024-01-15", "Stories"),
        transform(&typed_page("p1", "podcast", "undated"), vec![]),
    ];

    BackupWriter::new(temp.path())
        .write(&items, Uuid::new_v4())
        .await
        .unwrap();

    let metadata = read_json(&temp.path().join(METADATA_FILE));
    assert_eq!(metadata["total"], 4);
    assert_eq!(metadata["counts"], json!({ "article": 2, "comic": 1, "podcast": 1 }));
    assert_eq!(metadata["categories"], json!(["Essays", "Stories"]));
    assert_eq!(metadata["dateRange"]["earliest"], "2023-11-20");
    assert_eq!(metadata["dateRange"]["latest"], "2024-03-01");
    assert_eq!(metadata["index"].as_array().unwrap().len(), 4);
    assert_eq!(metadata["index"][2]["slug"], "third");
    assert_eq!(metadata["agiReadiness"]["withEmbedding"], 0);
    assert_eq!(metadata["agiReadiness"]["totalBlocks"], 3);
}

#[tokio::test]
async fn test_rewrite_replaces_previous_backup() {
    let temp = TempDir::new().unwrap();
    let writer = BackupWriter::new(temp.path());

    writer
        .write(&[transform(&typed_page("a1", "article", "one"), vec![])], Uuid::new_v4())
        .await
        .unwrap();
    writer
        .write(
            &[
                transform(&typed_page("a1", "article", "one"), vec![]),
                transform(&typed_page("a2", "article", "two"), vec![]),
            ],
            Uuid::new_v4(),
        )
        .await
        .unwrap();

    let aggregate = read_json(&temp.path().join(AGGREGATE_FILE));
    assert_eq!(aggregate["count"], 2);
    assert!(temp.path().join("articles").join("two.json").exists());
}
