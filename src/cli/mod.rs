//! Command-line interface for the content mirror.
//!
//! Provides commands for running a sync, querying the remote collection,
//! printing the content schema and inspecting configuration.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};

use crate::config;
use crate::core::{sort_for_publishing, Orchestrator, SyncOptions};
use crate::domain::{content_schema, Content, ContentType};

/// cmirror - mirror a remote page/block store into local content and media
#[derive(Parser, Debug)]
#[command(name = "cmirror")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch, transform, cache media and write the backup
    Sync {
        /// Move synced pages to the published state afterwards
        #[arg(long)]
        mark_published: bool,

        /// Keep remote media URLs instead of downloading them
        #[arg(long)]
        no_assets: bool,
    },

    /// List content in the remote collection
    List {
        /// Filter by content type
        #[arg(short = 't', long = "type", value_enum)]
        content_type: Option<TypeArg>,

        /// Maximum number of items to show
        #[arg(short, long, default_value = "50")]
        limit: usize,
    },

    /// Show one item by slug as JSON
    Show {
        /// Exact slug
        slug: String,
    },

    /// List items tagged with a project
    Project {
        /// Project tag (case- and whitespace-insensitive)
        tag: String,
    },

    /// List items in a web category
    Category {
        /// Category name (case-insensitive)
        name: String,
    },

    /// Print the JSON schema of the content model
    Schema,

    /// Show resolved configuration (debug)
    Config,
}

/// Content type for CLI (maps to ContentType)
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum TypeArg {
    Article,
    Comic,
    Podcast,
}

impl From<TypeArg> for ContentType {
    fn from(t: TypeArg) -> Self {
        match t {
            TypeArg::Article => ContentType::Article,
            TypeArg::Comic => ContentType::Comic,
            TypeArg::Podcast => ContentType::Podcast,
        }
    }
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> Result<()> {
        match self.command {
            Commands::Sync {
                mark_published,
                no_assets,
            } => run_sync(mark_published, no_assets).await,
            Commands::List {
                content_type,
                limit,
            } => list_content(content_type.map(Into::into), limit).await,
            Commands::Show { slug } => show_content(&slug).await,
            Commands::Project { tag } => {
                let orchestrator = orchestrator()?;
                let items = orchestrator.loader().get_by_project(&tag).await?;
                print_items(items, usize::MAX);
                Ok(())
            }
            Commands::Category { name } => {
                let orchestrator = orchestrator()?;
                let items = orchestrator.loader().get_by_category(&name).await?;
                print_items(items, usize::MAX);
                Ok(())
            }
            Commands::Schema => {
                println!("{}", serde_json::to_string_pretty(&content_schema())?);
                Ok(())
            }
            Commands::Config => show_config(),
        }
    }
}

/// Build an orchestrator from the global configuration
fn orchestrator() -> Result<Orchestrator> {
    let cfg = config::config()?;
    let token = config::api_token()?;
    Orchestrator::from_config(cfg, token)
}

/// Run a full sync
async fn run_sync(mark_published: bool, no_assets: bool) -> Result<()> {
    let cfg = config::config()?;
    let orchestrator = orchestrator()?;

    let report = orchestrator
        .run_sync(SyncOptions {
            cache_assets: !no_assets,
            mark_published: mark_published || cfg.sync.mark_published,
        })
        .await?;

    println!("Run {}", report.run_id);
    println!("Output: {}", report.output.display());
    println!();
    for (content_type, count) in &report.counts {
        println!("  {:<10} {}", content_type.plural(), count);
    }
    println!("  {:<10} {}", "total", report.total);
    println!();
    println!(
        "Assets: {} cached, {} downloaded, {} failed",
        report.assets.entries, report.assets.downloads, report.assets.failures
    );

    if !report.collisions.is_empty() {
        println!("\nSlug collisions:");
        for c in &report.collisions {
            println!("  {} '{}' written as {}.json", c.content_type, c.slug, c.written_as);
        }
    }

    if report.status_updated + report.status_failures > 0 {
        println!(
            "\nStatus updates: {} ok, {} failed",
            report.status_updated, report.status_failures
        );
    }

    Ok(())
}

/// List content, newest first
async fn list_content(content_type: Option<ContentType>, limit: usize) -> Result<()> {
    let orchestrator = orchestrator()?;
    let items = orchestrator.loader().get_all(content_type).await?;

    if items.is_empty() {
        println!("No content found.");
        return Ok(());
    }

    print_items(items, limit);
    Ok(())
}

/// Print one item by slug
async fn show_content(slug: &str) -> Result<()> {
    let orchestrator = orchestrator()?;

    match orchestrator.loader().get_by_slug(slug).await? {
        Some(content) => {
            let json = serde_json::to_string_pretty(&content)
                .context("Failed to serialize content")?;
            println!("{}", json);
        }
        None => {
            println!("No content with slug: {}", slug);
        }
    }

    Ok(())
}

fn print_items(mut items: Vec<Content>, limit: usize) {
    sort_for_publishing(&mut items);

    println!("{:<12} {:<10} {:<30} {:<40}", "DATE", "TYPE", "SLUG", "TITLE");
    println!("{}", "-".repeat(95));

    for item in items.iter().take(limit) {
        let title: String = if item.base.title.chars().count() > 37 {
            format!("{}...", item.base.title.chars().take(37).collect::<String>())
        } else {
            item.base.title.clone()
        };
        println!(
            "{:<12} {:<10} {:<30} {:<40}",
            item.base.date,
            item.content_type().to_string(),
            item.base.slug,
            title
        );
    }

    println!("\nTotal: {} items", items.len());
}

/// Show resolved configuration
fn show_config() -> Result<()> {
    use crate::config::paths;

    let cfg = config::config()?;

    println!("Content Mirror Configuration");
    println!();
    println!(
        "Config file: {}",
        cfg.config_file
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(none - using defaults)".to_string())
    );
    println!();
    println!("Paths:");
    println!("  Home:      {}", cfg.home.display());
    println!("  Output:    {}", cfg.output.display());
    println!("  Aggregate: {}", paths::aggregate_file()?.display());
    println!("  Metadata:  {}", paths::metadata_file()?.display());
    println!("  Media:     {}", paths::media_dir()?.display());
    println!();
    println!("Content type directories:");
    for content_type in ContentType::ALL {
        println!(
            "  {:<8} {}",
            content_type.as_str(),
            paths::content_type_dir(content_type)?.display()
        );
    }
    println!();
    println!("Remote:");
    println!("  Base URL:        {}", cfg.remote.base_url);
    println!("  API version:     {}", cfg.remote.api_version);
    println!(
        "  Database:        {}",
        cfg.remote.database_id.as_deref().unwrap_or("(not set)")
    );
    println!(
        "  Visible states:  {} in [{}]",
        cfg.remote.status_property,
        cfg.remote.visible_states.join(", ")
    );
    println!("  Published state: {}", cfg.remote.published_state);
    println!(
        "  Token:           {}",
        if config::api_token().is_ok() { "set" } else { "(not set)" }
    );
    println!();
    println!("Sync:");
    println!("  Concurrency:     {}", cfg.sync.concurrency);
    println!("  Block depth:     {}", cfg.sync.block_depth);
    println!("  Mark published:  {}", cfg.sync.mark_published);
    println!("  Media prefix:    {}", cfg.sync.media_prefix);

    Ok(())
}
