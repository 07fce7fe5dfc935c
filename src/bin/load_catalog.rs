// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Catalog seeding tool.
//!
//! Loads ingredients from a `name,unit` CSV file and tags from a JSON file
//! into Firestore. Existing documents with the same ids are overwritten, so
//! the tool can be re-run after editing the seed files.

use anyhow::Context;
use clap::Parser;
use foodgram::db::{collections, FirestoreDb};
use foodgram::services::catalog_import::{parse_ingredients_csv, parse_tags_json};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "load_catalog", about = "Seed the ingredient and tag catalog")]
struct Cli {
    /// GCP project hosting the Firestore database
    #[arg(long, env = "GCP_PROJECT_ID", default_value = "local-dev")]
    project: String,

    /// Ingredients CSV (`name,unit` per line)
    #[arg(long)]
    ingredients: Option<PathBuf>,

    /// Tags JSON (array of `{name, color, slug}`)
    #[arg(long)]
    tags: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    if cli.ingredients.is_none() && cli.tags.is_none() {
        anyhow::bail!("nothing to load: pass --ingredients and/or --tags");
    }

    let db = FirestoreDb::new(&cli.project).await?;

    if let Some(path) = &cli.ingredients {
        let input = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("reading {}", path.display()))?;
        let ingredients = parse_ingredients_csv(&input)?;

        for ingredient in &ingredients {
            db.upsert_ingredient(ingredient).await?;
        }
        let last_id = ingredients.last().map(|i| i.id).unwrap_or(0);
        db.bump_counter(collections::INGREDIENTS, last_id).await?;
        tracing::info!(count = ingredients.len(), "Ingredients loaded");
    }

    if let Some(path) = &cli.tags {
        let input = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("reading {}", path.display()))?;
        let tags = parse_tags_json(&input)?;

        for tag in &tags {
            db.upsert_tag(tag).await?;
        }
        let last_id = tags.last().map(|t| t.id).unwrap_or(0);
        db.bump_counter(collections::TAGS, last_id).await?;
        tracing::info!(count = tags.len(), "Tags loaded");
    }

    Ok(())
}
