// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Parsing of catalog seed files.
//!
//! Ingredients come as `name,unit` CSV lines; tags as a JSON array of
//! `{name, color, slug}` objects. Ids are assigned from 1 in file order.

use crate::models::{Ingredient, Tag};
use serde::Deserialize;

const MAX_FIELD_LEN: usize = 200;

#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("line {line}: {reason}")]
    Ingredient { line: u64, reason: String },

    #[error("tag {index}: {reason}")]
    Tag { index: usize, reason: String },

    #[error("invalid ingredients file: {0}")]
    Csv(#[from] csv::Error),

    #[error("invalid tags file: {0}")]
    Json(#[from] serde_json::Error),
}

/// Parse `name,unit` records. Blank lines are skipped; fields may be quoted
/// so names can contain commas or quotes.
pub fn parse_ingredients_csv(input: &str) -> Result<Vec<Ingredient>, ImportError> {
    let input = input.trim_start_matches('\u{feff}');
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(input.as_bytes());

    let mut out = Vec::new();
    for result in reader.records() {
        let record = result?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);
        if record.iter().all(|field| field.is_empty()) {
            continue;
        }

        let (name, unit) = match (record.get(0), record.get(1), record.len()) {
            (Some(name), Some(unit), 2) => (name, unit),
            _ => {
                return Err(ImportError::Ingredient {
                    line,
                    reason: "expected `name,unit`".to_string(),
                })
            }
        };

        if name.is_empty() || unit.is_empty() {
            return Err(ImportError::Ingredient {
                line,
                reason: "name and unit must not be empty".to_string(),
            });
        }
        if name.chars().count() > MAX_FIELD_LEN || unit.chars().count() > MAX_FIELD_LEN {
            return Err(ImportError::Ingredient {
                line,
                reason: format!("fields are limited to {} characters", MAX_FIELD_LEN),
            });
        }

        out.push(Ingredient::new(out.len() as u64 + 1, name, unit));
    }
    Ok(out)
}

#[derive(Debug, Deserialize)]
struct TagSeed {
    name: String,
    color: String,
    slug: String,
}

fn is_hex_color(color: &str) -> bool {
    color.len() == 7
        && color.starts_with('#')
        && color[1..].chars().all(|c| c.is_ascii_hexdigit())
}

fn is_slug(slug: &str) -> bool {
    !slug.is_empty()
        && slug.len() <= MAX_FIELD_LEN
        && slug
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Parse a JSON array of tags, rejecting duplicate names or slugs.
pub fn parse_tags_json(input: &str) -> Result<Vec<Tag>, ImportError> {
    let seeds: Vec<TagSeed> = serde_json::from_str(input)?;
    let mut out: Vec<Tag> = Vec::with_capacity(seeds.len());

    for (index, seed) in seeds.into_iter().enumerate() {
        let fail = |reason: &str| ImportError::Tag {
            index,
            reason: reason.to_string(),
        };
        if seed.name.trim().is_empty() || seed.name.chars().count() > MAX_FIELD_LEN {
            return Err(fail("invalid name"));
        }
        if !is_hex_color(&seed.color) {
            return Err(fail("color must be #RRGGBB"));
        }
        if !is_slug(&seed.slug) {
            return Err(fail("invalid slug"));
        }
        if out.iter().any(|t| t.name == seed.name || t.slug == seed.slug) {
            return Err(fail("duplicate name or slug"));
        }

        out.push(Tag {
            id: index as u64 + 1,
            name: seed.name,
            color: seed.color.to_uppercase(),
            slug: seed.slug,
        });
    }
    Ok(out)
}
