// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Page-number pagination for list endpoints.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

pub const DEFAULT_PAGE_SIZE: u32 = 6;
pub const MAX_PAGE_SIZE: u32 = 100;

/// `page` / `limit` query parameters.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PageParams {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_limit")]
    pub limit: u32,
}

fn default_page() -> u32 {
    1
}
fn default_limit() -> u32 {
    DEFAULT_PAGE_SIZE
}

impl Default for PageParams {
    fn default() -> Self {
        Self {
            page: default_page(),
            limit: default_limit(),
        }
    }
}

/// Paginated response envelope.
#[derive(Debug, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Page<T> {
    pub count: usize,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
}

impl PageParams {
    /// Effective page size, clamped to `1..=MAX_PAGE_SIZE`.
    pub fn limit(&self) -> usize {
        self.limit.clamp(1, MAX_PAGE_SIZE) as usize
    }

    /// Effective 1-based page number.
    pub fn page(&self) -> usize {
        self.page.max(1) as usize
    }
}

/// Slice `items` into the requested page.
///
/// `base_url` is the absolute URL of the endpoint without a query string and
/// `query` is the raw request query string; both are used to build the
/// `next`/`previous` links. A page past the end yields an empty result list.
pub fn paginate<T>(items: Vec<T>, params: PageParams, base_url: &str, query: &str) -> Page<T> {
    let count = items.len();
    let limit = params.limit();
    let page = params.page();
    let start = (page - 1).saturating_mul(limit);

    let results: Vec<T> = items.into_iter().skip(start).take(limit).collect();

    let next = if start.saturating_add(limit) < count {
        Some(page_link(base_url, query, page + 1))
    } else {
        None
    };
    let previous = if page > 1 {
        Some(page_link(base_url, query, page - 1))
    } else {
        None
    };

    Page {
        count,
        next,
        previous,
        results,
    }
}

/// Build a link to `page`, keeping every other query parameter.
pub fn page_link(base_url: &str, query: &str, page: usize) -> String {
    let mut pairs: Vec<&str> = query
        .split('&')
        .filter(|p| !p.is_empty() && *p != "page" && !p.starts_with("page="))
        .collect();
    let page_pair = format!("page={}", page);
    pairs.push(&page_pair);
    format!("{}?{}", base_url, pairs.join("&"))
}
