//! List requests and paged results.
//!
//! A listing narrows a collection with exact-match filters and an optional
//! search expression, then cuts one page out of what is left.

use serde::{Deserialize, Serialize};

use crate::config::PaginationConfig;
use crate::search::lexer::LexMode;
use crate::search::{self, Literal, Predicate};
use crate::{Error, Result};

/// Parameters of a list request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListParams {
    /// Search expression, e.g. `(distance gt 10) AND (location eq "Madrid")`.
    pub search: Option<String>,
    /// `(field, raw value)` pairs that must match exactly.
    pub filters: Vec<(String, String)>,
    /// 1-based; `None` means the first page.
    pub page: Option<usize>,
    pub page_size: Option<usize>,
}

impl ListParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn search(mut self, query: impl Into<String>) -> Self {
        self.search = Some(query.into());
        self
    }

    pub fn filter(mut self, field: impl Into<String>, raw: impl Into<String>) -> Self {
        self.filters.push((field.into(), raw.into()));
        self
    }

    pub fn page(mut self, page: usize) -> Self {
        self.page = Some(page);
        self
    }

    pub fn page_size(mut self, size: usize) -> Self {
        self.page_size = Some(size);
        self
    }

    /// Build params from query-string pairs. `search`, `page` and
    /// `page_size` are reserved; every other key is an exact-match filter.
    pub fn from_query<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Result<Self> {
        let mut params = ListParams::new();
        for (key, value) in pairs {
            match key {
                "search" => params.search = Some(value.to_string()),
                "page" => params.page = Some(parse_count(key, value)?),
                "page_size" => params.page_size = Some(parse_count(key, value)?),
                _ => params.filters.push((key.to_string(), value.to_string())),
            }
        }
        Ok(params)
    }

    /// The combined filter: every exact match ANDed, then the search
    /// expression. `None` when nothing narrows the listing.
    ///
    /// Exact-match values stay raw text; each field reads them as its own
    /// type, so `username=12345` compares text and `distance=15.9` a number.
    pub fn predicate(&self, mode: LexMode) -> Result<Option<Predicate>> {
        let search = match self.search.as_deref() {
            Some(query) if !query.trim().is_empty() => Some(search::parse_with(query, mode)?),
            _ => None,
        };
        let exact = self
            .filters
            .iter()
            .map(|(field, raw)| Predicate::eq(field.as_str(), Literal::Text(raw.clone())));
        Ok(Predicate::all(exact.chain(search)))
    }
}

fn parse_count(key: &str, value: &str) -> Result<usize> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::InvalidInput(format!("{key} must be a positive integer, got '{value}'")))
}

// ============================================================================
// Page
// ============================================================================

/// One page of a listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    /// Matches across all pages.
    pub count: usize,
    pub page: usize,
    pub results: Vec<T>,
}

impl<T> Page<T> {
    /// Cut the requested page out of the full, ordered result list.
    pub fn paginate(items: Vec<T>, params: &ListParams, config: &PaginationConfig) -> Result<Self> {
        let page = params.page.unwrap_or(1);
        if page == 0 {
            return Err(Error::InvalidInput("page numbers start at 1".into()));
        }
        let size = params
            .page_size
            .unwrap_or(config.page_size)
            .clamp(1, config.max_page_size.max(1));

        let count = items.len();
        let start = (page - 1).saturating_mul(size);
        if start >= count && !(page == 1 && count == 0) {
            return Err(Error::NotFound(format!("page {page} (only {count} results)")));
        }

        let results = items.into_iter().skip(start).take(size).collect();
        Ok(Page { count, page, results })
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.results.iter()
    }
}

impl<'a, T> IntoIterator for &'a Page<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.iter()
    }
}
