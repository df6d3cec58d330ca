//! Content source trait describing the external collaborator that owns
//! network transport.
//!
//! The catalog depends only on these signatures; field names and
//! serialization of the payloads are dictated by the source and passed
//! through opaquely aside from the attributes the domain layer names.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{Category, ContentItem, Language, ResourceType};

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("content source transport failure: {0}")]
    Transport(String),
    #[error("content source returned an undecodable payload: {0}")]
    Decode(String),
}

impl SourceError {
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode(message.into())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    Title,
    Slug,
    Order,
}

impl SortField {
    pub fn as_str(self) -> &'static str {
        match self {
            SortField::Title => "title",
            SortField::Slug => "slug",
            SortField::Order => "order",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

/// Filter and sort fields for list queries. Absent fields are omitted
/// from query-key construction, so `None` and "not passed" are the same
/// request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListParams {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub sort_field: Option<SortField>,
    pub sort_direction: Option<SortDirection>,
    pub category: Option<String>,
    pub tag: Option<String>,
    pub language: Option<Language>,
}

impl ListParams {
    /// Request the whole collection in one page. Used for curriculum
    /// extraction, which derives over the full course set.
    pub fn unpaginated() -> Self {
        Self::default()
    }
}

/// One page of content items plus enough metadata to request the next.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemPage {
    pub items: Vec<ContentItem>,
    pub page: u32,
    pub per_page: u32,
    pub total: u64,
    pub total_pages: u32,
}

impl ItemPage {
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            page: 1,
            per_page: 0,
            total: 0,
            total_pages: 0,
        }
    }

    /// Wrap a full collection as a single page.
    pub fn whole(items: Vec<ContentItem>) -> Self {
        let total = items.len() as u64;
        let per_page = u32::try_from(items.len()).unwrap_or(u32::MAX);
        Self {
            items,
            page: 1,
            per_page,
            total,
            total_pages: 1,
        }
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }
}

/// The external collaborator the catalog reads from.
///
/// May fail with a transport or decode error; an explicit "no such item"
/// answer from `fetch_by_slug` is `Ok(None)`, a terminal result the
/// catalog caches like any success.
#[async_trait]
pub trait ContentSource: Send + Sync {
    async fn fetch_list(
        &self,
        resource: ResourceType,
        params: &ListParams,
    ) -> Result<ItemPage, SourceError>;

    async fn fetch_by_slug(
        &self,
        resource: ResourceType,
        slug: &str,
        language: &Language,
    ) -> Result<Option<ContentItem>, SourceError>;

    async fn fetch_taxonomy(&self, resource: ResourceType) -> Result<Vec<Category>, SourceError>;
}
