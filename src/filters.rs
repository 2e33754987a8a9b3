//! Query-parameter filters for the list endpoints.
//!
//! Raw parameters are kept as strings so malformed values surface as
//! field-level validation errors naming the parameter. Resolution produces a
//! typed query that the repository turns into SQL and that the in-memory
//! store evaluates with `matches`. All filters are conjunctive and empty
//! values are ignored.

use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::{
    error::{ApiError, FieldErrors},
    models::{Blogpost, Comment},
    search::{SearchIndex, SearchTarget},
};

/// BlogpostFilterParams
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct BlogpostFilterParams {
    /// Exact id.
    pub id: Option<String>,
    #[serde(rename = "created__lt")]
    pub created_lt: Option<String>,
    #[serde(rename = "created__gt")]
    pub created_gt: Option<String>,
    #[serde(rename = "modified__lt")]
    pub modified_lt: Option<String>,
    #[serde(rename = "modified__gt")]
    pub modified_gt: Option<String>,
    /// Case-insensitive substring of the title.
    #[serde(rename = "title__icontains")]
    pub title_icontains: Option<String>,
    #[serde(rename = "description__icontains")]
    pub description_icontains: Option<String>,
    #[serde(rename = "content__icontains")]
    pub content_icontains: Option<String>,
    /// Username of the author.
    pub author: Option<String>,
    /// Full-text search.
    pub q: Option<String>,
}

/// CommentFilterParams
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CommentFilterParams {
    pub id: Option<String>,
    #[serde(rename = "created__lt")]
    pub created_lt: Option<String>,
    #[serde(rename = "created__gt")]
    pub created_gt: Option<String>,
    #[serde(rename = "modified__lt")]
    pub modified_lt: Option<String>,
    #[serde(rename = "modified__gt")]
    pub modified_gt: Option<String>,
    #[serde(rename = "content__icontains")]
    pub content_icontains: Option<String>,
    pub author: Option<String>,
    /// Id of the parent blogpost.
    pub blogpost: Option<String>,
    pub q: Option<String>,
}

/// Strict bounds on the `created`/`modified` timestamps.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimeBounds {
    pub created_lt: Option<DateTime<Utc>>,
    pub created_gt: Option<DateTime<Utc>>,
    pub modified_lt: Option<DateTime<Utc>>,
    pub modified_gt: Option<DateTime<Utc>>,
}

impl TimeBounds {
    pub fn matches(&self, created: DateTime<Utc>, modified: DateTime<Utc>) -> bool {
        self.created_lt.is_none_or(|bound| created < bound)
            && self.created_gt.is_none_or(|bound| created > bound)
            && self.modified_lt.is_none_or(|bound| modified < bound)
            && self.modified_gt.is_none_or(|bound| modified > bound)
    }
}

/// BlogpostQuery
///
/// Resolved blogpost filters. `search_ids` holds the `q` matches; `None` means
/// no search was requested.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlogpostQuery {
    pub id: Option<i64>,
    pub time: TimeBounds,
    pub title_contains: Option<String>,
    pub description_contains: Option<String>,
    pub content_contains: Option<String>,
    pub author: Option<String>,
    pub search_ids: Option<BTreeSet<i64>>,
}

impl BlogpostQuery {
    pub fn matches(&self, post: &Blogpost) -> bool {
        self.id.is_none_or(|id| post.id == id)
            && self.time.matches(post.created, post.modified)
            && contains_ci(&post.title, self.title_contains.as_deref())
            && contains_ci(&post.description, self.description_contains.as_deref())
            && contains_ci(&post.content, self.content_contains.as_deref())
            && self
                .author
                .as_deref()
                .is_none_or(|author| post.author_username == author)
            && self
                .search_ids
                .as_ref()
                .is_none_or(|ids| ids.contains(&post.id))
    }
}

/// CommentQuery
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommentQuery {
    pub id: Option<i64>,
    pub time: TimeBounds,
    pub content_contains: Option<String>,
    pub author: Option<String>,
    pub blogpost: Option<i64>,
    pub search_ids: Option<BTreeSet<i64>>,
}

impl CommentQuery {
    pub fn matches(&self, comment: &Comment) -> bool {
        self.id.is_none_or(|id| comment.id == id)
            && self.time.matches(comment.created, comment.modified)
            && contains_ci(&comment.content, self.content_contains.as_deref())
            && self
                .author
                .as_deref()
                .is_none_or(|author| comment.author_username == author)
            && self.blogpost.is_none_or(|id| comment.blogpost_id == id)
            && self
                .search_ids
                .as_ref()
                .is_none_or(|ids| ids.contains(&comment.id))
    }
}

fn contains_ci(haystack: &str, needle: Option<&str>) -> bool {
    needle.is_none_or(|needle| haystack.to_lowercase().contains(&needle.to_lowercase()))
}

impl BlogpostFilterParams {
    /// resolve
    ///
    /// Validates every parameter, then runs the `q` search (only if the rest
    /// is valid).
    pub async fn resolve(self, search: &dyn SearchIndex) -> Result<BlogpostQuery, ApiError> {
        let mut errors = FieldErrors::new();

        let id = parse_id("id", self.id.as_deref(), &mut errors);
        let time = TimeBounds {
            created_lt: parse_datetime("created__lt", self.created_lt.as_deref(), &mut errors),
            created_gt: parse_datetime("created__gt", self.created_gt.as_deref(), &mut errors),
            modified_lt: parse_datetime("modified__lt", self.modified_lt.as_deref(), &mut errors),
            modified_gt: parse_datetime("modified__gt", self.modified_gt.as_deref(), &mut errors),
        };
        errors.into_result()?;

        Ok(BlogpostQuery {
            id,
            time,
            title_contains: non_empty(self.title_icontains),
            description_contains: non_empty(self.description_icontains),
            content_contains: non_empty(self.content_icontains),
            author: non_empty(self.author),
            search_ids: run_search(search, SearchTarget::Blogposts, self.q.as_deref()).await?,
        })
    }
}

impl CommentFilterParams {
    pub async fn resolve(self, search: &dyn SearchIndex) -> Result<CommentQuery, ApiError> {
        let mut errors = FieldErrors::new();

        let id = parse_id("id", self.id.as_deref(), &mut errors);
        let blogpost = parse_id("blogpost", self.blogpost.as_deref(), &mut errors);
        let time = TimeBounds {
            created_lt: parse_datetime("created__lt", self.created_lt.as_deref(), &mut errors),
            created_gt: parse_datetime("created__gt", self.created_gt.as_deref(), &mut errors),
            modified_lt: parse_datetime("modified__lt", self.modified_lt.as_deref(), &mut errors),
            modified_gt: parse_datetime("modified__gt", self.modified_gt.as_deref(), &mut errors),
        };
        errors.into_result()?;

        Ok(CommentQuery {
            id,
            time,
            content_contains: non_empty(self.content_icontains),
            author: non_empty(self.author),
            blogpost,
            search_ids: run_search(search, SearchTarget::Comments, self.q.as_deref()).await?,
        })
    }
}

/// Empty or whitespace-only `q` is a no-op.
async fn run_search(
    search: &dyn SearchIndex,
    target: SearchTarget,
    q: Option<&str>,
) -> Result<Option<BTreeSet<i64>>, ApiError> {
    match q.map(str::trim).filter(|q| !q.is_empty()) {
        Some(q) => Ok(Some(search.search(target, q).await?)),
        None => Ok(None),
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

fn parse_id(name: &str, raw: Option<&str>, errors: &mut FieldErrors) -> Option<i64> {
    let raw = raw.map(str::trim).filter(|v| !v.is_empty())?;
    match raw.parse() {
        Ok(id) => Some(id),
        Err(_) => {
            errors.add(name, "Enter a number.");
            None
        }
    }
}

fn parse_datetime(name: &str, raw: Option<&str>, errors: &mut FieldErrors) -> Option<DateTime<Utc>> {
    let raw = raw.map(str::trim).filter(|v| !v.is_empty())?;
    match parse_timestamp(raw) {
        Some(value) => Some(value),
        None => {
            errors.add(name, "Enter a valid date/time.");
            None
        }
    }
}

/// parse_timestamp
///
/// Accepts RFC 3339, naive `YYYY-MM-DD[ T]HH:MM[:SS[.f]]` (taken as UTC) and
/// bare dates (midnight UTC).
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(value) = DateTime::parse_from_rfc3339(raw) {
        return Some(value.with_timezone(&Utc));
    }

    const NAIVE_FORMATS: &[&str] = &[
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M",
    ];
    if let Some(value) = NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
    {
        return Some(value.and_utc());
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|value| value.and_utc())
}
