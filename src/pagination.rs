use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::error::ApiError;

/// PageParams
///
/// The `page` query parameter of list endpoints (1-based).
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageParams {
    /// Page number, starting at 1.
    pub page: Option<String>,
}

/// PageRequest
///
/// A validated page number and size, ready to become LIMIT/OFFSET.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub number: i64,
    pub size: i64,
}

impl PageRequest {
    pub fn new(number: i64, size: i64) -> Self {
        Self { number, size }
    }

    pub fn limit(&self) -> i64 {
        self.size
    }

    pub fn offset(&self) -> i64 {
        (self.number - 1) * self.size
    }
}

impl PageParams {
    pub fn resolve(&self, size: i64) -> Result<PageRequest, ApiError> {
        let number = match self.page.as_deref().map(str::trim) {
            None | Some("") => 1,
            Some(raw) => raw
                .parse::<i64>()
                .ok()
                .filter(|n| *n >= 1)
                .ok_or_else(invalid_page)?,
        };
        // The offset must fit in an i64, or the page cannot exist.
        (number - 1).checked_mul(size).ok_or_else(invalid_page)?;
        Ok(PageRequest::new(number, size))
    }
}

fn invalid_page() -> ApiError {
    ApiError::NotFound("Invalid page.".to_string())
}

/// Listing
///
/// One page of rows plus the total number of rows matching the query.
#[derive(Debug, Clone, PartialEq)]
pub struct Listing<T> {
    pub items: Vec<T>,
    pub count: i64,
}

/// Paginated
///
/// Envelope of every list response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Paginated<T> {
    pub count: i64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
}

impl<T> Paginated<T> {
    /// build
    ///
    /// Wraps one page of results. `base_url` is the collection URL and
    /// `raw_query` the request's query string, whose other parameters are
    /// carried over into `next`/`previous`. Fails for pages past the end;
    /// page 1 of an empty collection is valid.
    pub fn build(
        results: Vec<T>,
        count: i64,
        page: PageRequest,
        base_url: &str,
        raw_query: Option<&str>,
    ) -> Result<Self, ApiError> {
        let last_page = if count == 0 {
            1
        } else {
            (count + page.size - 1) / page.size
        };
        if page.number > last_page {
            return Err(invalid_page());
        }

        let next = (page.number < last_page)
            .then(|| page_url(base_url, raw_query, Some(page.number + 1)));
        let previous = (page.number > 1).then(|| {
            // Page 1 is addressed without a `page` parameter.
            let target = page.number - 1;
            page_url(base_url, raw_query, (target > 1).then_some(target))
        });

        Ok(Self {
            count,
            next,
            previous,
            results,
        })
    }
}

fn page_url(base_url: &str, raw_query: Option<&str>, page: Option<i64>) -> String {
    let mut pairs: Vec<String> = raw_query
        .unwrap_or_default()
        .split('&')
        .filter(|pair| !pair.is_empty())
        .filter(|pair| pair.split('=').next() != Some("page"))
        .map(str::to_string)
        .collect();

    if let Some(page) = page {
        pairs.push(format!("page={page}"));
    }

    if pairs.is_empty() {
        base_url.to_string()
    } else {
        format!("{}?{}", base_url, pairs.join("&"))
    }
}
