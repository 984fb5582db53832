//! Cursor pagination requests.

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::sort::{SortSpec, SortTerm};

/// Which way a request pages, decided by which cursor it carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// No cursor: start of the data set.
    FirstPage,
    /// `after` cursor: rows following the anchor.
    Forward,
    /// `before` cursor: rows preceding the anchor. Wins over `after`.
    Backward,
}

/// A request for one page of a cursor-paginated result.
///
/// Blank strings count as absent, so query strings like `?after=&size=20`
/// behave like `?size=20`.
///
/// ```
/// use keyseek::{Direction, PaginationRequest};
///
/// let request: PaginationRequest =
///     serde_json::from_str(r#"{"size": 20, "sort": "age:desc", "uniqueSort": "id", "after": ""}"#)
///         .unwrap();
/// assert_eq!(request.direction(), Direction::FirstPage);
/// assert_eq!(request.base_sort().unwrap().to_string(), "age:desc,id");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawRequest")]
pub struct PaginationRequest {
    before: Option<String>,
    after: Option<String>,
    size: usize,
    sort: Option<String>,
    unique_sort: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawRequest {
    #[serde(default)]
    before: Option<String>,
    #[serde(default)]
    after: Option<String>,
    size: usize,
    #[serde(default)]
    sort: Option<String>,
    unique_sort: String,
}

impl TryFrom<RawRequest> for PaginationRequest {
    type Error = Error;

    fn try_from(raw: RawRequest) -> Result<Self> {
        Ok(Self::new(raw.size, raw.unique_sort)?
            .before_cursor(raw.before)
            .after_cursor(raw.after)
            .sort_by(raw.sort))
    }
}

fn non_blank(s: Option<String>) -> Option<String> {
    s.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

impl PaginationRequest {
    /// A first-page request.
    ///
    /// `unique_sort` names a field unique per row, optionally with a
    /// direction. It must parse as exactly one term and `size` must be
    /// positive.
    pub fn new(size: usize, unique_sort: impl Into<String>) -> Result<Self> {
        let unique_sort = unique_sort.into().trim().to_string();
        if unique_sort.is_empty() {
            return Err(Error::InvalidRequest("uniqueSort is required".to_string()));
        }
        let parsed = SortSpec::parse(&unique_sort)?;
        if parsed.terms().len() != 1 {
            return Err(Error::InvalidRequest(format!(
                "uniqueSort must name exactly one field, got `{unique_sort}`"
            )));
        }
        if size == 0 {
            return Err(Error::InvalidRequest("size must be greater than 0".to_string()));
        }

        Ok(Self {
            before: None,
            after: None,
            size,
            sort: None,
            unique_sort,
        })
    }

    /// Page backward from `cursor`.
    #[must_use]
    pub fn before_cursor(mut self, cursor: impl Into<Option<String>>) -> Self {
        self.before = non_blank(cursor.into());
        self
    }

    /// Page forward from `cursor`.
    #[must_use]
    pub fn after_cursor(mut self, cursor: impl Into<Option<String>>) -> Self {
        self.after = non_blank(cursor.into());
        self
    }

    /// Order by `sort` instead of the unique field alone.
    #[must_use]
    pub fn sort_by(mut self, sort: impl Into<Option<String>>) -> Self {
        self.sort = non_blank(sort.into());
        self
    }

    /// Cursor for backward paging.
    #[must_use]
    pub fn before(&self) -> Option<&str> {
        self.before.as_deref()
    }

    /// Cursor for forward paging.
    #[must_use]
    pub fn after(&self) -> Option<&str> {
        self.after.as_deref()
    }

    /// Requested page size.
    #[must_use]
    pub const fn size(&self) -> usize {
        self.size
    }

    /// Requested sort, if any.
    #[must_use]
    pub fn sort(&self) -> Option<&str> {
        self.sort.as_deref()
    }

    /// The unique tiebreaker sort.
    #[must_use]
    pub fn unique_sort(&self) -> &str {
        &self.unique_sort
    }

    /// Paging direction; `before` wins when both cursors are present.
    #[must_use]
    pub const fn direction(&self) -> Direction {
        if self.before.is_some() {
            Direction::Backward
        } else if self.after.is_some() {
            Direction::Forward
        } else {
            Direction::FirstPage
        }
    }

    /// The cursor matching [`direction`](Self::direction).
    #[must_use]
    pub fn cursor(&self) -> Option<&str> {
        self.before().or_else(|| self.after())
    }

    /// The unique tiebreaker term.
    pub fn unique_term(&self) -> Result<SortTerm> {
        let spec = SortSpec::parse(&self.unique_sort)?;
        spec.terms()
            .first()
            .cloned()
            .ok_or_else(|| Error::InvalidRequest("uniqueSort is required".to_string()))
    }

    /// The requested sort (or the unique sort) with the tiebreaker appended.
    pub fn base_sort(&self) -> Result<SortSpec> {
        let sort = SortSpec::parse(self.sort.as_deref().unwrap_or(&self.unique_sort))?;
        Ok(sort.with_tiebreaker(self.unique_term()?))
    }
}
