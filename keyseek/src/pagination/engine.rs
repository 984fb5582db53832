//! Cursor pagination engine.
//!
//! A request costs two store calls: the edge rows of the data set and the
//! page itself. The count behind `total_items` is an opt-in third call,
//! controlled by [`PaginationConfig::include_total`]. Sources that cannot
//! answer [`DataSource::edges`] in one query pay one more.
//!
//! Everything that can be validated locally (sort fields, scope fields, the
//! cursor token, the width of the cursors the sort will produce) is checked
//! before the first call. Issued cursors obey the same limits the decoder
//! enforces, so every token a page carries can be fed back.

use std::future::Future;

use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};

use super::cursor::CursorPayload;
use super::keyset::KeysetCondition;
use super::page::Page;
use super::request::{Direction, PaginationRequest};
use crate::config::PaginationConfig;
use crate::error::{Error, Result, SourceError};
use crate::query::{DataSource, Predicate, Query};
use crate::schema::{Entity, FieldDescriptor};
use crate::sort::SortSpec;

/// Pages over a [`DataSource`].
///
/// ```
/// # use keyseek::{Entity, MemorySource, PaginationRequest, Paginator, Schema, __private::Lazy};
/// # #[derive(Clone)]
/// # struct User { id: i64, age: i32 }
/// # impl Entity for User {
/// #     fn schema() -> &'static Schema<Self> {
/// #         static SCHEMA: Lazy<Schema<User>> = Lazy::new(|| {
/// #             Schema::builder("User")
/// #                 .field("id", |u: &User| &u.id)
/// #                 .field("age", |u: &User| &u.age)
/// #                 .build()
/// #         });
/// #         &SCHEMA
/// #     }
/// # }
/// # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
/// let users = MemorySource::new(vec![
///     User { id: 1, age: 30 },
///     User { id: 2, age: 25 },
///     User { id: 3, age: 25 },
///     User { id: 4, age: 20 },
/// ]);
///
/// let request = PaginationRequest::new(2, "id").unwrap().sort_by("age".to_string());
/// let first = Paginator::new(&users).by_cursor(&request).await.unwrap();
/// assert_eq!(first.items.iter().map(|u| u.id).collect::<Vec<_>>(), [4, 2]);
///
/// let request = request.after_cursor(first.next_cursor.clone());
/// let second = Paginator::new(&users).by_cursor(&request).await.unwrap();
/// assert_eq!(second.items.iter().map(|u| u.id).collect::<Vec<_>>(), [3, 1]);
/// assert!(second.next_cursor.is_none());
/// # });
/// ```
#[derive(Debug)]
pub struct Paginator<'a, S> {
    pub(super) source: &'a S,
    pub(super) scope: Option<Predicate>,
    pub(super) order: Option<SortSpec>,
    pub(super) config: PaginationConfig,
    cancel: Option<CancellationToken>,
}

impl<'a, S> Paginator<'a, S> {
    /// Page over `source` with default limits.
    pub fn new(source: &'a S) -> Self {
        Self {
            source,
            scope: None,
            order: None,
            config: PaginationConfig::default(),
            cancel: None,
        }
    }

    /// Restrict every query, including edges and counts, to `scope`.
    #[must_use]
    pub fn scope(mut self, scope: Predicate) -> Self {
        self.scope = Some(scope);
        self
    }

    /// Ordering for offset pages. Cursor pages use the request's sort.
    #[must_use]
    pub fn order_by(mut self, order: SortSpec) -> Self {
        self.order = Some(order);
        self
    }

    /// Replace the limits.
    #[must_use]
    pub fn config(mut self, config: PaginationConfig) -> Self {
        self.config = config;
        self
    }

    /// Abort store calls once `token` is cancelled.
    #[must_use]
    pub fn cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Await a store call, racing it against the cancellation token.
    pub(super) async fn call<F, R>(&self, fut: F) -> Result<R>
    where
        F: Future<Output = std::result::Result<R, SourceError>>,
    {
        let result = match &self.cancel {
            Some(token) => tokio::select! {
                biased;
                () = token.cancelled() => return Err(Error::Cancelled),
                result = fut => result,
            },
            None => fut.await,
        };
        result.map_err(Error::Source)
    }

    pub(super) fn check_size(&self, size: usize) -> Result<()> {
        if size > self.config.max_page_size {
            return Err(Error::InvalidRequest(format!(
                "size {size} exceeds the maximum of {}",
                self.config.max_page_size
            )));
        }
        Ok(())
    }

    /// Fetch the page described by `request`.
    #[instrument(
        skip_all,
        fields(entity = T::schema().name(), size = request.size(), direction = ?request.direction())
    )]
    pub async fn by_cursor<T>(&self, request: &PaginationRequest) -> Result<Page<T>>
    where
        T: Entity,
        S: DataSource<T>,
    {
        self.check_size(request.size())?;

        let base = request.base_sort()?;
        base.validate_for::<T>()?;
        let width = base.fields().count();
        if width > self.config.max_cursor_fields {
            return Err(Error::InvalidRequest(format!(
                "sort `{base}` names {width} fields but cursors carry at most {}",
                self.config.max_cursor_fields
            )));
        }
        if let Some(scope) = &self.scope {
            scope.validate_for::<T>()?;
        }
        let unique = T::schema().resolve(&request.unique_term()?.field)?;

        let direction = request.direction();
        let keyset = match request.cursor() {
            None => None,
            Some(token) => Some(self.decode_keyset::<T>(token, &base, direction)?),
        };

        let Some(edges) = self.call(self.source.edges(self.scope.as_ref(), &base)).await? else {
            debug!(sort = %base, "empty data set");
            let page = Page::empty(request.size());
            return Ok(if self.config.include_total {
                page.with_total(0)
            } else {
                page
            });
        };

        let total = if self.config.include_total {
            Some(self.call(self.source.count(self.scope.as_ref())).await?)
        } else {
            None
        };

        let effective = match direction {
            Direction::Backward => base.reversed(),
            Direction::FirstPage | Direction::Forward => base.clone(),
        };
        let query = Query::new()
            .filter_opt(self.scope.clone())
            .filter_opt(keyset.map(|k| k.to_predicate()))
            .order_by(effective)
            .take(request.size());
        debug!(?query, "fetching page");

        let mut items = self.call(self.source.fetch(&query)).await?;
        if direction == Direction::Backward {
            items.reverse();
        }

        let full = items.len() >= request.size();
        let (next_cursor, previous_cursor) = match direction {
            Direction::FirstPage => {
                let next = if full && !at_edge(unique, items.last(), &edges.last)? {
                    self.encode(items.last(), &base)?
                } else {
                    None
                };
                (next, None)
            },
            Direction::Forward => {
                let next = if full && !at_edge(unique, items.last(), &edges.last)? {
                    self.encode(items.last(), &base)?
                } else {
                    None
                };
                (next, self.encode(items.first(), &base)?)
            },
            Direction::Backward => {
                let previous = if full && !at_edge(unique, items.first(), &edges.first)? {
                    self.encode(items.first(), &base)?
                } else {
                    None
                };
                (self.encode(items.last(), &base)?, previous)
            },
        };

        debug!(
            items = items.len(),
            has_next = next_cursor.is_some(),
            has_previous = previous_cursor.is_some(),
            "page assembled"
        );

        let mut page = Page::empty(request.size());
        page.items = items;
        page.next_cursor = next_cursor;
        page.previous_cursor = previous_cursor;
        Ok(match total {
            Some(total) => page.with_total(total),
            None => page,
        })
    }

    /// Decode `token` and build the keyset predicate for `direction`.
    ///
    /// Cursors always record the base sort, so a token is only accepted
    /// when it was issued for the same ordering as the request.
    fn decode_keyset<T: Entity>(
        &self,
        token: &str,
        base: &SortSpec,
        direction: Direction,
    ) -> Result<KeysetCondition> {
        let payload = CursorPayload::decode_with(token, &self.config).inspect_err(|err| {
            warn!(error = %err, "rejected cursor");
        })?;

        if !base.matches(&payload.sort) {
            warn!(expected = %base, found = %payload.sort, "cursor sort mismatch");
            return Err(Error::CursorMismatch {
                expected: base.to_string(),
                found: payload.sort,
            });
        }

        KeysetCondition::from_cursor::<T>(base, &payload, direction != Direction::Backward)
    }

    /// Cursor for `row`, refused when it would exceed the decode limits.
    fn encode<T: Entity>(&self, row: Option<&T>, base: &SortSpec) -> Result<Option<String>> {
        let Some(row) = row else {
            return Ok(None);
        };
        let token = CursorPayload::from_entity(row, base)?
            .encode_with(&self.config)
            .map_err(|err| {
                warn!(sort = %base, error = %err, "cursor not issued");
                Error::InvalidRequest(format!("cannot issue a cursor for sort `{base}`: {err}"))
            })?;
        Ok(Some(token))
    }
}

/// Whether `row` is the data set edge `edge`, compared by unique key.
fn at_edge<T>(unique: &FieldDescriptor<T>, row: Option<&T>, edge: &T) -> Result<bool> {
    let Some(row) = row else {
        return Ok(true);
    };
    let (row_key, edge_key) = (unique.read(row), unique.read(edge));
    if row_key.is_null() || edge_key.is_null() {
        return Err(Error::InvariantViolation(format!(
            "unique sort field `{}` is null on a boundary row",
            unique.path()
        )));
    }
    Ok(row_key == edge_key)
}

/// Fetch the page described by `request` with default limits.
pub async fn page_by_cursor<T, S>(source: &S, request: &PaginationRequest) -> Result<Page<T>>
where
    T: Entity,
    S: DataSource<T>,
{
    Paginator::new(source).by_cursor(request).await
}
