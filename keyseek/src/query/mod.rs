//! Abstract queries and the data source seam.
//!
//! A [`Query`] is a deferred description of filter, ordering and window. A
//! [`DataSource`] executes it against a store. Two realizations ship with the
//! crate: [`MemorySource`] evaluates queries over an in-memory vector, and
//! [`sql::SqlQuery`] renders them to parameterized SQL for a caller-owned
//! connection.

mod memory;
mod predicate;
pub mod sql;

pub use memory::MemorySource;
pub use predicate::{CompareOp, Condition, Matcher, Predicate};

use async_trait::async_trait;

use crate::error::SourceError;
use crate::schema::Entity;
use crate::sort::SortSpec;

/// A deferred query: filter, ordering and window.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    /// Rows must satisfy this predicate.
    pub filter: Option<Predicate>,
    /// Result ordering.
    pub order: Option<SortSpec>,
    /// Rows to skip before the window.
    pub offset: Option<usize>,
    /// Maximum rows to return.
    pub limit: Option<usize>,
}

impl Query {
    /// An unfiltered, unordered query.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a filter; ANDed with any existing one.
    #[must_use]
    pub fn filter(mut self, predicate: Predicate) -> Self {
        self.filter = Some(match self.filter.take() {
            None => predicate,
            Some(Predicate::And(mut branches)) => {
                branches.push(predicate);
                Predicate::And(branches)
            },
            Some(existing) => Predicate::And(vec![existing, predicate]),
        });
        self
    }

    /// Add an optional filter.
    #[must_use]
    pub fn filter_opt(self, predicate: Option<Predicate>) -> Self {
        match predicate {
            Some(p) => self.filter(p),
            None => self,
        }
    }

    /// Set the ordering.
    #[must_use]
    pub fn order_by(mut self, order: SortSpec) -> Self {
        self.order = Some(order);
        self
    }

    /// Skip `n` rows.
    #[must_use]
    pub const fn skip(mut self, n: usize) -> Self {
        self.offset = Some(n);
        self
    }

    /// Return at most `n` rows.
    #[must_use]
    pub const fn take(mut self, n: usize) -> Self {
        self.limit = Some(n);
        self
    }
}

/// First and last rows of a data set under some ordering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edges<T> {
    /// First row.
    pub first: T,
    /// Last row.
    pub last: T,
}

/// A store the paginator can query.
///
/// Implementations must apply `filter`, `order`, `offset` and `limit` of a
/// [`Query`] exactly, and must order values the way [`Value::compare`]
/// does for the fields used in orderings.
///
/// [`Value::compare`]: crate::Value::compare
#[async_trait]
pub trait DataSource<T: Entity>: Send + Sync {
    /// Materialize the rows matching `query`, in order.
    async fn fetch(&self, query: &Query) -> Result<Vec<T>, SourceError>;

    /// Count the rows matching `filter`.
    async fn count(&self, filter: Option<&Predicate>) -> Result<u64, SourceError>;

    /// First and last rows under `order`, restricted to `scope`.
    ///
    /// Returns `None` for an empty data set. The default issues two
    /// single-row fetches, one per direction.
    async fn edges(
        &self,
        scope: Option<&Predicate>,
        order: &SortSpec,
    ) -> Result<Option<Edges<T>>, SourceError> {
        let base = Query::new().filter_opt(scope.cloned());

        let first = self
            .fetch(&base.clone().order_by(order.clone()).take(1))
            .await?
            .into_iter()
            .next();
        let Some(first) = first else {
            return Ok(None);
        };

        let last = self
            .fetch(&base.order_by(order.reversed()).take(1))
            .await?
            .into_iter()
            .next();
        Ok(last.map(|last| Edges { first, last }))
    }
}
