//! In-memory data source.

use std::sync::Arc;

use async_trait::async_trait;

use super::{DataSource, Edges, Predicate, Query};
use crate::config::PaginationConfig;
use crate::error::{Result, SourceError};
use crate::schema::Entity;
use crate::sort::{MultiKeyComparator, SortSpec};
use crate::value::NullOrdering;

/// A [`DataSource`] over a shared in-memory vector.
///
/// Filters are compiled with [`Predicate::compile`] and orderings go through
/// the comparator cache, so results match what a store ordering by
/// [`Value::compare`](crate::Value::compare) would return.
#[derive(Debug)]
pub struct MemorySource<T> {
    items: Arc<[T]>,
    nulls: NullOrdering,
}

impl<T> Clone for MemorySource<T> {
    fn clone(&self) -> Self {
        Self {
            items: Arc::clone(&self.items),
            nulls: self.nulls,
        }
    }
}

impl<T: Entity + Clone> MemorySource<T> {
    /// Wrap `items`; nulls order first.
    pub fn new(items: impl Into<Arc<[T]>>) -> Self {
        Self {
            items: items.into(),
            nulls: NullOrdering::default(),
        }
    }

    /// Wrap `items` using the null ordering from `config`.
    pub fn with_config(items: impl Into<Arc<[T]>>, config: &PaginationConfig) -> Self {
        Self::new(items).null_ordering(config.null_ordering)
    }

    /// Override where nulls order.
    #[must_use]
    pub const fn null_ordering(mut self, nulls: NullOrdering) -> Self {
        self.nulls = nulls;
        self
    }

    /// Number of rows held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the source holds no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Run a query synchronously.
    pub fn run(&self, query: &Query) -> Result<Vec<T>> {
        let matcher = query
            .filter
            .as_ref()
            .map(|p| p.compile::<T>(self.nulls))
            .transpose()?;

        let mut rows: Vec<&T> = self
            .items
            .iter()
            .filter(|row| matcher.as_ref().is_none_or(|m| m(*row)))
            .collect();

        if let Some(order) = &query.order {
            let cmp = MultiKeyComparator::<T>::new(order, self.nulls)?;
            rows.sort_by(|a, b| cmp.compare(a, b));
        }

        Ok(rows
            .into_iter()
            .skip(query.offset.unwrap_or(0))
            .take(query.limit.unwrap_or(usize::MAX))
            .cloned()
            .collect())
    }

    fn matching(&self, filter: Option<&Predicate>) -> Result<u64> {
        let n = match filter {
            None => self.items.len(),
            Some(p) => {
                let m = p.compile::<T>(self.nulls)?;
                self.items.iter().filter(|row| m(*row)).count()
            },
        };
        Ok(u64::try_from(n).unwrap_or(u64::MAX))
    }

    /// First and last matching rows under `order` in one scan.
    ///
    /// Ties keep the earliest row in both directions, matching what a stable
    /// `take(1)` fetch under `order` and under its reverse would return.
    fn scan_edges(&self, scope: Option<&Predicate>, order: &SortSpec) -> Result<Option<Edges<T>>> {
        let matcher = scope.map(|p| p.compile::<T>(self.nulls)).transpose()?;
        let forward = MultiKeyComparator::<T>::new(order, self.nulls)?;
        let backward = MultiKeyComparator::<T>::new(&order.reversed(), self.nulls)?;

        let mut edges: Option<(&T, &T)> = None;
        for row in self
            .items
            .iter()
            .filter(|row| matcher.as_ref().is_none_or(|m| m(*row)))
        {
            edges = Some(match edges {
                None => (row, row),
                Some((first, last)) => (
                    if forward.compare(row, first).is_lt() { row } else { first },
                    if backward.compare(row, last).is_lt() { row } else { last },
                ),
            });
        }

        Ok(edges.map(|(first, last)| Edges {
            first: first.clone(),
            last: last.clone(),
        }))
    }
}

impl<T: Entity + Clone> From<Vec<T>> for MemorySource<T> {
    fn from(items: Vec<T>) -> Self {
        Self::new(items)
    }
}

#[async_trait]
impl<T: Entity + Clone> DataSource<T> for MemorySource<T> {
    async fn fetch(&self, query: &Query) -> Result<Vec<T>, SourceError> {
        Ok(self.run(query)?)
    }

    async fn count(&self, filter: Option<&Predicate>) -> Result<u64, SourceError> {
        Ok(self.matching(filter)?)
    }

    async fn edges(
        &self,
        scope: Option<&Predicate>,
        order: &SortSpec,
    ) -> Result<Option<Edges<T>>, SourceError> {
        Ok(self.scan_edges(scope, order)?)
    }
}
