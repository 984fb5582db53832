//! Multi-key ordering composed from cached comparators.

use std::cmp::Ordering;
use std::sync::Arc;

use super::comparator::{Comparator, comparator};
use super::{SortDir, SortSpec};
use crate::error::Result;
use crate::schema::Entity;
use crate::value::NullOrdering;

/// Lexicographic comparator over every term of a [`SortSpec`].
pub struct MultiKeyComparator<T> {
    keys: Vec<(Arc<Comparator<T>>, SortDir)>,
}

impl<T: Entity> MultiKeyComparator<T> {
    /// Resolve each term of `spec` through the comparator cache.
    pub fn new(spec: &SortSpec, nulls: NullOrdering) -> Result<Self> {
        let keys = spec
            .terms()
            .iter()
            .map(|term| Ok((comparator::<T>(&term.field, nulls)?, term.dir)))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { keys })
    }

    /// Compare two entities; later terms only break ties of earlier ones.
    pub fn compare(&self, a: &T, b: &T) -> Ordering {
        self.keys.iter().fold(Ordering::Equal, |acc, (cmp, dir)| {
            acc.then_with(|| dir.apply(cmp(a, b)))
        })
    }
}

impl<T> std::fmt::Debug for MultiKeyComparator<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MultiKeyComparator")
            .field("keys", &self.keys.len())
            .finish()
    }
}

/// Stable in-place sort of `items` by `spec`.
pub fn sort_entities<T: Entity>(items: &mut [T], spec: &SortSpec, nulls: NullOrdering) -> Result<()> {
    let cmp = MultiKeyComparator::<T>::new(spec, nulls)?;
    items.sort_by(|a, b| cmp.compare(a, b));
    Ok(())
}

/// Sort a sequence by a sort string such as `"age:desc,name"`.
///
/// Nulls order first. A blank sort string returns `items` unchanged.
/// Fails with [`Error::InvalidSort`](crate::Error::InvalidSort) or
/// [`Error::InvalidField`](crate::Error::InvalidField) before touching the
/// input.
pub fn sort<T: Entity>(mut items: Vec<T>, spec: &str) -> Result<Vec<T>> {
    if spec.trim().is_empty() {
        return Ok(items);
    }
    let spec = SortSpec::parse_for::<T>(spec)?;
    sort_entities(&mut items, &spec, NullOrdering::default())?;
    Ok(items)
}

/// Sorting by sort strings on owned vectors.
pub trait SortExt: Sized {
    /// Sort in place. A blank sort string is a no-op.
    fn sort_by_spec(&mut self, spec: &str) -> Result<()>;

    /// Sort and return the sorted sequence.
    fn sorted_by_spec(mut self, spec: &str) -> Result<Self> {
        self.sort_by_spec(spec)?;
        Ok(self)
    }
}

impl<T: Entity> SortExt for Vec<T> {
    fn sort_by_spec(&mut self, spec: &str) -> Result<()> {
        if spec.trim().is_empty() {
            return Ok(());
        }
        let spec = SortSpec::parse_for::<T>(spec)?;
        sort_entities(self, &spec, NullOrdering::default())
    }
}
