//! Process-wide cache of compiled single-field comparators.
//!
//! Keys are `(entity type, field path, null ordering)`. The key space is the
//! application's own entity and field vocabulary, so entries are never evicted.

use std::any::{Any, TypeId};
use std::cmp::Ordering;
use std::sync::Arc;

use dashmap::DashMap;
use once_cell::sync::Lazy;
use tracing::trace;

use crate::error::Result;
use crate::schema::Entity;
use crate::value::NullOrdering;

/// Ascending comparison of one field of two entities.
pub type Comparator<T> = dyn Fn(&T, &T) -> Ordering + Send + Sync;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    entity: TypeId,
    path: String,
    nulls: NullOrdering,
}

type Erased = Arc<dyn Any + Send + Sync>;

static CACHE: Lazy<DashMap<CacheKey, Erased>> = Lazy::new(DashMap::new);

/// Get or compile the ascending comparator for `path` on `T`.
///
/// Resolution failures are returned and not cached. Two callers racing on a
/// cold key may both compile; the first to publish wins and both receive the
/// published comparator.
pub fn comparator<T: Entity>(path: &str, nulls: NullOrdering) -> Result<Arc<Comparator<T>>> {
    let key = CacheKey {
        entity: TypeId::of::<T>(),
        path: path.to_string(),
        nulls,
    };

    if let Some(hit) = lookup::<T>(&key) {
        return Ok(hit);
    }

    let field = T::schema().resolve(path)?;
    let read = field.accessor();
    let compiled: Arc<Comparator<T>> =
        Arc::new(move |a: &T, b: &T| read(a).compare(&read(b), nulls));

    let published = CACHE
        .entry(key)
        .or_insert_with(|| {
            trace!(entity = T::schema().name(), path, ?nulls, "compiled comparator");
            Arc::new(compiled) as Erased
        })
        .value()
        .downcast_ref::<Arc<Comparator<T>>>()
        .cloned();

    // The key embeds the TypeId, so the stored value always has this type
    published.ok_or_else(|| {
        crate::Error::InvariantViolation(format!(
            "comparator cache entry for `{path}` has an unexpected type"
        ))
    })
}

fn lookup<T: Entity>(key: &CacheKey) -> Option<Arc<Comparator<T>>> {
    CACHE
        .get(key)
        .and_then(|entry| entry.value().downcast_ref::<Arc<Comparator<T>>>().cloned())
}

#[cfg(test)]
pub(crate) fn cached_entries() -> usize {
    CACHE.len()
}
