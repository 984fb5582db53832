//! Offset pagination.

use tracing::{debug, instrument};

use super::engine::Paginator;
use super::page::Page;
use crate::error::{Error, Result};
use crate::query::{DataSource, Query};
use crate::schema::Entity;

/// Rows to skip and take for a 1-based `page` of `size` rows.
pub fn offset_window(page: usize, size: usize) -> Result<(usize, usize)> {
    if page < 1 {
        return Err(Error::InvalidRequest("page must be at least 1".to_string()));
    }
    if size < 1 {
        return Err(Error::InvalidRequest("size must be greater than 0".to_string()));
    }
    let skip = (page - 1)
        .checked_mul(size)
        .ok_or_else(|| Error::InvalidRequest(format!("page {page} is out of range")))?;
    Ok((skip, size))
}

impl<S> Paginator<'_, S> {
    /// Fetch 1-based page `page` of `size` rows.
    ///
    /// Uses the ordering set with [`order_by`](Self::order_by), if any. A page
    /// past the end is empty but still reports totals.
    #[instrument(skip_all, fields(entity = T::schema().name(), page = page, size = size))]
    pub async fn by_offset<T>(&self, page: usize, size: usize) -> Result<Page<T>>
    where
        T: Entity,
        S: DataSource<T>,
    {
        let (skip, take) = offset_window(page, size)?;
        self.check_size(size)?;
        if let Some(scope) = &self.scope {
            scope.validate_for::<T>()?;
        }
        if let Some(order) = &self.order {
            order.validate_for::<T>()?;
        }

        let total = self.call(self.source.count(self.scope.as_ref())).await?;

        let mut query = Query::new().filter_opt(self.scope.clone()).skip(skip).take(take);
        if let Some(order) = &self.order {
            query = query.order_by(order.clone());
        }
        let items = self.call(self.source.fetch(&query)).await?;
        debug!(items = items.len(), total, "offset page assembled");

        let mut result = Page::empty(size).with_total(total);
        result.items = items;
        result.current_page = Some(u64::try_from(page).unwrap_or(u64::MAX));
        Ok(result)
    }
}

/// Fetch 1-based page `page` of `size` rows with default limits.
pub async fn page_by_offset<T, S>(source: &S, page: usize, size: usize) -> Result<Page<T>>
where
    T: Entity,
    S: DataSource<T>,
{
    Paginator::new(source).by_offset(page, size).await
}
