//! Cursor and offset pagination.
//!
//! # Pagination Strategies
//!
//! | Strategy   | Jump to Page | Performance | Stability | Use Case               |
//! |------------|--------------|-------------|-----------|------------------------|
//! | **Offset** | Yes          | O(n) skip   | Unstable* | Admin panels, reports  |
//! | **Cursor** | No           | O(1)        | Stable    | Feeds, infinite scroll |
//!
//! *Unstable = results shift if data changes between requests
//!
//! # How cursor paging works
//!
//! The request's sort plus its unique tiebreaker form the *base* ordering,
//! which is total. A page is the first `size` rows strictly after the anchor
//! row recorded in the `after` cursor, or the last `size` rows strictly
//! before the `before` anchor (fetched under the reversed ordering, then
//! flipped back). Comparing the page's trailing row with the first and last
//! rows of the whole data set tells whether more rows exist on that side,
//! without an extra lookahead query.
//!
//! Cursors are deflated JSON in base64url. They always record the base
//! ordering; a cursor presented with a different sort is rejected with
//! [`Error::CursorMismatch`](crate::Error::CursorMismatch).

mod cursor;
mod encoding;
mod engine;
mod keyset;
mod offset;
mod page;
mod request;

pub use cursor::{CursorError, CursorPayload};
pub use engine::{Paginator, page_by_cursor};
pub use keyset::KeysetCondition;
pub use offset::{offset_window, page_by_offset};
pub use page::{Page, PageMetadata, total_pages};
pub use request::{Direction, PaginationRequest};
