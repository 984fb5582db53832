// =============================================================================
// CRATE-LEVEL QUALITY LINTS (following Tokio/Serde standards)
// =============================================================================
#![forbid(unsafe_code)]
#![deny(unused_must_use)]
#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![warn(rust_2018_idioms)]
#![warn(unreachable_pub)]
#![warn(rustdoc::missing_crate_level_docs)]
#![warn(rustdoc::broken_intra_doc_links)]
// =============================================================================
// CLIPPY CONFIGURATION
// =============================================================================
#![allow(clippy::doc_markdown)] // Code items in docs
#![allow(clippy::missing_errors_doc)] // # Errors sections - doc-heavy
#![allow(clippy::missing_panics_doc)] // # Panics sections - doc-heavy
#![allow(clippy::module_name_repetitions)] // Type names matching module - acceptable
#![allow(clippy::return_self_not_must_use)] // Builder pattern methods return Self
#![allow(clippy::must_use_candidate)] // Builder methods - fluent API doesn't need must_use
#![allow(clippy::format_push_string)] // String building style preference
#![allow(clippy::double_must_use)] // Functions returning must_use types can have their own docs

//! # keyseek - Dynamic sorting and keyset pagination
//!
//! Order entities by a sort string chosen at runtime, and page through them
//! with opaque cursors that never skip or repeat a row, even when the sort
//! keys are not unique.
//!
//! ## Entities
//!
//! Field paths are resolved through a typed schema, usually derived:
//!
//! ```
//! use keyseek::Entity;
//!
//! #[derive(Entity, Clone)]
//! struct Address {
//!     city: String,
//! }
//!
//! #[derive(Entity, Clone)]
//! struct User {
//!     id: i64,
//!     age: i32,
//!     #[entity(nested)]
//!     address: Address,
//!     #[entity(skip)]
//!     password_hash: String,
//! }
//!
//! assert!(User::schema().resolve("address.city").is_ok());
//! assert!(User::schema().resolve("password_hash").is_err());
//! ```
//!
//! ## Sorting
//!
//! ```
//! # use keyseek::Entity;
//! # #[derive(Entity, Clone)]
//! # struct User { id: i64, age: i32 }
//! let users = vec![User { id: 1, age: 30 }, User { id: 2, age: 25 }];
//! let sorted = keyseek::sort(users, "age:desc,id").unwrap();
//! assert_eq!(sorted[0].id, 1);
//! ```
//!
//! ## Cursor pagination
//!
//! [`Paginator`] runs a [`PaginationRequest`] against any [`DataSource`].
//! The crate ships [`MemorySource`] for in-memory data and [`sql::SqlQuery`]
//! for rendering the same queries to SQL.
//!
//! ```
//! # use keyseek::{Entity, MemorySource, PaginationRequest, Paginator};
//! # #[derive(Entity, Clone)]
//! # struct User { id: i64, age: i32 }
//! # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
//! let source = MemorySource::new(vec![
//!     User { id: 1, age: 30 },
//!     User { id: 2, age: 25 },
//!     User { id: 3, age: 25 },
//! ]);
//! let request = PaginationRequest::new(2, "id")?.sort_by("age".to_string());
//!
//! let page = Paginator::new(&source).by_cursor::<User>(&request).await?;
//! assert_eq!(page.items.len(), 2);
//! assert!(page.next_cursor.is_some());
//! assert!(page.previous_cursor.is_none());
//!
//! let next = request.after_cursor(page.next_cursor);
//! let page = Paginator::new(&source).by_cursor::<User>(&next).await?;
//! assert_eq!(page.items[0].id, 1);
//! # Ok::<(), keyseek::Error>(())
//! # }).unwrap();
//! ```

// Lets the derive macro refer to `::keyseek` from inside this crate's tests.
extern crate self as keyseek;

mod config;
mod error;
mod pagination;
mod query;
mod schema;
mod sort;
mod value;

pub use config::{ConfigError, PaginationConfig};
pub use error::{Error, Result, SourceError};
pub use pagination::{
    CursorError, CursorPayload, Direction, KeysetCondition, Page, PageMetadata, PaginationRequest,
    Paginator, offset_window, page_by_cursor, page_by_offset, total_pages,
};
pub use query::sql;
pub use query::{CompareOp, Condition, DataSource, Edges, Matcher, MemorySource, Predicate, Query};
pub use schema::{Accessor, Entity, FieldDescriptor, Schema, SchemaBuilder};
pub use sort::{
    Comparator, MultiKeyComparator, SortDir, SortExt, SortSpec, SortTerm, comparator, sort,
    sort_entities,
};
pub use value::{CoercionError, FieldKind, FieldValue, NullOrdering, Value};

/// Derive [`Entity`] for a struct with named fields.
///
/// Field attributes:
///
/// - `#[entity(rename = "name")]` exposes the field under another path segment
/// - `#[entity(skip)]` leaves the field out of the schema
/// - `#[entity(nested)]` flattens a field whose type is itself an `Entity`;
///   `Option<Inner>` fields read as null when absent
///
/// The container attribute `#[entity(name = "...")]` sets the entity name used
/// in error messages.
pub use keyseek_macros::Entity;

/// Re-exported for `cancellation` callers.
pub use tokio_util::sync::CancellationToken;

#[doc(hidden)]
pub mod __private {
    pub use once_cell::sync::Lazy;
}

/// Prelude module for convenient imports.
///
/// ```
/// use keyseek::prelude::*;
///
/// let spec = SortSpec::parse("name:desc").unwrap();
/// assert_eq!(spec.terms()[0].dir, SortDir::Desc);
/// ```
pub mod prelude {
    pub use crate::{
        CursorPayload, DataSource, Entity, Error, MemorySource, NullOrdering, Page,
        PaginationConfig, PaginationRequest, Paginator, Predicate, Query, Result, Schema, SortDir,
        SortExt, SortSpec, SortTerm, Value, page_by_cursor, page_by_offset, sort,
    };
}

// ============================================================================
// API Contract Tests (compile-time assertions)
// ============================================================================
