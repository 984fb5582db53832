//! Error types shared by every keyseek component.

use crate::pagination::CursorError;

/// Error returned by a [`DataSource`](crate::DataSource) implementation.
pub type SourceError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Convenience alias used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors produced while parsing sorts, building predicates or paging.
///
/// None of these are retried internally. Everything except [`Error::Source`]
/// and [`Error::Cancelled`] is raised before or instead of returning rows, so a
/// caller never observes a partial page.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// A field path does not resolve on the entity type.
    #[error("field `{path}` is not valid for `{entity}`: segment `{segment}` does not resolve")]
    InvalidField {
        /// Entity type name.
        entity: &'static str,
        /// The full dotted path as supplied.
        path: String,
        /// The first segment that failed to resolve.
        segment: String,
    },

    /// The sort string is malformed (empty, empty term, unknown direction).
    #[error("invalid sort `{input}`: {reason}")]
    InvalidSort {
        /// The sort string as supplied.
        input: String,
        /// What was wrong with it.
        reason: String,
    },

    /// A pagination request violates its own invariants.
    #[error("invalid pagination request: {0}")]
    InvalidRequest(String),

    /// A cursor token could not be decoded.
    #[error("cursor decode failed: {0}")]
    CursorDecode(#[from] CursorError),

    /// The cursor was produced under a different ordering than the request.
    #[error("cursor was created for sort `{found}` but the request sorts by `{expected}`")]
    CursorMismatch {
        /// Canonical sort of the current request.
        expected: String,
        /// Canonical sort recorded inside the cursor.
        found: String,
    },

    /// A field participating in the ordering was null.
    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    /// The request was cancelled while awaiting the data source.
    #[error("pagination request cancelled")]
    Cancelled,

    /// The underlying data source failed.
    #[error("data source error: {0}")]
    Source(#[source] SourceError),
}

impl Error {
    pub(crate) fn invalid_sort(input: &str, reason: impl Into<String>) -> Self {
        Self::InvalidSort {
            input: input.to_string(),
            reason: reason.into(),
        }
    }

    /// Returns `true` when the error was caused by caller input.
    ///
    /// Caller errors cannot succeed on retry without changing the request.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidField { .. }
                | Self::InvalidSort { .. }
                | Self::InvalidRequest(_)
                | Self::CursorDecode(_)
                | Self::CursorMismatch { .. }
        )
    }
}
