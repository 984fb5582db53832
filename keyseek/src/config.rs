//! Pagination limits and defaults.
//!
//! ```
//! use keyseek::PaginationConfig;
//!
//! let config = PaginationConfig::from_toml_str(
//!     r#"
//!     max_page_size = 200
//!     include_total = false
//!     "#,
//! )
//! .unwrap();
//! assert_eq!(config.max_page_size, 200);
//! assert_eq!(config.max_cursor_len, 4096);
//! ```

use serde::Deserialize;

use crate::value::NullOrdering;

/// Limits applied to cursors and pages.
///
/// Every field has a default, so a partial TOML table is enough.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PaginationConfig {
    /// Longest accepted cursor token, in bytes.
    pub max_cursor_len: usize,
    /// Most properties a cursor may carry.
    pub max_cursor_fields: usize,
    /// Largest inflated cursor payload, in bytes.
    pub max_decompressed_len: usize,
    /// Largest page a request may ask for.
    pub max_page_size: usize,
    /// Null placement for in-memory sources built from this config.
    pub null_ordering: NullOrdering,
    /// Whether cursor pages run a count query for totals.
    pub include_total: bool,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            max_cursor_len: 4 * 1024,
            max_cursor_fields: 16,
            max_decompressed_len: 64 * 1024,
            max_page_size: 1000,
            null_ordering: NullOrdering::First,
            include_total: true,
        }
    }
}

impl PaginationConfig {
    /// Parse a config from TOML.
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(input)?)
    }
}

/// A configuration document could not be parsed.
#[derive(Debug, thiserror::Error)]
#[error("invalid pagination config: {0}")]
pub struct ConfigError(#[from] toml::de::Error);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_yields_defaults() {
        let config = PaginationConfig::from_toml_str("").unwrap();
        assert_eq!(config, PaginationConfig::default());
        assert!(config.include_total);
        assert_eq!(config.max_cursor_fields, 16);
    }

    #[test]
    fn test_partial_override() {
        let config = PaginationConfig::from_toml_str(
            r#"
            null_ordering = "last"
            max_cursor_len = 1024
            "#,
        )
        .unwrap();
        assert_eq!(config.null_ordering, NullOrdering::Last);
        assert_eq!(config.max_cursor_len, 1024);
        assert_eq!(config.max_page_size, 1000);
    }

    #[test]
    fn test_unknown_keys_rejected() {
        let err = PaginationConfig::from_toml_str("page_size = 10").unwrap_err();
        assert!(err.to_string().contains("page_size"));
    }

    #[test]
    fn test_invalid_null_ordering() {
        assert!(PaginationConfig::from_toml_str(r#"null_ordering = "middle""#).is_err());
    }
}
