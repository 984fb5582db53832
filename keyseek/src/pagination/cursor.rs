//! Cursor payloads and their opaque token form.

use serde::{Deserialize, Serialize};
use serde_json::Map;

use super::encoding::{open, seal};
use crate::config::PaginationConfig;
use crate::error::{Error, Result};
use crate::schema::Entity;
use crate::sort::SortSpec;
use crate::value::{CoercionError, Value};

/// Position in an ordered result set.
///
/// `sort` is the canonical form of the ordering the anchor was taken under
/// and `properties` maps each of its field paths to the anchor row's value.
/// On the wire it is JSON, deflated and base64url-encoded.
///
/// Cursors are compressed, not encrypted. Clients can decode them, so only
/// sort-key values belong in them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
#[must_use = "cursor must be encoded with .encode() to be sent to a client"]
pub struct CursorPayload {
    /// Canonical sort string.
    pub sort: String,
    /// Anchor values keyed by field path.
    pub properties: Map<String, serde_json::Value>,
}

impl CursorPayload {
    /// Create an empty payload for `sort`.
    pub fn new(sort: impl Into<String>) -> Self {
        Self {
            sort: sort.into(),
            properties: Map::new(),
        }
    }

    /// Add an anchor value.
    pub fn property(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties
            .insert(field.into(), serde_json::Value::from(value.into()));
        self
    }

    /// Capture the sort-key values of `entity` under `sort`.
    ///
    /// A null (or non-finite float) sort value cannot anchor a keyset
    /// predicate and fails with [`Error::InvariantViolation`].
    pub fn from_entity<T: Entity>(entity: &T, sort: &SortSpec) -> Result<Self> {
        let schema = T::schema();
        let mut payload = Self::new(sort.to_string());

        for field in sort.fields() {
            let json = serde_json::Value::from(schema.resolve(field)?.read(entity));
            if json.is_null() {
                return Err(Error::InvariantViolation(format!(
                    "sort field `{field}` of `{}` is null on an anchor row",
                    schema.name()
                )));
            }
            payload.properties.insert(field.to_string(), json);
        }
        Ok(payload)
    }

    /// Encode to an opaque token under the default limits.
    pub fn encode(&self) -> Result<String, CursorError> {
        self.encode_with(&PaginationConfig::default())
    }

    /// Encode to an opaque token that [`decode_with`](Self::decode_with)
    /// accepts under the same `config`.
    ///
    /// Fails with [`CursorError::TooManyFields`] or [`CursorError::TooLarge`]
    /// instead of issuing a token the decoder would reject.
    pub fn encode_with(&self, config: &PaginationConfig) -> Result<String, CursorError> {
        if self.properties.len() > config.max_cursor_fields {
            return Err(CursorError::TooManyFields);
        }
        let json = serde_json::to_vec(self).map_err(|e| CursorError::Encoding(e.to_string()))?;
        if json.len() > config.max_decompressed_len {
            return Err(CursorError::TooLarge);
        }
        let token = seal(&json)?;
        if token.len() > config.max_cursor_len {
            return Err(CursorError::TooLarge);
        }
        Ok(token)
    }

    /// Decode a token under the default limits.
    pub fn decode(token: &str) -> Result<Self, CursorError> {
        Self::decode_with(token, &PaginationConfig::default())
    }

    /// Decode a token under the limits of `config`.
    ///
    /// The token length is checked before any decoding work.
    pub fn decode_with(token: &str, config: &PaginationConfig) -> Result<Self, CursorError> {
        let token = token.trim();
        if token.len() > config.max_cursor_len {
            return Err(CursorError::TooLarge);
        }

        let json = open(token, config.max_decompressed_len)?;
        let payload: Self =
            serde_json::from_slice(&json).map_err(|e| CursorError::InvalidFormat(e.to_string()))?;

        if payload.properties.len() > config.max_cursor_fields {
            return Err(CursorError::TooManyFields);
        }
        if payload.sort.trim().is_empty() {
            return Err(CursorError::InvalidFormat("cursor has no sort".to_string()));
        }
        Ok(payload)
    }

    /// Anchor values for each term of `sort`, coerced to the field kinds of `T`.
    ///
    /// A missing or mistyped property is a decode error. A null property is an
    /// [`Error::InvariantViolation`]: ordering fields must never be null.
    pub fn anchors<T: Entity>(&self, sort: &SortSpec) -> Result<Vec<Value>> {
        let schema = T::schema();
        sort.fields()
            .map(|field| {
                let descriptor = schema.resolve(field)?;
                let json = self
                    .properties
                    .get(field)
                    .ok_or_else(|| CursorError::MissingProperty(field.to_string()))?;

                let coercion = |source| CursorError::Coercion {
                    field: field.to_string(),
                    source,
                };
                let value = Value::from_json(json).map_err(coercion)?;
                if value.is_null() {
                    return Err(Error::InvariantViolation(format!(
                        "cursor anchor `{field}` is null"
                    )));
                }
                Ok(value.coerce(descriptor.kind()).map_err(coercion)?)
            })
            .collect()
    }
}

/// A cursor token could not be decoded or encoded.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum CursorError {
    /// The token is not valid base64url.
    #[error("invalid base64 encoding in cursor")]
    InvalidEncoding,
    /// The token does not inflate.
    #[error("cursor payload is not valid deflate data")]
    Decompression,
    /// The payload is not a cursor JSON object.
    #[error("invalid cursor format: {0}")]
    InvalidFormat(String),
    /// The token or its inflated payload exceeds the configured limit.
    #[error("cursor exceeds the configured size limit")]
    TooLarge,
    /// The payload carries more properties than allowed.
    #[error("cursor has too many fields")]
    TooManyFields,
    /// A sort field has no anchor value.
    #[error("cursor is missing property `{0}`")]
    MissingProperty(String),
    /// An anchor value does not fit the field's kind.
    #[error("cursor property `{field}` is invalid: {source}")]
    Coercion {
        /// Field path.
        field: String,
        /// Why the value was rejected.
        source: CoercionError,
    },
    /// The payload could not be serialized.
    #[error("cursor could not be encoded: {0}")]
    Encoding(String),
}

impl CursorError {
    /// Returns `true` if this is an encoding/format error.
    ///
    /// Includes `InvalidEncoding`, `Decompression` and `InvalidFormat`.
    #[inline]
    #[must_use]
    pub const fn is_format_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidEncoding | Self::Decompression | Self::InvalidFormat(_)
        )
    }

    /// Returns `true` if this is a size/limit error.
    ///
    /// Includes `TooLarge` and `TooManyFields`.
    #[inline]
    #[must_use]
    pub const fn is_limit_error(&self) -> bool {
        matches!(self, Self::TooLarge | Self::TooManyFields)
    }
}
