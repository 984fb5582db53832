//! Runtime field values, their total ordering and cursor coercion.

use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Deserialize;
use ulid::Ulid;
use uuid::Uuid;

/// The runtime type of an entity field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum FieldKind {
    /// `bool`
    Bool,
    /// Signed or small unsigned integers, stored as `i64`.
    Int,
    /// `f32` / `f64`, stored as `f64`.
    Float,
    /// `String`
    String,
    /// Lexicographically sortable identifier.
    Ulid,
    /// RFC 4122 identifier.
    Uuid,
    /// UTC timestamp.
    Timestamp,
}

impl FieldKind {
    /// Human-readable name used in error messages.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Bool => "boolean",
            Self::Int => "integer",
            Self::Float => "number",
            Self::String => "string",
            Self::Ulid => "ulid",
            Self::Uuid => "uuid",
            Self::Timestamp => "timestamp",
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Where nulls sort relative to non-null values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NullOrdering {
    /// Nulls sort before every other value.
    #[default]
    First,
    /// Nulls sort after every other value.
    Last,
}

/// A field value read from an entity or decoded from a cursor.
///
/// Equality is ordering-aware: two values are equal iff
/// [`Value::compare`] yields [`Ordering::Equal`]. This makes `Int(1)` equal to
/// `Float(1.0)`, matching how the keyset predicate compares them.
#[derive(Debug, Clone)]
pub enum Value {
    /// Absent value.
    Null,
    /// Boolean.
    Bool(bool),
    /// Integer.
    Int(i64),
    /// Floating point number.
    Float(f64),
    /// String, compared ordinally.
    String(String),
    /// ULID, compared by its intrinsic ordering.
    Ulid(Ulid),
    /// UUID, compared bytewise.
    Uuid(Uuid),
    /// UTC timestamp.
    Timestamp(DateTime<Utc>),
}

impl Value {
    /// Returns `true` for [`Value::Null`].
    #[inline]
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Name of the variant, for error messages.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "boolean",
            Self::Int(_) => "integer",
            Self::Float(_) => "number",
            Self::String(_) => "string",
            Self::Ulid(_) => "ulid",
            Self::Uuid(_) => "uuid",
            Self::Timestamp(_) => "timestamp",
        }
    }

    const fn rank(&self) -> u8 {
        match self {
            Self::Null => 0,
            Self::Bool(_) => 1,
            Self::Int(_) | Self::Float(_) => 2,
            Self::String(_) => 3,
            Self::Ulid(_) => 4,
            Self::Uuid(_) => 5,
            Self::Timestamp(_) => 6,
        }
    }

    /// Total ordering over values.
    ///
    /// Integers and floats compare numerically, strings ordinally, identifiers
    /// and timestamps by their intrinsic ordering. Values of unrelated kinds
    /// order by kind so the result stays total.
    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn compare(&self, other: &Self, nulls: NullOrdering) -> Ordering {
        match (self, other) {
            (Self::Null, Self::Null) => Ordering::Equal,
            (Self::Null, _) => match nulls {
                NullOrdering::First => Ordering::Less,
                NullOrdering::Last => Ordering::Greater,
            },
            (_, Self::Null) => match nulls {
                NullOrdering::First => Ordering::Greater,
                NullOrdering::Last => Ordering::Less,
            },
            (Self::Bool(a), Self::Bool(b)) => a.cmp(b),
            (Self::Int(a), Self::Int(b)) => a.cmp(b),
            (Self::Float(a), Self::Float(b)) => a.total_cmp(b),
            (Self::Int(a), Self::Float(b)) => (*a as f64).total_cmp(b),
            (Self::Float(a), Self::Int(b)) => a.total_cmp(&(*b as f64)),
            (Self::String(a), Self::String(b)) => a.as_str().cmp(b.as_str()),
            (Self::Ulid(a), Self::Ulid(b)) => a.cmp(b),
            (Self::Uuid(a), Self::Uuid(b)) => a.cmp(b),
            (Self::Timestamp(a), Self::Timestamp(b)) => a.cmp(b),
            (a, b) => a.rank().cmp(&b.rank()),
        }
    }

    /// Coerce a (typically cursor-decoded) value to a field's runtime kind.
    ///
    /// `Null` passes through unchanged; nullability is the caller's concern.
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
    pub fn coerce(self, kind: FieldKind) -> Result<Self, CoercionError> {
        let found = self.type_name();
        let fail = || CoercionError {
            expected: kind,
            found,
        };

        match (self, kind) {
            (Self::Null, _) => Ok(Self::Null),
            (v @ Self::Bool(_), FieldKind::Bool)
            | (v @ Self::Int(_), FieldKind::Int)
            | (v @ Self::Float(_), FieldKind::Float)
            | (v @ Self::String(_), FieldKind::String)
            | (v @ Self::Ulid(_), FieldKind::Ulid)
            | (v @ Self::Uuid(_), FieldKind::Uuid)
            | (v @ Self::Timestamp(_), FieldKind::Timestamp) => Ok(v),

            (Self::Int(i), FieldKind::Float) => Ok(Self::Float(i as f64)),
            (Self::Float(f), FieldKind::Int) => {
                if f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64 {
                    Ok(Self::Int(f as i64))
                } else {
                    Err(fail())
                }
            },

            (Self::String(s), FieldKind::Bool) => s.parse().map(Self::Bool).map_err(|_| fail()),
            (Self::String(s), FieldKind::Int) => s.parse().map(Self::Int).map_err(|_| fail()),
            (Self::String(s), FieldKind::Float) => s.parse().map(Self::Float).map_err(|_| fail()),
            (Self::String(s), FieldKind::Ulid) => s.parse().map(Self::Ulid).map_err(|_| fail()),
            (Self::String(s), FieldKind::Uuid) => {
                Uuid::parse_str(&s).map(Self::Uuid).map_err(|_| fail())
            },
            (Self::String(s), FieldKind::Timestamp) => DateTime::parse_from_rfc3339(&s)
                .map(|ts| Self::Timestamp(ts.with_timezone(&Utc)))
                .map_err(|_| fail()),

            (Self::Ulid(u), FieldKind::String) => Ok(Self::String(u.to_string())),
            (Self::Uuid(u), FieldKind::String) => Ok(Self::String(u.to_string())),

            _ => Err(fail()),
        }
    }

    /// Convert a JSON value from a cursor into an untyped [`Value`].
    ///
    /// Identifiers and timestamps arrive as strings; [`Value::coerce`]
    /// restores their kind once the target field is known.
    pub fn from_json(json: &serde_json::Value) -> Result<Self, CoercionError> {
        use serde_json::Value as Json;

        match json {
            Json::Null => Ok(Self::Null),
            Json::Bool(b) => Ok(Self::Bool(*b)),
            Json::Number(n) => n
                .as_i64()
                .map(Self::Int)
                .or_else(|| n.as_f64().map(Self::Float))
                .ok_or(CoercionError {
                    expected: FieldKind::Float,
                    found: "number",
                }),
            Json::String(s) => Ok(Self::String(s.clone())),
            Json::Array(_) => Err(CoercionError {
                expected: FieldKind::String,
                found: "array",
            }),
            Json::Object(_) => Err(CoercionError {
                expected: FieldKind::String,
                found: "object",
            }),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.compare(other, NullOrdering::First) == Ordering::Equal
    }
}

impl Eq for Value {}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::String(s) => write!(f, "{s:?}"),
            Self::Ulid(u) => write!(f, "{u}"),
            Self::Uuid(u) => write!(f, "{u}"),
            Self::Timestamp(ts) => f.write_str(&ts.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
        }
    }
}

impl From<Value> for serde_json::Value {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(b),
            Value::Int(i) => Self::from(i),
            // NaN and infinities have no JSON form and surface as null
            Value::Float(f) => serde_json::Number::from_f64(f).map_or(Self::Null, Self::Number),
            Value::String(s) => Self::String(s),
            Value::Ulid(u) => Self::String(u.to_string()),
            Value::Uuid(u) => Self::String(u.to_string()),
            Value::Timestamp(ts) => Self::String(ts.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
        }
    }
}

/// A value could not be converted to a field's runtime kind.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("expected {expected}, found {found}")]
pub struct CoercionError {
    /// Kind the field requires.
    pub expected: FieldKind,
    /// Type name of the offending value.
    pub found: &'static str,
}

/// Types that can back an entity field.
///
/// Implemented for the primitive types keyseek knows how to order; `Option<V>`
/// marks the field nullable.
pub trait FieldValue {
    /// Runtime kind of the field.
    const KIND: FieldKind;
    /// Whether the field may hold `Null`.
    const NULLABLE: bool = false;

    /// Read the value.
    fn to_value(&self) -> Value;
}

macro_rules! int_field_value {
    ($($ty:ty),*) => {
        $(
            impl FieldValue for $ty {
                const KIND: FieldKind = FieldKind::Int;

                #[inline]
                fn to_value(&self) -> Value {
                    Value::Int(i64::from(*self))
                }
            }

            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::Int(i64::from(v))
                }
            }
        )*
    };
}

int_field_value!(i8, i16, i32, i64, u8, u16, u32);

impl FieldValue for f64 {
    const KIND: FieldKind = FieldKind::Float;

    #[inline]
    fn to_value(&self) -> Value {
        Value::Float(*self)
    }
}

impl FieldValue for f32 {
    const KIND: FieldKind = FieldKind::Float;

    #[inline]
    fn to_value(&self) -> Value {
        Value::Float(f64::from(*self))
    }
}

impl FieldValue for bool {
    const KIND: FieldKind = FieldKind::Bool;

    #[inline]
    fn to_value(&self) -> Value {
        Value::Bool(*self)
    }
}

impl FieldValue for String {
    const KIND: FieldKind = FieldKind::String;

    fn to_value(&self) -> Value {
        Value::String(self.clone())
    }
}

impl FieldValue for Ulid {
    const KIND: FieldKind = FieldKind::Ulid;

    #[inline]
    fn to_value(&self) -> Value {
        Value::Ulid(*self)
    }
}

impl FieldValue for Uuid {
    const KIND: FieldKind = FieldKind::Uuid;

    #[inline]
    fn to_value(&self) -> Value {
        Value::Uuid(*self)
    }
}

impl FieldValue for DateTime<Utc> {
    const KIND: FieldKind = FieldKind::Timestamp;

    #[inline]
    fn to_value(&self) -> Value {
        Value::Timestamp(*self)
    }
}

impl<V: FieldValue> FieldValue for Option<V> {
    const KIND: FieldKind = V::KIND;
    const NULLABLE: bool = true;

    fn to_value(&self) -> Value {
        self.as_ref().map_or(Value::Null, FieldValue::to_value)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(f64::from(v))
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<Ulid> for Value {
    fn from(v: Ulid) -> Self {
        Value::Ulid(v)
    }
}

impl From<Uuid> for Value {
    fn from(v: Uuid) -> Self {
        Value::Uuid(v)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Value::Timestamp(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}
