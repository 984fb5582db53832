//! Keyset predicate generation.

use super::cursor::CursorPayload;
use crate::error::{Error, Result};
use crate::query::{CompareOp, Predicate};
use crate::schema::Entity;
use crate::sort::{SortDir, SortSpec};
use crate::value::Value;

/// Rows strictly after (or before) an anchor under an ordering.
#[derive(Debug, Clone, PartialEq)]
pub struct KeysetCondition {
    /// The ordering the anchor was taken under.
    pub sort: SortSpec,
    /// Anchor value for each term, in term order.
    pub anchors: Vec<Value>,
    /// `true` for rows after the anchor, `false` for rows before it.
    pub forward: bool,
}

impl KeysetCondition {
    /// Rows after the anchor.
    pub fn after(sort: SortSpec, anchors: Vec<Value>) -> Result<Self> {
        Self::new(sort, anchors, true)
    }

    /// Rows before the anchor.
    pub fn before(sort: SortSpec, anchors: Vec<Value>) -> Result<Self> {
        Self::new(sort, anchors, false)
    }

    /// Condition anchored at a decoded cursor, with anchors coerced to `T`'s field kinds.
    pub fn from_cursor<T: Entity>(
        sort: &SortSpec,
        cursor: &CursorPayload,
        forward: bool,
    ) -> Result<Self> {
        let anchors = cursor.anchors::<T>(sort)?;
        Self::new(sort.clone(), anchors, forward)
    }

    fn new(sort: SortSpec, anchors: Vec<Value>, forward: bool) -> Result<Self> {
        if anchors.len() != sort.terms().len() {
            return Err(Error::InvariantViolation(format!(
                "keyset for `{sort}` needs {} anchors, got {}",
                sort.terms().len(),
                anchors.len()
            )));
        }
        if let Some(term) = sort
            .terms()
            .iter()
            .zip(&anchors)
            .find_map(|(term, value)| value.is_null().then_some(term))
        {
            return Err(Error::InvariantViolation(format!(
                "keyset anchor for `{}` is null",
                term.field
            )));
        }
        Ok(Self {
            sort,
            anchors,
            forward,
        })
    }

    /// Expand to a predicate tree.
    ///
    /// A single field yields a bare comparison, `field > $1` (or `<` for
    /// DESC). Multiple fields expand lexicographically:
    ///
    /// `(a, b, c) > (1, 2, 3)` becomes
    /// `a > 1 OR (a = 1 AND b > 2) OR (a = 1 AND b = 2 AND c > 3)`.
    ///
    /// See: <https://use-the-index-luke.com/no-offset>
    #[must_use]
    pub fn to_predicate(&self) -> Predicate {
        let pairs: Vec<_> = self.sort.terms().iter().zip(&self.anchors).collect();

        let branches = (0..pairs.len())
            .map(|i| {
                let (prefix, rest) = pairs.split_at(i);
                let mut conditions: Vec<Predicate> = prefix
                    .iter()
                    .map(|(term, value)| Predicate::field_equals(term.field.clone(), (*value).clone()))
                    .collect();
                if let Some((term, value)) = rest.first() {
                    conditions.push(self.seek(&term.field, term.dir, value));
                }
                Predicate::and(conditions)
            })
            .collect();

        Predicate::or(branches)
    }

    fn seek(&self, field: &str, dir: SortDir, value: &Value) -> Predicate {
        let op = match (self.forward, dir) {
            (true, SortDir::Asc) | (false, SortDir::Desc) => CompareOp::Gt,
            (true, SortDir::Desc) | (false, SortDir::Asc) => CompareOp::Lt,
        };
        Predicate::Compare(crate::query::Condition {
            field: field.to_string(),
            op,
            value: value.clone(),
        })
    }
}
