//! Backend-neutral predicate tree.

use std::fmt;

use crate::error::Result;
use crate::schema::Entity;
use crate::value::{NullOrdering, Value};

/// Comparison operators a keyset predicate needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareOp {
    /// Equal: `=`
    Eq,
    /// Greater than: `>`
    Gt,
    /// Less than: `<`
    Lt,
}

impl CompareOp {
    /// SQL spelling of the operator.
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Gt => ">",
            Self::Lt => "<",
        }
    }

    /// Whether an ordering of `field` against the operand satisfies the operator.
    #[inline]
    #[must_use]
    pub const fn test(self, ordering: std::cmp::Ordering) -> bool {
        matches!(
            (self, ordering),
            (Self::Eq, std::cmp::Ordering::Equal)
                | (Self::Gt, std::cmp::Ordering::Greater)
                | (Self::Lt, std::cmp::Ordering::Less)
        )
    }
}

/// A single field comparison.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    /// Dotted field path.
    pub field: String,
    /// Operator applied as `field <op> value`.
    pub op: CompareOp,
    /// Right-hand operand.
    pub value: Value,
}

/// A predicate over entity fields.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// A field comparison.
    Compare(Condition),
    /// Every branch must hold. An empty conjunction is true.
    And(Vec<Predicate>),
    /// At least one branch must hold. An empty disjunction is false.
    Or(Vec<Predicate>),
}

/// Compiled in-memory form of a [`Predicate`].
pub type Matcher<T> = Box<dyn Fn(&T) -> bool + Send + Sync>;

impl Predicate {
    fn compare(field: impl Into<String>, op: CompareOp, value: impl Into<Value>) -> Self {
        Self::Compare(Condition {
            field: field.into(),
            op,
            value: value.into(),
        })
    }

    /// `field = value`
    pub fn field_equals(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(field, CompareOp::Eq, value)
    }

    /// `field > value`
    pub fn field_greater(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(field, CompareOp::Gt, value)
    }

    /// `field < value`
    pub fn field_less(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(field, CompareOp::Lt, value)
    }

    /// Conjunction; a single branch is returned unwrapped.
    #[must_use]
    pub fn and(mut branches: Vec<Self>) -> Self {
        if branches.len() == 1
            && let Some(only) = branches.pop()
        {
            return only;
        }
        Self::And(branches)
    }

    /// Disjunction; a single branch is returned unwrapped.
    #[must_use]
    pub fn or(mut branches: Vec<Self>) -> Self {
        if branches.len() == 1
            && let Some(only) = branches.pop()
        {
            return only;
        }
        Self::Or(branches)
    }

    /// Every field path referenced by the tree.
    #[must_use]
    pub fn fields(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_fields(&mut out);
        out
    }

    fn collect_fields<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Self::Compare(c) => out.push(&c.field),
            Self::And(branches) | Self::Or(branches) => {
                for branch in branches {
                    branch.collect_fields(out);
                }
            },
        }
    }

    /// Resolve every referenced field on `T`.
    pub fn validate_for<T: Entity>(&self) -> Result<()> {
        let schema = T::schema();
        for field in self.fields() {
            schema.resolve(field)?;
        }
        Ok(())
    }

    /// Compile the tree to a closure over `T`.
    ///
    /// Fields are resolved once here; comparisons use [`Value::compare`] so
    /// equality is ordering-aware.
    pub fn compile<T: Entity>(&self, nulls: NullOrdering) -> Result<Matcher<T>> {
        let matcher: Matcher<T> = match self {
            Self::Compare(c) => {
                let read = T::schema().resolve(&c.field)?.accessor();
                let value = c.value.clone();
                let op = c.op;
                Box::new(move |entity: &T| op.test(read(entity).compare(&value, nulls)))
            },
            Self::And(branches) => {
                let compiled = branches
                    .iter()
                    .map(|b| b.compile::<T>(nulls))
                    .collect::<Result<Vec<_>>>()?;
                Box::new(move |entity: &T| compiled.iter().all(|m| m(entity)))
            },
            Self::Or(branches) => {
                let compiled = branches
                    .iter()
                    .map(|b| b.compile::<T>(nulls))
                    .collect::<Result<Vec<_>>>()?;
                Box::new(move |entity: &T| compiled.iter().any(|m| m(entity)))
            },
        };
        Ok(matcher)
    }

    /// Evaluate against a single entity.
    pub fn evaluate<T: Entity>(&self, entity: &T, nulls: NullOrdering) -> Result<bool> {
        Ok(self.compile::<T>(nulls)?(entity))
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let join = |f: &mut fmt::Formatter<'_>, branches: &[Self], sep: &str| {
            f.write_str("(")?;
            for (i, branch) in branches.iter().enumerate() {
                if i > 0 {
                    f.write_str(sep)?;
                }
                write!(f, "{branch}")?;
            }
            f.write_str(")")
        };

        match self {
            Self::Compare(c) => write!(f, "{} {} {}", c.field, c.op.as_sql(), c.value),
            Self::And(branches) => join(f, branches, " AND "),
            Self::Or(branches) => join(f, branches, " OR "),
        }
    }
}
