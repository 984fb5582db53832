//! Sort specifications: parsing, canonical form and in-memory ordering.
//!
//! A sort string is a comma-separated list of `field[:asc|:desc]` terms:
//!
//! ```
//! use keyseek::{SortDir, SortSpec};
//!
//! let spec = SortSpec::parse("age:desc, name").unwrap();
//! assert_eq!(spec.terms()[0].dir, SortDir::Desc);
//! assert_eq!(spec.to_string(), "age:desc,name");
//! assert_eq!(spec.reversed().to_string(), "age,name:desc");
//! ```

mod comparator;
mod order;

use std::cmp::Ordering;
use std::fmt;

pub use comparator::{Comparator, comparator};
pub use order::{MultiKeyComparator, SortExt, sort, sort_entities};

use crate::error::{Error, Result};
use crate::schema::Entity;

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SortDir {
    /// Ascending order (A-Z, 0-9).
    #[default]
    Asc,
    /// Descending order (Z-A, 9-0).
    Desc,
}

impl SortDir {
    /// Parse a direction token, case-insensitively.
    #[must_use]
    pub fn parse(token: &str) -> Option<Self> {
        if token.eq_ignore_ascii_case("asc") {
            Some(Self::Asc)
        } else if token.eq_ignore_ascii_case("desc") {
            Some(Self::Desc)
        } else {
            None
        }
    }

    /// The opposite direction.
    #[must_use]
    pub const fn reverse(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }

    /// Apply this direction to an ascending comparison result.
    #[inline]
    #[must_use]
    pub const fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            Self::Asc => ordering,
            Self::Desc => ordering.reverse(),
        }
    }
}

/// One field of a sort specification.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SortTerm {
    /// Dotted field path.
    pub field: String,
    /// Direction of the term.
    pub dir: SortDir,
}

impl SortTerm {
    /// Create a term.
    pub fn new(field: impl Into<String>, dir: SortDir) -> Self {
        Self {
            field: field.into(),
            dir,
        }
    }

    /// Ascending term.
    pub fn asc(field: impl Into<String>) -> Self {
        Self::new(field, SortDir::Asc)
    }

    /// Descending term.
    pub fn desc(field: impl Into<String>) -> Self {
        Self::new(field, SortDir::Desc)
    }
}

impl fmt::Display for SortTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.dir {
            SortDir::Asc => f.write_str(&self.field),
            SortDir::Desc => write!(f, "{}:desc", self.field),
        }
    }
}

/// An ordered, non-empty list of sort terms.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SortSpec {
    terms: Vec<SortTerm>,
}

impl SortSpec {
    /// Build a spec from terms.
    ///
    /// Fails with [`Error::InvalidSort`] when `terms` is empty.
    pub fn new(terms: Vec<SortTerm>) -> Result<Self> {
        if terms.is_empty() {
            return Err(Error::invalid_sort("", "sort has no terms"));
        }
        Ok(Self { terms })
    }

    /// Parse a sort string.
    ///
    /// Whitespace around terms and directions is ignored and a missing
    /// direction means ascending. Empty parts between commas are skipped, so
    /// `"age,"` is accepted; a string with no terms at all is not.
    pub fn parse(input: &str) -> Result<Self> {
        let mut terms = Vec::new();

        for part in input.split(',') {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }

            let (field, dir) = match part.split_once(':') {
                Some((field, dir)) => {
                    let token = dir.trim();
                    let dir = SortDir::parse(token).ok_or_else(|| {
                        Error::invalid_sort(input, format!("unknown direction `{token}`"))
                    })?;
                    (field.trim(), dir)
                },
                None => (part, SortDir::Asc),
            };

            if field.is_empty() {
                return Err(Error::invalid_sort(input, "term has no field"));
            }
            terms.push(SortTerm::new(field, dir));
        }

        if terms.is_empty() {
            return Err(Error::invalid_sort(input, "sort is empty"));
        }
        Ok(Self { terms })
    }

    /// Parse a sort string and resolve every field on `T`.
    pub fn parse_for<T: Entity>(input: &str) -> Result<Self> {
        let spec = Self::parse(input)?;
        spec.validate_for::<T>()?;
        Ok(spec)
    }

    /// Resolve every field of the spec on `T`.
    pub fn validate_for<T: Entity>(&self) -> Result<()> {
        let schema = T::schema();
        for term in &self.terms {
            schema.resolve(&term.field)?;
        }
        Ok(())
    }

    /// The terms in priority order.
    #[must_use]
    pub fn terms(&self) -> &[SortTerm] {
        &self.terms
    }

    /// Field paths in priority order.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.terms.iter().map(|t| t.field.as_str())
    }

    /// Whether `field` participates in the ordering.
    #[must_use]
    pub fn contains(&self, field: &str) -> bool {
        self.terms.iter().any(|t| t.field == field)
    }

    /// The same fields with every direction flipped.
    #[must_use]
    pub fn reversed(&self) -> Self {
        Self {
            terms: self
                .terms
                .iter()
                .map(|t| SortTerm::new(t.field.clone(), t.dir.reverse()))
                .collect(),
        }
    }

    /// Append a tiebreaker term unless its field already participates.
    #[must_use]
    pub fn with_tiebreaker(mut self, term: SortTerm) -> Self {
        if !self.contains(&term.field) {
            self.terms.push(term);
        }
        self
    }

    /// Case-insensitive comparison of canonical forms.
    #[must_use]
    pub fn matches(&self, canonical: &str) -> bool {
        self.to_string().eq_ignore_ascii_case(canonical.trim())
    }
}

impl From<SortTerm> for SortSpec {
    fn from(term: SortTerm) -> Self {
        Self { terms: vec![term] }
    }
}

impl fmt::Display for SortSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, term) in self.terms.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{term}")?;
        }
        Ok(())
    }
}

impl std::str::FromStr for SortSpec {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
