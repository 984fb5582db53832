//! Typed schema registry: dotted field paths resolved to accessor functions.
//!
//! Every [`Entity`] exposes one process-wide [`Schema`], built lazily the first
//! time it is requested. Nested entities are flattened at build time, so
//! `address.city` is a single lookup rather than a walk per row.
//!
//! # Example
//!
//! ```
//! use keyseek::{Entity, Schema, __private::Lazy};
//!
//! struct Address {
//!     city: String,
//! }
//!
//! struct User {
//!     id: i64,
//!     address: Address,
//! }
//!
//! impl Entity for Address {
//!     fn schema() -> &'static Schema<Self> {
//!         static SCHEMA: Lazy<Schema<Address>> =
//!             Lazy::new(|| Schema::builder("Address").field("city", |a: &Address| &a.city).build());
//!         &SCHEMA
//!     }
//! }
//!
//! impl Entity for User {
//!     fn schema() -> &'static Schema<Self> {
//!         static SCHEMA: Lazy<Schema<User>> = Lazy::new(|| {
//!             Schema::builder("User")
//!                 .field("id", |u: &User| &u.id)
//!                 .nested("address", |u: &User| &u.address)
//!                 .build()
//!         });
//!         &SCHEMA
//!     }
//! }
//!
//! assert!(User::schema().resolve("address.city").is_ok());
//! assert!(User::schema().resolve("address.zip").is_err());
//! ```

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::value::{FieldKind, FieldValue, Value};

/// A type whose fields can be ordered and paged over.
///
/// Usually derived with `#[derive(Entity)]`.
pub trait Entity: Sized + Send + Sync + 'static {
    /// The entity's schema, built once per process.
    fn schema() -> &'static Schema<Self>;
}

/// Reads one field of an entity.
pub type Accessor<T> = Arc<dyn Fn(&T) -> Value + Send + Sync>;

/// A resolved field: its path, runtime kind and accessor.
pub struct FieldDescriptor<T> {
    path: String,
    kind: FieldKind,
    nullable: bool,
    read: Accessor<T>,
}

impl<T> FieldDescriptor<T> {
    /// Dotted path of the field.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Runtime kind of the field.
    #[must_use]
    pub const fn kind(&self) -> FieldKind {
        self.kind
    }

    /// Whether the field, or one of its parents, is optional.
    #[must_use]
    pub const fn nullable(&self) -> bool {
        self.nullable
    }

    /// Read the field from an entity.
    #[inline]
    pub fn read(&self, entity: &T) -> Value {
        (self.read)(entity)
    }

    /// Shared handle to the accessor.
    #[must_use]
    pub fn accessor(&self) -> Accessor<T> {
        Arc::clone(&self.read)
    }
}

impl<T> Clone for FieldDescriptor<T> {
    fn clone(&self) -> Self {
        Self {
            path: self.path.clone(),
            kind: self.kind,
            nullable: self.nullable,
            read: Arc::clone(&self.read),
        }
    }
}

impl<T> fmt::Debug for FieldDescriptor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("path", &self.path)
            .field("kind", &self.kind)
            .field("nullable", &self.nullable)
            .finish_non_exhaustive()
    }
}

/// All addressable fields of an entity type.
pub struct Schema<T> {
    name: &'static str,
    fields: Vec<FieldDescriptor<T>>,
    index: HashMap<String, usize>,
    objects: HashSet<String>,
}

impl<T: 'static> Schema<T> {
    /// Start building a schema for the entity named `name`.
    pub fn builder(name: &'static str) -> SchemaBuilder<T> {
        SchemaBuilder {
            name,
            fields: Vec::new(),
            objects: Vec::new(),
        }
    }
}

impl<T> Schema<T> {
    /// Entity name used in error messages.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Leaf fields in registration order.
    pub fn fields(&self) -> impl Iterator<Item = &FieldDescriptor<T>> {
        self.fields.iter()
    }

    /// Look up a leaf field by its exact dotted path.
    #[must_use]
    pub fn field(&self, path: &str) -> Option<&FieldDescriptor<T>> {
        self.index.get(path).and_then(|&i| self.fields.get(i))
    }

    /// Resolve a dotted path to a leaf field.
    ///
    /// Walks the path one segment at a time and reports the first segment
    /// that does not resolve. A path naming a nested object rather than a
    /// value is rejected as well.
    pub fn resolve(&self, path: &str) -> Result<&FieldDescriptor<T>> {
        if let Some(field) = self.field(path) {
            return Ok(field);
        }

        let invalid = |segment: &str| Error::InvalidField {
            entity: self.name,
            path: path.to_string(),
            segment: segment.to_string(),
        };

        let mut prefix = String::with_capacity(path.len());
        let mut last = path;
        for segment in path.split('.') {
            if !prefix.is_empty() {
                prefix.push('.');
            }
            prefix.push_str(segment);
            last = segment;

            let known = self.objects.contains(&prefix) || self.index.contains_key(&prefix);
            if segment.is_empty() || !known {
                return Err(invalid(segment));
            }
        }

        // Every segment exists but the path stops at an object
        Err(invalid(last))
    }
}

impl<T> fmt::Debug for Schema<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema")
            .field("name", &self.name)
            .field("fields", &self.fields)
            .finish_non_exhaustive()
    }
}

/// Builder for [`Schema`].
pub struct SchemaBuilder<T> {
    name: &'static str,
    fields: Vec<FieldDescriptor<T>>,
    objects: Vec<String>,
}

impl<T: 'static> SchemaBuilder<T> {
    /// Register a leaf field; its kind comes from the projected type.
    ///
    /// # Panics
    ///
    /// Panics if `name` is empty or contains a `.`.
    pub fn field<V, F>(mut self, name: &str, project: F) -> Self
    where
        V: FieldValue,
        F: for<'a> Fn(&'a T) -> &'a V + Send + Sync + 'static,
    {
        assert_segment(self.name, name);
        self.fields.push(FieldDescriptor {
            path: name.to_string(),
            kind: V::KIND,
            nullable: V::NULLABLE,
            read: Arc::new(move |entity: &T| project(entity).to_value()),
        });
        self
    }

    /// Register a field computed from the entity rather than projected.
    ///
    /// # Panics
    ///
    /// Panics if `name` is empty or contains a `.`.
    pub fn computed<F>(mut self, name: &str, kind: FieldKind, nullable: bool, read: F) -> Self
    where
        F: Fn(&T) -> Value + Send + Sync + 'static,
    {
        assert_segment(self.name, name);
        self.fields.push(FieldDescriptor {
            path: name.to_string(),
            kind,
            nullable,
            read: Arc::new(read),
        });
        self
    }

    /// Flatten a nested entity's fields under `name.`.
    pub fn nested<U, F>(self, name: &str, project: F) -> Self
    where
        U: Entity,
        F: for<'a> Fn(&'a T) -> &'a U + Send + Sync + 'static,
    {
        self.nest(name, false, move |entity: &T| Some(project(entity)))
    }

    /// Flatten an optional nested entity; a missing parent reads as `Null`.
    pub fn nested_opt<U, F>(self, name: &str, project: F) -> Self
    where
        U: Entity,
        F: for<'a> Fn(&'a T) -> Option<&'a U> + Send + Sync + 'static,
    {
        self.nest(name, true, project)
    }

    fn nest<U, P>(mut self, name: &str, optional: bool, project: P) -> Self
    where
        U: Entity,
        P: for<'a> Fn(&'a T) -> Option<&'a U> + Send + Sync + 'static,
    {
        assert_segment(self.name, name);
        let inner = U::schema();
        let project = Arc::new(project);

        self.objects.push(name.to_string());
        self.objects
            .extend(inner.objects.iter().map(|object| format!("{name}.{object}")));

        for field in &inner.fields {
            let read = field.accessor();
            let project = Arc::clone(&project);
            self.fields.push(FieldDescriptor {
                path: format!("{name}.{}", field.path),
                kind: field.kind,
                nullable: optional || field.nullable,
                read: Arc::new(move |entity: &T| project(entity).map_or(Value::Null, |u| read(u))),
            });
        }
        self
    }

    /// Finish the schema.
    ///
    /// # Panics
    ///
    /// Panics if two registrations produce the same path.
    pub fn build(self) -> Schema<T> {
        let mut index = HashMap::with_capacity(self.fields.len());
        for (i, field) in self.fields.iter().enumerate() {
            let previous = index.insert(field.path.clone(), i);
            assert!(
                previous.is_none(),
                "duplicate field path '{}' in schema '{}'",
                field.path,
                self.name
            );
        }

        Schema {
            name: self.name,
            fields: self.fields,
            index,
            objects: self.objects.into_iter().collect(),
        }
    }
}

impl<T> fmt::Debug for SchemaBuilder<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaBuilder")
            .field("name", &self.name)
            .field("fields", &self.fields)
            .finish_non_exhaustive()
    }
}

fn assert_segment(entity: &str, name: &str) {
    assert!(
        !name.is_empty() && !name.contains('.'),
        "invalid field name '{name}' in schema '{entity}': must be a non-empty single segment"
    );
}
