//! Render a [`Query`] to parameterized SQL.
//!
//! Rendering only: the caller binds [`QueryResult::params`] and executes the
//! statement on its own connection.
//!
//! Field paths map to columns by replacing `.` with `_` (`address.city` becomes
//! `address_city`) unless an explicit mapping is registered with
//! [`SqlQuery::column`]. Every column is validated as a plain SQL identifier.
//!
//! ```
//! use keyseek::sql::{Postgres, SqlQuery};
//! use keyseek::{Entity, Predicate, Query, Schema, SortSpec, __private::Lazy};
//!
//! struct User {
//!     id: i64,
//!     age: i32,
//! }
//!
//! impl Entity for User {
//!     fn schema() -> &'static Schema<Self> {
//!         static SCHEMA: Lazy<Schema<User>> = Lazy::new(|| {
//!             Schema::builder("User")
//!                 .field("id", |u: &User| &u.id)
//!                 .field("age", |u: &User| &u.age)
//!                 .build()
//!         });
//!         &SCHEMA
//!     }
//! }
//!
//! let query = Query::new()
//!     .filter(Predicate::field_greater("age", 21))
//!     .order_by(SortSpec::parse("age,id").unwrap())
//!     .take(20);
//! let rendered = SqlQuery::new(Postgres::default(), "users").render::<User>(&query).unwrap();
//! assert_eq!(
//!     rendered.sql,
//!     "SELECT * FROM users WHERE age > $1 ORDER BY age ASC, id ASC LIMIT 20"
//! );
//! ```

mod dialect;
mod ident;

pub use dialect::{Dialect, Postgres, Sqlite};
pub use ident::{assert_valid_sql_identifier, is_valid_sql_identifier};

use std::collections::HashMap;

use super::{Predicate, Query};
use crate::error::{Error, Result};
use crate::schema::Entity;
use crate::sort::{SortDir, SortSpec};
use crate::value::Value;

/// Rendered SQL and its positional parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult {
    /// SQL text with dialect placeholders.
    pub sql: String,
    /// Parameters in placeholder order.
    pub params: Vec<Value>,
}

/// SQL renderer for one table.
#[derive(Debug, Clone)]
pub struct SqlQuery<D: Dialect> {
    dialect: D,
    table: String,
    fields: Vec<String>,
    columns: HashMap<String, String>,
}

impl SqlQuery<Postgres> {
    /// Renderer for a Postgres table.
    pub fn postgres(table: impl Into<String>) -> Self {
        Self::new(Postgres, table)
    }
}

impl SqlQuery<Sqlite> {
    /// Renderer for a `SQLite` table.
    pub fn sqlite(table: impl Into<String>) -> Self {
        Self::new(Sqlite, table)
    }
}

impl<D: Dialect> SqlQuery<D> {
    /// Create a renderer for `table`.
    ///
    /// # Panics
    ///
    /// Panics if the table name is not a valid SQL identifier.
    pub fn new(dialect: D, table: impl Into<String>) -> Self {
        let table = table.into();
        assert_valid_sql_identifier(&table, "table");
        Self {
            dialect,
            table,
            fields: Vec::new(),
            columns: HashMap::new(),
        }
    }

    /// Set the columns to SELECT; `*` when never called.
    ///
    /// # Panics
    ///
    /// Panics if any column name is not a valid SQL identifier.
    #[must_use]
    pub fn fields(mut self, fields: &[&str]) -> Self {
        for field in fields {
            assert_valid_sql_identifier(field, "field");
        }
        self.fields = fields.iter().map(|s| (*s).to_string()).collect();
        self
    }

    /// Map a field path to an explicit column.
    ///
    /// # Panics
    ///
    /// Panics if `column` is not a valid SQL identifier.
    #[must_use]
    pub fn column(mut self, path: impl Into<String>, column: impl Into<String>) -> Self {
        let column = column.into();
        assert_valid_sql_identifier(&column, "column");
        self.columns.insert(path.into(), column);
        self
    }

    /// Column backing a field path of `T`.
    pub fn column_for<T: Entity>(&self, path: &str) -> Result<String> {
        let schema = T::schema();
        schema.resolve(path)?;

        if let Some(column) = self.columns.get(path) {
            return Ok(column.clone());
        }

        let column = path.replace('.', "_");
        if is_valid_sql_identifier(&column) {
            return Ok(column);
        }

        let segment = path
            .split('.')
            .find(|s| !is_valid_sql_identifier(s))
            .unwrap_or(path);
        Err(Error::InvalidField {
            entity: schema.name(),
            path: path.to_string(),
            segment: segment.to_string(),
        })
    }

    /// Render a full `SELECT`.
    pub fn render<T: Entity>(&self, query: &Query) -> Result<QueryResult> {
        let select = if self.fields.is_empty() {
            "*".to_string()
        } else {
            self.fields.join(", ")
        };

        let mut params = Vec::new();
        let mut sql = format!("SELECT {select} FROM {}", self.table);

        if let Some(filter) = &query.filter {
            let condition = self.render_predicate::<T>(filter, &mut params)?;
            sql.push_str(&format!(" WHERE {condition}"));
        }

        if let Some(order) = &query.order {
            sql.push_str(&format!(" ORDER BY {}", self.render_order::<T>(order)?));
        }

        sql.push_str(&self.dialect.window(query.limit, query.offset));

        Ok(QueryResult { sql, params })
    }

    /// Render `SELECT COUNT(*)` under an optional filter.
    pub fn render_count<T: Entity>(&self, filter: Option<&Predicate>) -> Result<QueryResult> {
        let mut params = Vec::new();
        let mut sql = format!("SELECT COUNT(*) FROM {}", self.table);

        if let Some(filter) = filter {
            let condition = self.render_predicate::<T>(filter, &mut params)?;
            sql.push_str(&format!(" WHERE {condition}"));
        }

        Ok(QueryResult { sql, params })
    }

    fn render_order<T: Entity>(&self, order: &SortSpec) -> Result<String> {
        let parts = order
            .terms()
            .iter()
            .map(|term| {
                let dir = match term.dir {
                    SortDir::Asc => "ASC",
                    SortDir::Desc => "DESC",
                };
                Ok(format!("{} {dir}", self.column_for::<T>(&term.field)?))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(parts.join(", "))
    }

    fn render_predicate<T: Entity>(
        &self,
        predicate: &Predicate,
        params: &mut Vec<Value>,
    ) -> Result<String> {
        let (branches, sep, empty) = match predicate {
            Predicate::Compare(c) => {
                let column = self.column_for::<T>(&c.field)?;
                if c.value.is_null() && c.op == super::CompareOp::Eq {
                    return Ok(format!("{column} IS NULL"));
                }
                params.push(c.value.clone());
                let placeholder = self.dialect.param(params.len());
                return Ok(format!("{column} {} {placeholder}", c.op.as_sql()));
            },
            Predicate::And(branches) => (branches, " AND ", "1=1"),
            Predicate::Or(branches) => (branches, " OR ", "1=0"),
        };

        let mut conditions = Vec::with_capacity(branches.len());
        for branch in branches {
            conditions.push(self.render_predicate::<T>(branch, params)?);
        }

        Ok(match conditions.len() {
            0 => empty.to_string(),
            1 => conditions.concat(),
            _ => format!("({})", conditions.join(sep)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Schema;
    use once_cell::sync::Lazy;

    struct Address {
        city: String,
    }

    struct Customer {
        id: i64,
        age: i32,
        address: Address,
    }

    impl Entity for Address {
        fn schema() -> &'static Schema<Self> {
            static SCHEMA: Lazy<Schema<Address>> = Lazy::new(|| {
                Schema::builder("Address")
                    .field("city", |a: &Address| &a.city)
                    .build()
            });
            &SCHEMA
        }
    }

    impl Entity for Customer {
        fn schema() -> &'static Schema<Self> {
            static SCHEMA: Lazy<Schema<Customer>> = Lazy::new(|| {
                Schema::builder("Customer")
                    .field("id", |c: &Customer| &c.id)
                    .field("age", |c: &Customer| &c.age)
                    .nested("address", |c: &Customer| &c.address)
                    .build()
            });
            &SCHEMA
        }
    }

    fn keyset() -> Predicate {
        Predicate::or(vec![
            Predicate::field_greater("age", 25),
            Predicate::and(vec![
                Predicate::field_equals("age", 25),
                Predicate::field_greater("id", 2),
            ]),
        ])
    }

    #[test]
    fn test_render_keyset_postgres() {
        let query = Query::new()
            .filter(keyset())
            .order_by(SortSpec::parse("age,id").unwrap())
            .take(2);
        let result = SqlQuery::postgres("customers")
            .render::<Customer>(&query)
            .unwrap();

        insta::assert_snapshot!(
            result.sql,
            @"SELECT * FROM customers WHERE (age > $1 OR (age = $2 AND id > $3)) ORDER BY age ASC, id ASC LIMIT 2"
        );
        assert_eq!(result.params, vec![Value::Int(25), Value::Int(25), Value::Int(2)]);
    }

    #[test]
    fn test_render_sqlite_placeholders_and_window() {
        let query = Query::new()
            .filter(Predicate::field_less("id", 10))
            .order_by(SortSpec::parse("id:desc").unwrap())
            .skip(4);
        let result = SqlQuery::sqlite("customers")
            .fields(&["id", "age"])
            .render::<Customer>(&query)
            .unwrap();

        insta::assert_snapshot!(
            result.sql,
            @"SELECT id, age FROM customers WHERE id < ?1 ORDER BY id DESC LIMIT -1 OFFSET 4"
        );
    }

    #[test]
    fn test_nested_paths_map_to_columns() {
        let sql = SqlQuery::postgres("customers");
        assert_eq!(sql.column_for::<Customer>("address.city").unwrap(), "address_city");

        let sql = sql.column("address.city", "city");
        let query = Query::new().order_by(SortSpec::parse("address.city:desc").unwrap());
        let result = sql.render::<Customer>(&query).unwrap();
        assert_eq!(result.sql, "SELECT * FROM customers ORDER BY city DESC");
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        let query = Query::new().filter(Predicate::field_equals("email", "a@b.c"));
        let err = SqlQuery::postgres("customers")
            .render::<Customer>(&query)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidField { segment, .. } if segment == "email"));
    }

    #[test]
    fn test_null_equality_and_empty_branches() {
        let filter = Predicate::And(vec![
            Predicate::field_equals("age", Value::Null),
            Predicate::Or(vec![]),
        ]);
        let result = SqlQuery::postgres("customers")
            .render_count::<Customer>(Some(&filter))
            .unwrap();
        assert_eq!(
            result.sql,
            "SELECT COUNT(*) FROM customers WHERE (age IS NULL AND 1=0)"
        );
        assert!(result.params.is_empty());
    }

    #[test]
    #[should_panic(expected = "table `customers; DROP TABLE customers` cannot be used")]
    fn test_invalid_table_panics() {
        let _ = SqlQuery::postgres("customers; DROP TABLE customers");
    }
}
