//! Rendered SQL executed against SQLite.
//!
//! Pages fetched through `SqlQuery` on a real database must match the pages
//! the in-memory source produces for the same data.

use std::sync::Mutex;

use async_trait::async_trait;
use keyseek::sql::{Sqlite, SqlQuery};
use keyseek::{
    DataSource, Entity, MemorySource, Page, PaginationRequest, Paginator, Predicate, Query,
    SourceError, Value, page_by_cursor,
};
use rusqlite::Connection;
use rusqlite::types::Value as SqlValue;

#[derive(Debug, Clone, PartialEq, Entity)]
struct Address {
    city: String,
}

#[derive(Debug, Clone, PartialEq, Entity)]
struct Customer {
    id: i64,
    age: i32,
    name: String,
    #[entity(nested)]
    address: Address,
}

fn customers() -> Vec<Customer> {
    let cities = ["Oslo", "Lima", "Kyiv"];
    let names = ["ann", "bo", "cy", "di"];
    (1..=17)
        .map(|id| Customer {
            id,
            age: 20 + i32::try_from(id % 5).unwrap(),
            name: names[usize::try_from(id).unwrap() % names.len()].to_string(),
            address: Address {
                city: cities[usize::try_from(id).unwrap() % cities.len()].to_string(),
            },
        })
        .collect()
}

fn bind(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Bool(b) => SqlValue::Integer(i64::from(*b)),
        Value::Int(n) => SqlValue::Integer(*n),
        Value::Float(f) => SqlValue::Real(*f),
        Value::String(s) => SqlValue::Text(s.clone()),
        Value::Ulid(u) => SqlValue::Text(u.to_string()),
        Value::Uuid(u) => SqlValue::Text(u.to_string()),
        Value::Timestamp(t) => SqlValue::Text(t.to_rfc3339()),
    }
}

struct SqliteCustomers {
    conn: Mutex<Connection>,
    sql: SqlQuery<Sqlite>,
}

impl SqliteCustomers {
    fn new(rows: &[Customer]) -> Self {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE customers (
                id INTEGER PRIMARY KEY,
                age INTEGER NOT NULL,
                name TEXT NOT NULL,
                address_city TEXT NOT NULL
            )",
        )
        .unwrap();
        for c in rows {
            conn.execute(
                "INSERT INTO customers (id, age, name, address_city) VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![c.id, c.age, c.name, c.address.city],
            )
            .unwrap();
        }

        Self {
            conn: Mutex::new(conn),
            sql: SqlQuery::sqlite("customers").fields(&["id", "age", "name", "address_city"]),
        }
    }
}

#[async_trait]
impl DataSource<Customer> for SqliteCustomers {
    async fn fetch(&self, query: &Query) -> Result<Vec<Customer>, SourceError> {
        let rendered = self.sql.render::<Customer>(query)?;
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&rendered.sql)?;
        let rows = stmt.query_map(rusqlite::params_from_iter(rendered.params.iter().map(bind)), |row| {
            Ok(Customer {
                id: row.get(0)?,
                age: row.get(1)?,
                name: row.get(2)?,
                address: Address { city: row.get(3)? },
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    async fn count(&self, filter: Option<&Predicate>) -> Result<u64, SourceError> {
        let rendered = self.sql.render_count::<Customer>(filter)?;
        let conn = self.conn.lock().unwrap();
        let count: i64 = conn.query_row(
            &rendered.sql,
            rusqlite::params_from_iter(rendered.params.iter().map(bind)),
            |row| row.get(0),
        )?;
        Ok(u64::try_from(count)?)
    }
}

fn ids(page: &Page<Customer>) -> Vec<i64> {
    page.items.iter().map(|c| c.id).collect()
}

/// Walk every page forward and return the page boundaries.
async fn walk<S: DataSource<Customer>>(source: &S, request: &PaginationRequest) -> Vec<Vec<i64>> {
    let mut pages = Vec::new();
    let mut request = request.clone();
    loop {
        let page = page_by_cursor(source, &request).await.unwrap();
        pages.push(ids(&page));
        match page.next_cursor {
            Some(next) => request = request.after_cursor(next),
            None => return pages,
        }
    }
}

#[tokio::test]
async fn test_sqlite_pages_match_memory() {
    let rows = customers();
    let memory = MemorySource::new(rows.clone());
    let sqlite = SqliteCustomers::new(&rows);

    for sort in ["age", "age:desc", "name,age:desc", "address.city,name", "id:desc"] {
        for size in [1, 4, 17, 20] {
            let request = PaginationRequest::new(size, "id").unwrap().sort_by(sort.to_string());
            assert_eq!(
                walk(&sqlite, &request).await,
                walk(&memory, &request).await,
                "sort {sort}, size {size}"
            );
        }
    }
}

#[tokio::test]
async fn test_sqlite_backward_page() {
    let rows = customers();
    let sqlite = SqliteCustomers::new(&rows);
    let request = PaginationRequest::new(5, "id")
        .unwrap()
        .sort_by("address.city".to_string());

    let first = page_by_cursor(&sqlite, &request).await.unwrap();
    let second = page_by_cursor(&sqlite, &request.clone().after_cursor(first.next_cursor.clone()))
        .await
        .unwrap();
    let back = page_by_cursor(&sqlite, &request.before_cursor(second.previous_cursor))
        .await
        .unwrap();

    assert_eq!(back.items, first.items);
    assert!(back.previous_cursor.is_none());
}

#[tokio::test]
async fn test_sqlite_scoped_totals() {
    let rows = customers();
    let sqlite = SqliteCustomers::new(&rows);
    let scope = Predicate::field_equals("address.city", "Oslo");
    let expected = rows.iter().filter(|c| c.address.city == "Oslo").count();

    let page = Paginator::new(&sqlite)
        .scope(scope)
        .by_cursor::<Customer>(&PaginationRequest::new(2, "id").unwrap())
        .await
        .unwrap();
    assert_eq!(page.total_items, Some(u64::try_from(expected).unwrap()));
    assert!(page.items.iter().all(|c| c.address.city == "Oslo"));
}

#[tokio::test]
async fn test_sqlite_offset_pages() {
    let rows = customers();
    let sqlite = SqliteCustomers::new(&rows);

    let page = Paginator::new(&sqlite)
        .order_by("age,id".parse().unwrap())
        .by_offset::<Customer>(2, 5)
        .await
        .unwrap();

    let mut expected = rows;
    expected.sort_by_key(|c| (c.age, c.id));
    let expected: Vec<i64> = expected[5..10].iter().map(|c| c.id).collect();
    assert_eq!(ids(&page), expected);
    assert_eq!(page.total_pages, Some(4));
}
