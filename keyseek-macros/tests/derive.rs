//! Schemas produced by `#[derive(Entity)]`.

use keyseek::{Entity, Error, FieldKind, Value};

#[derive(Debug, Clone, Entity)]
struct Geo {
    lat: f64,
}

#[derive(Debug, Clone, Entity)]
struct Address {
    city: String,
    #[entity(nested)]
    geo: Geo,
}

#[derive(Debug, Clone, Entity)]
#[entity(name = "account")]
struct Account {
    id: i64,
    #[entity(rename = "displayName")]
    display_name: String,
    r#type: String,
    score: Option<i32>,
    #[entity(nested)]
    billing: Option<Address>,
    #[entity(skip)]
    #[allow(dead_code)]
    secret: String,
}

fn account(billing: Option<Address>) -> Account {
    Account {
        id: 7,
        display_name: "Ada".to_string(),
        r#type: "admin".to_string(),
        score: None,
        billing,
        secret: "hunter2".to_string(),
    }
}

fn oslo() -> Address {
    Address {
        city: "Oslo".to_string(),
        geo: Geo { lat: 59.9 },
    }
}

#[test]
fn test_field_paths() {
    let paths: Vec<&str> = Account::schema().fields().map(|f| f.path()).collect();
    assert_eq!(
        paths,
        ["id", "displayName", "type", "score", "billing.city", "billing.geo.lat"]
    );
}

#[test]
fn test_container_name() {
    assert_eq!(Account::schema().name(), "account");
    assert_eq!(Address::schema().name(), "Address");
}

#[test]
fn test_field_kinds_and_nullability() {
    let schema = Account::schema();
    let id = schema.resolve("id").unwrap();
    assert_eq!(id.kind(), FieldKind::Int);
    assert!(!id.nullable());

    let score = schema.resolve("score").unwrap();
    assert_eq!(score.kind(), FieldKind::Int);
    assert!(score.nullable());

    // Absent parent makes every nested field nullable
    let lat = schema.resolve("billing.geo.lat").unwrap();
    assert_eq!(lat.kind(), FieldKind::Float);
    assert!(lat.nullable());
}

#[test]
fn test_reads_through_nested_fields() {
    let schema = Account::schema();
    let with = account(Some(oslo()));
    let without = account(None);

    let city = schema.resolve("billing.city").unwrap();
    assert_eq!(city.read(&with), Value::from("Oslo"));
    assert_eq!(city.read(&without), Value::Null);

    let lat = schema.resolve("billing.geo.lat").unwrap();
    assert_eq!(lat.read(&with), Value::Float(59.9));
    assert_eq!(schema.resolve("displayName").unwrap().read(&with), Value::from("Ada"));
}

#[test]
fn test_skipped_and_unknown_paths() {
    let schema = Account::schema();
    for (path, segment) in [
        ("secret", "secret"),
        ("display_name", "display_name"),
        ("billing.zip", "zip"),
        ("billing.geo.lng", "lng"),
        ("billing", "billing"),
    ] {
        match schema.resolve(path) {
            Err(Error::InvalidField { segment: got, .. }) => assert_eq!(got, segment, "{path}"),
            other => panic!("{path}: expected InvalidField, got {other:?}"),
        }
    }
}

#[test]
fn test_sort_by_nested_optional_field() {
    let mut items = vec![
        account(Some(oslo())),
        account(None),
        account(Some(Address {
            city: "Lima".to_string(),
            geo: Geo { lat: -12.0 },
        })),
    ];
    for (i, item) in items.iter_mut().enumerate() {
        item.id = i64::try_from(i).unwrap();
    }

    let sorted = keyseek::sort(items, "billing.city,id").unwrap();
    let ids: Vec<i64> = sorted.iter().map(|a| a.id).collect();
    // Nulls order first
    assert_eq!(ids, [1, 2, 0]);
}
