use super::*;
use crate::{
    db::query::predicate::Operator,
    error::ErrorDetail,
    schema::ColumnSpec,
    value::{Value, ValueKind},
};
use proptest::prelude::*;

fn car(id: i64, make: &str, color: &str, year: i64, mileage: i64) -> Record {
    Record::new()
        .with("Id", id)
        .with("Make", make)
        .with("Color", color)
        .with("Year", year)
        .with("Mileage", mileage)
}

fn garage() -> (Schema, Data) {
    let schema = Schema::new()
        .with_table(
            "Car",
            [
                ("Id", ColumnSpec::int().primary().identity()),
                ("Make", ColumnSpec::string()),
                ("Color", ColumnSpec::string()),
                ("Year", ColumnSpec::int()),
                ("Mileage", ColumnSpec::int()),
            ],
        )
        .and_then(|s| {
            s.with_table(
                "Owner",
                [
                    ("OwnerId", ColumnSpec::int().primary()),
                    ("CarId", ColumnSpec::int()),
                    ("Name", ColumnSpec::string()),
                ],
            )
        })
        .unwrap();

    let data = Data::new()
        .with_table(
            "Car",
            vec![
                car(1, "Ford", "Red", 2018, 42_000),
                car(2, "Toyota", "Blue", 2020, 30_000),
                car(3, "Honda", "Red", 2023, 1_200),
                car(4, "Kia", "White", 2023, 3_500),
            ],
        )
        .with_table(
            "Owner",
            vec![
                Record::new().with("OwnerId", 10).with("CarId", 1).with("Name", "Ana"),
                Record::new().with("OwnerId", 11).with("CarId", 1).with("Name", "Ben"),
                Record::new().with("OwnerId", 12).with("CarId", 3).with("Name", "Cy"),
            ],
        );

    (schema, data)
}

fn run(query: &Query) -> Result<Vec<Record>, Error> {
    let (schema, data) = garage();
    QueryExecutor::new(&schema, &data, DbConfig::default()).execute(query)
}

fn ints(rows: &[Record], field: &str) -> Vec<i64> {
    rows.iter()
        .map(|r| r.get(field).and_then(Value::as_int).unwrap())
        .collect()
}

// ─────────────────────────────────────────────
// Pagination
// ─────────────────────────────────────────────

fn numbered(n: i64) -> Vec<Record> {
    (0..n).map(|i| Record::new().with("n", i)).collect()
}

#[test]
fn paginate_offset_and_limit_windows() {
    let mut rows = numbered(10);
    page::paginate(&mut rows, Some(2), Some(3));
    assert_eq!(ints(&rows, "n"), vec![2, 3, 4]);

    let mut rows = numbered(10);
    page::paginate(&mut rows, Some(8), None);
    assert_eq!(ints(&rows, "n"), vec![8, 9]);

    let mut rows = numbered(10);
    page::paginate(&mut rows, None, Some(2));
    assert_eq!(ints(&rows, "n"), vec![0, 1]);
}

#[test]
fn paginate_clamps_past_the_end() {
    let mut rows = numbered(3);
    page::paginate(&mut rows, Some(5), Some(2));
    assert!(rows.is_empty());

    let mut rows = numbered(3);
    page::paginate(&mut rows, Some(1), Some(100));
    assert_eq!(ints(&rows, "n"), vec![1, 2]);
}

#[test]
fn paginate_zero_limit_keeps_no_rows() {
    let mut rows = numbered(4);
    page::paginate(&mut rows, None, Some(0));
    assert!(rows.is_empty());

    let mut rows = numbered(4);
    page::paginate(&mut rows, None, None);
    assert_eq!(rows.len(), 4);
}

// ─────────────────────────────────────────────
// Sorting
// ─────────────────────────────────────────────

#[test]
fn sort_multi_key_with_desc_first() {
    let rows = run(&Query::table("Car")
        .order_by(OrderBy::desc("Year"))
        .order_by(OrderBy::asc("Mileage")))
    .unwrap();

    assert_eq!(ints(&rows, "Id"), vec![3, 4, 2, 1]);
}

#[test]
fn sort_places_nulls_first_ascending() {
    let mut rows = vec![
        Record::new().with("k", 2),
        Record::new().with("k", Value::Null),
        Record::new().with("k", 1),
    ];

    order::sort(&mut rows, &[OrderBy::asc("k")]).unwrap();

    assert!(rows[0].get("k").unwrap().is_null());
    assert_eq!(rows[1].get("k"), Some(&Value::Int(1)));
}

#[test]
fn sort_rejects_mixed_kinds_without_moving_rows() {
    let mut rows = vec![
        Record::new().with("k", 2),
        Record::new().with("k", "two"),
        Record::new().with("k", 1),
    ];
    let before = rows.clone();

    let err = order::sort(&mut rows, &[OrderBy::asc("k")]).unwrap_err();

    assert!(matches!(
        err.detail,
        ErrorDetail::UnsupportedComparisonType {
            left: ValueKind::Int,
            right: ValueKind::Text,
            ..
        }
    ));
    assert_eq!(rows, before);
}

#[test]
fn sort_accepts_mixed_int_and_float() {
    let mut rows = vec![
        Record::new().with("k", 2.5),
        Record::new().with("k", 1),
        Record::new().with("k", 2),
    ];

    order::sort(&mut rows, &[OrderBy::asc("k")]).unwrap();

    let keys: Vec<_> = rows.iter().map(|r| r.get("k").cloned().unwrap()).collect();
    assert_eq!(keys, vec![Value::Int(1), Value::Int(2), Value::Float(2.5)]);
}

#[test]
fn sort_error_aborts_query() {
    let (schema, mut data) = garage();
    data.insert_table(
        "Car",
        vec![car(1, "Ford", "Red", 2018, 1), Record::new().with("Id", 2).with("Year", "soon")],
    );

    let err = QueryExecutor::new(&schema, &data, DbConfig::default())
        .execute(&Query::table("Car").order_by(OrderBy::asc("Year")))
        .unwrap_err();

    assert_eq!(err.origin, ErrorOrigin::Sort);
}

proptest! {
    #[test]
    fn sort_is_stable(keys in proptest::collection::vec(0i64..4, 0..40)) {
        let mut rows: Vec<Record> = keys
            .iter()
            .enumerate()
            .map(|(pos, k)| Record::new().with("k", *k).with("pos", i64::try_from(pos).unwrap()))
            .collect();

        order::sort(&mut rows, &[OrderBy::asc("k")]).unwrap();

        for pair in rows.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            let (ka, kb) = (a.get("k").and_then(Value::as_int), b.get("k").and_then(Value::as_int));
            prop_assert!(ka <= kb);
            if ka == kb {
                prop_assert!(a.get("pos").and_then(Value::as_int) < b.get("pos").and_then(Value::as_int));
            }
        }
    }
}

// ─────────────────────────────────────────────
// Grouping
// ─────────────────────────────────────────────

#[test]
fn group_by_color_counts_and_orders_by_first_seen() {
    let rows = run(&Query::table("Car").group_by(["Color"])).unwrap();

    let colors: Vec<_> = rows
        .iter()
        .map(|r| r.get("Color").and_then(Value::as_text).unwrap())
        .collect();
    assert_eq!(colors, vec!["Red", "Blue", "White"]);
    assert_eq!(ints(&rows, COUNT_ALIAS), vec![2, 1, 1]);
}

#[test]
fn group_computes_numeric_aggregates_and_drops_text() {
    let rows = run(&Query::table("Car").group_by(["Color"])).unwrap();
    let red = &rows[0];

    assert_eq!(red.get("$sum_Mileage"), Some(&Value::Int(43_200)));
    assert_eq!(red.get("$avg_Mileage"), Some(&Value::Float(21_600.0)));
    assert_eq!(red.get("$min_Year"), Some(&Value::Int(2018)));
    assert_eq!(red.get("$max_Year"), Some(&Value::Int(2023)));
    assert!(red.get("Make").is_none());
    assert!(red.get("$sum_Make").is_none());
}

#[test]
fn group_sum_becomes_float_when_any_member_is_float() {
    let rows = vec![
        Record::new().with("g", "a").with("v", 1),
        Record::new().with("g", "a").with("v", 0.5),
        Record::new().with("g", "a").with("v", Value::Null),
    ];

    let grouped = group::group(rows, &["g".to_string()]);

    assert_eq!(grouped.len(), 1);
    assert_eq!(grouped[0].get("$sum_v"), Some(&Value::Float(1.5)));
    assert_eq!(grouped[0].get("$avg_v"), Some(&Value::Float(0.5)));
    assert_eq!(grouped[0].get("$min_v"), Some(&Value::Float(0.5)));
    assert_eq!(grouped[0].get(COUNT_ALIAS), Some(&Value::Int(3)));
}

#[test]
fn aggregate_select_orders_by_grouped_name() {
    let rows = run(&Query::table("Car")
        .group_by(["Color"])
        .order_by(OrderBy::desc("$sum_Mileage"))
        .select(Select::columns([
            SelectColumn::new("Car", "Color"),
            SelectColumn::new("Car", "Mileage")
                .alias("total")
                .aggregate(Aggregate::Sum),
            SelectColumn::new("Car", "*").alias("n").aggregate(Aggregate::Count),
        ])))
    .unwrap();

    assert_eq!(ints(&rows, "total"), vec![43_200, 30_000, 3_500]);
    assert_eq!(ints(&rows, "n"), vec![2, 1, 1]);
    assert_eq!(rows[0].names().collect::<Vec<_>>(), vec!["Color", "total", "n"]);
}

#[test]
fn aggregates_without_group_by_cover_the_filtered_set() {
    let rows = run(&Query::table("Car")
        .filter(Predicate::where_("Year", Operator::Eq, 2023))
        .select(Select::columns([SelectColumn::new("Car", "Mileage")
            .alias("max")
            .aggregate(Aggregate::Max)])))
    .unwrap();

    assert_eq!(rows.len(), 1);
    assert_eq!(ints(&rows, "max"), vec![3_500]);
}

// ─────────────────────────────────────────────
// Joins
// ─────────────────────────────────────────────

#[test]
fn join_duplicates_matches_and_keeps_unmatched() {
    let rows = run(&Query::table("Car")
        .join(JoinDescriptor::new("Owner", "o", "Id", "CarId"))
        .order_by(OrderBy::asc("Id")))
    .unwrap();

    // Car 1 has two owners, car 3 one, cars 2 and 4 none.
    assert_eq!(ints(&rows, "Id"), vec![1, 1, 2, 3, 4]);
    assert_eq!(rows[0].get("o.Name"), Some(&Value::text("Ana")));
    assert_eq!(rows[1].get("o.Name"), Some(&Value::text("Ben")));
    assert!(rows[2].get("o.Name").is_none());
}

#[test]
fn join_fields_take_select_aliases() {
    let rows = run(&Query::table("Car")
        .join(JoinDescriptor::new("Owner", "o", "Id", "CarId"))
        .filter(Predicate::where_("owner", Operator::Eq, "Cy"))
        .select(Select::columns([
            SelectColumn::new("Car", "Make").alias("make"),
            SelectColumn::new("o", "Name").alias("owner"),
        ])))
    .unwrap();

    assert_eq!(
        rows,
        vec![Record::new().with("make", "Honda").with("owner", "Cy")]
    );
}

#[test]
fn join_on_unknown_table_is_rejected() {
    let err = run(&Query::table("Car").join(JoinDescriptor::new("Nope", "n", "Id", "Id")))
        .unwrap_err();

    assert!(matches!(err.detail, ErrorDetail::UnknownTable { ref table } if table == "Nope"));
}

// ─────────────────────────────────────────────
// Projection + pipeline
// ─────────────────────────────────────────────

#[test]
fn count_sentinel_collapses_after_pagination() {
    let rows = run(&Query::table("Car")
        .filter(Predicate::where_("Color", Operator::Eq, "Red"))
        .limit(1)
        .select(Select::Count))
    .unwrap();

    assert_eq!(rows, vec![Record::new().with(COUNT_ALIAS, 1)]);
}

#[test]
fn count_sentinel_from_first_alias() {
    let select = Select::columns([SelectColumn::new("Car", "Id").alias(COUNT_ALIAS)]);
    let rows = run(&Query::table("Car").select(select)).unwrap();

    assert_eq!(rows, vec![Record::new().with(COUNT_ALIAS, 4)]);
}

#[test]
fn missing_alias_projects_null() {
    let rows = run(&Query::table("Car")
        .limit(1)
        .select(Select::columns([
            SelectColumn::new("Car", "Make"),
            SelectColumn::new("Car", "Trim"),
        ])))
    .unwrap();

    assert_eq!(
        rows,
        vec![Record::new().with("Make", "Ford").with("Trim", Value::Null)]
    );
}

#[test]
fn unknown_base_table_is_rejected() {
    let err = run(&Query::table("Boat")).unwrap_err();

    assert_eq!(err.origin, ErrorOrigin::Query);
}

#[test]
fn strict_mode_rejects_unrecognized_operator_before_evaluation() {
    let (schema, data) = garage();
    let query = Query::table("Car").filter(Predicate::where_(
        "Color",
        Operator::Unrecognized("~=".into()),
        "Red",
    ));

    let lenient = QueryExecutor::new(&schema, &data, DbConfig::default())
        .execute(&query)
        .unwrap();
    assert!(lenient.is_empty());

    let err = QueryExecutor::new(&schema, &data, DbConfig::new().with_strict_predicates(true))
        .execute(&query)
        .unwrap_err();
    assert_eq!(err.origin, ErrorOrigin::Predicate);
}
