use memrel_core::{db::query::COUNT_ALIAS, prelude::*};
use memrel_testing_fixtures::{
    CAR_COLORS, CAR_ROW_COUNT, CAR_TABLE, CARS_2023_BY_MILEAGE, car_database, music_database,
};

fn int(row: &Record, field: &str) -> i64 {
    match row.get(field) {
        Some(Value::Int(v)) => *v,
        other => panic!("expected int in {field}, found {other:?}"),
    }
}

fn ids(rows: &[Record]) -> Vec<i64> {
    rows.iter().map(|row| int(row, "Id")).collect()
}

// ─────────────────────────────────────────────
// Car fixture
// ─────────────────────────────────────────────

#[test]
fn sort_by_year_desc_then_mileage_asc() {
    let db = car_database();
    let rows = db
        .query(
            &Query::table(CAR_TABLE)
                .order_by(OrderBy::desc("Year"))
                .order_by(OrderBy::asc("Mileage")),
        )
        .unwrap();

    assert_eq!(rows.len(), CAR_ROW_COUNT);
    assert_eq!(ids(&rows[..3]), CARS_2023_BY_MILEAGE);

    for pair in rows.windows(2) {
        let (a, b) = (&pair[0], &pair[1]);
        assert!(int(a, "Year") >= int(b, "Year"));
        if int(a, "Year") == int(b, "Year") {
            assert!(int(a, "Mileage") <= int(b, "Mileage"));
        }
    }
}

#[test]
fn group_by_color_counts_each_color() {
    let db = car_database();
    let rows = db
        .query(&Query::table(CAR_TABLE).group_by(["Color"]))
        .unwrap();

    let groups: Vec<(String, i64)> = rows
        .iter()
        .map(|row| {
            (
                row.get("Color").and_then(Value::as_text).unwrap().to_string(),
                int(row, COUNT_ALIAS),
            )
        })
        .collect();
    let expected: Vec<(String, i64)> = CAR_COLORS
        .iter()
        .map(|(color, n)| ((*color).to_string(), *n))
        .collect();

    assert_eq!(groups, expected);
}

#[test]
fn grouped_rows_carry_numeric_aggregates() {
    let db = car_database();
    let rows = db
        .query(
            &Query::table(CAR_TABLE)
                .filter(Predicate::where_("Color", Operator::Eq, "Red"))
                .group_by(["Color"]),
        )
        .unwrap();

    let red = &rows[0];
    assert_eq!(red.get("$sum_Mileage"), Some(&Value::Int(246_000)));
    assert_eq!(red.get("$avg_Mileage"), Some(&Value::Float(82_000.0)));
    assert_eq!(red.get("$min_Year"), Some(&Value::Int(2015)));
    assert_eq!(red.get("$max_Year"), Some(&Value::Int(2019)));
    // Non-numeric non-key columns are dropped.
    assert!(!red.contains("Make"));
}

#[test]
fn like_prefix_filters_rows() {
    let db = car_database();
    let rows = db
        .query(&Query::table(CAR_TABLE).filter(Predicate::where_("Make", Operator::Like, "F%")))
        .unwrap();

    assert_eq!(ids(&rows), vec![1, 6, 13]);
}

#[test]
fn like_matches_anywhere_in_the_value() {
    let db = car_database();
    let like = |field: &str, pattern: &str| {
        db.query(&Query::table(CAR_TABLE).filter(Predicate::where_(field, Operator::Like, pattern)))
            .unwrap()
    };

    assert_eq!(ids(&like("Color", "ed")), vec![1, 6, 12]);
    assert_eq!(ids(&like("Make", "o%")), vec![1, 2, 3, 4, 6, 8, 11, 13]);
}

#[test]
fn compound_predicate_with_group() {
    let db = car_database();
    // Color = 'Red' OR (Year = 2023 AND Mileage < 10000)
    let predicate = Predicate::where_("Color", Operator::Eq, "Red").group(
        Chain::Or,
        Predicate::where_("Year", Operator::Eq, 2023).and("Mileage", Operator::Lt, 10_000),
    );

    let rows = db
        .query(&Query::table(CAR_TABLE).filter(predicate))
        .unwrap();

    assert_eq!(ids(&rows), vec![1, 5, 6, 12]);
}

#[test]
fn pagination_windows_sorted_rows() {
    let db = car_database();
    let rows = db
        .query(
            &Query::table(CAR_TABLE)
                .order_by(OrderBy::asc("Id"))
                .offset(10)
                .limit(10),
        )
        .unwrap();

    assert_eq!(ids(&rows), vec![11, 12, 13, 14, 15]);
}

#[test]
fn count_sentinel_counts_filtered_rows() {
    let db = car_database();
    let rows = db
        .query(
            &Query::table(CAR_TABLE)
                .filter(Predicate::where_("Year", Operator::Gte, 2021))
                .select(Select::Count),
        )
        .unwrap();

    assert_eq!(rows, vec![Record::new().with(COUNT_ALIAS, 7)]);
}

#[test]
fn between_and_in_filters() {
    let db = car_database();
    let between = db
        .query(&Query::table(CAR_TABLE).filter(Predicate::where_(
            "Mileage",
            Operator::Between,
            Value::list([10_000, 20_000]),
        )))
        .unwrap();
    let within = db
        .query(&Query::table(CAR_TABLE).filter(Predicate::where_(
            "Color",
            Operator::In,
            Value::list(["White", "Green"]),
        )))
        .unwrap();

    assert_eq!(ids(&between), vec![3, 9, 13]);
    assert_eq!(ids(&within), vec![4, 7, 11, 14]);
}

#[test]
fn is_null_matches_missing_mpg() {
    let db = car_database();
    let rows = db
        .query(&Query::table(CAR_TABLE).filter(Predicate::where_("MpgHwy", Operator::Is, Value::Null)))
        .unwrap();

    assert_eq!(ids(&rows), vec![5]);
}

// ─────────────────────────────────────────────
// Music fixture (joins)
// ─────────────────────────────────────────────

fn track_album_artist() -> Query {
    Query::table("Track")
        .join(JoinDescriptor::new("Album", "al", "AlbumId", "AlbumId"))
        .join(JoinDescriptor::new("Artist", "ar", "al.ArtistId", "ArtistId"))
}

#[test]
fn joins_keep_unmatched_rows() {
    let db = music_database();
    let rows = db.query(&track_album_artist()).unwrap();

    assert_eq!(rows.len(), 7);
    let orphan = rows.iter().find(|r| int(r, "TrackId") == 7).unwrap();
    assert!(!orphan.contains("al.Title"));
    assert!(!orphan.contains("ar.Name"));
}

#[test]
fn joined_fields_filter_and_project_under_aliases() {
    let db = music_database();
    let rows = db
        .query(
            &track_album_artist()
                // Selected fields are renamed before filtering.
                .filter(Predicate::where_("artist", Operator::Eq, "AC/DC"))
                .order_by(OrderBy::asc("track"))
                .select(Select::columns([
                    SelectColumn::new("Track", "Name").alias("track"),
                    SelectColumn::new("ar", "Name").alias("artist"),
                ])),
        )
        .unwrap();

    let tracks: Vec<_> = rows
        .iter()
        .map(|r| r.get("track").and_then(Value::as_text).unwrap())
        .collect();
    assert_eq!(tracks, vec!["Dog Eat Dog", "For Those About To Rock", "Go Down"]);
    assert!(rows.iter().all(|r| r.get("artist") == Some(&Value::text("AC/DC"))));
    assert!(rows.iter().all(|r| r.len() == 2));
}

#[test]
fn grouped_join_counts_tracks_per_artist() {
    let db = music_database();
    let rows = db
        .query(
            &track_album_artist()
                .group_by(["artist"])
                .select(Select::columns([
                    SelectColumn::new("ar", "Name").alias("artist"),
                    SelectColumn::new("Track", "TrackId")
                        .alias("tracks")
                        .aggregate(Aggregate::Count),
                    SelectColumn::new("Track", "UnitPrice")
                        .alias("revenue")
                        .aggregate(Aggregate::Sum),
                ])),
        )
        .unwrap();

    let summary: Vec<(Value, Value)> = rows
        .iter()
        .map(|r| (r.get("artist").cloned().unwrap(), r.get("tracks").cloned().unwrap()))
        .collect();
    assert_eq!(
        summary,
        vec![
            (Value::text("AC/DC"), Value::Int(3)),
            (Value::text("Accept"), Value::Int(3)),
            (Value::Null, Value::Int(1)),
        ]
    );

    let Some(Value::Float(revenue)) = rows[0].get("revenue") else {
        panic!("revenue should be a float sum");
    };
    assert!((revenue - 3.97).abs() < 1e-9);
}

#[test]
fn aggregate_without_group_by_spans_filtered_set() {
    let db = music_database();
    let rows = db
        .query(&Query::table("Track").select(Select::columns([
            SelectColumn::new("Track", "Milliseconds")
                .alias("total")
                .aggregate(Aggregate::Sum),
            SelectColumn::new("Track", "Milliseconds")
                .alias("longest")
                .aggregate(Aggregate::Max),
        ])))
        .unwrap();

    assert_eq!(
        rows,
        vec![
            Record::new()
                .with("total", 1_895_327)
                .with("longest", 343_719)
        ]
    );
}

#[test]
fn join_against_unknown_table_fails() {
    let db = music_database();
    let err = db
        .query(&Query::table("Track").join(JoinDescriptor::new("Genre", "g", "GenreId", "GenreId")))
        .unwrap_err();

    assert_eq!(err.class, memrel_core::error::ErrorClass::NotFound);
}
