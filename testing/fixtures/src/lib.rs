//! Shared schema and seed fixtures for memrel tests.
//!
//! - `car_*`: the 15-row Car table used by filtering, sorting and grouping
//!   tests.
//! - `music_*`: a small Artist / Album / Track / PlaylistTrack catalogue used
//!   by join and composite-key tests, loaded from JSON seed documents.

use chrono::{TimeZone, Utc};
use memrel_core::prelude::*;

///
/// Car
///

pub const CAR_TABLE: &str = "Car";
pub const CAR_ROW_COUNT: usize = 15;

/// Distinct colors with their row counts, in first-seen order.
pub const CAR_COLORS: [(&str, i64); 6] = [
    ("Red", 3),
    ("Blue", 3),
    ("Black", 3),
    ("White", 2),
    ("Silver", 2),
    ("Green", 2),
];

/// Ids of the 2023 rows in ascending mileage order.
pub const CARS_2023_BY_MILEAGE: [i64; 3] = [5, 3, 9];

// (make, model, color, year, mileage, mpg_hwy)
const CARS: [(&str, &str, &str, i64, i64, Option<f64>); CAR_ROW_COUNT] = [
    ("Ford", "Focus", "Red", 2018, 74_000, Some(36.0)),
    ("Toyota", "Camry", "Blue", 2020, 41_000, Some(39.0)),
    ("Honda", "Civic", "Black", 2023, 12_000, Some(42.0)),
    ("Chevrolet", "Malibu", "White", 2016, 98_000, Some(33.5)),
    ("Tesla", "Model 3", "Silver", 2023, 3_500, None),
    ("Ford", "Mustang", "Red", 2019, 52_000, Some(25.0)),
    ("Subaru", "Outback", "Green", 2021, 30_000, Some(33.0)),
    ("Toyota", "Corolla", "Black", 2017, 86_000, Some(38.0)),
    ("Kia", "Telluride", "Blue", 2023, 15_000, Some(26.0)),
    ("Mazda", "CX-5", "Silver", 2022, 21_000, Some(31.0)),
    ("Honda", "Accord", "White", 2021, 33_000, Some(38.5)),
    ("Nissan", "Altima", "Red", 2015, 120_000, Some(39.0)),
    ("Ford", "F-150", "Blue", 2022, 18_000, Some(24.0)),
    ("Jeep", "Wrangler", "Green", 2020, 47_000, Some(22.0)),
    ("Hyundai", "Elantra", "Black", 2019, 56_000, Some(41.0)),
];

#[must_use]
pub fn car_schema() -> Schema {
    Schema::new()
        .with_table(
            CAR_TABLE,
            [
                ("Id", ColumnSpec::int().primary().identity()),
                ("Make", ColumnSpec::string().not_null()),
                ("Model", ColumnSpec::string().not_null()),
                ("Color", ColumnSpec::string().default_value("Black")),
                ("Year", ColumnSpec::int()),
                ("Mileage", ColumnSpec::int().default_value(0)),
                ("MpgHwy", ColumnSpec::float()),
                ("Vin", ColumnSpec::string().unique(true)),
                ("ListedOn", ColumnSpec::date().default_now()),
            ],
        )
        .expect("car schema registers")
}

/// The 15 Car rows, ids 1 through 15.
#[must_use]
pub fn car_rows() -> Vec<Record> {
    CARS.iter()
        .zip(1_i64..)
        .map(|(&(make, model, color, year, mileage, mpg), id)| {
            let listed = Utc
                .with_ymd_and_hms(i32::try_from(year).unwrap_or(2000), 6, 1, 0, 0, 0)
                .single();

            Record::new()
                .with("Id", id)
                .with("Make", make)
                .with("Model", model)
                .with("Color", color)
                .with("Year", year)
                .with("Mileage", mileage)
                .with("MpgHwy", mpg)
                .with("Vin", vin(id))
                .with("ListedOn", listed)
        })
        .collect()
}

#[must_use]
pub fn vin(id: i64) -> String {
    format!("VIN{id:04}")
}

#[must_use]
pub fn car_database() -> Database {
    car_database_with(DbConfig::default())
}

#[must_use]
pub fn car_database_with(config: DbConfig) -> Database {
    let data = Data::new().with_table(CAR_TABLE, car_rows());

    Database::with_config(car_schema(), data, config).expect("car fixture loads")
}

///
/// Music
///

pub const MUSIC_SCHEMA_JSON: &str = r#"{
    "Artist": {
        "ArtistId": { "datatype": "integer", "isPrimary": true, "isIdentity": true },
        "Name": { "datatype": "string", "isNullable": false }
    },
    "Album": {
        "AlbumId": { "datatype": "integer", "isPrimary": true, "isIdentity": true },
        "Title": { "datatype": "string", "isNullable": false },
        "ArtistId": { "datatype": "integer" }
    },
    "Track": {
        "TrackId": { "datatype": "integer", "isPrimary": true, "isIdentity": true },
        "Name": { "datatype": "string", "isNullable": false },
        "AlbumId": { "datatype": "integer" },
        "Milliseconds": { "datatype": "integer" },
        "UnitPrice": { "datatype": "decimal(10,2)", "default": 0.99 }
    },
    "PlaylistTrack": {
        "PlaylistId": { "datatype": "integer", "isPrimary": true },
        "TrackId": { "datatype": "integer", "isPrimary": true }
    }
}"#;

pub const MUSIC_DATA_JSON: &str = r#"{
    "Artist": [
        { "ArtistId": 1, "Name": "AC/DC" },
        { "ArtistId": 2, "Name": "Accept" },
        { "ArtistId": 3, "Name": "Aerosmith" }
    ],
    "Album": [
        { "AlbumId": 1, "Title": "For Those About To Rock We Salute You", "ArtistId": 1 },
        { "AlbumId": 2, "Title": "Balls to the Wall", "ArtistId": 2 },
        { "AlbumId": 3, "Title": "Restless and Wild", "ArtistId": 2 },
        { "AlbumId": 4, "Title": "Let There Be Rock", "ArtistId": 1 }
    ],
    "Track": [
        { "TrackId": 1, "Name": "For Those About To Rock", "AlbumId": 1, "Milliseconds": 343719, "UnitPrice": 0.99 },
        { "TrackId": 2, "Name": "Balls to the Wall", "AlbumId": 2, "Milliseconds": 342562, "UnitPrice": 0.99 },
        { "TrackId": 3, "Name": "Fast As a Shark", "AlbumId": 3, "Milliseconds": 230619, "UnitPrice": 0.99 },
        { "TrackId": 4, "Name": "Restless and Wild", "AlbumId": 3, "Milliseconds": 252051, "UnitPrice": 0.99 },
        { "TrackId": 5, "Name": "Go Down", "AlbumId": 4, "Milliseconds": 331180, "UnitPrice": 1.99 },
        { "TrackId": 6, "Name": "Dog Eat Dog", "AlbumId": 4, "Milliseconds": 215196, "UnitPrice": 0.99 },
        { "TrackId": 7, "Name": "Orphan", "AlbumId": null, "Milliseconds": 180000, "UnitPrice": 0.99 }
    ],
    "PlaylistTrack": [
        { "PlaylistId": 1, "TrackId": 1 },
        { "PlaylistId": 1, "TrackId": 2 },
        { "PlaylistId": 1, "TrackId": 3 },
        { "PlaylistId": 2, "TrackId": 3 },
        { "PlaylistId": 2, "TrackId": 5 }
    ]
}"#;

#[must_use]
pub fn music_database() -> Database {
    Database::from_json(MUSIC_SCHEMA_JSON, MUSIC_DATA_JSON).expect("music fixture loads")
}
