use memrel_core::{
    error::ErrorDetail,
    obs::{MetricsEvent, MetricsSink, TransactionPhase, with_metrics_sink},
    prelude::*,
};
use memrel_testing_fixtures::{CAR_ROW_COUNT, CAR_TABLE, car_database, vin};
use std::cell::RefCell;

fn insert_one(db: &mut Database) -> Vec<i64> {
    db.insert(
        CAR_TABLE,
        &["Make", "Model", "Vin"],
        vec![vec!["Kia".into(), "Soul".into(), vin(99).into()]],
    )
    .unwrap()
}

fn count(db: &Database) -> usize {
    db.rows(CAR_TABLE).map_or(0, <[Record]>::len)
}

#[test]
fn rollback_leaves_live_count_unchanged() {
    let mut db = car_database();

    let tx = db.begin_transaction().unwrap();
    insert_one(&mut db);
    assert_eq!(count(&db), CAR_ROW_COUNT + 1);

    db.rollback(tx).unwrap();
    assert_eq!(count(&db), CAR_ROW_COUNT);
}

#[test]
fn commit_publishes_the_inserted_row() {
    let mut db = car_database();

    let tx = db.begin_transaction().unwrap();
    let ids = insert_one(&mut db);
    db.commit(tx).unwrap();

    assert_eq!(count(&db), CAR_ROW_COUNT + 1);
    let rows = db
        .query(&Query::table(CAR_TABLE).filter(Predicate::where_("Id", Operator::Eq, ids[0])))
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get("Vin"), Some(&Value::text(vin(99))));
}

#[test]
fn queries_inside_transaction_see_snapshot() {
    let mut db = car_database();

    let tx = db.begin_transaction().unwrap();
    db.delete(CAR_TABLE, &Predicate::where_("Color", Operator::Eq, "Red"))
        .unwrap();

    let visible = db
        .query(&Query::table(CAR_TABLE).select(Select::Count))
        .unwrap();
    assert_eq!(visible, vec![Record::new().with("$$count", 12)]);

    db.rollback(tx).unwrap();
    let restored = db
        .query(&Query::table(CAR_TABLE).select(Select::Count))
        .unwrap();
    assert_eq!(restored, vec![Record::new().with("$$count", 15)]);
}

#[test]
fn several_writes_commit_together() {
    let mut db = car_database();

    let tx = db.begin_transaction().unwrap();
    db.delete(CAR_TABLE, &Predicate::where_("Year", Operator::Lt, 2018))
        .unwrap();
    db.update(
        CAR_TABLE,
        &Update::filter(Predicate::where_("Make", Operator::Eq, "Kia"))
            .explicit(["Mileage"], vec![16_000.into()]),
    )
    .unwrap();
    db.commit(tx).unwrap();

    assert_eq!(count(&db), CAR_ROW_COUNT - 3);
    let kia = db
        .query(&Query::table(CAR_TABLE).filter(Predicate::where_("Make", Operator::Eq, "Kia")))
        .unwrap();
    assert_eq!(kia[0].get("Mileage"), Some(&Value::Int(16_000)));
}

#[test]
fn nested_begin_and_stale_commit_are_rejected() {
    let mut db = car_database();

    let tx = db.begin_transaction().unwrap();
    assert!(matches!(
        db.begin_transaction().unwrap_err().detail,
        ErrorDetail::TransactionActive { .. }
    ));

    db.commit(tx).unwrap();
    assert!(matches!(
        db.commit(tx).unwrap_err().detail,
        ErrorDetail::TransactionMismatch { active: None, .. }
    ));
}

///
/// PhaseLog
///

#[derive(Default)]
struct PhaseLog(RefCell<Vec<TransactionPhase>>);

impl MetricsSink for PhaseLog {
    fn record(&self, event: MetricsEvent<'_>) {
        if let MetricsEvent::Transaction { phase, .. } = event {
            self.0.borrow_mut().push(phase);
        }
    }
}

#[test]
fn transaction_phases_reach_scoped_sink() {
    let log = PhaseLog::default();

    with_metrics_sink(&log, || {
        let mut db = car_database();
        let tx = db.begin_transaction().unwrap();
        db.rollback(tx).unwrap();
        let tx = db.begin_transaction().unwrap();
        db.commit(tx).unwrap();
    });

    assert_eq!(
        *log.0.borrow(),
        vec![
            TransactionPhase::Begin,
            TransactionPhase::Rollback,
            TransactionPhase::Begin,
            TransactionPhase::Commit,
        ]
    );
}
