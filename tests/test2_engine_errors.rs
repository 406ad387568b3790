#![cfg(feature = "test-utils")]
use tagsql::prelude::*;
use tagsql::test_utils::FailurePoint;

fn session() -> SqlSession<MemoryConnector> {
    let config = DbConfig::new("localhost", "app", "", "testdb");
    SqlSession::new(MemoryConnector::new(), config)
}

fn session_with_table() -> SqlSession<MemoryConnector> {
    let mut s = session();
    s.run("CREATE TABLE pets (id, name, age)", ParamDescriptor::none())
        .unwrap();
    s
}

#[test]
fn arity_mismatch_never_reaches_the_driver() {
    let mut s = session_with_table();
    let binds_before = s.connect().bind_count();
    let executes_before = s.connect().execute_count();

    let err = s
        .run(
            "INSERT INTO pets (name, age) VALUES (?, ?)",
            ParamDescriptor::row("i", vec![FieldValue::Int(3)]),
        )
        .unwrap_err();
    assert!(matches!(
        err,
        TagSqlError::BindArity {
            placeholders: 2,
            params: 1,
            types: 1,
        }
    ));
    assert_eq!(
        err.to_string(),
        "parameter mismatch: placeholders=2, params=1, types=1"
    );

    // The statement was prepared, then dropped without bind or execute.
    let conn = s.connect();
    assert_eq!(conn.bind_count(), binds_before);
    assert_eq!(conn.execute_count(), executes_before);
}

#[test]
fn empty_tags_with_placeholders_is_an_arity_error() {
    let mut s = session_with_table();
    let err = s
        .run(
            "SELECT name FROM pets WHERE id = ?",
            ParamDescriptor::row("", vec![FieldValue::Int(1)]),
        )
        .unwrap_err();
    assert!(matches!(
        err,
        TagSqlError::BindArity {
            placeholders: 1,
            params: 1,
            types: 0,
        }
    ));
}

#[test]
fn row_groups_on_a_plain_statement_are_rejected() {
    let mut s = session_with_table();

    // The multi-row flag only unlocks the batch path for inserts; row
    // groups behind any other verb fail the single-row shape check.
    let executes_before = s.connect().execute_count();
    let request = QueryRequest::multi_insert(
        "UPDATE pets SET age = ? WHERE id = ?",
        ParamDescriptor::rows("ii", vec![vec![FieldValue::Int(1), FieldValue::Int(2)]]),
    );
    let err = s.query(request).unwrap_err();
    assert!(matches!(err, TagSqlError::BindArity { .. }));
    assert_eq!(s.connect().execute_count(), executes_before);
}

#[test]
fn prepare_rejection_is_surfaced_and_recorded() {
    let mut s = session();
    let err = s
        .run("SELECT * FROM missing", ParamDescriptor::none())
        .unwrap_err();
    let TagSqlError::Prepare(driver) = err else {
        panic!("expected a prepare error, got {err}");
    };
    assert_eq!(driver.code, 1146);

    // Telemetry still describes the failed call.
    assert_eq!(s.telemetry().last_sql, "SELECT * FROM missing");
    assert_eq!(s.telemetry().last_row_count, 0);
}

#[test]
fn injected_driver_failures_map_to_their_variants() {
    let mut s = session_with_table();

    s.connect().fail_next(FailurePoint::Bind, 2027, "malformed packet");
    let err = s
        .run(
            "INSERT INTO pets (name) VALUES (?)",
            ParamDescriptor::row("s", vec![FieldValue::Text("rex".into())]),
        )
        .unwrap_err();
    assert!(matches!(err, TagSqlError::Bind(_)));

    s.connect().fail_next(FailurePoint::Execute, 1213, "deadlock found");
    let err = s
        .run(
            "INSERT INTO pets (name) VALUES (?)",
            ParamDescriptor::row("s", vec![FieldValue::Text("rex".into())]),
        )
        .unwrap_err();
    assert!(matches!(err, TagSqlError::Execute(_)));

    s.connect().fail_next(FailurePoint::DescribeColumns, 2053, "no result metadata");
    let err = s
        .run("SELECT name FROM pets", ParamDescriptor::none())
        .unwrap_err();
    assert!(matches!(err, TagSqlError::BindResult(_)));

    s.connect().fail_next(FailurePoint::Fetch, 2013, "lost connection during query");
    let err = s
        .run("SELECT name FROM pets", ParamDescriptor::none())
        .unwrap_err();
    assert!(matches!(err, TagSqlError::BindResult(_)));
}

#[test]
fn session_survives_failures_and_stays_usable() -> Result<(), Box<dyn std::error::Error>> {
    let mut s = session_with_table();

    s.connect().fail_next(FailurePoint::Execute, 1213, "deadlock found");
    assert!(s
        .run(
            "INSERT INTO pets (name) VALUES (?)",
            ParamDescriptor::row("s", vec![FieldValue::Text("rex".into())]),
        )
        .is_err());

    // Same session, next call goes through.
    let outcome = s.run(
        "INSERT INTO pets (name) VALUES (?)",
        ParamDescriptor::row("s", vec![FieldValue::Text("rex".into())]),
    )?;
    assert_eq!(outcome.as_insert_id(), Some(1));
    Ok(())
}

#[test]
fn every_prepared_statement_is_released() -> Result<(), Box<dyn std::error::Error>> {
    let mut s = session_with_table();

    // One success, one arity failure, one execute failure.
    s.run(
        "INSERT INTO pets (name) VALUES (?)",
        ParamDescriptor::row("s", vec![FieldValue::Text("rex".into())]),
    )?;
    let _ = s.run(
        "INSERT INTO pets (name, age) VALUES (?, ?)",
        ParamDescriptor::row("s", vec![FieldValue::Text("rex".into())]),
    );
    s.connect().fail_next(FailurePoint::Execute, 1213, "deadlock found");
    let _ = s.run(
        "DELETE FROM pets WHERE id = ?",
        ParamDescriptor::row("i", vec![FieldValue::Int(1)]),
    );

    let conn = s.connect();
    assert_eq!(conn.prepare_count(), conn.released_count());
    Ok(())
}

#[test]
fn batch_stops_on_width_mismatch_and_reports_the_row() {
    let mut s = session_with_table();

    let outcome = s
        .run_multi_insert(
            "INSERT INTO pets (name, age) VALUES (?, ?)",
            "si",
            vec![
                vec![FieldValue::Text("rex".into()), FieldValue::Int(3)],
                vec![FieldValue::Text("milo".into()), FieldValue::Int(5)],
                vec![FieldValue::Text("bella".into())],
                vec![FieldValue::Text("luna".into()), FieldValue::Int(2)],
                vec![FieldValue::Text("nori".into()), FieldValue::Int(4)],
            ],
        )
        .unwrap();
    let entries = outcome.as_batch().unwrap();

    // Two commits, then the inline width error; the last two rows are never
    // attempted.
    assert_eq!(entries.len(), 3);
    assert_eq!(*entries[0].as_ref().unwrap(), 1);
    assert_eq!(*entries[1].as_ref().unwrap(), 2);
    let err = entries[2].as_ref().unwrap_err();
    assert!(matches!(
        err,
        TagSqlError::RowWidth {
            row: 3,
            expected: 2,
            got: 1,
        }
    ));
    assert_eq!(err.to_string(), "row 3 has 1 values, expected 2");

    // Committed rows are visible; telemetry keeps the last good id.
    assert_eq!(s.telemetry().last_insert_id, 2);
    let outcome = s
        .run("SELECT id FROM pets", ParamDescriptor::none())
        .unwrap();
    assert_eq!(outcome.as_rows().unwrap().len(), 2);
}

#[test]
fn batch_continues_past_an_execute_failure() {
    let mut s = session_with_table();

    // Fail the second row's execute; rows one and three still commit.
    s.connect()
        .fail_after(FailurePoint::Execute, 1, 1062, "duplicate entry");
    let outcome = s
        .run_multi_insert(
            "INSERT INTO pets (name, age) VALUES (?, ?)",
            "si",
            vec![
                vec![FieldValue::Text("rex".into()), FieldValue::Int(3)],
                vec![FieldValue::Text("milo".into()), FieldValue::Int(5)],
                vec![FieldValue::Text("bella".into()), FieldValue::Int(2)],
            ],
        )
        .unwrap();
    let entries = outcome.as_batch().unwrap();

    assert_eq!(entries.len(), 3);
    assert_eq!(*entries[0].as_ref().unwrap(), 1);
    assert!(matches!(entries[1], Err(TagSqlError::Execute(_))));
    assert_eq!(*entries[2].as_ref().unwrap(), 2);
    assert_eq!(s.telemetry().last_insert_id, 2);
}

#[test]
fn first_batch_row_with_wrong_width_fails_the_whole_call() {
    let mut s = session_with_table();
    let executes_before = s.connect().execute_count();
    let err = s
        .run_multi_insert(
            "INSERT INTO pets (name, age) VALUES (?, ?)",
            "si",
            vec![vec![FieldValue::Text("rex".into())]],
        )
        .unwrap_err();
    assert!(matches!(
        err,
        TagSqlError::BindArity {
            placeholders: 2,
            params: 1,
            types: 2,
        }
    ));
    assert_eq!(s.connect().execute_count(), executes_before);
}

#[test]
fn empty_batch_fails_the_whole_call() {
    let mut s = session_with_table();
    let err = s
        .run_multi_insert("INSERT INTO pets (name, age) VALUES (?, ?)", "si", vec![])
        .unwrap_err();
    assert!(matches!(
        err,
        TagSqlError::BindArity {
            placeholders: 2,
            params: 0,
            types: 2,
        }
    ));
}

#[test]
#[should_panic(expected = "database connection failed")]
fn connection_failure_is_fatal() {
    let config = DbConfig::new("unreachable.host", "app", "", "testdb");
    let mut s = SqlSession::new(MemoryConnector::failing(), config);
    let _ = s.run("SELECT 1", ParamDescriptor::none());
}
