use examdb_core::db::{DbConfig, DbHelper, DbResult, SchemaHooks};
use examdb_core::{ExamDbFacade, FacadeError, RepoError};
use rusqlite::Connection;
use std::collections::HashSet;
use std::sync::Arc;
use std::thread;
use tempfile::TempDir;

fn facade() -> (TempDir, ExamDbFacade) {
    let dir = tempfile::tempdir().unwrap();
    let helper = DbHelper::new(DbConfig::at_path(dir.path().join("ExamDb.db")));
    (dir, ExamDbFacade::new(Arc::new(helper)))
}

#[test]
fn insert_update_delete_walkthrough() {
    let (_dir, facade) = facade();

    assert!(facade.select().unwrap().is_empty());
    assert_eq!(facade.insert("a").unwrap(), vec!["a"]);
    assert_eq!(facade.select().unwrap(), vec!["a"]);
    assert_eq!(facade.insert("b").unwrap(), vec!["a", "b"]);
    assert_eq!(facade.update("c").unwrap(), vec!["c", "c"]);
    assert_eq!(facade.select().unwrap(), vec!["c", "c"]);
    assert!(facade.delete("c").unwrap().is_empty());
    assert!(facade.select().unwrap().is_empty());
}

#[test]
fn inserts_are_returned_in_insertion_order() {
    let (_dir, facade) = facade();
    let values = ["zeta", "alpha", "mid", "alpha", ""];

    for value in values {
        facade.insert(value).unwrap();
    }

    assert_eq!(facade.select().unwrap(), values);
}

#[test]
fn update_on_empty_table_is_a_no_op() {
    let (_dir, facade) = facade();

    assert!(facade.update("x").unwrap().is_empty());
    assert!(facade.select().unwrap().is_empty());
}

#[test]
fn update_rewrites_every_row() {
    let (_dir, facade) = facade();
    for value in ["one", "two", "three"] {
        facade.insert(value).unwrap();
    }

    let after = facade.update("same").unwrap();

    assert_eq!(after, vec!["same"; 3]);
}

#[test]
fn delete_removes_all_exact_matches_and_keeps_order() {
    let (_dir, facade) = facade();
    for value in ["keep1", "x", "keep2", "X", "x", "x ", "keep3"] {
        facade.insert(value).unwrap();
    }

    let after = facade.delete("x").unwrap();

    assert_eq!(after, vec!["keep1", "keep2", "X", "x ", "keep3"]);
}

#[test]
fn delete_without_match_is_a_no_op() {
    let (_dir, facade) = facade();
    facade.insert("a").unwrap();

    assert_eq!(facade.delete("missing").unwrap(), vec!["a"]);
}

#[test]
fn insert_then_delete_restores_previous_state() {
    let (_dir, facade) = facade();
    facade.insert("first").unwrap();
    facade.insert("second").unwrap();
    let before = facade.select().unwrap();

    facade.insert("temp").unwrap();
    let after = facade.delete("temp").unwrap();

    assert_eq!(after, before);
}

#[test]
fn empty_string_is_accepted_as_a_value() {
    let (_dir, facade) = facade();

    assert_eq!(facade.insert("").unwrap(), vec![""]);
    assert!(facade.delete("").unwrap().is_empty());
}

#[test]
fn unicode_values_match_exactly() {
    let (_dir, facade) = facade();
    facade.insert("안녕").unwrap();
    facade.insert("Straße").unwrap();

    assert_eq!(facade.delete("STRASSE").unwrap(), vec!["안녕", "Straße"]);
    assert_eq!(facade.delete("안녕").unwrap(), vec!["Straße"]);
}

#[test]
fn entries_survive_a_new_helper_on_the_same_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ExamDb.db");

    let first = ExamDbFacade::new(Arc::new(DbHelper::new(DbConfig::at_path(&path))));
    first.insert("persisted").unwrap();
    drop(first);

    let second = ExamDbFacade::new(Arc::new(DbHelper::new(DbConfig::at_path(&path))));
    assert_eq!(second.select().unwrap(), vec!["persisted"]);
}

#[test]
fn unavailable_store_fails_instead_of_returning_empty() {
    let dir = tempfile::tempdir().unwrap();
    let helper = DbHelper::new(DbConfig::at_path(dir.path().join("missing/dir/ExamDb.db")));
    let facade = ExamDbFacade::new(Arc::new(helper));

    assert!(matches!(
        facade.select(),
        Err(FacadeError::StoreUnavailable(_))
    ));
    assert!(matches!(
        facade.insert("a"),
        Err(FacadeError::StoreUnavailable(_))
    ));
}

/// Creates an untyped `data` column seeded with a row that cannot be read
/// back as text.
struct UnreadableRowSchema;

impl SchemaHooks for UnreadableRowSchema {
    fn on_create(&self, conn: &Connection, config: &DbConfig) -> DbResult<()> {
        conn.execute_batch(&format!(
            "CREATE TABLE \"{table}\" (_id INTEGER PRIMARY KEY AUTOINCREMENT, data);
             INSERT INTO \"{table}\" (data) VALUES (x'00ff');",
            table = config.table_name
        ))?;
        Ok(())
    }

    fn on_upgrade(&self, _: &Connection, _: u32, _: u32) -> DbResult<()> {
        Ok(())
    }

    fn on_downgrade(&self, _: &Connection, _: u32, _: u32) -> DbResult<()> {
        Ok(())
    }
}

#[test]
fn mutation_is_rolled_back_when_the_follow_up_read_fails() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ExamDb.db");
    let helper = DbHelper::with_hooks(DbConfig::at_path(&path), UnreadableRowSchema);
    let facade = ExamDbFacade::new(Arc::new(helper));

    let err = facade.insert("x").unwrap_err();

    assert!(matches!(err, FacadeError::Repo(RepoError::InvalidData(_))));
    let conn = Connection::open(&path).unwrap();
    let (count, payload_type): (i64, String) = conn
        .query_row(
            "SELECT COUNT(*), MAX(typeof(data)) FROM ExamDb;",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .unwrap();
    assert_eq!(count, 1);
    assert_eq!(payload_type, "blob");
}

#[test]
fn concurrent_inserts_lose_no_rows() {
    const THREADS: usize = 8;
    const PER_THREAD: usize = 25;
    let (_dir, facade) = facade();

    let handles = (0..THREADS)
        .map(|thread_index| {
            let facade = facade.clone();
            thread::spawn(move || {
                for item in 0..PER_THREAD {
                    facade.insert(&format!("t{thread_index}-{item}")).unwrap();
                }
            })
        })
        .collect::<Vec<_>>();
    for handle in handles {
        handle.join().unwrap();
    }

    let rows = facade.select().unwrap();
    assert_eq!(rows.len(), THREADS * PER_THREAD);
    let unique: HashSet<_> = rows.iter().collect();
    assert_eq!(unique.len(), THREADS * PER_THREAD);
}

#[test]
fn concurrent_readers_see_a_consistent_table() {
    let (_dir, facade) = facade();
    facade.insert("a").unwrap();
    facade.insert("b").unwrap();
    facade.update("u").unwrap();

    let writer = {
        let facade = facade.clone();
        thread::spawn(move || {
            for _ in 0..20 {
                facade.update("u").unwrap();
                facade.update("v").unwrap();
            }
        })
    };
    let readers = (0..4)
        .map(|_| {
            let facade = facade.clone();
            thread::spawn(move || {
                for _ in 0..20 {
                    let rows = facade.select().unwrap();
                    assert_eq!(rows.len(), 2);
                    assert_eq!(rows[0], rows[1]);
                }
            })
        })
        .collect::<Vec<_>>();

    writer.join().unwrap();
    for reader in readers {
        reader.join().unwrap();
    }
}
