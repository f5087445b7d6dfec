use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{HighscoreError, Result};

/// `PRAGMA user_version` written by this build. Stores with a higher version
/// were created by something newer and are refused.
pub const SCHEMA_VERSION: i64 = 1;

const REQUIRED_COLUMNS: [&str; 2] = ["name", "score"];

const CREATE_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS Highscore (
        name  TEXT    NOT NULL,
        score INTEGER NOT NULL DEFAULT 0
    )
"#;

/// One saved game result. Scores are elapsed milliseconds, lower is better.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HighscoreRecord {
    pub name: String,
    pub score: i64,
}

impl HighscoreRecord {
    pub fn new(name: impl Into<String>, score: i64) -> Self {
        Self {
            name: name.into(),
            score,
        }
    }

    /// Build a record, rejecting a blank name or a negative score
    pub fn validated(name: impl Into<String>, score: i64) -> Result<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(HighscoreError::InvalidInput("name must not be empty".into()));
        }
        if score < 0 {
            return Err(HighscoreError::InvalidInput(format!(
                "score must not be negative, got {score}"
            )));
        }
        Ok(Self { name, score })
    }
}

/// How `create` treats its input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Validation {
    /// Store whatever the caller passes
    #[default]
    Permissive,
    /// Reject blank names and negative scores with `InvalidInput`
    Strict,
}

/// Durable highscore list on top of an embedded SQLite database.
///
/// The store owns its connection; dropping it (or calling [`HighscoreStore::close`])
/// releases the database handle.
#[derive(Debug)]
pub struct HighscoreStore {
    conn: Connection,
    validation: Validation,
}

impl HighscoreStore {
    /// Open (or create) the store file at `path`
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        let store = Self::from_connection(conn)?;
        tracing::info!(path = %path.display(), "opened highscore store");
        Ok(store)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    /// Take ownership of an already open connection and ensure the schema exists
    pub fn from_connection(conn: Connection) -> Result<Self> {
        let found: i64 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;
        if found > SCHEMA_VERSION {
            return Err(HighscoreError::IncompatibleSchema {
                found,
                supported: SCHEMA_VERSION,
            });
        }

        conn.execute(CREATE_TABLE, [])?;
        check_columns(&conn)?;
        if found < SCHEMA_VERSION {
            conn.pragma_update(None, "user_version", SCHEMA_VERSION)?;
        }

        Ok(Self {
            conn,
            validation: Validation::default(),
        })
    }

    pub fn with_validation(mut self, validation: Validation) -> Self {
        self.validation = validation;
        self
    }

    pub fn validation(&self) -> Validation {
        self.validation
    }

    /// Insert one record inside a write transaction
    pub fn create(&mut self, name: &str, score: i64) -> Result<HighscoreRecord> {
        let record = match self.validation {
            Validation::Permissive => HighscoreRecord::new(name, score),
            Validation::Strict => HighscoreRecord::validated(name, score)?,
        };

        let tx = self.conn.transaction()?;
        tx.execute(
            "INSERT INTO Highscore (name, score) VALUES (?1, ?2)",
            params![record.name, record.score],
        )?;
        tx.commit()?;

        tracing::debug!(name = %record.name, score = record.score, "saved highscore");
        Ok(record)
    }

    /// Snapshot of every record, fastest first. Equal scores keep insertion order.
    pub fn list_sorted(&self) -> Result<Vec<HighscoreRecord>> {
        let mut stmt = self
            .conn
            .prepare("SELECT name, score FROM Highscore ORDER BY score ASC, rowid ASC")?;

        let records = stmt
            .query_map([], |row| {
                Ok(HighscoreRecord {
                    name: row.get(0)?,
                    score: row.get(1)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(records)
    }

    /// Delete every record inside a write transaction
    pub fn clear(&mut self) -> Result<()> {
        let tx = self.conn.transaction()?;
        let removed = tx.execute("DELETE FROM Highscore", [])?;
        tx.commit()?;

        tracing::info!(removed, "cleared highscores");
        Ok(())
    }

    pub fn len(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM Highscore", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Release the database handle, reporting any close failure
    pub fn close(self) -> Result<()> {
        self.conn.close().map_err(|(_, e)| HighscoreError::from(e))
    }
}

/// A pre-existing `Highscore` table must carry every column the queries use
fn check_columns(conn: &Connection) -> Result<()> {
    let mut stmt = conn.prepare("SELECT name FROM pragma_table_info('Highscore')")?;
    let columns = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let missing: Vec<&str> = REQUIRED_COLUMNS
        .into_iter()
        .filter(|want| !columns.iter().any(|c| c.eq_ignore_ascii_case(want)))
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(HighscoreError::IncompatibleTable {
            missing: missing.join(", "),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use rusqlite::OpenFlags;
    use tempfile::tempdir;

    fn user_version(conn: &Connection) -> i64 {
        conn.pragma_query_value(None, "user_version", |row| row.get(0))
            .unwrap()
    }

    fn scores(store: &HighscoreStore) -> Vec<i64> {
        store
            .list_sorted()
            .unwrap()
            .into_iter()
            .map(|r| r.score)
            .collect()
    }

    #[test]
    fn create_then_list() {
        let mut store = HighscoreStore::open_in_memory().unwrap();
        store.create("Alice", 1200).unwrap();

        assert_eq!(
            store.list_sorted().unwrap(),
            vec![HighscoreRecord::new("Alice", 1200)]
        );
    }

    #[test]
    fn list_is_sorted_ascending() {
        let mut store = HighscoreStore::open_in_memory().unwrap();
        for score in [500, 100, 900] {
            store.create("p", score).unwrap();
        }
        assert_eq!(scores(&store), vec![100, 500, 900]);
    }

    #[test]
    fn ties_keep_insertion_order() {
        let mut store = HighscoreStore::open_in_memory().unwrap();
        store.create("first", 300).unwrap();
        store.create("fast", 10).unwrap();
        store.create("second", 300).unwrap();

        let names: Vec<String> = store
            .list_sorted()
            .unwrap()
            .into_iter()
            .map(|r| r.name)
            .collect();
        assert_eq!(names, vec!["fast", "first", "second"]);
    }

    #[test]
    fn duplicates_are_allowed() {
        let mut store = HighscoreStore::open_in_memory().unwrap();
        store.create("Bob", 42).unwrap();
        store.create("Bob", 42).unwrap();
        assert_eq!(store.len().unwrap(), 2);
    }

    #[test]
    fn clear_removes_everything() {
        let mut store = HighscoreStore::open_in_memory().unwrap();
        for score in 0..10 {
            store.create("x", score).unwrap();
        }
        store.clear().unwrap();
        assert!(store.list_sorted().unwrap().is_empty());
        assert!(store.is_empty().unwrap());

        // Clearing an empty store is fine too
        store.clear().unwrap();
    }

    #[test]
    fn permissive_accepts_anything() {
        let mut store = HighscoreStore::open_in_memory().unwrap();
        assert_eq!(store.validation(), Validation::Permissive);
        store.create("", -5).unwrap();
        assert_eq!(store.list_sorted().unwrap(), vec![HighscoreRecord::new("", -5)]);
    }

    #[test]
    fn strict_rejects_blank_name_and_negative_score() {
        let mut store = HighscoreStore::open_in_memory()
            .unwrap()
            .with_validation(Validation::Strict);

        let err = store.create("   ", 10).unwrap_err();
        assert!(matches!(err, HighscoreError::InvalidInput(_)));
        let err = store.create("Carol", -1).unwrap_err();
        assert!(matches!(err, HighscoreError::InvalidInput(_)));
        assert!(store.is_empty().unwrap());

        store.create("Carol", 0).unwrap();
        assert_eq!(store.len().unwrap(), 1);
    }

    #[test]
    fn records_survive_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("highscores.db");

        let mut store = HighscoreStore::open(&path).unwrap();
        store.create("Dana", 321).unwrap();
        store.close().unwrap();

        let store = HighscoreStore::open(&path).unwrap();
        assert_eq!(
            store.list_sorted().unwrap(),
            vec![HighscoreRecord::new("Dana", 321)]
        );
    }

    #[test]
    fn newer_schema_is_refused() {
        let conn = Connection::open_in_memory().unwrap();
        conn.pragma_update(None, "user_version", SCHEMA_VERSION + 1)
            .unwrap();

        let err = HighscoreStore::from_connection(conn).unwrap_err();
        assert!(err.is_unavailable());
        assert!(matches!(
            err,
            HighscoreError::IncompatibleSchema { found, supported }
                if found == SCHEMA_VERSION + 1 && supported == SCHEMA_VERSION
        ));
    }

    #[test]
    fn existing_table_is_reused() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute(CREATE_TABLE, []).unwrap();
        conn.execute("INSERT INTO Highscore (name) VALUES ('legacy')", [])
            .unwrap();

        let store = HighscoreStore::from_connection(conn).unwrap();
        assert_eq!(
            store.list_sorted().unwrap(),
            vec![HighscoreRecord::new("legacy", 0)]
        );
    }

    #[test]
    fn foreign_table_shape_is_refused_and_left_unstamped() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("highscores.db");
        let conn = Connection::open(&path).unwrap();
        conn.execute("CREATE TABLE Highscore (player TEXT, millis INTEGER)", [])
            .unwrap();

        let err = HighscoreStore::from_connection(conn).unwrap_err();
        assert_matches!(&err, HighscoreError::IncompatibleTable { missing } if missing == "name, score");
        assert!(err.is_unavailable());

        let conn = Connection::open(&path).unwrap();
        assert_eq!(user_version(&conn), 0);
    }

    #[test]
    fn partial_table_names_the_missing_column() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute("CREATE TABLE Highscore (Name TEXT)", []).unwrap();

        let err = HighscoreStore::from_connection(conn).unwrap_err();
        assert_matches!(err, HighscoreError::IncompatibleTable { missing } if missing == "score");
    }

    #[test]
    fn writes_fail_on_read_only_connection() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("highscores.db");
        let mut store = HighscoreStore::open(&path).unwrap();
        store.create("kept", 7).unwrap();
        store.close().unwrap();

        let conn = Connection::open_with_flags(&path, OpenFlags::SQLITE_OPEN_READ_ONLY).unwrap();
        let mut store = HighscoreStore::from_connection(conn).unwrap();

        let err = store.create("new", 1).unwrap_err();
        assert!(err.is_unavailable());
        assert_matches!(err, HighscoreError::Unavailable(_));

        let err = store.clear().unwrap_err();
        assert!(err.is_unavailable());
        assert_matches!(err, HighscoreError::Unavailable(_));

        assert_eq!(scores(&store), vec![7]);
    }

    #[test]
    fn garbage_file_fails_to_open() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("highscores.db");
        std::fs::write(&path, vec![0xAB_u8; 4096]).unwrap();

        let err = HighscoreStore::open(&path).unwrap_err();
        assert!(err.is_unavailable());
    }
}
