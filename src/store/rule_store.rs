//! RuleStore - durable rule table backed by SQLite.
//!
//! One connection is opened when the store is created and kept for the
//! lifetime of the store. The connection sits behind a mutex since
//! `rusqlite::Connection` is not `Sync`; every statement runs under the lock,
//! so writes for the same pattern never interleave.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::types::errors::ErisError;
use crate::types::Rule;
use crate::ErisResult;

/// Durable rule table keyed by `input_pattern`.
pub struct RuleStore {
    conn: Mutex<Connection>,
}

impl std::fmt::Debug for RuleStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleStore").finish_non_exhaustive()
    }
}

const SELECT_RULES: &str = "SELECT input_pattern, output_pattern, last_changed FROM rules";

impl RuleStore {
    /// Opens (or creates) the rule database at `db_path`.
    pub fn open(db_path: &Path) -> ErisResult<Self> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(db_path)?;
        tracing::debug!(path = %db_path.display(), "Rule store opened");
        Self::with_connection(conn)
    }

    /// Creates a store that lives only in memory.
    pub fn in_memory() -> ErisResult<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> ErisResult<Self> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS rules (
                input_pattern TEXT PRIMARY KEY,
                output_pattern TEXT NOT NULL,
                last_changed TEXT NOT NULL
            );
        "#,
        )?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub(super) fn conn(&self) -> ErisResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| ErisError::other("rule store lock poisoned"))
    }

    /// Inserts a new rule.
    ///
    /// Fails with [`ErisError::Conflict`] when the pattern is already stored;
    /// the existing row is left untouched.
    pub fn create(&self, input_pattern: &str, output_pattern: &str) -> ErisResult<()> {
        insert_rule(&*self.conn()?, input_pattern, output_pattern)
    }

    /// Overwrites the response of an existing rule.
    ///
    /// Fails with [`ErisError::NotFound`] when no row has this pattern.
    pub fn update(&self, input_pattern: &str, output_pattern: &str) -> ErisResult<()> {
        update_rule(&*self.conn()?, input_pattern, output_pattern)
    }

    /// Creates the rule, or overwrites it if the pattern is already stored.
    ///
    /// Returns `true` when a new row was inserted.
    pub fn upsert(&self, input_pattern: &str, output_pattern: &str) -> ErisResult<bool> {
        match self.create(input_pattern, output_pattern) {
            Ok(()) => Ok(true),
            Err(e) if e.is_conflict() => {
                self.update(input_pattern, output_pattern)?;
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    /// Returns the rule stored for `input_pattern`.
    pub fn get(&self, input_pattern: &str) -> ErisResult<Option<Rule>> {
        let rule = self
            .conn()?
            .query_row(
                &format!("{SELECT_RULES} WHERE input_pattern = ?"),
                params![input_pattern],
                row_to_rule,
            )
            .optional()?;

        Ok(rule)
    }

    /// Returns every stored rule.
    ///
    /// Rows come back in insertion order. Callers should rely only on the
    /// order being stable across reads with no writes in between.
    pub fn list_all(&self) -> ErisResult<Vec<Rule>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!("{SELECT_RULES} ORDER BY rowid"))?;

        let rules = stmt
            .query_map([], row_to_rule)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rules)
    }

    /// Number of stored rules.
    pub fn count(&self) -> ErisResult<usize> {
        let count: i64 = self
            .conn()?
            .query_row("SELECT COUNT(*) FROM rules", [], |row| row.get(0))?;

        Ok(count as usize)
    }
}

/// Inserts a rule through `conn`, which may be a transaction.
pub(super) fn insert_rule(
    conn: &Connection,
    input_pattern: &str,
    output_pattern: &str,
) -> ErisResult<()> {
    if input_pattern.is_empty() {
        return Err(ErisError::EmptyPattern);
    }

    let inserted = conn.execute(
        "INSERT OR IGNORE INTO rules (input_pattern, output_pattern, last_changed)
         VALUES (?, ?, ?)",
        params![input_pattern, output_pattern, Utc::now().to_rfc3339()],
    )?;

    if inserted == 0 {
        return Err(ErisError::Conflict(input_pattern.to_string()));
    }

    tracing::debug!(pattern = input_pattern, "Rule created");
    Ok(())
}

/// Updates a rule through `conn`, which may be a transaction.
pub(super) fn update_rule(
    conn: &Connection,
    input_pattern: &str,
    output_pattern: &str,
) -> ErisResult<()> {
    let updated = conn.execute(
        "UPDATE rules SET output_pattern = ?, last_changed = ? WHERE input_pattern = ?",
        params![output_pattern, Utc::now().to_rfc3339(), input_pattern],
    )?;

    if updated == 0 {
        return Err(ErisError::NotFound(input_pattern.to_string()));
    }

    tracing::debug!(pattern = input_pattern, "Rule updated");
    Ok(())
}

fn row_to_rule(row: &Row<'_>) -> rusqlite::Result<Rule> {
    let last_changed: String = row.get(2)?;

    Ok(Rule {
        input_pattern: row.get(0)?,
        output_pattern: row.get(1)?,
        last_changed: parse_timestamp(&last_changed),
    })
}

fn parse_timestamp(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| {
            tracing::warn!(value = raw, "Unparseable last_changed, using current time");
            Utc::now()
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn create_test_store() -> (RuleStore, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let store = RuleStore::open(&db_path).unwrap();
        (store, dir)
    }

    #[test]
    fn test_create_store() {
        let (store, _dir) = create_test_store();
        assert_eq!(store.count().unwrap(), 0);
        assert!(store.list_all().unwrap().is_empty());
    }

    #[test]
    fn test_create_and_list() {
        let (store, _dir) = create_test_store();
        store.create("test", "response").unwrap();

        let rules = store.list_all().unwrap();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].input_pattern, "test");
        assert_eq!(rules[0].output_pattern, "response");
    }

    #[test]
    fn test_duplicate_create_is_conflict() {
        let (store, _dir) = create_test_store();
        store.create("test", "response").unwrap();

        let err = store.create("test", "other").unwrap_err();
        assert!(matches!(err, ErisError::Conflict(ref p) if p == "test"));

        let rules = store.list_all().unwrap();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].output_pattern, "response");
    }

    #[test]
    fn test_update_existing() {
        let (store, _dir) = create_test_store();
        store.create("test", "response").unwrap();
        let before = store.get("test").unwrap().unwrap();

        std::thread::sleep(std::time::Duration::from_millis(5));
        store.update("test", "new response").unwrap();

        let after = store.get("test").unwrap().unwrap();
        assert_eq!(after.output_pattern, "new response");
        assert!(after.last_changed > before.last_changed);
        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn test_update_missing_is_not_found() {
        let (store, _dir) = create_test_store();
        let err = store.update("missing", "x").unwrap_err();
        assert!(matches!(err, ErisError::NotFound(_)));
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn test_upsert() {
        let (store, _dir) = create_test_store();
        assert!(store.upsert("phrase", "one").unwrap());
        assert!(!store.upsert("phrase", "two").unwrap());
        assert_eq!(store.get("phrase").unwrap().unwrap().output_pattern, "two");
        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn test_list_all_insertion_order() {
        let (store, _dir) = create_test_store();
        for pattern in ["zeta", "alpha", "mid"] {
            store.create(pattern, "r").unwrap();
        }
        store.update("zeta", "changed").unwrap();

        let patterns: Vec<_> = store
            .list_all()
            .unwrap()
            .into_iter()
            .map(|r| r.input_pattern)
            .collect();
        assert_eq!(patterns, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_empty_pattern_rejected() {
        let (store, _dir) = create_test_store();
        assert!(matches!(
            store.create("", "x"),
            Err(ErisError::EmptyPattern)
        ));
    }

    #[test]
    fn test_get_missing() {
        let store = RuleStore::in_memory().unwrap();
        store.create("a", "b").unwrap();
        assert!(store.get("a").unwrap().is_some());
        assert!(store.get("b").unwrap().is_none());
    }
}
