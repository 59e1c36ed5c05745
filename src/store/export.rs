//! Export/Import of the rule table.
//!
//! Lets rules learned by one installation be shared with another.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::types::errors::ErisError;
use crate::types::Rule;
use crate::ErisResult;

use super::rule_store::{insert_rule, update_rule, RuleStore};

/// Version of the export format.
pub const EXPORT_VERSION: &str = "1.0";

/// Serialized snapshot of a rule store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleExport {
    /// Export format version.
    pub version: String,
    /// When the export was written.
    pub exported_at: DateTime<Utc>,
    /// Hex SHA-256 over the exported rules.
    pub checksum: String,
    /// Exported rules, in store order.
    pub rules: Vec<Rule>,
}

/// Outcome of an import.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportResult {
    /// Rules that did not exist yet.
    pub imported: usize,
    /// Rules skipped because the pattern was already stored.
    pub skipped: usize,
    /// Rules whose response was overwritten.
    pub overwritten: usize,
}

impl RuleExport {
    /// Builds an export from a list of rules.
    pub fn new(rules: Vec<Rule>) -> Self {
        Self {
            version: EXPORT_VERSION.to_string(),
            exported_at: Utc::now(),
            checksum: checksum(&rules),
            rules,
        }
    }

    /// Recomputes the checksum and compares it with the recorded one.
    pub fn verify(&self) -> ErisResult<()> {
        let actual = checksum(&self.rules);
        if actual != self.checksum {
            return Err(ErisError::ChecksumMismatch {
                expected: self.checksum.clone(),
                actual,
            });
        }
        Ok(())
    }
}

/// Checksum of a rule list: patterns and responses in order, timestamps excluded.
///
/// Every field is prefixed with its byte length, so no two rule lists feed
/// the same bytes to the hash.
pub fn checksum(rules: &[Rule]) -> String {
    let mut hasher = Sha256::new();
    for rule in rules {
        for field in [&rule.input_pattern, &rule.output_pattern] {
            hasher.update((field.len() as u64).to_le_bytes());
            hasher.update(field.as_bytes());
        }
    }
    hex::encode(hasher.finalize())
}

impl RuleStore {
    /// Writes every stored rule to a JSON file.
    pub fn export(&self, path: &Path) -> ErisResult<RuleExport> {
        let export = RuleExport::new(self.list_all()?);

        let json = serde_json::to_string_pretty(&export)?;
        std::fs::write(path, json)?;

        tracing::info!(
            path = %path.display(),
            rules = export.rules.len(),
            "Rules exported"
        );

        Ok(export)
    }

    /// Loads rules from a JSON export.
    ///
    /// Patterns already stored are skipped, or overwritten when `overwrite`
    /// is set. The file is rejected before any write if its checksum does not
    /// match. All rules are written in one transaction: if any of them fails,
    /// nothing is imported.
    pub fn import(&self, path: &Path, overwrite: bool) -> ErisResult<ImportResult> {
        let json = std::fs::read_to_string(path)?;
        let export: RuleExport = serde_json::from_str(&json)?;
        export.verify()?;

        let mut result = ImportResult::default();
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        for rule in &export.rules {
            match insert_rule(&tx, &rule.input_pattern, &rule.output_pattern) {
                Ok(()) => result.imported += 1,
                Err(e) if e.is_conflict() && overwrite => {
                    update_rule(&tx, &rule.input_pattern, &rule.output_pattern)?;
                    result.overwritten += 1;
                }
                Err(e) if e.is_conflict() => result.skipped += 1,
                Err(e) => return Err(e),
            }
        }

        tx.commit()?;

        tracing::info!(
            path = %path.display(),
            imported = result.imported,
            skipped = result.skipped,
            overwritten = result.overwritten,
            "Rules imported"
        );

        Ok(result)
    }
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
    fn test_export_empty_store() {
        let (store, dir) = create_test_store();
        let export_path = dir.path().join("export.json");

        store.export(&export_path).unwrap();

        let content = std::fs::read_to_string(&export_path).unwrap();
        let export: RuleExport = serde_json::from_str(&content).unwrap();

        assert_eq!(export.version, EXPORT_VERSION);
        assert!(export.rules.is_empty());
        export.verify().unwrap();
    }

    #[test]
    fn test_import_into_fresh_store() {
        let (source, dir) = create_test_store();
        source.create("hello", "Hi there!").unwrap();
        source.create("bye", "See you later!").unwrap();

        let export_path = dir.path().join("export.json");
        source.export(&export_path).unwrap();

        let target = RuleStore::in_memory().unwrap();
        let result = target.import(&export_path, false).unwrap();

        assert_eq!(result.imported, 2);
        assert_eq!(result.skipped, 0);
        assert_eq!(target.list_all().unwrap().len(), 2);
        assert_eq!(
            target.get("bye").unwrap().unwrap().output_pattern,
            "See you later!"
        );
    }

    #[test]
    fn test_import_skips_or_overwrites_existing() {
        let (store, dir) = create_test_store();
        store.create("hello", "Hi there!").unwrap();

        let export_path = dir.path().join("export.json");
        let rules = vec![Rule::new("hello", "Howdy!"), Rule::new("new", "fresh")];
        std::fs::write(
            &export_path,
            serde_json::to_string(&RuleExport::new(rules)).unwrap(),
        )
        .unwrap();

        let result = store.import(&export_path, false).unwrap();
        assert_eq!(result.imported, 1);
        assert_eq!(result.skipped, 1);
        assert_eq!(store.get("hello").unwrap().unwrap().output_pattern, "Hi there!");

        let result = store.import(&export_path, true).unwrap();
        assert_eq!(result.overwritten, 2);
        assert_eq!(store.get("hello").unwrap().unwrap().output_pattern, "Howdy!");
    }

    #[test]
    fn test_import_rejects_tampered_file() {
        let (store, dir) = create_test_store();
        let export_path = dir.path().join("export.json");

        let mut export = RuleExport::new(vec![Rule::new("hello", "Hi there!")]);
        export.rules[0].output_pattern = "tampered".to_string();
        std::fs::write(&export_path, serde_json::to_string(&export).unwrap()).unwrap();

        let err = store.import(&export_path, false).unwrap_err();
        assert!(matches!(err, ErisError::ChecksumMismatch { .. }));
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn test_checksum_depends_on_order() {
        let a = Rule::new("a", "1");
        let b = Rule::new("b", "2");
        assert_ne!(
            checksum(&[a.clone(), b.clone()]),
            checksum(&[b, a])
        );
    }

    #[test]
    fn test_failed_import_writes_nothing() {
        let (store, dir) = create_test_store();
        store.create("hello", "Hi there!").unwrap();

        let export_path = dir.path().join("export.json");
        let rules = vec![
            Rule::new("good", "1"),
            Rule::new("", "2"),
            Rule::new("late", "3"),
        ];
        std::fs::write(
            &export_path,
            serde_json::to_string(&RuleExport::new(rules)).unwrap(),
        )
        .unwrap();

        let err = store.import(&export_path, false).unwrap_err();
        assert!(matches!(err, ErisError::EmptyPattern));
        assert_eq!(store.count().unwrap(), 1);
        assert!(store.get("good").unwrap().is_none());

        // The store is still usable after the rollback
        store.create("after", "ok").unwrap();
        assert_eq!(store.count().unwrap(), 2);
    }

    #[test]
    fn test_checksum_separates_fields() {
        let joined = [Rule::new("a", "b\nc\0d")];
        let split = [Rule::new("a", "b"), Rule::new("c", "d")];
        assert_ne!(checksum(&joined), checksum(&split));

        let shifted = [Rule::new("ab", "c")];
        let unshifted = [Rule::new("a", "bc")];
        assert_ne!(checksum(&shifted), checksum(&unshifted));
    }
}
