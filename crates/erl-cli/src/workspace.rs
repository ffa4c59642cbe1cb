use std::fs;
use std::io::{self, Write};
use std::path::Path;

use anyhow::Context;
use erl_crypto::CommitmentEngine;
use erl_ledger::{InMemoryLedger, LedgerConfig, LedgerSnapshot};
use erl_registry::ResultRegistry;
use erl_store::FsContentStore;
use erl_types::{RawRecord, Record};
use tracing::debug;

use crate::config::Config;

pub type Registry = ResultRegistry<FsContentStore, InMemoryLedger>;

/// Open the on-disk registry described by `config`.
pub fn open(config: &Config) -> anyhow::Result<Registry> {
    let store = FsContentStore::open(config.objects_dir())
        .with_context(|| format!("opening object store in {}", config.data_dir.display()))?;
    let ledger = load_ledger(&config.ledger_path(), config.ledger)?;
    Ok(ResultRegistry::new(store, ledger).with_engine(CommitmentEngine::new(config.engine)))
}

/// Persist the registry's ledger back to disk.
pub fn save(config: &Config, registry: &Registry) -> anyhow::Result<()> {
    save_ledger(&config.ledger_path(), registry.ledger())
}

pub fn load_ledger(path: &Path, config: LedgerConfig) -> anyhow::Result<InMemoryLedger> {
    match fs::read_to_string(path) {
        Ok(text) => {
            let snapshot = LedgerSnapshot::from_json(&text)
                .with_context(|| format!("decoding ledger {}", path.display()))?;
            let ledger = InMemoryLedger::from_snapshot(config, snapshot)
                .with_context(|| format!("replaying ledger {}", path.display()))?;
            Ok(ledger)
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "no ledger file, starting empty");
            Ok(InMemoryLedger::new(config)?)
        }
        Err(e) => Err(e).with_context(|| format!("reading ledger {}", path.display())),
    }
}

/// Write the ledger snapshot through a temporary file and rename it into place.
pub fn save_ledger(path: &Path, ledger: &InMemoryLedger) -> anyhow::Result<()> {
    let json = ledger.snapshot()?.to_json()?;
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    fs::create_dir_all(dir)?;
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(json.as_bytes())?;
    tmp.as_file().sync_all()?;
    tmp.persist(path)
        .map_err(|e| e.error)
        .with_context(|| format!("writing ledger {}", path.display()))?;
    debug!(path = %path.display(), "ledger saved");
    Ok(())
}

/// Read a JSON array of loosely shaped rows and normalize every one.
pub fn read_records(path: &Path) -> anyhow::Result<Vec<Record>> {
    let text =
        fs::read_to_string(path).with_context(|| format!("reading records {}", path.display()))?;
    let rows: Vec<RawRecord> = serde_json::from_str(&text)
        .with_context(|| format!("{} is not a JSON array of records", path.display()))?;
    let records = CommitmentEngine::normalize(&rows)
        .with_context(|| format!("invalid record in {}", path.display()))?;
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use erl_crypto::HashScheme;
    use erl_ledger::{LedgerReader, LedgerWriter};
    use erl_types::{BatchKey, ContentHandle, Hash256, SubjectId};

    fn config_in(dir: &Path) -> Config {
        Config {
            data_dir: dir.join("state"),
            ..Config::default()
        }
    }

    #[test]
    fn fresh_workspace_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let registry = open(&config_in(dir.path())).unwrap();
        assert_eq!(registry.ledger().batch_count().unwrap(), 0);
    }

    #[test]
    fn ledger_survives_save_and_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        let key = BatchKey::new("2023/2024", "First", "CSC101").unwrap();

        let registry = open(&config).unwrap();
        registry
            .ledger()
            .record_batch(
                &key,
                ContentHandle::from_hash([1; 32]),
                Hash256::from_bytes([2; 32]),
                HashScheme::DomainSeparated,
                SubjectId::repeat(0xaa),
            )
            .unwrap();
        save(&config, &registry).unwrap();

        let reopened = open(&config).unwrap();
        let entry = reopened.ledger().batch(&key).unwrap().unwrap();
        assert_eq!(entry.merkle_root, Hash256::from_bytes([2; 32]));
        assert_eq!(entry.scheme, HashScheme::DomainSeparated);
    }

    #[test]
    fn audit_survives_scheme_change() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        let key = BatchKey::new("2023/2024", "First", "CSC101").unwrap();
        let records = [
            Record::new(SubjectId::repeat(0x11), 85u64),
            Record::new(SubjectId::repeat(0x22), 91u64),
        ];

        let registry = open(&config).unwrap();
        registry
            .publish(&key, &records, SubjectId::repeat(0xaa))
            .unwrap();
        save(&config, &registry).unwrap();

        let mut changed = config.clone();
        changed.engine.scheme = HashScheme::DomainSeparated;
        let reopened = open(&changed).unwrap();
        let report = reopened.audit(&key).unwrap();
        assert!(report.root_matches());
        assert_eq!(report.scheme, HashScheme::Legacy);
    }

    #[test]
    fn corrupt_ledger_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        fs::create_dir_all(&config.data_dir).unwrap();
        fs::write(config.ledger_path(), "{ broken").unwrap();
        let err = open(&config).unwrap_err();
        assert!(format!("{err:#}").contains("decoding ledger"));
    }

    #[test]
    fn read_records_normalizes_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.json");
        fs::write(
            &path,
            r#"[
                {"address": "0x1111111111111111111111111111111111111111", "name": "Ada", "score": "85"},
                {"student": "0X2222222222222222222222222222222222222222", "score": 91}
            ]"#,
        )
        .unwrap();
        let records = read_records(&path).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].subject, SubjectId::repeat(0x11));
        assert_eq!(records[1].score.value(), 91);
    }

    #[test]
    fn read_records_rejects_bad_row() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.json");
        fs::write(
            &path,
            r#"[{"address": "0x1111111111111111111111111111111111111111", "score": -4}]"#,
        )
        .unwrap();
        let err = read_records(&path).unwrap_err();
        assert!(format!("{err:#}").contains("index 0"));
    }
}
