use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use erl_crypto::EngineConfig;
use erl_ledger::LedgerConfig;
use serde::{Deserialize, Serialize};

/// Config file looked up in the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "erl.toml";

/// CLI configuration, loaded from TOML.
///
/// ```toml
/// data_dir = ".erl"
///
/// [engine]
/// scheme = "legacy"
/// duplicates = "reject"
///
/// [ledger]
/// required_confirmations = 2
/// max_validators = 5
/// ```
///
/// The engine scheme and ledger threshold apply to batches published from
/// now on. Existing batches keep the values recorded with them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub data_dir: PathBuf,
    pub engine: EngineConfig,
    pub ledger: LedgerConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(".erl"),
            engine: EngineConfig::default(),
            ledger: LedgerConfig::default(),
        }
    }
}

impl Config {
    /// Load from an explicit path, or from `erl.toml` if it exists, or fall
    /// back to defaults.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None if Path::new(DEFAULT_CONFIG_FILE).is_file() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_FILE))
            }
            None => Ok(Self::default()),
        }
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::from_toml(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn from_toml(text: &str) -> anyhow::Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.ledger.validate()?;
        Ok(config)
    }

    pub fn objects_dir(&self) -> PathBuf {
        self.data_dir.join("objects")
    }

    pub fn ledger_path(&self) -> PathBuf {
        self.data_dir.join("ledger.json")
    }
}
