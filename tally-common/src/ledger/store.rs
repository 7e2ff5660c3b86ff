//! Durable ledger storage
//!
//! The whole ledger lives in one JSON document that is read once at startup
//! and rewritten in full after every mutation. Writes go to a sibling
//! temporary file which is then renamed over the target.
//!
//! Two document shapes are understood:
//! - version 2: `{"version": 2, "last_ordinal": N, "episodes": {id: record}}`
//! - legacy (unversioned): `{id: {"title": ..., "scores": {...}}}`, migrated
//!   on load by parsing ordinals out of titles

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use super::{EpisodeRecord, EpisodeSequencer, Ledger, TitleFormat};
use crate::{Error, Result};

/// Schema version written by [`LedgerStore::save`]
pub const SCHEMA_VERSION: u64 = 2;

/// Only used to decide which shape to parse
#[derive(Deserialize)]
struct VersionProbe {
    #[serde(default)]
    version: Option<serde_json::Value>,
}

#[derive(Deserialize)]
struct LedgerDocument {
    #[allow(dead_code)]
    version: u64,
    #[serde(default)]
    last_ordinal: u32,
    #[serde(default)]
    episodes: IndexMap<String, EpisodeRecord>,
}

#[derive(Serialize)]
struct LedgerDocumentRef<'a> {
    version: u64,
    last_ordinal: u32,
    episodes: &'a IndexMap<String, EpisodeRecord>,
}

/// File-backed ledger store
#[derive(Debug, Clone)]
pub struct LedgerStore {
    path: PathBuf,
    titles: TitleFormat,
}

impl LedgerStore {
    /// `titles` is only consulted when migrating a legacy document
    pub fn new(path: impl Into<PathBuf>, titles: TitleFormat) -> Self {
        Self {
            path: path.into(),
            titles,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the ledger from disk
    ///
    /// A missing file is a first run and yields an empty ledger. A file that
    /// exists but cannot be parsed is `CorruptState`; the caller must not
    /// carry on with an empty ledger in that case.
    pub async fn load(&self) -> Result<Ledger> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!("No ledger at {}, starting empty", self.path.display());
                return Ok(Ledger::new());
            }
            Err(e) => {
                return Err(Error::Persistence(format!(
                    "Failed to read {}: {}",
                    self.path.display(),
                    e
                )))
            }
        };

        let content = std::str::from_utf8(&bytes).map_err(|e| {
            Error::CorruptState(format!("{}: not valid UTF-8: {}", self.path.display(), e))
        })?;
        let ledger = self.parse(content)?;
        info!(
            "Loaded {} episodes from {} (last ordinal {})",
            ledger.len(),
            self.path.display(),
            ledger.last_ordinal()
        );
        Ok(ledger)
    }

    /// Parse a stored document of either supported shape
    pub fn parse(&self, content: &str) -> Result<Ledger> {
        let probe: VersionProbe = serde_json::from_str(content).map_err(|e| corrupt(&self.path, e))?;

        match probe.version {
            None => self.parse_legacy(content),
            Some(v) if v.as_u64() == Some(SCHEMA_VERSION) => {
                let doc: LedgerDocument =
                    serde_json::from_str(content).map_err(|e| corrupt(&self.path, e))?;
                Ok(Ledger::from_parts(
                    doc.episodes,
                    EpisodeSequencer::starting_at(doc.last_ordinal),
                ))
            }
            Some(v) => Err(Error::CorruptState(format!(
                "{}: unsupported schema version {}",
                self.path.display(),
                v
            ))),
        }
    }

    fn parse_legacy(&self, content: &str) -> Result<Ledger> {
        let mut episodes: IndexMap<String, EpisodeRecord> =
            serde_json::from_str(content).map_err(|e| corrupt(&self.path, e))?;

        let sequencer = EpisodeSequencer::seed_from_titles(
            episodes.values().map(|r| r.title.as_str()),
            &self.titles,
        );

        for (id, record) in episodes.iter_mut() {
            if record.ordinal.is_none() {
                record.ordinal = self.titles.parse_ordinal(&record.title);
                if record.ordinal.is_none() {
                    debug!("Legacy episode {} has no parsable ordinal: {:?}", id, record.title);
                }
            }
        }

        warn!(
            "Migrating legacy ledger {} ({} episodes); next save writes schema version {}",
            self.path.display(),
            episodes.len(),
            SCHEMA_VERSION
        );
        Ok(Ledger::from_parts(episodes, sequencer))
    }

    /// Serialize the full ledger to its document text
    pub fn render(ledger: &Ledger) -> Result<String> {
        let doc = LedgerDocumentRef {
            version: SCHEMA_VERSION,
            last_ordinal: ledger.last_ordinal(),
            episodes: ledger.records(),
        };
        serde_json::to_string_pretty(&doc)
            .map_err(|e| Error::Persistence(format!("Failed to serialize ledger: {}", e)))
    }

    /// Overwrite the durable document with the full ledger
    pub async fn save(&self, ledger: &Ledger) -> Result<()> {
        let content = Self::render(ledger)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| persistence("create directory", parent, e))?;
        }

        let temp_path = self.temp_path();
        write_synced(&temp_path, content.as_bytes())
            .await
            .map_err(|e| persistence("write", &temp_path, e))?;
        if let Err(e) = tokio::fs::rename(&temp_path, &self.path).await {
            if let Err(cleanup) = tokio::fs::remove_file(&temp_path).await {
                warn!("Failed to remove {}: {}", temp_path.display(), cleanup);
            }
            return Err(persistence("rename", &temp_path, e));
        }

        debug!("Saved {} episodes to {}", ledger.len(), self.path.display());
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "ledger".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

/// Write and flush to disk so the rename never exposes a partial document
async fn write_synced(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = tokio::fs::File::create(path).await?;
    file.write_all(bytes).await?;
    file.sync_all().await
}

fn corrupt(path: &Path, e: serde_json::Error) -> Error {
    Error::CorruptState(format!("{}: {}", path.display(), e))
}

fn persistence(action: &str, path: &Path, e: std::io::Error) -> Error {
    Error::Persistence(format!("Failed to {} {}: {}", action, path.display(), e))
}
