//! Persisted reconciliation preferences.

use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

/// Preferences handed to a reconciliation run at construction time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconcilePreferences {
    /// The user dismissed the escrow withdrawal notice; skip reconciliation.
    pub withdrawal_notice_dismissed: bool,
}

/// File-backed preference storage.
#[derive(Debug, Clone, Default)]
pub struct PreferenceStore {
    path: Option<PathBuf>,
    current: ReconcilePreferences,
}

impl PreferenceStore {
    /// Preferences that are never written to disk.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Load from file if it exists; a missing file means defaults.
    pub fn load_from_file(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let current = if path.exists() {
            let reader = BufReader::new(File::open(path)?);
            let prefs: ReconcilePreferences = serde_json::from_reader(reader)?;
            tracing::debug!(path = %path.display(), "Loaded preferences");
            prefs
        } else {
            ReconcilePreferences::default()
        };

        Ok(Self {
            path: Some(path.to_path_buf()),
            current,
        })
    }

    /// Load from the configured path, or keep preferences in memory.
    pub fn open(path: Option<&str>) -> std::io::Result<Self> {
        match path {
            Some(path) => Self::load_from_file(path),
            None => Ok(Self::in_memory()),
        }
    }

    /// Save to file.
    pub fn save_to_file(&self) -> std::io::Result<()> {
        if let Some(path) = &self.path {
            let writer = BufWriter::new(File::create(path)?);
            serde_json::to_writer_pretty(writer, &self.current)?;
            tracing::debug!(path = %path.display(), "Saved preferences");
        }
        Ok(())
    }

    pub fn preferences(&self) -> &ReconcilePreferences {
        &self.current
    }

    /// Record that the withdrawal notice was dismissed and persist it.
    pub fn dismiss_withdrawal_notice(&mut self) -> std::io::Result<()> {
        self.current.withdrawal_notice_dismissed = true;
        self.save_to_file()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_memory_defaults() {
        let mut store = PreferenceStore::in_memory();
        assert!(!store.preferences().withdrawal_notice_dismissed);
        store.dismiss_withdrawal_notice().unwrap();
        assert!(store.preferences().withdrawal_notice_dismissed);
    }

    #[test]
    fn test_persistence() {
        let path = std::env::temp_dir().join(format!("ethscribe-prefs-{}.json", uuid::Uuid::new_v4()));

        let mut store = PreferenceStore::load_from_file(&path).unwrap();
        assert!(!store.preferences().withdrawal_notice_dismissed);
        store.dismiss_withdrawal_notice().unwrap();

        let loaded = PreferenceStore::load_from_file(&path).unwrap();
        assert!(loaded.preferences().withdrawal_notice_dismissed);

        std::fs::remove_file(&path).unwrap_or_default();
    }
}
