// # Record Ledger
//
// Per-domain flat file recording which TXT records the create invocation
// made, so the later cleanup invocation can find and remove them. The file
// is the sole state handed between the two process runs; certbot guarantees
// they never overlap, so no locking is needed.
//
// ## File Format
//
// One line per created record, in the working directory:
//
// ```text
// <zoneID>:<recordID>\n
// ```
//
// The file is named `<CERTBOT_DOMAIN>.txt`.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::error::{Error, Result};

/// One created record: the zone it lives in and its provider-assigned id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedgerEntry {
    /// Numeric id of the hosted zone
    pub zone_id: u64,
    /// Numeric id of the TXT record
    pub record_id: u64,
}

impl fmt::Display for LedgerEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.zone_id, self.record_id)
    }
}

impl FromStr for LedgerEntry {
    type Err = Error;

    fn from_str(line: &str) -> Result<Self> {
        let (zone, record) = line
            .split_once(':')
            .ok_or_else(|| Error::ledger(format!("malformed ledger line: {line:?}")))?;

        let zone_id = zone
            .parse()
            .map_err(|_| Error::ledger(format!("non-numeric zone id in line: {line:?}")))?;
        let record_id = record
            .parse()
            .map_err(|_| Error::ledger(format!("non-numeric record id in line: {line:?}")))?;

        Ok(Self { zone_id, record_id })
    }
}

/// Flat-file ledger of created records for one domain.
///
/// Written in create mode, consumed and deleted in delete mode. Lines
/// without a `:` separator are skipped on read; lines with a separator but
/// non-numeric ids abort the read.
#[derive(Debug, Clone)]
pub struct Ledger {
    path: PathBuf,
}

impl Ledger {
    /// Ledger for a validation domain: `<domain>.txt` in the working directory.
    pub fn for_domain(domain: &str) -> Self {
        Self {
            path: PathBuf::from(format!("{domain}.txt")),
        }
    }

    /// Ledger at an explicit path.
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one `zoneID:recordID` line, creating the file if needed.
    pub async fn append(&self, entry: &LedgerEntry) -> Result<()> {
        let mut file = fs::OpenOptions::new()
            .append(true)
            .create(true)
            .open(&self.path)
            .await
            .map_err(|e| {
                Error::ledger(format!(
                    "failed to open ledger {} for append: {e}",
                    self.path.display()
                ))
            })?;

        file.write_all(format!("{entry}\n").as_bytes())
            .await
            .map_err(|e| {
                Error::ledger(format!(
                    "failed to write to ledger {}: {e}",
                    self.path.display()
                ))
            })?;

        file.flush().await.map_err(|e| {
            Error::ledger(format!(
                "failed to flush ledger {}: {e}",
                self.path.display()
            ))
        })?;

        tracing::debug!("ledger {}: recorded {}", self.path.display(), entry);
        Ok(())
    }

    /// Read all entries. A missing or unreadable file is an error: cleanup
    /// must not silently succeed with nothing to delete.
    pub async fn entries(&self) -> Result<Vec<LedgerEntry>> {
        let content = fs::read_to_string(&self.path).await.map_err(|e| {
            Error::ledger(format!(
                "failed to open ledger {}: {e}",
                self.path.display()
            ))
        })?;

        let mut entries = Vec::new();
        for line in content.lines() {
            if line.is_empty() || !line.contains(':') {
                continue;
            }
            entries.push(line.parse()?);
        }

        tracing::debug!(
            "ledger {}: loaded {} entries",
            self.path.display(),
            entries.len()
        );
        Ok(entries)
    }

    /// Delete the backing file.
    pub async fn remove(&self) -> Result<()> {
        fs::remove_file(&self.path).await.map_err(|e| {
            Error::ledger(format!(
                "failed to remove ledger {}: {e}",
                self.path.display()
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_ledger_round_trip() {
        let dir = tempdir().unwrap();
        let ledger = Ledger::new(dir.path().join("example.com.txt"));

        let entry = LedgerEntry {
            zone_id: 42,
            record_id: 99,
        };
        ledger.append(&entry).await.unwrap();

        let entries = ledger.entries().await.unwrap();
        assert_eq!(entries, vec![entry]);
    }

    #[tokio::test]
    async fn test_ledger_appends_preserve_order() {
        let dir = tempdir().unwrap();
        let ledger = Ledger::new(dir.path().join("example.com.txt"));

        for record_id in [1u64, 2, 3] {
            ledger
                .append(&LedgerEntry {
                    zone_id: 7,
                    record_id,
                })
                .await
                .unwrap();
        }

        let entries = ledger.entries().await.unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(
            entries.iter().map(|e| e.record_id).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
    }

    #[tokio::test]
    async fn test_ledger_skips_lines_without_separator() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("example.com.txt");
        tokio::fs::write(&path, "42:99\n\njunk\n7:8\n").await.unwrap();

        let ledger = Ledger::new(&path);
        let entries = ledger.entries().await.unwrap();
        assert_eq!(
            entries,
            vec![
                LedgerEntry {
                    zone_id: 42,
                    record_id: 99
                },
                LedgerEntry {
                    zone_id: 7,
                    record_id: 8
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_ledger_non_numeric_id_is_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("example.com.txt");
        tokio::fs::write(&path, "42:abc\n").await.unwrap();

        let ledger = Ledger::new(&path);
        assert!(matches!(
            ledger.entries().await,
            Err(Error::Ledger(_))
        ));
    }

    #[tokio::test]
    async fn test_ledger_missing_file_is_ledger_error() {
        let dir = tempdir().unwrap();
        let ledger = Ledger::new(dir.path().join("missing.txt"));
        assert!(matches!(
            ledger.entries().await,
            Err(Error::Ledger(_))
        ));
    }

    #[tokio::test]
    async fn test_ledger_remove_deletes_file() {
        let dir = tempdir().unwrap();
        let ledger = Ledger::new(dir.path().join("example.com.txt"));

        ledger
            .append(&LedgerEntry {
                zone_id: 1,
                record_id: 2,
            })
            .await
            .unwrap();
        assert!(ledger.path().exists());

        ledger.remove().await.unwrap();
        assert!(!ledger.path().exists());
    }

    #[test]
    fn test_entry_display_matches_file_format() {
        let entry = LedgerEntry {
            zone_id: 42,
            record_id: 99,
        };
        assert_eq!(entry.to_string(), "42:99");
        assert_eq!("42:99".parse::<LedgerEntry>().unwrap(), entry);
    }
}
