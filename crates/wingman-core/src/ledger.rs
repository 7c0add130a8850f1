// ── Issued-coupon ledger ──
//
// JSON file recording every download coupon this installation has issued
// and not yet expired. Read once at the start of a run, rewritten on
// clear and after each successful download issuance. Single-process
// access assumed; there is no lock.

use std::path::{Path, PathBuf};

use chrono::Local;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::schedule::WINDOW_FORMAT;

/// One previously issued download coupon awaiting expiry on the next run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuanceRecord {
    pub name: String,
    pub coupon_id: i64,
    /// Local wall-clock time of issuance, `YYYY-MM-DD HH:MM:SS`.
    pub issued_at: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LedgerFile {
    #[serde(default)]
    last_updated: String,
    #[serde(default)]
    coupons: Vec<IssuanceRecord>,
}

/// Handle to the ledger file. A missing file reads as empty.
#[derive(Debug, Clone)]
pub struct Ledger {
    path: PathBuf,
}

impl Ledger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<Vec<IssuanceRecord>, CoreError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let raw = std::fs::read_to_string(&self.path)?;
        let file: LedgerFile = serde_json::from_str(&raw)?;
        Ok(file.coupons)
    }

    /// Record one issuance, keeping existing entries. Called immediately
    /// after each successful download issuance so a crash mid-batch
    /// leaves the ledger consistent with what was actually issued.
    pub fn append(&self, record: IssuanceRecord) -> Result<(), CoreError> {
        let mut coupons = self.load()?;
        coupons.push(record);
        self.write(coupons)
    }

    /// Reset to empty. Run after every expiry attempt, successful or not,
    /// so the ledger can never grow without bound across runs.
    pub fn clear(&self) -> Result<(), CoreError> {
        self.write(Vec::new())
    }

    fn write(&self, coupons: Vec<IssuanceRecord>) -> Result<(), CoreError> {
        let file = LedgerFile {
            last_updated: Local::now().format(WINDOW_FORMAT).to_string(),
            coupons,
        };
        std::fs::write(&self.path, serde_json::to_string_pretty(&file)?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn record(name: &str, coupon_id: i64) -> IssuanceRecord {
        IssuanceRecord {
            name: name.into(),
            coupon_id,
            issued_at: "2025-01-02 00:03:00".into(),
        }
    }

    #[test]
    fn missing_file_reads_as_empty() {
        let dir = tempfile::tempdir().expect("tempdir");
        let ledger = Ledger::new(dir.path().join("issued_coupons.json"));
        assert_eq!(ledger.load().expect("load"), Vec::new());
    }

    #[test]
    fn append_accumulates_in_order() {
        let dir = tempfile::tempdir().expect("tempdir");
        let ledger = Ledger::new(dir.path().join("issued_coupons.json"));

        ledger.append(record("첫구매", 100)).expect("append");
        ledger.append(record("재구매", 200)).expect("append");

        let records = ledger.load().expect("load");
        assert_eq!(records, vec![record("첫구매", 100), record("재구매", 200)]);
    }

    #[test]
    fn clear_empties_but_keeps_the_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let ledger = Ledger::new(dir.path().join("issued_coupons.json"));

        ledger.append(record("첫구매", 100)).expect("append");
        ledger.clear().expect("clear");

        assert!(ledger.path().exists());
        assert_eq!(ledger.load().expect("load"), Vec::new());
    }

    #[test]
    fn file_shape_uses_camel_case_keys() {
        let dir = tempfile::tempdir().expect("tempdir");
        let ledger = Ledger::new(dir.path().join("issued_coupons.json"));
        ledger.append(record("첫구매", 100)).expect("append");

        let raw = std::fs::read_to_string(ledger.path()).expect("read");
        let value: serde_json::Value = serde_json::from_str(&raw).expect("json");
        assert!(value.get("lastUpdated").is_some());
        assert_eq!(value["coupons"][0]["couponId"], 100);
        assert!(value["coupons"][0].get("issuedAt").is_some());
    }
}
