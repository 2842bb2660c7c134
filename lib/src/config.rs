// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Device handle configuration
//!
//! ```toml
//! chunk_size = 255
//! request_timeout_ms = 2000
//! trace_apdus = false
//!
//! [status_names]
//! "0x6a80" = "INVALID_DATA"
//! ```

use std::{collections::BTreeMap, path::Path, time::Duration};

use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;

use ledger_ont_apdu::{status::StatusCode, MAX_APDU_DATA};

use crate::Error;

/// Configuration for a [`DeviceHandle`](crate::DeviceHandle)
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Payload bytes per chunk frame (1..=255)
    pub chunk_size: usize,

    /// Timeout for non-interactive requests, must be non-zero
    pub request_timeout_ms: u64,

    /// Log raw APDU frames at `trace` level
    pub trace_apdus: bool,

    /// Additional status word names, keyed by hex status (`"0x6a80"`)
    pub status_names: BTreeMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            chunk_size: MAX_APDU_DATA,
            request_timeout_ms: 2000,
            trace_apdus: false,
            status_names: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let s = std::fs::read_to_string(path)?;
        Self::from_toml(&s)
    }

    /// Parse configuration from a TOML string
    pub fn from_toml(s: &str) -> Result<Self, Error> {
        let c: Config = toml::from_str(s).map_err(|e| Error::Config(e.to_string()))?;
        c.validate()?;
        Ok(c)
    }

    /// Check configured values are usable
    pub fn validate(&self) -> Result<(), Error> {
        if !(1..=MAX_APDU_DATA).contains(&self.chunk_size) {
            return Err(Error::Config(format!(
                "chunk_size {} outside 1..={MAX_APDU_DATA}",
                self.chunk_size
            )));
        }

        if self.request_timeout_ms == 0 {
            return Err(Error::Config("request_timeout_ms must be non-zero".to_string()));
        }

        self.status_table().map(|_| ())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Build the status table, merging configured names over the defaults
    pub fn status_table(&self) -> Result<StatusTable, Error> {
        let mut t = StatusTable::default();

        for (k, v) in &self.status_names {
            let digits = k.trim_start_matches("0x").trim_start_matches("0X");
            let status = u16::from_str_radix(digits, 16)
                .map_err(|_| Error::Config(format!("invalid status word '{k}'")))?;

            t.insert(status, v);
        }

        Ok(t)
    }
}

/// Status word names used when reporting exchange errors
#[derive(Clone, PartialEq, Debug)]
pub struct StatusTable(BTreeMap<u16, String>);

impl Default for StatusTable {
    fn default() -> Self {
        let names = StatusCode::iter()
            .map(|s| (s as u16, s.to_string()))
            .collect();
        Self(names)
    }
}

impl StatusTable {
    /// Add or replace a status name
    pub fn insert(&mut self, status: u16, name: &str) {
        self.0.insert(status, name.to_string());
    }

    /// Fetch the name for a status word
    pub fn lookup(&self, status: u16) -> Option<&str> {
        self.0.get(&status).map(|s| s.as_str())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn defaults() {
        let c = Config::default();
        assert_eq!(c.chunk_size, 255);
        assert_eq!(c.request_timeout(), Duration::from_secs(2));
        assert!(c.validate().is_ok());

        let t = c.status_table().unwrap();
        assert_eq!(t.lookup(0x6985), Some("DENY"));
        assert_eq!(t.lookup(0xb005), Some("TX_PARSING_FAIL"));
        assert_eq!(t.lookup(0x6a80), None);
    }

    #[test]
    fn load_toml() {
        let c = Config::from_toml(
            r#"
            chunk_size = 128
            trace_apdus = true

            [status_names]
            "0x6a80" = "INVALID_DATA"
            "6985" = "USER_REJECTED"
            "#,
        )
        .unwrap();

        assert_eq!(c.chunk_size, 128);
        assert_eq!(c.request_timeout_ms, 2000);
        assert!(c.trace_apdus);

        let t = c.status_table().unwrap();
        assert_eq!(t.lookup(0x6a80), Some("INVALID_DATA"));
        assert_eq!(t.lookup(0x6985), Some("USER_REJECTED"));
    }

    #[test]
    fn invalid_values() {
        assert!(matches!(
            Config::from_toml("chunk_size = 0"),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            Config::from_toml("chunk_size = 256"),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            Config::from_toml("[status_names]\n\"zz\" = \"X\""),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            Config::from_toml("request_timeout_ms = 0"),
            Err(Error::Config(_))
        ));
        assert!(Config::from_toml("request_timeout_ms = 1").is_ok());
    }
}
