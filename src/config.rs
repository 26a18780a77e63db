use crate::epic::{Collection, DEFAULT_API_BASE};
use anyhow::{anyhow, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use url::Url;

pub const API_KEY_ENV: &str = "NASA_API_KEY";

const DEFAULT_MAX_LOOKBACK_DAYS: u32 = 365;

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct EpicConfig {
    pub api_base: Url,
    pub api_key: String,
    pub collection: Collection,
    /// How many days before today an undated run may step back. `0` means no limit.
    pub max_lookback_days: u32,
}

impl Default for EpicConfig {
    fn default() -> Self {
        Self {
            api_base: Url::parse(DEFAULT_API_BASE).expect("Default API base should always parse"),
            api_key: String::new(),
            collection: Collection::default(),
            max_lookback_days: DEFAULT_MAX_LOOKBACK_DAYS,
        }
    }
}

impl EpicConfig {
    pub fn read<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn write<P: AsRef<Path>>(self: &Self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Replace `api_key` with the value of `NASA_API_KEY` when that variable is set.
    pub fn with_env_key(self) -> Self {
        match std::env::var(API_KEY_ENV) {
            Ok(key) if !key.trim().is_empty() => self.with_api_key(key.trim()),
            _ => self,
        }
    }

    pub fn with_api_key(mut self, key: &str) -> Self {
        self.api_key = key.to_string();
        self
    }

    pub fn manifest_url(self: &Self, date: NaiveDate) -> Result<Url> {
        let path = format!("api/{}/date/{}", self.collection, date.format("%Y-%m-%d"));
        Ok(self.base()?.join(&path)?)
    }

    /// Root under which `<YYYY>/<MM>/<DD>/png/<image>.png` files live.
    pub fn archive_base(self: &Self) -> Result<Url> {
        let path = format!("archive/{}/", self.collection);
        Ok(self.base()?.join(&path)?)
    }

    // `Url::join` drops the last segment unless the base ends with '/'
    fn base(self: &Self) -> Result<Url> {
        if self.api_base.cannot_be_a_base() {
            return Err(anyhow!("API base is not a hierarchical URL: {}", self.api_base));
        }
        let mut base = self.api_base.clone();
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(base)
    }
}
