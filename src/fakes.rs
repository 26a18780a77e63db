//! In-memory `ImageryApi` for tests.
//!
//! `MemoryImagery` serves canned manifests and image bytes and records every
//! call so tests can assert on what was (or was not) requested.

use crate::epic::ImageManifestEntry;
use crate::imagery::ImageryApi;
use anyhow::{anyhow, Result};
use chrono::NaiveDate;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use url::Url;

#[derive(Debug, Default)]
pub struct MemoryImagery {
    manifests: HashMap<NaiveDate, Vec<ImageManifestEntry>>,
    failing_dates: HashSet<NaiveDate>,
    images: HashMap<String, Vec<u8>>,
    manifest_calls: Mutex<Vec<NaiveDate>>,
    image_calls: Mutex<Vec<Url>>,
}

impl MemoryImagery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish `entries` for `date`. Dates never published answer with an empty manifest.
    pub fn with_manifest(mut self, date: NaiveDate, entries: Vec<ImageManifestEntry>) -> Self {
        self.manifests.insert(date, entries);
        self
    }

    pub fn with_failing_manifest(mut self, date: NaiveDate) -> Self {
        self.failing_dates.insert(date);
        self
    }

    /// Serve `bytes` for the image whose archive file name matches `entry`.
    pub fn with_image(mut self, entry: &ImageManifestEntry, bytes: &[u8]) -> Self {
        self.images.insert(entry.file_name(), bytes.to_vec());
        self
    }

    /// Publish `entries` for `date` and serve a small payload for each of them.
    pub fn with_day(self, date: NaiveDate, entries: Vec<ImageManifestEntry>) -> Self {
        let served = entries.iter().fold(self, |api, entry| {
            let payload = format!("PNG:{}", entry.image_id);
            api.with_image(entry, payload.as_bytes())
        });
        served.with_manifest(date, entries)
    }

    pub fn manifest_calls(self: &Self) -> Vec<NaiveDate> {
        self.manifest_calls.lock().unwrap().clone()
    }

    pub fn image_calls(self: &Self) -> Vec<Url> {
        self.image_calls.lock().unwrap().clone()
    }
}

impl ImageryApi for MemoryImagery {
    async fn fetch_manifest(self: &Self, date: NaiveDate) -> Result<Vec<ImageManifestEntry>> {
        self.manifest_calls.lock().unwrap().push(date);
        if self.failing_dates.contains(&date) {
            return Err(anyhow!("HTTP status server error (503 Service Unavailable)"));
        }
        Ok(self.manifests.get(&date).cloned().unwrap_or_default())
    }

    async fn fetch_image(self: &Self, url: &Url) -> Result<Vec<u8>> {
        self.image_calls.lock().unwrap().push(url.clone());
        self.images
            .iter()
            .find(|(name, _)| url.path().ends_with(&format!("/png/{name}")))
            .map(|(_, bytes)| bytes.clone())
            .ok_or_else(|| anyhow!("HTTP status client error (404 Not Found)"))
    }
}

/// `count` distinct entries captured on `date`, named the way the archive names them.
pub fn entries_for(date: NaiveDate, count: usize) -> Vec<ImageManifestEntry> {
    (0..count)
        .map(|i| {
            let captured = date
                .and_hms_opt(0, 31, 45)
                .unwrap()
                + chrono::Duration::hours(i as i64 * 2);
            let id = format!("epic_1b_{}", captured.format("%Y%m%d%H%M%S"));
            ImageManifestEntry::new(&id, captured)
        })
        .collect()
}
