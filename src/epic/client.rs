use super::ImageManifestEntry;
use crate::config::EpicConfig;
use crate::imagery::ImageryApi;
use anyhow::Result;
use chrono::NaiveDate;
use reqwest::Client;
use tracing::debug;
use url::Url;

pub struct EpicClient {
    client: Client,
    config: EpicConfig,
}

impl EpicClient {
    pub fn new(client: Client, config: &EpicConfig) -> Self {
        Self {
            client,
            config: config.clone(),
        }
    }

    pub fn from_config(config: &EpicConfig) -> Self {
        Self::new(Client::new(), config)
    }

    fn with_key(self: &Self, url: &Url) -> Url {
        let mut url = url.clone();
        url.query_pairs_mut()
            .append_pair("api_key", &self.config.api_key);
        url
    }
}

impl ImageryApi for EpicClient {
    async fn fetch_manifest(self: &Self, date: NaiveDate) -> Result<Vec<ImageManifestEntry>> {
        let url = self.config.manifest_url(date)?;
        debug!(%url, "fetching manifest");

        // Errors are stripped of their URL so the api key never reaches a log line
        let entries = self
            .client
            .get(self.with_key(&url))
            .send()
            .await
            .map_err(reqwest::Error::without_url)?
            .error_for_status()
            .map_err(reqwest::Error::without_url)?
            .json::<Vec<ImageManifestEntry>>()
            .await
            .map_err(reqwest::Error::without_url)?;

        debug!(%date, images = entries.len(), "manifest received");
        Ok(entries)
    }

    async fn fetch_image(self: &Self, url: &Url) -> Result<Vec<u8>> {
        debug!(%url, "fetching image");
        let bytes = self
            .client
            .get(self.with_key(url))
            .send()
            .await
            .map_err(reqwest::Error::without_url)?
            .error_for_status()
            .map_err(reqwest::Error::without_url)?
            .bytes()
            .await
            .map_err(reqwest::Error::without_url)?;
        Ok(bytes.to_vec())
    }
}
