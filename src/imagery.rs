//! The remote capability the acquisition core depends on.
use crate::epic::ImageManifestEntry;
use chrono::NaiveDate;
use url::Url;

pub trait ImageryApi {
    /// Image descriptors published for `date`. An empty vector means the API
    /// has nothing for that day; transport errors and non-2xx statuses are `Err`.
    async fn fetch_manifest(self: &Self, date: NaiveDate) -> anyhow::Result<Vec<ImageManifestEntry>>;

    async fn fetch_image(self: &Self, url: &Url) -> anyhow::Result<Vec<u8>>;
}
