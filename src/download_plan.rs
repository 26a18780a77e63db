use crate::epic::ImageManifestEntry;
use crate::imagery::ImageryApi;
use anyhow::{anyhow, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use url::Url;

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct DownloadTask {
    pub image: String,
    pub url: Url,
    /// `None` when the image id would resolve outside the day folder.
    pub output: Option<PathBuf>,
}

impl DownloadTask {
    pub fn new(entry: &ImageManifestEntry, archive_base: &Url, subfolder: &Path) -> Result<Self> {
        let mut url = archive_base.clone();
        url.path_segments_mut()
            .map_err(|_| anyhow!("Archive URL cannot carry a path: {}", archive_base))?
            .pop_if_empty()
            .extend(entry.date_path().split('/'))
            .push("png")
            .extend(entry.file_segments());

        Ok(DownloadTask {
            image: entry.image_id.clone(),
            url,
            output: entry.local_path().map(|relative| subfolder.join(relative)),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DownloadOutcome {
    Saved(PathBuf),
    SaveFailed { path: PathBuf, reason: String },
    FetchFailed { image: String, reason: String },
}

impl DownloadOutcome {
    pub fn is_saved(self: &Self) -> bool {
        matches!(self, Self::Saved(_))
    }
}

#[derive(Deserialize, Serialize, Debug)]
pub struct DownloadPlan {
    date: NaiveDate,
    tasks: Vec<DownloadTask>,
}

impl DownloadPlan {
    /// One task per manifest entry, in manifest order.
    pub fn new(
        date: NaiveDate,
        manifest: &[ImageManifestEntry],
        archive_base: &Url,
        subfolder: &Path,
    ) -> Result<Self> {
        let tasks = manifest
            .iter()
            .map(|entry| DownloadTask::new(entry, archive_base, subfolder))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { date, tasks })
    }

    pub fn date(self: &Self) -> NaiveDate {
        self.date
    }

    pub fn tasks(self: &Self) -> &[DownloadTask] {
        &self.tasks
    }

    pub fn read<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let plan: Self = serde_json::from_str(&content)?;
        Ok(plan)
    }

    pub fn write<P: AsRef<Path>>(self: &Self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Fetch and save every task in order.
    ///
    /// A failed save is recorded and the next task runs. A failed or empty
    /// fetch is recorded and ends the pass; the returned outcomes stop there.
    pub async fn execute(
        self: &Self,
        api: &impl ImageryApi,
        mut report: impl FnMut(&DownloadOutcome),
    ) -> Vec<DownloadOutcome> {
        let mut outcomes = Vec::with_capacity(self.tasks.len());
        for task in self.tasks.iter() {
            debug!(image = %task.image, "current task");
            let outcome = match &task.output {
                Some(output) => fetch_and_save(api, task, output).await,
                None => {
                    warn!(image = %task.image, "image id leaves the day folder, skipped");
                    DownloadOutcome::SaveFailed {
                        path: PathBuf::from(&task.image),
                        reason: "image id does not name a file inside the day folder".to_string(),
                    }
                }
            };

            report(&outcome);
            let fatal = matches!(outcome, DownloadOutcome::FetchFailed { .. });
            outcomes.push(outcome);
            if fatal {
                warn!(image = %task.image, "image fetch failed, abandoning the batch");
                break;
            }
        }
        outcomes
    }
}

async fn fetch_and_save(
    api: &impl ImageryApi,
    task: &DownloadTask,
    output: &Path,
) -> DownloadOutcome {
    match api.fetch_image(&task.url).await {
        Ok(bytes) if bytes.is_empty() => DownloadOutcome::FetchFailed {
            image: task.image.clone(),
            reason: "empty response body".to_string(),
        },
        Ok(bytes) => save(output, &bytes),
        Err(e) => DownloadOutcome::FetchFailed {
            image: task.image.clone(),
            reason: format!("{e:#}"),
        },
    }
}

fn save(path: &Path, bytes: &[u8]) -> DownloadOutcome {
    match fs::write(path, bytes) {
        Ok(()) => {
            info!(path = %path.display(), bytes = bytes.len(), "image saved");
            DownloadOutcome::Saved(path.to_path_buf())
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to save image");
            DownloadOutcome::SaveFailed {
                path: path.to_path_buf(),
                reason: e.to_string(),
            }
        }
    }
}
