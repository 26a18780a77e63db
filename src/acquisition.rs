//! End-to-end acquisition of one day of imagery.
//!
//! A run resolves the date to fetch, stages `<root>/<YYYY-MM-DD>`, then
//! downloads the day's images into it. Every failure ends the run as
//! [`AcquisitionResult::Failure`]; nothing is raised past [`Acquisition::run`].

use crate::config::EpicConfig;
use crate::date_resolver::DateResolver;
use crate::download_plan::{DownloadOutcome, DownloadPlan};
use crate::error::AcquisitionError;
use crate::imagery::ImageryApi;
use crate::staging;
use anyhow::Result;
use chrono::{Local, NaiveDate};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use url::Url;

#[derive(Debug, Clone)]
pub struct AcquisitionRequest {
    root_folder: PathBuf,
    requested_date: Option<String>,
}

impl AcquisitionRequest {
    /// `requested_date` of `None` means today, stepping back until a day has pictures.
    pub fn new(root_folder: impl Into<PathBuf>, requested_date: Option<&str>) -> Self {
        Self {
            root_folder: root_folder.into(),
            requested_date: requested_date.map(str::to_string),
        }
    }

    pub fn root_folder(self: &Self) -> &Path {
        &self.root_folder
    }

    pub fn requested_date(self: &Self) -> Option<&str> {
        self.requested_date.as_deref()
    }
}

#[derive(Debug)]
pub enum AcquisitionResult {
    Success { saved: usize, date: NaiveDate },
    NoData { date: NaiveDate },
    Failure(AcquisitionError),
}

impl AcquisitionResult {
    pub fn is_success(self: &Self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// Progress notifications, in the order they happen during a run.
#[derive(Debug)]
pub enum Progress<'a> {
    /// An undated run settled on this day.
    LatestAvailable(NaiveDate),
    Downloading { count: usize, date: NaiveDate },
    Image(&'a DownloadOutcome),
}

pub struct Acquisition<A> {
    api: A,
    resolver: DateResolver,
    archive_base: Url,
    plan_output: Option<PathBuf>,
}

impl<A: ImageryApi> Acquisition<A> {
    pub fn new(api: A, config: &EpicConfig) -> Result<Self> {
        Ok(Self {
            api,
            resolver: DateResolver::new(config.max_lookback_days),
            archive_base: config.archive_base()?,
            plan_output: None,
        })
    }

    /// Also write the download plan as JSON to `path` before executing it.
    pub fn with_plan_output(mut self, path: impl Into<PathBuf>) -> Self {
        self.plan_output = Some(path.into());
        self
    }

    pub fn api(self: &Self) -> &A {
        &self.api
    }

    pub async fn run(
        self: &Self,
        request: &AcquisitionRequest,
        confirm_overwrite: impl FnOnce() -> bool,
        progress: impl FnMut(Progress<'_>),
    ) -> AcquisitionResult {
        let today = Local::now().date_naive();
        self.run_on(request, today, confirm_overwrite, progress).await
    }

    /// [`Self::run`] with an explicit notion of "today".
    pub async fn run_on(
        self: &Self,
        request: &AcquisitionRequest,
        today: NaiveDate,
        confirm_overwrite: impl FnOnce() -> bool,
        progress: impl FnMut(Progress<'_>),
    ) -> AcquisitionResult {
        match self.try_run(request, today, confirm_overwrite, progress).await {
            Ok(result) => {
                info!(?result, "acquisition finished");
                result
            }
            Err(e) => {
                warn!(error = %e, "acquisition failed");
                AcquisitionResult::Failure(e)
            }
        }
    }

    async fn try_run(
        self: &Self,
        request: &AcquisitionRequest,
        today: NaiveDate,
        confirm_overwrite: impl FnOnce() -> bool,
        mut progress: impl FnMut(Progress<'_>),
    ) -> Result<AcquisitionResult, AcquisitionError> {
        let resolved = self
            .resolver
            .resolve(request.requested_date(), today, &self.api)
            .await?;
        let date = resolved.date;

        if resolved.manifest.is_empty() {
            return Ok(AcquisitionResult::NoData { date });
        }
        if !resolved.explicit {
            progress(Progress::LatestAvailable(date));
        }

        let subfolder = staging::stage(request.root_folder(), date, confirm_overwrite)?;

        let plan = DownloadPlan::new(date, &resolved.manifest, &self.archive_base, &subfolder)
            .map_err(|e| AcquisitionError::PlanFailed(format!("{e:#}")))?;
        if let Some(path) = &self.plan_output {
            if let Err(e) = plan.write(path) {
                warn!(path = %path.display(), error = %e, "could not write download plan");
            }
        }

        progress(Progress::Downloading {
            count: plan.tasks().len(),
            date,
        });
        let outcomes = plan
            .execute(&self.api, |outcome| progress(Progress::Image(outcome)))
            .await;

        let saved = outcomes.iter().filter(|o| o.is_saved()).count();
        if let Some(DownloadOutcome::FetchFailed { image, reason }) = outcomes.last() {
            return Err(AcquisitionError::BatchAborted {
                saved,
                image: image.clone(),
                reason: reason.clone(),
            });
        }
        Ok(AcquisitionResult::Success { saved, date })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::{entries_for, MemoryImagery};
    use tempfile::TempDir;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn acquisition(api: MemoryImagery) -> Acquisition<MemoryImagery> {
        Acquisition::new(api, &EpicConfig::default()).unwrap()
    }

    #[tokio::test]
    async fn test_progress_sequence_for_undated_run() {
        let root = TempDir::new().unwrap();
        let today = ymd(2023, 11, 16);
        let api = MemoryImagery::new().with_day(ymd(2023, 11, 15), entries_for(ymd(2023, 11, 15), 2));
        let request = AcquisitionRequest::new(root.path(), None);

        let mut events = vec![];
        let result = acquisition(api)
            .run_on(&request, today, || true, |p| {
                events.push(match p {
                    Progress::LatestAvailable(d) => format!("latest {d}"),
                    Progress::Downloading { count, date } => format!("downloading {count} {date}"),
                    Progress::Image(o) => format!("saved {}", o.is_saved()),
                })
            })
            .await;

        assert!(matches!(result, AcquisitionResult::Success { saved: 2, date } if date == ymd(2023, 11, 15)));
        assert_eq!(
            events,
            vec![
                "latest 2023-11-15",
                "downloading 2 2023-11-15",
                "saved true",
                "saved true"
            ]
        );
    }

    #[tokio::test]
    async fn test_batch_abort_reports_saved_count() {
        let root = TempDir::new().unwrap();
        let date = ymd(2023, 11, 15);
        let entries = entries_for(date, 3);
        let api = MemoryImagery::new()
            .with_manifest(date, entries.clone())
            .with_image(&entries[0], b"PNG")
            .with_image(&entries[1], b"PNG");
        let request = AcquisitionRequest::new(root.path(), Some("2023-11-15"));

        let result = acquisition(api).run_on(&request, date, || true, |_| {}).await;

        match result {
            AcquisitionResult::Failure(AcquisitionError::BatchAborted { saved, image, .. }) => {
                assert_eq!(saved, 2);
                assert_eq!(image, entries[2].image_id);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_plan_output_written() {
        let root = TempDir::new().unwrap();
        let date = ymd(2023, 11, 15);
        let api = MemoryImagery::new().with_day(date, entries_for(date, 2));
        let plan_path = root.path().join("download_plan.json");
        let request = AcquisitionRequest::new(root.path(), Some("2023-11-15"));

        let result = acquisition(api)
            .with_plan_output(&plan_path)
            .run_on(&request, date, || true, |_| {})
            .await;

        assert!(result.is_success());
        let plan = DownloadPlan::read(&plan_path).unwrap();
        assert_eq!(plan.date(), date);
        assert_eq!(plan.tasks().len(), 2);
    }
}
