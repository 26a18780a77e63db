use crate::epic::ImageManifestEntry;
use crate::error::AcquisitionError;
use crate::imagery::ImageryApi;
use chrono::NaiveDate;
use regex::Regex;
use tracing::{debug, info};

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parse a strict `YYYY-MM-DD` calendar date.
pub fn parse_date(input: &str) -> Result<NaiveDate, AcquisitionError> {
    let re = Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("Regex pattern should always compile");
    if !re.is_match(input) {
        return Err(AcquisitionError::InvalidDateFormat(input.to_string()));
    }
    NaiveDate::parse_from_str(input, DATE_FORMAT)
        .map_err(|_| AcquisitionError::InvalidDateFormat(input.to_string()))
}

#[derive(Debug)]
pub struct ResolvedDate {
    pub date: NaiveDate,
    pub manifest: Vec<ImageManifestEntry>,
    /// The caller pinned the date; no fallback was attempted.
    pub explicit: bool,
}

pub struct DateResolver {
    max_lookback_days: u32,
}

impl DateResolver {
    /// `max_lookback_days == 0` lets an undated run step back without limit.
    pub fn new(max_lookback_days: u32) -> Self {
        Self { max_lookback_days }
    }

    pub async fn resolve(
        self: &Self,
        requested: Option<&str>,
        today: NaiveDate,
        api: &impl ImageryApi,
    ) -> Result<ResolvedDate, AcquisitionError> {
        match requested {
            Some(raw) => {
                let date = parse_date(raw)?;
                let manifest = fetch_manifest(api, date).await?;
                Ok(ResolvedDate {
                    date,
                    manifest,
                    explicit: true,
                })
            }
            None => self.latest_available(today, api).await,
        }
    }

    async fn latest_available(
        self: &Self,
        today: NaiveDate,
        api: &impl ImageryApi,
    ) -> Result<ResolvedDate, AcquisitionError> {
        let mut candidate = today;
        let mut days_back = 0;
        loop {
            let manifest = fetch_manifest(api, candidate).await?;
            if !manifest.is_empty() {
                info!(date = %candidate, days_back, "latest available day found");
                return Ok(ResolvedDate {
                    date: candidate,
                    manifest,
                    explicit: false,
                });
            }

            let exhausted = AcquisitionError::LookbackExhausted {
                from: today,
                days: days_back,
            };
            if self.max_lookback_days > 0 && days_back >= self.max_lookback_days {
                return Err(exhausted);
            }
            candidate = candidate.pred_opt().ok_or(exhausted)?;
            days_back += 1;
            debug!(date = %candidate, "no pictures, stepping back one day");
        }
    }
}

async fn fetch_manifest(
    api: &impl ImageryApi,
    date: NaiveDate,
) -> Result<Vec<ImageManifestEntry>, AcquisitionError> {
    api.fetch_manifest(date)
        .await
        .map_err(|e| AcquisitionError::FetchFailed {
            date,
            reason: format!("{e:#}"),
        })
}
