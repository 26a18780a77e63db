use chrono::NaiveDate;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AcquisitionError {
    #[error("Invalid date format: '{0}'. Please use the format YYYY-MM-DD.")]
    InvalidDateFormat(String),

    #[error("Failed to fetch images from the API for {date}: {reason}")]
    FetchFailed { date: NaiveDate, reason: String },

    #[error("No pictures found in the {days} days before {from}")]
    LookbackExhausted { from: NaiveDate, days: u32 },

    #[error(
        "Cannot write to {}. Please make sure the directory exists and you have the necessary permissions.",
        .0.display()
    )]
    RootNotWritable(PathBuf),

    #[error("Unable to create directory {}: {source}", .path.display())]
    DirectoryCreateFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("The process was aborted by user; {} was left untouched.", .0.display())]
    AbortedByUser(PathBuf),

    #[error("Unable to build the download plan: {0}")]
    PlanFailed(String),

    #[error("Failed to fetch image {image} after saving {saved}: {reason}")]
    BatchAborted {
        saved: usize,
        image: String,
        reason: String,
    },
}
