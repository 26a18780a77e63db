use anyhow::{ensure, Result};
use clap::Parser;
use epic_fetch::acquisition::{Acquisition, AcquisitionRequest, AcquisitionResult, Progress};
use epic_fetch::config::{EpicConfig, API_KEY_ENV};
use epic_fetch::download_plan::DownloadOutcome;
use epic_fetch::epic::{Collection, EpicClient};
use epic_fetch::{logging, prompt};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// Downloads NASA EPIC images of a given day and puts them into a given folder
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Target folder for images
    target_folder: PathBuf,

    /// Date for images (YYYY-MM-DD); defaults to the last day with pictures
    date: Option<String>,

    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long, value_enum)]
    collection: Option<Collection>,

    /// Days an undated run may step back before giving up (0 = no limit)
    #[arg(long)]
    max_lookback: Option<u32>,

    /// Write the download plan as JSON to this path before downloading
    #[arg(long)]
    plan: Option<PathBuf>,

    /// Overwrite an existing day folder without asking
    #[arg(short, long)]
    yes: bool,

    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    logging::init(args.verbose);

    match run(args).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<ExitCode> {
    let mut config = match &args.config {
        Some(path) => EpicConfig::read(path)?,
        None => EpicConfig::default(),
    }
    .with_env_key();
    if let Some(collection) = args.collection {
        config.collection = collection;
    }
    if let Some(days) = args.max_lookback {
        config.max_lookback_days = days;
    }
    ensure!(
        !config.api_key.is_empty(),
        "No API key: set {API_KEY_ENV} or api_key in the configuration file"
    );

    let mut acquisition = Acquisition::new(EpicClient::from_config(&config), &config)?;
    if let Some(plan) = args.plan {
        acquisition = acquisition.with_plan_output(plan);
    }

    let request = AcquisitionRequest::new(args.target_folder, args.date.as_deref());
    let assume_yes = args.yes;
    let confirm = || {
        let overwrite = assume_yes || prompt::confirm_overwrite();
        if overwrite {
            println!("Overwriting the folder.");
        }
        overwrite
    };

    let result = acquisition.run(&request, confirm, report).await;
    let code = match result {
        AcquisitionResult::Success { .. } => {
            println!("Images downloaded and saved successfully.");
            ExitCode::SUCCESS
        }
        AcquisitionResult::NoData { date } => {
            println!("There are no pictures for this point in time ({date}).");
            ExitCode::FAILURE
        }
        AcquisitionResult::Failure(e) => {
            println!("{e}");
            ExitCode::FAILURE
        }
    };
    Ok(code)
}

fn report(progress: Progress<'_>) {
    match progress {
        Progress::LatestAvailable(date) => {
            println!("Pictures from the last available day are from {date}")
        }
        Progress::Downloading { count, date } => println!("Downloading {count} images from {date}"),
        Progress::Image(DownloadOutcome::Saved(path)) => {
            println!("-> Successfully saved image {}", file_label(path))
        }
        Progress::Image(DownloadOutcome::SaveFailed { path, reason }) => {
            println!("Failed to save image {}: {reason}", file_label(path))
        }
        Progress::Image(DownloadOutcome::FetchFailed { image, .. }) => {
            println!("Failed to fetch image {image} from the API.")
        }
    }
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
