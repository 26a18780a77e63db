mod client;
mod manifest;
pub use client::EpicClient;
pub use manifest::ImageManifestEntry;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const DEFAULT_API_BASE: &str = "https://api.nasa.gov/EPIC/";

/// Image types served by the EPIC archive.
#[derive(Deserialize, Serialize, ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Collection {
    #[default]
    Natural,
    Enhanced,
    Aerosol,
    Cloud,
}

impl Collection {
    pub fn key(self: &Self) -> &str {
        match self {
            Self::Natural => "natural",
            Self::Enhanced => "enhanced",
            Self::Aerosol => "aerosol",
            Self::Cloud => "cloud",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}
