use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};

/// One element of the JSON array returned by `api/<collection>/date/<day>`.
/// The archive sends many more fields per image; only these two are needed.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct ImageManifestEntry {
    #[serde(rename = "date", with = "capture_timestamp")]
    pub captured: NaiveDateTime,
    #[serde(rename = "image")]
    pub image_id: String,
}

impl ImageManifestEntry {
    pub fn new(image_id: &str, captured: NaiveDateTime) -> Self {
        Self {
            image_id: image_id.to_string(),
            captured,
        }
    }

    /// `YYYY/MM/DD` segment of the archive path, taken from the capture date.
    pub fn date_path(self: &Self) -> String {
        self.captured.date().format("%Y-%m-%d").to_string().replace('-', "/")
    }

    /// Remote file name: the identifier with `-` turned into `/`, plus `.png`.
    pub fn file_name(self: &Self) -> String {
        format!("{}.png", self.image_id).replace('-', "/")
    }

    /// Segments of [`Self::file_name`], in order.
    pub fn file_segments(self: &Self) -> Vec<String> {
        self.file_name().split('/').map(str::to_string).collect()
    }

    /// Same transformation as [`Self::file_name`], expressed as a relative local path.
    ///
    /// `None` when a segment is empty, `.`, `..`, absolute or otherwise not a
    /// plain name, since the result would not stay inside the day folder.
    pub fn local_path(self: &Self) -> Option<PathBuf> {
        self.file_segments()
            .iter()
            .map(|segment| {
                let mut components = Path::new(segment).components();
                match (components.next(), components.next()) {
                    (Some(Component::Normal(name)), None) => Some(name.to_owned()),
                    _ => None,
                }
            })
            .collect()
    }
}

mod capture_timestamp {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y-%m-%d %H:%M:%S";

    pub fn serialize<S: Serializer>(ts: &NaiveDateTime, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&ts.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(d)?;
        NaiveDateTime::parse_from_str(&raw, FORMAT).map_err(serde::de::Error::custom)
    }
}
