use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub split: SplitConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SplitConfig {
    /// Directory segments are written into
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// File name of the init segment
    #[serde(default = "default_init_segment")]
    pub init_segment: String,

    /// File name pattern of media segments
    #[serde(default = "default_media_segment")]
    pub media_segment: String,

    /// Number given to the first media segment
    #[serde(default = "default_start_number")]
    pub start_number: u32,

    /// Tracks to keep (empty = all); the first one starts segments
    #[serde(default)]
    pub track_ids: Vec<u32>,

    /// Fail on undecodable trailing data instead of stopping there
    #[serde(default)]
    pub strict: bool,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_init_segment() -> String {
    "init.mp4".to_string()
}

fn default_media_segment() -> String {
    "segment-{track}.{number:04}.m4s".to_string()
}

fn default_start_number() -> u32 {
    1
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            init_segment: default_init_segment(),
            media_segment: default_media_segment(),
            start_number: default_start_number(),
            track_ids: Vec::new(),
            strict: false,
        }
    }
}
