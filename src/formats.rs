/// Output formats and input media classification
///
/// This module replaces string-based format handling with enums, and decides
/// from a file extension whether an input is a still image or a video.

use crate::constants::{
    DEFAULT_AVIF_EFFORT, DEFAULT_AVIF_QUALITY, DEFAULT_WEBP_EFFORT, DEFAULT_WEBP_QUALITY,
    IMAGE_EXTENSIONS, MAX_AVIF_EFFORT, MAX_WEBP_EFFORT, VIDEO_EXTENSIONS,
};
use crate::error::{ConvertError, Result};
use serde::Serialize;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Supported output formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// WebP, lossy or lossless, animation capable
    #[default]
    WebP,
    /// AVIF (AV1 still or sequence)
    Avif,
}

impl OutputFormat {
    /// Returns the file extension for this format
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::WebP => "webp",
            OutputFormat::Avif => "avif",
        }
    }

    /// Highest effort value the encoder accepts
    pub fn max_effort(&self) -> u8 {
        match self {
            OutputFormat::WebP => MAX_WEBP_EFFORT,
            OutputFormat::Avif => MAX_AVIF_EFFORT,
        }
    }

    pub fn default_quality(&self) -> u8 {
        match self {
            OutputFormat::WebP => DEFAULT_WEBP_QUALITY,
            OutputFormat::Avif => DEFAULT_AVIF_QUALITY,
        }
    }

    pub fn default_effort(&self) -> u8 {
        match self {
            OutputFormat::WebP => DEFAULT_WEBP_EFFORT,
            OutputFormat::Avif => DEFAULT_AVIF_EFFORT,
        }
    }

    /// Parse a CLI token, returning `None` when it is not a format name
    pub fn parse_token(token: &str) -> Option<Self> {
        OutputFormat::from_str(token).ok()
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OutputFormat::WebP => "WebP",
            OutputFormat::Avif => "AVIF",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for OutputFormat {
    type Err = ConvertError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "webp" => Ok(OutputFormat::WebP),
            "avif" => Ok(OutputFormat::Avif),
            _ => Err(ConvertError::UnsupportedFormat(s.to_string())),
        }
    }
}

/// What kind of source a file is, judged by its extension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = lowercase_extension(path)?;
        if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
            Some(MediaKind::Image)
        } else if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
            Some(MediaKind::Video)
        } else {
            None
        }
    }
}

/// Lowercased extension of `path`, if it has a UTF-8 one
pub fn lowercase_extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase())
}
