use crate::cli::Args;
use crate::constants::{
    DEFAULT_ANIMATED_EFFORT_CEILING, IMAGE_EXTENSIONS, MAX_QUALITY, VIDEO_EXTENSIONS,
};
use crate::error::{ConvertError, Result};
use crate::formats::OutputFormat;
use std::collections::BTreeSet;
use std::path::PathBuf;

/// Where the work set comes from. The two modes never mix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Discovery {
    /// Recursively scan this directory
    Root(PathBuf),
    /// Convert exactly these files or glob patterns (never empty)
    Files(Vec<String>),
}

/// Immutable settings for one run.
#[derive(Debug, Clone)]
pub struct Config {
    pub discovery: Discovery,
    pub allowed_extensions: BTreeSet<String>,
    pub format: OutputFormat,
    pub quality: u8,
    pub effort: u8,
    pub lossless: bool,
    pub animated_effort_ceiling: u8,
}

impl Config {
    /// Builds a validated config. Missing quality/effort fall back to the
    /// format's defaults; out-of-range values are rejected.
    pub fn new(
        discovery: Discovery,
        format: OutputFormat,
        quality: Option<u8>,
        effort: Option<u8>,
        lossless: bool,
        include_video: bool,
    ) -> Result<Self> {
        let quality = quality.unwrap_or_else(|| format.default_quality());
        if quality > MAX_QUALITY {
            return Err(ConvertError::InvalidQuality(quality));
        }

        let effort = effort.unwrap_or_else(|| format.default_effort());
        validate_effort(effort, format)?;

        // Files already in the target format have nothing to convert into
        let mut extensions = allowed_extensions(include_video);
        extensions.remove(format.extension());

        Ok(Self {
            discovery,
            allowed_extensions: extensions,
            format,
            quality,
            effort,
            lossless,
            animated_effort_ceiling: DEFAULT_ANIMATED_EFFORT_CEILING.min(format.max_effort()),
        })
    }

    pub fn with_animated_effort_ceiling(mut self, ceiling: u8) -> Result<Self> {
        validate_effort(ceiling, self.format)?;
        self.animated_effort_ceiling = ceiling;
        Ok(self)
    }

    /// Merges CLI flags over environment values over format defaults.
    pub fn from_args(args: &Args) -> Result<Self> {
        let (format, files) = args.split_targets();
        let format = format.unwrap_or_default();

        let discovery = if files.is_empty() {
            Discovery::Root(args.dir.clone())
        } else {
            Discovery::Files(files)
        };

        let (env_quality, env_effort) = match format {
            OutputFormat::WebP => (args.webp_quality, args.webp_effort),
            OutputFormat::Avif => (args.avif_quality, args.avif_effort),
        };
        Config::new(
            discovery,
            format,
            args.quality.or(env_quality),
            args.effort.or(env_effort),
            args.lossless,
            args.video,
        )?
        .with_animated_effort_ceiling(args.animated_effort_ceiling)
    }
}

fn validate_effort(effort: u8, format: OutputFormat) -> Result<()> {
    let max = format.max_effort();
    if effort > max {
        return Err(ConvertError::InvalidEffort {
            effort,
            format,
            max,
        });
    }
    Ok(())
}

pub fn allowed_extensions(include_video: bool) -> BTreeSet<String> {
    let mut extensions: BTreeSet<String> =
        IMAGE_EXTENSIONS.iter().map(|ext| ext.to_string()).collect();
    if include_video {
        extensions.extend(VIDEO_EXTENSIONS.iter().map(|ext| ext.to_string()));
    }
    extensions
}
