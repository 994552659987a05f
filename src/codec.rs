use crate::error::{ConvertError, Result};
use crate::ffmpeg::FfmpegCodec;
use crate::formats::{MediaKind, OutputFormat};
use crate::image_codec::ImageCodec;
use crate::policy::EncodeParams;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// What a codec learned about an input without encoding it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MediaProbe {
    pub width: u32,
    pub height: u32,
    pub frame_count: u32,
    pub kind: MediaKind,
}

impl MediaProbe {
    /// Multi-frame content whose frame sequence must survive conversion.
    pub fn is_animated(&self) -> bool {
        self.kind == MediaKind::Video || self.frame_count > 1
    }
}

/// The capability the batch driver calls through. One call per file, no retries.
pub trait Codec {
    /// Reads dimensions and frame count, failing with `UnreadableInput`.
    fn probe(&self, input: &Path) -> Result<MediaProbe>;

    /// Encodes `input` into `output` and returns the size written.
    ///
    /// Implementations must never touch `input` and must not replace an
    /// existing `output`.
    fn encode(&self, input: &Path, output: &Path, params: &EncodeParams) -> Result<u64>;
}

/// Routes each input to the adapter that can handle it: still and animated
/// WebP plus still AVIF go through the `image`/`webp` crates, videos and
/// animated AVIF go through ffmpeg.
#[derive(Debug, Default)]
pub struct MediaCodec {
    image: ImageCodec,
    ffmpeg: FfmpegCodec,
}

impl MediaCodec {
    fn needs_ffmpeg(input: &Path, params: Option<&EncodeParams>) -> bool {
        if MediaKind::from_path(input) == Some(MediaKind::Video) {
            return true;
        }
        params.is_some_and(|p| p.animated && p.format == OutputFormat::Avif)
    }
}

impl Codec for MediaCodec {
    fn probe(&self, input: &Path) -> Result<MediaProbe> {
        if Self::needs_ffmpeg(input, None) {
            self.ffmpeg.probe(input)
        } else {
            self.image.probe(input)
        }
    }

    fn encode(&self, input: &Path, output: &Path, params: &EncodeParams) -> Result<u64> {
        if Self::needs_ffmpeg(input, Some(params)) {
            self.ffmpeg.encode(input, output, params)
        } else {
            self.image.encode(input, output, params)
        }
    }
}

/// Creates a temporary file beside `output` so the final rename stays on one
/// filesystem.
pub(crate) fn staging_file(input: &Path, output: &Path) -> Result<NamedTempFile> {
    let parent = output
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let suffix = output
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default();

    tempfile::Builder::new()
        .prefix(".img-convert-")
        .suffix(&suffix)
        .tempfile_in(parent)
        .map_err(|e| ConvertError::encode_failure(input, e))
}

/// Moves a finished staging file to `output`. Fails instead of replacing a
/// file that appeared at `output` in the meantime.
pub(crate) fn commit_staged(input: &Path, staged: NamedTempFile, output: &Path) -> Result<u64> {
    let size = staged.as_file().metadata()?.len();
    staged
        .persist_noclobber(output)
        .map_err(|e| ConvertError::encode_failure(input, e.error))?;
    Ok(size)
}

/// Writes encoded bytes to `output` through a staging file.
pub(crate) fn write_output(input: &Path, output: &Path, bytes: &[u8]) -> Result<u64> {
    let mut staged = staging_file(input, output)?;
    staged
        .write_all(bytes)
        .and_then(|_| staged.flush())
        .map_err(|e| ConvertError::encode_failure(input, e))?;
    commit_staged(input, staged, output)
}
