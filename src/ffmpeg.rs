//! Video and animated-AVIF conversion through the `ffmpeg` / `ffprobe` binaries.

use crate::codec::{commit_staged, staging_file, Codec, MediaProbe};
use crate::constants::{FFMPEG_BIN, FFPROBE_BIN, MAX_AVIF_EFFORT, MAX_QUALITY};
use crate::error::{ConvertError, Result};
use crate::formats::{MediaKind, OutputFormat};
use crate::policy::EncodeParams;
use serde::Deserialize;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Instant;
use tracing::debug;

/// libaom's CRF scale runs 0 (lossless) to 63 (worst).
const AOM_MAX_CRF: u32 = 63;
/// libaom `-cpu-used` runs 0 (slowest) to 8 (fastest).
const AOM_MAX_CPU_USED: u8 = 8;

#[derive(Debug, Clone)]
pub struct FfmpegCodec {
    ffmpeg: PathBuf,
    ffprobe: PathBuf,
}

impl Default for FfmpegCodec {
    fn default() -> Self {
        Self::new(FFMPEG_BIN, FFPROBE_BIN)
    }
}

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    width: Option<u32>,
    height: Option<u32>,
    nb_frames: Option<String>,
}

impl FfmpegCodec {
    pub fn new(ffmpeg: impl Into<PathBuf>, ffprobe: impl Into<PathBuf>) -> Self {
        Self {
            ffmpeg: ffmpeg.into(),
            ffprobe: ffprobe.into(),
        }
    }

    /// Encoder arguments placed between `-i <input>` and the output path.
    pub fn encoder_args(params: &EncodeParams) -> Vec<String> {
        let mut args: Vec<String> = vec!["-an".into()];
        match params.format {
            OutputFormat::WebP => {
                args.extend([
                    "-c:v".into(),
                    "libwebp_anim".into(),
                    "-quality".into(),
                    params.quality.to_string(),
                    "-compression_level".into(),
                    params.effort.to_string(),
                    "-lossless".into(),
                    u8::from(params.lossless).to_string(),
                    "-f".into(),
                    "webp".into(),
                ]);
            }
            OutputFormat::Avif => {
                args.extend([
                    "-c:v".into(),
                    "libaom-av1".into(),
                    "-crf".into(),
                    aom_crf(params).to_string(),
                    "-b:v".into(),
                    "0".into(),
                    "-cpu-used".into(),
                    aom_cpu_used(params.effort).to_string(),
                    "-f".into(),
                    "avif".into(),
                ]);
            }
        }
        args.extend(["-loop".into(), params.loop_count.to_string()]);
        args
    }

    /// Runs a tool to completion, returning stdout or a readable failure reason.
    fn run(program: &Path, args: &[OsString]) -> std::result::Result<Vec<u8>, String> {
        let output = Command::new(program)
            .args(args)
            .output()
            .map_err(|e| format!("failed to execute {}: {}", program.display(), e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(format!(
                "{} exited with {}: {}",
                program.display(),
                output.status,
                stderr.trim()
            ));
        }
        Ok(output.stdout)
    }
}

impl Codec for FfmpegCodec {
    fn probe(&self, input: &Path) -> Result<MediaProbe> {
        let args: Vec<OsString> = vec![
            "-v".into(),
            "error".into(),
            "-select_streams".into(),
            "v:0".into(),
            "-show_entries".into(),
            "stream=width,height,nb_frames".into(),
            "-print_format".into(),
            "json".into(),
            input.into(),
        ];
        let stdout =
            Self::run(&self.ffprobe, &args).map_err(|e| ConvertError::unreadable(input, e))?;

        parse_probe(input, &stdout)
    }

    fn encode(&self, input: &Path, output: &Path, params: &EncodeParams) -> Result<u64> {
        let staged = staging_file(input, output)?;

        let mut args: Vec<OsString> = vec![
            "-hide_banner".into(),
            "-loglevel".into(),
            "error".into(),
            "-y".into(),
            "-i".into(),
            input.into(),
        ];
        args.extend(Self::encoder_args(params).into_iter().map(OsString::from));
        args.push(staged.path().into());

        debug!("{} {:?}", self.ffmpeg.display(), args);
        let start_time = Instant::now();
        Self::run(&self.ffmpeg, &args).map_err(|e| ConvertError::encode_failure(input, e))?;
        debug!(
            "ffmpeg finished {} in {:.1}s",
            input.display(),
            start_time.elapsed().as_secs_f64()
        );

        commit_staged(input, staged, output)
    }
}

fn parse_probe(input: &Path, stdout: &[u8]) -> Result<MediaProbe> {
    let parsed: ProbeOutput =
        serde_json::from_slice(stdout).map_err(|e| ConvertError::unreadable(input, e))?;
    let stream = parsed
        .streams
        .into_iter()
        .next()
        .ok_or_else(|| ConvertError::unreadable(input, "no video stream"))?;

    let frame_count = stream
        .nb_frames
        .as_deref()
        .and_then(|n| n.parse::<u32>().ok())
        .unwrap_or(1);

    Ok(MediaProbe {
        width: stream.width.unwrap_or(0),
        height: stream.height.unwrap_or(0),
        frame_count,
        kind: MediaKind::from_path(input).unwrap_or(MediaKind::Video),
    })
}

fn aom_crf(params: &EncodeParams) -> u32 {
    if params.lossless {
        return 0;
    }
    let quality = u32::from(params.quality.min(MAX_QUALITY));
    AOM_MAX_CRF - quality * AOM_MAX_CRF / u32::from(MAX_QUALITY)
}

fn aom_cpu_used(effort: u8) -> u8 {
    MAX_AVIF_EFFORT
        .saturating_sub(effort)
        .min(AOM_MAX_CPU_USED)
}
