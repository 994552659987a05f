use crate::codec::Codec;
use crate::config::Config;
use crate::constants::{LOOP_FOREVER, MAX_QUALITY};
use crate::error::Result;
use crate::formats::OutputFormat;
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;

/// One discovered input and where its conversion goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileTask {
    pub input: PathBuf,
    pub output: PathBuf,
}

/// Every encoder knob, always populated. Neutral values stand in for options
/// that do not apply (e.g. `loop_count` on still images).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodeParams {
    pub format: OutputFormat,
    pub quality: u8,
    pub effort: u8,
    pub lossless: bool,
    pub animated: bool,
    pub loop_count: u16,
}

/// Why a task was not encoded. Skips are normal outcomes, not errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// The output file already exists
    AlreadyConverted,
    /// The input already has the target extension; converting would overwrite it
    SameAsInput,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::AlreadyConverted => write!(f, "already converted"),
            SkipReason::SameAsInput => write!(f, "already in target format"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    pub output_path: PathBuf,
    pub skip: Option<SkipReason>,
    pub params: EncodeParams,
}

/// Decides per file what to write, whether to skip, and with which settings.
#[derive(Debug, Clone)]
pub struct ConversionPolicy {
    format: OutputFormat,
    quality: u8,
    effort: u8,
    lossless: bool,
    animated_effort_ceiling: u8,
}

impl ConversionPolicy {
    pub fn new(config: &Config) -> Self {
        Self {
            format: config.format,
            quality: config.quality,
            effort: config.effort,
            lossless: config.lossless,
            animated_effort_ceiling: config.animated_effort_ceiling,
        }
    }

    pub fn task_for(&self, input: impl Into<PathBuf>) -> FileTask {
        let input = input.into();
        let output = output_path_for(&input, self.format);
        FileTask { input, output }
    }

    /// Parameters for a still image.
    pub fn base_params(&self) -> EncodeParams {
        EncodeParams {
            format: self.format,
            // Lossless output ignores quality; pin it so both encoders agree.
            quality: if self.lossless { MAX_QUALITY } else { self.quality },
            effort: self.effort,
            lossless: self.lossless,
            animated: false,
            loop_count: LOOP_FOREVER,
        }
    }

    /// Parameters for multi-frame content: effort capped, animation forced on.
    pub fn animated_params(&self) -> EncodeParams {
        EncodeParams {
            effort: self.effort.min(self.animated_effort_ceiling),
            animated: true,
            ..self.base_params()
        }
    }

    /// Decides for one task. Only unskipped tasks are probed, so a skip never
    /// costs a decode. Probe failures are returned as errors.
    pub fn decide<C: Codec + ?Sized>(&self, task: &FileTask, codec: &C) -> Result<Decision> {
        let skip = if task.output == task.input {
            Some(SkipReason::SameAsInput)
        } else if task.output.exists() {
            Some(SkipReason::AlreadyConverted)
        } else {
            None
        };

        if let Some(reason) = skip {
            debug!("Skipping {}: {}", task.input.display(), reason);
            return Ok(Decision {
                output_path: task.output.clone(),
                skip,
                params: self.base_params(),
            });
        }

        let probe = codec.probe(&task.input)?;
        let params = if probe.is_animated() {
            self.animated_params()
        } else {
            self.base_params()
        };
        debug!(
            "{} ({}x{}, {} frame(s)) -> {} {:?}",
            task.input.display(),
            probe.width,
            probe.height,
            probe.frame_count,
            task.output.display(),
            params
        );

        Ok(Decision {
            output_path: task.output.clone(),
            skip: None,
            params,
        })
    }
}

/// `input` with its extension replaced by the format's extension.
pub fn output_path_for(input: &Path, format: OutputFormat) -> PathBuf {
    input.with_extension(format.extension())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::MediaProbe;
    use crate::config::Discovery;
    use crate::error::ConvertError;
    use crate::formats::MediaKind;
    use std::cell::Cell;
    use std::fs;
    use tempfile::TempDir;

    struct StubCodec {
        frames: u32,
        probes: Cell<usize>,
    }

    impl StubCodec {
        fn new(frames: u32) -> Self {
            Self {
                frames,
                probes: Cell::new(0),
            }
        }
    }

    impl Codec for StubCodec {
        fn probe(&self, _input: &Path) -> Result<MediaProbe> {
            self.probes.set(self.probes.get() + 1);
            if self.frames == 0 {
                return Err(ConvertError::unreadable("x", "corrupt"));
            }
            Ok(MediaProbe {
                width: 4,
                height: 4,
                frame_count: self.frames,
                kind: MediaKind::Image,
            })
        }

        fn encode(&self, _: &Path, _: &Path, _: &EncodeParams) -> Result<u64> {
            unreachable!("the policy never encodes")
        }
    }

    fn policy(format: OutputFormat, effort: u8, lossless: bool) -> ConversionPolicy {
        let config = Config::new(
            Discovery::Root(PathBuf::from(".")),
            format,
            Some(70),
            Some(effort),
            lossless,
            false,
        )
        .unwrap();
        ConversionPolicy::new(&config)
    }

    #[test]
    fn test_output_path_for() {
        assert_eq!(
            output_path_for(Path::new("/a/b/photo.JPG"), OutputFormat::WebP),
            PathBuf::from("/a/b/photo.webp")
        );
        assert_eq!(
            output_path_for(Path::new("archive.tar.png"), OutputFormat::Avif),
            PathBuf::from("archive.tar.avif")
        );
    }

    #[test]
    fn test_decide_converts_when_output_missing() {
        let temp_dir = TempDir::new().unwrap();
        let input = temp_dir.path().join("a.jpg");
        fs::write(&input, b"x").unwrap();

        let policy = policy(OutputFormat::WebP, 6, false);
        let codec = StubCodec::new(1);
        let decision = policy.decide(&policy.task_for(&input), &codec).unwrap();

        assert_eq!(decision.skip, None);
        assert_eq!(decision.output_path, temp_dir.path().join("a.webp"));
        assert_eq!(decision.params.quality, 70);
        assert_eq!(decision.params.effort, 6);
        assert!(!decision.params.animated);
        assert_eq!(codec.probes.get(), 1);
    }

    #[test]
    fn test_decide_skips_existing_output_without_probing() {
        let temp_dir = TempDir::new().unwrap();
        let input = temp_dir.path().join("b.png");
        fs::write(&input, b"x").unwrap();
        fs::write(temp_dir.path().join("b.avif"), b"done").unwrap();

        let policy = policy(OutputFormat::Avif, 4, false);
        let codec = StubCodec::new(0);
        let decision = policy.decide(&policy.task_for(&input), &codec).unwrap();

        assert_eq!(decision.skip, Some(SkipReason::AlreadyConverted));
        assert_eq!(codec.probes.get(), 0);
    }

    #[test]
    fn test_decide_skips_same_extension() {
        let temp_dir = TempDir::new().unwrap();
        let input = temp_dir.path().join("c.webp");
        fs::write(&input, b"x").unwrap();

        let policy = policy(OutputFormat::WebP, 4, false);
        let decision = policy
            .decide(&policy.task_for(&input), &StubCodec::new(1))
            .unwrap();
        assert_eq!(decision.skip, Some(SkipReason::SameAsInput));
    }

    #[test]
    fn test_decide_caps_effort_for_animation() {
        let temp_dir = TempDir::new().unwrap();
        let input = temp_dir.path().join("spin.gif");
        fs::write(&input, b"x").unwrap();

        let policy = policy(OutputFormat::Avif, 9, false);
        let decision = policy
            .decide(&policy.task_for(&input), &StubCodec::new(24))
            .unwrap();

        assert!(decision.params.animated);
        assert_eq!(decision.params.effort, 4);
        assert_eq!(decision.params.loop_count, LOOP_FOREVER);
    }

    #[test]
    fn test_animated_effort_below_ceiling_is_kept() {
        let policy = policy(OutputFormat::WebP, 2, false);
        assert_eq!(policy.animated_params().effort, 2);
    }

    #[test]
    fn test_ceiling_is_overridable() {
        let config = Config::new(
            Discovery::Root(PathBuf::from(".")),
            OutputFormat::Avif,
            None,
            Some(9),
            false,
            false,
        )
        .unwrap()
        .with_animated_effort_ceiling(7)
        .unwrap();
        let policy = ConversionPolicy::new(&config);
        assert_eq!(policy.animated_params().effort, 7);
    }

    #[test]
    fn test_lossless_pins_quality() {
        let policy = policy(OutputFormat::WebP, 4, true);
        let params = policy.base_params();
        assert!(params.lossless);
        assert_eq!(params.quality, MAX_QUALITY);
    }

    #[test]
    fn test_decide_propagates_probe_failure() {
        let temp_dir = TempDir::new().unwrap();
        let input = temp_dir.path().join("bad.jpg");
        fs::write(&input, b"x").unwrap();

        let policy = policy(OutputFormat::WebP, 4, false);
        let result = policy.decide(&policy.task_for(&input), &StubCodec::new(0));
        assert!(matches!(result, Err(ConvertError::UnreadableInput { .. })));
    }
}
