pub const MAX_QUALITY: u8 = 100;

pub const DEFAULT_WEBP_QUALITY: u8 = 80;
pub const DEFAULT_WEBP_EFFORT: u8 = 4;
pub const MAX_WEBP_EFFORT: u8 = 6;

pub const DEFAULT_AVIF_QUALITY: u8 = 50;
pub const DEFAULT_AVIF_EFFORT: u8 = 4;
pub const MAX_AVIF_EFFORT: u8 = 9;

/// Upper bound on effort for multi-frame sources. Tuned by hand, not derived;
/// override with `--animated-effort-ceiling` / `ANIMATED_EFFORT_CEILING`.
pub const DEFAULT_ANIMATED_EFFORT_CEILING: u8 = 4;

/// Loop count written into animated output. Zero means loop forever.
pub const LOOP_FOREVER: u16 = 0;

/// Delay used for frames that declare none (browsers treat 0 the same way).
pub const DEFAULT_FRAME_DELAY_MS: u32 = 100;

pub const DEFAULT_ASSETS_DIR: &str = "assets";

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp", "tif", "tiff", "bmp"];
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "webm", "mkv", "avi", "m4v"];

pub const FFMPEG_BIN: &str = "ffmpeg";
pub const FFPROBE_BIN: &str = "ffprobe";

// Headroom kept free when checking whether the largest input fits in memory
pub const MIN_AVAILABLE_MEMORY_MIB: u64 = 256;

pub const PROGRESS_BAR_TEMPLATE: &str =
    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}";

// Common output message prefixes
pub const SIZE_PREFIX: &str = "📊";
pub const SUCCESS_PREFIX: &str = "✅";
pub const SKIP_PREFIX: &str = "⏭️";
pub const WARNING_PREFIX: &str = "⚠️";
pub const ERROR_PREFIX: &str = "❌";
pub const INFO_PREFIX: &str = "📋";
