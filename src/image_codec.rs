//! Still and animated image conversion backed by the `image` and `webp` crates.

use crate::codec::{write_output, Codec, MediaProbe};
use crate::constants::{DEFAULT_FRAME_DELAY_MS, MAX_QUALITY};
use crate::error::{ConvertError, Result};
use crate::formats::{MediaKind, OutputFormat};
use crate::policy::EncodeParams;
use image::codecs::avif::AvifEncoder;
use image::codecs::gif::GifDecoder;
use image::codecs::webp::WebPDecoder;
use image::{
    AnimationDecoder, DynamicImage, ExtendedColorType, Frame, ImageEncoder, ImageFormat,
    ImageReader, RgbaImage,
};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::debug;
use webp::{AnimEncoder, AnimFrame, WebPConfig};

#[derive(Debug, Default, Clone, Copy)]
pub struct ImageCodec;

impl ImageCodec {
    pub fn new() -> Self {
        Self
    }
}

impl Codec for ImageCodec {
    fn probe(&self, input: &Path) -> Result<MediaProbe> {
        let format = detect_format(input)?;
        let (width, height) = open_reader(input)?
            .into_dimensions()
            .map_err(|e| ConvertError::unreadable(input, e))?;

        let frame_count = match format {
            ImageFormat::Gif | ImageFormat::WebP => count_frames(input, format)?,
            _ => 1,
        };

        Ok(MediaProbe {
            width,
            height,
            frame_count,
            kind: MediaKind::Image,
        })
    }

    fn encode(&self, input: &Path, output: &Path, params: &EncodeParams) -> Result<u64> {
        let bytes = match (params.format, params.animated) {
            (OutputFormat::WebP, false) => encode_webp(input, &load_rgba(input)?, params)?,
            (OutputFormat::WebP, true) => encode_animated_webp(input, params)?,
            (OutputFormat::Avif, false) => encode_avif(input, &load_rgba(input)?, params)?,
            (OutputFormat::Avif, true) => {
                return Err(ConvertError::encode_failure(
                    input,
                    "animated AVIF output needs ffmpeg",
                ))
            }
        };

        write_output(input, output, &bytes)
    }
}

fn open_reader(input: &Path) -> Result<ImageReader<BufReader<File>>> {
    ImageReader::open(input)
        .and_then(|reader| reader.with_guessed_format())
        .map_err(|e| ConvertError::unreadable(input, e))
}

/// Content sniffing first, extension as fallback.
fn detect_format(input: &Path) -> Result<ImageFormat> {
    open_reader(input)?
        .format()
        .ok_or_else(|| ConvertError::unreadable(input, "unrecognized image format"))
}

fn load_rgba(input: &Path) -> Result<RgbaImage> {
    let img: DynamicImage = open_reader(input)?
        .decode()
        .map_err(|e| ConvertError::unreadable(input, e))?;
    Ok(img.to_rgba8())
}

fn count_frames(input: &Path, format: ImageFormat) -> Result<u32> {
    // Counting decodes every frame; the probe runs once per file, sequentially.
    let frames = decode_frames(input, format)?;
    Ok(frames.len().max(1) as u32)
}

/// Decodes every frame of a GIF or WebP, composited to full canvas size.
/// A still WebP yields a single frame.
fn decode_frames(input: &Path, format: ImageFormat) -> Result<Vec<Frame>> {
    let reader = BufReader::new(File::open(input)?);
    let frames = match format {
        ImageFormat::Gif => GifDecoder::new(reader)
            .map_err(|e| ConvertError::unreadable(input, e))?
            .into_frames()
            .collect_frames(),
        ImageFormat::WebP => {
            let decoder = WebPDecoder::new(reader).map_err(|e| ConvertError::unreadable(input, e))?;
            if !decoder.has_animation() {
                let img = DynamicImage::from_decoder(decoder)
                    .map_err(|e| ConvertError::unreadable(input, e))?;
                return Ok(vec![Frame::new(img.to_rgba8())]);
            }
            decoder.into_frames().collect_frames()
        }
        other => {
            return Err(ConvertError::unreadable(
                input,
                format!("{:?} has no frame sequence", other),
            ))
        }
    };

    frames.map_err(|e| ConvertError::unreadable(input, e))
}

fn webp_config(input: &Path, params: &EncodeParams) -> Result<WebPConfig> {
    let mut config = WebPConfig::new()
        .map_err(|_| ConvertError::encode_failure(input, "libwebp rejected its default config"))?;
    config.quality = params.quality as f32;
    config.method = params.effort as i32;
    config.lossless = params.lossless as i32;
    Ok(config)
}

fn encode_webp(input: &Path, rgba: &RgbaImage, params: &EncodeParams) -> Result<Vec<u8>> {
    let config = webp_config(input, params)?;
    let encoder = webp::Encoder::from_rgba(rgba.as_raw(), rgba.width(), rgba.height());
    let memory = encoder
        .encode_advanced(&config)
        .map_err(|e| ConvertError::encode_failure(input, format!("{:?}", e)))?;
    Ok(memory.to_vec())
}

fn encode_animated_webp(input: &Path, params: &EncodeParams) -> Result<Vec<u8>> {
    let format = detect_format(input)?;
    let frames = decode_frames(input, format)?;
    let first = frames
        .first()
        .ok_or_else(|| ConvertError::unreadable(input, "no frames decoded"))?;
    let (width, height) = first.buffer().dimensions();
    debug!(
        "Encoding {} frames ({}x{}) from {}",
        frames.len(),
        width,
        height,
        input.display()
    );

    let config = webp_config(input, params)?;
    let mut encoder = AnimEncoder::new(width, height, &config);
    encoder.set_loop_count(params.loop_count as i32);

    let mut timestamp_ms: i32 = 0;
    for frame in &frames {
        let buffer = frame.buffer();
        if buffer.dimensions() != (width, height) {
            return Err(ConvertError::encode_failure(
                input,
                "frames of differing size are not supported",
            ));
        }
        encoder.add_frame(AnimFrame::from_rgba(buffer.as_raw(), width, height, timestamp_ms));
        timestamp_ms = timestamp_ms.saturating_add(frame_delay_ms(frame) as i32);
    }

    let memory = encoder
        .try_encode()
        .map_err(|e| ConvertError::encode_failure(input, format!("{:?}", e)))?;
    Ok(memory.to_vec())
}

fn frame_delay_ms(frame: &Frame) -> u32 {
    let (numer, denom) = frame.delay().numer_denom_ms();
    match numer.checked_div(denom) {
        Some(0) | None => DEFAULT_FRAME_DELAY_MS,
        Some(ms) => ms,
    }
}

fn encode_avif(input: &Path, rgba: &RgbaImage, params: &EncodeParams) -> Result<Vec<u8>> {
    let quality = if params.lossless {
        MAX_QUALITY
    } else {
        params.quality.max(1)
    };

    let mut bytes = Vec::new();
    AvifEncoder::new_with_speed_quality(&mut bytes, avif_speed(params.effort), quality)
        .write_image(
            rgba.as_raw(),
            rgba.width(),
            rgba.height(),
            ExtendedColorType::Rgba8,
        )
        .map_err(|e| ConvertError::encode_failure(input, e))?;
    Ok(bytes)
}

/// Maps effort (0 = fastest, 9 = smallest) onto the AV1 encoder speed (10 = fastest, 1 = slowest).
pub fn avif_speed(effort: u8) -> u8 {
    10u8.saturating_sub(effort).clamp(1, 10)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::codecs::gif::{GifEncoder, Repeat};
    use image::{Delay, Rgba};
    use std::fs;
    use tempfile::TempDir;

    fn params(format: OutputFormat) -> EncodeParams {
        EncodeParams {
            format,
            quality: 75,
            effort: 0,
            lossless: false,
            animated: false,
            loop_count: 0,
        }
    }

    fn write_png(path: &Path, width: u32, height: u32) {
        let img = RgbaImage::from_fn(width, height, |x, y| {
            Rgba([(x * 16) as u8, (y * 16) as u8, 128, 255])
        });
        img.save(path).unwrap();
    }

    fn write_gif(path: &Path, frames: u32) {
        let file = File::create(path).unwrap();
        let mut encoder = GifEncoder::new(file);
        encoder.set_repeat(Repeat::Infinite).unwrap();
        for i in 0..frames {
            let buffer = RgbaImage::from_pixel(8, 8, Rgba([(i * 60) as u8, 0, 0, 255]));
            encoder
                .encode_frame(Frame::from_parts(
                    buffer,
                    0,
                    0,
                    Delay::from_numer_denom_ms(50, 1),
                ))
                .unwrap();
        }
    }

    #[test]
    fn test_avif_speed_mapping() {
        assert_eq!(avif_speed(0), 10);
        assert_eq!(avif_speed(4), 6);
        assert_eq!(avif_speed(9), 1);
        assert_eq!(avif_speed(200), 1);
    }

    #[test]
    fn test_probe_png() {
        let temp_dir = TempDir::new().unwrap();
        let png = temp_dir.path().join("a.png");
        write_png(&png, 12, 7);

        let probe = ImageCodec::new().probe(&png).unwrap();
        assert_eq!((probe.width, probe.height), (12, 7));
        assert_eq!(probe.frame_count, 1);
        assert!(!probe.is_animated());
    }

    #[test]
    fn test_probe_animated_gif() {
        let temp_dir = TempDir::new().unwrap();
        let gif = temp_dir.path().join("spin.gif");
        write_gif(&gif, 3);

        let probe = ImageCodec::new().probe(&gif).unwrap();
        assert_eq!(probe.frame_count, 3);
        assert!(probe.is_animated());
    }

    #[test]
    fn test_probe_corrupt_file() {
        let temp_dir = TempDir::new().unwrap();
        let bad = temp_dir.path().join("c.jpg");
        fs::write(&bad, b"definitely not a jpeg").unwrap();

        let result = ImageCodec::new().probe(&bad);
        assert!(matches!(result, Err(ConvertError::UnreadableInput { .. })));
    }

    #[test]
    fn test_encode_webp_still() {
        let temp_dir = TempDir::new().unwrap();
        let png = temp_dir.path().join("a.png");
        let out = temp_dir.path().join("a.webp");
        write_png(&png, 16, 16);

        let size = ImageCodec::new()
            .encode(&png, &out, &params(OutputFormat::WebP))
            .unwrap();
        assert_eq!(size, fs::metadata(&out).unwrap().len());
        assert_eq!(image::image_dimensions(&out).unwrap(), (16, 16));
    }

    #[test]
    fn test_encode_webp_lossless_is_exact() {
        let temp_dir = TempDir::new().unwrap();
        let png = temp_dir.path().join("a.png");
        let out = temp_dir.path().join("a.webp");
        write_png(&png, 16, 16);

        let lossless = EncodeParams {
            lossless: true,
            quality: 100,
            ..params(OutputFormat::WebP)
        };
        ImageCodec::new().encode(&png, &out, &lossless).unwrap();

        let original = image::open(&png).unwrap().to_rgba8();
        let decoded = image::open(&out).unwrap().to_rgba8();
        assert_eq!(original, decoded);
    }

    #[test]
    fn test_encode_animated_webp_keeps_frames() {
        let temp_dir = TempDir::new().unwrap();
        let gif = temp_dir.path().join("spin.gif");
        let out = temp_dir.path().join("spin.webp");
        write_gif(&gif, 3);

        let animated = EncodeParams {
            animated: true,
            ..params(OutputFormat::WebP)
        };
        ImageCodec::new().encode(&gif, &out, &animated).unwrap();

        let probe = ImageCodec::new().probe(&out).unwrap();
        assert_eq!(probe.frame_count, 3);
    }

    #[test]
    fn test_encode_avif_still() {
        let temp_dir = TempDir::new().unwrap();
        let png = temp_dir.path().join("a.png");
        let out = temp_dir.path().join("a.avif");
        write_png(&png, 16, 16);

        let size = ImageCodec::new()
            .encode(&png, &out, &params(OutputFormat::Avif))
            .unwrap();
        assert!(size > 0);
        assert!(out.exists());
    }

    #[test]
    fn test_encode_animated_avif_is_refused() {
        let temp_dir = TempDir::new().unwrap();
        let gif = temp_dir.path().join("spin.gif");
        let out = temp_dir.path().join("spin.avif");
        write_gif(&gif, 2);

        let animated = EncodeParams {
            animated: true,
            ..params(OutputFormat::Avif)
        };
        let result = ImageCodec::new().encode(&gif, &out, &animated);
        assert!(matches!(result, Err(ConvertError::EncodeFailure { .. })));
        assert!(!out.exists());
    }

    #[test]
    fn test_encode_leaves_input_untouched() {
        let temp_dir = TempDir::new().unwrap();
        let png = temp_dir.path().join("a.png");
        let out = temp_dir.path().join("a.webp");
        write_png(&png, 8, 8);
        let before = fs::read(&png).unwrap();

        ImageCodec::new()
            .encode(&png, &out, &params(OutputFormat::WebP))
            .unwrap();
        assert_eq!(fs::read(&png).unwrap(), before);
    }
}
