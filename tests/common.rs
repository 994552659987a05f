use image::{Rgb, RgbImage};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Writes a small gradient PNG so the real decoders have something valid to read.
pub fn create_png(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
    let path = dir.join(name);
    let img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x * 7 % 256) as u8, (y * 5 % 256) as u8, ((x + y) % 256) as u8])
    });
    img.save_with_format(&path, image::ImageFormat::Png).unwrap();
    path
}

/// A file with an image extension and garbage content.
pub fn create_corrupt_file(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    File::create(&path)
        .unwrap()
        .write_all(b"definitely not an image")
        .unwrap();
    path
}

/// `a.png` converts, `b.png` already has `b.webp`, `c.jpg` is corrupt.
pub fn create_mixed_assets(dir: &Path) {
    create_png(dir, "a.png", 32, 24);
    create_png(dir, "b.png", 16, 16);
    File::create(dir.join("b.webp"))
        .unwrap()
        .write_all(b"previously converted")
        .unwrap();
    create_corrupt_file(dir, "c.jpg");
}

pub fn create_nested_directory_structure(root: &Path) -> PathBuf {
    let subdir = root.join("icons").join("small");
    std::fs::create_dir_all(&subdir).unwrap();
    create_png(&subdir, "nested.png", 8, 8);
    File::create(subdir.join("notes.txt"))
        .unwrap()
        .write_all(b"not an image")
        .unwrap();
    subdir
}

pub fn create_temp_directory() -> TempDir {
    TempDir::new().unwrap()
}
