//! Local image file -> background data URL.

use std::path::Path;

use tracing::debug;

use crate::dataurl::to_data_url;
use crate::error::{MarkframeError, MarkframeResult};

/// Extensions offered by file pickers.
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp"];

/// Encode image bytes as a data URL, MIME type sniffed from the content.
pub fn image_data_url(bytes: &[u8]) -> MarkframeResult<String> {
    let format = image::guess_format(bytes)?;
    Ok(to_data_url(format.to_mime_type(), bytes))
}

/// Read an image file into a data URL.
///
/// Every call reads the file again, so picking the same path twice picks up
/// any change on disk.
pub fn read_image_data_url(path: &Path) -> MarkframeResult<String> {
    let bytes = std::fs::read(path)?;
    if bytes.is_empty() {
        return Err(MarkframeError::InvalidDataUrl(format!("{} is empty", path.display())));
    }
    let url = image_data_url(&bytes)?;
    debug!(path = %path.display(), bytes = bytes.len(), "background image loaded");
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgba, RgbaImage};
    use std::io::Cursor;

    fn tiny_png() -> Vec<u8> {
        let img = RgbaImage::from_pixel(2, 2, Rgba([10, 20, 30, 255]));
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png).unwrap();
        bytes
    }

    #[test]
    fn test_png_file_to_data_url() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bg.png");
        std::fs::write(&path, tiny_png()).unwrap();

        let url = read_image_data_url(&path).unwrap();
        assert!(url.starts_with("data:image/png;base64,"));
    }

    #[test]
    fn test_same_file_twice_rereads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bg.png");
        std::fs::write(&path, tiny_png()).unwrap();
        let first = read_image_data_url(&path).unwrap();

        let img = RgbaImage::from_pixel(3, 3, Rgba([0, 0, 0, 255]));
        img.save(&path).unwrap();
        let second = read_image_data_url(&path).unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_not_an_image() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "hello").unwrap();
        assert!(matches!(read_image_data_url(&path), Err(MarkframeError::Image(_))));
    }

    #[test]
    fn test_missing_file() {
        let err = read_image_data_url(Path::new("/definitely/not/here.png")).unwrap_err();
        assert!(matches!(err, MarkframeError::Io(_)));
    }
}
