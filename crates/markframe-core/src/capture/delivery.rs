//! Where captured images go: a download directory or the clipboard.

use std::borrow::Cow;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use image::{ImageFormat, RgbaImage};
use tracing::info;

use crate::dataurl::decode_data_url;
use crate::error::{MarkframeError, MarkframeResult};

/// Encode an image as PNG.
pub fn png_bytes(image: &RgbaImage) -> MarkframeResult<Vec<u8>> {
    let mut bytes = Vec::new();
    image.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
    Ok(bytes)
}

/// Receives finished file exports.
pub trait DownloadSink: Send + Sync {
    /// Store `data_url` under `filename`, returning where it landed.
    fn download(&self, filename: &str, data_url: &str) -> MarkframeResult<PathBuf>;
}

/// Writes downloads into a directory.
#[derive(Debug, Clone)]
pub struct DirectoryDownloads {
    dir: PathBuf,
}

impl DirectoryDownloads {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The user's download directory, or the working directory.
    pub fn user_default() -> Self {
        Self::new(dirs::download_dir().unwrap_or_else(|| PathBuf::from(".")))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl Default for DirectoryDownloads {
    fn default() -> Self {
        Self::user_default()
    }
}

impl DownloadSink for DirectoryDownloads {
    fn download(&self, filename: &str, data_url: &str) -> MarkframeResult<PathBuf> {
        let (_, bytes) = decode_data_url(data_url)?;
        std::fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(filename);
        std::fs::write(&path, &bytes)?;
        info!(path = %path.display(), bytes = bytes.len(), "image exported");
        Ok(path)
    }
}

/// Receives clipboard copies.
pub trait ClipboardSink: Send + Sync {
    /// Place one PNG image on the clipboard. `pixels` is the decoded form
    /// of `png` for platforms that take raw RGBA.
    fn write_png(&self, png: &[u8], pixels: &RgbaImage) -> MarkframeResult<()>;
}

/// The system clipboard via arboard.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClipboard;

impl ClipboardSink for SystemClipboard {
    fn write_png(&self, _png: &[u8], pixels: &RgbaImage) -> MarkframeResult<()> {
        let mut clipboard =
            arboard::Clipboard::new().map_err(|e| MarkframeError::ClipboardWriteFailed(e.to_string()))?;
        clipboard
            .set_image(arboard::ImageData {
                width: pixels.width() as usize,
                height: pixels.height() as usize,
                bytes: Cow::Borrowed(pixels.as_raw()),
            })
            .map_err(|e| MarkframeError::ClipboardWriteFailed(e.to_string()))?;
        info!(width = pixels.width(), height = pixels.height(), "image copied to clipboard");
        Ok(())
    }
}
