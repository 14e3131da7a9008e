//! Frame acquisition seam.
//!
//! The scan engine acquires a frame stream once per session lifetime and
//! captures one still frame per user trigger. Hardware access lives
//! behind the [`Camera`] trait; the crate ships a file-backed
//! implementation used by the CLI, which serves pre-captured images in
//! order.

use async_trait::async_trait;
use std::path::PathBuf;
use tracing::debug;

/// An encoded still frame ready for the classifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Raw encoded image bytes (not yet base64)
    pub bytes: Vec<u8>,
    /// Declared media type, e.g. `image/jpeg`
    pub media_type: String,
}

impl Frame {
    /// Create a frame from encoded bytes and a media type.
    pub fn new(bytes: Vec<u8>, media_type: impl Into<String>) -> Self {
        Self {
            bytes,
            media_type: media_type.into(),
        }
    }

    /// Check the frame is usable as classifier input.
    pub fn ensure_valid(&self) -> crate::Result<()> {
        if self.bytes.is_empty() {
            return Err(crate::Error::Capture("empty frame".to_string()));
        }
        if self.media_type.is_empty() {
            return Err(crate::Error::Capture("frame has no media type".to_string()));
        }
        Ok(())
    }
}

/// A camera device capable of handing out a frame stream.
#[async_trait]
pub trait Camera: Send + Sync {
    /// Acquire the stream. Fails with [`crate::Error::Permission`] when
    /// camera access is unavailable or denied.
    async fn acquire_stream(&self) -> crate::Result<Box<dyn FrameStream>>;
}

/// An acquired stream that can capture still frames.
///
/// Held for the lifetime of one scan session and released on drop,
/// regardless of how the session ends.
#[async_trait]
pub trait FrameStream: Send {
    /// Capture the current frame as an encoded image.
    async fn capture_still_frame(&mut self) -> crate::Result<Frame>;
}

/// Map a file extension to a declared media type.
fn media_type_for(path: &std::path::Path) -> Option<&'static str> {
    match path.extension()?.to_str()?.to_ascii_lowercase().as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "webp" => Some("image/webp"),
        "gif" => Some("image/gif"),
        _ => None,
    }
}

/// File-backed camera serving pre-captured images in order.
///
/// Each `capture_still_frame` call consumes the next file in the list;
/// running past the end is a capture error, mirroring a stream whose
/// device has gone away.
pub struct FileCamera {
    paths: Vec<PathBuf>,
}

impl FileCamera {
    /// Create a camera over an ordered list of image files.
    pub fn new(paths: Vec<PathBuf>) -> Self {
        Self { paths }
    }
}

#[async_trait]
impl Camera for FileCamera {
    async fn acquire_stream(&self) -> crate::Result<Box<dyn FrameStream>> {
        // Check readability up front so a bad path surfaces as a
        // permission-style failure at acquisition, not mid-session.
        for path in &self.paths {
            if !path.exists() {
                return Err(crate::Error::Permission(format!(
                    "image not accessible: {}",
                    path.display()
                )));
            }
        }
        Ok(Box::new(FileFrameStream {
            paths: self.paths.clone(),
            next: 0,
        }))
    }
}

struct FileFrameStream {
    paths: Vec<PathBuf>,
    next: usize,
}

#[async_trait]
impl FrameStream for FileFrameStream {
    async fn capture_still_frame(&mut self) -> crate::Result<Frame> {
        let path = self.paths.get(self.next).ok_or_else(|| {
            crate::Error::Capture("no more frames available".to_string())
        })?;
        self.next += 1;

        let media_type = media_type_for(path).ok_or_else(|| {
            crate::Error::Capture(format!(
                "unsupported image format: {}",
                path.display()
            ))
        })?;

        let bytes = tokio::fs::read(path).await?;
        debug!(path = %path.display(), bytes = bytes.len(), "Captured frame from file");

        let frame = Frame::new(bytes, media_type);
        frame.ensure_valid()?;
        Ok(frame)
    }
}
