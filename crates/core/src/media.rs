use std::{
    fmt,
    path::Path,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use tokio::fs;

use crate::error::{ReelsubError, Result};

/// MIME type for a video file, by extension. Anything unrecognized is not
/// accepted as media.
pub fn mime_for_path(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_string_lossy().to_lowercase();
    match ext.as_str() {
        "mp4" => Some("video/mp4"),
        "webm" => Some("video/webm"),
        "mkv" => Some("video/x-matroska"),
        "mov" => Some("video/quicktime"),
        "avi" => Some("video/x-msvideo"),
        _ => None,
    }
}

/// A locally loaded, playable media resource: a URI a player can resolve
/// plus the raw bytes prepared for transmission to the transcription
/// service.
///
/// Exclusively owned by the session. The backing bytes are released when the
/// handle is released (explicitly or on drop); holding a [`ReleaseProbe`]
/// lets callers observe that the release actually happened.
pub struct MediaHandle {
    uri: String,
    mime: String,
    bytes: Vec<u8>,
    released: Arc<AtomicBool>,
}

impl MediaHandle {
    pub fn new(uri: String, mime: String, bytes: Vec<u8>) -> Self {
        Self {
            uri,
            mime,
            bytes,
            released: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Load a video file from disk into a playable handle.
    pub async fn load(path: &Path) -> Result<Self> {
        let mime = mime_for_path(path).ok_or_else(|| ReelsubError::UnsupportedMedia {
            path: path.to_path_buf(),
        })?;
        let resolved = fs::canonicalize(path)
            .await
            .map_err(|e| ReelsubError::MediaReadFailed {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
        let bytes = fs::read(&resolved)
            .await
            .map_err(|e| ReelsubError::MediaReadFailed {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
        log::debug!("loaded {} ({} bytes, {})", resolved.display(), bytes.len(), mime);
        Ok(Self::new(
            format!("file://{}", resolved.display()),
            mime.to_string(),
            bytes,
        ))
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn mime(&self) -> &str {
        &self.mime
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Drop the backing bytes. Idempotent; also runs on drop.
    pub fn release(&mut self) {
        self.bytes = Vec::new();
        self.released.store(true, Ordering::SeqCst);
    }

    pub fn probe(&self) -> ReleaseProbe {
        ReleaseProbe(Arc::clone(&self.released))
    }
}

impl Drop for MediaHandle {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for MediaHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MediaHandle")
            .field("uri", &self.uri)
            .field("mime", &self.mime)
            .field("bytes", &self.bytes.len())
            .finish()
    }
}

/// Observes whether the handle it was taken from has released its backing
/// resource.
#[derive(Debug, Clone)]
pub struct ReleaseProbe(Arc<AtomicBool>);

impl ReleaseProbe {
    pub fn is_released(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn recognizes_video_containers_case_insensitively() {
        assert_eq!(mime_for_path(Path::new("clip.mp4")), Some("video/mp4"));
        assert_eq!(mime_for_path(Path::new("clip.MOV")), Some("video/quicktime"));
        assert_eq!(mime_for_path(Path::new("clip.webm")), Some("video/webm"));
        assert_eq!(mime_for_path(Path::new("notes.txt")), None);
        assert_eq!(mime_for_path(Path::new("no_extension")), None);
    }

    #[test]
    fn release_drops_bytes_and_trips_the_probe() {
        let mut handle = MediaHandle::new("mem://clip".into(), "video/mp4".into(), vec![1, 2, 3]);
        let probe = handle.probe();
        assert!(!probe.is_released());
        handle.release();
        assert!(handle.bytes().is_empty());
        assert!(probe.is_released());
    }

    #[test]
    fn dropping_the_handle_releases_it() {
        let handle = MediaHandle::new("mem://clip".into(), "video/mp4".into(), vec![0; 16]);
        let probe = handle.probe();
        drop(handle);
        assert!(probe.is_released());
    }

    #[tokio::test]
    async fn load_rejects_non_media_paths() {
        let err = MediaHandle::load(&PathBuf::from("/tmp/whatever.txt"))
            .await
            .unwrap_err();
        assert!(matches!(err, ReelsubError::UnsupportedMedia { .. }));
    }

    #[tokio::test]
    async fn load_reports_missing_files_as_read_failures() {
        let err = MediaHandle::load(&PathBuf::from("/nonexistent/clip.mp4"))
            .await
            .unwrap_err();
        assert!(matches!(err, ReelsubError::MediaReadFailed { .. }));
    }
}
