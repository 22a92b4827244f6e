use async_trait::async_trait;

use crate::{error::Result, types::TranscriptCue};

/// The transcription collaborator: media bytes and their MIME type in,
/// ordered time-coded cues out. Any underlying failure — network, quota,
/// malformed payload — surfaces as a single opaque transcription error; no
/// structured taxonomy crosses this boundary.
#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(&self, media: &[u8], mime: &str) -> Result<Vec<TranscriptCue>>;
}
