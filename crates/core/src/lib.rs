pub mod cache;
pub mod clipboard;
pub mod editor;
pub mod error;
pub mod export;
pub mod format;
pub mod gemini;
pub mod media;
pub mod notice;
pub mod session;
pub mod sync;
pub mod transcriber;
pub mod types;

pub use cache::{get_cache_dir, get_root_cache_dir, get_transcript_path};
pub use editor::EditState;
pub use error::{ReelsubError, Result};
pub use format::{captions_text, format_captions_with_timestamps, format_timestamp};
pub use gemini::{GeminiConfig, GeminiTranscriber};
pub use media::{MediaHandle, ReleaseProbe};
pub use notice::{NOTICE_TTL, Notice};
pub use session::{FailureKind, Phase, Seek, Session};
pub use sync::{SyncOutcome, active_caption_at};
pub use transcriber::Transcriber;
pub use types::{Caption, CaptionId, TranscriptCue};
