use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier of a caption. Assigned once when the transcript arrives and
/// stable for the lifetime of the session; never reused, never recomputed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CaptionId(Uuid);

impl CaptionId {
    pub(crate) fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for CaptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// One timed cue as returned by the transcription service, before the
/// session assigns it an id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptCue {
    pub start: f64,
    pub end: f64,
    pub text: String,
}

impl TranscriptCue {
    /// `0 <= start < end`, both finite. Cues violating this never enter a
    /// session; the whole transcript is rejected instead (no partial results).
    pub fn is_well_timed(&self) -> bool {
        self.start.is_finite() && self.end.is_finite() && self.start >= 0.0 && self.start < self.end
    }
}

/// One subtitle cue owned by a session. Only `text` is mutable after
/// creation; captions are never added, removed, or reordered.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Caption {
    pub id: CaptionId,
    pub start: f64,
    pub end: f64,
    pub text: String,
}

impl Caption {
    pub(crate) fn from_cue(cue: TranscriptCue) -> Self {
        Self {
            id: CaptionId::generate(),
            start: cue.start,
            end: cue.end,
            text: cue.text,
        }
    }

    /// Inclusive on both ends: a caption covers `start` and `end` themselves.
    pub fn covers(&self, position: f64) -> bool {
        self.start <= position && position <= self.end
    }
}
