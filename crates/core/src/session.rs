use std::fmt;

use crate::{
    error::{ReelsubError, Result},
    media::MediaHandle,
    notice::Notice,
    sync::{SyncOutcome, active_caption_at},
    types::{Caption, CaptionId, TranscriptCue},
};

/// Coarse lifecycle stage of a session. Exactly one phase is active at a
/// time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Uploading,
    Processing,
    Ready,
    Error,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Idle => "idle",
            Phase::Uploading => "uploading",
            Phase::Processing => "processing",
            Phase::Ready => "ready",
            Phase::Error => "error",
        };
        f.write_str(name)
    }
}

/// The session's flat failure taxonomy: either the selected file could not
/// be loaded, or the transcription call did not return a usable result. Both
/// map to a fixed user-facing message; the only recovery is a full reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    MediaRead,
    Transcription,
}

impl FailureKind {
    pub fn message(self) -> &'static str {
        match self {
            FailureKind::MediaRead => "Failed to read the video file.",
            FailureKind::Transcription => {
                "AI processing failed. Please try again with a shorter video or check your API key."
            }
        }
    }
}

/// Command for the playback surface produced by a seek: jump to `position`
/// and resume playing (playback always starts, even if it was paused). The
/// session has already applied the position, so `outcome` carries any
/// scroll-into-view trigger exactly like a regular sample would.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Seek {
    pub position: f64,
    pub outcome: SyncOutcome,
}

/// The root aggregate: owns the phase, the media handle, the caption list,
/// the playback position and its derived active caption, the error message,
/// and the transient notice. All transitions go through the methods below;
/// anything else is rejected.
///
/// One session per user run. A reset replaces the whole value (full-reload
/// semantics) rather than rolling state back field by field.
#[derive(Debug)]
pub struct Session {
    phase: Phase,
    media: Option<MediaHandle>,
    captions: Vec<Caption>,
    position: f64,
    active: Option<CaptionId>,
    error_detail: Option<String>,
    notice: Option<Notice>,
    notice_generation: u64,
}

impl Session {
    pub fn new() -> Self {
        Self {
            phase: Phase::Idle,
            media: None,
            captions: Vec::new(),
            position: 0.0,
            active: None,
            error_detail: None,
            notice: None,
            notice_generation: 0,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn media(&self) -> Option<&MediaHandle> {
        self.media.as_ref()
    }

    pub fn captions(&self) -> &[Caption] {
        &self.captions
    }

    pub fn caption(&self, id: CaptionId) -> Option<&Caption> {
        self.captions.iter().find(|c| c.id == id)
    }

    pub fn position(&self) -> f64 {
        self.position
    }

    pub fn active_caption(&self) -> Option<CaptionId> {
        self.active
    }

    /// Text of the active caption, for the overlay.
    pub fn active_caption_text(&self) -> Option<&str> {
        let id = self.active?;
        self.caption(id).map(|c| c.text.as_str())
    }

    pub fn error_detail(&self) -> Option<&str> {
        self.error_detail.as_deref()
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    fn guard(&self, expected: Phase, action: &'static str) -> Result<()> {
        if self.phase == expected {
            Ok(())
        } else {
            Err(ReelsubError::IllegalTransition {
                action,
                phase: self.phase,
            })
        }
    }

    fn advance(&mut self, to: Phase) {
        log::debug!("session phase {} -> {}", self.phase, to);
        self.phase = to;
    }

    /// `Idle -> Uploading`: a media file was accepted. Feeding a new file in
    /// any other phase is rejected until the session is reset.
    pub fn accept_file(&mut self) -> Result<()> {
        self.guard(Phase::Idle, "accept a file")?;
        self.advance(Phase::Uploading);
        Ok(())
    }

    /// Store the playable handle constructed from the accepted file. Legal
    /// only while `Uploading`; the handle stays until reset.
    pub fn attach_media(&mut self, media: MediaHandle) -> Result<()> {
        self.guard(Phase::Uploading, "attach media")?;
        log::debug!("media attached: {}", media.uri());
        self.media = Some(media);
        Ok(())
    }

    /// `Uploading -> Processing`: the handle is ready and its bytes are
    /// prepared for transmission. Once entered, the phase is pinned until
    /// the transcription collaborator resolves or rejects.
    pub fn begin_transcription(&mut self) -> Result<()> {
        self.guard(Phase::Uploading, "begin transcription")?;
        if self.media.is_none() {
            return Err(ReelsubError::IllegalTransition {
                action: "begin transcription without media",
                phase: self.phase,
            });
        }
        self.advance(Phase::Processing);
        Ok(())
    }

    /// `Processing -> Ready`: store the returned cues, assigning each a
    /// fresh unique id in list order. The whole transcript is rejected if
    /// any cue is mistimed; a session never holds a partial result.
    pub fn finish_transcription(&mut self, cues: Vec<TranscriptCue>) -> Result<()> {
        self.guard(Phase::Processing, "finish transcription")?;
        if let Some((index, cue)) = cues.iter().enumerate().find(|(_, c)| !c.is_well_timed()) {
            return Err(ReelsubError::TranscriptionFailed {
                reason: format!(
                    "cue {} has invalid timing {}..{}",
                    index, cue.start, cue.end
                ),
            });
        }
        log::info!("transcription complete: {} captions", cues.len());
        self.captions = cues.into_iter().map(Caption::from_cue).collect();
        self.advance(Phase::Ready);
        Ok(())
    }

    /// `Uploading | Processing -> Error`: both failure causes collapse to
    /// the same phase with a fixed message per kind. The caption list stays
    /// empty; no automatic retry, the user recovers via reset.
    pub fn fail(&mut self, kind: FailureKind) -> Result<()> {
        match self.phase {
            Phase::Uploading | Phase::Processing => {
                log::warn!("session failed in {} phase: {:?}", self.phase, kind);
                self.error_detail = Some(kind.message().to_string());
                self.advance(Phase::Error);
                Ok(())
            }
            phase => Err(ReelsubError::IllegalTransition {
                action: "record a failure",
                phase,
            }),
        }
    }

    /// `Ready | Error -> Idle`: discard everything, releasing the media
    /// handle. The session value is replaced wholesale.
    pub fn reset(&mut self) -> Result<()> {
        match self.phase {
            Phase::Ready | Phase::Error => {
                log::info!("session reset from {} phase", self.phase);
                let generation = self.notice_generation;
                *self = Session::new();
                // A clear scheduled before the reset must not erase a notice
                // shown after it.
                self.notice_generation = generation;
                Ok(())
            }
            phase => Err(ReelsubError::IllegalTransition {
                action: "reset",
                phase,
            }),
        }
    }

    /// Feed one playback position sample. Recomputes the active caption
    /// (first in list order covering the position) and reports whether it
    /// changed; `Activated` doubles as the scroll-into-view trigger.
    pub fn sample_position(&mut self, position: f64) -> SyncOutcome {
        self.position = position;
        let next = active_caption_at(&self.captions, position).map(|c| c.id);
        let outcome = match (self.active, next) {
            (previous, current) if previous == current => SyncOutcome::Unchanged,
            (_, Some(id)) => SyncOutcome::Activated(id),
            (Some(_), None) => SyncOutcome::Cleared,
            (None, None) => SyncOutcome::Unchanged,
        };
        self.active = next;
        outcome
    }

    /// Jump playback to a caption's start. The position is applied
    /// immediately (repeating the seek lands on the same position) and the
    /// returned command tells the player to resume playing.
    pub fn seek_to_caption(&mut self, id: CaptionId) -> Result<Seek> {
        let target = self
            .caption(id)
            .map(|c| c.start)
            .ok_or(ReelsubError::UnknownCaption { id })?;
        let outcome = self.sample_position(target);
        Ok(Seek {
            position: target,
            outcome,
        })
    }

    /// Overwrite one caption's text. Unconditional, last-write-wins, empty
    /// text accepted. Only the text ever changes; timing and order do not.
    pub fn set_caption_text(&mut self, id: CaptionId, text: String) -> Result<()> {
        self.guard(Phase::Ready, "edit a caption")?;
        let caption = self
            .captions
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or(ReelsubError::UnknownCaption { id })?;
        caption.text = text;
        Ok(())
    }

    /// Show a transient notice, superseding any current one, and return the
    /// generation to pass to [`Self::expire_notice`] after
    /// [`crate::notice::NOTICE_TTL`].
    pub fn show_notice(&mut self, message: impl Into<String>) -> u64 {
        self.notice_generation += 1;
        let generation = self.notice_generation;
        self.notice = Some(Notice::new(message.into(), generation));
        generation
    }

    /// Clear the notice, but only if `generation` still matches: the clear
    /// scheduled for an older notice must not erase a newer one.
    pub fn expire_notice(&mut self, generation: u64) {
        if self
            .notice
            .as_ref()
            .is_some_and(|n| n.generation() == generation)
        {
            self.notice = None;
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notice;

    fn test_media() -> MediaHandle {
        MediaHandle::new(
            "mem://reel.mp4".to_string(),
            "video/mp4".to_string(),
            vec![0u8; 32],
        )
    }

    fn cue(start: f64, end: f64, text: &str) -> TranscriptCue {
        TranscriptCue {
            start,
            end,
            text: text.to_string(),
        }
    }

    fn ready_session(cues: Vec<TranscriptCue>) -> Session {
        let mut session = Session::new();
        session.accept_file().unwrap();
        session.attach_media(test_media()).unwrap();
        session.begin_transcription().unwrap();
        session.finish_transcription(cues).unwrap();
        session
    }

    #[test]
    fn happy_path_reaches_ready_with_unique_ids() {
        let mut session = Session::new();
        assert_eq!(session.phase(), Phase::Idle);

        session.accept_file().unwrap();
        assert_eq!(session.phase(), Phase::Uploading);

        session.attach_media(test_media()).unwrap();
        session.begin_transcription().unwrap();
        assert_eq!(session.phase(), Phase::Processing);

        session
            .finish_transcription(vec![cue(0.0, 1.5, "Привет всем")])
            .unwrap();
        assert_eq!(session.phase(), Phase::Ready);
        assert_eq!(session.captions().len(), 1);
        assert_eq!(session.captions()[0].text, "Привет всем");

        let ids: Vec<_> = session.captions().iter().map(|c| c.id).collect();
        let unique: std::collections::HashSet<_> = ids.iter().copied().collect();
        assert_eq!(unique.len(), ids.len());
    }

    #[test]
    fn transcription_failure_leaves_captions_empty() {
        let mut session = Session::new();
        session.accept_file().unwrap();
        session.attach_media(test_media()).unwrap();
        session.begin_transcription().unwrap();

        session.fail(FailureKind::Transcription).unwrap();
        assert_eq!(session.phase(), Phase::Error);
        assert!(!session.error_detail().unwrap().is_empty());
        assert!(session.captions().is_empty());
    }

    #[test]
    fn local_read_failure_is_reportable_while_uploading() {
        let mut session = Session::new();
        session.accept_file().unwrap();
        session.fail(FailureKind::MediaRead).unwrap();
        assert_eq!(session.phase(), Phase::Error);
        assert_eq!(session.error_detail(), Some(FailureKind::MediaRead.message()));
    }

    #[test]
    fn feeding_a_new_file_is_rejected_until_reset() {
        let mut session = ready_session(vec![cue(0.0, 1.0, "a")]);
        let err = session.accept_file().unwrap_err();
        assert!(matches!(err, ReelsubError::IllegalTransition { .. }));
        assert_eq!(session.phase(), Phase::Ready);

        session.reset().unwrap();
        session.accept_file().unwrap();
        assert_eq!(session.phase(), Phase::Uploading);
    }

    #[test]
    fn begin_transcription_requires_attached_media() {
        let mut session = Session::new();
        session.accept_file().unwrap();
        assert!(session.begin_transcription().is_err());
        assert_eq!(session.phase(), Phase::Uploading);
    }

    #[test]
    fn mistimed_cue_rejects_the_whole_transcript() {
        let mut session = Session::new();
        session.accept_file().unwrap();
        session.attach_media(test_media()).unwrap();
        session.begin_transcription().unwrap();

        let err = session
            .finish_transcription(vec![cue(0.0, 1.0, "ok"), cue(3.0, 2.0, "inverted")])
            .unwrap_err();
        assert!(matches!(err, ReelsubError::TranscriptionFailed { .. }));
        assert!(session.captions().is_empty());
        assert_eq!(session.phase(), Phase::Processing);
    }

    #[test]
    fn reset_from_ready_releases_the_media_handle() {
        let media = test_media();
        let probe = media.probe();

        let mut session = Session::new();
        session.accept_file().unwrap();
        session.attach_media(media).unwrap();
        session.begin_transcription().unwrap();
        session.finish_transcription(vec![cue(0.0, 1.0, "a")]).unwrap();

        session.reset().unwrap();
        assert_eq!(session.phase(), Phase::Idle);
        assert!(session.captions().is_empty());
        assert!(session.media().is_none());
        assert!(probe.is_released());
    }

    #[test]
    fn reset_is_rejected_while_processing() {
        let mut session = Session::new();
        session.accept_file().unwrap();
        session.attach_media(test_media()).unwrap();
        session.begin_transcription().unwrap();
        assert!(session.reset().is_err());
        assert_eq!(session.phase(), Phase::Processing);
    }

    #[test]
    fn sampling_activates_clears_and_deduplicates_scrolls() {
        let mut session = ready_session(vec![cue(0.0, 2.0, "a"), cue(3.0, 4.0, "b")]);
        let first = session.captions()[0].id;
        let second = session.captions()[1].id;

        assert_eq!(session.sample_position(0.5), SyncOutcome::Activated(first));
        // Same caption again: no redundant scroll command.
        assert_eq!(session.sample_position(1.9), SyncOutcome::Unchanged);
        assert_eq!(session.sample_position(2.5), SyncOutcome::Cleared);
        assert_eq!(session.sample_position(2.6), SyncOutcome::Unchanged);
        assert_eq!(session.sample_position(3.5), SyncOutcome::Activated(second));
        assert_eq!(session.active_caption(), Some(second));
        assert_eq!(session.active_caption_text(), Some("b"));
    }

    #[test]
    fn overlapping_captions_resolve_to_the_earlier_list_entry() {
        let mut session = ready_session(vec![cue(0.0, 2.0, "A"), cue(1.0, 3.0, "B")]);
        session.sample_position(1.5);
        assert_eq!(session.active_caption_text(), Some("A"));
    }

    #[test]
    fn seek_is_idempotent_and_reports_the_scroll_once() {
        let mut session = ready_session(vec![cue(0.0, 1.0, "a"), cue(2.0, 3.0, "b")]);
        let target = session.captions()[1].id;

        let first = session.seek_to_caption(target).unwrap();
        assert_eq!(first.position, 2.0);
        assert_eq!(first.outcome, SyncOutcome::Activated(target));
        assert_eq!(session.position(), 2.0);

        let second = session.seek_to_caption(target).unwrap();
        assert_eq!(second.position, 2.0);
        assert_eq!(second.outcome, SyncOutcome::Unchanged);
        assert_eq!(session.position(), 2.0);
    }

    #[test]
    fn seek_to_unknown_caption_is_an_error() {
        let mut session = ready_session(vec![cue(0.0, 1.0, "a")]);
        let stray = CaptionId::generate();
        assert!(matches!(
            session.seek_to_caption(stray),
            Err(ReelsubError::UnknownCaption { .. })
        ));
    }

    #[test]
    fn edit_commit_is_last_write_wins() {
        let mut session = ready_session(vec![cue(0.0, 1.0, "original")]);
        let id = session.captions()[0].id;

        session.set_caption_text(id, "T1".to_string()).unwrap();
        session.set_caption_text(id, "T2".to_string()).unwrap();
        assert_eq!(session.caption(id).unwrap().text, "T2");
    }

    #[test]
    fn empty_edit_is_accepted() {
        let mut session = ready_session(vec![cue(0.0, 1.0, "original")]);
        let id = session.captions()[0].id;
        session.set_caption_text(id, String::new()).unwrap();
        assert_eq!(session.caption(id).unwrap().text, "");
    }

    #[test]
    fn editing_outside_ready_is_rejected() {
        let mut session = Session::new();
        let stray = CaptionId::generate();
        assert!(matches!(
            session.set_caption_text(stray, "x".to_string()),
            Err(ReelsubError::IllegalTransition { .. })
        ));
    }

    #[test]
    fn a_new_notice_survives_the_old_notice_timer() {
        let mut session = ready_session(vec![cue(0.0, 1.0, "a")]);
        let first = session.show_notice("Copied!");
        let second = session.show_notice("Copied again!");

        // The stale clear fires late; the newer notice must stay.
        session.expire_notice(first);
        assert_eq!(session.notice().unwrap().message(), "Copied again!");

        session.expire_notice(second);
        assert!(session.notice().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn notice_is_gone_once_its_timer_expires() {
        let mut session = ready_session(vec![cue(0.0, 1.0, "a")]);
        let generation = session.show_notice("Copied!");
        assert!(session.notice().is_some());

        let expired = notice::expiry_timer(generation).await;
        session.expire_notice(expired);
        assert!(session.notice().is_none());
    }
}
