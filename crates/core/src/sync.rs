use crate::types::{Caption, CaptionId};

/// Result of feeding one playback position sample to the session.
///
/// `Activated` is reported only when the active caption actually changes, so
/// a view can use it directly as its bring-into-view trigger without
/// filtering redundant samples itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Active caption is the same as after the previous sample.
    Unchanged,
    /// A different caption became active; scroll its list entry into view.
    Activated(CaptionId),
    /// No caption covers the position any more.
    Cleared,
}

/// The first caption in list order covering `position` (inclusive on both
/// ends). List order is the tie-break for overlapping cues; the list is kept
/// in the chronological order the transcription returned, never re-sorted.
pub fn active_caption_at(captions: &[Caption], position: f64) -> Option<&Caption> {
    captions.iter().find(|c| c.covers(position))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TranscriptCue;

    fn captions(cues: &[(f64, f64, &str)]) -> Vec<Caption> {
        cues.iter()
            .map(|(start, end, text)| {
                Caption::from_cue(TranscriptCue {
                    start: *start,
                    end: *end,
                    text: text.to_string(),
                })
            })
            .collect()
    }

    #[test]
    fn finds_the_caption_covering_the_position() {
        let list = captions(&[(0.0, 1.5, "a"), (2.0, 3.0, "b")]);
        assert_eq!(active_caption_at(&list, 0.7).map(|c| c.text.as_str()), Some("a"));
        assert_eq!(active_caption_at(&list, 2.9).map(|c| c.text.as_str()), Some("b"));
        assert!(active_caption_at(&list, 1.7).is_none());
        assert!(active_caption_at(&list, 99.0).is_none());
    }

    #[test]
    fn earliest_in_list_order_wins_on_overlap() {
        let list = captions(&[(0.0, 2.0, "A"), (1.0, 3.0, "B")]);
        assert_eq!(active_caption_at(&list, 1.5).map(|c| c.text.as_str()), Some("A"));
        // Past A's end only B covers the position.
        assert_eq!(active_caption_at(&list, 2.5).map(|c| c.text.as_str()), Some("B"));
    }

    #[test]
    fn endpoints_are_inclusive() {
        let list = captions(&[(1.0, 2.0, "a")]);
        assert!(active_caption_at(&list, 1.0).is_some());
        assert!(active_caption_at(&list, 2.0).is_some());
        assert!(active_caption_at(&list, 0.99).is_none());
    }

    #[test]
    fn position_inside_exactly_one_range_yields_that_caption() {
        let list = captions(&[(0.0, 1.0, "a"), (2.0, 3.0, "b"), (4.0, 5.0, "c")]);
        let hit = active_caption_at(&list, 4.5).expect("caption c should be active");
        assert_eq!(hit.text, "c");
        assert_eq!(hit.id, list[2].id);
    }
}
