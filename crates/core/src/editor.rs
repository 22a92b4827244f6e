use crate::types::CaptionId;

/// Presentation-side state for in-place caption editing.
///
/// At most one caption is in edit affordance at a time; opening another one
/// replaces the previous affordance (its draft is discarded, matching a
/// focus change in the UI). Committing yields the `(id, text)` pair to apply
/// through `Session::set_caption_text` — the commit itself is unconditional,
/// last-write-wins, and accepts empty text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditState {
    open: Option<(CaptionId, String)>,
}

impl EditState {
    /// Enter edit affordance for `id`, seeding the draft with the caption's
    /// current text.
    pub fn open(&mut self, id: CaptionId, current_text: &str) {
        self.open = Some((id, current_text.to_string()));
    }

    pub fn editing(&self) -> Option<CaptionId> {
        self.open.as_ref().map(|(id, _)| *id)
    }

    pub fn is_editing(&self, id: CaptionId) -> bool {
        self.editing() == Some(id)
    }

    pub fn draft(&self) -> Option<&str> {
        self.open.as_ref().map(|(_, text)| text.as_str())
    }

    pub fn set_draft(&mut self, text: String) {
        if let Some((_, draft)) = self.open.as_mut() {
            *draft = text;
        }
    }

    /// Leave edit affordance (blur or Enter), returning what to commit.
    pub fn commit(&mut self) -> Option<(CaptionId, String)> {
        self.open.take()
    }
}
