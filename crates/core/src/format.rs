use crate::types::Caption;

/// Format seconds as MM:SS timestamp
pub fn format_timestamp(seconds: f64) -> String {
    let mins = (seconds / 60.0) as u32;
    let secs = (seconds % 60.0) as u32;
    format!("{:02}:{:02}", mins, secs)
}

/// Format the caption list with timestamps, one line per caption
pub fn format_captions_with_timestamps(captions: &[Caption]) -> String {
    captions
        .iter()
        .map(|c| format!("[{} – {}] {}", format_timestamp(c.start), format_timestamp(c.end), c.text.trim()))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Plain caption text joined by newlines, for clipboard copy.
pub fn captions_text(captions: &[Caption]) -> String {
    captions
        .iter()
        .map(|c| c.text.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}
