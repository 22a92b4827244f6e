use std::path::Path;

use crate::{error::Result, types::Caption};

fn to_millis(seconds: f64) -> u64 {
    (seconds * 1000.0).round() as u64
}

fn srt_time(seconds: f64) -> String {
    let ms = to_millis(seconds);
    let hours = ms / 3_600_000;
    let mins = (ms % 3_600_000) / 60_000;
    let secs = (ms % 60_000) / 1_000;
    let millis = ms % 1_000;
    format!("{:02}:{:02}:{:02},{:03}", hours, mins, secs, millis)
}

fn vtt_time(seconds: f64) -> String {
    let ms = to_millis(seconds);
    let hours = ms / 3_600_000;
    let mins = (ms % 3_600_000) / 60_000;
    let secs = (ms % 60_000) / 1_000;
    let millis = ms % 1_000;
    format!("{:02}:{:02}:{:02}.{:03}", hours, mins, secs, millis)
}

/// Render the caption list as SubRip text.
pub fn srt(captions: &[Caption]) -> String {
    let mut out = String::new();
    for (i, caption) in captions.iter().enumerate() {
        out.push_str(&format!("{}\n", i + 1));
        out.push_str(&format!(
            "{} --> {}\n",
            srt_time(caption.start),
            srt_time(caption.end)
        ));
        out.push_str(&caption.text);
        out.push_str("\n\n");
    }
    out
}

/// Render the caption list as WebVTT text.
pub fn vtt(captions: &[Caption]) -> String {
    let mut out = String::from("WEBVTT\n\n");
    for caption in captions {
        out.push_str(&format!(
            "{} --> {}\n",
            vtt_time(caption.start),
            vtt_time(caption.end)
        ));
        out.push_str(&caption.text);
        out.push_str("\n\n");
    }
    out
}

pub fn write_srt(path: &Path, captions: &[Caption]) -> Result<()> {
    std::fs::write(path, srt(captions))?;
    Ok(())
}

pub fn write_vtt(path: &Path, captions: &[Caption]) -> Result<()> {
    std::fs::write(path, vtt(captions))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TranscriptCue;

    fn captions() -> Vec<Caption> {
        [
            (0.0, 1.5, "Привет всем"),
            (61.25, 63.0, "Bonjour à tous"),
        ]
        .into_iter()
        .map(|(start, end, text)| {
            Caption::from_cue(TranscriptCue {
                start,
                end,
                text: text.to_string(),
            })
        })
        .collect()
    }

    #[test]
    fn srt_numbers_cues_and_uses_comma_millis() {
        let rendered = srt(&captions());
        assert!(rendered.starts_with("1\n00:00:00,000 --> 00:00:01,500\nПривет всем\n\n"));
        assert!(rendered.contains("2\n00:01:01,250 --> 00:01:03,000\nBonjour à tous\n\n"));
    }

    #[test]
    fn vtt_has_header_and_dot_millis() {
        let rendered = vtt(&captions());
        assert!(rendered.starts_with("WEBVTT\n\n"));
        assert!(rendered.contains("00:00:00.000 --> 00:00:01.500\nПривет всем\n\n"));
    }

    #[test]
    fn writes_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("captions.srt");
        write_srt(&path, &captions()).unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("Привет всем"));
    }
}
