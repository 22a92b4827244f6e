use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose::STANDARD};
use serde::{Deserialize, Serialize};

use crate::{
    error::{ReelsubError, Result},
    transcriber::Transcriber,
    types::TranscriptCue,
};

pub const DEFAULT_MODEL: &str = "gemini-3-flash-preview";
const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";
const API_KEY_ENV: &str = "GEMINI_API_KEY";

const PROMPT: &str = "You are a professional subtitle editor for short vertical videos. \
Transcribe this video, which may contain speech in Russian (RU) and French (FR), into \
one-line subtitles of 18-26 characters (hard limits 5-30) lasting 1.0-2.2 seconds each, \
split at logical pauses. Return ONLY JSON of the form \
{\"subtitles\": [{\"start\": 0.0, \"end\": 1.5, \"text\": \"...\"}]} with times in seconds.";

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_base: String,
    pub model: String,
    pub api_key: String,
}

impl GeminiConfig {
    /// Read the API key from the environment; fails early so no work is
    /// started without credentials.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var(API_KEY_ENV).map_err(|_| ReelsubError::MissingApiKey {
            env_var: API_KEY_ENV,
        })?;
        Ok(Self {
            api_base: API_BASE.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/{}:generateContent", self.api_base, self.model)
    }
}

#[derive(Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

#[derive(Serialize)]
struct InlineData {
    #[serde(rename = "mimeType")]
    mime_type: String,
    data: String,
}

#[derive(Serialize)]
struct GenerationConfig {
    #[serde(rename = "responseMimeType")]
    response_mime_type: String,
    temperature: f32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(rename = "promptFeedback")]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

#[derive(Deserialize)]
struct PromptFeedback {
    #[serde(rename = "blockReason")]
    block_reason: Option<String>,
}

/// The fixed payload contract: `{"subtitles": [{start, end, text}]}`.
#[derive(Deserialize)]
struct TranscriptPayload {
    subtitles: Vec<TranscriptCue>,
}

/// Parse the model's text output into cues. All-or-nothing: a malformed
/// payload or a single mistimed cue fails the whole transcription.
fn parse_cues(raw: &str) -> Result<Vec<TranscriptCue>> {
    let trimmed = strip_fences(raw);
    let payload: TranscriptPayload =
        serde_json::from_str(trimmed).map_err(|e| ReelsubError::TranscriptionFailed {
            reason: format!("malformed transcription payload: {e}"),
        })?;
    if let Some((index, cue)) = payload
        .subtitles
        .iter()
        .enumerate()
        .find(|(_, c)| !c.is_well_timed())
    {
        return Err(ReelsubError::TranscriptionFailed {
            reason: format!("cue {} has invalid timing {}..{}", index, cue.start, cue.end),
        });
    }
    Ok(payload.subtitles)
}

/// Models sometimes wrap JSON output in a markdown code fence despite the
/// requested MIME type.
fn strip_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let inner = inner.strip_prefix("json").unwrap_or(inner);
    inner.strip_suffix("```").unwrap_or(inner).trim()
}

/// Transcription via the Gemini `generateContent` endpoint: the media bytes
/// travel inline (base64) next to the prompt, and the model answers with the
/// JSON subtitle payload.
pub struct GeminiTranscriber {
    client: reqwest::Client,
    config: GeminiConfig,
}

impl GeminiTranscriber {
    pub fn new(config: GeminiConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }
}

#[async_trait]
impl Transcriber for GeminiTranscriber {
    async fn transcribe(&self, media: &[u8], mime: &str) -> Result<Vec<TranscriptCue>> {
        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![
                    Part::Text {
                        text: PROMPT.to_string(),
                    },
                    Part::InlineData {
                        inline_data: InlineData {
                            mime_type: mime.to_string(),
                            data: STANDARD.encode(media),
                        },
                    },
                ],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json".to_string(),
                temperature: 0.2,
            },
        };

        log::debug!(
            "requesting transcription: {} bytes of {mime} via {}",
            media.len(),
            self.config.model
        );

        let response = self
            .client
            .post(self.config.endpoint())
            .header("x-goog-api-key", &self.config.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ReelsubError::TranscriptionFailed {
                reason: format!("transcription service returned HTTP {status}"),
            });
        }

        let body: GenerateResponse = response.json().await?;

        if let Some(reason) = body
            .prompt_feedback
            .and_then(|feedback| feedback.block_reason)
        {
            return Err(ReelsubError::TranscriptionFailed {
                reason: format!("prompt blocked: {reason}"),
            });
        }

        let text: String = body
            .candidates
            .into_iter()
            .next()
            .map(|candidate| {
                candidate
                    .content
                    .parts
                    .into_iter()
                    .map(|part| part.text)
                    .collect()
            })
            .ok_or_else(|| ReelsubError::TranscriptionFailed {
                reason: "empty response from transcription service".to_string(),
            })?;

        let cues = parse_cues(&text)?;
        log::info!("transcription returned {} cues", cues.len());
        Ok(cues)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_the_subtitle_payload() {
        let cues = parse_cues(
            r#"{"subtitles": [
                {"start": 0.0, "end": 1.5, "text": "Привет всем"},
                {"start": 1.6, "end": 3.0, "text": "Bonjour à tous"}
            ]}"#,
        )
        .unwrap();
        assert_eq!(cues.len(), 2);
        assert_eq!(cues[0].text, "Привет всем");
        assert_eq!(cues[1].start, 1.6);
    }

    #[test]
    fn tolerates_a_markdown_fence() {
        let cues = parse_cues(
            "```json\n{\"subtitles\": [{\"start\": 0.0, \"end\": 1.0, \"text\": \"ok\"}]}\n```",
        )
        .unwrap();
        assert_eq!(cues.len(), 1);
    }

    #[test]
    fn malformed_payload_is_a_transcription_failure() {
        let err = parse_cues("{\"subtitles\": oops").unwrap_err();
        assert!(matches!(err, ReelsubError::TranscriptionFailed { .. }));
    }

    #[test]
    fn a_single_mistimed_cue_fails_the_whole_payload() {
        let err = parse_cues(
            r#"{"subtitles": [
                {"start": 0.0, "end": 1.0, "text": "ok"},
                {"start": 2.0, "end": 1.0, "text": "inverted"}
            ]}"#,
        )
        .unwrap_err();
        assert!(matches!(err, ReelsubError::TranscriptionFailed { .. }));
    }

    #[test]
    fn request_serializes_with_the_wire_field_names() {
        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![
                    Part::Text {
                        text: "prompt".to_string(),
                    },
                    Part::InlineData {
                        inline_data: InlineData {
                            mime_type: "video/mp4".to_string(),
                            data: STANDARD.encode(b"bytes"),
                        },
                    },
                ],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json".to_string(),
                temperature: 0.2,
            },
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["contents"][0]["parts"][0]["text"], "prompt");
        assert_eq!(
            value["contents"][0]["parts"][1]["inlineData"]["mimeType"],
            "video/mp4"
        );
        assert_eq!(
            value["generationConfig"]["responseMimeType"],
            "application/json"
        );
    }
}
