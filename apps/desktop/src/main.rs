use std::path::PathBuf;

use iced::widget::{button, column, row, scrollable, slider, text, text_input};
use iced::{Element, Length, Task};

use reelsub_core::{
    clipboard,
    editor::EditState,
    format::format_timestamp,
    gemini::{GeminiConfig, GeminiTranscriber},
    media::MediaHandle,
    notice,
    session::{FailureKind, Phase, Session},
    sync::SyncOutcome,
    transcriber::Transcriber,
    types::{CaptionId, TranscriptCue},
};

fn init_logger() -> Result<(), fern::InitError> {
    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{}][{}][{:?}] {}",
                chrono::Local::now().format("%H:%M:%S"),
                record.target(),
                record.level(),
                message
            ))
        })
        .level(log::LevelFilter::Info)
        .chain(std::io::stderr())
        .apply()?;

    Ok(())
}

fn main() -> iced::Result {
    init_logger().ok();
    iced::application("ReelSub", App::update, App::view).run_with(App::new)
}

struct App {
    session: Session,
    edit: EditState,
    path_input: String,
    config: Option<GeminiConfig>,
}

#[derive(Clone)]
struct LoadedMedia {
    uri: String,
    mime: String,
    bytes: Vec<u8>,
}

impl std::fmt::Debug for LoadedMedia {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedMedia")
            .field("uri", &self.uri)
            .field("mime", &self.mime)
            .field("bytes", &self.bytes.len())
            .finish()
    }
}

#[derive(Debug, Clone)]
enum Message {
    PathChanged(String),
    LoadPressed,
    MediaLoaded(Result<LoadedMedia, FailureKind>),
    Transcribed(Result<Vec<TranscriptCue>, FailureKind>),
    PositionChanged(f64),
    CaptionClicked(CaptionId),
    EditRequested(CaptionId),
    DraftChanged(String),
    CommitEdit,
    CopyRequested(CaptionId),
    CopyFinished(Result<(), String>),
    NoticeExpired(u64),
    ResetPressed,
}

async fn load_media(path: PathBuf) -> Result<LoadedMedia, FailureKind> {
    let media = MediaHandle::load(&path).await.map_err(|e| {
        log::warn!("{e}");
        e.failure_kind()
    })?;
    Ok(LoadedMedia {
        uri: media.uri().to_string(),
        mime: media.mime().to_string(),
        bytes: media.bytes().to_vec(),
    })
}

async fn transcribe(
    config: GeminiConfig,
    bytes: Vec<u8>,
    mime: String,
) -> Result<Vec<TranscriptCue>, FailureKind> {
    GeminiTranscriber::new(config)
        .transcribe(&bytes, &mime)
        .await
        .map_err(|e| {
            log::warn!("{e}");
            e.failure_kind()
        })
}

impl App {
    fn new() -> (Self, Task<Message>) {
        let config = GeminiConfig::from_env()
            .inspect_err(|e| log::warn!("{e}"))
            .ok();
        (
            Self {
                session: Session::new(),
                edit: EditState::default(),
                path_input: String::new(),
                config,
            },
            Task::none(),
        )
    }

    fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::PathChanged(path) => {
                self.path_input = path;
                Task::none()
            }
            Message::LoadPressed => {
                let path = self.path_input.trim().to_string();
                if path.is_empty() {
                    return Task::none();
                }
                if let Err(e) = self.session.accept_file() {
                    log::warn!("{e}");
                    return Task::none();
                }
                Task::perform(load_media(PathBuf::from(path)), Message::MediaLoaded)
            }
            Message::MediaLoaded(Ok(loaded)) => {
                let bytes = loaded.bytes.clone();
                let mime = loaded.mime.clone();
                let handle = MediaHandle::new(loaded.uri, loaded.mime, loaded.bytes);
                let prepared = self
                    .session
                    .attach_media(handle)
                    .and_then(|_| self.session.begin_transcription());
                if let Err(e) = prepared {
                    log::warn!("{e}");
                    return Task::none();
                }
                match self.config.clone() {
                    Some(config) => {
                        Task::perform(transcribe(config, bytes, mime), Message::Transcribed)
                    }
                    None => {
                        let _ = self.session.fail(FailureKind::Transcription);
                        Task::none()
                    }
                }
            }
            Message::MediaLoaded(Err(kind)) => {
                let _ = self.session.fail(kind);
                Task::none()
            }
            Message::Transcribed(Ok(cues)) => {
                if let Err(e) = self.session.finish_transcription(cues) {
                    let kind = e.failure_kind();
                    log::warn!("{e}");
                    let _ = self.session.fail(kind);
                }
                Task::none()
            }
            Message::Transcribed(Err(kind)) => {
                let _ = self.session.fail(kind);
                Task::none()
            }
            Message::PositionChanged(position) => {
                let outcome = self.session.sample_position(position);
                self.apply_sync(outcome)
            }
            Message::CaptionClicked(id) => match self.session.seek_to_caption(id) {
                Ok(seek) => self.apply_sync(seek.outcome),
                Err(e) => {
                    log::warn!("{e}");
                    Task::none()
                }
            },
            Message::EditRequested(id) => {
                if let Some(current) = self.session.caption(id).map(|c| c.text.clone()) {
                    self.edit.open(id, &current);
                }
                Task::none()
            }
            Message::DraftChanged(draft) => {
                self.edit.set_draft(draft);
                Task::none()
            }
            Message::CommitEdit => {
                if let Some((id, committed)) = self.edit.commit() {
                    if let Err(e) = self.session.set_caption_text(id, committed) {
                        log::warn!("{e}");
                    }
                }
                Task::none()
            }
            Message::CopyRequested(id) => {
                let Some(copied) = self.session.caption(id).map(|c| c.text.clone()) else {
                    return Task::none();
                };
                let generation = self.session.show_notice("Copied!");
                Task::batch([
                    Task::perform(
                        async move { clipboard::copy_text(&copied).await.map_err(|e| e.to_string()) },
                        Message::CopyFinished,
                    ),
                    Task::perform(notice::expiry_timer(generation), Message::NoticeExpired),
                ])
            }
            Message::CopyFinished(result) => {
                if let Err(reason) = result {
                    log::warn!("clipboard copy failed: {reason}");
                }
                Task::none()
            }
            Message::NoticeExpired(generation) => {
                self.session.expire_notice(generation);
                Task::none()
            }
            Message::ResetPressed => {
                match self.session.reset() {
                    Ok(()) => self.edit = EditState::default(),
                    Err(e) => log::warn!("{e}"),
                }
                Task::none()
            }
        }
    }

    fn apply_sync(&self, outcome: SyncOutcome) -> Task<Message> {
        match outcome {
            SyncOutcome::Activated(id) => self.scroll_to(id),
            SyncOutcome::Unchanged | SyncOutcome::Cleared => Task::none(),
        }
    }

    /// Bring a caption's list entry into view; issued only when the active
    /// caption changes.
    fn scroll_to(&self, id: CaptionId) -> Task<Message> {
        let captions = self.session.captions();
        let Some(index) = captions.iter().position(|c| c.id == id) else {
            return Task::none();
        };
        let y = if captions.len() <= 1 {
            0.0
        } else {
            index as f32 / (captions.len() - 1) as f32
        };
        scrollable::snap_to(
            scrollable::Id::new("captions"),
            scrollable::RelativeOffset { x: 0.0, y },
        )
    }

    fn view(&self) -> Element<'_, Message> {
        match self.session.phase() {
            Phase::Idle => {
                let mut screen = column![
                    text("ReelSub").size(28),
                    text("Bilingual (RU/FR) one-line captions for your Reels").size(14),
                    text_input("Path to a video file...", &self.path_input)
                        .on_input(Message::PathChanged)
                        .on_submit(Message::LoadPressed),
                    button("Generate captions").on_press(Message::LoadPressed),
                ];
                if self.config.is_none() {
                    screen = screen
                        .push(text("GEMINI_API_KEY is not set; transcription will fail").size(12));
                }
                screen.padding(20).spacing(10).into()
            }
            Phase::Uploading => column![text("Loading media...").size(20)].padding(20).into(),
            Phase::Processing => column![
                text("AI is transcribing...").size(20),
                text("Analyzing bilingual context and segmenting lines...").size(14),
            ]
            .padding(20)
            .spacing(10)
            .into(),
            Phase::Error => column![
                text("Processing error").size(20),
                text(self.session.error_detail().unwrap_or("Unknown error")).size(14),
                button("Try again").on_press(Message::ResetPressed),
            ]
            .padding(20)
            .spacing(10)
            .into(),
            Phase::Ready => self.view_ready(),
        }
    }

    fn view_ready(&self) -> Element<'_, Message> {
        let captions = self.session.captions();
        let timeline_end = captions.iter().fold(0.1_f64, |acc, c| acc.max(c.end));

        let mut list = column![].spacing(8);
        for caption in captions {
            let is_active = self.session.active_caption() == Some(caption.id);
            let times = format!(
                "[{} – {}]",
                format_timestamp(caption.start),
                format_timestamp(caption.end)
            );

            let body: Element<'_, Message> = if self.edit.is_editing(caption.id) {
                text_input("Caption text", self.edit.draft().unwrap_or(""))
                    .on_input(Message::DraftChanged)
                    .on_submit(Message::CommitEdit)
                    .into()
            } else {
                let marker = if is_active { "▶ " } else { "" };
                text(format!("{marker}{}", caption.text)).size(14).into()
            };

            list = list.push(
                column![
                    row![
                        button(text(times).size(12)).on_press(Message::CaptionClicked(caption.id)),
                        button(text("Edit").size(12)).on_press(Message::EditRequested(caption.id)),
                        button(text("Copy").size(12)).on_press(Message::CopyRequested(caption.id)),
                    ]
                    .spacing(8),
                    body,
                ]
                .spacing(4),
            );
        }

        let mut screen = column![
            row![
                text(format!("{} captions", captions.len())).size(14),
                button("Start new project").on_press(Message::ResetPressed),
            ]
            .spacing(12),
            text(self.session.active_caption_text().unwrap_or("")).size(22),
            row![
                text(format_timestamp(self.session.position())).size(12),
                slider(
                    0.0..=timeline_end,
                    self.session.position(),
                    Message::PositionChanged
                )
                .step(0.05),
            ]
            .spacing(8),
            scrollable(list)
                .id(scrollable::Id::new("captions"))
                .height(Length::Fill),
        ]
        .padding(20)
        .spacing(12);

        if let Some(notice) = self.session.notice() {
            screen = screen.push(text(notice.message()).size(14));
        }
        screen.into()
    }
}
