use std::{
    path::PathBuf,
    time::{Duration, Instant},
};

use anyhow::Result;
use clap::{Parser, ValueEnum};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::fs;

use reelsub_core::{
    ReelsubError,
    cache::{get_cache_dir, get_transcript_path},
    clipboard, export,
    format::{captions_text, format_captions_with_timestamps},
    gemini::{DEFAULT_MODEL, GeminiConfig, GeminiTranscriber},
    media::MediaHandle,
    session::Session,
    transcriber::Transcriber,
    types::TranscriptCue,
};

fn format_duration(d: Duration) -> String {
    let secs = d.as_secs_f64();
    if secs < 60.0 {
        format!("{:.1}s", secs)
    } else {
        format!("{:.0}m {:.0}s", secs / 60.0, secs % 60.0)
    }
}

#[derive(Clone, Copy, Default, ValueEnum)]
enum OutputFormat {
    /// Timestamped caption lines
    #[default]
    Text,
    /// SubRip subtitles
    Srt,
    /// WebVTT subtitles
    Vtt,
    /// Raw caption JSON
    Json,
}

#[derive(Parser)]
#[command(name = "reelsub")]
#[command(about = "Generate bilingual (RU/FR) one-line captions for short videos with Gemini")]
struct Cli {
    /// Path to the video file
    video: PathBuf,

    /// Gemini model to transcribe with
    #[arg(short, long, default_value = DEFAULT_MODEL)]
    model: String,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Write the output to this file instead of stdout
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// Copy the caption text to the system clipboard
    #[arg(short, long)]
    copy: bool,

    /// Force re-transcription even if a cached transcript exists
    #[arg(long)]
    force: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn init_logger(verbose: bool) -> std::result::Result<(), fern::InitError> {
    let level = if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Warn
    };

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
        .level(level)
        .chain(std::io::stderr())
        .apply()?;

    Ok(())
}

fn create_spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
            .template("{spinner:.cyan} {msg}")
            .unwrap(),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

/// Record the failure on the session and exit with its user-facing message,
/// keeping the underlying cause on a dim second line.
fn bail(session: &mut Session, err: ReelsubError) -> ! {
    if session.fail(err.failure_kind()).is_err() {
        log::warn!("failure outside an active session phase: {err}");
    }
    eprintln!(
        "\n{} {}",
        style("✗").red().bold(),
        style(session.error_detail().unwrap_or("Unexpected failure.")).red()
    );
    eprintln!("  {}", style(format!("{err}")).dim());
    std::process::exit(1);
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logger(cli.verbose).ok();

    // Validate API key early
    let mut config = match GeminiConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            std::process::exit(1);
        }
    };
    config.model = cli.model.clone();

    println!(
        "\n{}  {}\n",
        style("reelsub").cyan().bold(),
        style("AI Caption Studio").dim()
    );

    let cache_dir = get_cache_dir(&cli.video);
    fs::create_dir_all(&cache_dir).await?;
    let transcript_path = get_transcript_path(&cache_dir);

    let total_start = Instant::now();
    let mut session = Session::new();
    session.accept_file()?;

    // Step 1: Load the video
    let step_start = Instant::now();
    let spinner = create_spinner("Reading video...");
    let media = match MediaHandle::load(&cli.video).await {
        Ok(media) => media,
        Err(e) => {
            spinner.finish_and_clear();
            bail(&mut session, e);
        }
    };
    let media_bytes = media.bytes().to_vec();
    let media_mime = media.mime().to_string();
    let file_name = cli
        .video
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| cli.video.display().to_string());
    session.attach_media(media)?;
    spinner.finish_with_message(format!(
        "{} Loaded: {} {}",
        style("✓").green().bold(),
        style(&file_name).dim(),
        style(format!(
            "[{} KiB, {}]",
            media_bytes.len() / 1024,
            format_duration(step_start.elapsed())
        ))
        .dim()
    ));

    // Step 2: Transcribe (check cache)
    session.begin_transcription()?;
    let step_start = Instant::now();
    let cues: Vec<TranscriptCue> = if !cli.force && transcript_path.exists() {
        let raw = fs::read_to_string(&transcript_path).await?;
        let cues = serde_json::from_str(&raw)?;
        println!(
            "{} Transcribed {}",
            style("✓").green().bold(),
            style("(cached)").dim()
        );
        cues
    } else {
        let spinner = create_spinner(&format!("Transcribing with {}...", config.model));
        let transcriber = GeminiTranscriber::new(config);
        match transcriber.transcribe(&media_bytes, &media_mime).await {
            Ok(cues) => {
                fs::write(&transcript_path, serde_json::to_string_pretty(&cues)?).await?;
                spinner.finish_with_message(format!(
                    "{} Transcribed: {} captions {}",
                    style("✓").green().bold(),
                    cues.len(),
                    style(format!("[{}]", format_duration(step_start.elapsed()))).dim()
                ));
                cues
            }
            Err(e) => {
                spinner.finish_and_clear();
                bail(&mut session, e);
            }
        }
    };

    if let Err(e) = session.finish_transcription(cues) {
        bail(&mut session, e);
    }

    println!(
        "\n{} {}\n",
        style("Total time:").dim(),
        style(format_duration(total_start.elapsed())).cyan().bold()
    );
    println!("{}", style("─".repeat(60)).dim());

    let rendered = match cli.format {
        OutputFormat::Text => format_captions_with_timestamps(session.captions()),
        OutputFormat::Srt => export::srt(session.captions()),
        OutputFormat::Vtt => export::vtt(session.captions()),
        OutputFormat::Json => serde_json::to_string_pretty(session.captions())?,
    };

    match &cli.out {
        Some(path) => {
            fs::write(path, &rendered).await?;
            println!("{} {}", style("Saved:").dim(), style(path.display()).cyan());
        }
        None => println!("{rendered}"),
    }

    if cli.copy {
        let caption_count = session.captions().len();
        let plain = captions_text(session.captions());
        match clipboard::copy_text(&plain).await {
            Ok(()) => {
                session.show_notice(format!("Copied {caption_count} captions to clipboard"));
                if let Some(notice) = session.notice() {
                    println!(
                        "\n{} {}",
                        style("✓").green().bold(),
                        style(notice.message()).green()
                    );
                }
            }
            Err(e) => log::warn!("{e}"),
        }
    }

    Ok(())
}
