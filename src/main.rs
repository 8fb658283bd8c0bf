//! vidsub - transcribe a video and mux the subtitles back in
//!
//! Extracts the audio track with ffmpeg, transcribes it with whisper, writes
//! an SRT file and muxes it into `with-subtitles-<name>.mp4`.

use anyhow::Result;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::time::Duration;
use tracing::{info, Level};
use tracing_appender::{non_blocking, non_blocking::WorkerGuard, rolling};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use vidsub::cli::Args;
use vidsub::config::{Config, DEFAULT_CONFIG_FILE};
use vidsub::request::PipelineRequest;
use vidsub::workflow::Workflow;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    if let Some(path) = &args.write_default_config {
        Config::default().save_to_file(path)?;
        println!("Wrote default configuration to {}", path.display());
        return Ok(());
    }

    // Keep the guard alive so buffered file logs are flushed on exit
    let _guard = setup_logging(args.verbose)?;

    let config = match &args.config {
        Some(config_path) => Config::from_file(config_path)?,
        None => {
            if Path::new(DEFAULT_CONFIG_FILE).exists() {
                info!("Found {} in current directory, loading...", DEFAULT_CONFIG_FILE);
                Config::from_file(DEFAULT_CONFIG_FILE)?
            } else {
                Config::default()
            }
        }
    };

    let video = args
        .video
        .ok_or_else(|| anyhow::anyhow!("Expected path to the video file"))?;
    let request = PipelineRequest::new(&video, args.language.as_deref(), args.force, !args.hard)?;

    println!("Parsed information");
    println!("=======================");
    println!("Video: {}", request.video_path.display());
    if let Some(language) = &request.language_hint {
        println!("Language: {}", language);
    }
    println!("Subtitles: {}", if request.soft_subtitle { "soft" } else { "hard" });
    println!("=======================");

    let workflow = Workflow::new(config).await?;

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")?,
    );
    spinner.enable_steady_tick(Duration::from_millis(120));
    spinner.set_message("Running pipeline...");

    let result = workflow
        .process_with_progress(&request, |segment| {
            spinner.println(format!(
                "[{:.2}s -> {:.2}s] {}",
                segment.start, segment.end, segment.text
            ));
            spinner.set_message(format!("Transcribed up to {:.2}s", segment.end));
        })
        .await;
    spinner.finish_and_clear();

    let output = result?;
    println!("Transcription language: {}", output.language);
    println!("Audio:     {}", output.audio_path.display());
    println!("Subtitles: {}", output.subtitle_path.display());
    println!("Output:    {}", output.output_path.display());

    info!("vidsub completed successfully");
    Ok(())
}

/// Setup logging to both console and file
fn setup_logging(verbose: bool) -> Result<WorkerGuard> {
    let log_dir = std::env::current_dir()?.join(".vidsub").join("log");
    std::fs::create_dir_all(&log_dir)?;

    // Set up file appender with daily rotation
    let file_appender = rolling::daily(&log_dir, "vidsub.log");
    let (non_blocking_file, guard) = non_blocking(file_appender);

    let log_level = if verbose { Level::DEBUG } else { Level::INFO };

    let console_layer = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    let file_layer = fmt::layer()
        .with_writer(non_blocking_file)
        .with_target(false)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(false); // No ANSI colors in file

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    info!("Logging initialized - console: {}, file: {}",
          log_level, log_dir.join("vidsub.log").display());

    Ok(guard)
}
