use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "Transcribe a video with whisper and mux the subtitles back in", long_about = None)]
pub struct Args {
    /// Input video file
    #[arg(required_unless_present = "write_default_config")]
    pub video: Option<PathBuf>,

    /// Two letter language code of the speech. Detected when omitted.
    pub language: Option<String>,

    /// Re-extract audio even if a cached extraction exists
    #[arg(short, long)]
    pub force: bool,

    /// Burn subtitles into the frames instead of adding a selectable track
    #[arg(long)]
    pub hard: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Write the default configuration to this path and exit
    #[arg(long, value_name = "PATH")]
    pub write_default_config: Option<PathBuf>,
}
