use serde::{Deserialize, Serialize};
use std::path::Path;
use crate::error::{Result, VidsubError};

/// Default config file looked up in the current directory
pub const DEFAULT_CONFIG_FILE: &str = "vidsub.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub transcriber: TranscriberConfig,
    pub media: MediaConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriberConfig {
    /// Path to the speech recognition binary (openai-whisper CLI)
    pub binary_path: String,
    /// Model size passed as `--model`
    pub model: String,
    /// Extra arguments appended to every whisper invocation
    pub extra_args: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaConfig {
    /// Path to ffmpeg binary
    pub binary_path: String,
    /// Sample rate of the extracted audio
    pub audio_sample_rate: u32,
    /// Channel count of the extracted audio
    pub audio_channels: u32,
    /// Video encoder used when burning subtitles in
    pub hard_video_codec: String,
    /// Audio encoder used when burning subtitles in. The output is always mp4,
    /// so source audio is re-encoded rather than copied.
    pub hard_audio_codec: String,
    /// Additional encoding options for hard subtitle burning
    /// Common options: ["-preset", "medium", "-crf", "23", "-pix_fmt", "yuv420p"]
    pub subtitle_options: Vec<String>,
}

impl Default for TranscriberConfig {
    fn default() -> Self {
        Self {
            binary_path: "whisper".to_string(),
            model: "small".to_string(),
            extra_args: Vec::new(),
        }
    }
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            binary_path: "ffmpeg".to_string(),
            audio_sample_rate: 16000,
            audio_channels: 1,
            hard_video_codec: "libx264".to_string(),
            hard_audio_codec: "aac".to_string(),
            subtitle_options: vec![
                // "-preset".to_string(), "medium".to_string(),
                // "-crf".to_string(), "23".to_string(),
            ],
        }
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| VidsubError::Config(format!("Failed to read config file: {}", e)))?;

        toml::from_str(&content)
            .map_err(|e| VidsubError::Config(format!("Failed to parse config file: {}", e)))
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| VidsubError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| VidsubError::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }
}
