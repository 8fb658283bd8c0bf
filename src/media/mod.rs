// Media processing over the ffmpeg command line
//
// - Processor: MediaProcessorTrait implementation that runs ffmpeg
// - Commands: command builders, one per pipeline operation

pub mod commands;
pub mod processor;

use async_trait::async_trait;
use std::path::Path;

pub use commands::*;
pub use processor::*;

use crate::config::MediaConfig;
use crate::error::Result;
use crate::paths::subtitle_track_title;

/// How the subtitle ends up in the output video
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubtitleMode {
    /// Selectable track next to stream-copied video and audio
    Soft { language: String, title: String },
    /// Burned into re-encoded frames
    Hard { video_codec: String, audio_codec: String, options: Vec<String> },
}

impl SubtitleMode {
    /// Soft track tagged with `language`, titled after the subtitle file
    pub fn soft(language: &str, subtitle_path: &Path) -> Self {
        SubtitleMode::Soft {
            language: language.to_string(),
            title: subtitle_track_title(subtitle_path),
        }
    }

    /// Hard burn-in using the configured encoder settings
    pub fn hard(config: &MediaConfig) -> Self {
        SubtitleMode::Hard {
            video_codec: config.hard_video_codec.clone(),
            audio_codec: config.hard_audio_codec.clone(),
            options: config.subtitle_options.clone(),
        }
    }

    pub fn is_soft(&self) -> bool {
        matches!(self, SubtitleMode::Soft { .. })
    }
}

/// Main trait for media processing operations
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MediaProcessorTrait: Send + Sync {
    /// Decode the audio track of `video_path` into a WAV file at `audio_path`
    async fn extract_audio(&self, video_path: &Path, audio_path: &Path) -> Result<()>;

    /// Combine video and subtitle into `output_path`
    async fn mux_subtitles(
        &self,
        video_path: &Path,
        subtitle_path: &Path,
        output_path: &Path,
        mode: &SubtitleMode,
    ) -> Result<()>;

    /// Check if media processor is available
    async fn check_availability(&self) -> Result<()>;
}

/// Factory for creating media processor instances
pub struct MediaProcessorFactory;

impl MediaProcessorFactory {
    /// Create the default media processor implementation (FFmpeg-based)
    pub fn create_processor(config: MediaConfig) -> Box<dyn MediaProcessorTrait> {
        Box::new(processor::MediaProcessorImpl::new(config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_soft_mode_title_from_subtitle_file() {
        let mode = SubtitleMode::soft("en", Path::new("/v/sub-clip.en.srt"));
        assert_eq!(
            mode,
            SubtitleMode::Soft { language: "en".to_string(), title: "sub-clip.en".to_string() }
        );
        assert!(mode.is_soft());
    }

    #[test]
    fn test_hard_mode_from_config() {
        let mut config = MediaConfig::default();
        config.subtitle_options = vec!["-preset".into(), "fast".into()];

        let mode = SubtitleMode::hard(&config);
        assert!(!mode.is_soft());
        assert_eq!(
            mode,
            SubtitleMode::Hard {
                video_codec: "libx264".into(),
                audio_codec: "aac".into(),
                options: vec!["-preset".into(), "fast".into()],
            }
        );
    }
}
