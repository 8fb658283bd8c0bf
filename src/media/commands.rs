use std::path::Path;
use tokio::process::Command;
use tracing::debug;

use crate::error::{Result, VidsubError};
use super::SubtitleMode;

/// Abstract media processing command representation
#[derive(Debug, Clone)]
pub struct MediaCommand {
    pub binary_path: String,
    pub args: Vec<String>,
    pub description: String,
}

impl MediaCommand {
    /// Create a new media processing command
    pub fn new<S1: Into<String>, S2: Into<String>>(binary_path: S1, description: S2) -> Self {
        Self {
            binary_path: binary_path.into(),
            args: Vec::new(),
            description: description.into(),
        }
    }

    /// Add an argument
    pub fn arg<S: Into<String>>(mut self, arg: S) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Add multiple arguments
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(|s| s.into()));
        self
    }

    /// Add input file
    pub fn input<P: AsRef<Path>>(self, path: P) -> Self {
        self.arg("-i").arg(path.as_ref().to_string_lossy().to_string())
    }

    /// Add output file
    pub fn output<P: AsRef<Path>>(self, path: P) -> Self {
        self.arg(path.as_ref().to_string_lossy().to_string())
    }

    /// Force overwrite output
    pub fn overwrite(self) -> Self {
        self.arg("-y")
    }

    /// Select streams for the output, e.g. `0:v` or `0:a?`
    pub fn map<S: Into<String>>(self, spec: S) -> Self {
        self.arg("-map").arg(spec)
    }

    /// Set codec for every selected stream
    pub fn codec<S: Into<String>>(self, codec: S) -> Self {
        self.arg("-c").arg(codec)
    }

    /// Set video codec
    pub fn video_codec<S: Into<String>>(self, codec: S) -> Self {
        self.arg("-c:v").arg(codec)
    }

    /// Set audio codec
    pub fn audio_codec<S: Into<String>>(self, codec: S) -> Self {
        self.arg("-c:a").arg(codec)
    }

    /// Set subtitle codec
    pub fn subtitle_codec<S: Into<String>>(self, codec: S) -> Self {
        self.arg("-c:s").arg(codec)
    }

    /// Disable video
    pub fn no_video(self) -> Self {
        self.arg("-vn")
    }

    /// Disable subtitle streams
    pub fn no_subtitles(self) -> Self {
        self.arg("-sn")
    }

    /// Set audio sample rate
    pub fn audio_sample_rate(self, rate: u32) -> Self {
        self.arg("-ar").arg(rate.to_string())
    }

    /// Set audio channels
    pub fn audio_channels(self, channels: u32) -> Self {
        self.arg("-ac").arg(channels.to_string())
    }

    /// Force the container format
    pub fn format<S: Into<String>>(self, format: S) -> Self {
        self.arg("-f").arg(format)
    }

    /// Add video filter
    pub fn video_filter<S: Into<String>>(self, filter: S) -> Self {
        self.arg("-vf").arg(filter)
    }

    /// Set `key=value` metadata on the first subtitle stream of the output
    pub fn subtitle_metadata(self, key: &str, value: &str) -> Self {
        self.arg("-metadata:s:s:0").arg(format!("{}={}", key, value))
    }

    /// Execute the command and wait for it to finish
    pub async fn execute(&self) -> Result<()> {
        debug!("Executing media processing command: {} {:?}", self.binary_path, self.args);
        debug!("Description: {}", self.description);

        let output = Command::new(&self.binary_path)
            .args(&self.args)
            .output()
            .await
            .map_err(|e| VidsubError::Media(format!("Failed to execute media processor: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(VidsubError::Media(format!(
                "{} failed: {}",
                self.description,
                stderr.trim_end()
            )));
        }

        Ok(())
    }
}

/// Builder for the ffmpeg invocations the pipeline needs
#[derive(Debug, Clone)]
pub struct MediaCommandBuilder {
    binary_path: String,
}

impl MediaCommandBuilder {
    /// Create a new command builder
    pub fn new<S: Into<String>>(binary_path: S) -> Self {
        Self {
            binary_path: binary_path.into(),
        }
    }

    /// Build audio extraction command (mono 16-bit PCM WAV)
    pub fn extract_audio<P: AsRef<Path>>(
        &self,
        video_path: P,
        audio_path: P,
        sample_rate: u32,
        channels: u32,
    ) -> MediaCommand {
        MediaCommand::new(&self.binary_path, "Audio extraction")
            .overwrite()
            .input(video_path)
            .no_video()
            .audio_codec("pcm_s16le")
            .audio_sample_rate(sample_rate)
            .audio_channels(channels)
            .format("wav")
            .output(audio_path)
    }

    /// Build the mux command for the selected subtitle mode
    pub fn mux_subtitles<P: AsRef<Path>>(
        &self,
        video_path: P,
        subtitle_path: P,
        output_path: P,
        mode: &SubtitleMode,
    ) -> MediaCommand {
        match mode {
            SubtitleMode::Soft { language, title } => {
                self.soft_subtitles(video_path, subtitle_path, output_path, language, title)
            }
            SubtitleMode::Hard { video_codec, audio_codec, options } => {
                self.hard_subtitles(video_path, subtitle_path, output_path, video_codec, audio_codec, options)
            }
        }
    }

    /// Streams are copied untouched; the SRT becomes a selectable mov_text track.
    fn soft_subtitles<P: AsRef<Path>>(
        &self,
        video_path: P,
        subtitle_path: P,
        output_path: P,
        language: &str,
        title: &str,
    ) -> MediaCommand {
        MediaCommand::new(&self.binary_path, "Soft subtitle muxing")
            .overwrite()
            .input(video_path)
            .input(subtitle_path)
            .map("0:v")
            .map("0:a?")
            .map("1:0")
            .codec("copy")
            .subtitle_codec("mov_text")
            .subtitle_metadata("language", language)
            .subtitle_metadata("title", title)
            .output(output_path)
    }

    /// Video is re-encoded with the subtitle drawn into the frames.
    fn hard_subtitles<P: AsRef<Path>>(
        &self,
        video_path: P,
        subtitle_path: P,
        output_path: P,
        video_codec: &str,
        audio_codec: &str,
        additional_options: &[String],
    ) -> MediaCommand {
        let subtitle_path = subtitle_path.as_ref().to_string_lossy();

        MediaCommand::new(&self.binary_path, "Hard subtitle burning")
            .overwrite()
            .input(video_path)
            .video_filter(format!("subtitles={}", escape_filter_value(&subtitle_path)))
            .video_codec(video_codec)
            .audio_codec(audio_codec)
            .no_subtitles()
            .args(additional_options.iter().cloned())
            .output(output_path)
    }

    /// Build version check command
    pub fn version_check(&self) -> MediaCommand {
        MediaCommand::new(&self.binary_path, "Version check")
            .arg("-version")
    }
}

/// Escape a filter option value for use inside `-vf`.
///
/// ffmpeg unescapes twice: once when splitting the filtergraph and once when
/// parsing the filter's options, so special characters get two levels.
pub fn escape_filter_value(value: &str) -> String {
    let option_level = escape_chars(value, &['\\', ':', '\'']);
    escape_chars(&option_level, &['\\', '\'', '[', ']', ',', ';'])
}

fn escape_chars(value: &str, special: &[char]) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if special.contains(&c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builder() -> MediaCommandBuilder {
        MediaCommandBuilder::new("ffmpeg")
    }

    fn position(args: &[String], needle: &str) -> usize {
        args.iter()
            .position(|a| a == needle)
            .unwrap_or_else(|| panic!("{} missing from {:?}", needle, args))
    }

    #[test]
    fn test_extract_audio_command() {
        let cmd = builder().extract_audio("/v/clip.mp4", "/v/audio-clip.wav.part", 16000, 1);
        assert_eq!(cmd.binary_path, "ffmpeg");
        assert_eq!(
            cmd.args,
            vec![
                "-y", "-i", "/v/clip.mp4", "-vn", "-c:a", "pcm_s16le", "-ar", "16000", "-ac", "1",
                "-f", "wav", "/v/audio-clip.wav.part",
            ]
        );
    }

    #[test]
    fn test_soft_mux_copies_streams_and_tags_track() {
        let mode = SubtitleMode::Soft {
            language: "en".to_string(),
            title: "sub-clip.en".to_string(),
        };
        let cmd = builder().mux_subtitles("clip.mp4", "sub-clip.en.srt", "with-subtitles-clip.mp4", &mode);
        let args = &cmd.args;

        assert_eq!(args[position(args, "-c") + 1], "copy");
        assert_eq!(args[position(args, "-c:s") + 1], "mov_text");
        assert!(!args.iter().any(|a| a == "-vf"));
        assert!(!args.iter().any(|a| a == "-c:v"));
        assert!(args.windows(2).any(|w| w == ["-map", "1:0"]));
        assert_eq!(args.iter().filter(|a| *a == "-i").count(), 2);
        assert_eq!(args.last().map(String::as_str), Some("with-subtitles-clip.mp4"));
    }

    #[test]
    fn test_soft_mux_keeps_both_language_and_title() {
        let mode = SubtitleMode::Soft {
            language: "fr".to_string(),
            title: "sub-clip.fr".to_string(),
        };
        let cmd = builder().mux_subtitles("a.mp4", "b.srt", "c.mp4", &mode);

        let metadata: Vec<&str> = cmd.args
            .windows(2)
            .filter(|w| w[0] == "-metadata:s:s:0")
            .map(|w| w[1].as_str())
            .collect();
        assert_eq!(metadata, vec!["language=fr", "title=sub-clip.fr"]);
    }

    #[test]
    fn test_hard_mux_burns_subtitles() {
        let mode = SubtitleMode::Hard {
            video_codec: "libx264".to_string(),
            audio_codec: "aac".to_string(),
            options: vec!["-crf".to_string(), "23".to_string()],
        };
        let cmd = builder().mux_subtitles("clip.mp4", "/v/sub-clip.en.srt", "out.mp4", &mode);
        let args = &cmd.args;

        assert_eq!(args[position(args, "-vf") + 1], "subtitles=/v/sub-clip.en.srt");
        assert_eq!(args[position(args, "-c:v") + 1], "libx264");
        assert_eq!(args[position(args, "-c:a") + 1], "aac");
        assert!(args.iter().any(|a| a == "-sn"));
        assert!(!args.iter().any(|a| a == "-map" || a == "-c:s" || a == "mov_text"));
        assert_eq!(args.iter().filter(|a| *a == "-i").count(), 1);
        assert!(position(args, "-crf") < position(args, "out.mp4"));
    }

    #[test]
    fn test_hard_mux_reencodes_audio_from_any_container() {
        let mode = SubtitleMode::hard(&crate::config::MediaConfig::default());
        let cmd = builder().mux_subtitles("talk.webm", "sub-talk.en.srt", "with-subtitles-talk.mp4", &mode);
        let args = &cmd.args;

        assert_eq!(args[position(args, "-c:a") + 1], "aac");
        assert!(!args.iter().any(|a| a == "copy"));
    }

    #[test]
    fn test_escape_filter_value() {
        assert_eq!(escape_filter_value("/plain/path.srt"), "/plain/path.srt");
        assert_eq!(escape_filter_value("C:/subs/a.srt"), "C\\\\:/subs/a.srt");
        assert_eq!(escape_filter_value("it's.srt"), "it\\\\\\'s.srt");
        assert_eq!(escape_filter_value("a,b[1].srt"), "a\\,b\\[1\\].srt");
    }

    #[test]
    fn test_version_check() {
        assert_eq!(builder().version_check().args, vec!["-version"]);
    }

    #[tokio::test]
    async fn test_execute_missing_binary_is_media_error() {
        let cmd = MediaCommand::new("/nonexistent/ffmpeg-binary", "Version check");
        assert!(matches!(cmd.execute().await, Err(VidsubError::Media(_))));
    }
}
