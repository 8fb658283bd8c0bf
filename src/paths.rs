//! Deterministic artifact naming.
//!
//! Every file the pipeline produces lives beside the source video and is keyed
//! by the video's file stem, so the same input always maps to the same paths.
//! Nothing here touches the filesystem.

use std::path::{Path, PathBuf};

use crate::error::{Result, VidsubError};

/// Paths of every artifact derived from one source video
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    video: PathBuf,
    directory: PathBuf,
    stem: String,
}

impl ArtifactPaths {
    pub fn for_video<P: AsRef<Path>>(video_path: P) -> Result<Self> {
        let video_path = video_path.as_ref();

        let stem = video_path
            .file_stem()
            .ok_or_else(|| VidsubError::InvalidInput(format!("Invalid video filename: {}", video_path.display())))?
            .to_string_lossy()
            .into_owned();

        // A bare file name resolves against the current directory.
        let directory = video_path.parent().map(Path::to_path_buf).unwrap_or_default();

        Ok(Self { video: video_path.to_path_buf(), directory, stem })
    }

    /// The source video itself
    pub fn video(&self) -> &Path {
        &self.video
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Video file name without its final extension
    pub fn stem(&self) -> &str {
        &self.stem
    }

    /// `audio-<stem>.wav`, the cached extraction
    pub fn audio(&self) -> PathBuf {
        self.directory.join(format!("audio-{}.wav", self.stem))
    }

    /// Scratch target the extractor writes before renaming onto [`Self::audio`]
    pub fn partial_audio(&self) -> PathBuf {
        self.directory.join(format!("audio-{}.wav.part", self.stem))
    }

    /// `sub-<stem>.<language>.srt`
    pub fn subtitle(&self, language: &str) -> PathBuf {
        self.directory.join(format!("sub-{}.{}.srt", self.stem, language))
    }

    /// `with-subtitles-<stem>.mp4`
    pub fn output_video(&self) -> PathBuf {
        self.directory.join(format!("with-subtitles-{}.mp4", self.stem))
    }
}

/// Human readable track title: the subtitle file name without `.srt`
pub fn subtitle_track_title(subtitle_path: &Path) -> String {
    let name = subtitle_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    match name.strip_suffix(".srt") {
        Some(title) => title.to_string(),
        None => name,
    }
}
