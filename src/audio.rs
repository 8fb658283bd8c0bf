//! Audio extraction with a file-existence cache.
//!
//! The extracted WAV is the only artifact reused between runs. A run reuses
//! `audio-<stem>.wav` whenever it exists unless `force` is set; there is no
//! other invalidation. ffmpeg writes to a `.part` sibling that is renamed into
//! place only after it succeeds, so a failed extraction never leaves a file
//! that the next run would take for a cache hit.

use std::path::PathBuf;
use tokio::fs;
use tracing::{debug, info};

use crate::error::Result;
use crate::media::MediaProcessorTrait;
use crate::paths::ArtifactPaths;

pub struct AudioExtractor<'a> {
    media: &'a dyn MediaProcessorTrait,
}

impl<'a> AudioExtractor<'a> {
    pub fn new(media: &'a dyn MediaProcessorTrait) -> Self {
        Self { media }
    }

    /// Return the cached audio for the video, decoding it first if needed.
    pub async fn extract(&self, paths: &ArtifactPaths, force: bool) -> Result<PathBuf> {
        let audio_path = paths.audio();

        if !force && fs::try_exists(&audio_path).await? {
            info!("Audio has already been extracted ({})", audio_path.display());
            return Ok(audio_path);
        }

        if force {
            debug!("Forced re-extraction of {}", audio_path.display());
        }

        let partial_path = paths.partial_audio();
        self.media.extract_audio(paths.video(), &partial_path).await?;
        fs::rename(&partial_path, &audio_path).await?;

        Ok(audio_path)
    }
}
