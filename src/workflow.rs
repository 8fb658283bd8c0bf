use std::fmt;
use std::path::PathBuf;
use tracing::{error, info};

use crate::audio::AudioExtractor;
use crate::config::Config;
use crate::error::Result;
use crate::media::{MediaProcessorFactory, MediaProcessorTrait, SubtitleMode};
use crate::paths::ArtifactPaths;
use crate::request::PipelineRequest;
use crate::subtitle::generate_srt;
use crate::transcribe::{Segment, Transcriber, TranscriberFactory};

/// Where a run currently is. Stages only move forward; `Failed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Start,
    AudioReady,
    Transcribed,
    SubtitleWritten,
    Muxed,
    Done,
    Failed,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineStage::Start => "start",
            PipelineStage::AudioReady => "audio ready",
            PipelineStage::Transcribed => "transcribed",
            PipelineStage::SubtitleWritten => "subtitle written",
            PipelineStage::Muxed => "muxed",
            PipelineStage::Done => "done",
            PipelineStage::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Artifacts of a completed run
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOutput {
    pub audio_path: PathBuf,
    pub subtitle_path: PathBuf,
    pub output_path: PathBuf,
    pub language: String,
    pub segment_count: usize,
}

pub struct Workflow {
    config: Config,
    media: Box<dyn MediaProcessorTrait>,
    transcriber: Transcriber,
}

impl Workflow {
    /// Build a workflow with the ffmpeg and whisper backends from `config`.
    pub async fn new(config: Config) -> Result<Self> {
        let media = MediaProcessorFactory::create_processor(config.media.clone());
        let transcriber = TranscriberFactory::create_default(config.transcriber.clone());

        // Check dependencies before any stage runs
        media.check_availability().await?;
        transcriber.check_availability().await?;

        Ok(Self::with_components(config, media, transcriber))
    }

    /// Build a workflow from explicit collaborators
    pub fn with_components(
        config: Config,
        media: Box<dyn MediaProcessorTrait>,
        transcriber: Transcriber,
    ) -> Self {
        Self {
            config,
            media,
            transcriber,
        }
    }

    pub async fn process(&self, request: &PipelineRequest) -> Result<PipelineOutput> {
        self.process_with_progress(request, |_| {}).await
    }

    /// Run all four stages in order, calling `on_segment` for each transcribed segment.
    pub async fn process_with_progress<F>(
        &self,
        request: &PipelineRequest,
        on_segment: F,
    ) -> Result<PipelineOutput>
    where
        F: FnMut(&Segment),
    {
        let mut stage = PipelineStage::Start;

        match self.run_stages(request, &mut stage, on_segment).await {
            Ok(output) => {
                advance(&mut stage, PipelineStage::Done);
                Ok(output)
            }
            Err(e) => {
                error!("Pipeline failed after stage '{}': {}", stage, e);
                advance(&mut stage, PipelineStage::Failed);
                Err(e)
            }
        }
    }

    async fn run_stages<F>(
        &self,
        request: &PipelineRequest,
        stage: &mut PipelineStage,
        on_segment: F,
    ) -> Result<PipelineOutput>
    where
        F: FnMut(&Segment),
    {
        let paths = ArtifactPaths::for_video(&request.video_path)?;
        info!("Processing video: {}", request.video_path.display());

        // Step 1: Get or extract audio (with caching)
        let audio_path = AudioExtractor::new(self.media.as_ref())
            .extract(&paths, request.force_reextract)
            .await?;
        advance(stage, PipelineStage::AudioReady);

        // Step 2: Transcribe
        let transcription = self
            .transcriber
            .transcribe_with_progress(&audio_path, request.language_hint.as_ref(), on_segment)
            .await?;
        advance(stage, PipelineStage::Transcribed);

        // Step 3: Generate SRT file
        let subtitle_path = generate_srt(&paths, &transcription.language, &transcription.segments).await?;
        let segment_count = transcription.segments.len();
        let language = transcription.language;
        advance(stage, PipelineStage::SubtitleWritten);

        // Step 4: Mux subtitles into the video
        let mode = if request.soft_subtitle {
            SubtitleMode::soft(&language, &subtitle_path)
        } else {
            SubtitleMode::hard(&self.config.media)
        };
        let output_path = paths.output_video();
        self.media
            .mux_subtitles(paths.video(), &subtitle_path, &output_path, &mode)
            .await?;
        advance(stage, PipelineStage::Muxed);

        Ok(PipelineOutput {
            audio_path,
            subtitle_path,
            output_path,
            language,
            segment_count,
        })
    }
}

fn advance(stage: &mut PipelineStage, next: PipelineStage) {
    info!("Pipeline stage: {} -> {}", stage, next);
    *stage = next;
}
