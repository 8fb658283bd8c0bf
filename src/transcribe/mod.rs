// Speech recognition
//
// A SpeechEngine turns an audio file into a channel-backed stream of
// recognition events: timed segments as soon as the engine produces them and
// the language once it is known. The Transcriber drains that stream in order
// into a TranscriptionResult and reports each segment as it arrives.
//
// - whisper_cli: openai-whisper command line engine (default)

pub mod whisper_cli;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::config::TranscriberConfig;
use crate::error::{Result, VidsubError};
use crate::request::LanguageCode;

/// Events buffered between an engine and the transcriber
const EVENT_BUFFER: usize = 64;

/// A transcribed span of speech, times in seconds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub start: f64,
    pub end: f64,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RecognitionEvent {
    Segment(Segment),
    /// Language of the audio. The last one reported wins.
    Language(String),
}

pub type RecognitionSender = mpsc::Sender<Result<RecognitionEvent>>;

/// Engine output, read once in the order it was produced
#[derive(Debug)]
pub struct Recognition {
    events: mpsc::Receiver<Result<RecognitionEvent>>,
}

impl Recognition {
    /// Empty recognition plus the sender an engine task feeds it through
    pub fn channel() -> (RecognitionSender, Self) {
        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        (tx, Self { events: rx })
    }

    /// Recognition over events that are already known
    pub fn from_events(events: Vec<Result<RecognitionEvent>>) -> Self {
        let (tx, rx) = mpsc::channel(events.len().max(1));
        for event in events {
            // Capacity covers every event, so this cannot fail
            let _ = tx.try_send(event);
        }
        Self { events: rx }
    }

    /// Recognition over an already known language and list of segments
    pub fn from_segments<S: Into<String>>(language: S, segments: Vec<Segment>) -> Self {
        let mut events = vec![Ok(RecognitionEvent::Language(language.into()))];
        events.extend(segments.into_iter().map(|s| Ok(RecognitionEvent::Segment(s))));
        Self::from_events(events)
    }

    /// Next event, or `None` once the engine is finished
    pub async fn next(&mut self) -> Option<Result<RecognitionEvent>> {
        self.events.recv().await
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptionResult {
    pub language: String,
    pub segments: Vec<Segment>,
}

/// Main trait for speech recognition engines
#[async_trait]
pub trait SpeechEngine: Send + Sync {
    /// Start recognising speech in `audio_path`. Without a hint the engine detects the language.
    async fn recognize(&self, audio_path: &Path, language: Option<&str>) -> Result<Recognition>;

    /// Check that the engine can run at all
    async fn check_availability(&self) -> Result<()> {
        Ok(())
    }

    /// Short description for logs
    fn describe(&self) -> String;
}

pub struct Transcriber {
    engine: Box<dyn SpeechEngine>,
}

impl Transcriber {
    pub fn new(engine: Box<dyn SpeechEngine>) -> Self {
        Self { engine }
    }

    pub async fn check_availability(&self) -> Result<()> {
        self.engine.check_availability().await
    }

    pub async fn transcribe(
        &self,
        audio_path: &Path,
        language_hint: Option<&LanguageCode>,
    ) -> Result<TranscriptionResult> {
        self.transcribe_with_progress(audio_path, language_hint, |_| {}).await
    }

    /// Like [`Self::transcribe`], calling `on_segment` for every segment as the engine yields it.
    pub async fn transcribe_with_progress<F>(
        &self,
        audio_path: &Path,
        language_hint: Option<&LanguageCode>,
        mut on_segment: F,
    ) -> Result<TranscriptionResult>
    where
        F: FnMut(&Segment),
    {
        info!("Transcribing {} with {}", audio_path.display(), self.engine.describe());

        let mut recognition = self
            .engine
            .recognize(audio_path, language_hint.map(LanguageCode::as_str))
            .await?;

        let mut language = None;
        let mut segments = Vec::new();
        while let Some(event) = recognition.next().await {
            match event? {
                RecognitionEvent::Segment(segment) => {
                    debug!("[{:.2}s -> {:.2}s] {}", segment.start, segment.end, segment.text);
                    on_segment(&segment);
                    segments.push(segment);
                }
                RecognitionEvent::Language(detected) => language = Some(detected),
            }
        }

        let language = language
            .filter(|l| !l.trim().is_empty())
            .ok_or_else(|| VidsubError::Transcriber("Engine reported no language".to_string()))?;

        info!("Transcription language {}, {} segments", language, segments.len());
        Ok(TranscriptionResult { language, segments })
    }
}

/// Factory for creating transcribers from configuration
pub struct TranscriberFactory;

impl TranscriberFactory {
    /// Transcriber backed by the whisper command line tool
    pub fn create_default(config: TranscriberConfig) -> Transcriber {
        Transcriber::new(Box::new(whisper_cli::WhisperCliEngine::new(config)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Engine double that replays a fixed recognition
    struct FakeEngine {
        language: String,
        items: Mutex<Option<Vec<Result<Segment>>>>,
        seen_hint: Arc<Mutex<Option<Option<String>>>>,
    }

    impl FakeEngine {
        fn new(language: &str, items: Vec<Result<Segment>>) -> Self {
            Self {
                language: language.to_string(),
                items: Mutex::new(Some(items)),
                seen_hint: Arc::new(Mutex::new(None)),
            }
        }
    }

    #[async_trait]
    impl SpeechEngine for FakeEngine {
        async fn recognize(&self, _audio_path: &Path, language: Option<&str>) -> Result<Recognition> {
            *self.seen_hint.lock().unwrap() = Some(language.map(str::to_string));
            let items = self.items.lock().unwrap().take().unwrap_or_default();
            let mut events = vec![Ok(RecognitionEvent::Language(self.language.clone()))];
            events.extend(items.into_iter().map(|item| item.map(RecognitionEvent::Segment)));
            Ok(Recognition::from_events(events))
        }

        fn describe(&self) -> String {
            "fake engine".to_string()
        }
    }

    fn segment(start: f64, end: f64, text: &str) -> Segment {
        Segment { start, end, text: text.to_string() }
    }

    #[tokio::test]
    async fn test_segments_keep_engine_order() {
        let produced = vec![
            segment(0.0, 1.0, "one"),
            segment(1.0, 2.5, "two"),
            segment(2.5, 4.0, "three"),
        ];
        let engine = FakeEngine::new("en", produced.iter().cloned().map(Ok).collect());
        let transcriber = Transcriber::new(Box::new(engine));

        let mut reported = Vec::new();
        let result = transcriber
            .transcribe_with_progress(Path::new("audio.wav"), None, |s| reported.push(s.text.clone()))
            .await
            .unwrap();

        assert_eq!(result.language, "en");
        assert_eq!(result.segments, produced);
        assert_eq!(reported, vec!["one", "two", "three"]);
    }

    #[tokio::test]
    async fn test_hint_is_passed_through() {
        let engine = FakeEngine::new("de", vec![Ok(segment(0.0, 1.0, "hallo"))]);
        let seen_hint = engine.seen_hint.clone();
        let transcriber = Transcriber::new(Box::new(engine));

        let hint: LanguageCode = "de".parse().unwrap();
        let result = transcriber.transcribe(Path::new("a.wav"), Some(&hint)).await.unwrap();

        assert_eq!(result.language, "de");
        assert_eq!(*seen_hint.lock().unwrap(), Some(Some("de".to_string())));
    }

    #[tokio::test]
    async fn test_no_hint_reports_detected_language() {
        let engine = FakeEngine::new("ja", vec![]);
        let seen_hint = engine.seen_hint.clone();
        let transcriber = Transcriber::new(Box::new(engine));

        let result = transcriber.transcribe(Path::new("a.wav"), None).await.unwrap();

        assert_eq!(result.language, "ja");
        assert!(result.segments.is_empty());
        assert_eq!(*seen_hint.lock().unwrap(), Some(None));
    }

    #[tokio::test]
    async fn test_stream_error_is_fatal() {
        let engine = FakeEngine::new("en", vec![
            Ok(segment(0.0, 1.0, "fine")),
            Err(VidsubError::Transcriber("corrupt audio".to_string())),
            Ok(segment(2.0, 3.0, "never reached")),
        ]);
        let transcriber = Transcriber::new(Box::new(engine));

        let mut reported = 0;
        let err = transcriber
            .transcribe_with_progress(Path::new("a.wav"), None, |_| reported += 1)
            .await
            .unwrap_err();

        assert!(matches!(err, VidsubError::Transcriber(_)));
        assert_eq!(reported, 1);
    }

    #[tokio::test]
    async fn test_missing_language_is_error() {
        let transcriber = Transcriber::new(Box::new(FakeEngine::new("", vec![])));
        assert!(transcriber.transcribe(Path::new("a.wav"), None).await.is_err());
    }

    #[tokio::test]
    async fn test_recognition_from_segments() {
        let mut recognition = Recognition::from_segments("en", vec![segment(0.0, 1.0, "a")]);

        let mut events = Vec::new();
        while let Some(event) = recognition.next().await {
            events.push(event.unwrap());
        }
        assert_eq!(events, vec![
            RecognitionEvent::Language("en".to_string()),
            RecognitionEvent::Segment(segment(0.0, 1.0, "a")),
        ]);
    }

    #[tokio::test]
    async fn test_language_reported_after_segments() {
        let (tx, recognition) = Recognition::channel();
        tokio::spawn(async move {
            tx.send(Ok(RecognitionEvent::Segment(segment(0.0, 1.0, "early")))).await.unwrap();
            tx.send(Ok(RecognitionEvent::Language("sv".to_string()))).await.unwrap();
        });

        struct ChannelEngine(Mutex<Option<Recognition>>);

        #[async_trait]
        impl SpeechEngine for ChannelEngine {
            async fn recognize(&self, _audio_path: &Path, _language: Option<&str>) -> Result<Recognition> {
                Ok(self.0.lock().unwrap().take().unwrap())
            }

            fn describe(&self) -> String {
                "channel".to_string()
            }
        }

        let transcriber = Transcriber::new(Box::new(ChannelEngine(Mutex::new(Some(recognition)))));
        let result = transcriber.transcribe(Path::new("a.wav"), None).await.unwrap();

        assert_eq!(result.language, "sv");
        assert_eq!(result.segments, vec![segment(0.0, 1.0, "early")]);
    }

    #[derive(Clone, Default)]
    struct CapturedLog(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for CapturedLog {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_segments_stay_out_of_info_log() {
        let log = CapturedLog::default();
        let writer = log.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::INFO)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let engine = FakeEngine::new("en", vec![Ok(segment(0.0, 1.0, "spoken words"))]);
        let transcriber = Transcriber::new(Box::new(engine));

        let mut printed = Vec::new();
        transcriber
            .transcribe_with_progress(Path::new("a.wav"), None, |s| printed.push(s.text.clone()))
            .await
            .unwrap();

        let output = String::from_utf8(log.0.lock().unwrap().clone()).unwrap();
        assert_eq!(printed, vec!["spoken words"]);
        assert!(!output.contains("spoken words"), "segment logged at info: {}", output);
        assert!(output.contains("1 segments"));
    }
}
