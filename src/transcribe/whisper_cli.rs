// openai-whisper command line engine
//
// Runs `whisper <audio> --model <model> --verbose True --output_format json`
// into a scratch directory. Segments are read from the progress lines whisper
// prints to stdout while it works; the JSON document written at exit supplies
// the language and any segments that never appeared on stdout.

use async_trait::async_trait;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tempfile::TempDir;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::{Child, Command};
use tracing::{debug, info};

use crate::config::TranscriberConfig;
use crate::error::{Result, VidsubError};
use super::{Recognition, RecognitionEvent, RecognitionSender, Segment, SpeechEngine};

/// Whisper specific JSON output format
#[derive(Debug, Clone, Deserialize)]
pub struct WhisperOutput {
    #[serde(default)]
    pub segments: Vec<WhisperSegment>,
    pub language: Option<String>,
}

/// Whisper specific segment format
#[derive(Debug, Clone, Deserialize)]
pub struct WhisperSegment {
    pub start: f64,
    pub end: f64,
    pub text: String,
}

impl From<WhisperSegment> for Segment {
    fn from(segment: WhisperSegment) -> Self {
        Segment {
            start: segment.start,
            end: segment.end,
            text: segment.text.trim().to_string(),
        }
    }
}

impl WhisperOutput {
    pub fn parse(json_content: &str) -> Result<Self> {
        serde_json::from_str(json_content)
            .map_err(|e| VidsubError::Transcriber(format!("Failed to parse Whisper JSON: {}", e)))
    }

    /// Language to report: the engine's detection, else the hint it was given
    pub fn language_or(&self, language_hint: Option<&str>) -> Result<String> {
        self.language
            .as_deref()
            .filter(|l| !l.trim().is_empty())
            .or(language_hint)
            .map(str::to_string)
            .ok_or_else(|| VidsubError::Transcriber("Whisper output has no language".to_string()))
    }
}

/// Parse a verbose progress line such as `[00:01.000 --> 00:02.500]  Hello`.
/// Timestamps are `mm:ss.mmm`, or `hh:mm:ss.mmm` past the first hour.
pub fn parse_progress_line(line: &str) -> Option<Segment> {
    let rest = line.trim_start().strip_prefix('[')?;
    let (times, text) = rest.split_once(']')?;
    let (start, end) = times.split_once("-->")?;

    Some(Segment {
        start: parse_timestamp(start.trim())?,
        end: parse_timestamp(end.trim())?,
        text: text.trim().to_string(),
    })
}

fn parse_timestamp(value: &str) -> Option<f64> {
    let parts: Vec<&str> = value.split(':').collect();
    if !(2..=3).contains(&parts.len()) {
        return None;
    }

    let mut seconds = 0.0;
    for part in parts {
        let part: f64 = part.parse().ok()?;
        if !part.is_finite() || part < 0.0 {
            return None;
        }
        seconds = seconds * 60.0 + part;
    }
    Some(seconds)
}

/// Speech engine backed by the openai-whisper CLI
pub struct WhisperCliEngine {
    config: TranscriberConfig,
}

impl WhisperCliEngine {
    pub fn new(config: TranscriberConfig) -> Self {
        Self { config }
    }

    fn build_args(&self, audio_path: &Path, output_dir: &Path, language: Option<&str>) -> Vec<String> {
        let mut args = vec![
            audio_path.to_string_lossy().to_string(),
            "--model".to_string(), self.config.model.clone(),
            "--task".to_string(), "transcribe".to_string(),
            "--output_dir".to_string(), output_dir.to_string_lossy().to_string(),
            "--output_format".to_string(), "json".to_string(),
            "--verbose".to_string(), "True".to_string(),
        ];

        if let Some(lang) = language {
            args.push("--language".to_string());
            args.push(lang.to_string());
        }

        args.extend(self.config.extra_args.iter().cloned());
        args
    }
}

#[async_trait]
impl SpeechEngine for WhisperCliEngine {
    async fn recognize(&self, audio_path: &Path, language: Option<&str>) -> Result<Recognition> {
        info!("Loading whisper model '{}'", self.config.model);

        let temp_dir = tempfile::tempdir()
            .map_err(|e| VidsubError::Transcriber(format!("Failed to create temp directory: {}", e)))?;

        let audio_filename = audio_path.file_stem()
            .ok_or_else(|| VidsubError::Transcriber("Invalid audio filename".to_string()))?;
        let json_file = temp_dir.path().join(format!("{}.json", audio_filename.to_string_lossy()));

        let args = self.build_args(audio_path, temp_dir.path(), language);
        debug!("Executing whisper command: {} {:?}", self.config.binary_path, args);

        // whisper is a python program; piped stdout is block buffered unless told otherwise
        let child = Command::new(&self.config.binary_path)
            .args(&args)
            .env("PYTHONUNBUFFERED", "1")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| VidsubError::Transcriber(format!("Failed to execute whisper: {}", e)))?;

        let (tx, recognition) = Recognition::channel();
        let run = WhisperRun {
            child,
            _temp_dir: temp_dir,
            json_file,
            language_hint: language.map(str::to_string),
        };
        tokio::spawn(async move {
            if let Err(e) = run.stream(&tx).await {
                let _ = tx.send(Err(e)).await;
            }
        });

        Ok(recognition)
    }

    async fn check_availability(&self) -> Result<()> {
        let status = Command::new(&self.config.binary_path)
            .arg("--help")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map_err(|e| VidsubError::Transcriber(format!("Whisper not available: {}", e)))?;

        if !status.success() {
            return Err(VidsubError::Transcriber(format!("Whisper not available: {}", status)));
        }

        info!("Whisper is available");
        Ok(())
    }

    fn describe(&self) -> String {
        format!("whisper ({} model)", self.config.model)
    }
}

/// A running whisper process and the scratch directory it writes into
struct WhisperRun {
    child: Child,
    _temp_dir: TempDir,
    json_file: PathBuf,
    language_hint: Option<String>,
}

impl WhisperRun {
    /// Forward segments while whisper runs, then the rest of the JSON document.
    /// Returns early without error once the receiver is gone.
    async fn stream(mut self, tx: &RecognitionSender) -> Result<()> {
        let stdout = self.child.stdout.take()
            .ok_or_else(|| VidsubError::Transcriber("Whisper stdout not captured".to_string()))?;
        let mut stderr = self.child.stderr.take()
            .ok_or_else(|| VidsubError::Transcriber("Whisper stderr not captured".to_string()))?;

        let read_stdout = async {
            let mut lines = BufReader::new(stdout).lines();
            let mut streamed: usize = 0;
            while let Some(line) = lines.next_line().await? {
                match parse_progress_line(&line) {
                    Some(segment) => {
                        if tx.send(Ok(RecognitionEvent::Segment(segment))).await.is_err() {
                            return Ok(None);
                        }
                        streamed += 1;
                    }
                    None => debug!("whisper: {}", line),
                }
            }
            Ok::<_, std::io::Error>(Some(streamed))
        };
        let read_stderr = async {
            let mut buffer = String::new();
            let _ = stderr.read_to_string(&mut buffer).await;
            buffer
        };

        let (streamed, stderr_text) = tokio::join!(read_stdout, read_stderr);
        let streamed = streamed
            .map_err(|e| VidsubError::Transcriber(format!("Failed to read whisper output: {}", e)))?;
        let Some(streamed) = streamed else {
            return Ok(());
        };

        let status = self.child.wait().await
            .map_err(|e| VidsubError::Transcriber(format!("Failed to wait for whisper: {}", e)))?;
        if !status.success() {
            return Err(VidsubError::Transcriber(format!("Whisper failed: {}", stderr_text.trim_end())));
        }

        let json_content = tokio::fs::read_to_string(&self.json_file).await
            .map_err(|e| VidsubError::Transcriber(format!("Failed to read whisper output: {}", e)))?;
        let output = WhisperOutput::parse(&json_content)?;
        let language = output.language_or(self.language_hint.as_deref())?;

        for segment in output.segments.into_iter().skip(streamed) {
            if tx.send(Ok(RecognitionEvent::Segment(segment.into()))).await.is_err() {
                return Ok(());
            }
        }
        let _ = tx.send(Ok(RecognitionEvent::Language(language))).await;
        Ok(())
    }
}
