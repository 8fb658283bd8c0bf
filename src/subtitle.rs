use std::fmt::Write as _;
use std::path::PathBuf;
use tokio::fs;
use tracing::info;

use crate::error::Result;
use crate::paths::ArtifactPaths;
use crate::transcribe::Segment;

/// Write the SRT file for `segments` beside the video and return its path.
///
/// The file is always rewritten; identical segments produce identical bytes.
pub async fn generate_srt(
    paths: &ArtifactPaths,
    language: &str,
    segments: &[Segment],
) -> Result<PathBuf> {
    let output_path = paths.subtitle(language);
    info!("Generating SRT file: {}", output_path.display());

    fs::write(&output_path, render_srt(segments)).await?;

    info!("SRT file generated successfully ({} cues)", segments.len());
    Ok(output_path)
}

/// Render segments as SRT cues, numbered from 1 in input order
pub fn render_srt(segments: &[Segment]) -> String {
    let mut srt_content = String::new();

    for (index, segment) in segments.iter().enumerate() {
        // Writing into a String cannot fail
        let _ = write!(
            srt_content,
            "{}\n{} --> {}\n{}\n\n",
            index + 1,
            format_srt_time(segment.start),
            format_srt_time(segment.end),
            cue_text(&segment.text)
        );
    }

    srt_content
}

/// A blank line ends a cue, so blank lines inside the text are dropped.
fn cue_text(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format time in seconds to SRT time format (HH:MM:SS,mmm)
///
/// Rounds to the nearest millisecond before splitting, so 59.9996 becomes
/// `00:01:00,000`. Hours are not wrapped at 24. Negative or non-finite input
/// formats as zero.
pub fn format_srt_time(seconds: f64) -> String {
    let seconds = if seconds.is_finite() { seconds.max(0.0) } else { 0.0 };
    let total_milliseconds = (seconds * 1000.0).round() as u64;

    let hours = total_milliseconds / 3_600_000;
    let minutes = (total_milliseconds % 3_600_000) / 60_000;
    let secs = (total_milliseconds % 60_000) / 1_000;
    let millis = total_milliseconds % 1_000;

    format!("{:02}:{:02}:{:02},{:03}", hours, minutes, secs, millis)
}
