use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{Result, VidsubError};

/// Two letter language code, stored lower case
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LanguageCode(String);

impl LanguageCode {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for LanguageCode {
    type Err = VidsubError;

    fn from_str(s: &str) -> Result<Self> {
        if s.len() == 2 && s.chars().all(|c| c.is_ascii_alphabetic()) {
            Ok(Self(s.to_ascii_lowercase()))
        } else {
            Err(VidsubError::InvalidLanguage(s.to_string()))
        }
    }
}

impl fmt::Display for LanguageCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for LanguageCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Everything a single pipeline run needs, validated up front
#[derive(Debug, Clone)]
pub struct PipelineRequest {
    pub video_path: PathBuf,
    pub language_hint: Option<LanguageCode>,
    pub force_reextract: bool,
    pub soft_subtitle: bool,
}

impl PipelineRequest {
    /// Validate raw CLI input. Fails before any stage runs.
    pub fn new<P: AsRef<Path>>(
        video_path: P,
        language_hint: Option<&str>,
        force_reextract: bool,
        soft_subtitle: bool,
    ) -> Result<Self> {
        let video_path = video_path.as_ref();

        if !video_path.is_file() {
            return Err(VidsubError::FileNotFound(video_path.display().to_string()));
        }

        let language_hint: Option<LanguageCode> = language_hint.map(str::parse).transpose()?;

        Ok(Self {
            video_path: video_path.to_path_buf(),
            language_hint,
            force_reextract,
            soft_subtitle,
        })
    }
}
