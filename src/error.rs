use thiserror::Error;

#[derive(Error, Debug)]
pub enum VidsubError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Transcription error: {0}")]
    Transcriber(String),

    #[error("Media processing error: {0}")]
    Media(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Invalid language code '{0}': expected two ASCII letters")]
    InvalidLanguage(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl VidsubError {
    /// True for errors raised while validating the request, before any stage runs.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            VidsubError::FileNotFound(_) | VidsubError::InvalidLanguage(_) | VidsubError::InvalidInput(_)
        )
    }

    /// True for failures reported by ffmpeg or the speech engine.
    pub fn is_external_tool_failure(&self) -> bool {
        matches!(self, VidsubError::Media(_) | VidsubError::Transcriber(_))
    }
}

pub type Result<T> = std::result::Result<T, VidsubError>;
