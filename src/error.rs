use thiserror::Error;

pub type Result<T> = std::result::Result<T, DubError>;

/// Error taxonomy for the dubbing pipeline.
///
/// Every variant carries a message fit for end users; the orchestrator reports
/// these verbatim as the job's failure reason and never lets a raw internal
/// error escape past its boundary.
#[derive(Debug, Error)]
pub enum DubError {
    /// The media container or codec could not be read.
    #[error("The video file could not be read. It may be corrupted or in an unsupported format.")]
    Decode(String),

    /// Speech was present but recognition broke the stage contract.
    #[error("{0}")]
    Recognition(#[from] RecognitionFailure),

    /// Translation is required; any remote failure fails the job.
    #[error("The translation service is currently unavailable. Please try again later.")]
    Translation(String),

    /// Text-to-speech failed for a chunk.
    #[error("Speech generation failed. Please try again later.")]
    Synthesis(String),

    /// Both the lip-sync path and the re-mux fallback failed.
    #[error("Could not assemble the final video.")]
    Assembly(String),

    /// Remote fetch failed; sub-classified by `FetchErrorKind`.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("An internal error occurred while processing the video.")]
    Io(#[from] std::io::Error),
}

impl DubError {
    /// Internal detail for logs. `Display` stays user-facing.
    pub fn detail(&self) -> String {
        match self {
            DubError::Decode(d)
            | DubError::Translation(d)
            | DubError::Synthesis(d)
            | DubError::Assembly(d) => d.clone(),
            DubError::Recognition(f) => format!("{f:?}"),
            DubError::Fetch(f) => f.detail.clone(),
            DubError::Io(e) => e.to_string(),
        }
    }
}

/// Fatal recognition outcomes. The user sees "could not understand" and
/// "service unavailable" as different failures.
#[derive(Debug, Error)]
pub enum RecognitionFailure {
    #[error("Could not understand the speech in the video. Please ensure the audio is clear and in a supported language.")]
    NotUnderstood,

    #[error("Speech recognition service is currently unavailable. Please try again later.")]
    ServiceUnavailable(String),
}

/// Per-window recognition outcome used inside the transcription stage.
///
/// `NoSpeech` and `InvalidRequest` are recoverable at the window level:
/// the former skips the window, the latter triggers the no-hint retry.
#[derive(Debug, Error)]
pub enum RecognizeError {
    #[error("no speech recognized in window")]
    NoSpeech,

    #[error("recognition request rejected: {0}")]
    InvalidRequest(String),

    #[error("audio present but not intelligible")]
    Unintelligible,

    #[error("recognition service error: {0}")]
    Service(String),
}

/// Classified remote-fetch failure.
#[derive(Debug, Error)]
#[error("{}", kind.user_message())]
pub struct FetchError {
    pub kind: FetchErrorKind,
    pub detail: String,
}

impl FetchError {
    pub fn new(kind: FetchErrorKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchErrorKind {
    Copyrighted,
    Private,
    Unavailable,
    InvalidUrl,
    Other,
}

impl FetchErrorKind {
    pub fn user_message(&self) -> &'static str {
        match self {
            FetchErrorKind::Copyrighted => "Cannot process copyrighted content",
            FetchErrorKind::Private => "Cannot process private videos",
            FetchErrorKind::Unavailable => "This video is not available",
            FetchErrorKind::InvalidUrl => "The provided video URL is not valid",
            FetchErrorKind::Other => "Failed to download the video",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognition_messages_are_distinct() {
        let not_understood = DubError::Recognition(RecognitionFailure::NotUnderstood);
        let unavailable = DubError::Recognition(RecognitionFailure::ServiceUnavailable(
            "HTTP 503".to_string(),
        ));
        assert!(not_understood.to_string().contains("understand"));
        assert!(unavailable.to_string().contains("unavailable"));
        assert_ne!(not_understood.to_string(), unavailable.to_string());
    }

    #[test]
    fn fetch_error_surfaces_classified_message() {
        let err = FetchError::new(FetchErrorKind::Private, "yt-dlp: ERROR: private video");
        assert_eq!(err.to_string(), "Cannot process private videos");
    }

    #[test]
    fn user_messages_never_leak_detail() {
        let err = DubError::Translation("HTTP 500 from translate endpoint".to_string());
        assert!(!err.to_string().contains("HTTP 500"));
        assert!(err.detail().contains("HTTP 500"));
    }
}
