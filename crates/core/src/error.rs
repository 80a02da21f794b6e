//! Error Taxonomy
//!
//! Every failure the engine can observe falls into one of these types. Only
//! [`ResourceError`] is fatal, and only at startup. The others are caught at
//! the boundary of the loop that owns them, logged, and recovered from.

use std::path::PathBuf;

/// A failure talking to an external collaborator (content feed, text
/// generator, speech synthesizer), or dispatching the call to a worker.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("request failed: {0}")]
    Http(String),
    #[error("service returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("could not decode response: {0}")]
    Decode(String),
    #[error("request was canceled: {0}")]
    Canceled(String),
    #[error("worker dispatch failed: {0}")]
    Worker(String),
}

/// A failure reported by the mixer backend.
#[derive(Debug, thiserror::Error)]
pub enum MixerError {
    #[error("audio output unavailable: {0}")]
    Device(String),
    #[error("cannot open '{path}': {reason}")]
    Open { path: PathBuf, reason: String },
    #[error("cannot decode audio: {0}")]
    Decode(String),
    #[error("playback failed: {0}")]
    Play(String),
}

/// Why a single directive was abandoned.
#[derive(Debug, thiserror::Error)]
pub enum DirectiveError {
    #[error("speech synthesis failed: {0}")]
    Synthesis(#[from] ServiceError),
    #[error("speech synthesis returned no audio")]
    EmptyAudio,
    #[error("sound resource not found: {}", .0.display())]
    ResourceNotFound(PathBuf),
    #[error(transparent)]
    Playback(#[from] MixerError),
}

/// A required resource is missing at startup.
#[derive(Debug, thiserror::Error)]
pub enum ResourceError {
    #[error("music folder '{}' is missing", .0.display())]
    MusicFolderMissing(PathBuf),
    #[error("music folder '{}' contains no tracks", .0.display())]
    MusicFolderEmpty(PathBuf),
    #[error("sound effect '{}' is missing or empty", .0.display())]
    SoundMissing(PathBuf),
    #[error("cannot read '{}': {reason}", path.display())]
    Io { path: PathBuf, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directive_error_display() {
        let err = DirectiveError::ResourceNotFound(PathBuf::from("sfx/boom.mp3"));
        assert_eq!(err.to_string(), "sound resource not found: sfx/boom.mp3");

        let err: DirectiveError = ServiceError::Canceled("quota".into()).into();
        assert_eq!(
            err.to_string(),
            "speech synthesis failed: request was canceled: quota"
        );

        let err: DirectiveError = MixerError::Play("sink closed".into()).into();
        assert_eq!(err.to_string(), "playback failed: sink closed");
    }

    #[test]
    fn test_service_status_display() {
        let err = ServiceError::Status {
            status: 429,
            body: "slow down".into(),
        };
        assert_eq!(err.to_string(), "service returned status 429: slow down");
    }
}
