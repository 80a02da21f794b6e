use std::fmt;
use std::path::PathBuf;

/// A single unit of foreground audio work.
///
/// Directives are immutable once enqueued. Adding a variant forces the audio
/// processor's dispatch to handle it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AudioDirective {
    /// Text to be synthesized and spoken.
    Speech { text: String },
    /// A sound file to be played as-is.
    SoundEffect { resource: PathBuf },
}

impl AudioDirective {
    pub fn speech(text: impl Into<String>) -> Self {
        Self::Speech { text: text.into() }
    }

    pub fn sound_effect(resource: impl Into<PathBuf>) -> Self {
        Self::SoundEffect {
            resource: resource.into(),
        }
    }

    /// Short label used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Speech { .. } => "speech",
            Self::SoundEffect { .. } => "sfx",
        }
    }
}

impl fmt::Display for AudioDirective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Speech { text } => write!(f, "speech({} chars)", text.chars().count()),
            Self::SoundEffect { resource } => write!(f, "sfx({})", resource.display()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructors_and_kind() {
        let speech = AudioDirective::speech("hello");
        assert_eq!(
            speech,
            AudioDirective::Speech {
                text: "hello".to_string()
            }
        );
        assert_eq!(speech.kind(), "speech");

        let sfx = AudioDirective::sound_effect("stinger.mp3");
        assert_eq!(sfx.kind(), "sfx");
        assert_eq!(sfx.to_string(), "sfx(stinger.mp3)");
    }

    #[test]
    fn test_display_does_not_leak_text() {
        let speech = AudioDirective::speech("héllo");
        assert_eq!(speech.to_string(), "speech(5 chars)");
    }
}
