//! Speech Synthesizer Contract
//!
//! Text is wrapped in an SSML payload carrying the voice, an expressive
//! style and a prosody adjustment, and always requests the same PCM format
//! ([`AudioFormat::SPEECH`]).

use crate::error::ServiceError;
use crate::mixer::AudioFormat;

/// Voice and delivery applied uniformly to every utterance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceProfile {
    pub voice: String,
    pub style: String,
    pub rate: String,
    pub pitch: String,
}

impl Default for VoiceProfile {
    /// Slower and lower than the stock voice, for an exaggerated character.
    fn default() -> Self {
        Self {
            voice: "en-US-JennyNeural".to_string(),
            style: "cheerful".to_string(),
            rate: "-30.00%".to_string(),
            pitch: "-25.00%".to_string(),
        }
    }
}

/// A ready-to-send synthesis request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeechRequest {
    pub ssml: String,
    pub format: AudioFormat,
}

impl SpeechRequest {
    pub fn new(text: &str, profile: &VoiceProfile) -> Self {
        let ssml = format!(
            "<speak version='1.0' xmlns='http://www.w3.org/2001/10/synthesis' \
             xmlns:mstts='http://www.w3.org/2001/mstts' xml:lang='en-US'>\
             <voice name='{voice}'>\
             <mstts:express-as style='{style}'>\
             <prosody rate='{rate}' pitch='{pitch}'>{text}</prosody>\
             </mstts:express-as>\
             </voice>\
             </speak>",
            voice = escape_xml(&profile.voice),
            style = escape_xml(&profile.style),
            rate = escape_xml(&profile.rate),
            pitch = escape_xml(&profile.pitch),
            text = escape_xml(text),
        );
        Self {
            ssml,
            format: AudioFormat::SPEECH,
        }
    }
}

/// Converts an SSML request into raw little-endian PCM16 bytes.
///
/// Implementations may block; callers dispatch through [`crate::offload`].
#[cfg_attr(test, mockall::automock)]
pub trait SpeechSynthesizer: Send + Sync {
    fn synthesize(&self, request: &SpeechRequest) -> Result<Vec<u8>, ServiceError>;
}

/// Escapes the five XML special characters.
pub fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
