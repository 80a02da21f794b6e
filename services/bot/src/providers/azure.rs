//! Speech Synthesizer over the Azure Speech REST API.

use super::{ensure_success, http_client, transport_error};
use pixel_core::error::ServiceError;
use pixel_core::speech::{SpeechRequest, SpeechSynthesizer};
use reqwest::blocking::Client;
use secrecy::{ExposeSecret, SecretString};
use tracing::info;

/// Output format name Azure uses for 24 kHz 16-bit mono headerless PCM,
/// the layout of `AudioFormat::SPEECH`.
pub const OUTPUT_FORMAT: &str = "raw-24khz-16bit-mono-pcm";

pub fn endpoint(region: &str) -> String {
    format!("https://{region}.tts.speech.microsoft.com/cognitiveservices/v1")
}

pub struct AzureSpeech {
    http: Client,
    key: SecretString,
    endpoint: String,
}

impl AzureSpeech {
    pub fn new(key: SecretString, region: &str) -> Result<Self, ServiceError> {
        Ok(Self {
            http: http_client(None)?,
            key,
            endpoint: endpoint(region),
        })
    }
}

impl SpeechSynthesizer for AzureSpeech {
    fn synthesize(&self, request: &SpeechRequest) -> Result<Vec<u8>, ServiceError> {
        let response = self
            .http
            .post(&self.endpoint)
            .header("Ocp-Apim-Subscription-Key", self.key.expose_secret())
            .header("Content-Type", "application/ssml+xml")
            .header("X-Microsoft-OutputFormat", OUTPUT_FORMAT)
            .body(request.ssml.clone())
            .send()
            .map_err(transport_error)?;
        let audio = ensure_success(response)?
            .bytes()
            .map_err(transport_error)?;
        info!(bytes = audio.len(), "Speech synthesized");
        Ok(audio.to_vec())
    }
}
