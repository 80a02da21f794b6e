//! Mixer Backend Contract
//!
//! The mixer plays one foreground clip and one independent background track.
//! It offers no "clip finished" callback for the foreground, so callers track
//! clip timing themselves from [`Clip::duration`].

use crate::error::MixerError;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

/// Layout of interleaved signed 16-bit PCM.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioFormat {
    pub sample_rate: u32,
    pub channels: u16,
}

impl AudioFormat {
    /// 24 kHz, 16-bit signed, mono. Used for every synthesized utterance.
    pub const SPEECH: AudioFormat = AudioFormat {
        sample_rate: 24_000,
        channels: 1,
    };

    pub const BITS_PER_SAMPLE: u16 = 16;
}

/// A fully decoded foreground clip.
#[derive(Debug, Clone, PartialEq)]
pub struct Clip {
    pub format: AudioFormat,
    pub samples: Vec<i16>,
}

impl Clip {
    pub fn new(format: AudioFormat, samples: Vec<i16>) -> Self {
        Self { format, samples }
    }

    /// Interprets little-endian PCM16 bytes. A trailing odd byte is ignored.
    pub fn from_pcm16_le(bytes: &[u8], format: AudioFormat) -> Self {
        let samples = bytes
            .chunks_exact(2)
            .map(|chunk| i16::from_le_bytes([chunk[0], chunk[1]]))
            .collect();
        Self { format, samples }
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Playback length derived from the sample count.
    pub fn duration(&self) -> Duration {
        let channels = u64::from(self.format.channels.max(1));
        let rate = u64::from(self.format.sample_rate.max(1));
        let frames = self.samples.len() as u64 / channels;
        Duration::from_nanos(frames * 1_000_000_000 / rate)
    }
}

/// The two background volume levels the engine ever uses.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VolumeLevels {
    pub normal: f32,
    pub low: f32,
}

impl Default for VolumeLevels {
    fn default() -> Self {
        Self {
            normal: 0.8,
            low: 0.2,
        }
    }
}

/// Audio output with a foreground clip slot and a background track slot.
///
/// Only the audio processor calls the volume setter and `play_foreground`;
/// the music player only calls `play_background`.
pub trait Mixer: Send + Sync {
    fn background_volume(&self) -> f32;

    /// Applies to the current background track and any later one.
    fn set_background_volume(&self, volume: f32);

    /// True while a background track is audibly playing.
    fn background_busy(&self) -> bool;

    /// Starts a background track at the current background volume, replacing
    /// whatever was loaded.
    fn play_background(&self, track: &Path) -> Result<(), MixerError>;

    /// Notified each time a background track runs out. Backends without a
    /// completion hook return `None` and are polled instead.
    fn background_finished(&self) -> Option<Arc<Notify>> {
        None
    }

    /// Reads and fully decodes a sound file. May block on disk I/O.
    fn decode_file(&self, path: &Path) -> Result<Clip, MixerError>;

    /// Fire-and-forget playback of a foreground clip.
    fn play_foreground(&self, clip: Clip) -> Result<(), MixerError>;

    /// Silences both slots and releases their handles.
    fn stop_all(&self);
}
