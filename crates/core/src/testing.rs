//! Test doubles shared by the engine's unit tests.

use crate::error::MixerError;
use crate::mixer::{AudioFormat, Clip, Mixer};
use crate::settings::ProcessorSettings;
use crate::signal::SpeakingWatch;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::sync::Notify;

/// Millisecond-scale timings so tests run quickly.
pub(crate) fn fast_processor_settings() -> ProcessorSettings {
    ProcessorSettings {
        duck_settle: Duration::from_millis(2),
        trailing_pad: Duration::from_millis(3),
        error_backoff: Duration::from_millis(50),
        ..ProcessorSettings::default()
    }
}

/// Silent speech-format PCM of the given length.
pub(crate) fn pcm_bytes(length: Duration) -> Vec<u8> {
    let frames = AudioFormat::SPEECH.sample_rate as u128 * length.as_nanos() / 1_000_000_000;
    vec![0u8; frames as usize * 2]
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ForegroundPlay {
    pub duration: Duration,
    pub speaking: bool,
    pub at: Instant,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct BackgroundPlay {
    pub track: PathBuf,
    pub speaking: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum MixerEvent {
    Volume(f32),
    Foreground(ForegroundPlay),
    Background(BackgroundPlay),
    StopAll,
}

#[derive(Debug)]
struct FakeState {
    volume: f32,
    background_busy: bool,
    foreground_until: Option<Instant>,
    overlaps: usize,
    failed_foreground: usize,
    background_attempts: usize,
    events: Vec<MixerEvent>,
}

/// Records every call and simulates slot occupancy from clip durations.
pub(crate) struct FakeMixer {
    state: Mutex<FakeState>,
    sounds: HashMap<PathBuf, Clip>,
    fail_foreground: bool,
    fail_background: bool,
    instant_tracks: bool,
    speaking: Option<SpeakingWatch>,
    finished: Arc<Notify>,
}

impl FakeMixer {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(FakeState {
                volume: 0.8,
                background_busy: false,
                foreground_until: None,
                overlaps: 0,
                failed_foreground: 0,
                background_attempts: 0,
                events: Vec::new(),
            }),
            sounds: HashMap::new(),
            fail_foreground: false,
            fail_background: false,
            instant_tracks: false,
            speaking: None,
            finished: Arc::new(Notify::new()),
        }
    }

    /// Captures the speaking signal alongside each playback.
    pub fn observing(mut self, speaking: SpeakingWatch) -> Self {
        self.speaking = Some(speaking);
        self
    }

    pub fn with_sound(mut self, path: &Path, length: Duration) -> Self {
        let clip = Clip::from_pcm16_le(&pcm_bytes(length), AudioFormat::SPEECH);
        self.sounds.insert(path.to_path_buf(), clip);
        self
    }

    pub fn failing_foreground(mut self) -> Self {
        self.fail_foreground = true;
        self
    }

    pub fn failing_background(mut self) -> Self {
        self.fail_background = true;
        self
    }

    /// Background tracks report finished as soon as they start.
    pub fn finishing_instantly(mut self) -> Self {
        self.instant_tracks = true;
        self
    }

    /// Simulates the background track running out.
    pub fn finish_background(&self) {
        self.lock().background_busy = false;
        self.finished.notify_one();
    }

    pub fn events(&self) -> Vec<MixerEvent> {
        self.lock().events.clone()
    }

    pub fn volume_changes(&self) -> Vec<f32> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                MixerEvent::Volume(v) => Some(v),
                _ => None,
            })
            .collect()
    }

    pub fn foreground_plays(&self) -> Vec<ForegroundPlay> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                MixerEvent::Foreground(play) => Some(play),
                _ => None,
            })
            .collect()
    }

    pub fn background_plays(&self) -> Vec<BackgroundPlay> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                MixerEvent::Background(play) => Some(play),
                _ => None,
            })
            .collect()
    }

    pub fn background_attempts(&self) -> usize {
        self.lock().background_attempts
    }

    pub fn overlaps(&self) -> usize {
        self.lock().overlaps
    }

    pub fn failed_foreground_attempts(&self) -> usize {
        self.lock().failed_foreground
    }

    fn is_speaking(&self) -> bool {
        self.speaking.as_ref().is_some_and(|w| w.is_speaking())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, FakeState> {
        self.state.lock().unwrap()
    }
}

impl Mixer for FakeMixer {
    fn background_volume(&self) -> f32 {
        self.lock().volume
    }

    fn set_background_volume(&self, volume: f32) {
        let mut state = self.lock();
        state.volume = volume;
        state.events.push(MixerEvent::Volume(volume));
    }

    fn background_busy(&self) -> bool {
        self.lock().background_busy
    }

    fn play_background(&self, track: &Path) -> Result<(), MixerError> {
        self.lock().background_attempts += 1;
        if self.fail_background {
            return Err(MixerError::Play("background sink unavailable".into()));
        }
        let speaking = self.is_speaking();
        let mut state = self.lock();
        state.background_busy = !self.instant_tracks;
        state.events.push(MixerEvent::Background(BackgroundPlay {
            track: track.to_path_buf(),
            speaking,
        }));
        if self.instant_tracks {
            self.finished.notify_one();
        }
        Ok(())
    }

    fn background_finished(&self) -> Option<Arc<Notify>> {
        Some(Arc::clone(&self.finished))
    }

    fn decode_file(&self, path: &Path) -> Result<Clip, MixerError> {
        self.sounds
            .get(path)
            .cloned()
            .ok_or_else(|| MixerError::Decode(format!("no fake sound for {}", path.display())))
    }

    fn play_foreground(&self, clip: Clip) -> Result<(), MixerError> {
        let speaking = self.is_speaking();
        let mut state = self.lock();
        if self.fail_foreground {
            state.failed_foreground += 1;
            return Err(MixerError::Play("foreground sink unavailable".into()));
        }
        let now = Instant::now();
        if state.foreground_until.is_some_and(|until| now < until) {
            state.overlaps += 1;
        }
        let duration = clip.duration();
        state.foreground_until = Some(now + duration);
        state.events.push(MixerEvent::Foreground(ForegroundPlay {
            duration,
            speaking,
            at: now,
        }));
        Ok(())
    }

    fn stop_all(&self) {
        let mut state = self.lock();
        state.background_busy = false;
        state.foreground_until = None;
        state.events.push(MixerEvent::StopAll);
    }
}
