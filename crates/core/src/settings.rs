//! Engine Settings
//!
//! Every delay and level the loops use. Defaults match the live bot; tests
//! shrink the durations.

use crate::content::ContentQuery;
use crate::mixer::VolumeLevels;
use crate::speech::VoiceProfile;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_INTRO: &str =
    "Hold up, hold up! We got some breaking TEA coming in hot! Let's get riiiight into the drama!";

#[derive(Debug, Clone, PartialEq)]
pub struct ProcessorSettings {
    pub levels: VolumeLevels,
    /// Pause after ducking so the level change is audible before the clip.
    pub duck_settle: Duration,
    /// Added to every clip duration before the slot is reused.
    pub trailing_pad: Duration,
    /// Pause after a failed directive before the next dequeue.
    pub error_backoff: Duration,
    pub voice: VoiceProfile,
}

impl Default for ProcessorSettings {
    fn default() -> Self {
        Self {
            levels: VolumeLevels::default(),
            duck_settle: Duration::from_millis(200),
            trailing_pad: Duration::from_millis(300),
            error_backoff: Duration::from_secs(5),
            voice: VoiceProfile::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MusicSettings {
    /// Silence before the first track.
    pub warmup: Duration,
    /// Pause after starting a track before the slot is checked again.
    pub start_settle: Duration,
    pub poll_interval: Duration,
    pub error_backoff: Duration,
}

impl Default for MusicSettings {
    fn default() -> Self {
        Self {
            warmup: Duration::from_secs(2),
            start_settle: Duration::from_secs(1),
            poll_interval: Duration::from_secs(1),
            error_backoff: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SchedulerSettings {
    pub warmup: Duration,
    pub interval: Duration,
    /// Gap between successive reaction requests within a cycle.
    pub reaction_spacing: Duration,
    pub query: ContentQuery,
    pub stinger: PathBuf,
    pub intro: String,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            warmup: Duration::from_secs(10),
            interval: Duration::from_secs(300),
            reaction_spacing: Duration::from_millis(500),
            query: ContentQuery::default(),
            stinger: PathBuf::from("drama_stinger.mp3"),
            intro: DEFAULT_INTRO.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct EngineSettings {
    pub processor: ProcessorSettings,
    pub music: MusicSettings,
    pub scheduler: SchedulerSettings,
}
