//! Music Player
//!
//! Keeps a background bed going: whenever nothing is being spoken and the
//! background slot has gone quiet, a random track from the library starts.
//! The loop wakes on the mixer's track-finished notification, on a speaking
//! signal transition, or on its polling interval, whichever comes first.

use crate::error::{MixerError, ResourceError};
use crate::mixer::Mixer;
use crate::settings::MusicSettings;
use crate::signal::SpeakingWatch;
use rand::seq::IndexedRandom;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

#[derive(Debug, thiserror::Error)]
pub enum TrackError {
    #[error(transparent)]
    Library(#[from] ResourceError),
    #[error(transparent)]
    Mixer(#[from] MixerError),
}

/// A folder of interchangeable background tracks. Rescanned on every pick
/// so tracks can be added while the bot is live.
#[derive(Debug, Clone)]
pub struct MusicLibrary {
    folder: PathBuf,
}

impl MusicLibrary {
    /// Fails if the folder is missing or holds no regular files.
    pub fn open(folder: impl Into<PathBuf>) -> Result<Self, ResourceError> {
        let library = Self {
            folder: folder.into(),
        };
        if library.tracks()?.is_empty() {
            return Err(ResourceError::MusicFolderEmpty(library.folder));
        }
        Ok(library)
    }

    pub fn folder(&self) -> &Path {
        &self.folder
    }

    pub fn tracks(&self) -> Result<Vec<PathBuf>, ResourceError> {
        if !self.folder.is_dir() {
            return Err(ResourceError::MusicFolderMissing(self.folder.clone()));
        }
        let io_error = |e: std::io::Error| ResourceError::Io {
            path: self.folder.clone(),
            reason: e.to_string(),
        };
        let mut tracks = Vec::new();
        for entry in std::fs::read_dir(&self.folder).map_err(io_error)? {
            let path = entry.map_err(io_error)?.path();
            if path.is_file() {
                tracks.push(path);
            }
        }
        tracks.sort();
        Ok(tracks)
    }

    /// Uniformly random track.
    pub fn pick(&self) -> Result<PathBuf, ResourceError> {
        let tracks = self.tracks()?;
        tracks
            .choose(&mut rand::rng())
            .cloned()
            .ok_or_else(|| ResourceError::MusicFolderEmpty(self.folder.clone()))
    }
}

pub struct MusicPlayer {
    library: MusicLibrary,
    mixer: Arc<dyn Mixer>,
    speaking: SpeakingWatch,
    settings: MusicSettings,
}

impl MusicPlayer {
    pub fn new(
        library: MusicLibrary,
        mixer: Arc<dyn Mixer>,
        speaking: SpeakingWatch,
        settings: MusicSettings,
    ) -> Self {
        Self {
            library,
            mixer,
            speaking,
            settings,
        }
    }

    pub async fn run(mut self, cancel: CancellationToken) {
        info!(folder = %self.library.folder().display(), "Music player started.");
        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = tokio::time::sleep(self.settings.warmup) => {}
        }

        let finished = self.mixer.background_finished();
        loop {
            match self.refill() {
                Ok(true) => {
                    // A track that ends at once must not restart the loop
                    // without a pause.
                    tokio::select! {
                        _ = cancel.cancelled() => break,
                        _ = tokio::time::sleep(self.settings.start_settle) => {}
                    }
                }
                Ok(false) => {
                    tokio::select! {
                        _ = cancel.cancelled() => break,
                        _ = tokio::time::sleep(self.settings.poll_interval) => {}
                        _ = self.speaking.changed() => {}
                        _ = track_finished(finished.as_deref()) => {}
                    }
                }
                Err(e) => {
                    error!(error = %e, "Music player error");
                    tokio::select! {
                        _ = cancel.cancelled() => break,
                        _ = tokio::time::sleep(self.settings.error_backoff) => {}
                    }
                }
            }
        }
        info!("Music player stopped.");
    }

    /// Starts a track if the bed is free. Returns whether one was started.
    pub fn refill(&self) -> Result<bool, TrackError> {
        if self.speaking.is_speaking() || self.mixer.background_busy() {
            return Ok(false);
        }
        let track = self.library.pick()?;
        info!(track = %track.display(), "Playing music track");
        self.mixer.play_background(&track)?;
        Ok(true)
    }
}

async fn track_finished(notify: Option<&Notify>) {
    match notify {
        Some(notify) => notify.notified().await,
        None => std::future::pending().await,
    }
}
