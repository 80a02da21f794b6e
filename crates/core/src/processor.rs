//! Audio Processor
//!
//! The sole consumer of the task queue. Each directive runs to completion
//! before the next is dequeued:
//!
//! ```text
//! Idle -> Ducking -> LoadingAudio -> Playing -> Restoring -> Idle
//!                 \-------------- failure ---> Restoring -> Error -> Idle
//! ```
//!
//! Restoring is unconditional: the background volume goes back to normal and
//! the speaking signal is cleared whether the directive succeeded, failed or
//! was interrupted by shutdown.

use crate::directive::AudioDirective;
use crate::error::{DirectiveError, MixerError};
use crate::mixer::{Clip, Mixer};
use crate::offload::offload;
use crate::queue::TaskReceiver;
use crate::settings::ProcessorSettings;
use crate::signal::SpeakingSignal;
use crate::speech::{SpeechRequest, SpeechSynthesizer};
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessorState {
    Idle,
    Ducking,
    LoadingAudio,
    Playing,
    Restoring,
    Error,
}

impl fmt::Display for ProcessorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProcessorState::Idle => "idle",
            ProcessorState::Ducking => "ducking",
            ProcessorState::LoadingAudio => "loading",
            ProcessorState::Playing => "playing",
            ProcessorState::Restoring => "restoring",
            ProcessorState::Error => "error",
        };
        f.write_str(name)
    }
}

pub struct AudioProcessor {
    queue: TaskReceiver,
    signal: SpeakingSignal,
    mixer: Arc<dyn Mixer>,
    speech: Arc<dyn SpeechSynthesizer>,
    settings: ProcessorSettings,
    state: watch::Sender<ProcessorState>,
}

impl AudioProcessor {
    pub fn new(
        queue: TaskReceiver,
        signal: SpeakingSignal,
        mixer: Arc<dyn Mixer>,
        speech: Arc<dyn SpeechSynthesizer>,
        settings: ProcessorSettings,
    ) -> Self {
        let (state, _) = watch::channel(ProcessorState::Idle);
        Self {
            queue,
            signal,
            mixer,
            speech,
            settings,
            state,
        }
    }

    /// Follows state transitions, mostly for diagnostics and tests.
    pub fn states(&self) -> watch::Receiver<ProcessorState> {
        self.state.subscribe()
    }

    /// Drains the queue until cancelled or every producer is gone.
    pub async fn run(mut self, cancel: CancellationToken) {
        info!("Audio processor started.");
        loop {
            self.transition(ProcessorState::Idle);
            let directive = tokio::select! {
                _ = cancel.cancelled() => break,
                next = self.queue.dequeue() => match next {
                    Some(directive) => directive,
                    None => {
                        info!("Task queue closed.");
                        break;
                    }
                },
            };

            info!(kind = directive.kind(), %directive, "Processing audio task");
            let outcome = tokio::select! {
                _ = cancel.cancelled() => None,
                result = self.perform(&directive) => Some(result),
            };
            self.restore();

            match outcome {
                None => {
                    info!(%directive, "Audio task interrupted by shutdown.");
                    break;
                }
                Some(Ok(())) => {
                    info!(kind = directive.kind(), "Audio task processed.");
                    // Watchers get to run while the signal is idle.
                    tokio::task::yield_now().await;
                }
                Some(Err(e)) => {
                    error!(error = %e, %directive, "Audio task failed");
                    self.transition(ProcessorState::Error);
                    tokio::select! {
                        _ = cancel.cancelled() => break,
                        _ = tokio::time::sleep(self.settings.error_backoff) => {}
                    }
                }
            }
        }
        self.restore();
        self.transition(ProcessorState::Idle);
        info!("Audio processor stopped.");
    }

    /// Ducking, loading and playing. Restoring is left to the caller.
    async fn perform(&self, directive: &AudioDirective) -> Result<(), DirectiveError> {
        self.transition(ProcessorState::Ducking);
        self.signal.set_speaking();
        self.mixer.set_background_volume(self.settings.levels.low);
        debug!(volume = self.settings.levels.low, "Background ducked");
        tokio::time::sleep(self.settings.duck_settle).await;

        self.transition(ProcessorState::LoadingAudio);
        let clip = match directive {
            AudioDirective::Speech { text } => self.synthesize(text).await?,
            AudioDirective::SoundEffect { resource } => self.load_sound(resource).await?,
        };

        self.transition(ProcessorState::Playing);
        let hold = clip.duration() + self.settings.trailing_pad;
        debug!(duration = ?clip.duration(), "Starting foreground clip");
        self.mixer.play_foreground(clip)?;
        tokio::time::sleep(hold).await;
        Ok(())
    }

    async fn synthesize(&self, text: &str) -> Result<Clip, DirectiveError> {
        info!(%text, "Synthesizing speech");
        let request = SpeechRequest::new(text, &self.settings.voice);
        let format = request.format;
        let speech = Arc::clone(&self.speech);
        let audio = offload(move || speech.synthesize(&request)).await??;
        let clip = Clip::from_pcm16_le(&audio, format);
        if clip.is_empty() {
            return Err(DirectiveError::EmptyAudio);
        }
        debug!(bytes = audio.len(), "Speech synthesized");
        Ok(clip)
    }

    async fn load_sound(&self, resource: &Path) -> Result<Clip, DirectiveError> {
        if !resource.is_file() {
            return Err(DirectiveError::ResourceNotFound(resource.to_path_buf()));
        }
        let mixer = Arc::clone(&self.mixer);
        let path = resource.to_path_buf();
        let clip = offload(move || mixer.decode_file(&path))
            .await
            .map_err(|e| MixerError::Decode(e.to_string()))??;
        Ok(clip)
    }

    fn restore(&self) {
        self.transition(ProcessorState::Restoring);
        self.mixer
            .set_background_volume(self.settings.levels.normal);
        self.signal.set_idle();
        debug!(volume = self.settings.levels.normal, "Background restored");
    }

    fn transition(&self, next: ProcessorState) {
        let previous = self.state.send_replace(next);
        if previous != next {
            debug!(from = %previous, to = %next, "Processor state");
        }
    }
}
