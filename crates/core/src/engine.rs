//! Engine
//!
//! Owns the shared context (task queue, speaking signal, mixer handle) and the
//! three long-running loops: the audio processor, the music player and the
//! content scheduler. Collaborators are injected so the whole engine runs
//! against fakes in tests.

use crate::command::CommandHandler;
use crate::content::ContentSource;
use crate::mixer::Mixer;
use crate::music::{MusicLibrary, MusicPlayer};
use crate::processor::{AudioProcessor, ProcessorState};
use crate::queue::{TaskSender, task_queue};
use crate::reaction::{ReactionGenerator, Reactor};
use crate::scheduler::ContentScheduler;
use crate::settings::EngineSettings;
use crate::signal::{SpeakingWatch, speaking_signal};
use crate::speech::SpeechSynthesizer;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// External services the engine talks to.
#[derive(Clone)]
pub struct Collaborators {
    pub content: Arc<dyn ContentSource>,
    pub reactions: Arc<dyn ReactionGenerator>,
    pub speech: Arc<dyn SpeechSynthesizer>,
    pub mixer: Arc<dyn Mixer>,
}

pub struct Engine {
    queue: TaskSender,
    speaking: SpeakingWatch,
    states: watch::Receiver<ProcessorState>,
    reactor: Reactor,
    mixer: Arc<dyn Mixer>,
    cancel: CancellationToken,
    tasks: Vec<(&'static str, JoinHandle<()>)>,
}

impl Engine {
    /// Spawns every loop on the current runtime.
    pub fn start(collaborators: Collaborators, library: MusicLibrary, settings: EngineSettings) -> Self {
        let Collaborators {
            content,
            reactions,
            speech,
            mixer,
        } = collaborators;
        let cancel = CancellationToken::new();
        let (queue, receiver) = task_queue();
        let (signal, speaking) = speaking_signal();
        let reactor = Reactor::new(reactions);

        let processor = AudioProcessor::new(
            receiver,
            signal,
            Arc::clone(&mixer),
            speech,
            settings.processor,
        );
        let states = processor.states();
        let player = MusicPlayer::new(library, Arc::clone(&mixer), speaking.clone(), settings.music);
        let scheduler = ContentScheduler::new(content, reactor.clone(), queue.clone(), settings.scheduler);

        let tasks = vec![
            ("processor", tokio::spawn(processor.run(cancel.child_token()))),
            ("music", tokio::spawn(player.run(cancel.child_token()))),
            ("scheduler", tokio::spawn(scheduler.run(cancel.child_token()))),
        ];
        info!("Engine started.");

        Self {
            queue,
            speaking,
            states,
            reactor,
            mixer,
            cancel,
            tasks,
        }
    }

    /// Producer handle for anything that wants to queue audio.
    pub fn sender(&self) -> TaskSender {
        self.queue.clone()
    }

    pub fn speaking(&self) -> SpeakingWatch {
        self.speaking.clone()
    }

    pub fn states(&self) -> watch::Receiver<ProcessorState> {
        self.states.clone()
    }

    pub fn command_handler(&self) -> CommandHandler {
        CommandHandler::new(self.queue.clone(), self.reactor.clone())
    }

    /// Cancelling this token stops every loop, same as [`Engine::shutdown`].
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Stops every loop, waits for them to exit, then silences the mixer.
    /// Directives still queued are dropped.
    pub async fn shutdown(self) {
        info!("Stopping engine...");
        self.cancel.cancel();
        for (name, task) in self.tasks {
            if let Err(e) = task.await {
                error!(task = name, error = %e, "Engine task ended abnormally");
            }
        }
        self.mixer.stop_all();
        info!("Engine stopped.");
    }
}
