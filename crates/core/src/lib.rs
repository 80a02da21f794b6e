//! Pixel Core
//!
//! The audio task scheduling and mixing engine behind the Pixel stream bot.
//! Producers (chat commands, the content scheduler) queue [`AudioDirective`]s;
//! a single [`processor::AudioProcessor`] plays them one at a time, ducking the
//! background music bed while it speaks. Network services and the audio
//! device sit behind the traits in [`content`], [`reaction`], [`speech`] and
//! [`mixer`].

pub mod command;
pub mod content;
pub mod directive;
pub mod engine;
pub mod error;
pub mod mixer;
pub mod music;
pub mod offload;
pub mod processor;
pub mod queue;
pub mod reaction;
pub mod scheduler;
pub mod settings;
pub mod signal;
pub mod speech;

#[cfg(test)]
mod testing;

pub use directive::AudioDirective;
pub use engine::{Collaborators, Engine};
pub use queue::{QueueClosed, TaskReceiver, TaskSender, task_queue};
pub use signal::{SpeakingSignal, SpeakingWatch, speaking_signal};
