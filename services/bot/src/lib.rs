//! Pixel Bot Service
//!
//! Wires the engine in `pixel-core` to the real world: environment
//! configuration, HTTP providers for content, reactions and speech, a rodio
//! audio output, and Twitch chat. `bin/bot.rs` is a thin wrapper around this
//! library.

pub mod audio;
pub mod chat;
pub mod config;
pub mod providers;
pub mod resources;
