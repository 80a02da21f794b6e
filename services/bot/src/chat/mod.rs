//! Chat interface.

pub mod irc;
pub mod twitch;
