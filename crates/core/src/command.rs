//! Command Handler
//!
//! Parses chat invocations of the form `!pixel <verb> <argument>` and turns
//! them into queued directives. Every invocation gets exactly one reply line.

use crate::directive::AudioDirective;
use crate::queue::TaskSender;
use crate::reaction::Reactor;
use tracing::{error, info, warn};

const USAGE: &str = "Try '!pixel say <your message>' or '!pixel react <topic>'.";

/// A recognised chat command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Say(String),
    React(String),
    /// Unknown verb, or a known verb with nothing after it.
    Unrecognised,
    /// Bare invocation with no arguments at all.
    Empty,
}

impl Command {
    /// Verb is the first whitespace-delimited token, case-insensitive.
    /// Everything after it, trimmed, is the argument.
    pub fn parse(args: Option<&str>) -> Self {
        let Some(args) = args.map(str::trim).filter(|a| !a.is_empty()) else {
            return Command::Empty;
        };
        let (verb, rest) = match args.split_once(char::is_whitespace) {
            Some((verb, rest)) => (verb, rest.trim()),
            None => (args, ""),
        };
        if rest.is_empty() {
            return Command::Unrecognised;
        }
        match verb.to_lowercase().as_str() {
            "say" => Command::Say(rest.to_string()),
            "react" => Command::React(rest.to_string()),
            _ => Command::Unrecognised,
        }
    }
}

/// Splits a chat line into the invocation arguments, if it is addressed to
/// `name` with the given prefix. `"!pixel say hi"` yields `Some(Some("say hi"))`,
/// a bare `"!pixel"` yields `Some(None)`.
pub fn parse_invocation<'a>(prefix: &str, name: &str, line: &'a str) -> Option<Option<&'a str>> {
    let body = line.trim().strip_prefix(prefix)?;
    let (head, rest) = match body.split_once(char::is_whitespace) {
        Some((head, rest)) => (head, Some(rest.trim())),
        None => (body, None),
    };
    if !head.eq_ignore_ascii_case(name) {
        return None;
    }
    Some(rest.filter(|r| !r.is_empty()))
}

#[derive(Clone)]
pub struct CommandHandler {
    queue: TaskSender,
    reactor: Reactor,
}

impl CommandHandler {
    pub fn new(queue: TaskSender, reactor: Reactor) -> Self {
        Self { queue, reactor }
    }

    /// Handles one invocation and returns the reply to post in chat.
    pub async fn handle(&self, user: &str, args: Option<&str>) -> String {
        let command = Command::parse(args);
        info!(%user, ?command, "Chat command received");
        match command {
            Command::Empty => {
                format!("@{user}, you need to tell me what to do! {USAGE}")
            }
            Command::Unrecognised => format!("@{user}, hmm? {USAGE}"),
            Command::Say(text) => match self.queue.enqueue(AudioDirective::speech(text)) {
                Ok(()) => format!("Okay @{user}, Pixel will say that!"),
                Err(e) => {
                    error!(error = %e, "Could not queue say command");
                    format!("@{user}, Pixel can't talk right now.")
                }
            },
            Command::React(topic) => {
                let queued = match self.reactor.react_offloaded(&topic).await {
                    Ok(reaction) => self
                        .queue
                        .enqueue(AudioDirective::speech(reaction))
                        .map_err(|e| e.to_string()),
                    Err(e) => Err(e.to_string()),
                };
                match queued {
                    Ok(()) => format!("Okay @{user}, Pixel will react to that!"),
                    Err(e) => {
                        warn!(error = %e, %topic, "React command failed");
                        format!("@{user}, Pixel's brain fizzled trying to react to that.")
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::task_queue;
    use crate::reaction::MockReactionGenerator;
    use std::sync::Arc;

    fn reactor(reply: &'static str) -> Reactor {
        let mut generator = MockReactionGenerator::new();
        generator
            .expect_generate()
            .returning(move |_, _| Ok(Some(reply.to_string())));
        Reactor::new(Arc::new(generator))
    }

    fn unused_reactor() -> Reactor {
        let mut generator = MockReactionGenerator::new();
        generator.expect_generate().never();
        Reactor::new(Arc::new(generator))
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(Command::parse(None), Command::Empty);
        assert_eq!(Command::parse(Some("   ")), Command::Empty);
        assert_eq!(Command::parse(Some("say")), Command::Unrecognised);
        assert_eq!(Command::parse(Some("say   ")), Command::Unrecognised);
        assert_eq!(Command::parse(Some("dance now")), Command::Unrecognised);
        assert_eq!(
            Command::parse(Some("SAY  hello   chat ")),
            Command::Say("hello   chat".into())
        );
        assert_eq!(
            Command::parse(Some("react\tthe drama")),
            Command::React("the drama".into())
        );
    }

    #[test]
    fn test_parse_invocation() {
        assert_eq!(parse_invocation("!", "pixel", "!pixel say hi"), Some(Some("say hi")));
        assert_eq!(parse_invocation("!", "pixel", "!Pixel"), Some(None));
        assert_eq!(parse_invocation("!", "pixel", "  !pixel   "), Some(None));
        assert_eq!(parse_invocation("!", "pixel", "!pixelate now"), None);
        assert_eq!(parse_invocation("!", "pixel", "pixel say hi"), None);
        assert_eq!(parse_invocation("!", "pixel", "hello !pixel"), None);
    }

    #[tokio::test]
    async fn test_say_queues_speech() {
        let (tx, mut rx) = task_queue();
        let handler = CommandHandler::new(tx, unused_reactor());

        let reply = handler.handle("alice", Some("say hello chat")).await;
        assert_eq!(reply, "Okay @alice, Pixel will say that!");
        assert_eq!(rx.dequeue().await, Some(AudioDirective::speech("hello chat")));
        assert_eq!(rx.pending(), 0);
    }

    #[tokio::test]
    async fn test_say_without_text_replies_usage_once() {
        let (tx, rx) = task_queue();
        let handler = CommandHandler::new(tx, unused_reactor());

        let reply = handler.handle("bob", Some("say")).await;
        assert_eq!(
            reply,
            "@bob, hmm? Try '!pixel say <your message>' or '!pixel react <topic>'."
        );
        assert_eq!(rx.pending(), 0);
    }

    #[tokio::test]
    async fn test_no_arguments() {
        let (tx, rx) = task_queue();
        let handler = CommandHandler::new(tx, unused_reactor());

        let reply = handler.handle("carol", None).await;
        assert_eq!(
            reply,
            "@carol, you need to tell me what to do! Try '!pixel say <your message>' or '!pixel react <topic>'."
        );
        assert_eq!(rx.pending(), 0);
    }

    #[tokio::test]
    async fn test_unknown_verb() {
        let (tx, rx) = task_queue();
        let handler = CommandHandler::new(tx, unused_reactor());

        let reply = handler.handle("dave", Some("dance please")).await;
        assert!(reply.starts_with("@dave, hmm?"));
        assert_eq!(rx.pending(), 0);
    }

    #[tokio::test]
    async fn test_react_queues_generated_text() {
        let (tx, mut rx) = task_queue();
        let handler = CommandHandler::new(tx, reactor("  spicy & wild  "));

        let reply = handler.handle("erin", Some("React streamer drama")).await;
        assert_eq!(reply, "Okay @erin, Pixel will react to that!");
        assert_eq!(rx.dequeue().await, Some(AudioDirective::speech("spicy and wild")));
    }

    #[tokio::test]
    async fn test_react_falls_back_when_generator_fails() {
        let mut generator = MockReactionGenerator::new();
        generator
            .expect_generate()
            .returning(|_, _| Err(crate::error::ServiceError::Http("offline".into())));
        let (tx, mut rx) = task_queue();
        let handler = CommandHandler::new(tx, Reactor::new(Arc::new(generator)));

        let reply = handler.handle("frank", Some("react cats")).await;
        assert_eq!(reply, "Okay @frank, Pixel will react to that!");
        assert_eq!(
            rx.dequeue().await,
            Some(AudioDirective::speech(
                "Whoa, cats? My circuits need a moment to process that one! KEKW."
            ))
        );
    }

    #[tokio::test]
    async fn test_react_reports_closed_queue() {
        let (tx, rx) = task_queue();
        drop(rx);
        let handler = CommandHandler::new(tx, reactor("hot take"));

        let reply = handler.handle("gina", Some("react anything")).await;
        assert_eq!(reply, "@gina, Pixel's brain fizzled trying to react to that.");
    }
}
