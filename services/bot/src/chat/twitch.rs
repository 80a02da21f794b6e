//! Twitch chat over IRC-over-WebSocket.
//!
//! Logs in, joins the configured channel and hands every `!pixel` invocation
//! to the [`CommandHandler`]. Commands run as their own tasks so a slow
//! reaction does not hold up the read loop; their replies come back through a
//! channel and are written in completion order.

use super::irc::{self, IrcMessage};
use crate::config::TwitchCredentials;
use anyhow::{Context, bail};
use futures_util::{SinkExt, StreamExt};
use pixel_core::command::{CommandHandler, parse_invocation};
use secrecy::ExposeSecret;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::protocol::Message as WsMessage};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

pub const TWITCH_IRC_URL: &str = "wss://irc-ws.chat.twitch.tv:443";
pub const COMMAND_NAME: &str = "pixel";
const RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// What an incoming line means to the bot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    Ping(String),
    Welcome,
    Notice(String),
    Chat { user: String, text: String },
    Command { user: String, args: Option<String> },
    Ignored,
}

/// Classifies one raw line. Messages from `own_nick` are ignored.
pub fn classify(line: &str, own_nick: &str, prefix: &str) -> Inbound {
    let Some(msg) = IrcMessage::parse(line) else {
        return Inbound::Ignored;
    };
    match msg.command {
        "PING" => Inbound::Ping(msg.trailing.unwrap_or("tmi.twitch.tv").to_string()),
        "001" => Inbound::Welcome,
        "NOTICE" => Inbound::Notice(msg.trailing.unwrap_or_default().to_string()),
        "PRIVMSG" => {
            let Some(nick) = msg.nick() else {
                return Inbound::Ignored;
            };
            if nick.eq_ignore_ascii_case(own_nick) {
                return Inbound::Ignored;
            }
            let user = msg.tag("display-name").unwrap_or(nick).to_string();
            let text = msg.trailing.unwrap_or_default();
            match parse_invocation(prefix, COMMAND_NAME, text) {
                Some(args) => Inbound::Command {
                    user,
                    args: args.map(str::to_string),
                },
                None => Inbound::Chat {
                    user,
                    text: text.to_string(),
                },
            }
        }
        _ => Inbound::Ignored,
    }
}

pub struct TwitchChat {
    url: String,
    credentials: TwitchCredentials,
    prefix: String,
    handler: CommandHandler,
}

impl TwitchChat {
    pub fn new(credentials: TwitchCredentials, prefix: impl Into<String>, handler: CommandHandler) -> Self {
        Self {
            url: TWITCH_IRC_URL.to_string(),
            credentials,
            prefix: prefix.into(),
            handler,
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// Keeps a chat session alive until cancelled, reconnecting after drops.
    pub async fn run(self, cancel: CancellationToken) {
        loop {
            match self.session(&cancel).await {
                Ok(()) => break,
                Err(e) => error!(error = ?e, "Twitch chat session ended"),
            }
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(RECONNECT_DELAY) => info!("Reconnecting to Twitch chat..."),
            }
        }
        info!("Twitch chat stopped.");
    }

    /// One connection. Returns `Ok` only when cancelled.
    async fn session(&self, cancel: &CancellationToken) -> anyhow::Result<()> {
        let login = async {
            let (ws_stream, _) = connect_async(self.url.as_str())
                .await
                .context("Failed to connect to Twitch chat")?;
            let (mut ws_tx, ws_rx) = ws_stream.split();
            for line in [
                irc::CAP_TAGS.to_string(),
                irc::pass(self.credentials.oauth_token.expose_secret()),
                irc::nick(&self.credentials.nickname),
                irc::join(&self.credentials.channel),
            ] {
                ws_tx.send(WsMessage::Text(line.into())).await?;
            }
            anyhow::Ok((ws_tx, ws_rx))
        };
        let (mut ws_tx, mut ws_rx) = tokio::select! {
            _ = cancel.cancelled() => return Ok(()),
            streams = login => streams?,
        };

        let (reply_tx, mut reply_rx) = mpsc::unbounded_channel::<String>();
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    ws_tx.send(WsMessage::Close(None)).await.ok();
                    return Ok(());
                }
                Some(reply) = reply_rx.recv() => {
                    ws_tx.send(WsMessage::Text(reply.into())).await?;
                }
                frame = ws_rx.next() => match frame {
                    Some(Ok(WsMessage::Text(text))) => {
                        for line in text.as_str().lines() {
                            if let Some(out) = self.on_line(line, &reply_tx) {
                                ws_tx.send(WsMessage::Text(out.into())).await?;
                            }
                        }
                    }
                    Some(Ok(WsMessage::Close(frame))) => bail!("server closed the connection: {frame:?}"),
                    Some(Ok(_)) => {}
                    Some(Err(e)) => return Err(e).context("Twitch chat read failed"),
                    None => bail!("connection dropped"),
                },
            }
        }
    }

    /// Returns a line to send immediately, if any. Commands reply later
    /// through `replies`.
    fn on_line(&self, line: &str, replies: &mpsc::UnboundedSender<String>) -> Option<String> {
        match classify(line, &self.credentials.nickname, &self.prefix) {
            Inbound::Ping(payload) => Some(irc::pong(&payload)),
            Inbound::Welcome => {
                info!(
                    nick = %self.credentials.nickname,
                    channel = %self.credentials.channel,
                    "Logged in to Twitch chat"
                );
                None
            }
            Inbound::Notice(text) => {
                warn!(%text, "Twitch notice");
                None
            }
            Inbound::Chat { user, text } => {
                info!(%user, %text, "Chat message");
                None
            }
            Inbound::Command { user, args } => {
                info!(%user, args = args.as_deref().unwrap_or(""), "Chat message with command");
                let handler = self.handler.clone();
                let channel = self.credentials.channel.clone();
                let replies = replies.clone();
                tokio::spawn(async move {
                    let reply = handler.handle(&user, args.as_deref()).await;
                    if replies.send(irc::privmsg(&channel, &reply)).is_err() {
                        warn!(%user, "Chat session closed before reply was sent");
                    }
                });
                None
            }
            Inbound::Ignored => {
                debug!(%line, "Ignored chat line");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pixel_core::error::ServiceError;
    use pixel_core::queue::task_queue;
    use pixel_core::reaction::{ReactionGenerator, Reactor, SafetySetting};
    use secrecy::SecretString;
    use std::sync::Arc;

    struct Silent;

    impl ReactionGenerator for Silent {
        fn generate(&self, _: &str, _: &[SafetySetting]) -> Result<Option<String>, ServiceError> {
            Ok(None)
        }
    }

    fn chat(url: String) -> TwitchChat {
        let (queue, _rx) = task_queue();
        let handler = CommandHandler::new(queue, Reactor::new(Arc::new(Silent)));
        let credentials = TwitchCredentials {
            oauth_token: SecretString::from("oauth:test".to_string()),
            nickname: "pixelbot".into(),
            channel: "streamer".into(),
        };
        TwitchChat::new(credentials, "!", handler).with_url(url)
    }

    #[tokio::test]
    async fn test_cancel_during_stalled_handshake() {
        // Accepts at the TCP level but never answers the upgrade request.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(chat(format!("ws://{addr}")).run(cancel.clone()));
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!handle.is_finished());

        cancel.cancel();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("chat should stop while connecting")
            .unwrap();
        drop(listener);
    }

    #[test]
    fn test_classify_ping() {
        assert_eq!(
            classify("PING :tmi.twitch.tv", "pixelbot", "!"),
            Inbound::Ping("tmi.twitch.tv".into())
        );
    }

    #[test]
    fn test_classify_command_uses_display_name() {
        let line = "@display-name=Alice :alice!alice@alice.tmi.twitch.tv PRIVMSG #streamer :!pixel say hello";
        assert_eq!(
            classify(line, "pixelbot", "!"),
            Inbound::Command {
                user: "Alice".into(),
                args: Some("say hello".into())
            }
        );
    }

    #[test]
    fn test_classify_bare_command() {
        let line = ":bob!bob@bob.tmi.twitch.tv PRIVMSG #streamer :!pixel";
        assert_eq!(
            classify(line, "pixelbot", "!"),
            Inbound::Command {
                user: "bob".into(),
                args: None
            }
        );
    }

    #[test]
    fn test_classify_plain_chat() {
        let line = ":bob!bob@bob.tmi.twitch.tv PRIVMSG #streamer :pixel is great";
        assert_eq!(
            classify(line, "pixelbot", "!"),
            Inbound::Chat {
                user: "bob".into(),
                text: "pixel is great".into()
            }
        );
    }

    #[test]
    fn test_classify_ignores_own_messages() {
        let line = ":pixelbot!pixelbot@pixelbot.tmi.twitch.tv PRIVMSG #streamer :!pixel say loop";
        assert_eq!(classify(line, "PixelBot", "!"), Inbound::Ignored);
    }

    #[test]
    fn test_classify_custom_prefix() {
        let line = ":bob!bob@bob.tmi.twitch.tv PRIVMSG #streamer :?pixel react news";
        assert_eq!(
            classify(line, "pixelbot", "?"),
            Inbound::Command {
                user: "bob".into(),
                args: Some("react news".into())
            }
        );
        assert!(matches!(
            classify(line, "pixelbot", "!"),
            Inbound::Chat { .. }
        ));
    }

    #[test]
    fn test_classify_welcome_and_notice() {
        assert_eq!(
            classify(":tmi.twitch.tv 001 pixelbot :Welcome, GLHF!", "pixelbot", "!"),
            Inbound::Welcome
        );
        assert_eq!(
            classify(":tmi.twitch.tv NOTICE * :Login authentication failed", "pixelbot", "!"),
            Inbound::Notice("Login authentication failed".into())
        );
        assert_eq!(
            classify(":tmi.twitch.tv CAP * ACK :twitch.tv/tags", "pixelbot", "!"),
            Inbound::Ignored
        );
    }
}
