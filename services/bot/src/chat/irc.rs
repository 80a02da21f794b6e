//! Minimal IRC line handling for Twitch chat.
//!
//! Lines look like `[@tags] [:prefix] COMMAND [params...] [:trailing]`.

/// One parsed IRC line, borrowing from the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IrcMessage<'a> {
    pub tags: Option<&'a str>,
    pub prefix: Option<&'a str>,
    pub command: &'a str,
    pub params: Vec<&'a str>,
    pub trailing: Option<&'a str>,
}

impl<'a> IrcMessage<'a> {
    pub fn parse(line: &'a str) -> Option<Self> {
        let mut rest = line.trim_end_matches(['\r', '\n']);

        let mut tags = None;
        if let Some(stripped) = rest.strip_prefix('@') {
            let (t, r) = stripped.split_once(' ')?;
            tags = Some(t);
            rest = r.trim_start();
        }

        let mut prefix = None;
        if let Some(stripped) = rest.strip_prefix(':') {
            let (p, r) = stripped.split_once(' ')?;
            prefix = Some(p);
            rest = r.trim_start();
        }

        let (head, trailing) = match rest.split_once(" :") {
            Some((head, trailing)) => (head, Some(trailing)),
            None => (rest, None),
        };
        let mut words = head.split_whitespace();
        let command = words.next()?;
        Some(Self {
            tags,
            prefix,
            command,
            params: words.collect(),
            trailing,
        })
    }

    /// Nickname part of a `nick!user@host` prefix.
    pub fn nick(&self) -> Option<&'a str> {
        let prefix = self.prefix?;
        Some(prefix.split_once('!').map_or(prefix, |(nick, _)| nick))
    }

    /// Value of a message tag, e.g. `display-name`.
    pub fn tag(&self, key: &str) -> Option<&'a str> {
        self.tags?
            .split(';')
            .filter_map(|pair| pair.split_once('='))
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v)
            .filter(|v| !v.is_empty())
    }
}

/// Asks Twitch to attach tags such as `display-name` to messages.
pub const CAP_TAGS: &str = "CAP REQ :twitch.tv/tags";

fn single_line(text: &str) -> String {
    text.replace(['\r', '\n'], " ")
}

pub fn privmsg(channel: &str, text: &str) -> String {
    format!("PRIVMSG #{} :{}", channel.trim_start_matches('#'), single_line(text))
}

pub fn pong(payload: &str) -> String {
    format!("PONG :{payload}")
}

pub fn pass(token: &str) -> String {
    if token.starts_with("oauth:") {
        format!("PASS {token}")
    } else {
        format!("PASS oauth:{token}")
    }
}

pub fn nick(nickname: &str) -> String {
    format!("NICK {}", nickname.to_lowercase())
}

pub fn join(channel: &str) -> String {
    format!("JOIN #{}", channel.trim_start_matches('#'))
}
