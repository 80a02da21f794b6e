//! Reaction Generator
//!
//! Turns a topic into a short, speakable reaction in the bot's persona. The
//! backend may fail, return nothing, or be blocked by its safety filter; the
//! [`Reactor`] wrapper always hands back non-empty text that names the topic.

use crate::error::ServiceError;
use crate::offload::offload;
use crate::speech::escape_xml;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

/// Harm categories the generator is asked to filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HarmCategory {
    HarmCategoryHarassment,
    HarmCategoryHateSpeech,
    HarmCategorySexuallyExplicit,
    HarmCategoryDangerousContent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BlockThreshold {
    BlockLowAndAbove,
    BlockMediumAndAbove,
    BlockOnlyHigh,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SafetySetting {
    pub category: HarmCategory,
    pub threshold: BlockThreshold,
}

/// Medium-and-above is blocked for every category.
pub const SAFETY_SETTINGS: [SafetySetting; 4] = [
    SafetySetting {
        category: HarmCategory::HarmCategoryHarassment,
        threshold: BlockThreshold::BlockMediumAndAbove,
    },
    SafetySetting {
        category: HarmCategory::HarmCategoryHateSpeech,
        threshold: BlockThreshold::BlockMediumAndAbove,
    },
    SafetySetting {
        category: HarmCategory::HarmCategorySexuallyExplicit,
        threshold: BlockThreshold::BlockMediumAndAbove,
    },
    SafetySetting {
        category: HarmCategory::HarmCategoryDangerousContent,
        threshold: BlockThreshold::BlockMediumAndAbove,
    },
];

const PERSONA: &str = "You are Pixel, a sassy, energetic, slightly unhinged radio host who lives \
for internet drama and streamer culture. You never call yourself an AI. You sprinkle in \
streamer slang, memes and Gen Z references, you love a good roast, and you never open a \
sentence with OMG. You are a proud little gremlin with a cutesy anime-girl energy, and about \
one time in twenty you cheekily beg for a sub, some bits, or a tip through the donate link in \
the panels, with an edgy reason why you deserve it. Only use real words; your reply is read \
aloud.";

const TASK: &str = "React to the following topic (most likely a post title from a streamer \
drama forum) in 3-4 short, hyped-up, slightly cynical, anime-flavoured sentences. Roast the \
people involved if you know anything about them. Avoid the characters '&', '<' and '>'; \
write 'and' instead of '&'.";

/// Backend that completes a prompt.
///
/// `Ok(None)` means the service answered but produced no usable text
/// (no candidates, blocked by the safety filter, or empty).
#[cfg_attr(test, mockall::automock)]
pub trait ReactionGenerator: Send + Sync {
    fn generate(
        &self,
        prompt: &str,
        safety: &[SafetySetting],
    ) -> Result<Option<String>, ServiceError>;
}

/// Builds the full prompt for a topic.
pub fn reaction_prompt(topic: &str) -> String {
    format!(
        "{PERSONA}\n\n{TASK}\n\nTOPIC: {}\n\nYOUR REACTION:",
        escape_xml(topic)
    )
}

/// Text used whenever the backend gives us nothing.
pub fn fallback_reaction(topic: &str) -> String {
    format!("Whoa, {topic}? My circuits need a moment to process that one! KEKW.")
}

/// Trims and strips the one character speech markup cannot carry.
pub fn clean_reaction(text: &str) -> String {
    text.trim().replace('&', "and")
}

/// Reaction generator with the fallback guarantee applied.
#[derive(Clone)]
pub struct Reactor {
    backend: Arc<dyn ReactionGenerator>,
}

impl Reactor {
    pub fn new(backend: Arc<dyn ReactionGenerator>) -> Self {
        Self { backend }
    }

    /// Blocking. Never returns empty text.
    pub fn react(&self, topic: &str) -> String {
        info!(%topic, "Requesting reaction");
        match self.backend.generate(&reaction_prompt(topic), &SAFETY_SETTINGS) {
            Ok(Some(text)) => {
                let cleaned = clean_reaction(&text);
                if cleaned.is_empty() {
                    warn!("Generator returned blank text. Using fallback.");
                    fallback_reaction(topic)
                } else {
                    cleaned
                }
            }
            Ok(None) => {
                warn!("Generator response was blocked or empty. Using fallback.");
                fallback_reaction(topic)
            }
            Err(e) => {
                warn!(error = %e, "Generator call failed. Using fallback.");
                fallback_reaction(topic)
            }
        }
    }

    /// Runs [`Reactor::react`] on a worker thread.
    pub async fn react_offloaded(&self, topic: &str) -> Result<String, ServiceError> {
        let reactor = self.clone();
        let topic = topic.to_string();
        offload(move || reactor.react(&topic)).await
    }
}
