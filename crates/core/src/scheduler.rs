//! Content Scheduler
//!
//! On a fixed cadence, pulls ranked topics from the content source and queues
//! a themed segment: the stinger, the intro line, then one reaction per topic.
//! A failed cycle is logged and abandoned; the next one still fires on
//! schedule, and late ticks are never bunched up.

use crate::content::{ContentSource, reactable_titles};
use crate::directive::AudioDirective;
use crate::error::ServiceError;
use crate::offload::offload;
use crate::queue::{QueueClosed, TaskSender};
use crate::reaction::Reactor;
use crate::settings::SchedulerSettings;
use std::sync::Arc;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

#[derive(Debug, thiserror::Error)]
pub enum CycleError {
    #[error("content fetch failed: {0}")]
    Service(#[from] ServiceError),
    #[error(transparent)]
    Queue(#[from] QueueClosed),
}

pub struct ContentScheduler {
    source: Arc<dyn ContentSource>,
    reactor: Reactor,
    queue: TaskSender,
    settings: SchedulerSettings,
}

impl ContentScheduler {
    pub fn new(
        source: Arc<dyn ContentSource>,
        reactor: Reactor,
        queue: TaskSender,
        settings: SchedulerSettings,
    ) -> Self {
        Self {
            source,
            reactor,
            queue,
            settings,
        }
    }

    pub async fn run(self, cancel: CancellationToken) {
        info!(
            source = %self.settings.query.source,
            interval = ?self.settings.interval,
            "Content scheduler started."
        );
        let first = Instant::now() + self.settings.warmup;
        let mut ticker = tokio::time::interval_at(first, self.settings.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }
            let outcome = tokio::select! {
                _ = cancel.cancelled() => break,
                outcome = self.run_cycle() => outcome,
            };
            match outcome {
                Ok(0) => info!("No topics fetched this interval."),
                Ok(queued) => info!(queued, "Finished queueing content segment."),
                Err(e) => error!(error = %e, "Content cycle abandoned"),
            }
        }
        info!("Content scheduler stopped.");
    }

    /// One fetch-and-enqueue pass. Returns how many directives were queued.
    pub async fn run_cycle(&self) -> Result<usize, CycleError> {
        let source = Arc::clone(&self.source);
        let query = self.settings.query.clone();
        info!(source = %query.source, limit = query.limit, "Fetching topics");
        let topics = offload(move || source.fetch_topics(&query)).await??;

        let titles = reactable_titles(topics);
        if titles.is_empty() {
            return Ok(0);
        }
        info!(count = titles.len(), "Queueing reactions for top topics");

        self.queue
            .enqueue(AudioDirective::sound_effect(&self.settings.stinger))?;
        self.queue
            .enqueue(AudioDirective::speech(&self.settings.intro))?;

        for (i, title) in titles.iter().enumerate() {
            if i > 0 {
                tokio::time::sleep(self.settings.reaction_spacing).await;
            }
            info!(topic = i + 1, of = titles.len(), "Generating reaction");
            let reaction = self.reactor.react_offloaded(title).await?;
            self.queue.enqueue(AudioDirective::speech(reaction))?;
        }
        Ok(titles.len() + 2)
    }
}
