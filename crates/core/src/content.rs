//! Content Source Contract

use crate::error::ServiceError;
use std::fmt;

/// Ranking window for "top" content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeWindow {
    Hour,
    #[default]
    Day,
    Week,
    Month,
    Year,
    All,
}

impl TimeWindow {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeWindow::Hour => "hour",
            TimeWindow::Day => "day",
            TimeWindow::Week => "week",
            TimeWindow::Month => "month",
            TimeWindow::Year => "year",
            TimeWindow::All => "all",
        }
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What to ask the content source for on each cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentQuery {
    /// Feed or community name, e.g. a subreddit.
    pub source: String,
    pub limit: usize,
    pub window: TimeWindow,
}

impl Default for ContentQuery {
    fn default() -> Self {
        Self {
            source: "LivestreamFail".to_string(),
            limit: 5,
            window: TimeWindow::Day,
        }
    }
}

/// A ranked entry from the feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topic {
    pub title: String,
    /// Pinned/announcement entries are never reacted to.
    pub pinned: bool,
}

impl Topic {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            pinned: false,
        }
    }

    pub fn pinned(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            pinned: true,
        }
    }
}

/// Supplies ranked topics. Implementations may block.
#[cfg_attr(test, mockall::automock)]
pub trait ContentSource: Send + Sync {
    fn fetch_topics(&self, query: &ContentQuery) -> Result<Vec<Topic>, ServiceError>;
}

/// Drops pinned entries and keeps the feed's order.
pub fn reactable_titles(topics: Vec<Topic>) -> Vec<String> {
    topics
        .into_iter()
        .filter(|t| !t.pinned)
        .map(|t| t.title)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reactable_titles_skips_pinned() {
        let titles = reactable_titles(vec![
            Topic::pinned("Weekly megathread"),
            Topic::new("First"),
            Topic::new("Second"),
        ]);
        assert_eq!(titles, vec!["First".to_string(), "Second".to_string()]);
    }

    #[test]
    fn test_default_query() {
        let query = ContentQuery::default();
        assert_eq!(query.limit, 5);
        assert_eq!(query.window.to_string(), "day");
    }
}
