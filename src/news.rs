//! Local health news: recency filtering and the rotating carousel

use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::debug;

use crate::models::{NewsArticle, NewsFeed};

pub const DEFAULT_RECENT_DAYS: i64 = 30;

pub const NO_NEWS: &str = "No health news available for this location";

/// Articles published within `window` of `now`, in feed order.
///
/// Articles without a parseable date are never recent.
#[must_use]
pub fn recent_articles<'a>(
    articles: &'a [NewsArticle],
    now: DateTime<Utc>,
    window: chrono::Duration,
) -> Vec<&'a NewsArticle> {
    let cutoff = now - window;
    articles
        .iter()
        .filter(|article| article.published_at().is_some_and(|at| at >= cutoff))
        .collect()
}

/// Every article, newest first. Undated articles keep their feed order at the end.
#[must_use]
pub fn sorted_by_date(articles: &[NewsArticle]) -> Vec<&NewsArticle> {
    let mut sorted: Vec<&NewsArticle> = articles.iter().collect();
    sorted.sort_by_key(|article| std::cmp::Reverse(article.published_at()));
    sorted
}

/// What the news card shows
#[derive(Debug, Clone, PartialEq)]
pub enum NewsCard {
    Articles(Vec<NewsArticle>),
    /// Articles exist but all are older than the window
    NoneRecent { days: i64 },
    NoneAvailable,
    /// The backend could not fetch news for this location
    Unavailable(String),
}

impl NewsCard {
    #[must_use]
    pub fn from_feed(feed: &NewsFeed, now: DateTime<Utc>, window: chrono::Duration) -> Self {
        if feed.articles.is_empty() {
            return match feed.error.as_deref().filter(|e| !e.is_empty()) {
                Some(error) => NewsCard::Unavailable(error.to_string()),
                None => NewsCard::NoneAvailable,
            };
        }

        let recent = recent_articles(&feed.articles, now, window);
        if recent.is_empty() {
            NewsCard::NoneRecent {
                days: window.num_days(),
            }
        } else {
            NewsCard::Articles(recent.into_iter().cloned().collect())
        }
    }

    /// Placeholder text when there is nothing to show
    #[must_use]
    pub fn message(&self) -> Option<String> {
        match self {
            NewsCard::Articles(_) => None,
            NewsCard::NoneRecent { days } => Some(format!(
                "No recent health news in the past {days} {}",
                if *days == 1 { "day" } else { "days" }
            )),
            NewsCard::NoneAvailable => Some(NO_NEWS.to_string()),
            NewsCard::Unavailable(error) => Some(format!("Health news unavailable: {error}")),
        }
    }

    #[must_use]
    pub fn articles(&self) -> &[NewsArticle] {
        match self {
            NewsCard::Articles(articles) => articles,
            _ => &[],
        }
    }
}

/// Background rotation through `len` articles.
///
/// The current index is published on a watch channel. The task is aborted
/// when the carousel is stopped or dropped.
#[derive(Debug)]
pub struct NewsCarousel {
    index: watch::Receiver<usize>,
    task: Option<JoinHandle<()>>,
}

impl NewsCarousel {
    /// Start rotating; fewer than two articles spawn no task
    #[must_use]
    pub fn spawn(len: usize, interval: Duration) -> Self {
        let (tx, index) = watch::channel(0);
        if len < 2 || interval.is_zero() {
            return Self { index, task: None };
        }

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut current = 0;
            loop {
                ticker.tick().await;
                current = (current + 1) % len;
                if tx.send(current).is_err() {
                    break;
                }
            }
        });
        debug!("News carousel started over {} articles", len);

        Self {
            index,
            task: Some(task),
        }
    }

    #[must_use]
    pub fn current(&self) -> usize {
        *self.index.borrow()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<usize> {
        self.index.clone()
    }

    /// Wait for the next rotation; `None` once the carousel has stopped
    pub async fn changed(&mut self) -> Option<usize> {
        self.task.as_ref()?;
        self.index.changed().await.ok()?;
        Some(*self.index.borrow_and_update())
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    pub fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            debug!("News carousel stopped");
        }
    }
}

impl Drop for NewsCarousel {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn article(title: &str, pub_date: Option<&str>) -> NewsArticle {
        NewsArticle {
            title: title.to_string(),
            pub_date: pub_date.map(str::to_string),
            ..Default::default()
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 30, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_recent_articles_window() {
        let articles = vec![
            article("fresh", Some("2025-06-29T08:00:00Z")),
            article("edge", Some("2025-05-31T12:00:00Z")),
            article("stale", Some("2025-05-01T00:00:00Z")),
            article("undated", None),
            article("garbled", Some("sometime")),
        ];

        let recent = recent_articles(&articles, now(), chrono::Duration::days(30));
        let titles: Vec<&str> = recent.iter().map(|a| a.title.as_str()).collect();
        assert_eq!(titles, vec!["fresh", "edge"]);
    }

    #[test]
    fn test_sorted_by_date_newest_first() {
        let articles = vec![
            article("undated", None),
            article("march", Some("2025-03-14T08:30:00Z")),
            article("garbled", Some("sometime")),
            article("june", Some("2025-06-01")),
            article("january", Some("Wed, 01 Jan 2025 10:00:00 GMT")),
        ];

        let sorted = sorted_by_date(&articles);
        let titles: Vec<&str> = sorted.iter().map(|a| a.title.as_str()).collect();
        assert_eq!(titles, vec!["june", "march", "january", "undated", "garbled"]);
    }

    #[test]
    fn test_card_messages() {
        let window = chrono::Duration::days(DEFAULT_RECENT_DAYS);

        let empty = NewsCard::from_feed(&NewsFeed::default(), now(), window);
        assert_eq!(empty.message().as_deref(), Some(NO_NEWS));

        let old = NewsFeed {
            articles: vec![article("stale", Some("2024-01-01"))],
            ..Default::default()
        };
        let card = NewsCard::from_feed(&old, now(), window);
        assert_eq!(card, NewsCard::NoneRecent { days: 30 });
        assert_eq!(
            card.message().as_deref(),
            Some("No recent health news in the past 30 days")
        );

        let failed = NewsFeed {
            error: Some("rate limited".to_string()),
            ..Default::default()
        };
        assert_eq!(
            NewsCard::from_feed(&failed, now(), window),
            NewsCard::Unavailable("rate limited".to_string())
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_carousel_rotates_and_wraps() {
        let mut carousel = NewsCarousel::spawn(3, Duration::from_secs(5));
        assert_eq!(carousel.current(), 0);

        let start = Instant::now();
        assert_eq!(carousel.changed().await, Some(1));
        assert!(start.elapsed() >= Duration::from_secs(5));
        assert_eq!(carousel.changed().await, Some(2));
        assert_eq!(carousel.changed().await, Some(0));
        assert!(start.elapsed() >= Duration::from_secs(15));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stopped_carousel_no_longer_rotates() {
        let mut carousel = NewsCarousel::spawn(4, Duration::from_secs(5));
        assert!(carousel.is_running());

        carousel.stop();
        assert!(!carousel.is_running());
        assert_eq!(carousel.changed().await, None);
        assert_eq!(carousel.current(), 0);
    }

    #[tokio::test]
    async fn test_single_article_spawns_nothing() {
        let mut carousel = NewsCarousel::spawn(1, Duration::from_secs(5));
        assert!(!carousel.is_running());
        assert_eq!(carousel.changed().await, None);

        let empty = NewsCarousel::spawn(0, Duration::from_secs(5));
        assert_eq!(empty.current(), 0);
    }
}
