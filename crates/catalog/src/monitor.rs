//! Keeping a gallery synchronized in the background.

use crate::error::ErrorKind;
use crate::gallery::Gallery;
use crate::sync::SyncOutcome;
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Wait between synchronizations: doubles after every failure up to `max`,
/// back to `base` after a success. Every wait is spread by `jitter` (as a
/// fraction) in either direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Backoff {
    base: Duration,
    max: Duration,
    jitter: f64,
    current: Duration,
}

impl Backoff {
    pub fn new(base: Duration, max: Duration, jitter: f64) -> Self {
        Self { base, max: max.max(base), jitter: jitter.clamp(0.0, 0.99), current: base }
    }

    /// The un-jittered interval before the next synchronization.
    pub fn current(&self) -> Duration {
        self.current
    }

    /// Record a failed synchronization; returns the new interval.
    pub fn failure(&mut self) -> Duration {
        self.current = self.current.saturating_mul(2).min(self.max);
        self.current
    }

    /// Record a successful synchronization.
    pub fn reset(&mut self) {
        self.current = self.base;
    }

    /// How long to actually sleep before the next synchronization.
    pub fn next_wait(&self) -> Duration {
        if self.jitter == 0.0 {
            return self.current;
        }
        let factor = rand::rng().random_range(1.0 - self.jitter..=1.0 + self.jitter);
        Duration::try_from_secs_f64(self.current.as_secs_f64() * factor).unwrap_or(Duration::MAX)
    }
}

/// Spawn a task that re-synchronizes `gallery` forever, waiting according to
/// `backoff` between runs. Abort the returned handle to stop it.
///
/// A run rejected as [`Busy`](ErrorKind::Busy) (someone else called
/// [`Gallery::load`] meanwhile) counts as neither success nor failure.
pub fn monitor(gallery: Arc<Gallery>, mut backoff: Backoff) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(backoff.next_wait()).await;
            match gallery.load().await {
                Ok(outcome) => {
                    if let SyncOutcome::Updated { total, dirty } = outcome {
                        tracing::debug!(total, dirty, resident_bytes = gallery.resident_bytes(), "Refreshed catalog");
                    }
                    backoff.reset();
                },
                Err(err) if *err == ErrorKind::Busy => {
                    tracing::debug!("Synchronization already running, skipping");
                },
                Err(err) => {
                    let previous = backoff.current();
                    let next = backoff.failure();
                    tracing::warn!(
                        after = ?previous,
                        retry_in = ?next,
                        error = ?err,
                        "Failed to refresh catalog"
                    );
                },
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GalleryOptions;
    use crate::testing::{Labeler, Stamp, gallery, stamped};
    use gallery_source::SourceHandle;
    use gallery_source::source::{LocalSource, MockSource};

    fn secs(n: u64) -> Duration {
        Duration::from_secs(n)
    }

    #[test]
    fn doubles_up_to_cap() {
        let mut backoff = Backoff::new(secs(30), secs(200), 0.0);
        assert_eq!(backoff.next_wait(), secs(30));
        assert_eq!(backoff.failure(), secs(60));
        assert_eq!(backoff.failure(), secs(120));
        assert_eq!(backoff.failure(), secs(200));
        assert_eq!(backoff.failure(), secs(200));
        backoff.reset();
        assert_eq!(backoff.current(), secs(30));
    }

    #[test]
    fn cap_below_base() {
        let mut backoff = Backoff::new(secs(30), secs(10), 0.0);
        assert_eq!(backoff.failure(), secs(30));
    }

    #[test]
    fn jitter_near_duration_limit() {
        let mut backoff = Backoff::new(secs(30), Duration::MAX, 0.1);
        for _ in 0..70 {
            backoff.failure();
        }
        assert_eq!(backoff.current(), Duration::MAX);
        for _ in 0..100 {
            assert!(backoff.next_wait() > secs(u64::MAX / 2));
        }
    }

    #[test]
    fn jitter_stays_in_range() {
        let backoff = Backoff::new(secs(100), secs(100), 0.1);
        for _ in 0..200 {
            let wait = backoff.next_wait();
            assert!(wait >= secs(90) && wait <= secs(110), "{wait:?}");
        }
    }

    async fn wait_for(mut condition: impl FnMut() -> bool) {
        for _ in 0..200 {
            if condition() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("condition not met in time");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn picks_up_changes() {
        let source = Arc::new(MockSource::with_files([("a.jpg", stamped(1))]));
        let gallery = Arc::new(gallery(&source));
        gallery.load().await.unwrap();

        let handle = monitor(Arc::clone(&gallery), Backoff::new(Duration::from_millis(20), Duration::from_secs(1), 0.0));
        source.put("b.jpg", stamped(2)).await;
        wait_for(|| gallery.list_items().len() == 2).await;
        assert_eq!(gallery.first_item().unwrap().name, "b.jpg");
        handle.abort();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn recovers_after_failures() {
        let dir = tempfile::tempdir().unwrap();
        let source: SourceHandle = Arc::new(LocalSource::new("local", dir.path()).unwrap());
        let options = GalleryOptions { folder: "holiday".into(), ..Default::default() };
        let gallery = Arc::new(Gallery::new(source, Arc::new(Labeler), Arc::new(Stamp), options));
        assert!(gallery.load().await.is_err());

        let handle = monitor(Arc::clone(&gallery), Backoff::new(Duration::from_millis(10), Duration::from_millis(40), 0.0));
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(gallery.list_items().is_empty());

        std::fs::create_dir(dir.path().join("holiday")).unwrap();
        std::fs::write(dir.path().join("holiday/a.jpg"), stamped(7)).unwrap();
        wait_for(|| gallery.list_items().len() == 1).await;
        assert_eq!(gallery.first_item().unwrap().created.unix_timestamp(), 7);
        handle.abort();
    }
}
