//! Ledger service
//!
//! The only owner of the in-memory ledger. Adapters reach the ledger through
//! the five operations exposed here and never touch it directly.
//!
//! Mutations (episode creation, score recording) take the write lock and
//! hold it across the persistence flush, so at most one mutation including
//! its save is in flight. Reads take the read lock and return owned
//! summaries, giving callers a consistent snapshot.
//!
//! A failed save is reported to the caller but the in-memory mutation is not
//! rolled back. Until the next successful save, a restart loses that
//! mutation (and, for creations, may hand out the same ordinal again).

use chrono::Utc;
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, error, info, warn};

use crate::events::{EventBus, LedgerEvent};
use crate::ledger::{
    CreatedEpisode, EpisodeSummary, Ledger, LedgerOverview, LedgerStore, RecordResult, TitleFormat,
};
use crate::Result;

pub struct LedgerService {
    ledger: RwLock<Ledger>,
    store: LedgerStore,
    titles: TitleFormat,
    events: EventBus,
}

impl LedgerService {
    /// Load the ledger from `store` and take ownership of it
    ///
    /// Fails with `CorruptState` if the stored document is unreadable; the
    /// caller is expected to halt startup in that case.
    pub async fn open(store: LedgerStore, titles: TitleFormat) -> Result<Self> {
        let ledger = store.load().await?;
        Ok(Self::new(ledger, store, titles))
    }

    pub fn new(ledger: Ledger, store: LedgerStore, titles: TitleFormat) -> Self {
        Self {
            ledger: RwLock::new(ledger),
            store,
            titles,
            events: EventBus::default(),
        }
    }

    pub fn titles(&self) -> &TitleFormat {
        &self.titles
    }

    pub fn store(&self) -> &LedgerStore {
        &self.store
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LedgerEvent> {
        self.events.subscribe()
    }

    /// Create an episode for a qualifying post and persist it
    pub async fn create_episode(&self, post_id: &str) -> Result<CreatedEpisode> {
        let mut ledger = self.ledger.write().await;

        let created = ledger.create_episode(post_id, &self.titles).map_err(|e| {
            warn!("Episode creation rejected for post {}: {}", post_id, e);
            e
        })?;

        if let Err(e) = self.store.save(&ledger).await {
            error!(
                "Episode {} ({}) created in memory but not persisted: {}",
                created.episode_id, created.title, e
            );
            return Err(e);
        }
        drop(ledger);

        info!("Created episode {} for post {}", created.title, created.episode_id);
        self.events.emit_lossy(LedgerEvent::EpisodeCreated {
            episode_id: created.episode_id.clone(),
            title: created.title.clone(),
            ordinal: created.ordinal,
            timestamp: Utc::now(),
        });
        Ok(created)
    }

    /// Record (or replace) a rater's score and persist it
    pub async fn record_score(&self, episode_id: &str, rater_id: &str, score: i64) -> Result<RecordResult> {
        let mut ledger = self.ledger.write().await;

        let result = ledger.record_score(episode_id, rater_id, score).map_err(|e| {
            debug!("Score from {} for {} rejected: {}", rater_id, episode_id, e);
            e
        })?;

        if let Err(e) = self.store.save(&ledger).await {
            error!(
                "Score {} from {} for episode {} applied in memory but not persisted: {}",
                result.score, rater_id, episode_id, e
            );
            return Err(e);
        }
        drop(ledger);

        debug!(
            "Recorded {} from {} for {} (previous: {:?})",
            result.score, rater_id, result.title, result.previous
        );
        self.events.emit_lossy(LedgerEvent::ScoreRecorded {
            episode_id: result.episode_id.clone(),
            rater_id: result.rater_id.clone(),
            score: result.score.value(),
            replaced: result.previous.map(|s| s.value()),
            timestamp: Utc::now(),
        });
        Ok(result)
    }

    pub async fn summarize(&self, episode_id: &str) -> Option<EpisodeSummary> {
        self.ledger.read().await.summarize(episode_id)
    }

    pub async fn summarize_all(&self) -> Vec<EpisodeSummary> {
        self.ledger.read().await.summarize_all()
    }

    pub async fn find_by_ordinal(&self, ordinal: u32) -> Option<EpisodeSummary> {
        self.ledger.read().await.find_by_ordinal(ordinal)
    }

    pub async fn overview(&self) -> LedgerOverview {
        self.ledger.read().await.overview()
    }

    /// Owned copy of the whole ledger
    pub async fn snapshot(&self) -> Ledger {
        self.ledger.read().await.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::ScoreStats;
    use crate::Error;
    use std::sync::Arc;
    use tempfile::TempDir;

    async fn open_in(dir: &TempDir) -> LedgerService {
        let store = LedgerStore::new(dir.path().join("ratings.json"), TitleFormat::default());
        LedgerService::open(store, TitleFormat::default()).await.unwrap()
    }

    #[tokio::test]
    async fn test_mutations_are_persisted_before_returning() {
        let dir = TempDir::new().unwrap();
        let service = open_in(&dir).await;

        service.create_episode("100").await.unwrap();
        service.record_score("100", "alice", 7).await.unwrap();

        let reloaded = service.store().load().await.unwrap();
        assert_eq!(reloaded, service.snapshot().await);
        assert_eq!(reloaded.get("100").unwrap().scores["alice"].value(), 7);
    }

    #[tokio::test]
    async fn test_unknown_episode_does_not_touch_disk() {
        let dir = TempDir::new().unwrap();
        let service = open_in(&dir).await;

        let err = service.record_score("ghost", "alice", 5).await.unwrap_err();

        assert!(matches!(err, Error::UnknownEpisode(_)));
        assert!(!service.store().path().exists());
    }

    #[tokio::test]
    async fn test_concurrent_creations_get_distinct_ordinals() {
        let dir = TempDir::new().unwrap();
        let service = Arc::new(open_in(&dir).await);

        let handles: Vec<_> = (0..16)
            .map(|i| {
                let service = Arc::clone(&service);
                tokio::spawn(async move { service.create_episode(&format!("post-{}", i)).await.unwrap() })
            })
            .collect();

        let mut ordinals = Vec::new();
        for handle in handles {
            ordinals.push(handle.await.unwrap().ordinal);
        }
        ordinals.sort_unstable();

        assert_eq!(ordinals, (1..=16).collect::<Vec<u32>>());
        assert_eq!(service.store().load().await.unwrap().len(), 16);
    }

    #[tokio::test]
    async fn test_events_follow_successful_mutations() {
        let dir = TempDir::new().unwrap();
        let service = open_in(&dir).await;
        let mut rx = service.subscribe();

        service.create_episode("7").await.unwrap();
        service.record_score("7", "bob", 3).await.unwrap();
        service.record_score("7", "bob", 6).await.unwrap();
        let _ = service.record_score("7", "bob", 42).await;

        assert!(matches!(rx.recv().await.unwrap(), LedgerEvent::EpisodeCreated { ordinal: 1, .. }));
        assert!(matches!(
            rx.recv().await.unwrap(),
            LedgerEvent::ScoreRecorded { score: 3, replaced: None, .. }
        ));
        assert!(matches!(
            rx.recv().await.unwrap(),
            LedgerEvent::ScoreRecorded { score: 6, replaced: Some(3), .. }
        ));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_persistence_failure_is_reported() {
        let dir = TempDir::new().unwrap();
        // A directory where the file should be makes the final rename fail
        let path = dir.path().join("ratings.json");
        std::fs::create_dir(&path).unwrap();
        std::fs::write(path.join("occupied"), b"x").unwrap();
        let service = LedgerService::new(
            Ledger::new(),
            LedgerStore::new(&path, TitleFormat::default()),
            TitleFormat::default(),
        );

        let err = service.create_episode("1").await.unwrap_err();

        assert!(matches!(err, Error::Persistence(_)));
        // No rollback: the episode stays in memory
        let summary = service.summarize("1").await.unwrap();
        assert_eq!(summary.stats, ScoreStats::NoData);
    }
}
