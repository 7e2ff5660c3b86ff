//! Rating ledger
//!
//! The ledger holds every created episode and the scores raters submitted
//! for it. Iteration order is creation order, which is the stable order used
//! by "all results" views.
//!
//! Invariants maintained here:
//! - one record per episode id, ids never reused
//! - at most one score per rater per episode (last write wins)
//! - ordinals handed out by the sequencer never go backwards
//! - every stored score is within 1..=10

pub mod aggregate;
pub mod sequencer;
pub mod store;

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

pub use aggregate::{EpisodeSummary, LedgerOverview, RaterScore, ScoreStats};
pub use sequencer::{EpisodeSequencer, TitleFormat};
pub use store::LedgerStore;

/// Lowest accepted score
pub const MIN_SCORE: u8 = 1;

/// Highest accepted score
pub const MAX_SCORE: u8 = 10;

/// A single rater's score, guaranteed to be within 1..=10
///
/// Deserialization goes through [`Score::new`], so a stored document holding
/// any other value fails to load instead of smuggling it into the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct Score(u8);

impl Score {
    /// Validate a raw score
    pub fn new(value: i64) -> Result<Self> {
        if (i64::from(MIN_SCORE)..=i64::from(MAX_SCORE)).contains(&value) {
            Ok(Self(value as u8))
        } else {
            Err(Error::InvalidScore(value))
        }
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl TryFrom<i64> for Score {
    type Error = Error;

    fn try_from(value: i64) -> Result<Self> {
        Score::new(value)
    }
}

impl From<Score> for u8 {
    fn from(score: Score) -> u8 {
        score.0
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One rateable episode
///
/// The episode id is the key of the ledger map and is not repeated here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpisodeRecord {
    /// Display label, e.g. "Season 4 - Episode 7"; immutable
    pub title: String,

    /// Sequence number embedded in the title
    ///
    /// `None` only for records migrated from a legacy document whose title
    /// carried no parsable ordinal.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ordinal: Option<u32>,

    /// Rater id -> score
    #[serde(default)]
    pub scores: IndexMap<String, Score>,
}

impl EpisodeRecord {
    pub fn new(title: impl Into<String>, ordinal: Option<u32>) -> Self {
        Self {
            title: title.into(),
            ordinal,
            scores: IndexMap::new(),
        }
    }
}

/// Result of a successful episode creation, handed to the presentation layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreatedEpisode {
    pub episode_id: String,
    pub title: String,
    pub ordinal: u32,
}

/// Result of a successful score submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordResult {
    pub episode_id: String,
    pub title: String,
    pub rater_id: String,
    pub score: Score,
    /// The rater's earlier score for this episode, now overwritten
    pub previous: Option<Score>,
}

/// The complete set of episodes plus the sequencer that numbers new ones
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ledger {
    episodes: IndexMap<String, EpisodeRecord>,
    sequencer: EpisodeSequencer,
}

impl Ledger {
    /// Create an empty ledger (first run)
    pub fn new() -> Self {
        Self::default()
    }

    /// Assemble a ledger from stored records and a seeded sequencer
    ///
    /// The sequencer is raised to the highest stored ordinal so it can never
    /// hand out an ordinal that an existing record already carries.
    pub fn from_parts(episodes: IndexMap<String, EpisodeRecord>, sequencer: EpisodeSequencer) -> Self {
        let highest = episodes.values().filter_map(|r| r.ordinal).max().unwrap_or(0);
        let sequencer = if highest > sequencer.current() {
            EpisodeSequencer::starting_at(highest)
        } else {
            sequencer
        };
        Self { episodes, sequencer }
    }

    pub fn len(&self) -> usize {
        self.episodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.episodes.is_empty()
    }

    pub fn contains(&self, episode_id: &str) -> bool {
        self.episodes.contains_key(episode_id)
    }

    pub fn get(&self, episode_id: &str) -> Option<&EpisodeRecord> {
        self.episodes.get(episode_id)
    }

    /// Episodes in creation order
    pub fn episodes(&self) -> impl Iterator<Item = (&str, &EpisodeRecord)> {
        self.episodes.iter().map(|(id, record)| (id.as_str(), record))
    }

    pub(crate) fn records(&self) -> &IndexMap<String, EpisodeRecord> {
        &self.episodes
    }

    /// Last ordinal handed out (0 before the first episode)
    pub fn last_ordinal(&self) -> u32 {
        self.sequencer.current()
    }

    /// Create a new episode keyed by the triggering post's id
    ///
    /// Order of effects: advance the counter, build the title, insert the
    /// empty record. A duplicate id is rejected before anything changes.
    pub fn create_episode(&mut self, episode_id: &str, titles: &TitleFormat) -> Result<CreatedEpisode> {
        if self.episodes.contains_key(episode_id) {
            return Err(Error::DuplicateEpisode(episode_id.to_string()));
        }

        let ordinal = self.sequencer.next();
        let title = titles.title(ordinal);
        self.episodes.insert(
            episode_id.to_string(),
            EpisodeRecord::new(title.clone(), Some(ordinal)),
        );

        Ok(CreatedEpisode {
            episode_id: episode_id.to_string(),
            title,
            ordinal,
        })
    }

    /// Apply one rater's score to an episode
    ///
    /// Validation happens before any lookup or mutation, so a rejected
    /// request leaves the ledger untouched. Resubmitting overwrites the
    /// rater's previous score; no history is kept.
    pub fn record_score(&mut self, episode_id: &str, rater_id: &str, score: i64) -> Result<RecordResult> {
        let score = Score::new(score)?;

        let record = self
            .episodes
            .get_mut(episode_id)
            .ok_or_else(|| Error::UnknownEpisode(episode_id.to_string()))?;

        let previous = record.scores.insert(rater_id.to_string(), score);

        Ok(RecordResult {
            episode_id: episode_id.to_string(),
            title: record.title.clone(),
            rater_id: rater_id.to_string(),
            score,
            previous,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn titles() -> TitleFormat {
        TitleFormat::new("Season 4", "Episode")
    }

    fn ledger_with(ids: &[&str]) -> Ledger {
        let mut ledger = Ledger::new();
        for id in ids {
            ledger.create_episode(id, &titles()).unwrap();
        }
        ledger
    }

    #[test]
    fn test_score_bounds() {
        assert!(Score::new(0).is_err());
        assert!(Score::new(11).is_err());
        assert!(Score::new(-3).is_err());
        assert_eq!(Score::new(1).unwrap().value(), 1);
        assert_eq!(Score::new(10).unwrap().value(), 10);
    }

    #[test]
    fn test_score_rejects_out_of_range_on_deserialize() {
        assert!(serde_json::from_str::<Score>("7").is_ok());
        assert!(serde_json::from_str::<Score>("11").is_err());
        assert!(serde_json::from_str::<Score>("0").is_err());
        assert!(serde_json::from_str::<Score>("6.5").is_err());
    }

    #[test]
    fn test_create_assigns_sequential_ordinals() {
        let mut ledger = Ledger::new();
        let ordinals: Vec<u32> = (1..=5)
            .map(|i| ledger.create_episode(&format!("post-{}", i), &titles()).unwrap().ordinal)
            .collect();

        assert_eq!(ordinals, vec![1, 2, 3, 4, 5]);
        assert_eq!(ledger.last_ordinal(), 5);
        assert_eq!(ledger.get("post-3").unwrap().title, "Season 4 - Episode 3");
    }

    #[test]
    fn test_create_rejects_duplicate_without_advancing() {
        let mut ledger = ledger_with(&["a"]);
        let before = ledger.clone();

        let err = ledger.create_episode("a", &titles()).unwrap_err();

        assert!(matches!(err, Error::DuplicateEpisode(id) if id == "a"));
        assert_eq!(ledger, before);
        assert_eq!(ledger.create_episode("b", &titles()).unwrap().ordinal, 2);
    }

    #[test]
    fn test_record_then_overwrite_keeps_one_entry() {
        let mut ledger = ledger_with(&["ep"]);

        let first = ledger.record_score("ep", "alice", 4).unwrap();
        assert_eq!(first.previous, None);

        let second = ledger.record_score("ep", "alice", 9).unwrap();
        assert_eq!(second.previous, Some(Score::new(4).unwrap()));
        assert_eq!(second.title, "Season 4 - Episode 1");

        let scores = &ledger.get("ep").unwrap().scores;
        assert_eq!(scores.len(), 1);
        assert_eq!(scores["alice"].value(), 9);
    }

    #[test]
    fn test_record_unknown_episode_leaves_ledger_unchanged() {
        let mut ledger = ledger_with(&["ep"]);
        ledger.record_score("ep", "alice", 5).unwrap();
        let before = ledger.clone();

        let err = ledger.record_score("missing", "alice", 5).unwrap_err();

        assert!(matches!(err, Error::UnknownEpisode(id) if id == "missing"));
        assert_eq!(ledger, before);
    }

    #[test]
    fn test_record_invalid_score_leaves_ledger_unchanged() {
        let mut ledger = ledger_with(&["ep"]);
        let before = ledger.clone();

        for bad in [0, 11, -1, 100] {
            let err = ledger.record_score("ep", "alice", bad).unwrap_err();
            assert!(matches!(err, Error::InvalidScore(v) if v == bad));
        }
        assert_eq!(ledger, before);
    }

    #[test]
    fn test_from_parts_raises_sequencer_to_stored_maximum() {
        let mut episodes = IndexMap::new();
        episodes.insert("x".to_string(), EpisodeRecord::new("Season 4 - Episode 9", Some(9)));

        let ledger = Ledger::from_parts(episodes, EpisodeSequencer::starting_at(3));

        assert_eq!(ledger.last_ordinal(), 9);
    }
}
