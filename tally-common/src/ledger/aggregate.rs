//! Read-only statistics over the ledger

use serde::Serialize;

use super::{EpisodeRecord, Ledger};

/// Score statistics for a set of scores
///
/// An empty set is `NoData`; a mean is never computed for it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ScoreStats {
    NoData,
    Rated {
        count: usize,
        /// Arithmetic mean at the one-decimal precision it is displayed with
        mean: f64,
    },
}

impl ScoreStats {
    fn from_values<I>(values: I) -> Self
    where
        I: IntoIterator<Item = u8>,
    {
        let (count, sum) = values
            .into_iter()
            .fold((0usize, 0u64), |(n, s), v| (n + 1, s + u64::from(v)));
        if count == 0 {
            return ScoreStats::NoData;
        }
        ScoreStats::Rated {
            count,
            mean: round_one_decimal(sum as f64 / count as f64),
        }
    }

    pub fn mean(&self) -> Option<f64> {
        match self {
            ScoreStats::NoData => None,
            ScoreStats::Rated { mean, .. } => Some(*mean),
        }
    }

    pub fn count(&self) -> usize {
        match self {
            ScoreStats::NoData => 0,
            ScoreStats::Rated { count, .. } => *count,
        }
    }

    pub fn is_rated(&self) -> bool {
        matches!(self, ScoreStats::Rated { .. })
    }
}

/// Same digits `{:.1}` prints, so 6.25 becomes 6.2 in both JSON and text
fn round_one_decimal(value: f64) -> f64 {
    format!("{:.1}", value).parse().unwrap_or(value)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RaterScore {
    pub rater_id: String,
    pub score: u8,
}

/// Per-episode statistics and the individual scores behind them
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EpisodeSummary {
    pub episode_id: String,
    pub title: String,
    pub ordinal: Option<u32>,
    pub stats: ScoreStats,
    pub scores: Vec<RaterScore>,
}

impl EpisodeSummary {
    fn from_record(episode_id: &str, record: &EpisodeRecord) -> Self {
        Self {
            episode_id: episode_id.to_string(),
            title: record.title.clone(),
            ordinal: record.ordinal,
            stats: ScoreStats::from_values(record.scores.values().map(|s| s.value())),
            scores: record
                .scores
                .iter()
                .map(|(rater_id, score)| RaterScore {
                    rater_id: rater_id.clone(),
                    score: score.value(),
                })
                .collect(),
        }
    }

    pub fn rater_count(&self) -> usize {
        self.scores.len()
    }
}

/// Totals across the whole ledger
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LedgerOverview {
    pub episode_count: usize,
    pub rated_episode_count: usize,
    /// Mean over every individual score, not a mean of episode means
    pub overall: ScoreStats,
}

impl Ledger {
    /// Statistics for one episode, `None` if it does not exist
    pub fn summarize(&self, episode_id: &str) -> Option<EpisodeSummary> {
        self.episodes
            .get(episode_id)
            .map(|record| EpisodeSummary::from_record(episode_id, record))
    }

    /// Statistics for every episode in creation order; unrated ones are `NoData`
    pub fn summarize_all(&self) -> Vec<EpisodeSummary> {
        self.episodes
            .iter()
            .map(|(id, record)| EpisodeSummary::from_record(id, record))
            .collect()
    }

    /// First episode (in creation order) carrying ordinal `n`
    pub fn find_by_ordinal(&self, n: u32) -> Option<EpisodeSummary> {
        self.episodes
            .iter()
            .find(|(_, record)| record.ordinal == Some(n))
            .map(|(id, record)| EpisodeSummary::from_record(id, record))
    }

    pub fn overview(&self) -> LedgerOverview {
        let rated_episode_count = self
            .episodes
            .values()
            .filter(|r| !r.scores.is_empty())
            .count();
        let overall = ScoreStats::from_values(
            self.episodes
                .values()
                .flat_map(|r| r.scores.values().map(|s| s.value())),
        );
        LedgerOverview {
            episode_count: self.episodes.len(),
            rated_episode_count,
            overall,
        }
    }
}
