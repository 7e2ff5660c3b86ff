//! Episode sequencing
//!
//! The counter is seeded once when the ledger is loaded and then advanced in
//! memory by exactly one per created episode. Current documents store the
//! counter explicitly; parsing ordinals back out of titles is only done when
//! migrating a legacy document that predates the stored counter.

use serde::{Deserialize, Serialize};

/// Hands out episode ordinals
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EpisodeSequencer {
    current: u32,
}

impl EpisodeSequencer {
    /// Sequencer whose next ordinal will be `last + 1`
    pub fn starting_at(last: u32) -> Self {
        Self { current: last }
    }

    /// Seed from legacy titles
    ///
    /// Titles without the marker, or whose ordinal does not parse, are
    /// skipped silently. Returns a counter at the highest parsed ordinal, or
    /// 0 when none parse.
    pub fn seed_from_titles<'a, I>(titles: I, format: &TitleFormat) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let highest = titles
            .into_iter()
            .filter_map(|title| format.parse_ordinal(title))
            .max()
            .unwrap_or(0);
        Self::starting_at(highest)
    }

    /// Last ordinal handed out
    pub fn current(&self) -> u32 {
        self.current
    }

    /// Advance by one and return the new ordinal
    pub fn next(&mut self) -> u32 {
        self.current = self.current.saturating_add(1);
        self.current
    }
}

/// Builds episode titles and, for legacy migration, reads ordinals back out
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TitleFormat {
    /// Prefix naming the series, e.g. "Season 4"
    pub season_label: String,
    /// Word preceding the ordinal, e.g. "Episode"
    pub episode_marker: String,
}

impl Default for TitleFormat {
    fn default() -> Self {
        Self::new("Season 4", "Episode")
    }
}

impl TitleFormat {
    pub fn new(season_label: impl Into<String>, episode_marker: impl Into<String>) -> Self {
        Self {
            season_label: season_label.into(),
            episode_marker: episode_marker.into(),
        }
    }

    /// "<season label> - <episode marker> <ordinal>"
    pub fn title(&self, ordinal: u32) -> String {
        format!("{} - {} {}", self.season_label, self.episode_marker, ordinal)
    }

    /// Ordinal following the first occurrence of the episode marker
    pub fn parse_ordinal(&self, title: &str) -> Option<u32> {
        if self.episode_marker.is_empty() {
            return None;
        }
        let after = title.split(self.episode_marker.as_str()).nth(1)?;
        after.trim().parse().ok()
    }
}
