//! Presentation: rating controls and result text
//!
//! The ledger returns data only; every user-facing string is built here.
//! An unrated episode is always rendered as "no ratings", never as 0.0.

use serde::Serialize;
use tally_common::ledger::{EpisodeSummary, RecordResult, ScoreStats, MAX_SCORE, MIN_SCORE};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ButtonStyle {
    Primary,
    Success,
    Secondary,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Button {
    pub custom_id: String,
    pub label: String,
    pub style: ButtonStyle,
}

/// What a control press asks for, encoded in the button's custom id
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Control {
    /// `rate:<episode>:<score>`
    Rate { episode_id: String, score: i64 },
    /// `results:<episode>`
    Results { episode_id: String },
    /// `results:all`
    AllResults,
}

impl Control {
    pub fn custom_id(&self) -> String {
        match self {
            Control::Rate { episode_id, score } => format!("rate:{}:{}", episode_id, score),
            Control::Results { episode_id } => format!("results:{}", episode_id),
            Control::AllResults => "results:all".to_string(),
        }
    }

    /// Decode a custom id; `None` for anything this bot did not render
    pub fn parse(custom_id: &str) -> Option<Self> {
        if custom_id == "results:all" {
            return Some(Control::AllResults);
        }
        if let Some(episode_id) = custom_id.strip_prefix("results:") {
            return (!episode_id.is_empty()).then(|| Control::Results {
                episode_id: episode_id.to_string(),
            });
        }
        let rest = custom_id.strip_prefix("rate:")?;
        let (episode_id, score) = rest.rsplit_once(':')?;
        if episode_id.is_empty() {
            return None;
        }
        Some(Control::Rate {
            episode_id: episode_id.to_string(),
            score: score.parse().ok()?,
        })
    }
}

/// Buttons attached to a new episode's announcement: one per score, then
/// the two result buttons
pub fn rating_controls(episode_id: &str) -> Vec<Button> {
    let mut buttons: Vec<Button> = (MIN_SCORE..=MAX_SCORE)
        .map(|score| Button {
            custom_id: Control::Rate {
                episode_id: episode_id.to_string(),
                score: i64::from(score),
            }
            .custom_id(),
            label: score.to_string(),
            style: ButtonStyle::Primary,
        })
        .collect();

    buttons.push(Button {
        custom_id: Control::Results {
            episode_id: episode_id.to_string(),
        }
        .custom_id(),
        label: "📊 Show Results".to_string(),
        style: ButtonStyle::Success,
    });
    buttons.push(Button {
        custom_id: Control::AllResults.custom_id(),
        label: "📑 All Episodes Results".to_string(),
        style: ButtonStyle::Secondary,
    });
    buttons
}

pub fn announcement(title: &str) -> String {
    format!("📖 Posted: **{}**\n⬇️ Choose your rating:", title)
}

pub fn score_confirmation(result: &RecordResult) -> String {
    format!("✅ Rated **{}** with {}/10", result.title, result.score)
}

/// Detailed results for one episode
pub fn episode_results(summary: &EpisodeSummary) -> String {
    match summary.stats {
        ScoreStats::NoData => format!("⚠️ No ratings for {} yet.", summary.title),
        ScoreStats::Rated { mean, .. } => {
            let lines: Vec<String> = summary
                .scores
                .iter()
                .map(|s| format!("<@{}> ⭐ {}/10", s.rater_id, s.score))
                .collect();
            format!(
                "📊 Results for {}\n**Average:** {:.1}/10\n\n{}",
                summary.title,
                mean,
                lines.join("\n")
            )
        }
    }
}

/// One line per rated episode in creation order; unrated episodes omitted
pub fn all_results(summaries: &[EpisodeSummary]) -> String {
    if summaries.is_empty() {
        return "⚠️ No ratings yet.".to_string();
    }

    let lines: Vec<String> = summaries
        .iter()
        .filter_map(|summary| match summary.stats {
            ScoreStats::NoData => None,
            ScoreStats::Rated { count, mean } => Some(format!(
                "- **{}**: {:.1}/10 ({} {})",
                summary.title,
                mean,
                count,
                if count == 1 { "rating" } else { "ratings" }
            )),
        })
        .collect();

    if lines.is_empty() {
        return "⚠️ No episode has been rated yet.".to_string();
    }
    format!("📑 All episodes results\n{}", lines.join("\n"))
}

/// Results for the episode requested by ordinal
pub fn ordinal_results(ordinal: u32, summary: Option<&EpisodeSummary>) -> String {
    match summary {
        None => format!("⚠️ Episode {} not found.", ordinal),
        Some(summary) if !summary.stats.is_rated() => {
            format!("⚠️ No ratings for episode {} yet.", ordinal)
        }
        Some(summary) => episode_results(summary),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tally_common::ledger::TitleFormat;
    use tally_common::Ledger;

    fn rated_ledger() -> Ledger {
        let titles = TitleFormat::default();
        let mut ledger = Ledger::new();
        ledger.create_episode("10", &titles).unwrap();
        ledger.create_episode("20", &titles).unwrap();
        ledger.create_episode("30", &titles).unwrap();
        for (rater, score) in [("1", 3), ("2", 7), ("3", 10)] {
            ledger.record_score("10", rater, score).unwrap();
        }
        ledger.record_score("30", "1", 5).unwrap();
        ledger
    }

    #[test]
    fn test_controls_cover_every_score_and_both_result_views() {
        let buttons = rating_controls("555");

        assert_eq!(buttons.len(), 12);
        assert_eq!(buttons[0].custom_id, "rate:555:1");
        assert_eq!(buttons[9].label, "10");
        assert_eq!(buttons[10].custom_id, "results:555");
        assert_eq!(buttons[11].custom_id, "results:all");
        for button in &buttons {
            assert!(Control::parse(&button.custom_id).is_some());
        }
    }

    #[test]
    fn test_control_parse() {
        assert_eq!(
            Control::parse("rate:123:7"),
            Some(Control::Rate {
                episode_id: "123".to_string(),
                score: 7
            })
        );
        assert_eq!(Control::parse("results:all"), Some(Control::AllResults));
        assert_eq!(
            Control::parse("results:9"),
            Some(Control::Results {
                episode_id: "9".to_string()
            })
        );
        assert_eq!(Control::parse("rate:123:seven"), None);
        assert_eq!(Control::parse("rate::7"), None);
        assert_eq!(Control::parse("results:"), None);
        assert_eq!(Control::parse("vote:1"), None);
    }

    #[test]
    fn test_episode_results_lists_raters() {
        let summary = rated_ledger().summarize("10").unwrap();

        let text = episode_results(&summary);

        assert!(text.starts_with("📊 Results for Season 4 - Episode 1"));
        assert!(text.contains("**Average:** 6.7/10"));
        assert!(text.contains("<@2> ⭐ 7/10"));
    }

    #[test]
    fn test_unrated_episode_never_shows_zero() {
        let summary = rated_ledger().summarize("20").unwrap();

        let text = episode_results(&summary);

        assert!(text.contains("No ratings"));
        assert!(!text.contains("0.0"));
    }

    #[test]
    fn test_all_results_omits_unrated() {
        let text = all_results(&rated_ledger().summarize_all());

        assert!(text.contains("- **Season 4 - Episode 1**: 6.7/10 (3 ratings)"));
        assert!(text.contains("- **Season 4 - Episode 3**: 5.0/10 (1 rating)"));
        assert!(!text.contains("Episode 2"));
    }

    #[test]
    fn test_all_results_empty_states() {
        assert_eq!(all_results(&[]), "⚠️ No ratings yet.");

        let mut ledger = Ledger::new();
        ledger.create_episode("1", &TitleFormat::default()).unwrap();
        assert_eq!(all_results(&ledger.summarize_all()), "⚠️ No episode has been rated yet.");
    }

    #[test]
    fn test_ordinal_results_states() {
        let ledger = rated_ledger();

        assert_eq!(ordinal_results(9, None), "⚠️ Episode 9 not found.");
        assert_eq!(
            ordinal_results(2, ledger.find_by_ordinal(2).as_ref()),
            "⚠️ No ratings for episode 2 yet."
        );
        assert!(ordinal_results(1, ledger.find_by_ordinal(1).as_ref()).contains("6.7/10"));
    }

    #[test]
    fn test_score_confirmation() {
        let mut ledger = rated_ledger();
        let result = ledger.record_score("20", "4", 9).unwrap();

        assert_eq!(score_confirmation(&result), "✅ Rated **Season 4 - Episode 2** with 9/10");
    }
}
