//! Cross-scenario analysis of comparison outcomes.
//!
//! Everything here is a pure function of the winners store and an
//! [`InsightConfig`]; thresholds and the category partition are inputs.

use crate::compare::Winner;
use crate::scenario::{Category, Side};
use crate::store::{WinnerRecord, WinnersStore};

/// Tunables for insight synthesis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsightConfig {
    /// A candidate win rate above this emits a strength recommendation
    pub strength_threshold_pct: u32,
    /// A candidate win rate below this emits a caveat
    pub caveat_threshold_pct: u32,
    /// Categories to break down, in reporting order
    pub categories: Vec<Category>,
}

impl Default for InsightConfig {
    fn default() -> Self {
        Self {
            strength_threshold_pct: 70,
            caveat_threshold_pct: 30,
            categories: Category::ALL.to_vec(),
        }
    }
}

/// Win/loss/tie counts from the candidate's point of view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    /// Candidate wins
    pub candidate_wins: usize,
    /// Baseline wins
    pub baseline_wins: usize,
    /// Ties
    pub ties: usize,
}

impl Tally {
    fn from_records<'a>(records: impl Iterator<Item = &'a WinnerRecord>) -> Self {
        let mut tally = Tally::default();
        for record in records {
            match record.comparison.winner {
                Winner::Candidate => tally.candidate_wins += 1,
                Winner::Baseline => tally.baseline_wins += 1,
                Winner::Tie => tally.ties += 1,
            }
        }
        tally
    }

    /// All comparisons, ties included.
    pub fn total(&self) -> usize {
        self.candidate_wins + self.baseline_wins + self.ties
    }

    /// Wins of `side`.
    pub fn wins(&self, side: Side) -> usize {
        match side {
            Side::Candidate => self.candidate_wins,
            Side::Baseline => self.baseline_wins,
        }
    }

    /// Candidate wins over all comparisons, floored; `None` when empty.
    pub fn candidate_win_rate(&self) -> Option<u32> {
        percent(self.candidate_wins, self.total())
    }
}

/// The side that won strictly more comparisons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Champion {
    /// Winning side
    pub side: Side,
    /// `wins * 100 / (wins + losses)`, floored, ties excluded
    pub victory_rate_pct: u32,
}

/// Candidate performance within one category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryInsight {
    /// Category
    pub category: Category,
    /// Outcomes of timed operations in this category
    pub tally: Tally,
    /// Candidate wins over total ops, floored; `None` if nothing ran
    pub win_rate_pct: Option<u32>,
}

/// Direction of a recommendation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecommendationKind {
    /// The candidate is a good fit here
    Strength,
    /// The candidate lags here
    Caveat,
}

/// What a recommendation is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subject {
    /// A workload category
    Category(Category),
    /// Repository footprint
    Storage,
}

/// One threshold-triggered recommendation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Recommendation {
    /// Strength or caveat
    pub kind: RecommendationKind,
    /// Category or storage
    pub subject: Subject,
    /// Candidate win rate that triggered it
    pub win_rate_pct: u32,
}

/// Result of insight synthesis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Insights {
    /// Outcomes over every timed (scenario, operation) pair
    pub totals: Tally,
    /// Overall champion, if one side won strictly more
    pub champion: Option<Champion>,
    /// Per-category breakdown, in configured order
    pub categories: Vec<CategoryInsight>,
    /// Storage outcomes, kept apart from `totals`
    pub storage: Tally,
    /// Recommendations, categories first then storage
    pub recommendations: Vec<Recommendation>,
}

/// Analyses every winner record.
pub fn synthesize(winners: &WinnersStore, config: &InsightConfig) -> Insights {
    let totals = Tally::from_records(winners.timed());
    let storage = Tally::from_records(winners.storage());

    let categories: Vec<CategoryInsight> = config
        .categories
        .iter()
        .map(|&category| {
            let tally = Tally::from_records(winners.timed().filter(|r| r.category == category));
            CategoryInsight {
                category,
                tally,
                win_rate_pct: tally.candidate_win_rate(),
            }
        })
        .collect();

    let mut recommendations: Vec<Recommendation> = categories
        .iter()
        .filter_map(|c| {
            let rate = c.win_rate_pct?;
            recommend(config, Subject::Category(c.category), rate)
        })
        .collect();

    if let Some(rate) = storage.candidate_win_rate() {
        recommendations.extend(recommend(config, Subject::Storage, rate));
    }

    Insights {
        totals,
        champion: champion(&totals),
        categories,
        storage,
        recommendations,
    }
}

fn champion(totals: &Tally) -> Option<Champion> {
    let side = match totals.candidate_wins.cmp(&totals.baseline_wins) {
        std::cmp::Ordering::Greater => Side::Candidate,
        std::cmp::Ordering::Less => Side::Baseline,
        std::cmp::Ordering::Equal => return None,
    };

    let wins = totals.wins(side);
    let losses = totals.wins(side.opponent());
    Some(Champion {
        side,
        victory_rate_pct: percent(wins, wins + losses)?,
    })
}

fn recommend(config: &InsightConfig, subject: Subject, rate: u32) -> Option<Recommendation> {
    let kind = if rate > config.strength_threshold_pct {
        RecommendationKind::Strength
    } else if rate < config.caveat_threshold_pct {
        RecommendationKind::Caveat
    } else {
        return None;
    };

    Some(Recommendation {
        kind,
        subject,
        win_rate_pct: rate,
    })
}

fn percent(part: usize, whole: usize) -> Option<u32> {
    if whole == 0 {
        return None;
    }
    Some((part * 100 / whole) as u32)
}
