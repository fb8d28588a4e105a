//! Candidate scoring against a buyer profile.

use serde::{Deserialize, Serialize};

use crate::domain::profile::AttributeProfile;
use crate::domain::vehicle::CatalogItem;

const SEAT_FIT_BONUS: f64 = 50.0;
const SEAT_SHORTFALL_PENALTY: f64 = -100.0;
const MILEAGE_WEIGHT: f64 = 2.0;
const PRICE_DIVISOR: f64 = 100_000.0;

/// Per-term contribution to a candidate's score.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub budget_fit: f64,
    pub seat_fit: f64,
    pub mileage_fit: f64,
    pub price_fit: f64,
}

impl ScoreBreakdown {
    pub fn total(&self) -> f64 {
        self.budget_fit + self.seat_fit + self.mileage_fit + self.price_fit
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScoredCandidate {
    pub item: CatalogItem,
    pub score: f64,
    pub breakdown: ScoreBreakdown,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct CandidateRanker;

impl CandidateRanker {
    pub fn new() -> Self {
        Self
    }

    pub fn score(&self, item: &CatalogItem, profile: &AttributeProfile) -> ScoreBreakdown {
        ScoreBreakdown {
            budget_fit: budget_fit(item.price, profile.budget_target()),
            seat_fit: seat_fit(item.seats, profile.family_size),
            mileage_fit: item.mileage_figure().unwrap_or(0.0) * MILEAGE_WEIGHT,
            price_fit: item.price.map(|price| price as f64 / PRICE_DIVISOR).unwrap_or(0.0),
        }
    }

    /// Scores every item and orders them best first. Ties keep input order.
    pub fn rank(&self, items: &[CatalogItem], profile: &AttributeProfile) -> Vec<ScoredCandidate> {
        let mut scored = items
            .iter()
            .map(|item| {
                let breakdown = self.score(item, profile);
                ScoredCandidate { item: item.clone(), score: breakdown.total(), breakdown }
            })
            .collect::<Vec<_>>();

        scored.sort_by(|left, right| right.score.total_cmp(&left.score));
        scored
    }

    pub fn top(&self, items: &[CatalogItem], profile: &AttributeProfile) -> Option<ScoredCandidate> {
        self.rank(items, profile).into_iter().next()
    }
}

fn budget_fit(price: Option<i64>, budget: Option<i64>) -> f64 {
    match (price, budget) {
        (Some(price), Some(budget)) if budget > 0 => {
            let deviation = (budget - price).abs() as f64 / budget as f64 * 100.0;
            (100.0 - deviation).max(0.0)
        }
        _ => 0.0,
    }
}

fn seat_fit(seats: Option<u32>, family_size: Option<u32>) -> f64 {
    match (seats, family_size) {
        (Some(seats), Some(needed)) if seats >= needed => SEAT_FIT_BONUS,
        (Some(_), Some(_)) => SEAT_SHORTFALL_PENALTY,
        _ => 0.0,
    }
}
