//! Fitness evaluation and ranking for potion populations.
//!
//! Scoring is a pure function of each potion, so a population is scored in
//! parallel. Ranking waits for every score before sorting.

use rayon::prelude::*;

use crate::schema::PotionError;

use super::search::Candidate;

/// Score every candidate in parallel, storing the result on the candidate.
pub fn evaluate_population(population: &mut [Candidate]) -> Result<(), PotionError> {
    population.par_iter_mut().try_for_each(|candidate| -> Result<(), PotionError> {
        candidate.score = candidate.potion.score()?;
        Ok(())
    })
}

/// Sort items by score, highest first.
///
/// The sort is stable, so items with equal scores keep their relative order.
pub fn rank_by_score<T, F>(items: &mut [T], score: F)
where
    F: Fn(&T) -> f64,
{
    items.sort_by(|a, b| score(b).total_cmp(&score(a)));
}

/// Summary statistics over a set of scores.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreSummary {
    /// Highest score.
    pub best: f64,
    /// Arithmetic mean.
    pub mean: f64,
    /// Population standard deviation.
    pub std_dev: f64,
}

impl ScoreSummary {
    /// Summarize scores; `None` for an empty slice.
    pub fn from_scores(scores: &[f64]) -> Option<Self> {
        if scores.is_empty() {
            return None;
        }

        let n = scores.len() as f64;
        let best = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let mean = scores.iter().sum::<f64>() / n;
        let variance = scores.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / n;

        Some(Self {
            best,
            mean,
            std_dev: variance.sqrt(),
        })
    }
}
