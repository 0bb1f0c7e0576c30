use rand::Rng;
use crate::data::types::{Category, DrawRecord, Period};
use crate::strategies::types::{Prediction, PredictionError, Predictor, Refresh};

pub const DEFAULT_WINDOW: usize = 5;

/// Majority vote over the most recent draws.
///
/// With an odd window one side always holds the majority, so the coin flip
/// only fires for even windows.
pub struct HistoryPredictor<R: Rng> {
    window: usize,
    rng: R,
}

impl<R: Rng> HistoryPredictor<R> {
    pub fn new(window: usize, rng: R) -> Self {
        Self { window, rng }
    }

    /// Category call for `draws` (most-recent-first).
    pub fn vote(&mut self, draws: &[DrawRecord]) -> Result<Category, PredictionError> {
        if draws.len() < self.window {
            return Err(PredictionError::InsufficientData {
                needed: self.window,
                available: draws.len(),
            });
        }

        let recent = &draws[..self.window];
        let big = recent.iter().filter(|d| d.category() == Category::Big).count();
        let small = recent.len() - big;
        let majority = self.window / 2 + 1;

        if big >= majority {
            Ok(Category::Big)
        } else if small >= majority {
            Ok(Category::Small)
        } else if self.rng.gen_bool(0.5) {
            Ok(Category::Big)
        } else {
            Ok(Category::Small)
        }
    }
}

impl<R: Rng + Send> Predictor for HistoryPredictor<R> {
    fn name(&self) -> &'static str {
        "history"
    }

    fn refresh(&self) -> Refresh {
        Refresh::OnNewDraw
    }

    fn predict(
        &mut self,
        period: &Period,
        draws: &[DrawRecord],
    ) -> Result<Prediction, PredictionError> {
        let category = self.vote(draws)?;

        // digits echo the two latest outcomes
        let digit1 = draws.first().map(|d| d.number).unwrap_or_default();
        let digit2 = draws.get(1).map(|d| d.number).unwrap_or(digit1);

        Ok(Prediction {
            category,
            digit1,
            digit2,
            for_period: period.id.clone(),
        })
    }
}
