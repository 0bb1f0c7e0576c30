use serde::{Deserialize, Serialize};
use std::fmt;
use crate::data::types::{Category, DrawRecord, Period};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prediction {
    pub category: Category,
    pub digit1: u8,
    pub digit2: u8,
    pub for_period: String,
}

/// Rendered as `BIG 5 1`; two predictions with the same text are the same call.
impl fmt::Display for Prediction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.category, self.digit1, self.digit2)
    }
}

impl Prediction {
    pub fn same_call(&self, other: &Prediction) -> bool {
        self.category == other.category
            && self.digit1 == other.digit1
            && self.digit2 == other.digit2
    }
}

/// When the poller should ask a predictor for a fresh call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Refresh {
    OnPeriodChange,
    OnNewDraw,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PredictionError {
    #[error("Insufficient data: need {needed} draws, have {available}")]
    InsufficientData { needed: usize, available: usize },

    #[error("Malformed period id: {0}")]
    MalformedPeriod(String),
}

pub trait Predictor: Send {
    fn name(&self) -> &'static str;

    fn refresh(&self) -> Refresh;

    /// `draws` are most-recent-first.
    fn predict(
        &mut self,
        period: &Period,
        draws: &[DrawRecord],
    ) -> Result<Prediction, PredictionError>;
}
