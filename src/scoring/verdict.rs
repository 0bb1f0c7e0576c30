use crate::data::types::DrawRecord;
use crate::scoring::types::{Outcome, Verdict};
use crate::strategies::types::Prediction;

/// Score a prediction against the realized draw. The verdict is filed under
/// the draw's issue, since that is what was actually observed.
pub fn evaluate(prediction: &Prediction, realized: &DrawRecord) -> Verdict {
    let actual = realized.category();
    let outcome = if prediction.category == actual {
        Outcome::Win
    } else {
        Outcome::Loss
    };

    Verdict {
        period: realized.issue.clone(),
        prediction: prediction.category,
        actual,
        outcome,
    }
}
