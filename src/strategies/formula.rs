use crate::data::types::{Category, DrawRecord, Period};
use crate::strategies::types::{Prediction, PredictionError, Predictor, Refresh};

const FACTOR: i64 = 7937;
const OFFSET: i64 = 4421;
const DIGIT1_SHIFT: i64 = 717;
const DIGIT2_SHIFT: i64 = 983;

/// Deterministic call keyed on the last four digits of the period id.
#[derive(Debug, Default, Clone)]
pub struct FormulaPredictor;

impl FormulaPredictor {
    pub fn new() -> Self {
        Self
    }
}

/// Pure formula over the period key.
///
/// Remainders are normalized into `[0, m)` so negative keys still yield
/// valid digits.
pub fn formula(key: i64) -> (Category, u8, u8) {
    let category = if (key * FACTOR + OFFSET).rem_euclid(2) == 0 {
        Category::Big
    } else {
        Category::Small
    };

    let digit1 = (key * (FACTOR + DIGIT1_SHIFT) + OFFSET).rem_euclid(10) as u8;
    let digit2 = (key * (FACTOR + DIGIT2_SHIFT) + OFFSET).rem_euclid(10) as u8;

    (category, digit1, digit2)
}

impl Predictor for FormulaPredictor {
    fn name(&self) -> &'static str {
        "formula"
    }

    fn refresh(&self) -> Refresh {
        Refresh::OnPeriodChange
    }

    fn predict(
        &mut self,
        period: &Period,
        _draws: &[DrawRecord],
    ) -> Result<Prediction, PredictionError> {
        let key = period
            .trailing_digits(4)
            .ok_or_else(|| PredictionError::MalformedPeriod(period.id.clone()))?;

        let (category, digit1, digit2) = formula(key);

        Ok(Prediction {
            category,
            digit1,
            digit2,
            for_period: period.id.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::period::current_period;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_first_period_of_day() {
        // 10001 * 7937 + 4421 = 79382358 (even), digits from 86553075 and 89213341
        assert_eq!(formula(10001), (Category::Big, 5, 1));
        // the period id ends in "0001"
        assert_eq!(formula(1), (Category::Big, 5, 1));
    }

    #[test]
    fn test_odd_key_is_small() {
        // 2 * 7937 + 4421 = 20295
        let (category, digit1, digit2) = formula(2);
        assert_eq!(category, Category::Small);
        assert_eq!(digit1, 9); // 21729
        assert_eq!(digit2, 1); // 22261
    }

    #[test]
    fn test_negative_keys_stay_in_range() {
        // -3 * 8654 + 4421 = -21541, -3 * 8920 + 4421 = -22339
        assert_eq!(formula(-3), (Category::Big, 9, 1));

        for key in -2000..2000 {
            let (_, d1, d2) = formula(key);
            assert!(d1 <= 9 && d2 <= 9);
        }
    }

    #[test]
    fn test_predicts_from_period() {
        let period = current_period(Utc.with_ymd_and_hms(2026, 10, 19, 0, 0, 30).unwrap());
        let mut predictor = FormulaPredictor::new();

        let first = predictor.predict(&period, &[]).unwrap();
        let again = predictor.predict(&period, &[]).unwrap();

        assert_eq!(first, again);
        assert_eq!(first.to_string(), "BIG 5 1");
        assert_eq!(first.for_period, "20261019100010001");
    }

    #[test]
    fn test_malformed_period() {
        let period = Period { id: "x".to_string(), seq: 0 };
        let err = FormulaPredictor::new().predict(&period, &[]).unwrap_err();
        assert!(matches!(err, PredictionError::MalformedPeriod(_)));
    }
}
