use chrono::{DateTime, Timelike, Utc};
use crate::data::types::Period;

const SEQ_BASE: u32 = 10001;
const ID_INFIX: &str = "1000";

/// Derive the current betting period from wall-clock time.
///
/// One period per UTC minute: `seq = 10001 + minutes since midnight`, and the
/// id is the textual concatenation `YYYYMMDD` + `1000` + `seq`. Consumers slice
/// digits off the end of the id, so its textual form is kept exactly.
pub fn current_period(now: DateTime<Utc>) -> Period {
    let minutes = now.hour() * 60 + now.minute();
    let seq = SEQ_BASE + minutes;

    Period {
        id: format!("{}{}{}", now.format("%Y%m%d"), ID_INFIX, seq),
        seq,
    }
}
