use serde::{Deserialize, Serialize};
use std::fmt;

/// A realized draw as reported by the remote source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrawRecord {
    pub issue: String,
    pub number: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Small,
    Big,
}

impl Category {
    /// 0-4 is Small, everything above is Big
    pub fn of(number: u8) -> Self {
        if number <= 4 {
            Category::Small
        } else {
            Category::Big
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::Small => write!(f, "SMALL"),
            Category::Big => write!(f, "BIG"),
        }
    }
}

impl DrawRecord {
    pub fn category(&self) -> Category {
        Category::of(self.number)
    }
}

/// A betting round derived from wall-clock time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Period {
    pub id: String,
    pub seq: u32,
}

impl Period {
    /// Last `n` characters of the id parsed as an integer.
    pub fn trailing_digits(&self, n: usize) -> Option<i64> {
        let start = self.id.len().checked_sub(n)?;
        self.id.get(start..)?.parse().ok()
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_partition() {
        for n in 0..=4 {
            assert_eq!(Category::of(n), Category::Small);
        }
        for n in 5..=9 {
            assert_eq!(Category::of(n), Category::Big);
        }
    }

    #[test]
    fn test_trailing_digits() {
        let period = Period { id: "20261019100010010".to_string(), seq: 10010 };
        assert_eq!(period.trailing_digits(4), Some(10));

        let short = Period { id: "12".to_string(), seq: 0 };
        assert_eq!(short.trailing_digits(4), None);
    }
}
