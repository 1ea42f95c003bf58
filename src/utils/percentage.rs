use std::{fmt::Display, ops::Deref, str::FromStr};

use anyhow::anyhow;

/// Whole-number percentage, rounded down. Report buckets use this so that a
/// column of shares never sums above 100.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Percentage(u32);

impl Display for Percentage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}%", self.0)
    }
}

impl Percentage {
    pub const fn zero() -> Percentage {
        Percentage(0)
    }

    pub fn new_opt(value: u32) -> Option<Percentage> {
        if value > 100 {
            None
        } else {
            Some(Percentage(value))
        }
    }

    /// Share of `part` in `whole`, floored. A `whole` of zero means there is
    /// nothing to take a share of, so the result is zero.
    pub fn of(part: i64, whole: i64) -> Percentage {
        if whole <= 0 || part <= 0 {
            Percentage(0)
        } else {
            Percentage((part * 100 / whole) as u32)
        }
    }
}

impl FromStr for Percentage {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // This means that 100%% also works, but I think I'm fine with that
        let s = s.trim_end_matches('%');
        let v = s.parse::<u32>()?;
        Percentage::new_opt(v).ok_or_else(|| anyhow!("Can't parse {s} into percentage"))
    }
}

impl Deref for Percentage {
    type Target = u32;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
