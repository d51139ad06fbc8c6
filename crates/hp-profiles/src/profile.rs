//! Monthly (12-slot) and daily (366-slot) profile series.

use hp_core::Real;
use serde::{Deserialize, Serialize};

/// Slots in a monthly profile.
pub const MONTHS: usize = 12;

/// Slots in an expanded daily profile.
pub const DAILY_SLOTS: usize = 366;

/// Days assigned to month `i` (1-indexed) by the expansion rule: odd months
/// get 31 slots, even months 30. This is deliberately not calendar-accurate;
/// it is the layout the survey data and downstream consumers agree on.
fn expansion_days(month1: usize) -> usize {
    if month1 % 2 == 1 {
        31
    } else {
        30
    }
}

/// A 12-value monthly series.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MonthlyProfile {
    values: [Real; MONTHS],
}

impl MonthlyProfile {
    pub fn new(values: [Real; MONTHS]) -> Self {
        Self { values }
    }

    /// All-zero profile, the substitution for a blank source series.
    pub fn zeros() -> Self {
        Self {
            values: [0.0; MONTHS],
        }
    }

    /// Value for a 0-based month index.
    pub fn value(&self, month0: usize) -> Option<Real> {
        self.values.get(month0).copied()
    }

    pub fn values(&self) -> &[Real; MONTHS] {
        &self.values
    }

    /// Expand into the 366-slot daily layout: month i (1-indexed) becomes
    /// `expansion_days(i)` copies of `monthly[i] / expansion_days(i)`.
    /// Slots not reached by the rule stay at zero.
    pub fn expand_daily(&self) -> DailyProfile {
        let mut days = vec![0.0; DAILY_SLOTS];
        let mut slot = 0;
        for (month0, &total) in self.values.iter().enumerate() {
            let n = expansion_days(month0 + 1);
            let per_day = total / n as Real;
            for _ in 0..n {
                if slot >= DAILY_SLOTS {
                    break;
                }
                days[slot] = per_day;
                slot += 1;
            }
        }
        DailyProfile {
            values: days.into_boxed_slice(),
        }
    }

    /// Slot range a 0-based month occupies inside the daily layout.
    pub fn month_slice(month0: usize) -> std::ops::Range<usize> {
        let start: usize = (0..month0).map(|m| expansion_days(m + 1)).sum();
        start..start + expansion_days(month0 + 1)
    }
}

/// A 366-value daily series, produced by [`MonthlyProfile::expand_daily`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DailyProfile {
    values: Box<[Real]>,
}

impl DailyProfile {
    /// Value for a 0-based day-of-year index.
    pub fn value(&self, day0: usize) -> Option<Real> {
        self.values.get(day0).copied()
    }

    pub fn values(&self) -> &[Real] {
        &self.values
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn expansion_fills_all_slots() {
        // 6 odd months x 31 + 6 even months x 30 = 366
        let total: usize = (1..=12).map(expansion_days).sum();
        assert_eq!(total, DAILY_SLOTS);
    }

    #[test]
    fn month_slice_layout() {
        assert_eq!(MonthlyProfile::month_slice(0), 0..31);
        assert_eq!(MonthlyProfile::month_slice(1), 31..61);
        assert_eq!(MonthlyProfile::month_slice(11), 336..366);
    }

    #[test]
    fn daily_values_divide_monthly() {
        let mut values = [0.0; MONTHS];
        values[0] = 31.0; // odd month: 31 slots of 1.0
        values[1] = 60.0; // even month: 30 slots of 2.0
        let daily = MonthlyProfile::new(values).expand_daily();
        assert_eq!(daily.value(0), Some(1.0));
        assert_eq!(daily.value(30), Some(1.0));
        assert_eq!(daily.value(31), Some(2.0));
        assert_eq!(daily.value(61), Some(0.0));
    }

    proptest! {
        #[test]
        fn month_slice_sums_back_to_monthly(values in proptest::array::uniform12(0.0_f64..1e6)) {
            let monthly = MonthlyProfile::new(values);
            let daily = monthly.expand_daily();
            for month0 in 0..MONTHS {
                let sum: f64 = daily.values()[MonthlyProfile::month_slice(month0)].iter().sum();
                prop_assert!((sum - values[month0]).abs() <= 1e-6 * values[month0].max(1.0));
            }
        }
    }
}
