//! Time-stepping horizon shared by the solver and the result extractor.
//!
//! Monthly runs advance by a fixed 31-day delta rather than calendar month
//! lengths; downstream profile indexing goes through [`Schedule::profile_indices`]
//! so every consumer sees the same mapping from step to profile slot.

use chrono::{Datelike, Duration, NaiveDate};

use crate::error::{CoreError, CoreResult};

/// Hard cap on the simulation horizon, in months.
pub const MAX_HORIZON_MONTHS: u32 = 9;

/// Days advanced per monthly step.
const MONTHLY_STEP_DAYS: i64 = 31;

/// Time-step granularity for a run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StepKind {
    Daily,
    Monthly,
}

/// Inclusive date horizon plus step granularity.
#[derive(Clone, Debug)]
pub struct Schedule {
    start: NaiveDate,
    end: NaiveDate,
    step: StepKind,
}

impl Schedule {
    /// Build a schedule, clamping the horizon to [`MAX_HORIZON_MONTHS`].
    pub fn new(start: NaiveDate, end: NaiveDate, step: StepKind) -> CoreResult<Self> {
        if end < start {
            return Err(CoreError::InvalidArg {
                what: "schedule end before start",
            });
        }
        let max_days = i64::from(MAX_HORIZON_MONTHS) * MONTHLY_STEP_DAYS;
        let end = if (end - start).num_days() > max_days {
            let clamped = start + Duration::days(max_days);
            tracing::warn!(
                requested = %end,
                clamped = %clamped,
                "horizon exceeds {MAX_HORIZON_MONTHS} months, clamping"
            );
            clamped
        } else {
            end
        };
        Ok(Self { start, end, step })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn step(&self) -> StepKind {
        self.step
    }

    fn step_days(&self) -> i64 {
        match self.step {
            StepKind::Daily => 1,
            StepKind::Monthly => MONTHLY_STEP_DAYS,
        }
    }

    /// Number of timesteps in the horizon (at least 1).
    pub fn num_steps(&self) -> usize {
        let span = (self.end - self.start).num_days();
        (span / self.step_days()) as usize + 1
    }

    /// Timestamp of each step.
    pub fn timestamps(&self) -> Vec<NaiveDate> {
        let delta = Duration::days(self.step_days());
        let mut out = Vec::with_capacity(self.num_steps());
        let mut t = self.start;
        while t <= self.end {
            out.push(t);
            t += delta;
        }
        out
    }

    /// Profile slot for each step: month-of-year index for monthly runs,
    /// day-of-year index for daily runs (both 0-based).
    pub fn profile_indices(&self) -> Vec<usize> {
        self.timestamps()
            .iter()
            .map(|t| match self.step {
                StepKind::Monthly => (t.month() - 1) as usize,
                StepKind::Daily => (t.ordinal() - 1) as usize,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).expect("valid date")
    }

    #[test]
    fn monthly_steps_advance_31_days() {
        let s = Schedule::new(d(2024, 1, 1), d(2024, 2, 15), StepKind::Monthly).unwrap();
        assert_eq!(s.num_steps(), 2);
        assert_eq!(s.timestamps(), vec![d(2024, 1, 1), d(2024, 2, 1)]);
    }

    #[test]
    fn daily_steps_are_inclusive() {
        let s = Schedule::new(d(2024, 3, 1), d(2024, 3, 5), StepKind::Daily).unwrap();
        assert_eq!(s.num_steps(), 5);
    }

    #[test]
    fn horizon_is_clamped() {
        let s = Schedule::new(d(2024, 1, 1), d(2025, 6, 1), StepKind::Monthly).unwrap();
        assert!((s.end() - s.start()).num_days() <= 9 * 31);
    }

    #[test]
    fn end_before_start_rejected() {
        assert!(Schedule::new(d(2024, 2, 1), d(2024, 1, 1), StepKind::Daily).is_err());
    }

    #[test]
    fn profile_indices_follow_granularity() {
        let s = Schedule::new(d(2024, 1, 1), d(2024, 2, 15), StepKind::Monthly).unwrap();
        assert_eq!(s.profile_indices(), vec![0, 1]);

        let s = Schedule::new(d(2024, 1, 1), d(2024, 1, 3), StepKind::Daily).unwrap();
        assert_eq!(s.profile_indices(), vec![0, 1, 2]);
    }
}
