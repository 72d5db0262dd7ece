use rust_decimal::Decimal;
use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use crate::error::Result;
use crate::ledger::TaskLedger;
use crate::models::Intern;
use crate::payroll::month_hours;
use crate::period::{months_in_quarter, MonthKey};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuarterSummary {
    pub intern_id: Uuid,
    pub year: i32,
    pub quarter: u32,
    pub total_hours: Decimal,
    pub total_pay: Decimal,
}

/// Three-month rollup of hours and gross pay. Nothing is cached; each call
/// reads the ledger afresh.
pub struct QuarterlyRollup;

impl QuarterlyRollup {
    /// Sums each month's overlapping-week hours independently, so a week
    /// straddling two months of the quarter is counted once per month. Pay
    /// is gross (hours × rate) and ignores payroll bonus and deductions.
    pub fn recompute(
        intern: &Intern,
        quarter: u32,
        year: i32,
        ledger: &TaskLedger,
    ) -> Result<QuarterSummary> {
        let mut total_hours = Decimal::ZERO;
        for month in months_in_quarter(quarter)? {
            total_hours += month_hours(intern.id, MonthKey::new(year, month)?, ledger)?;
        }

        let summary = QuarterSummary {
            intern_id: intern.id,
            year,
            quarter,
            total_hours,
            total_pay: total_hours * intern.hourly_rate,
        };
        debug!(
            intern_id = %intern.id,
            year,
            quarter,
            hours = %summary.total_hours,
            "quarter rolled up"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::tests::{clock, hours, new_task, sample_intern};
    use crate::payroll::MonthlyPayrollCalculator;
    use crate::period::WeekKey;

    #[test]
    fn sums_the_three_months() {
        let intern = sample_intern();
        let mut ledger = TaskLedger::new();
        // Week 2 sits in January, week 7 in February, week 11 in March.
        for (week, actual) in [(2, "4"), (7, "5"), (11, "6"), (20, "9")] {
            ledger
                .create_task(&intern, new_task("10", actual, WeekKey::new(2024, week).unwrap()), clock())
                .unwrap();
        }

        let summary = QuarterlyRollup::recompute(&intern, 1, 2024, &ledger).unwrap();
        assert_eq!(summary.total_hours, hours("15"));
        assert_eq!(summary.total_pay, hours("100.35"));
    }

    #[test]
    fn pay_ignores_payroll_adjustments() {
        let intern = sample_intern();
        let mut ledger = TaskLedger::new();
        ledger
            .create_task(&intern, new_task("10", "10", WeekKey::new(2024, 15).unwrap()), clock())
            .unwrap();

        let mut payroll = MonthlyPayrollCalculator::new();
        payroll.recompute(&intern, 4, 2024, &ledger).unwrap();
        payroll
            .adjust(intern.id, MonthKey::new(2024, 4).unwrap(), hours("50"), hours("0"), None)
            .unwrap();

        let summary = QuarterlyRollup::recompute(&intern, 2, 2024, &ledger).unwrap();
        assert_eq!(summary.total_pay, hours("66.9"));
    }

    #[test]
    fn straddling_week_counts_in_each_month() {
        let intern = sample_intern();
        let mut ledger = TaskLedger::new();
        // 2024-W05 runs from January 29 to February 4.
        ledger
            .create_task(&intern, new_task("10", "3", WeekKey::new(2024, 5).unwrap()), clock())
            .unwrap();

        let summary = QuarterlyRollup::recompute(&intern, 1, 2024, &ledger).unwrap();
        assert_eq!(summary.total_hours, hours("6"));
    }

    #[test]
    fn rejects_unknown_quarter() {
        let intern = sample_intern();
        assert!(QuarterlyRollup::recompute(&intern, 5, 2024, &TaskLedger::new()).is_err());
    }
}
