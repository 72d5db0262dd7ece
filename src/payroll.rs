use std::collections::HashMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{LedgerError, Result};
use crate::ledger::TaskLedger;
use crate::models::Intern;
use crate::period::{weeks_overlapping_month, MonthKey};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyPayroll {
    pub intern_id: Uuid,
    pub month: MonthKey,
    pub total_hours: Decimal,
    pub gross_pay: Decimal,
    pub bonus: Decimal,
    pub deductions: Decimal,
    pub net_pay: Decimal,
    pub paid: bool,
    pub paid_on: Option<NaiveDate>,
    pub notes: String,
}

impl MonthlyPayroll {
    pub fn empty(intern_id: Uuid, month: MonthKey) -> Self {
        Self {
            intern_id,
            month,
            total_hours: Decimal::ZERO,
            gross_pay: Decimal::ZERO,
            bonus: Decimal::ZERO,
            deductions: Decimal::ZERO,
            net_pay: Decimal::ZERO,
            paid: false,
            paid_on: None,
            notes: String::new(),
        }
    }

    /// Hours come from every task whose ISO week overlaps the month, so a
    /// week straddling two months counts toward both.
    pub fn refresh(&mut self, intern: &Intern, ledger: &TaskLedger) -> Result<()> {
        self.total_hours = month_hours(intern.id, self.month, ledger)?;
        self.gross_pay = self.total_hours * intern.hourly_rate;
        self.recalculate_net();
        Ok(())
    }

    pub fn recalculate_net(&mut self) {
        self.net_pay = self.gross_pay + self.bonus - self.deductions;
    }
}

/// Sum of actual hours logged in weeks overlapping the month.
pub fn month_hours(intern_id: Uuid, month: MonthKey, ledger: &TaskLedger) -> Result<Decimal> {
    let weeks = weeks_overlapping_month(month.year(), month.month())?;
    Ok(ledger
        .tasks_in_weeks(intern_id, &weeks)
        .map(|task| task.actual_hours)
        .sum())
}

/// Cached monthly payroll rows, one per (intern, month). Recompute after
/// any task change in an overlapping week and after adjustments.
#[derive(Debug, Default, Clone)]
pub struct MonthlyPayrollCalculator {
    rows: HashMap<(Uuid, MonthKey), MonthlyPayroll>,
}

impl MonthlyPayrollCalculator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn restore(&mut self, payroll: MonthlyPayroll) {
        self.rows.insert((payroll.intern_id, payroll.month), payroll);
    }

    pub fn get(&self, intern_id: Uuid, month: MonthKey) -> Option<&MonthlyPayroll> {
        self.rows.get(&(intern_id, month))
    }

    pub fn recompute(
        &mut self,
        intern: &Intern,
        month: u32,
        year: i32,
        ledger: &TaskLedger,
    ) -> Result<&MonthlyPayroll> {
        let key = MonthKey::new(year, month)?;
        let payroll = self
            .rows
            .entry((intern.id, key))
            .or_insert_with(|| MonthlyPayroll::empty(intern.id, key));
        payroll.refresh(intern, ledger)?;
        debug!(
            intern_id = %intern.id,
            month = %key,
            hours = %payroll.total_hours,
            gross = %payroll.gross_pay,
            net = %payroll.net_pay,
            "monthly payroll recomputed"
        );
        Ok(&*payroll)
    }

    /// Sets bonus and deductions and refreshes net from the current gross.
    pub fn adjust(
        &mut self,
        intern_id: Uuid,
        month: MonthKey,
        bonus: Decimal,
        deductions: Decimal,
        notes: Option<String>,
    ) -> Result<&MonthlyPayroll> {
        for (amount, reason) in [
            (bonus, "bonus cannot be negative"),
            (deductions, "deductions cannot be negative"),
        ] {
            if amount < Decimal::ZERO {
                warn!(%intern_id, %month, %amount, reason, "rejected payroll adjustment");
                return Err(LedgerError::InvalidAmount { amount, reason });
            }
        }

        let payroll = self.get_mut(intern_id, month)?;
        payroll.bonus = bonus;
        payroll.deductions = deductions;
        if let Some(notes) = notes {
            payroll.notes = notes;
        }
        payroll.recalculate_net();
        Ok(&*payroll)
    }

    pub fn mark_paid(
        &mut self,
        intern_id: Uuid,
        month: MonthKey,
        paid_on: NaiveDate,
    ) -> Result<&MonthlyPayroll> {
        let payroll = self.get_mut(intern_id, month)?;
        mark_paid(payroll, paid_on);
        Ok(&*payroll)
    }

    fn get_mut(&mut self, intern_id: Uuid, month: MonthKey) -> Result<&mut MonthlyPayroll> {
        self.rows
            .get_mut(&(intern_id, month))
            .ok_or_else(|| LedgerError::not_found("payroll", month))
    }
}

pub fn mark_paid(payroll: &mut MonthlyPayroll, paid_on: NaiveDate) {
    payroll.paid = true;
    payroll.paid_on = Some(paid_on);
    info!(intern_id = %payroll.intern_id, month = %payroll.month, %paid_on, "payroll marked paid");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::tests::{clock, hours, new_task, sample_intern};
    use crate::period::WeekKey;

    fn week(year: i32, number: u32) -> WeekKey {
        WeekKey::new(year, number).unwrap()
    }

    #[test]
    fn sums_weeks_overlapping_the_month() {
        let intern = sample_intern();
        let mut ledger = TaskLedger::new();
        // February 2024 spans ISO weeks 5 through 9.
        for (w, actual) in [(4, "10"), (5, "2"), (7, "3.5"), (9, "1"), (10, "8")] {
            ledger
                .create_task(&intern, new_task("20", actual, week(2024, w)), clock())
                .unwrap();
        }

        let mut calculator = MonthlyPayrollCalculator::new();
        let payroll = calculator.recompute(&intern, 2, 2024, &ledger).unwrap();
        assert_eq!(payroll.total_hours, hours("6.5"));
        assert_eq!(payroll.gross_pay, hours("43.485"));
        assert_eq!(payroll.net_pay, payroll.gross_pay);
    }

    #[test]
    fn boundary_week_keeps_its_own_iso_year() {
        let intern = sample_intern();
        let mut ledger = TaskLedger::new();
        ledger
            .create_task(&intern, new_task("9", "4", week(2026, 53)), clock())
            .unwrap();
        ledger
            .create_task(&intern, new_task("9", "6", week(2027, 2)), clock())
            .unwrap();

        let mut calculator = MonthlyPayrollCalculator::new();
        let january = calculator.recompute(&intern, 1, 2027, &ledger).unwrap();
        assert_eq!(january.total_hours, hours("10"));

        // January 2026 covers 2026-W01 through W05 only.
        let january_2026 = calculator.recompute(&intern, 1, 2026, &ledger).unwrap();
        assert_eq!(january_2026.total_hours, Decimal::ZERO);
    }

    #[test]
    fn adjustments_flow_into_net_and_survive_recompute() {
        let intern = sample_intern();
        let mut ledger = TaskLedger::new();
        ledger
            .create_task(&intern, new_task("20", "10", week(2024, 6)), clock())
            .unwrap();

        let mut calculator = MonthlyPayrollCalculator::new();
        calculator.recompute(&intern, 2, 2024, &ledger).unwrap();
        let month = MonthKey::new(2024, 2).unwrap();
        let payroll = calculator
            .adjust(intern.id, month, hours("20"), hours("5.9"), Some("transport".into()))
            .unwrap();
        assert_eq!(payroll.net_pay, hours("81"));

        ledger
            .create_task(&intern, new_task("20", "1", week(2024, 7)), clock())
            .unwrap();
        let payroll = calculator.recompute(&intern, 2, 2024, &ledger).unwrap();
        assert_eq!(payroll.gross_pay, hours("73.59"));
        assert_eq!(payroll.net_pay, hours("87.69"));
        assert_eq!(payroll.notes, "transport");
    }

    #[test]
    fn rejects_negative_adjustments_and_unknown_rows() {
        let intern = sample_intern();
        let month = MonthKey::new(2024, 2).unwrap();
        let mut calculator = MonthlyPayrollCalculator::new();
        assert!(matches!(
            calculator.adjust(intern.id, month, hours("1"), hours("0"), None),
            Err(LedgerError::NotFound { .. })
        ));

        calculator
            .recompute(&intern, 2, 2024, &TaskLedger::new())
            .unwrap();
        assert!(matches!(
            calculator.adjust(intern.id, month, hours("-1"), hours("0"), None),
            Err(LedgerError::InvalidAmount { .. })
        ));
        assert!(calculator.recompute(&intern, 13, 2024, &TaskLedger::new()).is_err());
    }

    #[test]
    fn mark_paid_sets_flag_and_date() {
        let intern = sample_intern();
        let month = MonthKey::new(2024, 3).unwrap();
        let mut calculator = MonthlyPayrollCalculator::new();
        calculator
            .recompute(&intern, 3, 2024, &TaskLedger::new())
            .unwrap();

        let paid_on = NaiveDate::from_ymd_opt(2024, 4, 5).unwrap();
        let payroll = calculator.mark_paid(intern.id, month, paid_on).unwrap();
        assert!(payroll.paid);
        assert_eq!(payroll.paid_on, Some(paid_on));

        let payroll = calculator
            .recompute(&intern, 3, 2024, &TaskLedger::new())
            .unwrap();
        assert!(payroll.paid);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        /// (ISO week in 2024, actual cents); February 2024 covers weeks 5 to 9.
        fn tasks() -> impl Strategy<Value = Vec<(u32, i64)>> {
            prop::collection::vec((3u32..12, 0i64..3_000), 0..16)
        }

        proptest! {
            #[test]
            fn recompute_is_idempotent_and_keeps_adjustments(
                tasks in tasks(),
                bonus in 0i64..10_000,
                deductions in 0i64..10_000,
            ) {
                let intern = sample_intern();
                let mut ledger = TaskLedger::new();
                let mut expected = Decimal::ZERO;
                for (number, actual) in tasks {
                    let mut input = new_task("10", "0", week(2024, number));
                    input.initial_hours = Decimal::new(actual, 2);
                    if (5..=9).contains(&number) {
                        expected += input.initial_hours;
                    }
                    ledger.create_task(&intern, input, clock()).unwrap();
                }

                let month = MonthKey::new(2024, 2).unwrap();
                let mut calculator = MonthlyPayrollCalculator::new();
                calculator.recompute(&intern, 2, 2024, &ledger).unwrap();
                calculator
                    .adjust(intern.id, month, Decimal::new(bonus, 2), Decimal::new(deductions, 2), None)
                    .unwrap();

                let first = calculator.recompute(&intern, 2, 2024, &ledger).unwrap().clone();
                let second = calculator.recompute(&intern, 2, 2024, &ledger).unwrap().clone();
                prop_assert_eq!(&first, &second);
                prop_assert_eq!(first.total_hours, expected);
                prop_assert_eq!(first.gross_pay, expected * intern.hourly_rate);
                prop_assert_eq!(
                    first.net_pay,
                    first.gross_pay + Decimal::new(bonus, 2) - Decimal::new(deductions, 2)
                );
            }
        }
    }
}
