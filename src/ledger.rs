use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{LedgerError, Result};
use crate::models::{Intern, NewTask, Task, TaskDay};
use crate::period::WeekKey;

const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

/// Hours are stored with two decimal places.
const HOURS_SCALE: u32 = 2;

fn check_hours_scale(amount: Decimal, reason: &'static str) -> Result<()> {
    if amount.normalize().scale() > HOURS_SCALE {
        return Err(LedgerError::InvalidAmount { amount, reason });
    }
    Ok(())
}

impl Task {
    /// Progress against the estimate, clamped to [0, 100].
    pub fn percent_complete(&self) -> Decimal {
        if self.estimated_hours > Decimal::ZERO {
            (self.actual_hours / self.estimated_hours * HUNDRED).min(HUNDRED)
        } else {
            Decimal::ZERO
        }
    }

    pub fn remaining_hours(&self) -> Decimal {
        (self.estimated_hours - self.actual_hours).max(Decimal::ZERO)
    }

    /// Logs more hours. Reaching the estimate completes the task; the first
    /// completion timestamp is kept if it was already done.
    pub fn add_hours(&mut self, delta: Decimal, now: DateTime<Utc>) -> Result<()> {
        if delta <= Decimal::ZERO {
            warn!(task_id = %self.id, %delta, "rejected non-positive hours");
            return Err(LedgerError::InvalidAmount {
                amount: delta,
                reason: "hours to add must be greater than zero",
            });
        }
        if let Err(err) = check_hours_scale(delta, "hours are recorded to the hundredth") {
            warn!(task_id = %self.id, %delta, "rejected hours finer than a hundredth");
            return Err(err);
        }

        self.actual_hours += delta;
        if self.actual_hours >= self.estimated_hours {
            self.completed = true;
            if self.completed_at.is_none() {
                self.completed_at = Some(now);
            }
        }
        self.updated_at = now;
        debug!(task_id = %self.id, %delta, actual = %self.actual_hours, "hours added");
        Ok(())
    }

    /// Flips completion. Marking done early snaps the actual hours up to the
    /// estimate; reopening leaves the hours alone.
    pub fn toggle_completion(&mut self, now: DateTime<Utc>) {
        self.completed = !self.completed;
        if self.completed {
            self.completed_at = Some(now);
            if self.actual_hours < self.estimated_hours {
                self.actual_hours = self.estimated_hours;
            }
        } else {
            self.completed_at = None;
        }
        self.updated_at = now;
        debug!(task_id = %self.id, completed = self.completed, "completion toggled");
    }
}

/// Source of truth for task records. Every rollup is derived from it.
///
/// The ledger never refreshes cached weekly or monthly rows on its own:
/// after a create, update or delete the caller must run the matching
/// recompute for the task's week and the months that week overlaps.
#[derive(Debug, Default, Clone)]
pub struct TaskLedger {
    tasks: HashMap<Uuid, Task>,
}

impl TaskLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a ledger from stored tasks.
    pub fn from_tasks(tasks: impl IntoIterator<Item = Task>) -> Self {
        Self {
            tasks: tasks.into_iter().map(|task| (task.id, task)).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn create_task(
        &mut self,
        intern: &Intern,
        input: NewTask,
        now: DateTime<Utc>,
    ) -> Result<&Task> {
        let task = build_task(intern, input, now)?;
        debug!(
            task_id = %task.id,
            intern_id = %intern.id,
            week = %task.week,
            completed = task.completed,
            "task created"
        );
        let id = task.id;
        Ok(&*self.tasks.entry(id).or_insert(task))
    }

    pub fn get(&self, task_id: Uuid) -> Result<&Task> {
        self.tasks
            .get(&task_id)
            .ok_or_else(|| LedgerError::not_found("task", task_id))
    }

    pub fn add_hours(
        &mut self,
        task_id: Uuid,
        delta: Decimal,
        now: DateTime<Utc>,
    ) -> Result<&Task> {
        let task = self.get_mut(task_id)?;
        task.add_hours(delta, now)?;
        Ok(&*task)
    }

    pub fn toggle_completion(&mut self, task_id: Uuid, now: DateTime<Utc>) -> Result<&Task> {
        let task = self.get_mut(task_id)?;
        task.toggle_completion(now);
        Ok(&*task)
    }

    /// Removes a task and hands it back so the caller knows which bucket
    /// to recompute.
    pub fn delete_task(&mut self, task_id: Uuid) -> Result<Task> {
        let task = self
            .tasks
            .remove(&task_id)
            .ok_or_else(|| LedgerError::not_found("task", task_id))?;
        debug!(task_id = %task.id, week = %task.week, "task deleted");
        Ok(task)
    }

    /// Drops every task owned by the intern.
    pub fn remove_intern(&mut self, intern_id: Uuid) -> usize {
        let before = self.tasks.len();
        self.tasks.retain(|_, task| task.intern_id != intern_id);
        let removed = before - self.tasks.len();
        debug!(%intern_id, removed, "intern tasks removed");
        removed
    }

    pub fn tasks_for_intern(&self, intern_id: Uuid) -> impl Iterator<Item = &Task> {
        self.tasks
            .values()
            .filter(move |task| task.intern_id == intern_id)
    }

    /// Tasks of one weekly bucket, by day then most pressing first.
    pub fn tasks_for_week(&self, intern_id: Uuid, week: WeekKey) -> Vec<&Task> {
        let mut tasks: Vec<&Task> = self
            .tasks_for_intern(intern_id)
            .filter(|task| task.week == week)
            .collect();
        tasks.sort_by(|a, b| {
            a.day
                .cmp(&b.day)
                .then_with(|| b.priority.cmp(&a.priority))
                .then_with(|| a.created_at.cmp(&b.created_at))
        });
        tasks
    }

    pub fn tasks_in_weeks<'a>(
        &'a self,
        intern_id: Uuid,
        weeks: &'a BTreeSet<WeekKey>,
    ) -> impl Iterator<Item = &'a Task> + 'a {
        self.tasks_for_intern(intern_id)
            .filter(move |task| weeks.contains(&task.week))
    }

    pub fn progress(&self, intern_id: Uuid) -> InternProgress {
        InternProgress::from_tasks(self.tasks_for_intern(intern_id))
    }

    fn get_mut(&mut self, task_id: Uuid) -> Result<&mut Task> {
        self.tasks
            .get_mut(&task_id)
            .ok_or_else(|| LedgerError::not_found("task", task_id))
    }
}

/// Validates the input and builds the task record without storing it.
pub fn build_task(intern: &Intern, input: NewTask, now: DateTime<Utc>) -> Result<Task> {
    if input.title.trim().is_empty() {
        warn!(intern_id = %intern.id, "rejected task without title");
        return Err(LedgerError::validation("task title is required"));
    }
    if input.estimated_hours <= Decimal::ZERO {
        warn!(intern_id = %intern.id, estimated = %input.estimated_hours, "rejected estimate");
        return Err(LedgerError::validation(format!(
            "estimated hours must be greater than zero, got {}",
            input.estimated_hours
        )));
    }
    if input.initial_hours < Decimal::ZERO {
        return Err(LedgerError::InvalidAmount {
            amount: input.initial_hours,
            reason: "initial hours cannot be negative",
        });
    }
    check_hours_scale(input.estimated_hours, "estimated hours are recorded to the hundredth")?;
    check_hours_scale(input.initial_hours, "initial hours are recorded to the hundredth")?;
    let completed = input.initial_hours >= input.estimated_hours;
    Ok(Task {
        id: Uuid::new_v4(),
        intern_id: intern.id,
        title: input.title.trim().to_string(),
        description: input.description,
        day: input.day,
        priority: input.priority,
        estimated_hours: input.estimated_hours,
        actual_hours: input.initial_hours,
        week: input.week,
        completed,
        completed_at: completed.then_some(now),
        remarks: input.remarks,
        created_at: now,
        updated_at: now,
    })
}

/// Actual hours per working day, zero-filled for days without tasks.
pub fn hours_per_day<'a>(tasks: impl IntoIterator<Item = &'a Task>) -> BTreeMap<TaskDay, Decimal> {
    let mut hours: BTreeMap<TaskDay, Decimal> =
        TaskDay::ALL.iter().map(|day| (*day, Decimal::ZERO)).collect();
    for task in tasks {
        *hours.entry(task.day).or_insert(Decimal::ZERO) += task.actual_hours;
    }
    hours
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InternProgress {
    pub total_tasks: usize,
    pub completed_tasks: usize,
    pub total_hours: Decimal,
    pub progression: Decimal,
}

impl InternProgress {
    pub fn from_tasks<'a>(tasks: impl IntoIterator<Item = &'a Task>) -> Self {
        let mut total_tasks = 0usize;
        let mut completed_tasks = 0usize;
        let mut total_hours = Decimal::ZERO;
        for task in tasks {
            total_tasks += 1;
            if task.completed {
                completed_tasks += 1;
            }
            total_hours += task.actual_hours;
        }

        Self {
            total_tasks,
            completed_tasks,
            total_hours,
            progression: percentage(completed_tasks, total_tasks),
        }
    }

    pub fn in_progress(&self) -> usize {
        self.total_tasks - self.completed_tasks
    }
}

pub(crate) fn percentage(part: usize, whole: usize) -> Decimal {
    if whole == 0 {
        return Decimal::ZERO;
    }
    Decimal::from(part as u64) / Decimal::from(whole as u64) * HUNDRED
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::{NewIntern, Priority};
    use chrono::{Duration, NaiveDate, TimeZone};
    use proptest::prelude::*;

    pub(crate) fn hours(value: &str) -> Decimal {
        value.parse().unwrap()
    }

    pub(crate) fn sample_intern() -> Intern {
        Intern::new(NewIntern {
            full_name: "Lina Haddad".to_string(),
            email: "avery@example.com".to_string(),
            school: "Polytechnic".to_string(),
            hourly_rate: Some(hours("6.69")),
            weekly_hours: None,
            stage_start: NaiveDate::from_ymd_opt(2024, 1, 8).unwrap(),
            stage_end: NaiveDate::from_ymd_opt(2024, 6, 28).unwrap(),
            supervisor_id: None,
        })
        .unwrap()
    }

    pub(crate) fn clock() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 6, 9, 0, 0).unwrap()
    }

    pub(crate) fn new_task(estimated: &str, initial: &str, week: WeekKey) -> NewTask {
        NewTask {
            title: "Write onboarding notes".to_string(),
            description: String::new(),
            day: TaskDay::Wednesday,
            priority: Priority::Medium,
            estimated_hours: hours(estimated),
            initial_hours: hours(initial),
            week,
            remarks: String::new(),
        }
    }

    fn week10() -> WeekKey {
        WeekKey::new(2024, 10).unwrap()
    }

    #[test]
    fn creates_incomplete_task_below_estimate() {
        let intern = sample_intern();
        let mut ledger = TaskLedger::new();
        let task = ledger
            .create_task(&intern, new_task("5", "2", week10()), clock())
            .unwrap();
        assert!(!task.completed);
        assert!(task.completed_at.is_none());
        assert_eq!(task.remaining_hours(), hours("3"));
        assert_eq!(task.percent_complete(), hours("40"));
    }

    #[test]
    fn creates_completed_task_when_initial_meets_estimate() {
        let intern = sample_intern();
        let mut ledger = TaskLedger::new();
        let task = ledger
            .create_task(&intern, new_task("4", "4", week10()), clock())
            .unwrap();
        assert!(task.completed);
        assert_eq!(task.completed_at, Some(clock()));
    }

    #[test]
    fn rejects_bad_task_input() {
        let intern = sample_intern();
        let mut ledger = TaskLedger::new();

        let err = ledger
            .create_task(&intern, new_task("0", "0", week10()), clock())
            .unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));

        let err = ledger
            .create_task(&intern, new_task("2", "-1", week10()), clock())
            .unwrap_err();
        assert!(matches!(err, LedgerError::InvalidAmount { .. }));

        let mut untitled = new_task("2", "0", week10());
        untitled.title = "   ".to_string();
        assert!(ledger.create_task(&intern, untitled, clock()).is_err());

        let err = ledger
            .create_task(&intern, new_task("2.125", "0", week10()), clock())
            .unwrap_err();
        assert!(matches!(err, LedgerError::InvalidAmount { .. }));
        assert!(ledger
            .create_task(&intern, new_task("2", "0.005", week10()), clock())
            .is_err());
        assert!(ledger.is_empty());
    }

    #[test]
    fn add_hours_completes_once() {
        let intern = sample_intern();
        let mut ledger = TaskLedger::new();
        let id = ledger
            .create_task(&intern, new_task("3", "0", week10()), clock())
            .unwrap()
            .id;

        let first = clock() + Duration::hours(1);
        let task = ledger.add_hours(id, hours("3.5"), first).unwrap();
        assert!(task.completed);
        assert_eq!(task.completed_at, Some(first));

        let later = clock() + Duration::hours(5);
        let task = ledger.add_hours(id, hours("1"), later).unwrap();
        assert_eq!(task.actual_hours, hours("4.5"));
        assert_eq!(task.completed_at, Some(first));
        assert_eq!(task.percent_complete(), hours("100"));
        assert_eq!(task.remaining_hours(), Decimal::ZERO);
    }

    #[test]
    fn add_hours_rejects_non_positive_without_change() {
        let intern = sample_intern();
        let mut ledger = TaskLedger::new();
        let id = ledger
            .create_task(&intern, new_task("3", "1", week10()), clock())
            .unwrap()
            .id;
        let before = ledger.get(id).unwrap().clone();

        for delta in ["0", "-2", "0.004", "1.005"] {
            let err = ledger.add_hours(id, hours(delta), clock()).unwrap_err();
            assert!(matches!(err, LedgerError::InvalidAmount { .. }));
        }
        assert_eq!(ledger.get(id).unwrap(), &before);
    }

    #[test]
    fn hundredths_with_trailing_zeros_are_accepted() {
        let intern = sample_intern();
        let mut ledger = TaskLedger::new();
        let id = ledger
            .create_task(&intern, new_task("3.500", "0.10", week10()), clock())
            .unwrap()
            .id;

        let task = ledger.add_hours(id, hours("0.250"), clock()).unwrap();
        assert_eq!(task.actual_hours, hours("0.35"));
    }

    #[test]
    fn toggle_snaps_hours_and_reopening_keeps_them() {
        let intern = sample_intern();
        let mut ledger = TaskLedger::new();
        let id = ledger
            .create_task(&intern, new_task("5", "2", week10()), clock())
            .unwrap()
            .id;

        let task = ledger.toggle_completion(id, clock()).unwrap();
        assert!(task.completed);
        assert_eq!(task.actual_hours, hours("5"));
        assert_eq!(task.completed_at, Some(clock()));

        let task = ledger.toggle_completion(id, clock()).unwrap();
        assert!(!task.completed);
        assert_eq!(task.actual_hours, hours("5"));
        assert!(task.completed_at.is_none());
    }

    #[test]
    fn toggle_does_not_lower_overrun_hours() {
        let intern = sample_intern();
        let mut ledger = TaskLedger::new();
        let id = ledger
            .create_task(&intern, new_task("2", "0", week10()), clock())
            .unwrap()
            .id;
        ledger.add_hours(id, hours("3"), clock()).unwrap();
        ledger.toggle_completion(id, clock()).unwrap();
        let task = ledger.toggle_completion(id, clock()).unwrap();
        assert!(task.completed);
        assert_eq!(task.actual_hours, hours("3"));
    }

    #[test]
    fn missing_tasks_are_not_found() {
        let mut ledger = TaskLedger::new();
        let id = Uuid::new_v4();
        assert!(matches!(
            ledger.add_hours(id, hours("1"), clock()),
            Err(LedgerError::NotFound { .. })
        ));
        assert!(matches!(ledger.delete_task(id), Err(LedgerError::NotFound { .. })));
    }

    #[test]
    fn delete_and_cascade() {
        let intern = sample_intern();
        let other = sample_intern();
        let mut ledger = TaskLedger::new();
        let id = ledger
            .create_task(&intern, new_task("2", "0", week10()), clock())
            .unwrap()
            .id;
        ledger
            .create_task(&intern, new_task("2", "0", week10()), clock())
            .unwrap();
        ledger
            .create_task(&other, new_task("2", "0", week10()), clock())
            .unwrap();

        let removed = ledger.delete_task(id).unwrap();
        assert_eq!(removed.week, week10());
        assert_eq!(ledger.remove_intern(intern.id), 1);
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn week_tasks_sorted_by_day_then_priority() {
        let intern = sample_intern();
        let mut ledger = TaskLedger::new();
        let mut friday = new_task("1", "0", week10());
        friday.day = TaskDay::Friday;
        let mut monday_low = new_task("1", "0", week10());
        monday_low.day = TaskDay::Monday;
        monday_low.priority = Priority::Low;
        let mut monday_urgent = new_task("1", "0", week10());
        monday_urgent.day = TaskDay::Monday;
        monday_urgent.priority = Priority::Urgent;
        for input in [friday, monday_low, monday_urgent] {
            ledger.create_task(&intern, input, clock()).unwrap();
        }

        let order: Vec<_> = ledger
            .tasks_for_week(intern.id, week10())
            .iter()
            .map(|task| (task.day, task.priority))
            .collect();
        assert_eq!(
            order,
            vec![
                (TaskDay::Monday, Priority::Urgent),
                (TaskDay::Monday, Priority::Low),
                (TaskDay::Friday, Priority::Medium),
            ]
        );
    }

    #[test]
    fn hours_per_day_zero_fills() {
        let intern = sample_intern();
        let mut ledger = TaskLedger::new();
        ledger
            .create_task(&intern, new_task("4", "1.5", week10()), clock())
            .unwrap();
        ledger
            .create_task(&intern, new_task("4", "2", week10()), clock())
            .unwrap();

        let per_day = hours_per_day(ledger.tasks_for_week(intern.id, week10()));
        assert_eq!(per_day.len(), 6);
        assert_eq!(per_day[&TaskDay::Wednesday], hours("3.5"));
        assert_eq!(per_day[&TaskDay::Saturday], Decimal::ZERO);
    }

    #[test]
    fn progress_counts_all_intern_tasks() {
        let intern = sample_intern();
        let mut ledger = TaskLedger::new();
        ledger
            .create_task(&intern, new_task("2", "2", week10()), clock())
            .unwrap();
        ledger
            .create_task(&intern, new_task("4", "1", WeekKey::new(2024, 11).unwrap()), clock())
            .unwrap();

        let progress = ledger.progress(intern.id);
        assert_eq!(progress.total_tasks, 2);
        assert_eq!(progress.completed_tasks, 1);
        assert_eq!(progress.in_progress(), 1);
        assert_eq!(progress.total_hours, hours("3"));
        assert_eq!(progress.progression, hours("50"));
        assert_eq!(ledger.progress(Uuid::new_v4()).progression, Decimal::ZERO);
    }

    fn cents() -> impl Strategy<Value = Decimal> {
        (1i64..5_000).prop_map(|c| Decimal::new(c, 2))
    }

    proptest! {
        #[test]
        fn percent_complete_stays_in_range(estimated in cents(), actual in 0i64..20_000) {
            let intern = sample_intern();
            let mut ledger = TaskLedger::new();
            let mut input = new_task("1", "0", week10());
            input.estimated_hours = estimated;
            input.initial_hours = Decimal::new(actual, 2);
            let task = ledger.create_task(&intern, input, clock()).unwrap();
            let percent = task.percent_complete();
            prop_assert!(percent >= Decimal::ZERO && percent <= HUNDRED);
        }

        #[test]
        fn accepted_deltas_accumulate(initial in 0i64..1_000, deltas in prop::collection::vec(-500i64..500, 0..20)) {
            let intern = sample_intern();
            let mut ledger = TaskLedger::new();
            let mut input = new_task("8", "0", week10());
            input.initial_hours = Decimal::new(initial, 2);
            let id = ledger.create_task(&intern, input, clock()).unwrap().id;

            let mut expected = Decimal::new(initial, 2);
            for delta in deltas {
                let delta = Decimal::new(delta, 2);
                if ledger.add_hours(id, delta, clock()).is_ok() {
                    expected += delta;
                }
            }
            prop_assert_eq!(ledger.get(id).unwrap().actual_hours, expected);
        }
    }
}
