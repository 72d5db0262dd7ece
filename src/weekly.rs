use std::collections::HashMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{LedgerError, Result};
use crate::ledger::{percentage, TaskLedger};
use crate::models::Intern;
use crate::period::WeekKey;

/// Cached totals for one (intern, ISO week). Only valid until the next task
/// mutation in that week; refresh it through [`WeeklyAggregator::recompute`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyBucket {
    pub intern_id: Uuid,
    pub week: WeekKey,
    pub starts_on: NaiveDate,
    pub ends_on: NaiveDate,
    pub total_hours: Decimal,
    pub task_count: u32,
    pub completed_count: u32,
    pub pay: Decimal,
    pub intern_comment: String,
    pub supervisor_comment: String,
    pub supervisor_rating: Option<u8>,
}

impl WeeklyBucket {
    pub fn empty(intern_id: Uuid, week: WeekKey) -> Self {
        let (starts_on, ends_on) = week.bounds();
        Self {
            intern_id,
            week,
            starts_on,
            ends_on,
            total_hours: Decimal::ZERO,
            task_count: 0,
            completed_count: 0,
            pay: Decimal::ZERO,
            intern_comment: String::new(),
            supervisor_comment: String::new(),
            supervisor_rating: None,
        }
    }

    /// Overwrites the derived totals. Commentary is left untouched.
    pub fn refresh(&mut self, intern: &Intern, ledger: &TaskLedger) {
        let mut total_hours = Decimal::ZERO;
        let mut task_count = 0u32;
        let mut completed_count = 0u32;
        for task in ledger
            .tasks_for_intern(intern.id)
            .filter(|task| task.week == self.week)
        {
            task_count += 1;
            if task.completed {
                completed_count += 1;
            }
            total_hours += task.actual_hours;
        }

        self.total_hours = total_hours;
        self.task_count = task_count;
        self.completed_count = completed_count;
        self.pay = total_hours * intern.hourly_rate;
    }

    pub fn completion_rate(&self) -> Decimal {
        percentage(self.completed_count as usize, self.task_count as usize)
    }

    pub fn in_progress(&self) -> u32 {
        self.task_count - self.completed_count
    }

    pub fn set_rating(&mut self, rating: u8) -> Result<()> {
        if !(1..=5).contains(&rating) {
            warn!(week = %self.week, rating, "rejected supervisor rating");
            return Err(LedgerError::validation(format!(
                "weekly rating must be between 1 and 5, got {rating}"
            )));
        }
        self.supervisor_rating = Some(rating);
        Ok(())
    }
}

pub fn completion_rate(bucket: &WeeklyBucket) -> Decimal {
    bucket.completion_rate()
}

/// Holds the cached weekly buckets. It does not watch the ledger; callers
/// invoke `recompute` after each task change affecting a week.
#[derive(Debug, Default, Clone)]
pub struct WeeklyAggregator {
    buckets: HashMap<(Uuid, WeekKey), WeeklyBucket>,
}

impl WeeklyAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a previously stored bucket so its commentary survives recompute.
    pub fn restore(&mut self, bucket: WeeklyBucket) {
        self.buckets.insert((bucket.intern_id, bucket.week), bucket);
    }

    pub fn get(&self, intern_id: Uuid, week: WeekKey) -> Option<&WeeklyBucket> {
        self.buckets.get(&(intern_id, week))
    }

    pub fn recompute(&mut self, intern: &Intern, week: WeekKey, ledger: &TaskLedger) -> &WeeklyBucket {
        let bucket = self
            .buckets
            .entry((intern.id, week))
            .or_insert_with(|| WeeklyBucket::empty(intern.id, week));
        bucket.refresh(intern, ledger);
        debug!(
            intern_id = %intern.id,
            %week,
            hours = %bucket.total_hours,
            tasks = bucket.task_count,
            completed = bucket.completed_count,
            "weekly bucket recomputed"
        );
        bucket
    }

    pub fn comment(
        &mut self,
        intern_id: Uuid,
        week: WeekKey,
        intern_comment: Option<String>,
        supervisor_comment: Option<String>,
        rating: Option<u8>,
    ) -> Result<&WeeklyBucket> {
        let bucket = self
            .buckets
            .get_mut(&(intern_id, week))
            .ok_or_else(|| LedgerError::not_found("weekly bucket", week))?;
        if let Some(rating) = rating {
            bucket.set_rating(rating)?;
        }
        if let Some(comment) = intern_comment {
            bucket.intern_comment = comment;
        }
        if let Some(comment) = supervisor_comment {
            bucket.supervisor_comment = comment;
        }
        Ok(&*bucket)
    }

    pub fn history(&self, intern_id: Uuid) -> WeeklyHistory {
        WeeklyHistory::from_buckets(
            self.buckets
                .values()
                .filter(|bucket| bucket.intern_id == intern_id)
                .cloned(),
        )
    }
}

/// All of an intern's weeks, newest first, with overall totals.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeeklyHistory {
    pub weeks: Vec<WeeklyBucket>,
    pub total_hours: Decimal,
    pub total_pay: Decimal,
    pub average_hours: Decimal,
}

impl WeeklyHistory {
    pub fn from_buckets(buckets: impl IntoIterator<Item = WeeklyBucket>) -> Self {
        let mut weeks: Vec<WeeklyBucket> = buckets.into_iter().collect();
        weeks.sort_by(|a, b| b.week.cmp(&a.week));

        let total_hours: Decimal = weeks.iter().map(|bucket| bucket.total_hours).sum();
        let total_pay: Decimal = weeks.iter().map(|bucket| bucket.pay).sum();
        let average_hours = if weeks.is_empty() {
            Decimal::ZERO
        } else {
            (total_hours / Decimal::from(weeks.len() as u64)).round_dp(2)
        };

        Self {
            weeks,
            total_hours,
            total_pay,
            average_hours,
        }
    }
}
