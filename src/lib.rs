//! Time tracking and payroll aggregation for interns.
//!
//! [`ledger::TaskLedger`] owns task records and is the only source of truth.
//! Weekly buckets, monthly payroll rows and quarterly summaries are derived
//! views recomputed on demand. None of them observe the ledger: after any
//! task create, update or delete the caller runs the matching `recompute`
//! for the task's week and for each month that week overlaps.
//!
//! Time never comes from the wall clock inside the core. Mutations take a
//! `now` timestamp and period lookups take a reference date.

pub mod error;
pub mod evaluation;
pub mod ledger;
pub mod models;
pub mod payroll;
pub mod period;
pub mod quarterly;
pub mod report;
pub mod weekly;

pub use error::{LedgerError, Result};
pub use evaluation::{Criteria, Evaluation, EvaluationKind, NewEvaluation};
pub use ledger::{InternProgress, TaskLedger};
pub use models::{Intern, InternStatus, NewIntern, NewTask, Priority, SkillLevel, Task, TaskDay};
pub use payroll::{MonthlyPayroll, MonthlyPayrollCalculator};
pub use period::{MonthKey, ReferencePeriod, WeekKey};
pub use quarterly::{QuarterSummary, QuarterlyRollup};
pub use weekly::{WeeklyAggregator, WeeklyBucket, WeeklyHistory};
