use chrono::{DateTime, NaiveDate, Utc, Weekday};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{LedgerError, Result};
use crate::period::WeekKey;

/// Declares a text-backed enum with `as_str`, `Display` and `FromStr`.
/// Parsing is case-insensitive.
macro_rules! text_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord,
            ::serde::Serialize, ::serde::Deserialize,
        )]
        #[serde(rename_all = "lowercase")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl ::std::str::FromStr for $name {
            type Err = $crate::error::LedgerError;

            fn from_str(value: &str) -> $crate::error::Result<Self> {
                let lowered = value.trim().to_lowercase();
                match lowered.as_str() {
                    $($text => Ok($name::$variant),)+
                    _ => Err($crate::error::LedgerError::validation(format!(
                        "unknown {}: {value}",
                        stringify!($name)
                    ))),
                }
            }
        }
    };
}

pub(crate) use text_enum;

text_enum!(
    InternStatus {
        Active => "active",
        Inactive => "inactive",
        Completed => "completed",
        Suspended => "suspended",
    }
);

text_enum!(
    SkillLevel {
        Beginner => "beginner",
        Intermediate => "intermediate",
        Advanced => "advanced",
    }
);

text_enum!(
    /// Working days a task can be logged against. There is no Sunday.
    TaskDay {
        Monday => "monday",
        Tuesday => "tuesday",
        Wednesday => "wednesday",
        Thursday => "thursday",
        Friday => "friday",
        Saturday => "saturday",
    }
);

text_enum!(
    /// Ordered from least to most pressing.
    Priority {
        Low => "low",
        Medium => "medium",
        High => "high",
        Urgent => "urgent",
    }
);

impl TaskDay {
    /// The task day for a calendar weekday; Sunday has none.
    pub fn from_weekday(weekday: Weekday) -> Option<Self> {
        match weekday {
            Weekday::Mon => Some(TaskDay::Monday),
            Weekday::Tue => Some(TaskDay::Tuesday),
            Weekday::Wed => Some(TaskDay::Wednesday),
            Weekday::Thu => Some(TaskDay::Thursday),
            Weekday::Fri => Some(TaskDay::Friday),
            Weekday::Sat => Some(TaskDay::Saturday),
            Weekday::Sun => None,
        }
    }
}

impl Default for Priority {
    fn default() -> Self {
        Priority::Medium
    }
}

pub const DEFAULT_WEEKLY_HOURS: u32 = 35;

pub fn default_hourly_rate() -> Decimal {
    Decimal::new(669, 2)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Intern {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub school: String,
    pub hourly_rate: Decimal,
    pub weekly_hours: u32,
    pub stage_start: NaiveDate,
    pub stage_end: NaiveDate,
    pub status: InternStatus,
    pub skill_level: SkillLevel,
    pub supervisor_id: Option<Uuid>,
}

#[derive(Debug, Clone)]
pub struct NewIntern {
    pub full_name: String,
    pub email: String,
    pub school: String,
    pub hourly_rate: Option<Decimal>,
    pub weekly_hours: Option<u32>,
    pub stage_start: NaiveDate,
    pub stage_end: NaiveDate,
    pub supervisor_id: Option<Uuid>,
}

impl Intern {
    pub fn new(input: NewIntern) -> Result<Self> {
        if input.stage_start > input.stage_end {
            return Err(LedgerError::validation(format!(
                "stage starts {} after it ends {}",
                input.stage_start, input.stage_end
            )));
        }
        let hourly_rate = input.hourly_rate.unwrap_or_else(default_hourly_rate);
        if hourly_rate < Decimal::ZERO {
            return Err(LedgerError::InvalidAmount {
                amount: hourly_rate,
                reason: "hourly rate cannot be negative",
            });
        }

        Ok(Self {
            id: Uuid::new_v4(),
            full_name: input.full_name,
            email: input.email,
            school: input.school,
            hourly_rate,
            weekly_hours: input.weekly_hours.unwrap_or(DEFAULT_WEEKLY_HOURS),
            stage_start: input.stage_start,
            stage_end: input.stage_end,
            status: InternStatus::Active,
            skill_level: SkillLevel::Beginner,
            supervisor_id: input.supervisor_id,
        })
    }

    pub fn stage_length_days(&self) -> i64 {
        (self.stage_end - self.stage_start).num_days()
    }

    pub fn days_remaining(&self, today: NaiveDate) -> i64 {
        if today > self.stage_end {
            return 0;
        }
        (self.stage_end - today).num_days()
    }

    pub fn is_active_on(&self, today: NaiveDate) -> bool {
        self.status == InternStatus::Active
            && self.stage_start <= today
            && today <= self.stage_end
    }
}

/// A unit of work logged against one intern's ISO week.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,
    pub intern_id: Uuid,
    pub title: String,
    pub description: String,
    pub day: TaskDay,
    pub priority: Priority,
    pub estimated_hours: Decimal,
    pub actual_hours: Decimal,
    pub week: WeekKey,
    pub completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
    pub remarks: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Typed input for creating a task. Everything arrives already parsed; the
/// ledger only checks ranges.
#[derive(Debug, Clone)]
pub struct NewTask {
    pub title: String,
    pub description: String,
    pub day: TaskDay,
    pub priority: Priority,
    pub estimated_hours: Decimal,
    pub initial_hours: Decimal,
    pub week: WeekKey,
    pub remarks: String,
}
