use std::fmt::Write;

use serde::Serialize;

use crate::evaluation::Evaluation;
use crate::ledger::{hours_per_day, InternProgress};
use crate::models::{Intern, Task};
use crate::payroll::MonthlyPayroll;
use crate::period::ReferencePeriod;
use crate::quarterly::QuarterSummary;
use crate::weekly::{WeeklyBucket, WeeklyHistory};

/// Everything the intern dashboard shows for one reference date.
pub struct Dashboard<'a> {
    pub intern: &'a Intern,
    pub period: ReferencePeriod,
    pub week: &'a WeeklyBucket,
    pub week_tasks: &'a [&'a Task],
    pub payroll: &'a MonthlyPayroll,
    pub quarter: &'a QuarterSummary,
    pub latest_evaluation: Option<&'a Evaluation>,
}

/// One line of the supervisor overview.
#[derive(Debug, Clone, Serialize)]
pub struct SupervisedIntern {
    pub intern: Intern,
    pub week: Option<WeeklyBucket>,
    pub progress: InternProgress,
}

pub fn build_dashboard(dashboard: &Dashboard<'_>) -> String {
    let Dashboard {
        intern,
        period,
        week,
        week_tasks,
        payroll,
        quarter,
        latest_evaluation,
    } = dashboard;

    let mut output = String::new();
    let (starts_on, ends_on) = period.week.bounds();

    let _ = writeln!(output, "# Intern Dashboard: {}", intern.full_name);
    let _ = writeln!(
        output,
        "{} ({}), week {} from {} to {}",
        intern.school, intern.email, period.week, starts_on, ends_on
    );
    if intern.is_active_on(period.date) {
        let _ = writeln!(
            output,
            "{} days left in the stage.",
            intern.days_remaining(period.date)
        );
    }
    let _ = writeln!(output);

    let _ = writeln!(output, "## This Week");
    let _ = writeln!(output, "- Hours: {:.2}", week.total_hours);
    let _ = writeln!(
        output,
        "- Tasks: {} ({} completed, {} in progress)",
        week.task_count,
        week.completed_count,
        week.in_progress()
    );
    let _ = writeln!(output, "- Progress: {:.0}%", week.completion_rate());
    let _ = writeln!(output, "- Pay: {:.2}", week.pay);
    if let Some(rating) = week.supervisor_rating {
        let _ = writeln!(output, "- Supervisor rating: {rating}/5");
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Tasks By Day");
    let per_day = hours_per_day(week_tasks.iter().copied());
    for (day, hours) in per_day.iter() {
        let _ = writeln!(output, "### {} ({:.2}h)", capitalize(day.as_str()), hours);
        let mut any = false;
        for task in week_tasks.iter().filter(|task| task.day == *day) {
            any = true;
            let _ = writeln!(
                output,
                "- [{}] {} ({}): {:.2}/{:.2}h, {:.0}%",
                if task.completed { "x" } else { " " },
                task.title,
                task.priority,
                task.actual_hours,
                task.estimated_hours,
                task.percent_complete()
            );
        }
        if !any {
            let _ = writeln!(output, "No tasks.");
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(
        output,
        "## {}",
        period.month.first_day().format("%B %Y")
    );
    let _ = writeln!(output, "- Hours: {:.2}", payroll.total_hours);
    let _ = writeln!(output, "- Gross pay: {:.2}", payroll.gross_pay);
    let _ = writeln!(
        output,
        "- Net pay: {:.2} (bonus {:.2}, deductions {:.2})",
        payroll.net_pay, payroll.bonus, payroll.deductions
    );
    match payroll.paid_on {
        Some(date) if payroll.paid => {
            let _ = writeln!(output, "- Paid on {date}");
        }
        _ => {
            let _ = writeln!(output, "- Not paid yet");
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Q{} {}", quarter.quarter, quarter.year);
    let _ = writeln!(output, "- Hours: {:.2}", quarter.total_hours);
    let _ = writeln!(output, "- Pay: {:.2}", quarter.total_pay);

    let _ = writeln!(output);
    let _ = writeln!(output, "## Latest Evaluation");
    match latest_evaluation {
        Some(evaluation) => {
            let _ = writeln!(
                output,
                "- {} on {}: average {:.1}/5",
                evaluation.kind,
                evaluation.evaluated_on,
                evaluation.average_score()
            );
            if !evaluation.general_comment.is_empty() {
                let _ = writeln!(output, "- {}", evaluation.general_comment);
            }
        }
        None => {
            let _ = writeln!(output, "No evaluations yet.");
        }
    }

    output
}

pub fn build_history(intern: &Intern, history: &WeeklyHistory) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "# Weekly History: {}", intern.full_name);
    let _ = writeln!(
        output,
        "Total {:.2}h, pay {:.2}, average {:.2}h per week",
        history.total_hours, history.total_pay, history.average_hours
    );
    let _ = writeln!(output);

    if history.weeks.is_empty() {
        let _ = writeln!(output, "No weeks recorded.");
        return output;
    }

    for bucket in history.weeks.iter() {
        let _ = writeln!(
            output,
            "- {} ({} to {}): {:.2}h, {}/{} tasks, pay {:.2}",
            bucket.week,
            bucket.starts_on,
            bucket.ends_on,
            bucket.total_hours,
            bucket.completed_count,
            bucket.task_count,
            bucket.pay
        );
    }
    output
}

pub fn build_supervisor_report(
    supervisor: &str,
    period: ReferencePeriod,
    interns: &[SupervisedIntern],
) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "# Supervisor Overview");
    let _ = writeln!(output, "Interns supervised by {} for week {}", supervisor, period.week);
    let _ = writeln!(output);

    if interns.is_empty() {
        let _ = writeln!(output, "No interns assigned.");
        return output;
    }

    let mut rows: Vec<&SupervisedIntern> = interns.iter().collect();
    rows.sort_by(|a, b| a.intern.full_name.cmp(&b.intern.full_name));

    for row in rows {
        let week = match &row.week {
            Some(bucket) => format!(
                "{:.2}h this week, {}/{} tasks done",
                bucket.total_hours, bucket.completed_count, bucket.task_count
            ),
            None => "nothing logged this week".to_string(),
        };
        let _ = writeln!(
            output,
            "- {} ({}, {}): {}; overall {}/{} tasks ({:.0}%)",
            row.intern.full_name,
            row.intern.email,
            row.intern.status,
            week,
            row.progress.completed_tasks,
            row.progress.total_tasks,
            row.progress.progression
        );
    }
    output
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::tests::{clock, hours, new_task, sample_intern};
    use crate::ledger::TaskLedger;
    use crate::payroll::MonthlyPayrollCalculator;
    use crate::quarterly::QuarterlyRollup;
    use crate::weekly::WeeklyAggregator;
    use chrono::NaiveDate;

    #[test]
    fn dashboard_lists_week_month_and_quarter() {
        let intern = sample_intern();
        let period = ReferencePeriod::of(NaiveDate::from_ymd_opt(2024, 3, 6).unwrap());
        let mut ledger = TaskLedger::new();
        ledger
            .create_task(&intern, new_task("4", "4", period.week), clock())
            .unwrap();
        ledger
            .create_task(&intern, new_task("6", "1.5", period.week), clock())
            .unwrap();

        let mut aggregator = WeeklyAggregator::new();
        let week = aggregator.recompute(&intern, period.week, &ledger).clone();
        let mut calculator = MonthlyPayrollCalculator::new();
        let payroll = calculator
            .recompute(&intern, period.month.month(), period.month.year(), &ledger)
            .unwrap()
            .clone();
        let quarter = QuarterlyRollup::recompute(&intern, period.quarter, 2024, &ledger).unwrap();
        let week_tasks = ledger.tasks_for_week(intern.id, period.week);

        let report = build_dashboard(&Dashboard {
            intern: &intern,
            period,
            week: &week,
            week_tasks: &week_tasks,
            payroll: &payroll,
            quarter: &quarter,
            latest_evaluation: None,
        });

        assert!(report.contains("# Intern Dashboard: Lina Haddad"));
        assert!(report.contains("- Hours: 5.50"));
        assert!(report.contains("- Tasks: 2 (1 completed, 1 in progress)"));
        assert!(report.contains("### Wednesday (5.50h)"));
        assert!(report.contains("### Monday (0.00h)"));
        assert!(report.contains("## March 2024"));
        assert!(report.contains("## Q1 2024"));
        assert!(report.contains("No evaluations yet."));
        assert_eq!(week.pay, hours("36.795"));
    }

    #[test]
    fn supervisor_report_handles_empty_and_missing_weeks() {
        let period = ReferencePeriod::of(NaiveDate::from_ymd_opt(2024, 3, 6).unwrap());
        let report = build_supervisor_report("Claire Dubois", period, &[]);
        assert!(report.contains("No interns assigned."));

        let intern = sample_intern();
        let rows = vec![SupervisedIntern {
            progress: TaskLedger::new().progress(intern.id),
            intern,
            week: None,
        }];
        let report = build_supervisor_report("Claire Dubois", period, &rows);
        assert!(report.contains("nothing logged this week"));
        assert!(report.contains("overall 0/0 tasks (0%)"));
    }

    #[test]
    fn history_report_lists_weeks() {
        let intern = sample_intern();
        let report = build_history(&intern, &WeeklyHistory::from_buckets(Vec::new()));
        assert!(report.contains("No weeks recorded."));
    }
}
