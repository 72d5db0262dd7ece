use std::path::PathBuf;

use anyhow::Context;
use chrono::{Datelike, NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use intern_payroll::evaluation::latest_evaluation;
use intern_payroll::ledger::build_task;
use intern_payroll::report::{self, Dashboard, SupervisedIntern};
use intern_payroll::{
    Criteria, Evaluation, EvaluationKind, Intern, MonthKey, MonthlyPayroll,
    MonthlyPayrollCalculator, NewEvaluation, NewTask, Priority, QuarterlyRollup, ReferencePeriod,
    Task, TaskDay, TaskLedger, WeekKey, WeeklyAggregator, WeeklyBucket, WeeklyHistory,
};

mod db;

#[derive(Parser)]
#[command(name = "intern-payroll")]
#[command(about = "Intern task hours, weekly totals and monthly payroll", long_about = None)]
struct Cli {
    #[command(flatten)]
    config: Config,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct Config {
    /// Postgres connection string
    #[arg(long, env = "DATABASE_URL", global = true, hide_env_values = true)]
    database_url: Option<String>,

    #[arg(long, env = "PAYROLL_MAX_CONNECTIONS", global = true, default_value_t = 5)]
    max_connections: u32,

    /// Reference date for the current week, month and quarter (defaults to today)
    #[arg(long, global = true)]
    on: Option<NaiveDate>,

    /// Print rollups as JSON
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load demo supervisor, interns and tasks
    Seed,
    /// Import tasks from a CSV file
    Import {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Log a new task in the reference week
    AddTask {
        #[arg(long)]
        email: String,
        #[arg(long)]
        title: String,
        /// Defaults to the weekday of the reference date
        #[arg(long)]
        day: Option<TaskDay>,
        #[arg(long)]
        estimated: Decimal,
        #[arg(long, default_value = "0")]
        actual: Decimal,
        #[arg(long, default_value = "medium")]
        priority: Priority,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long, default_value = "")]
        remarks: String,
    },
    /// Add worked hours to a task
    AddHours {
        task_id: Uuid,
        #[arg(allow_hyphen_values = true)]
        hours: Decimal,
    },
    /// Mark a task done or reopen it
    Toggle { task_id: Uuid },
    /// Delete a task
    DeleteTask { task_id: Uuid },
    /// Recompute and show a weekly bucket
    Week {
        #[arg(long)]
        email: String,
        #[command(flatten)]
        week: WeekArgs,
    },
    /// Comment on or rate a week
    CommentWeek {
        #[arg(long)]
        email: String,
        #[command(flatten)]
        week: WeekArgs,
        #[arg(long)]
        intern_comment: Option<String>,
        #[arg(long)]
        supervisor_comment: Option<String>,
        #[arg(long)]
        rating: Option<u8>,
    },
    /// Recompute and show a monthly payroll
    Month {
        #[arg(long)]
        email: String,
        #[command(flatten)]
        month: MonthArgs,
    },
    /// Set the bonus and deductions of a monthly payroll
    Adjust {
        #[arg(long)]
        email: String,
        #[command(flatten)]
        month: MonthArgs,
        #[arg(long, default_value = "0")]
        bonus: Decimal,
        #[arg(long, default_value = "0")]
        deductions: Decimal,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Mark a monthly payroll as paid
    MarkPaid {
        #[arg(long)]
        email: String,
        #[command(flatten)]
        month: MonthArgs,
        /// Defaults to the reference date
        #[arg(long)]
        paid_on: Option<NaiveDate>,
    },
    /// Show quarterly hours and gross pay
    Quarter {
        #[arg(long)]
        email: String,
        #[arg(long)]
        quarter: Option<u32>,
        #[arg(long)]
        year: Option<i32>,
    },
    /// Record an evaluation
    Evaluate {
        #[arg(long)]
        email: String,
        /// Supervisor email
        #[arg(long)]
        evaluator: Option<String>,
        #[arg(long)]
        kind: EvaluationKind,
        #[arg(long)]
        technical: u8,
        #[arg(long)]
        quality: u8,
        #[arg(long)]
        autonomy: u8,
        #[arg(long)]
        communication: u8,
        #[arg(long)]
        punctuality: u8,
        #[arg(long, default_value = "")]
        strengths: String,
        #[arg(long, default_value = "")]
        improvements: String,
        #[arg(long, default_value = "")]
        comment: String,
        #[arg(long, default_value = "")]
        goals: String,
    },
    /// List every recorded week
    History {
        #[arg(long)]
        email: String,
    },
    /// Write the intern dashboard as markdown
    Report {
        #[arg(long)]
        email: String,
        #[arg(long, default_value = "dashboard.md")]
        out: PathBuf,
    },
    /// Write the supervisor overview as markdown
    Supervisor {
        #[arg(long)]
        email: String,
        #[arg(long, default_value = "supervisor.md")]
        out: PathBuf,
    },
}

#[derive(Args)]
struct WeekArgs {
    /// ISO year
    #[arg(long)]
    year: Option<i32>,
    /// ISO week number
    #[arg(long)]
    week: Option<u32>,
}

impl WeekArgs {
    fn resolve(&self, period: &ReferencePeriod) -> anyhow::Result<WeekKey> {
        Ok(WeekKey::new(
            self.year.unwrap_or(period.week.year()),
            self.week.unwrap_or(period.week.week()),
        )?)
    }
}

#[derive(Args)]
struct MonthArgs {
    #[arg(long)]
    year: Option<i32>,
    #[arg(long)]
    month: Option<u32>,
}

impl MonthArgs {
    fn resolve(&self, period: &ReferencePeriod) -> anyhow::Result<MonthKey> {
        Ok(MonthKey::new(
            self.year.unwrap_or(period.month.year()),
            self.month.unwrap_or(period.month.month()),
        )?)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = cli.config;
    let database_url = config
        .database_url
        .context("DATABASE_URL must be set to a Postgres instance")?;

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&database_url)
        .await
        .context("failed to connect to Postgres")?;

    let period = ReferencePeriod::of(config.on.unwrap_or_else(|| Utc::now().date_naive()));
    let json = config.json;

    match cli.command {
        Commands::InitDb => {
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            let interns = db::seed(&pool, period.date).await?;
            for intern in interns.iter() {
                refresh_rollups(&pool, intern, period.week).await?;
            }
            println!("Seed data inserted for {} interns.", interns.len());
        }
        Commands::Import { csv } => {
            let summary = db::import_csv(&pool, &csv).await?;
            for (intern_id, week) in summary.touched.iter() {
                let intern = db::fetch_intern_by_id(&pool, *intern_id).await?;
                refresh_rollups(&pool, &intern, *week).await?;
            }
            println!("Inserted {} tasks from {}.", summary.inserted, csv.display());
        }
        Commands::AddTask {
            email,
            title,
            day,
            estimated,
            actual,
            priority,
            description,
            remarks,
        } => {
            let intern = db::fetch_intern(&pool, &email).await?;
            let day = match day {
                Some(day) => day,
                None => TaskDay::from_weekday(period.date.weekday())
                    .context("no task day on Sunday, pass --day")?,
            };
            let task = build_task(
                &intern,
                NewTask {
                    title,
                    description,
                    day,
                    priority,
                    estimated_hours: estimated,
                    initial_hours: actual,
                    week: period.week,
                    remarks,
                },
                Utc::now(),
            )?;
            db::insert_task(&pool, &task, None).await?;
            let bucket = refresh_rollups(&pool, &intern, task.week).await?;
            info!(task_id = %task.id, intern = %intern.email, "task added");
            print_task(&task, json)?;
            print_bucket(&bucket, json)?;
        }
        Commands::AddHours { task_id, hours } => {
            let now = Utc::now();
            let task = db::update_task_locked(&pool, task_id, |task| task.add_hours(hours, now))
                .await?;
            let intern = db::fetch_intern_by_id(&pool, task.intern_id).await?;
            refresh_rollups(&pool, &intern, task.week).await?;
            print_task(&task, json)?;
        }
        Commands::Toggle { task_id } => {
            let now = Utc::now();
            let task = db::update_task_locked(&pool, task_id, |task| {
                task.toggle_completion(now);
                Ok(())
            })
            .await?;
            let intern = db::fetch_intern_by_id(&pool, task.intern_id).await?;
            refresh_rollups(&pool, &intern, task.week).await?;
            print_task(&task, json)?;
        }
        Commands::DeleteTask { task_id } => {
            let task = db::delete_task(&pool, task_id).await?;
            let intern = db::fetch_intern_by_id(&pool, task.intern_id).await?;
            let bucket = refresh_rollups(&pool, &intern, task.week).await?;
            println!("Deleted task {}.", task.title);
            print_bucket(&bucket, json)?;
        }
        Commands::Week { email, week } => {
            let intern = db::fetch_intern(&pool, &email).await?;
            let bucket = refresh_rollups(&pool, &intern, week.resolve(&period)?).await?;
            print_bucket(&bucket, json)?;
        }
        Commands::CommentWeek {
            email,
            week,
            intern_comment,
            supervisor_comment,
            rating,
        } => {
            let intern = db::fetch_intern(&pool, &email).await?;
            let week = week.resolve(&period)?;
            let ledger = load_ledger(&pool, &intern).await?;
            let mut aggregator = WeeklyAggregator::new();
            if let Some(bucket) = db::fetch_bucket(&pool, intern.id, week).await? {
                aggregator.restore(bucket);
            }
            aggregator.recompute(&intern, week, &ledger);
            let bucket = aggregator.comment(
                intern.id,
                week,
                intern_comment,
                supervisor_comment,
                rating,
            )?;
            db::store_bucket_commentary(&pool, bucket).await?;
            print_bucket(bucket, json)?;
        }
        Commands::Month { email, month } => {
            let intern = db::fetch_intern(&pool, &email).await?;
            let ledger = load_ledger(&pool, &intern).await?;
            let (calculator, month) =
                load_payroll(&pool, &intern, month.resolve(&period)?, &ledger).await?;
            let payroll = payroll_row(&calculator, &intern, month)?;
            db::store_payroll_totals(&pool, payroll).await?;
            print_payroll(payroll, json)?;
        }
        Commands::Adjust {
            email,
            month,
            bonus,
            deductions,
            notes,
        } => {
            let intern = db::fetch_intern(&pool, &email).await?;
            let ledger = load_ledger(&pool, &intern).await?;
            let (mut calculator, month) =
                load_payroll(&pool, &intern, month.resolve(&period)?, &ledger).await?;
            let payroll = calculator.adjust(intern.id, month, bonus, deductions, notes)?;
            db::store_payroll_adjustment(&pool, payroll).await?;
            print_payroll(payroll, json)?;
        }
        Commands::MarkPaid {
            email,
            month,
            paid_on,
        } => {
            let intern = db::fetch_intern(&pool, &email).await?;
            let ledger = load_ledger(&pool, &intern).await?;
            let (mut calculator, month) =
                load_payroll(&pool, &intern, month.resolve(&period)?, &ledger).await?;
            let payroll =
                calculator.mark_paid(intern.id, month, paid_on.unwrap_or(period.date))?;
            db::store_payroll_paid(&pool, payroll).await?;
            print_payroll(payroll, json)?;
        }
        Commands::Quarter {
            email,
            quarter,
            year,
        } => {
            let intern = db::fetch_intern(&pool, &email).await?;
            let ledger = load_ledger(&pool, &intern).await?;
            let summary = QuarterlyRollup::recompute(
                &intern,
                quarter.unwrap_or(period.quarter),
                year.unwrap_or(period.month.year()),
                &ledger,
            )?;
            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                println!(
                    "Q{} {}: {:.2}h, pay {:.2}",
                    summary.quarter, summary.year, summary.total_hours, summary.total_pay
                );
            }
        }
        Commands::Evaluate {
            email,
            evaluator,
            kind,
            technical,
            quality,
            autonomy,
            communication,
            punctuality,
            strengths,
            improvements,
            comment,
            goals,
        } => {
            let intern = db::fetch_intern(&pool, &email).await?;
            let evaluator_id = match evaluator.as_deref() {
                Some(email) => Some(db::fetch_supervisor(&pool, email).await?.0),
                None => None,
            };
            let evaluation = Evaluation::new(
                NewEvaluation {
                    intern_id: intern.id,
                    evaluator_id,
                    kind,
                    evaluated_on: period.date,
                    criteria: Criteria {
                        technical_skill: technical,
                        work_quality: quality,
                        autonomy,
                        communication,
                        punctuality,
                    },
                    strengths,
                    improvements,
                    general_comment: comment,
                    future_goals: goals,
                },
                Utc::now(),
            )?;
            db::insert_evaluation(&pool, &evaluation).await?;
            println!(
                "Recorded {} evaluation for {}: average {:.1}/5",
                evaluation.kind,
                intern.full_name,
                evaluation.average_score()
            );
        }
        Commands::History { email } => {
            let intern = db::fetch_intern(&pool, &email).await?;
            let history = WeeklyHistory::from_buckets(db::fetch_buckets(&pool, intern.id).await?);
            if json {
                println!("{}", serde_json::to_string_pretty(&history)?);
            } else {
                print!("{}", report::build_history(&intern, &history));
            }
        }
        Commands::Report { email, out } => {
            let intern = db::fetch_intern(&pool, &email).await?;
            let week = refresh_rollups(&pool, &intern, period.week).await?;
            let ledger = load_ledger(&pool, &intern).await?;
            let (calculator, month) = load_payroll(&pool, &intern, period.month, &ledger).await?;
            let payroll = payroll_row(&calculator, &intern, month)?;
            db::store_payroll_totals(&pool, payroll).await?;
            let quarter =
                QuarterlyRollup::recompute(&intern, period.quarter, period.month.year(), &ledger)?;
            let evaluations = db::fetch_evaluations(&pool, intern.id).await?;
            let week_tasks = ledger.tasks_for_week(intern.id, period.week);

            let dashboard = report::build_dashboard(&Dashboard {
                intern: &intern,
                period,
                week: &week,
                week_tasks: &week_tasks,
                payroll,
                quarter: &quarter,
                latest_evaluation: latest_evaluation(&evaluations),
            });
            std::fs::write(&out, dashboard)?;
            println!("Dashboard written to {}.", out.display());
        }
        Commands::Supervisor { email, out } => {
            let (supervisor_id, supervisor_name) = db::fetch_supervisor(&pool, &email).await?;
            let mut rows = Vec::new();
            for intern in db::fetch_supervised_interns(&pool, supervisor_id).await? {
                let ledger = load_ledger(&pool, &intern).await?;
                let week = match db::fetch_bucket(&pool, intern.id, period.week).await? {
                    Some(_) => Some(refresh_rollups(&pool, &intern, period.week).await?),
                    None => None,
                };
                rows.push(SupervisedIntern {
                    progress: ledger.progress(intern.id),
                    intern,
                    week,
                });
            }
            let overview = report::build_supervisor_report(&supervisor_name, period, &rows);
            std::fs::write(&out, overview)?;
            println!("Supervisor overview written to {}.", out.display());
        }
    }

    Ok(())
}

async fn load_ledger(pool: &PgPool, intern: &Intern) -> anyhow::Result<TaskLedger> {
    Ok(TaskLedger::from_tasks(db::fetch_tasks(pool, intern.id).await?))
}

/// Restores the stored payroll row, if any, and recomputes it so the
/// adjustments and paid state carry over.
async fn load_payroll(
    pool: &PgPool,
    intern: &Intern,
    month: MonthKey,
    ledger: &TaskLedger,
) -> anyhow::Result<(MonthlyPayrollCalculator, MonthKey)> {
    let mut calculator = MonthlyPayrollCalculator::new();
    if let Some(payroll) = db::fetch_payroll(pool, intern.id, month).await? {
        calculator.restore(payroll);
    }
    calculator.recompute(intern, month.month(), month.year(), ledger)?;
    Ok((calculator, month))
}

fn payroll_row<'a>(
    calculator: &'a MonthlyPayrollCalculator,
    intern: &Intern,
    month: MonthKey,
) -> anyhow::Result<&'a MonthlyPayroll> {
    calculator
        .get(intern.id, month)
        .with_context(|| format!("payroll for {month} was not computed"))
}

/// Recomputes the task's weekly bucket and every payroll month the week
/// overlaps, then stores them. Run after each task mutation. Only derived
/// columns are written, so comments, ratings, adjustments and payment
/// state saved in the meantime are kept.
async fn refresh_rollups(
    pool: &PgPool,
    intern: &Intern,
    week: WeekKey,
) -> anyhow::Result<WeeklyBucket> {
    let ledger = load_ledger(pool, intern).await?;

    let mut aggregator = WeeklyAggregator::new();
    if let Some(bucket) = db::fetch_bucket(pool, intern.id, week).await? {
        aggregator.restore(bucket);
    }
    let bucket = aggregator.recompute(intern, week, &ledger).clone();
    db::store_bucket_totals(pool, &bucket).await?;

    for month in week.months() {
        let (calculator, month) = load_payroll(pool, intern, month, &ledger).await?;
        db::store_payroll_totals(pool, payroll_row(&calculator, intern, month)?).await?;
    }

    Ok(bucket)
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_task(task: &Task, json: bool) -> anyhow::Result<()> {
    if json {
        return print_json(task);
    }
    println!(
        "{} [{}] {}: {:.2}/{:.2}h ({:.0}%), {:.2}h remaining{}",
        task.id,
        task.week,
        task.title,
        task.actual_hours,
        task.estimated_hours,
        task.percent_complete(),
        task.remaining_hours(),
        if task.completed { ", done" } else { "" }
    );
    Ok(())
}

fn print_bucket(bucket: &WeeklyBucket, json: bool) -> anyhow::Result<()> {
    if json {
        return print_json(bucket);
    }
    println!(
        "Week {} ({} to {}): {:.2}h, {}/{} tasks done ({:.0}%), pay {:.2}",
        bucket.week,
        bucket.starts_on,
        bucket.ends_on,
        bucket.total_hours,
        bucket.completed_count,
        bucket.task_count,
        bucket.completion_rate(),
        bucket.pay
    );
    Ok(())
}

fn print_payroll(payroll: &MonthlyPayroll, json: bool) -> anyhow::Result<()> {
    if json {
        return print_json(payroll);
    }
    println!(
        "{}: {:.2}h, gross {:.2}, bonus {:.2}, deductions {:.2}, net {:.2}{}",
        payroll.month,
        payroll.total_hours,
        payroll.gross_pay,
        payroll.bonus,
        payroll.deductions,
        payroll.net_pay,
        match payroll.paid_on {
            Some(date) if payroll.paid => format!(", paid on {date}"),
            _ => String::new(),
        }
    );
    Ok(())
}
