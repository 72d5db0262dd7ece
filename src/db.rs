use std::collections::BTreeSet;

use anyhow::Context;
use chrono::{Datelike, NaiveDate, Utc};
use intern_payroll::evaluation::{Criteria, Evaluation};
use intern_payroll::ledger::build_task;
use intern_payroll::{
    Intern, LedgerError, MonthKey, MonthlyPayroll, NewTask, Priority, Task, TaskDay, WeekKey,
    WeeklyBucket,
};
use rust_decimal::Decimal;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

const INTERN_COLUMNS: &str = "SELECT id, full_name, email, school, hourly_rate, weekly_hours, \
     stage_start, stage_end, status, skill_level, supervisor_id FROM intern_payroll.interns";

const TASK_COLUMNS: &str = "SELECT id, intern_id, title, description, day, priority, \
     estimated_hours, actual_hours, iso_year, week, completed, completed_at, remarks, \
     created_at, updated_at FROM intern_payroll.tasks";

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

/// Inserts a demo supervisor, two interns and a handful of tasks in the
/// reference week. Returns the seeded interns.
pub async fn seed(pool: &PgPool, today: NaiveDate) -> anyhow::Result<Vec<Intern>> {
    let supervisor_id = Uuid::parse_str("5e0c2a94-71b3-4f62-b8d0-c93a1e47f605")?;
    sqlx::query(
        r#"
        INSERT INTO intern_payroll.supervisors (id, full_name, email)
        VALUES ($1, $2, $3)
        ON CONFLICT (email) DO UPDATE SET full_name = EXCLUDED.full_name
        "#,
    )
    .bind(supervisor_id)
    .bind("Claire Dubois")
    .bind("claire.dubois@example.com")
    .execute(pool)
    .await?;

    let stage_start = today - chrono::Duration::days(30);
    let stage_end = today + chrono::Duration::days(60);
    let interns = vec![
        (
            Uuid::parse_str("a41d9c07-6e28-4b5f-9d13-28f0b6c5e3a8")?,
            "Lina Haddad",
            "lina.haddad@example.com",
            "Polytechnic School",
        ),
        (
            Uuid::parse_str("f2b87e13-0c49-4a7d-a6e5-7d1c94b0823f")?,
            "Tomas Ferreira",
            "tomas.ferreira@example.com",
            "City University",
        ),
    ];

    for (id, name, email, school) in interns.iter() {
        sqlx::query(
            r#"
            INSERT INTO intern_payroll.interns
            (id, full_name, email, school, stage_start, stage_end, supervisor_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (email) DO UPDATE
            SET full_name = EXCLUDED.full_name, school = EXCLUDED.school
            "#,
        )
        .bind(*id)
        .bind(*name)
        .bind(*email)
        .bind(*school)
        .bind(stage_start)
        .bind(stage_end)
        .bind(supervisor_id)
        .execute(pool)
        .await?;
    }

    let week = WeekKey::containing(today);
    let tasks = vec![
        ("seed-001", "lina.haddad@example.com", "Set up development laptop", TaskDay::Monday, Priority::High, "3", "3"),
        ("seed-002", "lina.haddad@example.com", "Review onboarding guide", TaskDay::Tuesday, Priority::Medium, "6", "4.5"),
        ("seed-003", "lina.haddad@example.com", "Shadow support call", TaskDay::Wednesday, Priority::Low, "2", "0"),
        ("seed-004", "tomas.ferreira@example.com", "Draft test plan", TaskDay::Monday, Priority::Urgent, "5", "2"),
    ];

    let now = Utc::now();
    let mut seeded = Vec::new();
    for (_, _, email, _) in interns.iter() {
        seeded.push(fetch_intern(pool, email).await?);
    }
    for (source_key, email, title, day, priority, estimated, actual) in tasks {
        let intern = seeded
            .iter()
            .find(|intern| intern.email == email)
            .context("seed task references unknown intern")?;
        let task = build_task(
            intern,
            NewTask {
                title: title.to_string(),
                description: String::new(),
                day,
                priority,
                estimated_hours: estimated.parse()?,
                initial_hours: actual.parse()?,
                week,
                remarks: String::new(),
            },
            now,
        )?;
        insert_task(pool, &task, Some(source_key)).await?;
    }

    Ok(seeded)
}

pub async fn fetch_intern(pool: &PgPool, email: &str) -> anyhow::Result<Intern> {
    let row = sqlx::query(&format!("{INTERN_COLUMNS} WHERE email = $1"))
        .bind(email)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| LedgerError::not_found("intern", email))?;
    intern_from_row(&row)
}

pub async fn fetch_intern_by_id(pool: &PgPool, id: Uuid) -> anyhow::Result<Intern> {
    let row = sqlx::query(&format!("{INTERN_COLUMNS} WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| LedgerError::not_found("intern", id))?;
    intern_from_row(&row)
}

/// Returns the supervisor's id and name.
pub async fn fetch_supervisor(pool: &PgPool, email: &str) -> anyhow::Result<(Uuid, String)> {
    let row = sqlx::query("SELECT id, full_name FROM intern_payroll.supervisors WHERE email = $1")
        .bind(email)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| LedgerError::not_found("supervisor", email))?;
    Ok((row.try_get("id")?, row.try_get("full_name")?))
}

pub async fn fetch_supervised_interns(
    pool: &PgPool,
    supervisor_id: Uuid,
) -> anyhow::Result<Vec<Intern>> {
    let rows = sqlx::query(&format!(
        "{INTERN_COLUMNS} WHERE supervisor_id = $1 ORDER BY full_name"
    ))
    .bind(supervisor_id)
    .fetch_all(pool)
    .await?;

    rows.iter().map(intern_from_row).collect()
}

pub async fn fetch_tasks(pool: &PgPool, intern_id: Uuid) -> anyhow::Result<Vec<Task>> {
    let rows = sqlx::query(&format!("{TASK_COLUMNS} WHERE intern_id = $1"))
        .bind(intern_id)
        .fetch_all(pool)
        .await?;

    rows.iter().map(task_from_row).collect()
}

pub async fn fetch_task(pool: &PgPool, task_id: Uuid) -> anyhow::Result<Task> {
    let row = sqlx::query(&format!("{TASK_COLUMNS} WHERE id = $1"))
        .bind(task_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| LedgerError::not_found("task", task_id))?;
    task_from_row(&row)
}

/// Returns false when a task with the same source key already exists.
pub async fn insert_task(
    pool: &PgPool,
    task: &Task,
    source_key: Option<&str>,
) -> anyhow::Result<bool> {
    let result = sqlx::query(
        r#"
        INSERT INTO intern_payroll.tasks
        (id, intern_id, title, description, day, priority, estimated_hours, actual_hours,
         iso_year, week, completed, completed_at, remarks, source_key, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
        ON CONFLICT (source_key) DO NOTHING
        "#,
    )
    .bind(task.id)
    .bind(task.intern_id)
    .bind(&task.title)
    .bind(&task.description)
    .bind(task.day.as_str())
    .bind(task.priority.as_str())
    .bind(task.estimated_hours)
    .bind(task.actual_hours)
    .bind(task.week.year())
    .bind(week_number(task.week)?)
    .bind(task.completed)
    .bind(task.completed_at)
    .bind(&task.remarks)
    .bind(source_key)
    .bind(task.created_at)
    .bind(task.updated_at)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Applies a ledger operation to one task while holding its row lock, so
/// concurrent updates of the same task run one after the other. A rejected
/// operation rolls back and leaves the row untouched.
pub async fn update_task_locked<F>(pool: &PgPool, task_id: Uuid, apply: F) -> anyhow::Result<Task>
where
    F: FnOnce(&mut Task) -> intern_payroll::Result<()>,
{
    let mut tx = pool.begin().await?;
    let row = sqlx::query(&format!("{TASK_COLUMNS} WHERE id = $1 FOR UPDATE"))
        .bind(task_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| LedgerError::not_found("task", task_id))?;
    let mut task = task_from_row(&row)?;

    apply(&mut task)?;

    sqlx::query(
        r#"
        UPDATE intern_payroll.tasks
        SET actual_hours = $2, completed = $3, completed_at = $4, updated_at = $5
        WHERE id = $1
        "#,
    )
    .bind(task.id)
    .bind(task.actual_hours)
    .bind(task.completed)
    .bind(task.completed_at)
    .bind(task.updated_at)
    .execute(&mut *tx)
    .await?;
    tx.commit().await?;

    Ok(task)
}

/// Deletes the task and returns it so its week can be recomputed.
pub async fn delete_task(pool: &PgPool, task_id: Uuid) -> anyhow::Result<Task> {
    let task = fetch_task(pool, task_id).await?;
    sqlx::query("DELETE FROM intern_payroll.tasks WHERE id = $1")
        .bind(task_id)
        .execute(pool)
        .await?;
    Ok(task)
}

pub async fn fetch_bucket(
    pool: &PgPool,
    intern_id: Uuid,
    week: WeekKey,
) -> anyhow::Result<Option<WeeklyBucket>> {
    let row = sqlx::query(
        r#"
        SELECT intern_id, iso_year, week, starts_on, ends_on, total_hours, task_count,
               completed_count, pay, intern_comment, supervisor_comment, supervisor_rating
        FROM intern_payroll.weekly_buckets
        WHERE intern_id = $1 AND iso_year = $2 AND week = $3
        "#,
    )
    .bind(intern_id)
    .bind(week.year())
    .bind(week_number(week)?)
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(bucket_from_row).transpose()
}

pub async fn fetch_buckets(pool: &PgPool, intern_id: Uuid) -> anyhow::Result<Vec<WeeklyBucket>> {
    let rows = sqlx::query(
        r#"
        SELECT intern_id, iso_year, week, starts_on, ends_on, total_hours, task_count,
               completed_count, pay, intern_comment, supervisor_comment, supervisor_rating
        FROM intern_payroll.weekly_buckets
        WHERE intern_id = $1
        "#,
    )
    .bind(intern_id)
    .fetch_all(pool)
    .await?;

    rows.iter().map(bucket_from_row).collect()
}

const BUCKET_INSERT: &str = r#"
        INSERT INTO intern_payroll.weekly_buckets AS b
        (intern_id, iso_year, week, starts_on, ends_on, total_hours, task_count,
         completed_count, pay, intern_comment, supervisor_comment, supervisor_rating)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
        ON CONFLICT (intern_id, iso_year, week) DO UPDATE"#;

/// Derived totals only; commentary written concurrently is kept.
const BUCKET_TOTALS_UPDATE: &str = r#"
        SET total_hours = EXCLUDED.total_hours,
            task_count = EXCLUDED.task_count,
            completed_count = EXCLUDED.completed_count,
            pay = EXCLUDED.pay"#;

const BUCKET_COMMENTARY_UPDATE: &str = r#"
        SET intern_comment = EXCLUDED.intern_comment,
            supervisor_comment = EXCLUDED.supervisor_comment,
            supervisor_rating = EXCLUDED.supervisor_rating"#;

/// Stores a recomputed bucket. An existing row only has its totals replaced.
pub async fn store_bucket_totals(pool: &PgPool, bucket: &WeeklyBucket) -> anyhow::Result<()> {
    write_bucket(pool, bucket, BUCKET_TOTALS_UPDATE).await
}

/// Stores the comments and rating of a bucket, leaving its totals alone.
pub async fn store_bucket_commentary(pool: &PgPool, bucket: &WeeklyBucket) -> anyhow::Result<()> {
    write_bucket(pool, bucket, BUCKET_COMMENTARY_UPDATE).await
}

async fn write_bucket(pool: &PgPool, bucket: &WeeklyBucket, update: &str) -> anyhow::Result<()> {
    sqlx::query(&format!("{BUCKET_INSERT}{update}"))
        .bind(bucket.intern_id)
        .bind(bucket.week.year())
        .bind(week_number(bucket.week)?)
        .bind(bucket.starts_on)
        .bind(bucket.ends_on)
        .bind(bucket.total_hours)
        .bind(i32::try_from(bucket.task_count)?)
        .bind(i32::try_from(bucket.completed_count)?)
        .bind(bucket.pay)
        .bind(&bucket.intern_comment)
        .bind(&bucket.supervisor_comment)
        .bind(bucket.supervisor_rating.map(i16::from))
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn fetch_payroll(
    pool: &PgPool,
    intern_id: Uuid,
    month: MonthKey,
) -> anyhow::Result<Option<MonthlyPayroll>> {
    let row = sqlx::query(
        r#"
        SELECT intern_id, year, month, total_hours, gross_pay, bonus, deductions, net_pay,
               paid, paid_on, notes
        FROM intern_payroll.monthly_payrolls
        WHERE intern_id = $1 AND year = $2 AND month = $3
        "#,
    )
    .bind(intern_id)
    .bind(month.year())
    .bind(i32::try_from(month.month())?)
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(payroll_from_row).transpose()
}

const PAYROLL_INSERT: &str = r#"
        INSERT INTO intern_payroll.monthly_payrolls AS p
        (intern_id, year, month, total_hours, gross_pay, bonus, deductions, net_pay,
         paid, paid_on, notes)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        ON CONFLICT (intern_id, year, month) DO UPDATE"#;

/// Hours and gross from a recompute. Net is rebuilt from the stored
/// adjustments, so a concurrent `adjust` is never overwritten.
const PAYROLL_TOTALS_UPDATE: &str = r#"
        SET total_hours = EXCLUDED.total_hours,
            gross_pay = EXCLUDED.gross_pay,
            net_pay = EXCLUDED.gross_pay + p.bonus - p.deductions"#;

const PAYROLL_ADJUSTMENT_UPDATE: &str = r#"
        SET bonus = EXCLUDED.bonus,
            deductions = EXCLUDED.deductions,
            notes = EXCLUDED.notes,
            net_pay = p.gross_pay + EXCLUDED.bonus - EXCLUDED.deductions"#;

const PAYROLL_PAID_UPDATE: &str = r#"
        SET paid = EXCLUDED.paid,
            paid_on = EXCLUDED.paid_on"#;

pub async fn store_payroll_totals(pool: &PgPool, payroll: &MonthlyPayroll) -> anyhow::Result<()> {
    write_payroll(pool, payroll, PAYROLL_TOTALS_UPDATE).await
}

pub async fn store_payroll_adjustment(
    pool: &PgPool,
    payroll: &MonthlyPayroll,
) -> anyhow::Result<()> {
    write_payroll(pool, payroll, PAYROLL_ADJUSTMENT_UPDATE).await
}

pub async fn store_payroll_paid(pool: &PgPool, payroll: &MonthlyPayroll) -> anyhow::Result<()> {
    write_payroll(pool, payroll, PAYROLL_PAID_UPDATE).await
}

async fn write_payroll(pool: &PgPool, payroll: &MonthlyPayroll, update: &str) -> anyhow::Result<()> {
    sqlx::query(&format!("{PAYROLL_INSERT}{update}"))
        .bind(payroll.intern_id)
        .bind(payroll.month.year())
        .bind(i32::try_from(payroll.month.month())?)
        .bind(payroll.total_hours)
        .bind(payroll.gross_pay)
        .bind(payroll.bonus)
        .bind(payroll.deductions)
        .bind(payroll.net_pay)
        .bind(payroll.paid)
        .bind(payroll.paid_on)
        .bind(&payroll.notes)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn insert_evaluation(pool: &PgPool, evaluation: &Evaluation) -> anyhow::Result<()> {
    let criteria = evaluation.criteria;
    sqlx::query(
        r#"
        INSERT INTO intern_payroll.evaluations
        (id, intern_id, evaluator_id, kind, evaluated_on, technical_skill, work_quality,
         autonomy, communication, punctuality, strengths, improvements, general_comment,
         future_goals, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
        "#,
    )
    .bind(evaluation.id)
    .bind(evaluation.intern_id)
    .bind(evaluation.evaluator_id)
    .bind(evaluation.kind.as_str())
    .bind(evaluation.evaluated_on)
    .bind(i16::from(criteria.technical_skill))
    .bind(i16::from(criteria.work_quality))
    .bind(i16::from(criteria.autonomy))
    .bind(i16::from(criteria.communication))
    .bind(i16::from(criteria.punctuality))
    .bind(&evaluation.strengths)
    .bind(&evaluation.improvements)
    .bind(&evaluation.general_comment)
    .bind(&evaluation.future_goals)
    .bind(evaluation.created_at)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn fetch_evaluations(pool: &PgPool, intern_id: Uuid) -> anyhow::Result<Vec<Evaluation>> {
    let rows = sqlx::query(
        r#"
        SELECT id, intern_id, evaluator_id, kind, evaluated_on, technical_skill, work_quality,
               autonomy, communication, punctuality, strengths, improvements, general_comment,
               future_goals, created_at
        FROM intern_payroll.evaluations
        WHERE intern_id = $1
        ORDER BY evaluated_on DESC
        "#,
    )
    .bind(intern_id)
    .fetch_all(pool)
    .await?;

    rows.iter().map(evaluation_from_row).collect()
}

pub struct ImportSummary {
    pub inserted: usize,
    pub touched: BTreeSet<(Uuid, WeekKey)>,
}

/// Loads tasks from a CSV file. The work date decides both the ISO week and
/// the day tag, so Sunday rows are rejected.
pub async fn import_csv(pool: &PgPool, csv_path: &std::path::Path) -> anyhow::Result<ImportSummary> {
    #[derive(serde::Deserialize)]
    struct CsvRow {
        email: String,
        title: String,
        description: Option<String>,
        worked_on: NaiveDate,
        priority: Option<String>,
        estimated_hours: String,
        actual_hours: Option<String>,
        remarks: Option<String>,
        source_key: Option<String>,
    }

    let mut reader = csv::Reader::from_path(csv_path)?;
    let mut summary = ImportSummary {
        inserted: 0,
        touched: BTreeSet::new(),
    };
    let now = Utc::now();

    for (line, result) in reader.deserialize::<CsvRow>().enumerate() {
        let row = result?;
        let intern = fetch_intern(pool, &row.email).await?;
        let day = TaskDay::from_weekday(row.worked_on.weekday())
            .with_context(|| format!("row {}: no task day for {}", line + 1, row.worked_on))?;
        let priority = match row.priority.as_deref() {
            Some(value) if !value.trim().is_empty() => value.parse()?,
            _ => Priority::default(),
        };
        let actual_hours = match row.actual_hours.as_deref() {
            Some(value) if !value.trim().is_empty() => value.trim().parse::<Decimal>()?,
            _ => Decimal::ZERO,
        };

        let task = build_task(
            &intern,
            NewTask {
                title: row.title,
                description: row.description.unwrap_or_default(),
                day,
                priority,
                estimated_hours: row.estimated_hours.trim().parse()?,
                initial_hours: actual_hours,
                week: WeekKey::containing(row.worked_on),
                remarks: row.remarks.unwrap_or_default(),
            },
            now,
        )
        .with_context(|| format!("row {} is not a valid task", line + 1))?;

        let source_key = row
            .source_key
            .unwrap_or_else(|| format!("import-{}", Uuid::new_v4()));
        if insert_task(pool, &task, Some(&source_key)).await? {
            summary.inserted += 1;
            summary.touched.insert((intern.id, task.week));
        }
    }

    Ok(summary)
}

fn week_number(week: WeekKey) -> anyhow::Result<i32> {
    Ok(i32::try_from(week.week())?)
}

fn week_from_row(row: &PgRow) -> anyhow::Result<WeekKey> {
    let year: i32 = row.try_get("iso_year")?;
    let week: i32 = row.try_get("week")?;
    Ok(WeekKey::new(year, u32::try_from(week)?)?)
}

fn intern_from_row(row: &PgRow) -> anyhow::Result<Intern> {
    let status: String = row.try_get("status")?;
    let skill_level: String = row.try_get("skill_level")?;
    let weekly_hours: i32 = row.try_get("weekly_hours")?;

    Ok(Intern {
        id: row.try_get("id")?,
        full_name: row.try_get("full_name")?,
        email: row.try_get("email")?,
        school: row.try_get("school")?,
        hourly_rate: row.try_get("hourly_rate")?,
        weekly_hours: u32::try_from(weekly_hours)?,
        stage_start: row.try_get("stage_start")?,
        stage_end: row.try_get("stage_end")?,
        status: status.parse()?,
        skill_level: skill_level.parse()?,
        supervisor_id: row.try_get("supervisor_id")?,
    })
}

fn task_from_row(row: &PgRow) -> anyhow::Result<Task> {
    let day: String = row.try_get("day")?;
    let priority: String = row.try_get("priority")?;

    Ok(Task {
        id: row.try_get("id")?,
        intern_id: row.try_get("intern_id")?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        day: day.parse()?,
        priority: priority.parse()?,
        estimated_hours: row.try_get("estimated_hours")?,
        actual_hours: row.try_get("actual_hours")?,
        week: week_from_row(row)?,
        completed: row.try_get("completed")?,
        completed_at: row.try_get("completed_at")?,
        remarks: row.try_get("remarks")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn bucket_from_row(row: &PgRow) -> anyhow::Result<WeeklyBucket> {
    let task_count: i32 = row.try_get("task_count")?;
    let completed_count: i32 = row.try_get("completed_count")?;
    let rating: Option<i16> = row.try_get("supervisor_rating")?;

    Ok(WeeklyBucket {
        intern_id: row.try_get("intern_id")?,
        week: week_from_row(row)?,
        starts_on: row.try_get("starts_on")?,
        ends_on: row.try_get("ends_on")?,
        total_hours: row.try_get("total_hours")?,
        task_count: u32::try_from(task_count)?,
        completed_count: u32::try_from(completed_count)?,
        pay: row.try_get("pay")?,
        intern_comment: row.try_get("intern_comment")?,
        supervisor_comment: row.try_get("supervisor_comment")?,
        supervisor_rating: rating.map(u8::try_from).transpose()?,
    })
}

fn payroll_from_row(row: &PgRow) -> anyhow::Result<MonthlyPayroll> {
    let year: i32 = row.try_get("year")?;
    let month: i32 = row.try_get("month")?;

    Ok(MonthlyPayroll {
        intern_id: row.try_get("intern_id")?,
        month: MonthKey::new(year, u32::try_from(month)?)?,
        total_hours: row.try_get("total_hours")?,
        gross_pay: row.try_get("gross_pay")?,
        bonus: row.try_get("bonus")?,
        deductions: row.try_get("deductions")?,
        net_pay: row.try_get("net_pay")?,
        paid: row.try_get("paid")?,
        paid_on: row.try_get("paid_on")?,
        notes: row.try_get("notes")?,
    })
}

fn evaluation_from_row(row: &PgRow) -> anyhow::Result<Evaluation> {
    let kind: String = row.try_get("kind")?;
    let score = |column: &str| -> anyhow::Result<u8> {
        let value: i16 = row.try_get(column)?;
        Ok(u8::try_from(value)?)
    };

    Ok(Evaluation {
        id: row.try_get("id")?,
        intern_id: row.try_get("intern_id")?,
        evaluator_id: row.try_get("evaluator_id")?,
        kind: kind.parse()?,
        evaluated_on: row.try_get("evaluated_on")?,
        criteria: Criteria {
            technical_skill: score("technical_skill")?,
            work_quality: score("work_quality")?,
            autonomy: score("autonomy")?,
            communication: score("communication")?,
            punctuality: score("punctuality")?,
        },
        strengths: row.try_get("strengths")?,
        improvements: row.try_get("improvements")?,
        general_comment: row.try_get("general_comment")?,
        future_goals: row.try_get("future_goals")?,
        created_at: row.try_get("created_at")?,
    })
}
