use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{LedgerError, Result};
use crate::models::text_enum;

text_enum!(
    EvaluationKind {
        Weekly => "weekly",
        Monthly => "monthly",
        Quarterly => "quarterly",
        Final => "final",
    }
);

/// The five criteria, each scored 1 to 5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Criteria {
    pub technical_skill: u8,
    pub work_quality: u8,
    pub autonomy: u8,
    pub communication: u8,
    pub punctuality: u8,
}

impl Criteria {
    fn scores(&self) -> [(&'static str, u8); 5] {
        [
            ("technical skill", self.technical_skill),
            ("work quality", self.work_quality),
            ("autonomy", self.autonomy),
            ("communication", self.communication),
            ("punctuality", self.punctuality),
        ]
    }

    fn validate(&self) -> Result<()> {
        for (name, score) in self.scores() {
            if !(1..=5).contains(&score) {
                return Err(LedgerError::validation(format!(
                    "{name} score must be between 1 and 5, got {score}"
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct NewEvaluation {
    pub intern_id: Uuid,
    pub evaluator_id: Option<Uuid>,
    pub kind: EvaluationKind,
    pub evaluated_on: NaiveDate,
    pub criteria: Criteria,
    pub strengths: String,
    pub improvements: String,
    pub general_comment: String,
    pub future_goals: String,
}

/// A supervisor's assessment. There is no update path once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub id: Uuid,
    pub intern_id: Uuid,
    pub evaluator_id: Option<Uuid>,
    pub kind: EvaluationKind,
    pub evaluated_on: NaiveDate,
    pub criteria: Criteria,
    pub strengths: String,
    pub improvements: String,
    pub general_comment: String,
    pub future_goals: String,
    pub created_at: DateTime<Utc>,
}

impl Evaluation {
    pub fn new(input: NewEvaluation, now: DateTime<Utc>) -> Result<Self> {
        input.criteria.validate()?;
        Ok(Self {
            id: Uuid::new_v4(),
            intern_id: input.intern_id,
            evaluator_id: input.evaluator_id,
            kind: input.kind,
            evaluated_on: input.evaluated_on,
            criteria: input.criteria,
            strengths: input.strengths,
            improvements: input.improvements,
            general_comment: input.general_comment,
            future_goals: input.future_goals,
            created_at: now,
        })
    }

    pub fn average_score(&self) -> Decimal {
        average_score(&self.criteria)
    }
}

/// Exact mean of the five criteria; rounding is left to presentation.
pub fn average_score(criteria: &Criteria) -> Decimal {
    let total: u32 = criteria.scores().iter().map(|(_, score)| u32::from(*score)).sum();
    Decimal::from(total) / Decimal::from(5u32)
}

pub fn latest_evaluation(evaluations: &[Evaluation]) -> Option<&Evaluation> {
    evaluations
        .iter()
        .max_by(|a, b| {
            a.evaluated_on
                .cmp(&b.evaluated_on)
                .then_with(|| a.created_at.cmp(&b.created_at))
        })
}
