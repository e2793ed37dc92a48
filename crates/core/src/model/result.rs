use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::ids::SubjectId;
use crate::scoring::score_percent;

/// Coarse grading of a score percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ScoreBand {
    /// 80% and above.
    Excellent,
    /// 60% to 79%.
    Passing,
    Failing,
}

impl ScoreBand {
    #[must_use]
    pub fn from_percent(percent: u32) -> Self {
        match percent {
            80.. => Self::Excellent,
            60..=79 => Self::Passing,
            _ => Self::Failing,
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Excellent => "excellent",
            Self::Passing => "passing",
            Self::Failing => "failing",
        }
    }
}

/// Outcome of one submitted attempt, appended to the exam history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamResult {
    #[serde(default = "Uuid::new_v4")]
    attempt_id: Uuid,
    subject_id: SubjectId,
    subject_name: String,
    correct_count: u32,
    total_questions: u32,
    #[serde(alias = "score")]
    score_percent: u32,
    #[serde(alias = "timeSpent")]
    time_spent_seconds: u32,
    #[serde(alias = "timestamp")]
    completed_at: DateTime<Utc>,
    #[serde(default, alias = "usingMockData")]
    using_fallback_data: bool,
}

impl ExamResult {
    /// Build a result; the percentage is derived from the counts.
    #[must_use]
    pub fn new(
        subject_id: SubjectId,
        subject_name: impl Into<String>,
        correct_count: u32,
        total_questions: u32,
        time_spent_seconds: u32,
        completed_at: DateTime<Utc>,
        using_fallback_data: bool,
    ) -> Self {
        let correct_count = correct_count.min(total_questions);
        Self {
            attempt_id: Uuid::new_v4(),
            subject_id,
            subject_name: subject_name.into(),
            correct_count,
            total_questions,
            score_percent: score_percent(correct_count, total_questions),
            time_spent_seconds,
            completed_at,
            using_fallback_data,
        }
    }

    /// Same attempt with counts taken from an authoritative grader.
    #[must_use]
    pub fn with_counts(&self, correct_count: u32, total_questions: u32) -> Self {
        let correct_count = correct_count.min(total_questions);
        Self {
            correct_count,
            total_questions,
            score_percent: score_percent(correct_count, total_questions),
            ..self.clone()
        }
    }

    #[must_use]
    pub fn attempt_id(&self) -> Uuid {
        self.attempt_id
    }

    #[must_use]
    pub fn subject_id(&self) -> SubjectId {
        self.subject_id
    }

    #[must_use]
    pub fn subject_name(&self) -> &str {
        &self.subject_name
    }

    #[must_use]
    pub fn correct_count(&self) -> u32 {
        self.correct_count
    }

    #[must_use]
    pub fn total_questions(&self) -> u32 {
        self.total_questions
    }

    #[must_use]
    pub fn incorrect_count(&self) -> u32 {
        self.total_questions.saturating_sub(self.correct_count)
    }

    #[must_use]
    pub fn score_percent(&self) -> u32 {
        self.score_percent
    }

    #[must_use]
    pub fn band(&self) -> ScoreBand {
        ScoreBand::from_percent(self.score_percent)
    }

    #[must_use]
    pub fn time_spent_seconds(&self) -> u32 {
        self.time_spent_seconds
    }

    #[must_use]
    pub fn completed_at(&self) -> DateTime<Utc> {
        self.completed_at
    }

    #[must_use]
    pub fn using_fallback_data(&self) -> bool {
        self.using_fallback_data
    }
}
