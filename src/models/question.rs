// src/models/question.rs

use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;

/// The kinds of questions the generator can produce.
/// Mirrors the `question_kind` enum type in the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "question_kind", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    MultipleChoice,
    TrueFalse,
    Open,
}

/// Represents the 'questions' table in the database.
///
/// Rows are created in bulk by the generation orchestrator and never
/// mutated afterwards.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Question {
    pub id: i64,

    /// The exam this question belongs to.
    pub exam_id: i64,

    /// The text content of the question.
    pub text: String,

    pub question_type: QuestionType,

    /// The correct answer key or content.
    pub correct_answer: String,

    /// Answer options. Shape depends on `question_type`:
    /// a string array for multiple choice, empty for open questions.
    pub options: sqlx::types::Json<serde_json::Value>,

    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// A question as returned by the AI generation service, before it has
/// been persisted and assigned an id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionDraft {
    pub text: String,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    pub correct_answer: String,
    #[serde(default)]
    pub options: serde_json::Value,
}
