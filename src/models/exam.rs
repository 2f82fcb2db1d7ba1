// src/models/exam.rs

use serde::{Deserialize, Serialize};
use sqlx::{prelude::FromRow, types::Json};
use validator::Validate;

use crate::models::question::{Question, QuestionType};
use crate::models::source_document::CreateDocumentRequest;

/// Lifecycle status of an exam.
/// Mirrors the `exam_status` enum type in the database.
///
/// `pending` is the only state an exam can be claimed from;
/// `generating` marks a claimed, in-flight generation run;
/// `ready` and `failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "exam_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ExamStatus {
    Pending,
    Generating,
    Ready,
    Failed,
}

/// Represents the 'exams' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Exam {
    pub id: i64,

    /// Owning user, if any. Supplied by the caller; authentication is
    /// handled upstream.
    pub user_id: Option<i64>,

    pub subject_id: Option<i64>,

    /// Free-text description of what the exam should cover.
    pub description: String,

    /// Requested number of questions.
    pub question_count: i32,

    /// Requested question kinds, stored as a JSON array.
    pub question_types: Json<Vec<QuestionType>>,

    pub status: ExamStatus,

    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// DTO for creating a new exam. Source documents are attached inline;
/// an exam created without any will fail generation.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateExamRequest {
    pub user_id: Option<i64>,
    pub subject_id: Option<i64>,
    #[validate(length(min = 1, max = 2000))]
    pub description: String,
    #[validate(range(min = 1, max = 50))]
    pub question_count: i32,
    #[validate(length(min = 1, message = "At least one question type is required."))]
    pub question_types: Vec<QuestionType>,
    #[validate(nested)]
    pub documents: Vec<CreateDocumentRequest>,
}

/// DTO for returning an exam together with its generated questions.
#[derive(Debug, Serialize)]
pub struct ExamDetailResponse {
    #[serde(flatten)]
    pub exam: Exam,
    pub questions: Vec<Question>,
}
