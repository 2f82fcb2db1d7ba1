// src/generation/mod.rs

//! Asynchronous exam generation.
//!
//! `GenerationService` coordinates one generation run per exam: claim the
//! exam, assemble a context blob from its source documents, enrich the
//! prompt with the owner's weak topics, delegate question generation to
//! the AI service, then persist questions and flip the exam status in a
//! single transaction.
//!
//! Collaborators are injected as trait objects so the orchestration logic
//! can be exercised without Postgres or a network.

pub mod openai;
pub mod orchestrator;
pub mod store;

pub use orchestrator::{GenerationService, RunOutcome};

use async_trait::async_trait;

use crate::error::AppError;
use crate::models::exam::Exam;
use crate::models::question::{QuestionDraft, QuestionType};
use crate::models::source_document::SourceDocument;
use crate::models::weak_topic::WeakTopic;

/// Everything the AI service needs to produce questions for one exam.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    /// Concatenated text of all source documents.
    pub context: String,
    pub description: String,
    pub question_count: i32,
    pub question_types: Vec<QuestionType>,
    /// Titles of the owner's weak topics, already filtered by subject.
    pub weak_topics: Vec<String>,
}

/// Outcome of the best-effort weak-topic enrichment step.
///
/// A fetch failure is recorded here instead of aborting the run, so the
/// degradation is observable rather than silently swallowed.
#[derive(Debug, Clone, Default)]
pub struct Enrichment {
    pub topics: Vec<String>,
    pub failure: Option<String>,
}

/// Persistence seam for the orchestrator.
#[async_trait]
pub trait ExamStore: Send + Sync {
    /// Conditionally move the exam from `pending` to `generating`.
    /// Returns false when the exam is missing or already claimed, in
    /// which case the run must not proceed.
    async fn claim(&self, exam_id: i64) -> Result<bool, AppError>;

    /// Fetch the exam together with its source documents.
    async fn load_exam(&self, exam_id: i64) -> Result<(Exam, Vec<SourceDocument>), AppError>;

    /// Persist all generated questions and mark the exam `ready`,
    /// atomically. The exam must never be `ready` while its questions
    /// are only partially written.
    async fn complete(&self, exam_id: i64, questions: &[QuestionDraft]) -> Result<(), AppError>;

    /// Best-effort terminal failure marker.
    async fn mark_failed(&self, exam_id: i64) -> Result<(), AppError>;
}

/// The AI generation service, treated as a black box: it either returns
/// an ordered sequence of question drafts or fails as a whole.
#[async_trait]
pub trait QuestionGenerator: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> Result<Vec<QuestionDraft>, AppError>;
}

/// Read side of the progress tracker.
#[async_trait]
pub trait WeaknessSource: Send + Sync {
    async fn weak_topics_for(&self, user_id: i64) -> Result<Vec<WeakTopic>, AppError>;
}
