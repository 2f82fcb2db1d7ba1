// src/generation/store.rs

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::error::AppError;
use crate::generation::{ExamStore, WeaknessSource};
use crate::models::exam::Exam;
use crate::models::question::QuestionDraft;
use crate::models::source_document::SourceDocument;
use crate::models::weak_topic::WeakTopic;

/// Postgres-backed persistence for the orchestrator.
pub struct PgExamStore {
    pool: PgPool,
}

impl PgExamStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ExamStore for PgExamStore {
    async fn claim(&self, exam_id: i64) -> Result<bool, AppError> {
        // Conditional transition is the idempotency guard: only one of
        // any concurrent deliveries for the same exam id wins this row.
        let result = sqlx::query(
            "UPDATE exams SET status = 'generating' WHERE id = $1 AND status = 'pending'",
        )
        .bind(exam_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn load_exam(&self, exam_id: i64) -> Result<(Exam, Vec<SourceDocument>), AppError> {
        let exam = sqlx::query_as::<_, Exam>(
            r#"
            SELECT id, user_id, subject_id, description, question_count,
                   question_types, status, created_at
            FROM exams
            WHERE id = $1
            "#,
        )
        .bind(exam_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::NotFound(format!("Exam {} not found", exam_id)))?;

        let documents = sqlx::query_as::<_, SourceDocument>(
            r#"
            SELECT id, exam_id, name, text_content, created_at
            FROM source_documents
            WHERE exam_id = $1
            ORDER BY id
            "#,
        )
        .bind(exam_id)
        .fetch_all(&self.pool)
        .await?;

        Ok((exam, documents))
    }

    async fn complete(&self, exam_id: i64, questions: &[QuestionDraft]) -> Result<(), AppError> {
        // Bulk insert and status flip share one transaction: the exam is
        // never `ready` with a partial question set.
        let mut tx = self.pool.begin().await?;

        if !questions.is_empty() {
            let mut query_builder = QueryBuilder::<Postgres>::new(
                "INSERT INTO questions (exam_id, text, question_type, correct_answer, options) ",
            );
            query_builder.push_values(questions, |mut b, q| {
                b.push_bind(exam_id)
                    .push_bind(&q.text)
                    .push_bind(q.question_type)
                    .push_bind(&q.correct_answer)
                    .push_bind(sqlx::types::Json(&q.options));
            });
            query_builder.build().execute(&mut *tx).await?;
        }

        sqlx::query("UPDATE exams SET status = 'ready' WHERE id = $1")
            .bind(exam_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(())
    }

    async fn mark_failed(&self, exam_id: i64) -> Result<(), AppError> {
        sqlx::query("UPDATE exams SET status = 'failed' WHERE id = $1")
            .bind(exam_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

/// Postgres-backed read side of the progress tracker.
pub struct PgWeaknessSource {
    pool: PgPool,
}

impl PgWeaknessSource {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl WeaknessSource for PgWeaknessSource {
    async fn weak_topics_for(&self, user_id: i64) -> Result<Vec<WeakTopic>, AppError> {
        let topics = sqlx::query_as::<_, WeakTopic>(
            r#"
            SELECT id, user_id, subject_id, title, created_at
            FROM weak_topics
            WHERE user_id = $1
            ORDER BY id
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(topics)
    }
}
