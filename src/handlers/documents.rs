// src/handlers/documents.rs

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use sqlx::PgPool;
use validator::Validate;

use crate::{
    error::AppError,
    models::{
        exam::ExamStatus,
        source_document::{CreateDocumentRequest, SourceDocument},
    },
};

/// Attaches another source document to an exam.
///
/// Only allowed while the exam is `pending` or `failed`; once a run is
/// in flight or has produced questions, the document set is frozen.
pub async fn attach_document(
    State(pool): State<PgPool>,
    Path(exam_id): Path<i64>,
    Json(payload): Json<CreateDocumentRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let status = sqlx::query_scalar::<_, ExamStatus>("SELECT status FROM exams WHERE id = $1")
        .bind(exam_id)
        .fetch_optional(&pool)
        .await?
        .ok_or(AppError::NotFound("Exam not found".to_string()))?;

    if !matches!(status, ExamStatus::Pending | ExamStatus::Failed) {
        return Err(AppError::Conflict(
            "Documents can only be attached to pending or failed exams".to_string(),
        ));
    }

    let document = sqlx::query_as::<_, SourceDocument>(
        r#"
        INSERT INTO source_documents (exam_id, name, text_content)
        VALUES ($1, $2, $3)
        RETURNING id, exam_id, name, text_content, created_at
        "#,
    )
    .bind(exam_id)
    .bind(&payload.name)
    .bind(&payload.text_content)
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to attach document to exam {}: {:?}", exam_id, e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok((StatusCode::CREATED, Json(document)))
}
