// src/handlers/exams.rs

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use sqlx::{PgPool, Postgres, QueryBuilder};
use validator::Validate;

use crate::{
    error::AppError,
    generation::GenerationService,
    models::{
        exam::{CreateExamRequest, Exam, ExamDetailResponse},
        question::Question,
    },
};

/// Creates a new exam in `pending` state, attaches its inline source
/// documents, and kicks off generation on a background task.
///
/// The response returns immediately; clients poll `GET /api/exams/{id}`
/// until the status turns `ready` or `failed`.
pub async fn create_exam(
    State(pool): State<PgPool>,
    State(generator): State<Arc<GenerationService>>,
    Json(payload): Json<CreateExamRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let mut tx = pool.begin().await?;

    let exam = sqlx::query_as::<_, Exam>(
        r#"
        INSERT INTO exams (user_id, subject_id, description, question_count, question_types)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id, user_id, subject_id, description, question_count,
                  question_types, status, created_at
        "#,
    )
    .bind(payload.user_id)
    .bind(payload.subject_id)
    .bind(&payload.description)
    .bind(payload.question_count)
    .bind(sqlx::types::Json(&payload.question_types))
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| {
        tracing::error!("Failed to create exam: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    if !payload.documents.is_empty() {
        let mut query_builder = QueryBuilder::<Postgres>::new(
            "INSERT INTO source_documents (exam_id, name, text_content) ",
        );
        query_builder.push_values(&payload.documents, |mut b, doc| {
            b.push_bind(exam.id)
                .push_bind(&doc.name)
                .push_bind(&doc.text_content);
        });
        query_builder.build().execute(&mut *tx).await?;
    }

    tx.commit().await?;

    let exam_id = exam.id;
    tokio::spawn(async move {
        generator.run(exam_id).await;
    });

    Ok((StatusCode::CREATED, Json(exam)))
}

/// Query parameters for listing exams.
#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub user_id: Option<i64>,
}

/// Lists exams, optionally filtered by owning user.
pub async fn list_exams(
    State(pool): State<PgPool>,
    Query(params): Query<ListParams>,
) -> Result<impl IntoResponse, AppError> {
    let exams = sqlx::query_as::<_, Exam>(
        r#"
        SELECT id, user_id, subject_id, description, question_count,
               question_types, status, created_at
        FROM exams
        WHERE ($1::BIGINT IS NULL OR user_id = $1)
        ORDER BY id DESC
        "#,
    )
    .bind(params.user_id)
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to list exams: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(Json(exams))
}

/// Retrieves a single exam together with its generated questions.
pub async fn get_exam(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let exam = sqlx::query_as::<_, Exam>(
        r#"
        SELECT id, user_id, subject_id, description, question_count,
               question_types, status, created_at
        FROM exams
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(&pool)
    .await?
    .ok_or(AppError::NotFound("Exam not found".to_string()))?;

    let questions = sqlx::query_as::<_, Question>(
        r#"
        SELECT id, exam_id, text, question_type, correct_answer, options, created_at
        FROM questions
        WHERE exam_id = $1
        ORDER BY id
        "#,
    )
    .bind(id)
    .fetch_all(&pool)
    .await?;

    Ok(Json(ExamDetailResponse { exam, questions }))
}

/// Re-triggers generation for a `failed` exam.
///
/// The conditional `failed -> pending` reset plays the same role as the
/// orchestrator's claim: of several concurrent regenerate calls, only
/// one resets the row and spawns a run.
pub async fn regenerate_exam(
    State(pool): State<PgPool>,
    State(generator): State<Arc<GenerationService>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let result = sqlx::query("UPDATE exams SET status = 'pending' WHERE id = $1 AND status = 'failed'")
        .bind(id)
        .execute(&pool)
        .await?;

    if result.rows_affected() == 0 {
        let exists = sqlx::query("SELECT id FROM exams WHERE id = $1")
            .bind(id)
            .fetch_optional(&pool)
            .await?;

        return match exists {
            None => Err(AppError::NotFound("Exam not found".to_string())),
            Some(_) => Err(AppError::Conflict(
                "Only failed exams can be regenerated".to_string(),
            )),
        };
    }

    // Stale questions from an earlier run would otherwise be appended to.
    sqlx::query("DELETE FROM questions WHERE exam_id = $1")
        .bind(id)
        .execute(&pool)
        .await?;

    tokio::spawn(async move {
        generator.run(id).await;
    });

    Ok(Json(serde_json::json!({
        "id": id,
        "status": "pending",
        "message": "Regeneration started"
    })))
}
