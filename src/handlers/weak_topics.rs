// src/handlers/weak_topics.rs

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use sqlx::PgPool;
use validator::Validate;

use crate::{
    error::AppError,
    models::weak_topic::{CreateWeakTopicRequest, WeakTopic},
};

/// Records a weak topic for a user.
///
/// Normally written by the progress tracker after a poor exam result;
/// exposed here so that collaborator has a storage endpoint.
pub async fn create_weak_topic(
    State(pool): State<PgPool>,
    Json(payload): Json<CreateWeakTopicRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let topic = sqlx::query_as::<_, WeakTopic>(
        r#"
        INSERT INTO weak_topics (user_id, subject_id, title)
        VALUES ($1, $2, $3)
        RETURNING id, user_id, subject_id, title, created_at
        "#,
    )
    .bind(payload.user_id)
    .bind(payload.subject_id)
    .bind(&payload.title)
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to create weak topic: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok((StatusCode::CREATED, Json(topic)))
}

/// Query parameters for listing weak topics.
#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub user_id: i64,
    pub subject_id: Option<i64>,
}

/// Lists a user's weak topics, optionally narrowed to one subject.
pub async fn list_weak_topics(
    State(pool): State<PgPool>,
    Query(params): Query<ListParams>,
) -> Result<impl IntoResponse, AppError> {
    let topics = sqlx::query_as::<_, WeakTopic>(
        r#"
        SELECT id, user_id, subject_id, title, created_at
        FROM weak_topics
        WHERE user_id = $1
          AND ($2::BIGINT IS NULL OR subject_id = $2)
        ORDER BY id
        "#,
    )
    .bind(params.user_id)
    .bind(params.subject_id)
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to list weak topics: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(Json(topics))
}
