// src/models/weak_topic.rs

use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use validator::Validate;

/// Represents the 'weak_topics' table in the database.
/// A topic the progress tracker has flagged as an area of historically
/// poor performance for a user.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct WeakTopic {
    pub id: i64,
    pub user_id: i64,
    pub subject_id: Option<i64>,
    pub title: String,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// DTO for recording a weak topic.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateWeakTopicRequest {
    pub user_id: i64,
    pub subject_id: Option<i64>,
    #[validate(length(min = 1, max = 255))]
    pub title: String,
}
