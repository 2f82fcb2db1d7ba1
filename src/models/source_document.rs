// src/models/source_document.rs

use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use validator::Validate;

/// Represents the 'source_documents' table in the database.
/// One uploaded file whose extracted text feeds question generation.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct SourceDocument {
    pub id: i64,
    pub exam_id: i64,
    pub name: String,

    /// Extracted text. NULL when extraction produced nothing; the
    /// orchestrator treats that as an empty string.
    pub text_content: Option<String>,

    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// DTO for attaching a source document to an exam.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateDocumentRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    pub text_content: Option<String>,
}
