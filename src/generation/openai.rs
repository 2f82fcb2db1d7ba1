// src/generation/openai.rs

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::config::Config;
use crate::error::AppError;
use crate::generation::{GenerationRequest, QuestionGenerator};
use crate::models::question::QuestionDraft;

const SYSTEM_PROMPT: &str = r#"You are an experienced accountancy examiner.
Your task is to generate exam questions strictly from the provided study material.
The output must be a valid JSON object containing a 'questions' array.

Rules:
1. Generate exactly the requested number of questions.
2. Only use the allowed question types.
3. Every question object has the fields: 'text', 'type', 'correct_answer', 'options'.
4. For 'multiple_choice', 'options' is an array of 4 answer strings and 'correct_answer' matches one of them exactly.
5. For 'true_false', 'options' is ["true", "false"].
6. For 'open', 'options' is an empty array and 'correct_answer' is a model answer.
7. When weak topics are listed, prefer questions covering those topics where the material allows it.
"#;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Question generator backed by an OpenAI-compatible chat completion
/// endpoint. The base URL and model come from configuration, so any
/// compatible provider works.
pub struct OpenAiGenerator {
    client: Client,
    api_key: String,
    api_base: String,
    model: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DraftPayload {
    questions: Vec<QuestionDraft>,
}

impl OpenAiGenerator {
    pub fn new(config: &Config) -> Self {
        Self {
            client: Client::new(),
            api_key: config.ai_api_key.clone(),
            api_base: config.ai_api_base.clone(),
            model: config.ai_model.clone(),
        }
    }

    fn build_user_message(request: &GenerationRequest) -> String {
        serde_json::json!({
            "study_material": request.context,
            "exam_description": request.description,
            "required_count": request.question_count,
            "allowed_types": request.question_types,
            "weak_topics": request.weak_topics,
        })
        .to_string()
    }
}

/// Parses the model's JSON content into question drafts.
fn parse_questions(content: &str) -> Result<Vec<QuestionDraft>, AppError> {
    let payload: DraftPayload = serde_json::from_str(content).map_err(|e| {
        AppError::InternalServerError(format!("Malformed AI response: {}", e))
    })?;

    Ok(payload.questions)
}

#[async_trait]
impl QuestionGenerator for OpenAiGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<Vec<QuestionDraft>, AppError> {
        let body = serde_json::json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": SYSTEM_PROMPT},
                {"role": "user", "content": Self::build_user_message(request)},
            ],
            "response_format": { "type": "json_object" },
            "temperature": 0.4,
        });

        tracing::debug!(
            "Requesting {} questions from model {} ({} chars of context)",
            request.question_count,
            self.model,
            request.context.len()
        );

        let response = self
            .client
            .post(format!("{}/chat/completions", self.api_base))
            .bearer_auth(&self.api_key)
            .timeout(REQUEST_TIMEOUT)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            return Err(AppError::InternalServerError(format!(
                "AI service returned {}: {}",
                status, detail
            )));
        }

        let chat: ChatResponse = response.json().await?;

        let content = chat
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .ok_or(AppError::InternalServerError(
                "AI response contained no content".to_string(),
            ))?;

        parse_questions(&content)
    }
}
