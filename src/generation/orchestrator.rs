// src/generation/orchestrator.rs

use std::sync::Arc;

use crate::error::AppError;
use crate::generation::{Enrichment, ExamStore, GenerationRequest, QuestionGenerator, WeaknessSource};
use crate::models::exam::Exam;
use crate::models::source_document::SourceDocument;
use crate::models::weak_topic::WeakTopic;

/// Separator between documents in the assembled context, so the model
/// can tell where one source ends and the next begins.
const DOCUMENT_SEPARATOR: &str = "\n\n---\n\n";

/// Terminal result of one generation run.
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    /// The exam was not `pending` (missing, already claimed, or already
    /// terminal). Nothing was touched.
    Skipped,
    /// Questions persisted and the exam marked `ready`.
    Ready {
        questions: usize,
        /// Reason the weak-topic enrichment degraded, if it did.
        enrichment_failure: Option<String>,
    },
    /// The exam was marked `failed` (best-effort).
    Failed { reason: String },
}

/// Orchestrates one exam generation run end to end.
///
/// Invoked once per exam-creation event (or explicit regenerate). The
/// conditional claim in `run` makes duplicate deliveries for the same
/// exam id no-ops instead of racing the bulk insert.
pub struct GenerationService {
    store: Arc<dyn ExamStore>,
    generator: Arc<dyn QuestionGenerator>,
    weaknesses: Arc<dyn WeaknessSource>,
}

impl GenerationService {
    pub fn new(
        store: Arc<dyn ExamStore>,
        generator: Arc<dyn QuestionGenerator>,
        weaknesses: Arc<dyn WeaknessSource>,
    ) -> Self {
        Self {
            store,
            generator,
            weaknesses,
        }
    }

    /// Runs generation for one exam and returns its terminal status.
    ///
    /// Exactly two terminal states are reachable once the claim
    /// succeeds: `ready` on full success, `failed` on any error. There
    /// is no retry; a failed exam is regenerated by an explicit API
    /// call.
    pub async fn run(&self, exam_id: i64) -> RunOutcome {
        match self.store.claim(exam_id).await {
            Ok(true) => {}
            Ok(false) => {
                tracing::info!("Exam {} is not pending, skipping generation", exam_id);
                return RunOutcome::Skipped;
            }
            Err(e) => {
                tracing::error!("Failed to claim exam {}: {}", exam_id, e);
                return RunOutcome::Skipped;
            }
        }

        match self.execute(exam_id).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!("Generation for exam {} failed: {}", exam_id, e);
                if let Err(mark_err) = self.store.mark_failed(exam_id).await {
                    // Nothing more we can do; the exam stays `generating`
                    // and is user-visible as never becoming ready.
                    tracing::error!(
                        "Failed to mark exam {} as failed: {}",
                        exam_id,
                        mark_err
                    );
                }
                RunOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }

    /// The fallible part of a run. Every error here routes to the single
    /// failure handler in `run`.
    async fn execute(&self, exam_id: i64) -> Result<RunOutcome, AppError> {
        let (exam, documents) = self.store.load_exam(exam_id).await?;

        if documents.is_empty() {
            return Err(AppError::NotFound(format!(
                "Exam {} has no source documents",
                exam_id
            )));
        }

        let enrichment = self.enrich(&exam).await;
        let context = assemble_context(&documents);

        tracing::info!(
            "Generating {} questions for exam {} ({} documents, {} weak topics)",
            exam.question_count,
            exam_id,
            documents.len(),
            enrichment.topics.len()
        );

        let request = GenerationRequest {
            context,
            description: exam.description.clone(),
            question_count: exam.question_count,
            question_types: exam.question_types.0.clone(),
            weak_topics: enrichment.topics.clone(),
        };

        let drafts = self.generator.generate(&request).await?;

        self.store.complete(exam_id, &drafts).await?;

        tracing::info!("Exam {} ready with {} questions", exam_id, drafts.len());

        Ok(RunOutcome::Ready {
            questions: drafts.len(),
            enrichment_failure: enrichment.failure,
        })
    }

    /// Best-effort weak-topic enrichment. A fetch failure degrades to an
    /// empty topic list with the reason recorded; it never fails the run.
    async fn enrich(&self, exam: &Exam) -> Enrichment {
        let Some(user_id) = exam.user_id else {
            return Enrichment::default();
        };

        match self.weaknesses.weak_topics_for(user_id).await {
            Ok(topics) => Enrichment {
                topics: filter_topics(topics, exam.subject_id),
                failure: None,
            },
            Err(e) => {
                tracing::warn!(
                    "Weak-topic fetch failed for user {} (exam {}): {}",
                    user_id,
                    exam.id,
                    e
                );
                Enrichment {
                    topics: Vec::new(),
                    failure: Some(e.to_string()),
                }
            }
        }
    }
}

/// Concatenates document texts into a single context blob. Missing text
/// is treated as empty, and documents keep their separator either way.
pub fn assemble_context(documents: &[SourceDocument]) -> String {
    documents
        .iter()
        .map(|d| d.text_content.as_deref().unwrap_or(""))
        .collect::<Vec<_>>()
        .join(DOCUMENT_SEPARATOR)
}

/// Keeps only topics matching the exam's subject, or all topics when the
/// exam has none.
pub fn filter_topics(topics: Vec<WeakTopic>, subject_id: Option<i64>) -> Vec<String> {
    topics
        .into_iter()
        .filter(|t| match subject_id {
            Some(subject) => t.subject_id == Some(subject),
            None => true,
        })
        .map(|t| t.title)
        .collect()
}
