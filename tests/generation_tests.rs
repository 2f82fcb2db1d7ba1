// tests/generation_tests.rs
//
// Exercises the generation orchestrator end to end against in-memory
// collaborators, so no database or AI service is needed.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use examgen::error::AppError;
use examgen::generation::{
    ExamStore, GenerationRequest, GenerationService, QuestionGenerator, RunOutcome, WeaknessSource,
};
use examgen::models::exam::{Exam, ExamStatus};
use examgen::models::question::{QuestionDraft, QuestionType};
use examgen::models::source_document::SourceDocument;
use examgen::models::weak_topic::WeakTopic;

/// In-memory exam storage tracking the status transitions a run makes.
struct MockStore {
    exam: Option<Exam>,
    documents: Vec<SourceDocument>,
    status: Mutex<ExamStatus>,
    inserted: Mutex<Vec<QuestionDraft>>,
    load_count: Mutex<usize>,
    fail_complete: bool,
}

impl MockStore {
    fn new(exam: Exam, documents: Vec<SourceDocument>) -> Self {
        Self {
            exam: Some(exam),
            documents,
            status: Mutex::new(ExamStatus::Pending),
            inserted: Mutex::new(Vec::new()),
            load_count: Mutex::new(0),
            fail_complete: false,
        }
    }

    fn status(&self) -> ExamStatus {
        *self.status.lock().unwrap()
    }

    fn inserted_count(&self) -> usize {
        self.inserted.lock().unwrap().len()
    }

    fn load_count(&self) -> usize {
        *self.load_count.lock().unwrap()
    }
}

#[async_trait]
impl ExamStore for MockStore {
    async fn claim(&self, _exam_id: i64) -> Result<bool, AppError> {
        let mut status = self.status.lock().unwrap();
        if *status == ExamStatus::Pending {
            *status = ExamStatus::Generating;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    async fn load_exam(&self, exam_id: i64) -> Result<(Exam, Vec<SourceDocument>), AppError> {
        *self.load_count.lock().unwrap() += 1;
        let exam = self
            .exam
            .clone()
            .ok_or(AppError::NotFound(format!("Exam {} not found", exam_id)))?;
        Ok((exam, self.documents.clone()))
    }

    async fn complete(&self, _exam_id: i64, questions: &[QuestionDraft]) -> Result<(), AppError> {
        if self.fail_complete {
            // The real store is transactional: a failed finalize leaves
            // no questions behind.
            return Err(AppError::InternalServerError("insert failed".to_string()));
        }
        self.inserted.lock().unwrap().extend_from_slice(questions);
        *self.status.lock().unwrap() = ExamStatus::Ready;
        Ok(())
    }

    async fn mark_failed(&self, _exam_id: i64) -> Result<(), AppError> {
        *self.status.lock().unwrap() = ExamStatus::Failed;
        Ok(())
    }
}

/// Records every request it receives; answers with canned drafts.
struct MockGenerator {
    drafts: Vec<QuestionDraft>,
    fail: bool,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl MockGenerator {
    fn with_drafts(drafts: Vec<QuestionDraft>) -> Self {
        Self {
            drafts,
            fail: false,
            requests: Mutex::new(Vec::new()),
        }
    }

    fn failing() -> Self {
        Self {
            drafts: Vec::new(),
            fail: true,
            requests: Mutex::new(Vec::new()),
        }
    }

    fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl QuestionGenerator for MockGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<Vec<QuestionDraft>, AppError> {
        self.requests.lock().unwrap().push(request.clone());
        if self.fail {
            return Err(AppError::InternalServerError("AI quota exceeded".to_string()));
        }
        Ok(self.drafts.clone())
    }
}

struct MockWeaknesses {
    topics: Vec<WeakTopic>,
    fail: bool,
    calls: Mutex<usize>,
}

impl MockWeaknesses {
    fn with_topics(topics: Vec<WeakTopic>) -> Self {
        Self {
            topics,
            fail: false,
            calls: Mutex::new(0),
        }
    }

    fn failing() -> Self {
        Self {
            topics: Vec::new(),
            fail: true,
            calls: Mutex::new(0),
        }
    }

    fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl WeaknessSource for MockWeaknesses {
    async fn weak_topics_for(&self, _user_id: i64) -> Result<Vec<WeakTopic>, AppError> {
        *self.calls.lock().unwrap() += 1;
        if self.fail {
            return Err(AppError::InternalServerError(
                "progress tracker unavailable".to_string(),
            ));
        }
        Ok(self.topics.clone())
    }
}

fn exam(id: i64, user_id: Option<i64>, subject_id: Option<i64>) -> Exam {
    Exam {
        id,
        user_id,
        subject_id,
        description: "Covers the attached material".to_string(),
        question_count: 5,
        question_types: sqlx::types::Json(vec![QuestionType::MultipleChoice, QuestionType::Open]),
        status: ExamStatus::Pending,
        created_at: None,
    }
}

fn document(id: i64, exam_id: i64, text: Option<&str>) -> SourceDocument {
    SourceDocument {
        id,
        exam_id,
        name: format!("upload-{}.pdf", id),
        text_content: text.map(|t| t.to_string()),
        created_at: None,
    }
}

fn weak_topic(title: &str, subject_id: Option<i64>) -> WeakTopic {
    WeakTopic {
        id: 0,
        user_id: 5,
        subject_id,
        title: title.to_string(),
        created_at: None,
    }
}

fn draft(text: &str) -> QuestionDraft {
    QuestionDraft {
        text: text.to_string(),
        question_type: QuestionType::MultipleChoice,
        correct_answer: "A".to_string(),
        options: serde_json::json!(["A", "B", "C", "D"]),
    }
}

fn service(
    store: Arc<MockStore>,
    generator: Arc<MockGenerator>,
    weaknesses: Arc<MockWeaknesses>,
) -> GenerationService {
    GenerationService::new(store, generator, weaknesses)
}

#[tokio::test]
async fn successful_run_persists_all_questions_and_marks_ready() {
    let store = Arc::new(MockStore::new(
        exam(1, Some(5), None),
        vec![document(1, 1, Some("Ledger basics"))],
    ));
    let generator = Arc::new(MockGenerator::with_drafts(vec![
        draft("Q1"),
        draft("Q2"),
        draft("Q3"),
    ]));
    let weaknesses = Arc::new(MockWeaknesses::with_topics(vec![]));

    let outcome = service(store.clone(), generator, weaknesses)
        .run(1)
        .await;

    assert_eq!(
        outcome,
        RunOutcome::Ready {
            questions: 3,
            enrichment_failure: None
        }
    );
    assert_eq!(store.status(), ExamStatus::Ready);
    assert_eq!(store.inserted_count(), 3);
}

#[tokio::test]
async fn exam_without_documents_ends_failed_with_no_questions() {
    let store = Arc::new(MockStore::new(exam(1, None, None), vec![]));
    let generator = Arc::new(MockGenerator::with_drafts(vec![draft("Q1")]));
    let weaknesses = Arc::new(MockWeaknesses::with_topics(vec![]));

    let outcome = service(store.clone(), generator.clone(), weaknesses)
        .run(1)
        .await;

    assert!(matches!(outcome, RunOutcome::Failed { .. }));
    assert_eq!(store.status(), ExamStatus::Failed);
    assert_eq!(store.inserted_count(), 0);
    assert!(generator.requests().is_empty());
}

#[tokio::test]
async fn weak_topics_are_filtered_by_exam_subject() {
    let store = Arc::new(MockStore::new(
        exam(42, Some(5), Some(7)),
        vec![
            document(1, 42, Some("Chapter 1...")),
            document(2, 42, Some("Chapter 2...")),
        ],
    ));
    let generator = Arc::new(MockGenerator::with_drafts(vec![draft("Q1")]));
    let weaknesses = Arc::new(MockWeaknesses::with_topics(vec![
        weak_topic("Depreciation", Some(7)),
        weak_topic("Contracts", Some(9)),
    ]));

    service(store, generator.clone(), weaknesses).run(42).await;

    let requests = generator.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].weak_topics, vec!["Depreciation"]);
    assert_eq!(requests[0].context, "Chapter 1...\n\n---\n\nChapter 2...");
}

#[tokio::test]
async fn all_weak_topics_are_included_without_exam_subject() {
    let store = Arc::new(MockStore::new(
        exam(1, Some(5), None),
        vec![document(1, 1, Some("text"))],
    ));
    let generator = Arc::new(MockGenerator::with_drafts(vec![draft("Q1")]));
    let weaknesses = Arc::new(MockWeaknesses::with_topics(vec![
        weak_topic("Depreciation", Some(7)),
        weak_topic("Contracts", Some(9)),
    ]));

    service(store, generator.clone(), weaknesses).run(1).await;

    assert_eq!(
        generator.requests()[0].weak_topics,
        vec!["Depreciation", "Contracts"]
    );
}

#[tokio::test]
async fn weak_topic_fetch_failure_degrades_instead_of_failing() {
    let store = Arc::new(MockStore::new(
        exam(1, Some(5), Some(7)),
        vec![document(1, 1, Some("text"))],
    ));
    let generator = Arc::new(MockGenerator::with_drafts(vec![draft("Q1")]));
    let weaknesses = Arc::new(MockWeaknesses::failing());

    let outcome = service(store.clone(), generator.clone(), weaknesses)
        .run(1)
        .await;

    match outcome {
        RunOutcome::Ready {
            questions,
            enrichment_failure,
        } => {
            assert_eq!(questions, 1);
            assert!(enrichment_failure.is_some());
        }
        other => panic!("expected Ready, got {:?}", other),
    }
    assert_eq!(store.status(), ExamStatus::Ready);
    assert!(generator.requests()[0].weak_topics.is_empty());
}

#[tokio::test]
async fn anonymous_exam_skips_weak_topic_fetch() {
    let store = Arc::new(MockStore::new(
        exam(1, None, None),
        vec![document(1, 1, Some("text"))],
    ));
    let generator = Arc::new(MockGenerator::with_drafts(vec![draft("Q1")]));
    let weaknesses = Arc::new(MockWeaknesses::with_topics(vec![weak_topic(
        "Depreciation",
        Some(7),
    )]));

    service(store, generator.clone(), weaknesses.clone())
        .run(1)
        .await;

    assert_eq!(weaknesses.calls(), 0);
    assert!(generator.requests()[0].weak_topics.is_empty());
}

#[tokio::test]
async fn empty_document_text_still_gets_separators() {
    let store = Arc::new(MockStore::new(
        exam(1, None, None),
        vec![
            document(1, 1, Some("A")),
            document(2, 1, Some("")),
            document(3, 1, Some("B")),
        ],
    ));
    let generator = Arc::new(MockGenerator::with_drafts(vec![draft("Q1")]));
    let weaknesses = Arc::new(MockWeaknesses::with_topics(vec![]));

    service(store, generator.clone(), weaknesses).run(1).await;

    assert_eq!(generator.requests()[0].context, "A\n\n---\n\n\n\n---\n\nB");
}

#[tokio::test]
async fn ai_failure_marks_exam_failed_without_questions() {
    let store = Arc::new(MockStore::new(
        exam(1, None, None),
        vec![document(1, 1, Some("text"))],
    ));
    let generator = Arc::new(MockGenerator::failing());
    let weaknesses = Arc::new(MockWeaknesses::with_topics(vec![]));

    let outcome = service(store.clone(), generator, weaknesses).run(1).await;

    assert!(matches!(outcome, RunOutcome::Failed { .. }));
    assert_eq!(store.status(), ExamStatus::Failed);
    assert_eq!(store.inserted_count(), 0);
}

#[tokio::test]
async fn finalize_failure_marks_exam_failed() {
    let mut store = MockStore::new(exam(1, None, None), vec![document(1, 1, Some("text"))]);
    store.fail_complete = true;
    let store = Arc::new(store);
    let generator = Arc::new(MockGenerator::with_drafts(vec![draft("Q1")]));
    let weaknesses = Arc::new(MockWeaknesses::with_topics(vec![]));

    let outcome = service(store.clone(), generator, weaknesses).run(1).await;

    assert!(matches!(outcome, RunOutcome::Failed { .. }));
    assert_eq!(store.status(), ExamStatus::Failed);
    assert_eq!(store.inserted_count(), 0);
}

#[tokio::test]
async fn duplicate_delivery_is_skipped_by_the_claim() {
    let store = Arc::new(MockStore::new(
        exam(1, None, None),
        vec![document(1, 1, Some("text"))],
    ));
    let generator = Arc::new(MockGenerator::with_drafts(vec![draft("Q1")]));
    let weaknesses = Arc::new(MockWeaknesses::with_topics(vec![]));
    let service = service(store.clone(), generator.clone(), weaknesses);

    let first = service.run(1).await;
    assert!(matches!(first, RunOutcome::Ready { .. }));

    // Re-delivery of the same event: exam is no longer pending.
    let second = service.run(1).await;
    assert_eq!(second, RunOutcome::Skipped);
    assert_eq!(store.load_count(), 1);
    assert_eq!(generator.requests().len(), 1);
    assert_eq!(store.inserted_count(), 1);
}

#[tokio::test]
async fn missing_exam_is_marked_failed_via_store() {
    let mut store = MockStore::new(exam(1, None, None), vec![document(1, 1, Some("text"))]);
    store.exam = None;
    let store = Arc::new(store);
    let generator = Arc::new(MockGenerator::with_drafts(vec![draft("Q1")]));
    let weaknesses = Arc::new(MockWeaknesses::with_topics(vec![]));

    let outcome = service(store.clone(), generator, weaknesses).run(1).await;

    assert!(matches!(outcome, RunOutcome::Failed { .. }));
    assert_eq!(store.status(), ExamStatus::Failed);
}
