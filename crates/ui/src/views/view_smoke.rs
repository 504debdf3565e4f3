use std::sync::Arc;

use async_trait::async_trait;
use quiz_core::model::{AnswerCheck, Identity, OptionKey, Question, QuestionId};
use services::{
    BackendError, BootOutcome, ProgressBridge, QuizBackend, QuizLoopService, QuizPhase,
};
use storage::repository::InMemoryRepository;

use super::test_harness::{catalog, remote_store, setup_quiz_harness, setup_with_quiz_loop};
use crate::vm::QuizIntent;

struct OfflineBackend;

#[async_trait]
impl QuizBackend for OfflineBackend {
    async fn list_questions(&self) -> Result<Vec<Question>, BackendError> {
        Err(BackendError::InvalidUrl("offline".to_string()))
    }

    async fn check_answer(
        &self,
        _question_id: &QuestionId,
        _answer: OptionKey,
    ) -> Result<AnswerCheck, BackendError> {
        Err(BackendError::InvalidUrl("offline".to_string()))
    }
}

#[tokio::test(flavor = "current_thread")]
async fn quiz_view_smoke_renders_first_question() {
    let mut harness = setup_quiz_harness(catalog(3), remote_store());
    harness.rebuild();
    let html = harness
        .drive_until(|html| html.contains("Question 1 of 3"))
        .await;

    assert!(html.contains("Question 1 of 3"), "missing progress in {html}");
    assert!(html.contains("Question number"), "missing question text in {html}");
    assert!(html.contains("quiz-option-A"), "missing option in {html}");
    assert!(html.contains("Save progress"), "missing account form in {html}");
    assert!(!html.contains("Welcome back"), "unexpected resume prompt in {html}");

    // The inbound tag was captured on boot.
    assert_eq!(
        harness.quiz_loop.bridge().source_tag().await.as_deref(),
        Some("newsletter")
    );
}

#[tokio::test(flavor = "current_thread")]
async fn quiz_view_smoke_shows_feedback_after_answer() {
    let mut harness = setup_quiz_harness(catalog(3), remote_store());
    harness.rebuild();
    harness
        .drive_until(|html| html.contains("Question 1 of 3"))
        .await;

    harness.dispatch(QuizIntent::Select(OptionKey::A));
    let html = harness.drive_until(|html| html.contains("Correct!")).await;

    assert!(html.contains("Correct!"), "missing feedback in {html}");
    assert!(html.contains("Score: 1/1"), "missing score in {html}");
    assert!(harness.handles.render().can_next);
}

#[tokio::test(flavor = "current_thread")]
async fn quiz_view_smoke_links_search_after_wrong_answer() {
    let mut harness = setup_quiz_harness(catalog(3), remote_store());
    harness.rebuild();
    harness
        .drive_until(|html| html.contains("Question 1 of 3"))
        .await;

    harness.dispatch(QuizIntent::Select(OptionKey::B));
    let html = harness
        .drive_until(|html| html.contains("Search this topic"))
        .await;

    assert!(html.contains("Incorrect. The correct answer is A."), "missing feedback in {html}");
    assert!(
        html.contains("https://www.google.com/search?q=Regularization+Question+number"),
        "missing search link in {html}"
    );
}

#[tokio::test(flavor = "current_thread")]
async fn quiz_view_smoke_renders_resume_prompt() {
    let backend = catalog(4);
    let remote = remote_store();
    let identity = Identity::parse("ada@example.com").unwrap();

    // Another device answers once and signs in.
    let laptop = QuizLoopService::new(
        backend.clone(),
        ProgressBridge::new(Arc::new(InMemoryRepository::new()), remote.clone()),
    );
    let BootOutcome::Ready(mut boot) = laptop.boot(None).await.unwrap() else {
        panic!("expected a fresh boot");
    };
    laptop
        .submit_answer(&mut boot.session, OptionKey::A)
        .await
        .unwrap();
    laptop
        .sign_in(&mut boot.session, identity.as_str())
        .await
        .unwrap();

    let mut harness = setup_quiz_harness(backend, remote);
    harness.quiz_loop.bridge().remember_identity(&identity).await;
    harness.rebuild();
    let html = harness
        .drive_until(|html| html.contains("Welcome back"))
        .await;

    assert!(html.contains("Welcome back"), "missing resume prompt in {html}");
    assert!(html.contains("1 of 4 questions answered"), "missing count in {html}");
    assert_eq!(harness.handles.render().phase, QuizPhase::Reconciling);

    harness.dispatch(QuizIntent::AcceptResume);
    let html = harness
        .drive_until(|html| !html.contains("Welcome back"))
        .await;
    assert!(html.contains("Progress saved for ada@example.com"), "missing identity in {html}");
    assert!(html.contains("Score: 1/1"), "missing resumed score in {html}");
}

#[tokio::test(flavor = "current_thread")]
async fn quiz_view_smoke_renders_error_state() {
    let bridge = ProgressBridge::new(Arc::new(InMemoryRepository::new()), remote_store());
    let quiz_loop = Arc::new(QuizLoopService::new(Arc::new(OfflineBackend), bridge));
    let mut harness = setup_with_quiz_loop(quiz_loop);
    harness.rebuild();
    let html = harness.drive_until(|html| html.contains("Retry")).await;

    assert!(html.contains("Could not reach the quiz server"), "missing error in {html}");
    assert!(html.contains("Retry"), "missing retry in {html}");
}
