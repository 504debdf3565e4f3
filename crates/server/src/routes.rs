use axum::Json;
use axum::Router;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::routing::{get, post};
use quiz_core::api::{
    CheckAnswerRequest, LoadProgressResponse, QuestionCountResponse, ResetProgressRequest,
    SaveProgressRequest, SuccessResponse,
};
use quiz_core::model::{AnswerCheck, Question};
use services::ProgressService;
use tracing::{debug, info};

use crate::error::ApiError;
use crate::state::AppState;

/// All routes, mounted under `/api`.
pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/questions", get(list_questions))
        .route("/questions/count", get(question_count))
        .route("/check-answer", post(check_answer))
        .route("/progress/save", post(save_progress))
        .route("/progress/reset", post(reset_progress))
        .route("/progress/{identity}", get(load_progress));

    Router::new().nest("/api", api).with_state(state)
}

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| ApiError::InvalidBody(rejection.body_text()))
}

async fn list_questions(State(state): State<AppState>) -> Json<Vec<Question>> {
    Json(state.catalog.list_public())
}

async fn question_count(State(state): State<AppState>) -> Json<QuestionCountResponse> {
    Json(QuestionCountResponse {
        count: state.catalog.count(),
    })
}

async fn check_answer(
    State(state): State<AppState>,
    payload: Result<Json<CheckAnswerRequest>, JsonRejection>,
) -> Result<Json<AnswerCheck>, ApiError> {
    let request = body(payload)?;
    let check = state
        .catalog
        .check_answer(&request.question_id, &request.answer)?;
    debug!(question = %request.question_id, correct = check.correct, "answer checked");
    Ok(Json(check))
}

async fn save_progress(
    State(state): State<AppState>,
    payload: Result<Json<SaveProgressRequest>, JsonRejection>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let request = body(payload)?;
    state.progress.save_request(request).await?;
    Ok(Json(SuccessResponse::OK))
}

async fn load_progress(
    State(state): State<AppState>,
    Path(identity): Path<String>,
) -> Result<Json<LoadProgressResponse>, ApiError> {
    let identity = ProgressService::require_identity(Some(&identity))?;
    let snapshot = state.progress.load(&identity).await?;
    Ok(Json(LoadProgressResponse::from_snapshot(snapshot)))
}

async fn reset_progress(
    State(state): State<AppState>,
    payload: Result<Json<ResetProgressRequest>, JsonRejection>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let request = body(payload)?;
    let identity = ProgressService::require_identity(request.identity.as_deref())?;
    state.progress.reset(&identity).await?;
    info!("progress reset");
    Ok(Json(SuccessResponse::OK))
}
