use std::env;

use async_trait::async_trait;
use quiz_core::api::{
    CheckAnswerRequest, ErrorResponse, LoadProgressResponse, QuestionCountResponse,
    ResetProgressRequest, SaveProgressRequest,
};
use quiz_core::model::{AnswerCheck, Identity, OptionKey, Question, QuestionId, SessionSnapshot};
use reqwest::{Client, StatusCode, Url};
use serde::Serialize;
use tracing::debug;

use crate::error::{BackendError, CatalogError, ProgressError};
use crate::remote::{ProgressRemote, QuizBackend};

pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:3000";

#[derive(Clone, Debug)]
pub struct HttpBackendConfig {
    pub base_url: String,
}

impl HttpBackendConfig {
    /// `QUIZ_SERVER_URL`, or the local default when unset or blank.
    #[must_use]
    pub fn from_env() -> Self {
        let base_url = env::var("QUIZ_SERVER_URL")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_SERVER_URL.into());
        Self { base_url }
    }
}

impl Default for HttpBackendConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_SERVER_URL.into(),
        }
    }
}

/// Client for the quiz server's `/api` routes.
#[derive(Clone, Debug)]
pub struct HttpQuizBackend {
    client: Client,
    base: Url,
}

impl HttpQuizBackend {
    /// # Errors
    ///
    /// Returns `BackendError::InvalidUrl` if the base URL does not parse or
    /// cannot carry a path.
    pub fn new(config: &HttpBackendConfig) -> Result<Self, BackendError> {
        let base = Url::parse(config.base_url.trim())
            .map_err(|err| BackendError::InvalidUrl(err.to_string()))?;
        if base.cannot_be_a_base() {
            return Err(BackendError::InvalidUrl(config.base_url.clone()));
        }
        Ok(Self {
            client: Client::new(),
            base,
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, BackendError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| BackendError::InvalidUrl(self.base.to_string()))?
            .pop_if_empty()
            .push("api")
            .extend(segments);
        Ok(url)
    }

    async fn post_progress<B: Serialize + Sync + ?Sized>(
        &self,
        operation: &'static str,
        segments: &[&str],
        body: &B,
    ) -> Result<(), ProgressError> {
        let url = self.endpoint(segments).map_err(|err| ProgressError::Unavailable {
            operation,
            reason: err.to_string(),
        })?;
        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|err| transport_failure(operation, &err))?;
        if !response.status().is_success() {
            return Err(progress_failure(operation, response).await);
        }
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `BackendError` on transport failure or a non-success status.
    pub async fn question_count(&self) -> Result<usize, BackendError> {
        let response = self
            .client
            .get(self.endpoint(&["questions", "count"])?)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(BackendError::HttpStatus(response.status()));
        }
        let body: QuestionCountResponse = response.json().await?;
        Ok(body.count)
    }
}

#[async_trait]
impl QuizBackend for HttpQuizBackend {
    async fn list_questions(&self) -> Result<Vec<Question>, BackendError> {
        let response = self
            .client
            .get(self.endpoint(&["questions"])?)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(BackendError::HttpStatus(response.status()));
        }
        let questions: Vec<Question> = response.json().await?;
        debug!(count = questions.len(), "catalog fetched");
        Ok(questions)
    }

    async fn check_answer(
        &self,
        question_id: &QuestionId,
        answer: OptionKey,
    ) -> Result<AnswerCheck, BackendError> {
        let payload = CheckAnswerRequest {
            question_id: question_id.clone(),
            answer: answer.as_str().to_string(),
        };
        let response = self
            .client
            .post(self.endpoint(&["check-answer"])?)
            .json(&payload)
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => Ok(response.json().await?),
            StatusCode::NOT_FOUND => Err(CatalogError::QuestionNotFound(question_id.clone()).into()),
            status => Err(BackendError::HttpStatus(status)),
        }
    }
}

/// Map a progress-route response status into the bridge's error model:
/// 4xx is the request's fault, everything else means the store is unreachable.
async fn progress_failure(operation: &'static str, response: reqwest::Response) -> ProgressError {
    let status = response.status();
    if status.is_client_error() {
        let message = response
            .json::<ErrorResponse>()
            .await
            .map(|body| body.error)
            .unwrap_or_else(|_| status.to_string());
        return ProgressError::Rejected(message);
    }
    ProgressError::Unavailable {
        operation,
        reason: format!("status {status}"),
    }
}

fn transport_failure(operation: &'static str, err: &reqwest::Error) -> ProgressError {
    ProgressError::Unavailable {
        operation,
        reason: err.to_string(),
    }
}

#[async_trait]
impl ProgressRemote for HttpQuizBackend {
    async fn load(&self, identity: &Identity) -> Result<Option<SessionSnapshot>, ProgressError> {
        const OP: &str = "load_progress";
        let url = self
            .endpoint(&["progress", identity.as_str()])
            .map_err(|err| ProgressError::Unavailable {
                operation: OP,
                reason: err.to_string(),
            })?;
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|err| transport_failure(OP, &err))?;
        if !response.status().is_success() {
            return Err(progress_failure(OP, response).await);
        }
        let body: LoadProgressResponse = response
            .json()
            .await
            .map_err(|err| transport_failure(OP, &err))?;
        Ok(body.snapshot.filter(|_| body.exists))
    }

    async fn save(
        &self,
        identity: &Identity,
        source_tag: Option<&str>,
        snapshot: &SessionSnapshot,
    ) -> Result<(), ProgressError> {
        let payload = SaveProgressRequest {
            identity: Some(identity.as_str().to_string()),
            source_tag: source_tag.map(str::to_string),
            snapshot: Some(snapshot.clone()),
        };
        self.post_progress("save_progress", &["progress", "save"], &payload)
            .await
    }

    async fn reset(&self, identity: &Identity) -> Result<(), ProgressError> {
        let payload = ResetProgressRequest {
            identity: Some(identity.as_str().to_string()),
        };
        self.post_progress("reset_progress", &["progress", "reset"], &payload)
            .await
    }
}
