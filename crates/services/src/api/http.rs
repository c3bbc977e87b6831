use async_trait::async_trait;
use quiz_core::model::{AnswerSheet, Quiz, QuizId};
use quiz_core::scoring::GradeReport;
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use tracing::debug;
use url::Url;

use super::wire::{decode_catalog, decode_grade};
use super::{QuizCatalog, QuizGrader};
use crate::config::{ApiConfig, UserContext};
use crate::error::QuizApiError;

const CATALOG_PATH: &str = "api/quizzes";
const GRADE_PATH: &str = "api/check-quiz";
const HEALTH_PATH: &str = "health";

/// reqwest-backed client for the quiz backend.
///
/// Implements both [`QuizCatalog`] and [`QuizGrader`].
#[derive(Clone, Debug)]
pub struct HttpQuizApi {
    client: Client,
    base_url: Url,
    user: UserContext,
}

impl HttpQuizApi {
    /// # Errors
    ///
    /// Returns `QuizApiError::Http` if the HTTP client cannot be built.
    pub fn new(config: &ApiConfig, user: UserContext) -> Result<Self, QuizApiError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            user,
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Checks the backend's `/health` endpoint.
    ///
    /// # Errors
    ///
    /// Returns `QuizApiError` when the backend is unreachable or not healthy.
    pub async fn health(&self) -> Result<(), QuizApiError> {
        #[derive(Deserialize)]
        struct Health {
            status: String,
        }

        let response = self.client.get(self.endpoint(HEALTH_PATH)?).send().await?;
        let body = ensure_success(response)?.bytes().await?;
        let health: Health = serde_json::from_slice(&body)?;
        if health.status.eq_ignore_ascii_case("ok") {
            Ok(())
        } else {
            Err(QuizApiError::InvalidResponse(format!(
                "backend reports status {}",
                health.status
            )))
        }
    }

    fn endpoint(&self, path: &str) -> Result<Url, QuizApiError> {
        Ok(self.base_url.join(path)?)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match self.user.access_token() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

fn ensure_success(response: Response) -> Result<Response, QuizApiError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(QuizApiError::HttpStatus(status))
    }
}

#[async_trait]
impl QuizCatalog for HttpQuizApi {
    async fn list_quizzes(&self) -> Result<Vec<Quiz>, QuizApiError> {
        let url = self.endpoint(CATALOG_PATH)?;
        debug!(%url, "fetching quiz catalog");
        let response = self.authorize(self.client.get(url)).send().await?;
        let body = ensure_success(response)?.bytes().await?;
        decode_catalog(&body)
    }
}

#[async_trait]
impl QuizGrader for HttpQuizApi {
    async fn grade(
        &self,
        quiz_id: &QuizId,
        answers: &AnswerSheet,
    ) -> Result<GradeReport, QuizApiError> {
        let url = self.endpoint(GRADE_PATH)?;
        let encoded = serde_json::to_string(answers)?;
        debug!(%url, quiz_id = %quiz_id, answers = %encoded, "submitting answers");

        let request = self
            .client
            .get(url)
            .query(&[("video_id", quiz_id.as_str()), ("answers", encoded.as_str())]);
        let response = self.authorize(request).send().await?;
        let body = ensure_success(response)?.bytes().await?;
        decode_grade(&body)
    }
}
