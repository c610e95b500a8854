//! HTTP route handlers.

use axum::Router;
use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Request, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};

use crate::error::{CollaboratorError, ValidationInputError};
use crate::io::{
    AnalyzeRequest, AnalyzeResponse, BatchReviseRequest, BatchReviseResponse, ErrorResponse,
    ReviseRequest, ReviseResponse,
};
use crate::scoring::evaluate;

use super::{revise_batch, revise_one, AppState};

/// Build the API router.
pub fn api_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/revise", post(revise))
        .route("/batch-revise", post(batch_revise))
        .route("/analyze", post(analyze))
}

/// Handler failure mapped onto an HTTP status
#[derive(Debug)]
pub enum ApiError {
    Input(ValidationInputError),
    /// Body that is not valid JSON or does not fit the request type
    Body(JsonRejection),
    Upstream(CollaboratorError),
}

impl From<ValidationInputError> for ApiError {
    fn from(err: ValidationInputError) -> Self {
        ApiError::Input(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Body(rejection)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            ApiError::Input(e) => (StatusCode::BAD_REQUEST, e.to_string()),
            ApiError::Body(rejection) => (StatusCode::BAD_REQUEST, rejection.body_text()),
            ApiError::Upstream(e) => (StatusCode::BAD_GATEWAY, e.to_string()),
        };
        (status, Json(ErrorResponse { error })).into_response()
    }
}

/// JSON request body; a malformed one is rejected with a JSON 400
#[derive(Debug)]
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(Self(value))
    }
}

async fn health() -> &'static str {
    "ok"
}

/// POST /revise
async fn revise(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<ReviseRequest>,
) -> Result<Json<ReviseResponse>, ApiError> {
    Ok(Json(revise_one(&state.controller, request).await?))
}

/// POST /batch-revise - per-item results in request order
async fn batch_revise(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<BatchReviseRequest>,
) -> Result<Json<BatchReviseResponse>, ApiError> {
    let results = revise_batch(&state, request).await?;
    Ok(Json(BatchReviseResponse { results }))
}

/// POST /analyze - metrics, plus an evaluation when targets are given
async fn analyze(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<AnalyzeRequest>,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    if request.text.trim().is_empty() {
        return Err(ValidationInputError::EmptyText.into());
    }
    let tolerance = request.tolerance(state.controller.config().default_margins)?;

    let metrics = state
        .controller
        .analyze(&request.text)
        .await
        .map_err(ApiError::Upstream)?;
    let evaluation = tolerance
        .map(|tolerance| evaluate(&metrics, &tolerance))
        .transpose()?;

    Ok(Json(AnalyzeResponse::new(metrics, evaluation)))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::{Body, to_bytes};

    use super::*;
    use crate::config::RevisionConfig;
    use crate::controller::{Collaborators, RevisionController};
    use crate::io::MarginOverrides;
    use crate::models::{MetricVector, TargetMetrics};
    use crate::observe::NoopObserver;
    use crate::testing::{FailingGenerator, ScriptedAnalyzer, ScriptedTieBreaker};

    fn state() -> AppState {
        let analyzer = ScriptedAnalyzer::new().with("In band.", MetricVector::new(10.0, 0.5, 0.5));
        let controller = RevisionController::new(
            RevisionConfig::default(),
            Collaborators {
                analyzer: Arc::new(analyzer),
                generator: Arc::new(FailingGenerator::default()),
                tie_breaker: Arc::new(ScriptedTieBreaker::failing()),
            },
            Arc::new(NoopObserver),
        )
        .unwrap();
        AppState::new(controller)
    }

    fn targets() -> TargetMetrics {
        TargetMetrics {
            structural_len: 10.0,
            clause_ratio: 0.5,
            lexical_ratio: 0.5,
        }
    }

    #[tokio::test]
    async fn test_revise_in_band_passage() {
        let request = ReviseRequest {
            request_id: None,
            text: "In band.".to_string(),
            target_metrics: targets(),
            tolerance: MarginOverrides::default(),
        };

        let Json(response) = revise(State(state()), JsonBody(request)).await.unwrap();

        assert!(response.overall_success);
        assert!(!response.revised);
        assert_eq!(response.final_text, "In band.");
        assert_eq!(response.candidates_generated, 0);
    }

    #[tokio::test]
    async fn test_negative_margin_is_bad_request() {
        let request = ReviseRequest {
            request_id: None,
            text: "In band.".to_string(),
            target_metrics: targets(),
            tolerance: MarginOverrides {
                structural_len_abs: Some(-1.0),
                ..MarginOverrides::default()
            },
        };

        let err = revise(State(state()), JsonBody(request)).await.unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    fn post(json: &str) -> Request {
        axum::http::Request::builder()
            .method("POST")
            .uri("/revise")
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_wrongly_typed_margin_is_json_bad_request() {
        let body = r#"{
            "text": "In band.",
            "target_metrics": {"structural_len": 10.0, "clause_ratio": 0.5, "lexical_ratio": 0.5},
            "tolerance": {"structural_len_abs": "wide"}
        }"#;

        let err = JsonBody::<ReviseRequest>::from_request(post(body), &())
            .await
            .unwrap_err();
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let error: ErrorResponse = serde_json::from_slice(&bytes).unwrap();
        assert!(error.error.contains("structural_len_abs"));
    }

    #[tokio::test]
    async fn test_well_formed_body_is_extracted() {
        let body = r#"{
            "text": "In band.",
            "target_metrics": {
                "AVG_SENTENCE_LENGTH": 10.0,
                "clause_ratio": 0.5,
                "lexical_ratio": 0.5
            }
        }"#;

        let JsonBody(request) = JsonBody::<ReviseRequest>::from_request(post(body), &())
            .await
            .unwrap();
        assert_eq!(request.target_metrics.structural_len, 10.0);
        assert_eq!(request.tolerance, MarginOverrides::default());
    }

    #[tokio::test]
    async fn test_analyze_with_targets_includes_detail() {
        let request = AnalyzeRequest {
            text: "In band.".to_string(),
            target_metrics: Some(targets()),
            tolerance: MarginOverrides::default(),
        };

        let Json(response) = analyze(State(state()), JsonBody(request)).await.unwrap();

        assert!(response.evaluation.unwrap().all_pass());
        assert_eq!(response.detailed_result.unwrap().lines().count(), 3);
    }

    #[tokio::test]
    async fn test_analyze_upstream_failure_is_bad_gateway() {
        let request = AnalyzeRequest {
            text: "Unknown passage.".to_string(),
            target_metrics: None,
            tolerance: MarginOverrides::default(),
        };

        let err = analyze(State(state()), JsonBody(request)).await.unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::BAD_GATEWAY);
    }
}
