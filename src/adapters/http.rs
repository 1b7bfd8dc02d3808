//! HTTP inbound adapter: one multipart endpoint that runs the pipeline.

use crate::application::orchestrator::OrchestratorService;
use crate::application::source::{SourceStore, SourceVideo};
use crate::domain::options::ProcessingOptions;
use crate::domain::outcome::RunResult;
use crate::error::{PipelineError, Rejection};
use crate::ports::engine::TranscodeExecutor;
use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

pub struct AppState<E> {
    pub orchestrator: Arc<OrchestratorService<E>>,
    pub store: SourceStore,
}

impl<E> Clone for AppState<E> {
    fn clone(&self) -> Self {
        Self {
            orchestrator: self.orchestrator.clone(),
            store: self.store.clone(),
        }
    }
}

/// JSON body of every `/process-video` answer.
#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProcessResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub segments: Option<usize>,
    /// 1-based clip numbers that failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_segments: Option<Vec<usize>>,
}

impl ProcessResponse {
    fn completed(segments: usize) -> Self {
        Self {
            success: true,
            message: "Video processing completed".to_string(),
            segments: Some(segments),
            failed_segments: None,
        }
    }

    fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            segments: None,
            failed_segments: None,
        }
    }
}

type Reply = (StatusCode, Json<ProcessResponse>);

pub fn router<E>(state: AppState<E>) -> Router
where
    E: TranscodeExecutor + 'static,
{
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/process-video", post(process_video::<E>))
        // The staging ceiling is enforced while streaming to disk.
        .layer(DefaultBodyLimit::disable())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn process_video<E>(State(state): State<AppState<E>>, mut multipart: Multipart) -> Reply
where
    E: TranscodeExecutor + 'static,
{
    let mut source: Option<SourceVideo> = None;
    let mut options: Option<ProcessingOptions> = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                discard(&mut source).await;
                return reply(StatusCode::BAD_REQUEST, ProcessResponse::failed(e.body_text()));
            }
        };

        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some("video") if source.is_none() => {
                let file_name = field.file_name().unwrap_or("upload").to_owned();
                let content_type = field.content_type().map(str::to_owned);
                match state.store.stage(&file_name, content_type.as_deref(), field).await {
                    Ok(staged) => source = Some(staged),
                    Err(e) => {
                        discard(&mut source).await;
                        return error_reply(e);
                    }
                }
            }
            // Checked on arrival, before any later video is staged.
            Some("options") => match field.text().await {
                Ok(text) => match ProcessingOptions::from_json(Some(&text)) {
                    Ok(parsed) => options = Some(parsed),
                    Err(e) => {
                        discard(&mut source).await;
                        return error_reply(e);
                    }
                },
                Err(e) => {
                    discard(&mut source).await;
                    return reply(StatusCode::BAD_REQUEST, ProcessResponse::failed(e.body_text()));
                }
            },
            _ => continue,
        }
    }

    let Some(mut source) = source else {
        return reply(
            StatusCode::BAD_REQUEST,
            ProcessResponse::failed("No video file uploaded"),
        );
    };

    let options = options.unwrap_or_default();

    info!(
        quality = %options.quality,
        segment_duration = options.segment_duration,
        aspect_ratio = %options.aspect_ratio,
        "processing upload"
    );

    match state.orchestrator.run(&mut source, &options).await {
        Ok(report) => match report.result() {
            RunResult::Success(segments) => reply(StatusCode::OK, ProcessResponse::completed(segments)),
            RunResult::Failure(cause) => {
                let failed = report.failures().map(|(s, _)| s.clip_number()).collect();
                let (status, Json(body)) = error_reply(PipelineError::EngineFailure(cause));
                reply(
                    status,
                    ProcessResponse {
                        failed_segments: Some(failed),
                        ..body
                    },
                )
            }
        },
        Err(e) => error_reply(e),
    }
}

async fn discard(source: &mut Option<SourceVideo>) {
    if let Some(source) = source.as_mut() {
        source.cleanup().await;
    }
}

fn reply(status: StatusCode, body: ProcessResponse) -> Reply {
    (status, Json(body))
}

fn error_reply(e: PipelineError) -> Reply {
    let status = match &e {
        PipelineError::RejectedInput(Rejection::TooLarge { .. }) => StatusCode::PAYLOAD_TOO_LARGE,
        e if e.is_client_error() => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status.is_server_error() {
        error!(error = %e, "error processing video");
    }
    reply(status, ProcessResponse::failed(e.to_string()))
}
