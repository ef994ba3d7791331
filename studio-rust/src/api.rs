use crate::{auth::caller_from_headers, server::AppState};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use gameforge::{
    export,
    preview::{PreviewFrame, SandboxPolicy},
    ArtifactField, GenerateTrigger, IgnoreReason, SessionSnapshot, Studio, StudioError,
    WorkspaceView,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Studio(#[from] StudioError),
    #[error("{0}")]
    BadRequest(String),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::Studio(StudioError::Unauthorized) => StatusCode::UNAUTHORIZED,
            Self::Studio(StudioError::NoArtifact | StudioError::ExportUnavailable) => {
                StatusCode::CONFLICT
            }
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        };
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

type ApiResult<T> = Result<T, ApiError>;

/// The signed-in caller's studio.
async fn studio_for(state: &AppState, headers: &HeaderMap) -> ApiResult<Arc<Studio>> {
    state
        .workspaces
        .studio(&caller_from_headers(headers))
        .await
        .ok_or(ApiError::Studio(StudioError::Unauthorized))
}

pub async fn session_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<SessionSnapshot>> {
    let studio = studio_for(&state, &headers).await?;
    Ok(Json(studio.snapshot().await))
}

#[derive(Deserialize)]
pub struct PromptBody {
    prompt: String,
}

pub async fn prompt_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<PromptBody>, JsonRejection>,
) -> ApiResult<Json<SessionSnapshot>> {
    let studio = studio_for(&state, &headers).await?;
    let Json(PromptBody { prompt }) = body?;
    studio.set_prompt(prompt).await;
    Ok(Json(studio.snapshot().await))
}

#[derive(Serialize)]
pub struct GenerateResponse {
    accepted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    ignored_reason: Option<IgnoreReason>,
    session: SessionSnapshot,
}

/// Runs the whole generation before answering. Other requests keep being
/// served while it is pending, and a client that hangs up does not stop it.
pub async fn generate_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<GenerateResponse>> {
    let caller = caller_from_headers(&headers);
    let studio = state
        .workspaces
        .studio(&caller)
        .await
        .ok_or(ApiError::Studio(StudioError::Unauthorized))?;
    let trigger = studio.generate(&caller).await?;
    let ignored_reason = match trigger {
        GenerateTrigger::Completed(_) => None,
        GenerateTrigger::Ignored(reason) => Some(reason),
    };
    Ok(Json(GenerateResponse {
        accepted: ignored_reason.is_none(),
        ignored_reason,
        session: studio.snapshot().await,
    }))
}

#[derive(Deserialize)]
pub struct ViewBody {
    view: WorkspaceView,
}

pub async fn view_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<ViewBody>, JsonRejection>,
) -> ApiResult<Json<SessionSnapshot>> {
    let studio = studio_for(&state, &headers).await?;
    let Json(ViewBody { view }) = body?;
    studio.switch_view(view).await;
    Ok(Json(studio.snapshot().await))
}

#[derive(Deserialize)]
pub struct ArtifactBody {
    value: String,
}

pub async fn artifact_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(field): Path<String>,
    body: Result<Json<ArtifactBody>, JsonRejection>,
) -> ApiResult<Json<SessionSnapshot>> {
    let studio = studio_for(&state, &headers).await?;
    let field: ArtifactField = field.parse().map_err(ApiError::BadRequest)?;
    let Json(ArtifactBody { value }) = body?;
    studio.edit_artifact(field, value).await?;
    Ok(Json(studio.snapshot().await))
}

pub async fn dismiss_error_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<SessionSnapshot>> {
    let studio = studio_for(&state, &headers).await?;
    studio.dismiss_error().await;
    Ok(Json(studio.snapshot().await))
}

const PLACEHOLDER_DOCUMENT: &str = "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n\
<meta charset=\"UTF-8\">\n<title>Game Preview</title>\n<style>\nbody { margin: 0; height: 100vh; \
display: flex; align-items: center; justify-content: center; font-family: sans-serif; \
color: #888; background: #111; }\n</style>\n</head>\n<body>\n<p>Your game will appear here.</p>\n\
</body>\n</html>\n";

/// The preview document, served with the same sandbox its iframe applies.
pub async fn preview_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Response> {
    let studio = studio_for(&state, &headers).await?;
    let (document, policy) = match studio.preview().await {
        PreviewFrame::Sandboxed { document, policy } => (document.to_string(), policy),
        PreviewFrame::Placeholder => (
            PLACEHOLDER_DOCUMENT.to_string(),
            SandboxPolicy::deny_all(),
        ),
    };

    let mut response = html_response(document);
    insert_header(
        &mut response,
        header::CONTENT_SECURITY_POLICY,
        &policy.content_security_policy(),
    );
    Ok(response)
}

pub async fn export_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Response> {
    let studio = studio_for(&state, &headers).await?;
    let file = studio.export().await?;

    let mut response = html_response(file.contents);
    insert_header(
        &mut response,
        header::CONTENT_DISPOSITION,
        &content_disposition(&file.filename),
    );
    Ok(response)
}

/// An attachment header with an ASCII fallback name and the exact name
/// percent-encoded as UTF-8.
fn content_disposition(filename: &str) -> String {
    let fallback: String = filename
        .chars()
        .map(|c| {
            if (c.is_ascii_graphic() && c != '"' && c != '\\') || c == ' ' {
                c
            } else {
                '_'
            }
        })
        .collect();
    let mut encoded = String::with_capacity(filename.len());
    for byte in filename.bytes() {
        if byte.is_ascii_alphanumeric() || b"!#$&+-.^_`|~".contains(&byte) {
            encoded.push(char::from(byte));
        } else {
            encoded.push_str(&format!("%{byte:02X}"));
        }
    }
    format!("attachment; filename=\"{fallback}\"; filename*=UTF-8''{encoded}")
}

fn html_response(body: String) -> Response {
    let mut response = body.into_response();
    insert_header(
        &mut response,
        header::CONTENT_TYPE,
        &format!("{}; charset=utf-8", export::MIME_TYPE),
    );
    insert_header(&mut response, header::CACHE_CONTROL, "no-store");
    response
}

/// Values that are not valid header text are dropped.
fn insert_header(response: &mut Response, name: header::HeaderName, value: &str) {
    match HeaderValue::from_str(value) {
        Ok(value) => {
            response.headers_mut().insert(name, value);
        }
        Err(error) => tracing::warn!(header = %name, %error, "dropping invalid header value"),
    }
}
