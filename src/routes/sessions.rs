use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::Router;
use eye_gesture_core::{DetectorConfig, LandmarkSet};
use serde::Deserialize;

use crate::extractors::JsonBody;
use crate::response::{created, ok, AppError};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_session))
        .route("/:id", get(get_session).delete(delete_session))
        .route("/:id/frames", post(submit_frame))
        .route("/:id/reset", post(reset_session))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionRequest {
    /// 缺省字段取服务端默认值
    #[serde(default)]
    pub config: Option<DetectorConfig>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameRequest {
    /// `null` / 缺省表示本帧未检测到人脸
    #[serde(default)]
    pub landmarks: Option<Vec<Vec<f64>>>,
}

pub async fn create_session(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<CreateSessionRequest>,
) -> Result<impl IntoResponse, AppError> {
    let entry = state.sessions().create(req.config).await?;
    Ok(created(entry.status().await))
}

pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let entry = state.sessions().get(&id).await?;
    Ok(ok(entry.status().await))
}

pub async fn submit_frame(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(req): JsonBody<FrameRequest>,
) -> Result<impl IntoResponse, AppError> {
    let entry = state.sessions().get(&id).await?;
    let landmarks = req
        .landmarks
        .as_deref()
        .map(LandmarkSet::from_rows)
        .transpose()?;
    let outcome = entry.process_frame(landmarks).await?;
    Ok(ok(outcome))
}

pub async fn reset_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let entry = state.sessions().get(&id).await?;
    Ok(ok(entry.reset().await))
}

pub async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    state.sessions().remove(&id).await?;
    Ok(ok(serde_json::json!({ "id": id, "removed": true })))
}
