use std::sync::Arc;

use axum::{Json, Router, extract::State, routing::get};
use serde_json::{Value, json};

use crate::{
    cdn::MediaLibrary,
    error::{ApiError, Result},
    state::AppState,
};

/// 路由：
/// - `GET /photos`：相册图片
/// - `GET /projects`：作品集图片和视频
pub fn setup_route() -> Router<AppState> {
    Router::new()
        .route("/photos", get(photos))
        .route("/projects", get(projects))
}

fn library(media: &Option<Arc<MediaLibrary>>) -> Result<&MediaLibrary> {
    media
        .as_deref()
        .ok_or_else(|| ApiError::Misconfigured("Bunny CDN configuration missing").into())
}

async fn photos(State(media): State<Option<Arc<MediaLibrary>>>) -> Result<Json<Value>> {
    let images = library(&media)?.photos().await?;
    Ok(Json(json!({ "images": images })))
}

async fn projects(State(media): State<Option<Arc<MediaLibrary>>>) -> Result<Json<Value>> {
    let media = library(&media)?.projects().await?;
    Ok(Json(json!({ "media": media })))
}
