use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use axum_extra::extract::Query;
use chrono::Utc;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::{
    content::CacheTag,
    error::{ApiError, Error, Result},
    state::AppState,
    webhook::{VerificationStore, WebhookPayload, authorize},
};

/// 路由：
/// - `GET|POST /revalidate`：失效缓存
/// - `POST /webhook/notion`：内容变更通知
/// - `GET|POST /webhook/notion/verify`：验证令牌的存取
pub fn setup_route() -> Router<AppState> {
    Router::new()
        .route("/revalidate", get(revalidate).post(revalidate))
        .route("/webhook/notion", post(notion_webhook))
        .route(
            "/webhook/notion/verify",
            get(latest_verification).post(store_verification),
        )
}

/// 查询参数，`tag` 可重复，也可用逗号分隔
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RevalidateParams {
    tag: Vec<String>,
}

impl RevalidateParams {
    fn tags(&self) -> Result<Vec<CacheTag>> {
        self.tag
            .iter()
            .flat_map(|t| t.split(','))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(|t| {
                CacheTag::parse(t)
                    .ok_or_else(|| Error::from(ApiError::BadRequest("Unknown cache tag")))
            })
            .collect()
    }
}

/// 失效缓存
///
/// 先校验密钥，再解析查询参数。
async fn revalidate(
    State(app): State<AppState>,
    headers: HeaderMap,
    uri: Uri,
) -> Result<Json<Value>> {
    authorize(&headers, app.webhook_secret())?;

    let Query(params) = Query::<RevalidateParams>::try_from_uri(&uri)
        .map_err(|_| ApiError::BadRequest("Invalid query string"))?;
    let tags = params.tags()?;
    let invalidated = app.revalidator().revalidate(&tags);

    let names = invalidated
        .iter()
        .map(CacheTag::as_str)
        .collect::<Vec<_>>()
        .join(", ");
    let message = match app.public_host() {
        Some(host) => format!("Revalidated {names} on {host}"),
        None => format!("Revalidated {names}"),
    };

    Ok(Json(json!({
        "success": true,
        "message": message,
        "timestamp": Utc::now().timestamp_millis(),
    })))
}

/// 内容变更通知
///
/// 携带验证令牌的请求只保存令牌，不需要密钥；其他请求校验密钥后执行全部失效动作。
async fn notion_webhook(
    State(app): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response> {
    let payload = WebhookPayload::parse(&body);

    if let Some(token) = payload.as_ref().ok().and_then(|p| p.verification_token()) {
        app.verification().store(token);
        tracing::info!("received webhook verification token");
        return Ok(Json(json!({
            "success": true,
            "message": "Verification token received",
        }))
        .into_response());
    }

    authorize(&headers, app.webhook_secret())?;

    let payload = payload.map_err(|_| ApiError::BadRequest("Invalid JSON body"))?;
    tracing::info!(event = ?payload.event_type, "content change received");

    let outcome = app.revalidator().content_changed().await;
    if outcome.is_success() {
        return Ok(Json(json!({ "success": true, "actions": outcome.actions })).into_response());
    }

    Ok((
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({
            "success": false,
            "actions": outcome.actions,
            "error": outcome.errors.join("; "),
        })),
    )
        .into_response())
}

async fn store_verification(
    State(store): State<VerificationStore>,
    body: Bytes,
) -> Result<Json<Value>> {
    let payload =
        WebhookPayload::parse(&body).map_err(|_| ApiError::BadRequest("Invalid JSON body"))?;
    let token = payload
        .verification_token()
        .ok_or(ApiError::BadRequest("Missing verification_token"))?;

    store.store(token);
    tracing::info!("stored verification token");
    Ok(Json(json!({ "success": true })))
}

async fn latest_verification(State(store): State<VerificationStore>) -> Json<Value> {
    match store.latest() {
        Some(stored) => Json(json!({
            "token": stored.token,
            "receivedAt": stored.received_at,
            "ageSeconds": stored.age_seconds(Utc::now()),
        })),
        None => Json(json!({ "token": null })),
    }
}
