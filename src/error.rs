use std::io;

use axum::{Json, http::StatusCode, response::IntoResponse};
use serde_json::json;

use crate::config::ConfigError;

pub type Result<T> = core::result::Result<T, Error>;

/// 直接映射为 HTTP 状态码的业务错误
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Not Found")]
    NotFound,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("{0}")]
    BadRequest(&'static str),

    /// 可选集成（如 CDN）未配置或返回空结果
    #[error("{0}")]
    Misconfigured(&'static str),

    /// 可选集成（如 CDN）请求失败，原因已记录在日志中
    #[error("{0}")]
    Unavailable(&'static str),
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Notion API 返回了非成功状态
    #[error("notion api error: {status} {message}")]
    Notion { status: u16, message: String },

    /// 其他上游服务（CDN 存储、deploy hook）返回了非成功状态
    #[error("{service} error: {status}")]
    Upstream { service: &'static str, status: u16 },

    #[error(transparent)]
    Reqwest(#[from] reqwest::Error),

    #[error(transparent)]
    Serde(#[from] serde_json::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    ApiError(#[from] ApiError),

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl IntoResponse for Error {
    fn into_response(self) -> axum::response::Response {
        match self {
            Error::Notion { status, message } => {
                tracing::error!(status, %message, "notion api error");
                (StatusCode::BAD_GATEWAY, "Bad Gateway").into_response()
            }
            Error::Upstream { service, status } => {
                tracing::error!(service, status, "upstream error");
                (StatusCode::BAD_GATEWAY, "Bad Gateway").into_response()
            }
            Error::Reqwest(e) => {
                tracing::error!(%e, "upstream request error");
                (StatusCode::BAD_GATEWAY, "Bad Gateway").into_response()
            }
            Error::ApiError(api_error) => match api_error {
                ApiError::NotFound => (StatusCode::NOT_FOUND, "NOT FOUND").into_response(),
                ApiError::Unauthorized => (
                    StatusCode::UNAUTHORIZED,
                    Json(json!({ "success": false, "error": "Unauthorized" })),
                )
                    .into_response(),
                ApiError::BadRequest(s) => (
                    StatusCode::BAD_REQUEST,
                    Json(json!({ "success": false, "error": s })),
                )
                    .into_response(),
                ApiError::Misconfigured(s) => {
                    tracing::error!(reason = s, "integration misconfigured");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        Json(json!({ "error": s })),
                    )
                        .into_response()
                }
                ApiError::Unavailable(s) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": s })),
                )
                    .into_response(),
            },
            Error::Serde(e) => (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
            Error::Config(e) => {
                tracing::error!(%e, "configuration error");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
            }
            Error::Io(e) => {
                tracing::error!(%e, "file io error");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
            }
        }
    }
}
