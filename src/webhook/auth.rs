use axum::http::{HeaderMap, header};
use subtle::ConstantTimeEq;

use crate::error::ApiError;

/// 校验 `Authorization: Bearer <secret>`
///
/// 未配置密钥时拒绝所有请求。比较使用常量时间。
pub fn authorize(headers: &HeaderMap, secret: Option<&str>) -> Result<(), ApiError> {
    let Some(secret) = secret else {
        tracing::warn!("webhook secret not configured, rejecting request");
        return Err(ApiError::Unauthorized);
    };

    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or(ApiError::Unauthorized)?;

    if bool::from(token.as_bytes().ct_eq(secret.as_bytes())) {
        Ok(())
    } else {
        Err(ApiError::Unauthorized)
    }
}
