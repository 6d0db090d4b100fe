mod auth;
mod deploy;
mod revalidate;
mod verification;

use serde::Deserialize;

pub use self::{
    auth::authorize,
    deploy::{DeployHook, DeployTrigger},
    revalidate::{Actions, Outcome, Revalidator},
    verification::{StoredToken, VerificationStore},
};

/// Notion webhook 请求体
///
/// 首次订阅时只包含 `verification_token`；之后是内容变更事件。
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct WebhookPayload {
    pub verification_token: Option<String>,
    #[serde(rename = "type")]
    pub event_type: Option<String>,
}

impl WebhookPayload {
    /// 空请求体视为空事件
    pub fn parse(body: &[u8]) -> serde_json::Result<Self> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        serde_json::from_slice(body)
    }

    pub fn verification_token(&self) -> Option<&str> {
        self.verification_token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }
}
