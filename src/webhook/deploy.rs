use async_trait::async_trait;

use crate::error::{Error, Result};

/// 触发一次完整重新部署
#[async_trait]
pub trait DeployTrigger: Send + Sync {
    async fn trigger(&self) -> Result<()>;
}

/// Vercel deploy hook，向配置的地址发送一个空 POST
#[derive(Clone)]
pub struct DeployHook {
    client: reqwest::Client,
    url: String,
}

impl DeployHook {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
        }
    }
}

#[async_trait]
impl DeployTrigger for DeployHook {
    async fn trigger(&self) -> Result<()> {
        let resp = self.client.post(&self.url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(Error::Upstream {
                service: "deploy hook",
                status: status.as_u16(),
            });
        }

        tracing::info!(%status, "deploy hook triggered");
        Ok(())
    }
}
