use async_trait::async_trait;
use axum::http::{HeaderMap, HeaderValue};
use chrono::NaiveDateTime;
use serde::Deserialize;

use crate::{
    config::{BunnyConfig, ConfigError},
    error::{Error, Result},
};

/// 存储区中的一个对象
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StorageObject {
    pub object_name: String,
    #[serde(default)]
    pub is_directory: bool,
    #[serde(default)]
    pub length: u64,
    pub last_changed: NaiveDateTime,
}

/// 媒体存储
#[async_trait]
pub trait MediaStorage: Send + Sync {
    /// 列出目录下的对象
    async fn list(&self, folder: &str) -> Result<Vec<StorageObject>>;
}

/// Bunny Storage API 客户端
#[derive(Clone)]
pub struct BunnyStorage {
    client: reqwest::Client,
    endpoint: String,
}

impl BunnyStorage {
    pub fn new(config: &BunnyConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "AccessKey",
            HeaderValue::from_str(&config.api_key).map_err(|_| {
                ConfigError::Invalid("BUNNY_STORAGE_API_KEY", "not a valid header value")
            })?,
        );
        headers.insert("Accept", HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .user_agent(concat!(
                env!("CARGO_PKG_NAME"),
                "/",
                env!("CARGO_PKG_VERSION")
            ))
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            endpoint: format!(
                "https://{}/{}",
                storage_host(config.region.as_deref()),
                config.storage_zone.trim_matches('/')
            ),
        })
    }
}

/// 存储区所在地区对应的主机名，默认（德国）没有前缀
pub fn storage_host(region: Option<&str>) -> String {
    match region.map(str::trim).map(str::to_ascii_lowercase).as_deref() {
        None | Some("") | Some("de") | Some("falkenstein") => "storage.bunnycdn.com".to_string(),
        Some(region) => format!("{region}.storage.bunnycdn.com"),
    }
}

#[async_trait]
impl MediaStorage for BunnyStorage {
    async fn list(&self, folder: &str) -> Result<Vec<StorageObject>> {
        // 目录必须以 `/` 结尾
        let url = format!("{}/{}/", self.endpoint, folder.trim_matches('/'));
        let resp = self.client.get(&url).send().await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(Error::Upstream {
                service: "bunny storage",
                status: status.as_u16(),
            });
        }

        Ok(resp.json().await?)
    }
}
