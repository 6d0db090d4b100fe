use std::{future::Future, pin::Pin};

use async_trait::async_trait;
use axum::http::{HeaderMap, HeaderValue};
use reqwest::header;
use serde::de::DeserializeOwned;
use serde_json::json;

use super::{
    blocks_to_markdown,
    models::{Block, ErrorBody, ListResponse, Page},
};
use crate::{
    config::{ConfigError, NotionConfig},
    content::{DocumentStore, Post, published_sorted},
    error::{Error, Result},
};

const NOTION_API: &str = "https://api.notion.com/v1";
const NOTION_VERSION: &str = "2022-06-28";
const PAGE_SIZE: u32 = 100;
/// 子块最大递归深度
const MAX_DEPTH: usize = 4;

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Notion REST API 客户端
///
/// 文章数据库的查询和页面内容读取都经由它完成。
#[derive(Clone)]
pub struct NotionClient {
    client: reqwest::Client,
    base_url: String,
    database_id: String,
}

impl NotionClient {
    /// 使用 [`NotionConfig`] 创建客户端
    pub fn new(config: &NotionConfig) -> Result<Self> {
        Self::with_base_url(config, NOTION_API)
    }

    /// 指定 API 地址，便于接入代理或测试服务
    pub fn with_base_url(config: &NotionConfig, base_url: impl Into<String>) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", config.api_key)).map_err(|_| {
                ConfigError::Invalid("NOTION_API_KEY", "not a valid header value")
            })?,
        );
        headers.insert("Notion-Version", HeaderValue::from_static(NOTION_VERSION));

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
            base_url: base_url.into().trim_end_matches('/').to_string(),
            database_id: config.database_id.clone(),
        })
    }

    /// 查询数据库中的全部页面，按日期倒序
    ///
    /// 发布状态在本地过滤，属性类型（status / select）因数据库而异。
    pub async fn query_pages(&self) -> Result<Vec<Page>> {
        let url = format!("{}/databases/{}/query", self.base_url, self.database_id);
        let mut pages = vec![];
        let mut cursor: Option<String> = None;

        loop {
            let mut body = json!({
                "page_size": PAGE_SIZE,
                "sorts": [{ "property": "Date", "direction": "descending" }],
            });
            if let Some(c) = &cursor {
                body["start_cursor"] = json!(c);
            }

            let resp: ListResponse<Page> =
                read_json(self.client.post(&url).json(&body).send().await?).await?;
            pages.extend(resp.results);

            match resp.next_cursor {
                Some(next) if resp.has_more => cursor = Some(next),
                _ => break,
            }
        }

        tracing::debug!(count = pages.len(), "queried notion database");
        Ok(pages)
    }

    /// 读取某个块的直接子块
    pub async fn block_children(&self, block_id: &str) -> Result<Vec<Block>> {
        let url = format!("{}/blocks/{}/children", self.base_url, block_id);
        let mut blocks = vec![];
        let mut cursor: Option<String> = None;

        loop {
            let mut req = self
                .client
                .get(&url)
                .query(&[("page_size", PAGE_SIZE.to_string())]);
            if let Some(c) = &cursor {
                req = req.query(&[("start_cursor", c)]);
            }

            let resp: ListResponse<Block> = read_json(req.send().await?).await?;
            blocks.extend(resp.results);

            match resp.next_cursor {
                Some(next) if resp.has_more => cursor = Some(next),
                _ => break,
            }
        }

        Ok(blocks)
    }

    /// 递归读取块树
    fn block_tree<'a>(&'a self, block_id: &'a str, depth: usize) -> BoxFuture<'a, Result<Vec<Block>>> {
        Box::pin(async move {
            let mut blocks = self.block_children(block_id).await?;
            if depth >= MAX_DEPTH {
                return Ok(blocks);
            }

            for block in blocks.iter_mut().filter(|b| b.has_children) {
                let id = block.id.clone();
                block.children = self.block_tree(&id, depth + 1).await?;
            }
            Ok(blocks)
        })
    }
}

/// 检查响应状态并解析 JSON
async fn read_json<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp.json().await?);
    }

    let text = resp.text().await.unwrap_or_default();
    let message = match serde_json::from_str::<ErrorBody>(&text) {
        Ok(body) if !body.message.is_empty() => format!("{}: {}", body.code, body.message),
        _ => text,
    };

    Err(Error::Notion {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl DocumentStore for NotionClient {
    async fn query_published(&self) -> Result<Vec<Post>> {
        let posts = self
            .query_pages()
            .await?
            .into_iter()
            .filter_map(Page::into_post)
            .collect();
        Ok(published_sorted(posts))
    }

    async fn page_markdown(&self, page_id: &str) -> Result<String> {
        let blocks = self.block_tree(page_id, 0).await?;
        Ok(blocks_to_markdown(&blocks))
    }
}
