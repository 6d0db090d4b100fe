use std::{
    io::{self, Write},
    path::Path,
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use super::{DocumentStore, Post, published_sorted};
use crate::error::Result;

/// 静态快照，即 `blog-data.json` 的内容
///
/// 只包含已发布文章的元信息，不含正文。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub generated_at: DateTime<Utc>,
    pub posts: Vec<Post>,
}

impl Snapshot {
    pub fn new(posts: Vec<Post>) -> Self {
        let posts = published_sorted(posts)
            .into_iter()
            .map(|mut p| {
                p.content = None;
                p
            })
            .collect();

        Self {
            generated_at: Utc::now(),
            posts,
        }
    }

    /// 从文档数据库实时生成快照
    pub async fn generate(store: &dyn DocumentStore) -> Result<Self> {
        let posts = store.query_published().await?;
        Ok(Self::new(posts))
    }

    pub async fn read(path: impl AsRef<Path>) -> Result<Self> {
        let bytes = tokio::fs::read(path.as_ref()).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// 写入快照文件
    ///
    /// 每次写入使用独立的临时文件再重命名，读取方不会看到写了一半的文件，
    /// 并发写入互不干扰，最后完成的写入生效。
    pub async fn write(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref().to_path_buf();
        let bytes = serde_json::to_vec_pretty(self)?;

        tokio::task::spawn_blocking(move || write_atomic(&path, &bytes))
            .await
            .map_err(io::Error::other)?
    }

    pub fn find(&self, slug: &str) -> Option<&Post> {
        self.posts
            .iter()
            .find(|p| p.slug == slug && p.is_published())
    }
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    std::fs::create_dir_all(dir)?;

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
