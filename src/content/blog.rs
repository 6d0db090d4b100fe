use std::{path::PathBuf, sync::Arc, time::Duration};

use super::{DocumentStore, LiveSource, Post, PostSource, SnapshotSource, TtlCache};
use crate::config::Mode;

/// 可单独失效的缓存
///
/// - [`CacheTag::Posts`]：文章列表查询缓存
/// - [`CacheTag::PostContent`]：文章正文缓存
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheTag {
    Posts,
    PostContent,
}

impl CacheTag {
    pub const ALL: [CacheTag; 2] = [CacheTag::Posts, CacheTag::PostContent];

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "posts" => Some(CacheTag::Posts),
            "post-content" => Some(CacheTag::PostContent),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CacheTag::Posts => "posts",
            CacheTag::PostContent => "post-content",
        }
    }
}

/// 博客内容入口
///
/// 根据 [`Mode`] 选择文章来源，正文统一经过内容缓存。
/// 上游失败不会向调用方抛出：列表退化为空，正文退化为 `None`。
pub struct Blog {
    mode: Mode,
    store: Arc<dyn DocumentStore>,
    live: Arc<LiveSource>,
    source: Arc<dyn PostSource>,
    content: TtlCache<String, String>,
}

impl Blog {
    pub const CONTENT_TTL: Duration = Duration::from_secs(60 * 60);

    pub fn new(mode: Mode, store: Arc<dyn DocumentStore>, snapshot_path: impl Into<PathBuf>) -> Self {
        let live = Arc::new(LiveSource::new(store.clone()));
        let source: Arc<dyn PostSource> = match mode {
            Mode::Production => Arc::new(SnapshotSource::new(snapshot_path, live.clone())),
            Mode::Development => live.clone(),
        };

        Self {
            mode,
            store,
            live,
            source,
            content: TtlCache::new(Self::CONTENT_TTL),
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn store(&self) -> &dyn DocumentStore {
        self.store.as_ref()
    }

    /// 已发布文章列表，按日期倒序，不含正文
    pub async fn list_published_posts(&self) -> Vec<Post> {
        match self.source.list_published().await {
            Ok(posts) => posts,
            Err(e) => {
                tracing::error!(%e, "failed to list posts");
                vec![]
            }
        }
    }

    /// 指定分类下的已发布文章
    pub async fn posts_in_category(&self, category: &str) -> Vec<Post> {
        self.list_published_posts()
            .await
            .into_iter()
            .filter(|p| p.in_category(category))
            .collect()
    }

    /// 按 slug 获取文章及正文
    ///
    /// 文章不存在时返回 `None`；正文获取失败时返回 `content` 为 `None` 的文章。
    pub async fn post_by_slug(&self, slug: &str) -> Option<Post> {
        let mut post = match self.source.find_by_slug(slug).await {
            Ok(Some(post)) => post,
            Ok(None) => return None,
            Err(e) => {
                tracing::error!(%e, slug, "failed to look up post");
                return None;
            }
        };

        post.content = self.content(&post.id).await;
        Some(post)
    }

    /// 读取正文，未命中时转换并缓存
    pub async fn content(&self, page_id: &str) -> Option<String> {
        if let Some(markdown) = self.content.get(page_id) {
            return Some(markdown);
        }

        match self.store.page_markdown(page_id).await {
            Ok(markdown) => {
                self.content.insert(page_id.to_string(), markdown.clone());
                Some(markdown)
            }
            Err(e) => {
                tracing::warn!(%e, page_id, "no content available");
                None
            }
        }
    }

    /// 使指定缓存失效，`tags` 为空时全部失效
    ///
    /// 返回实际失效的缓存。
    pub fn invalidate(&self, tags: &[CacheTag]) -> Vec<CacheTag> {
        let tags = if tags.is_empty() {
            CacheTag::ALL.to_vec()
        } else {
            let mut unique = Vec::with_capacity(tags.len());
            for tag in tags {
                if !unique.contains(tag) {
                    unique.push(*tag);
                }
            }
            unique
        };

        for tag in &tags {
            match tag {
                CacheTag::Posts => self.live.invalidate(),
                CacheTag::PostContent => self.content.clear(),
            }
        }

        tracing::info!(
            tags = ?tags.iter().map(CacheTag::as_str).collect::<Vec<_>>(),
            "caches invalidated"
        );
        tags
    }
}
