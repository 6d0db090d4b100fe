use std::{path::PathBuf, sync::Arc, time::Duration};

use async_trait::async_trait;

use super::{Post, Snapshot, TtlCache, published_sorted};
use crate::error::Result;

/// 文档数据库
///
/// 文章由外部数据库持有，这里只读。
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// 查询所有文章的元信息（不含正文）
    async fn query_published(&self) -> Result<Vec<Post>>;

    /// 将指定页面的内容转换为 Markdown
    async fn page_markdown(&self, page_id: &str) -> Result<String>;
}

/// 文章来源
///
/// - [`LiveSource`]：实时查询文档数据库
/// - [`SnapshotSource`]：读取静态快照，失败时回退到 [`LiveSource`]
#[async_trait]
pub trait PostSource: Send + Sync {
    /// 已发布文章，按日期倒序
    async fn list_published(&self) -> Result<Vec<Post>>;

    /// 按 slug 查找已发布文章的元信息
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Post>>;
}

const LISTING_KEY: &str = "published";

/// 实时查询数据库，查询结果缓存较短时间以限制上游请求量
pub struct LiveSource {
    store: Arc<dyn DocumentStore>,
    listing: TtlCache<&'static str, Vec<Post>>,
}

impl LiveSource {
    pub const LISTING_TTL: Duration = Duration::from_secs(15 * 60);

    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self::with_ttl(store, Self::LISTING_TTL)
    }

    pub fn with_ttl(store: Arc<dyn DocumentStore>, ttl: Duration) -> Self {
        Self {
            store,
            listing: TtlCache::new(ttl),
        }
    }

    /// 丢弃缓存的查询结果
    pub fn invalidate(&self) {
        self.listing.clear();
    }
}

#[async_trait]
impl PostSource for LiveSource {
    async fn list_published(&self) -> Result<Vec<Post>> {
        if let Some(posts) = self.listing.get(LISTING_KEY) {
            return Ok(posts);
        }

        let posts = published_sorted(self.store.query_published().await?);
        tracing::debug!(count = posts.len(), "queried live posts");
        self.listing.insert(LISTING_KEY, posts.clone());
        Ok(posts)
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Post>> {
        Ok(self
            .list_published()
            .await?
            .into_iter()
            .find(|p| p.slug == slug))
    }
}

/// 读取静态快照，任何读取错误都会回退到实时查询
///
/// 快照每次请求都重新读取，外部重新生成后立即生效。
pub struct SnapshotSource {
    path: PathBuf,
    live: Arc<LiveSource>,
}

impl SnapshotSource {
    pub fn new(path: impl Into<PathBuf>, live: Arc<LiveSource>) -> Self {
        Self {
            path: path.into(),
            live,
        }
    }
}

#[async_trait]
impl PostSource for SnapshotSource {
    async fn list_published(&self) -> Result<Vec<Post>> {
        match Snapshot::read(&self.path).await {
            Ok(snapshot) => Ok(published_sorted(snapshot.posts)),
            Err(e) => {
                tracing::warn!(%e, path = %self.path.display(), "snapshot unavailable, querying live");
                self.live.list_published().await
            }
        }
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Post>> {
        match Snapshot::read(&self.path).await {
            Ok(snapshot) => match snapshot.find(slug) {
                Some(post) => Ok(Some(post.clone())),
                None => {
                    // 快照可能落后于数据库
                    tracing::debug!(slug, "slug not in snapshot, querying live");
                    self.live.find_by_slug(slug).await
                }
            },
            Err(e) => {
                tracing::warn!(%e, path = %self.path.display(), "snapshot unavailable, querying live");
                self.live.find_by_slug(slug).await
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::{
        Mutex,
        atomic::{AtomicUsize, Ordering},
    };

    use crate::{
        content::{PostStatus, post::tests::post},
        error::Error,
    };

    use super::*;

    /// 内存中的文档数据库，记录调用次数
    #[derive(Default)]
    pub(crate) struct FakeStore {
        pub posts: Mutex<Vec<Post>>,
        pub bodies: Mutex<Vec<(String, String)>>,
        pub queries: AtomicUsize,
        pub conversions: AtomicUsize,
        pub fail: bool,
    }

    impl FakeStore {
        pub(crate) fn with_posts(posts: Vec<Post>) -> Self {
            let bodies = posts
                .iter()
                .map(|p| (p.id.clone(), format!("# {}", p.title)))
                .collect();
            Self {
                posts: Mutex::new(posts),
                bodies: Mutex::new(bodies),
                ..Default::default()
            }
        }

        pub(crate) fn failing() -> Self {
            Self {
                fail: true,
                ..Default::default()
            }
        }

        pub(crate) fn queries(&self) -> usize {
            self.queries.load(Ordering::SeqCst)
        }

        pub(crate) fn conversions(&self) -> usize {
            self.conversions.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl DocumentStore for FakeStore {
        async fn query_published(&self) -> Result<Vec<Post>> {
            self.queries.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(Error::Notion {
                    status: 503,
                    message: "unavailable".to_string(),
                });
            }
            Ok(self.posts.lock().unwrap().clone())
        }

        async fn page_markdown(&self, page_id: &str) -> Result<String> {
            self.conversions.fetch_add(1, Ordering::SeqCst);
            self.bodies
                .lock()
                .unwrap()
                .iter()
                .find(|(id, _)| id == page_id)
                .map(|(_, body)| body.clone())
                .ok_or(Error::Notion {
                    status: 404,
                    message: "page not found".to_string(),
                })
        }
    }

    pub(crate) fn sample_posts() -> Vec<Post> {
        vec![
            post("first-light", "2023-03-01", PostStatus::Published),
            post("unfinished", "2025-01-01", PostStatus::Draft),
            post("slow-shutter", "2024-09-12", PostStatus::Published),
        ]
    }

    #[tokio::test]
    async fn test_live_listing_is_cached() {
        let store = Arc::new(FakeStore::with_posts(sample_posts()));
        let live = LiveSource::new(store.clone());

        let posts = live.list_published().await.unwrap();
        assert_eq!(posts.len(), 2);
        assert_eq!(posts[0].slug, "slow-shutter");
        live.list_published().await.unwrap();
        assert_eq!(store.queries(), 1);

        live.invalidate();
        live.list_published().await.unwrap();
        assert_eq!(store.queries(), 2);
    }

    #[tokio::test]
    async fn test_live_find_by_slug_skips_drafts() {
        let store = Arc::new(FakeStore::with_posts(sample_posts()));
        let live = LiveSource::new(store);

        assert!(live.find_by_slug("first-light").await.unwrap().is_some());
        assert!(live.find_by_slug("unfinished").await.unwrap().is_none());
        assert!(live.find_by_slug("nonexistent").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_snapshot_source_falls_back_when_file_missing() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(FakeStore::with_posts(sample_posts()));
        let live = Arc::new(LiveSource::new(store.clone()));
        let source = SnapshotSource::new(dir.path().join("blog-data.json"), live);

        let posts = source.list_published().await.unwrap();
        let slugs: Vec<_> = posts.iter().map(|p| p.slug.as_str()).collect();
        assert_eq!(slugs, vec!["slow-shutter", "first-light"]);
        assert_eq!(store.queries(), 1);
    }

    #[tokio::test]
    async fn test_snapshot_source_prefers_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blog-data.json");
        Snapshot::new(vec![post("from-snapshot", "2024-01-01", PostStatus::Published)])
            .write(&path)
            .await
            .unwrap();

        let store = Arc::new(FakeStore::with_posts(sample_posts()));
        let live = Arc::new(LiveSource::new(store.clone()));
        let source = SnapshotSource::new(&path, live);

        let posts = source.list_published().await.unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].slug, "from-snapshot");
        assert!(source.find_by_slug("from-snapshot").await.unwrap().is_some());
        assert_eq!(store.queries(), 0);

        // 快照中没有的 slug 走实时查询
        let found = source.find_by_slug("slow-shutter").await.unwrap();
        assert!(found.is_some());
        assert_eq!(store.queries(), 1);
    }

    #[tokio::test]
    async fn test_snapshot_source_falls_back_on_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blog-data.json");
        tokio::fs::write(&path, b"{ not json").await.unwrap();

        let store = Arc::new(FakeStore::with_posts(sample_posts()));
        let source = SnapshotSource::new(&path, Arc::new(LiveSource::new(store.clone())));

        assert!(source.find_by_slug("first-light").await.unwrap().is_some());
        assert_eq!(store.queries(), 1);
    }
}
