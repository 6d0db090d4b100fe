use std::sync::Arc;

use axum::extract::FromRef;

use crate::{
    cdn::{BunnyStorage, MediaLibrary},
    config::{Config, Mode},
    content::Blog,
    error::Result,
    notion::NotionClient,
    webhook::{DeployHook, DeployTrigger, Revalidator, VerificationStore},
};

/// 应用程序上下文
///
/// [`AppState`] 封装了博客内容、媒体库、缓存失效和验证令牌，提供统一访问入口。
#[derive(Clone, FromRef)]
pub struct AppState {
    blog: Arc<Blog>,
    media: Option<Arc<MediaLibrary>>,
    revalidator: Arc<Revalidator>,
    verification: VerificationStore,
    #[from_ref(skip)]
    webhook_secret: Option<Arc<str>>,
    #[from_ref(skip)]
    public_host: Option<Arc<str>>,
}

impl AppState {
    /// 创建一个新的 [`AppState`] 实例
    pub fn new(
        blog: Arc<Blog>,
        media: Option<MediaLibrary>,
        revalidator: Revalidator,
        webhook_secret: Option<&str>,
        public_host: Option<&str>,
    ) -> Self {
        Self {
            blog,
            media: media.map(Arc::new),
            revalidator: Arc::new(revalidator),
            verification: VerificationStore::default(),
            webhook_secret: webhook_secret.map(Arc::from),
            public_host: public_host.map(Arc::from),
        }
    }

    /// 根据配置创建上游客户端并组装应用状态
    ///
    /// 只有生产模式下内容变更才会重新生成快照。
    pub fn from_config(config: &Config) -> Result<Self> {
        let store = Arc::new(NotionClient::new(&config.notion)?);
        let blog = Arc::new(Blog::new(config.mode, store, &config.snapshot_path));

        let media = match &config.bunny {
            Some(bunny) => Some(MediaLibrary::new(
                Arc::new(BunnyStorage::new(bunny)?),
                &bunny.pull_zone_url,
            )?),
            None => {
                tracing::warn!("bunny storage not configured, media endpoints disabled");
                None
            }
        };

        let deploy = config
            .deploy_hook_url
            .as_deref()
            .map(|url| Arc::new(DeployHook::new(url)) as Arc<dyn DeployTrigger>);
        let snapshot_path =
            (config.mode == Mode::Production).then(|| config.snapshot_path.clone());

        let revalidator = Revalidator::new(blog.clone(), snapshot_path, deploy);

        Ok(Self::new(
            blog,
            media,
            revalidator,
            config.webhook_secret.as_deref(),
            config.public_host.as_deref(),
        ))
    }

    /// 获取博客内容入口
    pub fn blog(&self) -> &Blog {
        &self.blog
    }

    /// 获取媒体库，未配置 CDN 时为 `None`
    pub fn media(&self) -> Option<&MediaLibrary> {
        self.media.as_deref()
    }

    pub fn revalidator(&self) -> &Revalidator {
        &self.revalidator
    }

    pub fn verification(&self) -> &VerificationStore {
        &self.verification
    }

    pub fn webhook_secret(&self) -> Option<&str> {
        self.webhook_secret.as_deref()
    }

    pub fn public_host(&self) -> Option<&str> {
        self.public_host.as_deref()
    }
}
