use std::{path::PathBuf, sync::Arc};

use serde::Serialize;

use super::DeployTrigger;
use crate::content::{Blog, CacheTag, Snapshot};

/// 一次内容变更处理中执行的动作
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Actions {
    pub revalidated: bool,
    pub snapshot_regenerated: bool,
    pub deploy_triggered: bool,
}

/// 内容变更处理结果，`errors` 非空表示部分动作失败
#[derive(Debug, Clone, Default)]
pub struct Outcome {
    pub actions: Actions,
    pub errors: Vec<String>,
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }
}

/// 处理内容变更：失效缓存、重新生成快照、触发重新部署
pub struct Revalidator {
    blog: Arc<Blog>,
    snapshot_path: Option<PathBuf>,
    deploy: Option<Arc<dyn DeployTrigger>>,
}

impl Revalidator {
    /// `snapshot_path` 为 `None` 时不重新生成快照，`deploy` 为 `None` 时不触发部署
    pub fn new(
        blog: Arc<Blog>,
        snapshot_path: Option<PathBuf>,
        deploy: Option<Arc<dyn DeployTrigger>>,
    ) -> Self {
        Self {
            blog,
            snapshot_path,
            deploy,
        }
    }

    /// 只失效缓存
    pub fn revalidate(&self, tags: &[CacheTag]) -> Vec<CacheTag> {
        self.blog.invalidate(tags)
    }

    /// 处理一次内容变更通知，每个动作最多执行一次
    pub async fn content_changed(&self) -> Outcome {
        let mut outcome = Outcome::default();

        self.blog.invalidate(&CacheTag::ALL);
        outcome.actions.revalidated = true;

        if let Some(path) = &self.snapshot_path {
            let result = match Snapshot::generate(self.blog.store()).await {
                Ok(snapshot) => snapshot.write(path).await.map(|_| snapshot.posts.len()),
                Err(e) => Err(e),
            };
            match result {
                Ok(count) => {
                    tracing::info!(count, path = %path.display(), "snapshot regenerated");
                    outcome.actions.snapshot_regenerated = true;
                }
                Err(e) => {
                    tracing::error!(%e, "failed to regenerate snapshot");
                    outcome.errors.push(format!("snapshot: {e}"));
                }
            }
        }

        if let Some(deploy) = &self.deploy {
            match deploy.trigger().await {
                Ok(()) => outcome.actions.deploy_triggered = true,
                Err(e) => {
                    tracing::error!(%e, "failed to trigger deploy");
                    outcome.errors.push(format!("deploy: {e}"));
                }
            }
        }

        outcome
    }
}
