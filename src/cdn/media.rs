use std::{cmp::Reverse, sync::Arc};

use chrono::NaiveDateTime;
use reqwest::Url;
use serde::Serialize;

use super::{MediaStorage, StorageObject};
use crate::{
    config::ConfigError,
    error::{ApiError, Result},
};

pub const PHOTOS_FOLDER: &str = "photos";
pub const PROJECTS_FOLDER: &str = "projects";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

/// 按扩展名判断媒体类型，其他文件返回 `None`
pub fn media_kind(name: &str) -> Option<MediaKind> {
    let (_, ext) = name.rsplit_once('.')?;
    match ext.to_ascii_lowercase().as_str() {
        "jpg" | "jpeg" | "png" | "webp" | "avif" | "gif" => Some(MediaKind::Image),
        "mp4" | "webm" | "mov" | "m4v" => Some(MediaKind::Video),
        _ => None,
    }
}

/// 相册图片
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PhotoImage {
    pub name: String,
    pub url: String,
    pub size: u64,
    pub last_modified: NaiveDateTime,
}

/// 作品集中的图片或视频
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectMedia {
    pub name: String,
    pub url: String,
    pub kind: MediaKind,
    pub size: u64,
    pub last_modified: NaiveDateTime,
}

/// 媒体库：列出存储区中的文件并转换为公开访问地址
pub struct MediaLibrary {
    storage: Arc<dyn MediaStorage>,
    pull_zone: Url,
}

impl MediaLibrary {
    pub fn new(storage: Arc<dyn MediaStorage>, pull_zone_url: &str) -> Result<Self> {
        let base = if pull_zone_url.contains("://") {
            pull_zone_url.to_string()
        } else {
            format!("https://{pull_zone_url}")
        };
        let pull_zone = Url::parse(&base)
            .ok()
            .filter(|u| !u.cannot_be_a_base())
            .ok_or(ConfigError::Invalid("BUNNY_PULL_ZONE_URL", "must be an absolute url"))?;

        Ok(Self { storage, pull_zone })
    }

    /// 文件的公开地址，路径段会被编码
    pub fn public_url(&self, folder: &str, name: &str) -> String {
        let mut url = self.pull_zone.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(folder).push(name);
        }
        url.to_string()
    }

    async fn files(&self, folder: &str) -> Result<Vec<(StorageObject, MediaKind)>> {
        let objects = self.storage.list(folder).await.map_err(|e| {
            tracing::error!(%e, folder, "failed to list media storage");
            ApiError::Unavailable("Failed to list media")
        })?;

        let files: Vec<_> = objects
            .into_iter()
            .filter(|o| !o.is_directory)
            .filter_map(|o| media_kind(&o.object_name).map(|kind| (o, kind)))
            .collect();

        tracing::debug!(folder, count = files.len(), "listed media");
        Ok(files)
    }

    /// 相册图片，最新的在前；没有图片时视为配置错误
    pub async fn photos(&self) -> Result<Vec<PhotoImage>> {
        let mut images: Vec<PhotoImage> = self
            .files(PHOTOS_FOLDER)
            .await?
            .into_iter()
            .filter(|(_, kind)| *kind == MediaKind::Image)
            .map(|(o, _)| PhotoImage {
                url: self.public_url(PHOTOS_FOLDER, &o.object_name),
                name: o.object_name,
                size: o.length,
                last_modified: o.last_changed,
            })
            .collect();

        if images.is_empty() {
            return Err(ApiError::Misconfigured("No images found").into());
        }

        images.sort_by_key(|i| Reverse(i.last_modified));
        Ok(images)
    }

    /// 作品集媒体，按文件名排序
    pub async fn projects(&self) -> Result<Vec<ProjectMedia>> {
        let mut media: Vec<ProjectMedia> = self
            .files(PROJECTS_FOLDER)
            .await?
            .into_iter()
            .map(|(o, kind)| ProjectMedia {
                url: self.public_url(PROJECTS_FOLDER, &o.object_name),
                name: o.object_name,
                kind,
                size: o.length,
                last_modified: o.last_changed,
            })
            .collect();

        if media.is_empty() {
            return Err(ApiError::Misconfigured("No project media found").into());
        }

        media.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(media)
    }
}
