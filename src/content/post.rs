use std::cmp::Reverse;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// 文章发布状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    Draft,
    Published,
}

/// 博客文章
///
/// 元信息来自文档数据库，`content` 仅在按 slug 获取单篇文章时填充。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    /// 文档数据库中的页面 id
    pub id: String,
    pub title: String,
    /// 唯一标识
    pub slug: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover: Option<String>,
    /// Markdown 正文
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    pub status: PostStatus,
}

impl Post {
    pub fn is_published(&self) -> bool {
        self.status == PostStatus::Published
    }

    pub fn in_category(&self, category: &str) -> bool {
        self.categories
            .iter()
            .any(|c| c.eq_ignore_ascii_case(category.trim()))
    }
}

/// 只保留已发布文章，按日期倒序排列
///
/// 同一天的文章按标题排序，保证结果稳定。
pub fn published_sorted(posts: Vec<Post>) -> Vec<Post> {
    let mut posts: Vec<Post> = posts.into_iter().filter(Post::is_published).collect();
    posts.sort_by(|a, b| {
        Reverse(a.date)
            .cmp(&Reverse(b.date))
            .then_with(|| a.title.cmp(&b.title))
    });
    posts
}
