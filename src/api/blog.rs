use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    response::{IntoResponse, Response},
    routing::get,
};
use axum_extra::extract::Query;
use serde::Deserialize;

use crate::{
    content::Blog,
    error::{ApiError, Result},
    state::AppState,
};

/// 路由：
/// - `GET /blog`：已发布文章列表，可按 `category` 筛选
/// - `GET /blog?slug=`：单篇文章及正文
pub fn setup_route() -> Router<AppState> {
    Router::new().route("/blog", get(blog))
}

/// 查询参数
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct BlogParams {
    slug: Option<String>,
    category: Option<String>,
}

/// 按 slug 返回 [`Post`](crate::content::Post)，否则返回文章列表
///
/// 上游失败时列表为空，不返回错误。
async fn blog(
    Query(params): Query<BlogParams>,
    State(blog): State<Arc<Blog>>,
) -> Result<Response> {
    let slug = params.slug.as_deref().map(str::trim).filter(|s| !s.is_empty());
    if let Some(slug) = slug {
        let post = blog.post_by_slug(slug).await.ok_or(ApiError::NotFound)?;
        return Ok(Json(post).into_response());
    }

    let category = params
        .category
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty());
    let posts = match category {
        Some(category) => blog.posts_in_category(category).await,
        None => blog.list_published_posts().await,
    };

    Ok(Json(posts).into_response())
}
