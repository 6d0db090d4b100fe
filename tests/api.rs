use std::{
    path::PathBuf,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};

use async_trait::async_trait;
use axum::{
    Router,
    body::{Body, to_bytes},
    extract::Request,
    http::{Response, StatusCode},
};
use chrono::{NaiveDate, NaiveDateTime};
use folio::{
    api,
    cdn::{MediaLibrary, MediaStorage, StorageObject},
    config::Mode,
    content::{Blog, DocumentStore, Post, PostStatus},
    error::{Error, Result},
    state::AppState,
    webhook::{DeployTrigger, Revalidator},
};
use serde_json::Value;
use tempfile::TempDir;
use tower::util::ServiceExt;

const SECRET: &str = "s3cret-webhook";

fn post(slug: &str, date: &str, status: PostStatus) -> Post {
    Post {
        id: format!("page-{slug}"),
        title: slug.replace('-', " "),
        slug: slug.to_string(),
        date: NaiveDate::parse_from_str(date, "%Y-%m-%d").expect("日期格式错误"),
        categories: vec!["photography".to_string()],
        summary: None,
        cover: None,
        content: None,
        status,
    }
}

/// 内存中的文档数据库
struct MemoryStore {
    posts: Vec<Post>,
    queries: AtomicUsize,
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn query_published(&self) -> Result<Vec<Post>> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        Ok(self.posts.clone())
    }

    async fn page_markdown(&self, page_id: &str) -> Result<String> {
        Ok(format!("# {page_id}"))
    }
}

#[derive(Default)]
struct CountingDeploy {
    calls: AtomicUsize,
}

#[async_trait]
impl DeployTrigger for CountingDeploy {
    async fn trigger(&self) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

struct MemoryStorage;

#[async_trait]
impl MediaStorage for MemoryStorage {
    async fn list(&self, folder: &str) -> Result<Vec<StorageObject>> {
        let object = |name: &str, changed: &str| StorageObject {
            object_name: name.to_string(),
            is_directory: false,
            length: 2048,
            last_changed: NaiveDateTime::parse_from_str(changed, "%Y-%m-%d %H:%M:%S")
                .expect("时间格式错误"),
        };

        match folder {
            "photos" => Ok(vec![
                object("harbor.jpg", "2024-02-01 08:00:00"),
                object("dunes.jpg", "2024-06-01 08:00:00"),
            ]),
            "projects" => Ok(vec![object("reel.mp4", "2024-01-01 00:00:00")]),
            _ => Err(Error::Upstream {
                service: "memory storage",
                status: 404,
            }),
        }
    }
}

struct TestApp {
    router: Router,
    store: Arc<MemoryStore>,
    deploy: Arc<CountingDeploy>,
    snapshot_path: PathBuf,
    _dir: TempDir,
}

/// 始终不可达的存储区
struct DownStorage;

#[async_trait]
impl MediaStorage for DownStorage {
    async fn list(&self, _folder: &str) -> Result<Vec<StorageObject>> {
        Err(Error::Upstream {
            service: "memory storage",
            status: 503,
        })
    }
}

impl TestApp {
    fn new(mode: Mode, with_media: bool) -> Self {
        let storage = with_media.then(|| Arc::new(MemoryStorage) as Arc<dyn MediaStorage>);
        Self::with_storage(mode, storage)
    }

    fn with_storage(mode: Mode, storage: Option<Arc<dyn MediaStorage>>) -> Self {
        let dir = tempfile::tempdir().expect("创建临时目录失败");
        let snapshot_path = dir.path().join("blog-data.json");

        let store = Arc::new(MemoryStore {
            posts: vec![
                post("first-light", "2023-03-01", PostStatus::Published),
                post("unfinished", "2025-01-01", PostStatus::Draft),
                post("slow-shutter", "2024-09-12", PostStatus::Published),
            ],
            queries: AtomicUsize::new(0),
        });
        let deploy = Arc::new(CountingDeploy::default());

        let blog = Arc::new(Blog::new(mode, store.clone(), &snapshot_path));
        let snapshot = (mode == Mode::Production).then(|| snapshot_path.clone());
        let revalidator = Revalidator::new(
            blog.clone(),
            snapshot,
            Some(deploy.clone() as Arc<dyn DeployTrigger>),
        );
        let media = storage.map(|storage| {
            MediaLibrary::new(storage, "https://cdn.example.com").expect("创建媒体库失败")
        });

        let app = AppState::new(
            blog,
            media,
            revalidator,
            Some(SECRET),
            Some("folio.example.com"),
        );

        Self {
            router: api::setup_route(app),
            store,
            deploy,
            snapshot_path,
            _dir: dir,
        }
    }

    async fn request(&self, req: Request<Body>) -> Response<Body> {
        self.router
            .clone()
            .oneshot(req)
            .await
            .expect("oneshot fail")
    }

    async fn json(&self, req: Request<Body>, code: StatusCode, msg: &str) -> Value {
        let resp = self.request(req).await;
        assert_eq!(resp.status(), code, "{}", msg);
        let data = to_bytes(resp.into_body(), usize::MAX)
            .await
            .expect("读取数据失败");
        serde_json::from_slice(&data).expect("反序列化失败")
    }

    fn deploys(&self) -> usize {
        self.deploy.calls.load(Ordering::SeqCst)
    }
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).expect("请求失败")
}

fn post_json(uri: &str, auth: Option<&str>, body: &str) -> Request<Body> {
    let mut builder = Request::post(uri).header("Content-Type", "application/json");
    if let Some(auth) = auth {
        builder = builder.header("Authorization", auth);
    }
    builder.body(Body::new(body.to_string())).expect("请求失败")
}

#[tokio::test]
async fn test_blog_listing_and_detail() {
    let app = TestApp::new(Mode::Development, false);

    let list = app.json(get("/api/blog"), StatusCode::OK, "文章列表").await;
    let slugs: Vec<_> = list
        .as_array()
        .expect("应为数组")
        .iter()
        .map(|p| p["slug"].as_str().unwrap_or_default().to_string())
        .collect();
    assert_eq!(slugs, vec!["slow-shutter", "first-light"], "不应包含草稿");

    let detail = app
        .json(get("/api/blog?slug=first-light"), StatusCode::OK, "单篇文章")
        .await;
    assert_eq!(detail["content"], "# page-first-light");

    let resp = app.request(get("/api/blog?slug=nonexistent")).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND, "不存在的文章");

    let resp = app.request(get("/api/blog?slug=unfinished")).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND, "草稿不可访问");

    let by_category = app
        .json(get("/api/blog?category=Photography"), StatusCode::OK, "分类筛选")
        .await;
    assert_eq!(by_category.as_array().map(Vec::len), Some(2));
}

#[tokio::test]
async fn test_webhook_requires_secret() {
    let app = TestApp::new(Mode::Production, false);
    let event = r#"{"type":"page.content_updated"}"#;

    let body = app
        .json(
            post_json("/api/webhook/notion", None, event),
            StatusCode::UNAUTHORIZED,
            "缺少密钥",
        )
        .await;
    assert_eq!(body["success"], false);

    app.json(
        post_json("/api/webhook/notion", Some("Bearer wrong"), event),
        StatusCode::UNAUTHORIZED,
        "密钥错误",
    )
    .await;

    assert_eq!(app.deploys(), 0, "未授权请求不应有副作用");
    assert!(!app.snapshot_path.exists(), "未授权请求不应生成快照");
}

#[tokio::test]
async fn test_webhook_runs_actions_once() {
    let app = TestApp::new(Mode::Production, false);

    let body = app
        .json(
            post_json(
                "/api/webhook/notion",
                Some(&format!("Bearer {SECRET}")),
                r#"{"type":"page.content_updated"}"#,
            ),
            StatusCode::OK,
            "授权请求",
        )
        .await;

    assert_eq!(body["success"], true);
    assert_eq!(body["actions"]["revalidated"], true);
    assert_eq!(body["actions"]["snapshotRegenerated"], true);
    assert_eq!(body["actions"]["deployTriggered"], true);
    assert_eq!(app.deploys(), 1);
    assert!(app.snapshot_path.exists());

    // 之后的列表读取快照，不再查询数据库
    let queries = app.store.queries.load(Ordering::SeqCst);
    app.json(get("/api/blog"), StatusCode::OK, "读取快照").await;
    assert_eq!(app.store.queries.load(Ordering::SeqCst), queries);
}

#[tokio::test]
async fn test_verification_handshake() {
    let app = TestApp::new(Mode::Development, false);

    let empty = app
        .json(get("/api/webhook/notion/verify"), StatusCode::OK, "尚无令牌")
        .await;
    assert!(empty["token"].is_null());

    // 验证令牌不需要密钥
    app.json(
        post_json(
            "/api/webhook/notion",
            None,
            r#"{"verification_token":"secret_handshake"}"#,
        ),
        StatusCode::OK,
        "接收验证令牌",
    )
    .await;
    assert_eq!(app.deploys(), 0);

    let stored = app
        .json(get("/api/webhook/notion/verify"), StatusCode::OK, "读取令牌")
        .await;
    assert_eq!(stored["token"], "secret_handshake");
    assert!(stored["ageSeconds"].as_i64().is_some());

    app.json(
        post_json(
            "/api/webhook/notion/verify",
            None,
            r#"{"verification_token":"second"}"#,
        ),
        StatusCode::OK,
        "直接保存令牌",
    )
    .await;
    let stored = app
        .json(get("/api/webhook/notion/verify"), StatusCode::OK, "令牌被覆盖")
        .await;
    assert_eq!(stored["token"], "second");

    app.json(
        post_json("/api/webhook/notion/verify", None, "{}"),
        StatusCode::BAD_REQUEST,
        "缺少令牌",
    )
    .await;
}

#[tokio::test]
async fn test_revalidate() {
    let app = TestApp::new(Mode::Development, false);
    let auth = format!("Bearer {SECRET}");

    let resp = app.request(get("/api/revalidate")).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let req = Request::get("/api/revalidate?tag=posts")
        .header("Authorization", &auth)
        .body(Body::empty())
        .expect("请求失败");
    let body = app.json(req, StatusCode::OK, "按标签失效").await;
    assert_eq!(body["success"], true);
    assert!(body["timestamp"].as_i64().is_some());
    assert!(body["message"].as_str().unwrap_or_default().contains("posts"));

    let req = Request::post("/api/revalidate?tag=everything")
        .header("Authorization", &auth)
        .body(Body::empty())
        .expect("请求失败");
    app.json(req, StatusCode::BAD_REQUEST, "未知标签").await;

    assert_eq!(app.deploys(), 0, "revalidate 不触发部署");
}

#[tokio::test]
async fn test_production_falls_back_to_live() {
    let app = TestApp::new(Mode::Production, false);
    assert!(!app.snapshot_path.exists());

    let list = app.json(get("/api/blog"), StatusCode::OK, "快照缺失").await;
    assert_eq!(list.as_array().map(Vec::len), Some(2));
    assert_eq!(app.store.queries.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_media_endpoints() {
    let app = TestApp::new(Mode::Development, true);

    let photos = app.json(get("/api/photos"), StatusCode::OK, "相册").await;
    assert_eq!(photos["images"][0]["name"], "dunes.jpg");
    assert_eq!(
        photos["images"][0]["url"],
        "https://cdn.example.com/photos/dunes.jpg"
    );

    let projects = app.json(get("/api/projects"), StatusCode::OK, "作品集").await;
    assert_eq!(projects["media"][0]["kind"], "video");

    let app = TestApp::new(Mode::Development, false);
    let body = app
        .json(get("/api/photos"), StatusCode::INTERNAL_SERVER_ERROR, "CDN 未配置")
        .await;
    assert!(body["error"].is_string());
    app.json(
        get("/api/projects"),
        StatusCode::INTERNAL_SERVER_ERROR,
        "CDN 未配置",
    )
    .await;
}

#[tokio::test]
async fn test_media_storage_failure() {
    let app = TestApp::with_storage(Mode::Development, Some(Arc::new(DownStorage)));

    let body = app
        .json(get("/api/photos"), StatusCode::INTERNAL_SERVER_ERROR, "存储不可达")
        .await;
    assert!(body["error"].is_string());

    let body = app
        .json(get("/api/projects"), StatusCode::INTERNAL_SERVER_ERROR, "存储不可达")
        .await;
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_revalidate_checks_secret_before_query() {
    let app = TestApp::new(Mode::Development, false);

    let body = app
        .json(
            get("/api/revalidate?tag=everything"),
            StatusCode::UNAUTHORIZED,
            "未授权时不解析参数",
        )
        .await;
    assert_eq!(body["success"], false);

    let body = app
        .json(
            get("/api/revalidate?tag=posts&tag=&other=1"),
            StatusCode::UNAUTHORIZED,
            "缺少密钥",
        )
        .await;
    assert_eq!(body["success"], false);
}
