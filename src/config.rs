use std::{env, net::SocketAddr, path::PathBuf};

/// 配置错误
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("环境变量: `{0}`: NotPresent")]
    Missing(&'static str),

    #[error("环境变量: `{0}`: {1}")]
    Invalid(&'static str, &'static str),
}

/// 部署模式
///
/// - [`Mode::Production`]：优先读取静态快照，失败时回退到实时查询
/// - [`Mode::Development`]：始终实时查询
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Production,
    Development,
}

impl Mode {
    fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Some(Mode::Production),
            "development" | "dev" => Some(Mode::Development),
            _ => None,
        }
    }
}

/// Notion 凭据，缺失时启动失败
#[derive(Debug, Clone)]
pub struct NotionConfig {
    pub api_key: String,
    pub database_id: String,
}

/// Bunny 存储配置，三项均存在时才可用
#[derive(Debug, Clone)]
pub struct BunnyConfig {
    pub storage_zone: String,
    pub api_key: String,
    pub region: Option<String>,
    pub pull_zone_url: String,
}

/// 应用配置
///
/// 全部来自环境变量，见 [`Config::from_env`]。
#[derive(Debug, Clone)]
pub struct Config {
    pub mode: Mode,
    pub listen_addr: SocketAddr,
    pub snapshot_path: PathBuf,
    pub notion: NotionConfig,
    pub webhook_secret: Option<String>,
    pub deploy_hook_url: Option<String>,
    pub public_host: Option<String>,
    pub bunny: Option<BunnyConfig>,
}

impl Config {
    /// 从环境变量读取配置
    ///
    /// `NOTION_API_KEY` 和 `NOTION_DATABASE_ID` 是必需的，其余均为可选。
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// 使用任意查找函数读取配置，空字符串视为未设置
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let notion = NotionConfig {
            api_key: get("NOTION_API_KEY").ok_or(ConfigError::Missing("NOTION_API_KEY"))?,
            database_id: get("NOTION_DATABASE_ID")
                .ok_or(ConfigError::Missing("NOTION_DATABASE_ID"))?,
        };

        let mode = match get("FOLIO_MODE") {
            Some(s) => Mode::parse(&s).ok_or(ConfigError::Invalid(
                "FOLIO_MODE",
                "expected `production` or `development`",
            ))?,
            None => Mode::Production,
        };

        let listen_addr = get("FOLIO_LISTEN_ADDR")
            .unwrap_or_else(|| "0.0.0.0:3000".to_string())
            .parse()
            .map_err(|_| ConfigError::Invalid("FOLIO_LISTEN_ADDR", "must be a socket address"))?;

        let snapshot_path = get("FOLIO_SNAPSHOT_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("blog-data.json"));

        let bunny = match (
            get("BUNNY_STORAGE_ZONE"),
            get("BUNNY_STORAGE_API_KEY"),
            get("BUNNY_PULL_ZONE_URL"),
        ) {
            (Some(storage_zone), Some(api_key), Some(pull_zone_url)) => Some(BunnyConfig {
                storage_zone,
                api_key,
                region: get("BUNNY_STORAGE_REGION"),
                pull_zone_url,
            }),
            _ => None,
        };

        Ok(Self {
            mode,
            listen_addr,
            snapshot_path,
            notion,
            webhook_secret: get("NOTION_WEBHOOK_SECRET"),
            deploy_hook_url: get("VERCEL_DEPLOY_HOOK_URL"),
            public_host: get("VERCEL_URL"),
            bunny,
        })
    }
}
