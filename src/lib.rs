pub mod api;
pub mod carousel;
pub mod cdn;
pub mod config;
pub mod content;
pub mod error;
pub mod notion;
pub mod state;
pub mod webhook;

use tracing_subscriber::{EnvFilter, fmt::time::ChronoLocal};

use config::Config;
use state::AppState;

/// 初始化日志，过滤规则来自 `FOLIO_LOG`
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_timer(ChronoLocal::new("%Y-%m-%d %H:%M:%S%.3f".to_string()))
        .with_env_filter(EnvFilter::from_env("FOLIO_LOG"))
        .init();
}

/// 读取配置并启动服务
///
/// 缺少必需的 Notion 凭据时直接退出。
pub async fn run() {
    init_tracing();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(%e, "invalid configuration");
            std::process::exit(1);
        }
    };

    tracing::info!(mode = ?config.mode, snapshot = %config.snapshot_path.display(), "starting");

    let result = match AppState::from_config(&config) {
        Ok(app) => api::run_server(app, config.listen_addr).await,
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        tracing::error!(%e, "server stopped");
        std::process::exit(1);
    }
}
