use std::path::PathBuf;

use manut_client::ClientConfig;
use shared::error::{AppError, AppResult};
use shared::stats::BucketZone;

/// 控制台配置
///
/// # 环境变量
///
/// | 环境变量 | 默认值 | 说明 |
/// |----------|--------|------|
/// | MANUT_API_URL | (none) | 后端项目地址 |
/// | MANUT_API_KEY | (none) | 公共 API key |
/// | MANUT_TIMEZONE | Europe/Paris | 日/月分桶时区 |
/// | MANUT_WORK_DIR | ./.manut | 会话与主题缓存目录 |
/// | MANUT_REQUEST_TIMEOUT | 30 | 请求超时(秒) |
/// | LOG_LEVEL | info | 日志级别 |
/// | LOG_JSON | false | JSON 日志 |
/// | LOG_DIR | (none) | 日志文件目录 |
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_url: Option<String>,
    pub api_key: Option<String>,
    /// 分桶时区，"今天" 也按此时区计算
    pub zone: BucketZone,
    pub work_dir: PathBuf,
    /// 请求超时 (秒)
    pub request_timeout: u64,
    pub log_level: String,
    pub log_json: bool,
    pub log_dir: Option<String>,
}

impl AppConfig {
    /// 从环境变量加载配置
    ///
    /// 如果环境变量未设置或无法解析，使用默认值
    pub fn from_env() -> Self {
        Self {
            api_url: std::env::var("MANUT_API_URL").ok().filter(|v| !v.is_empty()),
            api_key: std::env::var("MANUT_API_KEY").ok().filter(|v| !v.is_empty()),
            zone: std::env::var("MANUT_TIMEZONE")
                .ok()
                .and_then(|tz| match tz.parse::<BucketZone>() {
                    Ok(zone) => Some(zone),
                    Err(e) => {
                        tracing::warn!("{}, falling back to the default zone", e);
                        None
                    }
                })
                .unwrap_or_default(),
            work_dir: std::env::var("MANUT_WORK_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./.manut")),
            request_timeout: std::env::var("MANUT_REQUEST_TIMEOUT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(30),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            log_json: std::env::var("LOG_JSON")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),
            log_dir: std::env::var("LOG_DIR").ok().filter(|v| !v.is_empty()),
        }
    }

    /// 使用自定义工作目录覆盖配置
    ///
    /// 常用于测试场景
    pub fn with_work_dir(mut self, work_dir: impl Into<PathBuf>) -> Self {
        self.work_dir = work_dir.into();
        self
    }

    /// Connection settings for the REST client
    pub fn client_config(&self) -> AppResult<ClientConfig> {
        let url = self
            .api_url
            .as_deref()
            .ok_or_else(|| AppError::config("MANUT_API_URL is not set"))?;
        let key = self
            .api_key
            .as_deref()
            .ok_or_else(|| AppError::config("MANUT_API_KEY is not set"))?;
        Ok(ClientConfig::new(url, key).with_timeout(self.request_timeout))
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::from_env()
    }
}
