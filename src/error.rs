//! 错误类型
//!
//! - `AppError`：输入校验类错误，会直接拒绝整次下载
//! - `FetchError`：单个章节下载失败，在 worker 边界被转换为 `Outcome::Failed`
//! - `ScrapeError`：站点抓取失败
//! - `ConfigError`：配置加载失败

use std::path::PathBuf;

use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 章节范围格式错误或越界，不会开始任何下载
    #[error("章节范围无效 '{input}': {reason}")]
    InvalidRange { input: String, reason: String },

    /// 并发数必须 >= 1
    #[error("并发数无效: {0} (必须 >= 1)")]
    InvalidConcurrency(usize),
}

impl AppError {
    /// 创建章节范围错误
    pub fn invalid_range(input: impl Into<String>, reason: impl Into<String>) -> Self {
        AppError::InvalidRange {
            input: input.into(),
            reason: reason.into(),
        }
    }
}

/// 站点抓取错误
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("请求失败 ({url}): {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("不支持的站点: {0}")]
    UnknownSite(String),

    #[error("页面中找不到 {what} ({url})")]
    MissingElement { what: &'static str, url: String },

    #[error("URL 无效 '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
}

/// 单个章节下载错误
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP 请求失败 ({url}): {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP 状态码 {status} ({url})")]
    BadStatus { url: String, status: u16 },

    #[error("浏览器错误: {0}")]
    Browser(#[from] chromiumoxide::error::CdpError),

    #[error("文件写入失败 ({}): {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON 序列化失败: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Scrape(#[from] ScrapeError),

    #[error("章节中没有找到图片: {url}")]
    NoImages { url: String },

    #[error("加载页面超时 ({secs} 秒): {url}")]
    Timeout { url: String, secs: u64 },
}

impl FetchError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        FetchError::Io {
            path: path.into(),
            source,
        }
    }
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("无法读取配置文件 {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("配置文件解析失败 {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("配置项 {field} 无效: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
