//! 程序配置
//!
//! 加载顺序：默认值 → TOML 配置文件 → 环境变量（`MANGA_DL_*`）→ 命令行参数

use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::services::Site;

/// 默认配置文件名（存在时自动加载）
pub const DEFAULT_CONFIG_FILE: &str = "manga-dl.toml";

/// 章节内容的获取方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Renderer {
    /// 无头浏览器渲染后逐张截图
    Browser,
    /// 直接下载图片地址
    Http,
}

/// 程序配置
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 下载根目录
    pub output_dir: PathBuf,
    /// 同时下载的章节数量
    pub concurrency: usize,
    /// 站点
    pub site: Site,
    pub renderer: Renderer,
    /// 是否使用无头模式
    pub headless: bool,
    /// 浏览器可执行文件路径，为空时自动查找
    pub chrome_executable: Option<PathBuf>,
    /// 连接已启动浏览器的调试端口，设置后不再自行启动浏览器
    pub browser_debug_port: Option<u16>,
    pub page_load_timeout_secs: u64,
    pub request_timeout_secs: u64,
    /// 宽和高都小于该值的图片视为图标/广告，跳过
    pub min_image_size: f64,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// 输出日志文件
    pub output_log_file: String,
    pub user_agent: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("downloads"),
            concurrency: 5,
            site: Site::Natomanga,
            renderer: Renderer::Browser,
            headless: true,
            chrome_executable: None,
            browser_debug_port: None,
            page_load_timeout_secs: 30,
            request_timeout_secs: 30,
            min_image_size: 250.0,
            verbose_logging: false,
            output_log_file: "download_log.txt".to_string(),
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36".to_string(),
        }
    }
}

impl Config {
    /// 加载配置
    ///
    /// 指定了 `path` 时文件必须存在；否则仅在默认文件存在时读取
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let base = match path {
            Some(p) => Self::from_file(p)?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => Self::default(),
        };
        let config = base.with_env();
        config.validate()?;
        Ok(config)
    }

    /// 从 TOML 文件读取，缺失的字段使用默认值
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// 使用环境变量覆盖当前配置
    pub fn with_env(self) -> Self {
        self.with_vars(|key| std::env::var(key).ok())
    }

    fn with_vars(self, var: impl Fn(&str) -> Option<String>) -> Self {
        let var = &var;
        Self {
            output_dir: var("MANGA_DL_OUTPUT_DIR").map(PathBuf::from).unwrap_or(self.output_dir),
            concurrency: parsed(var, "MANGA_DL_CONCURRENCY").unwrap_or(self.concurrency),
            site: parsed(var, "MANGA_DL_SITE").unwrap_or(self.site),
            renderer: match var("MANGA_DL_RENDERER").as_deref() {
                Some("browser") => Renderer::Browser,
                Some("http") => Renderer::Http,
                _ => self.renderer,
            },
            headless: parsed(var, "MANGA_DL_HEADLESS").unwrap_or(self.headless),
            chrome_executable: var("MANGA_DL_CHROME").map(PathBuf::from).or(self.chrome_executable),
            browser_debug_port: parsed(var, "MANGA_DL_BROWSER_DEBUG_PORT").or(self.browser_debug_port),
            page_load_timeout_secs: parsed(var, "MANGA_DL_PAGE_LOAD_TIMEOUT").unwrap_or(self.page_load_timeout_secs),
            request_timeout_secs: parsed(var, "MANGA_DL_REQUEST_TIMEOUT").unwrap_or(self.request_timeout_secs),
            min_image_size: parsed(var, "MANGA_DL_MIN_IMAGE_SIZE").unwrap_or(self.min_image_size),
            verbose_logging: parsed(var, "MANGA_DL_VERBOSE").unwrap_or(self.verbose_logging),
            output_log_file: var("MANGA_DL_LOG_FILE").unwrap_or(self.output_log_file),
            user_agent: var("MANGA_DL_USER_AGENT").unwrap_or(self.user_agent),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.concurrency < 1 {
            return Err(ConfigError::Invalid {
                field: "concurrency",
                reason: "必须 >= 1".to_string(),
            });
        }
        if self.min_image_size.is_nan() || self.min_image_size < 0.0 {
            return Err(ConfigError::Invalid {
                field: "min_image_size",
                reason: format!("{} 不能为负数", self.min_image_size),
            });
        }
        Ok(())
    }
}

/// 读取并解析环境变量，无法解析时视为未设置
fn parsed<T: FromStr>(var: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    var(key).and_then(|v| v.trim().parse().ok())
}
