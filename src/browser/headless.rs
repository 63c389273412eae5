use anyhow::{Context, Result};
use chromiumoxide::{Browser, BrowserConfig};
use futures::StreamExt;
use tracing::{debug, info};

use crate::config::Config;

/// 启动浏览器（默认无头模式）
///
/// 事件处理循环在后台任务中运行，直到浏览器关闭
pub async fn launch_browser(config: &Config) -> Result<Browser> {
    info!("🚀 启动{}浏览器...", if config.headless { "无头" } else { "" });

    let mut builder = BrowserConfig::builder().args(vec![
        "--disable-gpu",
        "--no-sandbox",
        "--disable-dev-shm-usage",
    ]);
    builder = if config.headless {
        builder.new_headless_mode()
    } else {
        builder.with_head()
    };
    if let Some(executable) = &config.chrome_executable {
        debug!("浏览器路径: {}", executable.display());
        builder = builder.chrome_executable(executable);
    }

    let browser_config = builder
        .build()
        .map_err(|e| anyhow::anyhow!("配置浏览器失败: {}", e))?;

    let (browser, mut handler) = Browser::launch(browser_config)
        .await
        .context("启动浏览器失败")?;

    tokio::spawn(async move {
        while let Some(event) = handler.next().await {
            if event.is_err() {
                break;
            }
        }
    });

    info!("✅ 浏览器已启动");
    Ok(browser)
}
