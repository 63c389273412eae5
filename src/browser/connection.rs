use anyhow::{Context, Result};
use chromiumoxide::Browser;
use futures::StreamExt;
use tokio::time::{sleep, Duration};
use tracing::{debug, info};

/// 连接到已经启动的浏览器（`--remote-debugging-port`）
pub async fn connect_to_browser(port: u16) -> Result<Browser> {
    let browser_url = format!("http://localhost:{}", port);
    info!("正在连接到浏览器: {}", browser_url);

    let (browser, mut handler) = Browser::connect(&browser_url)
        .await
        .with_context(|| format!("连接浏览器失败: {}", browser_url))?;
    debug!("浏览器连接成功");

    tokio::spawn(async move {
        while let Some(event) = handler.next().await {
            if event.is_err() {
                break;
            }
        }
    });

    // 等待浏览器状态同步
    sleep(Duration::from_millis(300)).await;

    Ok(browser)
}
