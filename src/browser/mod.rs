mod connection;
mod headless;

pub use connection::connect_to_browser;
pub use headless::launch_browser;

use anyhow::Result;
use chromiumoxide::Browser;

use crate::config::Config;

/// 配置了调试端口时连接现有浏览器，否则自行启动
pub async fn open_browser(config: &Config) -> Result<Browser> {
    match config.browser_debug_port {
        Some(port) => connect_to_browser(port).await,
        None => launch_browser(config).await,
    }
}
