//! 日志工具模块
//!
//! 初始化 tracing，并提供启动/统计信息的输出函数

use anyhow::{Context, Result};
use std::fs::{self, OpenOptions};
use std::sync::Mutex;
use tracing::{info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use crate::models::BatchResult;

/// 初始化日志
///
/// 控制台输出带颜色，同时以纯文本追加到 `log_file_path`。
/// `RUST_LOG` 优先；未设置时默认 `info`，`verbose` 时为 `debug`。
pub fn init(verbose: bool, log_file_path: &str) -> Result<()> {
    init_log_file(log_file_path)?;

    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "warn,manga_downloader={default_level},manga_dl={default_level}"
        ))
    });

    let log_file = OpenOptions::new()
        .append(true)
        .open(log_file_path)
        .with_context(|| format!("无法打开日志文件: {}", log_file_path))?;

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .with(
            fmt::layer()
                .with_ansi(false)
                .with_target(false)
                .with_writer(Mutex::new(log_file)),
        )
        .try_init()
        .context("日志系统初始化失败")?;

    Ok(())
}

/// 初始化日志文件
///
/// # 参数
/// - `log_file_path`: 日志文件路径
pub fn init_log_file(log_file_path: &str) -> Result<()> {
    let log_header = format!(
        "{}\n漫画下载日志 - {}\n{}\n\n",
        "=".repeat(60),
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        "=".repeat(60)
    );
    fs::write(log_file_path, log_header)
        .with_context(|| format!("无法写入日志文件: {}", log_file_path))?;
    Ok(())
}

/// 记录程序启动信息
pub fn log_startup(command: &str, max_concurrent: usize) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - {}", command);
    info!("📊 最大并发数: {}", max_concurrent);
    info!("{}", "=".repeat(60));
}

/// 记录批量下载开始信息
///
/// # 参数
/// - `manga_title`: 漫画标题
/// - `chapter_count`: 待下载章节数
/// - `max_concurrent`: 最大并发数
pub fn log_batch_start(manga_title: &str, chapter_count: usize, max_concurrent: usize) {
    info!("\n{}", "=".repeat(60));
    info!("📦 {}", manga_title);
    info!("📄 待下载章节: {} 个, 同时下载 {} 个", chapter_count, max_concurrent);
    info!("{}", "=".repeat(60));
}

/// 打印最终统计信息
///
/// # 参数
/// - `result`: 批量下载结果
/// - `log_file_path`: 日志文件路径
pub fn print_final_stats(result: &BatchResult, log_file_path: &str) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部处理完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 成功: {}/{}", result.succeeded, result.len());
    info!("❌ 失败: {}", result.failed);
    info!("⏹ 取消: {}", result.cancelled);
    for (chapter, reason) in result.failures() {
        warn!("   {} → {}", chapter.title(), truncate_text(reason, 120));
    }
    info!("{}", "=".repeat(60));
    info!("\n日志已保存至: {}", log_file_path);
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度（字符数）
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncates_by_characters() {
        assert_eq!(truncate_text("第一章第二章", 3), "第一章...");
        assert_eq!(truncate_text("short", 10), "short");
    }

    #[test]
    fn log_file_gets_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.txt");
        init_log_file(path.to_str().unwrap()).unwrap();
        let content = std::fs::read_to_string(path).unwrap();
        assert!(content.starts_with(&"=".repeat(60)));
        assert!(content.contains("漫画下载日志"));
    }
}
