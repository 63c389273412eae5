//! # Manga Downloader
//!
//! 并发下载漫画章节的 Rust 应用程序
//!
//! ## 架构设计
//!
//! 本系统采用四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `browser/` - 启动或连接 Chrome，持有稀缺资源（Browser）
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，只处理单个页面
//! - `MangaSource` - 标题 / 章节列表 / 图片地址 / 搜索
//! - `MetadataWriter` - 写 metadata.json 能力
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一个章节"的完整下载流程
//! - `BrowserChapterFetcher` - 打开页面并逐张截图
//! - `HttpChapterFetcher` - 解析图片地址后直接下载
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/batch_orchestrator` - 并发调度、取消、结果汇总
//! - `orchestrator/app` - 命令入口，串起以上各层
//!
//! 进度通过 `progress::ProgressSink` 输出，编排层不依赖任何界面。

pub mod browser;
pub mod cli;
pub mod config;
pub mod error;

pub mod models;
pub mod orchestrator;
pub mod progress;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::{Config, Renderer};
pub use error::{AppError, AppResult, ConfigError, FetchError, ScrapeError};
pub use models::{
    select_chapters, BatchResult, ChapterDescriptor, ChapterRange, LogLevel, Outcome,
    ProgressEvent,
};
pub use orchestrator::{App, BatchOrchestrator, CancelHandle, DownloadRequest};
pub use progress::{ChannelSink, ConsoleSink, ProgressSink};
pub use services::{MangaSource, Site};
pub use workflow::{ChapterFetcher, ChapterProgress};
