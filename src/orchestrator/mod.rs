//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责批量下载和流程调度，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `app` - 命令入口
//! - 管理站点抓取能力和 HTTP 客户端
//! - 获取标题、章节列表并按范围筛选
//! - 按配置构造 `ChapterFetcher`（浏览器截图 / HTTP 直接下载）
//! - 输出全局统计信息
//!
//! ### `batch_orchestrator` - 批量章节下载器
//! - 控制并发数量（Semaphore）
//! - 按章节号升序启动
//! - 协作式取消
//! - 汇总每个章节的 `Outcome`
//!
//! ## 层次关系
//!
//! ```text
//! app (处理一部漫画)
//!     ↓
//! batch_orchestrator (处理 Vec<ChapterDescriptor>)
//!     ↓
//! workflow::ChapterFetcher (处理单个章节)
//!     ↓
//! services (能力层：site / source / metadata)
//!     ↓
//! browser (基础设施：Browser)
//! ```

pub mod app;
pub mod batch_orchestrator;

// 重新导出主要类型
pub use app::{App, DownloadRequest};
pub use batch_orchestrator::{BatchOrchestrator, CancelHandle, EMPTY_BATCH_MESSAGE};
