use tracing::{debug, error, info, warn};

use crate::models::{LogLevel, ProgressEvent};
use crate::progress::ProgressSink;

/// 命令行输出，事件全部交给 tracing
#[derive(Debug, Default)]
pub struct ConsoleSink {
    /// 是否输出章节内部进度
    verbose: bool,
    last_batch_percent: Option<u8>,
}

impl ConsoleSink {
    pub fn new(verbose: bool) -> Self {
        Self {
            verbose,
            last_batch_percent: None,
        }
    }
}

impl ProgressSink for ConsoleSink {
    fn emit(&mut self, event: ProgressEvent) {
        match event {
            ProgressEvent::ChapterStarted { title } => {
                info!("▶ 开始下载: {}", title);
            }
            ProgressEvent::ChapterProgress { title, percent } => {
                if self.verbose {
                    info!("   {} {}%", title, percent);
                } else {
                    debug!("   {} {}%", title, percent);
                }
            }
            ProgressEvent::BatchProgress {
                completed,
                total,
                percent,
            } => {
                if self.last_batch_percent != Some(percent) {
                    self.last_batch_percent = Some(percent);
                    info!("📊 总进度: {}/{} ({}%)", completed, total, percent);
                }
            }
            ProgressEvent::Log { level, message } => match level {
                LogLevel::Info => info!("{}", message),
                LogLevel::Success => info!("✅ {}", message),
                LogLevel::Warning => warn!("⚠️ {}", message),
                LogLevel::Danger => error!("❌ {}", message),
            },
        }
    }
}
