use std::fmt;

use serde::Serialize;

/// 日志级别，对应界面上的配色
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Warning,
    Danger,
    Success,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LogLevel::Info => "info",
            LogLevel::Warning => "warning",
            LogLevel::Danger => "danger",
            LogLevel::Success => "success",
        };
        f.write_str(name)
    }
}

/// 进度事件
///
/// 只用于实时展示，不做持久化
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProgressEvent {
    /// 章节即将开始下载
    ChapterStarted { title: String },
    /// 章节内部进度（由 fetcher 上报）
    ChapterProgress { title: String, percent: u8 },
    /// 批次整体进度，每完成一个章节更新一次
    BatchProgress {
        completed: usize,
        total: usize,
        percent: u8,
    },
    Log { level: LogLevel, message: String },
}

impl ProgressEvent {
    pub fn log(level: LogLevel, message: impl Into<String>) -> Self {
        ProgressEvent::Log {
            level,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::log(LogLevel::Info, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::log(LogLevel::Warning, message)
    }

    pub fn danger(message: impl Into<String>) -> Self {
        Self::log(LogLevel::Danger, message)
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::log(LogLevel::Success, message)
    }

    /// 批次进度，百分比为 `completed * 100 / total`
    pub fn batch(completed: usize, total: usize) -> Self {
        let percent = if total == 0 {
            100
        } else {
            (completed.min(total) * 100 / total) as u8
        };
        ProgressEvent::BatchProgress {
            completed,
            total,
            percent,
        }
    }
}
