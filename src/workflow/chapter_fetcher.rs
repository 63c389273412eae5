//! 章节下载能力的抽象
//!
//! 编排层只认识 `ChapterFetcher`，具体是浏览器截图还是直接下载由实现决定

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{mpsc, Mutex};

use crate::error::FetchError;
use crate::models::{sanitize_file_name, ChapterDescriptor, ChapterMetadata, LogLevel, ProgressEvent};

/// 下载单个章节
///
/// 必须可以对不同章节并发调用。超时由实现自行处理。
#[async_trait]
pub trait ChapterFetcher: Send + Sync {
    async fn fetch(
        &self,
        chapter: &ChapterDescriptor,
        progress: ChapterProgress,
    ) -> Result<(), FetchError>;
}

/// 章节内部进度上报
///
/// 事件经由编排层的通道转发到 `ProgressSink`
#[derive(Debug, Clone)]
pub struct ChapterProgress {
    title: String,
    tx: Option<mpsc::UnboundedSender<ProgressEvent>>,
}

impl ChapterProgress {
    pub(crate) fn new(title: impl Into<String>, tx: mpsc::UnboundedSender<ProgressEvent>) -> Self {
        Self {
            title: title.into(),
            tx: Some(tx),
        }
    }

    /// 不上报任何事件
    pub fn detached(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            tx: None,
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn report(&self, percent: u8) {
        self.send(ProgressEvent::ChapterProgress {
            title: self.title.clone(),
            percent: percent.min(100),
        });
    }

    /// 按 `done / total` 上报
    pub fn report_fraction(&self, done: usize, total: usize) {
        let percent = if total == 0 {
            100
        } else {
            (done.min(total) * 100 / total) as u8
        };
        self.report(percent);
    }

    pub fn log(&self, level: LogLevel, message: impl Into<String>) {
        self.send(ProgressEvent::log(level, message));
    }

    fn send(&self, event: ProgressEvent) {
        if let Some(tx) = &self.tx {
            let _ = tx.send(event);
        }
    }
}

/// 下载目录布局：`<root>/<漫画标题>/<章节标题>/`
///
/// 同一批次中目录名不会重复：净化后同名（或重复提交）的章节依次使用
/// `<章节标题> (2)`、`<章节标题> (3)`……
#[derive(Debug, Clone)]
pub struct ChapterLayout {
    root: PathBuf,
    manga_title: String,
    /// 已分配的目录名（小写，兼容大小写不敏感的文件系统）
    claimed: Arc<Mutex<HashSet<String>>>,
}

impl ChapterLayout {
    pub fn new(root: impl Into<PathBuf>, manga_title: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            manga_title: manga_title.into(),
            claimed: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    pub fn manga_title(&self) -> &str {
        &self.manga_title
    }

    pub fn manga_dir(&self) -> PathBuf {
        self.root.join(sanitize_file_name(&self.manga_title))
    }

    /// 章节的首选目录，未与其他章节冲突时即为实际目录
    pub fn chapter_dir(&self, chapter: &ChapterDescriptor) -> PathBuf {
        self.manga_dir().join(chapter.sanitized_title())
    }

    /// 为章节分配一个本批次内唯一的目录，创建后返回路径
    pub async fn prepare(&self, chapter: &ChapterDescriptor) -> Result<PathBuf, FetchError> {
        let dir = self.manga_dir().join(self.claim_dir_name(chapter).await);
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| FetchError::io(&dir, e))?;
        Ok(dir)
    }

    async fn claim_dir_name(&self, chapter: &ChapterDescriptor) -> String {
        let base = chapter.sanitized_title();
        let mut claimed = self.claimed.lock().await;
        let mut name = base.clone();
        let mut n = 2;
        while !claimed.insert(name.to_lowercase()) {
            name = format!("{} ({})", base, n);
            n += 1;
        }
        name
    }

    pub fn metadata(&self, chapter: &ChapterDescriptor) -> ChapterMetadata {
        ChapterMetadata {
            manga_title: self.manga_title.clone(),
            chapter_title: chapter.title().to_string(),
            chapter_url: chapter.source_locator().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_sanitizes_both_levels() {
        let layout = ChapterLayout::new("/data", "Solo: Leveling");
        let chapter = ChapterDescriptor::new("Chapter 1 / Part 2", "u");
        assert_eq!(
            layout.chapter_dir(&chapter),
            PathBuf::from("/data/Solo_ Leveling/Chapter 1 _ Part 2")
        );
    }

    #[test]
    fn progress_clamps_and_forwards() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let progress = ChapterProgress::new("Chapter 1", tx);
        progress.report(150);
        progress.report_fraction(1, 4);

        assert_eq!(
            rx.try_recv().unwrap(),
            ProgressEvent::ChapterProgress {
                title: "Chapter 1".into(),
                percent: 100
            }
        );
        assert_eq!(
            rx.try_recv().unwrap(),
            ProgressEvent::ChapterProgress {
                title: "Chapter 1".into(),
                percent: 25
            }
        );
    }

    #[test]
    fn detached_progress_is_silent() {
        ChapterProgress::detached("x").report(50);
    }

    #[test]
    fn prepare_creates_nested_directories() {
        let root = tempfile::tempdir().unwrap();
        let layout = ChapterLayout::new(root.path(), "Manga");
        let chapter = ChapterDescriptor::new("Chapter 2", "u");

        let dir = tokio_test::block_on(layout.prepare(&chapter)).unwrap();

        assert_eq!(dir, root.path().join("Manga").join("Chapter 2"));
        assert!(dir.is_dir());
    }

    #[test]
    fn colliding_titles_get_distinct_directories() {
        let root = tempfile::tempdir().unwrap();
        let layout = ChapterLayout::new(root.path(), "M");
        let colon = ChapterDescriptor::new("Chapter 1: Start", "a");
        let question = ChapterDescriptor::new("Chapter 1? Start", "b");
        let upper = ChapterDescriptor::new("CHAPTER 1: START", "c");

        // 首选目录相同
        assert_eq!(layout.chapter_dir(&colon), layout.chapter_dir(&question));

        let dirs: Vec<PathBuf> = [&colon, &question, &upper, &colon]
            .into_iter()
            .map(|c| tokio_test::block_on(layout.prepare(c)).unwrap())
            .collect();

        let manga_dir = root.path().join("M");
        assert_eq!(dirs[0], manga_dir.join("Chapter 1_ Start"));
        assert_eq!(dirs[1], manga_dir.join("Chapter 1_ Start (2)"));
        assert_eq!(dirs[2], manga_dir.join("CHAPTER 1_ START (3)"));
        assert_eq!(dirs[3], manga_dir.join("Chapter 1_ Start (4)"));
        assert!(dirs.iter().all(|d| d.is_dir()));
    }

    #[test]
    fn cloned_layout_shares_claims() {
        let root = tempfile::tempdir().unwrap();
        let layout = ChapterLayout::new(root.path(), "M");
        let other = layout.clone();
        let chapter = ChapterDescriptor::new("Chapter 9", "u");

        let first = tokio_test::block_on(layout.prepare(&chapter)).unwrap();
        let second = tokio_test::block_on(other.prepare(&chapter)).unwrap();

        assert_ne!(first, second);
    }
}
