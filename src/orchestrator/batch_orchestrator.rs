//! 批量章节下载器 - 编排层
//!
//! ## 职责
//!
//! 接收一组章节描述，在并发上限内调度 `ChapterFetcher`，汇总每个章节的结果。
//!
//! ## 核心规则
//!
//! 1. **并发控制**：Semaphore 限制同时进行的 fetch 数量，permit 在整个 fetch 期间持有
//! 2. **启动顺序**：总是优先启动章节号最小的未开始章节（完成顺序不保证）
//! 3. **协作式取消**：每次启动前检查取消标记；已开始的章节会正常结束并记录真实结果
//! 4. **失败隔离**：单个章节的错误或 panic 只会变成该章节的 `Outcome::Failed`
//! 5. **消息传递**：worker 通过通道发送事件，只有 `submit` 调用 `ProgressSink`

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use futures::FutureExt;
use tokio::sync::{mpsc, Mutex, OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinError;
use tracing::{debug, error, info};

use crate::error::{AppError, AppResult};
use crate::models::chapter::compare_chapters;
use crate::models::{BatchResult, ChapterDescriptor, Outcome, ProgressEvent};
use crate::progress::ProgressSink;
use crate::workflow::{ChapterFetcher, ChapterProgress};

/// 空批次时发出的警告
pub const EMPTY_BATCH_MESSAGE: &str = "No chapters to download";

/// 取消句柄
///
/// 可以跨任务/线程克隆；`cancel()` 幂等，任何时候调用都不会阻塞
#[derive(Debug, Clone, Default)]
pub struct CancelHandle {
    flag: Arc<AtomicBool>,
}

impl CancelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        if !self.flag.swap(true, Ordering::SeqCst) {
            info!("🛑 收到取消请求，不再启动新的章节");
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// 结果收集槽位，每个提交的章节一个
#[derive(Debug, Clone)]
enum Slot {
    Pending,
    Running,
    Done(Outcome),
}

type EventTx = mpsc::UnboundedSender<ProgressEvent>;

/// 批量下载编排器
///
/// 一个实例对应一次批量任务，`submit` 会消耗它
#[derive(Debug)]
pub struct BatchOrchestrator {
    concurrency_limit: usize,
    cancel: CancelHandle,
}

impl BatchOrchestrator {
    /// 创建编排器，并发数必须 >= 1
    pub fn new(concurrency_limit: usize) -> AppResult<Self> {
        if concurrency_limit < 1 || concurrency_limit > Semaphore::MAX_PERMITS {
            return Err(AppError::InvalidConcurrency(concurrency_limit));
        }
        Ok(Self {
            concurrency_limit,
            cancel: CancelHandle::new(),
        })
    }

    pub fn concurrency_limit(&self) -> usize {
        self.concurrency_limit
    }

    /// 获取取消句柄（可在提交前获取并交给其他任务）
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// 执行批量下载
    ///
    /// 每个提交的章节都会得到且只得到一个 `Outcome`
    pub async fn submit<F, S>(
        self,
        descriptors: Vec<ChapterDescriptor>,
        fetcher: Arc<F>,
        sink: &mut S,
    ) -> BatchResult
    where
        F: ChapterFetcher + ?Sized + 'static,
        S: ProgressSink + ?Sized,
    {
        let total = descriptors.len();
        if total == 0 {
            sink.emit(ProgressEvent::warning(EMPTY_BATCH_MESSAGE));
            return BatchResult::default();
        }

        info!(
            "📦 开始批量下载: {} 个章节, 最大并发数 {}",
            total, self.concurrency_limit
        );

        let descriptors = Arc::new(descriptors);
        let slots = Arc::new(Mutex::new(vec![Slot::Pending; total]));
        let (tx, mut rx) = mpsc::unbounded_channel();

        let dispatcher = tokio::spawn(dispatch(Dispatch {
            descriptors: descriptors.clone(),
            slots: slots.clone(),
            fetcher,
            concurrency_limit: self.concurrency_limit,
            cancel: self.cancel.clone(),
            tx,
        }));

        // 所有发送端（调度器和每个章节任务）结束后通道关闭
        while let Some(event) = rx.recv().await {
            sink.emit(event);
        }

        if let Err(e) = dispatcher.await {
            error!("调度任务异常退出: {}", e);
        }

        let slots = slots.lock().await.clone();
        let entries = descriptors
            .iter()
            .cloned()
            .zip(slots)
            .map(|(chapter, slot)| {
                let outcome = match slot {
                    Slot::Done(outcome) => outcome,
                    Slot::Pending => Outcome::Cancelled,
                    Slot::Running => Outcome::Failed {
                        reason: "download task aborted".to_string(),
                    },
                };
                (chapter, outcome)
            })
            .collect();
        let result = BatchResult::new(entries);

        sink.emit(ProgressEvent::info(format!(
            "Batch finished: {} succeeded, {} failed, {} cancelled",
            result.succeeded, result.failed, result.cancelled
        )));
        info!(
            "✓ 批量下载结束: 成功 {}, 失败 {}, 取消 {}",
            result.succeeded, result.failed, result.cancelled
        );

        result
    }
}

struct Dispatch<F: ?Sized> {
    descriptors: Arc<Vec<ChapterDescriptor>>,
    slots: Arc<Mutex<Vec<Slot>>>,
    fetcher: Arc<F>,
    concurrency_limit: usize,
    cancel: CancelHandle,
    tx: EventTx,
}

/// 章节的启动顺序：章节号升序，无章节号的在最后，相同的保持提交顺序
fn start_order(descriptors: &[ChapterDescriptor]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..descriptors.len()).collect();
    order.sort_by(|&a, &b| compare_chapters(&descriptors[a], &descriptors[b]));
    order
}

async fn dispatch<F>(job: Dispatch<F>)
where
    F: ChapterFetcher + ?Sized + 'static,
{
    let total = job.descriptors.len();
    let semaphore = Arc::new(Semaphore::new(job.concurrency_limit));
    let completed = Arc::new(AtomicUsize::new(0));
    let mut handles = Vec::with_capacity(total);

    for (position, index) in start_order(&job.descriptors).into_iter().enumerate() {
        // 等待空闲槽位；semaphore 不会被关闭
        let Ok(permit) = semaphore.clone().acquire_owned().await else {
            break;
        };

        if job.cancel.is_cancelled() {
            let skipped = total - position;
            debug!("取消生效，{} 个章节未开始", skipped);
            let _ = job.tx.send(ProgressEvent::warning(format!(
                "Download cancelled; {} chapter(s) not started",
                skipped
            )));
            break;
        }

        let chapter = job.descriptors[index].clone();
        job.slots.lock().await[index] = Slot::Running;
        let _ = job.tx.send(ProgressEvent::ChapterStarted {
            title: chapter.title().to_string(),
        });

        let handle = tokio::spawn(run_chapter(ChapterTask {
            index,
            total,
            chapter,
            fetcher: job.fetcher.clone(),
            slots: job.slots.clone(),
            completed: completed.clone(),
            tx: job.tx.clone(),
            _permit: permit,
        }));
        handles.push((index, handle));
    }

    for (index, handle) in handles {
        if let Err(e) = handle.await {
            // fetch 之外的异常（例如任务被运行时取消），章节结果尚未记录
            let reason = join_error_reason(e);
            let title = job.descriptors[index].title().to_string();
            error!("[{}] 下载任务异常: {}", title, reason);

            let outcome = failed(&job.tx, &title, reason);
            job.slots.lock().await[index] = Slot::Done(outcome);
            let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
            let _ = job.tx.send(ProgressEvent::batch(done, total));
        }
    }
}

struct ChapterTask<F: ?Sized> {
    index: usize,
    total: usize,
    chapter: ChapterDescriptor,
    fetcher: Arc<F>,
    slots: Arc<Mutex<Vec<Slot>>>,
    completed: Arc<AtomicUsize>,
    tx: EventTx,
    /// 持有到任务结束，释放后下一个章节才能开始
    _permit: OwnedSemaphorePermit,
}

async fn run_chapter<F>(task: ChapterTask<F>)
where
    F: ChapterFetcher + ?Sized + 'static,
{
    let title = task.chapter.title().to_string();
    let progress = ChapterProgress::new(title.clone(), task.tx.clone());

    debug!("[{}] 开始 fetch", title);
    // panic 与普通错误走同一条路径，章节结束时立即记录
    let result = AssertUnwindSafe(task.fetcher.fetch(&task.chapter, progress))
        .catch_unwind()
        .await;
    let outcome = match result {
        Ok(Ok(())) => {
            let _ = task
                .tx
                .send(ProgressEvent::success(format!("Downloaded {}", title)));
            Outcome::Success
        }
        Ok(Err(e)) => failed(&task.tx, &title, e.to_string()),
        Err(payload) => {
            let reason = format!("fetch panicked: {}", panic_message(payload));
            error!("[{}] 下载任务异常: {}", title, reason);
            failed(&task.tx, &title, reason)
        }
    };

    task.slots.lock().await[task.index] = Slot::Done(outcome);
    let done = task.completed.fetch_add(1, Ordering::SeqCst) + 1;
    let _ = task.tx.send(ProgressEvent::batch(done, task.total));
}

fn failed(tx: &EventTx, title: &str, reason: String) -> Outcome {
    let _ = tx.send(ProgressEvent::danger(format!(
        "Failed to download {}: {}",
        title, reason
    )));
    Outcome::Failed { reason }
}

fn join_error_reason(e: JoinError) -> String {
    if e.is_panic() {
        format!("fetch panicked: {}", panic_message(e.into_panic()))
    } else {
        "download task cancelled by runtime".to_string()
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_zero_concurrency() {
        assert!(matches!(
            BatchOrchestrator::new(0),
            Err(AppError::InvalidConcurrency(0))
        ));
        assert_eq!(BatchOrchestrator::new(3).unwrap().concurrency_limit(), 3);
    }

    #[test]
    fn cancel_is_idempotent_and_shared() {
        let orchestrator = BatchOrchestrator::new(1).unwrap();
        let handle = orchestrator.cancel_handle();
        assert!(!handle.is_cancelled());

        orchestrator.cancel();
        handle.cancel();
        handle.cancel();

        assert!(handle.is_cancelled());
        assert!(orchestrator.cancel_handle().is_cancelled());
    }

    #[test]
    fn start_order_prefers_lowest_number() {
        let descriptors = vec![
            ChapterDescriptor::new("Chapter 3", "c"),
            ChapterDescriptor::new("Bonus", "x"),
            ChapterDescriptor::new("Chapter 1", "a"),
            ChapterDescriptor::new("Chapter 1", "a2"),
        ];
        assert_eq!(start_order(&descriptors), vec![2, 3, 0, 1]);
    }

    #[test]
    fn panic_message_handles_common_payloads() {
        assert_eq!(panic_message(Box::new("boom")), "boom");
        assert_eq!(panic_message(Box::new(String::from("bang"))), "bang");
        assert_eq!(panic_message(Box::new(42_u8)), "unknown panic");
    }
}
