//! 进度输出
//!
//! 编排层只通过 `ProgressSink` 输出进度，不直接接触界面状态。
//! 命令行和图形界面各自提供一个实现。

mod console;

pub use console::ConsoleSink;

use tokio::sync::mpsc;

use crate::models::ProgressEvent;

/// 进度事件接收方
///
/// 投递是尽力而为的，不需要确认
pub trait ProgressSink {
    fn emit(&mut self, event: ProgressEvent);
}

/// 记录所有事件（测试和批处理汇总用）
impl ProgressSink for Vec<ProgressEvent> {
    fn emit(&mut self, event: ProgressEvent) {
        self.push(event);
    }
}

impl<S: ProgressSink + ?Sized> ProgressSink for &mut S {
    fn emit(&mut self, event: ProgressEvent) {
        (**self).emit(event);
    }
}

/// 通过通道转发事件，供图形界面在自己的线程中消费
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<ProgressEvent>,
}

impl ChannelSink {
    pub fn new(tx: mpsc::UnboundedSender<ProgressEvent>) -> Self {
        Self { tx }
    }

    /// 创建一对 sink / receiver
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<ProgressEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl ProgressSink for ChannelSink {
    fn emit(&mut self, event: ProgressEvent) {
        // 接收方已关闭（界面退出）时直接丢弃
        let _ = self.tx.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_sink_forwards_in_order() {
        let (mut sink, mut rx) = ChannelSink::channel();
        sink.emit(ProgressEvent::info("a"));
        sink.emit(ProgressEvent::batch(1, 2));

        assert_eq!(rx.try_recv().unwrap(), ProgressEvent::info("a"));
        assert_eq!(rx.try_recv().unwrap(), ProgressEvent::batch(1, 2));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn channel_sink_ignores_closed_receiver() {
        let (mut sink, rx) = ChannelSink::channel();
        drop(rx);
        sink.emit(ProgressEvent::danger("nobody listens"));
    }

    #[test]
    fn vec_sink_records_through_mut_ref() {
        fn emit_warning<S: ProgressSink>(mut sink: S) {
            sink.emit(ProgressEvent::warning("w"));
        }

        let mut events: Vec<ProgressEvent> = Vec::new();
        emit_warning(&mut events);
        assert_eq!(events, vec![ProgressEvent::warning("w")]);
    }
}
