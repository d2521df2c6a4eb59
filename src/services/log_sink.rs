//! 日志输出 - 业务能力层
//!
//! 批处理线程只往这里追加行，前端按自己的节奏取走。

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::debug;

/// 线程安全、只追加的日志通道
///
/// 入队顺序即输出顺序。
#[derive(Debug, Clone)]
pub struct LogSink {
    tx: UnboundedSender<String>,
}

impl LogSink {
    /// 创建日志通道，返回 (写端, 读端)
    pub fn channel() -> (Self, UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// 追加一行（不含换行符）
    ///
    /// 读端已关闭时静默丢弃，批处理照常进行。
    pub fn line(&self, line: impl Into<String>) {
        if self.tx.send(line.into()).is_err() {
            debug!("日志读端已关闭，丢弃一行");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_order_preserved_across_threads() {
        let (sink, mut rx) = LogSink::channel();
        let writer = sink.clone();
        std::thread::spawn(move || {
            for i in 0..100 {
                writer.line(format!("line {}", i));
            }
        })
        .join()
        .unwrap();
        drop(sink);

        let mut lines = Vec::new();
        while let Some(line) = rx.recv().await {
            lines.push(line);
        }
        let expected: Vec<String> = (0..100).map(|i| format!("line {}", i)).collect();
        assert_eq!(lines, expected);
    }

    #[test]
    fn test_closed_receiver_is_ignored() {
        let (sink, rx) = LogSink::channel();
        drop(rx);
        sink.line("无人接收");
    }
}
