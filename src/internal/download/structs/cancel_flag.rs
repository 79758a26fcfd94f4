//! 取消信号：一次性置位，各 worker 在读循环间轮询观察。

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// 协作式取消标志。Clone 得到同一信号的句柄。
#[derive(Clone, Debug, Default)]
pub struct CancelFlag {
    tripped: Arc<AtomicBool>,
}

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// 置位取消信号。
    pub fn trip(&self) {
        self.tripped.store(true, Ordering::SeqCst);
    }

    pub fn is_tripped(&self) -> bool {
        self.tripped.load(Ordering::SeqCst)
    }

    /// 复位，用于同一任务再次启动。
    pub fn reset(&self) {
        self.tripped.store(false, Ordering::SeqCst);
    }
}
