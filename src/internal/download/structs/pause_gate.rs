//! 暂停门：任意数量的 worker 可同时阻塞等待，恢复时广播唤醒全部。
//!
//! 基于互斥标志 + [`tokio::sync::Notify`]。`wait_if_paused` 先注册通知
//! 监听器再检查标志，保证检查与挂起之间不会错过 `resume` 的唤醒。

use std::sync::{Arc, Mutex};

use tokio::sync::Notify;

struct GateInner {
    paused: Mutex<bool>,
    notify: Notify,
}

/// 暂停/恢复协调原语。Clone 得到同一扇门的句柄。
#[derive(Clone)]
pub struct PauseGate {
    inner: Arc<GateInner>,
}

impl Default for PauseGate {
    fn default() -> Self {
        Self::new()
    }
}

impl PauseGate {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(GateInner {
                paused: Mutex::new(false),
                notify: Notify::new(),
            }),
        }
    }

    /// 置为暂停；已暂停时无效果。
    pub fn pause(&self) {
        *self.inner.paused.lock().unwrap() = true;
    }

    /// 清除暂停并广播唤醒所有等待者。
    pub fn resume(&self) {
        *self.inner.paused.lock().unwrap() = false;
        self.inner.notify.notify_waiters();
    }

    pub fn is_paused(&self) -> bool {
        *self.inner.paused.lock().unwrap()
    }

    /// 暂停期间挂起当前任务，直到 `resume` 唤醒；未暂停时立即返回。
    pub async fn wait_if_paused(&self) {
        loop {
            let notified = self.inner.notify.notified();
            if !*self.inner.paused.lock().unwrap() {
                return;
            }
            notified.await;
        }
    }
}

impl std::fmt::Debug for PauseGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PauseGate")
            .field("paused", &self.is_paused())
            .finish()
    }
}
