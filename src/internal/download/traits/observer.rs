//! 下载观察者 trait：在任务生命周期各节点插入自定义逻辑。
//!
//! 所有方法默认空实现，按需覆写。调用保证发生在锁临界区之外；
//! 同一分片的回调在其 worker 内串行，跨分片的回调可能交错。

use async_trait::async_trait;

use crate::internal::download::structs::download_error::DownloadError;
use crate::internal::download::structs::progress_tracker::ProgressSnapshot;

/// 下载流程观察者。
///
/// 注册方式二选一（可混用）：
/// - **单事件**：用任务构建器的 `with_on_progress` / `with_on_finish` /
///   `with_on_error` 传入闭包；
/// - **完整观察者**：实现本 trait，通过构建器的 `with_observer` 注册。
#[async_trait]
pub trait DownloadObserver: Send + Sync {
    /// 任务进入下载状态后、一切分片事件之前调用。
    async fn on_start(&mut self) {}

    /// 进度事件，约每秒一次。
    async fn on_progress(&mut self, _snapshot: &ProgressSnapshot) {}

    /// 暂停生效后调用。
    async fn on_pause(&mut self) {}

    /// 恢复生效后调用。
    async fn on_resume(&mut self) {}

    /// 任务成功完成后调用。
    async fn on_finish(&mut self) {}

    /// 任务失败终止时调用，携带终态错误。
    async fn on_error(&mut self, _error: &DownloadError) {}

    /// 任务被取消终止时调用。
    async fn on_stop(&mut self) {}

    /// 某分片开始下载。
    async fn on_chunk_start(&mut self, _index: usize, _start: u64, _end: u64) {}

    /// 某分片下载完成，`bytes_written` 为该 worker 实际写入的字节数。
    async fn on_chunk_finish(&mut self, _index: usize, _start: u64, _end: u64, _bytes_written: u64) {
    }

    /// 某分片最终失败（重试耗尽或不可重试错误）。
    async fn on_chunk_error(&mut self, _index: usize, _start: u64, _end: u64, _error: &DownloadError) {
    }

    /// 开始把分片合并为最终文件。
    async fn on_assemble_start(&mut self) {}

    /// 合并完成。
    async fn on_assemble_finish(&mut self) {}

    /// 合并失败。
    async fn on_assemble_error(&mut self, _error: &DownloadError) {}

    /// 任务被释放。
    async fn on_dispose(&mut self) {}
}
