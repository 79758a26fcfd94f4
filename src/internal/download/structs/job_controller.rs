//! 任务控制句柄：对外的暂停/恢复/取消/释放与状态读取接口。
//!
//! 句柄可任意克隆、跨任务传递；控制操作直接作用于暂停门与取消信号，
//! 终态事件（on_stop / on_error / on_finish）由任务主流程统一触发。

use std::sync::atomic::Ordering;
use std::sync::Arc;

use chrono::{Duration as ChronoDuration, Utc};
use tracing::debug;

use crate::internal::download::structs::chunk_progress::ChunkProgress;
use crate::internal::download::structs::download_job::path_plan::FilePlacement;
use crate::internal::download::structs::download_job::JobShared;
use crate::internal::download::structs::download_status::DownloadStatus;
use crate::internal::download::structs::progress_tracker::ProgressSnapshot;
use crate::internal::probe::ServerMetadata;
use crate::internal::states::PropertyWatcher;

/// 下载任务的控制与观测句柄。
#[derive(Clone)]
pub struct JobController {
    pub(crate) shared: Arc<JobShared>,
}

/// 控制操作。
impl JobController {
    /// 暂停下载：置暂停门，worker 在下一轮读循环处挂起。
    /// 仅在 `in_progress` 状态生效。
    pub async fn pause(&self) {
        if self.shared.current_status() != DownloadStatus::InProgress {
            return;
        }
        self.shared.gate.pause();
        self.shared.set_status(DownloadStatus::Paused);
        debug!(id = %self.shared.id, "任务已暂停");
        self.shared.observers.lock().await.run_on_pause().await;
    }

    /// 恢复下载：清暂停门并广播唤醒全部 worker。仅在 `paused` 状态生效。
    pub async fn resume(&self) {
        if self.shared.current_status() != DownloadStatus::Paused {
            return;
        }
        self.shared.gate.resume();
        self.shared.set_status(DownloadStatus::InProgress);
        debug!(id = %self.shared.id, "任务已恢复");
        self.shared.observers.lock().await.run_on_resume().await;
    }

    /// 取消下载：置取消信号并唤醒暂停中的 worker，任务随后进入 `stopped`。
    /// 接受 `in_progress` 与 `paused` 两个状态。
    pub fn cancel(&self) {
        let status = self.shared.current_status();
        if !matches!(
            status,
            DownloadStatus::InProgress | DownloadStatus::Paused
        ) {
            return;
        }
        debug!(id = %self.shared.id, "任务收到取消请求");
        self.shared.cancel.trip();
        // 唤醒阻塞在暂停门上的 worker，让它们观察到取消信号
        self.shared.gate.resume();
    }

    /// 释放任务：幂等。置取消信号、触发 on_dispose 后清空全部观察者。
    pub async fn dispose(&self) {
        if self.shared.disposed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.shared.cancel.trip();
        self.shared.gate.resume();
        let mut observers = self.shared.observers.lock().await;
        observers.run_on_dispose().await;
        observers.clear();
        debug!(id = %self.shared.id, "任务已释放");
    }
}

/// 状态读取。
impl JobController {
    pub fn id(&self) -> String {
        self.shared.id.clone()
    }

    pub fn url(&self) -> String {
        self.shared.url.clone()
    }

    pub fn status(&self) -> DownloadStatus {
        self.shared.current_status()
    }

    /// 监听状态变化。
    pub fn watch_status(&self) -> PropertyWatcher<DownloadStatus> {
        self.shared.status.watch()
    }

    /// 最近一次发布的整体进度快照。
    pub fn snapshot(&self) -> ProgressSnapshot {
        self.shared.tracker.snapshot()
    }

    /// 监听进度快照变化。
    pub fn watch_progress(&self) -> PropertyWatcher<ProgressSnapshot> {
        self.shared.tracker.watch()
    }

    pub fn bytes_done(&self) -> u64 {
        self.shared.tracker.bytes_done()
    }

    pub fn total_bytes(&self) -> u64 {
        self.shared.tracker.total_bytes()
    }

    /// 完成百分比（0～100）。
    pub fn percentage(&self) -> f64 {
        self.shared.tracker.snapshot().pct()
    }

    /// 当前速度（字节/秒）。
    pub fn current_speed(&self) -> f64 {
        self.shared.tracker.snapshot().speed_bps
    }

    /// 平均速度（字节/秒）。
    pub fn average_speed(&self) -> f64 {
        self.shared.tracker.snapshot().average_bps
    }

    /// 预计剩余时间。
    pub fn eta(&self) -> Option<std::time::Duration> {
        self.shared.tracker.snapshot().eta
    }

    /// 每个分片的进度视图；单线程下载返回空。
    pub fn chunk_progress(&self) -> Vec<ChunkProgress> {
        self.shared.tracker.chunk_progress()
    }

    /// 分片数量；单线程为 0。
    pub fn chunk_count(&self) -> usize {
        self.shared.state.lock().unwrap().chunks.len()
    }

    /// 本次运行是否为多线程分片下载。
    pub fn is_multi_stream(&self) -> bool {
        self.chunk_count() > 0
    }

    /// 探测得到的服务器元数据。
    pub fn server_metadata(&self) -> Option<ServerMetadata> {
        self.shared.state.lock().unwrap().metadata.clone()
    }

    /// 规划后的落盘位置。
    pub fn placement(&self) -> Option<FilePlacement> {
        self.shared.state.lock().unwrap().placement.clone()
    }

    /// 输出文件名，路径规划完成前为 None。
    pub fn filename(&self) -> Option<String> {
        self.placement().map(|p| p.filename)
    }

    /// 输出完整路径，路径规划完成前为 None。
    pub fn output_path(&self) -> Option<std::path::PathBuf> {
        self.placement().map(|p| p.full_path)
    }

    /// 终态错误描述；任务未失败时为 None。
    pub fn last_error(&self) -> Option<String> {
        self.shared.state.lock().unwrap().last_error.clone()
    }

    /// 已运行时长；未开始为 None，运行中按当前时间计。
    pub fn elapsed(&self) -> Option<ChronoDuration> {
        let state = self.shared.state.lock().unwrap();
        let started = state.started_at?;
        let ended = state.ended_at.unwrap_or_else(Utc::now);
        Some(ended - started)
    }
}
