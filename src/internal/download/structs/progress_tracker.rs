//! 进度聚合：全局字节计数（原子累加）+ 速度/均速/ETA 快照（短临界区）。
//!
//! worker 只调用 `add_bytes` / `add_chunk_bytes`；快照由采样方按固定节奏
//! 调用 [`ProgressTracker::sample`] 生成，速度按 ≥1 秒窗口计算并做 EMA
//! 平滑，避免单次大块读把瞬时速度打出尖峰。

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};

use crate::internal::states::{PropertyWatcher, ReactiveProperty};

use super::chunk_descriptor::ChunkDescriptor;
use super::chunk_progress::ChunkProgress;

/// 速度采样窗口：窗口未满时 `sample` 不产出新快照。
pub const SPEED_SAMPLE_INTERVAL: Duration = Duration::from_secs(1);

/// EMA 平滑系数：新窗口瞬时速度占三成。
const SPEED_EMA_ALPHA: f64 = 0.3;

/// 整体进度快照。
#[derive(Debug, Clone, Default)]
pub struct ProgressSnapshot {
    /// 已完成字节数
    pub bytes_done: u64,
    /// 总字节数，未知为 0
    pub total_bytes: u64,
    /// 当前速度（字节/秒，EMA 平滑）
    pub speed_bps: f64,
    /// 自开始以来的平均速度（字节/秒）
    pub average_bps: f64,
    /// 预计剩余时间；速度或总量未知时为 None
    pub eta: Option<Duration>,
    /// 本次运行的开始时间
    pub started_at: Option<DateTime<Utc>>,
}

impl ProgressSnapshot {
    /// 进度百分比，收敛到 [0, 100]；总量未知返回 0。
    pub fn pct(&self) -> f64 {
        if self.total_bytes == 0 {
            return 0.0;
        }
        (self.bytes_done as f64 / self.total_bytes as f64 * 100.0).clamp(0.0, 100.0)
    }
}

/// 计时状态。
#[derive(Default)]
struct Timing {
    started_instant: Option<Instant>,
    started_at: Option<DateTime<Utc>>,
}

/// 速度窗口状态。
#[derive(Default)]
struct SpeedState {
    last_sample: Option<Instant>,
    last_bytes: u64,
    ema_bps: f64,
}

struct TrackerInner {
    bytes_done: AtomicU64,
    total_bytes: AtomicU64,
    timing: Mutex<Timing>,
    speed: Mutex<SpeedState>,
    snapshot: ReactiveProperty<ProgressSnapshot>,
    chunks: Mutex<Vec<ChunkProgress>>,
}

/// 进度聚合器。Clone 得到同一份状态的句柄。
#[derive(Clone)]
pub struct ProgressTracker {
    inner: Arc<TrackerInner>,
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(TrackerInner {
                bytes_done: AtomicU64::new(0),
                total_bytes: AtomicU64::new(0),
                timing: Mutex::new(Timing::default()),
                speed: Mutex::new(SpeedState::default()),
                snapshot: ReactiveProperty::new(ProgressSnapshot::default()),
                chunks: Mutex::new(Vec::new()),
            }),
        }
    }

    /// 本次运行开始：清零计数、记录起始时间。同一任务重启时再次调用。
    pub fn begin_run(&self, total: u64) {
        self.inner.bytes_done.store(0, Ordering::SeqCst);
        self.inner.total_bytes.store(total, Ordering::SeqCst);
        {
            let mut timing = self.inner.timing.lock().unwrap();
            timing.started_instant = Some(Instant::now());
            timing.started_at = Some(Utc::now());
        }
        {
            let mut speed = self.inner.speed.lock().unwrap();
            *speed = SpeedState::default();
        }
        self.inner.chunks.lock().unwrap().clear();
        let _ = self.inner.snapshot.update(self.build_snapshot());
    }

    /// 总大小在下载途中才得知时更新（单线程 + 未知大小场景）。
    pub fn set_total(&self, total: u64) {
        self.inner.total_bytes.store(total, Ordering::SeqCst);
    }

    /// 仅清零字节计数，不碰计时与速度状态。
    /// 整文件从头重试（续传被拒或不支持 Range）时避免重复累计用。
    pub fn reset_bytes(&self) {
        self.inner.bytes_done.store(0, Ordering::SeqCst);
    }

    pub fn total_bytes(&self) -> u64 {
        self.inner.total_bytes.load(Ordering::SeqCst)
    }

    /// 原子累加已完成字节，返回累加后的值。单调不减。
    pub fn add_bytes(&self, delta: u64) -> u64 {
        self.inner.bytes_done.fetch_add(delta, Ordering::Relaxed) + delta
    }

    pub fn bytes_done(&self) -> u64 {
        self.inner.bytes_done.load(Ordering::Relaxed)
    }

    /// 采样：速度窗口（≥1 秒）走满时产出新快照并通知监听者，否则返回 None。
    pub fn sample(&self) -> Option<ProgressSnapshot> {
        let now = Instant::now();
        let current = self.bytes_done();

        {
            let mut speed = self.inner.speed.lock().unwrap();
            match speed.last_sample {
                None => {
                    speed.last_sample = Some(now);
                    speed.last_bytes = current;
                    return None;
                }
                Some(last) => {
                    let elapsed = now.duration_since(last);
                    if elapsed < SPEED_SAMPLE_INTERVAL {
                        return None;
                    }
                    let delta = current.saturating_sub(speed.last_bytes);
                    let instant_bps = delta as f64 / elapsed.as_secs_f64();
                    speed.ema_bps = if speed.ema_bps == 0.0 {
                        instant_bps
                    } else {
                        SPEED_EMA_ALPHA * instant_bps + (1.0 - SPEED_EMA_ALPHA) * speed.ema_bps
                    };
                    speed.last_sample = Some(now);
                    speed.last_bytes = current;
                }
            }
        }

        let snapshot = self.build_snapshot();
        let _ = self.inner.snapshot.update(snapshot.clone());
        Some(snapshot)
    }

    /// 以当前状态构造快照并通知监听者，不受速度窗口限制（结束时用）。
    pub fn publish_snapshot(&self) -> ProgressSnapshot {
        let snapshot = self.build_snapshot();
        let _ = self.inner.snapshot.update(snapshot.clone());
        snapshot
    }

    /// 最近一次发布的快照。
    pub fn snapshot(&self) -> ProgressSnapshot {
        self.inner.snapshot.get_current().unwrap_or_default()
    }

    /// 监听快照变化。
    pub fn watch(&self) -> PropertyWatcher<ProgressSnapshot> {
        self.inner.snapshot.watch()
    }

    fn build_snapshot(&self) -> ProgressSnapshot {
        let bytes_done = self.bytes_done();
        let total_bytes = self.total_bytes();
        let timing = self.inner.timing.lock().unwrap();
        let speed_bps = self.inner.speed.lock().unwrap().ema_bps;

        let average_bps = timing
            .started_instant
            .map(|t| {
                let secs = t.elapsed().as_secs_f64();
                if secs > 0.0 {
                    bytes_done as f64 / secs
                } else {
                    0.0
                }
            })
            .unwrap_or(0.0);

        let eta = if speed_bps > 0.0 && total_bytes > bytes_done {
            Some(Duration::from_secs_f64(
                (total_bytes - bytes_done) as f64 / speed_bps,
            ))
        } else {
            None
        };

        ProgressSnapshot {
            bytes_done,
            total_bytes,
            speed_bps,
            average_bps,
            eta,
            started_at: timing.started_at,
        }
    }
}

/// 分片进度视图。
impl ProgressTracker {
    /// 按分片规划初始化每片的进度槽位。
    pub fn init_chunks(&self, descriptors: &[ChunkDescriptor]) {
        let mut chunks = self.inner.chunks.lock().unwrap();
        *chunks = descriptors
            .iter()
            .map(|d| ChunkProgress {
                index: d.index,
                bytes_downloaded: 0,
                expected_total: d.size,
                is_complete: false,
            })
            .collect();
    }

    /// 累加某分片的已下载字节。
    pub fn add_chunk_bytes(&self, index: usize, delta: u64) {
        let mut chunks = self.inner.chunks.lock().unwrap();
        if let Some(chunk) = chunks.get_mut(index) {
            chunk.bytes_downloaded += delta;
        }
    }

    /// 标记某分片完成。
    pub fn set_chunk_complete(&self, index: usize) {
        let mut chunks = self.inner.chunks.lock().unwrap();
        if let Some(chunk) = chunks.get_mut(index) {
            chunk.bytes_downloaded = chunk.expected_total;
            chunk.is_complete = true;
        }
    }

    /// 每个分片的进度快照；单线程下载时为空。
    pub fn chunk_progress(&self) -> Vec<ChunkProgress> {
        self.inner.chunks.lock().unwrap().clone()
    }
}
