//! 单个分片的进度计数，由对应 worker 更新、聚合器读取。

/// 分片进度视图。
#[derive(Debug, Clone, Default)]
pub struct ChunkProgress {
    /// 分片下标
    pub index: usize,
    /// 已下载字节数
    pub bytes_downloaded: u64,
    /// 预期总字节数
    pub expected_total: u64,
    /// 是否已完成
    pub is_complete: bool,
}

impl ChunkProgress {
    /// 进度百分比（0～100）；预期总量为 0 时返回 0。
    pub fn pct(&self) -> f64 {
        if self.expected_total == 0 {
            return 0.0;
        }
        (self.bytes_downloaded as f64 / self.expected_total as f64 * 100.0).clamp(0.0, 100.0)
    }
}
