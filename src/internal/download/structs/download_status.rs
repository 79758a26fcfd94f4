//! 下载任务状态（由任务内部维护，外部只读监听）。
//!
//! 状态机：`queued → in_progress ⇄ paused`；
//! `in_progress → completed | failed | stopped`；`paused → stopped`。

/// 下载任务生命周期状态。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadStatus {
    /// 已创建，尚未开始
    Queued,
    /// 下载中
    InProgress,
    /// 已暂停
    Paused,
    /// 成功完成
    Completed,
    /// 失败终止
    Failed,
    /// 被取消终止
    Stopped,
}

impl DownloadStatus {
    /// 对外的状态字符串常量。
    pub fn as_str(&self) -> &'static str {
        match self {
            DownloadStatus::Queued => "queued",
            DownloadStatus::InProgress => "in_progress",
            DownloadStatus::Paused => "paused",
            DownloadStatus::Completed => "completed",
            DownloadStatus::Failed => "failed",
            DownloadStatus::Stopped => "stopped",
        }
    }

    /// 是否为终态（completed / failed / stopped）。
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            DownloadStatus::Completed | DownloadStatus::Failed | DownloadStatus::Stopped
        )
    }
}

impl std::fmt::Display for DownloadStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
