//! 下载策略选择：单线程整流 vs 多线程分片。

use crate::internal::download::structs::user_preferences::UserPreferences;
use crate::internal::probe::ServerMetadata;
use crate::internal::settings::Settings;

/// 选定的下载策略。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadStrategy {
    /// 单线程顺序下载
    Single,
    /// 多线程分片下载
    Multi { workers: usize },
}

/// 按文件大小自动选择线程数。
pub fn auto_worker_count(size: u64) -> usize {
    const MIB: u64 = 1024 * 1024;
    if size < 10 * MIB {
        2
    } else if size < 100 * MIB {
        4
    } else if size < 1024 * MIB {
        8
    } else {
        12
    }
}

/// 选择策略时的参数（形参超过 3 个，用 struct 承载）。
pub struct SelectStrategyParams<'a> {
    pub metadata: &'a ServerMetadata,
    pub prefs: &'a UserPreferences,
    pub settings: &'a Settings,
}

/// 多线程分片的充要条件：支持 Range ∧ 大小已知 ∧ 达到门槛 ∧ 线程数 > 1。
/// 任一条件不满足即走单线程。
pub fn select_strategy(params: SelectStrategyParams<'_>) -> DownloadStrategy {
    let size = params.metadata.size;
    let workers = params
        .prefs
        .worker_count
        .unwrap_or_else(|| auto_worker_count(size));

    let multi = params.metadata.accepts_ranges
        && size > 0
        && size >= params.settings.multi_stream_threshold()
        && workers > 1;

    if multi {
        DownloadStrategy::Multi { workers }
    } else {
        DownloadStrategy::Single
    }
}
