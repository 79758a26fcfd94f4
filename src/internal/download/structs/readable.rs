//! 可读格式化：字节数、速度、剩余时间的展示用字符串。

use std::time::Duration;

use super::progress_tracker::ProgressSnapshot;

const KIB: f64 = 1024.0;
const MIB: f64 = 1024.0 * 1024.0;
const GIB: f64 = 1024.0 * 1024.0 * 1024.0;
const TIB: f64 = 1024.0 * 1024.0 * 1024.0 * 1024.0;

/// 字节数 → `"1.50 MB"` 形式。
pub fn readable_size(size: u64) -> String {
    let s = size as f64;
    if s < KIB {
        format!("{} B", size)
    } else if s < MIB {
        format!("{:.2} KB", s / KIB)
    } else if s < GIB {
        format!("{:.2} MB", s / MIB)
    } else if s < TIB {
        format!("{:.2} GB", s / GIB)
    } else {
        format!("{:.2} TB", s / TIB)
    }
}

/// 速度（字节/秒）→ `"3.20 MB/s"` 形式。
pub fn readable_speed(bps: f64) -> String {
    if bps <= 0.0 {
        return "0 B/s".to_string();
    }
    format!("{}/s", readable_size(bps as u64))
}

/// 时长 → `"2m 5s"` / `"1h 3m"` 形式。
pub fn readable_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs < 60 {
        format!("{}s", secs)
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m", secs / 3600, (secs % 3600) / 60)
    }
}

impl ProgressSnapshot {
    /// `"已下载 / 总量"` 的可读形式，总量未知时只显示已下载。
    pub fn readable_progress(&self) -> String {
        if self.total_bytes > 0 {
            format!(
                "{} / {}",
                readable_size(self.bytes_done),
                readable_size(self.total_bytes)
            )
        } else {
            readable_size(self.bytes_done)
        }
    }

    /// 当前速度的可读形式。
    pub fn readable_speed(&self) -> String {
        readable_speed(self.speed_bps)
    }

    /// ETA 的可读形式；未知返回 `"--"`。
    pub fn readable_eta(&self) -> String {
        match self.eta {
            Some(eta) => readable_duration(eta),
            None => "--".to_string(),
        }
    }
}
