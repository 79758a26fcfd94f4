//! 下载相关错误类型。

use reqwest::StatusCode;
use thiserror::Error;

use crate::internal::net::NetError;
use crate::internal::probe::ProbeError;

use super::download_status::DownloadStatus;

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("HTTP 请求失败: {0}")]
    Request(#[from] reqwest::Error),

    #[error("服务器返回错误状态码: {0}")]
    HttpStatus(StatusCode),

    /// Range 请求要求 206，服务器返回了别的状态。
    #[error("Range 请求未被满足，需要 206，实际返回 {status}")]
    RangeNotSatisfied { status: StatusCode },

    #[error("探测服务器信息失败: {0}")]
    Probe(#[from] ProbeError),

    #[error("{0}")]
    Net(#[from] NetError),

    #[error("创建下载目录失败: {0}")]
    CreateDir(std::io::Error),

    #[error("创建文件失败: {0}")]
    CreateFile(std::io::Error),

    #[error("写入文件失败: {0}")]
    WriteFile(std::io::Error),

    #[error("刷新文件失败: {0}")]
    FlushFile(std::io::Error),

    #[error("合并分片文件失败: {0}")]
    MergeChunks(std::io::Error),

    /// 响应体在达到预期字节数之前结束，按瞬时故障重试。
    #[error("响应体提前结束: 预期 {expected} 字节，收到 {received} 字节")]
    PrematureEof { expected: u64, received: u64 },

    #[error("分片下载需要已知文件大小")]
    UnknownSizeForChunked,

    #[error("分片 {chunk_index} 下载失败，已尝试 {attempts} 次: {message}")]
    ChunkFailed {
        chunk_index: usize,
        attempts: usize,
        message: String,
    },

    #[error("分片任务失败: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),

    #[error("下载被取消")]
    Cancelled,

    #[error("当前状态 {status} 不允许执行 {operation}")]
    InvalidState {
        status: DownloadStatus,
        operation: &'static str,
    },

    #[error("任务已被释放")]
    Disposed,
}

impl DownloadError {
    /// 是否属于瞬时故障：传输层错误、提前 EOF、可重试状态码（408/429/503）。
    ///
    /// 其余 HTTP 状态、本地 IO、协议不变量违例均为终态，不重试。
    pub fn is_transient(&self) -> bool {
        match self {
            DownloadError::Request(_) => true,
            DownloadError::PrematureEof { .. } => true,
            DownloadError::HttpStatus(status) | DownloadError::RangeNotSatisfied { status } => {
                matches!(
                    *status,
                    StatusCode::REQUEST_TIMEOUT
                        | StatusCode::TOO_MANY_REQUESTS
                        | StatusCode::SERVICE_UNAVAILABLE
                )
            }
            _ => false,
        }
    }
}
