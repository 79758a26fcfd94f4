//! 探测服务器：HEAD 优先、GET 兜底，最多 3 次尝试，仅传输错误触发重试。

use std::time::Duration;

use reqwest::header::{ACCEPT_RANGES, CONTENT_DISPOSITION, CONTENT_LENGTH, CONTENT_TYPE};
use reqwest::{Client, Response, StatusCode};
use thiserror::Error;
use tracing::{debug, warn};

use super::filename::{
    default_filename, filename_from_content_disposition, filename_from_url,
};
use crate::internal::probe::structs::server_metadata::ServerMetadata;

/// 探测最大尝试次数。
pub const PROBE_MAX_ATTEMPTS: usize = 3;

/// 两次尝试之间的固定延迟。
pub const PROBE_RETRY_DELAY: Duration = Duration::from_secs(2);

#[derive(Debug, Error)]
pub enum ProbeError {
    /// 传输层错误（DNS/连接/TLS/读写），可重试。
    #[error("探测请求失败: {0}")]
    Request(#[from] reqwest::Error),

    /// HTTP 状态错误，不重试。
    #[error("探测收到错误状态码: {0}")]
    HttpStatus(StatusCode),

    /// 重试耗尽后的终态错误。
    #[error("探测失败，已尝试 {attempts} 次: {last_error}")]
    Exhausted { attempts: usize, last_error: String },
}

/// 探测远程文件元数据。
///
/// HEAD 请求失败（传输错误或状态 >= 400）时降级为 GET（丢弃响应体）；
/// 整个探测对传输错误最多重试 [`PROBE_MAX_ATTEMPTS`] 次，HTTP 状态错误
/// 直接终止。
pub async fn fetch_server_metadata(
    client: &Client,
    url: &str,
) -> Result<ServerMetadata, ProbeError> {
    let mut last_error = String::new();

    for attempt in 1..=PROBE_MAX_ATTEMPTS {
        match try_fetch(client, url).await {
            Ok(metadata) => {
                debug!(
                    attempt,
                    size = metadata.size,
                    accepts_ranges = metadata.accepts_ranges,
                    "探测成功"
                );
                return Ok(metadata);
            }
            // 状态错误不重试，直接上抛
            Err(e @ ProbeError::HttpStatus(_)) => return Err(e),
            Err(e) => {
                warn!(attempt, error = %e, "探测尝试失败");
                last_error = e.to_string();
                if attempt < PROBE_MAX_ATTEMPTS {
                    tokio::time::sleep(PROBE_RETRY_DELAY).await;
                }
            }
        }
    }

    Err(ProbeError::Exhausted {
        attempts: PROBE_MAX_ATTEMPTS,
        last_error,
    })
}

/// 单次探测尝试：HEAD，失败则 GET。
async fn try_fetch(client: &Client, url: &str) -> Result<ServerMetadata, ProbeError> {
    let head_result = client.head(url).send().await;

    let (resp, used_get) = match head_result {
        Ok(resp) if resp.status().is_success() => (resp, false),
        // HEAD 被拒或传输失败，换 GET 再试一次
        _ => {
            let resp = client.get(url).send().await?;
            if !resp.status().is_success() {
                return Err(ProbeError::HttpStatus(resp.status()));
            }
            (resp, true)
        }
    };

    let metadata = extract_metadata(&resp);

    // GET 兜底时丢弃已开始传输的响应体
    if used_get {
        drop(resp);
    }

    Ok(metadata)
}

/// 从响应头提取元数据。
fn extract_metadata(resp: &Response) -> ServerMetadata {
    let final_url = resp.url().to_string();
    let headers = resp.headers();

    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();

    let size = headers
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .unwrap_or(0);

    let accepts_ranges = headers
        .get(ACCEPT_RANGES)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_ascii_lowercase().contains("bytes"))
        .unwrap_or(false);

    let mut filename = headers
        .get(CONTENT_DISPOSITION)
        .and_then(|v| v.to_str().ok())
        .and_then(filename_from_content_disposition)
        .or_else(|| filename_from_url(&final_url))
        .unwrap_or_default();

    if filename.is_empty() {
        filename = default_filename(&content_type);
    }

    ServerMetadata {
        filename,
        size,
        content_type,
        accepts_ranges,
        final_url,
    }
}
