//! 单线程顺序下载：服务器不支持 Range、大小未知或文件过小时的路径。
//!
//! 支持 Range 时按输出文件当前长度尾部续传；下载的同时起一个延迟的
//! 小范围探测请求，补全初次探测没拿到的 Range 支持与文件大小信息。

use std::path::Path;
use std::sync::Arc;

use futures_util::StreamExt;
use reqwest::header::{ACCEPT_RANGES, CONTENT_RANGE, RANGE};
use reqwest::{Client, StatusCode};
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::internal::download::structs::download_error::DownloadError;
use crate::internal::download::structs::download_job::JobShared;

use super::multi_stream::worker::RETRY_DELAY;

/// 补充探测的启动延迟：先让主下载跑起来。
const HEADER_REFRESH_DELAY: std::time::Duration = std::time::Duration::from_secs(2);

/// 升级为多线程的已完成比例上限：超过就不值得切换了。
const ELEVATION_MAX_COMPLETED_RATIO: f64 = 0.25;

/// 单线程下载入口参数。
pub(crate) struct SingleStreamParams {
    pub client: Client,
    pub shared: Arc<JobShared>,
}

/// 中途补充探测得到的头信息。
#[derive(Debug, Clone, Copy)]
struct HeaderRefresh {
    accepts_ranges: bool,
    size: u64,
}

/// 执行单线程下载，瞬时故障按任务的 max_retries 重试（续传避免重复拉取）。
pub(crate) async fn run_single_stream(params: SingleStreamParams) -> Result<(), DownloadError> {
    let shared = params.shared;
    let client = params.client;

    let (metadata, placement) = {
        let state = shared.state.lock().unwrap();
        (
            state.metadata.clone().unwrap_or_default(),
            state.placement.clone(),
        )
    };
    let placement = placement.ok_or_else(|| DownloadError::InvalidState {
        status: shared.current_status(),
        operation: "single_stream",
    })?;

    // 补充探测与主下载并行，结果经通道送回读循环
    let (refresh_tx, mut refresh_rx) = mpsc::channel::<HeaderRefresh>(1);
    let refresh_task = tokio::spawn(refresh_headers(
        client.clone(),
        metadata.final_url.clone(),
        refresh_tx,
    ));

    let max_retries = shared.max_retries();
    let mut attempts = 0usize;
    let result = loop {
        if shared.cancel.is_tripped() {
            break Err(DownloadError::Cancelled);
        }

        match single_attempt(&client, &shared, &placement.full_path, &mut refresh_rx).await {
            Ok(()) => break Ok(()),
            Err(DownloadError::Cancelled) => break Err(DownloadError::Cancelled),
            Err(e) => {
                if shared.cancel.is_tripped() {
                    break Err(DownloadError::Cancelled);
                }
                attempts += 1;
                if e.is_transient() && attempts <= max_retries {
                    warn!(attempts, error = %e, "单线程下载瞬时故障，重试");
                    tokio::time::sleep(RETRY_DELAY).await;
                    continue;
                }
                break Err(e);
            }
        }
    };

    refresh_task.abort();
    result
}

/// 单次下载尝试。每次尝试重新按文件长度计算续传偏移。
async fn single_attempt(
    client: &Client,
    shared: &Arc<JobShared>,
    full_path: &Path,
    refresh_rx: &mut mpsc::Receiver<HeaderRefresh>,
) -> Result<(), DownloadError> {
    let metadata = shared
        .state
        .lock()
        .unwrap()
        .metadata
        .clone()
        .unwrap_or_default();

    // 续传偏移：输出文件已存在且服务器支持 Range 时取其长度
    let mut offset = if metadata.accepts_ranges {
        tokio::fs::metadata(full_path)
            .await
            .map(|m| m.len())
            .unwrap_or(0)
    } else {
        0
    };

    let mut request = client.get(&metadata.final_url);
    if offset > 0 {
        request = request.header(RANGE, format!("bytes={}-", offset));
    }
    let resp = request.send().await?;

    let status = resp.status();
    if offset > 0 && status == StatusCode::PARTIAL_CONTENT {
        debug!(offset, "服务器接受续传");
    } else if offset > 0 && status == StatusCode::OK {
        // 服务器忽略 Range，从头重来
        info!("服务器未接受续传请求，从头下载");
        offset = 0;
    } else if status != StatusCode::OK {
        return Err(DownloadError::HttpStatus(status));
    }

    // 进度计数与文件实际字节对齐：续传只补差值，重试不重复累计；
    // 从头重来（服务器忽略续传或失败后的整文件重试）只清字节计数，
    // 开始时间与速度状态保持本次运行不变。
    let counted = shared.tracker.bytes_done();
    if offset > counted {
        shared.tracker.add_bytes(offset - counted);
    } else if offset == 0 && counted > 0 {
        shared.tracker.reset_bytes();
    }

    // 总大小：初次探测未知时用响应的 Content-Length 补
    let mut total = metadata.size;
    if total == 0 {
        if let Some(len) = resp.content_length() {
            total = offset + len;
            shared.tracker.set_total(total);
        }
    }

    let mut file = if offset > 0 {
        OpenOptions::new()
            .append(true)
            .open(full_path)
            .await
            .map_err(DownloadError::CreateFile)?
    } else {
        File::create(full_path)
            .await
            .map_err(DownloadError::CreateFile)?
    };

    let mut received = 0u64;
    let mut stream = resp.bytes_stream();

    loop {
        // 补充探测结果随读循环消化
        if let Ok(refresh) = refresh_rx.try_recv() {
            apply_header_refresh(shared, refresh);
        }

        shared.gate.wait_if_paused().await;
        if shared.cancel.is_tripped() {
            return Err(DownloadError::Cancelled);
        }

        match stream.next().await {
            Some(Ok(bytes)) => {
                file.write_all(&bytes)
                    .await
                    .map_err(DownloadError::WriteFile)?;
                received += bytes.len() as u64;
                shared.tracker.add_bytes(bytes.len() as u64);
                if let Some(snapshot) = shared.tracker.sample() {
                    shared
                        .observers
                        .lock()
                        .await
                        .run_on_progress(&snapshot)
                        .await;
                }
            }
            Some(Err(e)) => return Err(DownloadError::Request(e)),
            None => break,
        }
    }

    file.flush().await.map_err(DownloadError::FlushFile)?;

    // 大小已知时校验是否收满
    if total > 0 && offset + received < total {
        return Err(DownloadError::PrematureEof {
            expected: total - offset,
            received,
        });
    }

    if total == 0 {
        shared.tracker.set_total(offset + received);
    }
    info!(bytes = offset + received, "单线程下载完成");
    Ok(())
}

/// 补充探测：延迟 2 秒后发一个 `bytes=0-1023` 的小范围请求，
/// 从 206 状态或 Content-Range 里确认 Range 支持与真实大小。
async fn refresh_headers(client: Client, url: String, tx: mpsc::Sender<HeaderRefresh>) {
    tokio::time::sleep(HEADER_REFRESH_DELAY).await;

    let resp = match client
        .get(&url)
        .header(RANGE, "bytes=0-1023")
        .send()
        .await
    {
        Ok(resp) => resp,
        Err(e) => {
            debug!(error = %e, "补充探测失败，忽略");
            return;
        }
    };

    let accepts_ranges = resp.status() == StatusCode::PARTIAL_CONTENT
        || resp
            .headers()
            .get(ACCEPT_RANGES)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_ascii_lowercase().contains("bytes"))
            .unwrap_or(false);

    // Content-Range: bytes 0-1023/10485760 → 取斜杠后的总大小
    let size = resp
        .headers()
        .get(CONTENT_RANGE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.rsplit('/').next())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .or(resp.content_length())
        .unwrap_or(0);

    // 丢弃响应体，只要头
    drop(resp);

    let _ = tx.send(HeaderRefresh {
        accepts_ranges,
        size,
    }).await;
}

/// 把补充探测结果并入任务元数据；满足升级条件时只记录不切换。
fn apply_header_refresh(shared: &Arc<JobShared>, refresh: HeaderRefresh) {
    let mut state = shared.state.lock().unwrap();
    let Some(metadata) = state.metadata.as_mut() else {
        return;
    };

    if refresh.size > 0 && metadata.size == 0 {
        metadata.size = refresh.size;
        shared.tracker.set_total(refresh.size);
        debug!(size = refresh.size, "补充探测得到文件大小");
    }
    if refresh.accepts_ranges && !metadata.accepts_ranges {
        metadata.accepts_ranges = true;
        debug!("补充探测确认服务器支持 Range");
    }

    let size = metadata.size;
    let accepts = metadata.accepts_ranges;
    drop(state);

    if should_elevate(accepts, size, shared.tracker.bytes_done()) {
        // TODO: 实现单线程到多线程的空中切换；目前只更新元数据，
        // 重启任务后由策略选择直接进入多线程。
        info!("当前下载满足多线程条件（本次运行保持单线程）");
    }
}

/// 是否值得升级为多线程：支持 Range、达到大小门槛、完成比例不超过上限。
fn should_elevate(accepts_ranges: bool, size: u64, bytes_done: u64) -> bool {
    if !accepts_ranges || size < 10 * 1024 * 1024 {
        return false;
    }
    (bytes_done as f64 / size as f64) <= ELEVATION_MAX_COMPLETED_RATIO
}
