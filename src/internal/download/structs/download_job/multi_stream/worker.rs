//! 分片 worker：下载一个连续字节区间到专属临时文件。
//!
//! 续传依据临时文件当前长度；每轮读循环之间依次过暂停门、查取消信号、
//! 原子累加全局进度。瞬时故障按任务的 max_retries 整片重试。

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::header::RANGE;
use reqwest::{Client, StatusCode};
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::internal::download::structs::chunk_descriptor::ChunkDescriptor;
use crate::internal::download::structs::download_error::DownloadError;
use crate::internal::download::structs::download_job::JobShared;

/// 两次分片重试之间的固定延迟。
pub(crate) const RETRY_DELAY: Duration = Duration::from_secs(2);

/// 分片 worker 参数（形参超过 3 个，用 struct 承载）。
pub(crate) struct ChunkWorkerParams {
    pub client: Client,
    pub url: String,
    pub chunk: ChunkDescriptor,
    pub chunk_path: PathBuf,
    pub shared: Arc<JobShared>,
    pub max_retries: usize,
    pub err_tx: mpsc::Sender<DownloadError>,
}

/// 下载单个分片。终态错误先经错误通道上报，再作为返回值返回。
pub(crate) async fn download_one_chunk(params: ChunkWorkerParams) -> Result<(), DownloadError> {
    let ChunkWorkerParams {
        client,
        url,
        chunk,
        chunk_path,
        shared,
        max_retries,
        err_tx,
    } = params;

    // 续传检测：临时文件长度即已有字节数
    let resume = chunk_resume_offset(&chunk_path).await;
    if resume >= chunk.size {
        // 该分片上次已经完整，直接计入进度；本次运行写入 0 字节
        shared.tracker.add_bytes(chunk.size);
        shared.tracker.set_chunk_complete(chunk.index);
        shared
            .observers
            .lock()
            .await
            .run_on_chunk_finish(chunk.index, chunk.start, chunk.end, 0)
            .await;
        debug!(chunk = chunk.index, "分片此前已完整，跳过");
        return Ok(());
    }
    if resume > 0 {
        shared.tracker.add_bytes(resume);
        shared.tracker.add_chunk_bytes(chunk.index, resume);
        debug!(chunk = chunk.index, resume, "分片从断点续传");
    }

    shared
        .observers
        .lock()
        .await
        .run_on_chunk_start(chunk.index, chunk.start, chunk.end)
        .await;

    let mut attempts = 0usize;
    loop {
        if shared.cancel.is_tripped() {
            let _ = err_tx.send(DownloadError::Cancelled).await;
            return Err(DownloadError::Cancelled);
        }
        shared.gate.wait_if_paused().await;
        if shared.cancel.is_tripped() {
            let _ = err_tx.send(DownloadError::Cancelled).await;
            return Err(DownloadError::Cancelled);
        }

        match chunk_attempt(&client, &url, chunk, &chunk_path, &shared).await {
            Ok(()) => {
                shared.tracker.set_chunk_complete(chunk.index);
                let written = chunk.size - resume;
                shared
                    .observers
                    .lock()
                    .await
                    .run_on_chunk_finish(chunk.index, chunk.start, chunk.end, written)
                    .await;
                debug!(chunk = chunk.index, written, "分片下载完成");
                return Ok(());
            }
            Err(DownloadError::Cancelled) => {
                let _ = err_tx.send(DownloadError::Cancelled).await;
                return Err(DownloadError::Cancelled);
            }
            Err(e) => {
                // 取消引发的网络中断一律按取消处理
                if shared.cancel.is_tripped() {
                    let _ = err_tx.send(DownloadError::Cancelled).await;
                    return Err(DownloadError::Cancelled);
                }
                attempts += 1;
                if e.is_transient() && attempts <= max_retries {
                    warn!(chunk = chunk.index, attempts, error = %e, "分片瞬时故障，重试");
                    tokio::time::sleep(RETRY_DELAY).await;
                    continue;
                }

                let message = e.to_string();
                let terminal = DownloadError::ChunkFailed {
                    chunk_index: chunk.index,
                    attempts,
                    message: message.clone(),
                };
                shared
                    .observers
                    .lock()
                    .await
                    .run_on_chunk_error(chunk.index, chunk.start, chunk.end, &terminal)
                    .await;
                let _ = err_tx.send(terminal).await;
                return Err(DownloadError::ChunkFailed {
                    chunk_index: chunk.index,
                    attempts,
                    message,
                });
            }
        }
    }
}

/// 临时文件当前长度；不存在或不可读按 0（从头下载）。
async fn chunk_resume_offset(path: &Path) -> u64 {
    tokio::fs::metadata(path).await.map(|m| m.len()).unwrap_or(0)
}

/// 单次分片尝试：Range 请求 + 流式追加写入。每次尝试重新计算续传偏移。
async fn chunk_attempt(
    client: &Client,
    url: &str,
    chunk: ChunkDescriptor,
    chunk_path: &Path,
    shared: &Arc<JobShared>,
) -> Result<(), DownloadError> {
    let offset = chunk_resume_offset(chunk_path).await;
    if offset >= chunk.size {
        return Ok(());
    }

    let range = format!("bytes={}-{}", chunk.start + offset, chunk.end);
    let resp = client.get(url).header(RANGE, &range).send().await?;
    if resp.status() != StatusCode::PARTIAL_CONTENT {
        return Err(DownloadError::RangeNotSatisfied {
            status: resp.status(),
        });
    }

    let mut file = if offset > 0 {
        OpenOptions::new()
            .append(true)
            .open(chunk_path)
            .await
            .map_err(DownloadError::CreateFile)?
    } else {
        File::create(chunk_path)
            .await
            .map_err(DownloadError::CreateFile)?
    };

    let expected = chunk.size - offset;
    let mut received = 0u64;
    let mut stream = resp.bytes_stream();

    while received < expected {
        shared.gate.wait_if_paused().await;
        if shared.cancel.is_tripped() {
            return Err(DownloadError::Cancelled);
        }

        match stream.next().await {
            Some(Ok(bytes)) => {
                // 不写入超出本分片预期的数据
                let take = (bytes.len() as u64).min(expected - received) as usize;
                file.write_all(&bytes[..take])
                    .await
                    .map_err(DownloadError::WriteFile)?;
                received += take as u64;
                shared.tracker.add_bytes(take as u64);
                shared.tracker.add_chunk_bytes(chunk.index, take as u64);
            }
            Some(Err(e)) => return Err(DownloadError::Request(e)),
            None => break,
        }
    }

    if received < expected {
        return Err(DownloadError::PrematureEof { expected, received });
    }

    file.flush().await.map_err(DownloadError::FlushFile)?;
    Ok(())
}
