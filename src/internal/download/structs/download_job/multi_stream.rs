//! 多线程分片下载：spawn 每个分片的 worker 与进度采样任务，
//! 等待全部完成后按分片顺序合并为最终文件。
//!
//! 失败语义：第一个真实错误会触发其余 worker 的取消并删除全部分片
//! 临时文件；用户取消则保留临时文件，下次 start 按其长度续传。

pub(crate) mod worker;

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::internal::download::structs::chunk_descriptor::plan_chunks;
use crate::internal::download::structs::download_error::DownloadError;
use crate::internal::download::structs::download_job::JobShared;
use crate::internal::fsx::{chunk_file_paths, cleanup_chunk_files, create_chunk_files, merge_chunk_files};

use worker::{download_one_chunk, ChunkWorkerParams};

/// 采样任务的唤醒周期；速度窗口由进度聚合器内部控制（约 1 秒）。
const SAMPLER_INTERVAL: Duration = Duration::from_millis(500);

/// 多线程下载入口参数（形参超过 3 个，用 struct 承载）。
pub(crate) struct MultiStreamParams {
    pub client: Client,
    pub shared: Arc<JobShared>,
    pub workers: usize,
}

/// 执行多线程分片下载。前置条件：支持 Range 且大小已知。
pub(crate) async fn run_multi_stream(params: MultiStreamParams) -> Result<(), DownloadError> {
    let shared = params.shared;

    let (metadata, placement) = {
        let state = shared.state.lock().unwrap();
        (
            state.metadata.clone().unwrap_or_default(),
            state.placement.clone(),
        )
    };
    let placement = placement.ok_or_else(|| DownloadError::InvalidState {
        status: shared.current_status(),
        operation: "multi_stream",
    })?;
    let total = metadata.size;
    if total == 0 {
        return Err(DownloadError::UnknownSizeForChunked);
    }

    let chunks = plan_chunks(total, params.workers);
    shared.state.lock().unwrap().chunks = chunks.clone();
    shared.tracker.init_chunks(&chunks);

    let chunk_paths = chunk_file_paths(&placement.full_path, params.workers);
    create_chunk_files(&chunk_paths)
        .await
        .map_err(DownloadError::CreateFile)?;
    debug!(count = chunk_paths.len(), "分片临时文件就绪");

    // 错误通道：每个 worker 至多上报一个终态错误
    let (err_tx, err_rx) = mpsc::channel::<DownloadError>(chunks.len());
    let monitor = tokio::spawn(monitor_first_error(err_rx, Arc::clone(&shared)));
    let sampler = tokio::spawn(progress_sampler(Arc::clone(&shared)));

    let mut handles = Vec::with_capacity(chunks.len());
    for (chunk, path) in chunks.iter().zip(&chunk_paths) {
        let handle = tokio::spawn(download_one_chunk(ChunkWorkerParams {
            client: params.client.clone(),
            url: metadata.final_url.clone(),
            chunk: *chunk,
            chunk_path: path.clone(),
            shared: Arc::clone(&shared),
            max_retries: shared.max_retries(),
            err_tx: err_tx.clone(),
        }));
        handles.push(handle);
    }
    drop(err_tx);

    let mut join_error: Option<DownloadError> = None;
    for handle in handles {
        match handle.await {
            Ok(_) => {} // worker 的终态错误已经走错误通道
            Err(join_err) => {
                join_error.get_or_insert(DownloadError::TaskJoin(join_err));
            }
        }
    }

    let first_error = monitor.await.unwrap_or(None);
    sampler.abort();

    // 真实错误：删除分片临时文件后上抛
    if let Some(e) = first_error.or(join_error) {
        warn!(error = %e, "分片下载失败，清理临时文件");
        cleanup_chunk_files(&chunk_paths).await;
        return Err(e);
    }

    // 用户取消：保留分片临时文件供续传
    if shared.cancel.is_tripped() {
        return Err(DownloadError::Cancelled);
    }

    assemble(&shared, &chunk_paths, &placement.full_path).await?;
    shared.tracker.publish_snapshot();
    info!(path = %placement.full_path.display(), total, "多线程下载完成");
    Ok(())
}

/// 监听错误通道：第一个非取消错误触发其余 worker 的取消，随后排空通道。
async fn monitor_first_error(
    mut err_rx: mpsc::Receiver<DownloadError>,
    shared: Arc<JobShared>,
) -> Option<DownloadError> {
    let mut first: Option<DownloadError> = None;
    while let Some(e) = err_rx.recv().await {
        if matches!(e, DownloadError::Cancelled) {
            continue;
        }
        if first.is_none() {
            warn!(error = %e, "分片出错，通知其余 worker 停止");
            shared.cancel.trip();
            // 唤醒可能正阻塞在暂停门上的 worker，让它们观察到取消
            shared.gate.resume();
            first = Some(e);
        }
    }
    first
}

/// 进度采样：每 500ms 醒来一次，速度窗口走满（约 1 秒）才对外发进度事件。
async fn progress_sampler(shared: Arc<JobShared>) {
    let mut ticker = tokio::time::interval(SAMPLER_INTERVAL);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        if let Some(snapshot) = shared.tracker.sample() {
            shared
                .observers
                .lock()
                .await
                .run_on_progress(&snapshot)
                .await;
        }
    }
}

/// 合并分片为最终文件，并触发合并阶段事件。
async fn assemble(
    shared: &Arc<JobShared>,
    chunk_paths: &[std::path::PathBuf],
    final_path: &std::path::Path,
) -> Result<(), DownloadError> {
    shared.observers.lock().await.run_on_assemble_start().await;

    match merge_chunk_files(chunk_paths, final_path).await {
        Ok(()) => {
            shared
                .observers
                .lock()
                .await
                .run_on_assemble_finish()
                .await;
            Ok(())
        }
        Err(io_err) => {
            let e = DownloadError::MergeChunks(io_err);
            shared
                .observers
                .lock()
                .await
                .run_on_assemble_error(&e)
                .await;
            Err(e)
        }
    }
}
