//! 下载任务根实体：持有共享状态，驱动「探测 → 规划 → 选路 → 下载」全流程。
//!
//! 任务不实现 Clone——同一个文件被多个任务同时下载会互相覆写；
//! 控制与观测通过 [`JobController`] 句柄进行，句柄可任意克隆。

pub(crate) mod multi_stream;
pub(crate) mod path_plan;
pub(crate) mod single_stream;
pub(crate) mod strategy;

use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex as StdMutex};

use chrono::{DateTime, Utc};
use tokio::sync::Mutex as TokioMutex;
use tracing::{debug, info};

use crate::internal::download::structs::cancel_flag::CancelFlag;
use crate::internal::download::structs::chunk_descriptor::ChunkDescriptor;
use crate::internal::download::structs::download_error::DownloadError;
use crate::internal::download::structs::download_status::DownloadStatus;
use crate::internal::download::structs::job_controller::JobController;
use crate::internal::download::structs::observer_adapters::{
    OnErrorAdapter, OnFinishAdapter, OnProgressAdapter, OnStopAdapter,
};
use crate::internal::download::structs::observer_set::ObserverSet;
use crate::internal::download::structs::pause_gate::PauseGate;
use crate::internal::download::structs::progress_tracker::{ProgressSnapshot, ProgressTracker};
use crate::internal::download::structs::user_preferences::UserPreferences;
use crate::internal::download::traits::observer::DownloadObserver;
use crate::internal::net::{build_download_client, BuildClientParams};
use crate::internal::probe::{fetch_server_metadata, ServerMetadata};
use crate::internal::settings::Settings;
use crate::internal::states::ReactiveProperty;

use path_plan::{plan_paths, FilePlacement, PlanPathsParams};
use strategy::{select_strategy, DownloadStrategy, SelectStrategyParams};

/// 任务运行期可变状态；短临界区读写，不跨 await 持锁。
#[derive(Default)]
pub(crate) struct JobState {
    pub(crate) metadata: Option<ServerMetadata>,
    pub(crate) placement: Option<FilePlacement>,
    pub(crate) chunks: Vec<ChunkDescriptor>,
    pub(crate) started_at: Option<DateTime<Utc>>,
    pub(crate) ended_at: Option<DateTime<Utc>>,
    pub(crate) last_error: Option<String>,
}

/// worker、采样器与控制器共享的任务状态。
pub(crate) struct JobShared {
    pub(crate) url: String,
    pub(crate) id: String,
    pub(crate) prefs: UserPreferences,
    pub(crate) settings: Settings,
    pub(crate) gate: PauseGate,
    pub(crate) cancel: CancelFlag,
    pub(crate) tracker: ProgressTracker,
    pub(crate) status: ReactiveProperty<DownloadStatus>,
    pub(crate) observers: TokioMutex<ObserverSet>,
    pub(crate) state: StdMutex<JobState>,
    pub(crate) disposed: AtomicBool,
}

impl JobShared {
    pub(crate) fn current_status(&self) -> DownloadStatus {
        self.status.get_current().unwrap_or(DownloadStatus::Queued)
    }

    pub(crate) fn set_status(&self, status: DownloadStatus) {
        let _ = self.status.update(status);
    }

    /// 任务生效的单分片最大重试次数：显式偏好优先，否则走配置兜底。
    pub(crate) fn max_retries(&self) -> usize {
        self.prefs
            .max_retries
            .unwrap_or_else(|| self.settings.effective_max_retries())
    }
}

/// 下载任务。由 [`DownloadJobBuilder`] 构建，`start().await` 驱动至终态。
pub struct DownloadJob {
    shared: Arc<JobShared>,
    /// 同一任务不允许并发 start
    run_lock: TokioMutex<()>,
}

impl DownloadJob {
    /// 创建任务构建器。
    pub fn builder(url: impl Into<String>) -> DownloadJobBuilder {
        DownloadJobBuilder::new(url)
    }

    /// 获取控制句柄：暂停/恢复/取消/释放与各类状态读取。
    pub fn controller(&self) -> JobController {
        JobController {
            shared: Arc::clone(&self.shared),
        }
    }

    /// 启动下载并驱动到终态。
    ///
    /// 成功返回 `Ok(())`（状态 `completed`）；被取消返回
    /// [`DownloadError::Cancelled`]（状态 `stopped`）；其余错误对应状态
    /// `failed`。同一任务再次 `start` 会按分片临时文件的长度续传。
    pub async fn start(&self) -> Result<(), DownloadError> {
        let _run = self
            .run_lock
            .try_lock()
            .map_err(|_| DownloadError::InvalidState {
                status: self.shared.current_status(),
                operation: "start",
            })?;

        if self
            .shared
            .disposed
            .load(std::sync::atomic::Ordering::SeqCst)
        {
            return Err(DownloadError::Disposed);
        }

        // 重启复位：取消信号清零、暂停门打开
        self.shared.cancel.reset();
        self.shared.gate.resume();
        self.shared.set_status(DownloadStatus::Queued);

        let result = self.run().await;
        self.finalize(result).await
    }

    /// 主流程：探测 → 路径规划 → 策略选择 → 执行下载。
    async fn run(&self) -> Result<(), DownloadError> {
        let shared = &self.shared;

        let client = build_download_client(BuildClientParams {
            headers: &shared.prefs.headers,
            cookie: shared.prefs.cookie.as_deref(),
        })?;

        let metadata = fetch_server_metadata(&client, &shared.url).await?;
        info!(
            url = %shared.url,
            size = metadata.size,
            accepts_ranges = metadata.accepts_ranges,
            filename = %metadata.filename,
            "探测完成"
        );

        if shared.cancel.is_tripped() {
            return Err(DownloadError::Cancelled);
        }

        // 同一任务重启时沿用首次规划的路径，分片临时文件与
        // 单线程半成品文件的长度才能承载续传偏移。
        let placement = {
            let existing = shared.state.lock().unwrap().placement.clone();
            match existing {
                Some(p) => p,
                None => {
                    let p = plan_paths(PlanPathsParams {
                        prefs: &shared.prefs,
                        settings: &shared.settings,
                        metadata: &metadata,
                    })
                    .await?;
                    shared.state.lock().unwrap().placement = Some(p.clone());
                    p
                }
            }
        };
        debug!(path = %placement.full_path.display(), "输出路径已确定");

        let strategy = select_strategy(SelectStrategyParams {
            metadata: &metadata,
            prefs: &shared.prefs,
            settings: &shared.settings,
        });

        {
            let mut state = shared.state.lock().unwrap();
            state.metadata = Some(metadata.clone());
            state.started_at = Some(Utc::now());
            state.ended_at = None;
            state.last_error = None;
            if matches!(strategy, DownloadStrategy::Single) {
                state.chunks.clear();
            }
        }
        shared.tracker.begin_run(metadata.size);
        shared.set_status(DownloadStatus::InProgress);
        shared.observers.lock().await.run_on_start().await;

        match strategy {
            DownloadStrategy::Multi { workers } => {
                info!(workers, size = metadata.size, "采用多线程分片下载");
                multi_stream::run_multi_stream(multi_stream::MultiStreamParams {
                    client,
                    shared: Arc::clone(shared),
                    workers,
                })
                .await
            }
            DownloadStrategy::Single => {
                info!(size = metadata.size, "采用单线程下载");
                single_stream::run_single_stream(single_stream::SingleStreamParams {
                    client,
                    shared: Arc::clone(shared),
                })
                .await
            }
        }
    }

    /// 终态处理：落状态、记时间、触发对应观察者事件。
    async fn finalize(&self, result: Result<(), DownloadError>) -> Result<(), DownloadError> {
        let shared = &self.shared;
        shared.state.lock().unwrap().ended_at = Some(Utc::now());

        match result {
            Ok(()) => {
                shared.set_status(DownloadStatus::Completed);
                shared.tracker.publish_snapshot();
                shared.observers.lock().await.run_on_finish().await;
                Ok(())
            }
            Err(DownloadError::Cancelled) => {
                shared.set_status(DownloadStatus::Stopped);
                shared.observers.lock().await.run_on_stop().await;
                Err(DownloadError::Cancelled)
            }
            Err(e) => {
                shared.state.lock().unwrap().last_error = Some(e.to_string());
                shared.set_status(DownloadStatus::Failed);
                shared.observers.lock().await.run_on_error(&e).await;
                Err(e)
            }
        }
    }
}

/// 任务构建器：链式设置偏好、注入配置、注册观察者。
pub struct DownloadJobBuilder {
    url: String,
    id: Option<String>,
    prefs: UserPreferences,
    settings: Option<Settings>,
    observers: ObserverSet,
}

impl DownloadJobBuilder {
    fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            id: None,
            prefs: UserPreferences::default(),
            settings: None,
            observers: ObserverSet::default(),
        }
    }

    /// 任务标识；未设置时采用 URL 本身。
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// 输出目录；未设置时按分类规则或系统下载目录。
    pub fn output_dir(mut self, dir: impl Into<std::path::PathBuf>) -> Self {
        self.prefs.output_dir = Some(dir.into());
        self
    }

    /// 输出文件名；未设置时采用服务器建议名。
    pub fn filename(mut self, name: impl Into<String>) -> Self {
        self.prefs.filename = Some(name.into());
        self
    }

    /// 并发线程数；设 1 强制单线程。
    pub fn worker_count(mut self, count: usize) -> Self {
        self.prefs.worker_count = Some(count);
        self
    }

    /// 单分片最大重试次数。
    pub fn max_retries(mut self, retries: usize) -> Self {
        self.prefs.max_retries = Some(retries);
        self
    }

    /// 追加一个自定义请求头。
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.prefs.headers.insert(name.into(), value.into());
        self
    }

    /// 设置 Cookie 字符串。
    pub fn cookie(mut self, cookie: impl Into<String>) -> Self {
        self.prefs.cookie = Some(cookie.into());
        self
    }

    /// 注入策略配置（线程数、重试、门槛、分类目录、默认头等兜底值）。
    pub fn settings(mut self, settings: Settings) -> Self {
        self.settings = Some(settings);
        self
    }

    /// 注册完整观察者。
    pub fn with_observer(mut self, observer: impl DownloadObserver + 'static) -> Self {
        self.observers.add(observer);
        self
    }

    /// 注册「进度」观察者，约每秒回调一次。
    pub fn with_on_progress<F>(mut self, f: F) -> Self
    where
        F: FnMut(&ProgressSnapshot) + Send + Sync + 'static,
    {
        self.observers.add(OnProgressAdapter(f));
        self
    }

    /// 注册「完成」观察者。
    pub fn with_on_finish<F>(mut self, f: F) -> Self
    where
        F: FnMut() + Send + Sync + 'static,
    {
        self.observers.add(OnFinishAdapter(f));
        self
    }

    /// 注册「失败」观察者。
    pub fn with_on_error<F>(mut self, f: F) -> Self
    where
        F: FnMut(&DownloadError) + Send + Sync + 'static,
    {
        self.observers.add(OnErrorAdapter(f));
        self
    }

    /// 注册「取消」观察者。
    pub fn with_on_stop<F>(mut self, f: F) -> Self
    where
        F: FnMut() + Send + Sync + 'static,
    {
        self.observers.add(OnStopAdapter(f));
        self
    }

    /// 构建任务：配置兜底并入偏好（显式偏好优先）。
    pub fn build(self) -> DownloadJob {
        let settings = self.settings.unwrap_or_default();
        let mut prefs = self.prefs;

        if prefs.worker_count.is_none() {
            prefs.worker_count = settings.thread_count();
        }
        // 重试次数不在这里并入偏好：未显式设置时由
        // JobShared::max_retries 走 Settings::effective_max_retries 兜底
        for (name, value) in &settings.custom_headers {
            prefs
                .headers
                .entry(name.clone())
                .or_insert_with(|| value.clone());
        }
        if prefs.cookie.is_none() && !settings.custom_cookies.is_empty() {
            prefs.cookie = Some(settings.custom_cookies.clone());
        }

        let id = self.id.unwrap_or_else(|| self.url.clone());

        DownloadJob {
            shared: Arc::new(JobShared {
                url: self.url,
                id,
                prefs,
                settings,
                gate: PauseGate::new(),
                cancel: CancelFlag::new(),
                tracker: ProgressTracker::new(),
                status: ReactiveProperty::new(DownloadStatus::Queued),
                observers: TokioMutex::new(self.observers),
                state: StdMutex::new(JobState::default()),
                disposed: AtomicBool::new(false),
            }),
            run_lock: TokioMutex::new(()),
        }
    }
}
