//! # multiget
//!
//! HTTP/HTTPS 多线程加速下载引擎：服务器支持 Range 时按分片并发拉取，
//! 否则退回单线程顺序下载；支持暂停/恢复/取消与跨重启断点续传。
//!
//! ## 使用示例
//! ```rust,no_run
//! use multiget::download::DownloadJob;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let job = DownloadJob::builder("https://example.com/big.zip")
//!     .output_dir("./downloads")
//!     .worker_count(4)
//!     .with_on_progress(|s| println!("{} {}", s.readable_progress(), s.readable_speed()))
//!     .build();
//!
//! let controller = job.controller();
//! // 另一个任务里可随时 controller.pause().await / resume().await / cancel()
//! job.start().await?;
//! # let _ = controller;
//! # Ok(())
//! # }
//! ```

/// 内部导出的模块
mod internal;

#[cfg(test)]
mod tests;

pub mod download {
    use crate::internal;
    pub use internal::download::structs::download_job::path_plan::FilePlacement;
    pub use internal::download::structs::download_job::strategy::{
        auto_worker_count, DownloadStrategy,
    };
    pub use internal::download::{
        divide_chunks, plan_chunks, ChunkDescriptor, ChunkProgress, DownloadError, DownloadJob,
        DownloadJobBuilder, DownloadObserver, DownloadStatus, JobController, PauseGate,
        ProgressSnapshot, ProgressTracker, UserPreferences,
    };
}

pub mod probe {
    use crate::internal;
    pub use internal::probe::{fetch_server_metadata, ProbeError, ServerMetadata};
}

pub mod net {
    use crate::internal;
    pub use internal::net::{build_download_client, BuildClientParams, NetError};
}

pub mod settings {
    use crate::internal;
    pub use internal::settings::{
        CategoryRule, Settings, SettingsError, DEFAULT_MULTI_STREAM_THRESHOLD,
    };
}

pub mod states {
    use crate::internal;
    pub use internal::states::{PropertyWatcher, ReactiveProperty, ReactivePropertyError};
}

pub mod fsx {
    use crate::internal;
    pub use internal::fsx::{
        chunk_file_paths, generate_unique_path, merge_chunk_files, CHUNK_FILE_EXT,
    };
}

pub mod readable {
    use crate::internal;
    pub use internal::download::structs::readable::{
        readable_duration, readable_size, readable_speed,
    };
}
