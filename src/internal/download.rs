//! 下载引擎模块：任务、控制器、策略、单线程与多线程下载路径。

pub mod structs;
pub mod traits;

pub use structs::chunk_descriptor::{divide_chunks, plan_chunks, ChunkDescriptor};
pub use structs::chunk_progress::ChunkProgress;
pub use structs::download_error::DownloadError;
pub use structs::download_job::{DownloadJob, DownloadJobBuilder};
pub use structs::download_status::DownloadStatus;
pub use structs::job_controller::JobController;
pub use structs::pause_gate::PauseGate;
pub use structs::progress_tracker::{ProgressSnapshot, ProgressTracker};
pub use structs::user_preferences::UserPreferences;
pub use traits::observer::DownloadObserver;
