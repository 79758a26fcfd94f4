pub mod cancel_flag;
pub mod chunk_descriptor;
pub mod chunk_progress;
pub mod download_error;
pub mod download_job;
pub mod download_status;
pub mod job_controller;
pub mod observer_adapters;
pub mod observer_set;
pub mod pause_gate;
pub mod progress_tracker;
pub mod readable;
pub mod user_preferences;

// 重导出公共类型
pub use cancel_flag::CancelFlag;
pub use chunk_descriptor::ChunkDescriptor;
pub use chunk_progress::ChunkProgress;
pub use download_error::DownloadError;
pub use download_job::DownloadJob;
pub use download_status::DownloadStatus;
pub use job_controller::JobController;
pub use observer_set::ObserverSet;
pub use pause_gate::PauseGate;
pub use progress_tracker::{ProgressSnapshot, ProgressTracker};
pub use user_preferences::UserPreferences;
