//! 路径规划：确定输出目录、文件名与唯一的完整路径。
//!
//! 目录优先级：用户指定 > 扩展名分类规则 > 系统下载目录 > 当前目录。
//! 文件名优先级：用户指定 > 服务器建议名 > 默认名（按 Content-Type 补扩展名）。

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::internal::download::structs::download_error::DownloadError;
use crate::internal::download::structs::user_preferences::UserPreferences;
use crate::internal::fsx::generate_unique_path;
use crate::internal::probe::functions::filename::default_filename;
use crate::internal::probe::ServerMetadata;
use crate::internal::settings::Settings;

/// 规划结果：任务的最终落盘位置。
#[derive(Debug, Clone)]
pub struct FilePlacement {
    /// 绝对输出目录
    pub dir: PathBuf,
    /// 输出文件名
    pub filename: String,
    /// 绝对完整路径
    pub full_path: PathBuf,
}

/// 规划路径时的参数（形参超过 3 个，用 struct 承载）。
pub struct PlanPathsParams<'a> {
    pub prefs: &'a UserPreferences,
    pub settings: &'a Settings,
    pub metadata: &'a ServerMetadata,
}

/// 规划输出位置：目录存在或可创建，文件名非空，路径保证唯一。
pub async fn plan_paths(params: PlanPathsParams<'_>) -> Result<FilePlacement, DownloadError> {
    let filename = resolve_filename(params.prefs, params.metadata);
    let dir = resolve_dir(params.prefs, params.settings, &filename);
    let dir = absolutize(&dir);

    tokio::fs::create_dir_all(&dir)
        .await
        .map_err(DownloadError::CreateDir)?;

    let unique = generate_unique_path(&dir.join(&filename));
    let filename = unique
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(&filename)
        .to_string();

    debug!(dir = %dir.display(), filename = %filename, "路径规划完成");

    Ok(FilePlacement {
        dir,
        full_path: unique,
        filename,
    })
}

/// 文件名三级回退。服务器建议名为空时直接走默认名。
fn resolve_filename(prefs: &UserPreferences, metadata: &ServerMetadata) -> String {
    if let Some(name) = prefs.filename.as_ref().filter(|n| !n.is_empty()) {
        return name.clone();
    }
    if !metadata.filename.is_empty() {
        return metadata.filename.clone();
    }
    default_filename(&metadata.content_type)
}

/// 目录回退链。分类规则仅在用户未指定目录时参与。
fn resolve_dir(prefs: &UserPreferences, settings: &Settings, filename: &str) -> PathBuf {
    if let Some(dir) = &prefs.output_dir {
        return dir.clone();
    }
    if let Some(dir) = settings.output_dir_for(filename) {
        return dir;
    }
    if let Some(dir) = dirs::download_dir() {
        return dir;
    }
    if let Some(home) = dirs::home_dir() {
        return home.join("Downloads");
    }
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

/// 相对路径以当前目录为基准转绝对。
fn absolutize(dir: &Path) -> PathBuf {
    if dir.is_absolute() {
        dir.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(dir))
            .unwrap_or_else(|_| dir.to_path_buf())
    }
}
