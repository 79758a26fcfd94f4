//! 下载策略配置：JSON 配置文件的解析与查询。
//!
//! 配置对象由调用方显式注入任务构建器，库内不保存全局单例。
//! 键名与既有配置文件格式保持兼容（`ThreadCount`、`categoryInfo` 等）。

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 多线程下载的内置文件大小门槛：10 MiB。
/// 配置可以调高，但不能低于该值。
pub const DEFAULT_MULTI_STREAM_THRESHOLD: u64 = 10 * 1024 * 1024;

/// 默认最大重试次数。
pub const DEFAULT_MAX_RETRIES: usize = 3;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("读取配置文件失败: {0}")]
    Read(#[from] std::io::Error),

    #[error("解析配置文件失败: {0}")]
    Parse(#[from] serde_json::Error),
}

/// 一条分类规则：一组扩展名映射到一个输出目录。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CategoryRule {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub exts: Vec<String>,
    #[serde(default, rename = "outputDir")]
    pub output_dir: String,
}

/// 下载策略配置。所有字段可缺省，缺省值在查询方法里兜底。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default, rename = "ThreadCount")]
    pub thread_count: usize,
    #[serde(default, rename = "MaxRetries")]
    pub max_retries: usize,
    #[serde(default, rename = "MinimumFileSize")]
    pub minimum_file_size: u64,
    #[serde(default, rename = "MaxConcurrentDownloads")]
    pub max_concurrent_downloads: usize,
    #[serde(default, rename = "Categories")]
    pub categories: Vec<String>,
    #[serde(default, rename = "Extensions")]
    pub extensions: Vec<String>,
    #[serde(default, rename = "OutputDir")]
    pub output_dir: String,
    #[serde(default, rename = "MainOutputDir")]
    pub main_output_dir: String,
    #[serde(default, rename = "categoryInfo")]
    pub category_info: Vec<CategoryRule>,
    #[serde(default, rename = "CustomHeaders")]
    pub custom_headers: HashMap<String, String>,
    #[serde(default, rename = "CustomCookies")]
    pub custom_cookies: String,
}

impl Settings {
    /// 从 JSON 文件加载配置。
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// 配置的线程数；未配置（0）时返回 None，由任务按文件大小自选。
    pub fn thread_count(&self) -> Option<usize> {
        (self.thread_count > 0).then_some(self.thread_count)
    }

    /// 最大重试次数，未配置时取默认值。
    pub fn effective_max_retries(&self) -> usize {
        if self.max_retries > 0 {
            self.max_retries
        } else {
            DEFAULT_MAX_RETRIES
        }
    }

    /// 多线程下载的生效门槛：配置只能调高内置门槛，不能调低。
    pub fn multi_stream_threshold(&self) -> u64 {
        self.minimum_file_size.max(DEFAULT_MULTI_STREAM_THRESHOLD)
    }

    /// 按扩展名路由输出目录：分类规则 > MainOutputDir > OutputDir。
    /// 都未配置时返回 None，由路径规划回退到系统下载目录。
    pub fn output_dir_for(&self, filename: &str) -> Option<PathBuf> {
        let ext = filename
            .rsplit_once('.')
            .map(|(_, e)| e.to_ascii_lowercase())
            .unwrap_or_default();

        if !ext.is_empty() {
            for rule in &self.category_info {
                if rule.output_dir.is_empty() {
                    continue;
                }
                if rule.exts.iter().any(|e| e.eq_ignore_ascii_case(&ext)) {
                    return Some(PathBuf::from(&rule.output_dir));
                }
            }
        }

        if !self.main_output_dir.is_empty() {
            return Some(PathBuf::from(&self.main_output_dir));
        }
        if !self.output_dir.is_empty() {
            return Some(PathBuf::from(&self.output_dir));
        }
        None
    }
}
