//! 用户偏好：输出位置、并发数、重试次数、自定义请求头与 Cookie。

use std::collections::HashMap;
use std::path::PathBuf;

/// 单个下载任务的用户偏好；未设置的项由配置与内置默认值兜底。
#[derive(Debug, Clone, Default)]
pub struct UserPreferences {
    /// 输出目录；未设置时走分类规则或系统下载目录
    pub output_dir: Option<PathBuf>,
    /// 输出文件名；未设置时采用服务器建议名
    pub filename: Option<String>,
    /// 并发下载线程数；未设置时按文件大小自动选择
    pub worker_count: Option<usize>,
    /// 单个分片的最大重试次数
    pub max_retries: Option<usize>,
    /// 自定义请求头，覆盖同名默认头
    pub headers: HashMap<String, String>,
    /// Cookie 字符串
    pub cookie: Option<String>,
}
