//! 服务器元数据：探测完成后不再变更（单线程下载中途的补充探测除外）。

/// 远程文件在服务器上的元数据。
#[derive(Debug, Clone, Default)]
pub struct ServerMetadata {
    /// 服务器建议的文件名（可能为空）
    pub filename: String,
    /// 文件大小（字节），未知时为 0
    pub size: u64,
    /// Content-Type 原文
    pub content_type: String,
    /// 服务器是否接受 Range 请求
    pub accepts_ranges: bool,
    /// 跟随重定向后的最终 URL
    pub final_url: String,
}
