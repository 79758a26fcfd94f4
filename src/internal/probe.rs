//! 服务器探测模块：获取远程文件的元数据（文件名、大小、类型、Range 支持）。

pub mod functions;
pub mod structs;

pub use functions::fetch_metadata::{fetch_server_metadata, ProbeError};
pub use structs::server_metadata::ServerMetadata;
