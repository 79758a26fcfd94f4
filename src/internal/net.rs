//! 网络模块：构造带超时与默认请求头的共享 HTTP 客户端。

pub mod client;

pub use client::{build_download_client, BuildClientParams, NetError};
