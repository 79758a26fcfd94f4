//! 下载客户端构造：连接/响应头超时 + 自定义请求头 + Cookie。
//!
//! 注意：不设置整体请求超时——下载流必须允许无限期传输，
//! 超时只约束建连与等待响应头两个阶段。

use std::collections::HashMap;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, COOKIE};
use reqwest::Client;
use thiserror::Error;

/// 建立连接（含 TLS 握手）超时：15 秒。
pub const CONNECT_TIMEOUT_SECS: u64 = 15;

/// 等待服务器响应数据超时：15 秒。
pub const READ_TIMEOUT_SECS: u64 = 15;

#[derive(Debug, Error)]
pub enum NetError {
    #[error("非法请求头 {name}: {message}")]
    InvalidHeader { name: String, message: String },

    #[error("构造 HTTP 客户端失败: {0}")]
    Build(#[from] reqwest::Error),
}

/// 构造客户端时的参数（形参超过 3 个，用 struct 承载）。
pub struct BuildClientParams<'a> {
    /// 自定义请求头，覆盖同名默认头
    pub headers: &'a HashMap<String, String>,
    /// Cookie 字符串，空则不携带
    pub cookie: Option<&'a str>,
}

/// 构造下载用共享客户端：自动跟随重定向，连接池由 reqwest 内部维护。
pub fn build_download_client(params: BuildClientParams<'_>) -> Result<Client, NetError> {
    let mut default_headers = HeaderMap::new();

    for (name, value) in params.headers {
        let header_name =
            HeaderName::from_bytes(name.as_bytes()).map_err(|e| NetError::InvalidHeader {
                name: name.clone(),
                message: e.to_string(),
            })?;
        let header_value =
            HeaderValue::from_str(value).map_err(|e| NetError::InvalidHeader {
                name: name.clone(),
                message: e.to_string(),
            })?;
        default_headers.insert(header_name, header_value);
    }

    if let Some(cookie) = params.cookie.filter(|c| !c.is_empty()) {
        let value = HeaderValue::from_str(cookie).map_err(|e| NetError::InvalidHeader {
            name: "Cookie".to_string(),
            message: e.to_string(),
        })?;
        default_headers.insert(COOKIE, value);
    }

    let client = Client::builder()
        .default_headers(default_headers)
        .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
        .read_timeout(Duration::from_secs(READ_TIMEOUT_SECS))
        .build()?;

    Ok(client)
}
