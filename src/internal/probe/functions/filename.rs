//! 文件名解析：Content-Disposition、URL 路径、MIME 类型三级回退。

use url::Url;

/// 未能确定文件名时的默认名（扩展名由 Content-Type 推断后追加）。
pub const DEFAULT_FILENAME: &str = "downloaded_file";

/// 从 Content-Disposition 头解析文件名。
///
/// 优先取 `filename=` 参数；没有时取 `filename*=`（RFC 5987），
/// 仅处理 `UTF-8''` 前缀，去掉前缀后做百分号解码。
pub fn filename_from_content_disposition(header: &str) -> Option<String> {
    // filename= 优先（filename*= 包含 "filename=" 子串，先排除）
    for part in header.split(';') {
        let part = part.trim();
        if let Some(value) = part.strip_prefix("filename=") {
            let name = value.trim().trim_matches('"');
            if !name.is_empty() {
                return Some(name.to_string());
            }
        }
    }

    for part in header.split(';') {
        let part = part.trim();
        if let Some(value) = part.strip_prefix("filename*=") {
            let value = value.trim();
            if let Some(encoded) = value.strip_prefix("UTF-8''") {
                if let Ok(decoded) = urlencoding::decode(encoded) {
                    let name = decoded.into_owned();
                    if !name.is_empty() {
                        return Some(name);
                    }
                }
            }
        }
    }

    None
}

/// 从最终 URL 的路径末段取文件名；仅当末段带点（有扩展名）时有效。
pub fn filename_from_url(final_url: &str) -> Option<String> {
    let parsed = Url::parse(final_url).ok()?;
    let last = parsed.path_segments()?.next_back()?;
    if !last.is_empty() && last.contains('.') {
        // 路径段可能是百分号编码的
        let decoded = urlencoding::decode(last)
            .map(|d| d.into_owned())
            .unwrap_or_else(|_| last.to_string());
        return Some(decoded);
    }
    None
}

/// 内置 MIME → 扩展名映射；未命中返回空串。
pub fn extension_from_content_type(content_type: &str) -> &'static str {
    let mime = content_type.split(';').next().unwrap_or("").trim();
    match mime {
        "image/jpeg" => ".jpg",
        "image/png" => ".png",
        "image/gif" => ".gif",
        "text/html" => ".html",
        "text/plain" => ".txt",
        "application/pdf" => ".pdf",
        "application/zip" => ".zip",
        "application/json" => ".json",
        "video/mp4" => ".mp4",
        "audio/mpeg" => ".mp3",
        _ => "",
    }
}

/// 默认文件名 + 按 Content-Type 推断的扩展名。
pub fn default_filename(content_type: &str) -> String {
    format!(
        "{}{}",
        DEFAULT_FILENAME,
        extension_from_content_type(content_type)
    )
}
