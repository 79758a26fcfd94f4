//! 唯一文件名：目标已存在时在扩展名前追加 " (1)"、" (2)" … 直到无冲突。

use std::path::{Path, PathBuf};

/// 文件名去掉最后一级扩展名后的主干；无扩展名时返回原名。
///
/// `"archive.tar.gz"` → `"archive.tar"`。
pub fn file_stem(filename: &str) -> &str {
    match filename.rfind('.') {
        Some(idx) if idx > 0 => &filename[..idx],
        _ => filename,
    }
}

/// 最后一级扩展名（含点）；无扩展名时返回空串。
pub fn file_extension(filename: &str) -> &str {
    match filename.rfind('.') {
        Some(idx) if idx > 0 => &filename[idx..],
        _ => "",
    }
}

/// 生成不与现有文件冲突的路径。
///
/// 原路径不存在时原样返回；否则依次尝试 `"{stem} (1){ext}"`、
/// `"{stem} (2){ext}"` … 返回第一个不存在的路径。
pub fn generate_unique_path(path: &Path) -> PathBuf {
    if !path.exists() {
        return path.to_path_buf();
    }

    let filename = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();
    let stem = file_stem(filename);
    let ext = file_extension(filename);
    let dir = path.parent().unwrap_or_else(|| Path::new("."));

    for i in 1u32.. {
        let candidate = dir.join(format!("{} ({}){}", stem, i, ext));
        if !candidate.exists() {
            return candidate;
        }
    }
    unreachable!("唯一文件名序号耗尽")
}
