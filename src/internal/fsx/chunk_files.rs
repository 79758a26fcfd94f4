//! 分片临时文件：命名、创建、按序合并到最终文件、失败清理。
//!
//! 命名规则 `"{主干} ({下标}){CHUNK_FILE_EXT}"`，下标从 0 开始；
//! 临时文件当前长度即该分片的续传偏移，重启后依赖它恢复。

use std::io;
use std::path::{Path, PathBuf};

use tokio::fs::{File, OpenOptions};
use tracing::{debug, warn};

use super::unique_name::file_stem;

/// 分片临时文件扩展名。
pub const CHUNK_FILE_EXT: &str = ".udtemp";

/// 生成全部分片临时文件路径，与最终文件同目录。
pub fn chunk_file_paths(final_path: &Path, chunk_count: usize) -> Vec<PathBuf> {
    let dir = final_path.parent().unwrap_or_else(|| Path::new("."));
    let filename = final_path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();
    let stem = file_stem(filename);

    (0..chunk_count)
        .map(|i| dir.join(format!("{} ({}){}", stem, i, CHUNK_FILE_EXT)))
        .collect()
}

/// 创建一个空文件，父目录不存在时先创建。
pub async fn create_file_with_parents(path: &Path) -> io::Result<File> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    File::create(path).await
}

/// 创建全部分片临时文件；已存在的不截断（其长度承载续传偏移）。
pub async fn create_chunk_files(paths: &[PathBuf]) -> io::Result<()> {
    for path in paths {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        // create_new 失败说明文件已存在，保留现有内容
        OpenOptions::new()
            .write(true)
            .create(true)
            .append(true)
            .open(path)
            .await?;
    }
    Ok(())
}

/// 按分片下标顺序把临时文件合并为最终文件；每片复制成功后立即删除。
pub async fn merge_chunk_files(chunk_paths: &[PathBuf], output_path: &Path) -> io::Result<()> {
    let mut output = create_file_with_parents(output_path).await?;

    for (i, chunk_path) in chunk_paths.iter().enumerate() {
        let mut chunk = File::open(chunk_path).await?;
        let copied = tokio::io::copy(&mut chunk, &mut output).await?;
        debug!(chunk = i, bytes = copied, "分片已并入最终文件");

        if let Err(e) = tokio::fs::remove_file(chunk_path).await {
            // 合并已成功，删除失败只记录不中断
            warn!(chunk = i, error = %e, "删除分片临时文件失败");
        }
    }

    output.sync_all().await?;
    Ok(())
}

/// 删除全部分片临时文件；不存在的忽略，个别失败不中断。
pub async fn cleanup_chunk_files(chunk_paths: &[PathBuf]) {
    for (i, path) in chunk_paths.iter().enumerate() {
        match tokio::fs::remove_file(path).await {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!(chunk = i, error = %e, "清理分片临时文件失败"),
        }
    }
}
