//! 文件系统工具模块：唯一文件名、分片临时文件的命名/创建/合并/清理。

pub mod chunk_files;
pub mod unique_name;

pub use chunk_files::{
    chunk_file_paths, cleanup_chunk_files, create_chunk_files, create_file_with_parents,
    merge_chunk_files, CHUNK_FILE_EXT,
};
pub use unique_name::{file_extension, file_stem, generate_unique_path};
