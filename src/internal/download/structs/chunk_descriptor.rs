//! 分片规划：把 `[0, N)` 划分成连续不重叠、覆盖每个字节恰好一次的区间。

/// 一个分片的描述，规划完成后不再变更。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkDescriptor {
    /// 分片下标，从 0 开始
    pub index: usize,
    /// 起始字节（含）
    pub start: u64,
    /// 结束字节（含）
    pub end: u64,
    /// 预期字节数
    pub size: u64,
}

/// 把 `total` 字节划分为 `count` 份，返回每份的字节数。
///
/// 基础份额 `b = floor(total/count)`；余数全部加到倒数第二个分片上
/// （`count == 2` 时即分片 0）。临时分片文件的长度承载各分片的预期大小，
/// 跨重启续传依赖该放置方式，不可改动。
pub fn divide_chunks(total: u64, count: usize) -> Vec<u64> {
    let base = total / count as u64;
    let remainder = total - base * count as u64;

    (0..count)
        .map(|i| {
            if count >= 2 && i == count - 2 {
                base + remainder
            } else {
                base
            }
        })
        .collect()
}

/// 由大小序列推出各分片的起止区间。
pub fn plan_chunks(total: u64, count: usize) -> Vec<ChunkDescriptor> {
    let sizes = divide_chunks(total, count);
    let mut offset = 0u64;

    sizes
        .into_iter()
        .enumerate()
        .map(|(index, size)| {
            let chunk = ChunkDescriptor {
                index,
                start: offset,
                end: offset + size - 1,
                size,
            };
            offset += size;
            chunk
        })
        .collect()
}
