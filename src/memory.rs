/// Memory accounting for a vector and its pending retirements.
///
/// `held_bytes` covers buffers that have been detached by a growth event but
/// not yet reclaimed. That memory is real committed cost until
/// `remove_old_generations` runs, so it is reported alongside the live
/// buffer.
///
/// 向量及其待回收退休缓冲区的内存统计。
/// `held_bytes` 涵盖已被增长事件分离但尚未回收的缓冲区。
/// 在 `remove_old_generations` 运行之前，这些内存是实际占用的成本，
/// 因此与存活缓冲区一起报告。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemoryUsage {
    /// Bytes committed by live allocations.
    /// 存活分配占用的字节数。
    pub allocated_bytes: usize,
    /// Bytes backing initialized elements.
    /// 已初始化元素占用的字节数。
    pub used_bytes: usize,
    /// Allocated but unused bytes (capacity beyond size).
    /// 已分配但未使用的字节数（超出大小的容量）。
    pub dead_bytes: usize,
    /// Bytes pinned by retired-but-unreclaimed buffers.
    /// 被已退休但未回收的缓冲区占用的字节数。
    pub held_bytes: usize,
}

impl MemoryUsage {
    /// Combine two reports component-wise.
    /// 按分量合并两个报告。
    #[inline]
    pub fn merge(self, other: MemoryUsage) -> MemoryUsage {
        MemoryUsage {
            allocated_bytes: self.allocated_bytes + other.allocated_bytes,
            used_bytes: self.used_bytes + other.used_bytes,
            dead_bytes: self.dead_bytes + other.dead_bytes,
            held_bytes: self.held_bytes + other.held_bytes,
        }
    }
}
