/// Growth policy for the vector's backing buffer.
///
/// New capacity is calculated from the old capacity and the grow parameters:
///
/// `new = old + max(old * grow_percent / 100 + grow_delta, 1)`
///
/// The `max(.., 1)` term guarantees progress: even with both parameters at
/// zero, a full buffer still grows by at least one slot.
///
/// 向量后备缓冲区的增长策略。
/// 新容量由旧容量和增长参数计算得出：
/// `new = old + max(old * grow_percent / 100 + grow_delta, 1)`
/// `max(.., 1)` 项保证了进展：即使两个参数都为零，
/// 满的缓冲区仍然至少增长一个槽位。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GrowStrategy {
    /// Capacity allocated up front, before the first growth event.
    /// 在第一次增长事件之前预先分配的容量。
    pub initial_capacity: usize,
    /// Percentage of the old capacity added on each growth event.
    /// 每次增长事件中增加的旧容量百分比。
    pub grow_percent: usize,
    /// Flat number of slots added on each growth event.
    /// 每次增长事件中增加的固定槽位数。
    pub grow_delta: usize,
}

impl GrowStrategy {
    /// Create a strategy from explicit parameters.
    /// 从显式参数创建策略。
    #[inline]
    pub const fn new(initial_capacity: usize, grow_percent: usize, grow_delta: usize) -> Self {
        Self {
            initial_capacity,
            grow_percent,
            grow_delta,
        }
    }

    /// Compute the capacity after one growth event starting from `base`.
    ///
    /// The result is always strictly greater than `base`.
    ///
    /// 计算从 `base` 开始一次增长事件后的容量。
    /// 结果总是严格大于 `base`。
    #[inline]
    pub fn calc_new_size(&self, base: usize) -> usize {
        let delta = base * self.grow_percent / 100 + self.grow_delta;
        base + delta.max(1)
    }
}

impl Default for GrowStrategy {
    /// Default strategy: start empty, double on growth.
    /// 默认策略：从空开始，增长时翻倍。
    #[inline]
    fn default() -> Self {
        Self::new(0, 100, 0)
    }
}
