use crate::buffer::Buffer;
use crate::grow::GrowStrategy;
use crate::memory::MemoryUsage;
use std::ops::{Index, IndexMut};

/// A growable array with an explicit grow strategy and immediate-free
/// growth.
///
/// This is the non-generational variant: it is a plain single-owner
/// container, mutated through `&mut self`, and the old backing buffer is
/// deallocated as soon as a growth event replaces it. For the concurrent
/// variant that defers deallocation through a retirement sink, see
/// [`RcuVector`](crate::RcuVector).
///
/// 具有显式增长策略和立即释放式增长的可增长数组。
/// 这是非代数追踪变体：它是一个普通的单所有者容器，
/// 通过 `&mut self` 修改，旧的后备缓冲区在增长事件替换它后立即释放。
/// 对于通过退休接收器延迟释放的并发变体，
/// 参见 [`RcuVector`](crate::RcuVector)。
pub struct GrowArray<T: Copy> {
    data: Buffer<T>,
    grow: GrowStrategy,
}

impl<T: Copy> GrowArray<T> {
    /// Create an empty array with the default grow strategy.
    /// 使用默认增长策略创建一个空数组。
    pub fn new() -> Self {
        Self::with_strategy(GrowStrategy::default())
    }

    /// Create an array with the given strategy; the strategy's initial
    /// capacity is allocated up front.
    ///
    /// 使用给定策略创建数组；策略的初始容量会预先分配。
    pub fn with_strategy(grow: GrowStrategy) -> Self {
        Self {
            data: Buffer::with_capacity(grow.initial_capacity),
            grow,
        }
    }

    /// Number of elements.
    /// 元素数量。
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Allocated capacity.
    /// 已分配容量。
    #[inline]
    pub fn capacity(&self) -> usize {
        self.data.capacity()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.len() == 0
    }

    /// Whether all capacity has been used. If true, the next `push_back`
    /// triggers a growth event.
    ///
    /// 是否已用完所有容量。如果为真，下一次 `push_back` 会触发增长事件。
    #[inline]
    pub fn is_full(&self) -> bool {
        self.data.is_full()
    }

    /// Append one element, growing by the strategy formula when full.
    /// 追加一个元素，满时按策略公式增长。
    #[inline]
    pub fn push_back(&mut self, v: T) {
        if !self.data.is_full() {
            // SAFETY: not full, exclusive access
            unsafe { self.data.push(v) };
        } else {
            self.expand_and_insert(v);
        }
    }

    #[inline(never)]
    fn expand_and_insert(&mut self, v: T) {
        self.expand(self.grow.calc_new_size(self.data.capacity()));
        // SAFETY: expand left at least one free slot
        unsafe { self.data.push(v) };
    }

    /// Grow capacity to at least `n`. Idempotent: a no-op when capacity
    /// already suffices, and never shrinks.
    ///
    /// 将容量增长到至少 `n`。幂等：容量已足够时是空操作，且从不收缩。
    pub fn reserve(&mut self, n: usize) {
        self.expand(n);
    }

    /// Replace the backing buffer with one of `new_capacity`, copying the
    /// live elements over. The old buffer is freed immediately.
    ///
    /// 用容量为 `new_capacity` 的缓冲区替换后备缓冲区，复制存活元素。
    /// 旧缓冲区立即释放。
    fn expand(&mut self, new_capacity: usize) {
        if new_capacity <= self.data.capacity() {
            return;
        }
        let new = Buffer::with_capacity(new_capacity);
        // SAFETY: new_capacity > capacity >= len, and the fresh buffer is
        // not shared
        unsafe { new.copy_from(&self.data) };
        // Old buffer is dropped here: the immediate-free growth hook
        self.data = new;
    }

    /// Grow (by the strategy formula) and fill with `fill` until the array
    /// holds at least `n` elements. A no-op when `n <= len()`.
    ///
    /// 按策略公式增长并用 `fill` 填充，直到数组至少持有 `n` 个元素。
    /// 当 `n <= len()` 时是空操作。
    pub fn ensure_size(&mut self, n: usize, fill: T) {
        if n <= self.data.len() {
            return;
        }
        self.expand(self.grow_target(n));
        // SAFETY: capacity >= n after expand, exclusive access
        unsafe { self.data.fill_to(n, fill) };
    }

    /// Capacity reached by applying the grow formula repeatedly until it
    /// covers `n`. Growth steps follow the strategy even for bulk requests,
    /// rather than jumping straight to `n`.
    ///
    /// 反复应用增长公式直到覆盖 `n` 所达到的容量。
    /// 即使是批量请求，增长步骤也遵循策略，而不是直接跳到 `n`。
    fn grow_target(&self, n: usize) -> usize {
        let mut target = self.data.capacity();
        while target < n {
            target = self.grow.calc_new_size(target);
        }
        target
    }

    /// Set the size to 0; capacity is preserved.
    /// 将大小设为 0；容量保留。
    #[inline]
    pub fn clear(&mut self) {
        // SAFETY: 0 <= capacity, exclusive access
        unsafe { self.data.set_len(0) };
    }

    /// Drop size and capacity to zero, deallocating the backing buffer.
    /// 将大小和容量降为零，释放后备缓冲区。
    pub fn reset(&mut self) {
        self.data = Buffer::with_capacity(0);
    }

    /// Reduce the size to `new_size`; capacity is untouched. Rare operation,
    /// kept off the hot path.
    ///
    /// 将大小减少到 `new_size`；容量不变。罕见操作，不在热路径上。
    #[inline(never)]
    pub fn shrink(&mut self, new_size: usize) {
        assert!(
            new_size <= self.data.len(),
            "BUG: shrink to a larger size ({} > {})",
            new_size,
            self.data.len()
        );
        // SAFETY: new_size <= len <= capacity, slots below stay initialized
        unsafe { self.data.set_len(new_size) };
    }

    /// Set the size directly, bypassing initialization bookkeeping.
    ///
    /// # Safety
    /// `n <= capacity()` must hold, and every slot below `n` must already be
    /// initialized or acceptable to read as-is. Intended for bulk-fill
    /// patterns where the caller fills first and resizes after.
    ///
    /// 直接设置大小，绕过初始化记录。
    /// # Safety
    /// 必须满足 `n <= capacity()`，且 `n` 以下的每个槽位都必须已初始化
    /// 或按原样读取是可接受的。适用于调用者先填充后调整大小的批量模式。
    pub unsafe fn unsafe_resize(&mut self, n: usize) {
        unsafe { self.data.set_len(n) };
    }

    /// Grow capacity to at least `n` in one jump, bypassing the strategy
    /// formula. The size is untouched.
    ///
    /// # Safety
    /// Same caller obligations as `unsafe_resize` with respect to later
    /// reads of slots the caller initializes by hand.
    ///
    /// 一步将容量增长到至少 `n`，绕过策略公式。大小不变。
    /// # Safety
    /// 对于调用者手动初始化的槽位的后续读取，
    /// 与 `unsafe_resize` 有相同的调用者义务。
    pub unsafe fn unsafe_reserve(&mut self, n: usize) {
        self.expand(n);
    }

    /// Read the element at `i`, or `None` when out of bounds.
    /// 读取索引 `i` 处的元素，越界时返回 `None`。
    #[inline]
    pub fn get(&self, i: usize) -> Option<T> {
        self.data.get(i)
    }

    /// The elements as a slice.
    /// 以切片形式访问元素。
    #[inline]
    pub fn as_slice(&self) -> &[T] {
        self.data.as_slice()
    }

    /// The elements as a mutable slice.
    /// 以可变切片形式访问元素。
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        self.data.as_mut_slice()
    }

    /// Memory accounting for the backing buffer. There is never held memory
    /// in this variant: growth frees the old buffer immediately.
    ///
    /// 后备缓冲区的内存统计。此变体从不持有待回收内存：
    /// 增长会立即释放旧缓冲区。
    pub fn memory_usage(&self) -> MemoryUsage {
        let allocated_bytes = self.data.allocated_bytes();
        let used_bytes = self.data.len() * size_of::<T>();
        MemoryUsage {
            allocated_bytes,
            used_bytes,
            dead_bytes: allocated_bytes - used_bytes,
            held_bytes: 0,
        }
    }
}

impl<T: Copy> Default for GrowArray<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Copy> Index<usize> for GrowArray<T> {
    type Output = T;

    #[inline]
    fn index(&self, i: usize) -> &T {
        &self.as_slice()[i]
    }
}

impl<T: Copy> IndexMut<usize> for GrowArray<T> {
    #[inline]
    fn index_mut(&mut self, i: usize) -> &mut T {
        &mut self.as_mut_slice()[i]
    }
}

impl<T: Copy + std::fmt::Debug> std::fmt::Debug for GrowArray<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.as_slice().iter()).finish()
    }
}
