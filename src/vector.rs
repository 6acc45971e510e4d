use crate::buffer::Buffer;
use crate::grow::GrowStrategy;
use crate::hold::{Generation, GenerationHolder, RetiredBuffer};
use crate::memory::MemoryUsage;
use crate::sync::{Arc, AtomicPtr, Ordering};
use std::marker::PhantomData;

/// Shared core: the atomically published pointer to the live buffer.
///
/// The writer replaces the pointer on growth; readers load it on every
/// access. Exactly one buffer is live at any instant.
///
/// 共享核心：原子发布的指向存活缓冲区的指针。
/// 写入者在增长时替换指针；读取者在每次访问时加载它。
/// 任何时刻恰好有一个缓冲区是存活的。
struct VectorCore<T> {
    current: AtomicPtr<Buffer<T>>,
    // Carries the buffer's auto traits: the core owns the pointee
    // 承载缓冲区的自动 trait：核心拥有指针指向的对象
    _marker: PhantomData<Buffer<T>>,
}

impl<T> Drop for VectorCore<T> {
    /// Drops the live buffer. Runs when the writer and every reader handle
    /// are gone, so nothing can still observe the pointer.
    ///
    /// 释放存活缓冲区。在写入者和所有读取者句柄都消失后运行，
    /// 因此没有任何东西还能观察到该指针。
    fn drop(&mut self) {
        let ptr = self.current.load(Ordering::Relaxed);
        if !ptr.is_null() {
            unsafe {
                drop(Box::from_raw(ptr));
            }
        }
    }
}

/// The writer handle of a single-writer multi-reader growable vector.
///
/// Readers obtained via [`reader`](RcuVector::reader) index into the vector
/// without locks and never observe freed memory. The writer appends in place
/// while capacity suffices; when it does not, a larger buffer is allocated,
/// the live elements are copied over, the new buffer is atomically published
/// and the old one is handed to the [`GenerationHolder`] tagged with the
/// generation current at that instant. The old buffer stays allocated until
/// [`remove_old_generations`](RcuVector::remove_old_generations) proves it
/// unreachable.
///
/// `RcuVector` is deliberately not `Clone`: the design supports exactly one
/// mutator, and the unique writer handle makes that precondition a
/// type-level property instead of a documentation footnote.
///
/// Generation bookkeeping is driven from outside: the owner advances the
/// counter via [`set_generation`](RcuVector::set_generation) (typically once
/// per write-epoch boundary, from an external epoch tracker) and feeds the
/// tracker's first-used-generation report into `remove_old_generations`.
/// This crate never computes the reclamation floor itself.
///
/// 单写多读可增长向量的写入者句柄。
/// 通过 [`reader`](RcuVector::reader) 获得的读取者无锁地索引向量，
/// 且永远不会观察到已释放的内存。容量足够时写入者就地追加；
/// 不够时，分配更大的缓冲区，复制存活元素，原子发布新缓冲区，
/// 并将旧缓冲区交给 [`GenerationHolder`]，
/// 标记为该时刻的当前代数。旧缓冲区保持分配状态，
/// 直到 [`remove_old_generations`](RcuVector::remove_old_generations)
/// 证明它不可达。
/// `RcuVector` 故意不实现 `Clone`：该设计只支持恰好一个修改者，
/// 唯一的写入者句柄使这个前提条件成为类型级属性，而非文档脚注。
/// 代数记录由外部驱动：所有者通过
/// [`set_generation`](RcuVector::set_generation) 推进计数器
/// （通常由外部纪元追踪器在每个写纪元边界推进一次），
/// 并将追踪器报告的最早使用代数传入 `remove_old_generations`。
/// 本 crate 从不自行计算回收下限。
pub struct RcuVector<T: Copy> {
    core: Arc<VectorCore<T>>,
    grow: GrowStrategy,
    generation: Generation,
    holder: GenerationHolder,
}

/// A cloneable read handle over the vector's shared core.
///
/// Reads are wait-free: one atomic pointer load, one atomic length load, one
/// element read. A reader mid-access keeps seeing valid values from the
/// buffer it loaded even if the writer grows the vector underneath it,
/// because detached buffers are retired, not freed.
///
/// 向量共享核心上的可克隆读取句柄。
/// 读取是无等待的：一次原子指针加载、一次原子长度加载、一次元素读取。
/// 即使写入者在其下方增长向量，访问中的读取者
/// 仍然从它加载的缓冲区中看到有效值，
/// 因为分离的缓冲区被退休而非释放。
pub struct RcuReader<T: Copy> {
    core: Arc<VectorCore<T>>,
}

impl<T: Copy> Clone for RcuReader<T> {
    fn clone(&self) -> Self {
        Self {
            core: self.core.clone(),
        }
    }
}

impl<T: Copy + Send + Sync> RcuVector<T> {
    /// Create an empty vector with the default grow strategy.
    /// 使用默认增长策略创建一个空向量。
    pub fn new() -> Self {
        Self::with_strategy(GrowStrategy::default())
    }

    /// Create a vector with the given strategy; the strategy's initial
    /// capacity is allocated up front.
    ///
    /// 使用给定策略创建向量；策略的初始容量会预先分配。
    pub fn with_strategy(grow: GrowStrategy) -> Self {
        let buf = Box::new(Buffer::with_capacity(grow.initial_capacity));
        Self {
            core: Arc::new(VectorCore {
                current: AtomicPtr::new(Box::into_raw(buf)),
                _marker: PhantomData,
            }),
            grow,
            generation: 0,
            holder: GenerationHolder::new(),
        }
    }

    /// Create a read handle sharing this vector's core.
    /// 创建共享此向量核心的读取句柄。
    pub fn reader(&self) -> RcuReader<T> {
        RcuReader {
            core: self.core.clone(),
        }
    }

    /// The live buffer, writer-side. No ordering needed: the writer wrote
    /// the pointer itself.
    ///
    /// 写入者侧的存活缓冲区。无需内存序：指针是写入者自己写入的。
    #[inline]
    fn buf(&self) -> &Buffer<T> {
        // SAFETY: the current pointer is never null and the live buffer is
        // only freed once the core itself is dropped
        unsafe { &*self.core.current.load(Ordering::Relaxed) }
    }

    /// Number of elements.
    /// 元素数量。
    #[inline]
    pub fn len(&self) -> usize {
        self.buf().len()
    }

    /// Allocated capacity of the live buffer.
    /// 存活缓冲区的已分配容量。
    #[inline]
    pub fn capacity(&self) -> usize {
        self.buf().capacity()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buf().len() == 0
    }

    /// Whether all capacity has been used. If true, the next `push_back`
    /// triggers a growth event and a retirement.
    ///
    /// 是否已用完所有容量。如果为真，
    /// 下一次 `push_back` 会触发增长事件和一次退休。
    #[inline]
    pub fn is_full(&self) -> bool {
        self.buf().is_full()
    }

    /// Read the element at `i`, or `None` when out of bounds.
    /// 读取索引 `i` 处的元素，越界时返回 `None`。
    #[inline]
    pub fn get(&self, i: usize) -> Option<T> {
        self.buf().get(i)
    }

    /// Append one element. Allocation-free while capacity suffices; on the
    /// growing branch the old buffer is retired, never freed in place.
    ///
    /// 追加一个元素。容量足够时不分配；
    /// 在增长分支上旧缓冲区被退休，而非就地释放。
    #[inline]
    pub fn push_back(&mut self, v: T) {
        let buf = self.buf();
        if !buf.is_full() {
            // SAFETY: not full; this is the unique writer handle
            unsafe { buf.push(v) };
        } else {
            self.expand_and_insert(v);
        }
    }

    #[inline(never)]
    fn expand_and_insert(&mut self, v: T) {
        self.expand(self.grow.calc_new_size(self.capacity()));
        // SAFETY: expand left at least one free slot
        unsafe { self.buf().push(v) };
    }

    /// Grow capacity to at least `n`, retiring the old buffer. Idempotent:
    /// a no-op when capacity already suffices, and never shrinks.
    ///
    /// 将容量增长到至少 `n`，并退休旧缓冲区。
    /// 幂等：容量已足够时是空操作，且从不收缩。
    pub fn reserve(&mut self, n: usize) {
        self.expand(n);
    }

    /// The growth protocol: allocate, copy, publish, then retire.
    /// A reader that observes the new pointer sees every element
    /// copied as of the publish; a reader still inside the old buffer keeps
    /// reading valid memory because the buffer is only detached, not freed.
    ///
    /// 增长协议：分配、复制、发布、退休——按此顺序。
    /// 观察到新指针的读取者能看到发布时已复制的所有元素；
    /// 仍在旧缓冲区中的读取者继续读取有效内存，
    /// 因为缓冲区只是被分离而非释放。
    fn expand(&mut self, new_capacity: usize) {
        if new_capacity <= self.capacity() {
            return;
        }
        let new = Box::new(Buffer::with_capacity(new_capacity));
        // SAFETY: new_capacity > capacity >= len, and the fresh buffer is
        // not yet visible to any reader
        unsafe { new.copy_from(self.buf()) };

        // Publish happens-after copy: the Release swap orders the element
        // copies before the pointer becomes visible to Acquire loads.
        // 发布在复制之后发生：Release 交换确保元素复制
        // 排在指针对 Acquire 加载可见之前。
        let old_ptr = self
            .core
            .current
            .swap(Box::into_raw(new), Ordering::Release);

        // Retirement happens-after publish: the old buffer may still be
        // referenced by in-flight readers, so it is tagged and parked.
        // 退休在发布之后发生：旧缓冲区可能仍被进行中的读取者引用，
        // 因此将其打上标签并暂存。
        // SAFETY: old_ptr came from Box::into_raw and is no longer reachable
        // through the core
        let old = unsafe { Box::from_raw(old_ptr) };
        self.holder.hold(RetiredBuffer::new(old, self.generation));
    }

    /// Grow (by the strategy formula) and fill with `fill` until the vector
    /// holds at least `n` elements. A no-op when `n <= len()`.
    ///
    /// 按策略公式增长并用 `fill` 填充，直到向量至少持有 `n` 个元素。
    /// 当 `n <= len()` 时是空操作。
    pub fn ensure_size(&mut self, n: usize, fill: T) {
        if n <= self.len() {
            return;
        }
        let mut target = self.capacity();
        while target < n {
            target = self.grow.calc_new_size(target);
        }
        self.expand(target);
        // SAFETY: capacity >= n after expand; this is the unique writer
        unsafe { self.buf().fill_to(n, fill) };
    }

    /// Set the size to 0; capacity and pending retirements are preserved.
    ///
    /// Truncation itself is reader-safe: readers only ever observe a shorter
    /// prefix over initialized slots. Refilling the truncated slots (via
    /// [`push_back`](Self::push_back) or [`ensure_size`](Self::ensure_size))
    /// while a reader that loaded the pre-clear length is still indexing
    /// into them is not; hold off refilling until such readers have exited,
    /// as tracked by the external epoch tracker.
    ///
    /// 将大小设为 0；容量和待回收的退休缓冲区保留。
    /// 截断本身对读取者是安全的：读取者只会观察到更短的前缀。
    /// 在仍有读取者持有截断前的长度并据此索引时重新填充被截断的槽位
    /// 则不安全；应等到外部纪元追踪器确认这些读取者退出后再填充。
    #[inline]
    pub fn clear(&mut self) {
        // SAFETY: 0 <= capacity; readers only ever see a shrunk prefix
        unsafe { self.buf().set_len(0) };
    }

    /// Reduce the size to `new_size`; capacity is untouched. Rare operation,
    /// kept off the hot path. Readers only ever observe a shorter prefix.
    ///
    /// The same refill caveat as [`clear`](Self::clear) applies: slots at or
    /// beyond `new_size` must not be overwritten while a reader that loaded
    /// the pre-shrink length may still be reading them.
    ///
    /// 将大小减少到 `new_size`；容量不变。罕见操作，不在热路径上。
    /// 读取者只会观察到更短的前缀。重新填充的限制与
    /// [`clear`](Self::clear) 相同：在仍有读取者持有收缩前的长度时，
    /// 不得覆盖 `new_size` 及其之后的槽位。
    #[inline(never)]
    pub fn shrink(&mut self, new_size: usize) {
        assert!(
            new_size <= self.len(),
            "BUG: shrink to a larger size ({} > {})",
            new_size,
            self.len()
        );
        // SAFETY: new_size <= len <= capacity, slots below stay initialized
        unsafe { self.buf().set_len(new_size) };
    }

    /// Overwrite the element at `i` in place, without replacing the buffer.
    ///
    /// # Panics
    /// Panics when `i >= len()`.
    ///
    /// # Safety
    /// No reader may read slot `i` concurrently with this call. The slot
    /// write is non-atomic, so the caller must fence readers away from the
    /// slot through external synchronization (the same epoch tracker that
    /// drives [`remove_old_generations`](Self::remove_old_generations), or
    /// by updating only slots readers have not yet been handed an index
    /// for). Updates that must not race readers should go through a buffer
    /// replacement instead.
    ///
    /// 就地覆盖索引 `i` 处的元素，不替换缓冲区。
    /// # Panics
    /// 当 `i >= len()` 时 panic。
    /// # Safety
    /// 任何读取者都不得与此调用并发读取槽位 `i`。槽位写入是非原子的，
    /// 调用者必须通过外部同步（驱动
    /// [`remove_old_generations`](Self::remove_old_generations)
    /// 的同一纪元追踪器，或只更新尚未向读取者公开索引的槽位）
    /// 将读取者隔离在该槽位之外。
    #[inline]
    pub unsafe fn set(&mut self, i: usize, v: T) {
        let buf = self.buf();
        assert!(i < buf.len(), "index {} out of bounds (len {})", i, buf.len());
        // SAFETY: i < len; absence of a racing reader is the caller's
        // obligation, stated above
        unsafe { buf.write(i, v) };
    }

    /// Current generation used to tag the next retirement.
    /// 用于标记下一次退休的当前代数。
    #[inline]
    pub fn get_generation(&self) -> Generation {
        self.generation
    }

    /// Set the generation. The counter is owned by the caller and must be
    /// monotonically non-decreasing; this crate never advances it itself.
    ///
    /// 设置代数。计数器由调用者拥有且必须单调非递减；
    /// 本 crate 从不自行推进它。
    #[inline]
    pub fn set_generation(&mut self, generation: Generation) {
        debug_assert!(
            generation >= self.generation,
            "BUG: generation moved backwards ({} -> {})",
            self.generation,
            generation
        );
        self.generation = generation;
    }

    /// Free every retired buffer whose tag is strictly below `first_used`.
    /// Buffers tagged exactly `first_used` are kept. The only place this
    /// variant deallocates a retired buffer.
    ///
    /// Returns the number of buffers freed.
    ///
    /// # Safety
    /// `first_used` must be the external epoch tracker's floor of the
    /// generations any active reader might still be in. Passing a too-high
    /// floor frees memory a reader may still dereference.
    ///
    /// 释放标签严格低于 `first_used` 的所有退休缓冲区。
    /// 标签恰好等于 `first_used` 的缓冲区被保留。
    /// 这是此变体释放退休缓冲区的唯一位置。
    /// 返回释放的缓冲区数量。
    /// # Safety
    /// `first_used` 必须是外部纪元追踪器给出的、
    /// 任何活跃读取者可能仍处于的代数下限。
    /// 传入过高的下限会释放读取者可能仍在解引用的内存。
    pub unsafe fn remove_old_generations(&mut self, first_used: Generation) -> usize {
        unsafe { self.holder.reclaim(first_used) }
    }

    /// Drop size and capacity to zero and free all pending retirements
    /// immediately, skipping the retirement path entirely.
    ///
    /// # Safety
    /// Legal only when no concurrent reader exists (single-threaded
    /// teardown): both the live buffer and every held buffer are freed
    /// without waiting for a generation floor.
    ///
    /// 将大小和容量降为零，并立即释放所有待回收的退休缓冲区，
    /// 完全跳过退休路径。
    /// # Safety
    /// 仅在不存在并发读取者时合法（单线程清理）：
    /// 存活缓冲区和每个持有的缓冲区都会被释放，而不等待代数下限。
    pub unsafe fn reset(&mut self) {
        let empty = Box::new(Buffer::with_capacity(0));
        let old_ptr = self
            .core
            .current
            .swap(Box::into_raw(empty), Ordering::Release);
        // SAFETY: caller guarantees no reader can still hold the pointer
        unsafe {
            drop(Box::from_raw(old_ptr));
            self.holder.reclaim_all();
        }
    }

    /// Set the size directly, bypassing initialization bookkeeping.
    ///
    /// # Safety
    /// `n <= capacity()` must hold, every slot below `n` must be
    /// initialized or acceptable to read as-is, and effects visible to
    /// concurrent readers are undefined by contract: intended for
    /// writer-exclusive bulk-fill patterns.
    ///
    /// 直接设置大小，绕过初始化记录。
    /// # Safety
    /// 必须满足 `n <= capacity()`，`n` 以下的每个槽位都必须已初始化
    /// 或按原样读取可接受，且对并发读取者可见的效果按约定是未定义的：
    /// 适用于写入者独占的批量填充模式。
    pub unsafe fn unsafe_resize(&mut self, n: usize) {
        unsafe { self.buf().set_len(n) };
    }

    /// Grow capacity to at least `n` in one jump, bypassing both the
    /// strategy formula and the retirement path: the old buffer is freed
    /// immediately.
    ///
    /// # Safety
    /// Legal only when no concurrent reader exists; a reader still inside
    /// the old buffer would be left dereferencing freed memory.
    ///
    /// 一步将容量增长到至少 `n`，绕过策略公式和退休路径：
    /// 旧缓冲区立即释放。
    /// # Safety
    /// 仅在不存在并发读取者时合法；
    /// 仍在旧缓冲区中的读取者将解引用已释放的内存。
    pub unsafe fn unsafe_reserve(&mut self, n: usize) {
        if n <= self.capacity() {
            return;
        }
        let new = Box::new(Buffer::with_capacity(n));
        // SAFETY: n > capacity >= len, fresh buffer not yet visible
        unsafe { new.copy_from(self.buf()) };
        let old_ptr = self
            .core
            .current
            .swap(Box::into_raw(new), Ordering::Release);
        // SAFETY: caller guarantees no reader can still hold the pointer
        unsafe { drop(Box::from_raw(old_ptr)) };
    }

    /// The retirement sink, for inspection (pending count, held bytes).
    /// 退休接收器，用于检查（待回收数量、持有字节数）。
    #[inline]
    pub fn holder(&self) -> &GenerationHolder {
        &self.holder
    }

    /// Memory accounting for the live buffer plus the bytes still pinned by
    /// retired-but-unreclaimed buffers.
    ///
    /// 存活缓冲区的内存统计，加上已退休但未回收缓冲区仍占用的字节数。
    pub fn memory_usage(&self) -> MemoryUsage {
        let buf = self.buf();
        let allocated_bytes = buf.allocated_bytes();
        let used_bytes = buf.len() * size_of::<T>();
        MemoryUsage {
            allocated_bytes,
            used_bytes,
            dead_bytes: allocated_bytes - used_bytes,
            held_bytes: self.holder.held_bytes(),
        }
    }
}

impl<T: Copy + Send + Sync> Default for RcuVector<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Copy + Send + Sync + std::fmt::Debug> std::fmt::Debug for RcuVector<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RcuVector")
            .field("len", &self.len())
            .field("capacity", &self.capacity())
            .field("generation", &self.generation)
            .field("pending_holds", &self.holder.pending())
            .finish()
    }
}

impl<T: Copy> RcuReader<T> {
    /// The live buffer as currently published. Acquire pairs with the
    /// writer's Release swap, so every element copied before the publish is
    /// visible.
    ///
    /// 当前发布的存活缓冲区。Acquire 与写入者的 Release 交换配对，
    /// 因此发布之前复制的所有元素都可见。
    #[inline]
    fn buf(&self) -> &Buffer<T> {
        // SAFETY: the pointer is never null; the buffer it names is either
        // live or retired-but-unreclaimed, and reclamation is an unsafe
        // operation whose contract excludes in-flight readers
        unsafe { &*self.core.current.load(Ordering::Acquire) }
    }

    /// Read the element at `i`, or `None` when out of bounds.
    ///
    /// Elements appended after this call began are not guaranteed to be
    /// seen; elements visible at the pointer load are.
    ///
    /// 读取索引 `i` 处的元素，越界时返回 `None`。
    /// 不保证能看到此调用开始后追加的元素；
    /// 指针加载时可见的元素是有保证的。
    #[inline]
    pub fn get(&self, i: usize) -> Option<T> {
        self.buf().get(i)
    }

    /// Number of elements in the currently published buffer.
    /// 当前发布缓冲区中的元素数量。
    #[inline]
    pub fn len(&self) -> usize {
        self.buf().len()
    }

    /// Capacity of the currently published buffer.
    /// 当前发布缓冲区的容量。
    #[inline]
    pub fn capacity(&self) -> usize {
        self.buf().capacity()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: Copy> std::fmt::Debug for RcuReader<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RcuReader")
            .field("len", &self.len())
            .finish()
    }
}
