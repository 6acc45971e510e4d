use crate::sync::{AtomicUsize, Ordering};
use std::alloc::{Layout, alloc, dealloc, handle_alloc_error};
use std::marker::PhantomData;
use std::ptr::NonNull;

/// A contiguous buffer with separate length and capacity.
///
/// The buffer is the leaf of the design: it never reallocates itself. When it
/// is full, the owning vector allocates a bigger buffer, copies the elements
/// over and replaces it wholesale.
///
/// The length is atomic so that a reader observing the buffer concurrently
/// with the single writer always sees a fully initialized prefix: the writer
/// writes the new slot first and publishes the length with `Release`, the
/// reader loads the length with `Acquire` before indexing.
///
/// `T: Copy` guarantees the element type has no destructor, so a whole buffer
/// can be discarded as raw storage without per-element teardown. The entire
/// deferred-reclamation scheme depends on this.
///
/// 具有独立长度和容量的连续缓冲区。
/// 缓冲区是设计的叶子节点：它从不自行重新分配。当它满时，
/// 拥有它的向量会分配一个更大的缓冲区，复制元素并整体替换它。
/// 长度是原子的，因此与单个写入者并发观察缓冲区的读取者
/// 总是看到完全初始化的前缀：写入者先写入新槽位，
/// 然后用 `Release` 发布长度，读取者在索引之前用 `Acquire` 加载长度。
/// `T: Copy` 保证元素类型没有析构函数，因此整个缓冲区可以作为
/// 原始存储被丢弃，无需逐元素清理。整个延迟回收方案都依赖于此。
pub(crate) struct Buffer<T> {
    /// Start of the allocation, dangling when `cap == 0`.
    /// 分配的起始位置，当 `cap == 0` 时为悬空指针。
    ptr: NonNull<T>,
    cap: usize,
    len: AtomicUsize,
    _marker: PhantomData<T>,
}

// The buffer is shared read-only across reader threads while the single
// writer appends through `&self`. All cross-thread visibility goes through
// the atomic `len`.
// 缓冲区在读取者线程之间以只读方式共享，而单个写入者通过 `&self` 追加。
// 所有跨线程可见性都通过原子的 `len` 进行。
unsafe impl<T: Send + Sync> Send for Buffer<T> {}
unsafe impl<T: Send + Sync> Sync for Buffer<T> {}

impl<T: Copy> Buffer<T> {
    /// Create a buffer with the given capacity. A zero capacity (or a
    /// zero-sized `T`) performs no allocation.
    ///
    /// Allocation failure is fatal: growth cannot silently continue with
    /// insufficient capacity without breaking the `len <= cap` invariant.
    ///
    /// 创建具有给定容量的缓冲区。零容量（或零大小的 `T`）不执行分配。
    /// 分配失败是致命的：增长不能在容量不足的情况下静默继续，
    /// 否则会破坏 `len <= cap` 不变量。
    pub(crate) fn with_capacity(cap: usize) -> Self {
        let ptr = if cap == 0 || size_of::<T>() == 0 {
            NonNull::dangling()
        } else {
            let layout = match Layout::array::<T>(cap) {
                Ok(layout) => layout,
                Err(_) => capacity_overflow(),
            };
            // SAFETY: layout has non-zero size, checked above
            let raw = unsafe { alloc(layout) } as *mut T;
            match NonNull::new(raw) {
                Some(ptr) => ptr,
                None => handle_alloc_error(layout),
            }
        };

        Self {
            ptr,
            cap,
            len: AtomicUsize::new(0),
            _marker: PhantomData,
        }
    }

    /// Current number of initialized elements.
    /// 当前已初始化元素的数量。
    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.len.load(Ordering::Acquire)
    }

    #[inline]
    pub(crate) fn capacity(&self) -> usize {
        self.cap
    }

    /// Whether all capacity has been used. If true, the next append must be
    /// preceded by an expand of the owning vector.
    ///
    /// 是否已用完所有容量。如果为真，下一次追加之前
    /// 必须先由拥有它的向量进行扩展。
    #[inline]
    pub(crate) fn is_full(&self) -> bool {
        self.len.load(Ordering::Relaxed) == self.cap
    }

    /// Append one element in place. Never allocates.
    ///
    /// The slot is written before the length is published with `Release`, so
    /// a reader that observes the new length also observes the element.
    ///
    /// # Safety
    /// Only the single writer may call this, and the buffer must not be full.
    ///
    /// 就地追加一个元素。从不分配。
    /// 槽位在长度以 `Release` 发布之前写入，
    /// 因此观察到新长度的读取者也能观察到该元素。
    /// # Safety
    /// 只有单个写入者可以调用此方法，且缓冲区不能是满的。
    #[inline]
    pub(crate) unsafe fn push(&self, v: T) {
        let len = self.len.load(Ordering::Relaxed);
        debug_assert!(len < self.cap, "BUG: push into a full buffer");
        // SAFETY: len < cap, slot is within the allocation and unobserved
        // by readers until the length store below
        unsafe { self.ptr.as_ptr().add(len).write(v) };
        self.len.store(len + 1, Ordering::Release);
    }

    /// Read the element at `i`, or `None` when `i` is out of bounds.
    /// 读取索引 `i` 处的元素，越界时返回 `None`。
    #[inline]
    pub(crate) fn get(&self, i: usize) -> Option<T> {
        if i < self.len.load(Ordering::Acquire) {
            // SAFETY: i < len, and every slot below len is initialized and
            // published by the writer's Release store
            Some(unsafe { self.ptr.as_ptr().add(i).read() })
        } else {
            None
        }
    }

    /// Overwrite an already initialized slot.
    ///
    /// # Safety
    /// Only the single writer may call this, and `i < len()` must hold.
    ///
    /// 覆盖一个已初始化的槽位。
    /// # Safety
    /// 只有单个写入者可以调用此方法，且必须满足 `i < len()`。
    #[inline]
    pub(crate) unsafe fn write(&self, i: usize, v: T) {
        debug_assert!(i < self.len.load(Ordering::Relaxed), "BUG: write past len");
        unsafe { self.ptr.as_ptr().add(i).write(v) };
    }

    /// Set the length directly, without touching any slot.
    ///
    /// # Safety
    /// `n <= capacity()` must hold, and every slot below `n` must already be
    /// initialized (or acceptable to read as-is by the caller's contract).
    ///
    /// 直接设置长度，不触碰任何槽位。
    /// # Safety
    /// 必须满足 `n <= capacity()`，且 `n` 以下的每个槽位都必须已初始化
    /// （或按调用者的约定可以按原样读取）。
    #[inline]
    pub(crate) unsafe fn set_len(&self, n: usize) {
        debug_assert!(n <= self.cap, "BUG: set_len past capacity");
        self.len.store(n, Ordering::Release);
    }

    /// Fill slots from the current length up to `n` with `fill` and publish
    /// the new length. Used by the bulk-fill path of `ensure_size`.
    ///
    /// # Safety
    /// Only the single writer may call this, and `n <= capacity()` must
    /// hold.
    ///
    /// 用 `fill` 填充从当前长度到 `n` 的槽位并发布新长度。
    /// 由 `ensure_size` 的批量填充路径使用。
    /// # Safety
    /// 只有单个写入者可以调用此方法，且必须满足 `n <= capacity()`。
    pub(crate) unsafe fn fill_to(&self, n: usize, fill: T) {
        let len = self.len.load(Ordering::Relaxed);
        debug_assert!(n <= self.cap, "BUG: fill_to past capacity");
        // SAFETY: slots in len..n are within the allocation and unobserved
        // by readers until the length store below
        for i in len..n {
            unsafe { self.ptr.as_ptr().add(i).write(fill) };
        }
        if n > len {
            self.len.store(n, Ordering::Release);
        }
    }

    /// Bulk-copy the initialized prefix of `src` into this buffer and adopt
    /// its length. Order and values are preserved exactly; a bitwise copy is
    /// sufficient because `T: Copy`.
    ///
    /// # Safety
    /// `src.len() <= self.capacity()` must hold and this buffer must not yet
    /// be visible to any reader.
    ///
    /// 将 `src` 的已初始化前缀批量复制到此缓冲区并采用其长度。
    /// 顺序和值完全保留；因为 `T: Copy`，按位复制就足够了。
    /// # Safety
    /// 必须满足 `src.len() <= self.capacity()`，
    /// 且此缓冲区尚未对任何读取者可见。
    pub(crate) unsafe fn copy_from(&self, src: &Buffer<T>) {
        let n = src.len();
        debug_assert!(n <= self.cap, "BUG: copy_from source exceeds capacity");
        // SAFETY: both ranges are within their allocations, the destination
        // is private to the writer, and the allocations are disjoint
        unsafe {
            std::ptr::copy_nonoverlapping(src.ptr.as_ptr(), self.ptr.as_ptr(), n);
        }
        self.len.store(n, Ordering::Release);
    }

    /// View the initialized prefix as a slice. Writer-side only: the length
    /// is sampled once, so a concurrent reader should use `get` instead.
    ///
    /// 将已初始化前缀视为切片。仅限写入者侧：长度只采样一次，
    /// 并发读取者应使用 `get`。
    #[inline]
    pub(crate) fn as_slice(&self) -> &[T] {
        let len = self.len.load(Ordering::Acquire);
        // SAFETY: slots below len are initialized
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), len) }
    }

    /// Mutable view of the initialized prefix. Requires exclusive access, so
    /// it is only reachable from the non-concurrent array variant.
    ///
    /// 已初始化前缀的可变视图。需要独占访问，
    /// 因此只能从非并发数组变体访问。
    #[inline]
    pub(crate) fn as_mut_slice(&mut self) -> &mut [T] {
        let len = self.len.load(Ordering::Relaxed);
        // SAFETY: slots below len are initialized, access is exclusive
        unsafe { std::slice::from_raw_parts_mut(self.ptr.as_ptr(), len) }
    }

    /// Bytes committed by the allocation backing this buffer.
    /// 此缓冲区的分配所占用的字节数。
    #[inline]
    pub(crate) fn allocated_bytes(&self) -> usize {
        self.cap * size_of::<T>()
    }
}

impl<T> Drop for Buffer<T> {
    /// Release the allocation as one unit. No per-element teardown: `T` is
    /// constrained to `Copy` everywhere a buffer is created.
    ///
    /// 作为一个整体释放分配。无逐元素清理：
    /// 创建缓冲区的所有地方都将 `T` 约束为 `Copy`。
    fn drop(&mut self) {
        if self.cap != 0 && size_of::<T>() != 0 {
            // Layout::array succeeded at allocation time, so it succeeds here
            let layout = Layout::array::<T>(self.cap).unwrap();
            unsafe { dealloc(self.ptr.as_ptr() as *mut u8, layout) };
        }
    }
}

#[cold]
fn capacity_overflow() -> ! {
    panic!("capacity overflow");
}
