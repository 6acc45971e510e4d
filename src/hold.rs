use crate::buffer::Buffer;
use std::collections::VecDeque;

/// Logical generation counter value.
///
/// The counter itself is owned by the caller (typically advanced once per
/// write-epoch boundary by an external epoch tracker); this crate only tags
/// retired buffers with it and compares tags against a reclamation floor.
///
/// 逻辑代数计数器的值。
/// 计数器本身由调用者拥有（通常由外部纪元追踪器在每个写纪元边界推进一次）；
/// 本 crate 仅用它标记退休的缓冲区，并将标签与回收下限进行比较。
pub type Generation = u64;

/// A buffer that has been detached from a vector but not yet deallocated.
///
/// It stores the raw pointer, a destructor for the concrete buffer type and
/// the generation tag assigned at the moment of detachment. From hand-off
/// until reclamation it is owned exclusively by the `GenerationHolder`.
///
/// 已从向量分离但尚未释放的缓冲区。
/// 它存储原始指针、具体缓冲区类型的析构函数
/// 以及在分离时刻分配的代数标签。
/// 从移交到回收，它由 `GenerationHolder` 独占拥有。
pub struct RetiredBuffer {
    /// Type-erased pointer to the detached `Buffer<T>`.
    /// 指向已分离 `Buffer<T>` 的类型擦除指针。
    ptr: *mut (),
    /// Function pointer to the type-specific destructor.
    /// 类型特定析构函数的函数指针。
    dtor: unsafe fn(*mut ()),
    /// Bytes committed by the detached allocation.
    /// 已分离分配占用的字节数。
    bytes: usize,
    /// Generation current at the moment of detachment.
    /// 分离时刻的当前代数。
    generation: Generation,
}

// A retired buffer is only ever constructed from a `Buffer<T>` with
// `T: Send + Sync`, so moving it with its owning holder is sound.
// 退休缓冲区只会从 `T: Send + Sync` 的 `Buffer<T>` 构造，
// 因此随其所属持有者一起移动是健全的。
unsafe impl Send for RetiredBuffer {}
// Shared references only expose the tag and the byte count.
// 共享引用只暴露标签和字节数。
unsafe impl Sync for RetiredBuffer {}

/// Destructor trampoline: converts the raw pointer back to the concrete
/// boxed buffer and drops it, which releases the allocation as one unit.
///
/// 析构跳板：将原始指针转换回具体的装箱缓冲区并 drop 它，
/// 从而将分配作为一个整体释放。
#[inline(always)]
unsafe fn drop_buffer<T: Copy>(ptr: *mut ()) {
    let ptr = ptr as *mut Buffer<T>;
    unsafe {
        drop(Box::from_raw(ptr));
    }
}

impl RetiredBuffer {
    /// Take ownership of a detached buffer, tagging it with `generation`.
    /// 获取已分离缓冲区的所有权，并用 `generation` 标记它。
    #[inline]
    pub(crate) fn new<T: Copy + Send + Sync>(buf: Box<Buffer<T>>, generation: Generation) -> Self {
        let bytes = buf.allocated_bytes();
        let ptr = Box::into_raw(buf) as *mut ();
        RetiredBuffer {
            ptr,
            dtor: drop_buffer::<T>,
            bytes,
            generation,
        }
    }

    /// The generation tag assigned at detachment.
    /// 分离时分配的代数标签。
    #[inline]
    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Bytes still pinned by this retirement.
    /// 此退休仍占用的字节数。
    #[inline]
    pub fn bytes(&self) -> usize {
        self.bytes
    }
}

impl Drop for RetiredBuffer {
    /// Executes the type-erased destructor. This is the terminal `FREED`
    /// transition of a buffer's lifecycle.
    ///
    /// 执行类型擦除的析构函数。这是缓冲区生命周期中
    /// 终态 `FREED` 的转换。
    #[inline(always)]
    fn drop(&mut self) {
        if !self.ptr.is_null() {
            unsafe {
                (self.dtor)(self.ptr);
            }
            self.ptr = std::ptr::null_mut();
        }
    }
}

impl std::fmt::Debug for RetiredBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetiredBuffer")
            .field("generation", &self.generation)
            .field("bytes", &self.bytes)
            .finish()
    }
}

/// The retirement sink: retains detached buffers until their generation tag
/// is provably unreachable by any reader.
///
/// The holder is owned by the writer side and mutated only through `&mut`
/// (append on retire, remove on reclaim), so it needs no internal locking.
/// Retired buffers arrive in tag order because the generation counter is
/// monotonically non-decreasing, which keeps reclamation a pop-from-front
/// scan.
///
/// 退休接收器：保留已分离的缓冲区，
/// 直到其代数标签可证明不会被任何读取者访问。
/// 持有者由写入者侧拥有，仅通过 `&mut` 修改
/// （退休时追加，回收时移除），因此不需要内部锁。
/// 由于代数计数器单调非递减，退休缓冲区按标签顺序到达，
/// 这使回收成为从队首弹出的扫描。
#[derive(Debug, Default)]
pub struct GenerationHolder {
    /// Retired buffers, front-to-back in non-decreasing tag order.
    /// 退休的缓冲区，从前到后按标签非递减顺序排列。
    queue: VecDeque<RetiredBuffer>,
    /// Sum of `bytes` over the queue, kept incrementally.
    /// 队列中 `bytes` 的总和，增量维护。
    held_bytes: usize,
}

impl GenerationHolder {
    /// Create an empty holder.
    /// 创建一个空的持有者。
    pub fn new() -> Self {
        Self {
            queue: VecDeque::new(),
            held_bytes: 0,
        }
    }

    /// Accept ownership of a retired buffer. This is the `LIVE -> RETIRED`
    /// transition; it happens exactly once per buffer, at detachment.
    ///
    /// 接受退休缓冲区的所有权。这是 `LIVE -> RETIRED` 的转换；
    /// 每个缓冲区恰好发生一次，在分离时。
    pub(crate) fn hold(&mut self, retired: RetiredBuffer) {
        if let Some(back) = self.queue.back() {
            debug_assert!(
                back.generation() <= retired.generation(),
                "BUG: generation went backwards across retirements"
            );
        }
        self.held_bytes += retired.bytes();
        self.queue.push_back(retired);
    }

    /// Free every retained buffer whose tag is strictly below `first_used`.
    ///
    /// A buffer tagged exactly `first_used` is kept: a reader that started
    /// before the advance to `first_used` may still reference it. Calling
    /// with a floor lower than a previous call frees nothing, since each
    /// buffer is checked against its own tag, not against call history.
    ///
    /// Returns the number of buffers freed.
    ///
    /// # Safety
    /// The caller asserts that no active reader can still observe a
    /// generation below `first_used`. The value must come from the external
    /// epoch tracker's first-used-generation report; passing a too-high
    /// floor frees memory a reader may still dereference.
    ///
    /// 释放标签严格低于 `first_used` 的所有保留缓冲区。
    /// 标签恰好等于 `first_used` 的缓冲区被保留：
    /// 在推进到 `first_used` 之前开始的读取者可能仍在引用它。
    /// 用低于先前调用的下限调用不会释放任何东西，
    /// 因为每个缓冲区都是与其自身标签比较，而不是与调用历史比较。
    /// 返回释放的缓冲区数量。
    /// # Safety
    /// 调用者断言没有活跃的读取者仍能观察到低于 `first_used` 的代数。
    /// 该值必须来自外部纪元追踪器报告的最早使用代数；
    /// 传入过高的下限会释放读取者可能仍在解引用的内存。
    pub unsafe fn reclaim(&mut self, first_used: Generation) -> usize {
        let mut freed = 0;
        while let Some(front) = self.queue.front() {
            if front.generation() >= first_used {
                break;
            }
            let retired = self.queue.pop_front().unwrap();
            self.held_bytes -= retired.bytes();
            freed += 1;
            drop(retired);
        }
        freed
    }

    /// Free everything regardless of tag. Teardown path.
    ///
    /// # Safety
    /// Same contract as `reclaim`, with the floor at infinity: no reader may
    /// reference any retained buffer.
    ///
    /// 无视标签释放所有内容。清理路径。
    /// # Safety
    /// 与 `reclaim` 相同的约定，下限为无穷大：
    /// 任何读取者都不得引用任何保留的缓冲区。
    pub unsafe fn reclaim_all(&mut self) -> usize {
        let freed = self.queue.len();
        self.queue.clear();
        self.held_bytes = 0;
        freed
    }

    /// Bytes still pinned by retained buffers.
    /// 保留缓冲区仍占用的字节数。
    #[inline]
    pub fn held_bytes(&self) -> usize {
        self.held_bytes
    }

    /// Number of retained buffers.
    /// 保留缓冲区的数量。
    #[inline]
    pub fn pending(&self) -> usize {
        self.queue.len()
    }
}
