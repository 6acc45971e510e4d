//! Single-writer multi-reader growable vector with generation-tagged
//! deferred reclamation.
//!
//! One writer thread appends to, grows and clears a dense array while any
//! number of reader threads index into it without taking a lock and without
//! ever observing freed memory. When the vector must grow, the old backing
//! buffer cannot be freed immediately: a reader may already hold a raw
//! reference into it. Instead the buffer is detached, tagged with the
//! generation current at that instant and parked in a [`GenerationHolder`].
//! It is freed only when the owner proves, via an external epoch tracker,
//! that no active reader can still be inside that generation.
//!
//! This is the read-copy-update pattern with the reclamation policy kept
//! externally drivable: the crate consumes a generation counter and a
//! first-used-generation floor, it never computes them.
//!
//! # Example
//! ```
//! use rcu_vector::{GrowStrategy, RcuVector};
//!
//! let mut vec = RcuVector::with_strategy(GrowStrategy::new(0, 100, 1));
//! let reader = vec.reader();
//!
//! vec.set_generation(1);
//! vec.push_back(7i64); // grows: old (empty) buffer retired at generation 1
//!
//! assert_eq!(reader.get(0), Some(7));
//!
//! // Driven by the external epoch tracker: no reader is below generation 2
//! unsafe { vec.remove_old_generations(2) };
//! ```
//!
//! 单写多读、带代数标记延迟回收的可增长向量。
//! 一个写入者线程追加、增长和清空密集数组，
//! 同时任意数量的读取者线程无锁地索引它，
//! 且永远不会观察到已释放的内存。
//! 向量需要增长时，旧的后备缓冲区不能立即释放：
//! 读取者可能已持有指向它的原始引用。
//! 缓冲区被分离、标记为该时刻的当前代数，
//! 并暂存在 [`GenerationHolder`] 中。
//! 只有当所有者通过外部纪元追踪器证明
//! 没有活跃读取者还能处于该代数时，它才会被释放。

mod array;
mod buffer;
mod grow;
mod hold;
mod memory;
mod sync;
mod vector;

pub use array::GrowArray;
pub use grow::GrowStrategy;
pub use hold::{Generation, GenerationHolder, RetiredBuffer};
pub use memory::MemoryUsage;
pub use vector::{RcuReader, RcuVector};

#[cfg(all(test, not(feature = "loom")))]
mod tests;
