//! 并发测试模块
//! 测试单写多读场景：无锁读取、增长期间的可见性和安全回收时序

use crate::{GrowStrategy, RcuVector};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

/// 测试1: 单个写入者，多个读取者并发读取
/// 值即索引，因此读取者看到的任何前缀都必须一致
#[test]
fn test_single_writer_multiple_readers() {
    let mut vec: RcuVector<u64> = RcuVector::with_strategy(GrowStrategy::new(0, 50, 8));
    let stop = Arc::new(AtomicBool::new(false));

    let mut handles = vec![];
    for _ in 0..4 {
        let reader = vec.reader();
        let stop = stop.clone();

        handles.push(thread::spawn(move || {
            let mut max_seen = 0usize;
            while !stop.load(Ordering::Relaxed) {
                let len = reader.len();
                // 已发布前缀中的每个值都等于其索引；
                // 小前缀逐一验证，大前缀按步长抽样
                for i in (0..len).step_by((len / 128).max(1)) {
                    assert_eq!(reader.get(i), Some(i as u64));
                }
                max_seen = max_seen.max(len);
            }
            max_seen
        }));
    }

    for i in 0..20_000u64 {
        vec.push_back(i);
    }
    stop.store(true, Ordering::Relaxed);

    for handle in handles {
        let max_seen = handle.join().unwrap();
        assert!(max_seen <= 20_000);
    }

    // 所有读取者都已退出，回收全部退休缓冲区是安全的
    let freed = unsafe { vec.remove_old_generations(u64::MAX) };
    assert!(freed > 0, "20k pushes from capacity 0 must have grown");
}

/// 测试2: 读取者在增长期间持续看到有效值
/// 退休的缓冲区在回收前保持已分配，因此进行中的读取始终有效
#[test]
fn test_reads_remain_valid_across_growth() {
    let mut vec: RcuVector<u64> = RcuVector::with_strategy(GrowStrategy::new(1, 0, 1));
    vec.push_back(0);

    let reader = vec.reader();
    let stop = Arc::new(AtomicBool::new(false));
    let stop2 = stop.clone();

    let handle = thread::spawn(move || {
        let mut reads = 0u64;
        while !stop2.load(Ordering::Relaxed) {
            let len = reader.len();
            if len > 0 {
                let i = (reads as usize) % len;
                assert_eq!(reader.get(i), Some(i as u64));
                reads += 1;
            }
        }
        reads
    });

    // delta=1 的策略让每次 push 都触发一次增长和退休，
    // 读取者全程与缓冲区替换竞争
    for i in 1..2_000u64 {
        vec.push_back(i);
        vec.set_generation(i);
    }

    stop.store(true, Ordering::Relaxed);
    let reads = handle.join().unwrap();
    assert!(reads > 0);

    // 读取者退出后按下限分阶段回收。
    // push i 在 set_generation(i) 之前发生，因此标签为 0..=1998
    assert_eq!(vec.holder().pending(), 1_999);
    unsafe { vec.remove_old_generations(1_000) };
    assert_eq!(vec.holder().pending(), 999);
    unsafe { vec.remove_old_generations(u64::MAX) };
    assert_eq!(vec.holder().pending(), 0);
}

/// 测试3: 写入者句柄可以移动到另一个线程（Send）
#[test]
fn test_writer_moves_across_threads() {
    let mut vec: RcuVector<u32> = RcuVector::with_strategy(GrowStrategy::new(4, 100, 0));
    let reader = vec.reader();

    let handle = thread::spawn(move || {
        for i in 0..100u32 {
            vec.push_back(i);
        }
        vec
    });

    let mut vec = handle.join().unwrap();
    assert_eq!(vec.len(), 100);
    assert_eq!(reader.get(42), Some(42));

    unsafe { vec.remove_old_generations(u64::MAX) };
}

/// 测试4: 多个读取者观察 clear 和 shrink 只会看到更短的前缀
#[test]
fn test_readers_observe_shrinking_prefix() {
    let mut vec: RcuVector<u64> = RcuVector::with_strategy(GrowStrategy::new(64, 100, 0));
    for i in 0..64u64 {
        vec.push_back(i);
    }

    let reader = vec.reader();
    let stop = Arc::new(AtomicBool::new(false));
    let stop2 = stop.clone();

    let handle = thread::spawn(move || {
        while !stop2.load(Ordering::Relaxed) {
            let len = reader.len();
            assert!(len <= 64);
            if len > 0 {
                // 长度可能在两次加载之间继续收缩，
                // 但前缀内读到的值恒为其索引
                if let Some(v) = reader.get(len - 1) {
                    assert_eq!(v, (len - 1) as u64);
                }
            }
        }
    });

    for _ in 0..200 {
        vec.shrink(32);
        // 槽位 32..64 仍然是旧值，恢复前缀是合法的
        unsafe { vec.unsafe_resize(64) };
        vec.clear();
        unsafe { vec.unsafe_resize(64) };
    }

    stop.store(true, Ordering::Relaxed);
    handle.join().unwrap();
}

/// 测试5: 端到端时序——发布先于退休，回收后于读取者退出
#[test]
fn test_publish_retire_reclaim_sequencing() {
    let mut vec: RcuVector<u64> = RcuVector::with_strategy(GrowStrategy::new(2, 100, 0));
    vec.push_back(0);
    vec.push_back(1);

    let reader = vec.reader();
    let barrier = Arc::new(std::sync::Barrier::new(2));
    let barrier2 = barrier.clone();

    let handle = thread::spawn(move || {
        // 在增长之前开始读取
        assert_eq!(reader.get(0), Some(0));
        barrier2.wait();
        // 写入者已增长；旧缓冲区已退休但内容对我们仍然有效
        barrier2.wait();
        for i in 0..reader.len() {
            assert_eq!(reader.get(i), Some(i as u64));
        }
    });

    barrier.wait();
    vec.set_generation(1);
    vec.push_back(2); // 触发增长：发布新缓冲区，退休旧缓冲区
    assert_eq!(vec.holder().pending(), 1);
    barrier.wait();

    handle.join().unwrap();
    // 读取者已退出，外部追踪器报告的下限可以超过标签
    assert_eq!(unsafe { vec.remove_old_generations(2) }, 1);
}
