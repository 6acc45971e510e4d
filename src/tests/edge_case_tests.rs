//! 边界情况测试模块
//! 测试空回收、零大小类型、不安全操作和断言边界

use crate::{GrowArray, GrowStrategy, RcuVector};

/// 测试1: 没有退休缓冲区时回收是空操作
#[test]
fn test_reclaim_with_nothing_pending() {
    let mut vec: RcuVector<i32> = RcuVector::new();

    assert_eq!(unsafe { vec.remove_old_generations(100) }, 0);
    assert_eq!(vec.holder().pending(), 0);
}

/// 测试2: 下限为 0 永远不释放任何东西（不存在负代数）
#[test]
fn test_reclaim_floor_zero() {
    let mut vec: RcuVector<i32> = RcuVector::new();
    vec.reserve(4); // 退休标签 0

    assert_eq!(unsafe { vec.remove_old_generations(0) }, 0);
    assert_eq!(vec.holder().pending(), 1);
}

/// 测试3: 空向量上的 clear 和 shrink(0)
#[test]
fn test_clear_and_shrink_empty() {
    let mut vec: RcuVector<i32> = RcuVector::new();

    vec.clear();
    vec.shrink(0);
    assert_eq!(vec.len(), 0);
}

/// 测试4: shrink 到更大的 size 触发断言
#[test]
#[should_panic(expected = "shrink to a larger size")]
fn test_shrink_larger_panics() {
    let mut vec = RcuVector::with_strategy(GrowStrategy::new(4, 100, 0));
    vec.push_back(1i32);

    vec.shrink(2);
}

/// 测试5: set 越界触发 panic
#[test]
#[should_panic(expected = "out of bounds")]
fn test_set_out_of_bounds_panics() {
    let mut vec = RcuVector::with_strategy(GrowStrategy::new(4, 100, 0));
    vec.push_back(1i32);

    unsafe { vec.set(1, 2) };
}

/// 测试6: unsafe_resize 恢复之前 shrink 掉的前缀
#[test]
fn test_unsafe_resize_restores_prefix() {
    let mut vec = RcuVector::with_strategy(GrowStrategy::new(4, 100, 0));
    for i in 0..3i32 {
        vec.push_back(i * 10);
    }

    vec.shrink(1);
    assert_eq!(vec.get(2), None);

    // 槽位 1..3 之前已初始化，按原样恢复是调用者可以保证的
    unsafe { vec.unsafe_resize(3) };

    assert_eq!(vec.len(), 3);
    assert_eq!(vec.get(1), Some(10));
    assert_eq!(vec.get(2), Some(20));
}

/// 测试7: unsafe_reserve 一步跳到精确容量，绕过退休路径
#[test]
fn test_unsafe_reserve_exact_jump() {
    let mut vec = RcuVector::with_strategy(GrowStrategy::new(4, 100, 0));
    for i in 0..4u16 {
        vec.push_back(i);
    }

    // 无并发读取者，绕过退休是合法的
    unsafe { vec.unsafe_reserve(1000) };

    assert_eq!(vec.capacity(), 1000);
    assert_eq!(vec.len(), 4);
    // 旧缓冲区被立即释放，而不是退休
    assert_eq!(vec.holder().pending(), 0);
    for i in 0..4u16 {
        assert_eq!(vec.get(i as usize), Some(i));
    }

    // 容量已足够时是空操作
    unsafe { vec.unsafe_reserve(10) };
    assert_eq!(vec.capacity(), 1000);
}

/// 测试8: 零大小类型不分配也能工作
#[test]
fn test_zero_sized_type() {
    let mut vec: RcuVector<()> = RcuVector::with_strategy(GrowStrategy::new(0, 100, 1));

    for _ in 0..100 {
        vec.push_back(());
    }

    assert_eq!(vec.len(), 100);
    assert_eq!(vec.get(99), Some(()));
    assert_eq!(vec.get(100), None);
    assert_eq!(vec.memory_usage().allocated_bytes, 0);
    assert_eq!(vec.holder().held_bytes(), 0);

    unsafe { vec.remove_old_generations(u64::MAX) };
    assert_eq!(vec.holder().pending(), 0);
}

/// 测试9: 写入者 drop 时释放存活缓冲区和所有持有的缓冲区
#[test]
fn test_drop_with_pending_holds() {
    let mut vec: RcuVector<u64> = RcuVector::new();
    vec.set_generation(1);
    vec.reserve(64);
    vec.set_generation(2);
    vec.reserve(256);
    for i in 0..10 {
        vec.push_back(i);
    }

    // drop 时没有泄漏（在 miri / asan 下验证）
    drop(vec);
}

/// 测试10: 读取句柄可以活得比写入者更久
#[test]
fn test_reader_outlives_writer() {
    let mut vec = RcuVector::with_strategy(GrowStrategy::new(4, 100, 0));
    vec.push_back(11i32);
    vec.push_back(22);
    let reader = vec.reader();

    drop(vec);

    // 存活缓冲区由共享核心持有，读取者仍能访问
    assert_eq!(reader.len(), 2);
    assert_eq!(reader.get(0), Some(11));
    assert_eq!(reader.get(1), Some(22));
}

/// 测试11: GrowArray 的 unsafe 操作
#[test]
fn test_grow_array_unsafe_operations() {
    let mut arr: GrowArray<i32> = GrowArray::new();

    unsafe { arr.unsafe_reserve(10) };
    assert_eq!(arr.capacity(), 10);
    assert_eq!(arr.len(), 0);

    arr.push_back(1);
    arr.push_back(2);
    arr.shrink(0);
    unsafe { arr.unsafe_resize(2) };
    assert_eq!(arr.as_slice(), &[1, 2]);
}

/// 测试12: 大元素类型的增长与回收
#[test]
fn test_large_element_type() {
    #[derive(Clone, Copy, PartialEq, Debug)]
    struct Wide {
        a: u64,
        b: u64,
        c: u64,
        d: u64,
    }

    let mut vec = RcuVector::with_strategy(GrowStrategy::new(2, 100, 0));
    for i in 0..20u64 {
        vec.push_back(Wide {
            a: i,
            b: i * 2,
            c: i * 3,
            d: i * 4,
        });
        vec.set_generation(i);
    }

    assert_eq!(vec.len(), 20);
    let w = vec.get(7).unwrap();
    assert_eq!(w, Wide { a: 7, b: 14, c: 21, d: 28 });

    unsafe { vec.remove_old_generations(u64::MAX) };
    assert_eq!(vec.holder().pending(), 0);
    assert_eq!(vec.get(7), Some(w));
}
