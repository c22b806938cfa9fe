//! Heap integration tests: handles stay valid across collections.

use pretty_assertions::assert_eq;
use rpl_runtime::{Algebraic, Gc, Heap, HeapConfig, Runtime, RuntimeError, Settings, TypeId};

fn snapshot(heap: &Heap, handles: &[Gc]) -> Vec<Vec<u8>> {
    handles.iter().map(|h| heap.view(h).unwrap().bytes().to_vec()).collect()
}

#[test]
fn test_handles_survive_forced_collections() {
    let mut rt = Runtime::with_config(HeapConfig::fixed(512), Settings::default());
    let mut kept = Vec::new();
    for i in 0..40i64 {
        let gc = rt.make_integer(i * 1000).unwrap();
        let name = rt.make_symbol(&format!("S{i}")).unwrap();
        // Keep every third object, drop the rest
        if i % 3 == 0 {
            kept.push(gc);
            kept.push(name);
        }
    }
    let before = snapshot(rt.heap(), &kept);
    let offsets: Vec<usize> = kept.iter().map(Gc::offset).collect();

    rt.collect().unwrap();
    assert_eq!(snapshot(rt.heap(), &kept), before);
    assert_ne!(kept.iter().map(Gc::offset).collect::<Vec<_>>(), offsets);

    // A second collection has nothing left to move
    let moved = rt.heap().stats().objects_moved;
    rt.collect().unwrap();
    assert_eq!(rt.heap().stats().objects_moved, moved);
    assert_eq!(snapshot(rt.heap(), &kept), before);
    rt.heap().verify().unwrap();
}

#[test]
fn test_allocation_pressure_keeps_stack_values() {
    let mut rt = Runtime::with_config(HeapConfig::fixed(256), Settings::default());
    for i in 0..10 {
        let gc = rt.make_integer(i).unwrap();
        rt.push(gc);
    }
    // Plenty of garbage through a fixed arena
    for i in 0..2000 {
        rt.make_text(&format!("garbage {i}")).unwrap();
    }
    assert!(rt.heap().stats().collections > 0);
    for level in 0..10 {
        let value = rt.algebraic(&rt.stack(level).unwrap()).unwrap();
        assert_eq!(value, Algebraic::from_i64(9 - level as i64));
    }
}

#[test]
fn test_interior_handles_move_with_their_list() {
    let mut rt = Runtime::with_config(HeapConfig::default(), Settings::default());
    let garbage = rt.make_text("padding padding").unwrap();
    let items: Vec<Gc> = (1..=3).map(|v| rt.make_integer(v).unwrap()).collect();
    let list = rt.make_list(&items).unwrap();
    drop(items);
    let third = rt.heap_mut().at(&list, 2).unwrap().unwrap();
    let children = rt.heap_mut().children(&list).unwrap();
    drop(list);
    drop(garbage);

    rt.collect().unwrap();
    assert_eq!(rt.algebraic(&third).unwrap(), Algebraic::from_i64(3));
    assert_eq!(children.len(), 3);
    assert_eq!(rt.algebraic(&children[0]).unwrap(), Algebraic::from_i64(1));
    // The list itself is kept whole, so its first element follows its header
    assert_eq!(children[0].offset(), 2);
}

#[test]
fn test_out_of_memory_is_fatal_and_clean() {
    let mut rt = Runtime::with_config(HeapConfig::fixed(64), Settings::default());
    let mut kept = Vec::new();
    let err = loop {
        match rt.make_text("0123456789") {
            Ok(gc) => kept.push(gc),
            Err(err) => break err,
        }
    };
    assert!(matches!(err, RuntimeError::OutOfMemory { .. }));
    assert!(err.is_fatal());
    assert_eq!(kept.len(), 5);
    rt.heap().verify().unwrap();
    assert_eq!(rt.render(&kept[4]).unwrap(), "\"0123456789\"");

    // Releasing a value makes room again
    kept.truncate(4);
    assert!(rt.make_text("0123456789").is_ok());
}

#[test]
fn test_growth_up_to_the_limit() {
    let config = HeapConfig { initial_size: 32, max_size: 128, grow: true };
    let mut rt = Runtime::with_config(config, Settings::default());
    let kept: Vec<Gc> = (0..40).map(|i| rt.make_integer(i).unwrap()).collect();
    assert_eq!(rt.heap().bound(), 128);
    assert_eq!(rt.heap().used(), 80);
    assert!(rt.make_command(TypeId::Add).is_ok());
    drop(kept);
}
