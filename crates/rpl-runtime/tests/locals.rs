//! Local variable scoping and execution of locals blocks.

use pretty_assertions::assert_eq;
use rpl_runtime::{Algebraic, Gc, HeapConfig, Runtime, RuntimeError, Settings, TypeId};

fn runtime() -> Runtime {
    Runtime::with_config(HeapConfig::default(), Settings::default())
}

fn push_ints(rt: &mut Runtime, values: &[i64]) {
    for v in values {
        let gc = rt.make_integer(*v).unwrap();
        rt.push(gc);
    }
}

fn symbols(rt: &mut Runtime, names: &[&str]) -> Vec<Gc> {
    names.iter().map(|n| rt.make_symbol(n).unwrap()).collect()
}

fn top(rt: &Runtime) -> Algebraic {
    rt.algebraic(&rt.top().unwrap()).unwrap()
}

/// `→ X Y « X Y - X Y + * »`
fn difference_times_sum(rt: &mut Runtime) -> Gc {
    let x = rt.make_local(0).unwrap();
    let y = rt.make_local(1).unwrap();
    let sub = rt.make_command(TypeId::Sub).unwrap();
    let add = rt.make_command(TypeId::Add).unwrap();
    let mul = rt.make_command(TypeId::Mul).unwrap();
    let body = rt
        .make_program(&[x.clone(), y.clone(), sub, x, y, add, mul])
        .unwrap();
    rt.make_locals(&["X", "Y"], &[body]).unwrap()
}

#[test]
fn test_nested_frames_resolve_innermost_first() {
    let mut rt = runtime();
    let body = rt.make_program(&[]).unwrap();
    push_ints(&mut rt, &[10, 20]);
    let xy = symbols(&mut rt, &["X", "Y"]);
    let mut outer = rt.enter_frame(&xy, &body).unwrap();
    assert_eq!(outer.depth(), 0);

    push_ints(&mut outer, &[1, 2]);
    let ab = symbols(&mut outer, &["A", "B"]);
    {
        let mut inner = outer.enter_frame(&ab, &body).unwrap();
        let values: Vec<Algebraic> = (0..4)
            .map(|i| inner.algebraic(&inner.local(i).unwrap()).unwrap())
            .collect();
        let expect: Vec<Algebraic> = [1, 2, 10, 20].into_iter().map(Algebraic::from_i64).collect();
        assert_eq!(values, expect);
        assert_eq!(inner.local(4).unwrap_err(), RuntimeError::LocalOutOfScope { index: 4 });

        // Names come from the frames when rendering outside a block
        let local = inner.make_local(2).unwrap();
        assert_eq!(inner.render(&local).unwrap(), "X");
    }
    assert_eq!(outer.frames().depth(), 1);
    assert_eq!(outer.algebraic(&outer.local(0).unwrap()).unwrap(), Algebraic::from_i64(10));
    drop(outer);
    assert_eq!(rt.frames().depth(), 0);
    assert!(rt.local(0).is_err());
}

#[test]
fn test_local_ref_is_invalid_after_exit() {
    let mut rt = runtime();
    let body = rt.make_program(&[]).unwrap();
    push_ints(&mut rt, &[7]);
    let names = symbols(&mut rt, &["N"]);
    let local = {
        let frame = rt.enter_frame(&names, &body).unwrap();
        assert!(frame.local_ref(1).is_err());
        let local = frame.local_ref(0).unwrap();
        assert_eq!(frame.algebraic(&frame.local_at(local).unwrap()).unwrap(), Algebraic::from_i64(7));
        local
    };
    assert_eq!(rt.local_at(local).unwrap_err(), RuntimeError::LocalOutOfScope { index: 0 });

    // Same depth, different frame
    push_ints(&mut rt, &[8]);
    let frame = rt.enter_frame(&names, &body).unwrap();
    assert!(frame.local_at(local).is_err());
}

#[test]
fn test_store_rebinds_with_a_fresh_object() {
    let mut rt = runtime();
    let body = rt.make_program(&[]).unwrap();
    push_ints(&mut rt, &[1, 2]);
    let names = symbols(&mut rt, &["A", "B"]);
    let mut frame = rt.enter_frame(&names, &body).unwrap();
    let value = frame.make_integer(99).unwrap();
    frame.set_local(1, &value).unwrap();
    let bound = frame.local(1).unwrap();
    assert_ne!(bound, value);
    assert_eq!(frame.algebraic(&bound).unwrap(), Algebraic::from_i64(99));
    assert_eq!(frame.set_local(2, &value).unwrap_err(), RuntimeError::LocalOutOfScope { index: 2 });
}

#[test]
fn test_execute_locals_block() {
    let mut rt = runtime();
    let block = difference_times_sum(&mut rt);
    assert_eq!(rt.render(&block).unwrap(), "→ X Y « X Y - X Y + * »");

    push_ints(&mut rt, &[5, 3]);
    rt.execute(&block).unwrap();
    assert_eq!(rt.depth(), 1);
    assert_eq!(top(&rt), Algebraic::from_i64(16));
    assert_eq!(rt.frames().depth(), 0);
}

#[test]
fn test_execute_nested_blocks() {
    // → X Y « 10 20 → A B « A B + X Y - * » »
    let mut rt = runtime();
    let locals: Vec<Gc> = (0..4).map(|i| rt.make_local(i).unwrap()).collect();
    let add = rt.make_command(TypeId::Add).unwrap();
    let sub = rt.make_command(TypeId::Sub).unwrap();
    let mul = rt.make_command(TypeId::Mul).unwrap();
    let inner_body = rt
        .make_program(&[locals[0].clone(), locals[1].clone(), add, locals[2].clone(), locals[3].clone(), sub, mul])
        .unwrap();
    let inner = rt.make_locals(&["A", "B"], &[inner_body]).unwrap();
    let ten = rt.make_integer(10).unwrap();
    let twenty = rt.make_integer(20).unwrap();
    let outer_body = rt.make_program(&[ten, twenty, inner]).unwrap();
    let outer = rt.make_locals(&["X", "Y"], &[outer_body]).unwrap();
    assert_eq!(rt.render(&outer).unwrap(), "→ X Y « 10 20 → A B « A B + X Y - * » »");

    push_ints(&mut rt, &[5, 3]);
    rt.execute(&outer).unwrap();
    assert_eq!(top(&rt), Algebraic::from_i64(60));
}

#[test]
fn test_failed_block_exits_its_frame() {
    let mut rt = runtime();
    let block = difference_times_sum(&mut rt);
    push_ints(&mut rt, &[5]);
    assert_eq!(rt.execute(&block).unwrap_err(), RuntimeError::StackUnderflow);
    assert_eq!(rt.frames().depth(), 0);

    let text = rt.make_text("x").unwrap();
    rt.push(text);
    assert_eq!(rt.execute(&block).unwrap_err(), RuntimeError::TypeError);
    assert_eq!(rt.frames().depth(), 0);
}

#[test]
fn test_locals_cannot_escape_into_globals() {
    let mut rt = runtime();
    let block = difference_times_sum(&mut rt);
    assert_eq!(rt.store_global("F", &block).unwrap_err(), RuntimeError::LocalEscapesScope);

    // The value of a local is an ordinary object
    let body = rt.make_program(&[]).unwrap();
    push_ints(&mut rt, &[4]);
    let names = symbols(&mut rt, &["N"]);
    let mut frame = rt.enter_frame(&names, &body).unwrap();
    let value = frame.local(0).unwrap();
    frame.store_global("G", &value).unwrap();
    drop(frame);
    let g = rt.recall_global("G").unwrap();
    assert_eq!(rt.algebraic(&g).unwrap(), Algebraic::from_i64(4));
}
