//! Parsing, display and arithmetic through the public API.

use pretty_assertions::assert_eq;
use std::cmp::Ordering;

use rpl_runtime::arithmetic;
use rpl_runtime::{
    parse_number, sweep, Algebraic, DisplayMode, HeapConfig, NumericKind, ParseErrorKind, ParseOutcome,
    Runtime, RuntimeError, Settings, SweepRange, TypeId,
};

fn parse(src: &str, settings: &Settings) -> Algebraic {
    match parse_number(src, settings, 0) {
        ParseOutcome::Ok { value, .. } => value,
        other => panic!("{src}: {other:?}"),
    }
}

#[test]
fn test_render_then_parse_gives_the_value_back() {
    let settings = Settings::default();
    for src in ["1.5", "123", "0.001", "-42.125", "1.23456789E20", "6.02E-23", "#1Ah"] {
        let value = parse(src, &settings);
        let text = value.render(&settings, false);
        let back = parse(&text, &settings);
        assert_eq!(arithmetic::compare(&back, &value).unwrap(), Ordering::Equal, "{src} -> {text}");
    }
}

#[test]
fn test_round_trip_at_display_precision() {
    for mode in [DisplayMode::Sci, DisplayMode::Fix, DisplayMode::Eng, DisplayMode::Normal] {
        let settings = Settings::default().with_mode(mode, 3);
        for src in ["123.45", "0.0123456", "98765.4321", "-7.5"] {
            // Once shown, a value stays the same through further cycles
            let value = parse(src, &settings);
            let shown = parse(&value.render(&settings, false), &settings);
            let again = parse(&shown.render(&settings, false), &settings);
            assert_eq!(arithmetic::compare(&again, &shown).unwrap(), Ordering::Equal, "{mode:?} {src}");
        }
    }
}

#[test]
fn test_display_edge_cases() {
    let normal = Settings::default();
    assert_eq!(parse("123", &normal).render(&normal, false), "123");
    assert_eq!(parse("0.5", &normal).render(&normal, false), "0.5");
    let sci = Settings::default().with_mode(DisplayMode::Sci, 2);
    assert_eq!(parse("123.45", &sci).render(&sci, false), "1.23E2");

    let four = Settings::default().with_mode(DisplayMode::Normal, 4);
    assert_eq!(parse("9.9999", &four).render(&four, false), "10.");
    assert_eq!(parse("1.0049", &four).render(&four, false), "1.005");
    let three = Settings::default().with_mode(DisplayMode::Normal, 3);
    assert_eq!(parse("98765.4321", &three).render(&three, false), "98800.");
    assert_eq!(parse("1.0049", &three).render(&three, false), "1.00");
}

#[test]
fn test_parse_diagnostics() {
    let s = Settings::default();
    assert!(matches!(
        parse_number("1e", &s, 0),
        ParseOutcome::Error(d) if d.kind == ParseErrorKind::ExponentMissing
    ));
    let forty = "1234567890123456789012345678901234567890";
    let decimal = format!("{forty}.5");
    assert!(matches!(
        rpl_runtime::Decimal32::parse(&decimal, &s, 0),
        ParseOutcome::Warn(d) if d.kind == ParseErrorKind::MantissaTooLong
    ));
    // A plain digit string that long is a bignum instead
    assert_eq!(parse(forty, &s).kind(), NumericKind::Bignum);
}

#[test]
fn test_results_take_the_wider_kind() {
    let s = Settings::default().with_precision(7);
    let int = Algebraic::from_i64(3);
    let big = parse("123456789012345678901234567890", &s);
    let d32 = parse("1.5", &s);
    let d64 = parse("1.5", &s).promote_to(NumericKind::Decimal64).unwrap();
    assert_eq!(arithmetic::add(&int, &big, &s).unwrap().kind(), NumericKind::Bignum);
    assert_eq!(arithmetic::mul(&int, &d32, &s).unwrap().kind(), NumericKind::Decimal32);
    assert_eq!(arithmetic::sub(&d32, &d64, &s).unwrap().kind(), NumericKind::Decimal64);
    assert_eq!(arithmetic::div(&int, &Algebraic::from_i64(0), &s).unwrap_err(), RuntimeError::DivideByZero);
}

fn square(rt: &mut Runtime) -> rpl_runtime::Gc {
    let x = rt.make_local(0).unwrap();
    let mul = rt.make_command(TypeId::Mul).unwrap();
    let body = rt.make_program(&[x.clone(), x, mul]).unwrap();
    rt.make_locals(&["X"], &[body]).unwrap()
}

#[test]
fn test_sweep_evenly_split_range() {
    let mut rt = Runtime::with_config(HeapConfig::fixed(512), Settings::default());
    let expr = square(&mut rt);
    let range = SweepRange::new(Algebraic::from_i64(0), Algebraic::from_i64(2));
    let mut ys = Vec::new();
    let n = sweep(&mut rt, &expr, &range, 8, |_, y| {
        ys.push(y.clone());
        Ok(())
    })
    .unwrap();
    assert_eq!(n, 9);
    let last = ys.last().unwrap();
    assert_eq!(arithmetic::compare(last, &Algebraic::from_i64(4)).unwrap(), Ordering::Equal);
}

#[test]
fn test_sweep_stops_on_interrupt() {
    let mut rt = Runtime::with_config(HeapConfig::default(), Settings::default());
    let expr = square(&mut rt);
    let range = SweepRange::new(Algebraic::from_i64(0), Algebraic::from_i64(100)).with_step(Algebraic::from_i64(1));
    let interrupt = rt.interrupt();
    let mut taken = 0;
    let result = sweep(&mut rt, &expr, &range, 0, |_, _| {
        taken += 1;
        if taken == 3 {
            interrupt.raise();
        }
        Ok(())
    });
    assert_eq!(result, Err(RuntimeError::Interrupted));
    assert_eq!(taken, 3);
    assert_eq!(rt.depth(), 0);

    // Raised before the first sample
    let err = sweep(&mut rt, &expr, &range, 0, |_, _| Ok(())).unwrap_err();
    assert_eq!(err, RuntimeError::Interrupted);
    rt.interrupt().clear();
    assert_eq!(sweep(&mut rt, &expr, &range, 0, |_, _| Ok(())), Ok(101));
}
