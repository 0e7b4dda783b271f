//! Integration tests for the metrics facade
//!
//! These exercise the public API the way application tests use it:
//! handles created up front, a capture sink installed around the code under
//! test, and assertions on what was recorded.

use metron_core::{
    get_metrics, resolve, BackendRegistry, MetricKind, MetricsMock, Record, Subject,
};
use serde_json::json;
use std::panic::AssertUnwindSafe;

pub struct Foo;

// ============================================================================
// Name resolution
// ============================================================================

#[test]
fn test_get_metrics_fixes_names() {
    let cases = [
        ("", "unnamed"),
        (".", "unnamed"),
        ("abc(123)", "abc.123"),
        ("...ab..c...", "ab.c"),
    ];

    for (name, expected) in cases {
        assert_eq!(get_metrics(name, "").name(), expected);
    }
}

#[test]
fn test_get_metrics_subjects() {
    assert_eq!(get_metrics("string", "").name(), "string");
    assert_eq!(
        get_metrics(Subject::of_type::<Foo>(), "").name(),
        "capture_test.Foo"
    );
    assert_eq!(
        get_metrics(Subject::instance(&Foo), "").name(),
        "capture_test.Foo"
    );
    assert_eq!(
        get_metrics(Subject::module(module_path!()), "").name(),
        "capture_test"
    );
    assert_eq!(
        get_metrics(Subject::instance(&Foo), "jim").name(),
        "capture_test.Foo.jim"
    );

    assert_eq!(get_metrics(Subject::of_type::<i32>(), "").name(), "__builtin__.i32");
    assert_eq!(get_metrics(5_i32, "").name(), "__builtin__.i32");
    assert_eq!(get_metrics(None::<&str>, "").name(), "unnamed");
}

#[test]
fn test_resolve_is_total() {
    let subjects = vec![
        Subject::Absent,
        Subject::from(""),
        Subject::from("..."),
        Subject::from(0_u8),
        Subject::from('x'),
        Subject::of_type::<[u8]>(),
        Subject::of_type::<(i32, String)>(),
        Subject::instance(&vec![1, 2, 3]),
        Subject::module(""),
    ];

    for subject in subjects {
        let name = resolve(subject.clone(), "");
        assert!(!name.is_empty(), "{:?}", subject);
        assert!(!name.starts_with('.') && !name.ends_with('.'), "{}", name);
        assert!(!name.contains(".."), "{}", name);
        assert!(
            name.chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.'),
            "{}",
            name
        );
    }
}

// ============================================================================
// Recording
// ============================================================================

fn capture(emit: impl FnOnce(&metron_core::MetricsHandle)) -> Vec<Record> {
    let metrics = get_metrics("thing", "");
    let mm = MetricsMock::new();
    {
        let _capture = mm.install();
        emit(&metrics);
    }
    mm.get_records()
}

#[test]
fn test_incr() {
    assert_eq!(
        capture(|m| m.incr_by("foo", 5)),
        vec![Record::from_json(MetricKind::Incr, "thing.foo", json!({"value": 5}))]
    );
}

#[test]
fn test_incr_defaults_to_one() {
    assert_eq!(
        capture(|m| m.incr("foo")),
        vec![Record::from_json(MetricKind::Incr, "thing.foo", json!({"value": 1}))]
    );
}

#[test]
fn test_gauge() {
    assert_eq!(
        capture(|m| m.gauge("foo", 10)),
        vec![Record::from_json(MetricKind::Gauge, "thing.foo", json!({"value": 10}))]
    );
}

#[test]
fn test_timing() {
    assert_eq!(
        capture(|m| m.timing("foo", 1234)),
        vec![Record::from_json(MetricKind::Timing, "thing.foo", json!({"value": 1234}))]
    );
}

#[test]
fn test_histogram() {
    assert_eq!(
        capture(|m| m.histogram("foo", 4321)),
        vec![Record::from_json(
            MetricKind::Histogram,
            "thing.foo",
            json!({"value": 4321})
        )]
    );
}

#[test]
fn test_timer_scope() {
    let metrics = get_metrics("thing", "");
    let mm = MetricsMock::new();

    {
        let _capture = mm.install();
        let _timer = metrics.timer("long_fun");
        println!("blah");
    }

    assert!(mm.has_record(Some(MetricKind::Timing), Some("thing.long_fun"), None));
}

#[test]
fn test_timer_decorator() {
    let metrics = get_metrics("thing", "");
    let something = metrics.timer_decorator("long_fun").wrap(|| println!("blah"));

    let mm = MetricsMock::new();
    {
        let _capture = mm.install();
        something();
    }

    assert!(mm.has_record(Some(MetricKind::Timing), Some("thing.long_fun"), None));
}

// ============================================================================
// Scoping
// ============================================================================

#[test]
fn test_nested_capture() {
    let registry = BackendRegistry::current();
    let metrics = get_metrics("thing", "");
    let a = MetricsMock::new();
    let b = MetricsMock::new();

    let guard_a = a.install();
    {
        let _guard_b = b.install();
        metrics.incr("both");
    }
    metrics.incr("only_a");

    assert!(a.has_record(None, Some("thing.both"), None));
    assert!(a.has_record(None, Some("thing.only_a"), None));
    assert!(b.has_record(None, Some("thing.both"), None));
    assert!(!b.has_record(None, Some("thing.only_a"), None));

    drop(guard_a);
    assert!(registry.is_empty());
}

#[test]
fn test_capture_released_after_panic() {
    let registry = BackendRegistry::current();
    let mm = MetricsMock::new();

    let result = std::panic::catch_unwind(AssertUnwindSafe(|| {
        let _capture = mm.install();
        panic!("boom");
    }));

    assert!(result.is_err());
    assert!(registry.is_empty());
}
