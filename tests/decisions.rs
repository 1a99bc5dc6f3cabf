mod common;

use std::sync::Arc;

use common::{FixedRegistry, RecordingRegistry};
use log_script_filter::{
    Configuration, Filter, FilterResult, Level, LogEvent, Marker, Message, Script, ScriptFilter, ThrowableInfo,
};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use serde_json::{json, Value};

fn fixed_filter(outcome: Result<Value, String>) -> ScriptFilter {
    let cfg = Arc::new(Configuration::builder().registry(Arc::new(FixedRegistry(outcome))).build());
    ScriptFilter::create(
        Some(Script::reference("fixed")),
        Some(FilterResult::Accept),
        Some(FilterResult::Deny),
        cfg,
    )
    .unwrap()
}

fn every_shape(f: &ScriptFilter) -> [FilterResult; 4] {
    let params = [json!(1)];
    let thrown = ThrowableInfo::new("Io", "closed");
    [
        f.filter_parameters("app", Level::Info, None, "m {}", &params),
        f.filter_object("app", Level::Info, None, &json!({ "k": 1 }), Some(&thrown)),
        f.filter_message("app", Level::Info, None, &Message::simple("m"), None),
        f.filter_event(&LogEvent::new("app", Level::Info, Message::simple("m"))),
    ]
}

fn non_true_value() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        Just(Value::Bool(false)),
        any::<i64>().prop_map(Value::from),
        (-1.0e9f64..1.0e9).prop_map(Value::from),
        ".*".prop_map(Value::String),
    ];
    leaf.prop_recursive(2, 8, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            prop::collection::hash_map("[a-z]{1,5}", inner, 0..4)
                .prop_map(|m| Value::Object(m.into_iter().collect())),
        ]
    })
}

proptest! {
    #[test]
    fn anything_but_true_is_a_mismatch(v in non_true_value()) {
        let f = fixed_filter(Ok(v));
        prop_assert_eq!(every_shape(&f), [FilterResult::Deny; 4]);
    }
}

#[test]
fn exactly_true_is_a_match() {
    let f = fixed_filter(Ok(Value::Bool(true)));
    assert_eq!(every_shape(&f), [FilterResult::Accept; 4]);
}

#[test]
fn truthy_lookalikes_do_not_match() {
    for v in [json!("true"), json!(1), json!([true]), json!({ "value": true })] {
        assert_eq!(every_shape(&fixed_filter(Ok(v))), [FilterResult::Deny; 4]);
    }
}

#[test]
fn execution_failure_is_a_mismatch() {
    let f = fixed_filter(Err("engine exploded".into()));
    assert_eq!(every_shape(&f), [FilterResult::Deny; 4]);
}

#[test]
fn runtime_script_error_is_a_mismatch() {
    let cfg = Arc::new(Configuration::builder().build());
    let f = ScriptFilter::create(
        Some(Script::inline("bad", "message > 10")),
        Some(FilterResult::Accept),
        Some(FilterResult::Neutral),
        cfg,
    )
    .unwrap();
    assert_eq!(
        f.filter_message("app", Level::Info, None, &Message::simple("m"), None),
        FilterResult::Neutral
    );
}

fn recording_filter(body: &str) -> (ScriptFilter, Arc<RecordingRegistry>) {
    let registry = Arc::new(RecordingRegistry::default());
    let cfg = Arc::new(
        Configuration::builder()
            .property("region", "eu")
            .property("logger", "from-properties")
            .registry(Arc::clone(&registry) as Arc<dyn log_script_filter::ScriptRegistry>)
            .build(),
    );
    let f = ScriptFilter::create(Some(Script::inline("rec", body)), None, None, cfg).unwrap();
    (f, registry)
}

#[test]
fn parameters_shape_binding() {
    let (f, registry) = recording_filter("true");
    let marker = Marker::new("AUDIT");
    f.filter_parameters("orders", Level::Warn, Some(&marker), "{} items", &[json!(3), json!("x")]);

    let b = registry.last_bindings();
    assert_eq!(b.get("parameters"), Some(&json!([3, "x"])));
    assert_eq!(b.get("throwable"), Some(&Value::Null));
    assert_eq!(b.get("level"), Some(&json!("WARN")));
    assert_eq!(b.get("marker"), Some(&json!({ "name": "AUDIT" })));
    assert_eq!(b.get("logger"), Some(&json!({ "name": "orders" })));
    assert_eq!(b.get("region"), Some(&json!("eu")));
    assert!(b.get("substitutor").is_some_and(|s| s["variables"]["region"] == "eu"));
}

#[test]
fn event_shape_binding() {
    let (f, registry) = recording_filter("true");
    let ev = LogEvent::new("orders", Level::Error, Message::simple("boom"))
        .with_thrown(ThrowableInfo::new("Timeout", "30s"));
    f.filter_event(&ev);

    let b = registry.last_bindings();
    assert_eq!(b.get("logEvent").map(|e| &e["thrown"]["kind"]), Some(&json!("Timeout")));
    for name in ["logger", "level", "marker", "throwable", "parameters", "message"] {
        assert!(!b.contains(name), "`{name}` must not be bound for whole events");
    }
    assert_eq!(b.get("region"), Some(&json!("eu")));
    assert!(b.contains("substitutor"));
}
