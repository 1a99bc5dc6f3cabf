use std::io::Write;
use std::sync::Arc;

use log_script_filter::{
    Configuration, Filter, FilterResult, Level, LogEvent, Marker, Message, PluginRegistry, Script, ScriptFilter,
    ScriptManager,
};
use pretty_assertions::assert_eq;
use serde_json::json;

#[test]
fn accept_errors_deny_the_rest() {
    log_script_filter::logging::init_test();
    let cfg = Arc::new(Configuration::builder().build());
    let f = ScriptFilter::create(
        Some(Script::inline("errorsOnly", "level == \"ERROR\"")),
        Some(FilterResult::Accept),
        Some(FilterResult::Deny),
        cfg,
    )
    .unwrap();
    assert_eq!(f.filter_message("app", Level::Error, None, &Message::simple("x"), None), FilterResult::Accept);
    assert_eq!(f.filter_message("app", Level::Info, None, &Message::simple("x"), None), FilterResult::Deny);
}

#[test]
fn properties_and_substitution_reach_scripts() {
    let cfg = Arc::new(
        Configuration::builder()
            .property("service", "billing")
            .property("quietLogger", "billing.poller")
            .build(),
    );
    let f = ScriptFilter::create(
        Some(Script::inline("notQuiet", "logger.name != subst('${service}.poller') && logger.name != quietLogger || level == 'FATAL'")),
        Some(FilterResult::Neutral),
        Some(FilterResult::Deny),
        cfg,
    )
    .unwrap();
    assert_eq!(f.filter_parameters("billing.api", Level::Info, None, "ok", &[]), FilterResult::Neutral);
    assert_eq!(f.filter_parameters("billing.poller", Level::Info, None, "tick", &[]), FilterResult::Deny);
    assert_eq!(f.filter_parameters("billing.poller", Level::Fatal, None, "dead", &[]), FilterResult::Neutral);
}

#[test]
fn marker_and_message_text_predicates() {
    let cfg = Arc::new(Configuration::builder().build());
    let f = ScriptFilter::create(
        Some(Script::inline(
            "auditTimeouts",
            "logEvent.marker.name == 'AUDIT' && contains(lower(logEvent.message.text), 'timeout')",
        )),
        Some(FilterResult::Accept),
        Some(FilterResult::Deny),
        cfg,
    )
    .unwrap();
    let hit = LogEvent::new("db", Level::Warn, Message::parameterized("Timeout after {}s", vec![json!(30)]))
        .with_marker(Marker::new("AUDIT"));
    let miss = LogEvent::new("db", Level::Warn, Message::simple("Timeout"));
    assert_eq!(f.filter_event(&hit), FilterResult::Accept);
    assert_eq!(f.filter_event(&miss), FilterResult::Deny);
}

#[test]
fn document_with_script_file_and_shared_script() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "length(parameters) > 1").unwrap();
    let json = json!({
        "properties": [ { "name": "min", "value": "WARN" } ],
        "scripts": [ { "name": "severe", "body": "logEvent.level == 'ERROR' || logEvent.level == 'FATAL'" } ],
        "filters": [
            { "type": "ScriptFilter", "onMatch": "ACCEPT", "onMismatch": "NEUTRAL", "scriptRef": "severe" },
            { "type": "ScriptFilter", "onMatch": "DENY", "onMismatch": "NEUTRAL", "scriptFile": { "path": file.path() } }
        ]
    })
    .to_string();

    let manager = Arc::new(ScriptManager::new());
    let loaded = PluginRegistry::with_builtins().load(&json, manager.clone()).unwrap();
    assert_eq!(loaded.filters.len(), 2);
    assert_eq!(loaded.configuration.property("min"), Some("WARN"));
    assert_eq!(manager.script_names().len(), 2);

    let severe = &loaded.filters[0];
    assert_eq!(severe.filter_event(&LogEvent::new("a", Level::Fatal, Message::simple("x"))), FilterResult::Accept);
    assert_eq!(severe.filter_event(&LogEvent::new("a", Level::Debug, Message::simple("x"))), FilterResult::Neutral);

    let chatty = &loaded.filters[1];
    assert_eq!(chatty.filter_parameters("a", Level::Info, None, "{} {}", &[json!(1), json!(2)]), FilterResult::Deny);
    assert_eq!(chatty.filter_parameters("a", Level::Info, None, "{}", &[json!(1)]), FilterResult::Neutral);
    // object messages carry no parameters: length(null) == 0
    assert_eq!(chatty.filter_object("a", Level::Info, None, &json!("x"), None), FilterResult::Neutral);
}

#[test]
fn missing_script_file_leaves_entry_inert() {
    let json = r#"{ "filters": [
        { "type": "ScriptFilter", "scriptFile": { "path": "/does/not/exist.expr" } },
        { "type": "ScriptFilter", "script": { "name": "all", "body": "true" } }
    ] }"#;
    let loaded = PluginRegistry::with_builtins().load(json, Arc::new(ScriptManager::new())).unwrap();
    assert_eq!(loaded.filters.len(), 1);
    assert_eq!(loaded.filters[0].to_string(), "all");
}
