#![allow(dead_code)]

use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use log_script_filter::errors::Result;
use log_script_filter::{Script, ScriptBindings, ScriptManager, ScriptRegistry};
use serde_json::Value;
use tracing_subscriber::fmt::MakeWriter;

/// Wraps the default registry, counting registrations and keeping every
/// binding it was asked to execute with.
#[derive(Default)]
pub struct RecordingRegistry {
    inner: ScriptManager,
    pub adds: AtomicUsize,
    pub seen: Mutex<Vec<ScriptBindings>>,
}

impl RecordingRegistry {
    pub fn add_count(&self) -> usize {
        self.adds.load(Ordering::SeqCst)
    }

    pub fn last_bindings(&self) -> ScriptBindings {
        self.seen.lock().unwrap().last().cloned().expect("no execution recorded")
    }
}

impl ScriptRegistry for RecordingRegistry {
    fn add_script(&self, script: &Script) -> Result<()> {
        self.adds.fetch_add(1, Ordering::SeqCst);
        self.inner.add_script(script)
    }

    fn get_script(&self, name: &str) -> Option<Arc<Script>> {
        self.inner.get_script(name)
    }

    fn execute(&self, name: &str, bindings: ScriptBindings) -> Result<Value> {
        self.seen.lock().unwrap().push(bindings.clone());
        self.inner.execute(name, bindings)
    }
}

/// Registry whose every script yields the same outcome.
pub struct FixedRegistry(pub std::result::Result<Value, String>);

impl ScriptRegistry for FixedRegistry {
    fn add_script(&self, _: &Script) -> Result<()> {
        Ok(())
    }

    fn get_script(&self, name: &str) -> Option<Arc<Script>> {
        Some(Arc::new(Script::inline(name, "true")))
    }

    fn execute(&self, _: &str, _: ScriptBindings) -> Result<Value> {
        self.0
            .clone()
            .map_err(log_script_filter::ScriptError::Runtime)
    }
}

#[derive(Clone, Default)]
pub struct Captured(Arc<Mutex<Vec<u8>>>);

impl io::Write for Captured {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for Captured {
    type Writer = Captured;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Runs `f` with a subscriber that keeps ERROR events, returning them as lines.
pub fn capture_errors<T>(f: impl FnOnce() -> T) -> (T, Vec<String>) {
    let cap = Captured::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(cap.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::ERROR)
        .finish();
    let out = tracing::subscriber::with_default(subscriber, f);
    let text = String::from_utf8(cap.0.lock().unwrap().clone()).unwrap();
    (out, text.lines().map(str::to_string).collect())
}
