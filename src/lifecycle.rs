//! Container-side teardown of produced resources.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tracing::{debug, warn};

use crate::errors::{BindingError, BindingResult};
use crate::producer::{InjectionPoint, Instance, ProducerDisposerBinding};

/// Supplies disposer dependencies.
pub trait InjectionResolver: Send + Sync {
    fn resolve(&self, point: &InjectionPoint) -> BindingResult<Instance>;
}

/// Resolves injection points by name from a fixed set of instances.
#[derive(Default, Clone)]
pub struct NamedInstances {
    by_name: HashMap<String, Instance>,
}

impl NamedInstances {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, instance: Instance) -> Self {
        self.by_name.insert(name.into(), instance);
        self
    }
}

impl InjectionResolver for NamedInstances {
    fn resolve(&self, point: &InjectionPoint) -> BindingResult<Instance> {
        self.by_name
            .get(&point.name)
            .cloned()
            .ok_or_else(|| BindingError::Resolution(point.to_string()))
    }
}

/// Tracks resources produced within one scope and disposes them, newest
/// first, when the scope ends.
pub struct ManagedScope {
    name: String,
    resolver: Arc<dyn InjectionResolver>,
    produced: Mutex<Vec<(Arc<ProducerDisposerBinding>, Instance)>>,
}

impl ManagedScope {
    pub fn new(name: impl Into<String>, resolver: Arc<dyn InjectionResolver>) -> Self {
        Self { name: name.into(), resolver, produced: Mutex::new(Vec::new()) }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Invokes the binding's producer and remembers the instance for teardown.
    pub fn produce(&self, binding: &Arc<ProducerDisposerBinding>) -> BindingResult<Instance> {
        let instance = binding.producer_member().produce()?;
        debug!(target: "container", "Scope {} produced {}", self.name, binding.producer_member());
        let mut produced = self.produced.lock().unwrap_or_else(|e| e.into_inner());
        produced.push((Arc::clone(binding), Arc::clone(&instance)));
        Ok(instance)
    }

    pub fn len(&self) -> usize {
        self.produced.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Disposes every tracked instance in reverse production order. A failed
    /// disposal is logged and returned; the remaining ones still run.
    pub fn close(&self) -> Vec<BindingError> {
        let drained: Vec<_> = {
            let mut produced = self.produced.lock().unwrap_or_else(|e| e.into_inner());
            produced.drain(..).collect()
        };
        let mut failures = Vec::new();
        for (binding, instance) in drained.into_iter().rev() {
            if let Err(e) = dispose(&binding, &instance, self.resolver.as_ref()) {
                warn!(target: "container", "Scope {}: disposing {} failed: {}", self.name, binding.producer_member(), e);
                failures.push(e);
            }
        }
        failures
    }
}

impl Drop for ManagedScope {
    fn drop(&mut self) {
        if !self.is_empty() {
            self.close();
        }
    }
}

/// Resolves disposer dependencies and calls the disposer. Does nothing when
/// the binding has no disposer.
pub fn dispose(
    binding: &ProducerDisposerBinding,
    instance: &Instance,
    resolver: &dyn InjectionResolver,
) -> BindingResult<()> {
    let Some(disposer) = binding.disposer_method() else {
        return Ok(());
    };
    let deps = binding
        .disposer_injection_points()
        .iter()
        .map(|p| resolver.resolve(p))
        .collect::<BindingResult<Vec<_>>>()?;
    disposer.invoke(instance, &deps)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::producer::{DisposerMethod, Member, MemberKind};
    use pretty_assertions::assert_eq;

    type Log = Arc<Mutex<Vec<String>>>;

    fn binding(name: &'static str, log: &Log, with_disposer: bool) -> Arc<ProducerDisposerBinding> {
        let producer = Member::new("Res", name, MemberKind::Method, move || Ok(Arc::new(name) as Instance));
        let mut b = ProducerDisposerBinding::builder().producer(producer);
        if with_disposer {
            let log = Arc::clone(log);
            b = b
                .disposer(DisposerMethod::new("Res", format!("close_{name}"), move |inst, deps| {
                    let what = inst.downcast_ref::<&str>().copied().unwrap_or("?");
                    let dep = deps.first().and_then(|d| d.downcast_ref::<&str>()).copied().unwrap_or("-");
                    log.lock().unwrap().push(format!("{what}:{dep}"));
                    Ok(())
                }))
                .injection_point(InjectionPoint::new("audit", "Audit"));
        }
        Arc::new(b.build().unwrap())
    }

    #[test]
    fn disposes_in_reverse_order() {
        let log: Log = Arc::default();
        let resolver = Arc::new(NamedInstances::new().with("audit", Arc::new("aud") as Instance));
        let scope = ManagedScope::new("request", resolver);
        scope.produce(&binding("first", &log, true)).unwrap();
        scope.produce(&binding("plain", &log, false)).unwrap();
        scope.produce(&binding("second", &log, true)).unwrap();
        assert_eq!(scope.len(), 3);

        assert!(scope.close().is_empty());
        assert!(scope.is_empty());
        assert_eq!(*log.lock().unwrap(), vec!["second:aud".to_string(), "first:aud".to_string()]);
    }

    #[test]
    fn unresolved_dependency_is_reported_and_teardown_continues() {
        let log: Log = Arc::default();
        let scope = ManagedScope::new("request", Arc::new(NamedInstances::new()));
        scope.produce(&binding("a", &log, true)).unwrap();
        scope.produce(&binding("b", &log, true)).unwrap();
        let failures = scope.close();
        assert_eq!(failures.len(), 2);
        assert!(matches!(failures[0], BindingError::Resolution(_)));
        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    fn drop_closes_scope() {
        let log: Log = Arc::default();
        {
            let resolver = Arc::new(NamedInstances::new().with("audit", Arc::new("x") as Instance));
            let scope = ManagedScope::new("s", resolver);
            scope.produce(&binding("r", &log, true)).unwrap();
        }
        assert_eq!(log.lock().unwrap().len(), 1);
    }
}
