//! Producer/disposer pairing for container-managed resources.
//!
//! A [`ProducerDisposerBinding`] says how one bean definition creates a
//! resource and how that resource is later released. It carries no
//! behaviour of its own; [`crate::lifecycle::ManagedScope`] is what invokes
//! the producer and, at teardown, the disposer.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::errors::{BindingError, BindingResult};

/// A produced resource or a resolved dependency.
pub type Instance = Arc<dyn Any + Send + Sync>;

pub type ProduceFn = Arc<dyn Fn() -> BindingResult<Instance> + Send + Sync>;
pub type DisposeFn = Arc<dyn Fn(&Instance, &[Instance]) -> BindingResult<()> + Send + Sync>;

/// Identity of a bean definition.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BeanRef {
    pub name: String,
    pub type_name: String,
}

impl BeanRef {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self { name: name.into(), type_name: type_name.into() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemberKind {
    Field,
    Method,
}

/// The field or method that creates a resource.
#[derive(Clone)]
pub struct Member {
    declaring_type: String,
    name: String,
    kind: MemberKind,
    produce: ProduceFn,
}

impl Member {
    pub fn new<F>(declaring_type: impl Into<String>, name: impl Into<String>, kind: MemberKind, produce: F) -> Self
    where
        F: Fn() -> BindingResult<Instance> + Send + Sync + 'static,
    {
        Self {
            declaring_type: declaring_type.into(),
            name: name.into(),
            kind,
            produce: Arc::new(produce),
        }
    }

    pub fn declaring_type(&self) -> &str {
        &self.declaring_type
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> MemberKind {
        self.kind
    }

    pub fn produce(&self) -> BindingResult<Instance> {
        (self.produce)()
    }
}

impl fmt::Debug for Member {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{} ({:?})", self.declaring_type, self.name, self.kind)
    }
}

impl fmt::Display for Member {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.declaring_type, self.name)
    }
}

/// The method that releases a produced resource. Receives the instance and
/// the resolved disposer dependencies, in injection point order.
#[derive(Clone)]
pub struct DisposerMethod {
    declaring_type: String,
    name: String,
    dispose: DisposeFn,
}

impl DisposerMethod {
    pub fn new<F>(declaring_type: impl Into<String>, name: impl Into<String>, dispose: F) -> Self
    where
        F: Fn(&Instance, &[Instance]) -> BindingResult<()> + Send + Sync + 'static,
    {
        Self {
            declaring_type: declaring_type.into(),
            name: name.into(),
            dispose: Arc::new(dispose),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn declaring_type(&self) -> &str {
        &self.declaring_type
    }

    pub fn invoke(&self, instance: &Instance, dependencies: &[Instance]) -> BindingResult<()> {
        (self.dispose)(instance, dependencies)
    }
}

impl fmt::Debug for DisposerMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.declaring_type, self.name)
    }
}

impl fmt::Display for DisposerMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.declaring_type, self.name)
    }
}

/// A dependency the container must satisfy before calling a disposer.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InjectionPoint {
    pub name: String,
    pub type_name: String,
    pub qualifiers: Vec<String>,
}

impl InjectionPoint {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self { name: name.into(), type_name: type_name.into(), qualifiers: Vec::new() }
    }

    pub fn qualified(mut self, qualifier: impl Into<String>) -> Self {
        self.qualifiers.push(qualifier.into());
        self
    }
}

impl fmt::Display for InjectionPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.type_name)?;
        if !self.qualifiers.is_empty() {
            write!(f, " @{}", self.qualifiers.join(" @"))?;
        }
        Ok(())
    }
}

/// How to create a resource and how to destroy it later. Never mutated
/// after construction.
#[derive(Debug, Clone)]
pub struct ProducerDisposerBinding {
    declaring_bean: Option<BeanRef>,
    producer_member: Member,
    disposer_method: Option<DisposerMethod>,
    disposer_injection_points: Vec<InjectionPoint>,
}

impl ProducerDisposerBinding {
    /// Whether the disposer's parameters match the injection points is the
    /// container's business, not checked here.
    pub fn new(
        declaring_bean: Option<BeanRef>,
        producer_member: Member,
        disposer_method: Option<DisposerMethod>,
        disposer_injection_points: Vec<InjectionPoint>,
    ) -> Self {
        Self { declaring_bean, producer_member, disposer_method, disposer_injection_points }
    }

    pub fn builder() -> ProducerDisposerBindingBuilder {
        ProducerDisposerBindingBuilder::default()
    }

    pub fn declaring_bean(&self) -> Option<&BeanRef> {
        self.declaring_bean.as_ref()
    }

    pub fn producer_member(&self) -> &Member {
        &self.producer_member
    }

    pub fn disposer_method(&self) -> Option<&DisposerMethod> {
        self.disposer_method.as_ref()
    }

    pub fn disposer_injection_points(&self) -> &[InjectionPoint] {
        &self.disposer_injection_points
    }
}

/// Assembles a binding from parts discovered one at a time, failing at
/// `build` if no producer was supplied.
#[derive(Default)]
pub struct ProducerDisposerBindingBuilder {
    declaring_bean: Option<BeanRef>,
    producer_member: Option<Member>,
    disposer_method: Option<DisposerMethod>,
    disposer_injection_points: Vec<InjectionPoint>,
}

impl ProducerDisposerBindingBuilder {
    pub fn declaring_bean(mut self, bean: BeanRef) -> Self {
        self.declaring_bean = Some(bean);
        self
    }

    pub fn producer(mut self, member: Member) -> Self {
        self.producer_member = Some(member);
        self
    }

    pub fn disposer(mut self, method: DisposerMethod) -> Self {
        self.disposer_method = Some(method);
        self
    }

    pub fn injection_point(mut self, point: InjectionPoint) -> Self {
        self.disposer_injection_points.push(point);
        self
    }

    pub fn build(self) -> BindingResult<ProducerDisposerBinding> {
        let producer_member = self.producer_member.ok_or(BindingError::MissingProducer)?;
        Ok(ProducerDisposerBinding::new(
            self.declaring_bean,
            producer_member,
            self.disposer_method,
            self.disposer_injection_points,
        ))
    }
}
