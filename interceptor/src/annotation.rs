//! The method-level declarative surface a real attribute macro would
//! generate (out of scope here, per the crate's domain boundary) —
//! expressed instead as a plain struct built with a builder, the way
//! the teacher expresses its own non-macro configuration structs.

use anyhow::Error as AnyError;

/// How an intercepted call relates to whatever transaction is already
/// active on the current call chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Propagation {
    Required,
    RequiresNew,
    Mandatory,
}

/// A single rule for matching a business exception against the
/// delay-cancel set. Built from a concrete Rust error type via
/// [`DelayCancelRule::for_type`]; matching happens by attempting to
/// downcast the chain link, never by comparing type names.
pub struct DelayCancelRule {
    test: Box<dyn Fn(&(dyn std::error::Error + 'static)) -> bool + Send + Sync>,
    label: &'static str,
}

impl DelayCancelRule {
    pub fn for_type<E: std::error::Error + 'static>(label: &'static str) -> Self {
        Self {
            test: Box::new(|err| err.downcast_ref::<E>().is_some()),
            label,
        }
    }
}

impl std::fmt::Debug for DelayCancelRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DelayCancelRule").field("label", &self.label).finish()
    }
}

/// The union of interceptor-global and per-annotation delay-cancel
/// exception types. A business error "matches" if its concrete type or
/// its root cause's type satisfies any rule in the set — never
/// substring/name matching, since that would silently misclassify
/// unrelated errors that happen to share a type name.
#[derive(Debug, Default)]
pub struct DelayCancelSet {
    rules: Vec<DelayCancelRule>,
}

impl DelayCancelSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, rule: DelayCancelRule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn merge(mut self, other: DelayCancelSet) -> Self {
        self.rules.extend(other.rules);
        self
    }

    pub fn matches(&self, err: &AnyError) -> bool {
        let top = err.chain().next();
        let root = err.root_cause();
        self.rules.iter().any(|rule| {
            top.map(|e| (rule.test)(e)).unwrap_or(false) || (rule.test)(root)
        })
    }
}

/// Where to find the idempotence key for `getUniqueIdentity`. The spec
/// leaves the exact resolution implementation-defined; DESIGN.md records
/// the decision to support both strategies and derive a stable `Uuid`
/// from whichever key is found via `Uuid::new_v5`.
#[derive(Debug, Clone)]
pub enum UniqueIdentitySource {
    /// Use the business call's first argument, whole, as the key.
    FirstArgument,
    /// Use a named field within the business call's argument object.
    NamedField(String),
}

/// The annotation surface: confirm/cancel method names, propagation,
/// sync-vs-async execution per phase, and this call's contribution to
/// the delay-cancel set.
#[derive(Debug)]
pub struct CompensableAnnotation {
    pub confirm_method: String,
    pub cancel_method: String,
    pub propagation: Propagation,
    pub async_confirm: bool,
    pub async_cancel: bool,
    pub delay_cancel_exceptions: DelayCancelSet,
    pub unique_identity_source: Option<UniqueIdentitySource>,
}

impl CompensableAnnotation {
    pub fn builder(confirm_method: impl Into<String>, cancel_method: impl Into<String>) -> CompensableAnnotationBuilder {
        CompensableAnnotationBuilder::new(confirm_method, cancel_method)
    }
}

pub struct CompensableAnnotationBuilder {
    confirm_method: String,
    cancel_method: String,
    propagation: Propagation,
    async_confirm: bool,
    async_cancel: bool,
    delay_cancel_exceptions: DelayCancelSet,
    unique_identity_source: Option<UniqueIdentitySource>,
}

impl CompensableAnnotationBuilder {
    fn new(confirm_method: impl Into<String>, cancel_method: impl Into<String>) -> Self {
        Self {
            confirm_method: confirm_method.into(),
            cancel_method: cancel_method.into(),
            propagation: Propagation::Required,
            async_confirm: false,
            async_cancel: false,
            delay_cancel_exceptions: DelayCancelSet::new(),
            unique_identity_source: None,
        }
    }

    pub fn propagation(mut self, propagation: Propagation) -> Self {
        self.propagation = propagation;
        self
    }

    pub fn async_confirm(mut self, value: bool) -> Self {
        self.async_confirm = value;
        self
    }

    pub fn async_cancel(mut self, value: bool) -> Self {
        self.async_cancel = value;
        self
    }

    pub fn delay_cancel_exceptions(mut self, set: DelayCancelSet) -> Self {
        self.delay_cancel_exceptions = set;
        self
    }

    pub fn unique_identity_source(mut self, source: UniqueIdentitySource) -> Self {
        self.unique_identity_source = Some(source);
        self
    }

    pub fn build(self) -> CompensableAnnotation {
        CompensableAnnotation {
            confirm_method: self.confirm_method,
            cancel_method: self.cancel_method,
            propagation: self.propagation,
            async_confirm: self.async_confirm,
            async_cancel: self.async_cancel,
            delay_cancel_exceptions: self.delay_cancel_exceptions,
            unique_identity_source: self.unique_identity_source,
        }
    }
}
