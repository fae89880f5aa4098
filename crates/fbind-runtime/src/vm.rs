#![forbid(unsafe_code)]

//! The root orchestrator.
//!
//! [`ViewModel::new`] takes [`Options`] and, when a target is configured:
//!
//! 1. installs the computed properties on the data object,
//! 2. stores the methods,
//! 3. proxies every reactive top-level key,
//! 4. compiles the target subtree.
//!
//! Without a target the view model is returned unmounted: nothing is
//! installed, proxied or compiled.
//!
//! # Ownership
//!
//! The watchers live in one [`BindingSet`] shared by the view model and the
//! mount target, which retains it through [`ViewNode::retain`]. Bindings stay
//! live for as long as either the document or a `ViewModel` handle does.
//!
//! Listeners installed by `on` hold only a weak handle to the view model:
//! methods are view-model members, so once the last handle drops, events
//! that name a method are ignored. `model` listeners and watchers keep
//! working against the data object.

use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use ahash::AHashMap;
use fbind_core::{BindError, Computed, ComputedScope, Object, Path, Result, Value, Watcher};
use fbind_view::{Document, Node, ViewNode};

use crate::binding::BindingSet;
use crate::compiler::Compiler;
use crate::config::BindConfig;

/// A method callable by name, with the view model as receiver.
pub type Method<N> = Rc<dyn Fn(&ViewModel<N>) -> Result<()>>;

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Construction options for a [`ViewModel`].
pub struct Options<N: ViewNode = Node> {
    data: Object,
    target: Option<N>,
    computed: Vec<(String, Computed)>,
    methods: Vec<(String, Method<N>)>,
    config: BindConfig,
}

impl<N: ViewNode> Options<N> {
    #[must_use]
    pub fn new(data: Object) -> Self {
        Self {
            data,
            target: None,
            computed: Vec::new(),
            methods: Vec::new(),
            config: BindConfig::default(),
        }
    }

    /// Observe plain JSON as the data object.
    #[must_use]
    pub fn from_json(data: &serde_json::Value) -> Self {
        Self::new(Object::from_json(data))
    }

    #[must_use]
    pub fn target(mut self, node: N) -> Self {
        self.target = Some(node);
        self
    }

    /// Add a read-only derived property evaluated against the data object.
    #[must_use]
    pub fn computed(
        mut self,
        name: impl Into<String>,
        getter: impl Fn(&ComputedScope<'_>) -> Result<Value> + 'static,
    ) -> Self {
        self.computed.push((name.into(), Computed::new(getter)));
        self
    }

    #[must_use]
    pub fn method(
        mut self,
        name: impl Into<String>,
        f: impl Fn(&ViewModel<N>) -> Result<()> + 'static,
    ) -> Self {
        self.methods.push((name.into(), Rc::new(f)));
        self
    }

    #[must_use]
    pub fn config(mut self, config: BindConfig) -> Self {
        self.config = config;
        self
    }
}

impl Options<Node> {
    /// Resolve the target with a selector (`#id` or a tag name).
    pub fn target_selector(self, document: &Document, selector: &str) -> Result<Self> {
        let node = document
            .query(selector)
            .ok_or_else(|| BindError::TargetNotFound {
                selector: selector.to_owned(),
            })?;
        Ok(self.target(node))
    }
}

impl<N: ViewNode> fmt::Debug for Options<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Options")
            .field("data", &self.data)
            .field("has_target", &self.target.is_some())
            .field("computed", &self.computed.iter().map(|(k, _)| k).collect::<Vec<_>>())
            .field("methods", &self.methods.iter().map(|(k, _)| k).collect::<Vec<_>>())
            .field("config", &self.config)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// ViewModel
// ---------------------------------------------------------------------------

pub(crate) struct VmInner<N: ViewNode> {
    target: Option<N>,
    data: Object,
    methods: AHashMap<String, Method<N>>,
    proxied: Vec<String>,
    bindings: Rc<RefCell<BindingSet>>,
    config: BindConfig,
}

/// Shared handle to a data object bound to a view subtree.
pub struct ViewModel<N: ViewNode = Node> {
    inner: Rc<VmInner<N>>,
}

impl<N: ViewNode> Clone for ViewModel<N> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<N: ViewNode> ViewModel<N> {
    pub fn new(options: Options<N>) -> Result<Self> {
        let Options {
            data,
            target,
            computed,
            methods,
            config,
        } = options;
        config.validate().map_err(|e| BindError::InvalidConfig {
            reason: e.to_string(),
        })?;

        let Some(target) = target else {
            tracing::debug!("no target configured; view model left unmounted");
            return Ok(Self::from_parts(None, data, AHashMap::new(), Vec::new(), config));
        };

        for (name, getter) in computed {
            data.define_computed(name, getter.tracked(config.track_computed_reads));
        }
        let methods: AHashMap<String, Method<N>> = methods.into_iter().collect();
        let proxied = data.keys();

        let vm = Self::from_parts(Some(target.clone()), data, methods, proxied, config);
        let mut compiler = Compiler::new(&vm);
        compiler.mount(&target)?;
        let bindings = compiler.into_bindings();
        tracing::debug!(bindings = bindings.len(), "view model mounted");
        *vm.inner.bindings.borrow_mut() = bindings;
        target.retain(Rc::clone(&vm.inner.bindings) as Rc<dyn Any>);
        Ok(vm)
    }

    fn from_parts(
        target: Option<N>,
        data: Object,
        methods: AHashMap<String, Method<N>>,
        proxied: Vec<String>,
        config: BindConfig,
    ) -> Self {
        Self {
            inner: Rc::new(VmInner {
                target,
                data,
                methods,
                proxied,
                bindings: Rc::new(RefCell::new(BindingSet::new())),
                config,
            }),
        }
    }

    pub(crate) fn downgrade(&self) -> Weak<VmInner<N>> {
        Rc::downgrade(&self.inner)
    }

    pub(crate) fn upgrade(weak: &Weak<VmInner<N>>) -> Option<Self> {
        weak.upgrade().map(|inner| Self { inner })
    }

    /// The underlying data object.
    #[must_use]
    pub fn data(&self) -> &Object {
        &self.inner.data
    }

    #[must_use]
    pub fn config(&self) -> &BindConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn target(&self) -> Option<&N> {
        self.inner.target.as_ref()
    }

    #[must_use]
    pub fn is_mounted(&self) -> bool {
        self.inner.target.is_some()
    }

    /// Proxied read of a top-level data key.
    pub fn get(&self, key: &str) -> Result<Value> {
        if !self.inner.proxied.iter().any(|k| k == key) {
            return Err(BindError::MissingPath {
                path: key.to_owned(),
                segment: key.to_owned(),
            });
        }
        self.inner.data.get(key)
    }

    /// Keys proxied from the data object.
    #[must_use]
    pub fn keys(&self) -> &[String] {
        &self.inner.proxied
    }

    /// Untracked evaluation of a dotted expression against the data object.
    pub fn eval(&self, expr: &str) -> Result<Value> {
        self.inner.data.resolve(&Path::parse(expr)?, None)
    }

    /// Write through the data object. Returns whether the value changed.
    pub fn set(&self, expr: &str, value: impl Into<Value>) -> Result<bool> {
        self.inner.data.assign(&Path::parse(expr)?, value)
    }

    /// Evaluate a computed property.
    pub fn computed(&self, name: &str) -> Result<Value> {
        if self.inner.data.cell(name).is_some() || !self.inner.data.contains_key(name) {
            return Err(BindError::MissingPath {
                path: name.to_owned(),
                segment: name.to_owned(),
            });
        }
        self.inner.data.get(name)
    }

    #[must_use]
    pub fn method(&self, name: &str) -> Option<Method<N>> {
        self.inner.methods.get(name).cloned()
    }

    /// Invoke a method with this view model as receiver.
    pub fn call(&self, name: &str) -> Result<()> {
        let method = self.method(name).ok_or_else(|| BindError::UnknownMethod {
            name: name.to_owned(),
        })?;
        tracing::trace!(method = name, "calling method");
        method(self)
    }

    /// Watch `expr` for as long as the bindings of this view model live.
    pub fn watch(
        &self,
        expr: &str,
        callback: impl FnMut(&Value) -> Result<()> + 'static,
    ) -> Result<Rc<Watcher>> {
        let path = Path::parse(expr)?;
        self.inner
            .bindings
            .borrow_mut()
            .watch(&self.inner.data, path, callback)
    }

    /// Watchers currently held for this view model.
    #[must_use]
    pub fn binding_count(&self) -> usize {
        self.inner.bindings.borrow().len()
    }
}

impl<N: ViewNode> fmt::Debug for ViewModel<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewModel")
            .field("mounted", &self.is_mounted())
            .field("data", &self.inner.data)
            .field("methods", &self.inner.methods.len())
            .field("bindings", &*self.inner.bindings.borrow())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::cell::Cell;

    fn user() -> serde_json::Value {
        json!({ "user": { "first": "Ann", "last": "Lee" }, "count": 0 })
    }

    #[test]
    fn no_target_is_an_early_exit() {
        let vm: ViewModel = ViewModel::new(
            Options::from_json(&user())
                .computed("full", |_| Ok(Value::from("x")))
                .method("go", |_| Ok(())),
        )
        .unwrap();
        assert!(!vm.is_mounted());
        assert_eq!(vm.binding_count(), 0);
        assert!(vm.method("go").is_none());
        assert!(!vm.data().contains_key("full"));
        assert!(vm.get("count").is_err());
    }

    #[test]
    fn proxies_reactive_keys_only() {
        let vm = ViewModel::new(
            Options::from_json(&user())
                .target(Node::element("div"))
                .computed("full", |s| {
                    Ok(Value::from(format!("{} {}", s.get("user.first")?, s.get("user.last")?)))
                }),
        )
        .unwrap();
        assert_eq!(vm.keys(), ["user", "count"]);
        assert_eq!(vm.get("count").unwrap(), Value::from(0));
        assert!(vm.get("full").is_err());
        assert_eq!(vm.computed("full").unwrap(), Value::from("Ann Lee"));
        assert!(vm.computed("count").is_err());
        assert_eq!(vm.eval("full").unwrap(), Value::from("Ann Lee"));
    }

    #[test]
    fn computed_is_read_only() {
        let vm = ViewModel::new(
            Options::from_json(&user())
                .target(Node::element("div"))
                .computed("full", |_| Ok(Value::Null)),
        )
        .unwrap();
        assert!(matches!(vm.set("full", "x"), Err(BindError::ReadOnly { .. })));
    }

    #[test]
    fn call_runs_method_with_receiver() {
        let vm = ViewModel::new(
            Options::from_json(&user())
                .target(Node::element("div"))
                .method("inc", |vm: &ViewModel| {
                    let n = vm.get("count")?.as_f64().unwrap_or(0.0);
                    vm.set("count", n + 1.0).map(drop)
                }),
        )
        .unwrap();
        vm.call("inc").unwrap();
        vm.call("inc").unwrap();
        assert_eq!(vm.get("count").unwrap(), Value::from(2));
        assert!(matches!(vm.call("nope"), Err(BindError::UnknownMethod { .. })));
    }

    #[test]
    fn bindings_die_with_view_model_and_target() {
        let vm = ViewModel::new(Options::from_json(&user()).target(Node::element("div"))).unwrap();
        let hits = Rc::new(Cell::new(0));
        let h = Rc::clone(&hits);
        vm.watch("user.first", move |_| {
            h.set(h.get() + 1);
            Ok(())
        })
        .unwrap();
        assert_eq!(vm.binding_count(), 1);

        let data = vm.data().clone();
        data.assign(&Path::parse("user.first").unwrap(), "Bo").unwrap();
        assert_eq!(hits.get(), 1);

        drop(vm);
        data.assign(&Path::parse("user.first").unwrap(), "Cy").unwrap();
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn target_keeps_bindings_alive() {
        let target = Node::element("div");
        let vm = ViewModel::new(Options::from_json(&user()).target(target.clone())).unwrap();
        let hits = Rc::new(Cell::new(0));
        let h = Rc::clone(&hits);
        vm.watch("count", move |_| {
            h.set(h.get() + 1);
            Ok(())
        })
        .unwrap();

        let data = vm.data().clone();
        drop(vm);
        data.set("count", 1).unwrap();
        assert_eq!(hits.get(), 1);

        drop(target);
        data.set("count", 2).unwrap();
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = BindConfig {
            model_event: String::new(),
            ..BindConfig::default()
        };
        let err = ViewModel::new(Options::from_json(&user()).target(Node::element("div")).config(config))
            .unwrap_err();
        assert!(matches!(err, BindError::InvalidConfig { .. }));
    }

    #[test]
    fn target_selector_resolves_against_document() {
        let doc = Document::parse(r#"<body><div id="app">{{count}}</div></body>"#).unwrap();
        let vm = ViewModel::new(
            Options::from_json(&user()).target_selector(&doc, "#app").unwrap(),
        )
        .unwrap();
        assert!(vm.target().unwrap().ptr_eq(&doc.query("#app").unwrap()));
        assert_eq!(doc.to_markup(), r#"<body><div id="app">0</div></body>"#);

        let err = Options::from_json(&user()).target_selector(&doc, "#nope").unwrap_err();
        assert!(matches!(err, BindError::TargetNotFound { .. }));
    }
}
