#![forbid(unsafe_code)]

//! The binding compiler: walks a view tree and wires directives and
//! interpolations to watchers.
//!
//! # Invariants
//!
//! 1. The root's children are detached before compilation and reattached
//!    afterwards, even when compilation fails.
//! 2. Element attributes are compiled before the element's children. An
//!    element carrying `html` or `text` owns its content: its children are
//!    not compiled, so bound data is never read as a template.
//! 3. Every reactive directive writes its initial value before `mount`
//!    returns; `on` bindings create no watcher.
//! 4. An interpolated text node gets one watcher per marker. Any of them
//!    re-renders the whole string.
//!
//! # Failure Modes
//!
//! | Condition | Result |
//! |-----------|--------|
//! | Unknown directive name | `BindError::UnknownDirective` |
//! | `on` without event | `BindError::MissingEventName` |
//! | Expression not resolvable | `BindError::MissingPath` / `NotAnObject` |
//! | `on` names no method | `BindError::UnknownMethod` from the listener |

use std::rc::Rc;

use fbind_core::{Path, Result};
use fbind_view::{NodeKind, ViewNode, listener};

use crate::binding::BindingSet;
use crate::directive::Directive;
use crate::template::Template;
use crate::updater::Updater;
use crate::vm::ViewModel;

/// Compiles templates against one view model.
pub struct Compiler<'vm, N: ViewNode> {
    vm: &'vm ViewModel<N>,
    bindings: BindingSet,
}

impl<'vm, N: ViewNode> Compiler<'vm, N> {
    #[must_use]
    pub fn new(vm: &'vm ViewModel<N>) -> Self {
        Self {
            vm,
            bindings: BindingSet::new(),
        }
    }

    /// Compile every descendant of `root`.
    pub fn mount(&mut self, root: &N) -> Result<()> {
        let fragment = root.take_children();
        let result = fragment.iter().try_for_each(|child| self.compile(child));
        root.append_children(fragment);
        result
    }

    /// The watchers created so far.
    #[must_use]
    pub fn into_bindings(self) -> BindingSet {
        self.bindings
    }

    fn compile(&mut self, node: &N) -> Result<()> {
        match node.kind() {
            NodeKind::Element => {
                if self.compile_element(node)? {
                    return Ok(());
                }
                for child in node.children() {
                    self.compile(&child)?;
                }
                Ok(())
            }
            NodeKind::Text => self.compile_text(node),
        }
    }

    /// Returns whether a directive took over the element's content.
    fn compile_element(&mut self, node: &N) -> Result<bool> {
        let vm = self.vm;
        let mut owns_content = false;
        for (name, expr) in node.attributes() {
            let Some(directive) = Directive::parse(&name, &vm.config().directive_prefix)? else {
                continue;
            };
            tracing::debug!(%directive, expr = %expr, "binding directive");
            match directive {
                Directive::Model => self.bind_model(node, &expr)?,
                Directive::Html => {
                    self.bind_slot(node, Updater::Html, &expr)?;
                    owns_content = true;
                }
                Directive::Text => {
                    self.bind_slot(node, Updater::Text, &expr)?;
                    owns_content = true;
                }
                Directive::On { event } => self.bind_event(node, &event, &expr),
            }
        }
        Ok(owns_content)
    }

    /// One-way: watcher writes the slot, then the slot is initialized.
    fn bind_slot(&mut self, node: &N, updater: Updater, expr: &str) -> Result<Path> {
        let path = Path::parse(expr)?;
        let target = node.clone();
        let vm = self.vm;
        let watcher = self.bindings.watch(vm.data(), path.clone(), move |value| {
            updater.apply(&target, value);
            Ok(())
        })?;
        updater.apply(node, &watcher.value());
        Ok(path)
    }

    /// Two-way: a value-slot binding plus a listener writing user input back.
    fn bind_model(&mut self, node: &N, expr: &str) -> Result<()> {
        let path = self.bind_slot(node, Updater::Model, expr)?;
        let vm = self.vm;
        let data = vm.data().clone();
        node.add_listener(
            &vm.config().model_event,
            listener(move |event| {
                let typed = event.value().unwrap_or_default();
                tracing::trace!(path = %path, typed, "model input");
                data.assign(&path, typed).map(drop)
            }),
        );
        Ok(())
    }

    fn bind_event(&mut self, node: &N, event: &str, expr: &str) {
        let method = expr.trim().to_owned();
        let vm = self.vm.downgrade();
        node.add_listener(
            event,
            listener(move |_| match ViewModel::upgrade(&vm) {
                Some(vm) => vm.call(&method),
                None => {
                    tracing::trace!(method = %method, "view model dropped; event ignored");
                    Ok(())
                }
            }),
        );
    }

    fn compile_text(&mut self, node: &N) -> Result<()> {
        let Some(template) = Template::parse(&node.text())? else {
            return Ok(());
        };
        let template = Rc::new(template);
        let vm = self.vm;
        let data = vm.data();
        for path in template.paths() {
            let (target, root, template) = (node.clone(), data.clone(), Rc::clone(&template));
            self.bindings.watch(data, path.clone(), move |_| {
                Updater::Text.apply_str(&target, &template.render(&root)?);
                Ok(())
            })?;
        }
        tracing::debug!(source = template.source(), "binding interpolation");
        Updater::Text.apply_str(node, &template.render(data)?);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vm::Options;
    use fbind_core::{BindError, Value};
    use fbind_view::{Node, markup};
    use serde_json::json;

    fn mounted(source: &str, data: serde_json::Value) -> (Node, ViewModel<Node>) {
        let root = markup::parse(source).unwrap();
        let vm = ViewModel::new(Options::from_json(&data).target(root.clone())).unwrap();
        (root, vm)
    }

    #[test]
    fn model_initializes_and_writes_back() {
        let (root, vm) = mounted(
            r#"<div><input v-model="user.name"></div>"#,
            json!({ "user": { "name": "Ann" } }),
        );
        let input = root.find_by_tag("input").remove(0);
        assert_eq!(input.value(), "Ann");

        input.input("Bo").unwrap();
        assert_eq!(vm.eval("user.name").unwrap(), Value::from("Bo"));

        vm.set("user.name", "Cy").unwrap();
        assert_eq!(input.value(), "Cy");
    }

    #[test]
    fn html_and_text_directives() {
        let (root, vm) = mounted(
            r#"<div><p v-html="body"><i>old</i></p><span v-text="title"></span></div>"#,
            json!({ "body": "<b>hi</b>", "title": "a < b" }),
        );
        assert_eq!(
            root.to_markup(),
            r#"<div><p v-html="body"><b>hi</b></p><span v-text="title">a &lt; b</span></div>"#
        );
        vm.set("title", "t2").unwrap();
        assert_eq!(root.find_by_tag("span")[0].text(), "t2");
    }

    #[test]
    fn bound_text_is_not_compiled_as_template() {
        let (root, vm) = mounted(
            r#"<div><span v-text="t">{{x}}</span></div>"#,
            json!({ "t": "{{x}}", "x": "secret" }),
        );
        let span = root.find_by_tag("span").remove(0);
        assert_eq!(span.text(), "{{x}}");
        assert_eq!(vm.binding_count(), 1);

        vm.set("t", "{{missing}}").unwrap();
        assert_eq!(span.text(), "{{missing}}");
    }

    #[test]
    fn unresolvable_marker_in_bound_text_mounts() {
        let (root, _vm) = mounted(r#"<div><span v-text="t"></span></div>"#, json!({ "t": "{{nope}}" }));
        assert_eq!(root.find_by_tag("span")[0].text(), "{{nope}}");
    }

    #[test]
    fn html_binding_skips_its_children() {
        let (root, vm) = mounted(
            r#"<div><p v-html="body">{{gone}}</p></div>"#,
            json!({ "body": "<i>{{x}}</i>" }),
        );
        assert_eq!(vm.binding_count(), 1);
        assert_eq!(root.to_markup(), r#"<div><p v-html="body"><i>{{x}}</i></p></div>"#);
    }

    #[test]
    fn interpolation_rerenders_whole_string() {
        let (root, vm) = mounted(
            "<p>{{a}} and {{b}}</p>",
            json!({ "a": 1, "b": 2 }),
        );
        assert_eq!(root.text(), "1 and 2");
        assert_eq!(vm.binding_count(), 2);
        vm.set("b", 3).unwrap();
        assert_eq!(root.text(), "1 and 3");
    }

    #[test]
    fn plain_text_creates_no_binding() {
        let (root, vm) = mounted("<p>nothing { here }</p>", json!({}));
        assert_eq!(vm.binding_count(), 0);
        assert_eq!(root.text(), "nothing { here }");
    }

    #[test]
    fn on_creates_no_watcher() {
        let (root, vm) = mounted(r#"<div><button v-on:click="go">x</button></div>"#, json!({}));
        assert_eq!(vm.binding_count(), 0);
        assert_eq!(root.find_by_tag("button")[0].listener_count("click"), 1);
    }

    #[test]
    fn children_are_reattached_on_failure() {
        let root = markup::parse(r#"<div><p>a</p><p v-html="missing"></p></div>"#).unwrap();
        let err = ViewModel::new(Options::from_json(&json!({})).target(root.clone())).unwrap_err();
        assert!(matches!(err, BindError::MissingPath { .. }));
        assert_eq!(root.children().len(), 2);
    }

    #[test]
    fn unknown_directive_fails_compile() {
        let root = markup::parse(r#"<div><p v-show="x"></p></div>"#).unwrap();
        let err = ViewModel::new(Options::from_json(&json!({ "x": true })).target(root)).unwrap_err();
        assert!(matches!(err, BindError::UnknownDirective { .. }));
    }
}
