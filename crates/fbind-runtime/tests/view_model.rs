#![forbid(unsafe_code)]

//! Integration tests: compile templates against view models and drive them
//! through simulated user input.

use std::cell::Cell;
use std::io::Write as _;
use std::rc::Rc;

use fbind_core::{BindError, Path, Value};
use fbind_harness::fixtures::{FORM_TEMPLATE, SCHOOL_TEMPLATE, school_data, user_data};
use fbind_harness::{CallLog, outline, strategies, test_logging};
use fbind_runtime::{BindConfig, Options, ViewModel};
use fbind_view::{Document, Event, Node, ViewNode, markup};
use proptest::prelude::*;
use serde_json::json;
use tracing_test::traced_test;

fn form() -> (Document, ViewModel) {
    let doc = Document::parse(FORM_TEMPLATE).unwrap();
    let vm = ViewModel::new(
        Options::from_json(&user_data())
            .target_selector(&doc, "#app")
            .unwrap()
            .method("increment", |vm: &ViewModel| {
                let n = vm.get("count")?.as_f64().unwrap_or(0.0);
                vm.set("count", n + 1.0).map(drop)
            }),
    )
    .unwrap();
    (doc, vm)
}

fn first(doc: &Document, tag: &str) -> Node {
    doc.root().find_by_tag(tag).remove(0)
}

// ============================================================================
// model
// ============================================================================

#[test]
fn model_initializes_from_data() {
    let (doc, _vm) = form();
    assert_eq!(first(&doc, "input").value(), "Ann");
}

#[test]
fn typing_writes_back_to_data() {
    let _log = test_logging();
    let (doc, vm) = form();
    first(&doc, "input").input("Bo").unwrap();
    assert_eq!(vm.eval("user.name").unwrap(), Value::from("Bo"));
    assert_eq!(first(&doc, "p").text(), "Hello Bo!");
}

#[test]
fn custom_model_event() {
    let _log = test_logging();
    let root = markup::parse(r#"<div><input x-model="q"></div>"#).unwrap();
    let config = BindConfig {
        directive_prefix: "x-".into(),
        model_event: "change".into(),
        ..BindConfig::default()
    };
    let vm = ViewModel::new(
        Options::from_json(&json!({ "q": "" }))
            .target(root.clone())
            .config(config),
    )
    .unwrap();
    let input = root.find_by_tag("input").remove(0);

    assert_eq!(input.input("ignored").unwrap(), 0);
    assert_eq!(vm.get("q").unwrap(), Value::from(""));

    input.type_into("change", "kept").unwrap();
    assert_eq!(vm.get("q").unwrap(), Value::from("kept"));
}

// ============================================================================
// interpolation
// ============================================================================

#[test]
fn interpolation_renders_and_updates() {
    let (doc, vm) = form();
    assert_eq!(first(&doc, "p").text(), "Hello Ann!");
    vm.set("user.name", "Bo").unwrap();
    assert_eq!(first(&doc, "p").text(), "Hello Bo!");
}

#[test]
fn school_page_renders() {
    let _log = test_logging();
    let doc = Document::parse(SCHOOL_TEMPLATE).unwrap();
    let vm = ViewModel::new(
        Options::from_json(&school_data())
            .target_selector(&doc, "#app")
            .unwrap()
            .computed("describe", |s| {
                Ok(Value::from(format!("{} is {}", s.get("school.name")?, s.get("school.age")?)))
            })
            .method("change", |vm: &ViewModel| vm.set("school.name", "Hillcrest").map(drop)),
    )
    .unwrap();

    let expected = "\
div id=\"app\"
  input type=\"text\" v-model=\"school.name\" value=\"Riverside\"
  div
    \"Riverside 10\"
  ul
    li
      \"Riverside\"
  p
    \"Riverside is 10\"
  div v-html=\"message\" html=\"<h1>welcome</h1>\"
  button v-on:click=\"change\"
    \"change\"
";
    assert_eq!(outline(doc.root()), expected);

    first(&doc, "button").click().unwrap();
    assert_eq!(first(&doc, "li").text(), "Hillcrest");
    assert_eq!(first(&doc, "input").value(), "Hillcrest");
    // `describe` reads only the computed property, which owns no registry.
    assert_eq!(first(&doc, "p").text(), "Riverside is 10");
    assert_eq!(vm.computed("describe").unwrap(), Value::from("Hillcrest is 10"));
}

#[test]
fn tracked_computed_reads_follow_sources() {
    let _log = test_logging();
    let root = markup::parse("<p>{{full}}</p>").unwrap();
    let config = BindConfig {
        track_computed_reads: true,
        ..BindConfig::default()
    };
    let vm = ViewModel::new(
        Options::from_json(&json!({ "first": "Ann", "last": "Lee" }))
            .target(root.clone())
            .config(config)
            .computed("full", |s| Ok(Value::from(format!("{} {}", s.get("first")?, s.get("last")?)))),
    )
    .unwrap();
    assert_eq!(root.text(), "Ann Lee");
    vm.set("last", "Ray").unwrap();
    assert_eq!(root.text(), "Ann Ray");
}

// ============================================================================
// on
// ============================================================================

#[test]
fn click_calls_method_once_per_click() {
    let _log = test_logging();
    let (doc, vm) = form();
    let button = first(&doc, "button");
    button.click().unwrap();
    button.click().unwrap();
    button.dispatch(&Event::new("mouseover")).unwrap();
    assert_eq!(vm.get("count").unwrap(), Value::from(2));
    assert_eq!(first(&doc, "span").text(), "2");
}

#[test]
fn method_receives_the_view_model() {
    let _log = test_logging();
    let root = markup::parse(r#"<div><button v-on:click="hit">x</button></div>"#).unwrap();
    let log = CallLog::new();
    let l = log.clone();
    let vm = ViewModel::new(
        Options::from_json(&json!({ "who": "vm" }))
            .target(root.clone())
            .method("hit", move |vm: &ViewModel| {
                l.push(vm.get("who")?.to_string());
                Ok(())
            }),
    )
    .unwrap();

    let button = root.find_by_tag("button").remove(0);
    button.click().unwrap();
    button.dispatch(&Event::new("keydown")).unwrap();
    assert_eq!(log.entries(), ["vm"]);
    assert!(vm.method("hit").is_some());
}

#[traced_test]
#[test]
fn unknown_method_fails_at_dispatch() {
    let root = markup::parse(r#"<div><button v-on:click="nope">x</button></div>"#).unwrap();
    let _vm = ViewModel::new(Options::from_json(&json!({})).target(root.clone())).unwrap();

    let err = root.find_by_tag("button")[0].click().unwrap_err();
    assert!(matches!(
        err.leaves()[0],
        BindError::UnknownMethod { name } if name == "nope"
    ));
    assert!(logs_contain("listener failed"));
}

#[test]
fn events_after_drop_are_ignored() {
    let _log = test_logging();
    let root = markup::parse(r#"<div><button v-on:click="go">x</button></div>"#).unwrap();
    let hits = Rc::new(Cell::new(0));
    let h = Rc::clone(&hits);
    let vm = ViewModel::new(
        Options::from_json(&json!({}))
            .target(root.clone())
            .method("go", move |_: &ViewModel| {
                h.set(h.get() + 1);
                Ok(())
            }),
    )
    .unwrap();
    let button = root.find_by_tag("button").remove(0);
    button.click().unwrap();
    drop(vm);
    button.click().unwrap();
    assert_eq!(hits.get(), 1);
}

// ============================================================================
// dependency capture
// ============================================================================

#[test]
fn sequential_expressions_do_not_cross_attach() {
    let (_doc, vm) = form();
    let log = CallLog::new();
    vm.watch("count", log.recorder("count")).unwrap();
    vm.watch("user.name", log.recorder("name")).unwrap();

    vm.set("count", 7).unwrap();
    assert_eq!(log.entries(), ["count=7"]);
    vm.set("user.name", "Di").unwrap();
    assert_eq!(log.entries(), ["count=7", "name=Di"]);
}

#[test]
fn replacing_container_keeps_old_snapshot() {
    let (doc, vm) = form();
    let log = CallLog::new();
    vm.watch("user", log.recorder("user")).unwrap();

    let old_user = vm.get("user").unwrap();
    vm.set("user", Value::from(fbind_core::Object::from_json(&json!({ "name": "Cy" }))))
        .unwrap();
    assert_eq!(log.len(), 1, "subscribers of `user` itself fire");
    // Text and input bindings re-resolve the path, so they see the new object.
    assert_eq!(first(&doc, "p").text(), "Hello Cy!");

    // ...but they stay attached to the old object's `name` cell.
    vm.set("user.name", "Di").unwrap();
    assert_eq!(first(&doc, "p").text(), "Hello Cy!");
    old_user
        .as_object()
        .unwrap()
        .assign(&Path::parse("name").unwrap(), "Ed")
        .unwrap();
    assert_eq!(first(&doc, "p").text(), "Hello Di!");
}

// ============================================================================
// lifecycle & errors
// ============================================================================

#[test]
fn no_target_does_nothing() {
    let vm: ViewModel = ViewModel::new(Options::from_json(&user_data())).unwrap();
    assert!(!vm.is_mounted());
    assert_eq!(vm.binding_count(), 0);
}

#[test]
fn missing_selector_is_an_error() {
    let doc = Document::parse(FORM_TEMPLATE).unwrap();
    let err = Options::from_json(&user_data())
        .target_selector(&doc, "#other")
        .unwrap_err();
    assert_eq!(err.to_string(), "target '#other' matched no node");
}

#[test]
fn compile_errors_surface() {
    let cases = [
        (r#"<div><p v-bind="x"></p></div>"#, "unknown directive 'v-bind'"),
        (r#"<div><p v-on="x"></p></div>"#, "requires an event name"),
        (r#"<div><p>{{ user.age }}</p></div>"#, "no property 'age'"),
        (r#"<div><p v-html="user.name.first"></p></div>"#, "is not an object"),
    ];
    for (source, needle) in cases {
        let root = markup::parse(source).unwrap();
        let err = ViewModel::new(Options::from_json(&user_data()).target(root)).unwrap_err();
        assert!(err.to_string().contains(needle), "{source}: {err}");
    }
}

#[test]
fn config_loads_from_toml_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "directive_prefix = \"data-\"\nmodel_event = \"change\"").unwrap();
    let config = BindConfig::load(file.path()).unwrap();

    let root = markup::parse(r#"<div><input data-model="user.name"></div>"#).unwrap();
    let vm = ViewModel::new(
        Options::from_json(&user_data())
            .target(root.clone())
            .config(config),
    )
    .unwrap();
    assert_eq!(vm.config().model_event, "change");
    assert_eq!(root.find_by_tag("input")[0].value(), "Ann");
}

#[test]
fn bindings_live_as_long_as_the_document() {
    let (doc, vm) = form();
    let data = vm.data().clone();
    drop(vm);

    first(&doc, "input").input("Bo").unwrap();
    let name = Path::parse("user.name").unwrap();
    assert_eq!(data.resolve(&name, None).unwrap(), Value::from("Bo"));
    assert_eq!(first(&doc, "p").text(), "Hello Bo!");

    data.assign(&name, "Cy").unwrap();
    assert_eq!(first(&doc, "input").value(), "Cy");
}

#[test]
fn dropping_document_and_view_model_releases_bindings() {
    let (doc, vm) = form();
    let log = CallLog::new();
    vm.watch("count", log.recorder("count")).unwrap();
    let data = vm.data().clone();

    drop(vm);
    data.set("count", 1).unwrap();
    assert_eq!(log.entries(), ["count=1"]);

    drop(doc);
    data.set("count", 2).unwrap();
    assert_eq!(log.entries(), ["count=1"]);
}

#[test]
fn bound_text_is_rendered_verbatim() {
    let doc = Document::parse(r#"<div id="app"><span v-text="t"></span></div>"#).unwrap();
    let vm = ViewModel::new(
        Options::from_json(&json!({ "t": "{{x}}", "x": "secret" }))
            .target_selector(&doc, "#app")
            .unwrap(),
    )
    .unwrap();
    assert_eq!(first(&doc, "span").text(), "{{x}}");

    vm.set("t", "{{nope}}").unwrap();
    assert_eq!(first(&doc, "span").text(), "{{nope}}");
}

// ============================================================================
// properties
// ============================================================================

proptest! {
    #[test]
    fn text_binding_mirrors_every_write(values in proptest::collection::vec(strategies::scalar(), 1..12)) {
        let root = markup::parse(r#"<div><span v-text="v"></span></div>"#).unwrap();
        let vm = ViewModel::new(Options::from_json(&json!({ "v": null })).target(root.clone())).unwrap();
        let span = root.find_by_tag("span").remove(0);
        for value in values {
            let rendered = value.to_string();
            vm.set("v", value).unwrap();
            prop_assert_eq!(span.text(), rendered);
        }
    }

    #[test]
    fn watcher_fires_only_on_distinct_writes(values in proptest::collection::vec(strategies::scalar(), 1..12)) {
        let vm = ViewModel::new(
            Options::from_json(&json!({ "v": null })).target(Node::element("div")),
        )
        .unwrap();
        let log = CallLog::new();
        vm.watch("v", log.recorder("v")).unwrap();

        let mut previous = Value::Null;
        let mut expected = 0;
        for value in values {
            if value != previous {
                expected += 1;
            }
            previous = value.clone();
            vm.set("v", value).unwrap();
        }
        prop_assert_eq!(log.len(), expected);
    }
}
