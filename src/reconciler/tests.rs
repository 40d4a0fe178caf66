use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::json;

use super::{RenderMode, Vdom};
use crate::component::{Capabilities, Component, Context, Props, State};
use crate::config::Config;
use crate::document::memory::{MemoryDocument, Mutation, NodeId};
use crate::document::{Document, MARKER_ATTRIBUTE};
use crate::error::{ComponentError, Error};
use crate::scheduler::Updater;
use crate::vnode::{attr, h, text, NodeKind, VNode, Value};

type Log = Arc<Mutex<Vec<String>>>;

/// Route `tracing` output to the test harness; `RUST_LOG` selects levels.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn setup() -> (Vdom<MemoryDocument>, NodeId) {
    init_tracing();
    let mut document = MemoryDocument::new();
    let root = document.create_root("body");
    (Vdom::new(document), root)
}

fn state(key: &str, value: Value) -> State {
    let mut state = State::new();
    state.insert(key.to_string(), value);
    state
}

fn count(vdom: &Vdom<MemoryDocument>, pred: impl Fn(&Mutation) -> bool) -> usize {
    vdom.document().mutations().iter().filter(|m| pred(m)).count()
}

// =============================================================================
// Test components
// =============================================================================

/// Renders `<span>{n}</span>` and records lifecycle events.
struct Counter {
    name: &'static str,
    log: Log,
    frozen: bool,
}

impl Component for Counter {
    fn render(&self, _: &Context, _: &Props, state: &State) -> VNode {
        let n = state.get("n").and_then(Value::as_i64).unwrap_or(0);
        h("span", [], [text(n.to_string())])
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::INIT_STATE
            | Capabilities::DID_MOUNT
            | Capabilities::WILL_UNMOUNT
            | Capabilities::DID_UPDATE
            | Capabilities::SHOULD_UPDATE
    }

    fn init_state(&mut self, props: &Props) -> State {
        state("n", props.get("start").cloned().unwrap_or(json!(0)))
    }

    fn did_mount(&mut self, _: &Updater) {
        self.log.lock().push(format!("mount:{}", self.name));
    }

    fn will_unmount(&mut self) {
        self.log.lock().push(format!("unmount:{}", self.name));
    }

    fn did_update(&mut self, _: &Props, _: &State) {
        self.log.lock().push(format!("update:{}", self.name));
    }

    fn should_update(&mut self, _: &Context, _: &Props, _: &State) -> bool {
        !self.frozen
    }
}

fn register_counter(vdom: &mut Vdom<MemoryDocument>, tag: &'static str, log: &Log, frozen: bool) {
    let log = log.clone();
    vdom.register(tag, move || {
        Ok(Box::new(Counter {
            name: tag,
            log: log.clone(),
            frozen,
        }) as Box<dyn Component>)
    })
    .unwrap();
}

/// Renders `<span>{text}</span>`.
#[derive(Default)]
struct Label;

impl Component for Label {
    fn render(&self, _: &Context, props: &Props, _: &State) -> VNode {
        h("span", [], [text(props.get_str("text").unwrap_or_default())])
    }
}

/// Renders a `greeting` component node: a higher-order chain of two.
#[derive(Default)]
struct Wrapper;

impl Component for Wrapper {
    fn render(&self, _: &Context, props: &Props, _: &State) -> VNode {
        let label = props.get_str("text").unwrap_or_default();
        h("greeting", [attr("text", label)], [])
    }
}

/// A `div` holding one `leaf` counter.
struct Parent {
    log: Log,
}

impl Component for Parent {
    fn render(&self, _: &Context, _: &Props, _: &State) -> VNode {
        h("div", [], [h("leaf", [], [])])
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::DID_MOUNT | Capabilities::DID_UPDATE
    }

    fn did_mount(&mut self, _: &Updater) {
        self.log.lock().push("mount:parent".into());
    }

    fn did_update(&mut self, _: &Props, _: &State) {
        self.log.lock().push("update:parent".into());
    }
}

// =============================================================================
// Plain trees
// =============================================================================

#[test]
fn test_render_plain_tree() {
    let (mut vdom, root) = setup();
    let tree = h(
        "ul",
        [attr("class", "list")],
        [h("li", [], [text("one")]), h("li", [], [text("two")])],
    );
    let node = vdom.render(&tree, &root, None).unwrap();

    assert_eq!(vdom.document().children(root), vec![node]);
    assert_eq!(
        vdom.document().to_html(node),
        "<ul class=\"list\"><li>one</li><li>two</li></ul>"
    );
}

#[test]
fn test_second_render_is_idempotent() {
    let (mut vdom, root) = setup();
    let tree = h(
        "div",
        [attr("id", "app")],
        [
            h("p", [], [text("hello")]),
            h("ul", [], [h("li", [], [text("a")]), h("li", [], [text("b")])]),
        ],
    );
    let node = vdom.render(&tree, &root, None).unwrap();
    vdom.document_mut().clear_mutations();

    let again = vdom.render(&tree, &root, Some(node)).unwrap();
    assert_eq!(again, node);
    assert!(vdom.document().structural_mutations().is_empty());
}

#[test]
fn test_adjacent_text_merged() {
    let (mut vdom, root) = setup();
    let tree = h("p", [], [text("a"), text("b"), h("b", [], [])]);
    let node = vdom.render(&tree, &root, None).unwrap();

    assert_eq!(vdom.document().children(node).len(), 2);
    assert_eq!(vdom.document().to_html(node), "<p>ab<b></b></p>");
}

#[test]
fn test_text_updated_in_place() {
    let (mut vdom, root) = setup();
    let node = vdom
        .render(&h("p", [], [text("before")]), &root, None)
        .unwrap();
    let text_node = vdom.document().children(node)[0];
    vdom.document_mut().clear_mutations();

    vdom.render(&h("p", [], [text("after")]), &root, Some(node))
        .unwrap();

    assert_eq!(vdom.document().children(node), vec![text_node]);
    assert_eq!(
        vdom.document().structural_mutations(),
        vec![&Mutation::SetText {
            node: text_node,
            text: "after".into(),
        }]
    );
}

#[test]
fn test_changed_tag_replaces_element() {
    let (mut vdom, root) = setup();
    let node = vdom
        .render(&h("section", [], [h("span", [], [text("x")])]), &root, None)
        .unwrap();
    let span = vdom.document().children(node)[0];

    vdom.render(&h("section", [], [h("em", [], [text("x")])]), &root, Some(node))
        .unwrap();

    let children = vdom.document().children(node);
    assert_eq!(children.len(), 1);
    assert_ne!(children[0], span);
    assert_eq!(vdom.document().parent(&span), None);
    assert_eq!(vdom.document().to_html(node), "<section><em>x</em></section>");
}

// =============================================================================
// List reconciliation
// =============================================================================

fn keyed_list(order: &[(&str, &str)]) -> VNode {
    h(
        "ul",
        [],
        order
            .iter()
            .map(|(key, label)| h("li", [attr("key", *key)], [text(*label)])),
    )
}

#[test]
fn test_keyed_reorder_reuses_nodes() {
    let (mut vdom, root) = setup();
    let list = vdom
        .render(&keyed_list(&[("1", "A"), ("2", "B"), ("3", "C")]), &root, None)
        .unwrap();
    let before = vdom.document().children(list);
    vdom.document_mut().clear_mutations();

    vdom.render(
        &keyed_list(&[("3", "C"), ("1", "A"), ("2", "B")]),
        &root,
        Some(list),
    )
    .unwrap();

    let after = vdom.document().children(list);
    assert_eq!(after, vec![before[2], before[0], before[1]]);
    assert_eq!(
        count(&vdom, |m| matches!(
            m,
            Mutation::CreateElement { .. } | Mutation::CreateText { .. }
        )),
        0
    );
    assert_eq!(count(&vdom, |m| matches!(m, Mutation::InsertBefore { .. })), 1);
}

#[test]
fn test_keyed_swap_of_two() {
    let (mut vdom, root) = setup();
    let list = vdom
        .render(&keyed_list(&[("1", "A"), ("2", "B")]), &root, None)
        .unwrap();
    let before = vdom.document().children(list);

    vdom.render(&keyed_list(&[("2", "B"), ("1", "A")]), &root, Some(list))
        .unwrap();

    assert_eq!(vdom.document().children(list), vec![before[1], before[0]]);
    assert!(vdom.document().inner_html(list).ends_with("A</li>"));
}

#[test]
fn test_unkeyed_append() {
    let (mut vdom, root) = setup();
    let list = vdom
        .render(&h("ul", [], [h("li", [], [])]), &root, None)
        .unwrap();
    let first = vdom.document().children(list)[0];
    vdom.document_mut().clear_mutations();

    vdom.render(
        &h("ul", [], [h("li", [], []), h("li", [], [])]),
        &root,
        Some(list),
    )
    .unwrap();

    let children = vdom.document().children(list);
    assert_eq!(children.len(), 2);
    assert_eq!(children[0], first);
    assert_eq!(count(&vdom, |m| matches!(m, Mutation::CreateElement { .. })), 1);
    assert_eq!(count(&vdom, |m| matches!(m, Mutation::Remove { .. })), 0);
}

#[test]
fn test_unkeyed_shrink_removes_tail() {
    let (mut vdom, root) = setup();
    let list = vdom
        .render(
            &h("ul", [], [h("li", [], [text("a")]), h("li", [], [text("b")])]),
            &root,
            None,
        )
        .unwrap();
    let first = vdom.document().children(list)[0];

    vdom.render(&h("ul", [], [h("li", [], [text("a")])]), &root, Some(list))
        .unwrap();

    assert_eq!(vdom.document().children(list), vec![first]);
}

#[test]
fn test_stale_keyed_component_unmounted() {
    let (mut vdom, root) = setup();
    let log = Log::default();
    register_counter(&mut vdom, "item", &log, false);

    let first = h(
        "ul",
        [],
        [
            h("item", [attr("key", 1)], []),
            h("item", [attr("key", 2), attr("start", 2)], []),
        ],
    );
    let list = vdom.render(&first, &root, None).unwrap();
    let stale = vdom.document().children(list)[1];
    assert_eq!(vdom.component_count(), 2);

    vdom.render(&h("ul", [], [h("item", [attr("key", 1)], [])]), &root, Some(list))
        .unwrap();

    assert_eq!(vdom.component_count(), 1);
    assert_eq!(vdom.document().children(list).len(), 1);
    assert_eq!(vdom.document().parent(&stale), None);
    assert_eq!(vdom.component_at(&stale), None);
    assert_eq!(
        log.lock().as_slice(),
        ["mount:item", "mount:item", "update:item", "unmount:item"]
    );
}

// =============================================================================
// Namespaces and errors
// =============================================================================

#[test]
fn test_svg_mode_propagation() {
    let (mut vdom, root) = setup();
    let tree = h(
        "div",
        [],
        [h(
            "svg",
            [],
            [
                h("circle", [attr("r", 5)], []),
                h("foreignObject", [], [h("p", [attr("class", "inner")], [])]),
                h("rect", [], []),
            ],
        )],
    );
    let div = vdom.render(&tree, &root, None).unwrap();
    let doc = vdom.document();
    let svg = doc.children(div)[0];
    let children = doc.children(svg);
    let [circle, foreign, rect] = children[..] else {
        panic!("expected three svg children");
    };
    let p = doc.children(foreign)[0];

    assert!(!doc.is_svg(&div));
    assert!(doc.is_svg(&svg));
    assert!(doc.is_svg(&circle));
    assert!(!doc.is_svg(&p));
    assert!(doc.is_svg(&rect));

    let accessor_svg = |target: NodeId| {
        doc.mutations().iter().find_map(|m| match m {
            Mutation::SetAccessor { node, svg, .. } if *node == target => Some(*svg),
            _ => None,
        })
    };
    assert_eq!(accessor_svg(circle), Some(true));
    assert_eq!(accessor_svg(p), Some(false));
}

#[test]
fn test_svg_container_starts_in_svg_mode() {
    let mut document = MemoryDocument::new();
    let root = document.create_root("svg");
    let mut vdom = Vdom::new(document);

    let g = vdom.render(&h("g", [], []), &root, None).unwrap();
    assert!(vdom.document().is_svg(&g));
}

#[test]
fn test_unsupported_node_aborts() {
    let (mut vdom, root) = setup();
    let tree = h("div", [], [VNode::Comment("note".into())]);
    let err = vdom.render(&tree, &root, None).unwrap_err();
    assert!(matches!(
        err,
        Error::UnsupportedNode {
            kind: NodeKind::Comment
        }
    ));
}

#[test]
fn test_unknown_component_in_strict_mode() {
    let (mut vdom, root) = setup();
    let err = vdom.render(&h("Widget", [], []), &root, None).unwrap_err();
    assert!(matches!(err, Error::UnknownComponent { ref tag } if tag == "Widget"));

    // Custom elements are host elements
    assert!(vdom.render(&h("x-widget", [], []), &root, None).is_ok());
}

#[test]
fn test_unknown_tag_allowed_when_not_strict() {
    let mut document = MemoryDocument::new();
    let root = document.create_root("body");
    let config = Config {
        strict_tags: false,
        ..Config::default()
    };
    let mut vdom = Vdom::with_config(document, config);

    let node = vdom.render(&h("widget", [], []), &root, None).unwrap();
    assert_eq!(vdom.document().to_html(node), "<widget></widget>");
}

#[test]
fn test_construction_failure_leaves_slot_untouched() {
    let (mut vdom, root) = setup();
    let log = Log::default();
    register_counter(&mut vdom, "counter", &log, false);
    vdom.register("broken", || Err(ComponentError::new("boom")))
        .unwrap();

    let node = vdom
        .render(&h("div", [], [h("counter", [], [])]), &root, None)
        .unwrap();
    let html = vdom.document().to_html(node);
    vdom.document_mut().clear_mutations();

    let err = vdom
        .render(&h("div", [], [h("broken", [], [])]), &root, Some(node))
        .unwrap_err();

    assert!(matches!(err, Error::Construction { ref tag, .. } if tag == "broken"));
    assert_eq!(vdom.document().to_html(node), html);
    assert!(vdom.document().structural_mutations().is_empty());
    assert_eq!(vdom.component_count(), 1);
    assert_eq!(log.lock().as_slice(), ["mount:counter"]);
}

// =============================================================================
// Components
// =============================================================================

#[test]
fn test_component_replaced_by_other_component() {
    let (mut vdom, root) = setup();
    let log = Log::default();
    register_counter(&mut vdom, "counter", &log, false);
    vdom.register_default::<Label>("greeting").unwrap();

    let node = vdom
        .render(&h("div", [], [h("counter", [], [])]), &root, None)
        .unwrap();
    vdom.render(
        &h("div", [], [h("greeting", [attr("text", "hi")], [])]),
        &root,
        Some(node),
    )
    .unwrap();

    assert_eq!(vdom.document().to_html(node), "<div><span>hi</span></div>");
    assert_eq!(vdom.component_count(), 1);
    assert_eq!(log.lock().as_slice(), ["mount:counter", "unmount:counter"]);
}

#[test]
fn test_set_state_then_rerender() {
    let (mut vdom, root) = setup();
    let log = Log::default();
    register_counter(&mut vdom, "counter", &log, false);

    let span = vdom.render(&h("counter", [], []), &root, None).unwrap();
    let id = vdom.component_at(&span).unwrap();

    let ran = Arc::new(AtomicBool::new(false));
    let flag = ran.clone();
    vdom.set_state(
        id,
        state("n", json!(5)),
        Some(Box::new(move || flag.store(true, Ordering::SeqCst))),
    )
    .unwrap();
    assert!(vdom.component(id).unwrap().is_dirty());
    assert_eq!(vdom.queue().len(), 1);

    let report = vdom.rerender();
    assert_eq!(report.rendered, 1);
    assert!(report.errors.is_empty());
    assert!(ran.load(Ordering::SeqCst));
    assert!(!vdom.component(id).unwrap().is_dirty());
    assert_eq!(vdom.document().to_html(span), "<span>5</span>");
    assert_eq!(log.lock().as_slice(), ["mount:counter", "update:counter"]);
}

#[test]
fn test_updater_patches_merge_at_drain() {
    let (mut vdom, root) = setup();
    let log = Log::default();
    register_counter(&mut vdom, "counter", &log, false);

    let span = vdom
        .render(&h("counter", [attr("start", 1)], []), &root, None)
        .unwrap();
    let id = vdom.component_at(&span).unwrap();
    let updater = vdom.updater(id).unwrap();

    updater.set_state(state("n", json!(2)));
    updater.set_state(state("other", json!(true)));
    // Nothing applies until the drain
    assert_eq!(vdom.component(id).unwrap().state().get("n"), Some(&json!(1)));

    let report = vdom.rerender();
    assert_eq!(report.rendered, 1);
    assert_eq!(report.skipped, 1);

    let core = vdom.component(id).unwrap();
    assert_eq!(core.state().get("n"), Some(&json!(2)));
    assert_eq!(core.state().get("other"), Some(&json!(true)));
    assert_eq!(vdom.document().to_html(span), "<span>2</span>");
}

#[test]
fn test_should_update_false_still_commits_state() {
    let (mut vdom, root) = setup();
    let log = Log::default();
    register_counter(&mut vdom, "frozen", &log, true);

    let span = vdom.render(&h("frozen", [], []), &root, None).unwrap();
    let id = vdom.component_at(&span).unwrap();

    vdom.set_state(id, state("n", json!(9)), None).unwrap();
    let report = vdom.rerender();

    assert_eq!(report.rendered, 1);
    assert_eq!(vdom.document().to_html(span), "<span>0</span>");
    assert_eq!(vdom.component(id).unwrap().state().get("n"), Some(&json!(9)));
    assert_eq!(log.lock().as_slice(), ["mount:frozen"]);

    vdom.force_update(id).unwrap();
    assert_eq!(vdom.document().to_html(span), "<span>9</span>");
    assert_eq!(log.lock().as_slice(), ["mount:frozen", "update:frozen"]);
}

#[test]
fn test_did_mount_children_first_and_once() {
    let (mut vdom, root) = setup();
    let log = Log::default();
    register_counter(&mut vdom, "leaf", &log, false);
    let parent_log = log.clone();
    vdom.register("parent", move || {
        Ok(Box::new(Parent {
            log: parent_log.clone(),
        }) as Box<dyn Component>)
    })
    .unwrap();

    let div = vdom.render(&h("parent", [], []), &root, None).unwrap();
    assert_eq!(log.lock().as_slice(), ["mount:leaf", "mount:parent"]);

    let id = vdom.component_at(&div).unwrap();
    vdom.force_update(id).unwrap();
    assert_eq!(
        log.lock().as_slice(),
        ["mount:leaf", "mount:parent", "update:leaf", "update:parent"]
    );
    assert!(vdom.component(id).unwrap().is_mounted());
}

#[test]
fn test_higher_order_child_reused() {
    let (mut vdom, root) = setup();
    vdom.register_default::<Wrapper>("wrapper").unwrap();
    vdom.register_default::<Label>("greeting").unwrap();

    let span = vdom
        .render(&h("wrapper", [attr("text", "a")], []), &root, None)
        .unwrap();
    let outer = vdom.component_at(&span).unwrap();
    let inner = vdom.component(outer).unwrap().child_component().unwrap();
    assert_eq!(vdom.component(outer).unwrap().constructor(), "wrapper");
    assert_eq!(vdom.component(inner).unwrap().parent_component(), Some(outer));
    assert_eq!(vdom.component(inner).unwrap().base(), Some(&span));
    vdom.document_mut().clear_mutations();

    let again = vdom
        .render(&h("wrapper", [attr("text", "b")], []), &root, Some(span))
        .unwrap();

    assert_eq!(again, span);
    assert_eq!(vdom.component(outer).unwrap().child_component(), Some(inner));
    assert_eq!(vdom.component_count(), 2);
    assert_eq!(vdom.component_at(&span), Some(outer));
    assert_eq!(vdom.document().to_html(span), "<span>b</span>");
    assert_eq!(count(&vdom, |m| matches!(m, Mutation::CreateElement { .. })), 0);
}

#[test]
fn test_set_props_renders_with_new_props() {
    let (mut vdom, root) = setup();
    vdom.register_default::<Label>("greeting").unwrap();

    let span = vdom
        .render(&h("greeting", [attr("text", "one")], []), &root, None)
        .unwrap();
    let id = vdom.component_at(&span).unwrap();

    vdom.set_props(id, Props::new().with("text", "two")).unwrap();
    assert_eq!(vdom.document().to_html(span), "<span>two</span>");
    assert!(vdom.component(id).unwrap().prev_props().is_none());
}

#[test]
fn test_async_props_enqueue_when_not_sync() {
    let mut document = MemoryDocument::new();
    let root = document.create_root("body");
    let config = Config {
        sync_component_updates: false,
        ..Config::default()
    };
    let mut vdom = Vdom::with_config(document, config);
    vdom.register_default::<Label>("greeting").unwrap();

    let span = vdom
        .render(&h("greeting", [attr("text", "one")], []), &root, None)
        .unwrap();
    let id = vdom.component_at(&span).unwrap();

    vdom.set_props(id, Props::new().with("text", "two")).unwrap();
    assert_eq!(vdom.document().to_html(span), "<span>one</span>");
    assert_eq!(vdom.queue().last(), Some(id));

    vdom.rerender();
    assert_eq!(vdom.document().to_html(span), "<span>two</span>");
}

#[test]
fn test_stale_updates_after_unmount() {
    let (mut vdom, root) = setup();
    let log = Log::default();
    register_counter(&mut vdom, "counter", &log, false);

    let span = vdom.render(&h("counter", [], []), &root, None).unwrap();
    let id = vdom.component_at(&span).unwrap();
    let updater = vdom.updater(id).unwrap();

    vdom.unmount(&span);
    assert_eq!(vdom.component_count(), 0);
    assert_eq!(vdom.document().parent(&span), None);
    assert_eq!(log.lock().as_slice(), ["mount:counter", "unmount:counter"]);

    updater.set_state(state("n", json!(1)));
    let report = vdom.rerender();
    assert_eq!(report.rendered, 0);
    assert_eq!(report.skipped, 1);

    assert!(matches!(
        vdom.set_state(id, State::new(), None),
        Err(Error::StaleComponent(stale)) if stale == id
    ));
    assert!(matches!(vdom.force_update(id), Err(Error::StaleComponent(_))));
    assert!(vdom.updater(id).is_none());
}

#[test]
fn test_render_mode_default_is_sync() {
    assert_eq!(RenderMode::default(), RenderMode::Sync);
}

// =============================================================================
// Context, default props and derived state
// =============================================================================

#[derive(Default)]
struct Provider;

impl Component for Provider {
    fn render(&self, _: &Context, _: &Props, _: &State) -> VNode {
        h("div", [], [h("consumer", [], [])])
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::WITH_CONTEXT
    }

    fn with_context(&self, context: &Context) -> Context {
        context.clone().with("theme", "dark")
    }
}

#[derive(Default)]
struct Consumer;

impl Component for Consumer {
    fn render(&self, context: &Context, _: &Props, _: &State) -> VNode {
        let theme = context.get("theme").and_then(Value::as_str).unwrap_or("none");
        h("span", [], [text(theme)])
    }
}

/// Default label, upper-cased on update, with its length derived into state.
#[derive(Default)]
struct Badge;

impl Component for Badge {
    fn render(&self, _: &Context, props: &Props, state: &State) -> VNode {
        let label = props.get_str("label").unwrap_or_default();
        let len = state.get("len").and_then(Value::as_u64).unwrap_or(0);
        h("span", [], [text(format!("{label}:{len}"))])
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::INIT_PROPS | Capabilities::DERIVE_STATE | Capabilities::WILL_UPDATE
    }

    fn init_props(&self) -> Props {
        Props::new().with("label", "new")
    }

    fn derive_state(&self, props: &Props, state: &State) -> State {
        let mut next = state.clone();
        let len = props.get_str("label").map_or(0, str::len);
        next.insert("len".into(), json!(len));
        next
    }

    fn will_update(&mut self, _: &Context, next_props: &Props, _: &State) -> Option<Props> {
        let label = next_props.get_str("label")?;
        Some(Props::new().with("label", label.to_uppercase()))
    }
}

#[test]
fn test_context_flows_to_descendants() {
    let (mut vdom, root) = setup();
    vdom.register_default::<Provider>("provider").unwrap();
    vdom.register_default::<Consumer>("consumer").unwrap();

    let div = vdom.render(&h("provider", [], []), &root, None).unwrap();
    assert_eq!(vdom.document().to_html(div), "<div><span>dark</span></div>");

    let span = vdom.document().children(div)[0];
    let consumer = vdom.component_at(&span).unwrap();
    assert_eq!(
        vdom.component(consumer).unwrap().context().get("theme"),
        Some(&json!("dark"))
    );
}

#[test]
fn test_default_props_derived_state_and_overrides() {
    let (mut vdom, root) = setup();
    vdom.register_default::<Badge>("badge").unwrap();

    let span = vdom.render(&h("badge", [], []), &root, None).unwrap();
    assert_eq!(vdom.document().to_html(span), "<span>new:3</span>");

    vdom.render(&h("badge", [attr("label", "hello")], []), &root, Some(span))
        .unwrap();
    assert_eq!(vdom.document().to_html(span), "<span>HELLO:5</span>");

    let id = vdom.component_at(&span).unwrap();
    assert_eq!(vdom.component(id).unwrap().props().get_str("label"), Some("HELLO"));
}

#[test]
fn test_duplicate_existing_keys_do_not_leak() {
    let (mut vdom, root) = setup();
    let list = vdom
        .render(&keyed_list(&[("1", "A"), ("1", "B")]), &root, None)
        .unwrap();
    let first = vdom.document().children(list)[0];

    vdom.render(&keyed_list(&[("1", "A")]), &root, Some(list))
        .unwrap();

    assert_eq!(vdom.document().children(list), vec![first]);
}

#[test]
fn test_removed_keyed_nodes_leave_no_cached_attributes() {
    let (mut vdom, root) = setup();
    let list = vdom
        .render(&keyed_list(&[("1", "A"), ("2", "B"), ("3", "C")]), &root, None)
        .unwrap();
    let removed = vdom.document().children(list)[0];

    // The leading node is detached to let its sibling slide into place
    vdom.render(&keyed_list(&[("2", "B"), ("3", "C")]), &root, Some(list))
        .unwrap();

    assert_eq!(vdom.document().parent(&removed), None);
    assert!(!vdom.attr_cache.contains_key(&removed));
    // ul + two li
    assert_eq!(vdom.attr_cache.len(), 3);
}

#[test]
fn test_whitespace_text_rerender_is_idempotent() {
    let (mut vdom, root) = setup();
    let tree = h("div", [], [h("b", [], []), text(" "), h("i", [], [])]);
    let node = vdom.render(&tree, &root, None).unwrap();
    let children = vdom.document().children(node);
    vdom.document_mut().clear_mutations();

    for _ in 0..3 {
        vdom.render(&tree, &root, Some(node)).unwrap();
    }

    assert_eq!(vdom.document().children(node), children);
    assert!(vdom.document().structural_mutations().is_empty());
}

// =============================================================================
// Hydration
// =============================================================================

/// Append a pre-rendered element carrying the ownership marker.
fn marked_element(doc: &mut MemoryDocument, parent: &NodeId, tag: &str) -> NodeId {
    let node = doc.create_element(tag, false);
    doc.set(&node, MARKER_ATTRIBUTE, Some(Value::Bool(true)));
    doc.append_child(parent, &node);
    node
}

fn created(vdom: &Vdom<MemoryDocument>) -> usize {
    count(vdom, |m| {
        matches!(m, Mutation::CreateElement { .. } | Mutation::CreateText { .. })
    })
}

#[test]
fn test_hydration_adopts_marked_nodes_and_drops_whitespace() {
    let (mut vdom, root) = setup();
    let doc = vdom.document_mut();
    let div = marked_element(doc, &root, "div");
    let b = marked_element(doc, &div, "b");
    let space = doc.create_text_node("\n  ");
    doc.append_child(&div, &space);
    let i = marked_element(doc, &div, "i");
    doc.clear_mutations();

    let tree = h("div", [], [h("b", [], []), h("i", [], [])]);
    let out = vdom.render(&tree, &root, Some(div)).unwrap();

    assert_eq!(out, div);
    assert_eq!(vdom.document().children(div), vec![b, i]);
    assert_eq!(vdom.document().parent(&space), None);
    assert_eq!(created(&vdom), 0);

    // Adopted nodes are diffed as this instance's own output from now on
    vdom.document_mut().clear_mutations();
    vdom.render(&tree, &root, Some(div)).unwrap();
    assert!(vdom.document().structural_mutations().is_empty());
}

#[test]
fn test_hydration_reuses_text_content() {
    let (mut vdom, root) = setup();
    let doc = vdom.document_mut();
    let p = marked_element(doc, &root, "p");
    let hello = doc.create_text_node("hello");
    doc.append_child(&p, &hello);
    doc.clear_mutations();

    vdom.render(&h("p", [], [text("hello")]), &root, Some(p))
        .unwrap();
    assert_eq!(vdom.document().children(p), vec![hello]);
    assert_eq!(created(&vdom), 0);

    // Single text child of an adopted element is patched in place
    vdom.document_mut().clear_mutations();
    vdom.render(&h("p", [], [text("bye")]), &root, Some(p))
        .unwrap();
    assert_eq!(
        vdom.document().structural_mutations(),
        vec![&Mutation::SetText {
            node: hello,
            text: "bye".into(),
        }]
    );
}

#[test]
fn test_unmarked_whitespace_text_is_a_candidate() {
    let (mut vdom, root) = setup();
    let doc = vdom.document_mut();
    let div = doc.create_element("div", false);
    doc.append_child(&root, &div);
    let space = doc.create_text_node(" ");
    doc.append_child(&div, &space);
    let b = doc.create_element("b", false);
    doc.append_child(&div, &b);
    doc.clear_mutations();

    vdom.render(&h("div", [], [text("x"), h("b", [], [])]), &root, Some(div))
        .unwrap();

    assert_eq!(vdom.document().children(div), vec![space, b]);
    assert_eq!(vdom.document().to_html(div), "<div>x<b></b></div>");
    assert_eq!(created(&vdom), 0);
}

// =============================================================================
// Pending updater patches
// =============================================================================

#[test]
fn test_updater_patch_consumed_by_earlier_render() {
    let (mut vdom, root) = setup();
    let log = Log::default();
    register_counter(&mut vdom, "counter", &log, false);

    let tree = h("div", [], [h("counter", [attr("start", 1)], [])]);
    let div = vdom.render(&tree, &root, None).unwrap();
    let span = vdom.document().children(div)[0];
    let id = vdom.component_at(&span).unwrap();
    let updater = vdom.updater(id).unwrap();

    let ran = Arc::new(AtomicBool::new(false));
    let flag = ran.clone();
    updater.set_state_then(state("n", json!(9)), move || {
        flag.store(true, Ordering::SeqCst)
    });

    // Parent re-renders before the queue drains
    vdom.render(&tree, &root, Some(div)).unwrap();
    assert_eq!(vdom.document().to_html(span), "<span>9</span>");
    assert!(ran.load(Ordering::SeqCst));
    assert!(!vdom.component(id).unwrap().is_dirty());

    let report = vdom.rerender();
    assert_eq!(report.rendered, 0);
    assert_eq!(report.skipped, 1);
    assert_eq!(vdom.document().to_html(span), "<span>9</span>");
}

#[test]
fn test_updater_patch_applies_before_direct_set_state() {
    let (mut vdom, root) = setup();
    let log = Log::default();
    register_counter(&mut vdom, "counter", &log, false);

    let span = vdom.render(&h("counter", [], []), &root, None).unwrap();
    let id = vdom.component_at(&span).unwrap();

    vdom.updater(id).unwrap().set_state(state("n", json!(1)));
    vdom.set_state(id, state("n", json!(2)), None).unwrap();
    vdom.rerender();

    assert_eq!(vdom.component(id).unwrap().state().get("n"), Some(&json!(2)));
    assert_eq!(vdom.document().to_html(span), "<span>2</span>");
}
