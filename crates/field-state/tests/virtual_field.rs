//! A virtual field built on the engine: its name is the canonical form of a
//! path prop, recomputed whenever the path changes.

use std::cell::Cell;
use std::rc::Rc;

use field_state::{
    props_from_json, Capabilities, DirtyMap, Draft, FieldPath, Init, Props, State, StateController,
    StateFactory, StateModel, Strategy,
};
use serde_json::{json, Value};

struct VirtualField;

struct VirtualController {
    pointer_reads: Rc<Cell<usize>>,
}

fn canonical(raw: &Value) -> Option<FieldPath> {
    raw.as_str().and_then(|raw| FieldPath::parse(raw).ok())
}

impl StateController for VirtualController {
    fn compute_state(&mut self, draft: &mut Draft, prev: &State) {
        if draft.get("path") == prev.get("path") {
            return;
        }
        let name = draft
            .get("path")
            .and_then(canonical)
            .map(|path| path.entire())
            .unwrap_or_default();
        draft.set("name", name);
    }

    fn dirty_check(&mut self, dirty: &DirtyMap) -> Option<DirtyMap> {
        dirty
            .contains_key("name")
            .then(|| DirtyMap::from([("path".to_string(), true)]))
    }

    fn publish_state(&self, state: &State) -> Option<State> {
        self.pointer_reads.set(self.pointer_reads.get() + 1);
        let mut published = state.clone();
        let pointer = state.get("path").and_then(canonical).map(|path| path.to_pointer());
        published.insert("pointer".to_string(), pointer.map(Value::from).unwrap_or(Value::Null));
        Some(published)
    }
}

impl StateFactory for VirtualField {
    type Controller = VirtualController;

    const DISPLAY_NAME: Option<&'static str> = Some("VirtualField");

    fn default_state() -> State {
        json!({"path": "", "name": "", "value": null, "props": {}})
            .as_object()
            .cloned()
            .unwrap_or_default()
    }

    fn default_props() -> Props {
        json!({"path": ""}).as_object().cloned().unwrap_or_default()
    }

    fn create(_state: &State, props: &Props) -> Init<VirtualController> {
        let path = props.get("path").cloned().unwrap_or(Value::Null);
        let name = canonical(&path).map(|path| path.entire()).unwrap_or_default();
        Init::new(VirtualController {
            pointer_reads: Rc::new(Cell::new(0)),
        })
        .derive("path", path)
        .derive("name", name)
        .derive("props", Value::Object(props.clone()))
    }
}

fn virtual_field(props: &str, capabilities: Capabilities) -> StateModel<VirtualField> {
    let props = props_from_json(props).expect("props fixture");
    StateModel::with_capabilities(props, capabilities)
}

#[test]
fn construction_derives_canonical_name_from_path() {
    for caps in [Capabilities::default(), Capabilities::without_drafts()] {
        let model = virtual_field(r#"{"path": "contacts[0].email", "x-component": "Input"}"#, caps);
        let state = model.get_state();
        assert_eq!(state["name"], json!("contacts.0.email"));
        assert_eq!(state["path"], json!("contacts[0].email"));
        assert_eq!(state["displayName"], json!("VirtualField"));
        assert_eq!(state["props"]["x-component"], json!("Input"));
        assert!(!model.has_changed(None));
    }
}

#[test]
fn path_change_recomputes_name_in_the_same_write() {
    for caps in [Capabilities::default(), Capabilities::without_drafts()] {
        let model = virtual_field(r#"{"path": "a.b"}"#, caps);
        let names = Rc::new(std::cell::RefCell::new(Vec::new()));
        let sink = names.clone();
        model.subscribe_fn(move |state| sink.borrow_mut().push(state["name"].clone()));

        model.set_state(|s| {
            s.set("path", "items[2]['first name']");
        });

        assert_eq!(*names.borrow(), [json!("items.2.first name")]);
        assert!(model.has_changed(Some("path")));
        assert!(model.has_changed(Some("name")));
    }
}

#[test]
fn value_write_leaves_name_alone() {
    for caps in [Capabilities::default(), Capabilities::without_drafts()] {
        let model = virtual_field(r#"{"path": "a.b"}"#, caps);
        model.set_state(|s| {
            s.set("value", "hello");
        });
        assert_eq!(model.get_changed(), DirtyMap::from([("value".to_string(), true)]));
        assert_eq!(model.get_state()["name"], json!("a.b"));
    }
}

#[test]
fn publish_state_shapes_manual_snapshots_only() {
    let manual = virtual_field(r#"{"path": "a[1]", "useDirty": true}"#, Capabilities::default());
    assert_eq!(manual.strategy(), Strategy::Manual);
    let state = manual.get_state();
    assert_eq!(state["pointer"], json!("/a/1"));
    assert!(!manual.get_source_state(|s| s.contains_key("pointer")));

    manual.set_state(|s| {
        s.set("value", 1);
    });
    assert!(!manual.has_changed(Some("pointer")));
    assert!(!manual.get_source_state(|s| s.contains_key("pointer")));

    let drafted = virtual_field(r#"{"path": "a[1]"}"#, Capabilities::default());
    assert_eq!(drafted.strategy(), Strategy::Draft);
    assert!(!drafted.get_state().contains_key("pointer"));
}

#[test]
fn nested_props_edit_through_paths() {
    for caps in [Capabilities::default(), Capabilities::without_drafts()] {
        let model = virtual_field(r#"{"path": "a", "rules": [{"required": true}]}"#, caps);
        let rule = FieldPath::parse("props.rules[0].required").expect("path");

        model.set_state(|s| {
            let previous = s.set_in(&rule, false).expect("nested write");
            assert_eq!(previous, Some(json!(true)));
        });

        assert_eq!(model.get_changed(), DirtyMap::from([("props".to_string(), true)]));
        assert_eq!(model.get_state()["props"]["rules"], json!([{"required": false}]));
    }
}

#[test]
fn failed_nested_write_is_rolled_back() {
    for caps in [Capabilities::default(), Capabilities::without_drafts()] {
        let model = virtual_field(r#"{"path": "a"}"#, caps);
        let missing = FieldPath::parse("props.rules[0].required").expect("path");

        let result = model.try_set_state(
            |s| {
                s.set("value", 5);
                s.set_in(&missing, true).map(|_| ())
            },
            false,
        );

        assert!(result.is_err());
        assert_eq!(model.get_state()["value"], Value::Null);
        assert!(!model.has_changed(None));
    }
}
