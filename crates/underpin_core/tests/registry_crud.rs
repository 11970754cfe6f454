use serde_json::{json, Value};
use std::cell::RefCell;
use std::rc::Rc;
use underpin_core::{
    CoreError, FeatureExtension, Middleware, ObjectRegistry, ObjectSpec, Registry, RegistryObject,
};

struct Menu {
    slug: String,
    events: Rc<RefCell<Vec<String>>>,
}

impl Middleware for Menu {
    fn run_middleware(&self) {
        self.events.borrow_mut().push(format!("middleware:{}", self.slug));
    }
}

impl FeatureExtension for Menu {
    fn do_actions(&self) {
        self.events.borrow_mut().push(format!("actions:{}", self.slug));
    }
}

impl RegistryObject for Menu {
    fn as_middleware(&self) -> Option<&dyn Middleware> {
        Some(self)
    }

    fn as_feature_extension(&self) -> Option<&dyn FeatureExtension> {
        Some(self)
    }
}

fn menus(events: &Rc<RefCell<Vec<String>>>) -> ObjectRegistry<Menu> {
    let shared = Rc::clone(events);
    ObjectRegistry::new("menus").with_factory("menu", move |args| {
        let slug = args
            .first()
            .and_then(Value::as_str)
            .ok_or_else(|| "menu needs a slug".to_string())?;
        Ok(Rc::new(Menu {
            slug: slug.to_string(),
            events: Rc::clone(&shared),
        }))
    })
}

#[test]
fn add_then_get_returns_the_value() {
    let mut registry = Registry::new("options");
    registry
        .add("site_name", json!("Underpin"))
        .expect("add site_name")
        .add("per_page", json!(10))
        .expect("add per_page");

    assert_eq!(registry.get("site_name").expect("get"), &json!("Underpin"));
    assert_eq!(registry.len(), 2);
}

#[test]
fn duplicate_key_fails_and_leaves_storage_unchanged() {
    let mut registry = Registry::new("options");
    registry.add("theme", json!("dark")).expect("first add");

    let err = registry
        .add("theme", json!("light"))
        .err()
        .expect("duplicate must fail");
    assert!(matches!(err, CoreError::InvalidRegistryItem { .. }));
    assert_eq!(registry.get("theme").expect("get"), &json!("dark"));
    assert_eq!(registry.len(), 1);
}

#[test]
fn lookup_miss_names_key_and_registry() {
    let registry: Registry<Value> = Registry::new("options");
    let err = registry.get("missing").expect_err("miss");
    assert_eq!(
        err,
        CoreError::UnknownRegistryItem {
            registry: "options".to_string(),
            key: "missing".to_string(),
        }
    );
    assert!(!registry.is_registered("missing"));
}

#[test]
fn typed_registry_builds_specs_and_runs_hooks_in_order() {
    let events = Rc::new(RefCell::new(Vec::new()));
    let mut registry = menus(&events);

    let spec = ObjectSpec::from_json(&json!({"class": "menu", "args": ["settings"]}))
        .expect("spec map");
    registry.add("settings", spec).expect("add settings");

    assert_eq!(registry.get("settings").expect("get").slug, "settings");
    assert_eq!(
        *events.borrow(),
        vec!["middleware:settings", "actions:settings"]
    );
}

#[test]
fn typed_registry_rejects_unbuildable_specs() {
    let events = Rc::new(RefCell::new(Vec::new()));
    let mut registry = menus(&events);

    let err = registry
        .add("broken", ObjectSpec::spec("menu", vec![]))
        .err()
        .expect("missing slug must fail");
    assert!(matches!(err, CoreError::InvalidRegistryItem { .. }));
    assert!(registry.is_empty());
    assert!(events.borrow().is_empty());
}

#[test]
fn seeded_registries_are_independent_copies() {
    let mut registry = Registry::new("options");
    registry.add("a", json!(1)).expect("a");
    registry.add("b", json!(2)).expect("b");

    let mut copy = registry
        .seed(vec![("a".to_string(), json!(1))])
        .expect("seed");
    copy.add("c", json!(3)).expect("add to copy");

    assert_eq!(copy.name(), "options");
    assert!(!registry.is_registered("c"));
    assert_eq!(registry.len(), 2);
}
