use serde_json::{json, Value};
use std::rc::Rc;
use underpin_core::{
    FieldResolver, FieldValue, Filter, ObjectRegistry, Registry, RegistryObject, Sort,
};

fn posts() -> Registry<Value> {
    let mut registry = Registry::new("posts");
    registry.add("1", json!({"type": "x"})).expect("1");
    registry.add("2", json!({"type": "y"})).expect("2");
    registry.add("3", json!({"type": "x"})).expect("3");
    registry
}

fn keys(registry: &Registry<Value>) -> Vec<String> {
    registry.keys().map(str::to_string).collect()
}

#[test]
fn in_not_in_and_equals_follow_set_semantics() {
    let registry = posts();
    let found = |filter: Filter| {
        keys(
            &registry
                .query()
                .filter(filter)
                .get_results()
                .expect("results"),
        )
    };

    assert_eq!(found(Filter::new().is_in("type", ["x"])), vec!["1", "3"]);
    assert_eq!(found(Filter::new().not_in("type", ["x"])), vec!["2"]);
    assert_eq!(found(Filter::new().equals("type", "y")), vec!["2"]);
}

#[test]
fn clause_keys_parse_into_the_same_filters() {
    let registry = posts();
    let filter = Filter::from_clauses([("type__not_in", vec![FieldValue::from("y")])])
        .expect("parse");
    let results = registry
        .query()
        .filter(filter)
        .get_results()
        .expect("results");
    assert_eq!(keys(&results), vec!["1", "3"]);
}

#[test]
fn sort_by_number_in_both_directions() {
    let mut values = vec![json!({"n": 3}), json!({"n": 1}), json!({"n": 2})];

    Sort::<Value>::new().asc("n").apply(&mut values).expect("asc");
    assert_eq!(values, vec![json!({"n": 1}), json!({"n": 2}), json!({"n": 3})]);

    Sort::<Value>::new().desc("n").apply(&mut values).expect("desc");
    assert_eq!(values, vec![json!({"n": 3}), json!({"n": 2}), json!({"n": 1})]);
}

trait Block: RegistryObject + FieldResolver {}

struct Paragraph {
    words: i64,
}

struct Image {
    width: i64,
}

impl RegistryObject for Paragraph {}
impl RegistryObject for Image {}
impl Block for Paragraph {}
impl Block for Image {}

impl FieldResolver for Paragraph {
    fn resolve_field(&self, field: &str) -> Option<FieldValue> {
        match field {
            "size" => Some(FieldValue::Int(self.words)),
            _ => None,
        }
    }

    fn type_tags(&self) -> Vec<&str> {
        vec!["paragraph", "text"]
    }
}

impl FieldResolver for Image {
    fn resolve_field(&self, field: &str) -> Option<FieldValue> {
        match field {
            "size" => Some(FieldValue::Int(self.width)),
            _ => None,
        }
    }

    fn type_tags(&self) -> Vec<&str> {
        vec!["image", "media"]
    }
}

fn blocks() -> ObjectRegistry<dyn Block> {
    let mut registry: ObjectRegistry<dyn Block> = ObjectRegistry::new("blocks");
    registry
        .add_instance("intro", Rc::new(Paragraph { words: 120 }))
        .expect("intro");
    registry
        .add_instance("hero", Rc::new(Image { width: 1280 }))
        .expect("hero");
    registry
        .add_instance("outro", Rc::new(Paragraph { words: 40 }))
        .expect("outro");
    registry
}

#[test]
fn instanceof_filters_by_type_tags_and_reseeds_typed_registry() {
    let registry = blocks();
    let results = registry
        .query()
        .filter(Filter::new().is_in("instanceof", ["text"]))
        .sort(Sort::new().asc("size"))
        .get_results()
        .expect("results");

    assert_eq!(results.name(), "blocks");
    assert_eq!(results.keys().collect::<Vec<_>>(), vec!["outro", "intro"]);
    assert_eq!(registry.len(), 3);
}

#[test]
fn key_clauses_and_pluck_work_on_typed_registries() {
    let registry = blocks();
    let sizes = registry
        .query()
        .filter(Filter::new().not_in("key", ["hero"]))
        .sort(Sort::new().desc("size"))
        .pluck("size")
        .expect("pluck");
    assert_eq!(sizes, vec![FieldValue::Int(120), FieldValue::Int(40)]);

    let first = registry
        .query()
        .filter(Filter::new().is_in("instanceof", ["media"]))
        .find()
        .expect("image block");
    assert_eq!(first.resolve_field("size"), Some(FieldValue::Int(1280)));
}
