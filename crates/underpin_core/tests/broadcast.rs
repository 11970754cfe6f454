use std::cell::RefCell;
use std::rc::Rc;
use underpin_core::{
    Accumulator, CallbackObserver, CoreResult, DependentItem, FeatureExtension, Identifiable,
    ItemDependencies, ItemId, LogItem, Logger, LoggerConfig, Middleware, Observer,
    RegistryObject, Subject,
};

type Trail = Rc<RefCell<Vec<String>>>;

fn recorder(id: &str, trail: &Trail) -> CallbackObserver<String> {
    let (label, trail) = (id.to_string(), Rc::clone(trail));
    CallbackObserver::new(id, move |_, data: &mut String| -> CoreResult<()> {
        trail.borrow_mut().push(format!("{label}:{data}"));
        Ok(())
    })
}

#[test]
fn notify_runs_observers_in_resolved_order_and_detach_is_selective() {
    let trail: Trail = Rc::default();
    let subject: Subject<String> = Subject::new("posts");
    subject
        .attach("e", recorder("second", &trail).depends_on("first").into_observer())
        .expect("second");
    subject
        .attach("e", recorder("first", &trail).into_observer())
        .expect("first");

    let mut data = "saved".to_string();
    subject.notify("e", &mut data).expect("notify");
    assert_eq!(*trail.borrow(), vec!["first:saved", "second:saved"]);

    assert_eq!(subject.detach("e", &ItemId::from("first")), 1);
    subject
        .attach("e", recorder("third", &trail).into_observer())
        .expect("third");
    trail.borrow_mut().clear();
    subject.notify("e", &mut data).expect("notify after detach");
    assert_eq!(
        *trail.borrow(),
        vec!["third:saved"],
        "second depends on the detached observer"
    );
}

#[test]
fn detach_leaves_other_observers_callable() {
    let trail: Trail = Rc::default();
    let subject: Subject<String> = Subject::new("posts");
    subject
        .attach("e", recorder("a", &trail).into_observer())
        .expect("a");
    subject
        .attach("e", recorder("b", &trail).into_observer())
        .expect("b");

    assert_eq!(subject.detach("e", &ItemId::from("a")), 1);
    assert_eq!(subject.detach("e", &ItemId::from("a")), 0);
    assert_eq!(subject.observers("e").len(), 1);

    let mut data = "ping".to_string();
    subject.notify("e", &mut data).expect("notify");
    assert_eq!(*trail.borrow(), vec!["b:ping"]);
}

#[test]
fn observers_may_mutate_the_payload() {
    let subject: Subject<String> = Subject::new("titles");
    subject
        .attach(
            "render",
            CallbackObserver::new("trim", |_, title: &mut String| -> CoreResult<()> {
                *title = title.trim().to_string();
                Ok(())
            })
            .into_observer(),
        )
        .expect("trim");
    subject
        .attach(
            "render",
            CallbackObserver::new("shout", |_, title: &mut String| -> CoreResult<()> {
                *title = title.to_uppercase();
                Ok(())
            })
            .depends_on("trim")
            .into_observer(),
        )
        .expect("shout");

    let mut title = "  hello  ".to_string();
    subject.notify("render", &mut title).expect("notify");
    assert_eq!(title, "HELLO");
}

#[test]
fn attach_is_logged_at_info_when_a_logger_is_injected() {
    let logger = Rc::new(Logger::new(&LoggerConfig {
        max_volume: 8,
        channel_capacity: None,
    }));
    let subject: Subject<String> = Subject::new("posts").with_logger(Rc::clone(&logger));
    let trail: Trail = Rc::default();
    subject
        .attach("publish", recorder("notifier", &trail).into_observer())
        .expect("attach");

    let infos: Vec<LogItem> = logger.events("info");
    assert_eq!(infos.len(), 1);
    assert_eq!(infos[0].code(), "observer_attached");
    assert_eq!(infos[0].data()["observer"], "notifier");
}

struct Webhook {
    deps: ItemDependencies,
}

impl Identifiable for Webhook {
    fn id(&self) -> &ItemId {
        self.deps.id()
    }
}

impl DependentItem for Webhook {
    fn priority(&self) -> i64 {
        self.deps.priority()
    }

    fn dependencies(&self) -> &[ItemId] {
        self.deps.dependencies()
    }

    fn add_dependency(&mut self, id: ItemId) {
        self.deps.add_dependency(id);
    }

    fn remove_dependency(&mut self, id: &ItemId) {
        self.deps.remove_dependency(id);
    }
}

impl Middleware for Webhook {
    fn run_middleware(&self) {}
}

impl FeatureExtension for Webhook {
    fn do_actions(&self) {}
}

impl RegistryObject for Webhook {
    fn as_middleware(&self) -> Option<&dyn Middleware> {
        Some(self)
    }

    fn as_feature_extension(&self) -> Option<&dyn FeatureExtension> {
        Some(self)
    }
}

impl Observer<String> for Webhook {
    fn update(&self, _: &Subject<String>, data: &mut String) -> CoreResult<()> {
        data.push_str(" sent");
        Ok(())
    }
}

#[test]
fn observer_lifecycle_is_logged_at_debug_keyed_by_observer_id() {
    let logger = Rc::new(Logger::new(&LoggerConfig {
        max_volume: 8,
        channel_capacity: None,
    }));
    let subject: Subject<String> = Subject::new("posts").with_logger(Rc::clone(&logger));
    let webhook: Rc<dyn Observer<String>> = Rc::new(Webhook {
        deps: ItemDependencies::new("webhook"),
    });
    subject.attach("publish", webhook).expect("attach");

    let debugs: Vec<LogItem> = logger.events("debug");
    let codes: Vec<&str> = debugs.iter().map(|item| item.code()).collect();
    assert_eq!(
        codes,
        vec!["registry_item_added", "middleware_ran", "extension_registered"]
    );
    assert!(debugs.iter().all(|item| item.data()["key"] == "webhook"));
    assert!(debugs
        .iter()
        .all(|item| item.data()["registry"] == "posts.publish"));

    let mut data = "post".to_string();
    subject.notify("publish", &mut data).expect("notify");
    assert_eq!(data, "post sent");
}

#[test]
fn reduce_rejects_invalid_states_without_failing() {
    let subject: Subject<Accumulator<Vec<String>>> = Subject::new("filters");
    for (id, word) in [("one", "alpha"), ("two", ""), ("three", "gamma")] {
        let word = word.to_string();
        let mut observer = CallbackObserver::new(
            id,
            move |_, acc: &mut Accumulator<Vec<String>>| -> CoreResult<()> {
                let mut next = acc.get_state().clone();
                next.push(word.clone());
                acc.update(next);
                Ok(())
            },
        );
        if id == "two" {
            observer = observer.depends_on("one");
        }
        if id == "three" {
            observer = observer.depends_on("two");
        }
        subject.attach("words", observer.into_observer()).expect("attach");
    }

    let words = subject
        .reduce(
            "words",
            Accumulator::with_validator(Vec::new(), |words: &Vec<String>| {
                words.iter().all(|word| !word.is_empty())
            }),
        )
        .expect("reduce");
    assert_eq!(words, vec!["alpha", "gamma"]);
}
