//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `underpin_core` linkage end to end: config, logger, subject and
//!   registry query.
//! - Keep output deterministic for quick local sanity checks.

use serde_json::{json, Value};
use std::process::ExitCode;
use std::rc::Rc;
use underpin_core::{
    init_logging, CallbackObserver, CoreConfig, CoreResult, Filter, LogItem, LoggedEvent, Logger,
    Registry, Sort, Subject,
};

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("event=cli_smoke module=cli status=error code={}", err.code());
            eprintln!("underpin_cli error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> CoreResult<()> {
    println!("underpin_core ping={}", underpin_core::ping());
    println!("underpin_core version={}", underpin_core::core_version());

    let config = CoreConfig::from_env()?;
    init_logging(&config.logging)?;

    let logger = Rc::new(Logger::new(&config.logger));
    logger.attach(
        CallbackObserver::new("stdout", |_, event: &mut LoggedEvent| -> CoreResult<()> {
            println!("logged channel={} code={}", event.event_type, event.item.code());
            Ok(())
        })
        .into_observer(),
    )?;

    let subject: Subject<Vec<String>> = Subject::new("smoke").with_logger(Rc::clone(&logger));
    subject.attach(
        "boot",
        CallbackObserver::new("routes", |_, steps: &mut Vec<String>| -> CoreResult<()> {
            steps.push("routes".to_string());
            Ok(())
        })
        .depends_on("config")
        .into_observer(),
    )?;
    subject.attach(
        "boot",
        CallbackObserver::new("config", |_, steps: &mut Vec<String>| -> CoreResult<()> {
            steps.push("config".to_string());
            Ok(())
        })
        .into_observer(),
    )?;
    let mut steps = Vec::new();
    subject.notify("boot", &mut steps)?;
    println!("boot order={}", steps.join(","));

    let mut posts: Registry<Value> = Registry::new("posts");
    posts
        .add("1", json!({"type": "page", "order": 2}))?
        .add("2", json!({"type": "post", "order": 1}))?
        .add("3", json!({"type": "page", "order": 1}))?;
    let pages = posts
        .query()
        .filter(Filter::new().is_in("type", ["page"]))
        .sort(Sort::new().asc("order"))
        .get_results()?;
    println!("pages={}", pages.keys().collect::<Vec<_>>().join(","));

    logger.notice(LogItem::new("cli_smoke", "smoke run complete"));
    Ok(())
}
