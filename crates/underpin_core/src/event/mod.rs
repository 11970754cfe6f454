//! Publish/subscribe broadcasting over dependency-ordered observers.

pub mod accumulator;
pub mod observer;
pub mod subject;

pub use accumulator::Accumulator;
pub use observer::{CallbackObserver, Observer};
pub use subject::Subject;
