use std::cell::RefCell;
use std::rc::Rc;

/// Initialize trace logging for a test run.
pub fn init_logging() {
    let _ = env_logger::builder()
        .filter_level(log::LevelFilter::Trace)
        .is_test(true)
        .try_init();
}

/// [`Recorder`] collects execution-order markers from task payloads.
///
/// Clones share the same buffer, so a recorder can be captured by any
/// number of payloads and inspected after the loop closes.
#[derive(Debug, Clone, Default)]
pub struct Recorder {
    events: Rc<RefCell<Vec<&'static str>>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `label` immediately.
    pub fn note(&self, label: &'static str) {
        self.events.borrow_mut().push(label);
    }

    /// Build a payload that records `label` when it runs.
    pub fn mark(&self, label: &'static str) -> impl FnOnce() + 'static {
        let events = Rc::clone(&self.events);
        move || events.borrow_mut().push(label)
    }

    /// The recorded labels, in execution order.
    pub fn events(&self) -> Vec<&'static str> {
        self.events.borrow().clone()
    }
}
