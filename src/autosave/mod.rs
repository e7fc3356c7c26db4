mod dom;

pub(crate) use dom::{ChangeDetection, DomSaveTarget};

use crate::timer::{Scheduler, TimerId};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// Where a dispatched save reads from and writes to.
pub trait SaveTarget {
    /// Serialized content of the editable region, or `None` when the region is gone.
    fn read_content(&self) -> Option<String>;

    /// Copies `content` into the hidden mirror field. `false` when the field is gone.
    fn write_mirror(&self, content: &str) -> bool;

    /// Fires the form submission. Only called after a successful `write_mirror`.
    fn submit(&self);
}

/// Trailing-edge debounce in front of a [`SaveTarget`].
///
/// Every `schedule_save` cancels the armed timer and arms a new one, so a burst of edits
/// produces one dispatch `delay_ms` after the last edit.
#[derive(Clone)]
pub struct AutosaveDebouncer {
    scheduler: Rc<dyn Scheduler>,
    target: Rc<dyn SaveTarget>,
    delay_ms: u32,
    pending: Rc<RefCell<Option<TimerId>>>,
    // Bumped on every schedule/cancel; a timer only dispatches for the generation it was armed in.
    generation: Rc<Cell<u64>>,
}

impl AutosaveDebouncer {
    pub fn new(scheduler: Rc<dyn Scheduler>, target: Rc<dyn SaveTarget>, delay_ms: u32) -> Self {
        Self {
            scheduler,
            target,
            delay_ms,
            pending: Rc::new(RefCell::new(None)),
            generation: Rc::new(Cell::new(0)),
        }
    }

    pub fn schedule_save(&self) {
        self.clear_pending();

        let generation = self.generation.get() + 1;
        self.generation.set(generation);

        let s2 = self.clone();
        let tid = self.scheduler.set_timeout(
            self.delay_ms,
            Box::new(move || s2.on_timer(generation)),
        );
        *self.pending.borrow_mut() = tid;
    }

    pub fn cancel(&self) {
        self.clear_pending();
        self.generation.set(self.generation.get() + 1);
    }

    pub fn is_pending(&self) -> bool {
        self.pending.borrow().is_some()
    }

    /// Mirrors the region into the hidden field and submits, skipping the timer.
    /// Returns whether a submission happened.
    pub fn dispatch_now(&self) -> bool {
        self.cancel();
        self.dispatch()
    }

    fn clear_pending(&self) {
        let prev = self.pending.borrow_mut().take();
        if let Some(tid) = prev {
            self.scheduler.clear_timeout(tid);
        }
    }

    fn on_timer(&self, generation: u64) {
        if self.generation.get() != generation {
            return;
        }
        self.pending.borrow_mut().take();
        self.dispatch();
    }

    fn dispatch(&self) -> bool {
        let Some(content) = self.target.read_content() else {
            return false;
        };
        if !self.target.write_mirror(&content) {
            return false;
        }
        self.target.submit();
        true
    }
}
