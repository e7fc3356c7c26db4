use std::cell::Cell;
use std::rc::Rc;
use wasm_bindgen::JsCast;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TimerId(pub i32);

/// One-shot timers. Everything that waits goes through here so the state machines can run
/// against a virtual clock in tests.
pub trait Scheduler {
    /// Returns `None` when the timer could not be armed (no window).
    fn set_timeout(&self, delay_ms: u32, f: Box<dyn FnOnce()>) -> Option<TimerId>;
    fn clear_timeout(&self, id: TimerId);
}

/// `window.setTimeout` / `window.clearTimeout`.
#[derive(Clone, Copy, Debug, Default)]
pub struct BrowserScheduler;

impl Scheduler for BrowserScheduler {
    fn set_timeout(&self, delay_ms: u32, f: Box<dyn FnOnce()>) -> Option<TimerId> {
        let win = web_sys::window()?;
        let cb = wasm_bindgen::closure::Closure::once_into_js(move || f());
        win.set_timeout_with_callback_and_timeout_and_arguments_0(
            cb.as_ref().unchecked_ref(),
            delay_ms.min(i32::MAX as u32) as i32,
        )
        .ok()
        .map(TimerId)
    }

    fn clear_timeout(&self, id: TimerId) {
        if let Some(win) = web_sys::window() {
            win.clear_timeout_with_handle(id.0);
        }
    }
}

/// Calls `probe` up to `max_attempts` times, `interval_ms` apart, starting immediately.
/// `done(true)` runs on the first success; `done(false)` after the last failed attempt.
pub fn poll_until(
    scheduler: Rc<dyn Scheduler>,
    interval_ms: u32,
    max_attempts: u32,
    probe: impl Fn() -> bool + 'static,
    done: impl FnOnce(bool) + 'static,
) {
    let state = Rc::new(PollState {
        scheduler,
        interval_ms,
        max_attempts: max_attempts.max(1),
        attempts: Cell::new(0),
        probe: Box::new(probe),
        done: Cell::new(Some(Box::new(done))),
    });
    state.attempt();
}

struct PollState {
    scheduler: Rc<dyn Scheduler>,
    interval_ms: u32,
    max_attempts: u32,
    attempts: Cell<u32>,
    probe: Box<dyn Fn() -> bool>,
    done: Cell<Option<Box<dyn FnOnce(bool)>>>,
}

impl PollState {
    fn attempt(self: Rc<Self>) {
        let n = self.attempts.get() + 1;
        self.attempts.set(n);

        if (self.probe)() {
            self.finish(true);
            return;
        }
        if n >= self.max_attempts {
            self.finish(false);
            return;
        }

        let next = self.clone();
        let armed = self
            .scheduler
            .set_timeout(self.interval_ms, Box::new(move || next.attempt()));
        if armed.is_none() {
            self.finish(false);
        }
    }

    fn finish(&self, ok: bool) {
        if let Some(done) = self.done.take() {
            done(ok);
        }
    }
}
