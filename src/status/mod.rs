mod view;

pub(crate) use view::{mount_status_view, StatusMount};

use crate::timer::Scheduler;
use std::cell::Cell;
use std::rc::Rc;
use wasm_bindgen::{JsCast, JsValue};

pub(crate) const BEFORE_REQUEST_EVENT: &str = "htmx:beforeRequest";
pub(crate) const AFTER_REQUEST_EVENT: &str = "htmx:afterRequest";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, strum::Display, strum::AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum SaveStatus {
    #[default]
    Empty,
    Pending,
    Success,
    Failure,
}

/// Transport lifecycle event, reduced to what the indicator needs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TransportSignal {
    Started { element_id: String },
    Finished { element_id: String, status: u16 },
}

impl TransportSignal {
    pub fn element_id(&self) -> &str {
        match self {
            TransportSignal::Started { element_id } => element_id,
            TransportSignal::Finished { element_id, .. } => element_id,
        }
    }

    /// Reads an htmx `CustomEvent` (`detail.elt.id`, `detail.xhr.status`).
    pub fn from_event(ev: &web_sys::Event) -> Option<Self> {
        let custom = ev.dyn_ref::<web_sys::CustomEvent>()?;
        let detail = custom.detail();
        let element_id = js_sys::Reflect::get(&detail, &"elt".into())
            .ok()
            .and_then(|elt| elt.dyn_into::<web_sys::Element>().ok())
            .map(|elt| elt.id())?;

        match ev.type_().as_str() {
            BEFORE_REQUEST_EVENT => Self::started(element_id),
            AFTER_REQUEST_EVENT => {
                let status = js_sys::Reflect::get(&detail, &"xhr".into())
                    .ok()
                    .filter(|xhr| xhr.is_object())
                    .and_then(|xhr| js_sys::Reflect::get(&xhr, &"status".into()).ok())
                    .as_ref()
                    .and_then(JsValue::as_f64);
                Self::finished(element_id, status)
            }
            _ => None,
        }
    }

    fn started(element_id: String) -> Option<Self> {
        if element_id.is_empty() {
            return None;
        }
        Some(TransportSignal::Started { element_id })
    }

    /// A missing or nonsensical status counts as 0, which renders as a failure.
    fn finished(element_id: String, status: Option<f64>) -> Option<Self> {
        if element_id.is_empty() {
            return None;
        }
        let status = status
            .filter(|s| s.is_finite() && *s >= 0.0 && *s <= f64::from(u16::MAX))
            .map(|s| s as u16)
            .unwrap_or(0);
        Some(TransportSignal::Finished { element_id, status })
    }
}

/// Pending/success/failure indicator for one form.
///
/// Every transition starts a new cycle. Auto-clear timers remember the cycle they were armed
/// in and do nothing once a newer cycle has begun.
#[derive(Clone)]
pub struct StatusIndicator {
    form_id: Rc<str>,
    scheduler: Rc<dyn Scheduler>,
    success_clear_ms: u32,
    failure_clear_ms: u32,
    state: Rc<Cell<SaveStatus>>,
    cycle: Rc<Cell<u64>>,
    render: Rc<dyn Fn(SaveStatus)>,
}

impl StatusIndicator {
    pub fn new(
        form_id: &str,
        scheduler: Rc<dyn Scheduler>,
        success_clear_ms: u32,
        failure_clear_ms: u32,
        render: impl Fn(SaveStatus) + 'static,
    ) -> Self {
        Self {
            form_id: Rc::from(form_id),
            scheduler,
            success_clear_ms,
            failure_clear_ms,
            state: Rc::new(Cell::new(SaveStatus::Empty)),
            cycle: Rc::new(Cell::new(0)),
            render: Rc::new(render),
        }
    }

    pub fn status(&self) -> SaveStatus {
        self.state.get()
    }

    pub fn cycle(&self) -> u64 {
        self.cycle.get()
    }

    /// Applies a transport signal. Returns `false` for signals that belong to another form.
    pub fn handle(&self, signal: &TransportSignal) -> bool {
        if signal.element_id() != &*self.form_id {
            return false;
        }
        match signal {
            TransportSignal::Started { .. } => self.mark_pending(),
            TransportSignal::Finished { status, .. } => self.mark_finished(*status),
        }
        true
    }

    pub fn mark_pending(&self) {
        self.transition(SaveStatus::Pending);
    }

    fn mark_finished(&self, status: u16) {
        let (next, delay) = if status == 200 {
            (SaveStatus::Success, self.success_clear_ms)
        } else {
            (SaveStatus::Failure, self.failure_clear_ms)
        };
        let cycle = self.transition(next);

        let s2 = self.clone();
        self.scheduler.set_timeout(
            delay,
            Box::new(move || {
                if s2.cycle.get() == cycle {
                    s2.transition(SaveStatus::Empty);
                }
            }),
        );
    }

    /// Invalidates outstanding auto-clear timers without touching the rendered state.
    pub fn invalidate(&self) {
        self.cycle.set(self.cycle.get() + 1);
    }

    fn transition(&self, next: SaveStatus) -> u64 {
        let cycle = self.cycle.get() + 1;
        self.cycle.set(cycle);
        self.state.set(next);
        (self.render)(next);
        cycle
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timer::virtual_clock::VirtualScheduler;
    use std::cell::RefCell;

    fn setup() -> (Rc<VirtualScheduler>, StatusIndicator, Rc<RefCell<Vec<SaveStatus>>>) {
        let clock = Rc::new(VirtualScheduler::default());
        let rendered = Rc::new(RefCell::new(Vec::new()));
        let r = rendered.clone();
        let ind = StatusIndicator::new("notes-form", clock.clone(), 3000, 5000, move |s| {
            r.borrow_mut().push(s)
        });
        (clock, ind, rendered)
    }

    fn started(id: &str) -> TransportSignal {
        TransportSignal::Started {
            element_id: id.to_string(),
        }
    }

    fn finished(id: &str, status: u16) -> TransportSignal {
        TransportSignal::Finished {
            element_id: id.to_string(),
            status,
        }
    }

    #[test]
    fn test_success_clears_after_exactly_3000ms() {
        let (clock, ind, rendered) = setup();
        assert!(ind.handle(&started("notes-form")));
        assert_eq!(ind.status(), SaveStatus::Pending);

        ind.handle(&finished("notes-form", 200));
        assert_eq!(ind.status(), SaveStatus::Success);

        clock.advance(2999);
        assert_eq!(ind.status(), SaveStatus::Success);
        clock.advance(1);
        assert_eq!(ind.status(), SaveStatus::Empty);

        assert_eq!(
            *rendered.borrow(),
            vec![SaveStatus::Pending, SaveStatus::Success, SaveStatus::Empty]
        );
    }

    #[test]
    fn test_non_200_is_failure_clearing_after_5000ms() {
        for status in [0u16, 201, 204, 400, 500] {
            let (clock, ind, _) = setup();
            ind.handle(&started("notes-form"));
            ind.handle(&finished("notes-form", status));
            assert_eq!(ind.status(), SaveStatus::Failure, "status {status}");

            clock.advance(4999);
            assert_eq!(ind.status(), SaveStatus::Failure);
            clock.advance(1);
            assert_eq!(ind.status(), SaveStatus::Empty);
        }
    }

    #[test]
    fn test_signals_for_other_forms_are_ignored() {
        let (clock, ind, rendered) = setup();
        assert!(!ind.handle(&started("report-form")));
        assert!(!ind.handle(&finished("report-form", 500)));
        clock.advance(10_000);
        assert_eq!(ind.status(), SaveStatus::Empty);
        assert_eq!(ind.cycle(), 0);
        assert!(rendered.borrow().is_empty());
    }

    #[test]
    fn test_stale_clear_timer_does_not_wipe_new_cycle() {
        let (clock, ind, _) = setup();
        ind.handle(&finished("notes-form", 200));
        clock.advance(2000);

        // Next save starts before the success badge clears.
        ind.handle(&started("notes-form"));
        clock.advance(1500);
        assert_eq!(ind.status(), SaveStatus::Pending);

        ind.handle(&finished("notes-form", 500));
        clock.advance(4999);
        assert_eq!(ind.status(), SaveStatus::Failure);
        clock.advance(1);
        assert_eq!(ind.status(), SaveStatus::Empty);
    }

    #[test]
    fn test_finish_without_start_still_renders() {
        let (clock, ind, _) = setup();
        ind.handle(&finished("notes-form", 200));
        assert_eq!(ind.status(), SaveStatus::Success);
        clock.advance(3000);
        assert_eq!(ind.status(), SaveStatus::Empty);
    }

    #[test]
    fn test_invalidate_keeps_state_but_disarms_clear() {
        let (clock, ind, _) = setup();
        ind.handle(&finished("notes-form", 200));
        ind.invalidate();
        clock.advance(10_000);
        assert_eq!(ind.status(), SaveStatus::Success);
    }

    #[test]
    fn test_finished_status_is_clamped_to_failure_when_unusable() {
        let s = TransportSignal::finished("f".to_string(), None);
        assert_eq!(s, Some(finished("f", 0)));
        let s = TransportSignal::finished("f".to_string(), Some(f64::NAN));
        assert_eq!(s, Some(finished("f", 0)));
        let s = TransportSignal::finished("f".to_string(), Some(200.0));
        assert_eq!(s, Some(finished("f", 200)));
        assert_eq!(TransportSignal::finished(String::new(), Some(200.0)), None);
        assert_eq!(TransportSignal::started(String::new()), None);
    }

    #[test]
    fn test_status_names_are_lowercase() {
        assert_eq!(SaveStatus::Pending.as_ref(), "pending");
        assert_eq!(SaveStatus::Failure.to_string(), "failure");
        assert_eq!(SaveStatus::default(), SaveStatus::Empty);
    }
}
