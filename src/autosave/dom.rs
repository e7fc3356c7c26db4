use super::{AutosaveDebouncer, SaveTarget};
use crate::status::StatusIndicator;
use crate::util::{element_by_id, input_by_id, EventListenerGuard, MutationObserverGuard};
use leptos::logging::warn;
use wasm_bindgen::prelude::*;

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = htmx, js_name = trigger, catch)]
    fn htmx_trigger(elt: &web_sys::Element, event: &str) -> Result<(), JsValue>;
}

/// Live-DOM save target: region inner HTML → hidden input → `htmx.trigger(form, "submit")`.
pub(crate) struct DomSaveTarget {
    region_id: String,
    mirror_id: String,
    form_id: String,
    status: StatusIndicator,
}

impl DomSaveTarget {
    pub(crate) fn new(
        region_id: &str,
        mirror_id: &str,
        form_id: &str,
        status: StatusIndicator,
    ) -> Self {
        Self {
            region_id: region_id.to_string(),
            mirror_id: mirror_id.to_string(),
            form_id: form_id.to_string(),
            status,
        }
    }
}

impl SaveTarget for DomSaveTarget {
    fn read_content(&self) -> Option<String> {
        element_by_id(&self.region_id).map(|el| el.inner_html())
    }

    fn write_mirror(&self, content: &str) -> bool {
        let Some(input) = input_by_id(&self.mirror_id) else {
            return false;
        };
        input.set_value(content);
        true
    }

    fn submit(&self) {
        let Some(form) = element_by_id(&self.form_id) else {
            return;
        };
        self.status.mark_pending();
        if let Err(e) = htmx_trigger(&form, "submit") {
            warn!("autosave: htmx.trigger failed for #{}: {:?}", self.form_id, e);
        }
    }
}

/// A mutation batch counts as an edit when it touched the tree or some text.
pub(crate) fn batch_signals_change(kinds: &[String]) -> bool {
    kinds
        .iter()
        .any(|k| k == "childList" || k == "characterData")
}

/// `input` + `keyup` listeners and a subtree observer, all feeding one debouncer.
/// The observer catches toolbar commands, which fire no input events.
pub(crate) struct ChangeDetection {
    _input: Option<EventListenerGuard>,
    _keyup: Option<EventListenerGuard>,
    _observer: Option<MutationObserverGuard>,
}

impl ChangeDetection {
    pub(crate) fn attach(region: &web_sys::Element, debouncer: &AutosaveDebouncer) -> Self {
        let d1 = debouncer.clone();
        let input = EventListenerGuard::new(region, "input", move |_ev| d1.schedule_save());

        let d2 = debouncer.clone();
        let keyup = EventListenerGuard::new(region, "keyup", move |_ev| d2.schedule_save());

        let d3 = debouncer.clone();
        let observer = MutationObserverGuard::observe(region, move |kinds| {
            if batch_signals_change(&kinds) {
                d3.schedule_save();
            }
        });

        if observer.is_none() {
            warn!("autosave: MutationObserver unavailable, relying on input events");
        }

        Self {
            _input: input,
            _keyup: keyup,
            _observer: observer,
        }
    }
}
